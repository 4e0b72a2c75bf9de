//! Barcode and QR generators used by the layout resolver.

mod barcode;
mod qr;

pub use barcode::{BAR_HEIGHT, BarcodeSymbol, Code128, LinearEncoding, MODULE_WIDTH, barcode_for};
pub use qr::{QR_EC_LEVEL, QR_SIZE, QrSymbol, qr_for};
