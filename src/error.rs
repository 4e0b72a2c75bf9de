//! Error types shared across the card pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::layout::CardVariant;

/// Failures raised while turning a payload into a barcode or QR symbol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodeError {
    #[error("barcode payload is empty")]
    EmptyPayload,
    #[error("unsupported barcode character: '{0}' (U+{1:04X})")]
    Unsupported(char, u32),
    #[error("qr encoding failed: {0}")]
    Qr(String),
}

/// Failures raised while loading a record photo.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("photo reference is empty")]
    Empty,
    #[error("photo source '{0}' cannot be fetched by this loader")]
    Unsupported(String),
    #[error("photo not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("malformed data uri: {0}")]
    DataUri(String),
    #[error("failed to decode photo: {0}")]
    Decode(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures raised by the capture engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("card handle {0} does not refer to a realized card")]
    UnknownHandle(usize),
    #[error("surface tainted by cross-origin image {uri}")]
    Tainted { uri: String },
    #[error("card surface has zero area ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },
}

/// Failures raised by the export orchestrator.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no realized cards available to export")]
    NothingToExport,
    #[error("capture failed for {key}: {source}")]
    Capture {
        key: String,
        #[source]
        source: CaptureError,
    },
    #[error("jpeg encoding failed for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: image::ImageError,
    },
    #[error("archive bundling failed: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("download of {filename} failed: {source}")]
    Delivery {
        filename: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Top-level error for layout resolution, configuration and parsing.
#[derive(Debug, Error)]
pub enum IdCardError {
    #[error("invalid theme color '{0}'")]
    InvalidColor(String),
    #[error("{variant:?} card cannot be rendered for a {category} record")]
    VariantMismatch {
        variant: CardVariant,
        category: &'static str,
    },
    #[error("configuration error: {message}")]
    Config { message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias for layout and configuration operations.
pub type IdCardResult<T> = Result<T, IdCardError>;

impl IdCardError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
