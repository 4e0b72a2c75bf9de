use qrcode::{Color, EcLevel, QrCode};

use crate::error::CodeError;

/// Fixed logical edge length of the printed QR symbol.
pub const QR_SIZE: u32 = 80;
/// Fixed error-correction level for every card QR.
pub const QR_EC_LEVEL: EcLevel = EcLevel::M;

/// A square module grid, row-major, `true` meaning dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrSymbol {
    pub payload: String,
    pub width: usize,
    pub modules: Vec<bool>,
}

impl QrSymbol {
    /// Encode `payload`. Pure: the same input always yields the same grid.
    pub fn encode(payload: &str) -> Result<Self, CodeError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), QR_EC_LEVEL)
            .map_err(|e| CodeError::Qr(e.to_string()))?;
        let width = code.width();
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        Ok(Self {
            payload: payload.to_string(),
            width,
            modules,
        })
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.modules
            .get(y * self.width + x)
            .copied()
            .unwrap_or(false)
    }
}

/// Build the card QR for `payload`, logging and dropping failures.
pub fn qr_for(payload: &str) -> Option<QrSymbol> {
    match QrSymbol::encode(payload) {
        Ok(symbol) => Some(symbol),
        Err(err) => {
            tracing::warn!(payload, %err, "qr generation failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_square_and_deterministic() {
        let a = QrSymbol::encode("https://www.git.ac.in").unwrap();
        let b = QrSymbol::encode("https://www.git.ac.in").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.modules.len(), a.width * a.width);
        // finder pattern corner is always dark
        assert!(a.is_dark(0, 0));
    }

    #[test]
    fn oversized_payload_is_dropped() {
        let huge = "x".repeat(5000);
        assert!(qr_for(&huge).is_none());
    }
}
