use crate::error::CodeError;

/// Code 128 symbol values for START B and STOP.
const START_B: usize = 104;
const STOP: usize = 106;

/// Bar/space module widths for every Code 128 symbol value, bar first.
/// Each pattern spans 11 modules; STOP spans 13.
#[rustfmt::skip]
const PATTERNS: [&str; 107] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312",
    "132212", "221213", "221312", "231212", "112232", "122132", "122231", "113222",
    "123122", "123221", "223211", "221132", "221231", "213212", "223112", "312131",
    "311222", "321122", "321221", "312212", "322112", "322211", "212123", "212321",
    "232121", "111323", "131123", "131321", "112313", "132113", "132311", "211313",
    "231113", "231311", "112133", "112331", "132131", "113123", "113321", "133121",
    "313121", "211331", "231131", "213113", "213311", "213131", "311123", "311321",
    "331121", "312113", "312311", "332111", "314111", "221411", "431111", "111224",
    "111422", "121124", "121421", "141122", "141221", "112214", "112412", "122114",
    "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111",
    "111242", "121142", "121241", "114212", "124112", "124211", "411212", "421112",
    "421211", "212141", "214121", "412121", "111143", "111341", "131141", "114113",
    "114311", "411113", "411311", "113141", "114131", "311141", "411131", "211412",
    "211214", "211232", "2331112",
];

/// Logical size of one bar module on the card.
pub const MODULE_WIDTH: u32 = 2;
/// Logical bar height; fixed so the width/height ratio never varies.
pub const BAR_HEIGHT: u32 = 50;

/// Linear symbology used for natural-key barcodes.
pub trait LinearEncoding {
    fn name(&self) -> &'static str;
    /// Encode into a run of modules, `true` meaning a black bar module.
    fn encode(&self, payload: &str) -> Result<Vec<bool>, CodeError>;
}

/// Code 128 subset B: printable ASCII (0x20..=0x7E).
#[derive(Debug, Default, Clone, Copy)]
pub struct Code128;

impl Code128 {
    fn symbol_value(ch: char) -> Result<usize, CodeError> {
        if (' '..='~').contains(&ch) {
            Ok(ch as usize - 32)
        } else {
            Err(CodeError::Unsupported(ch, ch as u32))
        }
    }

    /// Weighted modulo-103 check value over START B and the data symbols.
    fn checksum(values: &[usize]) -> usize {
        let weighted: usize = values
            .iter()
            .enumerate()
            .map(|(i, v)| (i + 1) * v)
            .sum();
        (START_B + weighted) % 103
    }
}

impl LinearEncoding for Code128 {
    fn name(&self) -> &'static str {
        "CODE128"
    }

    fn encode(&self, payload: &str) -> Result<Vec<bool>, CodeError> {
        if payload.is_empty() {
            return Err(CodeError::EmptyPayload);
        }
        let values = payload
            .chars()
            .map(Self::symbol_value)
            .collect::<Result<Vec<_>, _>>()?;

        let mut symbols = Vec::with_capacity(values.len() + 3);
        symbols.push(START_B);
        symbols.extend_from_slice(&values);
        symbols.push(Self::checksum(&values));
        symbols.push(STOP);

        let mut modules = Vec::new();
        for symbol in symbols {
            for (idx, width) in PATTERNS[symbol].bytes().enumerate() {
                let dark = idx % 2 == 0;
                for _ in 0..(width - b'0') {
                    modules.push(dark);
                }
            }
        }
        Ok(modules)
    }
}

/// A renderable linear barcode: black bars on white, no margin, no caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeSymbol {
    pub payload: String,
    pub modules: Vec<bool>,
}

impl BarcodeSymbol {
    /// Logical width at the fixed module width.
    pub fn width(&self) -> u32 {
        self.modules.len() as u32 * MODULE_WIDTH
    }

    pub fn height(&self) -> u32 {
        BAR_HEIGHT
    }
}

/// Build the card barcode for `payload`.
///
/// Encoding failures are logged and turned into `None`; a card without a
/// barcode is still a valid card.
pub fn barcode_for(payload: &str) -> Option<BarcodeSymbol> {
    let encoder = Code128;
    match encoder.encode(payload) {
        Ok(modules) => Some(BarcodeSymbol {
            payload: payload.to_string(),
            modules,
        }),
        Err(err) => {
            tracing::warn!(payload, symbology = encoder.name(), %err, "barcode generation failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_spans_eleven_modules() {
        for (value, pattern) in PATTERNS.iter().enumerate() {
            let total: u32 = pattern.bytes().map(|b| (b - b'0') as u32).sum();
            let expected = if value == STOP { 13 } else { 11 };
            assert_eq!(total, expected, "pattern {value}");
        }
    }

    #[test]
    fn symbol_length_follows_payload_length() {
        let modules = Code128.encode("21A91A0501").unwrap();
        // start + 10 data + checksum = 12 symbols of 11 modules, plus 13 for stop
        assert_eq!(modules.len(), 12 * 11 + 13);
        assert!(modules[0]);
        assert!(modules[modules.len() - 1]);
    }

    #[test]
    fn checksum_matches_reference_value() {
        // "PJJ123C": 104 + 48*1 + 42*2 + 42*3 + 17*4 + 18*5 + 19*6 + 35*7 = 879, 879 % 103 = 55
        let values: Vec<usize> = "PJJ123C"
            .chars()
            .map(|c| Code128::symbol_value(c).unwrap())
            .collect();
        assert_eq!(Code128::checksum(&values), 55);
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(Code128.encode("FAC-042"), Code128.encode("FAC-042"));
        assert_ne!(Code128.encode("FAC-042"), Code128.encode("FAC-043"));
    }

    #[test]
    fn failures_degrade_to_no_barcode() {
        assert!(barcode_for("").is_none());
        assert!(barcode_for("ROLL\u{0C05}").is_none());
        assert_eq!(
            Code128.encode("é"),
            Err(CodeError::Unsupported('é', 0xE9))
        );
    }
}
