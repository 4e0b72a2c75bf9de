use std::fmt;
use std::str::FromStr;

use image::Rgba;

use crate::error::IdCardError;

/// Operator-chosen card accent color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColor(pub Rgba<u8>);

static NAMED: &[(&str, [u8; 3])] = &[
    ("navy", [0x00, 0x00, 0x80]),
    ("blue", [0x00, 0x00, 0xff]),
    ("teal", [0x00, 0x80, 0x80]),
    ("green", [0x00, 0x80, 0x00]),
    ("maroon", [0x80, 0x00, 0x00]),
    ("red", [0xff, 0x00, 0x00]),
    ("purple", [0x80, 0x00, 0x80]),
    ("orange", [0xff, 0xa5, 0x00]),
    ("black", [0x00, 0x00, 0x00]),
    ("gray", [0x80, 0x80, 0x80]),
];

impl Default for ThemeColor {
    fn default() -> Self {
        ThemeColor(Rgba([0x1e, 0x3a, 0x8a, 0xff]))
    }
}

impl ThemeColor {
    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)` or a basic color name.
    pub fn parse(raw: &str) -> Result<Self, IdCardError> {
        let s = raw.trim().to_ascii_lowercase();
        let invalid = || IdCardError::InvalidColor(raw.to_string());
        if let Some(hex) = s.strip_prefix('#') {
            let digits: Vec<u8> = hex
                .chars()
                .map(|c| c.to_digit(16).map(|d| d as u8))
                .collect::<Option<_>>()
                .ok_or_else(invalid)?;
            let rgba = match digits.as_slice() {
                [r, g, b] => [r * 17, g * 17, b * 17, 0xff],
                [r1, r2, g1, g2, b1, b2] => [r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2, 0xff],
                [r1, r2, g1, g2, b1, b2, a1, a2] => {
                    [r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2, a1 * 16 + a2]
                }
                _ => return Err(invalid()),
            };
            return Ok(ThemeColor(Rgba(rgba)));
        }
        if let Some(body) = s.strip_prefix("rgb(").and_then(|b| b.strip_suffix(')')) {
            let parts: Vec<u8> = body
                .split(',')
                .map(|p| p.trim().parse::<u8>().ok())
                .collect::<Option<_>>()
                .ok_or_else(invalid)?;
            return match parts.as_slice() {
                [r, g, b] => Ok(ThemeColor(Rgba([*r, *g, *b, 0xff]))),
                _ => Err(invalid()),
            };
        }
        NAMED
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, [r, g, b])| ThemeColor(Rgba([*r, *g, *b, 0xff])))
            .ok_or_else(invalid)
    }

    pub fn rgba(self) -> Rgba<u8> {
        self.0
    }

    /// Composite onto an opaque background.
    pub fn over(self, background: Rgba<u8>) -> Rgba<u8> {
        let [r, g, b, a] = self.0.0;
        let alpha = a as f32 / 255.0;
        let mix = |fg: u8, bg: u8| (fg as f32 * alpha + bg as f32 * (1.0 - alpha)).round() as u8;
        Rgba([
            mix(r, background.0[0]),
            mix(g, background.0[1]),
            mix(b, background.0[2]),
            0xff,
        ])
    }

    /// Black or white, whichever reads better on this color.
    pub fn contrast_text(self) -> Rgba<u8> {
        let [r, g, b, _] = self.0.0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        if luma > 160.0 {
            Rgba([0x11, 0x11, 0x11, 0xff])
        } else {
            Rgba([0xff, 0xff, 0xff, 0xff])
        }
    }
}

impl FromStr for ThemeColor {
    type Err = IdCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ThemeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0.0;
        if a == 0xff {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_notations() {
        assert_eq!(ThemeColor::parse("#fff").unwrap().rgba(), Rgba([255, 255, 255, 255]));
        assert_eq!(ThemeColor::parse("#1E3A8A").unwrap(), ThemeColor::default());
        assert_eq!(ThemeColor::parse("rgb(30, 58, 138)").unwrap(), ThemeColor::default());
        assert_eq!(ThemeColor::parse("Maroon").unwrap().rgba(), Rgba([128, 0, 0, 255]));
        assert_eq!(ThemeColor::parse("#00000080").unwrap().rgba().0[3], 0x80);
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["", "#12", "#ggg", "rgb(1,2)", "rgb(300,0,0)", "chartreuse-ish"] {
            assert!(ThemeColor::parse(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn translucent_theme_flattens_onto_background() {
        let half = ThemeColor(Rgba([0, 0, 0, 128]));
        let flat = half.over(Rgba([255, 255, 255, 255]));
        assert_eq!(flat.0[3], 255);
        assert!((126..=128).contains(&flat.0[0]));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let theme = ThemeColor::parse("#0a7c59").unwrap();
        assert_eq!(theme.to_string(), "#0a7c59");
    }
}
