//! Outline font stack with per-character fallback.
//!
//! Each character is drawn with the first face that has a glyph for it.
//! Characters no face covers fall through to the bitmap face, which paints
//! a box for anything it does not know either.

use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};

use super::glyphs;

static DEJAVU_SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Ordered list of outline faces.
#[derive(Clone, Default)]
pub struct FontStack {
    faces: Vec<FontArc>,
}

impl fmt::Debug for FontStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontStack")
            .field("faces", &self.faces.len())
            .finish()
    }
}

/// One laid-out character.
enum Piece<'a> {
    Outline {
        face: &'a FontArc,
        id: GlyphId,
        advance: f32,
    },
    Bitmap {
        ch: char,
        advance: f32,
    },
}

impl Piece<'_> {
    fn advance(&self) -> f32 {
        match self {
            Piece::Outline { advance, .. } | Piece::Bitmap { advance, .. } => *advance,
        }
    }
}

impl FontStack {
    /// Only the bundled DejaVu Sans face.
    pub fn embedded() -> Self {
        let mut stack = Self::default();
        match FontArc::try_from_slice(DEJAVU_SANS) {
            Ok(face) => stack.faces.push(face),
            Err(err) => tracing::warn!(%err, "bundled font unreadable, using bitmap glyphs"),
        }
        stack
    }

    /// Process-wide copy of [`FontStack::embedded`].
    pub fn shared() -> &'static FontStack {
        static SHARED: OnceLock<FontStack> = OnceLock::new();
        SHARED.get_or_init(FontStack::embedded)
    }

    /// Configured font files first, then the bundled face. Unreadable files are skipped.
    pub fn with_files(paths: &[PathBuf]) -> Self {
        let mut faces = Vec::with_capacity(paths.len() + 1);
        for path in paths {
            let loaded = std::fs::read(path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| FontArc::try_from_vec(bytes).map_err(|e| e.to_string()));
            match loaded {
                Ok(face) => {
                    tracing::debug!(path = %path.display(), "font loaded");
                    faces.push(face);
                }
                Err(err) => tracing::warn!(path = %path.display(), %err, "font skipped"),
            }
        }
        faces.extend(Self::embedded().faces);
        Self { faces }
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Whether some outline face has a glyph for `ch`.
    pub fn covers(&self, ch: char) -> bool {
        self.face_for(ch).is_some()
    }

    fn face_for(&self, ch: char) -> Option<&FontArc> {
        self.faces.iter().find(|face| face.glyph_id(ch).0 != 0)
    }

    fn layout(&self, text: &str, px: f32) -> Vec<Piece<'_>> {
        let scale = PxScale::from(px);
        text.chars()
            .map(|ch| match self.face_for(ch) {
                Some(face) => {
                    let id = face.glyph_id(ch);
                    Piece::Outline {
                        face,
                        id,
                        advance: face.as_scaled(scale).h_advance(id),
                    }
                }
                None => Piece::Bitmap {
                    ch,
                    advance: glyphs::advance(px) as f32,
                },
            })
            .collect()
    }

    /// Width in pixels of `text` set at `px`.
    pub fn measure(&self, text: &str, px: f32) -> u32 {
        let width: f32 = self.layout(text, px).iter().map(Piece::advance).sum();
        width.ceil() as u32
    }

    /// Draw `text` in a `px`-tall line whose top-left corner is (`x`, `y`).
    pub fn draw(
        &self,
        canvas: &mut RgbaImage,
        x: i32,
        y: i32,
        text: &str,
        color: Rgba<u8>,
        px: f32,
    ) {
        let scale = PxScale::from(px);
        let mut caret = x as f32;
        for piece in self.layout(text, px) {
            match &piece {
                Piece::Outline { face, id, .. } => {
                    let baseline = y as f32 + face.as_scaled(scale).ascent();
                    let glyph = id.with_scale_and_position(scale, point(caret, baseline));
                    if let Some(outline) = face.outline_glyph(glyph) {
                        let bounds = outline.px_bounds();
                        outline.draw(|gx, gy, coverage| {
                            let px_x = bounds.min.x as i32 + gx as i32;
                            let px_y = bounds.min.y as i32 + gy as i32;
                            blend(canvas, px_x, px_y, color, coverage);
                        });
                    }
                }
                Piece::Bitmap { ch, .. } => {
                    glyphs::draw_char(canvas, caret.round() as i32, y, *ch, color, px);
                }
            }
            caret += piece.advance();
        }
    }
}

/// Mix `color` into the pixel at (`x`, `y`) by `coverage`; out-of-bounds is ignored.
fn blend(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
        return;
    }
    let a = coverage.clamp(0.0, 1.0) * color.0[3] as f32 / 255.0;
    if a <= 0.0 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        let mixed = dst.0[c] as f32 * (1.0 - a) + color.0[c] as f32 * a;
        dst.0[c] = mixed.round() as u8;
    }
    let alpha = dst.0[3] as f32 + (255.0 - dst.0[3] as f32) * a;
    dst.0[3] = alpha.round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const INK: Rgba<u8> = Rgba([0x1f, 0x29, 0x37, 0xff]);

    fn inked(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| **p != WHITE).count()
    }

    #[test]
    fn bundled_face_covers_latin_only() {
        let fonts = FontStack::embedded();
        assert_eq!(fonts.face_count(), 1);
        assert!(fonts.covers('a'));
        assert!(fonts.covers('é'));
        assert!(!fonts.covers('శ'));
    }

    #[test]
    fn measure_grows_with_size() {
        let fonts = FontStack::shared();
        let small = fonts.measure("Ravi Teja", 12.0);
        let large = fonts.measure("Ravi Teja", 24.0);
        assert!(small > 0);
        assert!(large >= small * 2 - 2);
        assert_eq!(fonts.measure("", 24.0), 0);
    }

    #[test]
    fn script_without_face_still_leaves_ink() {
        let fonts = FontStack::shared();
        let mut img = RgbaImage::from_pixel(200, 40, WHITE);
        fonts.draw(&mut img, 4, 4, "శ్రీనివాస్", INK, 24.0);
        assert!(inked(&img) > 0);
    }

    #[test]
    fn latin_text_is_antialiased_ink() {
        let mut img = RgbaImage::from_pixel(200, 40, WHITE);
        FontStack::shared().draw(&mut img, 4, 4, "Sita", INK, 24.0);
        assert!(inked(&img) > 20);
        assert!(img.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn missing_font_files_are_skipped() {
        let fonts = FontStack::with_files(&[PathBuf::from("/nonexistent/NotoSansTelugu.ttf")]);
        assert_eq!(fonts.face_count(), 1);
    }

    #[test]
    fn empty_stack_falls_back_to_bitmap() {
        let fonts = FontStack::default();
        assert!(!fonts.covers('A'));
        assert_eq!(fonts.measure("AB", 16.0), 24);
        let mut img = RgbaImage::from_pixel(40, 20, WHITE);
        fonts.draw(&mut img, 0, 0, "AB", INK, 16.0);
        assert!(inked(&img) > 0);
    }
}
