//! Raster painting of card layouts.

mod fonts;
mod glyphs;
mod paint;

pub use fonts::FontStack;
pub use paint::paint_card;
