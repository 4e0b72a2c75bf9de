use image::imageops::{FilterType, overlay, resize};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as PixelRect;

use super::fonts::FontStack;
use crate::codes::{BarcodeSymbol, QrSymbol};
use crate::layout::{Align, BadgePlacement, CardLayout, Element, Rect, TextBlock};

const BLACK: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xff]);
const WHITE: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);
const BADGE_FILL: Rgba<u8> = Rgba([0xf5, 0x9e, 0x0b, 0xff]);
const BADGE_INK: Rgba<u8> = Rgba([0x1c, 0x19, 0x17, 0xff]);

/// Paint `layout` at `scale` device pixels per logical pixel.
///
/// Every pixel of the result is opaque: painting starts from `background`
/// and translucent colors are flattened onto it.
pub fn paint_card(
    layout: &CardLayout,
    avatar: Option<&RgbaImage>,
    scale: u32,
    background: Rgba<u8>,
    fonts: &FontStack,
) -> RgbaImage {
    let scale = scale.max(1);
    let background = opaque(background, WHITE);
    let width = layout.geometry.width * scale;
    let height = layout.geometry.height * scale;
    let mut canvas = RgbaImage::from_pixel(width, height, background);

    for placed in &layout.elements {
        let area = to_pixels(placed.rect, scale);
        match &placed.element {
            Element::Fill(color) => fill(&mut canvas, area, opaque(*color, background)),
            Element::Text(block) => paint_text(&mut canvas, fonts, area, block, scale, background),
            Element::Avatar(_) => {
                if let Some(pixels) = avatar {
                    paint_image(&mut canvas, area, pixels);
                }
            }
            Element::Barcode(symbol) => paint_barcode(&mut canvas, area, symbol),
            Element::Qr { symbol, visible } => {
                if *visible {
                    paint_qr(&mut canvas, area, symbol);
                }
            }
            Element::BusBadge(place) => paint_badge(&mut canvas, fonts, area, *place, scale),
        }
    }
    canvas
}

/// Pixel-space rectangle; `x`/`y` may be negative, clipping happens on draw.
#[derive(Debug, Clone, Copy)]
struct Area {
    x: i32,
    y: i32,
    w: u32,
    h: u32,
}

fn to_pixels(rect: Rect, scale: u32) -> Area {
    Area {
        x: rect.x * scale as i32,
        y: rect.y * scale as i32,
        w: rect.width * scale,
        h: rect.height * scale,
    }
}

fn fill(canvas: &mut RgbaImage, area: Area, color: Rgba<u8>) {
    if area.w == 0 || area.h == 0 {
        return;
    }
    draw_filled_rect_mut(canvas, PixelRect::at(area.x, area.y).of_size(area.w, area.h), color);
}

fn opaque(color: Rgba<u8>, background: Rgba<u8>) -> Rgba<u8> {
    crate::layout::ThemeColor(color).over(background)
}

/// Pixel size for a line: the nominal size, shrunk until the line fits `max_width`.
fn fit_px(fonts: &FontStack, text: &str, size: u32, scale: u32, max_width: u32) -> f32 {
    let nominal = (size * scale) as f32;
    let width = fonts.measure(text, nominal);
    if width <= max_width || width == 0 {
        return nominal;
    }
    (nominal * max_width as f32 / width as f32).max(1.0)
}

fn paint_line(
    canvas: &mut RgbaImage,
    fonts: &FontStack,
    area: Area,
    text: &str,
    px: f32,
    align: Align,
    color: Rgba<u8>,
) {
    let width = fonts.measure(text, px) as i32;
    let x = match align {
        Align::Left => area.x,
        Align::Center => area.x + (area.w as i32 - width) / 2,
    };
    let y = area.y + (area.h as i32 - px.round() as i32) / 2;
    fonts.draw(canvas, x, y, text, color, px);
}

fn paint_text(
    canvas: &mut RgbaImage,
    fonts: &FontStack,
    area: Area,
    block: &TextBlock,
    scale: u32,
    background: Rgba<u8>,
) {
    let text = block.rendered();
    let px = fit_px(fonts, &text, block.size, scale, area.w);
    let color = opaque(block.color, background);
    paint_line(canvas, fonts, area, &text, px, block.align, color);
}

fn paint_image(canvas: &mut RgbaImage, area: Area, pixels: &RgbaImage) {
    if area.w == 0 || area.h == 0 || pixels.width() == 0 || pixels.height() == 0 {
        return;
    }
    let resized = resize(pixels, area.w, area.h, FilterType::Triangle);
    // flatten transparency onto white before compositing
    let mut backed = RgbaImage::from_pixel(area.w, area.h, WHITE);
    overlay(&mut backed, &resized, 0, 0);
    overlay(canvas, &backed, area.x as i64, area.y as i64);
}

/// Bars spread evenly over the box; white behind, no quiet zone, no caption.
fn paint_barcode(canvas: &mut RgbaImage, area: Area, symbol: &BarcodeSymbol) {
    fill(canvas, area, WHITE);
    let n = symbol.modules.len() as u64;
    if n == 0 {
        return;
    }
    let w = area.w as u64;
    for (i, dark) in symbol.modules.iter().enumerate() {
        if !dark {
            continue;
        }
        let start = (i as u64 * w / n) as i32;
        let end = ((i as u64 + 1) * w / n) as i32;
        let bar_w = (end - start).max(1) as u32;
        fill(
            canvas,
            Area {
                x: area.x + start,
                y: area.y,
                w: bar_w,
                h: area.h,
            },
            BLACK,
        );
    }
}

fn paint_qr(canvas: &mut RgbaImage, area: Area, symbol: &QrSymbol) {
    fill(canvas, area, WHITE);
    let n = symbol.width as u64;
    if n == 0 {
        return;
    }
    let side = area.w.min(area.h) as u64;
    for y in 0..symbol.width {
        for x in 0..symbol.width {
            if !symbol.is_dark(x, y) {
                continue;
            }
            let x0 = (x as u64 * side / n) as i32;
            let x1 = ((x as u64 + 1) * side / n) as i32;
            let y0 = (y as u64 * side / n) as i32;
            let y1 = ((y as u64 + 1) * side / n) as i32;
            fill(
                canvas,
                Area {
                    x: area.x + x0,
                    y: area.y + y0,
                    w: (x1 - x0).max(1) as u32,
                    h: (y1 - y0).max(1) as u32,
                },
                BLACK,
            );
        }
    }
}

fn paint_badge(
    canvas: &mut RgbaImage,
    fonts: &FontStack,
    area: Area,
    place: BadgePlacement,
    scale: u32,
) {
    fill(canvas, area, BADGE_FILL);
    let label = match place {
        BadgePlacement::CornerRibbon => "BUS",
        BadgePlacement::FooterBanner => "BUS STUDENT",
    };
    let px = fit_px(fonts, label, 11, scale, area.w);
    paint_line(canvas, fonts, area, label, px, Align::Center, BADGE_INK);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_text_shrinks_to_fit() {
        let fonts = FontStack::shared();
        let long = "A".repeat(60);
        assert_eq!(fit_px(fonts, "RAVI", 16, 2, 660), 32.0);
        let px = fit_px(fonts, &long, 16, 2, 660);
        assert!(px < 32.0);
        assert!(fonts.measure(&long, px) <= 661);
    }

    #[test]
    fn barcode_paints_edge_bars_black() {
        let symbol = crate::codes::barcode_for("42").unwrap();
        let mut canvas = RgbaImage::from_pixel(200, 60, Rgba([9, 9, 9, 255]));
        let area = Area {
            x: 0,
            y: 0,
            w: 200,
            h: 50,
        };
        paint_barcode(&mut canvas, area, &symbol);
        assert_eq!(*canvas.get_pixel(0, 10), BLACK);
        assert_eq!(*canvas.get_pixel(199, 10), BLACK);
        assert_eq!(*canvas.get_pixel(100, 55), Rgba([9, 9, 9, 255]));
    }
}
