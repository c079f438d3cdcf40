use ab_glyph::PxScale;
use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::{draw_line_segment_mut, draw_text_mut};

use crate::ocr::RegionBox;

use super::background::SAMPLE_PAD;
use super::font::ResolvedFont;
use super::layout::RenderPlan;

const UNDERLINE_DROP: f32 = 2.0;

/// Erases a region by painting a background-colored tile slightly larger
/// than its box, draws the planned lines onto that tile, and pastes the
/// tile back. Working on a separate tile keeps glyph overdraw from
/// leaking past the padded bounds onto surrounding page content.
pub fn render_region(
    page: &mut RgbImage,
    bbox: RegionBox,
    background: Rgb<u8>,
    foreground: Rgb<u8>,
    plan: &RenderPlan,
    font: &ResolvedFont,
) {
    let (page_w, page_h) = page.dimensions();
    let bbox = bbox.clamped(page_w, page_h);
    if bbox.is_degenerate() {
        return;
    }

    let tile_x = bbox.x0.saturating_sub(SAMPLE_PAD);
    let tile_y = bbox.y0.saturating_sub(SAMPLE_PAD);
    let tile_w = (bbox.x1 + SAMPLE_PAD).min(page_w) - tile_x;
    let tile_h = (bbox.y1 + SAMPLE_PAD).min(page_h) - tile_y;
    let mut tile = RgbImage::from_pixel(tile_w, tile_h, background);

    // line coordinates are relative to the box, the tile starts PAD earlier
    let origin_x = (bbox.x0 - tile_x) as f32;
    let origin_y = (bbox.y0 - tile_y) as f32;
    let scale = PxScale::from(plan.font_size);
    let ascent = font.ascent(plan.font_size);

    for line in &plan.lines {
        let x = origin_x + line.x;
        if let Some(face) = font.face() {
            let top = origin_y + line.baseline - ascent;
            draw_text_mut(
                &mut tile,
                foreground,
                x.round() as i32,
                top.round() as i32,
                scale,
                face,
                &line.text,
            );
            if font.synthetic_bold {
                draw_text_mut(
                    &mut tile,
                    foreground,
                    x.round() as i32 + 1,
                    top.round() as i32,
                    scale,
                    face,
                    &line.text,
                );
            }
        }
        if line.underline {
            let y = origin_y + line.baseline + UNDERLINE_DROP;
            let width = font.line_width(&line.text, plan.font_size);
            draw_line_segment_mut(&mut tile, (x, y), (x + width, y), foreground);
        }
    }

    imageops::replace(page, &tile, i64::from(tile_x), i64::from(tile_y));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::TextStyle;
    use crate::render::font::FontLibrary;
    use crate::render::layout::plan_region;

    fn empty_plan() -> RenderPlan {
        RenderPlan {
            font_size: 12.0,
            lines: Vec::new(),
            overflowed: false,
        }
    }

    #[test]
    fn erases_padded_box_with_background() {
        let mut page = RgbImage::from_pixel(60, 60, Rgb([10, 10, 10]));
        let bbox = RegionBox::new(20, 20, 40, 30);
        let font = FontLibrary::empty().resolve(TextStyle::default());
        render_region(&mut page, bbox, Rgb([250, 250, 250]), Rgb([0, 0, 0]), &empty_plan(), &font);

        assert_eq!(*page.get_pixel(20, 25), Rgb([250, 250, 250]));
        // padding reaches two pixels past the box
        assert_eq!(*page.get_pixel(18, 25), Rgb([250, 250, 250]));
        assert_eq!(*page.get_pixel(41, 31), Rgb([250, 250, 250]));
        // page beyond the padded tile is untouched
        assert_eq!(*page.get_pixel(17, 25), Rgb([10, 10, 10]));
        assert_eq!(*page.get_pixel(20, 33), Rgb([10, 10, 10]));
    }

    #[test]
    fn clips_boxes_at_the_page_edge() {
        let mut page = RgbImage::from_pixel(30, 30, Rgb([10, 10, 10]));
        let bbox = RegionBox::new(25, 25, 60, 60);
        let font = FontLibrary::empty().resolve(TextStyle::default());
        render_region(&mut page, bbox, Rgb([200, 200, 200]), Rgb([0, 0, 0]), &empty_plan(), &font);
        assert_eq!(*page.get_pixel(29, 29), Rgb([200, 200, 200]));
        assert_eq!(*page.get_pixel(22, 22), Rgb([10, 10, 10]));
    }

    #[test]
    fn degenerate_box_changes_nothing() {
        let mut page = RgbImage::from_pixel(20, 20, Rgb([77, 77, 77]));
        let before = page.clone();
        let bbox = RegionBox::new(5, 5, 5, 10);
        let font = FontLibrary::empty().resolve(TextStyle::default());
        render_region(&mut page, bbox, Rgb([0, 0, 0]), Rgb([255, 255, 255]), &empty_plan(), &font);
        assert_eq!(page.as_raw(), before.as_raw());
    }

    #[test]
    fn underline_is_drawn_even_without_a_font_face() {
        let mut page = RgbImage::from_pixel(120, 60, Rgb([255, 255, 255]));
        let bbox = RegionBox::new(10, 10, 110, 40);
        let font = FontLibrary::empty().resolve(TextStyle::default());
        let style = TextStyle {
            bold: false,
            underline: true,
        };
        let plan = plan_region("hi there", bbox, style, &font);
        assert!(!plan.is_empty());
        render_region(&mut page, bbox, Rgb([255, 255, 255]), Rgb([0, 0, 0]), &plan, &font);

        let black = page
            .pixels()
            .filter(|px| **px == Rgb([0, 0, 0]))
            .count();
        assert!(black > 0);
    }
}
