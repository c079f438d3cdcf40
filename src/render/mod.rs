use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use crate::ocr::TextRegion;

mod background;
pub mod font;
pub mod layout;
mod region;

pub use background::{choose_foreground, sample_background};
pub use font::{FontLibrary, ResolvedFont};
pub use layout::{PlannedLine, RenderPlan, plan_region};
pub use region::render_region;

/// Replaces every translated region on a rendered page: sample the
/// surrounding background, erase the original text with it, and draw the
/// translation fitted to the same box. Regions whose translation is empty
/// are left untouched, pixels included. Regions are processed in reading
/// order so the background sampled for a region reflects neighbors that
/// were already erased.
pub fn compose_page(page: &mut RgbImage, regions: &[TextRegion], fonts: &FontLibrary) {
    let (width, height) = page.dimensions();

    for region in regions {
        let translated = region.translated_text.trim();
        if translated.is_empty() {
            continue;
        }
        let bbox = region.bbox.clamped(width, height);
        if bbox.is_degenerate() {
            continue;
        }

        let background = sample_background(page, bbox);
        let foreground = choose_foreground(background);
        let font = fonts.resolve(region.style);
        let plan = plan_region(translated, bbox, region.style, &font);
        if plan.overflowed {
            debug!(
                "translation does not fit {}x{} box at minimum size: {}",
                bbox.width(),
                bbox.height(),
                translated
            );
        }
        render_region(page, bbox, background, foreground, &plan, &font);
    }
}

/// Outlines every detected region in red. Debug aid for inspecting OCR
/// output next to the final page.
pub fn draw_region_boxes(page: &mut RgbImage, regions: &[TextRegion]) {
    let (width, height) = page.dimensions();
    for region in regions {
        let bbox = region.bbox.clamped(width, height);
        if bbox.is_degenerate() {
            continue;
        }
        let rect = Rect::at(bbox.x0 as i32, bbox.y0 as i32)
            .of_size(bbox.width(), bbox.height());
        draw_hollow_rect_mut(page, rect, Rgb([255, 0, 0]));
    }
}
