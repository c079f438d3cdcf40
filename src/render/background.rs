use image::{Rgb, RgbImage};

use crate::ocr::RegionBox;

// Sampling bands sit MARGIN px outside the box and are read every
// STRIDE px; erased tiles extend PAD px past the box on every side.
pub(crate) const SAMPLE_PAD: u32 = 2;
const SAMPLE_MARGIN: u32 = 3;
const SAMPLE_STRIDE: usize = 5;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Estimates the page color behind a region by sampling thin bands just
/// outside its edges and taking the per-channel median. Bands that would
/// leave the page are skipped; with no samples at all the page is assumed
/// white.
pub fn sample_background(page: &RgbImage, bbox: RegionBox) -> Rgb<u8> {
    let (width, height) = page.dimensions();
    let mut samples: Vec<Rgb<u8>> = Vec::new();

    let mut rows = Vec::new();
    if bbox.y0 > SAMPLE_MARGIN {
        rows.push(bbox.y0 - SAMPLE_MARGIN);
    }
    if bbox.y1 + SAMPLE_MARGIN < height {
        rows.push(bbox.y1 + SAMPLE_PAD);
    }
    for y in rows {
        for x in (bbox.x0..bbox.x1.min(width)).step_by(SAMPLE_STRIDE) {
            samples.push(*page.get_pixel(x, y));
        }
    }

    let mut cols = Vec::new();
    if bbox.x0 > SAMPLE_MARGIN {
        cols.push(bbox.x0 - SAMPLE_MARGIN);
    }
    if bbox.x1 + SAMPLE_MARGIN < width {
        cols.push(bbox.x1 + SAMPLE_PAD);
    }
    for x in cols {
        for y in (bbox.y0..bbox.y1.min(height)).step_by(SAMPLE_STRIDE) {
            samples.push(*page.get_pixel(x, y));
        }
    }

    if samples.is_empty() {
        return WHITE;
    }

    Rgb([
        channel_median(&samples, 0),
        channel_median(&samples, 1),
        channel_median(&samples, 2),
    ])
}

fn channel_median(samples: &[Rgb<u8>], channel: usize) -> u8 {
    let mut values: Vec<u8> = samples.iter().map(|px| px.0[channel]).collect();
    values.sort_unstable();
    values[values.len() / 2]
}

/// Picks white or black text for maximum contrast against the background,
/// by perceptual luminance.
pub fn choose_foreground(background: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = background.0;
    let luminance = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
    if luminance < 128.0 { WHITE } else { BLACK }
}
