mod parse;
mod style;
mod tesseract;

pub use tesseract::list_tesseract_languages;

use anyhow::{Context, Result};
use image::GenericImageView;
use std::io::Write;
use tracing::debug;

use crate::ocr::TextRegion;

/// Runs tesseract over one rasterized page and returns detected text lines
/// as regions: page-bounded, non-degenerate, sorted top-to-bottom then
/// left-to-right. hOCR output is preferred for its style markup; TSV is the
/// fallback when hOCR parses to nothing.
pub fn detect_regions(
    image_bytes: &[u8],
    languages: &str,
    dpi: u32,
    min_confidence: f32,
) -> Result<Vec<TextRegion>> {
    let image = image::load_from_memory(image_bytes)
        .with_context(|| "failed to decode page image for OCR")?;
    let (width, height) = image.dimensions();
    let languages = tesseract::normalize_languages(languages)?;

    let mut tmp = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .with_context(|| "failed to create temp file for OCR")?;
    image
        .write_to(&mut tmp, image::ImageFormat::Png)
        .with_context(|| "failed to write temp image for OCR")?;
    tmp.flush().ok();

    let hocr = tesseract::run_tesseract(tmp.path(), &languages, "hocr", dpi)?;
    let mut regions = parse::parse_hocr(&hocr);
    if regions.is_empty() {
        let tsv = tesseract::run_tesseract(tmp.path(), &languages, "tsv", dpi)?;
        regions = parse::parse_tsv(&tsv);
    }

    regions.retain(|region| region.confidence >= min_confidence);
    for region in &mut regions {
        region.bbox = region.bbox.clamped(width, height);
    }
    regions.retain(|region| !region.bbox.is_degenerate());
    regions.sort_by_key(|region| (region.bbox.y0, region.bbox.x0));

    debug!("ocr: {} regions in {}x{} page", regions.len(), width, height);
    Ok(regions)
}
