use anyhow::{Context, Result, anyhow};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use image::RgbImage;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::{debug, info, warn};

use crate::ocr::{self, TextRegion};
use crate::pages::parse_page_range;
use crate::pdf;
use crate::render::{self, FontLibrary};
use crate::settings::Settings;
use crate::translate::{TextTranslator, TranslationBackend};

/// The whole pipeline for one document: rasterize the PDF, then per page
/// run OCR, translate the recognized strings, repaint each region, and
/// finally reassemble the selected pages into a new PDF.
pub struct PdfTranslator<B> {
    settings: Settings,
    texts: TextTranslator<B>,
    fonts: Arc<FontLibrary>,
    debug_ocr: bool,
}

impl<B: TranslationBackend> PdfTranslator<B> {
    pub fn new(settings: Settings, backend: B, fonts: FontLibrary) -> Self {
        let texts = TextTranslator::new(backend, &settings.source_lang, &settings.target_lang);
        Self {
            settings,
            texts,
            fonts: Arc::new(fonts),
            debug_ocr: false,
        }
    }

    pub fn with_debug_ocr(mut self, debug_ocr: bool) -> Self {
        self.debug_ocr = debug_ocr;
        self
    }

    /// Translates `input` and writes the result next to it (or to
    /// `output`). `pages` selects which pages make it into the result,
    /// in the 1-based "all" / "5" / "1-3,7" syntax.
    pub async fn translate_file(
        &self,
        input: &Path,
        output: Option<&Path>,
        pages: &str,
    ) -> Result<PathBuf> {
        if !input.exists() {
            return Err(anyhow!("input file not found: {}", input.display()));
        }
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(input));
        let started = Instant::now();

        info!("rendering {} at {} dpi", input.display(), self.settings.pdf_dpi);
        let page_images = pdf::rasterize_pdf(input, self.settings.pdf_dpi)?;
        if page_images.is_empty() {
            return Err(anyhow!("no pages found in pdf"));
        }

        let selected = parse_page_range(pages, page_images.len());
        if selected.is_empty() {
            return Err(anyhow!("no valid pages selected by '{}'", pages));
        }
        info!(
            "translating {} of {} pages ({} -> {})",
            selected.len(),
            page_images.len(),
            self.settings.source_lang,
            self.settings.target_lang
        );

        let jobs = self.settings.workers.max(1);
        let mut translated: Vec<(usize, Vec<u8>)> = stream::iter(
            selected
                .iter()
                .map(|&index| self.translate_page(index, &page_images[index], input)),
        )
        .buffer_unordered(jobs)
        .try_collect()
        .await?;
        translated.sort_by_key(|(index, _)| *index);

        let ordered: Vec<Vec<u8>> = translated.into_iter().map(|(_, bytes)| bytes).collect();
        let pdf_bytes = pdf::assemble_pdf(&ordered, self.settings.pdf_dpi)?;
        std::fs::write(&output, &pdf_bytes)
            .with_context(|| format!("failed to write {}", output.display()))?;

        info!(
            "wrote {} in {:.1}s",
            output.display(),
            started.elapsed().as_secs_f32()
        );
        Ok(output)
    }

    async fn translate_page(
        &self,
        index: usize,
        image_bytes: &[u8],
        input: &Path,
    ) -> Result<(usize, Vec<u8>)> {
        let bytes = image_bytes.to_vec();
        let languages = self.settings.ocr_languages.clone();
        let dpi = self.settings.pdf_dpi;
        let min_confidence = self.settings.min_confidence;
        let mut regions =
            task::spawn_blocking(move || ocr::detect_regions(&bytes, &languages, dpi, min_confidence))
                .await
                .context("ocr task failed")??;
        debug!("page {}: {} text regions", index + 1, regions.len());
        if regions.is_empty() {
            return Ok((index, image_bytes.to_vec()));
        }

        let texts: Vec<String> = regions
            .iter()
            .map(|region| region.source_text.clone())
            .collect();
        let translations = self.texts.translate_batch(&texts).await;
        for (region, translation) in regions.iter_mut().zip(translations) {
            region.translated_text = translation;
        }

        if self.debug_ocr {
            if let Err(err) = self.write_debug_artifacts(index, image_bytes, &regions, input) {
                warn!("failed to write ocr debug output for page {}: {}", index + 1, err);
            }
        }

        let fonts = self.fonts.clone();
        let bytes = image_bytes.to_vec();
        let composed = task::spawn_blocking(move || -> Result<Vec<u8>> {
            let image = image::load_from_memory(&bytes).context("failed to decode rendered page")?;
            let mut page = image.to_rgb8();
            render::compose_page(&mut page, &regions, &fonts);
            encode_png(&page)
        })
        .await
        .context("page compose task failed")??;

        Ok((index, composed))
    }

    /// Drops a region-outlined PNG and the raw region list next to the
    /// input (or into the configured debug directory) for inspection.
    fn write_debug_artifacts(
        &self,
        index: usize,
        image_bytes: &[u8],
        regions: &[TextRegion],
        input: &Path,
    ) -> Result<()> {
        let dir = match &self.settings.debug_dir {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let stem = input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("page");

        let image = image::load_from_memory(image_bytes)?;
        let mut page = image.to_rgb8();
        render::draw_region_boxes(&mut page, regions);
        let png_path = dir.join(format!("{stem}-page-{:03}.ocr.png", index + 1));
        page.save(&png_path)
            .with_context(|| format!("failed to write {}", png_path.display()))?;

        let json_path = dir.join(format!("{stem}-page-{:03}.ocr.json", index + 1));
        let json = serde_json::to_vec_pretty(regions)?;
        std::fs::write(&json_path, json)
            .with_context(|| format!("failed to write {}", json_path.display()))?;
        debug!("wrote ocr debug output to {}", png_path.display());
        Ok(())
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{stem}_translated.pdf"))
}

fn encode_png(page: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    page.write_to(&mut cursor, image::ImageFormat::Png)
        .context("failed to encode page")?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::GoogleTranslate;

    #[test]
    fn output_path_keeps_directory_and_stem() {
        let path = default_output_path(Path::new("/docs/paper.pdf"));
        assert_eq!(path, Path::new("/docs/paper_translated.pdf"));
        let dotted = default_output_path(Path::new("notes.v2.pdf"));
        assert_eq!(dotted, Path::new("notes.v2_translated.pdf"));
    }

    #[test]
    fn encoded_pages_decode_back() {
        let page = RgbImage::from_pixel(6, 4, image::Rgb([1, 2, 3]));
        let bytes = encode_png(&page).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (6, 4));
        assert_eq!(*decoded.get_pixel(3, 2), image::Rgb([1, 2, 3]));
    }

    #[tokio::test]
    async fn missing_input_is_an_error() {
        let translator = PdfTranslator::new(
            Settings::default(),
            GoogleTranslate::new(),
            FontLibrary::empty(),
        );
        let result = translator
            .translate_file(Path::new("/definitely/not/here.pdf"), None, "all")
            .await;
        assert!(result.is_err());
    }
}
