use anyhow::Result;
use std::path::{Path, PathBuf};

pub mod logging;
pub mod ocr;
pub mod pages;
pub mod pdf;
pub mod render;
pub mod settings;
pub mod translate;
mod translator;

#[cfg(test)]
mod test_util;

pub use translator::PdfTranslator;

#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub pages: String,
    pub dpi: Option<u32>,
    pub ocr_languages: Option<String>,
    pub font_path: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub settings_path: Option<String>,
    pub debug_ocr: bool,
}

pub async fn run(config: Config) -> Result<PathBuf> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;

    if let Some(lang) = config.source_lang.filter(|lang| !lang.trim().is_empty()) {
        settings.source_lang = lang.trim().to_string();
    }
    if let Some(lang) = config.target_lang.filter(|lang| !lang.trim().is_empty()) {
        settings.target_lang = lang.trim().to_string();
    }
    if let Some(languages) = config.ocr_languages.filter(|langs| !langs.trim().is_empty()) {
        settings.ocr_languages = languages.trim().to_string();
    }
    if let Some(dpi) = config.dpi.filter(|dpi| *dpi > 0) {
        settings.pdf_dpi = dpi;
    }
    if let Some(jobs) = config.jobs.filter(|jobs| *jobs > 0) {
        settings.workers = jobs;
    }
    if let Some(font) = config.font_path {
        settings.font_path = Some(font.display().to_string());
    }

    let font_override = settings
        .font_path
        .as_deref()
        .filter(|path| !path.trim().is_empty())
        .map(Path::new);
    let fonts = render::FontLibrary::load(&settings.target_lang, font_override);

    let backend = translate::GoogleTranslate::new();
    let translator = PdfTranslator::new(settings, backend, fonts).with_debug_ocr(config.debug_ocr);
    translator
        .translate_file(&config.input, config.output.as_deref(), &config.pages)
        .await
}
