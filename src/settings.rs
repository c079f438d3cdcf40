use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub source_lang: String,
    pub target_lang: String,
    pub pdf_dpi: u32,
    pub ocr_languages: String,
    pub min_confidence: f32,
    pub workers: usize,
    pub font_path: Option<String>,
    pub debug_dir: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_lang: "en".to_string(),
            target_lang: "hi".to_string(),
            pdf_dpi: 200,
            ocr_languages: "eng".to_string(),
            min_confidence: 20.0,
            workers: num_cpus::get().saturating_sub(1).max(1),
            font_path: None,
            debug_dir: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    translation: Option<TranslationSettings>,
    pdf: Option<PdfSettings>,
    ocr: Option<OcrSettings>,
    render: Option<RenderSettings>,
    system: Option<SystemSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslationSettings {
    source_lang: Option<String>,
    target_lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PdfSettings {
    dpi: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    languages: Option<String>,
    min_confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderSettings {
    font_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SystemSettings {
    workers: Option<usize>,
    debug_dir: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(translation) = incoming.translation {
            if let Some(lang) = translation.source_lang {
                if !lang.trim().is_empty() {
                    self.source_lang = lang.trim().to_string();
                }
            }
            if let Some(lang) = translation.target_lang {
                if !lang.trim().is_empty() {
                    self.target_lang = lang.trim().to_string();
                }
            }
        }
        if let Some(pdf) = incoming.pdf {
            if let Some(dpi) = pdf.dpi {
                if dpi > 0 {
                    self.pdf_dpi = dpi;
                }
            }
        }
        if let Some(ocr) = incoming.ocr {
            if let Some(languages) = ocr.languages {
                if !languages.trim().is_empty() {
                    self.ocr_languages = languages.trim().to_string();
                }
            }
            if let Some(conf) = ocr.min_confidence {
                if conf >= 0.0 {
                    self.min_confidence = conf;
                }
            }
        }
        if let Some(render) = incoming.render {
            if let Some(path) = render.font_path {
                if !path.trim().is_empty() {
                    self.font_path = Some(path.trim().to_string());
                }
            }
        }
        if let Some(system) = incoming.system {
            if let Some(workers) = system.workers {
                if workers > 0 {
                    self.workers = workers;
                }
            }
            if let Some(dir) = system.debug_dir {
                if !dir.trim().is_empty() {
                    self.debug_dir = Some(dir.trim().to_string());
                }
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".pdf-translator-rust"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_home;

    #[test]
    fn defaults_when_no_files_present() {
        with_temp_home(|_| {
            let settings = load_settings(None).unwrap();
            assert_eq!(settings.source_lang, "en");
            assert_eq!(settings.target_lang, "hi");
            assert_eq!(settings.pdf_dpi, 200);
            assert_eq!(settings.ocr_languages, "eng");
            assert!(settings.font_path.is_none());
        });
    }

    #[test]
    fn first_run_seeds_home_settings_file() {
        with_temp_home(|home| {
            load_settings(None).unwrap();
            let seeded = home.join(".pdf-translator-rust").join("settings.toml");
            assert!(seeded.exists());
        });
    }

    #[test]
    fn extra_settings_file_overrides_defaults() {
        with_temp_home(|home| {
            let extra = home.join("override.toml");
            fs::write(
                &extra,
                r#"
[translation]
target_lang = "de"

[pdf]
dpi = 300

[system]
workers = 2
"#,
            )
            .unwrap();
            let settings = load_settings(Some(&extra)).unwrap();
            assert_eq!(settings.target_lang, "de");
            assert_eq!(settings.source_lang, "en");
            assert_eq!(settings.pdf_dpi, 300);
            assert_eq!(settings.workers, 2);
        });
    }

    #[test]
    fn blank_and_zero_values_do_not_override() {
        with_temp_home(|home| {
            let extra = home.join("override.toml");
            fs::write(
                &extra,
                r#"
[translation]
target_lang = "  "

[pdf]
dpi = 0

[render]
font_path = ""
"#,
            )
            .unwrap();
            let settings = load_settings(Some(&extra)).unwrap();
            assert_eq!(settings.target_lang, "hi");
            assert_eq!(settings.pdf_dpi, 200);
            assert!(settings.font_path.is_none());
        });
    }

    #[test]
    fn missing_extra_settings_file_is_an_error() {
        with_temp_home(|home| {
            let missing = home.join("nope.toml");
            assert!(load_settings(Some(&missing)).is_err());
        });
    }
}
