use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::ocr::TextStyle;

// Fallback vertical metrics when no font face could be loaded.
const ESTIMATE_LINE_HEIGHT: f32 = 1.1;
const ESTIMATE_ASCENT: f32 = 0.8;

/// Loaded regular/bold faces for the target language, shared read-only
/// across page workers. Loading never fails: with no usable font on the
/// system, text is measured with per-character estimates and regions are
/// still erased (glyphs are simply not drawn).
pub struct FontLibrary {
    regular: Option<Arc<FontVec>>,
    bold: Option<Arc<FontVec>>,
}

/// The face picked for one region's style, plus whether bold has to be
/// emulated with an offset second draw.
#[derive(Clone)]
pub struct ResolvedFont {
    face: Option<Arc<FontVec>>,
    pub synthetic_bold: bool,
}

impl FontLibrary {
    /// Loads faces for the target language, preferring an explicit override
    /// path, then per-language candidates, then generic Latin fallbacks.
    pub fn load(target_lang: &str, override_path: Option<&Path>) -> Self {
        if let Some(path) = override_path {
            if let Some(library) = Self::from_file(path) {
                return library;
            }
            warn!(
                "font override {} could not be loaded, falling back to discovery",
                path.display()
            );
        }

        for name in candidate_files(target_lang) {
            let Some(path) = find_font_file(name) else {
                continue;
            };
            if let Some(library) = Self::from_file(&path) {
                debug!("loaded font {}", path.display());
                return library;
            }
        }

        warn!(
            "no usable font found for '{}', regions will be erased without redrawn text",
            target_lang
        );
        Self::empty()
    }

    pub fn empty() -> Self {
        Self {
            regular: None,
            bold: None,
        }
    }

    fn from_file(path: &Path) -> Option<Self> {
        let (regular, bold) = load_collection(path)?;
        let bold = bold.or_else(|| {
            bold_sibling(path)
                .and_then(|sibling| load_collection(&sibling))
                .map(|(face, _)| face)
        });
        Some(Self {
            regular: Some(regular),
            bold,
        })
    }

    pub fn resolve(&self, style: TextStyle) -> ResolvedFont {
        if style.bold {
            if let Some(bold) = &self.bold {
                return ResolvedFont {
                    face: Some(bold.clone()),
                    synthetic_bold: false,
                };
            }
            return ResolvedFont {
                face: self.regular.clone(),
                synthetic_bold: true,
            };
        }
        ResolvedFont {
            face: self.regular.clone(),
            synthetic_bold: false,
        }
    }
}

impl ResolvedFont {
    pub fn has_face(&self) -> bool {
        self.face.is_some()
    }

    pub(crate) fn face(&self) -> Option<&FontVec> {
        self.face.as_deref()
    }

    /// Width of one line of text at the given pixel size. With a loaded
    /// face this sums glyph advances; without one it falls back to
    /// per-character width estimates so layout stays deterministic.
    pub fn line_width(&self, text: &str, size: f32) -> f32 {
        match &self.face {
            Some(font) => {
                let scaled = font.as_scaled(PxScale::from(size));
                text.chars()
                    .map(|ch| scaled.h_advance(font.glyph_id(ch)))
                    .sum()
            }
            None => text.chars().map(estimate_char_units).sum::<f32>() * size,
        }
    }

    pub fn char_width(&self, ch: char, size: f32) -> f32 {
        match &self.face {
            Some(font) => font
                .as_scaled(PxScale::from(size))
                .h_advance(font.glyph_id(ch)),
            None => estimate_char_units(ch) * size,
        }
    }

    /// Vertical distance between consecutive baselines.
    pub fn line_height(&self, size: f32) -> f32 {
        match &self.face {
            Some(font) => {
                let scaled = font.as_scaled(PxScale::from(size));
                scaled.ascent() - scaled.descent() + scaled.line_gap()
            }
            None => size * ESTIMATE_LINE_HEIGHT,
        }
    }

    pub fn ascent(&self, size: f32) -> f32 {
        match &self.face {
            Some(font) => font.as_scaled(PxScale::from(size)).ascent(),
            None => size * ESTIMATE_ASCENT,
        }
    }
}

fn estimate_char_units(ch: char) -> f32 {
    if ch.is_whitespace() {
        0.25
    } else if ch.is_ascii_alphanumeric() {
        0.55
    } else if ch.is_ascii() {
        0.35
    } else if matches!(
        ch as u32,
        0x4E00..=0x9FFF | 0x3040..=0x30FF | 0x31F0..=0x31FF
    ) {
        1.0
    } else {
        0.9
    }
}

/// Loads the regular and bold faces out of one font file. Collections
/// (.ttc) are walked face by face; plain files yield a single face
/// classified by its weight flag.
fn load_collection(path: &Path) -> Option<(Arc<FontVec>, Option<Arc<FontVec>>)> {
    let data = std::fs::read(path).ok()?;
    let count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);

    let mut regular_index = None;
    let mut bold_index = None;
    for index in 0..count {
        let Ok(face) = ttf_parser::Face::parse(&data, index) else {
            continue;
        };
        if face.is_bold() {
            bold_index.get_or_insert(index);
        } else {
            regular_index.get_or_insert(index);
        }
    }

    let primary = regular_index.or(bold_index)?;
    let regular = FontVec::try_from_vec_and_index(data.clone(), primary).ok()?;
    let bold = bold_index
        .filter(|index| *index != primary)
        .and_then(|index| FontVec::try_from_vec_and_index(data.clone(), index).ok())
        .map(Arc::new);
    Some((Arc::new(regular), bold))
}

/// `DejaVuSans.ttf` -> `DejaVuSans-Bold.ttf` next to it, if present.
fn bold_sibling(path: &Path) -> Option<PathBuf> {
    let stem = path.file_stem()?.to_str()?;
    let ext = path.extension()?.to_str()?;
    let trimmed = stem.strip_suffix("-Regular").unwrap_or(stem);
    let sibling = path.with_file_name(format!("{trimmed}-Bold.{ext}"));
    sibling.exists().then_some(sibling)
}

fn candidate_files(target_lang: &str) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = match target_lang {
        "hi" | "mr" | "ne" => vec![
            "NotoSansDevanagari-Regular.ttf",
            "Lohit-Devanagari.ttf",
            "Kohinoor.ttc",
            "Devanagari Sangam MN.ttc",
        ],
        "ja" => vec!["NotoSansCJK-Regular.ttc", "Hiragino Sans W3.ttc"],
        "ko" => vec!["NotoSansCJK-Regular.ttc", "AppleSDGothicNeo.ttc"],
        "zh" | "zh-CN" | "zh-TW" => vec!["NotoSansCJK-Regular.ttc", "PingFang.ttc"],
        "ar" => vec!["NotoSansArabic-Regular.ttf", "Geeza Pro.ttc"],
        _ => Vec::new(),
    };
    names.extend([
        "DejaVuSans.ttf",
        "NotoSans-Regular.ttf",
        "LiberationSans-Regular.ttf",
        "FreeSans.ttf",
        "Helvetica.ttc",
        "Arial.ttf",
        "arial.ttf",
    ]);
    names
}

#[cfg(target_os = "macos")]
fn font_directories() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from("/System/Library/Fonts/Supplemental"),
        PathBuf::from("/Library/Fonts"),
    ];
    if let Ok(home) = std::env::var("HOME") {
        dirs.push(Path::new(&home).join("Library/Fonts"));
    }
    dirs
}

#[cfg(target_os = "windows")]
fn font_directories() -> Vec<PathBuf> {
    vec![PathBuf::from("C:\\Windows\\Fonts")]
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn font_directories() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
    ];
    if let Ok(home) = std::env::var("HOME") {
        dirs.push(Path::new(&home).join(".fonts"));
        dirs.push(Path::new(&home).join(".local/share/fonts"));
    }
    dirs
}

fn find_font_file(name: &str) -> Option<PathBuf> {
    for dir in font_directories() {
        if let Some(path) = find_in_dir(&dir, name, 3) {
            return Some(path);
        }
    }
    None
}

fn find_in_dir(dir: &Path, name: &str, depth: u32) -> Option<PathBuf> {
    let direct = dir.join(name);
    if direct.is_file() {
        return Some(direct);
    }
    if depth == 0 {
        return None;
    }
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_in_dir(&path, name, depth - 1) {
                return Some(found);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_widths_are_deterministic() {
        let font = FontLibrary::empty().resolve(TextStyle::default());
        assert!(!font.has_face());
        // 10 alphanumerics and one space
        let width = font.line_width("Hello World", 10.0);
        assert!((width - 57.5).abs() < 0.001);
        assert!((font.char_width(' ', 10.0) - 2.5).abs() < 0.001);
    }

    #[test]
    fn estimate_vertical_metrics_scale_with_size() {
        let font = FontLibrary::empty().resolve(TextStyle::default());
        assert!((font.line_height(10.0) - 11.0).abs() < 0.001);
        assert!((font.ascent(10.0) - 8.0).abs() < 0.001);
    }

    #[test]
    fn bold_without_bold_face_is_synthetic() {
        let library = FontLibrary::empty();
        let bold = library.resolve(TextStyle {
            bold: true,
            underline: false,
        });
        assert!(bold.synthetic_bold);
        let regular = library.resolve(TextStyle::default());
        assert!(!regular.synthetic_bold);
    }

    #[test]
    fn bold_sibling_naming() {
        let path = Path::new("/tmp/definitely-missing/DejaVuSans.ttf");
        // sibling does not exist on disk, so lookup returns None
        assert!(bold_sibling(path).is_none());
    }

    #[test]
    fn wider_scripts_measure_wider() {
        let font = FontLibrary::empty().resolve(TextStyle::default());
        let latin = font.line_width("ab", 12.0);
        let cjk = font.line_width("\u{65e5}\u{672c}", 12.0);
        assert!(cjk > latin);
    }
}
