use crate::ocr::{RegionBox, TextStyle};

use super::font::ResolvedFont;

pub const MIN_FONT_SIZE: f32 = 6.0;
pub const MAX_FONT_SIZE: f32 = 48.0;
const MIN_START_SIZE: f32 = 8.0;
const SHRINK_STEP: f32 = 1.0;
const BOX_HEIGHT_RATIO: f32 = 0.75;
pub(crate) const TEXT_PAD: f32 = 2.0;

/// One laid-out line, positioned relative to the region's top-left corner.
#[derive(Debug, Clone)]
pub struct PlannedLine {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub underline: bool,
}

/// The outcome of fitting a region's text: a font size, the wrapped
/// lines, and whether the text still spills past the box at the minimum
/// size.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub font_size: f32,
    pub lines: Vec<PlannedLine>,
    pub overflowed: bool,
}

impl RenderPlan {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Fits `text` into `bbox`: starts at a size proportional to the box
/// height, wraps into lines, and shrinks one point at a time until the
/// wrapped block fits vertically or the minimum size is reached. The
/// fitted block is centered vertically; an overflowing one is pinned to
/// the top so the leading lines stay readable.
pub fn plan_region(
    text: &str,
    bbox: RegionBox,
    style: TextStyle,
    font: &ResolvedFont,
) -> RenderPlan {
    let start_size =
        (bbox.height() as f32 * BOX_HEIGHT_RATIO).clamp(MIN_START_SIZE, MAX_FONT_SIZE);

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return RenderPlan {
            font_size: start_size,
            lines: Vec::new(),
            overflowed: false,
        };
    }

    let max_width = (bbox.width() as f32 - 2.0 * TEXT_PAD).max(1.0);
    let max_height = (bbox.height() as f32 - 2.0 * TEXT_PAD).max(1.0);

    let mut size = start_size;
    let mut overflowed = false;
    let (lines, block_height) = loop {
        let lines = wrap_lines(trimmed, font, size, max_width);
        let block_height = lines.len() as f32 * font.line_height(size);
        if block_height <= max_height {
            break (lines, block_height);
        }
        if size <= MIN_FONT_SIZE {
            overflowed = true;
            break (lines, block_height);
        }
        size = (size - SHRINK_STEP).max(MIN_FONT_SIZE);
    };

    let top = if overflowed {
        TEXT_PAD
    } else {
        TEXT_PAD + (max_height - block_height).max(0.0) / 2.0
    };
    let line_height = font.line_height(size);
    let ascent = font.ascent(size);

    let lines = lines
        .into_iter()
        .enumerate()
        .map(|(index, text)| PlannedLine {
            text,
            x: TEXT_PAD,
            baseline: top + index as f32 * line_height + ascent,
            underline: style.underline,
        })
        .collect();

    RenderPlan {
        font_size: size,
        lines,
        overflowed,
    }
}

/// Greedy word wrap. Words wider than a whole line are broken at the
/// character level; the final fragment stays open so following words can
/// share its line.
fn wrap_lines(text: &str, font: &ResolvedFont, size: f32, max_width: f32) -> Vec<String> {
    let space_width = font.char_width(' ', size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0f32;

    for word in text.split_whitespace() {
        let word_width = font.line_width(word, size);
        if word_width > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let (full, tail, tail_width) = break_word(word, font, size, max_width);
            lines.extend(full);
            current = tail;
            current_width = tail_width;
        } else if current.is_empty() {
            current = word.to_string();
            current_width = word_width;
        } else if current_width + space_width + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += space_width + word_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
            current_width = word_width;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Splits an oversized word into fragments that each fit `max_width`.
/// Returns the full fragments and the unfinished last one with its width.
fn break_word(
    word: &str,
    font: &ResolvedFont,
    size: f32,
    max_width: f32,
) -> (Vec<String>, String, f32) {
    let mut full = Vec::new();
    let mut fragment = String::new();
    let mut fragment_width = 0.0f32;

    for ch in word.chars() {
        let ch_width = font.char_width(ch, size);
        if !fragment.is_empty() && fragment_width + ch_width > max_width {
            full.push(std::mem::take(&mut fragment));
            fragment_width = 0.0;
        }
        fragment.push(ch);
        fragment_width += ch_width;
    }
    (full, fragment, fragment_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::font::FontLibrary;

    fn estimate_font() -> ResolvedFont {
        FontLibrary::empty().resolve(TextStyle::default())
    }

    #[test]
    fn empty_text_plans_nothing() {
        let plan = plan_region("   ", RegionBox::new(0, 0, 100, 30), TextStyle::default(), &estimate_font());
        assert!(plan.is_empty());
        assert!(!plan.overflowed);
    }

    #[test]
    fn short_text_fits_on_one_line() {
        let plan = plan_region(
            "Hello World",
            RegionBox::new(0, 0, 200, 50),
            TextStyle::default(),
            &estimate_font(),
        );
        assert_eq!(plan.lines.len(), 1);
        assert!(!plan.overflowed);
        assert_eq!(plan.lines[0].text, "Hello World");
        assert!(plan.font_size <= MAX_FONT_SIZE);
        assert!(plan.font_size > MIN_FONT_SIZE);
    }

    #[test]
    fn long_text_wraps_and_shrinks() {
        let plan = plan_region(
            "The quick brown fox jumps over the lazy dog near the river bank",
            RegionBox::new(0, 0, 160, 60),
            TextStyle::default(),
            &estimate_font(),
        );
        assert!(plan.lines.len() > 1);
        assert!(!plan.overflowed);
        let font = estimate_font();
        let max_width = 160.0 - 2.0 * TEXT_PAD;
        for line in &plan.lines {
            assert!(font.line_width(&line.text, plan.font_size) <= max_width + 0.001);
        }
        // successive baselines move down
        assert!(plan.lines[1].baseline > plan.lines[0].baseline);
    }

    #[test]
    fn hopeless_text_bottoms_out_and_flags_overflow() {
        let text = "a".repeat(500);
        let plan = plan_region(
            &text,
            RegionBox::new(0, 0, 50, 20),
            TextStyle::default(),
            &estimate_font(),
        );
        assert!(plan.overflowed);
        assert!((plan.font_size - MIN_FONT_SIZE).abs() < 0.001);
        let font = estimate_font();
        let max_width = 50.0 - 2.0 * TEXT_PAD;
        for line in &plan.lines {
            assert!(font.line_width(&line.text, plan.font_size) <= max_width + 0.001);
        }
    }

    #[test]
    fn oversized_word_is_broken_mid_word() {
        let plan = plan_region(
            "see supercalifragilisticexpialidocious now",
            RegionBox::new(0, 0, 90, 120),
            TextStyle::default(),
            &estimate_font(),
        );
        assert!(plan.lines.len() >= 3);
        let rejoined: String = plan
            .lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("");
        assert!(rejoined.contains("supercali"));
    }

    #[test]
    fn underline_style_reaches_every_line() {
        let style = TextStyle {
            bold: false,
            underline: true,
        };
        let plan = plan_region(
            "one two three four five six seven",
            RegionBox::new(0, 0, 80, 80),
            style,
            &estimate_font(),
        );
        assert!(plan.lines.len() > 1);
        assert!(plan.lines.iter().all(|line| line.underline));
    }
}
