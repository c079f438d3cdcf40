use crate::ocr::TextStyle;

/// Removes inline markup that tesseract's hOCR output wraps around words
/// (`<strong>`, `<em>`, ...) and records the style hints we can render.
/// Italic has no counterpart in the renderer and is dropped.
pub(super) fn strip_markup(raw: &str) -> (String, TextStyle) {
    let mut style = TextStyle::default();
    let mut out = String::new();
    let mut tag = String::new();
    let mut in_tag = false;

    for ch in raw.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                match tag_name(&tag).as_str() {
                    "b" | "strong" => style.bold = true,
                    "u" | "ins" => style.underline = true,
                    _ => {}
                }
            }
            _ if in_tag => tag.push(ch),
            _ => out.push(ch),
        }
    }

    (collapse_whitespace(out.trim()), style)
}

fn tag_name(tag: &str) -> String {
    tag.trim()
        .trim_start_matches('/')
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

pub(super) fn collapse_whitespace(value: &str) -> String {
    let mut out = String::new();
    let mut last_space = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    out
}

pub(super) fn decode_entities(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace('\u{00a0}', " ")
}
