use std::collections::BTreeMap;

use crate::ocr::{RegionBox, TextRegion, TextStyle};

use super::style;

struct Word {
    text: String,
    style: TextStyle,
    bbox: RegionBox,
    conf: f32,
    weight: f32,
}

/// Parses tesseract hOCR output. Words are grouped under the nearest
/// preceding line-level span; inline markup inside a word is folded into the
/// region style. Confidence is the length-weighted mean of word confidences.
pub(super) fn parse_hocr(hocr: &str) -> Vec<TextRegion> {
    let mut regions = Vec::new();
    let mut words: Vec<Word> = Vec::new();
    let mut cursor = 0usize;

    while let Some(offset) = hocr[cursor..].find("<span") {
        let tag_start = cursor + offset;
        let Some(tag_len) = hocr[tag_start..].find('>') else {
            break;
        };
        let tag_end = tag_start + tag_len;
        let tag = &hocr[tag_start..tag_end];

        if is_line_tag(tag) {
            flush_line(&mut regions, &mut words);
            cursor = tag_end + 1;
            continue;
        }
        if !tag.contains("ocrx_word") {
            cursor = tag_end + 1;
            continue;
        }

        let body_start = tag_end + 1;
        let Some(body_len) = hocr[body_start..].find("</span>") else {
            break;
        };
        let raw_body = &hocr[body_start..body_start + body_len];
        if let Some(word) = parse_word(tag, raw_body) {
            words.push(word);
        }
        cursor = body_start + body_len + "</span>".len();
    }

    flush_line(&mut regions, &mut words);
    regions
}

/// Parses tesseract TSV output as a fallback when hOCR yields nothing.
/// Level-5 word rows are grouped back into lines by their
/// (page, block, paragraph, line) key.
pub(super) fn parse_tsv(tsv: &str) -> Vec<TextRegion> {
    let mut lines: BTreeMap<(u32, u32, u32, u32), Vec<Word>> = BTreeMap::new();

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        if cols[0].parse::<u32>().unwrap_or(0) != 5 {
            continue;
        }
        let conf: f32 = cols[10].parse().unwrap_or(-1.0);
        let text = cols[11].trim();
        if text.is_empty() || conf < 0.0 {
            continue;
        }
        let key = (
            cols[1].parse::<u32>().unwrap_or(0),
            cols[2].parse::<u32>().unwrap_or(0),
            cols[3].parse::<u32>().unwrap_or(0),
            cols[4].parse::<u32>().unwrap_or(0),
        );
        let geometry = (
            cols[6].parse::<u32>(),
            cols[7].parse::<u32>(),
            cols[8].parse::<u32>(),
            cols[9].parse::<u32>(),
        );
        let (Ok(left), Ok(top), Ok(width), Ok(height)) = geometry else {
            continue;
        };
        if width == 0 || height == 0 {
            continue;
        }
        lines.entry(key).or_default().push(Word {
            text: text.to_string(),
            style: TextStyle::default(),
            bbox: RegionBox::new(left, top, left + width, top + height),
            conf,
            weight: text.chars().count().max(1) as f32,
        });
    }

    let mut regions = Vec::new();
    for (_, mut words) in lines {
        words.sort_by_key(|word| word.bbox.x0);
        if let Some(region) = build_region(&words) {
            regions.push(region);
        }
    }
    regions
}

fn is_line_tag(tag: &str) -> bool {
    tag.contains("ocr_line")
        || tag.contains("ocr_header")
        || tag.contains("ocr_caption")
        || tag.contains("ocr_textfloat")
}

fn parse_word(tag: &str, raw_body: &str) -> Option<Word> {
    let bbox = bbox_from_title(tag)?;
    let conf = conf_from_title(tag).unwrap_or(0.0);
    let (text, style) = style::strip_markup(raw_body);
    let text = style::decode_entities(&text);
    let text = text.trim().to_string();
    if text.is_empty() {
        return None;
    }
    let weight = text.chars().count() as f32;
    Some(Word {
        text,
        style,
        bbox,
        conf,
        weight,
    })
}

fn flush_line(regions: &mut Vec<TextRegion>, words: &mut Vec<Word>) {
    if words.is_empty() {
        return;
    }
    let mut line = std::mem::take(words);
    line.sort_by_key(|word| word.bbox.x0);
    if let Some(region) = build_region(&line) {
        regions.push(region);
    }
}

fn build_region(words: &[Word]) -> Option<TextRegion> {
    let mut text = String::new();
    let mut bbox: Option<RegionBox> = None;
    let mut style = TextStyle::default();
    let mut conf_sum = 0.0;
    let mut weight_sum = 0.0;

    for word in words {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&word.text);
        bbox = Some(match bbox {
            Some(prev) => union_boxes(prev, word.bbox),
            None => word.bbox,
        });
        style.bold |= word.style.bold;
        style.underline |= word.style.underline;
        conf_sum += word.conf * word.weight;
        weight_sum += word.weight;
    }

    let bbox = bbox?;
    let text = text.trim().to_string();
    if text.is_empty() {
        return None;
    }
    let confidence = if weight_sum > 0.0 {
        conf_sum / weight_sum
    } else {
        0.0
    };
    Some(TextRegion {
        bbox,
        source_text: text,
        translated_text: String::new(),
        style,
        confidence,
    })
}

fn union_boxes(a: RegionBox, b: RegionBox) -> RegionBox {
    RegionBox {
        x0: a.x0.min(b.x0),
        y0: a.y0.min(b.y0),
        x1: a.x1.max(b.x1),
        y1: a.y1.max(b.y1),
    }
}

fn bbox_from_title(tag: &str) -> Option<RegionBox> {
    let title = attr_value(tag, "title")?;
    let rest = &title[title.find("bbox")? + 4..];
    let mut nums = rest
        .split([' ', ';'])
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<u32>());
    let x0 = nums.next()?.ok()?;
    let y0 = nums.next()?.ok()?;
    let x1 = nums.next()?.ok()?;
    let y1 = nums.next()?.ok()?;
    let bbox = RegionBox::new(x0, y0, x1, y1);
    (!bbox.is_degenerate()).then_some(bbox)
}

fn conf_from_title(tag: &str) -> Option<f32> {
    let title = attr_value(tag, "title")?;
    let rest = &title[title.find("x_wconf")? + "x_wconf".len()..];
    let value = rest.split([' ', ';']).find(|v| !v.is_empty())?;
    value.parse::<f32>().ok()
}

fn attr_value(tag: &str, name: &str) -> Option<String> {
    let needle = format!("{}=", name);
    let idx = tag.find(&needle)?;
    let rest = &tag[idx + needle.len()..];
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let rest = &rest[1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HOCR: &str = r#"
<div class='ocr_page' id='page_1' title='image "p.png"; bbox 0 0 600 800'>
 <div class='ocr_carea' id='block_1_1' title="bbox 40 45 262 110">
  <p class='ocr_par' id='par_1_1' lang='eng' title="bbox 40 45 262 110">
   <span class='ocr_line' id='line_1_1' title="bbox 40 45 262 71; baseline 0 -5">
    <span class='ocrx_word' id='word_1_1' title='bbox 40 45 137 66; x_wconf 96'>Hello</span>
    <span class='ocrx_word' id='word_1_2' title='bbox 150 45 262 71; x_wconf 95'><strong>World</strong></span>
   </span>
   <span class='ocr_line' id='line_1_2' title="bbox 40 90 120 110; baseline 0 -4">
    <span class='ocrx_word' id='word_1_3' title='bbox 40 90 120 110; x_wconf 91'>Second</span>
   </span>
  </p>
 </div>
</div>
"#;

    #[test]
    fn hocr_lines_become_regions() {
        let regions = parse_hocr(SAMPLE_HOCR);
        assert_eq!(regions.len(), 2);

        assert_eq!(regions[0].source_text, "Hello World");
        assert_eq!(regions[0].bbox, RegionBox::new(40, 45, 262, 71));
        assert!(regions[0].style.bold);
        assert!((regions[0].confidence - 95.5).abs() < 0.01);

        assert_eq!(regions[1].source_text, "Second");
        assert_eq!(regions[1].bbox, RegionBox::new(40, 90, 120, 110));
        assert!(!regions[1].style.bold);
    }

    #[test]
    fn hocr_decodes_entities_in_words() {
        let hocr = r#"
<span class='ocr_line' title="bbox 0 0 100 20">
 <span class='ocrx_word' title='bbox 0 0 100 20; x_wconf 90'>A&amp;B</span>
</span>
"#;
        let regions = parse_hocr(hocr);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].source_text, "A&B");
    }

    #[test]
    fn hocr_skips_words_without_geometry() {
        let hocr = r#"
<span class='ocr_line' title="bbox 0 0 100 20">
 <span class='ocrx_word' title='x_wconf 90'>lost</span>
 <span class='ocrx_word' title='bbox 5 0 60 20; x_wconf 88'>kept</span>
</span>
"#;
        let regions = parse_hocr(hocr);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].source_text, "kept");
    }

    #[test]
    fn tsv_words_group_into_lines() {
        let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
                   1\t1\t0\t0\t0\t0\t0\t0\t600\t800\t-1\t\n\
                   5\t1\t1\t1\t1\t1\t40\t45\t97\t21\t96.5\tHello\n\
                   5\t1\t1\t1\t1\t2\t150\t45\t112\t26\t95.5\tWorld\n\
                   5\t1\t1\t1\t2\t1\t40\t90\t80\t20\t91.0\tSecond\n";
        let regions = parse_tsv(tsv);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].source_text, "Hello World");
        assert_eq!(regions[0].bbox, RegionBox::new(40, 45, 262, 71));
        assert!((regions[0].confidence - 96.0).abs() < 0.01);
        assert_eq!(regions[1].source_text, "Second");
    }

    #[test]
    fn tsv_drops_empty_and_unconfident_rows() {
        let tsv = "level\tpage\tblock\tpar\tline\tword\tleft\ttop\twidth\theight\tconf\ttext\n\
                   5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t-1\tghost\n\
                   5\t1\t1\t1\t1\t2\t70\t10\t50\t20\t88\t \n\
                   5\t1\t1\t1\t1\t3\t130\t10\t0\t20\t88\tzero\n";
        assert!(parse_tsv(tsv).is_empty());
    }
}
