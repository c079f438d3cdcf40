mod engine;

pub use engine::{detect_regions, list_tesseract_languages};

/// Axis-aligned rectangle in page-image pixel coordinates.
/// Well-formed boxes satisfy `x1 > x0` and `y1 > y0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RegionBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl RegionBox {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn is_degenerate(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Clips the box to a page of the given dimensions. The result may be
    /// degenerate if the box lies entirely outside the page.
    pub fn clamped(&self, page_width: u32, page_height: u32) -> RegionBox {
        RegionBox {
            x0: self.x0.min(page_width),
            y0: self.y0.min(page_height),
            x1: self.x1.min(page_width),
            y1: self.y1.min(page_height),
        }
    }
}

/// Style hints recovered from OCR markup. Advisory: rendering falls back to
/// the regular face when no matching variant is installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TextStyle {
    pub bold: bool,
    pub underline: bool,
}

/// One detected line of text on a page. `translated_text` starts out empty
/// and is filled in by the translation step; a region whose translation is
/// still empty afterwards is left untouched on the page.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TextRegion {
    pub bbox: RegionBox,
    pub source_text: String,
    pub translated_text: String,
    pub style: TextStyle,
    pub confidence: f32,
}

impl TextRegion {
    pub fn new(bbox: RegionBox, source_text: impl Into<String>) -> Self {
        Self {
            bbox,
            source_text: source_text.into(),
            translated_text: String::new(),
            style: TextStyle::default(),
            confidence: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_dimensions() {
        let bbox = RegionBox::new(10, 20, 110, 50);
        assert_eq!(bbox.width(), 100);
        assert_eq!(bbox.height(), 30);
        assert!(!bbox.is_degenerate());
    }

    #[test]
    fn degenerate_boxes() {
        assert!(RegionBox::new(10, 10, 10, 40).is_degenerate());
        assert!(RegionBox::new(10, 10, 40, 10).is_degenerate());
        assert!(RegionBox::new(40, 40, 10, 10).is_degenerate());
    }

    #[test]
    fn clamping_to_page_bounds() {
        let bbox = RegionBox::new(90, 90, 150, 160).clamped(100, 100);
        assert_eq!(bbox, RegionBox::new(90, 90, 100, 100));

        let outside = RegionBox::new(200, 200, 300, 300).clamped(100, 100);
        assert!(outside.is_degenerate());
    }
}
