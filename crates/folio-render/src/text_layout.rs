//! Text measurement, greedy word wrap and bidi line reordering.

use crate::error::{RenderError, RenderResult};
use folio_core::model::FontWeight;
use fontdue::{Font, FontSettings};
use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;
use unicode_bidi::BidiInfo;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.4;

/// Measures the advance width of a run of text in page units.
pub trait TextMeasure {
    fn advance(&self, text: &str, font_size: f64, weight: FontWeight) -> f64;
}

/// Average-glyph estimate used when no font face is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMetrics;

impl TextMeasure for ApproximateMetrics {
    fn advance(&self, text: &str, font_size: f64, weight: FontWeight) -> f64 {
        let per_char = match weight {
            FontWeight::Normal => 0.55,
            FontWeight::Bold => 0.6,
        };
        text.chars().count() as f64 * font_size * per_char
    }
}

/// DejaVu Sans, shipped so text renders as glyphs without configuration.
static BUNDLED_REGULAR: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
static BUNDLED_BOLD: &[u8] = include_bytes!("../assets/DejaVuSans-Bold.ttf");

static BUNDLED: OnceLock<FontSet> = OnceLock::new();

/// Regular and bold faces. Either may be missing.
#[derive(Clone)]
pub struct FontSet {
    regular: Option<Font>,
    bold: Option<Font>,
}

impl fmt::Debug for FontSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontSet")
            .field("regular", &self.regular.is_some())
            .field("bold", &self.bold.is_some())
            .finish()
    }
}

impl Default for FontSet {
    fn default() -> Self {
        Self::bundled()
    }
}

impl FontSet {
    /// No faces: text renders as placeholder bars.
    pub fn empty() -> Self {
        Self {
            regular: None,
            bold: None,
        }
    }

    /// The built-in regular and bold faces, parsed once per process.
    pub fn bundled() -> Self {
        BUNDLED
            .get_or_init(|| Self {
                regular: parse_bundled("regular", BUNDLED_REGULAR),
                bold: parse_bundled("bold", BUNDLED_BOLD),
            })
            .clone()
    }

    /// Parse TrueType/OpenType font bytes.
    pub fn from_bytes(regular: Option<Vec<u8>>, bold: Option<Vec<u8>>) -> RenderResult<Self> {
        Ok(Self {
            regular: regular.map(parse_font).transpose()?,
            bold: bold.map(parse_font).transpose()?,
        })
    }

    /// Replace the faces that are supplied and keep the others.
    pub fn with_overrides(mut self, regular: Option<Vec<u8>>, bold: Option<Vec<u8>>) -> RenderResult<Self> {
        if let Some(bytes) = regular {
            self.regular = Some(parse_font(bytes)?);
        }
        if let Some(bytes) = bold {
            self.bold = Some(parse_font(bytes)?);
        }
        Ok(self)
    }

    pub fn has_faces(&self) -> bool {
        self.regular.is_some() || self.bold.is_some()
    }

    /// Face for a weight. Bold falls back to regular and vice versa.
    pub fn face(&self, weight: FontWeight) -> Option<&Font> {
        match weight {
            FontWeight::Bold => self.bold.as_ref().or(self.regular.as_ref()),
            FontWeight::Normal => self.regular.as_ref().or(self.bold.as_ref()),
        }
    }
}

fn parse_font(bytes: Vec<u8>) -> RenderResult<Font> {
    Font::from_bytes(bytes, FontSettings::default()).map_err(|e| RenderError::Font(e.to_string()))
}

fn parse_bundled(label: &str, bytes: &'static [u8]) -> Option<Font> {
    match Font::from_bytes(bytes, FontSettings::default()) {
        Ok(font) => Some(font),
        Err(e) => {
            log::error!("Bundled {label} font failed to load: {e}");
            None
        }
    }
}

impl TextMeasure for FontSet {
    fn advance(&self, text: &str, font_size: f64, weight: FontWeight) -> f64 {
        match self.face(weight) {
            Some(font) => text
                .chars()
                .map(|c| f64::from(font.metrics(c, font_size as f32).advance_width))
                .sum(),
            None => ApproximateMetrics.advance(text, font_size, weight),
        }
    }
}

/// Greedy word wrap on spaces.
///
/// Newlines force a break. A word wider than `max_width` stays on its own
/// line. Empty content yields a single empty line.
pub fn wrap_text(
    content: &str,
    max_width: f64,
    font_size: f64,
    weight: FontWeight,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in content.split('\n') {
        let mut line = String::new();
        for word in paragraph.split(' ') {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if !line.is_empty() && measure.advance(&candidate, font_size, weight) > max_width {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            } else {
                line = candidate;
            }
        }
        lines.push(line);
    }
    lines
}

/// Reorder a logical line into visual order for painting.
pub fn visual_line(line: &str) -> Cow<'_, str> {
    if line.is_empty() {
        return Cow::Borrowed(line);
    }
    let info = BidiInfo::new(line, None);
    if !info.has_rtl() {
        return Cow::Borrowed(line);
    }
    let mut out = String::with_capacity(line.len());
    for paragraph in &info.paragraphs {
        out.push_str(&info.reorder_line(paragraph, paragraph.range.clone()));
    }
    Cow::Owned(out)
}
