//! Page elements as a tagged union over the four element kinds.

use crate::color::RgbaColor;
use crate::ids::ElementId;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// The four element kinds, without their payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Image,
    Text,
    Note,
    Shape,
}

impl ElementType {
    pub fn name(self) -> &'static str {
        match self {
            ElementType::Image => "image",
            ElementType::Text => "text",
            ElementType::Note => "note",
            ElementType::Shape => "shape",
        }
    }
}

/// Font weight for text and notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Horizontal alignment for text and notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Typography shared by text boxes and notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_size: f64,
    pub font_weight: FontWeight,
    pub text_align: TextAlign,
    pub color: RgbaColor,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            font_weight: FontWeight::Normal,
            text_align: TextAlign::Left,
            color: RgbaColor::SLATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub content: String,
    #[serde(flatten)]
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteContent {
    pub content: String,
    #[serde(flatten)]
    pub style: TextStyle,
    pub background_color: RgbaColor,
    pub border_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    /// Data URL or file path of the image bytes.
    pub src: String,
    pub file_name: String,
    /// Corner radius used to clip the image (0 = square corners).
    #[serde(default)]
    pub border_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeContent {
    pub background_color: RgbaColor,
    pub border_radius: f64,
}

/// Type-specific payload of an element. The variant is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Image(ImageContent),
    Text(TextContent),
    Note(NoteContent),
    Shape(ShapeContent),
}

/// A positioned, sized visual unit on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    pub(crate) id: ElementId,
    /// Top-left corner in page space.
    pub position: Point,
    pub size: Size,
    /// Reserved; always 0.
    #[serde(default)]
    pub rotation: f64,
    /// Paint-order key, higher paints later.
    pub z_index: i64,
    /// Locked elements cannot be moved or resized interactively.
    #[serde(default)]
    pub locked: bool,
    pub opacity: f64,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl PageElement {
    /// Create an element with default flags (z-index 1, unlocked, opaque).
    pub fn new(id: ElementId, position: Point, size: Size, kind: ElementKind) -> Self {
        Self {
            id,
            position,
            size,
            rotation: 0.0,
            z_index: 1,
            locked: false,
            opacity: 1.0,
            kind,
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// Clone this element under a different id.
    pub fn with_id(&self, id: ElementId) -> Self {
        Self { id, ..self.clone() }
    }

    pub fn element_type(&self) -> ElementType {
        match self.kind {
            ElementKind::Image(_) => ElementType::Image,
            ElementKind::Text(_) => ElementType::Text,
            ElementKind::Note(_) => ElementType::Note,
            ElementKind::Shape(_) => ElementType::Shape,
        }
    }

    /// Bounding box in page space.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Whether the element carries editable text (text boxes and notes).
    pub fn is_text_like(&self) -> bool {
        matches!(self.kind, ElementKind::Text(_) | ElementKind::Note(_))
    }

    /// Text content and style for text boxes and notes.
    pub fn text(&self) -> Option<(&str, &TextStyle)> {
        match &self.kind {
            ElementKind::Text(text) => Some((&text.content, &text.style)),
            ElementKind::Note(note) => Some((&note.content, &note.style)),
            ElementKind::Image(_) | ElementKind::Shape(_) => None,
        }
    }

    pub fn background_color(&self) -> Option<RgbaColor> {
        match &self.kind {
            ElementKind::Note(note) => Some(note.background_color),
            ElementKind::Shape(shape) => Some(shape.background_color),
            ElementKind::Image(_) | ElementKind::Text(_) => None,
        }
    }

    pub fn corner_radius(&self) -> f64 {
        match &self.kind {
            ElementKind::Note(note) => note.border_radius,
            ElementKind::Shape(shape) => shape.border_radius,
            ElementKind::Image(image) => image.border_radius,
            ElementKind::Text(_) => 0.0,
        }
    }
}
