//! Partial element updates.

use super::element::{ElementKind, FontWeight, PageElement, TextAlign, TextStyle};
use super::{MAX_FONT_SIZE, MIN_ELEMENT_SIZE, MIN_FONT_SIZE};
use crate::color::RgbaColor;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Fields to merge into an existing element. `None` leaves a field unchanged.
///
/// Fields that do not apply to the element's kind are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementUpdate {
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub z_index: Option<i64>,
    pub locked: Option<bool>,
    pub opacity: Option<f64>,
    pub content: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<FontWeight>,
    pub text_align: Option<TextAlign>,
    pub color: Option<RgbaColor>,
    pub background_color: Option<RgbaColor>,
    pub border_radius: Option<f64>,
    pub src: Option<String>,
    pub file_name: Option<String>,
}

impl ElementUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_z_index(mut self, z_index: i64) -> Self {
        self.z_index = Some(z_index);
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = Some(font_size);
        self
    }

    pub fn with_font_weight(mut self, font_weight: FontWeight) -> Self {
        self.font_weight = Some(font_weight);
        self
    }

    pub fn with_text_align(mut self, text_align: TextAlign) -> Self {
        self.text_align = Some(text_align);
        self
    }

    pub fn with_color(mut self, color: RgbaColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_background_color(mut self, color: RgbaColor) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn with_border_radius(mut self, radius: f64) -> Self {
        self.border_radius = Some(radius);
        self
    }

    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge into `element`, clamping opacity, size and font size.
    pub fn apply(&self, element: &mut PageElement) {
        if let Some(position) = self.position {
            element.position = position;
        }
        if let Some(size) = self.size {
            element.size = clamp_size(size);
        }
        if let Some(z_index) = self.z_index {
            element.z_index = z_index;
        }
        if let Some(locked) = self.locked {
            element.locked = locked;
        }
        if let Some(opacity) = self.opacity {
            element.opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
        }

        let element_type = element.element_type();
        match &mut element.kind {
            ElementKind::Text(text) => {
                self.apply_text(&mut text.content, &mut text.style);
                self.ignore_fields(element_type.name(), &[
                    ("backgroundColor", self.background_color.is_some()),
                    ("borderRadius", self.border_radius.is_some()),
                    ("src", self.src.is_some()),
                    ("fileName", self.file_name.is_some()),
                ]);
            }
            ElementKind::Note(note) => {
                self.apply_text(&mut note.content, &mut note.style);
                if let Some(color) = self.background_color {
                    note.background_color = color;
                }
                if let Some(radius) = self.border_radius {
                    note.border_radius = radius.max(0.0);
                }
                self.ignore_fields(element_type.name(), &[
                    ("src", self.src.is_some()),
                    ("fileName", self.file_name.is_some()),
                ]);
            }
            ElementKind::Image(image) => {
                if let Some(src) = &self.src {
                    image.src = src.clone();
                }
                if let Some(file_name) = &self.file_name {
                    image.file_name = file_name.clone();
                }
                if let Some(radius) = self.border_radius {
                    image.border_radius = radius.max(0.0);
                }
                self.ignore_text_fields(element_type.name());
                self.ignore_fields(element_type.name(), &[(
                    "backgroundColor",
                    self.background_color.is_some(),
                )]);
            }
            ElementKind::Shape(shape) => {
                if let Some(color) = self.background_color {
                    shape.background_color = color;
                }
                if let Some(radius) = self.border_radius {
                    shape.border_radius = radius.max(0.0);
                }
                self.ignore_text_fields(element_type.name());
                self.ignore_fields(element_type.name(), &[
                    ("src", self.src.is_some()),
                    ("fileName", self.file_name.is_some()),
                ]);
            }
        }
    }

    fn apply_text(&self, content: &mut String, style: &mut TextStyle) {
        if let Some(new_content) = &self.content {
            content.clone_from(new_content);
        }
        if let Some(size) = self.font_size {
            style.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        }
        if let Some(weight) = self.font_weight {
            style.font_weight = weight;
        }
        if let Some(align) = self.text_align {
            style.text_align = align;
        }
        if let Some(color) = self.color {
            style.color = color;
        }
    }

    fn ignore_text_fields(&self, kind: &str) {
        self.ignore_fields(kind, &[
            ("content", self.content.is_some()),
            ("fontSize", self.font_size.is_some()),
            ("fontWeight", self.font_weight.is_some()),
            ("textAlign", self.text_align.is_some()),
            ("color", self.color.is_some()),
        ]);
    }

    fn ignore_fields(&self, kind: &str, fields: &[(&str, bool)]) {
        for (name, _) in fields.iter().filter(|(_, present)| *present) {
            log::debug!("Ignoring field {name} on {kind} element");
        }
    }
}

/// Floor a size at [`MIN_ELEMENT_SIZE`].
pub(crate) fn clamp_size(size: Size) -> Size {
    Size::new(
        size.width.max(MIN_ELEMENT_SIZE.width),
        size.height.max(MIN_ELEMENT_SIZE.height),
    )
}
