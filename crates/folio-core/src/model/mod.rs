//! Document model: pages, elements and the factories that create them.

mod element;
mod page;
mod update;

pub use element::{
    ElementKind, ElementType, FontWeight, ImageContent, NoteContent, PageElement, ShapeContent,
    TextAlign, TextContent, TextStyle,
};
pub use page::{DocumentPage, DocumentState};
pub use update::ElementUpdate;

use crate::color::RgbaColor;
use crate::ids::IdGenerator;
use kurbo::{Point, Size};
use thiserror::Error;

/// A4 page width in page units (96 DPI pixels).
pub const PAGE_WIDTH: f64 = 595.0;
/// A4 page height in page units (96 DPI pixels).
pub const PAGE_HEIGHT: f64 = 842.0;
/// A4 page size in page units.
pub const PAGE_SIZE: Size = Size::new(PAGE_WIDTH, PAGE_HEIGHT);
/// A4 width in millimetres.
pub const A4_WIDTH_MM: f64 = 210.0;
/// A4 height in millimetres.
pub const A4_HEIGHT_MM: f64 = 297.0;

/// Smallest size an element may be resized to, from any entry point.
pub const MIN_ELEMENT_SIZE: Size = Size::new(40.0, 24.0);

/// Font size range accepted by element updates.
pub const MIN_FONT_SIZE: f64 = 8.0;
pub const MAX_FONT_SIZE: f64 = 72.0;

/// Images are fitted into this share of the page on creation.
const IMAGE_MAX_WIDTH_RATIO: f64 = 0.6;
const IMAGE_MAX_HEIGHT_RATIO: f64 = 0.4;

pub const DEFAULT_TEXT_CONTENT: &str = "Double-click to edit";

/// Model errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("A document needs at least one page")]
    NoPages,
    #[error("Duplicate id: {0}")]
    DuplicateId(String),
}

/// Create an empty page with a white background.
pub fn create_page(ids: &mut dyn IdGenerator) -> DocumentPage {
    DocumentPage::new(ids.page_id())
}

/// Create a 200×40 text box at `position`.
pub fn create_text_element(
    ids: &mut dyn IdGenerator,
    position: Point,
    content: Option<&str>,
) -> PageElement {
    let content = TextContent {
        content: content.unwrap_or(DEFAULT_TEXT_CONTENT).to_string(),
        style: TextStyle::default(),
    };
    PageElement::new(ids.element_id(), position, Size::new(200.0, 40.0), ElementKind::Text(content))
}

/// Create an empty 180×120 sticky note at `position`.
pub fn create_note_element(ids: &mut dyn IdGenerator, position: Point) -> PageElement {
    let note = NoteContent {
        content: String::new(),
        style: TextStyle {
            font_size: 12.0,
            ..TextStyle::default()
        },
        background_color: RgbaColor::NOTE_YELLOW,
        border_radius: 4.0,
    };
    PageElement::new(ids.element_id(), position, Size::new(180.0, 120.0), ElementKind::Note(note))
}

/// Create an image element sized to fit the page without upscaling.
pub fn create_image_element(
    ids: &mut dyn IdGenerator,
    position: Point,
    src: impl Into<String>,
    file_name: impl Into<String>,
    natural_width: f64,
    natural_height: f64,
) -> PageElement {
    let image = ImageContent {
        src: src.into(),
        file_name: file_name.into(),
        border_radius: 0.0,
    };
    PageElement::new(
        ids.element_id(),
        position,
        fit_image_size(natural_width, natural_height),
        ElementKind::Image(image),
    )
}

/// Create a 120×120 rounded square shape at `position`.
pub fn create_shape_element(ids: &mut dyn IdGenerator, position: Point) -> PageElement {
    let shape = ShapeContent {
        background_color: RgbaColor::SHAPE_BLUE,
        border_radius: 8.0,
    };
    PageElement::new(ids.element_id(), position, Size::new(120.0, 120.0), ElementKind::Shape(shape))
}

/// Display size for an image: fits within 60% of the page width and 40% of
/// its height, keeps the aspect ratio, never upscales, rounds to whole pixels.
///
/// Rounding never crosses a cap: a value that would round past the page cap
/// or the natural size is floored instead.
pub fn fit_image_size(natural_width: f64, natural_height: f64) -> Size {
    let natural_width = natural_width.max(1.0);
    let natural_height = natural_height.max(1.0);
    let max_width = PAGE_WIDTH * IMAGE_MAX_WIDTH_RATIO;
    let max_height = PAGE_HEIGHT * IMAGE_MAX_HEIGHT_RATIO;
    let scale = (max_width / natural_width)
        .min(max_height / natural_height)
        .min(1.0);
    Size::new(
        round_within(natural_width * scale, max_width.min(natural_width)),
        round_within(natural_height * scale, max_height.min(natural_height)),
    )
}

fn round_within(value: f64, limit: f64) -> f64 {
    let rounded = value.round();
    let rounded = if rounded > limit { limit.floor() } else { rounded };
    rounded.max(1.0)
}
