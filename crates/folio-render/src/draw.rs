//! Per-element draw routines.

use crate::error::RenderResult;
use crate::surface::RasterSurface;
use crate::text_layout::{FontSet, LINE_HEIGHT, TextMeasure, visual_line, wrap_text};
use folio_core::model::{ElementKind, FontWeight, NoteContent, PageElement, ShapeContent, TextAlign, TextStyle};
use folio_core::text::effective_align;
use image::RgbaImage;
use kurbo::{Point, Rect, RoundedRect, Vec2};
use peniko::Color;

/// Padding and baseline placement for a block of text inside its box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextFrame {
    /// Horizontal distance from the box edge to the alignment anchor.
    pub inset: f64,
    /// Width removed from the box before wrapping.
    pub wrap_inset: f64,
    /// Extra distance from the box top to the first baseline, on top of the font size.
    pub baseline_offset: f64,
}

pub const TEXT_FRAME: TextFrame = TextFrame {
    inset: 4.0,
    wrap_inset: 8.0,
    baseline_offset: 0.0,
};

pub const NOTE_FRAME: TextFrame = TextFrame {
    inset: 12.0,
    wrap_inset: 24.0,
    baseline_offset: 12.0,
};

/// Drop shadow under notes: rgba(0, 0, 0, 0.08), 4 units of blur, 2 units down.
const SHADOW_ALPHA: f32 = 0.08;
const SHADOW_BLUR: f64 = 4.0;
const SHADOW_OFFSET: Vec2 = Vec2::new(0.0, 2.0);

/// Opacity of the bar painted for a line when no font face could be loaded.
const PLACEHOLDER_ALPHA: f32 = 0.35;

/// Draw one element inside its own opacity layer.
///
/// `image` is the decoded bitmap for image elements; image elements without
/// one are skipped.
pub fn draw_element(
    surface: &mut RasterSurface,
    element: &PageElement,
    image: Option<&RgbaImage>,
    fonts: &FontSet,
) -> RenderResult<()> {
    surface.push_layer(element.opacity)?;
    let bounds = element.bounds();
    let drawn = match &element.kind {
        ElementKind::Image(content) => {
            if let Some(image) = image {
                draw_image(surface, bounds, content.border_radius, image);
            }
            Ok(())
        }
        ElementKind::Text(text) => {
            draw_text_block(surface, bounds, &text.content, &text.style, TEXT_FRAME, fonts);
            Ok(())
        }
        ElementKind::Note(note) => draw_note(surface, bounds, note, fonts),
        ElementKind::Shape(shape) => {
            draw_shape(surface, bounds, shape);
            Ok(())
        }
    };
    surface.pop_layer();
    drawn
}

pub fn draw_shape(surface: &mut RasterSurface, bounds: Rect, shape: &ShapeContent) {
    let color = Color::from(shape.background_color);
    if shape.border_radius > 0.0 {
        surface.fill(&RoundedRect::from_rect(bounds, shape.border_radius), color);
    } else {
        surface.fill(&bounds, color);
    }
}

pub fn draw_image(surface: &mut RasterSurface, bounds: Rect, radius: f64, image: &RgbaImage) {
    surface.save();
    if radius > 0.0 {
        surface.clip(&RoundedRect::from_rect(bounds, radius));
    }
    surface.draw_image(image, bounds);
    surface.restore();
}

/// Note card: blurred drop shadow, rounded background, then the text.
pub fn draw_note(surface: &mut RasterSurface, bounds: Rect, note: &NoteContent, fonts: &FontSet) -> RenderResult<()> {
    let radius = note.border_radius.max(0.0);
    let shadow = RoundedRect::from_rect(bounds + SHADOW_OFFSET, radius);
    let shadow_color = Color::from_rgba8(0, 0, 0, 255).multiply_alpha(SHADOW_ALPHA);
    // A CSS blur radius is twice the Gaussian standard deviation.
    surface.fill_blurred(&shadow, shadow_color, SHADOW_BLUR / 2.0)?;
    surface.fill(&RoundedRect::from_rect(bounds, radius), Color::from(note.background_color));
    draw_text_block(surface, bounds, &note.content, &note.style, NOTE_FRAME, fonts);
    Ok(())
}

/// Wrap and paint a text block. Right-to-left content is right aligned and
/// each line is reordered visually before painting.
pub fn draw_text_block(
    surface: &mut RasterSurface,
    bounds: Rect,
    content: &str,
    style: &TextStyle,
    frame: TextFrame,
    fonts: &FontSet,
) {
    let size = style.font_size;
    let align = effective_align(content, style.text_align);
    let anchor = match align {
        TextAlign::Left => bounds.x0 + frame.inset,
        TextAlign::Center => bounds.center().x,
        TextAlign::Right => bounds.x1 - frame.inset,
    };
    let color = Color::from(style.color);
    let lines = wrap_text(content, bounds.width() - frame.wrap_inset, size, style.font_weight, fonts);

    let mut baseline = bounds.y0 + frame.baseline_offset + size;
    for line in &lines {
        let visual = visual_line(line);
        let width = fonts.advance(&visual, size, style.font_weight);
        let start = match align {
            TextAlign::Left => anchor,
            TextAlign::Center => anchor - width / 2.0,
            TextAlign::Right => anchor - width,
        };
        paint_line(surface, &visual, Point::new(start, baseline), width, size, style.font_weight, color, fonts);
        baseline += size * LINE_HEIGHT;
    }
}

#[allow(clippy::too_many_arguments)]
fn paint_line(
    surface: &mut RasterSurface,
    line: &str,
    origin: Point,
    width: f64,
    size: f64,
    weight: FontWeight,
    color: Color,
    fonts: &FontSet,
) {
    if line.trim().is_empty() {
        return;
    }
    let Some(font) = fonts.face(weight) else {
        // No face could be loaded: mark the line's extent instead.
        let bar = Rect::new(origin.x, origin.y - size * 0.7, origin.x + width, origin.y);
        surface.fill(&bar, color.multiply_alpha(PLACEHOLDER_ALPHA));
        return;
    };

    let scale = surface.scale();
    let px = (size * scale) as f32;
    let mut pen = origin.x * scale;
    let baseline = origin.y * scale;
    for c in line.chars() {
        let (metrics, coverage) = font.rasterize(c, px);
        let top = baseline - (metrics.height as f64 + f64::from(metrics.ymin));
        let left = pen + f64::from(metrics.xmin);
        surface.fill_mask(Point::new(left, top), metrics.width, metrics.height, &coverage, color);
        pen += f64::from(metrics.advance_width);
    }
}
