//! CPU raster surface backed by a tiny-skia pixmap.
//!
//! Drawing calls take page-space geometry; the surface scales it to device
//! pixels. Fills are anti-aliased. Clips are coverage masks saved and
//! restored with [`RasterSurface::save`] and [`RasterSurface::restore`].
//! Group opacity uses offscreen layers composited on
//! [`RasterSurface::pop_layer`].

use crate::error::{RenderError, RenderResult};
use image::{Rgba, RgbaImage, imageops};
use kurbo::{PathEl, Point, Rect, Shape, Size};
use peniko::Color;
use std::fmt;
use tiny_skia::{
    FillRule, FilterQuality, IntSize, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Transform,
};

/// Path flattening tolerance in device pixels.
const TOLERANCE: f64 = 0.1;

/// Blur extends this many standard deviations past the shape.
const BLUR_EXTENT: f64 = 3.0;

/// An offscreen group. Opaque groups draw straight into the layer below.
struct Layer {
    pixmap: Option<Pixmap>,
    opacity: f32,
}

/// A pixel surface covering one page.
pub struct RasterSurface {
    base: Pixmap,
    layers: Vec<Layer>,
    scale: f64,
    transform: Transform,
    clip: Option<Mask>,
    clip_stack: Vec<Option<Mask>>,
}

impl fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("scale", &self.scale)
            .field("layers", &self.layers.len())
            .field("clipped", &self.clip.is_some())
            .finish()
    }
}

impl RasterSurface {
    /// A transparent surface of `page_size · scale` pixels.
    pub fn new(page_size: Size, scale: f64) -> RenderResult<Self> {
        let width = (page_size.width * scale).round().max(1.0) as u32;
        let height = (page_size.height * scale).round().max(1.0) as u32;
        let base = Pixmap::new(width, height).ok_or(RenderError::Surface { width, height })?;
        Ok(Self {
            base,
            layers: Vec::new(),
            scale,
            transform: Transform::from_scale(scale as f32, scale as f32),
            clip: None,
            clip_stack: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.base.width()
    }

    pub fn height(&self) -> u32 {
        self.base.height()
    }

    /// Device pixels per page unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Straight-alpha color of a composited pixel. Out of range reads are transparent.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        match self.base.pixel(x, y) {
            Some(color) => {
                let c = color.demultiply();
                Rgba([c.red(), c.green(), c.blue(), c.alpha()])
            }
            None => Rgba([0, 0, 0, 0]),
        }
    }

    /// Premultiplied RGBA pixels of the composited page.
    pub fn pixmap(&self) -> &Pixmap {
        &self.base
    }

    /// Straight-alpha copy of the composited page.
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width(), self.height(), |x, y| self.pixel(x, y))
    }

    /// Number of open layers.
    pub fn layer_depth(&self) -> usize {
        self.layers.len()
    }

    /// Replace every pixel of the page with `color`, ignoring layers and clips.
    pub fn clear(&mut self, color: Color) {
        self.base.fill(skia_color(color));
    }

    /// Push the current clip.
    pub fn save(&mut self) {
        self.clip_stack.push(self.clip.clone());
    }

    /// Pop back to the last [`RasterSurface::save`]. Unbalanced calls remove the clip.
    pub fn restore(&mut self) {
        self.clip = self.clip_stack.pop().flatten();
    }

    /// Start a group composited with `opacity` when popped.
    pub fn push_layer(&mut self, opacity: f64) -> RenderResult<()> {
        let opacity = opacity.clamp(0.0, 1.0) as f32;
        let pixmap = if opacity < 1.0 {
            let (width, height) = (self.width(), self.height());
            Some(Pixmap::new(width, height).ok_or(RenderError::Surface { width, height })?)
        } else {
            None
        };
        self.layers.push(Layer { pixmap, opacity });
        Ok(())
    }

    /// Composite the top layer onto the one below it.
    pub fn pop_layer(&mut self) {
        let Some(layer) = self.layers.pop() else {
            log::warn!("pop_layer without a matching push_layer");
            return;
        };
        let Some(pixmap) = layer.pixmap else {
            return;
        };
        if layer.opacity <= 0.0 {
            return;
        }
        let paint = PixmapPaint {
            opacity: layer.opacity,
            ..PixmapPaint::default()
        };
        target(&mut self.base, &mut self.layers).draw_pixmap(0, 0, pixmap.as_ref(), &paint, Transform::identity(), None);
    }

    /// Intersect the clip with a page-space shape.
    pub fn clip(&mut self, shape: &impl Shape) {
        let (width, height) = (self.width(), self.height());
        let path = skia_path(shape, TOLERANCE / self.scale);
        self.clip = match (self.clip.take(), path) {
            (Some(mut mask), Some(path)) => {
                mask.intersect_path(&path, FillRule::Winding, true, self.transform);
                Some(mask)
            }
            (None, Some(path)) => Mask::new(width, height).map(|mut mask| {
                mask.fill_path(&path, FillRule::Winding, true, self.transform);
                mask
            }),
            // An empty shape clips everything away.
            (_, None) => Mask::new(width, height),
        };
    }

    /// Fill a page-space shape.
    pub fn fill(&mut self, shape: &impl Shape, color: Color) {
        let Some(path) = skia_path(shape, TOLERANCE / self.scale) else {
            return;
        };
        let paint = solid_paint(color);
        target(&mut self.base, &mut self.layers).fill_path(
            &path,
            &paint,
            FillRule::Winding,
            self.transform,
            self.clip.as_ref(),
        );
    }

    /// Fill a page-space shape blurred with a Gaussian of `std_dev` page units.
    pub fn fill_blurred(&mut self, shape: &impl Shape, color: Color, std_dev: f64) -> RenderResult<()> {
        if std_dev <= 0.0 {
            self.fill(shape, color);
            return Ok(());
        }
        let Some(path) = skia_path(shape, TOLERANCE / self.scale) else {
            return Ok(());
        };
        let sigma = std_dev * self.scale;
        let device = shape
            .bounding_box()
            .scale_from_origin(self.scale)
            .inflate(sigma * BLUR_EXTENT, sigma * BLUR_EXTENT)
            .expand();
        let (width, height) = (device.width() as u32, device.height() as u32);
        let mut shadow = Pixmap::new(width, height).ok_or(RenderError::Surface { width, height })?;

        // Paint opaque, blur, then apply the color's alpha when compositing.
        let rgba = color.to_rgba8();
        let mut paint = Paint::default();
        paint.set_color_rgba8(rgba.r, rgba.g, rgba.b, 255);
        paint.anti_alias = true;
        let local = self.transform.post_translate(-device.x0 as f32, -device.y0 as f32);
        shadow.fill_path(&path, &paint, FillRule::Winding, local, None);

        let Some(blurred) = blur_premultiplied(shadow, sigma as f32) else {
            return Err(RenderError::Surface { width, height });
        };
        let paint = PixmapPaint {
            opacity: f32::from(rgba.a) / 255.0,
            ..PixmapPaint::default()
        };
        target(&mut self.base, &mut self.layers).draw_pixmap(
            device.x0 as i32,
            device.y0 as i32,
            blurred.as_ref(),
            &paint,
            Transform::identity(),
            self.clip.as_ref(),
        );
        Ok(())
    }

    /// Blend an 8-bit coverage mask whose top-left corner sits at `origin`
    /// in device pixels.
    pub fn fill_mask(&mut self, origin: Point, width: usize, height: usize, mask: &[u8], color: Color) {
        if width == 0 || height == 0 || mask.len() < width * height {
            return;
        }
        let rgba = color.to_rgba8();
        let mut data = Vec::with_capacity(width * height * 4);
        for &coverage in &mask[..width * height] {
            let alpha = mul_div255(rgba.a, coverage);
            data.extend_from_slice(&[
                mul_div255(rgba.r, alpha),
                mul_div255(rgba.g, alpha),
                mul_div255(rgba.b, alpha),
                alpha,
            ]);
        }
        let Some(glyph) = IntSize::from_wh(width as u32, height as u32).and_then(|size| Pixmap::from_vec(data, size))
        else {
            return;
        };
        target(&mut self.base, &mut self.layers).draw_pixmap(
            origin.x.round() as i32,
            origin.y.round() as i32,
            glyph.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            self.clip.as_ref(),
        );
    }

    /// Draw an image stretched to a page-space rectangle.
    pub fn draw_image(&mut self, image: &RgbaImage, dest: Rect) {
        if dest.width() <= 0.0 || dest.height() <= 0.0 {
            return;
        }
        let Some(source) = premultiplied_pixmap(image) else {
            return;
        };
        let sx = dest.width() / f64::from(image.width());
        let sy = dest.height() / f64::from(image.height());
        let placement = self
            .transform
            .pre_translate(dest.x0 as f32, dest.y0 as f32)
            .pre_scale(sx as f32, sy as f32);
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        target(&mut self.base, &mut self.layers).draw_pixmap(
            0,
            0,
            source.as_ref(),
            &paint,
            placement,
            self.clip.as_ref(),
        );
    }
}

/// The innermost offscreen layer, or the page itself.
fn target<'a>(base: &'a mut Pixmap, layers: &'a mut [Layer]) -> &'a mut Pixmap {
    match layers.iter_mut().rev().find_map(|layer| layer.pixmap.as_mut()) {
        Some(pixmap) => pixmap,
        None => base,
    }
}

fn skia_color(color: Color) -> tiny_skia::Color {
    let rgba = color.to_rgba8();
    tiny_skia::Color::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.a)
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

/// Convert a kurbo shape into a tiny-skia path in the same coordinates.
fn skia_path(shape: &impl Shape, tolerance: f64) -> Option<Path> {
    let mut builder = PathBuilder::new();
    for el in shape.path_elements(tolerance) {
        match el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => builder.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

fn mul_div255(a: u8, b: u8) -> u8 {
    ((u32::from(a) * u32::from(b) + 127) / 255) as u8
}

fn premultiplied_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let mut data = image.as_raw().clone();
    for px in data.chunks_exact_mut(4) {
        let alpha = px[3];
        for channel in &mut px[..3] {
            *channel = mul_div255(*channel, alpha);
        }
    }
    Pixmap::from_vec(data, size)
}

/// Gaussian blur of premultiplied pixels. Channels never exceed alpha afterwards.
fn blur_premultiplied(pixmap: Pixmap, sigma: f32) -> Option<Pixmap> {
    let size = IntSize::from_wh(pixmap.width(), pixmap.height())?;
    let buffer = RgbaImage::from_raw(pixmap.width(), pixmap.height(), pixmap.take())?;
    let mut data = imageops::blur(&buffer, sigma).into_raw();
    for px in data.chunks_exact_mut(4) {
        let alpha = px[3];
        for channel in &mut px[..3] {
            *channel = (*channel).min(alpha);
        }
    }
    Pixmap::from_vec(data, size)
}
