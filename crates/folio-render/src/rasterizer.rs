//! Page rasterization: background, then every element in paint order.

use crate::draw::draw_element;
use crate::error::{RenderError, RenderResult};
use crate::surface::RasterSurface;
use crate::text_layout::FontSet;
use folio_core::assets::parse_data_url;
use folio_core::model::{DocumentPage, ElementKind, PAGE_SIZE};
use image::RgbaImage;
use kurbo::Size;
use peniko::Color;
use std::collections::HashMap;
use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

/// Boxed future for async image loading.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Default oversampling factor for exported pages.
pub const DEFAULT_SCALE: f64 = 2.0;

/// JPEG quality used for exported pages.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Rasterization settings.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Device pixels per page unit.
    pub scale: f64,
    pub page_size: Size,
    pub fonts: FontSet,
    pub jpeg_quality: u8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            page_size: PAGE_SIZE,
            fonts: FontSet::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_fonts(mut self, fonts: FontSet) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    fn validate(&self) -> RenderResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(RenderError::InvalidOptions(format!("scale must be positive, got {}", self.scale)));
        }
        if self.page_size.width <= 0.0 || self.page_size.height <= 0.0 {
            return Err(RenderError::InvalidOptions(format!("empty page size {:?}", self.page_size)));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(RenderError::InvalidOptions(format!(
                "JPEG quality must be 1-100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

/// Resolves an image element's `src` to encoded image bytes.
pub trait ImageSource {
    fn load<'a>(&'a self, src: &'a str) -> BoxFuture<'a, RenderResult<Vec<u8>>>;
}

/// Loads `data:` URLs and, for anything else, files relative to a base directory.
#[derive(Debug, Clone, Default)]
pub struct DataUrlSource {
    base_dir: Option<PathBuf>,
}

impl DataUrlSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }
}

impl ImageSource for DataUrlSource {
    fn load<'a>(&'a self, src: &'a str) -> BoxFuture<'a, RenderResult<Vec<u8>>> {
        Box::pin(async move {
            if src.starts_with("data:") {
                return parse_data_url(src)
                    .map(|(_, bytes)| bytes)
                    .ok_or_else(|| RenderError::ImageLoad {
                        src: truncate(src),
                        reason: "malformed data URL".to_string(),
                    });
            }
            let path = match &self.base_dir {
                Some(base) => base.join(src),
                None => PathBuf::from(src),
            };
            fs::read(&path).map_err(|e| RenderError::ImageLoad {
                src: path.display().to_string(),
                reason: e.to_string(),
            })
        })
    }
}

/// Images held in memory, keyed by `src`.
#[derive(Debug, Clone, Default)]
pub struct MemoryImageSource {
    images: HashMap<String, Vec<u8>>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, src: impl Into<String>, bytes: Vec<u8>) {
        self.images.insert(src.into(), bytes);
    }
}

impl ImageSource for MemoryImageSource {
    fn load<'a>(&'a self, src: &'a str) -> BoxFuture<'a, RenderResult<Vec<u8>>> {
        Box::pin(async move {
            self.images.get(src).cloned().ok_or_else(|| RenderError::ImageLoad {
                src: truncate(src),
                reason: "not found".to_string(),
            })
        })
    }
}

/// Keep log lines readable when `src` is a long data URL.
fn truncate(src: &str) -> String {
    const MAX: usize = 64;
    match src.char_indices().nth(MAX) {
        Some((index, _)) => format!("{}…", &src[..index]),
        None => src.to_string(),
    }
}

/// Rasterizes pages with fixed options and image source.
pub struct PageRasterizer<'a> {
    options: &'a RenderOptions,
    source: &'a dyn ImageSource,
}

impl<'a> PageRasterizer<'a> {
    pub fn new(options: &'a RenderOptions, source: &'a dyn ImageSource) -> Self {
        Self { options, source }
    }

    /// Paint one page.
    ///
    /// Images are loaded one after another and drawn as they arrive; an image
    /// that fails to load or decode is skipped with a warning.
    pub async fn rasterize(&self, page: &DocumentPage) -> RenderResult<RasterSurface> {
        self.options.validate()?;
        let mut surface = RasterSurface::new(self.options.page_size, self.options.scale)?;
        surface.clear(Color::from(page.background_color));

        for element in page.paint_order() {
            let bitmap = match &element.kind {
                ElementKind::Image(image) => match self.load_image(&image.src).await {
                    Some(bitmap) => Some(bitmap),
                    None => continue,
                },
                _ => None,
            };
            draw_element(&mut surface, element, bitmap.as_ref(), &self.options.fonts)?;
        }

        log::debug!("Rasterized page {} ({} elements)", page.id, page.elements.len());
        Ok(surface)
    }

    async fn load_image(&self, src: &str) -> Option<RgbaImage> {
        let bytes = match self.source.load(src).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Skipping image: {e}");
                return None;
            }
        };
        match image::load_from_memory(&bytes) {
            Ok(decoded) => Some(decoded.to_rgba8()),
            Err(e) => {
                log::warn!("Skipping image {}: {e}", truncate(src));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::assets::to_data_url;
    use folio_core::color::RgbaColor;
    use folio_core::ids::{PageId, SequentialIds};
    use folio_core::model::{self, ElementUpdate};
    use image::Rgba;
    use kurbo::Point;
    use std::io::Cursor;

    fn png(color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(8, 8, Rgba(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn assert_close(actual: Rgba<u8>, expected: [u8; 4]) {
        let close = actual.0.iter().zip(expected).all(|(a, e)| a.abs_diff(e) <= 1);
        assert!(close, "{actual:?} != {expected:?}");
    }

    #[test]
    fn test_shape_scenario_at_double_scale() {
        let mut ids = SequentialIds::new();
        let mut page = model::create_page(&mut ids);
        page.elements.push(model::create_shape_element(&mut ids, Point::ZERO));

        let options = RenderOptions::default();
        assert!(options.fonts.has_faces());
        let source = DataUrlSource::new();
        let surface = pollster::block_on(PageRasterizer::new(&options, &source).rasterize(&page)).unwrap();

        assert_eq!((surface.width(), surface.height()), (1190, 1684));
        assert_eq!(surface.pixel(120, 120), Rgba([0xdb, 0xea, 0xfe, 0xff]));
        assert_eq!(surface.pixel(0, 0), Rgba([0xff, 0xff, 0xff, 0xff]));
    }

    #[test]
    fn test_paint_order_follows_z_index() {
        let mut ids = SequentialIds::new();
        let mut page = model::create_page(&mut ids);
        let mut red = model::create_shape_element(&mut ids, Point::ZERO);
        ElementUpdate::new()
            .with_background_color(RgbaColor::rgb(255, 0, 0))
            .with_z_index(5)
            .apply(&mut red);
        let mut green = model::create_shape_element(&mut ids, Point::ZERO);
        ElementUpdate::new()
            .with_background_color(RgbaColor::rgb(0, 255, 0))
            .with_z_index(2)
            .apply(&mut green);
        page.elements = vec![red, green];

        let options = RenderOptions::default().with_scale(1.0);
        let source = DataUrlSource::new();
        let surface = pollster::block_on(PageRasterizer::new(&options, &source).rasterize(&page)).unwrap();
        assert_eq!(surface.pixel(60, 60), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_images_load_from_data_url_and_failures_are_skipped() {
        let mut ids = SequentialIds::new();
        let mut page = model::create_page(&mut ids);
        let good = model::create_image_element(
            &mut ids,
            Point::new(0.0, 0.0),
            to_data_url("image/png", &png([0, 0, 255, 255])),
            "blue.png",
            100.0,
            100.0,
        );
        let broken = model::create_image_element(
            &mut ids,
            Point::new(200.0, 0.0),
            "data:image/png;base64,AAAA",
            "broken.png",
            100.0,
            100.0,
        );
        let missing = model::create_image_element(&mut ids, Point::new(400.0, 0.0), "nope/missing.png", "m.png", 100.0, 100.0);
        page.elements = vec![good, broken, missing];

        let options = RenderOptions::default().with_scale(1.0);
        let source = DataUrlSource::new();
        let surface = pollster::block_on(PageRasterizer::new(&options, &source).rasterize(&page)).unwrap();
        assert_close(surface.pixel(50, 50), [0, 0, 255, 255]);
        assert_eq!(surface.pixel(250, 50), Rgba([255, 255, 255, 255]));
        assert_eq!(surface.pixel(450, 50), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_memory_source() {
        let mut ids = SequentialIds::new();
        let mut page = model::create_page(&mut ids);
        let mut image = model::create_image_element(&mut ids, Point::ZERO, "logo", "logo.png", 40.0, 40.0);
        ElementUpdate::new().with_border_radius(20.0).apply(&mut image);
        page.elements.push(image);

        let mut source = MemoryImageSource::new();
        source.insert("logo", png([0, 128, 0, 255]));
        let options = RenderOptions::default().with_scale(1.0);
        let surface = pollster::block_on(PageRasterizer::new(&options, &source).rasterize(&page)).unwrap();
        assert_close(surface.pixel(20, 20), [0, 128, 0, 255]);
        // Fully rounded corners stay clear.
        assert_eq!(surface.pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_page_background() {
        let mut page = model::create_page(&mut SequentialIds::new());
        page.background_color = RgbaColor::NOTE_YELLOW;
        let options = RenderOptions::default().with_scale(0.5);
        let source = DataUrlSource::new();
        let surface = pollster::block_on(PageRasterizer::new(&options, &source).rasterize(&page)).unwrap();
        assert_eq!(surface.pixel(10, 10), Rgba([0xfe, 0xf3, 0xc7, 0xff]));
        assert_eq!(page.id, PageId::new("page-1"));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let page = model::create_page(&mut SequentialIds::new());
        let options = RenderOptions::default().with_scale(0.0);
        let source = DataUrlSource::new();
        let result = pollster::block_on(PageRasterizer::new(&options, &source).rasterize(&page));
        assert!(matches!(result, Err(RenderError::InvalidOptions(_))));
    }
}
