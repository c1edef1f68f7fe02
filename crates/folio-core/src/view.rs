//! Zoom and the screen-to-page transform.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Zoom levels offered by the zoom controls, in percent.
pub const ZOOM_STEPS: [u32; 8] = [25, 50, 75, 100, 125, 150, 175, 200];

/// Zoom level used on startup and by "reset zoom".
pub const DEFAULT_ZOOM: u32 = 75;

/// View transform between screen pixels and page units.
///
/// `device_ratio` is the rendered-to-logical pixel ratio of the page
/// container, for containers drawn at a different physical size than the
/// page's logical dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub zoom_percent: u32,
    pub device_ratio: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom_percent: DEFAULT_ZOOM,
            device_ratio: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn new(zoom_percent: u32) -> Self {
        Self {
            zoom_percent,
            ..Self::default()
        }
    }

    pub fn with_device_ratio(mut self, device_ratio: f64) -> Self {
        self.device_ratio = device_ratio;
        self
    }

    /// Screen pixels per page unit.
    pub fn scale(&self) -> f64 {
        let scale = f64::from(self.zoom_percent) / 100.0 * self.device_ratio;
        if scale > 0.0 { scale } else { 1.0 }
    }

    /// Page-to-screen transform for a page whose origin sits at `origin` on screen.
    pub fn transform(&self, origin: Point) -> Affine {
        Affine::translate(origin.to_vec2()) * Affine::scale(self.scale())
    }

    /// Convert a screen-space pointer delta into page units.
    pub fn screen_delta_to_page(&self, delta: Vec2) -> Vec2 {
        delta / self.scale()
    }

    /// Convert a client point into page space given the page container origin.
    pub fn screen_to_page(&self, client: Point, origin: Point) -> Point {
        self.transform(origin).inverse() * client
    }

    /// Like [`ViewTransform::screen_to_page`], clamped so neither axis is negative.
    pub fn screen_to_page_clamped(&self, client: Point, origin: Point) -> Point {
        let point = self.screen_to_page(client, origin);
        Point::new(point.x.max(0.0), point.y.max(0.0))
    }

    pub fn page_to_screen(&self, point: Point, origin: Point) -> Point {
        self.transform(origin) * point
    }

    /// Step to the next larger zoom level, if any.
    pub fn zoom_in(&mut self) -> bool {
        match ZOOM_STEPS.iter().find(|&&step| step > self.zoom_percent) {
            Some(&step) => {
                self.zoom_percent = step;
                true
            }
            None => false,
        }
    }

    /// Step to the next smaller zoom level, if any.
    pub fn zoom_out(&mut self) -> bool {
        match ZOOM_STEPS.iter().rev().find(|&&step| step < self.zoom_percent) {
            Some(&step) => {
                self.zoom_percent = step;
                true
            }
            None => false,
        }
    }

    pub fn reset_zoom(&mut self) {
        self.zoom_percent = DEFAULT_ZOOM;
    }
}
