//! Fixed-size single-channel drawing surface.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::types::{Point, SketchError, SketchResult};

/// Intensity of untouched pixels.
pub const BACKGROUND: u8 = 0;

/// Intensity of painted pixels.
pub const FOREGROUND: u8 = 255;

/// Default surface side in pixels.
pub const DEFAULT_SIZE: u32 = 280;

/// Default stroke width in pixels.
pub const DEFAULT_LINE_WIDTH: f32 = 12.0;

/// Dimensions and pen width of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    pub line_width: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

impl SurfaceConfig {
    /// Reject zero-sized surfaces and non-positive pen widths.
    pub fn validate(&self) -> SketchResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SketchError::InvalidInput(format!(
                "surface must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.line_width.is_finite() && self.line_width > 0.0) {
            return Err(SketchError::InvalidInput(format!(
                "line width must be positive, got {}",
                self.line_width
            )));
        }
        Ok(())
    }
}

/// A raster that accumulates freehand strokes.
///
/// The dimensions are fixed at construction; `reset` only repaints.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeSurface {
    pixels: GrayImage,
    line_width: f32,
}

impl StrokeSurface {
    /// Create a surface filled with the background value.
    pub fn new(config: SurfaceConfig) -> SketchResult<Self> {
        config.validate()?;
        Ok(Self {
            pixels: GrayImage::from_pixel(config.width, config.height, Luma([BACKGROUND])),
            line_width: config.line_width,
        })
    }

    /// Wrap an existing grayscale raster, e.g. a drawing loaded from disk.
    pub fn from_gray(pixels: GrayImage, line_width: f32) -> SketchResult<Self> {
        let (width, height) = pixels.dimensions();
        SurfaceConfig {
            width,
            height,
            line_width,
        }
        .validate()?;
        Ok(Self { pixels, line_width })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    pub fn config(&self) -> SurfaceConfig {
        SurfaceConfig {
            width: self.width(),
            height: self.height(),
            line_width: self.line_width,
        }
    }

    /// Read-only view of the raster.
    pub fn pixels(&self) -> &GrayImage {
        &self.pixels
    }

    /// Fill the whole surface with the background value.
    pub fn reset(&mut self) {
        self.fill(BACKGROUND);
    }

    /// Fill the whole surface with one intensity.
    pub fn fill(&mut self, value: u8) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = Luma([value]);
        }
    }

    /// True when no pixel differs from the background.
    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p.0[0] == BACKGROUND)
    }

    /// Paint a round-capped segment of the configured width from `from` to `to`.
    ///
    /// A pixel is painted when its center lies within half the line width of
    /// the segment, so consecutive segments join smoothly and a zero-length
    /// segment leaves a dot. Parts outside the surface are clipped.
    pub fn stroke_to(&mut self, from: Point, to: Point) {
        if !(from.x.is_finite() && from.y.is_finite() && to.x.is_finite() && to.y.is_finite()) {
            tracing::debug!("Ignoring stroke with non-finite coordinates");
            return;
        }

        let radius = self.line_width / 2.0;
        let (w, h) = self.pixels.dimensions();

        let min_x = (from.x.min(to.x) - radius).floor().max(0.0);
        let min_y = (from.y.min(to.y) - radius).floor().max(0.0);
        let max_x = (from.x.max(to.x) + radius).ceil().min(w as f32);
        let max_y = (from.y.max(to.y) + radius).ceil().min(h as f32);
        if min_x >= max_x || min_y >= max_y {
            return;
        }

        let radius_sq = radius * radius;
        for y in (min_y as u32)..(max_y as u32) {
            for x in (min_x as u32)..(max_x as u32) {
                let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                if distance_sq_to_segment(center, from, to) <= radius_sq {
                    self.pixels.put_pixel(x, y, Luma([FOREGROUND]));
                }
            }
        }
    }
}

/// Squared distance from `p` to the segment `a`-`b`.
fn distance_sq_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;

    let t = if len_sq > 0.0 {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let cx = a.x + t * dx - p.x;
    let cy = a.y + t * dy - p.y;
    cx * cx + cy * cy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> StrokeSurface {
        StrokeSurface::new(SurfaceConfig::default()).unwrap()
    }

    #[test]
    fn test_new_surface_is_blank() {
        let s = surface();
        assert_eq!((s.width(), s.height()), (280, 280));
        assert!(s.is_blank());
    }

    #[test]
    fn test_zero_size_rejected() {
        let config = SurfaceConfig {
            width: 0,
            ..SurfaceConfig::default()
        };
        assert!(StrokeSurface::new(config).is_err());
    }

    #[test]
    fn test_stroke_paints_along_segment() {
        let mut s = surface();
        s.stroke_to(Point::new(20.0, 140.0), Point::new(260.0, 140.0));

        assert_eq!(s.pixels().get_pixel(140, 140).0[0], FOREGROUND);
        assert_eq!(s.pixels().get_pixel(20, 140).0[0], FOREGROUND);
        // Half width is 6 px, so 10 px away stays untouched.
        assert_eq!(s.pixels().get_pixel(140, 150).0[0], BACKGROUND);
        assert_eq!(s.pixels().get_pixel(140, 130).0[0], BACKGROUND);
    }

    #[test]
    fn test_round_cap_extends_past_endpoint() {
        let mut s = surface();
        s.stroke_to(Point::new(100.0, 100.0), Point::new(150.0, 100.0));

        // Within the cap radius beyond the end point.
        assert_eq!(s.pixels().get_pixel(153, 100).0[0], FOREGROUND);
        // Corner of the square that a butt/square cap would fill.
        assert_eq!(s.pixels().get_pixel(155, 105).0[0], BACKGROUND);
    }

    #[test]
    fn test_zero_length_segment_paints_dot() {
        let mut s = surface();
        s.stroke_to(Point::new(50.0, 50.0), Point::new(50.0, 50.0));
        assert_eq!(s.pixels().get_pixel(50, 50).0[0], FOREGROUND);
        assert_eq!(s.pixels().get_pixel(60, 50).0[0], BACKGROUND);
    }

    #[test]
    fn test_stroke_clipped_at_edges() {
        let mut s = surface();
        s.stroke_to(Point::new(-50.0, -50.0), Point::new(400.0, 400.0));
        assert_eq!(s.pixels().get_pixel(0, 0).0[0], FOREGROUND);
        assert_eq!(s.pixels().get_pixel(279, 279).0[0], FOREGROUND);
    }

    #[test]
    fn test_stroke_fully_outside_is_noop() {
        let mut s = surface();
        s.stroke_to(Point::new(-100.0, -100.0), Point::new(-50.0, -80.0));
        assert!(s.is_blank());
    }

    #[test]
    fn test_non_finite_stroke_ignored() {
        let mut s = surface();
        s.stroke_to(Point::new(f32::NAN, 10.0), Point::new(20.0, 20.0));
        assert!(s.is_blank());
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let initial = surface();
        let mut s = surface();
        s.stroke_to(Point::new(10.0, 10.0), Point::new(200.0, 30.0));
        s.stroke_to(Point::new(200.0, 30.0), Point::new(90.0, 250.0));
        assert!(!s.is_blank());

        s.reset();
        assert_eq!(s, initial);
    }
}
