//! Stroke sequencing: turns down/move/up input into `stroke_to` calls.

use serde::{Deserialize, Serialize};

use crate::surface::StrokeSurface;
use crate::types::Point;

/// Tracks whether a stroke is in progress and where it last was.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pen {
    last: Option<Point>,
}

impl Pen {
    pub fn new() -> Self {
        Self::default()
    }

    /// True between `start` and `stop`.
    pub fn is_drawing(&self) -> bool {
        self.last.is_some()
    }

    /// Last recorded position of an active stroke.
    pub fn last_point(&self) -> Option<Point> {
        self.last
    }

    /// Begin a stroke at `at`. Nothing is painted until the first move.
    pub fn start(&mut self, at: Point) {
        self.last = Some(at);
    }

    /// Extend the active stroke to `to`. Ignored when no stroke is active.
    pub fn move_to(&mut self, surface: &mut StrokeSurface, to: Point) {
        if let Some(from) = self.last {
            surface.stroke_to(from, to);
            self.last = Some(to);
        }
    }

    /// End the active stroke, if any.
    pub fn stop(&mut self) {
        self.last = None;
    }
}

/// A single touch contact in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub client_x: f32,
    pub client_y: f32,
}

/// Pointer data as delivered by a mouse or touch event.
///
/// Mouse events carry client coordinates, touch events carry a list of
/// contacts. Either may be missing or partial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPointer {
    #[serde(default)]
    pub client_x: Option<f32>,
    #[serde(default)]
    pub client_y: Option<f32>,
    #[serde(default)]
    pub touches: Vec<TouchPoint>,
}

impl RawPointer {
    pub fn mouse(client_x: f32, client_y: f32) -> Self {
        Self {
            client_x: Some(client_x),
            client_y: Some(client_y),
            touches: Vec::new(),
        }
    }

    pub fn touch(client_x: f32, client_y: f32) -> Self {
        Self {
            client_x: None,
            client_y: None,
            touches: vec![TouchPoint { client_x, client_y }],
        }
    }

    /// Translate into surface-local coordinates.
    ///
    /// Complete mouse coordinates win over touches; otherwise the first touch
    /// contact is used. Returns `None` when neither is usable.
    pub fn to_local(&self, origin: Point) -> Option<Point> {
        let (x, y) = match (self.client_x, self.client_y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => (x, y),
            _ => {
                let touch = self
                    .touches
                    .first()
                    .filter(|t| t.client_x.is_finite() && t.client_y.is_finite())?;
                (touch.client_x, touch.client_y)
            }
        };
        Some(Point::new(x - origin.x, y - origin.y))
    }
}
