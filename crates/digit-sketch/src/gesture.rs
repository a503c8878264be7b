//! Recorded pointer gestures that can be replayed onto a canvas.
//!
//! A script is JSON:
//!
//! ```json
//! {
//!   "origin": { "x": 8.0, "y": 120.0 },
//!   "events": [
//!     { "type": "down", "x": 60.0, "y": 150.0 },
//!     { "type": "move", "x": 60.0, "y": 380.0 },
//!     { "type": "up" }
//!   ]
//! }
//! ```
//!
//! Coordinates are client coordinates; `origin` is the surface's top-left
//! corner in the same space and defaults to (0, 0).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pad::Canvas;
use crate::pen::{RawPointer, TouchPoint};
use crate::types::{Point, SketchResult};

/// One user action on the pad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureEvent {
    /// Mouse press or touch start.
    Down(PointerData),
    /// Pointer motion.
    Move(PointerData),
    /// Mouse release or touch end.
    Up,
    /// Pointer left the surface.
    Leave,
    /// Clear button.
    Clear,
}

/// Position payload of a down/move event.
///
/// Either `x`/`y` (mouse) or `touches` may be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub touches: Vec<TouchPoint>,
}

impl PointerData {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            touches: Vec::new(),
        }
    }

    fn to_raw(&self) -> RawPointer {
        RawPointer {
            client_x: self.x,
            client_y: self.y,
            touches: self.touches.clone(),
        }
    }
}

/// A sequence of gestures with the surface origin they were recorded against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureScript {
    #[serde(default = "zero_origin")]
    pub origin: Point,
    pub events: Vec<GestureEvent>,
}

fn zero_origin() -> Point {
    Point::new(0.0, 0.0)
}

/// Counts from one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStats {
    pub applied: usize,
    /// Down/move events whose coordinates could not be resolved.
    pub dropped: usize,
    pub strokes: usize,
}

impl GestureScript {
    pub fn from_json(json: &str) -> SketchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> SketchResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> SketchResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Apply every event to `canvas` in order.
    pub fn replay(&self, canvas: &mut Canvas) -> ReplayStats {
        let mut stats = ReplayStats::default();

        for event in &self.events {
            match event {
                GestureEvent::Down(pointer) => match pointer.to_raw().to_local(self.origin) {
                    Some(p) => {
                        canvas.start_stroke(p);
                        stats.strokes += 1;
                        stats.applied += 1;
                    }
                    None => stats.dropped += 1,
                },
                GestureEvent::Move(pointer) => match pointer.to_raw().to_local(self.origin) {
                    Some(p) => {
                        canvas.continue_stroke(p);
                        stats.applied += 1;
                    }
                    None => stats.dropped += 1,
                },
                GestureEvent::Up | GestureEvent::Leave => {
                    canvas.stop_stroke();
                    stats.applied += 1;
                }
                GestureEvent::Clear => {
                    canvas.clear();
                    stats.applied += 1;
                }
            }
        }

        if stats.dropped > 0 {
            tracing::warn!("Dropped {} pointer events without coordinates", stats.dropped);
        }
        stats
    }
}
