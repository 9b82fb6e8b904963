use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Input events understood by the fallback renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Raw multi-touch sample
    Touch(TouchEvent),
    /// A completed press at a canvas position
    Tap { position: Point },
    /// "+" zoom button
    ZoomIn,
    /// "-" zoom button
    ZoomOut,
    /// Canvas resize / first layout
    Resize { width: f64, height: f64 },
    /// End of the current event-loop turn
    Tick,
}

/// Types of touch events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// Individual touch point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Point,
}

impl TouchPoint {
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self {
            id,
            position: Point::new(x, y),
        }
    }
}

/// A touch sample. `touches` lists every contact still on the surface
/// after the event, so an `End` lifting the last finger carries none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub touches: Vec<TouchPoint>,
}

impl TouchEvent {
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>) -> Self {
        Self { phase, touches }
    }

    /// Distance between the first two contacts, if there are two
    pub fn pinch_distance(&self) -> Option<f64> {
        match self.touches.as_slice() {
            [first, second, ..] => Some(first.position.distance_to(&second.position)),
            _ => None,
        }
    }
}

/// Outcome of an input event, reported back to the host
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// A marker was tapped
    Select(String),
    /// Empty map area was tapped
    BackgroundPress,
    /// The overlay zoom factor changed
    ZoomChanged(f64),
    /// The discrete zoom level changed (camera layout)
    ZoomLevelChanged(u8),
}
