pub mod events;
pub mod gestures;

// Re-export the essential types
pub use events::{InputEvent, SurfaceEvent, TouchEvent, TouchPhase, TouchPoint};
pub use gestures::{PinchGesture, PinchState};
