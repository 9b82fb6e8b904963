//! Two-finger pinch-to-zoom for the fallback renderer.
//!
//! The gesture is an explicit state object owned by one renderer instance:
//!
//! - **Idle**: no gesture. Any touch sample with two or more contacts records
//!   the starting finger distance and zoom and moves to **Pinching**.
//! - **Pinching**: every further sample with two or more contacts sets
//!   `zoom = clamp(start_zoom * distance / start_distance)`.
//! - When fewer than two contacts remain the gesture returns to Idle.
//!
//! Lifting the last finger of a pinch usually also produces a tap on the
//! background. The `was_pinching` flag swallows that tap and is only cleared
//! on the next [`PinchGesture::tick`], after the tap of the same turn has
//! been delivered.

use crate::{
    core::config::ZoomRange,
    input::events::{TouchEvent, TouchPhase},
};

/// Snapshot taken when a pinch starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchState {
    pub start_distance: f64,
    pub start_zoom: f64,
}

#[derive(Debug, Clone)]
pub struct PinchGesture {
    range: ZoomRange,
    state: Option<PinchState>,
    was_pinching: bool,
    clear_on_tick: bool,
}

impl PinchGesture {
    pub fn new(range: ZoomRange) -> Self {
        Self {
            range,
            state: None,
            was_pinching: false,
            clear_on_tick: false,
        }
    }

    pub fn range(&self) -> &ZoomRange {
        &self.range
    }

    pub fn state(&self) -> Option<&PinchState> {
        self.state.as_ref()
    }

    pub fn is_pinching(&self) -> bool {
        self.state.is_some()
    }

    /// Feeds one touch sample; returns the new zoom factor if it changed
    pub fn handle_touch(&mut self, event: &TouchEvent, current_zoom: f64) -> Option<f64> {
        match event.phase {
            TouchPhase::Start | TouchPhase::Move => self.track(event, current_zoom),
            TouchPhase::End | TouchPhase::Cancel => {
                self.release(event.touches.len());
                None
            }
        }
    }

    fn track(&mut self, event: &TouchEvent, current_zoom: f64) -> Option<f64> {
        let distance = event.pinch_distance()?;

        match self.state {
            Some(state) if event.phase == TouchPhase::Move => {
                let scale = distance / state.start_distance;
                let next = self.range.clamp(state.start_zoom * scale);
                (next != current_zoom).then_some(next)
            }
            _ => {
                // A zero-length baseline cannot be scaled from
                if distance <= f64::EPSILON {
                    return None;
                }
                self.state = Some(PinchState {
                    start_distance: distance,
                    start_zoom: current_zoom,
                });
                self.was_pinching = true;
                self.clear_on_tick = false;
                None
            }
        }
    }

    fn release(&mut self, remaining: usize) {
        if remaining < 2 {
            self.state = None;
        }
        if remaining == 0 && self.was_pinching {
            self.clear_on_tick = true;
        }
    }

    /// Consumes the post-pinch flag; true means the tap must be ignored
    pub fn suppress_tap(&mut self) -> bool {
        if self.was_pinching {
            self.was_pinching = false;
            self.clear_on_tick = false;
            return true;
        }
        false
    }

    /// Marks the end of an event-loop turn
    pub fn tick(&mut self) {
        if self.clear_on_tick {
            self.was_pinching = false;
            self.clear_on_tick = false;
        }
    }

    /// Resets all gesture state
    pub fn reset(&mut self) {
        self.state = None;
        self.was_pinching = false;
        self.clear_on_tick = false;
    }
}

impl Default for PinchGesture {
    fn default() -> Self {
        Self::new(ZoomRange::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::events::TouchPoint;

    fn two_fingers(phase: TouchPhase, spread: f64) -> TouchEvent {
        TouchEvent::new(
            phase,
            vec![TouchPoint::new(1, 100.0, 100.0), TouchPoint::new(2, 100.0 + spread, 100.0)],
        )
    }

    fn lifted(remaining: usize) -> TouchEvent {
        let touches = (0..remaining)
            .map(|i| TouchPoint::new(i as u64, 10.0 * i as f64, 0.0))
            .collect();
        TouchEvent::new(TouchPhase::End, touches)
    }

    #[test]
    fn test_single_finger_does_not_pinch() {
        let mut gesture = PinchGesture::default();
        let one = TouchEvent::new(TouchPhase::Start, vec![TouchPoint::new(1, 0.0, 0.0)]);
        assert_eq!(gesture.handle_touch(&one, 1.0), None);
        assert!(!gesture.is_pinching());
        assert!(!gesture.suppress_tap());
    }

    #[test]
    fn test_pinch_scales_from_start_zoom() {
        let mut gesture = PinchGesture::default();
        assert_eq!(gesture.handle_touch(&two_fingers(TouchPhase::Start, 100.0), 1.0), None);
        assert_eq!(
            gesture.state(),
            Some(&PinchState {
                start_distance: 100.0,
                start_zoom: 1.0
            })
        );

        assert_eq!(gesture.handle_touch(&two_fingers(TouchPhase::Move, 150.0), 1.0), Some(1.5));
        // Scale is always relative to the start sample, not the previous move
        assert_eq!(gesture.handle_touch(&two_fingers(TouchPhase::Move, 120.0), 1.5), Some(1.2));
    }

    #[test]
    fn test_pinch_is_clamped() {
        let mut gesture = PinchGesture::default();
        gesture.handle_touch(&two_fingers(TouchPhase::Start, 100.0), 1.0);
        assert_eq!(gesture.handle_touch(&two_fingers(TouchPhase::Move, 1000.0), 1.0), Some(2.2));
        assert_eq!(gesture.handle_touch(&two_fingers(TouchPhase::Move, 1.0), 2.2), Some(0.8));
    }

    #[test]
    fn test_zero_spread_start_is_ignored() {
        let mut gesture = PinchGesture::default();
        gesture.handle_touch(&two_fingers(TouchPhase::Start, 0.0), 1.0);
        assert!(!gesture.is_pinching());
    }

    #[test]
    fn test_release_clears_state() {
        let mut gesture = PinchGesture::default();
        gesture.handle_touch(&two_fingers(TouchPhase::Start, 100.0), 1.0);
        gesture.handle_touch(&lifted(1), 1.0);
        assert!(!gesture.is_pinching());

        // A lone finger moving afterwards does not zoom
        let one = TouchEvent::new(TouchPhase::Move, vec![TouchPoint::new(1, 50.0, 50.0)]);
        assert_eq!(gesture.handle_touch(&one, 1.0), None);
    }

    #[test]
    fn test_tap_after_pinch_is_suppressed_once() {
        let mut gesture = PinchGesture::default();
        gesture.handle_touch(&two_fingers(TouchPhase::Start, 100.0), 1.0);
        gesture.handle_touch(&lifted(0), 1.0);

        assert!(gesture.suppress_tap());
        assert!(!gesture.suppress_tap());
    }

    #[test]
    fn test_tick_clears_flag_when_no_tap_arrives() {
        let mut gesture = PinchGesture::default();
        gesture.handle_touch(&two_fingers(TouchPhase::Start, 100.0), 1.0);
        gesture.handle_touch(&lifted(0), 1.0);
        gesture.tick();

        assert!(!gesture.suppress_tap());
    }

    #[test]
    fn test_tick_during_pinch_keeps_flag() {
        let mut gesture = PinchGesture::default();
        gesture.handle_touch(&two_fingers(TouchPhase::Start, 100.0), 1.0);
        gesture.tick();
        gesture.handle_touch(&lifted(0), 1.0);

        assert!(gesture.suppress_tap());
    }
}
