//! Camera state for the embedded map path.
//!
//! The SDK works with discrete zoom levels where a *larger* level is more
//! zoomed out. Levels are always kept inside `MIN_ZOOM_LEVEL..=MAX_ZOOM_LEVEL`.

use crate::core::{
    constants::{MAX_ZOOM_LEVEL, METERS_PER_PIXEL_BY_LEVEL, MIN_ZOOM_LEVEL},
    geo::LatLng,
};
use serde::{Deserialize, Serialize};

/// Clamps an arbitrary requested level into the supported discrete range
pub fn clamp_zoom_level(level: i32) -> u8 {
    level.clamp(MIN_ZOOM_LEVEL as i32, MAX_ZOOM_LEVEL as i32) as u8
}

/// Approximate ground resolution of a zoom level
pub fn meters_per_pixel(level: u8) -> f64 {
    let level = clamp_zoom_level(level as i32);
    METERS_PER_PIXEL_BY_LEVEL[(level - MIN_ZOOM_LEVEL) as usize]
}

/// Viewport of the embedded map: center plus discrete zoom level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub center: LatLng,
    zoom_level: u8,
}

impl Camera {
    pub fn new(center: LatLng, zoom_level: i32) -> Self {
        Self {
            center,
            zoom_level: clamp_zoom_level(zoom_level),
        }
    }

    pub fn zoom_level(&self) -> u8 {
        self.zoom_level
    }

    pub fn set_zoom_level(&mut self, level: i32) {
        self.zoom_level = clamp_zoom_level(level);
    }

    /// One level closer to the ground
    pub fn zoom_in(&mut self) {
        self.set_zoom_level(self.zoom_level as i32 - 1);
    }

    /// One level further from the ground
    pub fn zoom_out(&mut self) {
        self.set_zoom_level(self.zoom_level as i32 + 1);
    }

    pub fn meters_per_pixel(&self) -> f64 {
        meters_per_pixel(self.zoom_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_level_clamping() {
        assert_eq!(clamp_zoom_level(-3), MIN_ZOOM_LEVEL);
        assert_eq!(clamp_zoom_level(0), 1);
        assert_eq!(clamp_zoom_level(7), 7);
        assert_eq!(clamp_zoom_level(99), MAX_ZOOM_LEVEL);
    }

    #[test]
    fn test_zoom_steps_stay_in_range() {
        let mut camera = Camera::new(LatLng::new(37.5, 127.0), 5);
        for _ in 0..20 {
            camera.zoom_in();
            assert!((1..=14).contains(&camera.zoom_level()));
        }
        assert_eq!(camera.zoom_level(), 1);
        for _ in 0..20 {
            camera.zoom_out();
            assert!((1..=14).contains(&camera.zoom_level()));
        }
        assert_eq!(camera.zoom_level(), 14);
    }

    #[test]
    fn test_meters_per_pixel_table() {
        assert_eq!(meters_per_pixel(1), 0.5);
        assert_eq!(meters_per_pixel(5), 8.0);
        assert_eq!(meters_per_pixel(14), 4096.0);
        assert_eq!(meters_per_pixel(0), 0.5);
        assert_eq!(meters_per_pixel(200), 4096.0);
    }
}
