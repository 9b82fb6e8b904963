use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Represents a bounding box in screen/pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Creates new bounds from two points
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    /// Canvas rectangle anchored at the origin
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::from_coords(0.0, 0.0, width.max(0.0), height.max(0.0))
    }

    /// Gets the width of the bounds
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Gets the height of the bounds
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// True when either side has no extent (canvas not laid out yet)
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Grows the bounds by `margin` on every side
    pub fn pad(&self, margin: f64) -> Bounds {
        Bounds::new(
            Point::new(self.min.x - margin, self.min.y - margin),
            Point::new(self.max.x + margin, self.max.y + margin),
        )
    }

    /// Pulls a point back inside the bounds
    pub fn clamp_point(&self, point: Point) -> Point {
        Point::new(
            point.x.max(self.min.x).min(self.max.x),
            point.y.max(self.min.y).min(self.max.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_creation() {
        let bounds = Bounds::from_size(300.0, 200.0);
        assert_eq!(bounds.width(), 300.0);
        assert_eq!(bounds.height(), 200.0);
        assert_eq!(bounds.center(), Point::new(150.0, 100.0));
        assert!(!bounds.is_empty());
        assert!(Bounds::from_size(0.0, 200.0).is_empty());
    }

    #[test]
    fn test_pad_and_clamp() {
        let bounds = Bounds::from_size(100.0, 100.0);
        let outside = Point::new(-10.0, 50.0);
        assert!(!bounds.contains(&outside));
        assert!(bounds.pad(13.0).contains(&outside));
        assert_eq!(bounds.clamp_point(outside), Point::new(0.0, 50.0));
    }
}
