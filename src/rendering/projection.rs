//! Geographic → canvas projections for the fallback renderer.
//!
//! Neither projection needs basemap tiles. [`FitProjection`] stretches the
//! marker bounding box over the padded canvas; [`MetricProjection`] places
//! markers around a camera center using the SDK's meters-per-pixel table.
//! Both apply the overlay zoom factor around the canvas center last.

use crate::core::{
    bounds::Bounds,
    camera::Camera,
    geo::{LatLng, LatLngBounds, Point},
};

/// Scales `base` away from (or towards) the canvas center
pub fn apply_zoom(base: Point, canvas: &Bounds, zoom_factor: f64) -> Point {
    let center = canvas.center();
    base.subtract(&center).multiply(zoom_factor).add(&center)
}

/// Fits the marker bounding box into the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitProjection {
    min_lat: f64,
    min_lng: f64,
    lat_range: f64,
    lng_range: f64,
    padding_ratio: f64,
}

impl FitProjection {
    /// `min_range` floors each axis so co-located markers do not divide by
    /// zero; a floored axis is centered on the markers' midpoint
    pub fn new(bounds: &LatLngBounds, padding_ratio: f64, min_range: f64) -> Self {
        let span = bounds.span();
        let mid = bounds.center();
        let (min_lat, lat_range) = Self::axis(bounds.south_west.lat, span.lat, mid.lat, min_range);
        let (min_lng, lng_range) = Self::axis(bounds.south_west.lng, span.lng, mid.lng, min_range);

        Self {
            min_lat,
            min_lng,
            lat_range,
            lng_range,
            padding_ratio: padding_ratio.clamp(0.0, 0.49),
        }
    }

    fn axis(min: f64, span: f64, mid: f64, min_range: f64) -> (f64, f64) {
        if span >= min_range {
            (min, span)
        } else {
            (mid - min_range / 2.0, min_range)
        }
    }

    /// Position inside the unit square, north up
    pub fn normalize(&self, position: LatLng) -> Point {
        let x = (position.lng - self.min_lng) / self.lng_range;
        let y = 1.0 - (position.lat - self.min_lat) / self.lat_range;
        Point::new(x, y)
    }

    /// Canvas position before the final clamp; may fall outside the canvas
    /// once the zoom factor exceeds 1
    pub fn project(&self, position: LatLng, canvas: &Bounds, zoom_factor: f64) -> Point {
        if canvas.is_empty() {
            return canvas.center();
        }

        let unit = self.normalize(position);
        let pad = self.padding_ratio;
        let padded = Point::new(pad + unit.x * (1.0 - pad * 2.0), pad + unit.y * (1.0 - pad * 2.0));
        let base = canvas.clamp_point(Point::new(
            canvas.min.x + padded.x * canvas.width(),
            canvas.min.y + padded.y * canvas.height(),
        ));

        apply_zoom(base, canvas, zoom_factor)
    }
}

/// Static-map style placement relative to a camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricProjection {
    pub camera: Camera,
}

impl MetricProjection {
    pub fn new(camera: Camera) -> Self {
        Self { camera }
    }

    pub fn project(&self, position: LatLng, canvas: &Bounds, zoom_factor: f64) -> Point {
        if canvas.is_empty() {
            return canvas.center();
        }

        let mpp = self.camera.meters_per_pixel();
        let offset = position.offset_meters_from(&self.camera.center);

        // Screen y grows downwards while latitude grows northwards
        let base = canvas.center().add(&Point::new(offset.x / mpp, -offset.y / mpp));
        apply_zoom(base, canvas, zoom_factor)
    }
}
