//! Core constants for the marker map surface.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

use std::time::Duration;

/// Mean Earth radius used by the Haversine distance, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Earth radius used by the local metric projection, in metres.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Most zoomed-in discrete SDK level.
pub const MIN_ZOOM_LEVEL: u8 = 1;

/// Most zoomed-out discrete SDK level.
pub const MAX_ZOOM_LEVEL: u8 = 14;

/// Level used when the caller does not supply one.
pub const DEFAULT_ZOOM_LEVEL: u8 = 5;

/// Fallback overlay zoom factor limits.
pub const FALLBACK_MIN_ZOOM: f64 = 0.8;
pub const FALLBACK_MAX_ZOOM: f64 = 2.2;

/// Step applied by the +/- buttons on the fallback path.
pub const FALLBACK_ZOOM_STEP: f64 = 0.2;

/// Fraction of each axis kept free around projected markers.
pub const PROJECTION_PADDING_RATIO: f64 = 0.12;

/// Floor for a degenerate lat/lng range, in degrees.
pub const MIN_COORDINATE_RANGE: f64 = 0.001;

/// Marker diameter in pixels.
pub const MARKER_SIZE: f64 = 26.0;

/// How far outside the canvas a marker center may sit and still be drawn.
pub const MARKER_CULL_MARGIN: f64 = MARKER_SIZE / 2.0;

/// Time the embedded document waits for the SDK before giving up.
pub const SDK_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Camera center used when there is neither a user location nor any marker (Seoul City Hall).
pub const DEFAULT_CENTER: (f64, f64) = (37.5665, 126.978);

/// Overlay stacking order.
pub const MARKER_Z_INDEX: i32 = 1;
pub const SELECTED_MARKER_Z_INDEX: i32 = 10;
pub const USER_LOCATION_Z_INDEX: i32 = 20;

/// Characters of the SDK key shown in diagnostics.
pub const KEY_PREVIEW_LEN: usize = 6;

/// Script endpoint of the map SDK.
pub const DEFAULT_SDK_SCRIPT_URL: &str = "https://dapi.kakao.com/v2/maps/sdk.js";

/// Base URL the embedded document is served from when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost";

/// Approximate meters per pixel for each discrete zoom level, index 0 = level 1.
pub const METERS_PER_PIXEL_BY_LEVEL: [f64; 14] = [
    0.5, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0, 256.0, 512.0, 1024.0, 2048.0, 4096.0,
];
