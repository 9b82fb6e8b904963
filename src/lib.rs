//! # pinmap
//!
//! A marker map surface with two interchangeable rendering paths.
//!
//! The embedded path drives a third-party map SDK inside an isolated
//! document and talks to it over a JSON message bridge. The fallback path
//! is pure geometry: it projects markers onto a plain canvas and never
//! fails. [`ui::surface::MapSurfaceController`] picks one of them.

pub mod bridge;
pub mod core;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod rendering;
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    bounds::Bounds,
    camera::Camera,
    config::{SdkCredentials, SurfaceConfig, ZoomRange},
    geo::{distance_km, LatLng, LatLngBounds, Point},
    options::{MapCallbacks, MapOptions, RenderMode},
};

pub use layers::marker::{Marker, MarkerSet};

pub use input::{
    events::{InputEvent, SurfaceEvent, TouchEvent, TouchPhase, TouchPoint},
    gestures::PinchGesture,
};

pub use rendering::fallback::{FallbackFrame, FallbackRenderer};

pub use bridge::{
    document::MapDocument,
    guard::ErrorReportGuard,
    host::{EmbeddedSurface, MapBridgeHost},
    message::{BridgeMessage, HostCommand, InitialPayload},
};

pub use ui::surface::{MapSurfaceController, SurfaceView};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
///
/// The first seven variants are the failures a mounted map surface can
/// report to its host; at most one of them reaches `onError` per surface
/// generation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("Map SDK app key is missing. Set {env} before mounting the map.")]
    MissingCredential { env: &'static str },

    #[error("Failed to load map SDK script. Check key/service/domain. key={key}, baseUrl={base_url}")]
    SdkScriptLoadFailure { key: String, base_url: String },

    #[error("Map SDK loaded but its API is unavailable. key={key}, baseUrl={base_url}")]
    SdkApiUnavailable { key: String, base_url: String },

    #[error("Map SDK load timed out. key={key}, baseUrl={base_url}")]
    SdkInitTimeout { key: String, base_url: String },

    #[error("Map initialization failed: {0}")]
    SdkInitException(String),

    #[error("Map surface failed to render: {0}")]
    TransportRenderFailure(String),

    #[error("Failed to parse map message from embedded surface")]
    MessageParseFailure,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Embedded map surface unavailable: {0}")]
    SurfaceUnavailable(String),
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::Serialization(err.to_string())
    }
}

impl MapError {
    /// True for failures that come from the embedded surface instance and
    /// are funneled through its error guard
    pub fn is_surface_failure(&self) -> bool {
        matches!(
            self,
            MapError::MissingCredential { .. }
                | MapError::SdkScriptLoadFailure { .. }
                | MapError::SdkApiUnavailable { .. }
                | MapError::SdkInitTimeout { .. }
                | MapError::SdkInitException(_)
                | MapError::TransportRenderFailure(_)
                | MapError::MessageParseFailure
        )
    }
}
