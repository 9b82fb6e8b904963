//! The slice of the third-party map SDK the document depends on.
//!
//! The SDK is a black box: it is loaded asynchronously from a script URL,
//! then asked to build a map, place custom overlays and move the camera.
//! Clicks flow back through [`MapDocument`](crate::bridge::document::MapDocument)
//! methods rather than closures registered on the SDK.

use crate::core::{
    constants::{MARKER_Z_INDEX, SELECTED_MARKER_Z_INDEX, USER_LOCATION_Z_INDEX},
    geo::LatLng,
};
use async_trait::async_trait;

/// Handle of an overlay placed on the map
pub type OverlayId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayContent {
    Marker { id: String, selected: bool },
    UserLocation,
}

/// A custom overlay: arbitrary content pinned to a coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct CustomOverlay {
    pub position: LatLng,
    pub content: OverlayContent,
    /// Fraction of the content box placed on `position`
    pub anchor: (f64, f64),
    pub z_index: i32,
}

impl CustomOverlay {
    pub fn marker(id: impl Into<String>, position: LatLng, selected: bool) -> Self {
        Self {
            position,
            content: OverlayContent::Marker {
                id: id.into(),
                selected,
            },
            anchor: (0.5, 0.5),
            z_index: if selected { SELECTED_MARKER_Z_INDEX } else { MARKER_Z_INDEX },
        }
    }

    pub fn user_location(position: LatLng) -> Self {
        Self {
            position,
            content: OverlayContent::UserLocation,
            anchor: (0.5, 0.5),
            z_index: USER_LOCATION_Z_INDEX,
        }
    }

    pub fn marker_id(&self) -> Option<&str> {
        match &self.content {
            OverlayContent::Marker { id, .. } => Some(id),
            OverlayContent::UserLocation => None,
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self.content, OverlayContent::Marker { selected: true, .. })
    }
}

/// A loaded SDK bound to one map element
pub trait MapSdk: Send {
    /// Builds the map. Errors are the SDK's own exception text.
    fn create_map(&mut self, center: LatLng, zoom_level: u8) -> Result<(), String>;

    fn add_overlay(&mut self, overlay: CustomOverlay) -> OverlayId;

    fn remove_overlay(&mut self, id: OverlayId);

    fn pan_to(&mut self, center: LatLng);

    fn center(&self) -> LatLng;

    fn zoom_level(&self) -> u8;
}

/// Ways the SDK script can fail to produce a usable API
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SdkLoadError {
    #[error("SDK script failed to load")]
    Script,
    #[error("SDK script loaded without its map namespace")]
    ApiUnavailable,
    #[error("SDK onload callback failed: {0}")]
    Onload(String),
}

/// Fetches and evaluates the SDK script
#[async_trait]
pub trait SdkLoader: Send {
    async fn load(&mut self, script_url: &str) -> Result<Box<dyn MapSdk>, SdkLoadError>;
}
