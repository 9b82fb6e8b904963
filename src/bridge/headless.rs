//! In-memory stand-in for the map SDK.
//!
//! [`HeadlessSdk`] keeps the camera and the overlay list behind a shared
//! handle, so a clone kept outside the document can watch what the
//! document does to the map. [`HeadlessLoader`] hands it out after an
//! optional delay, or fails the way a real script load can.

use crate::{
    bridge::sdk::{CustomOverlay, MapSdk, OverlayId, SdkLoadError, SdkLoader},
    core::{camera::Camera, geo::LatLng},
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
#[cfg(feature = "tokio-runtime")]
use std::time::Duration;

/// Observable state of a headless map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessMap {
    pub camera: Option<Camera>,
    pub overlays: Vec<(OverlayId, CustomOverlay)>,
    pub pans: Vec<LatLng>,
    next_id: OverlayId,
}

impl HeadlessMap {
    pub fn is_created(&self) -> bool {
        self.camera.is_some()
    }

    /// Marker overlays in insertion order
    pub fn marker_ids(&self) -> Vec<&str> {
        self.overlays.iter().filter_map(|(_, o)| o.marker_id()).collect()
    }

    pub fn selected_marker(&self) -> Option<&str> {
        self.overlays
            .iter()
            .find(|(_, o)| o.is_selected())
            .and_then(|(_, o)| o.marker_id())
    }

    pub fn user_location(&self) -> Option<LatLng> {
        self.overlays
            .iter()
            .find(|(_, o)| o.marker_id().is_none())
            .map(|(_, o)| o.position)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessSdk {
    state: Arc<Mutex<HeadlessMap>>,
    create_error: Option<String>,
}

impl HeadlessSdk {
    pub fn new() -> Self {
        Self::default()
    }

    /// An SDK whose map constructor throws `message`
    pub fn failing_create(message: impl Into<String>) -> Self {
        Self {
            create_error: Some(message.into()),
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessMap> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> HeadlessMap {
        self.lock().clone()
    }
}

impl MapSdk for HeadlessSdk {
    fn create_map(&mut self, center: LatLng, zoom_level: u8) -> Result<(), String> {
        if let Some(message) = &self.create_error {
            return Err(message.clone());
        }
        let mut map = self.lock();
        *map = HeadlessMap {
            camera: Some(Camera::new(center, zoom_level as i32)),
            ..HeadlessMap::default()
        };
        Ok(())
    }

    fn add_overlay(&mut self, overlay: CustomOverlay) -> OverlayId {
        let mut map = self.lock();
        map.next_id += 1;
        let id = map.next_id;
        map.overlays.push((id, overlay));
        id
    }

    fn remove_overlay(&mut self, id: OverlayId) {
        self.lock().overlays.retain(|(overlay, _)| *overlay != id);
    }

    fn pan_to(&mut self, center: LatLng) {
        let mut map = self.lock();
        if let Some(camera) = map.camera.as_mut() {
            camera.center = center;
        }
        map.pans.push(center);
    }

    fn center(&self) -> LatLng {
        self.lock().camera.map(|c| c.center).unwrap_or_default()
    }

    fn zoom_level(&self) -> u8 {
        self.lock()
            .camera
            .map(|c| c.zoom_level())
            .unwrap_or(crate::core::constants::DEFAULT_ZOOM_LEVEL)
    }
}

#[derive(Debug, Clone)]
enum LoadOutcome {
    Ready(HeadlessSdk),
    Fail(SdkLoadError),
    Never,
}

/// Loader that resolves to a [`HeadlessSdk`]
#[derive(Debug, Clone)]
pub struct HeadlessLoader {
    outcome: LoadOutcome,
    #[cfg(feature = "tokio-runtime")]
    delay: Option<Duration>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl HeadlessLoader {
    fn with_outcome(outcome: LoadOutcome) -> Self {
        Self {
            outcome,
            #[cfg(feature = "tokio-runtime")]
            delay: None,
            requested: Arc::default(),
        }
    }

    pub fn ready(sdk: HeadlessSdk) -> Self {
        Self::with_outcome(LoadOutcome::Ready(sdk))
    }

    pub fn failing(error: SdkLoadError) -> Self {
        Self::with_outcome(LoadOutcome::Fail(error))
    }

    /// A script request that never settles
    pub fn hanging() -> Self {
        Self::with_outcome(LoadOutcome::Never)
    }

    /// Settles only after `delay`
    #[cfg(feature = "tokio-runtime")]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Script URLs this loader (and its clones) were asked for
    pub fn requested_urls(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SdkLoader for HeadlessLoader {
    async fn load(&mut self, script_url: &str) -> Result<Box<dyn MapSdk>, SdkLoadError> {
        if let Ok(mut urls) = self.requested.lock() {
            urls.push(script_url.to_string());
        }

        #[cfg(feature = "tokio-runtime")]
        if let Some(delay) = self.delay {
            crate::runtime::sleep(delay).await;
        }

        match &self.outcome {
            LoadOutcome::Ready(sdk) => Ok(Box::new(sdk.clone())),
            LoadOutcome::Fail(error) => Err(error.clone()),
            LoadOutcome::Never => futures::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_map_records_calls() {
        let observer = HeadlessSdk::new();
        let mut sdk = observer.clone();

        sdk.create_map(LatLng::new(37.5, 127.0), 5).unwrap();
        let a = sdk.add_overlay(CustomOverlay::marker("a", LatLng::new(37.5, 127.0), false));
        sdk.add_overlay(CustomOverlay::marker("b", LatLng::new(37.6, 127.1), true));
        sdk.remove_overlay(a);
        sdk.pan_to(LatLng::new(37.6, 127.1));

        let map = observer.snapshot();
        assert!(map.is_created());
        assert_eq!(map.marker_ids(), vec!["b"]);
        assert_eq!(map.selected_marker(), Some("b"));
        assert_eq!(observer.center(), LatLng::new(37.6, 127.1));
        assert_eq!(observer.zoom_level(), 5);
    }

    #[test]
    fn test_failing_create() {
        let mut sdk = HeadlessSdk::failing_create("boom");
        assert_eq!(sdk.create_map(LatLng::default(), 3), Err("boom".to_string()));
        assert!(!sdk.snapshot().is_created());
    }

    #[test]
    fn test_loader_outcomes() {
        futures::executor::block_on(async {
            let mut ok = HeadlessLoader::ready(HeadlessSdk::new());
            assert!(ok.load("https://sdk/a.js").await.is_ok());
            assert_eq!(ok.requested_urls(), vec!["https://sdk/a.js".to_string()]);

            let mut bad = HeadlessLoader::failing(SdkLoadError::ApiUnavailable);
            assert_eq!(bad.load("x").await.err(), Some(SdkLoadError::ApiUnavailable));
        });
    }
}
