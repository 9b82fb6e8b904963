//! The document that runs inside the embedded surface.
//!
//! `MapDocument` owns the SDK once it is loaded and is driven by whoever
//! hosts it (see [`LocalSurface`](crate::bridge::local::LocalSurface)):
//!
//! ```text
//! Unbooted --boot--> LoadingSdk --sdk loaded--> Initialized
//!     |                  |  (timeout / load error / init error)
//!     +------------------+--------------------> Failed
//! ```
//!
//! Every transition out of `LoadingSdk` happens at most once, so an SDK that
//! finishes loading after the deadline already failed the document is
//! dropped untouched. Outbound traffic is JSON [`BridgeMessage`]s pushed
//! into the outbox channel; the document itself sends at most one `error`.

use crate::{
    bridge::{
        message::{BridgeMessage, HostCommand, InitialPayload},
        sdk::{CustomOverlay, MapSdk, OverlayId, SdkLoadError},
    },
    core::{
        config::{SdkCredentials, APP_KEY_ENV},
        geo::LatLng,
    },
    layers::marker::{Marker, MarkerSet},
    MapError, Result,
};
use crossbeam_channel::Sender;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Unbooted,
    LoadingSdk,
    Initialized,
    Failed,
}

/// What the driver has to do after [`MapDocument::boot`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootStep {
    /// Fetch the SDK from this URL and arm the load deadline
    LoadScript(String),
    /// Nothing to load; the document failed or was already booted
    Halted,
}

pub struct MapDocument {
    state: DocumentState,
    markers: MarkerSet,
    selected_id: Option<String>,
    requested_selection: Option<String>,
    user_location: Option<LatLng>,
    center: LatLng,
    zoom_level: u8,
    credentials: SdkCredentials,
    sdk_script_url: String,
    sdk: Option<Box<dyn MapSdk>>,
    marker_overlays: Vec<(OverlayId, String)>,
    user_overlay: Option<OverlayId>,
    pre_selection_center: Option<LatLng>,
    error_sent: bool,
    outbox: Sender<String>,
}

impl MapDocument {
    pub fn new(payload: InitialPayload, outbox: Sender<String>) -> Self {
        let markers = MarkerSet::new(payload.markers.iter().map(Marker::from).collect());
        let credentials = SdkCredentials::new(payload.app_key.unwrap_or_default(), payload.base_url);

        Self {
            state: DocumentState::Unbooted,
            markers,
            selected_id: None,
            requested_selection: payload.selected_id,
            user_location: payload.user_location,
            center: payload.center,
            zoom_level: payload.zoom_level,
            credentials,
            sdk_script_url: payload.sdk_script_url,
            sdk: None,
            marker_overlays: Vec::new(),
            user_overlay: None,
            pre_selection_center: None,
            error_sent: false,
            outbox,
        }
    }

    pub fn from_json(payload: &str, outbox: Sender<String>) -> Result<Self> {
        Ok(Self::new(InitialPayload::from_json(payload)?, outbox))
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn user_location(&self) -> Option<LatLng> {
        self.user_location
    }

    pub fn pre_selection_center(&self) -> Option<LatLng> {
        self.pre_selection_center
    }

    /// Live camera center, once the map exists
    pub fn camera_center(&self) -> Option<LatLng> {
        self.sdk.as_ref().map(|sdk| sdk.center())
    }

    /// Leaves `Unbooted`. A missing key fails right here, before any
    /// network request.
    pub fn boot(&mut self) -> BootStep {
        if self.state != DocumentState::Unbooted {
            log::debug!("boot requested in state {:?}, ignoring", self.state);
            return BootStep::Halted;
        }

        match self.credentials.script_url(&self.sdk_script_url) {
            Some(url) => {
                log::info!(
                    "loading map SDK (key={}, baseUrl={})",
                    self.credentials.key_preview(),
                    self.credentials.base_url
                );
                self.state = DocumentState::LoadingSdk;
                BootStep::LoadScript(url)
            }
            None => {
                self.fail(MapError::MissingCredential { env: APP_KEY_ENV });
                BootStep::Halted
            }
        }
    }

    pub fn on_sdk_loaded(&mut self, mut sdk: Box<dyn MapSdk>) {
        if self.state != DocumentState::LoadingSdk {
            log::debug!("SDK arrived in state {:?}, dropping it", self.state);
            return;
        }

        if let Err(message) = sdk.create_map(self.center, self.zoom_level) {
            self.fail(MapError::SdkInitException(message));
            return;
        }

        log::info!(
            "map initialised at ({}, {}) level {} with {} markers",
            self.center.lat,
            self.center.lng,
            self.zoom_level,
            self.markers.len()
        );
        self.sdk = Some(sdk);
        self.state = DocumentState::Initialized;
        self.render_markers();
        self.render_user_location();

        if let Some(id) = self.requested_selection.take() {
            self.apply_selection(Some(id));
        }
    }

    pub fn on_sdk_load_failed(&mut self, error: SdkLoadError) {
        if self.state != DocumentState::LoadingSdk {
            log::debug!("SDK load error in state {:?}, dropping: {error}", self.state);
            return;
        }

        let key = self.credentials.key_preview();
        let base_url = self.credentials.base_url.clone();
        let error = match error {
            SdkLoadError::Script => MapError::SdkScriptLoadFailure { key, base_url },
            SdkLoadError::ApiUnavailable => MapError::SdkApiUnavailable { key, base_url },
            SdkLoadError::Onload(message) => MapError::SdkInitException(message),
        };
        self.fail(error);
    }

    pub fn on_load_timeout(&mut self) {
        if self.state != DocumentState::LoadingSdk {
            return;
        }
        self.fail(MapError::SdkInitTimeout {
            key: self.credentials.key_preview(),
            base_url: self.credentials.base_url.clone(),
        });
    }

    /// Selection change requested by the host. Before the map exists the
    /// request is remembered and applied at init.
    pub fn update_selected_marker(&mut self, id: Option<String>) {
        match self.state {
            DocumentState::Initialized => self.apply_selection(id),
            _ => self.requested_selection = id,
        }
    }

    pub fn update_user_location(&mut self, location: Option<LatLng>) {
        self.user_location = location;
        if self.state == DocumentState::Initialized {
            self.render_user_location();
        }
    }

    pub fn handle_command(&mut self, command: HostCommand) {
        match command {
            HostCommand::UpdateSelectedMarker { id } => self.update_selected_marker(id),
            HostCommand::UpdateUserLocation { location } => self.update_user_location(location),
        }
    }

    pub fn handle_command_json(&mut self, raw: &str) -> Result<()> {
        let command = HostCommand::from_json(raw)?;
        self.handle_command(command);
        Ok(())
    }

    /// Click on the map outside any overlay
    pub fn on_map_click(&mut self) {
        if self.state == DocumentState::Initialized {
            self.emit(BridgeMessage::MapClick);
        }
    }

    pub fn on_overlay_click(&mut self, overlay: OverlayId) {
        if self.state != DocumentState::Initialized {
            return;
        }
        let id = self
            .marker_overlays
            .iter()
            .find(|(handle, _)| *handle == overlay)
            .map(|(_, id)| id.clone());
        match id {
            Some(id) => self.emit(BridgeMessage::MarkerClick { id }),
            None => log::debug!("click on unknown overlay {overlay}"),
        }
    }

    /// Clicks the overlay currently drawn for marker `id`
    pub fn click_marker(&mut self, id: &str) {
        let overlay = self
            .marker_overlays
            .iter()
            .find(|(_, marker)| marker == id)
            .map(|(handle, _)| *handle);
        if let Some(overlay) = overlay {
            self.on_overlay_click(overlay);
        }
    }

    fn apply_selection(&mut self, id: Option<String>) {
        if id == self.selected_id {
            return;
        }

        // Only the first selection of a run remembers where the camera was
        if self.selected_id.is_none() {
            self.pre_selection_center = self.camera_center();
        }
        let previous = std::mem::replace(&mut self.selected_id, id);
        self.render_markers();

        let target = self
            .selected_id
            .as_deref()
            .and_then(|id| self.markers.get(id))
            .map(Marker::position);

        match (self.selected_id.clone(), target) {
            (Some(_), Some(position)) => self.pan_to(position),
            (Some(id), None) => log::debug!("selected marker '{id}' is not on the map"),
            (None, _) => {
                if let Some(center) = self.pre_selection_center.take() {
                    self.pan_to(center);
                } else {
                    log::debug!("deselected {previous:?} without a stored center");
                }
            }
        }
    }

    fn pan_to(&mut self, position: LatLng) {
        if let Some(sdk) = self.sdk.as_mut() {
            sdk.pan_to(position);
        }
    }

    /// Drops every marker overlay and draws the current set again
    fn render_markers(&mut self) {
        let Some(sdk) = self.sdk.as_mut() else {
            return;
        };

        for (overlay, _) in self.marker_overlays.drain(..) {
            sdk.remove_overlay(overlay);
        }
        for marker in self.markers.iter() {
            let selected = self.selected_id.as_deref() == Some(marker.id.as_str());
            let overlay = sdk.add_overlay(CustomOverlay::marker(
                marker.id.clone(),
                marker.position(),
                selected,
            ));
            self.marker_overlays.push((overlay, marker.id.clone()));
        }
    }

    fn render_user_location(&mut self) {
        let Some(sdk) = self.sdk.as_mut() else {
            return;
        };

        if let Some(overlay) = self.user_overlay.take() {
            sdk.remove_overlay(overlay);
        }
        if let Some(location) = self.user_location.filter(LatLng::is_valid) {
            self.user_overlay = Some(sdk.add_overlay(CustomOverlay::user_location(location)));
        }
    }

    fn fail(&mut self, error: MapError) {
        log::error!("map document failed in state {:?}: {error}", self.state);
        self.state = DocumentState::Failed;
        self.sdk = None;
        self.marker_overlays.clear();
        self.user_overlay = None;
        self.send_error(&error.to_string());
    }

    fn send_error(&mut self, message: &str) {
        if self.error_sent {
            return;
        }
        self.error_sent = true;
        let message = format!("{message} | href={}", self.credentials.base_url);
        self.emit(BridgeMessage::Error { message });
    }

    fn emit(&self, message: BridgeMessage) {
        match message.to_json() {
            Ok(json) => {
                if self.outbox.send(json).is_err() {
                    log::debug!("bridge closed, dropping {} message", message.kind());
                }
            }
            Err(err) => log::error!("failed to encode {} message: {err}", message.kind()),
        }
    }
}

impl fmt::Debug for MapDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapDocument")
            .field("state", &self.state)
            .field("markers", &self.markers.len())
            .field("selected_id", &self.selected_id)
            .field("user_location", &self.user_location)
            .field("pre_selection_center", &self.pre_selection_center)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bridge::headless::HeadlessSdk, core::config::SurfaceConfig};
    use crossbeam_channel::{unbounded, Receiver};

    fn payload(app_key: Option<&str>, selected: Option<&str>) -> InitialPayload {
        let markers = MarkerSet::new(vec![
            Marker::new("a", "A", 37.50, 127.00),
            Marker::new("b", "B", 37.51, 127.01),
        ]);
        InitialPayload::new(
            &markers,
            selected.map(str::to_string),
            None,
            5,
            app_key.map(str::to_string),
            "http://localhost".into(),
            &SurfaceConfig::default(),
        )
    }

    fn document(app_key: Option<&str>) -> (MapDocument, Receiver<String>) {
        let (tx, rx) = unbounded();
        (MapDocument::new(payload(app_key, None), tx), rx)
    }

    fn booted() -> (MapDocument, HeadlessSdk, Receiver<String>) {
        let (mut doc, rx) = document(Some("abcdef123456"));
        let sdk = HeadlessSdk::new();
        assert!(matches!(doc.boot(), BootStep::LoadScript(_)));
        doc.on_sdk_loaded(Box::new(sdk.clone()));
        (doc, sdk, rx)
    }

    fn close(a: LatLng, b: LatLng) -> bool {
        (a.lat - b.lat).abs() < 1e-9 && (a.lng - b.lng).abs() < 1e-9
    }

    fn messages(rx: &Receiver<String>) -> Vec<BridgeMessage> {
        rx.try_iter()
            .map(|raw| serde_json::from_str(&raw).unwrap())
            .collect()
    }

    #[test]
    fn test_missing_key_fails_without_loading() {
        let (mut doc, rx) = document(None);
        assert_eq!(doc.boot(), BootStep::Halted);
        assert_eq!(doc.state(), DocumentState::Failed);

        let sent = messages(&rx);
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            BridgeMessage::Error { message } => {
                assert!(message.contains(APP_KEY_ENV));
                assert!(message.ends_with(" | href=http://localhost"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_boot_returns_script_url() {
        let (mut doc, _rx) = document(Some("abcdef123456"));
        match doc.boot() {
            BootStep::LoadScript(url) => {
                assert!(url.contains("appkey=abcdef123456"));
                assert!(url.ends_with("autoload=false"));
            }
            BootStep::Halted => panic!("expected a script load"),
        }
        assert_eq!(doc.state(), DocumentState::LoadingSdk);
        assert_eq!(doc.boot(), BootStep::Halted);
    }

    #[test]
    fn test_init_renders_markers_at_centroid() {
        let (doc, sdk, rx) = booted();
        assert_eq!(doc.state(), DocumentState::Initialized);

        let map = sdk.snapshot();
        assert_eq!(map.marker_ids(), vec!["a", "b"]);
        assert_eq!(map.selected_marker(), None);
        assert!(close(sdk.center(), LatLng::new(37.505, 127.005)));
        assert!(messages(&rx).is_empty());
    }

    #[test]
    fn test_late_sdk_after_timeout_is_ignored() {
        let (mut doc, rx) = document(Some("abcdef123456"));
        doc.boot();
        doc.on_load_timeout();

        let sdk = HeadlessSdk::new();
        doc.on_sdk_loaded(Box::new(sdk.clone()));
        doc.on_sdk_load_failed(SdkLoadError::Script);

        assert_eq!(doc.state(), DocumentState::Failed);
        assert!(!sdk.snapshot().is_created());

        let sent = messages(&rx);
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            BridgeMessage::Error { message } => {
                assert!(message.contains("timed out"));
                assert!(message.contains("key=abcdef..."));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_load_errors_map_to_taxonomy() {
        for (error, needle) in [
            (SdkLoadError::Script, "Failed to load map SDK script"),
            (SdkLoadError::ApiUnavailable, "API is unavailable"),
            (SdkLoadError::Onload("bad".into()), "initialization failed: bad"),
        ] {
            let (mut doc, rx) = document(Some("abcdef123456"));
            doc.boot();
            doc.on_sdk_load_failed(error);
            let sent = messages(&rx);
            assert!(
                matches!(&sent[..], [BridgeMessage::Error { message }] if message.contains(needle)),
                "{sent:?}"
            );
        }
    }

    #[test]
    fn test_create_map_exception() {
        let (mut doc, rx) = document(Some("abcdef123456"));
        doc.boot();
        doc.on_sdk_loaded(Box::new(HeadlessSdk::failing_create("no container")));
        assert_eq!(doc.state(), DocumentState::Failed);
        assert!(matches!(
            &messages(&rx)[..],
            [BridgeMessage::Error { message }] if message.contains("no container")
        ));
    }

    #[test]
    fn test_selection_round_trip() {
        let (mut doc, sdk, _rx) = booted();
        let original = sdk.center();

        doc.update_selected_marker(Some("a".into()));
        assert!(close(sdk.center(), LatLng::new(37.50, 127.00)));
        assert_eq!(sdk.snapshot().selected_marker(), Some("a"));
        assert_eq!(doc.pre_selection_center(), Some(original));

        doc.update_selected_marker(None);
        assert!(close(sdk.center(), original));
        assert_eq!(sdk.snapshot().selected_marker(), None);
        assert_eq!(doc.pre_selection_center(), None);
    }

    #[test]
    fn test_switching_selection_keeps_first_center() {
        let (mut doc, sdk, _rx) = booted();
        let original = sdk.center();

        doc.update_selected_marker(Some("a".into()));
        doc.update_selected_marker(Some("b".into()));
        assert!(close(sdk.center(), LatLng::new(37.51, 127.01)));
        assert_eq!(doc.pre_selection_center(), Some(original));

        doc.update_selected_marker(None);
        assert!(close(sdk.center(), original));
    }

    #[test]
    fn test_repeated_selection_is_idempotent() {
        let (mut doc, sdk, _rx) = booted();
        doc.update_selected_marker(Some("a".into()));
        let pans = sdk.snapshot().pans.len();
        doc.update_selected_marker(Some("a".into()));
        assert_eq!(sdk.snapshot().pans.len(), pans);

        doc.update_selected_marker(None);
        doc.update_selected_marker(None);
        assert_eq!(doc.selected_id(), None);
    }

    #[test]
    fn test_dangling_selection() {
        let (mut doc, sdk, _rx) = booted();
        let original = sdk.center();
        doc.update_selected_marker(Some("zzz".into()));

        let map = sdk.snapshot();
        assert_eq!(map.selected_marker(), None);
        assert_eq!(map.marker_ids().len(), 2);
        assert!(close(sdk.center(), original));
    }

    #[test]
    fn test_selection_before_init_applies_on_load() {
        let (tx, _rx) = unbounded();
        let mut doc = MapDocument::new(payload(Some("abcdef123456"), Some("b")), tx);
        doc.boot();
        doc.update_selected_marker(Some("a".into()));

        let sdk = HeadlessSdk::new();
        doc.on_sdk_loaded(Box::new(sdk.clone()));
        assert_eq!(doc.selected_id(), Some("a"));
        assert!(close(sdk.center(), LatLng::new(37.50, 127.00)));

        // The stored center is the initial centroid
        doc.update_selected_marker(None);
        assert!(close(sdk.center(), LatLng::new(37.505, 127.005)));
    }

    #[test]
    fn test_user_location_overlay() {
        let (mut doc, sdk, _rx) = booted();
        doc.handle_command_json(r#"{"type":"updateUserLocation","location":{"lat":37.4,"lng":127.1}}"#)
            .unwrap();
        assert_eq!(sdk.snapshot().user_location(), Some(LatLng::new(37.4, 127.1)));

        doc.handle_command(HostCommand::UpdateUserLocation { location: None });
        assert_eq!(sdk.snapshot().user_location(), None);
        assert_eq!(sdk.snapshot().marker_ids().len(), 2);
    }

    #[test]
    fn test_clicks() {
        let (mut doc, _sdk, rx) = booted();
        doc.click_marker("b");
        doc.on_map_click();
        doc.click_marker("nope");
        doc.on_overlay_click(9999);

        assert_eq!(
            messages(&rx),
            vec![
                BridgeMessage::MarkerClick { id: "b".into() },
                BridgeMessage::MapClick
            ]
        );
    }

    #[test]
    fn test_bad_command_is_rejected() {
        let (mut doc, _sdk, _rx) = booted();
        assert!(doc.handle_command_json("{").is_err());
        assert_eq!(doc.state(), DocumentState::Initialized);
    }
}
