//! Host side of the bridge.
//!
//! [`MapBridgeHost`] owns one [`EmbeddedSurface`] for one mounted map. It
//! boots the surface with an [`InitialPayload`], keeps it in sync through
//! [`HostCommand`]s once the surface reports `LoadEnd`, and turns inbound
//! [`BridgeMessage`]s into host callbacks. Every failure it sees, whatever
//! its origin, goes through the surface's [`ErrorReportGuard`].

use crate::{
    bridge::{
        guard::ErrorReportGuard,
        message::{BridgeMessage, HostCommand, Inbound, InitialPayload},
    },
    core::{
        camera::clamp_zoom_level,
        config::{SdkCredentials, SurfaceConfig},
        geo::LatLng,
        options::{MapCallbacks, MapOptions},
    },
    layers::marker::MarkerSet,
    MapError, Result,
};
use std::sync::Arc;

/// Failure of the surface itself, independent of anything the document does
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("{0}")]
    Render(String),
    #[error("HTTP {status}: {description}")]
    Http { status: u16, description: String },
}

/// Something the surface wants the host to know
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceSignal {
    /// The document finished loading and accepts commands
    LoadEnd,
    /// Raw bridge message posted by the document
    Message(String),
    /// The surface could not render the document
    Failed(TransportError),
}

/// An isolated execution context hosting a map document.
///
/// Delivery is best effort: a surface may drop commands sent before it
/// signals `LoadEnd`, or messages posted while it is torn down.
pub trait EmbeddedSurface: Send {
    /// Replaces whatever document is loaded with a fresh one
    fn load(&mut self, payload: &str) -> Result<()>;

    /// Posts a serialized [`HostCommand`] to the document
    fn inject(&mut self, command: &str);

    fn poll_signal(&mut self) -> Option<SurfaceSignal>;

    /// Stops the document; nothing is delivered afterwards
    fn teardown(&mut self);
}

pub struct MapBridgeHost {
    surface: Box<dyn EmbeddedSurface>,
    guard: Arc<ErrorReportGuard>,
    callbacks: MapCallbacks,
    config: SurfaceConfig,
    markers: MarkerSet,
    selected_id: Option<String>,
    user_location: Option<LatLng>,
    zoom_level: u8,
    credentials: SdkCredentials,
    ready: bool,
    mounted: bool,
    transport_failure: Option<TransportError>,
}

impl MapBridgeHost {
    pub fn new(
        surface: Box<dyn EmbeddedSurface>,
        guard: Arc<ErrorReportGuard>,
        options: &MapOptions,
        config: SurfaceConfig,
    ) -> Self {
        let zoom_level = options
            .initial_zoom_level
            .map(clamp_zoom_level)
            .unwrap_or_else(|| clamp_zoom_level(i32::from(config.default_zoom_level)));

        Self {
            surface,
            guard,
            callbacks: options.callbacks.clone(),
            markers: MarkerSet::new(options.markers.clone()),
            selected_id: options.selected_id.clone(),
            user_location: options.user_location,
            zoom_level,
            credentials: options.credentials.clone(),
            config,
            ready: false,
            mounted: false,
            transport_failure: None,
        }
    }

    pub fn guard(&self) -> &Arc<ErrorReportGuard> {
        &self.guard
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// True once the document signalled `LoadEnd`
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// True once any failure reached the guard
    pub fn is_failed(&self) -> bool {
        self.guard.has_reported()
    }

    pub fn failure_message(&self) -> Option<&str> {
        self.guard.message()
    }

    /// Last failure of the surface itself
    pub fn transport_failure(&self) -> Option<&TransportError> {
        self.transport_failure.as_ref()
    }

    pub fn initial_payload(&self) -> InitialPayload {
        InitialPayload::new(
            &self.markers,
            self.selected_id.clone(),
            self.user_location,
            self.zoom_level,
            self.credentials.app_key.clone(),
            self.credentials.base_url.clone(),
            &self.config,
        )
    }

    /// Serializes current state and boots the surface with it
    pub fn mount(&mut self) -> Result<()> {
        if !self.guard.is_live() {
            log::debug!("refusing to mount on a retired guard");
            return Ok(());
        }

        self.ready = false;
        let payload = self.initial_payload().to_json()?;
        log::debug!(
            "mounting map surface generation {} with {} markers",
            self.guard.generation(),
            self.markers.len()
        );

        match self.surface.load(&payload) {
            Ok(()) => {
                self.mounted = true;
                Ok(())
            }
            Err(err) => {
                self.mounted = false;
                self.ready = false;
                self.guard.report_error(&err);
                Err(err)
            }
        }
    }

    /// Drains pending surface signals; returns how many were handled
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while self.mounted {
            let Some(signal) = self.surface.poll_signal() else {
                break;
            };
            self.handle_signal(signal);
            handled += 1;
        }
        handled
    }

    pub fn handle_signal(&mut self, signal: SurfaceSignal) {
        if !self.mounted {
            return;
        }
        match signal {
            SurfaceSignal::LoadEnd => {
                self.ready = true;
                self.sync_state();
            }
            SurfaceSignal::Message(raw) => self.handle_message(&raw),
            SurfaceSignal::Failed(error) => {
                log::warn!("map surface transport failure: {error}");
                self.guard
                    .report_error(&MapError::TransportRenderFailure(error.to_string()));
                self.transport_failure = Some(error);
            }
        }
    }

    pub fn handle_message(&mut self, raw: &str) {
        if !self.mounted {
            return;
        }
        match BridgeMessage::parse(raw) {
            Ok(Inbound::Message(BridgeMessage::MarkerClick { id })) => self.callbacks.select(&id),
            Ok(Inbound::Message(BridgeMessage::MapClick)) => self.callbacks.background_press(),
            Ok(Inbound::Message(BridgeMessage::Error { message })) => {
                self.guard.report(&message);
            }
            Ok(Inbound::Unrecognized(kind)) => {
                log::warn!("ignoring bridge message of unknown type '{kind}'");
            }
            Err(err) => {
                self.guard.report_error(&err);
            }
        }
    }

    pub fn set_selected_id(&mut self, id: Option<String>) {
        if self.selected_id == id {
            return;
        }
        self.selected_id = id.clone();
        if self.ready {
            self.send(HostCommand::UpdateSelectedMarker { id });
        }
    }

    pub fn set_user_location(&mut self, location: Option<LatLng>) {
        if self.user_location == location {
            return;
        }
        self.user_location = location;
        if self.ready {
            self.send(HostCommand::UpdateUserLocation { location });
        }
    }

    /// A new marker set reloads the document with a fresh payload
    pub fn set_markers(&mut self, markers: MarkerSet) -> Result<()> {
        if self.markers == markers {
            return Ok(());
        }
        self.markers = markers;
        if self.mounted {
            self.mount()?;
        }
        Ok(())
    }

    /// Re-sends everything the document may have missed before it was ready
    fn sync_state(&mut self) {
        self.send(HostCommand::UpdateSelectedMarker {
            id: self.selected_id.clone(),
        });
        self.send(HostCommand::UpdateUserLocation {
            location: self.user_location,
        });
    }

    fn send(&mut self, command: HostCommand) {
        match command.to_json() {
            Ok(json) => self.surface.inject(&json),
            Err(err) => log::error!("failed to encode host command: {err}"),
        }
    }

    /// Retires the guard and stops the surface
    pub fn teardown(&mut self) {
        if !self.mounted && !self.guard.is_live() {
            return;
        }
        log::debug!("tearing down map surface generation {}", self.guard.generation());
        self.guard.invalidate();
        self.surface.teardown();
        self.mounted = false;
        self.ready = false;
    }
}

impl Drop for MapBridgeHost {
    fn drop(&mut self) {
        self.teardown();
    }
}
