//! Wire types shared by the host and the embedded document.
//!
//! Every message is one JSON object tagged by `type`. Outbound traffic
//! (document → host) is [`BridgeMessage`]; inbound updates (host →
//! document) are [`HostCommand`]; the document is booted from an
//! [`InitialPayload`].

use crate::{
    core::{config::SurfaceConfig, geo::LatLng},
    layers::marker::{Marker, MarkerSet},
    MapError, Result,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reported when an `error` message carries no readable text
pub const UNKNOWN_MAP_ERROR: &str = "Unknown map error";

/// Messages the document sends to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BridgeMessage {
    MarkerClick { id: String },
    MapClick,
    Error { message: String },
}

/// Result of decoding one inbound bridge string
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Message(BridgeMessage),
    /// Well-formed object with a `type` this host does not know
    Unrecognized(String),
}

impl BridgeMessage {
    const KINDS: [&'static str; 3] = ["markerClick", "mapClick", "error"];

    pub fn kind(&self) -> &'static str {
        match self {
            BridgeMessage::MarkerClick { .. } => "markerClick",
            BridgeMessage::MapClick => "mapClick",
            BridgeMessage::Error { .. } => "error",
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a raw bridge string.
    ///
    /// Anything that is not a JSON object with a string `type` is a parse
    /// failure. An `error` whose `message` is missing or not a string still
    /// decodes, with [`UNKNOWN_MAP_ERROR`] as its text.
    pub fn parse(raw: &str) -> Result<Inbound> {
        let value: Value = serde_json::from_str(raw).map_err(|err| {
            log::debug!("bridge message is not JSON: {err}");
            MapError::MessageParseFailure
        })?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(MapError::MessageParseFailure)?
            .to_string();

        match serde_json::from_value::<BridgeMessage>(value.clone()) {
            Ok(message) => Ok(Inbound::Message(message)),
            Err(_) if kind == "error" => {
                let message = value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or(UNKNOWN_MAP_ERROR)
                    .to_string();
                Ok(Inbound::Message(BridgeMessage::Error { message }))
            }
            Err(err) if Self::KINDS.contains(&kind.as_str()) => {
                log::debug!("malformed {kind} message: {err}");
                Err(MapError::MessageParseFailure)
            }
            Err(_) => Ok(Inbound::Unrecognized(kind)),
        }
    }
}

/// Updates the host pushes into a running document. Both are idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostCommand {
    UpdateSelectedMarker { id: Option<String> },
    UpdateUserLocation { location: Option<LatLng> },
}

impl HostCommand {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Marker as serialized into the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerPayload {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl From<&Marker> for MarkerPayload {
    fn from(marker: &Marker) -> Self {
        Self {
            id: marker.id.clone(),
            name: marker.name.clone(),
            lat: marker.latitude,
            lng: marker.longitude,
        }
    }
}

impl From<&MarkerPayload> for Marker {
    fn from(payload: &MarkerPayload) -> Self {
        Marker::new(payload.id.clone(), payload.name.clone(), payload.lat, payload.lng)
    }
}

/// Everything the document needs to boot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialPayload {
    pub markers: Vec<MarkerPayload>,
    pub selected_id: Option<String>,
    pub user_location: Option<LatLng>,
    pub center: LatLng,
    pub zoom_level: u8,
    pub app_key: Option<String>,
    pub base_url: String,
    pub sdk_script_url: String,
}

/// Camera center at boot: the user if known, else the marker centroid,
/// else `fallback`
pub fn initial_center(markers: &MarkerSet, user_location: Option<LatLng>, fallback: LatLng) -> LatLng {
    user_location
        .filter(LatLng::is_valid)
        .or_else(|| markers.centroid())
        .unwrap_or(fallback)
}

impl InitialPayload {
    pub fn new(
        markers: &MarkerSet,
        selected_id: Option<String>,
        user_location: Option<LatLng>,
        zoom_level: u8,
        app_key: Option<String>,
        base_url: String,
        config: &SurfaceConfig,
    ) -> Self {
        Self {
            markers: markers.iter().map(MarkerPayload::from).collect(),
            selected_id,
            user_location,
            center: initial_center(markers, user_location, config.fallback_center),
            zoom_level,
            app_key,
            base_url,
            sdk_script_url: config.sdk_script_url.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
