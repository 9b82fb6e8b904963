use crate::{
    core::{config::SdkCredentials, geo::LatLng},
    layers::marker::Marker,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub type SelectCallback = Arc<dyn Fn(&str) + Send + Sync>;
pub type BackgroundPressCallback = Arc<dyn Fn() + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Which rendering path the surface uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// SDK hosted in an embedded surface, reached over the bridge
    Embedded,
    /// Pure-geometry projection, never fails
    #[default]
    Fallback,
}

/// Host callbacks; every one is optional
#[derive(Clone, Default)]
pub struct MapCallbacks {
    pub on_select: Option<SelectCallback>,
    pub on_background_press: Option<BackgroundPressCallback>,
    pub on_error: Option<ErrorCallback>,
}

impl MapCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_select<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_select = Some(Arc::new(f));
        self
    }

    pub fn on_background_press<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_background_press = Some(Arc::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub(crate) fn select(&self, id: &str) {
        if let Some(cb) = &self.on_select {
            cb(id);
        }
    }

    pub(crate) fn background_press(&self) {
        if let Some(cb) = &self.on_background_press {
            cb();
        }
    }
}

impl fmt::Debug for MapCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapCallbacks")
            .field("on_select", &self.on_select.is_some())
            .field("on_background_press", &self.on_background_press.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Construction-time configuration of a map surface
#[derive(Debug, Clone, Default)]
pub struct MapOptions {
    pub markers: Vec<Marker>,
    pub selected_id: Option<String>,
    pub user_location: Option<LatLng>,
    pub callbacks: MapCallbacks,
    pub initial_zoom_level: Option<i32>,
    pub mode: RenderMode,
    pub credentials: SdkCredentials,
    pub show_zoom_controls: bool,
}

impl MapOptions {
    pub fn new(markers: Vec<Marker>) -> Self {
        Self {
            markers,
            ..Default::default()
        }
    }

    pub fn mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn selected(mut self, id: Option<String>) -> Self {
        self.selected_id = id;
        self
    }

    pub fn user_location(mut self, location: Option<LatLng>) -> Self {
        self.user_location = location;
        self
    }

    pub fn callbacks(mut self, callbacks: MapCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn initial_zoom_level(mut self, level: i32) -> Self {
        self.initial_zoom_level = Some(level);
        self
    }

    pub fn credentials(mut self, credentials: SdkCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn zoom_controls(mut self, visible: bool) -> Self {
        self.show_zoom_controls = visible;
        self
    }
}
