//! Prelude module for common pinmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use pinmap::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    camera::Camera,
    config::{SdkCredentials, SurfaceConfig, ZoomRange},
    geo::{distance_km, LatLng, LatLngBounds, Point},
    options::{MapCallbacks, MapOptions, RenderMode},
};

pub use crate::layers::marker::{Marker, MarkerSet};

pub use crate::input::{
    events::{InputEvent, SurfaceEvent, TouchEvent, TouchPhase, TouchPoint},
    gestures::{PinchGesture, PinchState},
};

pub use crate::rendering::{
    fallback::{FallbackContent, FallbackFrame, FallbackLayout, FallbackRenderer, ProjectedMarker},
    projection::{FitProjection, MetricProjection},
};

pub use crate::bridge::{
    document::{BootStep, DocumentState, MapDocument},
    guard::ErrorReportGuard,
    headless::{HeadlessLoader, HeadlessSdk},
    host::{EmbeddedSurface, MapBridgeHost, SurfaceSignal},
    message::{BridgeMessage, HostCommand, InitialPayload},
    sdk::{CustomOverlay, MapSdk, OverlayContent, SdkLoadError, SdkLoader},
};

#[cfg(feature = "tokio-runtime")]
pub use crate::bridge::local::{LocalSurface, LocalSurfaceFactory};

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::{runtime, spawn, AsyncHandle, AsyncSpawner};

pub use crate::ui::surface::{MapSurfaceController, SurfaceFactory, SurfaceView};

pub use crate::{MapError, Result};

pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
