//! Message bridge between the host and the embedded map document.

pub mod document;
pub mod guard;
pub mod headless;
pub mod host;
#[cfg(feature = "tokio-runtime")]
pub mod local;
pub mod message;
pub mod sdk;

pub use document::{BootStep, DocumentState, MapDocument};
pub use guard::ErrorReportGuard;
pub use headless::{HeadlessLoader, HeadlessSdk};
pub use host::{EmbeddedSurface, MapBridgeHost, SurfaceSignal, TransportError};
#[cfg(feature = "tokio-runtime")]
pub use local::{LocalSurface, LocalSurfaceFactory, LocalSurfaceHandle};
pub use message::{BridgeMessage, HostCommand, Inbound, InitialPayload};
pub use sdk::{CustomOverlay, MapSdk, OverlayContent, OverlayId, SdkLoadError, SdkLoader};
