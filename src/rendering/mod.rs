pub mod fallback;
pub mod projection;

// Re-export main types
pub use fallback::{FallbackContent, FallbackFrame, FallbackLayout, FallbackRenderer, ProjectedMarker};
pub use projection::{FitProjection, MetricProjection};
