//! The map widget as the host application sees it.
//!
//! [`MapSurfaceController`] owns whichever rendering path the options ask
//! for. The embedded path is one [`MapBridgeHost`] per generation; a failed
//! or unavailable embedded surface shows a retry prompt, and `retry` starts
//! the next generation from scratch. The fallback path is a
//! [`FallbackRenderer`] and has nothing to retry.

use crate::{
    bridge::{
        guard::ErrorReportGuard,
        host::{EmbeddedSurface, MapBridgeHost},
    },
    core::{
        config::SurfaceConfig,
        geo::LatLng,
        options::{MapOptions, RenderMode},
    },
    input::events::{InputEvent, SurfaceEvent},
    layers::marker::{Marker, MarkerSet},
    rendering::fallback::{FallbackFrame, FallbackRenderer},
    Result,
};
use std::sync::Arc;

/// Provides embedded surfaces. An error means the embedded surface module
/// cannot run in this environment at all.
pub trait SurfaceFactory {
    fn create(&mut self, config: &SurfaceConfig) -> Result<Box<dyn EmbeddedSurface>>;
}

/// What the widget should currently show
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceView {
    /// No markers: an explicit empty state, never a blank canvas
    Empty,
    /// The embedded map of this generation
    Embedded { generation: u64, ready: bool },
    /// The embedded path failed or is unavailable
    RetryPrompt { message: String },
    Fallback(FallbackFrame),
}

pub struct MapSurfaceController<F: SurfaceFactory> {
    options: MapOptions,
    config: SurfaceConfig,
    markers: MarkerSet,
    factory: F,
    guard: Arc<ErrorReportGuard>,
    host: Option<MapBridgeHost>,
    unavailable: Option<String>,
    fallback: FallbackRenderer,
}

impl<F: SurfaceFactory> MapSurfaceController<F> {
    pub fn new(options: MapOptions, config: SurfaceConfig, factory: F) -> Self {
        let markers = MarkerSet::new(options.markers.clone());
        let mut fallback =
            FallbackRenderer::new(config.clone()).with_zoom_controls(options.show_zoom_controls);
        fallback.set_markers(markers.clone());
        fallback.set_selected(options.selected_id.clone());
        let guard = Arc::new(ErrorReportGuard::new(0, options.callbacks.on_error.clone()));

        let mut controller = Self {
            options,
            config,
            markers,
            factory,
            guard,
            host: None,
            unavailable: None,
            fallback,
        };
        controller.sync_embedded();
        controller
    }

    pub fn mode(&self) -> RenderMode {
        self.options.mode
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Current embedded generation; bumps on every retry
    pub fn generation(&self) -> u64 {
        self.guard.generation()
    }

    pub fn guard(&self) -> &Arc<ErrorReportGuard> {
        &self.guard
    }

    pub fn host(&self) -> Option<&MapBridgeHost> {
        self.host.as_ref()
    }

    pub fn fallback(&self) -> &FallbackRenderer {
        &self.fallback
    }

    pub fn fallback_mut(&mut self) -> &mut FallbackRenderer {
        &mut self.fallback
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn set_mode(&mut self, mode: RenderMode) {
        if self.options.mode == mode {
            return;
        }
        log::info!("switching map surface to {mode:?}");
        self.options.mode = mode;
        self.sync_embedded();
    }

    pub fn set_markers(&mut self, markers: Vec<Marker>) {
        let set = MarkerSet::new(markers.clone());
        self.options.markers = markers;
        self.fallback.set_markers(set.clone());
        self.markers = set.clone();

        if set.is_empty() || self.host.is_none() {
            self.sync_embedded();
        } else if let Some(host) = self.host.as_mut() {
            if let Err(err) = host.set_markers(set) {
                log::warn!("reloading map surface failed: {err}");
            }
        }
    }

    pub fn set_selected_id(&mut self, id: Option<String>) {
        self.options.selected_id = id.clone();
        self.fallback.set_selected(id.clone());
        if let Some(host) = self.host.as_mut() {
            host.set_selected_id(id);
        }
    }

    pub fn set_user_location(&mut self, location: Option<LatLng>) {
        self.options.user_location = location;
        if let Some(host) = self.host.as_mut() {
            host.set_user_location(location);
        }
    }

    /// Delivers pending surface traffic to the host callbacks
    pub fn pump(&mut self) -> usize {
        self.host.as_mut().map_or(0, MapBridgeHost::pump)
    }

    /// Input on the fallback canvas. Selections and background taps are
    /// forwarded to the callbacks as well as returned.
    pub fn handle_input(&mut self, input: InputEvent) -> Option<SurfaceEvent> {
        if self.options.mode != RenderMode::Fallback {
            return None;
        }
        let event = self.fallback.handle_input(input)?;
        match &event {
            SurfaceEvent::Select(id) => self.options.callbacks.select(id),
            SurfaceEvent::BackgroundPress => self.options.callbacks.background_press(),
            SurfaceEvent::ZoomChanged(_) | SurfaceEvent::ZoomLevelChanged(_) => {}
        }
        Some(event)
    }

    /// Throws the current embedded surface away and starts a new generation
    /// with a fresh guard
    pub fn retry(&mut self) {
        self.host = None;
        self.guard = Arc::new(self.guard.renew());
        self.unavailable = None;
        log::info!("retrying map surface as generation {}", self.guard.generation());
        self.sync_embedded();
    }

    pub fn view(&self) -> SurfaceView {
        if self.markers.is_empty() {
            return SurfaceView::Empty;
        }
        if self.options.mode == RenderMode::Fallback {
            return SurfaceView::Fallback(self.fallback.frame());
        }
        if let Some(message) = &self.unavailable {
            return SurfaceView::RetryPrompt {
                message: message.clone(),
            };
        }
        match &self.host {
            Some(host) if !host.is_failed() => SurfaceView::Embedded {
                generation: self.guard.generation(),
                ready: host.is_ready(),
            },
            Some(host) => SurfaceView::RetryPrompt {
                message: host.failure_message().unwrap_or_default().to_string(),
            },
            None => SurfaceView::RetryPrompt {
                message: self.guard.message().unwrap_or_default().to_string(),
            },
        }
    }

    /// Mounts or drops the embedded host so it matches mode and markers
    fn sync_embedded(&mut self) {
        let wanted = self.options.mode == RenderMode::Embedded && !self.markers.is_empty();
        if !wanted {
            self.host = None;
            return;
        }
        if self.host.is_some() || self.unavailable.is_some() {
            return;
        }
        if !self.guard.is_live() {
            self.guard = Arc::new(self.guard.renew());
        }

        match self.factory.create(&self.config) {
            Ok(surface) => {
                let mut host =
                    MapBridgeHost::new(surface, self.guard.clone(), &self.options, self.config.clone());
                if let Err(err) = host.mount() {
                    log::warn!("mounting map surface failed: {err}");
                }
                self.host = Some(host);
            }
            Err(err) => {
                log::warn!("embedded map surface unavailable: {err}");
                self.unavailable = Some(err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bridge::host::SurfaceSignal,
        core::options::MapCallbacks,
        input::events::{TouchEvent, TouchPhase, TouchPoint},
        MapError,
    };
    use std::sync::Mutex;

    #[derive(Default)]
    struct SilentSurface;

    impl EmbeddedSurface for SilentSurface {
        fn load(&mut self, _payload: &str) -> Result<()> {
            Ok(())
        }
        fn inject(&mut self, _command: &str) {}
        fn poll_signal(&mut self) -> Option<SurfaceSignal> {
            None
        }
        fn teardown(&mut self) {}
    }

    #[derive(Default)]
    struct CountingFactory {
        created: usize,
        unavailable: bool,
    }

    impl SurfaceFactory for CountingFactory {
        fn create(&mut self, _config: &SurfaceConfig) -> Result<Box<dyn EmbeddedSurface>> {
            if self.unavailable {
                return Err(MapError::SurfaceUnavailable("no web view".into()));
            }
            self.created += 1;
            Ok(Box::new(SilentSurface))
        }
    }

    fn markers() -> Vec<Marker> {
        vec![
            Marker::new("a", "A", 37.50, 127.00),
            Marker::new("b", "B", 37.51, 127.01),
        ]
    }

    #[test]
    fn test_empty_markers_show_empty_state_on_both_paths() {
        for mode in [RenderMode::Embedded, RenderMode::Fallback] {
            let controller = MapSurfaceController::new(
                MapOptions::new(Vec::new()).mode(mode),
                SurfaceConfig::default(),
                CountingFactory::default(),
            );
            assert_eq!(controller.view(), SurfaceView::Empty);
            assert_eq!(controller.factory().created, 0);
        }
    }

    #[test]
    fn test_embedded_mounts_once_markers_arrive() {
        let mut controller = MapSurfaceController::new(
            MapOptions::new(Vec::new()).mode(RenderMode::Embedded),
            SurfaceConfig::default(),
            CountingFactory::default(),
        );
        controller.set_markers(markers());
        assert_eq!(controller.factory().created, 1);
        assert_eq!(
            controller.view(),
            SurfaceView::Embedded {
                generation: 0,
                ready: false
            }
        );

        // Emptying the set retires the surface; refilling starts a new one
        controller.set_markers(Vec::new());
        assert!(controller.host().is_none());
        controller.set_markers(markers());
        assert_eq!(controller.factory().created, 2);
        assert_eq!(controller.generation(), 1);
    }

    #[test]
    fn test_unavailable_module_offers_retry() {
        let factory = CountingFactory {
            unavailable: true,
            ..CountingFactory::default()
        };
        let mut controller = MapSurfaceController::new(
            MapOptions::new(markers()).mode(RenderMode::Embedded),
            SurfaceConfig::default(),
            factory,
        );
        assert!(matches!(controller.view(), SurfaceView::RetryPrompt { message } if message.contains("no web view")));

        controller.factory.unavailable = false;
        controller.retry();
        assert_eq!(controller.generation(), 1);
        assert!(matches!(controller.view(), SurfaceView::Embedded { generation: 1, .. }));
    }

    #[test]
    fn test_guard_failure_offers_retry() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        let options = MapOptions::new(markers())
            .mode(RenderMode::Embedded)
            .callbacks(MapCallbacks::new().on_error(move |m| sink.lock().unwrap().push(m.to_string())));
        let mut controller =
            MapSurfaceController::new(options, SurfaceConfig::default(), CountingFactory::default());

        controller.guard().report("boom");
        assert_eq!(
            controller.view(),
            SurfaceView::RetryPrompt {
                message: "boom".into()
            }
        );

        controller.retry();
        assert!(matches!(controller.view(), SurfaceView::Embedded { generation: 1, .. }));
        assert_eq!(errors.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_fallback_taps_reach_callbacks() {
        let selected = Arc::new(Mutex::new(Vec::new()));
        let presses = Arc::new(Mutex::new(0));
        let (s, p) = (selected.clone(), presses.clone());
        let options = MapOptions::new(markers()).callbacks(
            MapCallbacks::new()
                .on_select(move |id| s.lock().unwrap().push(id.to_string()))
                .on_background_press(move || *p.lock().unwrap() += 1),
        );
        let mut controller =
            MapSurfaceController::new(options, SurfaceConfig::default(), CountingFactory::default());
        assert_eq!(controller.factory().created, 0);

        controller.handle_input(InputEvent::Resize {
            width: 300.0,
            height: 300.0,
        });
        let SurfaceView::Fallback(frame) = controller.view() else {
            panic!("expected fallback frame");
        };
        let a = frame.markers().iter().find(|m| m.id == "a").unwrap().position;

        assert_eq!(
            controller.handle_input(InputEvent::Tap { position: a }),
            Some(SurfaceEvent::Select("a".into()))
        );
        controller.handle_input(InputEvent::Tap {
            position: crate::core::geo::Point::new(150.0, 150.0),
        });
        assert_eq!(*selected.lock().unwrap(), vec!["a".to_string()]);
        assert_eq!(*presses.lock().unwrap(), 1);
    }

    #[test]
    fn test_tap_ending_pinch_is_not_a_background_press() {
        let presses = Arc::new(Mutex::new(0));
        let p = presses.clone();
        let options = MapOptions::new(markers())
            .callbacks(MapCallbacks::new().on_background_press(move || *p.lock().unwrap() += 1));
        let mut controller =
            MapSurfaceController::new(options, SurfaceConfig::default(), CountingFactory::default());
        controller.handle_input(InputEvent::Resize {
            width: 300.0,
            height: 300.0,
        });

        let fingers = |phase, spread: f64| {
            TouchEvent::new(
                phase,
                vec![TouchPoint::new(1, 100.0, 150.0), TouchPoint::new(2, 100.0 + spread, 150.0)],
            )
        };
        controller.handle_input(InputEvent::Touch(fingers(TouchPhase::Start, 50.0)));
        assert_eq!(
            controller.handle_input(InputEvent::Touch(fingers(TouchPhase::Move, 75.0))),
            Some(SurfaceEvent::ZoomChanged(1.5))
        );
        controller.handle_input(InputEvent::Touch(TouchEvent::new(TouchPhase::End, Vec::new())));
        assert_eq!(
            controller.handle_input(InputEvent::Tap {
                position: crate::core::geo::Point::new(5.0, 5.0),
            }),
            None
        );
        controller.handle_input(InputEvent::Tick);
        assert_eq!(*presses.lock().unwrap(), 0);
    }

    #[test]
    fn test_mode_switch() {
        let mut controller = MapSurfaceController::new(
            MapOptions::new(markers()),
            SurfaceConfig::default(),
            CountingFactory::default(),
        );
        assert!(matches!(controller.view(), SurfaceView::Fallback(_)));

        controller.set_mode(RenderMode::Embedded);
        assert!(controller.host().is_some());
        assert_eq!(controller.handle_input(InputEvent::ZoomIn), None);

        controller.set_mode(RenderMode::Fallback);
        assert!(controller.host().is_none());
    }
}
