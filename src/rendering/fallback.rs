use crate::{
    core::{
        bounds::Bounds,
        camera::Camera,
        config::SurfaceConfig,
        constants::{MARKER_CULL_MARGIN, MARKER_SIZE},
        geo::{LatLng, Point},
    },
    input::{
        events::{InputEvent, SurfaceEvent},
        gestures::PinchGesture,
    },
    layers::marker::{Marker, MarkerSet},
    rendering::projection::{FitProjection, MetricProjection},
};

/// How markers are placed on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackLayout {
    /// Stretch the marker bounding box over the canvas
    #[default]
    FitToMarkers,
    /// Static-map placement around the selected marker (or the centroid) at
    /// a discrete SDK zoom level
    Camera,
}

/// A marker as it should be drawn
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedMarker {
    pub id: String,
    pub name: String,
    pub position: Point,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackContent {
    /// No markers to show
    Empty,
    /// Visible markers, back to front
    Markers(Vec<ProjectedMarker>),
}

/// Everything a view needs to paint one fallback frame
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackFrame {
    pub canvas: Bounds,
    pub zoom_factor: f64,
    pub zoom_level: Option<u8>,
    pub show_zoom_controls: bool,
    pub content: FallbackContent,
}

impl FallbackFrame {
    pub fn markers(&self) -> &[ProjectedMarker] {
        match &self.content {
            FallbackContent::Markers(markers) => markers,
            FallbackContent::Empty => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.content, FallbackContent::Empty)
    }

    pub fn selected(&self) -> Option<&ProjectedMarker> {
        self.markers().iter().find(|m| m.selected)
    }
}

/// Pure-geometry marker renderer. It has no external dependency and no
/// failure state.
#[derive(Debug, Clone)]
pub struct FallbackRenderer {
    config: SurfaceConfig,
    markers: MarkerSet,
    selected_id: Option<String>,
    canvas: Bounds,
    zoom_factor: f64,
    layout: FallbackLayout,
    camera_zoom_level: u8,
    pinch: PinchGesture,
    show_zoom_controls: bool,
}

impl FallbackRenderer {
    pub fn new(config: SurfaceConfig) -> Self {
        let pinch = PinchGesture::new(config.fallback_zoom);
        let camera_zoom_level = config.default_zoom_level;
        Self {
            config,
            markers: MarkerSet::default(),
            selected_id: None,
            canvas: Bounds::from_size(0.0, 0.0),
            zoom_factor: 1.0,
            layout: FallbackLayout::default(),
            camera_zoom_level,
            pinch,
            show_zoom_controls: false,
        }
    }

    pub fn with_layout(mut self, layout: FallbackLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_zoom_controls(mut self, visible: bool) -> Self {
        self.show_zoom_controls = visible;
        self
    }

    pub fn set_markers(&mut self, markers: MarkerSet) {
        self.markers = markers;
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Accepts ids that are not in the marker set; they simply match nothing
    pub fn set_selected(&mut self, id: Option<String>) {
        self.selected_id = id;
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.canvas = Bounds::from_size(width, height);
    }

    pub fn canvas(&self) -> &Bounds {
        &self.canvas
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    pub fn layout(&self) -> FallbackLayout {
        self.layout
    }

    pub fn pinch(&self) -> &PinchGesture {
        &self.pinch
    }

    /// "+" button
    pub fn zoom_in(&mut self) -> SurfaceEvent {
        match self.layout {
            FallbackLayout::FitToMarkers => {
                self.zoom_factor = self.config.fallback_zoom.clamp(self.zoom_factor + self.config.fallback_zoom.step);
                SurfaceEvent::ZoomChanged(self.zoom_factor)
            }
            FallbackLayout::Camera => {
                let mut camera = self.camera();
                camera.zoom_in();
                self.camera_zoom_level = camera.zoom_level();
                SurfaceEvent::ZoomLevelChanged(self.camera_zoom_level)
            }
        }
    }

    /// "-" button
    pub fn zoom_out(&mut self) -> SurfaceEvent {
        match self.layout {
            FallbackLayout::FitToMarkers => {
                self.zoom_factor = self.config.fallback_zoom.clamp(self.zoom_factor - self.config.fallback_zoom.step);
                SurfaceEvent::ZoomChanged(self.zoom_factor)
            }
            FallbackLayout::Camera => {
                let mut camera = self.camera();
                camera.zoom_out();
                self.camera_zoom_level = camera.zoom_level();
                SurfaceEvent::ZoomLevelChanged(self.camera_zoom_level)
            }
        }
    }

    /// Processes one input event and reports what the host should hear about
    pub fn handle_input(&mut self, input: InputEvent) -> Option<SurfaceEvent> {
        match input {
            InputEvent::Touch(event) => {
                let zoom = self.pinch.handle_touch(&event, self.zoom_factor)?;
                self.zoom_factor = zoom;
                Some(SurfaceEvent::ZoomChanged(zoom))
            }
            InputEvent::Tap { position } => self.tap(position),
            InputEvent::ZoomIn => Some(self.zoom_in()),
            InputEvent::ZoomOut => Some(self.zoom_out()),
            InputEvent::Resize { width, height } => {
                self.resize(width, height);
                None
            }
            InputEvent::Tick => {
                self.pinch.tick();
                None
            }
        }
    }

    fn tap(&mut self, position: Point) -> Option<SurfaceEvent> {
        if let Some(id) = self.hit_test(position) {
            return Some(SurfaceEvent::Select(id));
        }
        if self.pinch.suppress_tap() {
            log::debug!("Background tap swallowed after pinch");
            return None;
        }
        Some(SurfaceEvent::BackgroundPress)
    }

    /// Topmost visible marker under `position`
    pub fn hit_test(&self, position: Point) -> Option<String> {
        let radius = MARKER_SIZE / 2.0;
        self.frame()
            .markers()
            .iter()
            .rev()
            .find(|m| m.position.distance_to(&position) <= radius)
            .map(|m| m.id.clone())
    }

    fn camera(&self) -> Camera {
        let center = self
            .selected_id
            .as_deref()
            .and_then(|id| self.markers.get(id))
            .map(Marker::position)
            .or_else(|| self.markers.centroid())
            .unwrap_or(self.config.fallback_center);
        Camera::new(center, self.camera_zoom_level as i32)
    }

    fn project(&self) -> Option<Box<dyn Fn(LatLng) -> Point + '_>> {
        match self.layout {
            FallbackLayout::FitToMarkers => {
                let bounds = self.markers.bounds()?;
                let projection = FitProjection::new(
                    &bounds,
                    self.config.padding_ratio,
                    self.config.min_coordinate_range,
                );
                Some(Box::new(move |p| projection.project(p, &self.canvas, self.zoom_factor)))
            }
            FallbackLayout::Camera => {
                if self.markers.is_empty() {
                    return None;
                }
                let projection = MetricProjection::new(self.camera());
                Some(Box::new(move |p| projection.project(p, &self.canvas, self.zoom_factor)))
            }
        }
    }

    /// Lays out the current markers
    pub fn frame(&self) -> FallbackFrame {
        let zoom_level = match self.layout {
            FallbackLayout::Camera => Some(self.camera_zoom_level),
            FallbackLayout::FitToMarkers => None,
        };

        let content = match self.project() {
            None => FallbackContent::Empty,
            Some(project) => {
                let visible_area = self.canvas.pad(MARKER_CULL_MARGIN);
                let mut projected: Vec<ProjectedMarker> = self
                    .markers
                    .iter()
                    .filter_map(|marker| {
                        let raw = project(marker.position());
                        if !visible_area.contains(&raw) {
                            return None;
                        }
                        Some(ProjectedMarker {
                            id: marker.id.clone(),
                            name: marker.name.clone(),
                            position: self.canvas.clamp_point(raw),
                            selected: self.selected_id.as_deref() == Some(marker.id.as_str()),
                        })
                    })
                    .collect();
                // Selected marker paints last so it sits on top
                projected.sort_by_key(|m| m.selected);
                FallbackContent::Markers(projected)
            }
        };

        FallbackFrame {
            canvas: self.canvas,
            zoom_factor: self.zoom_factor,
            zoom_level,
            show_zoom_controls: self.show_zoom_controls,
            content,
        }
    }
}

impl Default for FallbackRenderer {
    fn default() -> Self {
        Self::new(SurfaceConfig::default())
    }
}
