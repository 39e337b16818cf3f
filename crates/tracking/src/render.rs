//! Applies decoded snapshots to a map with the minimal set of
//! mutations: the route polyline is replaced only when it actually
//! changed, the agent marker is moved in place rather than recreated.

use model::order::AgentKind;
use utility::geo::{LatLng, LatLngBounds};

/// Stroke style for the route polyline. Stays identical across
/// updates; a route redraw must not change how the route looks.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineStyle {
    pub stroke_color: String,
    pub stroke_weight: u32,
    pub stroke_opacity: f64,
}

impl Default for PolylineStyle {
    fn default() -> Self {
        Self {
            stroke_color: "#2563eb".to_owned(),
            stroke_weight: 4,
            stroke_opacity: 0.8,
        }
    }
}

/// The capability set of the external map provider. The provider is
/// not reimplemented here; this is the seam a concrete map binding
/// plugs into.
pub trait MapCanvas: Send + 'static {
    type Polyline: Send;
    /// There is no remove-marker call; dropping the handle must undraw
    /// the marker, so bindings wrap the provider object in a type whose
    /// `Drop` erases it from the map.
    type Marker: Send;

    fn draw_polyline(&self, path: &[LatLng], style: &PolylineStyle) -> Self::Polyline;
    fn remove_polyline(&self, polyline: Self::Polyline);
    fn create_marker(&self, position: LatLng, agent: Option<AgentKind>) -> Self::Marker;
    fn move_marker(&self, marker: &mut Self::Marker, position: LatLng);
    fn fit_viewport(&self, bounds: LatLngBounds);
}

/// The drawn artifacts of one tracking session. The overlay is the
/// sole owner of its polyline and marker handles; nothing else may
/// draw or destroy them.
pub struct Overlay<C: MapCanvas> {
    canvas: C,
    style: PolylineStyle,
    agent: Option<AgentKind>,
    polyline: Option<C::Polyline>,
    marker: Option<C::Marker>,
    drawn_route: Option<String>,
}

impl<C: MapCanvas> Overlay<C> {
    pub fn new(canvas: C, style: PolylineStyle, agent: Option<AgentKind>) -> Self {
        Self {
            canvas,
            style,
            agent,
            polyline: None,
            marker: None,
            drawn_route: None,
        }
    }

    /// Applies one decoded snapshot. `route` carries the encoded form
    /// alongside the decoded points so an unchanged route can be
    /// recognized without comparing every point. Passing nothing is a
    /// no-op; a failed poll never clears a previously valid overlay.
    pub fn apply(&mut self, route: Option<(&str, &[LatLng])>, position: Option<LatLng>) {
        if let Some((encoded, points)) = route {
            self.apply_route(encoded, points);
        }
        if let Some(position) = position {
            self.apply_position(position);
        }
    }

    fn apply_route(&mut self, encoded: &str, points: &[LatLng]) {
        if self.drawn_route.as_deref() == Some(encoded) {
            return;
        }
        if points.is_empty() {
            return;
        }
        // Replace, never stack: the old polyline goes away before the
        // new one is drawn.
        if let Some(old) = self.polyline.take() {
            self.canvas.remove_polyline(old);
        }
        self.polyline = Some(self.canvas.draw_polyline(points, &self.style));
        if let Some(bounds) = LatLngBounds::from_points(points) {
            self.canvas.fit_viewport(bounds);
        }
        self.drawn_route = Some(encoded.to_owned());
    }

    fn apply_position(&mut self, position: LatLng) {
        match self.marker.as_mut() {
            Some(marker) => self.canvas.move_marker(marker, position),
            None => {
                self.marker = Some(self.canvas.create_marker(position, self.agent));
            }
        }
    }

    /// Removes everything this session has drawn. Called at teardown.
    /// Safe to call more than once.
    pub fn clear(&mut self) {
        if let Some(polyline) = self.polyline.take() {
            self.canvas.remove_polyline(polyline);
        }
        // Dropping the handle undraws the marker, per [`MapCanvas::Marker`].
        self.marker = None;
        self.drawn_route = None;
    }
}

impl<C: MapCanvas> Drop for Overlay<C> {
    fn drop(&mut self) {
        self.clear();
    }
}
