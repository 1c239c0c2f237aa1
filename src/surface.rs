//! Projection surfaces for the live tracker view.
//!
//! Two surfaces share one contract: geodetic points in, regime-colored
//! markers and tooltips out. The perspective globe redraws every frame and
//! owns a drag-rotated view; the planar map recomputes marker positions on
//! a fixed 500 ms cadence. Each session owns its rotation and pointer
//! state; switching projection replaces the session wholesale.

use std::f64::consts::{FRAC_PI_2, PI};

use eframe::egui;
use egui_plot::{Line, Plot, PlotPoint, PlotPoints, Points, Polygon};
use nalgebra::{Matrix3, Vector3};

use crate::catalog::{find_by_name, Regime, TrackedObject};
use crate::clock::SimClock;
use crate::geo::LandOutlines;
use crate::propagate::{resolve, GeodeticPoint};
use crate::select::select_visible;
use crate::state::ViewState;

/// Screen-space pick radius for hover highlighting.
pub const HOVER_RADIUS_PX: f32 = 12.0;
/// Marker refresh cadence of the planar map.
pub const MAP_REFRESH_SECS: f64 = 0.5;

const GRID_STEP_DEG: f64 = 30.0;
const OCEAN_FILL: egui::Color32 = egui::Color32::from_rgb(18, 38, 70);
const OCEAN_EDGE: egui::Color32 = egui::Color32::from_rgb(70, 130, 180);
const LAND_COLOR: egui::Color32 = egui::Color32::from_rgb(110, 150, 110);
const GRID_COLOR: egui::Color32 = egui::Color32::from_gray(70);

/// Rotation of the perspective globe: view-center longitude and latitude.
/// Longitude wraps implicitly; latitude is clamped to the poles.
pub struct RotationState {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl RotationState {
    pub fn new() -> Self {
        Self {
            lon_deg: 0.0,
            lat_deg: 20.0,
        }
    }

    /// Apply a drag delta in screen pixels, scaled inversely with zoom so
    /// a drag covers the same apparent arc at any magnification.
    pub fn apply_drag(&mut self, dx_px: f32, dy_px: f32, zoom: f64) {
        let k = 0.25 / zoom;
        self.lon_deg -= dx_px as f64 * k;
        self.lat_deg = (self.lat_deg + dy_px as f64 * k).clamp(-90.0, 90.0);
    }

    pub fn view_matrix(&self) -> Matrix3<f64> {
        view_matrix(self.lat_deg.to_radians(), self.lon_deg.to_radians())
    }
}

/// Rotation matrix that brings the given view center to the front of the
/// projection (+z toward the viewer, screen x/y in the plot plane).
fn view_matrix(lat: f64, lon: f64) -> Matrix3<f64> {
    let lon = -lon - FRAC_PI_2;
    let (sl, cl) = (lat.sin(), lat.cos());
    let (sn, cn) = (lon.sin(), lon.cos());
    Matrix3::new(
        cn, 0.0, sn, //
        sl * sn, cl, -sl * cn, //
        -cl * sn, sl, cl * cn,
    )
}

fn surface_vector(lat_deg: f64, lon_deg: f64) -> Vector3<f64> {
    let (lat, lon) = (lat_deg.to_radians(), lon_deg.to_radians());
    Vector3::new(lat.cos() * lon.cos(), lat.sin(), -lat.cos() * lon.sin())
}

/// Project a geodetic point onto the globe's unit disc. `None` when the
/// point lies more than 90° of great-circle arc from the view center
/// (back of the globe): not drawn, not hover-eligible.
pub fn project_globe(lat_deg: f64, lon_deg: f64, view: &Matrix3<f64>) -> Option<[f64; 2]> {
    let v = view * surface_vector(lat_deg, lon_deg);
    if v.z >= 0.0 {
        Some([v.x, v.y])
    } else {
        None
    }
}

/// Split a (lat, lon) polyline into the runs that face the viewer.
fn front_segments(points: &[(f64, f64)], view: &Matrix3<f64>) -> Vec<Vec<[f64; 2]>> {
    let mut segments = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    for &(lat, lon) in points {
        match project_globe(lat, lon, view) {
            Some(xy) => current.push(xy),
            None => {
                if current.len() > 1 {
                    segments.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
    }
    if current.len() > 1 {
        segments.push(current);
    }
    segments
}

/// Split a (lat, lon) polyline at dateline crossings for the planar map.
fn split_dateline(points: &[(f64, f64)]) -> Vec<Vec<[f64; 2]>> {
    let mut segments = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    let mut last_lon: Option<f64> = None;
    for &(lat, lon) in points {
        if let Some(prev) = last_lon {
            if (lon - prev).abs() > 180.0 {
                if current.len() > 1 {
                    segments.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
        current.push([lon, lat]);
        last_lon = Some(lon);
    }
    if current.len() > 1 {
        segments.push(current);
    }
    segments
}

fn refresh_due(primed: bool, accum_secs: f64) -> bool {
    !primed || accum_secs >= MAP_REFRESH_SECS
}

/// Tooltip body shared by both surfaces.
pub fn tooltip_text(object: &TrackedObject, point: &GeodeticPoint) -> String {
    format!(
        "{}\nAlt {:.0} km   Lat {:.1}\u{b0}   Lon {:.1}\u{b0}\n{}   {}   {}",
        object.name,
        point.altitude_km,
        point.lat_deg,
        point.lon_deg,
        object.regime.label(),
        object.object_type,
        object.country,
    )
}

/// One resolved, front-facing marker for the current tick.
struct ScreenMarker {
    index: usize,
    point: GeodeticPoint,
    plot_xy: [f64; 2],
}

pub struct GlobeSession {
    pub rotation: RotationState,
    pub zoom: f64,
    pub rendered: usize,
    pub total: usize,
}

impl GlobeSession {
    pub fn new() -> Self {
        Self {
            rotation: RotationState::new(),
            zoom: 1.0,
            rendered: 0,
            total: 0,
        }
    }

    /// One animation frame: advance the clock, redraw everything, handle
    /// drag/zoom/hover from this frame's input.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        dt: f64,
        clock: &mut SimClock,
        catalog: &[TrackedObject],
        view: &ViewState,
        land: Option<&LandOutlines>,
    ) {
        clock.advance(dt);
        let now = clock.now();

        let matrix = self.rotation.view_matrix();
        let selected = select_visible(
            catalog,
            view.regime_visibility,
            view.display_budget,
            view.pinned_target.as_deref(),
        );

        let mut markers: Vec<ScreenMarker> = Vec::with_capacity(selected.len());
        for index in selected {
            let Some(point) = resolve(&catalog[index], now) else {
                continue;
            };
            if let Some(plot_xy) = project_globe(point.lat_deg, point.lon_deg, &matrix) {
                markers.push(ScreenMarker { index, point, plot_xy });
            }
        }
        self.rendered = markers.len();
        self.total = catalog.len();

        let pinned_index = view
            .pinned_target
            .as_deref()
            .and_then(|name| find_by_name(catalog, name));

        let size = ui.available_size();
        let margin = 1.15 / self.zoom;
        let plot = Plot::new("globe_surface")
            .data_aspect(1.0)
            .width(size.x)
            .height(size.y)
            .show_axes(false)
            .show_grid(false)
            .show_x(false)
            .show_y(false)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .cursor_color(egui::Color32::TRANSPARENT);

        let response = plot.show(ui, |plot_ui| {
            plot_ui.set_plot_bounds(egui_plot::PlotBounds::from_min_max(
                [-margin, -margin],
                [margin, margin],
            ));

            // Sphere disc behind everything else.
            let disc: PlotPoints = (0..=72)
                .map(|i| {
                    let theta = 2.0 * PI * i as f64 / 72.0;
                    [theta.cos(), theta.sin()]
                })
                .collect();
            plot_ui.polygon(
                Polygon::new("", disc)
                    .fill_color(OCEAN_FILL)
                    .stroke(egui::Stroke::new(1.5, OCEAN_EDGE)),
            );

            for segment in graticule_segments(&matrix) {
                plot_ui.line(
                    Line::new("", PlotPoints::new(segment))
                        .color(GRID_COLOR)
                        .width(0.5),
                );
            }

            if let Some(land) = land {
                for polyline in &land.polylines {
                    for segment in front_segments(polyline, &matrix) {
                        plot_ui.line(
                            Line::new("", PlotPoints::new(segment))
                                .color(LAND_COLOR)
                                .width(0.8),
                        );
                    }
                }
            }

            for regime in Regime::ALL {
                let pts: PlotPoints = markers
                    .iter()
                    .filter(|m| catalog[m.index].regime == regime)
                    .map(|m| m.plot_xy)
                    .collect();
                plot_ui.points(Points::new("", pts).color(regime.color()).radius(2.0).filled(true));
            }

            if let Some(pin) = pinned_index {
                if let Some(marker) = markers.iter().find(|m| m.index == pin) {
                    plot_ui.points(
                        Points::new("", PlotPoints::new(vec![marker.plot_xy]))
                            .color(egui::Color32::WHITE)
                            .radius(4.0)
                            .filled(true),
                    );
                }
            }
        });

        // Pinned-target ring and name label, in screen space.
        if let Some(pin) = pinned_index {
            if let Some(marker) = markers.iter().find(|m| m.index == pin) {
                let screen = response
                    .transform
                    .position_from_point(&PlotPoint::new(marker.plot_xy[0], marker.plot_xy[1]));
                ui.painter()
                    .circle_stroke(screen, 8.0, egui::Stroke::new(2.0, egui::Color32::WHITE));
                paint_label(
                    ui,
                    screen + egui::Vec2::new(12.0, -8.0),
                    &catalog[marker.index].name,
                );
            }
        }

        self.handle_hover(ui, &response, catalog, &markers);

        if response.response.dragged() {
            let delta = response.response.drag_delta();
            self.rotation.apply_drag(delta.x, delta.y, self.zoom);
        }
        if response.response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                self.zoom = (self.zoom * (1.0 + scroll as f64 * 0.001)).clamp(0.5, 8.0);
            }
        }

        paint_status(ui, response.response.rect, self.rendered, self.total);
    }

    fn handle_hover(
        &self,
        ui: &mut egui::Ui,
        response: &egui_plot::PlotResponse<()>,
        catalog: &[TrackedObject],
        markers: &[ScreenMarker],
    ) {
        let Some(hover_pos) = response.response.hover_pos() else {
            return;
        };
        let nearest = markers
            .iter()
            .map(|m| {
                let screen = response
                    .transform
                    .position_from_point(&PlotPoint::new(m.plot_xy[0], m.plot_xy[1]));
                (m, screen, screen.distance(hover_pos))
            })
            .filter(|(_, _, d)| *d <= HOVER_RADIUS_PX)
            .min_by(|a, b| a.2.total_cmp(&b.2));
        if let Some((marker, screen, _)) = nearest {
            let object = &catalog[marker.index];
            ui.painter().circle_stroke(
                screen,
                6.0,
                egui::Stroke::new(2.0, object.regime.color()),
            );
            paint_tooltip(ui, hover_pos, &tooltip_text(object, &marker.point));
        }
    }
}

impl Default for GlobeSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Latitude/longitude graticule at 30° steps, culled against the horizon.
fn graticule_segments(view: &Matrix3<f64>) -> Vec<Vec<[f64; 2]>> {
    let mut segments = Vec::new();
    let mut lat = -60.0;
    while lat <= 60.0 {
        let circle: Vec<(f64, f64)> = (0..=72).map(|i| (lat, -180.0 + i as f64 * 5.0)).collect();
        segments.extend(front_segments(&circle, view));
        lat += GRID_STEP_DEG;
    }
    let mut lon = -180.0;
    while lon < 180.0 {
        let meridian: Vec<(f64, f64)> = (0..=36).map(|i| (-90.0 + i as f64 * 5.0, lon)).collect();
        segments.extend(front_segments(&meridian, view));
        lon += GRID_STEP_DEG;
    }
    segments
}

pub struct MapSession {
    cached: Vec<(usize, GeodeticPoint)>,
    accum_secs: f64,
    primed: bool,
    pub rendered: usize,
    pub total: usize,
}

impl MapSession {
    pub fn new() -> Self {
        Self {
            cached: Vec::new(),
            accum_secs: 0.0,
            primed: false,
            rendered: 0,
            total: 0,
        }
    }

    /// Advance the refresh timer; on each 500 ms tick advance the clock by
    /// the accumulated real time and recompute marker positions. Between
    /// ticks the cached marker set is redrawn unchanged.
    pub fn tick(
        &mut self,
        dt: f64,
        clock: &mut SimClock,
        catalog: &[TrackedObject],
        view: &ViewState,
    ) {
        self.accum_secs += dt;
        if !refresh_due(self.primed, self.accum_secs) {
            return;
        }
        clock.advance(self.accum_secs);
        self.accum_secs = 0.0;
        self.primed = true;

        let now = clock.now();
        let selected = select_visible(
            catalog,
            view.regime_visibility,
            view.display_budget,
            view.pinned_target.as_deref(),
        );
        self.cached = selected
            .into_iter()
            .filter_map(|index| resolve(&catalog[index], now).map(|p| (index, p)))
            .collect();
        self.rendered = self.cached.len();
        self.total = catalog.len();
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        catalog: &[TrackedObject],
        view: &ViewState,
        land: Option<&LandOutlines>,
    ) {
        let pinned_index = view
            .pinned_target
            .as_deref()
            .and_then(|name| find_by_name(catalog, name));

        let size = ui.available_size();
        let plot = Plot::new("map_surface")
            .width(size.x)
            .height(size.y)
            .include_x(-180.0)
            .include_x(180.0)
            .include_y(-90.0)
            .include_y(90.0)
            .show_axes(false)
            .show_grid(false)
            .show_x(false)
            .show_y(false)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .cursor_color(egui::Color32::TRANSPARENT);

        let cached = &self.cached;
        let response = plot.show(ui, |plot_ui| {
            plot_ui.set_plot_bounds(egui_plot::PlotBounds::from_min_max(
                [-185.0, -95.0],
                [185.0, 95.0],
            ));

            let mut lon = -180.0;
            while lon <= 180.0 {
                plot_ui.line(
                    Line::new("", PlotPoints::new(vec![[lon, -90.0], [lon, 90.0]]))
                        .color(GRID_COLOR)
                        .width(0.5),
                );
                lon += GRID_STEP_DEG;
            }
            let mut lat = -90.0;
            while lat <= 90.0 {
                plot_ui.line(
                    Line::new("", PlotPoints::new(vec![[-180.0, lat], [180.0, lat]]))
                        .color(GRID_COLOR)
                        .width(0.5),
                );
                lat += GRID_STEP_DEG;
            }

            if let Some(land) = land {
                for polyline in &land.polylines {
                    for segment in split_dateline(polyline) {
                        plot_ui.line(
                            Line::new("", PlotPoints::new(segment))
                                .color(LAND_COLOR)
                                .width(0.8),
                        );
                    }
                }
            }

            for regime in Regime::ALL {
                let pts: PlotPoints = cached
                    .iter()
                    .filter(|(i, _)| catalog[*i].regime == regime)
                    .map(|(_, p)| [p.lon_deg, p.lat_deg])
                    .collect();
                plot_ui.points(Points::new("", pts).color(regime.color()).radius(2.0).filled(true));
            }

            if let Some(pin) = pinned_index {
                if let Some((_, p)) = cached.iter().find(|(i, _)| *i == pin) {
                    plot_ui.points(
                        Points::new("", PlotPoints::new(vec![[p.lon_deg, p.lat_deg]]))
                            .color(egui::Color32::WHITE)
                            .radius(4.0)
                            .filled(true),
                    );
                }
            }
        });

        if let Some(pin) = pinned_index {
            if let Some((_, p)) = self.cached.iter().find(|(i, _)| *i == pin) {
                let screen = response
                    .transform
                    .position_from_point(&PlotPoint::new(p.lon_deg, p.lat_deg));
                ui.painter()
                    .circle_stroke(screen, 8.0, egui::Stroke::new(2.0, egui::Color32::WHITE));
                paint_label(ui, screen + egui::Vec2::new(12.0, -8.0), &catalog[pin].name);
            }
        }

        if let Some(hover_pos) = response.response.hover_pos() {
            let nearest = self
                .cached
                .iter()
                .map(|(index, p)| {
                    let screen = response
                        .transform
                        .position_from_point(&PlotPoint::new(p.lon_deg, p.lat_deg));
                    (*index, p, screen, screen.distance(hover_pos))
                })
                .filter(|(_, _, _, d)| *d <= HOVER_RADIUS_PX)
                .min_by(|a, b| a.3.total_cmp(&b.3));
            if let Some((index, point, screen, _)) = nearest {
                let object = &catalog[index];
                ui.painter().circle_stroke(
                    screen,
                    6.0,
                    egui::Stroke::new(2.0, object.regime.color()),
                );
                paint_tooltip(ui, hover_pos, &tooltip_text(object, point));
            }
        }

        paint_status(ui, response.response.rect, self.rendered, self.total);
    }
}

impl Default for MapSession {
    fn default() -> Self {
        Self::new()
    }
}

fn paint_tooltip(ui: &egui::Ui, anchor: egui::Pos2, text: &str) {
    let font = egui::FontId::proportional(12.0);
    let galley = ui
        .painter()
        .layout_no_wrap(text.to_string(), font, egui::Color32::WHITE);
    let pos = anchor + egui::Vec2::new(15.0, -15.0 - galley.size().y);
    let rect = egui::Rect::from_min_size(pos, galley.size()).expand(4.0);
    ui.painter()
        .rect_filled(rect, 4.0, egui::Color32::from_rgba_unmultiplied(0, 0, 0, 200));
    ui.painter().galley(pos, galley, egui::Color32::WHITE);
}

fn paint_label(ui: &egui::Ui, pos: egui::Pos2, text: &str) {
    let font = egui::FontId::proportional(12.0);
    let galley = ui
        .painter()
        .layout_no_wrap(text.to_string(), font, egui::Color32::WHITE);
    let rect = egui::Rect::from_min_size(pos, galley.size()).expand(3.0);
    ui.painter()
        .rect_filled(rect, 3.0, egui::Color32::from_rgba_unmultiplied(0, 0, 0, 180));
    ui.painter().galley(pos, galley, egui::Color32::WHITE);
}

fn paint_status(ui: &egui::Ui, rect: egui::Rect, rendered: usize, total: usize) {
    ui.painter().text(
        rect.left_top() + egui::Vec2::new(8.0, 8.0),
        egui::Align2::LEFT_TOP,
        format!("Displaying: {} / {}", rendered, total),
        egui::FontId::proportional(13.0),
        egui::Color32::from_gray(200),
    );
}
