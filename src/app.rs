//! Application shell and eframe integration.
//!
//! Owns the load states, the simulated clock, the view state, and the
//! active projection session. Catalog and land outlines load on background
//! threads and arrive over mpsc channels; the update loop polls them,
//! drains the command queue, then hands the frame to the active view.

use std::sync::mpsc;

use chrono::Utc;
use eframe::egui;

use crate::catalog::{load_catalog, Regime, TrackedObject};
use crate::charts;
use crate::clock::SimClock;
use crate::geo::{load_land_outlines, LandLoadState, LandOutlines};
use crate::state::{
    apply, Command, CommandQueue, ProjectionMode, ViewId, ViewState, MAX_DISPLAY_BUDGET,
};
use crate::surface::{GlobeSession, MapSession};

const WARP_PRESETS: [f64; 8] = [-1000.0, -100.0, -10.0, -1.0, 1.0, 10.0, 100.0, 1000.0];
const RESIZE_QUIET_SECS: f64 = 0.15;
const MAX_FRAME_DT: f64 = 0.1;
const SEARCH_RESULT_LIMIT: usize = 8;

enum CatalogLoadState {
    Loading,
    Loaded(Vec<TrackedObject>),
    Failed(String),
}

enum Surface {
    Globe(GlobeSession),
    Map(MapSession),
}

/// Collapses resize events into one reinitialization once the container
/// size has been stable for a quiet period.
pub struct ResizeDebouncer {
    last_size: egui::Vec2,
    changed_at: Option<f64>,
}

impl ResizeDebouncer {
    pub fn new() -> Self {
        Self {
            last_size: egui::Vec2::ZERO,
            changed_at: None,
        }
    }

    /// Feed the current container size; returns true exactly once per
    /// burst of resizes, after the size has held steady.
    pub fn observe(&mut self, size: egui::Vec2, now_secs: f64) -> bool {
        if size != self.last_size {
            let first = self.last_size == egui::Vec2::ZERO;
            self.last_size = size;
            if !first {
                self.changed_at = Some(now_secs);
            }
            return false;
        }
        match self.changed_at {
            Some(t) if now_secs - t >= RESIZE_QUIET_SECS => {
                self.changed_at = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

pub struct App {
    catalog: CatalogLoadState,
    catalog_rx: Option<mpsc::Receiver<anyhow::Result<Vec<TrackedObject>>>>,
    land: LandLoadState,
    land_rx: Option<mpsc::Receiver<anyhow::Result<LandOutlines>>>,
    clock: Option<SimClock>,
    view: ViewState,
    queue: CommandQueue,
    surface: Option<Surface>,
    resize: ResizeDebouncer,
    search_text: String,
    elapsed_real: f64,
}

impl App {
    pub fn new(catalog_source: String, land_source: String) -> Self {
        let (catalog_tx, catalog_rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = catalog_tx.send(load_catalog(&catalog_source, Utc::now()));
        });

        let (land_tx, land_rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = land_tx.send(load_land_outlines(&land_source));
        });

        Self {
            catalog: CatalogLoadState::Loading,
            catalog_rx: Some(catalog_rx),
            land: LandLoadState::Loading,
            land_rx: Some(land_rx),
            clock: None,
            view: ViewState::default(),
            queue: CommandQueue::default(),
            surface: None,
            resize: ResizeDebouncer::new(),
            search_text: String::new(),
            elapsed_real: 0.0,
        }
    }

    fn poll_loaders(&mut self) {
        if let Some(rx) = &self.catalog_rx {
            if let Ok(result) = rx.try_recv() {
                self.catalog = match result {
                    Ok(objects) => {
                        self.clock = Some(SimClock::new(Utc::now()));
                        CatalogLoadState::Loaded(objects)
                    }
                    Err(e) => CatalogLoadState::Failed(format!("{:#}", e)),
                };
                self.catalog_rx = None;
            }
        }
        if let Some(rx) = &self.land_rx {
            if let Ok(result) = rx.try_recv() {
                self.land = match result {
                    Ok(outlines) => LandLoadState::Loaded(outlines),
                    Err(e) => {
                        log::warn!("Land outlines unavailable: {:#}", e);
                        LandLoadState::Failed(format!("{:#}", e))
                    }
                };
                self.land_rx = None;
            }
        }
    }

    /// Replace the projection session whenever the wanted variant differs
    /// from the live one, or unconditionally on a forced reinit (resize).
    /// A globe-to-globe reinit rebuilds projection parameters but carries
    /// the user's rotation and zoom forward; only a projection switch
    /// starts from the default orientation.
    fn sync_surface(&mut self, force: bool) {
        let want_globe = self.view.projection == ProjectionMode::Perspective;
        let current_matches = matches!(
            (&self.surface, want_globe),
            (Some(Surface::Globe(_)), true) | (Some(Surface::Map(_)), false)
        );
        if !force && current_matches {
            return;
        }
        let carried = match self.surface.take() {
            Some(Surface::Globe(old)) if want_globe => Some((old.rotation, old.zoom)),
            _ => None,
        };
        self.surface = Some(if want_globe {
            let mut session = GlobeSession::new();
            if let Some((rotation, zoom)) = carried {
                session.rotation = rotation;
                session.zoom = zoom;
            }
            Surface::Globe(session)
        } else {
            Surface::Map(MapSession::new())
        });
    }

    fn side_panel(&mut self, ui: &mut egui::Ui, catalog: &[TrackedObject]) {
        let clock_warp = self.clock.as_ref().map_or(1.0, |c| c.warp());

        ui.heading("Time");
        ui.horizontal_wrapped(|ui| {
            for warp in WARP_PRESETS {
                let label = if warp < 0.0 {
                    format!("\u{2212}{}\u{d7}", -warp)
                } else {
                    format!("{}\u{d7}", warp)
                };
                if ui
                    .selectable_label((clock_warp - warp).abs() < f64::EPSILON, label)
                    .clicked()
                {
                    self.queue.push(Command::SetWarp(warp));
                }
            }
        });

        ui.separator();
        ui.heading("Display");
        let mut budget = self.view.display_budget;
        if ui
            .add(egui::Slider::new(&mut budget, 10..=MAX_DISPLAY_BUDGET).text("Budget"))
            .changed()
        {
            self.queue.push(Command::SetBudget(budget));
        }

        for regime in Regime::ALL {
            let mut visible = self.view.regime_visibility[regime.index()];
            ui.horizontal(|ui| {
                if ui.checkbox(&mut visible, regime.label()).changed() {
                    self.queue.push(Command::SetRegimeVisible(regime, visible));
                }
                let (rect, _) =
                    ui.allocate_exact_size(egui::Vec2::splat(10.0), egui::Sense::hover());
                ui.painter().circle_filled(rect.center(), 4.0, regime.color());
            });
        }

        ui.separator();
        ui.heading("Projection");
        ui.horizontal(|ui| {
            for (mode, label) in [
                (ProjectionMode::Perspective, "Globe"),
                (ProjectionMode::Planar, "Map"),
            ] {
                if ui
                    .selectable_label(self.view.projection == mode, label)
                    .clicked()
                {
                    self.queue.push(Command::SetProjection(mode));
                }
            }
        });

        ui.separator();
        ui.heading("Target");
        if let Some(pinned) = &self.view.pinned_target {
            ui.label(format!("Pinned: {}", pinned));
            if ui.button("Unpin").clicked() {
                self.queue.push(Command::ClearPin);
            }
        }
        ui.text_edit_singleline(&mut self.search_text);
        if self.search_text.len() >= 2 {
            let needle = self.search_text.to_uppercase();
            let matches: Vec<&str> = catalog
                .iter()
                .filter(|o| o.name.to_uppercase().contains(&needle))
                .map(|o| o.name.as_str())
                .take(SEARCH_RESULT_LIMIT)
                .collect();
            for name in matches {
                if ui.small_button(name).clicked() {
                    self.queue.push(Command::PinTarget(name.to_string()));
                    self.search_text.clear();
                }
            }
        }
    }

    fn tracker_view(&mut self, ui: &mut egui::Ui, dt: f64) {
        let CatalogLoadState::Loaded(catalog) = &self.catalog else {
            return;
        };
        let Some(clock) = self.clock.as_mut() else {
            return;
        };
        let land = match &self.land {
            LandLoadState::Loaded(outlines) => Some(outlines),
            _ => None,
        };
        match self.surface.as_mut() {
            Some(Surface::Globe(session)) => {
                session.show(ui, dt, clock, catalog, &self.view, land);
            }
            Some(Surface::Map(session)) => {
                session.tick(dt, clock, catalog, &self.view);
                session.show(ui, catalog, &self.view, land);
            }
            None => {}
        }
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(clock) = &self.clock {
                ui.label(clock.format_utc());
                ui.separator();
                ui.label(format!("warp {}\u{d7}", clock.warp()));
            }
            if let CatalogLoadState::Loaded(catalog) = &self.catalog {
                ui.separator();
                ui.label(format!("{} objects tracked", catalog.len()));
            }
            if let LandLoadState::Failed(_) = &self.land {
                ui.separator();
                ui.colored_label(egui::Color32::YELLOW, "land outlines unavailable");
            }
        });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = (ctx.input(|i| i.stable_dt) as f64).min(MAX_FRAME_DT);
        self.elapsed_real += dt;

        self.poll_loaders();

        for command in self.queue.drain() {
            if let Some(clock) = self.clock.as_mut() {
                apply(&mut self.view, clock, command);
            }
        }
        if matches!(self.catalog, CatalogLoadState::Loaded(_)) {
            self.sync_surface(false);
        }

        match &self.catalog {
            CatalogLoadState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(ui.available_height() / 3.0);
                        ui.spinner();
                        ui.label("Loading catalog\u{2026}");
                    });
                });
                ctx.request_repaint();
                return;
            }
            CatalogLoadState::Failed(message) => {
                let message = message.clone();
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(ui.available_height() / 3.0);
                        ui.colored_label(
                            egui::Color32::LIGHT_RED,
                            format!("Catalog failed to load:\n{}", message),
                        );
                    });
                });
                return;
            }
            CatalogLoadState::Loaded(_) => {}
        }

        egui::TopBottomPanel::top("view_tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for id in ViewId::ALL {
                    if ui
                        .selectable_label(self.view.active_view == id, id.label())
                        .clicked()
                    {
                        self.queue.push(Command::SetView(id));
                    }
                }
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.status_bar(ui);
        });

        if self.view.active_view == ViewId::Tracker {
            // The side panel reads the catalog while pushing commands into
            // self.queue, so the loaded vector is moved out for the call.
            let catalog = match std::mem::replace(&mut self.catalog, CatalogLoadState::Loading) {
                CatalogLoadState::Loaded(objects) => objects,
                other => {
                    self.catalog = other;
                    return;
                }
            };
            egui::SidePanel::left("tracker_controls")
                .default_width(200.0)
                .show(ctx, |ui| {
                    self.side_panel(ui, &catalog);
                });
            self.catalog = CatalogLoadState::Loaded(catalog);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            let size = ui.available_size();
            if self.resize.observe(size, self.elapsed_real) {
                self.sync_surface(true);
            }
            match self.view.active_view {
                ViewId::Tracker => self.tracker_view(ui, dt),
                ViewId::Altitude => {
                    if let CatalogLoadState::Loaded(catalog) = &self.catalog {
                        charts::show_altitude_view(ui, catalog, &self.view, &mut self.queue);
                    }
                }
                ViewId::Heatmap => {
                    if let CatalogLoadState::Loaded(catalog) = &self.catalog {
                        charts::show_heatmap_view(ui, catalog);
                    }
                }
                ViewId::Timeline => {
                    if let CatalogLoadState::Loaded(catalog) = &self.catalog {
                        charts::show_timeline_view(ui, catalog, &self.view, &mut self.queue);
                    }
                }
            }
        });

        ctx.request_repaint();
    }
}
