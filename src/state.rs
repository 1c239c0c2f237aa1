//! View state and the command queue that mutates it.
//!
//! Control widgets never write shared state directly: each emits a Command
//! into a queue drained once per frame, before any surface reads the
//! state. This keeps the rendering core a function of
//! (catalog, clock, view state).

use crate::catalog::Regime;
use crate::clock::SimClock;

pub const DEFAULT_DISPLAY_BUDGET: usize = 500;
pub const MAX_DISPLAY_BUDGET: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewId {
    Tracker,
    Altitude,
    Heatmap,
    Timeline,
}

impl ViewId {
    pub const ALL: [ViewId; 4] = [
        ViewId::Tracker,
        ViewId::Altitude,
        ViewId::Heatmap,
        ViewId::Timeline,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ViewId::Tracker => "Live Tracker",
            ViewId::Altitude => "Altitude",
            ViewId::Heatmap => "Congestion",
            ViewId::Timeline => "Launch Timeline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    Perspective,
    Planar,
}

pub struct ViewState {
    pub active_view: ViewId,
    pub projection: ProjectionMode,
    pub display_budget: usize,
    pub regime_visibility: [bool; 3],
    pub pinned_target: Option<String>,
    pub leo_detail: bool,
    pub cumulative_timeline: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            active_view: ViewId::Tracker,
            projection: ProjectionMode::Perspective,
            display_budget: DEFAULT_DISPLAY_BUDGET,
            regime_visibility: [true; 3],
            pinned_target: None,
            leo_detail: true,
            cumulative_timeline: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetView(ViewId),
    SetProjection(ProjectionMode),
    SetWarp(f64),
    SetBudget(usize),
    SetRegimeVisible(Regime, bool),
    PinTarget(String),
    ClearPin,
    SetLeoDetail(bool),
    SetTimelineCumulative(bool),
}

/// Pending commands for the frame. Widgets push; the update loop drains.
#[derive(Default)]
pub struct CommandQueue {
    pending: Vec<Command>,
}

impl CommandQueue {
    pub fn push(&mut self, command: Command) {
        self.pending.push(command);
    }

    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.pending)
    }
}

/// Apply one command. Each command writes exactly one field.
pub fn apply(view: &mut ViewState, clock: &mut SimClock, command: Command) {
    match command {
        Command::SetView(id) => view.active_view = id,
        Command::SetProjection(mode) => view.projection = mode,
        Command::SetWarp(warp) => clock.set_warp(warp),
        Command::SetBudget(budget) => view.display_budget = budget.clamp(1, MAX_DISPLAY_BUDGET),
        Command::SetRegimeVisible(regime, visible) => {
            view.regime_visibility[regime.index()] = visible
        }
        Command::PinTarget(name) => view.pinned_target = Some(name),
        Command::ClearPin => view.pinned_target = None,
        Command::SetLeoDetail(on) => view.leo_detail = on,
        Command::SetTimelineCumulative(on) => view.cumulative_timeline = on,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixtures() -> (ViewState, SimClock) {
        (ViewState::default(), SimClock::new(Utc::now()))
    }

    #[test]
    fn defaults() {
        let view = ViewState::default();
        assert_eq!(view.active_view, ViewId::Tracker);
        assert_eq!(view.projection, ProjectionMode::Perspective);
        assert_eq!(view.display_budget, DEFAULT_DISPLAY_BUDGET);
        assert_eq!(view.regime_visibility, [true; 3]);
        assert!(view.pinned_target.is_none());
    }

    #[test]
    fn each_command_writes_one_field() {
        let (mut view, mut clock) = fixtures();

        apply(&mut view, &mut clock, Command::SetView(ViewId::Heatmap));
        assert_eq!(view.active_view, ViewId::Heatmap);
        assert_eq!(view.projection, ProjectionMode::Perspective);

        apply(&mut view, &mut clock, Command::SetProjection(ProjectionMode::Planar));
        assert_eq!(view.projection, ProjectionMode::Planar);
        assert_eq!(view.active_view, ViewId::Heatmap);

        apply(&mut view, &mut clock, Command::SetWarp(1000.0));
        assert_eq!(clock.warp(), 1000.0);

        apply(&mut view, &mut clock, Command::SetRegimeVisible(Regime::Meo, false));
        assert_eq!(view.regime_visibility, [true, false, true]);

        apply(&mut view, &mut clock, Command::PinTarget("ISS (ZARYA)".into()));
        assert_eq!(view.pinned_target.as_deref(), Some("ISS (ZARYA)"));
        apply(&mut view, &mut clock, Command::ClearPin);
        assert!(view.pinned_target.is_none());
    }

    #[test]
    fn budget_is_clamped() {
        let (mut view, mut clock) = fixtures();
        apply(&mut view, &mut clock, Command::SetBudget(0));
        assert_eq!(view.display_budget, 1);
        apply(&mut view, &mut clock, Command::SetBudget(1_000_000));
        assert_eq!(view.display_budget, MAX_DISPLAY_BUDGET);
    }

    #[test]
    fn queue_drains_in_order_and_empties() {
        let mut queue = CommandQueue::default();
        queue.push(Command::ClearPin);
        queue.push(Command::SetWarp(10.0));
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], Command::ClearPin);
        assert!(queue.drain().is_empty());
    }
}
