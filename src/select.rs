//! Visible-set selection under a display budget.
//!
//! Deterministic for a fixed filtered set and budget. The identity of
//! sampled elements shifts whenever the filtered set changes size or order
//! (a filter toggle); no sampling continuity across ticks is guaranteed.

use crate::catalog::{find_by_name, TrackedObject};

/// Derive the subset of catalog indices to render this tick, in catalog
/// order. The result exceeds `budget` by at most one, and only when a
/// pinned target outside the sample is appended.
pub fn select_visible(
    catalog: &[TrackedObject],
    regime_visibility: [bool; 3],
    budget: usize,
    pinned: Option<&str>,
) -> Vec<usize> {
    let filtered: Vec<usize> = catalog
        .iter()
        .enumerate()
        .filter(|(_, o)| regime_visibility[o.regime.index()])
        .map(|(i, _)| i)
        .collect();

    // A zero budget is treated as one: the result is never empty while
    // the filtered catalog has members.
    let budget = budget.max(1);
    let mut selected = if filtered.len() <= budget {
        filtered
    } else {
        let step = filtered.len() as f64 / budget as f64;
        (0..budget)
            .map(|k| filtered[(k as f64 * step).floor() as usize])
            .collect()
    };

    if let Some(name) = pinned {
        if let Some(idx) = find_by_name(catalog, name) {
            if !selected.contains(&idx) {
                selected.push(idx);
            }
        }
    }

    selected
}
