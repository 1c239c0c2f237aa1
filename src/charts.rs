//! Statistical views over the static catalog: altitude histogram,
//! altitude-vs-inclination congestion grid, launch-year timeline.
//!
//! Aggregation is separated from drawing so the binning logic is testable
//! without a UI. All three views read the catalog as ingested; the live
//! tracker's regime filter and budget do not apply here.

use eframe::egui;
use egui_plot::{Bar, BarChart, Plot, PlotPoints, Polygon};

use crate::catalog::{Regime, TrackedObject};
use crate::state::{Command, CommandQueue, ViewState};

pub const LEO_BIN_KM: f64 = 50.0;
pub const FULL_RANGE_BIN_KM: f64 = 500.0;
pub const LEO_RANGE_KM: f64 = 2000.0;

pub const GRID_ALT_BIN_KM: f64 = 100.0;
pub const GRID_INC_BIN_DEG: f64 = 10.0;
pub const GRID_INC_MAX_DEG: f64 = 180.0;

/// One histogram bar: lower edge of the bin and the object count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltitudeBin {
    pub floor_km: f64,
    pub width_km: f64,
    pub count: usize,
}

/// Bin catalog altitudes. In LEO-detail mode the range is fixed at
/// 0..2000 km with 50 km bins and higher objects are excluded; otherwise
/// 500 km bins cover everything up to the highest object. Sub-zero
/// altitudes (decaying entries) land in the first bin.
pub fn altitude_histogram(catalog: &[TrackedObject], leo_detail: bool) -> Vec<AltitudeBin> {
    let width = if leo_detail { LEO_BIN_KM } else { FULL_RANGE_BIN_KM };
    let ceiling = if leo_detail {
        LEO_RANGE_KM
    } else {
        let max = catalog
            .iter()
            .map(|o| o.altitude_km)
            .fold(0.0_f64, f64::max);
        ((max / width).floor() + 1.0) * width
    };
    let bins = (ceiling / width).round() as usize;
    if bins == 0 {
        return Vec::new();
    }

    let mut counts = vec![0usize; bins];
    for object in catalog {
        if leo_detail && object.altitude_km >= LEO_RANGE_KM {
            continue;
        }
        let index = ((object.altitude_km / width).floor().max(0.0) as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| AltitudeBin {
            floor_km: i as f64 * width,
            width_km: width,
            count,
        })
        .collect()
}

/// Occupancy grid over LEO altitude (100 km rows) and inclination
/// (10° columns). Objects above the altitude range are not counted.
pub struct CongestionGrid {
    pub alt_bins: usize,
    pub inc_bins: usize,
    counts: Vec<usize>,
    pub max_count: usize,
}

impl CongestionGrid {
    pub fn count(&self, alt_bin: usize, inc_bin: usize) -> usize {
        self.counts[alt_bin * self.inc_bins + inc_bin]
    }
}

pub fn congestion_grid(catalog: &[TrackedObject]) -> CongestionGrid {
    let alt_bins = (LEO_RANGE_KM / GRID_ALT_BIN_KM) as usize;
    let inc_bins = (GRID_INC_MAX_DEG / GRID_INC_BIN_DEG) as usize;
    let mut counts = vec![0usize; alt_bins * inc_bins];

    for object in catalog {
        if object.altitude_km < 0.0 || object.altitude_km >= LEO_RANGE_KM {
            continue;
        }
        let row = (object.altitude_km / GRID_ALT_BIN_KM) as usize;
        let col = ((object.inclination_deg / GRID_INC_BIN_DEG) as usize).min(inc_bins - 1);
        counts[row * inc_bins + col] += 1;
    }

    let max_count = counts.iter().copied().max().unwrap_or(0);
    CongestionGrid {
        alt_bins,
        inc_bins,
        counts,
        max_count,
    }
}

/// Object count per launch year, one entry per year over the catalog's
/// span, gap years included with zero. Cumulative mode running-sums the
/// counts. Objects without a launch year are excluded.
pub fn launch_timeline(catalog: &[TrackedObject], cumulative: bool) -> Vec<(i32, usize)> {
    let years: Vec<i32> = catalog.iter().filter_map(|o| o.launch_year).collect();
    let (Some(&first), Some(&last)) = (years.iter().min(), years.iter().max()) else {
        return Vec::new();
    };

    let mut timeline: Vec<(i32, usize)> = (first..=last).map(|y| (y, 0)).collect();
    for year in years {
        timeline[(year - first) as usize].1 += 1;
    }

    if cumulative {
        let mut running = 0;
        for entry in &mut timeline {
            running += entry.1;
            entry.1 = running;
        }
    }
    timeline
}

pub fn show_altitude_view(
    ui: &mut egui::Ui,
    catalog: &[TrackedObject],
    view: &ViewState,
    queue: &mut CommandQueue,
) {
    let mut leo_detail = view.leo_detail;
    if ui.checkbox(&mut leo_detail, "LEO detail (50 km bins)").changed() {
        queue.push(Command::SetLeoDetail(leo_detail));
    }

    let bars: Vec<Bar> = altitude_histogram(catalog, view.leo_detail)
        .into_iter()
        .map(|bin| {
            let center = bin.floor_km + bin.width_km / 2.0;
            Bar::new(center, bin.count as f64)
                .width(bin.width_km * 0.9)
                .fill(Regime::classify(center).color())
        })
        .collect();

    Plot::new("altitude_histogram")
        .x_axis_label("Altitude (km)")
        .y_axis_label("Objects")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new("", bars));
        });
}

pub fn show_heatmap_view(ui: &mut egui::Ui, catalog: &[TrackedObject]) {
    let grid = congestion_grid(catalog);

    Plot::new("congestion_grid")
        .x_axis_label("Inclination (deg)")
        .y_axis_label("Altitude (km)")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for row in 0..grid.alt_bins {
                for col in 0..grid.inc_bins {
                    let count = grid.count(row, col);
                    if count == 0 {
                        continue;
                    }
                    let x0 = col as f64 * GRID_INC_BIN_DEG;
                    let y0 = row as f64 * GRID_ALT_BIN_KM;
                    let cell = PlotPoints::new(vec![
                        [x0, y0],
                        [x0 + GRID_INC_BIN_DEG, y0],
                        [x0 + GRID_INC_BIN_DEG, y0 + GRID_ALT_BIN_KM],
                        [x0, y0 + GRID_ALT_BIN_KM],
                    ]);
                    plot_ui.polygon(
                        Polygon::new("", cell)
                            .fill_color(heat_color(count, grid.max_count))
                            .stroke(egui::Stroke::NONE),
                    );
                }
            }
        });
}

/// Square-root intensity ramp from dark blue to hot orange, so sparse
/// cells stay distinguishable next to the densest shells.
fn heat_color(count: usize, max_count: usize) -> egui::Color32 {
    let t = if max_count == 0 {
        0.0
    } else {
        (count as f32 / max_count as f32).sqrt()
    };
    let lerp = |a: f32, b: f32| (a + (b - a) * t) as u8;
    egui::Color32::from_rgb(lerp(25.0, 255.0), lerp(40.0, 140.0), lerp(90.0, 30.0))
}

pub fn show_timeline_view(
    ui: &mut egui::Ui,
    catalog: &[TrackedObject],
    view: &ViewState,
    queue: &mut CommandQueue,
) {
    let mut cumulative = view.cumulative_timeline;
    if ui.checkbox(&mut cumulative, "Cumulative").changed() {
        queue.push(Command::SetTimelineCumulative(cumulative));
    }

    let bars: Vec<Bar> = launch_timeline(catalog, view.cumulative_timeline)
        .into_iter()
        .map(|(year, count)| {
            Bar::new(year as f64, count as f64)
                .width(0.9)
                .fill(egui::Color32::from_rgb(100, 150, 220))
        })
        .collect();

    Plot::new("launch_timeline")
        .x_axis_label("Launch year")
        .y_axis_label("Objects")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new("", bars));
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn object_at(altitude_km: f64, inclination_deg: f64, launch_year: Option<i32>) -> TrackedObject {
        let elements = sgp4::Elements::from_tle(
            None,
            catalog::tests::TLE1.as_bytes(),
            catalog::tests::TLE2.as_bytes(),
        )
        .unwrap();
        TrackedObject {
            name: format!("OBJ-{altitude_km}"),
            epoch_minutes: elements.datetime.and_utc().timestamp() as f64 / 60.0,
            constants: sgp4::Constants::from_elements(&elements).unwrap(),
            altitude_km,
            inclination_deg,
            launch_year,
            country: String::new(),
            object_type: String::new(),
            rcs_size: String::new(),
            regime: Regime::classify(altitude_km),
        }
    }

    #[test]
    fn leo_detail_bins_are_fifty_km_and_exclude_high_orbits() {
        let cat = vec![
            object_at(10.0, 51.6, None),
            object_at(49.9, 51.6, None),
            object_at(550.0, 53.0, None),
            object_at(20_000.0, 55.0, None),
        ];
        let bins = altitude_histogram(&cat, true);
        assert_eq!(bins.len(), 40);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[11].count, 1); // 550 km -> [550, 600)
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
    }

    #[test]
    fn full_range_covers_highest_object() {
        let cat = vec![object_at(550.0, 51.6, None), object_at(35_786.0, 0.1, None)];
        let bins = altitude_histogram(&cat, false);
        assert_eq!(bins[0].width_km, FULL_RANGE_BIN_KM);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
        let last_floor = bins.last().unwrap().floor_km;
        assert!(last_floor <= 35_786.0 && last_floor + FULL_RANGE_BIN_KM > 35_786.0);
    }

    #[test]
    fn negative_altitude_lands_in_first_bin() {
        let cat = vec![object_at(-5.0, 51.6, None)];
        let bins = altitude_histogram(&cat, true);
        assert_eq!(bins[0].count, 1);
    }

    #[test]
    fn congestion_grid_places_objects_by_both_axes() {
        let cat = vec![
            object_at(550.0, 53.0, None),
            object_at(560.0, 53.9, None),
            object_at(550.0, 97.5, None),
            object_at(25_000.0, 53.0, None), // above grid range
        ];
        let grid = congestion_grid(&cat);
        assert_eq!(grid.count(5, 5), 2); // [500,600) x [50,60)
        assert_eq!(grid.count(5, 9), 1); // [500,600) x [90,100)
        assert_eq!(grid.max_count, 2);
    }

    #[test]
    fn timeline_fills_gap_years_with_zero() {
        let cat = vec![
            object_at(550.0, 51.6, Some(1998)),
            object_at(550.0, 51.6, Some(1998)),
            object_at(550.0, 51.6, Some(2001)),
            object_at(550.0, 51.6, None),
        ];
        let timeline = launch_timeline(&cat, false);
        assert_eq!(
            timeline,
            vec![(1998, 2), (1999, 0), (2000, 0), (2001, 1)]
        );
    }

    #[test]
    fn cumulative_timeline_is_monotonic_running_sum() {
        let cat = vec![
            object_at(550.0, 51.6, Some(1998)),
            object_at(550.0, 51.6, Some(1998)),
            object_at(550.0, 51.6, Some(2001)),
        ];
        let timeline = launch_timeline(&cat, true);
        assert_eq!(
            timeline,
            vec![(1998, 2), (1999, 2), (2000, 2), (2001, 3)]
        );
    }

    #[test]
    fn empty_catalog_yields_empty_aggregates() {
        assert!(launch_timeline(&[], false).is_empty());
        let grid = congestion_grid(&[]);
        assert_eq!(grid.max_count, 0);
    }
}
