//! Orbital-catalog dashboard: a rotatable live tracker plus altitude,
//! congestion, and launch-history views over a static object catalog.

mod app;
mod catalog;
mod charts;
mod clock;
mod geo;
mod propagate;
mod select;
mod state;
mod surface;

use clap::Parser;
use eframe::egui;

#[derive(Parser)]
#[command(name = "orbscope", version, about = "Tracked orbital object dashboard")]
struct Args {
    /// Catalog CSV with OBJECT_NAME and TLE_LINE1/TLE_LINE2 columns,
    /// as a local path or an HTTP(S) URL.
    catalog: String,

    /// Land outline GeoJSON, as a local path or an HTTP(S) URL.
    #[arg(long, default_value = geo::DEFAULT_LAND_URL)]
    land: String,
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("orbscope"),
        ..Default::default()
    };
    eframe::run_native(
        "orbscope",
        options,
        Box::new(move |_cc| Ok(Box::new(app::App::new(args.catalog, args.land)))),
    )
}
