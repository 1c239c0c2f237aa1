//! Land boundary geometry shared by both projection surfaces.
//!
//! Natural Earth GeoJSON is fetched once, cached on disk, and parsed into
//! plain (lat, lon) polylines. Absence or delay just means land is omitted
//! from the current frames until the data arrives.

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_LAND_URL: &str = "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_110m_coastline.geojson";

/// Land outlines as (lat_deg, lon_deg) polylines.
pub struct LandOutlines {
    pub polylines: Vec<Vec<(f64, f64)>>,
}

pub enum LandLoadState {
    Loading,
    Loaded(LandOutlines),
    Failed(String),
}

/// Extract every LineString, MultiLineString, and polygon ring from a
/// GeoJSON feature collection.
pub fn parse_land_outlines(json: &str) -> Result<LandOutlines> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let features = value["features"]
        .as_array()
        .ok_or_else(|| anyhow!("GeoJSON has no features array"))?;

    let mut polylines = Vec::new();
    for feature in features {
        let geometry = &feature["geometry"];
        match geometry["type"].as_str() {
            Some("LineString") => {
                if let Some(line) = coord_line(&geometry["coordinates"]) {
                    polylines.push(line);
                }
            }
            Some("MultiLineString") | Some("Polygon") => {
                if let Some(lines) = geometry["coordinates"].as_array() {
                    polylines.extend(lines.iter().filter_map(coord_line));
                }
            }
            Some("MultiPolygon") => {
                if let Some(polygons) = geometry["coordinates"].as_array() {
                    for polygon in polygons {
                        if let Some(rings) = polygon.as_array() {
                            polylines.extend(rings.iter().filter_map(coord_line));
                        }
                    }
                }
            }
            _ => {}
        }
    }
    Ok(LandOutlines { polylines })
}

fn coord_line(value: &serde_json::Value) -> Option<Vec<(f64, f64)>> {
    let points = value.as_array()?;
    let coords: Vec<(f64, f64)> = points
        .iter()
        .filter_map(|p| {
            let pair = p.as_array()?;
            // GeoJSON order is [lon, lat].
            Some((pair.get(1)?.as_f64()?, pair.first()?.as_f64()?))
        })
        .collect();
    if coords.len() < 2 {
        None
    } else {
        Some(coords)
    }
}

fn cache_dir() -> std::path::PathBuf {
    std::env::var_os("HOME")
        .map(|h| std::path::PathBuf::from(h).join(".cache"))
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("orbscope")
}

/// Fetch a remote resource, reusing a previously cached copy when present.
pub fn fetch_or_cache(filename: &str, url: &str) -> Result<String> {
    let dir = cache_dir();
    let _ = std::fs::create_dir_all(&dir);
    let path = dir.join(filename);
    if path.exists() {
        log::info!("Using cached {:?}", path);
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file {:?}", path));
    }
    log::info!("Fetching {}", url);
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("Request failed: {}", url))?;
    let body = response
        .into_string()
        .with_context(|| format!("Failed to read response body from {}", url))?;
    let _ = std::fs::write(&path, &body);
    Ok(body)
}

/// Load land outlines from a local path or a URL.
pub fn load_land_outlines(source: &str) -> Result<LandOutlines> {
    let json = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_or_cache("land.geojson", source)?
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read land file {}", source))?
    };
    let outlines = parse_land_outlines(&json)?;
    log::info!("Loaded {} land outlines", outlines.polylines.len());
    Ok(outlines)
}
