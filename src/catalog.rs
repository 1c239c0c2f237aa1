//! Tracked-object catalog: CSV ingestion and derived classification.
//!
//! Each record carries a name, the two element-set lines, and categorical
//! metadata. Altitude and orbital regime are derived once at ingestion time
//! and never recomputed, even though the true altitude of an eccentric
//! orbit varies over a revolution.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use eframe::egui;
use serde::Deserialize;

use crate::propagate::EARTH_RADIUS_KM;

pub const LEO_CEILING_KM: f64 = 2000.0;
pub const MEO_CEILING_KM: f64 = 35_786.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Leo,
    Meo,
    Geo,
}

impl Regime {
    pub const ALL: [Regime; 3] = [Regime::Leo, Regime::Meo, Regime::Geo];

    pub fn classify(altitude_km: f64) -> Self {
        if altitude_km < LEO_CEILING_KM {
            Regime::Leo
        } else if altitude_km < MEO_CEILING_KM {
            Regime::Meo
        } else {
            Regime::Geo
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Regime::Leo => "LEO",
            Regime::Meo => "MEO",
            Regime::Geo => "GEO",
        }
    }

    pub fn color(&self) -> egui::Color32 {
        match self {
            Regime::Leo => egui::Color32::from_rgb(255, 99, 71),
            Regime::Meo => egui::Color32::from_rgb(255, 215, 0),
            Regime::Geo => egui::Color32::from_rgb(30, 144, 255),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Regime::Leo => 0,
            Regime::Meo => 1,
            Regime::Geo => 2,
        }
    }
}

/// One catalog entry. Immutable after ingestion; per-frame derived values
/// (screen position, hover state) live in ephemeral structures elsewhere.
pub struct TrackedObject {
    pub name: String,
    pub constants: sgp4::Constants,
    pub epoch_minutes: f64,
    pub altitude_km: f64,
    pub inclination_deg: f64,
    pub launch_year: Option<i32>,
    pub country: String,
    pub object_type: String,
    pub rcs_size: String,
    pub regime: Regime,
}

/// Name lookup. Names are not deduplicated at ingestion; the last-parsed
/// record wins when names repeat.
pub fn find_by_name(catalog: &[TrackedObject], name: &str) -> Option<usize> {
    catalog.iter().rposition(|o| o.name == name)
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "OBJECT_NAME")]
    name: String,
    #[serde(rename = "TLE_LINE1")]
    line1: String,
    #[serde(rename = "TLE_LINE2")]
    line2: String,
    #[serde(rename = "INCLINATION", default)]
    inclination: Option<f64>,
    #[serde(rename = "LAUNCH_DATE", default)]
    launch_date: Option<String>,
    #[serde(rename = "COUNTRY_CODE", default)]
    country: Option<String>,
    #[serde(rename = "OBJECT_TYPE", default)]
    object_type: Option<String>,
    #[serde(rename = "RCS_SIZE", default)]
    rcs_size: Option<String>,
}

/// Parse the catalog CSV and derive per-object fields at `now`.
///
/// Records that fail element-set parsing, or that cannot be propagated at
/// the ingestion instant, are dropped with a trace log; a malformed row
/// never aborts the batch.
pub fn parse_catalog_csv(text: &str, now: DateTime<Utc>) -> Result<Vec<TrackedObject>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut objects = Vec::new();
    let mut dropped = 0usize;

    for row in reader.deserialize::<RawRecord>() {
        let record = match row {
            Ok(r) => r,
            Err(e) => {
                log::trace!("Dropping malformed catalog row: {}", e);
                dropped += 1;
                continue;
            }
        };
        match ingest_record(record, now) {
            Some(obj) => objects.push(obj),
            None => dropped += 1,
        }
    }

    log::info!(
        "Catalog ingested: {} objects ({} rows dropped)",
        objects.len(),
        dropped
    );
    Ok(objects)
}

fn ingest_record(record: RawRecord, now: DateTime<Utc>) -> Option<TrackedObject> {
    let elements = match sgp4::Elements::from_tle(
        Some(record.name.clone()),
        record.line1.as_bytes(),
        record.line2.as_bytes(),
    ) {
        Ok(e) => e,
        Err(e) => {
            log::trace!("Dropping {:?}: bad element set: {}", record.name, e);
            return None;
        }
    };
    let inclination_deg = record.inclination.unwrap_or(elements.inclination);
    let epoch_minutes = elements.datetime.and_utc().timestamp() as f64 / 60.0;
    let constants = match sgp4::Constants::from_elements(&elements) {
        Ok(c) => c,
        Err(e) => {
            log::trace!("Dropping {:?}: degenerate elements: {}", record.name, e);
            return None;
        }
    };

    // Altitude at the ingestion instant fixes the regime for the object's
    // whole lifetime in this session.
    let minutes = now.timestamp_millis() as f64 / 60_000.0 - epoch_minutes;
    let prediction = match constants.propagate(sgp4::MinutesSinceEpoch(minutes)) {
        Ok(p) => p,
        Err(e) => {
            log::trace!("Dropping {:?}: unpropagatable at ingestion: {}", record.name, e);
            return None;
        }
    };
    let [x, y, z] = prediction.position;
    let altitude_km = (x * x + y * y + z * z).sqrt() - EARTH_RADIUS_KM;

    Some(TrackedObject {
        name: record.name,
        constants,
        epoch_minutes,
        altitude_km,
        inclination_deg,
        launch_year: record.launch_date.as_deref().and_then(parse_launch_year),
        country: record.country.unwrap_or_default(),
        object_type: record.object_type.unwrap_or_default(),
        rcs_size: record.rcs_size.unwrap_or_default(),
        regime: Regime::classify(altitude_km),
    })
}

fn parse_launch_year(date: &str) -> Option<i32> {
    date.get(..4)?.parse().ok()
}

/// Read the catalog from a local path or fetch it from an HTTP URL.
pub fn load_catalog(source: &str, now: DateTime<Utc>) -> Result<Vec<TrackedObject>> {
    log::info!("Loading catalog from {}", source);
    let text = if source.starts_with("http://") || source.starts_with("https://") {
        crate::geo::fetch_or_cache("catalog.csv", source)
            .with_context(|| format!("Failed to fetch catalog from {}", source))?
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read catalog file {}", source))?
    };
    let objects = parse_catalog_csv(&text, now)?;
    if objects.is_empty() {
        anyhow::bail!("Catalog contains no usable records");
    }
    Ok(objects)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    // ISS element set from the sgp4 crate documentation.
    pub(crate) const TLE1: &str =
        "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992";
    pub(crate) const TLE2: &str =
        "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

    pub(crate) fn ingestion_instant() -> DateTime<Utc> {
        // Close to the element-set epoch so propagation is well-behaved.
        Utc.with_ymd_and_hms(2020, 7, 12, 21, 0, 0).unwrap()
    }

    pub(crate) fn sample_csv() -> String {
        format!(
            "OBJECT_NAME,TLE_LINE1,TLE_LINE2,INCLINATION,LAUNCH_DATE,COUNTRY_CODE,OBJECT_TYPE,RCS_SIZE\n\
             ISS (ZARYA),{l1},{l2},51.6416,1998-11-20,ISS,PAYLOAD,LARGE\n",
            l1 = TLE1,
            l2 = TLE2
        )
    }

    #[test]
    fn regime_boundaries() {
        assert_eq!(Regime::classify(1999.999), Regime::Leo);
        assert_eq!(Regime::classify(2000.0), Regime::Meo);
        assert_eq!(Regime::classify(35_785.999), Regime::Meo);
        assert_eq!(Regime::classify(35_786.0), Regime::Geo);
    }

    #[test]
    fn ingests_valid_record_with_derived_fields() {
        let objects = parse_catalog_csv(&sample_csv(), ingestion_instant()).unwrap();
        assert_eq!(objects.len(), 1);
        let obj = &objects[0];
        assert_eq!(obj.name, "ISS (ZARYA)");
        assert_eq!(obj.launch_year, Some(1998));
        assert_eq!(obj.country, "ISS");
        assert_eq!(obj.regime, Regime::Leo);
        assert!(obj.altitude_km > 200.0 && obj.altitude_km < 600.0);
        assert!((obj.inclination_deg - 51.6416).abs() < 1e-6);
    }

    #[test]
    fn inclination_falls_back_to_element_set() {
        let csv = format!(
            "OBJECT_NAME,TLE_LINE1,TLE_LINE2,INCLINATION,LAUNCH_DATE,COUNTRY_CODE,OBJECT_TYPE,RCS_SIZE\n\
             ISS (ZARYA),{l1},{l2},,1998-11-20,ISS,PAYLOAD,LARGE\n",
            l1 = TLE1,
            l2 = TLE2
        );
        let objects = parse_catalog_csv(&csv, ingestion_instant()).unwrap();
        assert!((objects[0].inclination_deg - 51.6461).abs() < 1e-6);
    }

    #[test]
    fn malformed_rows_are_dropped_not_fatal() {
        let csv = format!(
            "{}GARBAGE,not a tle,also not a tle,,,,,\n",
            sample_csv()
        );
        let objects = parse_catalog_csv(&csv, ingestion_instant()).unwrap();
        assert_eq!(objects.len(), 1);
    }

    #[test]
    fn last_parsed_wins_on_name_collision() {
        let csv = format!(
            "OBJECT_NAME,TLE_LINE1,TLE_LINE2,INCLINATION,LAUNCH_DATE,COUNTRY_CODE,OBJECT_TYPE,RCS_SIZE\n\
             DUP,{l1},{l2},51.6,1998-11-20,US,PAYLOAD,LARGE\n\
             DUP,{l1},{l2},51.6,2008-01-01,CIS,DEBRIS,SMALL\n",
            l1 = TLE1,
            l2 = TLE2
        );
        let objects = parse_catalog_csv(&csv, ingestion_instant()).unwrap();
        assert_eq!(objects.len(), 2);
        let idx = find_by_name(&objects, "DUP").unwrap();
        assert_eq!(idx, 1);
        assert_eq!(objects[idx].object_type, "DEBRIS");
    }

    #[test]
    fn launch_year_parses_prefix_only() {
        assert_eq!(parse_launch_year("1998-11-20"), Some(1998));
        assert_eq!(parse_launch_year("2021"), Some(2021));
        assert_eq!(parse_launch_year(""), None);
        assert_eq!(parse_launch_year("n/a"), None);
    }
}
