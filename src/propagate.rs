//! Position resolution: element set + simulated time -> geodetic point.
//!
//! Propagation is delegated to the sgp4 crate; a failed propagation marks
//! the object unresolvable for that tick and is silently skipped by every
//! consumer. The inertial-to-geodetic conversion rotates the TEME position
//! by Greenwich Mean Sidereal Time and has no failure mode of its own.

use std::f64::consts::PI;

use chrono::{DateTime, TimeZone, Utc};

use crate::catalog::TrackedObject;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;
const GMST_BASE_DEG: f64 = 280.46061837;
const GMST_ROTATION_PER_DAY: f64 = 360.98564736629;
const GMST_CORRECTION: f64 = 0.000387933;
const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy)]
pub struct GeodeticPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub altitude_km: f64,
}

/// Greenwich Mean Sidereal Time in radians, normalized to [0, 2π).
pub fn greenwich_mean_sidereal_time(timestamp: DateTime<Utc>) -> f64 {
    let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
    let days_since_j2000 =
        (timestamp - j2000).num_milliseconds() as f64 / (1000.0 * SECONDS_PER_DAY);
    let centuries = days_since_j2000 / DAYS_PER_JULIAN_CENTURY;
    let gmst_degrees = GMST_BASE_DEG
        + GMST_ROTATION_PER_DAY * days_since_j2000
        + GMST_CORRECTION * centuries * centuries
        - centuries * centuries * centuries / 38_710_000.0;
    gmst_degrees.rem_euclid(360.0).to_radians()
}

/// Rotate a TEME position (km) into Earth-fixed coordinates and convert to
/// geodetic latitude/longitude/altitude on a spherical Earth.
pub fn teme_to_geodetic(position_km: [f64; 3], time: DateTime<Utc>) -> GeodeticPoint {
    let [x, y, z] = position_km;
    let r = (x * x + y * y + z * z).sqrt();
    let gmst = greenwich_mean_sidereal_time(time);
    let lat_deg = (z / r).asin().to_degrees();
    let mut lon = y.atan2(x) - gmst;
    lon = (lon + PI).rem_euclid(2.0 * PI) - PI;
    GeodeticPoint {
        lat_deg,
        lon_deg: lon.to_degrees(),
        altitude_km: r - EARTH_RADIUS_KM,
    }
}

/// Resolve one object at the given simulated time. `None` means the object
/// is unresolvable for this tick (decayed orbit, degenerate elements,
/// numerical failure). Expected and routine, never an error.
pub fn resolve(object: &TrackedObject, time: DateTime<Utc>) -> Option<GeodeticPoint> {
    let minutes = time.timestamp_millis() as f64 / 60_000.0 - object.epoch_minutes;
    let prediction = object
        .constants
        .propagate(sgp4::MinutesSinceEpoch(minutes))
        .ok()?;
    Some(teme_to_geodetic(prediction.position, time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn gmst_matches_base_angle_at_j2000_noon() {
        let t = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        let expected = GMST_BASE_DEG.to_radians();
        assert!((greenwich_mean_sidereal_time(t) - expected).abs() < 1e-9);
    }

    #[test]
    fn gmst_advances_slightly_faster_than_solar_time() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let delta =
            (greenwich_mean_sidereal_time(t1) - greenwich_mean_sidereal_time(t0)).rem_euclid(2.0 * PI);
        // ~0.9856 degrees of extra rotation per solar day.
        let expected = (GMST_ROTATION_PER_DAY - 360.0).to_radians();
        assert!((delta - expected).abs() < 1e-6);
    }

    #[test]
    fn geodetic_point_under_gmst_meridian_has_zero_longitude() {
        let t = Utc.with_ymd_and_hms(2026, 6, 1, 6, 30, 0).unwrap();
        let gmst = greenwich_mean_sidereal_time(t);
        let r = EARTH_RADIUS_KM + 400.0;
        let p = teme_to_geodetic([r * gmst.cos(), r * gmst.sin(), 0.0], t);
        assert!(p.lat_deg.abs() < 1e-9);
        assert!(p.lon_deg.abs() < 1e-9);
        assert!((p.altitude_km - 400.0).abs() < 1e-9);
    }

    #[test]
    fn longitude_wraps_into_signed_half_turn() {
        let t = Utc.with_ymd_and_hms(2026, 6, 1, 6, 30, 0).unwrap();
        let gmst = greenwich_mean_sidereal_time(t);
        let r = EARTH_RADIUS_KM + 800.0;
        let inertial = gmst + 200.0_f64.to_radians();
        let p = teme_to_geodetic([r * inertial.cos(), r * inertial.sin(), 0.0], t);
        assert!((p.lon_deg - (-160.0)).abs() < 1e-6);
    }

    #[test]
    fn resolves_near_epoch() {
        let objects =
            catalog::parse_catalog_csv(&catalog::tests::sample_csv(), catalog::tests::ingestion_instant())
                .unwrap();
        let p = resolve(&objects[0], catalog::tests::ingestion_instant()).unwrap();
        assert!(p.lat_deg.abs() <= 52.0); // bounded by inclination
        assert!(p.lon_deg >= -180.0 && p.lon_deg <= 180.0);
        assert!(p.altitude_km > 200.0 && p.altitude_km < 600.0);
    }

    #[test]
    fn propagation_failure_is_none_not_panic() {
        // A very low orbit with an extreme drag term decays quickly; far
        // past epoch the propagator reports an error and the object is
        // unresolvable for the tick.
        let elements: sgp4::Elements = serde_json::from_str(
            r#"{
                "OBJECT_NAME": "DECAYER",
                "OBJECT_ID": "2020-001A",
                "EPOCH": "2020-01-01T00:00:00",
                "MEAN_MOTION": 16.4,
                "ECCENTRICITY": 0.02,
                "INCLINATION": 51.6,
                "RA_OF_ASC_NODE": 0.0,
                "ARG_OF_PERICENTER": 0.0,
                "MEAN_ANOMALY": 0.0,
                "EPHEMERIS_TYPE": 0,
                "CLASSIFICATION_TYPE": "U",
                "NORAD_CAT_ID": 99999,
                "ELEMENT_SET_NO": 999,
                "REV_AT_EPOCH": 1,
                "BSTAR": 0.5,
                "MEAN_MOTION_DOT": 0.0,
                "MEAN_MOTION_DDOT": 0.0
            }"#,
        )
        .unwrap();
        let constants = sgp4::Constants::from_elements(&elements).unwrap();
        let epoch_minutes = elements.datetime.and_utc().timestamp() as f64 / 60.0;
        let object = TrackedObject {
            name: "DECAYER".to_string(),
            constants,
            epoch_minutes,
            altitude_km: 150.0,
            inclination_deg: 51.6,
            launch_year: Some(2020),
            country: String::new(),
            object_type: String::new(),
            rcs_size: String::new(),
            regime: crate::catalog::Regime::Leo,
        };
        let far = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert!(resolve(&object, far).is_none());
    }
}
