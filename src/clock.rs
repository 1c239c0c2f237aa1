//! Simulated clock with a user-adjustable time warp.
//!
//! Virtual time advances by `real_dt * warp` per tick, independently of
//! wall-clock rate. The epoch is fixed at construction and never reset.

use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_WARP: f64 = 100.0;

pub struct SimClock {
    epoch: DateTime<Utc>,
    /// Simulated seconds since `epoch`. Signed: a negative warp runs
    /// simulated time backwards while the clock itself keeps ticking.
    elapsed: f64,
    warp: f64,
}

impl SimClock {
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self {
            epoch,
            elapsed: 0.0,
            warp: DEFAULT_WARP,
        }
    }

    /// Advance by `real_dt_secs` of wall-clock time, scaled by the current
    /// warp factor. Warp changes apply from the next call, never
    /// retroactively.
    pub fn advance(&mut self, real_dt_secs: f64) {
        self.elapsed += real_dt_secs * self.warp;
    }

    pub fn warp(&self) -> f64 {
        self.warp
    }

    pub fn set_warp(&mut self, warp: f64) {
        self.warp = warp;
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.epoch + Duration::microseconds((self.elapsed * 1e6) as i64)
    }

    pub fn format_utc(&self) -> String {
        self.now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock() -> SimClock {
        SimClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn advance_scales_by_warp() {
        let mut c = clock();
        c.set_warp(100.0);
        c.advance(0.5);
        assert_eq!(c.elapsed_secs(), 50.0);
        c.advance(0.25);
        assert_eq!(c.elapsed_secs(), 75.0);
    }

    #[test]
    fn warp_change_is_not_retroactive() {
        let mut c = clock();
        c.set_warp(10.0);
        c.advance(1.0);
        c.set_warp(1000.0);
        c.advance(1.0);
        assert_eq!(c.elapsed_secs(), 10.0 + 1000.0);
    }

    #[test]
    fn negative_warp_runs_backwards() {
        let mut c = clock();
        c.set_warp(-60.0);
        c.advance(2.0);
        assert_eq!(c.elapsed_secs(), -120.0);
    }

    #[test]
    fn zero_dt_is_a_no_op() {
        let mut c = clock();
        c.advance(0.0);
        assert_eq!(c.elapsed_secs(), 0.0);
        assert_eq!(c.now(), c.epoch + Duration::zero());
    }

    #[test]
    fn now_tracks_elapsed() {
        let mut c = clock();
        c.set_warp(1.0);
        c.advance(90.0);
        assert_eq!(
            c.now(),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 1, 30).unwrap()
        );
    }
}
