// Boundary arithmetic for the sync engine.
//
// Everything here is pure: callers pass the wall-clock readings in, which
// keeps the timing rules testable without sleeping.

use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta, Timelike};

/// The instant `now` truncated to the start of its minute
pub fn top_of_minute(now: NaiveDateTime) -> NaiveDateTime {
    now - TimeDelta::seconds(i64::from(now.second()))
        - TimeDelta::nanoseconds(i64::from(now.nanosecond()))
}

/// Next multiple of `interval` seconds after the top of `now`'s minute that
/// is strictly later than the current whole second.
///
/// The offset is added as a duration, so a target second past 59 carries
/// into the next minute (and hour, and day) instead of producing an invalid
/// time. Intervals that do not divide 60 are fine: counting restarts at the
/// top of every minute the engine is armed in.
pub fn next_boundary(now: NaiveDateTime, interval: u32) -> NaiveDateTime {
    // zero is rejected before it reaches the engine
    let interval = u64::from(interval.max(1));
    let second = u64::from(now.second());
    let target_second = (second / interval + 1) * interval;
    top_of_minute(now) + TimeDelta::seconds(target_second as i64)
}

/// Lag applied after the boundary: none when hosting.
pub fn lag_compensation(host_mode: bool, non_host_lag: f64) -> Duration {
    if host_mode {
        Duration::ZERO
    } else {
        secs_to_duration(non_host_lag)
    }
}

/// `max(0, (target - now) + lag)`
pub fn wait_until(target: NaiveDateTime, now: NaiveDateTime, lag: Duration) -> Duration {
    let ahead = target.signed_duration_since(now);
    let lag = TimeDelta::from_std(lag).unwrap_or_else(|_| TimeDelta::zero());
    ahead
        .checked_add(&lag)
        .unwrap_or(ahead)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Rounded to the nearest nanosecond so decimal settings like `0.12`
/// come out as exactly 120ms.
pub(crate) fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_nanos((secs * 1e9).round() as u64)
}

/// A computed wait-then-press cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmPlan {
    /// Wall-clock time the boundary was computed from
    pub armed_at: NaiveDateTime,
    /// Boundary the press is aligned to
    pub target: NaiveDateTime,
    /// Compensation added after the boundary
    pub lag: Duration,
    /// How long to block before pressing
    pub wait: Duration,
}

impl ArmPlan {
    /// Compute a plan.
    ///
    /// `armed_at` fixes the boundary; `settled` is a second clock reading
    /// taken just before waiting so the cost of planning is absorbed.
    pub fn compute(
        armed_at: NaiveDateTime,
        settled: NaiveDateTime,
        interval: u32,
        lag: Duration,
    ) -> Self {
        let target = next_boundary(armed_at, interval);
        Self {
            armed_at,
            target,
            lag,
            wait: wait_until(target, settled, lag),
        }
    }

    /// Expected wall-clock time of the press
    pub fn fire_at(&self) -> NaiveDateTime {
        self.target + TimeDelta::from_std(self.lag).unwrap_or_else(|_| TimeDelta::zero())
    }
}
