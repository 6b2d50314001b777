use chrono::{DateTime, Duration, Timelike, Utc};

// ============================================================================
// Period Arithmetic
// ============================================================================

/// Length of the finest planning resolution
pub const QUARTER_MINUTES: i64 = 15;

/// Quarters per hour
pub const PERIODS_PER_HOUR: usize = 4;

/// Safety margin subtracted from the time budget of one planning cycle
pub const EXECUTION_LIMIT_SECONDS_BUFFER: i64 = 30;

/// Shortest time budget worth starting a planning cycle with
pub const EXECUTION_LIMIT_SECONDS_MINIMUM: i64 = 60;

/// Duration of one quarter
pub fn quarter() -> Duration {
    Duration::minutes(QUARTER_MINUTES)
}

/// Round `time` down to the start of its quarter-hour
pub fn round_down_to_quarter(time: DateTime<Utc>) -> DateTime<Utc> {
    let into_quarter =
        i64::from(time.minute()) % QUARTER_MINUTES * 60 + i64::from(time.second());
    time - Duration::seconds(into_quarter) - Duration::nanoseconds(i64::from(time.nanosecond()))
}

/// Quarters left until the next full hour; 0 when `time` is on the hour
pub fn quarters_remaining_in_hour(time: DateTime<Utc>) -> usize {
    let quarter_of_hour = (time.minute() as usize) / QUARTER_MINUTES as usize;
    (PERIODS_PER_HOUR - quarter_of_hour) % PERIODS_PER_HOUR
}

/// Energy (Wh) delivered over one quarter at constant `power` (W)
pub fn to_energy(power: i32) -> i32 {
    power / PERIODS_PER_HOUR as i32
}

/// Constant power (W) that delivers `energy` (Wh) over one quarter
pub fn to_power(energy: i32) -> i32 {
    energy.saturating_mul(PERIODS_PER_HOUR as i32)
}

// ============================================================================
// Planning Budget
// ============================================================================

/// Seconds a planning cycle started at `now` may run.
///
/// The budget ends [`EXECUTION_LIMIT_SECONDS_BUFFER`] before the next
/// quarter. If that leaves less than [`EXECUTION_LIMIT_SECONDS_MINIMUM`],
/// the following quarter is used instead.
pub fn execution_limit_seconds(now: DateTime<Utc>) -> i64 {
    let deadline = round_down_to_quarter(now) + quarter()
        - Duration::seconds(EXECUTION_LIMIT_SECONDS_BUFFER);
    let seconds = (deadline - now).num_seconds();
    if seconds >= EXECUTION_LIMIT_SECONDS_MINIMUM {
        seconds
    } else {
        (deadline + quarter() - now).num_seconds()
    }
}
