//! Human-readable run durations.

const MILLIS_PER_SECOND: f64 = 1_000.0;
const MILLIS_PER_MINUTE: f64 = 60.0 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: f64 = 60.0 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: f64 = 24.0 * MILLIS_PER_HOUR;

/// Format an elapsed time in milliseconds using the coarsest unit that keeps
/// the magnitude readable.
///
/// Seconds and minutes escalate at 60, hours at 24, days never. The
/// comparison is made on the magnitude after rounding to one decimal, so
/// `59_960` ms reads as `"1.0 Min"` rather than `"60.0 Sec"`.
///
/// ```
/// use loadreport_core::format_duration;
///
/// assert_eq!(format_duration(45_000), "45.0 Sec");
/// assert_eq!(format_duration(125_000), "2.1 Min");
/// ```
pub fn format_duration(millis: u64) -> String {
    let millis = millis as f64;

    let seconds = round_tenths(millis / MILLIS_PER_SECOND);
    if seconds < 60.0 {
        return format!("{:.1} Sec", seconds);
    }

    let minutes = round_tenths(millis / MILLIS_PER_MINUTE);
    if minutes < 60.0 {
        return format!("{:.1} Min", minutes);
    }

    let hours = round_tenths(millis / MILLIS_PER_HOUR);
    if hours < 24.0 {
        return format!("{:.1} Hrs", hours);
    }

    format!("{:.1} Days", round_tenths(millis / MILLIS_PER_DAY))
}

// Half away from zero; `{:.1}` alone rounds half to even.
fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
