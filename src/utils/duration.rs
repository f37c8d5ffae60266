//! Delay formatting utilities.
//!
//! Link delays are parsed from config files by `humantime_serde`; this
//! module renders them back in the compact form emulators expect
//! (e.g. "2ms", "500us").

use std::time::Duration;

/// Format a delay using the largest unit that represents it exactly
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use tiernet::utils::duration::format_delay;
///
/// assert_eq!(format_delay(Duration::from_millis(2)), "2ms");
/// assert_eq!(format_delay(Duration::from_micros(1500)), "1500us");
/// assert_eq!(format_delay(Duration::from_secs(1)), "1s");
/// ```
pub fn format_delay(delay: Duration) -> String {
    let nanos = delay.as_nanos();
    if nanos == 0 {
        return "0ms".to_string();
    }
    if nanos % 1_000_000_000 == 0 {
        format!("{}s", nanos / 1_000_000_000)
    } else if nanos % 1_000_000 == 0 {
        format!("{}ms", nanos / 1_000_000)
    } else if nanos % 1_000 == 0 {
        format!("{}us", nanos / 1_000)
    } else {
        format!("{}ns", nanos)
    }
}

/// Format a round-trip time in milliseconds with two decimals, as ping does
pub fn format_rtt(rtt: Duration) -> String {
    format!("{:.2} ms", rtt.as_secs_f64() * 1000.0)
}
