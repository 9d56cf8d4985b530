//! Uptime rendering for the stats endpoint.

use std::time::Duration;

/// Render a duration as a compact uptime string.
///
/// Shows at most three units, starting from the largest non-zero one:
/// `2d 3h 4m`, `3h 4m 5s`, `4m 5s`, or `5s`.
#[allow(clippy::arithmetic_side_effects)]
pub fn format_uptime(uptime: Duration) -> String {
    let seconds = uptime.as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{days}d {}h {}m", hours % 24, minutes % 60)
    } else if hours > 0 {
        format!("{hours}h {}m {}s", minutes % 60, seconds % 60)
    } else if minutes > 0 {
        format!("{minutes}m {}s", seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_largest_unit() {
        assert_eq!(format_uptime(Duration::ZERO), "0s");
        assert_eq!(format_uptime(Duration::from_millis(59_999)), "59s");
        assert_eq!(format_uptime(Duration::from_secs(65)), "1m 5s");
        assert_eq!(format_uptime(Duration::from_secs(3_725)), "1h 2m 5s");
        assert_eq!(format_uptime(Duration::from_secs(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5)), "2d 3h 4m");
    }
}
