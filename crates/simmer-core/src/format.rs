//! Clock formatting helpers for presentation layers.

use crate::catalog::SECONDS_PER_MINUTE;

/// Format seconds as `mm:ss`. Minutes are not wrapped at 60, so a 75 minute
/// phase reads `75:00`.
pub fn clock(total_secs: u32) -> String {
    let minutes = total_secs / SECONDS_PER_MINUTE;
    let seconds = total_secs % SECONDS_PER_MINUTE;
    format!("{minutes:02}:{seconds:02}")
}

/// Saturates instead of overflowing on absurd inputs.
pub fn minutes_to_seconds(minutes: u32) -> u32 {
    minutes.saturating_mul(SECONDS_PER_MINUTE)
}
