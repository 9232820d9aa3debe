//! Countdown formatting
//!
//! Renders a signed minutes-until value as a short human-readable string.
//! Past events read `"5 min ago"`, the current minute reads `"Now"`, and
//! anything under an hour reads `"in 45 min"`. From one hour on the caller
//! picks between the compact (`"in 2h 5m"`) and verbose
//! (`"in 2 hours 5 minutes"`) presentation.

use crate::types::CountdownStyle;

/// Format minutes-until as countdown text
pub fn format_countdown(minutes_until: i64, style: CountdownStyle) -> String {
    if minutes_until < 0 {
        return format!("{} min ago", minutes_until.unsigned_abs());
    }
    if minutes_until == 0 {
        return "Now".to_string();
    }
    if minutes_until < 60 {
        return format!("in {} min", minutes_until);
    }

    let hours = minutes_until / 60;
    let minutes = minutes_until % 60;

    match style {
        CountdownStyle::Compact if minutes == 0 => format!("in {}h", hours),
        CountdownStyle::Compact => format!("in {}h {}m", hours, minutes),
        CountdownStyle::Verbose if minutes == 0 => {
            format!("in {} {}", hours, plural(hours, "hour"))
        }
        CountdownStyle::Verbose => format!(
            "in {} {} {} {}",
            hours,
            plural(hours, "hour"),
            minutes,
            plural(minutes, "minute")
        ),
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{}s", unit)
    }
}
