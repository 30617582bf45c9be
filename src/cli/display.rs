//! Terminal formatting helpers
//!
//! Number formatting, coloured status labels and the fetch spinner.

use crate::progress::ProgressStatus;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Placeholder for a value that cannot be computed
pub const MISSING: &str = "—";

/// Spinner tick interval
const TICK: Duration = Duration::from_millis(100);

/// Two decimals with thousands separators, or the placeholder
pub fn fmt_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => group_thousands(&format!("{:.2}", v)),
        _ => MISSING.to_string(),
    }
}

/// Like `fmt_value` with an explicit `+` on positive numbers
pub fn fmt_delta(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => format!("+{}", fmt_value(Some(v))),
        other => fmt_value(other),
    }
}

/// `2015: 130.00` style year/value pair
pub fn fmt_point(year: Option<i32>, value: Option<f64>) -> String {
    match (year, value) {
        (Some(y), Some(_)) => format!("{}: {}", y, fmt_value(value)),
        _ => MISSING.to_string(),
    }
}

/// Share of the gap closed as a percentage
pub fn fmt_percent(fraction: Option<f64>) -> String {
    match fraction {
        Some(f) if f.is_finite() => format!("{:.0}%", f * 100.0),
        _ => MISSING.to_string(),
    }
}

fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Coloured status label
pub fn status_label(status: ProgressStatus) -> ColoredString {
    let label = status.label();
    match status {
        ProgressStatus::OnTrack => label.green().bold(),
        ProgressStatus::NeedsAcceleration => label.yellow().bold(),
        ProgressStatus::OffTrack => label.red().bold(),
        ProgressStatus::TrendOnly => label.dimmed(),
    }
}

/// Truncate to at most `max` characters, marking the cut with an ellipsis
pub fn short(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

/// Spinner shown while fetching; hidden when `visible` is false
pub fn spinner(message: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(TICK);
    pb
}
