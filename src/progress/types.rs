//! Progress evaluation type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default baseline policy year (SDG adoption)
pub const DEFAULT_BASELINE_YEAR: i32 = 2015;

/// Pace ratio at or above which an indicator is on track
pub const ON_TRACK_RATIO: f64 = 1.0;

/// Pace ratio at or above which an indicator needs acceleration
pub const ACCELERATION_RATIO: f64 = 0.5;

/// Classification of progress toward a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    OnTrack,
    NeedsAcceleration,
    OffTrack,
    /// No target, or not enough data to pace against one
    TrendOnly,
}

impl ProgressStatus {
    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            ProgressStatus::OnTrack => "on track",
            ProgressStatus::NeedsAcceleration => "needs acceleration",
            ProgressStatus::OffTrack => "off track",
            ProgressStatus::TrendOnly => "trend only",
        }
    }

    /// Whether a numeric pace check produced this status
    pub fn is_paced(&self) -> bool {
        !matches!(self, ProgressStatus::TrendOnly)
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of evaluating one series against one indicator.
///
/// Undefined numeric fields mean "cannot compute"; every combination of
/// inputs produces a complete value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressResult {
    pub baseline_year: Option<i32>,
    pub baseline_value: Option<f64>,
    pub latest_year: Option<i32>,
    pub latest_value: Option<f64>,
    /// `latest_value - baseline_value`
    pub delta: Option<f64>,
    /// Annual change needed from baseline to reach the target on time
    pub required_annual_rate: Option<f64>,
    /// Annual change actually observed since baseline
    pub observed_annual_rate: Option<f64>,
    /// `observed / required`, absent when the already-met rule applied
    pub pace_ratio: Option<f64>,
    /// Share of the baseline-to-target gap already closed
    pub target_progress: Option<f64>,
    pub status: ProgressStatus,
}

impl ProgressResult {
    /// Result for a series with no usable data
    pub fn empty() -> Self {
        Self {
            baseline_year: None,
            baseline_value: None,
            latest_year: None,
            latest_value: None,
            delta: None,
            required_annual_rate: None,
            observed_annual_rate: None,
            pace_ratio: None,
            target_progress: None,
            status: ProgressStatus::TrendOnly,
        }
    }

    /// Whether any data point was found
    pub fn has_data(&self) -> bool {
        self.latest_year.is_some()
    }
}

impl Default for ProgressResult {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&ProgressStatus::NeedsAcceleration).unwrap();
        assert_eq!(json, "\"needs_acceleration\"");
        let status: ProgressStatus = serde_json::from_str("\"trend_only\"").unwrap();
        assert_eq!(status, ProgressStatus::TrendOnly);
    }

    #[test]
    fn test_empty_result() {
        let result = ProgressResult::empty();
        assert_eq!(result.status, ProgressStatus::TrendOnly);
        assert!(!result.has_data());
        assert!(!result.status.is_paced());
    }
}
