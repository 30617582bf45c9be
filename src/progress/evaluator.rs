//! Progress evaluator
//!
//! Linear pace heuristic against a target year:
//! - Baseline: first usable observation at or after the policy year
//! - Latest: last usable observation
//! - required = (target - baseline) / (target_year - baseline_year)
//! - observed = (latest - baseline) / (latest_year - baseline_year)
//! - pace = observed / required, so moving the way the target lies is
//!   positive whether that way is up or down
//!
//! Pure and total: no input makes it fail.

use crate::catalog::{Direction, IndicatorDef};
use crate::progress::types::{
    ProgressResult, ProgressStatus, ACCELERATION_RATIO, DEFAULT_BASELINE_YEAR, ON_TRACK_RATIO,
};
use crate::types::{CountryCode, Series};
use std::collections::BTreeMap;

/// Evaluate one series against one indicator
pub fn evaluate(series: &Series, indicator: &IndicatorDef, baseline_policy_year: i32) -> ProgressResult {
    let mut result = ProgressResult::empty();

    let latest = series.latest();
    if let Some((year, value)) = latest {
        result.latest_year = Some(year);
        result.latest_value = Some(value);
    }

    let ((b_year, b_value), (l_year, l_value)) =
        match (series.first_at_or_after(baseline_policy_year), latest) {
            (Some(baseline), Some(latest)) => (baseline, latest),
            _ => return result,
        };

    result.baseline_year = Some(b_year);
    result.baseline_value = Some(b_value);
    result.delta = Some(l_value - b_value);

    let target = match indicator.target_value.filter(|t| t.is_finite()) {
        Some(t) => t,
        None => return result,
    };

    // zero-length spans cannot be paced
    if b_year >= indicator.target_year || b_year >= l_year {
        return result;
    }

    let required = (target - b_value) / f64::from(indicator.target_year - b_year);
    let observed = (l_value - b_value) / f64::from(l_year - b_year);
    result.required_annual_rate = Some(required);
    result.observed_annual_rate = Some(observed);
    result.target_progress = (target != b_value).then(|| (l_value - b_value) / (target - b_value));

    result.status = if required == 0.0 {
        already_met_status(l_value, target, indicator.direction)
    } else {
        let ratio = observed / required;
        result.pace_ratio = Some(ratio);
        classify_pace(ratio)
    };

    result
}

/// Evaluate with the default 2015 baseline policy
pub fn evaluate_default(series: &Series, indicator: &IndicatorDef) -> ProgressResult {
    evaluate(series, indicator, DEFAULT_BASELINE_YEAR)
}

/// Evaluate every country's series for one indicator
pub fn evaluate_all(
    series: &BTreeMap<CountryCode, Series>,
    indicator: &IndicatorDef,
    baseline_policy_year: i32,
) -> BTreeMap<CountryCode, ProgressResult> {
    series
        .iter()
        .map(|(country, s)| (country.clone(), evaluate(s, indicator, baseline_policy_year)))
        .collect()
}

/// Map a pace ratio to a status
pub fn classify_pace(ratio: f64) -> ProgressStatus {
    if ratio >= ON_TRACK_RATIO {
        ProgressStatus::OnTrack
    } else if ratio >= ACCELERATION_RATIO {
        ProgressStatus::NeedsAcceleration
    } else {
        ProgressStatus::OffTrack
    }
}

/// Status when the target was already met at baseline: on track unless
/// the latest value has slipped past the target the wrong way
fn already_met_status(latest: f64, target: f64, direction: Option<Direction>) -> ProgressStatus {
    let slipped = match direction {
        Some(dir) => dir.is_adverse(target, latest),
        // without a direction any departure from the target counts
        None => (latest - target).abs() > f64::EPSILON * target.abs().max(1.0),
    };

    if slipped {
        ProgressStatus::OffTrack
    } else {
        ProgressStatus::OnTrack
    }
}
