//! Dashboard result types

use crate::catalog::{Direction, GoalSummary, IndicatorDef};
use crate::errors::Result;
use crate::progress::{ProgressResult, ProgressStatus};
use crate::types::{CountryCode, Series, YearRange};
use serde::Serialize;
use std::collections::BTreeMap;

/// Series and progress for one indicator across the selected countries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorReport {
    pub indicator: IndicatorDef,
    pub years: YearRange,
    pub series: BTreeMap<CountryCode, Series>,
    pub progress: BTreeMap<CountryCode, ProgressResult>,
}

/// Latest data point for one country
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerEntry {
    pub country: CountryCode,
    pub year: i32,
    pub value: f64,
}

impl IndicatorReport {
    /// Progress for one country, if it was part of the selection
    pub fn progress_for(&self, country: &CountryCode) -> Option<&ProgressResult> {
        self.progress.get(country)
    }

    /// Latest value per country, best performer first.
    ///
    /// Countries without data are left out. Without a declared direction,
    /// higher values rank first.
    pub fn peer_snapshot(&self) -> Vec<PeerEntry> {
        let mut entries: Vec<PeerEntry> = self
            .series
            .iter()
            .filter_map(|(country, series)| {
                series.latest().map(|(year, value)| PeerEntry {
                    country: country.clone(),
                    year,
                    value,
                })
            })
            .collect();

        let ascending = self.indicator.direction == Some(Direction::Decrease);
        entries.sort_by(|a, b| {
            let by_value = if ascending {
                a.value.total_cmp(&b.value)
            } else {
                b.value.total_cmp(&a.value)
            };
            by_value.then_with(|| a.country.cmp(&b.country))
        });
        entries
    }
}

/// Outcome of one indicator inside a goal overview
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorOutcome {
    pub indicator: IndicatorDef,
    pub report: Result<IndicatorReport>,
}

/// Every indicator of a goal evaluated for a country selection
#[derive(Debug, Clone, PartialEq)]
pub struct GoalOverview {
    pub goal: GoalSummary,
    pub countries: Vec<CountryCode>,
    pub years: YearRange,
    pub outcomes: Vec<IndicatorOutcome>,
}

impl GoalOverview {
    /// Indicators that produced a report
    pub fn reports(&self) -> impl Iterator<Item = &IndicatorReport> {
        self.outcomes.iter().filter_map(|o| o.report.as_ref().ok())
    }

    /// Number of indicators whose fetch failed
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.report.is_err()).count()
    }

    /// Status counts for one country, in display order
    pub fn status_tally(&self, country: &CountryCode) -> Vec<(ProgressStatus, usize)> {
        [
            ProgressStatus::OnTrack,
            ProgressStatus::NeedsAcceleration,
            ProgressStatus::OffTrack,
            ProgressStatus::TrendOnly,
        ]
        .into_iter()
        .map(|status| {
            let count = self
                .reports()
                .filter_map(|r| r.progress_for(country))
                .filter(|p| p.status == status)
                .count();
            (status, count)
        })
        .collect()
    }
}
