//! Progress service
//!
//! The single request path: catalog lookup, cached fetch, normalization and
//! evaluation. Indicators of a goal are fetched concurrently, bounded by a
//! semaphore; each indicator succeeds or fails on its own.

use crate::cache::SeriesCache;
use crate::catalog::{IndicatorCatalog, IndicatorDef};
use crate::dashboard::types::{GoalOverview, IndicatorOutcome, IndicatorReport};
use crate::errors::{MonitorError, Result};
use crate::fetch::{RawRecord, SeriesRequest, SeriesSource};
use crate::normalize::normalize;
use crate::progress::{evaluate_all, DEFAULT_BASELINE_YEAR};
use crate::types::{CountryCode, Series, YearRange};
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Maximum concurrent indicator fetches
pub const MAX_PARALLEL_FETCHES: usize = 4;

/// Shared engine behind every view
pub struct ProgressService {
    catalog: Arc<IndicatorCatalog>,
    source: Arc<dyn SeriesSource>,
    cache: Arc<SeriesCache>,
    semaphore: Arc<Semaphore>,
    baseline_year: i32,
}

impl ProgressService {
    /// Create a service with default parallelism and baseline year
    pub fn new(catalog: IndicatorCatalog, source: Arc<dyn SeriesSource>, cache: Arc<SeriesCache>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            source,
            cache,
            semaphore: Arc::new(Semaphore::new(MAX_PARALLEL_FETCHES)),
            baseline_year: DEFAULT_BASELINE_YEAR,
        }
    }

    /// Bound on concurrent fetches (minimum 1)
    pub fn with_parallelism(mut self, max_parallel: usize) -> Self {
        self.semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
        self
    }

    /// Baseline policy year used for evaluation
    pub fn with_baseline_year(mut self, year: i32) -> Self {
        self.baseline_year = year;
        self
    }

    pub fn catalog(&self) -> &IndicatorCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    pub fn baseline_year(&self) -> i32 {
        self.baseline_year
    }

    /// Normalized series for one indicator, restricted to `years`
    pub async fn series(
        &self,
        code: &str,
        countries: &[CountryCode],
        years: YearRange,
    ) -> Result<BTreeMap<CountryCode, Series>> {
        let indicator = self.catalog.indicator(code)?;
        self.load_series(indicator, countries, years).await
    }

    /// Series plus progress for one indicator
    pub async fn indicator_report(
        &self,
        code: &str,
        countries: &[CountryCode],
        years: YearRange,
    ) -> Result<IndicatorReport> {
        let indicator = self.catalog.indicator(code)?;
        self.report(indicator, countries, years).await
    }

    /// Every indicator of a goal, fetched concurrently.
    ///
    /// Fails only for an unknown goal or an empty country selection;
    /// per-indicator failures are carried in the outcomes.
    pub async fn goal_overview(
        &self,
        goal: u8,
        countries: &[CountryCode],
        years: YearRange,
    ) -> Result<GoalOverview> {
        let indicators = self.catalog.indicators_for_goal(goal)?;
        let summary = self
            .catalog
            .goals()
            .into_iter()
            .find(|g| g.id == goal)
            .ok_or(MonitorError::UnknownGoal(goal))?;
        ensure_countries(countries)?;

        let purged = self.cache.purge_expired();
        if purged > 0 {
            debug!(purged, "dropped expired cache entries");
        }
        info!(goal, indicators = indicators.len(), countries = countries.len(), "evaluating goal");

        let outcomes = join_all(indicators.iter().map(|indicator| async move {
            let report = self.report(indicator, countries, years).await;
            if let Err(e) = &report {
                warn!(indicator = %indicator.code, error = %e, "indicator failed");
            }
            IndicatorOutcome {
                indicator: indicator.clone(),
                report,
            }
        }))
        .await;

        Ok(GoalOverview {
            goal: summary,
            countries: countries.to_vec(),
            years,
            outcomes,
        })
    }

    /// Series plus progress for an indicator definition, catalogued or not
    pub async fn report(
        &self,
        indicator: &IndicatorDef,
        countries: &[CountryCode],
        years: YearRange,
    ) -> Result<IndicatorReport> {
        let series = self.load_series(indicator, countries, years).await?;
        let progress = evaluate_all(&series, indicator, self.baseline_year);

        Ok(IndicatorReport {
            indicator: indicator.clone(),
            years,
            series,
            progress,
        })
    }

    async fn load_series(
        &self,
        indicator: &IndicatorDef,
        countries: &[CountryCode],
        years: YearRange,
    ) -> Result<BTreeMap<CountryCode, Series>> {
        ensure_countries(countries)?;
        let request = SeriesRequest::new(countries, &indicator.code, years).with_source(indicator.source);
        let records = self.fetch_cached(&request).await?;
        debug!(indicator = %indicator.code, records = records.len(), "records loaded");

        Ok(normalize(&records, countries)
            .into_iter()
            .map(|(country, series)| (country, series.within(years)))
            .collect())
    }

    async fn fetch_cached(&self, request: &SeriesRequest) -> Result<Arc<Vec<RawRecord>>> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| MonitorError::NetworkError("fetch pool closed".to_string()))?;

        let source = self.source.clone();
        self.cache
            .get_or_fetch(request, || async move { source.fetch(request).await.map(Arc::new) })
            .await
    }
}

fn ensure_countries(countries: &[CountryCode]) -> Result<()> {
    if countries.is_empty() {
        return Err(MonitorError::InvalidCountry("no countries selected".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::catalog::Direction;
    use crate::types::DataSource;
    use std::time::Duration;
    use crate::progress::ProgressStatus;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubSource {
        calls: AtomicUsize,
        failing: &'static str,
    }

    #[async_trait]
    impl SeriesSource for StubSource {
        async fn fetch(&self, request: &SeriesRequest) -> Result<Vec<RawRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.indicator() == self.failing {
                return Err(MonitorError::NetworkError("connection reset".to_string()));
            }
            Ok(vec![
                RawRecord::new("IND", json!("2015"), json!(130.0)),
                RawRecord::new("IND", json!("2020"), json!(103.0)),
                RawRecord::new("IND", json!("1999"), json!(400.0)),
            ])
        }
    }

    fn catalog() -> IndicatorCatalog {
        IndicatorCatalog::from_goals(vec![(
            3,
            vec![
                IndicatorDef::new("SH.STA.MMRT", "MMR")
                    .with_target(70.0, 2030)
                    .with_direction(Direction::Decrease)
                    .with_sdg_target("3.1"),
                IndicatorDef::new("SH.DYN.MORT", "U5MR").with_sdg_target("3.2"),
            ],
        )])
        .unwrap()
    }

    fn build_service(failing: &'static str) -> (ProgressService, Arc<StubSource>) {
        let source = Arc::new(StubSource {
            calls: AtomicUsize::new(0),
            failing,
        });
        let service = ProgressService::new(catalog(), source.clone(), Arc::new(SeriesCache::new()));
        (service, source)
    }

    fn ind() -> Vec<CountryCode> {
        vec![CountryCode::new("IND").unwrap()]
    }

    #[tokio::test]
    async fn test_indicator_report_uses_cache() {
        let (service, source) = build_service("");
        let years = YearRange::new(2000, 2023).unwrap();

        let report = service.indicator_report("SH.STA.MMRT", &ind(), years).await.unwrap();
        assert_eq!(report.progress[&ind()[0]].status, ProgressStatus::OnTrack);
        // 1999 falls outside the window
        assert_eq!(report.series[&ind()[0]].len(), 2);

        service.indicator_report("SH.STA.MMRT", &ind(), years).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_goal_overview_isolates_failures() {
        let (service, _source) = build_service("SH.DYN.MORT");
        let years = YearRange::new(2000, 2023).unwrap();

        let overview = service.goal_overview(3, &ind(), years).await.unwrap();
        assert_eq!(overview.outcomes.len(), 2);
        assert_eq!(overview.failure_count(), 1);
        assert_eq!(overview.reports().count(), 1);
    }

    #[tokio::test]
    async fn test_goal_overview_purges_expired_entries() {
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(SeriesCache::with_clock(Duration::from_secs(60), clock.clone()));
        let source = Arc::new(StubSource {
            calls: AtomicUsize::new(0),
            failing: "",
        });
        let service = ProgressService::new(catalog(), source, cache.clone());

        let old_window = YearRange::new(1990, 2010).unwrap();
        service.indicator_report("SH.STA.MMRT", &ind(), old_window).await.unwrap();
        assert_eq!(cache.len().await, 1);

        clock.advance(Duration::from_secs(61));
        service
            .goal_overview(3, &ind(), YearRange::new(2000, 2023).unwrap())
            .await
            .unwrap();
        // the expired 1990-2010 entry is gone, the goal's two are stored
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_request_carries_indicator_source() {
        struct SourceCheck;

        #[async_trait]
        impl SeriesSource for SourceCheck {
            async fn fetch(&self, request: &SeriesRequest) -> Result<Vec<RawRecord>> {
                assert_eq!(request.source(), DataSource::UnSdg);
                Ok(vec![RawRecord::new("IND", json!(2016), json!("4.5"))])
            }
        }

        let catalog = IndicatorCatalog::from_goals(vec![(
            3,
            vec![IndicatorDef::new("SH_STA_MORT", "MMR").with_source(DataSource::UnSdg)],
        )])
        .unwrap();
        let service = ProgressService::new(catalog, Arc::new(SourceCheck), Arc::new(SeriesCache::new()));

        let report = service
            .indicator_report("SH_STA_MORT", &ind(), YearRange::new(2000, 2023).unwrap())
            .await
            .unwrap();
        assert_eq!(report.series[&ind()[0]].len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_inputs() {
        let (service, _source) = build_service("");
        let years = YearRange::new(2000, 2023).unwrap();

        assert_eq!(
            service.goal_overview(18, &ind(), years).await.unwrap_err(),
            MonitorError::UnknownGoal(18)
        );
        assert!(matches!(
            service.indicator_report("NOPE", &ind(), years).await,
            Err(MonitorError::UnknownIndicator(_))
        ));
        assert!(matches!(
            service.indicator_report("SH.STA.MMRT", &[], years).await,
            Err(MonitorError::InvalidCountry(_))
        ));
    }
}
