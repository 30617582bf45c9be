//! Property tests for the normalizer, evaluator and cache

use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use sdgprogress::cache::{ManualClock, TtlCache};
use sdgprogress::catalog::{Direction, IndicatorDef};
use sdgprogress::fetch::RawRecord;
use sdgprogress::normalize::normalize;
use sdgprogress::progress::evaluate;
use sdgprogress::types::{CountryCode, Series};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

const COUNTRIES: [&str; 3] = ["IND", "PAK", "NPL"];

fn ind() -> CountryCode {
    CountryCode::new("IND").unwrap()
}

/// `(year offset, value)` pairs mapped onto 1990..=2037
fn to_points(raw: &[(u8, i16)]) -> Vec<(i32, f64)> {
    raw.iter()
        .map(|&(offset, value)| (1990 + i32::from(offset % 48), f64::from(value) / 4.0))
        .collect()
}

/// Raw records with unique (country, year) keys; string and numeric encodings mixed
fn to_records(raw: &[(u8, u8, Option<i16>)]) -> Vec<RawRecord> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter(|&&(country, year, _)| seen.insert((country % 3, year % 40)))
        .map(|&(country, year, value)| {
            let iso3 = COUNTRIES[usize::from(country % 3)];
            let year = 1990 + i32::from(year % 40);
            let date: Value = if year % 2 == 0 { json!(year.to_string()) } else { json!(year) };
            let value = match value {
                Some(v) if v % 5 == 0 => json!(v.to_string()),
                Some(v) => json!(f64::from(v) / 10.0),
                None => Value::Null,
            };
            RawRecord::new(iso3, date, value)
        })
        .collect()
}

#[quickcheck]
fn evaluation_is_deterministic(raw: Vec<(u8, i16)>, target: i16, policy_offset: u8) -> bool {
    let series = Series::from_values(ind(), &to_points(&raw));
    let def = IndicatorDef::new("X", "x").with_target(f64::from(target), 2030);
    let policy_year = 2000 + i32::from(policy_offset % 30);

    let first = evaluate(&series, &def, policy_year);
    let second = evaluate(&series, &def, policy_year);
    format!("{:?}", first) == format!("{:?}", second)
}

#[quickcheck]
fn baseline_is_first_year_at_or_after_policy(raw: Vec<(u8, i16)>) -> bool {
    let series = Series::from_values(ind(), &to_points(&raw));
    let def = IndicatorDef::new("X", "x").with_target(0.0, 2030).with_direction(Direction::Decrease);
    let result = evaluate(&series, &def, 2015);

    let expected = series.usable().map(|(year, _)| year).filter(|&y| y >= 2015).min();
    result.baseline_year == expected && result.baseline_year.map_or(true, |y| y >= 2015)
}

#[quickcheck]
fn baseline_never_after_latest(raw: Vec<(u8, i16)>) -> bool {
    let series = Series::from_values(ind(), &to_points(&raw));
    let result = evaluate(&series, &IndicatorDef::new("X", "x").with_target(1.0, 2030), 2015);

    match (result.baseline_year, result.latest_year) {
        (Some(b), Some(l)) => b <= l,
        _ => true,
    }
}

#[quickcheck]
fn normalize_is_order_independent(raw: Vec<(u8, u8, Option<i16>)>, rotation: usize) -> TestResult {
    let records = to_records(&raw);
    if records.is_empty() {
        return TestResult::discard();
    }
    let requested: Vec<CountryCode> = COUNTRIES.iter().map(|c| CountryCode::new(c).unwrap()).collect();

    let mut shuffled = records.clone();
    shuffled.rotate_left(rotation % records.len());
    shuffled.reverse();

    let once = normalize(&records, &requested);
    let again = normalize(&records, &requested);
    let reordered = normalize(&shuffled, &requested);

    TestResult::from_bool(once == again && once == reordered)
}

#[quickcheck]
fn normalized_series_are_sorted_and_unique(raw: Vec<(u8, u8, Option<i16>)>) -> bool {
    let records = to_records(&raw);
    normalize(&records, &[]).values().all(|series| {
        series
            .observations()
            .windows(2)
            .all(|pair| pair[0].year < pair[1].year)
    })
}

#[quickcheck]
fn cache_refetches_only_after_ttl(ttl_secs: u16, elapsed_secs: u16, epsilon_ms: u16) -> bool {
    let ttl = Duration::from_secs(u64::from(ttl_secs) + 1);
    let clock = Arc::new(ManualClock::new());
    let cache: TtlCache<u8, u32> = TtlCache::with_clock(ttl, clock.clone());
    let fetches = AtomicU32::new(0);

    tokio_test::block_on(async {
        let fetch = || async { Ok(fetches.fetch_add(1, Ordering::SeqCst)) };
        let first = cache.get_or_fetch(&0, fetch).await;

        let elapsed = Duration::from_secs(u64::from(elapsed_secs));
        clock.advance(elapsed);
        let second = cache.get_or_fetch(&0, fetch).await;
        let expected = if elapsed <= ttl { 0 } else { 1 };

        // ttl + epsilon after whichever store happened last
        clock.advance(ttl + Duration::from_millis(u64::from(epsilon_ms) + 1));
        let third = cache.get_or_fetch(&0, fetch).await;

        first == Ok(0) && second == Ok(expected) && third == Ok(expected + 1)
    })
}
