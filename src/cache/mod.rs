//! In-memory series cache
//!
//! Memoizes fetch results per (countries, indicator, year range) for a
//! bounded TTL. Constructed once per process and shared by callers.

pub mod clock;
pub mod series_cache;

pub use clock::{Clock, ManualClock, SystemClock};
pub use series_cache::{SeriesCache, TtlCache, DEFAULT_TTL};
