//! Dashboard engine
//!
//! Ties the catalogue, cached fetcher, normalizer and evaluator together
//! for the presentation layer.

pub mod service;
pub mod types;

pub use service::{ProgressService, MAX_PARALLEL_FETCHES};
pub use types::{GoalOverview, IndicatorOutcome, IndicatorReport, PeerEntry};
