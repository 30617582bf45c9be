//! sdgprogress - SDG Progress Monitor
//!
//! Tracks country progress toward the 2030 Sustainable Development Goal
//! targets using World Bank WDI and UN SDG Global Database series.
//!
//! # Architecture
//!
//! - **Catalog**: goal -> indicator mapping, peer presets
//! - **Fetch**: paginated World Bank client and UN SDG client with bounded retry
//! - **Cache**: TTL cache with per-key single-flight
//! - **Normalize**: raw records -> one clean series per country
//! - **Progress**: linear pace evaluation against a target year
//! - **Dashboard**: concurrent per-goal evaluation for the CLI

// Core engine
pub mod errors;
pub mod types;
pub mod catalog;
pub mod fetch;
pub mod cache;
pub mod normalize;
pub mod progress;
pub mod dashboard;

// Re-export commonly used types
pub use errors::{MonitorError, Result};

// Interface layer
pub mod cli;
pub mod telemetry;
