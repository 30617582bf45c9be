//! Indicator catalogue
//!
//! Static goal -> indicator mapping plus country reference data:
//! - Built-in seed of World Bank WDI indicators
//! - Optional TOML catalogue file
//! - Peer presets and country selections

pub mod countries;
pub mod registry;
pub mod types;

// Re-export key types for convenience
pub use countries::{country_label, CountrySelection};
pub use registry::{goal_name, IndicatorCatalog};
pub use types::{Direction, GoalSummary, IndicatorDef, DEFAULT_TARGET_YEAR};
