//! Type definitions module
//!
//! Country codes, year ranges, data sources, observations and series
//! shared by the fetcher, normalizer and evaluator.

pub mod country;
pub mod series;
pub mod source;

// Re-export commonly used types
pub use country::{CountryCode, YearRange};
pub use series::{Observation, Series};
pub use source::DataSource;
