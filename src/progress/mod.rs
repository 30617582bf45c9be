//! Progress evaluation
//!
//! Turns a normalized series plus an indicator target into a classified
//! `ProgressResult` (on track / needs acceleration / off track / trend only).

pub mod evaluator;
pub mod types;

pub use evaluator::{classify_pace, evaluate, evaluate_all, evaluate_default};
pub use types::{ProgressResult, ProgressStatus, DEFAULT_BASELINE_YEAR};
