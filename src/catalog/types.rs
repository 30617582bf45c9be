//! Catalogue type definitions

use crate::types::DataSource;
use serde::{Deserialize, Serialize};

/// Default target year for SDG indicators
pub const DEFAULT_TARGET_YEAR: i32 = 2030;

/// Official short names of the 17 Sustainable Development Goals, index 0 = SDG 1
pub const SDG_NAMES: [&str; 17] = [
    "No Poverty",
    "Zero Hunger",
    "Good Health & Well-Being",
    "Quality Education",
    "Gender Equality",
    "Clean Water & Sanitation",
    "Affordable & Clean Energy",
    "Decent Work & Economic Growth",
    "Industry, Innovation & Infrastructure",
    "Reduced Inequalities",
    "Sustainable Cities & Communities",
    "Responsible Consumption & Production",
    "Climate Action",
    "Life Below Water",
    "Life On Land",
    "Peace, Justice & Strong Institutions",
    "Partnerships for the Goals",
];

/// Which way an indicator should move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "up")]
    Increase,
    #[serde(alias = "down")]
    Decrease,
}

impl Direction {
    /// True when moving from `from` to `to` is movement the wrong way
    pub fn is_adverse(&self, from: f64, to: f64) -> bool {
        match self {
            Direction::Increase => to < from,
            Direction::Decrease => to > from,
        }
    }
}

/// Indicator definition, immutable once the catalogue is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDef {
    /// Remote series code, e.g. `SH.STA.MMRT`
    pub code: String,

    /// Human readable label
    pub label: String,

    #[serde(default)]
    pub unit: String,

    /// SDG target reference such as `3.1`
    #[serde(default)]
    pub sdg_target: String,

    #[serde(default)]
    pub target_value: Option<f64>,

    #[serde(default = "default_target_year")]
    pub target_year: i32,

    #[serde(default)]
    pub direction: Option<Direction>,

    /// API serving the code; World Bank unless stated
    #[serde(default)]
    pub source: DataSource,
}

fn default_target_year() -> i32 {
    DEFAULT_TARGET_YEAR
}

impl IndicatorDef {
    /// Indicator without a numeric target
    pub fn new(code: &str, label: &str) -> Self {
        Self {
            code: code.to_string(),
            label: label.to_string(),
            unit: String::new(),
            sdg_target: String::new(),
            target_value: None,
            target_year: DEFAULT_TARGET_YEAR,
            direction: None,
            source: DataSource::WorldBank,
        }
    }

    pub fn with_target(mut self, value: f64, year: i32) -> Self {
        self.target_value = Some(value);
        self.target_year = year;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_source(mut self, source: DataSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    pub fn with_sdg_target(mut self, target: &str) -> Self {
        self.sdg_target = target.to_string();
        self
    }

    /// Whether a numeric target is configured
    pub fn has_target(&self) -> bool {
        self.target_value.is_some()
    }
}

/// One goal row for listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalSummary {
    pub id: u8,
    pub name: &'static str,
    pub indicator_count: usize,
}

impl GoalSummary {
    /// Label in the form `SDG 3 · Good Health & Well-Being`
    pub fn label(&self) -> String {
        format!("SDG {} · {}", self.id, self.name)
    }
}

/// On-disk catalogue layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub goal: Vec<GoalEntry>,
}

/// One `[[goal]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalEntry {
    pub id: u8,
    #[serde(default)]
    pub indicator: Vec<IndicatorDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_aliases() {
        #[derive(Deserialize)]
        struct Row {
            direction: Direction,
        }

        let row: Row = toml::from_str("direction = \"down\"").unwrap();
        assert_eq!(row.direction, Direction::Decrease);
        let row: Row = toml::from_str("direction = \"increase\"").unwrap();
        assert_eq!(row.direction, Direction::Increase);
    }

    #[test]
    fn test_adverse_movement() {
        assert!(Direction::Increase.is_adverse(100.0, 98.0));
        assert!(!Direction::Increase.is_adverse(100.0, 100.0));
        assert!(Direction::Decrease.is_adverse(0.0, 0.5));
        assert!(!Direction::Decrease.is_adverse(5.0, 1.0));
    }

    #[test]
    fn test_indicator_defaults() {
        let def: IndicatorDef = toml::from_str("code = \"X.Y\"\nlabel = \"Thing\"").unwrap();
        assert_eq!(def.target_year, DEFAULT_TARGET_YEAR);
        assert!(!def.has_target());
        assert!(def.direction.is_none());
        assert_eq!(def.source, DataSource::WorldBank);
    }

    #[test]
    fn test_indicator_source_from_toml() {
        let def: IndicatorDef =
            toml::from_str("code = \"SH_STA_MORT\"\nlabel = \"MMR\"\nsource = \"un_sdg\"").unwrap();
        assert_eq!(def.source, DataSource::UnSdg);
    }
}
