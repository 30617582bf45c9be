//! Indicator catalogue lookup table
//!
//! Built once at startup, either from a TOML file or from the built-in
//! seed, and never mutated afterwards. Adding a goal or indicator is a
//! data change only.

use crate::catalog::types::{
    CatalogFile, Direction, GoalSummary, IndicatorDef, DEFAULT_TARGET_YEAR, SDG_NAMES,
};
use crate::errors::{MonitorError, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Goal -> indicator definitions
#[derive(Debug, Clone)]
pub struct IndicatorCatalog {
    goals: BTreeMap<u8, Vec<IndicatorDef>>,
    by_code: HashMap<String, (u8, usize)>,
}

impl IndicatorCatalog {
    /// Build a catalogue, validating ids and code uniqueness
    pub fn from_goals(goals: Vec<(u8, Vec<IndicatorDef>)>) -> Result<Self> {
        let mut seen: HashMap<String, u8> = HashMap::new();

        for (goal, indicators) in &goals {
            if goal_name(*goal).is_none() {
                return Err(MonitorError::ConfigError(format!(
                    "goal id {} outside 1..=17",
                    goal
                )));
            }
            for def in indicators {
                if def.code.trim().is_empty() {
                    return Err(MonitorError::ConfigError(format!(
                        "indicator {:?} in goal {} has an empty code",
                        def.label, goal
                    )));
                }
                if let Some(prev) = seen.insert(def.code.clone(), *goal) {
                    return Err(MonitorError::ConfigError(format!(
                        "duplicate indicator code {} (goals {} and {})",
                        def.code, prev, goal
                    )));
                }
            }
        }

        Ok(Self::index(goals))
    }

    /// Load a catalogue from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::ConfigError(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Parse a catalogue from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents)
            .map_err(|e| MonitorError::ConfigError(format!("Failed to parse catalog: {}", e)))?;

        let goals = file
            .goal
            .into_iter()
            .map(|entry| (entry.id, entry.indicator))
            .collect();
        Self::from_goals(goals)
    }

    /// Load from `path` when given, otherwise use the built-in seed
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::builtin()),
        }
    }

    /// Built-in seed catalogue of World Bank WDI indicators
    pub fn builtin() -> Self {
        use Direction::{Decrease, Increase};

        let row = |target: &str, label: &str, code: &str, unit: &str, dir: Direction| {
            IndicatorDef::new(code, label)
                .with_sdg_target(target)
                .with_unit(unit)
                .with_direction(dir)
        };
        let y = DEFAULT_TARGET_YEAR;

        Self::index(vec![
            (1, vec![
                row("1.1", "Poverty headcount (<$3.00, 2021 PPP) (% pop)", "SI.POV.DDAY", "%", Decrease)
                    .with_target(0.0, y),
            ]),
            (2, vec![
                row("2.1", "Undernourishment (% pop)", "SN.ITK.DEFC.ZS", "%", Decrease),
            ]),
            (3, vec![
                row("3.1", "Maternal mortality (per 100k)", "SH.STA.MMRT", "", Decrease)
                    .with_target(70.0, y),
                row("3.2", "Infant mortality (per 1,000)", "SP.DYN.IMRT.IN", "", Decrease),
            ]),
            (4, vec![
                row("4.1", "Primary net enrollment (%)", "SE.PRM.NENR", "%", Increase)
                    .with_target(100.0, y),
            ]),
            (6, vec![
                row("6.1", "Basic drinking water (% pop)", "SH.H2O.BASW.ZS", "%", Increase)
                    .with_target(100.0, y),
                row("6.2", "Basic sanitation (% pop)", "SH.STA.BASS.ZS", "%", Increase)
                    .with_target(100.0, y),
            ]),
            (7, vec![
                row("7.1", "Access to electricity (% pop)", "EG.ELC.ACCS.ZS", "%", Increase)
                    .with_target(100.0, y),
                row("7.2", "Renewable energy (% of TFEC)", "EG.FEC.RNEW.ZS", "%", Increase),
            ]),
            (8, vec![
                row("8.5", "Unemployment (% labor force)", "SL.UEM.TOTL.ZS", "%", Decrease),
            ]),
            (9, vec![
                row("9.2", "Manufacturing VA (% of GDP)", "NV.IND.MANF.ZS", "%", Increase),
                row("9.c", "Mobile subs (per 100 people)", "IT.CEL.SETS.P2", "", Increase),
            ]),
        ])
    }

    fn index(goals: Vec<(u8, Vec<IndicatorDef>)>) -> Self {
        let mut map: BTreeMap<u8, Vec<IndicatorDef>> = BTreeMap::new();
        for (goal, indicators) in goals {
            map.entry(goal).or_default().extend(indicators);
        }

        let mut by_code = HashMap::new();
        for (goal, indicators) in map.iter_mut() {
            indicators.sort_by(|a, b| {
                (a.sdg_target.as_str(), a.label.as_str()).cmp(&(b.sdg_target.as_str(), b.label.as_str()))
            });
            for (i, def) in indicators.iter().enumerate() {
                by_code.insert(def.code.clone(), (*goal, i));
            }
        }

        Self { goals: map, by_code }
    }

    /// All 17 goals, including those without indicators
    pub fn goals(&self) -> Vec<GoalSummary> {
        (1..=17u8)
            .filter_map(|id| {
                goal_name(id).map(|name| GoalSummary {
                    id,
                    name,
                    indicator_count: self.goals.get(&id).map_or(0, Vec::len),
                })
            })
            .collect()
    }

    /// Indicators for a goal, ordered by (SDG target, label)
    pub fn indicators_for_goal(&self, goal: u8) -> Result<&[IndicatorDef]> {
        if goal_name(goal).is_none() {
            return Err(MonitorError::UnknownGoal(goal));
        }
        Ok(self.goals.get(&goal).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Look up an indicator by code
    pub fn indicator(&self, code: &str) -> Result<&IndicatorDef> {
        self.by_code
            .get(code)
            .and_then(|(goal, i)| self.goals.get(goal).and_then(|v| v.get(*i)))
            .ok_or_else(|| MonitorError::UnknownIndicator(code.to_string()))
    }

    /// Goal an indicator belongs to
    pub fn goal_of(&self, code: &str) -> Option<u8> {
        self.by_code.get(code).map(|(goal, _)| *goal)
    }

    /// Total number of indicators
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl Default for IndicatorCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Name of SDG `id`, if it is 1..=17
pub fn goal_name(id: u8) -> Option<&'static str> {
    match id {
        1..=17 => Some(SDG_NAMES[(id - 1) as usize]),
        _ => None,
    }
}
