//! Remote data source an indicator is served from

use crate::errors::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where an indicator's observations come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// World Bank Indicators API (WDI codes such as `SH.STA.MMRT`)
    #[default]
    #[serde(alias = "wdi")]
    WorldBank,
    /// UN SDG Global Database (series codes such as `SH_STA_MORT`)
    #[serde(alias = "un")]
    UnSdg,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::WorldBank => "world_bank",
            DataSource::UnSdg => "un_sdg",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSource {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "world_bank" | "wdi" => Ok(DataSource::WorldBank),
            "un_sdg" | "un" => Ok(DataSource::UnSdg),
            other => Err(MonitorError::ConfigError(format!("unknown data source {:?}", other))),
        }
    }
}
