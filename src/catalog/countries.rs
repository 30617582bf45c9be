//! Country reference data and peer selections

use crate::errors::{MonitorError, Result};
use crate::types::CountryCode;

/// Display labels for commonly compared countries
const COUNTRY_LABELS: &[(&str, &str)] = &[
    ("IND", "India"),
    ("CHN", "China"),
    ("USA", "United States"),
    ("BGD", "Bangladesh"),
    ("PAK", "Pakistan"),
    ("LKA", "Sri Lanka"),
    ("NPL", "Nepal"),
    ("BRA", "Brazil"),
    ("RUS", "Russia"),
    ("ZAF", "South Africa"),
    ("IDN", "Indonesia"),
    ("MEX", "Mexico"),
    ("TUR", "Türkiye"),
    ("GBR", "United Kingdom"),
    ("DEU", "Germany"),
    ("FRA", "France"),
    ("JPN", "Japan"),
    ("VNM", "Vietnam"),
];

/// Named peer groups
pub const PEER_PRESETS: &[(&str, &[&str])] = &[
    ("SAARC", &["BGD", "PAK", "LKA", "NPL"]),
    ("BRICS", &["BRA", "RUS", "CHN", "ZAF"]),
    ("G20 sample", &["USA", "CHN", "JPN", "DEU", "GBR", "FRA"]),
];

/// Display label for a country, falling back to the code itself
pub fn country_label(code: &CountryCode) -> &str {
    match COUNTRY_LABELS.iter().find(|(iso, _)| *iso == code.as_str()) {
        Some((_, label)) => label,
        None => code.as_str(),
    }
}

/// Members of a named preset (case-insensitive)
pub fn preset_members(name: &str) -> Result<Vec<CountryCode>> {
    let (_, members) = PEER_PRESETS
        .iter()
        .find(|(preset, _)| preset.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| MonitorError::ConfigError(format!("unknown peer preset: {}", name)))?;

    members.iter().map(|c| CountryCode::new(c)).collect()
}

/// Names of all presets
pub fn preset_names() -> impl Iterator<Item = &'static str> {
    PEER_PRESETS.iter().map(|(name, _)| *name)
}

/// Focus country plus de-duplicated peers
#[derive(Debug, Clone, PartialEq)]
pub struct CountrySelection {
    pub focus: CountryCode,
    pub peers: Vec<CountryCode>,
}

impl CountrySelection {
    /// Focus country, then preset members, then manual peers.
    ///
    /// Duplicates keep their first position; the focus country never
    /// appears among the peers.
    pub fn build(focus: CountryCode, preset: Option<&str>, manual: &[CountryCode]) -> Result<Self> {
        let mut peers: Vec<CountryCode> = Vec::new();
        let preset_list = match preset {
            Some(name) => preset_members(name)?,
            None => Vec::new(),
        };

        for code in preset_list.into_iter().chain(manual.iter().cloned()) {
            if code != focus && !peers.contains(&code) {
                peers.push(code);
            }
        }

        Ok(Self { focus, peers })
    }

    /// Every selected country, focus first
    pub fn all(&self) -> Vec<CountryCode> {
        std::iter::once(self.focus.clone())
            .chain(self.peers.iter().cloned())
            .collect()
    }
}
