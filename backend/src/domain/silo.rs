//! Deployment silo of the running process.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The silo a process is deployed into.
///
/// A monolith owns every table. A split deployment runs one control silo,
/// which owns global state such as slug reservations, and any number of
/// region silos, which own organization and membership data.
///
/// # Example
///
/// ```
/// # use hybrid_cloud::domain::SiloMode;
/// let mode: SiloMode = "REGION".parse().expect("known silo");
/// assert_eq!(mode, SiloMode::Region);
/// assert_eq!(mode.as_str(), "region");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiloMode {
    /// Single deployment that owns every table.
    #[default]
    Monolith,
    /// Region silo holding customer data.
    Region,
    /// Control silo holding globally unique state.
    Control,
}

impl SiloMode {
    /// All silo modes.
    pub const ALL: [SiloMode; 3] = [SiloMode::Monolith, SiloMode::Region, SiloMode::Control];

    /// Returns the configuration string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monolith => "monolith",
            Self::Region => "region",
            Self::Control => "control",
        }
    }
}

impl fmt::Display for SiloMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown silo mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown silo mode `{input}`; expected one of monolith, region, control")]
pub struct ParseSiloModeError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for SiloMode {
    type Err = ParseSiloModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalised)
            .ok_or_else(|| ParseSiloModeError {
                input: s.to_owned(),
            })
    }
}
