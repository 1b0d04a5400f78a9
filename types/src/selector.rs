//! Operator selector projection.
//!
//! Selectors are what the operator last asked for, held locally and
//! overwritten by every telemetry frame. They are never authoritative.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PumpSelection {
    #[default]
    #[serde(rename = "P-101")]
    P101,
    #[serde(rename = "OFF")]
    Off,
    #[serde(rename = "P-102")]
    P102,
}

impl PumpSelection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P101 => "P-101",
            Self::Off => "OFF",
            Self::P102 => "P-102",
        }
    }
}

impl std::fmt::Display for PumpSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TowerSelection {
    On,
    #[default]
    Off,
}

impl TowerSelection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl std::fmt::Display for TowerSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fan control mode. Serialized the way `POST /api/fan/mode` expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanMode {
    #[default]
    Manual,
    Auto,
}

impl FanMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Manual => Self::Auto,
            Self::Auto => Self::Manual,
        }
    }
}

impl std::fmt::Display for FanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized selector value '{0}'")]
pub struct SelectorParseError(pub String);

impl std::str::FromStr for PumpSelection {
    type Err = SelectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P-101" | "P101" => Ok(Self::P101),
            "OFF" => Ok(Self::Off),
            "P-102" | "P102" => Ok(Self::P102),
            _ => Err(SelectorParseError(s.to_string())),
        }
    }
}

impl std::str::FromStr for TowerSelection {
    type Err = SelectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Off),
            _ => Err(SelectorParseError(s.to_string())),
        }
    }
}

impl std::str::FromStr for FanMode {
    type Err = SelectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "auto" => Ok(Self::Auto),
            _ => Err(SelectorParseError(s.to_string())),
        }
    }
}

/// Local projection of the operator's selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectorState {
    pub pump: PumpSelection,
    pub tower: TowerSelection,
    pub fan_mode: FanMode,
}
