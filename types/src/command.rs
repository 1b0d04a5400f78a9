//! Actuator commands as sent to the REST control endpoints.

use serde::Serialize;
use thiserror::Error;

use crate::selector::FanMode;

/// Upper bound of every drive on the loop.
pub const MAX_DRIVE_HZ: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("frequency {0} Hz is outside 0-60 Hz")]
pub struct HertzError(pub f64);

/// A drive frequency known to be finite and within 0-60 Hz.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Hertz(f64);

impl Hertz {
    pub const ZERO: Self = Self(0.0);

    pub fn new(value: f64) -> Result<Self, HertzError> {
        if value.is_finite() && (0.0..=MAX_DRIVE_HZ).contains(&value) {
            Ok(Self(value))
        } else {
            Err(HertzError(value))
        }
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl std::fmt::Display for Hertz {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} Hz", self.0)
    }
}

/// One request against the control API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    SetFanMode(FanMode),
    SetFanFrequency(Hertz),
    SetFanAutoBand { target_temp: f64, hysteresis: f64 },
    SetPumpFrequency(Hertz),
    StartPump,
    StopPump,
    SwitchPump,
}

impl ControlCommand {
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::SetFanMode(_) => "/api/fan/mode",
            Self::SetFanFrequency(_) => "/api/fan/setpoint",
            Self::SetFanAutoBand { .. } => "/api/fan/auto_config",
            Self::SetPumpFrequency(_) => "/api/pump/frequency",
            Self::StartPump => "/api/pump/start",
            Self::StopPump => "/api/pump/stop",
            Self::SwitchPump => "/api/pump/switch",
        }
    }

    /// JSON request body, `None` for the bodiless pump verbs.
    #[must_use]
    pub fn body(&self) -> Option<serde_json::Value> {
        match self {
            Self::SetFanMode(mode) => Some(serde_json::json!({ "mode": mode })),
            Self::SetFanFrequency(hz) | Self::SetPumpFrequency(hz) => {
                Some(serde_json::json!({ "hz": hz }))
            }
            Self::SetFanAutoBand {
                target_temp,
                hysteresis,
            } => Some(serde_json::json!({
                "target_temp": target_temp,
                "hysteresis": hysteresis,
            })),
            Self::StartPump | Self::StopPump | Self::SwitchPump => None,
        }
    }

    /// Short label used in logs and operator-facing errors.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::SetFanMode(_) => "fan mode change",
            Self::SetFanFrequency(_) => "fan frequency set",
            Self::SetFanAutoBand { .. } => "fan auto band config",
            Self::SetPumpFrequency(_) => "pump frequency set",
            Self::StartPump => "pump start",
            Self::StopPump => "pump stop",
            Self::SwitchPump => "pump switch",
        }
    }
}
