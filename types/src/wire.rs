//! Telemetry wire format.
//!
//! One JSON object per stream message (and per `GET /api/status` response).
//! Every field is required: a frame that is missing a field, or that carries
//! an unrecognized enum value, fails to parse and is dropped as a whole.
//! There is no partial update path.

use serde::{Deserialize, Serialize};

/// Drive run-state as reported by the field bridge.
///
/// Closed set. Unknown strings are a parse error at the wire boundary rather
/// than a value that flows through the rest of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    Running,
    Stopped,
    Fault,
    NoComm,
}

impl RunState {
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Stopped => "Stopped",
            Self::Fault => "Fault",
            Self::NoComm => "NoComm",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pump the bridge considers active. `Failed` means failover gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivePumpReport {
    Primary,
    Backup,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorLinkStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherStatus {
    Online,
    Stale,
    Offline,
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSensors {
    pub pressure_psi: f64,
    pub basin_temp_f: f64,
    pub timestamp: String,
    pub status: SensorLinkStatus,
}

/// One variable-frequency drive (fan or pump).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDrive {
    pub state: RunState,
    pub frequency: f64,
    pub current: f64,
    pub fault_code: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWeather {
    pub outdoor_temp_f: f64,
    pub humidity_pct: f64,
    pub wet_bulb_f: f64,
    pub last_update: String,
    pub status: WeatherStatus,
}

/// Values the bridge derives server-side from sensors and drive speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCalculated {
    pub return_temp_f: f64,
    pub heat_load_kw: f64,
    pub gpm: f64,
    pub approach_f: f64,
}

/// Complete plant snapshot as pushed on the telemetry stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTelemetryFrame {
    pub sensors: RawSensors,
    pub fan: RawDrive,
    pub pump_primary: RawDrive,
    pub pump_backup: RawDrive,
    pub active_pump: ActivePumpReport,
    pub weather: RawWeather,
    pub calculated: RawCalculated,
    pub fan_auto_mode: bool,
    pub fan_setpoint: f64,
}

impl RawTelemetryFrame {
    /// Parse a single stream message.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// `GET /api/vfds` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDriveReport {
    pub fan: RawDrive,
    pub pump_primary: RawDrive,
    pub pump_backup: RawDrive,
    pub active_pump: ActivePumpReport,
}

/// `GET /api/health` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub websocket_clients: u32,
    pub timestamp: String,
}
