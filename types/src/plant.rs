//! Normalized plant state.
//!
//! Produced once per telemetry frame by the translator and replaced
//! wholesale on the next one. Nothing mutates these in place.

use chrono::NaiveDateTime;

use crate::wire::{ActivePumpReport, RunState, SensorLinkStatus, WeatherStatus};

/// The three drives on the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorId {
    TowerFan,
    PrimaryPump,
    BackupPump,
}

impl ActuatorId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TowerFan => "ct1",
            Self::PrimaryPump => "p1",
            Self::BackupPump => "p2",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::TowerFan => "Tower Fan",
            Self::PrimaryPump => "Primary Pump",
            Self::BackupPump => "Backup Pump",
        }
    }
}

/// One drive after translation.
///
/// For pumps `setpoint` mirrors `frequency`: they have no independent
/// manual setpoint channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorState {
    pub id: ActuatorId,
    pub run_state: RunState,
    /// Hz, 0-60.
    pub frequency: f64,
    /// Amps.
    pub current: f64,
    pub setpoint: f64,
    pub manual_mode: bool,
    pub fault_code: u32,
}

impl ActuatorState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.id.display_name()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run_state.is_running()
    }
}

/// Resolved active-pump selector. `Failed` on the wire resolves to `Backup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivePump {
    Primary,
    Backup,
}

impl ActivePump {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "PRIMARY",
            Self::Backup => "BACKUP",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemState {
    /// Either pump is Running.
    pub is_running: bool,
    /// Fan automatic control enabled.
    pub auto_control: bool,
    pub active_pump: ActivePump,
    /// Basin (supply) water temperature, °F.
    pub loop_temperature: f64,
    pub outdoor_temperature: f64,
    /// Relative humidity, %.
    pub humidity: f64,
    /// kW.
    pub heat_load: f64,
    /// `None` when the sensor timestamp could not be read.
    pub last_update: Option<NaiveDateTime>,
}

/// Frame values consumed by the derived metrics and the command gateway
/// that have no home in [`SystemState`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoopReadings {
    pub return_temperature: f64,
    pub wet_bulb: f64,
    pub discharge_pressure_psi: f64,
    pub flow_gpm: f64,
    /// Approach as computed by the bridge.
    pub reported_approach: f64,
    /// Raw selector, kept for sequencing decisions.
    pub active_pump_report: ActivePumpReport,
    pub fan_auto_mode: bool,
    pub sensors: SensorLinkStatus,
    pub weather: WeatherStatus,
}

/// Everything one telemetry frame says about the plant.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantSnapshot {
    pub fan: ActuatorState,
    pub primary: ActuatorState,
    pub backup: ActuatorState,
    pub system: SystemState,
    pub readings: LoopReadings,
}

impl PlantSnapshot {
    /// The pump the system considers active.
    #[must_use]
    pub fn active_pump(&self) -> &ActuatorState {
        match self.system.active_pump {
            ActivePump::Primary => &self.primary,
            ActivePump::Backup => &self.backup,
        }
    }

    /// Drives reporting a nonzero fault code.
    pub fn faulted(&self) -> impl Iterator<Item = &ActuatorState> {
        [&self.fan, &self.primary, &self.backup]
            .into_iter()
            .filter(|drive| drive.fault_code != 0 || drive.run_state == RunState::Fault)
    }
}
