//! Core domain types for towerlink.
//!
//! This crate contains the telemetry wire format and the normalized plant
//! types, with no IO and no async. Everything here can be used from any
//! layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod command;
mod ids;
mod plant;
mod selector;
pub mod wire;

pub use command::{ControlCommand, Hertz, HertzError, MAX_DRIVE_HZ};
pub use ids::CommandToken;
pub use plant::{ActivePump, ActuatorId, ActuatorState, LoopReadings, PlantSnapshot, SystemState};
pub use selector::{FanMode, PumpSelection, SelectorParseError, SelectorState, TowerSelection};
pub use wire::{
    ActivePumpReport, RawTelemetryFrame, RunState, SensorLinkStatus, WeatherStatus,
};

// ============================================================================
// Connection State
// ============================================================================

/// Telemetry link state.
///
/// `Errored` is entered when the transport reports an error; the close that
/// follows moves the link to `Disconnected` and drives reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Errored,
}

impl ConnectionState {
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Errored => "ERROR",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
