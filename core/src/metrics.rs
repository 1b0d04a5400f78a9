//! Derived loop metrics.
//!
//! [`derive`] bundles every value the console shows that is not read
//! straight off the frame. Each piece is also exported on its own.

use towerlink_types::{MAX_DRIVE_HZ, PlantSnapshot, PumpSelection};

use crate::air_side::discharge_air_temp;
use crate::color::{RETURN_GRADIENT, Rgb, SUPPLY_GRADIENT};
use crate::routing::{BranchFlows, ValveRouting, flow_factor};
use crate::thermal::{ThermalCondition, ThermalZone};

/// Temperature span, °F, over which the plume reaches full intensity.
const STEAM_SPAN_F: f64 = 25.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView {
    pub condition: ThermalCondition,
    pub zone: ThermalZone,
    pub supply_color: Rgb,
    pub return_color: Rgb,
    pub routing: ValveRouting,
    pub flows: BranchFlows,
    pub flow_factor: f64,
    /// Heat-pump leaving-air temperature, °F.
    pub discharge_air_temp: f64,
    /// 0.0-1.0.
    pub steam_intensity: f64,
    pub approach: f64,
    pub delta_t: f64,
}

/// Derive the console view of one snapshot.
///
/// `selection` is the operator's pump selector; only valve routing reads it.
#[must_use]
pub fn derive(snapshot: &PlantSnapshot, selection: PumpSelection) -> DerivedView {
    let system = &snapshot.system;
    let readings = &snapshot.readings;
    DerivedView {
        condition: ThermalCondition::classify(system.loop_temperature, system.is_running),
        zone: ThermalZone::of(system.loop_temperature),
        supply_color: SUPPLY_GRADIENT.sample(system.loop_temperature),
        return_color: RETURN_GRADIENT.sample(readings.return_temperature),
        routing: ValveRouting::from_selection(selection),
        flows: BranchFlows::from_snapshot(snapshot),
        flow_factor: flow_factor(snapshot),
        discharge_air_temp: discharge_air_temp(system.loop_temperature, system.is_running),
        steam_intensity: steam_intensity(
            system.loop_temperature,
            system.outdoor_temperature,
            snapshot.fan.frequency,
        ),
        approach: approach(system.loop_temperature, readings.wet_bulb),
        delta_t: delta_t(
            readings.return_temperature,
            system.loop_temperature,
            system.is_running,
        ),
    }
}

/// Plume intensity above the tower, 0.0-1.0.
#[must_use]
pub fn steam_intensity(loop_temperature: f64, outdoor_temperature: f64, fan_hz: f64) -> f64 {
    let lift = (loop_temperature - outdoor_temperature).max(0.0);
    let intensity = lift * (fan_hz / MAX_DRIVE_HZ) / STEAM_SPAN_F;
    if intensity.is_nan() {
        return 0.0;
    }
    intensity.clamp(0.0, 1.0)
}

#[must_use]
pub fn approach(loop_temperature: f64, wet_bulb: f64) -> f64 {
    loop_temperature - wet_bulb
}

/// Return minus supply; 0.0 while the loop is stopped.
#[must_use]
pub fn delta_t(return_temperature: f64, supply_temperature: f64, running: bool) -> f64 {
    if running {
        return_temperature - supply_temperature
    } else {
        0.0
    }
}
