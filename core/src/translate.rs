//! Wire frame -> plant snapshot.

use chrono::{DateTime, NaiveDateTime};

use towerlink_types::{
    ActivePump, ActivePumpReport, ActuatorId, ActuatorState, FanMode, LoopReadings, PlantSnapshot,
    PumpSelection, RawTelemetryFrame, SelectorState, SystemState, TowerSelection, wire::RawDrive,
};

/// Translate a parsed frame into the normalized plant snapshot.
///
/// Never fails: a frame that parsed is well-formed by construction.
#[must_use]
pub fn translate(frame: &RawTelemetryFrame) -> PlantSnapshot {
    let fan = ActuatorState {
        id: ActuatorId::TowerFan,
        run_state: frame.fan.state,
        frequency: frame.fan.frequency,
        current: frame.fan.current,
        setpoint: frame.fan_setpoint,
        manual_mode: !frame.fan_auto_mode,
        fault_code: frame.fan.fault_code,
    };
    let primary = pump_state(ActuatorId::PrimaryPump, &frame.pump_primary);
    let backup = pump_state(ActuatorId::BackupPump, &frame.pump_backup);

    let active_pump = match frame.active_pump {
        ActivePumpReport::Primary => ActivePump::Primary,
        ActivePumpReport::Backup | ActivePumpReport::Failed => ActivePump::Backup,
    };
    if primary.is_running() == backup.is_running() {
        tracing::debug!(
            report = ?frame.active_pump,
            primary = %primary.run_state,
            backup = %backup.run_state,
            "Active pump is ambiguous; resolved to {}",
            active_pump.as_str()
        );
    }

    let system = SystemState {
        is_running: primary.is_running() || backup.is_running(),
        auto_control: frame.fan_auto_mode,
        active_pump,
        loop_temperature: frame.sensors.basin_temp_f,
        outdoor_temperature: frame.weather.outdoor_temp_f,
        humidity: frame.weather.humidity_pct,
        heat_load: frame.calculated.heat_load_kw,
        last_update: parse_timestamp(&frame.sensors.timestamp),
    };

    let readings = LoopReadings {
        return_temperature: frame.calculated.return_temp_f,
        wet_bulb: frame.weather.wet_bulb_f,
        discharge_pressure_psi: frame.sensors.pressure_psi,
        flow_gpm: frame.calculated.gpm,
        reported_approach: frame.calculated.approach_f,
        active_pump_report: frame.active_pump,
        fan_auto_mode: frame.fan_auto_mode,
        sensors: frame.sensors.status,
        weather: frame.weather.status,
    };

    PlantSnapshot {
        fan,
        primary,
        backup,
        system,
        readings,
    }
}

/// Pumps are manual-only; their setpoint is whatever they run at.
fn pump_state(id: ActuatorId, drive: &RawDrive) -> ActuatorState {
    ActuatorState {
        id,
        run_state: drive.state,
        frequency: drive.frequency,
        current: drive.current,
        setpoint: drive.frequency,
        manual_mode: true,
        fault_code: drive.fault_code,
    }
}

/// The bridge emits naive ISO-8601 local time; accept RFC 3339 as well.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(stamped) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamped.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// The selector positions the plant is actually in.
#[must_use]
pub fn reconcile_selectors(snapshot: &PlantSnapshot) -> SelectorState {
    let pump = if snapshot.primary.is_running() {
        PumpSelection::P101
    } else if snapshot.backup.is_running() {
        PumpSelection::P102
    } else {
        PumpSelection::Off
    };
    let tower = if snapshot.fan.is_running() || snapshot.readings.fan_auto_mode {
        TowerSelection::On
    } else {
        TowerSelection::Off
    };
    let fan_mode = if snapshot.readings.fan_auto_mode {
        FanMode::Auto
    } else {
        FanMode::Manual
    };
    SelectorState {
        pump,
        tower,
        fan_mode,
    }
}
