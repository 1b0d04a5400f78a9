//! Telemetry frames shared by the unit tests of this crate and its dependents.
//!
//! Compiled for this crate's own tests, and for other crates through the
//! `test-fixtures` feature.

use towerlink_types::{PlantSnapshot, RawTelemetryFrame};

/// Primary pump running at 45 Hz, fan stopped, manual mode.
#[must_use]
pub fn frame() -> RawTelemetryFrame {
    serde_json::from_value(serde_json::json!({
        "sensors": {
            "pressure_psi": 18.5,
            "basin_temp_f": 78.2,
            "timestamp": "2024-06-01T12:00:00",
            "status": "online"
        },
        "fan": { "state": "Stopped", "frequency": 0.0, "current": 0.0, "fault_code": 0 },
        "pump_primary": { "state": "Running", "frequency": 45.0, "current": 12.0, "fault_code": 0 },
        "pump_backup": { "state": "Stopped", "frequency": 0.0, "current": 0.0, "fault_code": 0 },
        "active_pump": "primary",
        "weather": {
            "outdoor_temp_f": 70.0,
            "humidity_pct": 50.0,
            "wet_bulb_f": 55.0,
            "last_update": "2024-06-01T11:55:00",
            "status": "online"
        },
        "calculated": {
            "return_temp_f": 93.2,
            "heat_load_kw": 131.8,
            "gpm": 60.0,
            "approach_f": 23.2
        },
        "fan_auto_mode": false,
        "fan_setpoint": 35.0
    }))
    .expect("fixture frame matches the wire schema")
}

/// [`frame`] after translation.
#[must_use]
pub fn snapshot() -> PlantSnapshot {
    crate::translate(&frame())
}
