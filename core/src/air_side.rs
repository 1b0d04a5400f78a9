//! Heat-pump air-side model.
//!
//! The unit holds its leaving-air target while entering water is at or
//! below the efficiency knee, loses 0.6 °F of cooling per °F above it, and
//! trips to room temperature at 105 °F.

pub const ROOM_TEMP_F: f64 = 75.0;
pub const TARGET_LAT_F: f64 = 55.0;
pub const EFFICIENCY_KNEE_F: f64 = 90.0;
pub const TRIP_EWT_F: f64 = 105.0;
pub const PENALTY_PER_F: f64 = 0.6;

/// Leaving-air temperature for entering-water temperature `ewt`.
#[must_use]
pub fn discharge_air_temp(ewt: f64, running: bool) -> f64 {
    if !running || ewt >= TRIP_EWT_F {
        return ROOM_TEMP_F;
    }
    if ewt <= EFFICIENCY_KNEE_F {
        return TARGET_LAT_F;
    }
    (TARGET_LAT_F + (ewt - EFFICIENCY_KNEE_F) * PENALTY_PER_F).min(ROOM_TEMP_F)
}
