//! Command/telemetry correlation.
//!
//! Every dispatched sequence carries a [`CommandToken`]. The tracker holds
//! what that sequence should make visible in telemetry and, frame by frame,
//! reports whether it showed up or whether the window ran out first.

use towerlink_core::reconcile_selectors;
use towerlink_types::{
    CommandToken, FanMode, Hertz, PlantSnapshot, PumpSelection, TowerSelection,
};

/// Frequencies within this many Hz count as matching.
const FREQUENCY_TOLERANCE_HZ: f64 = 0.05;

/// Observable effect of a command sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expectation {
    Pump(PumpSelection),
    Tower(TowerSelection),
    FanMode(FanMode),
    FanSetpoint(Hertz),
    PumpFrequency(Hertz),
}

impl Expectation {
    #[must_use]
    pub fn is_met(&self, snapshot: &PlantSnapshot) -> bool {
        match *self {
            Self::Pump(target) => reconcile_selectors(snapshot).pump == target,
            Self::Tower(TowerSelection::On) => {
                snapshot.fan.is_running() || snapshot.readings.fan_auto_mode
            }
            Self::Tower(TowerSelection::Off) => {
                !snapshot.fan.is_running() || snapshot.fan.frequency == 0.0
            }
            Self::FanMode(mode) => snapshot.readings.fan_auto_mode == (mode == FanMode::Auto),
            Self::FanSetpoint(hz) => near(snapshot.fan.setpoint, hz),
            Self::PumpFrequency(hz) => near(snapshot.active_pump().frequency, hz),
        }
    }
}

fn near(reported: f64, expected: Hertz) -> bool {
    (reported - expected.value()).abs() <= FREQUENCY_TOLERANCE_HZ
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confirmation {
    /// Telemetry reflects the command.
    Confirmed(CommandToken),
    /// Accepted by the API but never reflected within the window.
    Unconfirmed(CommandToken),
}

impl Confirmation {
    #[must_use]
    pub fn token(self) -> CommandToken {
        match self {
            Self::Confirmed(token) | Self::Unconfirmed(token) => token,
        }
    }
}

#[derive(Debug, Clone)]
struct Pending {
    token: CommandToken,
    expectations: Vec<Expectation>,
    frames_seen: u32,
}

#[derive(Debug, Clone)]
pub struct ConfirmationTracker {
    window: u32,
    pending: Vec<Pending>,
}

impl ConfirmationTracker {
    #[must_use]
    pub fn new(window: u32) -> Self {
        Self {
            window: window.max(1),
            pending: Vec::new(),
        }
    }

    /// Start watching for `expectations`. Nothing to watch, nothing tracked.
    pub fn track(&mut self, token: CommandToken, expectations: Vec<Expectation>) {
        if expectations.is_empty() {
            return;
        }
        self.pending.push(Pending {
            token,
            expectations,
            frames_seen: 0,
        });
    }

    /// Check every pending command against one frame.
    pub fn observe(&mut self, snapshot: &PlantSnapshot) -> Vec<Confirmation> {
        let window = self.window;
        let mut resolved = Vec::new();
        self.pending.retain_mut(|pending| {
            pending.frames_seen += 1;
            if pending.expectations.iter().all(|e| e.is_met(snapshot)) {
                resolved.push(Confirmation::Confirmed(pending.token));
                false
            } else if pending.frames_seen >= window {
                resolved.push(Confirmation::Unconfirmed(pending.token));
                false
            } else {
                true
            }
        });
        resolved
    }

    #[must_use]
    pub fn is_pending(&self, token: CommandToken) -> bool {
        self.pending.iter().any(|p| p.token == token)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
