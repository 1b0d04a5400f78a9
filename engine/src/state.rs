//! The console's single authoritative state container.
//!
//! Shared between the console (which applies telemetry) and gateway
//! handles (which read gates and write the optimistic selector). The lock
//! is never held across an await.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use towerlink_core::{reconcile_selectors, translate};
use towerlink_types::{ConnectionState, PlantSnapshot, RawTelemetryFrame, SelectorState};

use crate::confirm::{Confirmation, ConfirmationTracker};

#[derive(Debug)]
pub(crate) struct ConsoleState {
    pub(crate) connection: ConnectionState,
    pub(crate) last_error: Option<String>,
    /// Latest translated frame. `None` until the first one arrives.
    pub(crate) plant: Option<PlantSnapshot>,
    pub(crate) selectors: SelectorState,
    pub(crate) confirmations: ConfirmationTracker,
    /// Set once on teardown; nothing mutates the state afterwards.
    pub(crate) closed: bool,
}

pub(crate) type SharedState = Arc<Mutex<ConsoleState>>;

impl ConsoleState {
    pub(crate) fn new(confirmation_window: u32) -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            last_error: None,
            plant: None,
            selectors: SelectorState::default(),
            confirmations: ConfirmationTracker::new(confirmation_window),
            closed: false,
        }
    }

    pub(crate) fn shared(confirmation_window: u32) -> SharedState {
        Arc::new(Mutex::new(Self::new(confirmation_window)))
    }

    /// Replace the plant snapshot wholesale and reconcile the selectors.
    pub(crate) fn apply_frame(&mut self, frame: &RawTelemetryFrame) -> Vec<Confirmation> {
        if self.closed {
            return Vec::new();
        }
        let snapshot = translate(frame);
        let reconciled = reconcile_selectors(&snapshot);
        if reconciled != self.selectors {
            tracing::debug!(
                pump = %reconciled.pump,
                tower = %reconciled.tower,
                fan_mode = %reconciled.fan_mode,
                "Selectors reconciled to telemetry"
            );
        }
        self.selectors = reconciled;
        let confirmations = self.confirmations.observe(&snapshot);
        self.plant = Some(snapshot);
        confirmations
    }

    pub(crate) fn set_connection(&mut self, connection: ConnectionState, error: Option<&str>) {
        if self.closed {
            return;
        }
        self.connection = connection;
        if connection.is_connected() {
            self.last_error = None;
        } else if let Some(error) = error {
            self.last_error = Some(error.to_string());
        }
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
        self.connection = ConnectionState::Disconnected;
        self.confirmations.clear();
    }
}

/// Lock, recovering from poisoning: every writer leaves the state whole.
pub(crate) fn lock(state: &Mutex<ConsoleState>) -> MutexGuard<'_, ConsoleState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
