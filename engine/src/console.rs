//! The console: one telemetry link, one authoritative state, one gateway.

use std::sync::Arc;

use towerlink_core::{DerivedView, derive};
use towerlink_link::{ApiClient, Connector, ControlApi, LinkEvent, TelemetryLink, WsConnector};
use towerlink_types::{ConnectionState, PlantSnapshot, RawTelemetryFrame, SelectorState};

use crate::confirm::Confirmation;
use crate::gateway::{CommandGateway, SafetyGate};
use crate::state::{ConsoleState, SharedState, lock};

/// What changed after one link event was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    Connection(ConnectionState),
    /// A frame replaced the plant snapshot.
    Frame { confirmations: Vec<Confirmation> },
    Error(String),
}

/// Point-in-time copy of everything the operator sees.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleView {
    pub connection: ConnectionState,
    pub last_error: Option<String>,
    pub read_only: bool,
    pub selectors: SelectorState,
    pub plant: Option<PlantSnapshot>,
    pub derived: Option<DerivedView>,
    pub pending_commands: usize,
}

pub struct Console<C: Connector = WsConnector, A: ControlApi = ApiClient> {
    link: TelemetryLink<C>,
    state: SharedState,
    gateway: CommandGateway<A>,
}

impl<C: Connector, A: ControlApi> Console<C, A> {
    /// The safety gate is fixed here for the life of the console.
    #[must_use]
    pub fn new(link: TelemetryLink<C>, api: A, gate: SafetyGate, confirmation_window: u32) -> Self {
        let state = ConsoleState::shared(confirmation_window);
        let gateway = CommandGateway::new(Arc::new(api), gate, Arc::clone(&state));
        tracing::info!(read_only = gate.is_read_only(), url = %link.url(), "Console ready");
        Self {
            link,
            state,
            gateway,
        }
    }

    pub fn connect(&mut self) {
        if self.is_closed() {
            return;
        }
        self.link.connect();
    }

    pub fn disconnect(&mut self) {
        self.link.disconnect();
        lock(&self.state).set_connection(ConnectionState::Disconnected, None);
    }

    pub fn reconnect(&mut self) {
        if self.is_closed() {
            return;
        }
        self.link.reconnect();
        lock(&self.state).set_connection(self.link.state(), None);
    }

    /// Wait for the next link event and apply it. `None` once closed.
    pub async fn next_event(&mut self) -> Option<ConsoleEvent> {
        if self.is_closed() {
            return None;
        }
        let event = self.link.next_event().await?;
        Some(self.apply(event))
    }

    /// Apply up to `budget` already-queued events without waiting.
    pub fn poll_events(&mut self, budget: usize) -> Vec<ConsoleEvent> {
        let mut applied = Vec::new();
        while applied.len() < budget && !self.is_closed() {
            match self.link.try_next_event() {
                Some(event) => applied.push(self.apply(event)),
                None => break,
            }
        }
        applied
    }

    fn apply(&mut self, event: LinkEvent) -> ConsoleEvent {
        let mut state = lock(&self.state);
        match event {
            LinkEvent::State(connection) => {
                state.set_connection(connection, None);
                ConsoleEvent::Connection(connection)
            }
            LinkEvent::Frame(frame) => {
                let confirmations = state.apply_frame(&frame);
                for confirmation in &confirmations {
                    match confirmation {
                        Confirmation::Confirmed(token) => {
                            tracing::info!(%token, "Command reflected in telemetry");
                        }
                        Confirmation::Unconfirmed(token) => {
                            tracing::warn!(%token, "Command not reflected in telemetry");
                        }
                    }
                }
                ConsoleEvent::Frame { confirmations }
            }
            LinkEvent::Error(message) => {
                state.set_connection(ConnectionState::Errored, Some(&message));
                ConsoleEvent::Error(message)
            }
        }
    }

    /// Apply a frame fetched from the status endpoint.
    ///
    /// Takes the same translation path as a streamed frame but leaves the
    /// connection state alone: polled data never lifts the offline gate.
    pub fn apply_polled_frame(&mut self, frame: &RawTelemetryFrame) -> Vec<Confirmation> {
        lock(&self.state).apply_frame(frame)
    }

    /// Handle for issuing commands from other tasks.
    #[must_use]
    pub fn gateway(&self) -> CommandGateway<A> {
        self.gateway.clone()
    }

    #[must_use]
    pub fn view(&self) -> ConsoleView {
        let state = lock(&self.state);
        let derived = state
            .plant
            .as_ref()
            .map(|plant| derive(plant, state.selectors.pump));
        ConsoleView {
            connection: state.connection,
            last_error: state.last_error.clone(),
            read_only: self.gateway.gate().is_read_only(),
            selectors: state.selectors,
            plant: state.plant.clone(),
            derived,
            pending_commands: state.confirmations.pending_count(),
        }
    }

    #[must_use]
    pub fn connection(&self) -> ConnectionState {
        lock(&self.state).connection
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    /// Tear down: stop reconnecting, close the transport, freeze the state.
    /// Commands still in flight may complete but change nothing.
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        lock(&self.state).close();
        self.link.disconnect();
        tracing::info!("Console closed");
    }

    #[must_use]
    pub fn link(&self) -> &TelemetryLink<C> {
        &self.link
    }
}

impl<C: Connector, A: ControlApi> Drop for Console<C, A> {
    fn drop(&mut self) {
        self.close();
    }
}
