//! Telemetry session ownership and reconnection.
//!
//! A [`TelemetryLink`] owns at most one live session. Each `connect()`
//! spawns a driver task tagged with a fresh generation number; the driver
//! connects, forwards parsed frames, and after a close waits the fixed
//! reconnect interval before trying again. Events carrying a stale
//! generation are dropped on receipt, so a session that has been torn down
//! can never change what the link reports.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use url::Url;

use towerlink_types::{ConnectionState, RawTelemetryFrame};

use crate::transport::{Connector, FrameStream, WsConnector};

/// Channel capacity between the driver task and the link.
const EVENT_CHANNEL_CAPACITY: usize = 256;

pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    State(ConnectionState),
    /// A frame that parsed in full.
    Frame(Box<RawTelemetryFrame>),
    /// Transport error. The close that follows drives reconnection.
    Error(String),
}

struct Tagged {
    generation: u64,
    event: LinkEvent,
}

/// Handle to the running driver. Present on the link iff a session is live.
struct Session {
    shutdown: oneshot::Sender<()>,
    reconnect: Arc<AtomicBool>,
    driver: JoinHandle<()>,
}

pub struct TelemetryLink<C: Connector = WsConnector> {
    connector: Arc<C>,
    url: Url,
    reconnect_interval: Duration,
    generation: u64,
    session: Option<Session>,
    /// Driver of the last torn-down session, possibly still closing its
    /// transport. The next session waits for it before connecting.
    retiring: Option<JoinHandle<()>>,
    state: ConnectionState,
    last_error: Option<String>,
    event_tx: mpsc::Sender<Tagged>,
    event_rx: mpsc::Receiver<Tagged>,
}

impl TelemetryLink<WsConnector> {
    #[must_use]
    pub fn websocket(url: Url, reconnect_interval: Duration) -> Self {
        Self::new(WsConnector, url, reconnect_interval)
    }
}

impl<C: Connector> TelemetryLink<C> {
    #[must_use]
    pub fn new(connector: C, url: Url, reconnect_interval: Duration) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            connector: Arc::new(connector),
            url,
            reconnect_interval,
            generation: 0,
            session: None,
            retiring: None,
            state: ConnectionState::Disconnected,
            last_error: None,
            event_tx,
            event_rx,
        }
    }

    /// Start a session. A no-op while one is already live.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&mut self) {
        if self.session.is_some() {
            tracing::debug!(generation = self.generation, "Telemetry session already live");
            return;
        }
        self.generation += 1;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let reconnect = Arc::new(AtomicBool::new(true));

        let driver = Driver {
            connector: Arc::clone(&self.connector),
            url: self.url.clone(),
            interval: self.reconnect_interval,
            generation: self.generation,
            tx: self.event_tx.clone(),
            reconnect: Arc::clone(&reconnect),
        };
        let driver = tokio::spawn(driver.run(self.retiring.take(), shutdown_rx));

        tracing::info!(url = %self.url, generation = self.generation, "Telemetry session started");
        self.session = Some(Session {
            shutdown: shutdown_tx,
            reconnect,
            driver,
        });
    }

    /// Tear down the live session and suppress any further reconnect.
    pub fn disconnect(&mut self) {
        // Anything the old driver still has in flight is now stale.
        self.generation += 1;
        if let Some(session) = self.session.take() {
            session.reconnect.store(false, Ordering::SeqCst);
            let _ = session.shutdown.send(());
            self.retiring = Some(session.driver);
            tracing::info!("Telemetry session closed");
        }
        self.state = ConnectionState::Disconnected;
    }

    pub fn reconnect(&mut self) {
        self.disconnect();
        self.connect();
    }

    /// Wait for the next event of the live session.
    ///
    /// Pends forever while no session is live. Cancel-safe.
    pub async fn next_event(&mut self) -> Option<LinkEvent> {
        loop {
            let tagged = self.event_rx.recv().await?;
            if let Some(event) = self.accept(tagged) {
                return Some(event);
            }
        }
    }

    /// Non-blocking variant of [`Self::next_event`].
    pub fn try_next_event(&mut self) -> Option<LinkEvent> {
        loop {
            let tagged = self.event_rx.try_recv().ok()?;
            if let Some(event) = self.accept(tagged) {
                return Some(event);
            }
        }
    }

    fn accept(&mut self, tagged: Tagged) -> Option<LinkEvent> {
        if tagged.generation != self.generation {
            tracing::trace!(
                stale = tagged.generation,
                current = self.generation,
                "Dropping event from closed session"
            );
            return None;
        }
        match &tagged.event {
            LinkEvent::State(state) => {
                self.state = *state;
                if state.is_connected() {
                    self.last_error = None;
                }
            }
            LinkEvent::Error(message) => {
                self.state = ConnectionState::Errored;
                self.last_error = Some(message.clone());
            }
            LinkEvent::Frame(_) => {}
        }
        Some(tagged.event)
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn connector(&self) -> &C {
        &self.connector
    }
}

impl<C: Connector> Drop for TelemetryLink<C> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

struct Driver<C> {
    connector: Arc<C>,
    url: Url,
    interval: Duration,
    generation: u64,
    tx: mpsc::Sender<Tagged>,
    reconnect: Arc<AtomicBool>,
}

impl<C: Connector> Driver<C> {
    async fn run(self, previous: Option<JoinHandle<()>>, mut shutdown: oneshot::Receiver<()>) {
        // At most one transport open at a time.
        if let Some(previous) = previous {
            let _ = previous.await;
        }
        loop {
            if !self.emit(LinkEvent::State(ConnectionState::Connecting)).await {
                return;
            }

            let opened = tokio::select! {
                _ = &mut shutdown => return,
                opened = self.connector.connect(&self.url) => opened,
            };

            match opened {
                Ok(mut stream) => {
                    if !self.emit(LinkEvent::State(ConnectionState::Connected)).await {
                        stream.close().await;
                        return;
                    }
                    tracing::info!(url = %self.url, "Telemetry connected");
                    if self.pump(&mut stream, &mut shutdown).await.is_break() {
                        stream.close().await;
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(url = %self.url, error = %e, "Telemetry connect failed");
                    if !self.emit(LinkEvent::Error(e.to_string())).await {
                        return;
                    }
                }
            }

            if !self.emit(LinkEvent::State(ConnectionState::Disconnected)).await {
                return;
            }
            if !self.reconnect.load(Ordering::SeqCst) {
                return;
            }
            tracing::debug!(
                delay_ms = self.interval.as_millis() as u64,
                "Telemetry reconnect scheduled"
            );
            tokio::select! {
                _ = &mut shutdown => return,
                () = tokio::time::sleep(self.interval) => {}
            }
            if !self.reconnect.load(Ordering::SeqCst) {
                return;
            }
        }
    }

    /// Forward frames until the stream ends (`Continue`) or teardown is
    /// requested (`Break`).
    async fn pump(
        &self,
        stream: &mut C::Stream,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> std::ops::ControlFlow<()> {
        use std::ops::ControlFlow;

        loop {
            let item = tokio::select! {
                _ = &mut *shutdown => return ControlFlow::Break(()),
                item = stream.next_text() => item,
            };
            match item {
                Some(Ok(text)) => match RawTelemetryFrame::from_json(&text) {
                    Ok(frame) => {
                        if !self.emit(LinkEvent::Frame(Box::new(frame))).await {
                            return ControlFlow::Break(());
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            bytes = text.len(),
                            error = %e,
                            "Dropping unparseable telemetry frame"
                        );
                    }
                },
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Telemetry stream error");
                    if !self.emit(LinkEvent::Error(e.to_string())).await {
                        return ControlFlow::Break(());
                    }
                    return ControlFlow::Continue(());
                }
                None => {
                    tracing::info!("Telemetry stream closed");
                    return ControlFlow::Continue(());
                }
            }
        }
    }

    /// False once the link is gone.
    async fn emit(&self, event: LinkEvent) -> bool {
        self.tx
            .send(Tagged {
                generation: self.generation,
                event,
            })
            .await
            .is_ok()
    }
}
