//! Shared test utilities and fixtures
//!
//! A local telemetry bridge (WebSocket) and helpers for the control API
//! mock used by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use towerlink_engine::{Console, ConsoleEvent, SafetyGate};
use towerlink_link::{ApiClient, TelemetryLink, WsConnector};

/// How long any single wait in a test may take.
pub const WAIT: Duration = Duration::from_secs(5);

/// Reconnect interval used against the local bridge.
pub const RECONNECT: Duration = Duration::from_millis(100);

/// Primary pump running at 45 Hz, fan stopped, manual mode.
pub fn frame() -> serde_json::Value {
    serde_json::json!({
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
    })
}

/// The same plant after a switch to the backup pump.
pub fn backup_frame() -> serde_json::Value {
    let mut frame = frame();
    frame["pump_primary"]["state"] = "Stopped".into();
    frame["pump_primary"]["frequency"] = 0.0.into();
    frame["pump_backup"]["state"] = "Running".into();
    frame["pump_backup"]["frequency"] = 45.0.into();
    frame["active_pump"] = "backup".into();
    frame
}

enum Push {
    Text(String),
    /// Close the current connection; the bridge keeps accepting.
    Drop,
}

/// A telemetry bridge on a loopback port. Serves one client at a time.
pub struct Bridge {
    pub url: Url,
    push: mpsc::UnboundedSender<Push>,
    accepted: Arc<AtomicUsize>,
    join: JoinHandle<()>,
}

impl Bridge {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = Url::parse(&format!("ws://127.0.0.1:{port}/ws")).unwrap();
        let (push, rx) = mpsc::unbounded_channel();
        let accepted = Arc::new(AtomicUsize::new(0));
        let join = tokio::spawn(serve(listener, rx, Arc::clone(&accepted)));
        Self {
            url,
            push,
            accepted,
            join,
        }
    }

    pub fn send(&self, frame: &serde_json::Value) {
        self.send_text(frame.to_string());
    }

    pub fn send_text(&self, text: impl Into<String>) {
        self.push.send(Push::Text(text.into())).unwrap();
    }

    pub fn drop_client(&self) {
        self.push.send(Push::Drop).unwrap();
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.join.abort();
    }
}

async fn serve(listener: TcpListener, mut rx: mpsc::UnboundedReceiver<Push>, accepted: Arc<AtomicUsize>) {
    loop {
        let Ok((tcp, _)) = listener.accept().await else {
            return;
        };
        let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
            continue;
        };
        accepted.fetch_add(1, Ordering::SeqCst);

        loop {
            tokio::select! {
                push = rx.recv() => match push {
                    Some(Push::Text(text)) => {
                        if ws.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Push::Drop) => {
                        let _ = ws.close(None).await;
                        break;
                    }
                    None => return,
                },
                incoming = ws.next() => match incoming {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
            }
        }
    }
}

pub fn api_client(server: &MockServer) -> ApiClient {
    ApiClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(5)).unwrap()
}

pub fn console(bridge: &Bridge, api: ApiClient, gate: SafetyGate) -> Console {
    let link = TelemetryLink::new(WsConnector, bridge.url.clone(), RECONNECT);
    Console::new(link, api, gate, 3)
}

/// Next console event, failing the test if none arrives in time.
pub async fn next_event(console: &mut Console) -> ConsoleEvent {
    tokio::time::timeout(WAIT, console.next_event())
        .await
        .expect("timed out waiting for a console event")
        .expect("console closed")
}

/// Apply events until one matches.
pub async fn wait_for(console: &mut Console, want: impl Fn(&ConsoleEvent) -> bool) -> ConsoleEvent {
    loop {
        let event = next_event(console).await;
        if want(&event) {
            return event;
        }
    }
}

/// Connect and apply the first frame the bridge sends.
pub async fn live_console(bridge: &Bridge, api: ApiClient, gate: SafetyGate) -> Console {
    let mut console = console(bridge, api, gate);
    console.connect();
    bridge.send(&frame());
    wait_for(&mut console, |e| matches!(e, ConsoleEvent::Frame { .. })).await;
    console
}

/// Accept any POST to `route`.
pub async fn mount_ok(server: &MockServer, route: &str) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .mount(server)
        .await;
}
