//! Telemetry stream tests against a local bridge

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use towerlink_engine::{CommandError, ConsoleEvent, SafetyGate};
use towerlink_types::{ConnectionState, PumpSelection, RawTelemetryFrame};

use crate::common::{self, Bridge};

fn is_frame(event: &ConsoleEvent) -> bool {
    matches!(event, ConsoleEvent::Frame { .. })
}

#[tokio::test]
async fn frames_flow_into_view() {
    let bridge = Bridge::start().await;
    let api = MockServer::start().await;
    let mut console = common::console(&bridge, common::api_client(&api), SafetyGate::Armed);
    assert_eq!(console.view().connection, ConnectionState::Disconnected);

    console.connect();
    assert_eq!(
        common::next_event(&mut console).await,
        ConsoleEvent::Connection(ConnectionState::Connecting)
    );
    assert_eq!(
        common::next_event(&mut console).await,
        ConsoleEvent::Connection(ConnectionState::Connected)
    );

    bridge.send(&common::frame());
    common::wait_for(&mut console, is_frame).await;

    let view = console.view();
    assert_eq!(view.connection, ConnectionState::Connected);
    let plant = view.plant.expect("plant after first frame");
    assert_eq!(plant.system.loop_temperature, 78.2);
    assert!(plant.system.is_running);
    assert_eq!(view.selectors.pump, PumpSelection::P101);
    assert_eq!(view.derived.expect("derived view").flow_factor, 0.75);
}

#[tokio::test]
async fn malformed_frames_are_dropped() {
    let bridge = Bridge::start().await;
    let api = MockServer::start().await;
    let mut console = common::live_console(&bridge, common::api_client(&api), SafetyGate::Armed).await;

    bridge.send_text("not json");
    bridge.send_text(r#"{"sensors": {}}"#);
    bridge.send(&common::backup_frame());

    // The next applied event is the good frame; nothing in between.
    let event = common::next_event(&mut console).await;
    assert!(is_frame(&event), "unexpected event {event:?}");
    let view = console.view();
    assert_eq!(view.connection, ConnectionState::Connected);
    assert_eq!(view.selectors.pump, PumpSelection::P102);
    assert_eq!(view.last_error, None);
}

#[tokio::test]
async fn reconnects_after_bridge_drops() {
    let bridge = Bridge::start().await;
    let api = MockServer::start().await;
    let mut console = common::live_console(&bridge, common::api_client(&api), SafetyGate::Armed).await;
    assert_eq!(bridge.accepted(), 1);

    bridge.drop_client();
    common::wait_for(&mut console, |e| {
        *e == ConsoleEvent::Connection(ConnectionState::Disconnected)
    })
    .await;
    assert!(!console.connection().is_connected());
    // The last snapshot stays on screen while offline.
    assert!(console.view().plant.is_some());

    common::wait_for(&mut console, |e| {
        *e == ConsoleEvent::Connection(ConnectionState::Connected)
    })
    .await;
    assert_eq!(bridge.accepted(), 2);
}

#[tokio::test]
async fn disconnect_stops_reconnecting() {
    let bridge = Bridge::start().await;
    let api = MockServer::start().await;
    let mut console = common::live_console(&bridge, common::api_client(&api), SafetyGate::Armed).await;

    console.disconnect();
    assert_eq!(console.connection(), ConnectionState::Disconnected);
    assert!(!console.link().is_live());

    tokio::time::sleep(common::RECONNECT * 4).await;
    assert_eq!(bridge.accepted(), 1);
    assert!(console.poll_events(16).is_empty());
}

#[tokio::test]
async fn close_ends_the_event_stream() {
    let bridge = Bridge::start().await;
    let api = MockServer::start().await;
    let mut console = common::live_console(&bridge, common::api_client(&api), SafetyGate::Armed).await;

    console.close();
    console.close();
    assert!(console.is_closed());
    assert_eq!(console.next_event().await, None);
    assert_eq!(console.connection(), ConnectionState::Disconnected);

    bridge.send(&common::backup_frame());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(console.view().selectors.pump, PumpSelection::P101);
}

#[tokio::test]
async fn polled_status_feeds_the_same_view() {
    let bridge = Bridge::start().await;
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::backup_frame()))
        .expect(1)
        .mount(&api)
        .await;

    let client = common::api_client(&api);
    let mut console = common::console(&bridge, client.clone(), SafetyGate::Armed);

    let frame: RawTelemetryFrame = client.full_status().await.unwrap();
    console.apply_polled_frame(&frame);

    let view = console.view();
    assert_eq!(view.selectors.pump, PumpSelection::P102);
    assert!(view.plant.is_some());
    // Polled data never lifts the offline gate.
    assert_eq!(view.connection, ConnectionState::Disconnected);
    assert_eq!(
        console.gateway().select_pump(PumpSelection::Off).await,
        Err(CommandError::Offline)
    );
}
