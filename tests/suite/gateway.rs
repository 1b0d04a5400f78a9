//! Command gateway tests against a mock control API

use std::time::Duration;

use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use towerlink_engine::{CommandError, Confirmation, ConsoleEvent, SafetyGate};
use towerlink_link::COMMAND_TOKEN_HEADER;
use towerlink_types::{ControlCommand, FanMode, PumpSelection, TowerSelection};

use crate::common::{self, Bridge};

#[tokio::test]
async fn pump_switch_is_sequenced_and_confirmed() {
    let bridge = Bridge::start().await;
    let api = MockServer::start().await;
    for route in ["/api/pump/switch", "/api/pump/start"] {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
            .expect(1)
            .mount(&api)
            .await;
    }
    let mut console = common::live_console(&bridge, common::api_client(&api), SafetyGate::Armed).await;

    let receipt = console.gateway().select_pump(PumpSelection::P102).await.unwrap();
    assert_eq!(
        receipt.commands,
        vec![ControlCommand::SwitchPump, ControlCommand::StartPump]
    );

    let requests = api.received_requests().await.unwrap();
    let paths: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
    assert_eq!(paths, ["/api/pump/switch", "/api/pump/start"]);
    for request in &requests {
        let token = request.headers.get(COMMAND_TOKEN_HEADER).unwrap();
        assert_eq!(token.to_str().unwrap(), receipt.token.to_string());
    }

    // Optimistic until telemetry speaks.
    let view = console.view();
    assert_eq!(view.selectors.pump, PumpSelection::P102);
    assert_eq!(view.pending_commands, 1);

    bridge.send(&common::backup_frame());
    let event = common::wait_for(&mut console, |e| matches!(e, ConsoleEvent::Frame { .. })).await;
    assert_eq!(
        event,
        ConsoleEvent::Frame {
            confirmations: vec![Confirmation::Confirmed(receipt.token)]
        }
    );
    assert_eq!(console.view().pending_commands, 0);
}

#[tokio::test]
async fn read_only_session_sends_nothing() {
    let bridge = Bridge::start().await;
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&api)
        .await;
    let console = common::live_console(&bridge, common::api_client(&api), SafetyGate::ReadOnly).await;
    let gateway = console.gateway();

    assert_eq!(gateway.select_pump(PumpSelection::P102).await, Err(CommandError::ReadOnly));
    assert_eq!(gateway.select_tower(TowerSelection::On).await, Err(CommandError::ReadOnly));
    assert_eq!(gateway.toggle_fan_mode().await, Err(CommandError::ReadOnly));
    // The gate is checked before the value.
    assert_eq!(gateway.set_fan_frequency(99.0).await, Err(CommandError::ReadOnly));
    assert!(console.view().read_only);
    assert_eq!(console.view().selectors.pump, PumpSelection::P101);
}

#[tokio::test]
async fn api_failure_stops_the_sequence() {
    let bridge = Bridge::start().await;
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pump/switch"))
        .respond_with(ResponseTemplate::new(500).set_body_string("interlock active"))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/pump/start"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&api)
        .await;
    let console = common::live_console(&bridge, common::api_client(&api), SafetyGate::Armed).await;

    let err = console
        .gateway()
        .select_pump(PumpSelection::P102)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CommandError::Api {
            action: "pump switch",
            status: 500,
            body: "interlock active".to_string(),
        }
    );
    assert!(!err.is_rejection());
    let view = console.view();
    assert_eq!(view.selectors.pump, PumpSelection::P101);
    assert_eq!(view.pending_commands, 0);
}

#[tokio::test]
async fn tower_on_uses_reported_setpoint() {
    let bridge = Bridge::start().await;
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/fan/setpoint"))
        .and(body_json(serde_json::json!({ "hz": 35.0 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&api)
        .await;
    let console = common::live_console(&bridge, common::api_client(&api), SafetyGate::Armed).await;

    console.gateway().select_tower(TowerSelection::On).await.unwrap();
    assert_eq!(console.view().selectors.tower, TowerSelection::On);
}

#[tokio::test]
async fn unreflected_command_goes_unconfirmed() {
    let bridge = Bridge::start().await;
    let api = MockServer::start().await;
    common::mount_ok(&api, "/api/fan/mode").await;
    let mut console = common::live_console(&bridge, common::api_client(&api), SafetyGate::Armed).await;

    let receipt = console.gateway().set_fan_mode(FanMode::Auto).await.unwrap();
    assert_eq!(console.view().selectors.fan_mode, FanMode::Auto);

    // The bridge keeps reporting manual mode; the window is three frames.
    let mut confirmations = Vec::new();
    for _ in 0..3 {
        bridge.send(&common::frame());
        if let ConsoleEvent::Frame { confirmations: c } =
            common::wait_for(&mut console, |e| matches!(e, ConsoleEvent::Frame { .. })).await
        {
            confirmations.extend(c);
        }
    }
    assert_eq!(confirmations, vec![Confirmation::Unconfirmed(receipt.token)]);
    // Telemetry overrides the projection.
    assert_eq!(console.view().selectors.fan_mode, FanMode::Manual);
}

#[tokio::test]
async fn command_finishing_after_close_changes_nothing() {
    let bridge = Bridge::start().await;
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/fan/mode"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&api)
        .await;
    let mut console = common::live_console(&bridge, common::api_client(&api), SafetyGate::Armed).await;

    let gateway = console.gateway();
    let in_flight = tokio::spawn(async move { gateway.set_fan_mode(FanMode::Auto).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    console.close();

    assert!(in_flight.await.unwrap().is_ok());
    let view = console.view();
    assert_eq!(view.selectors.fan_mode, FanMode::Manual);
    assert_eq!(view.pending_commands, 0);
    assert_eq!(
        console.gateway().set_fan_mode(FanMode::Auto).await,
        Err(CommandError::Closed)
    );
}
