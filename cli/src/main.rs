//! towerlink - operator console for a cooling-tower loop.
//!
//! # Event Loop
//!
//! Everything runs on one current-thread runtime:
//!
//! 1. Telemetry events are applied to the console as they arrive; every
//!    frame prints a status line.
//! 2. Operator lines from stdin are parsed; plant commands are dispatched
//!    on their own task through a gateway handle so a slow API call never
//!    stalls telemetry.
//! 3. With a poll interval configured, the status endpoint is fetched while
//!    the stream is down.
//!
//! Quit or end of input closes the console. Command tasks still in flight
//! may finish but can no longer touch state.

mod commands;
mod input;
mod report;

use std::io::stderr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{Interval, MissedTickBehavior};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use towerlink_config::ConsoleConfig;
use towerlink_engine::{CommandError, CommandGateway, CommandReceipt, Console, ConsoleEvent, SafetyGate};
use towerlink_link::{ApiClient, TelemetryLink};

use crate::commands::{HELP, OperatorCommand, PlantCommand};
use crate::input::LinePump;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries the operator output.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(stderr))
        .with(env_filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let config = ConsoleConfig::load().context("failed to load configuration")?;
    tracing::info!(
        telemetry = %config.telemetry_url,
        api = %config.api_url,
        read_only = config.read_only,
        "Configuration loaded"
    );

    let api = ApiClient::new(config.api_url.clone(), config.request_timeout)
        .context("failed to build API client")?;
    let link = TelemetryLink::websocket(config.telemetry_url.clone(), config.reconnect_interval);
    let mut console = Console::new(
        link,
        api.clone(),
        SafetyGate::from_read_only(config.read_only),
        config.confirmation_window,
    );

    if config.read_only {
        println!("read-only session: plant commands are disabled");
    }
    console.connect();

    run(&mut console, &api, config.poll_interval).await;

    console.close();
    Ok(())
}

async fn run(console: &mut Console, api: &ApiClient, poll_interval: Option<Duration>) {
    let mut input = LinePump::stdin();
    let mut poll = poll_interval.map(|every| {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    });

    loop {
        tokio::select! {
            event = console.next_event() => {
                let Some(event) = event else { break };
                on_event(console, event);
            }
            line = input.next_line() => {
                let Some(line) = line else {
                    tracing::info!("End of operator input");
                    break;
                };
                if !on_line(console, &line) {
                    break;
                }
            }
            () = tick(poll.as_mut()) => {
                if !console.connection().is_connected() {
                    poll_status(console, api).await;
                }
            }
        }
    }

    input.shutdown();
}

async fn tick(poll: Option<&mut Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn on_event(console: &Console, event: ConsoleEvent) {
    match event {
        ConsoleEvent::Frame { confirmations } => {
            for confirmation in confirmations {
                println!("{}", report::confirmation(confirmation));
            }
            println!("{}", report::status_line(&console.view()));
        }
        ConsoleEvent::Connection(state) => {
            tracing::debug!(state = state.as_str(), "Connection state changed");
            println!("{}", report::status_line(&console.view()));
        }
        ConsoleEvent::Error(message) => {
            tracing::warn!("Telemetry link error: {message}");
        }
    }
}

/// Returns `false` when the operator asked to quit.
fn on_line(console: &mut Console, line: &str) -> bool {
    if line.trim().is_empty() {
        return true;
    }
    let command = match line.parse::<OperatorCommand>() {
        Ok(command) => command,
        Err(e) => {
            println!("{e}");
            return true;
        }
    };

    match command {
        OperatorCommand::Plant(command) => {
            let gateway = console.gateway();
            tokio::spawn(async move {
                let outcome = dispatch(&gateway, command).await;
                if let Err(e) = &outcome {
                    tracing::warn!(command = %command, "Command not applied: {e}");
                }
                println!("{}", report::command_outcome(&command.to_string(), &outcome));
            });
        }
        OperatorCommand::Reconnect => {
            console.reconnect();
            println!("reconnecting");
        }
        OperatorCommand::Status => println!("{}", report::status_line(&console.view())),
        OperatorCommand::Help => println!("{HELP}"),
        OperatorCommand::Quit => return false,
    }
    true
}

async fn dispatch(
    gateway: &CommandGateway<ApiClient>,
    command: PlantCommand,
) -> Result<CommandReceipt, CommandError> {
    match command {
        PlantCommand::Pump(target) => gateway.select_pump(target).await,
        PlantCommand::PumpHz(hz) => gateway.set_pump_frequency(hz).await,
        PlantCommand::Tower(target) => gateway.select_tower(target).await,
        PlantCommand::FanMode(mode) => gateway.set_fan_mode(mode).await,
        PlantCommand::ToggleFanMode => gateway.toggle_fan_mode().await,
        PlantCommand::FanHz(hz) => gateway.set_fan_frequency(hz).await,
        PlantCommand::FanBand {
            target_temp,
            hysteresis,
        } => gateway.set_fan_auto_band(target_temp, hysteresis).await,
    }
}

async fn poll_status(console: &mut Console, api: &ApiClient) {
    match api.full_status().await {
        Ok(frame) => {
            for confirmation in console.apply_polled_frame(&frame) {
                println!("{}", report::confirmation(confirmation));
            }
            println!("{}", report::status_line(&console.view()));
        }
        Err(e) => tracing::warn!("Status poll failed: {e}"),
    }
}
