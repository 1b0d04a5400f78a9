//! Operator-facing text. Everything here goes to stdout.

use std::fmt::Write as _;

use towerlink_engine::{CommandError, CommandReceipt, Confirmation, ConsoleView};
use towerlink_types::{ActuatorState, ConnectionState, SensorLinkStatus, WeatherStatus};

/// One line summarizing the plant as the console currently sees it.
#[must_use]
pub fn status_line(view: &ConsoleView) -> String {
    let mut line = format!("[{}]", connection_tag(view.connection));
    if view.read_only {
        line.push_str(" [READ-ONLY]");
    }

    let (Some(plant), Some(derived)) = (&view.plant, &view.derived) else {
        line.push_str(" waiting for telemetry");
        if let Some(error) = &view.last_error {
            let _ = write!(line, " ({error})");
        }
        return line;
    };

    let system = &plant.system;
    let _ = write!(
        line,
        " {} | loop {:.1}F return {:.1}F dT {:.1} approach {:.1} | zone {}",
        derived.condition.label(),
        system.loop_temperature,
        plant.readings.return_temperature,
        derived.delta_t,
        derived.approach,
        derived.zone.label(),
    );
    let _ = write!(
        line,
        " | pump {} {} flow {:.0}%",
        view.selectors.pump,
        drive(plant.active_pump()),
        derived.flow_factor * 100.0,
    );
    let _ = write!(
        line,
        " | fan {} {} sp {:.1}Hz {}",
        view.selectors.tower,
        drive(&plant.fan),
        plant.fan.setpoint,
        view.selectors.fan_mode,
    );

    let faults: Vec<String> = plant
        .faulted()
        .map(|d| format!("{} code {}", d.name(), d.fault_code))
        .collect();
    if !faults.is_empty() {
        let _ = write!(line, " | FAULT {}", faults.join(", "));
    }
    if plant.readings.sensors == SensorLinkStatus::Offline {
        line.push_str(" | sensors offline");
    }
    match plant.readings.weather {
        WeatherStatus::Stale => line.push_str(" | weather stale"),
        WeatherStatus::Offline => line.push_str(" | weather offline"),
        WeatherStatus::Online | WeatherStatus::Mock => {}
    }
    if view.pending_commands > 0 {
        let _ = write!(line, " | {} pending", view.pending_commands);
    }
    line
}

fn connection_tag(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Disconnected => "OFFLINE",
        ConnectionState::Connecting => "CONNECTING",
        ConnectionState::Connected => "LIVE",
        ConnectionState::Errored => "ERROR",
    }
}

fn drive(state: &ActuatorState) -> String {
    format!("{} {} {:.1}Hz", state.name(), state.run_state, state.frequency)
}

#[must_use]
pub fn command_outcome(label: &str, outcome: &Result<CommandReceipt, CommandError>) -> String {
    match outcome {
        Ok(receipt) => {
            let actions: Vec<&str> = receipt.commands.iter().map(|c| c.action()).collect();
            format!("ok {} {label}: {}", receipt.token, actions.join(", "))
        }
        Err(err) if err.is_rejection() => format!("rejected {label}: {err}"),
        Err(err) => format!("failed {label}: {err}"),
    }
}

#[must_use]
pub fn confirmation(confirmation: Confirmation) -> String {
    match confirmation {
        Confirmation::Confirmed(token) => format!("confirmed {token}"),
        Confirmation::Unconfirmed(token) => {
            format!("unconfirmed {token}: telemetry never reflected the command")
        }
    }
}
