//! Operator command line parsing.

use std::str::FromStr;

use thiserror::Error;
use towerlink_types::{FanMode, PumpSelection, TowerSelection};

pub const HELP: &str = "\
commands:
  pump P-101|OFF|P-102        select the running pump
  pump hz <n>                 set the active pump frequency (0-60)
  tower on|off                start or stop the tower fan
  fan mode auto|manual|toggle set the fan control mode
  fan hz <n>                  set the fan manual setpoint (0-60)
  fan band <target> <hyst>    configure automatic fan control
  reconnect                   restart the telemetry stream
  status                      print the current plant state
  help                        show this list
  quit                        close the console";

/// A request that goes to the control API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlantCommand {
    Pump(PumpSelection),
    PumpHz(f64),
    Tower(TowerSelection),
    FanMode(FanMode),
    ToggleFanMode,
    FanHz(f64),
    FanBand { target_temp: f64, hysteresis: f64 },
}

impl std::fmt::Display for PlantCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pump(target) => write!(f, "pump {target}"),
            Self::PumpHz(hz) => write!(f, "pump hz {hz}"),
            Self::Tower(target) => write!(f, "tower {target}"),
            Self::FanMode(mode) => write!(f, "fan mode {mode}"),
            Self::ToggleFanMode => f.write_str("fan mode toggle"),
            Self::FanHz(hz) => write!(f, "fan hz {hz}"),
            Self::FanBand {
                target_temp,
                hysteresis,
            } => write!(f, "fan band {target_temp} {hysteresis}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperatorCommand {
    Plant(PlantCommand),
    Reconnect,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("'{command}' expects {expected}")]
    Usage {
        command: &'static str,
        expected: &'static str,
    },
    #[error("'{0}' is not a number")]
    NotANumber(String),
}

fn number(word: &str) -> Result<f64, ParseError> {
    word.parse::<f64>()
        .map_err(|_| ParseError::NotANumber(word.to_string()))
}

impl FromStr for OperatorCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((head, rest)) = words.split_first() else {
            return Err(ParseError::Empty);
        };
        let usage = |command: &'static str, expected: &'static str| ParseError::Usage { command, expected };

        let plant = match (head.to_ascii_lowercase().as_str(), rest) {
            ("pump", ["hz", value]) => PlantCommand::PumpHz(number(value)?),
            ("pump", [target]) => target
                .parse()
                .map(PlantCommand::Pump)
                .map_err(|_| usage("pump", "P-101, OFF, P-102 or 'hz <n>'"))?,
            ("pump", _) => return Err(usage("pump", "P-101, OFF, P-102 or 'hz <n>'")),
            ("tower", [target]) => target
                .parse()
                .map(PlantCommand::Tower)
                .map_err(|_| usage("tower", "on or off"))?,
            ("tower", _) => return Err(usage("tower", "on or off")),
            ("fan", ["mode", mode]) if mode.eq_ignore_ascii_case("toggle") => {
                PlantCommand::ToggleFanMode
            }
            ("fan", ["mode", mode]) => mode
                .parse()
                .map(PlantCommand::FanMode)
                .map_err(|_| usage("fan mode", "auto, manual or toggle"))?,
            ("fan", ["hz", value]) => PlantCommand::FanHz(number(value)?),
            ("fan", ["band", target, hysteresis]) => PlantCommand::FanBand {
                target_temp: number(target)?,
                hysteresis: number(hysteresis)?,
            },
            ("fan", _) => {
                return Err(usage(
                    "fan",
                    "'mode <auto|manual|toggle>', 'hz <n>' or 'band <target> <hyst>'",
                ));
            }
            ("reconnect", []) => return Ok(Self::Reconnect),
            ("status", []) => return Ok(Self::Status),
            ("help" | "?", []) => return Ok(Self::Help),
            ("quit" | "exit", []) => return Ok(Self::Quit),
            _ => return Err(ParseError::Unknown(line.trim().to_string())),
        };
        Ok(Self::Plant(plant))
    }
}
