//! Operator command gateway.
//!
//! Every command path runs the same checks in the same order: closed
//! console, safety gate, offline gate, argument validation. Only then is
//! anything sent. A sequence stops at its first failed request and is never
//! retried. Selector projections are written after the whole sequence
//! succeeds and are overwritten by the next telemetry frame regardless.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use towerlink_link::ControlApi;
use towerlink_types::{
    ActivePumpReport, CommandToken, ControlCommand, FanMode, Hertz, HertzError, PlantSnapshot,
    PumpSelection, SelectorState, TowerSelection,
};

use crate::confirm::Expectation;
use crate::error::CommandError;
use crate::state::{SharedState, lock};

/// Process-wide write protection, fixed when the console is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyGate {
    ReadOnly,
    Armed,
}

impl SafetyGate {
    #[must_use]
    pub fn from_read_only(read_only: bool) -> Self {
        if read_only { Self::ReadOnly } else { Self::Armed }
    }

    #[must_use]
    pub fn is_read_only(self) -> bool {
        self == Self::ReadOnly
    }
}

/// A dispatched sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandReceipt {
    pub token: CommandToken,
    pub commands: Vec<ControlCommand>,
}

/// Requests for a pump selection.
///
/// OFF stops the active pump. Otherwise a switch precedes the start when
/// the reported active pump differs from `target`; a `failed` report or no
/// telemetry yet counts as differing. The start is always sent, since the
/// target may already be active but stopped.
#[must_use]
pub fn plan_pump_selection(
    target: PumpSelection,
    latest: Option<&PlantSnapshot>,
) -> Vec<ControlCommand> {
    let wanted = match target {
        PumpSelection::Off => return vec![ControlCommand::StopPump],
        PumpSelection::P101 => ActivePumpReport::Primary,
        PumpSelection::P102 => ActivePumpReport::Backup,
    };
    let reported = latest.map(|snapshot| snapshot.readings.active_pump_report);
    if reported == Some(wanted) {
        vec![ControlCommand::StartPump]
    } else {
        vec![ControlCommand::SwitchPump, ControlCommand::StartPump]
    }
}

/// Requests for a tower selection.
///
/// ON re-sends the reported setpoint when telemetry shows the fan in manual
/// mode with a nonzero setpoint; otherwise automatic control governs and
/// nothing is sent. OFF drives the fan to 0 Hz.
pub fn plan_tower(
    target: TowerSelection,
    latest: Option<&PlantSnapshot>,
) -> Result<Vec<ControlCommand>, HertzError> {
    match target {
        TowerSelection::Off => Ok(vec![ControlCommand::SetFanFrequency(Hertz::ZERO)]),
        TowerSelection::On => match latest.map(|snapshot| &snapshot.fan) {
            Some(fan) if fan.manual_mode && fan.setpoint > 0.0 => {
                Ok(vec![ControlCommand::SetFanFrequency(Hertz::new(fan.setpoint)?)])
            }
            _ => Ok(Vec::new()),
        },
    }
}

/// The one selector a successful sequence moves.
#[derive(Debug, Clone, Copy)]
enum Projection {
    Pump(PumpSelection),
    Tower(TowerSelection),
    FanMode(FanMode),
}

impl Projection {
    fn apply(self, selectors: &mut SelectorState) {
        match self {
            Self::Pump(pump) => selectors.pump = pump,
            Self::Tower(tower) => selectors.tower = tower,
            Self::FanMode(mode) => selectors.fan_mode = mode,
        }
    }
}

/// One planned sequence and what it changes locally once it succeeds.
struct Plan {
    commands: Vec<ControlCommand>,
    projection: Option<Projection>,
    expectations: Vec<Expectation>,
}

impl Plan {
    fn new(commands: Vec<ControlCommand>) -> Self {
        Self {
            commands,
            projection: None,
            expectations: Vec::new(),
        }
    }

    fn project(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

/// What the gates saw when a command was admitted.
struct Admitted {
    selectors: SelectorState,
    plant: Option<PlantSnapshot>,
}

/// Cloneable handle that issues operator commands.
pub struct CommandGateway<A> {
    api: Arc<A>,
    gate: SafetyGate,
    state: SharedState,
    tokens: Arc<AtomicU64>,
}

impl<A> Clone for CommandGateway<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            gate: self.gate,
            state: Arc::clone(&self.state),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<A: ControlApi> CommandGateway<A> {
    pub(crate) fn new(api: Arc<A>, gate: SafetyGate, state: SharedState) -> Self {
        Self {
            api,
            gate,
            state,
            tokens: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn gate(&self) -> SafetyGate {
        self.gate
    }

    pub async fn select_pump(&self, target: PumpSelection) -> Result<CommandReceipt, CommandError> {
        let admitted = self.admit("pump selection")?;
        let commands = plan_pump_selection(target, admitted.plant.as_ref());
        let plan = Plan::new(commands)
            .project(Projection::Pump(target))
            .expect(Expectation::Pump(target));
        self.execute(plan).await
    }

    pub async fn select_tower(&self, target: TowerSelection) -> Result<CommandReceipt, CommandError> {
        let admitted = self.admit("tower selection")?;
        let commands = plan_tower(target, admitted.plant.as_ref())?;
        let tracked = !commands.is_empty();
        let mut plan = Plan::new(commands).project(Projection::Tower(target));
        if tracked {
            plan = plan.expect(Expectation::Tower(target));
        }
        self.execute(plan).await
    }

    /// Flip the fan mode relative to the local projection.
    pub async fn toggle_fan_mode(&self) -> Result<CommandReceipt, CommandError> {
        let admitted = self.admit("fan mode toggle")?;
        let mode = admitted.selectors.fan_mode.toggled();
        self.execute(fan_mode_plan(mode)).await
    }

    pub async fn set_fan_mode(&self, mode: FanMode) -> Result<CommandReceipt, CommandError> {
        self.admit("fan mode change")?;
        self.execute(fan_mode_plan(mode)).await
    }

    pub async fn set_fan_frequency(&self, hz: f64) -> Result<CommandReceipt, CommandError> {
        self.admit("fan frequency set")?;
        let hz = Hertz::new(hz)?;
        let plan = Plan::new(vec![ControlCommand::SetFanFrequency(hz)])
            .expect(Expectation::FanSetpoint(hz));
        self.execute(plan).await
    }

    pub async fn set_pump_frequency(&self, hz: f64) -> Result<CommandReceipt, CommandError> {
        self.admit("pump frequency set")?;
        let hz = Hertz::new(hz)?;
        let plan = Plan::new(vec![ControlCommand::SetPumpFrequency(hz)])
            .expect(Expectation::PumpFrequency(hz));
        self.execute(plan).await
    }

    /// Configure the automatic fan control band. Not reflected in telemetry,
    /// so never tracked for confirmation.
    pub async fn set_fan_auto_band(
        &self,
        target_temp: f64,
        hysteresis: f64,
    ) -> Result<CommandReceipt, CommandError> {
        self.admit("fan auto band config")?;
        if !target_temp.is_finite() || !hysteresis.is_finite() || hysteresis <= 0.0 {
            return Err(CommandError::InvalidAutoBand {
                target_temp,
                hysteresis,
            });
        }
        let plan = Plan::new(vec![ControlCommand::SetFanAutoBand {
            target_temp,
            hysteresis,
        }]);
        self.execute(plan).await
    }

    fn admit(&self, action: &'static str) -> Result<Admitted, CommandError> {
        let state = lock(&self.state);
        if state.closed {
            return Err(CommandError::Closed);
        }
        if self.gate.is_read_only() {
            tracing::warn!(action, "Command blocked: read-only mode");
            return Err(CommandError::ReadOnly);
        }
        if !state.connection.is_connected() {
            tracing::warn!(action, connection = %state.connection, "Command refused: offline");
            return Err(CommandError::Offline);
        }
        Ok(Admitted {
            selectors: state.selectors,
            plant: state.plant.clone(),
        })
    }

    async fn execute(&self, plan: Plan) -> Result<CommandReceipt, CommandError> {
        let token = CommandToken::new(self.tokens.fetch_add(1, Ordering::Relaxed) + 1);

        for command in &plan.commands {
            if let Err(e) = self.api.send(command, token).await {
                let err = CommandError::from(e);
                tracing::warn!(%token, action = command.action(), error = %err, "Command failed");
                return Err(err);
            }
        }

        let mut state = lock(&self.state);
        if state.closed {
            tracing::debug!(%token, "Command finished after teardown; result ignored");
        } else {
            if let Some(projection) = plan.projection {
                projection.apply(&mut state.selectors);
            }
            state.confirmations.track(token, plan.expectations);
        }
        drop(state);

        tracing::info!(%token, commands = plan.commands.len(), "Command sequence accepted");
        Ok(CommandReceipt {
            token,
            commands: plan.commands,
        })
    }
}

fn fan_mode_plan(mode: FanMode) -> Plan {
    Plan::new(vec![ControlCommand::SetFanMode(mode)])
        .project(Projection::FanMode(mode))
        .expect(Expectation::FanMode(mode))
}
