//! Console orchestration for towerlink.
//!
//! [`Console`] owns the telemetry link and the single authoritative plant
//! snapshot. Telemetry is the only writer of plant state; the
//! [`CommandGateway`] may move the operator selectors optimistically after
//! a command succeeds, and the next frame overwrites them.

mod confirm;
mod console;
mod error;
mod gateway;
mod state;

pub use confirm::{Confirmation, ConfirmationTracker, Expectation};
pub use console::{Console, ConsoleEvent, ConsoleView};
pub use error::CommandError;
pub use gateway::{CommandGateway, CommandReceipt, SafetyGate, plan_pump_selection, plan_tower};
