//! Translation and derived metrics for towerlink.
//!
//! Everything in this crate is a pure function of its inputs: feeding the
//! same frame through [`translate`] and [`derive`] twice yields identical
//! output. IO, timers and command dispatch live in `towerlink-link` and
//! `towerlink-engine`.

pub mod air_side;
pub mod color;
pub mod metrics;
pub mod routing;
pub mod thermal;
mod translate;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use color::{ColorStop, Gradient, GradientError, RETURN_GRADIENT, Rgb, SUPPLY_GRADIENT};
pub use metrics::{DerivedView, approach, delta_t, derive, steam_intensity};
pub use routing::{BranchFlows, FlowBranch, ValveRouting};
pub use thermal::{ThermalCondition, ThermalStatus, ThermalZone};
pub use translate::{reconcile_selectors, translate};
