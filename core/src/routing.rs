//! Valve routing and branch flow.
//!
//! Valve direction follows the operator's pump selector, not telemetry, so
//! the diagram does not flicker while a switch command is in transit.

use towerlink_types::{PlantSnapshot, PumpSelection};

/// Diverter position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValveDirection {
    /// Toward the primary pump branch.
    Down,
    /// Toward the backup pump branch.
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValveRouting {
    pub suction: ValveDirection,
    pub discharge: ValveDirection,
}

impl ValveRouting {
    #[must_use]
    pub fn from_selection(selection: PumpSelection) -> Self {
        let direction = match selection {
            PumpSelection::P102 => ValveDirection::Up,
            PumpSelection::P101 | PumpSelection::Off => ValveDirection::Down,
        };
        Self {
            suction: direction,
            discharge: direction,
        }
    }

    #[must_use]
    pub fn routes_to_backup(self) -> bool {
        self.suction == ValveDirection::Up
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowBranch {
    CommonSuction,
    PrimaryBranch,
    BackupBranch,
    CommonDischarge,
    TowerReturn,
}

/// Which pipe segments carry water in the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BranchFlows {
    pub common_suction: bool,
    pub primary: bool,
    pub backup: bool,
    pub common_discharge: bool,
    pub tower_return: bool,
}

impl BranchFlows {
    #[must_use]
    pub fn from_snapshot(snapshot: &PlantSnapshot) -> Self {
        let loop_running = snapshot.system.is_running;
        Self {
            common_suction: loop_running,
            primary: snapshot.primary.is_running(),
            backup: snapshot.backup.is_running(),
            common_discharge: loop_running,
            tower_return: loop_running,
        }
    }

    #[must_use]
    pub fn is_flowing(&self, branch: FlowBranch) -> bool {
        match branch {
            FlowBranch::CommonSuction => self.common_suction,
            FlowBranch::PrimaryBranch => self.primary,
            FlowBranch::BackupBranch => self.backup,
            FlowBranch::CommonDischarge => self.common_discharge,
            FlowBranch::TowerReturn => self.tower_return,
        }
    }
}

/// Fraction of full speed the active pump is turning, 0 when it is not running.
#[must_use]
pub fn flow_factor(snapshot: &PlantSnapshot) -> f64 {
    let pump = snapshot.active_pump();
    if pump.is_running() {
        (pump.frequency / towerlink_types::MAX_DRIVE_HZ).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
