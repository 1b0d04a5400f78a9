//! Loop temperature classification.

/// Operator-facing severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ThermalStatus {
    Offline,
    Optimal,
    Warning,
    Critical,
}

impl ThermalStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "OFFLINE",
            Self::Optimal => "OPTIMAL",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for ThermalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified loop condition. Each variant fixes its status and label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThermalCondition {
    HighTempTrip,
    FreezeWarning,
    HighDischargeTemp,
    LowLoopTemp,
    OptimalOperation,
    SystemStopped,
}

impl ThermalCondition {
    pub const TRIP_F: f64 = 105.0;
    pub const HIGH_WARNING_F: f64 = 90.0;
    pub const LOW_WARNING_F: f64 = 60.0;
    pub const FREEZE_F: f64 = 45.0;

    /// Classify the loop temperature. Critical checks run before warnings,
    /// and the boundary values themselves fall on the milder side.
    #[must_use]
    pub fn classify(loop_temperature: f64, running: bool) -> Self {
        if !running {
            return Self::SystemStopped;
        }
        let t = loop_temperature;
        if t > Self::TRIP_F {
            Self::HighTempTrip
        } else if t < Self::FREEZE_F {
            Self::FreezeWarning
        } else if t > Self::HIGH_WARNING_F {
            Self::HighDischargeTemp
        } else if t < Self::LOW_WARNING_F {
            Self::LowLoopTemp
        } else {
            Self::OptimalOperation
        }
    }

    #[must_use]
    pub const fn status(self) -> ThermalStatus {
        match self {
            Self::HighTempTrip | Self::FreezeWarning => ThermalStatus::Critical,
            Self::HighDischargeTemp | Self::LowLoopTemp => ThermalStatus::Warning,
            Self::OptimalOperation => ThermalStatus::Optimal,
            Self::SystemStopped => ThermalStatus::Offline,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HighTempTrip => "HIGH TEMP TRIP",
            Self::FreezeWarning => "FREEZE WARNING",
            Self::HighDischargeTemp => "HIGH DISCHARGE TEMP",
            Self::LowLoopTemp => "LOW LOOP TEMP",
            Self::OptimalOperation => "OPTIMAL OPERATION",
            Self::SystemStopped => "SYSTEM STOPPED",
        }
    }
}

/// Thermal profile band, shown whether or not the loop is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThermalZone {
    FreezeRisk,
    WarningLow,
    Optimal,
    WarningHigh,
    CriticalHigh,
}

impl ThermalZone {
    #[must_use]
    pub fn of(loop_temperature: f64) -> Self {
        let t = loop_temperature;
        if t > ThermalCondition::TRIP_F {
            Self::CriticalHigh
        } else if t > ThermalCondition::HIGH_WARNING_F {
            Self::WarningHigh
        } else if t < ThermalCondition::FREEZE_F {
            Self::FreezeRisk
        } else if t < ThermalCondition::LOW_WARNING_F {
            Self::WarningLow
        } else {
            Self::Optimal
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FreezeRisk => "FREEZE RISK",
            Self::WarningLow => "WARNING LOW",
            Self::Optimal => "OPTIMAL",
            Self::WarningHigh => "WARNING HIGH",
            Self::CriticalHigh => "CRITICAL HIGH",
        }
    }
}
