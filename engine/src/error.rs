use thiserror::Error;

use towerlink_link::ApiError;
use towerlink_types::HertzError;

/// Why a command did not take effect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("read-only mode: plant commands are disabled for this session")]
    ReadOnly,
    #[error("telemetry link is not connected; wait for reconnection")]
    Offline,
    #[error(transparent)]
    InvalidFrequency(#[from] HertzError),
    #[error("invalid auto band: target {target_temp}, hysteresis {hysteresis}")]
    InvalidAutoBand { target_temp: f64, hysteresis: f64 },
    #[error("{action} rejected with HTTP {status}: {body}")]
    Api {
        action: &'static str,
        status: u16,
        body: String,
    },
    #[error("{action} failed: {message}")]
    Network {
        action: &'static str,
        message: String,
    },
    #[error("console is closed")]
    Closed,
}

impl CommandError {
    /// Refused by a gate before anything was validated or sent.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::ReadOnly | Self::Offline)
    }
}

impl From<ApiError> for CommandError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status {
                action,
                status,
                body,
            } => Self::Api {
                action,
                status,
                body,
            },
            ApiError::Network { action, message } | ApiError::Decode { action, message } => {
                Self::Network { action, message }
            }
            ApiError::Client(message) => Self::Network {
                action: "client setup",
                message,
            },
        }
    }
}
