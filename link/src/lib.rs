//! I/O for towerlink: the telemetry stream session and the control API.
//!
//! - [`TelemetryLink`] owns the single telemetry transport, reconnects on a
//!   fixed interval, and hands out parsed frames as [`LinkEvent`]s.
//! - [`ApiClient`] posts control commands and reads the status endpoints.
//!   The command path is reached through the [`ControlApi`] trait so the
//!   gateway can be exercised without a network.

mod api;
mod session;
mod transport;

pub use api::{ApiClient, ApiError, COMMAND_TOKEN_HEADER, ControlApi, read_capped_error_body};
pub use session::{DEFAULT_RECONNECT_INTERVAL, LinkEvent, TelemetryLink};
pub use transport::{Connector, FrameStream, TransportError, WsConnector, WsStream};
