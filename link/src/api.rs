//! REST client for the control and status endpoints.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use towerlink_types::wire::{HealthReport, RawDriveReport, RawSensors, RawWeather};
use towerlink_types::{CommandToken, ControlCommand, RawTelemetryFrame};

/// Header carrying the correlation token on every command request.
pub const COMMAND_TOKEN_HEADER: &str = "X-Command-Token";

const CONNECT_TIMEOUT_SECS: u64 = 5;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_MAX_IDLE_PER_HOST: usize = 4;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{action} rejected with HTTP {status}: {body}")]
    Status {
        action: &'static str,
        status: u16,
        body: String,
    },
    #[error("{action} failed: {message}")]
    Network {
        action: &'static str,
        message: String,
    },
    #[error("{action} returned an unreadable body: {message}")]
    Decode {
        action: &'static str,
        message: String,
    },
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Dispatches control commands. One call is one HTTP request.
pub trait ControlApi: Send + Sync + 'static {
    fn send(
        &self,
        command: &ControlCommand,
        token: CommandToken,
    ) -> impl Future<Output = Result<serde_json::Value, ApiError>> + Send;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: Url,
}

fn client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        reqwest::header::USER_AGENT,
        HeaderValue::from_static(concat!("towerlink/", env!("CARGO_PKG_VERSION"))),
    );

    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .default_headers(default_headers)
}

impl ApiClient {
    pub fn new(mut base: Url, timeout: Duration) -> Result<Self, ApiError> {
        // Endpoints are joined relative to the base, so keep its path prefix.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = client_builder(timeout)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;
        Ok(Self { client, base })
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str, action: &'static str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Network {
                action,
                message: format!("bad endpoint {path}: {e}"),
            })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, action: &'static str) -> Result<T, ApiError> {
        let url = self.endpoint(path, action)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network(action, &e))?;
        let response = check_status(response, action).await?;
        response.json::<T>().await.map_err(|e| ApiError::Decode {
            action,
            message: e.to_string(),
        })
    }

    /// `GET /api/status`: the same shape as a stream frame.
    pub async fn full_status(&self) -> Result<RawTelemetryFrame, ApiError> {
        self.get("/api/status", "status poll").await
    }

    pub async fn sensors(&self) -> Result<RawSensors, ApiError> {
        self.get("/api/sensors", "sensor poll").await
    }

    pub async fn vfds(&self) -> Result<RawDriveReport, ApiError> {
        self.get("/api/vfds", "drive poll").await
    }

    pub async fn weather(&self) -> Result<RawWeather, ApiError> {
        self.get("/api/weather", "weather poll").await
    }

    pub async fn health(&self) -> Result<HealthReport, ApiError> {
        self.get("/api/health", "health check").await
    }
}

impl ControlApi for ApiClient {
    async fn send(
        &self,
        command: &ControlCommand,
        token: CommandToken,
    ) -> Result<serde_json::Value, ApiError> {
        let action = command.action();
        let url = self.endpoint(command.path(), action)?;
        let mut request = self
            .client
            .post(url)
            .header(COMMAND_TOKEN_HEADER, token.to_string());
        if let Some(body) = command.body() {
            request = request.json(&body);
        }

        tracing::debug!(%token, action, path = command.path(), "Dispatching command");
        let response = request.send().await.map_err(|e| network(action, &e))?;
        let response = check_status(response, action).await?;

        let text = response.text().await.map_err(|e| network(action, &e))?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }
}

fn network(action: &'static str, err: &reqwest::Error) -> ApiError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    ApiError::Network { action, message }
}

async fn check_status(
    response: reqwest::Response,
    action: &'static str,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = read_capped_error_body(response).await;
    tracing::warn!(action, status = status.as_u16(), "Control API rejected request");
    Err(ApiError::Status {
        action,
        status: status.as_u16(),
        body,
    })
}

pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
