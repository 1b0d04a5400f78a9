//! Telemetry transport seam.
//!
//! [`Connector`] opens a [`FrameStream`]; the session driver only ever sees
//! text payloads, end-of-stream, or a transport error. The production
//! implementation speaks WebSocket through `tokio-tungstenite`.

use std::future::Future;

use futures_util::StreamExt;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connect to {url} failed: {message}")]
    Connect { url: String, message: String },
    #[error("telemetry stream error: {0}")]
    Read(String),
}

/// An open telemetry stream.
pub trait FrameStream: Send {
    /// Next text payload. `None` once the peer has closed the stream.
    fn next_text(&mut self) -> impl Future<Output = Option<Result<String, TransportError>>> + Send;

    /// Close the stream. Called at most once, on local teardown.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

pub trait Connector: Send + Sync + 'static {
    type Stream: FrameStream + 'static;

    fn connect(&self, url: &Url)
    -> impl Future<Output = Result<Self::Stream, TransportError>> + Send;
}

/// WebSocket connector for `ws://` endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    type Stream = WsStream;

    async fn connect(&self, url: &Url) -> Result<WsStream, TransportError> {
        let (inner, response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        tracing::debug!(url = %url, status = %response.status(), "Telemetry socket open");
        Ok(WsStream { inner })
    }
}

pub struct WsStream {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl FrameStream for WsStream {
    async fn next_text(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.inner.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => {
                        tracing::warn!(bytes = bytes.len(), "Dropping non-UTF-8 binary message");
                    }
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "Telemetry socket closed by peer");
                    return None;
                }
                // Pings are answered by tungstenite itself.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => return Some(Err(TransportError::Read(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.inner.close(None).await {
            tracing::debug!("Telemetry socket close: {e}");
        }
    }
}
