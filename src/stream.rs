//! WebSocket connection to the stats stream.
//!
//! [`StreamConnection::open`] connects to `<scheme>//<base>/ws`; call
//! [`StreamConnection::next_payload`] to receive text payloads until the server
//! closes the socket. Nothing is ever sent by the monitor.

use crate::endpoint::PageOrigin;
use crate::error::MonitorError;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Path of the stats socket on the resolved base.
pub const STREAM_PATH: &str = "/ws";

/// Socket URL for a resolved base, e.g. `ws://localhost:11235/ws`.
pub fn stream_url(origin: &PageOrigin, base: &str) -> String {
    format!("{}//{}{}", origin.socket_scheme(), base, STREAM_PATH)
}

/// One open stats socket.
pub struct StreamConnection {
    url: String,
    ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl StreamConnection {
    pub async fn open(url: &str) -> Result<Self, MonitorError> {
        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| MonitorError::Connection(format!("connecting to {}: {}", url, e)))?;
        tracing::info!(url, "Connected to stats stream");
        Ok(Self {
            url: url.to_string(),
            ws_stream,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Next text payload.
    ///
    /// `Ok(None)` once the server closes the socket or the stream ends. Ping/pong is
    /// answered by tungstenite; binary frames are ignored.
    pub async fn next_payload(&mut self) -> Result<Option<String>, MonitorError> {
        while let Some(msg) = self.ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => return Ok(Some(text)),
                Ok(Message::Binary(data)) => {
                    tracing::trace!(len = data.len(), "Ignoring binary frame");
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Ok(Message::Close(frame)) => {
                    tracing::info!(url = %self.url, ?frame, "Stats stream closed by server");
                    return Ok(None);
                }
                Err(e) => {
                    return Err(MonitorError::Connection(format!(
                        "receiving from {}: {}",
                        self.url, e
                    )));
                }
            }
        }
        Ok(None)
    }
}
