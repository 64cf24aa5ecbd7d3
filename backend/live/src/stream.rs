//! Background task that reads the agent event WebSocket.

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

use pulsedrive_core::{ErrorCallback, EventCallback, PulseError};

use crate::wire::parse_message;

/// Why the read loop stopped.
enum StreamEnd {
    Shutdown,
    Failed(String),
}

/// Connect to `url` and forward events until the socket fails or `shutdown_rx` fires.
///
/// `on_error` runs at most once, and never after a requested shutdown.
pub(crate) async fn event_stream(
    url: String,
    on_event: EventCallback,
    on_error: ErrorCallback,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let ws = tokio::select! {
        res = tokio_tungstenite::connect_async(url.as_str()) => match res {
            Ok((ws, _)) => {
                tracing::info!(url = %url, "Live event stream connected");
                ws
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Live event stream connection failed");
                on_error(PulseError::LiveUnavailable(e.to_string()));
                return;
            }
        },
        _ = &mut shutdown_rx => {
            tracing::debug!(url = %url, "Live event stream closed before connecting");
            return;
        }
    };

    let (mut write, mut read) = ws.split();

    let end = loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match parse_message(text.as_str(), Utc::now()) {
                        Ok(Some(event)) => on_event(event),
                        Ok(None) => tracing::trace!("Ignoring non-JSON frame"),
                        Err(e) => tracing::warn!(error = %e, "Dropping malformed event frame"),
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "Live event stream received close frame");
                    break StreamEnd::Failed("server closed the event stream".to_string());
                }
                Some(Err(e)) => {
                    break StreamEnd::Failed(e.to_string());
                }
                None => {
                    break StreamEnd::Failed("event stream ended".to_string());
                }
                // Ping/Pong/Binary
                _ => {}
            },
            _ = &mut shutdown_rx => break StreamEnd::Shutdown,
        }
    };

    match end {
        StreamEnd::Shutdown => {
            let _ = write.send(Message::Close(None)).await;
            tracing::info!(url = %url, "Live event stream closed");
        }
        StreamEnd::Failed(reason) => {
            tracing::warn!(url = %url, reason = %reason, "Live event stream lost");
            on_error(PulseError::LiveUnavailable(reason));
        }
    }
}
