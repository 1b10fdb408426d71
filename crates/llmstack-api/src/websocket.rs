//! JSON WebSocket helper shared by every live feature.
//!
//! [`SocketHandle`] owns one connection. Outgoing frames are serialized
//! from the protocol's typed requests; incoming text frames are decoded
//! into the protocol's event type and handed to an optional message
//! handler and to every broadcast subscriber. The helper never interprets
//! events and never reconnects: callers decide what a closed socket means.
//!
//! # Example
//!
//! ```rust,ignore
//! use llmstack_api::protocol::{ActivationRequest, ConnectionActivation};
//! use llmstack_api::websocket::{SocketAuth, SocketHandle};
//!
//! let url = client.websocket_url("ws/connections/42/activate")?;
//! let socket = SocketHandle::<ConnectionActivation>::connect(url, SocketAuth::default()).await?;
//! socket.set_on_message(|event| println!("{event:?}"));
//! socket.send(&ActivationRequest::Activate)?;
//! socket.closed().await;
//! ```

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::protocol::SocketProtocol;

// ── Broadcast channel capacity ───────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 256;

type MessageHandler<T> = Box<dyn Fn(Arc<T>) + Send + Sync>;

// ── SocketAuth ───────────────────────────────────────────────────────

/// Credentials replayed on the WebSocket upgrade request.
#[derive(Debug, Clone, Default)]
pub struct SocketAuth {
    /// `Cookie` header value carrying the session.
    pub cookie: Option<String>,
    /// API token, sent as `Authorization: Token ...`.
    pub token: Option<SecretString>,
}

// ── SocketHandle ─────────────────────────────────────────────────────

/// Handle to one open WebSocket speaking protocol `P`.
pub struct SocketHandle<P: SocketProtocol> {
    outgoing: mpsc::UnboundedSender<String>,
    events: broadcast::Sender<Arc<P::Incoming>>,
    handler: Arc<ArcSwapOption<MessageHandler<P::Incoming>>>,
    cancel: CancellationToken,
    done: CancellationToken,
}

impl<P: SocketProtocol> SocketHandle<P> {
    /// Open the socket and spawn its I/O task.
    ///
    /// Returns once the upgrade handshake has completed, so connection
    /// failures surface here rather than on the first `send`.
    pub async fn connect(url: Url, auth: SocketAuth) -> Result<Self, Error> {
        tracing::info!(url = %url, "Connecting to WebSocket");

        let uri: tungstenite::http::Uri = url
            .as_str()
            .parse()
            .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

        let mut request = ClientRequestBuilder::new(uri);
        if let Some(cookie) = auth.cookie {
            request = request.with_header("Cookie", cookie);
        }
        if let Some(token) = auth.token {
            request = request.with_header("Authorization", format!("Token {}", token.expose_secret()));
        }

        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        tracing::info!("WebSocket connected");

        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let handler = Arc::new(ArcSwapOption::empty());
        let cancel = CancellationToken::new();
        let done = CancellationToken::new();

        let io = SocketIo::<P> {
            events: events.clone(),
            handler: Arc::clone(&handler),
            cancel: cancel.clone(),
        };
        let task_done = done.clone();
        tokio::spawn(async move {
            if let Err(e) = io.run(ws_stream, outgoing_rx).await {
                tracing::warn!(error = %e, "WebSocket ended with error");
            }
            task_done.cancel();
        });

        Ok(Self {
            outgoing,
            events,
            handler,
            cancel,
            done,
        })
    }

    /// Serialize `message` and queue it as a text frame.
    pub fn send(&self, message: &P::Outgoing) -> Result<(), Error> {
        let text = serde_json::to_string(message).map_err(|e| Error::Protocol(e.to_string()))?;
        self.outgoing
            .send(text)
            .map_err(|_| Error::WebSocketClosed {
                code: 1000,
                reason: "socket already closed".into(),
            })
    }

    /// Register the callback invoked for every decoded incoming frame.
    ///
    /// Replaces any previous handler. Frames that arrive before a handler
    /// is set still reach receivers from [`subscribe`](Self::subscribe).
    pub fn set_on_message(&self, handler: impl Fn(Arc<P::Incoming>) + Send + Sync + 'static) {
        let boxed: MessageHandler<P::Incoming> = Box::new(handler);
        self.handler.store(Some(Arc::new(boxed)));
    }

    /// A new receiver of decoded incoming frames.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<P::Incoming>> {
        self.events.subscribe()
    }

    /// Send a close frame and stop the I/O task.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.done.is_cancelled()
    }

    /// Resolves once the connection has ended, for whatever reason.
    pub async fn closed(&self) {
        self.done.cancelled().await;
    }
}

impl<P: SocketProtocol> Drop for SocketHandle<P> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── I/O task ─────────────────────────────────────────────────────────

struct SocketIo<P: SocketProtocol> {
    events: broadcast::Sender<Arc<P::Incoming>>,
    handler: Arc<ArcSwapOption<MessageHandler<P::Incoming>>>,
    cancel: CancellationToken,
}

impl<P: SocketProtocol> SocketIo<P> {
    async fn run<S>(
        &self,
        ws_stream: tokio_tungstenite::WebSocketStream<S>,
        mut outgoing_rx: mpsc::UnboundedReceiver<String>,
    ) -> Result<(), Error>
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    tracing::debug!("closing WebSocket");
                    let _ = write.send(tungstenite::Message::Close(None)).await;
                    return Ok(());
                }
                Some(text) = outgoing_rx.recv() => {
                    tracing::trace!(bytes = text.len(), "WebSocket send");
                    write
                        .send(tungstenite::Message::text(text))
                        .await
                        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
                }
                frame = read.next() => match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => self.dispatch(&text),
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        return match frame {
                            Some(cf) if u16::from(cf.code) != 1000 => Err(Error::WebSocketClosed {
                                code: cf.code.into(),
                                reason: cf.reason.as_str().to_owned(),
                            }),
                            _ => {
                                tracing::info!("WebSocket closed by server");
                                Ok(())
                            }
                        };
                    }
                    Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
                    None => {
                        tracing::info!("WebSocket stream ended");
                        return Ok(());
                    }
                    // Ping/pong are answered by tungstenite; binary frames are not part of any protocol.
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    fn dispatch(&self, text: &str) {
        let Some(event) = decode_frame::<P>(text) else {
            return;
        };
        let event = Arc::new(event);
        if let Some(handler) = self.handler.load_full() {
            (*handler)(Arc::clone(&event));
        }
        // No subscribers is fine; the handler may be the only consumer.
        let _ = self.events.send(event);
    }
}

/// Decode one text frame, logging and dropping frames the protocol rejects.
pub(crate) fn decode_frame<P: SocketProtocol>(text: &str) -> Option<P::Incoming> {
    match serde_json::from_str(text) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(error = %e, "dropping undecodable WebSocket frame");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::protocol::{ActivationEvent, AppSession, AppSessionEvent, ConnectionActivation};

    #[test]
    fn decode_frame_accepts_known_events() {
        let evt = decode_frame::<ConnectionActivation>(r#"{"event":"success"}"#);
        assert_eq!(evt, Some(ActivationEvent::Success { message: None }));
    }

    #[test]
    fn decode_frame_drops_malformed_json() {
        assert!(decode_frame::<ConnectionActivation>("not json at all").is_none());
        assert!(decode_frame::<AppSession>(r#"{"no_event": true}"#).is_none());
    }

    #[test]
    fn decode_frame_uses_the_protocol_types() {
        let evt = decode_frame::<AppSession>(r#"{"event":"error","id":"r9","error":"quota"}"#);
        assert_eq!(
            evt,
            Some(AppSessionEvent::Error {
                id: Some("r9".into()),
                error: "quota".into()
            })
        );
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails_fast() {
        let url = Url::parse("ws://127.0.0.1:9/ws/connections/1/activate").unwrap();
        let res = SocketHandle::<ConnectionActivation>::connect(url, SocketAuth::default()).await;
        assert!(matches!(res, Err(Error::WebSocketConnect(_))));
    }
}
