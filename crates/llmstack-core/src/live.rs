// ── Live sessions ──
//
// WebSocket-backed flows layered on the data store: activating a stored
// connection, and running a published app interactively. The transport
// only decodes frames; the request/response bookkeeping lives here.

use std::sync::Arc;

use llmstack_api::models::ResourceId;
use llmstack_api::protocol::{
    ActivationEvent, ActivationRequest, AppSession, AppSessionEvent, AppSessionRequest,
    ConnectionActivation,
};
use llmstack_api::{SocketAuth, SocketHandle};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::store::{DataStore, NodeKey};

/// How a connection activation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    Activated { message: Option<String> },
    Failed { error: String },
}

/// Everything an app produced for one input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppRunOutput {
    /// Output frames in arrival order.
    pub chunks: Vec<Value>,
    /// Server session to pass along with the next input.
    pub session_id: Option<String>,
}

impl DataStore {
    fn socket_auth(&self) -> SocketAuth {
        SocketAuth {
            cookie: self.client().cookie_header(),
            token: self.client().token().cloned(),
        }
    }

    /// Activate a stored connection and wait for the server's verdict.
    ///
    /// Every frame is handed to `on_event` (browser-login connections send
    /// a remote session to drive). The connections node is refreshed
    /// afterwards either way, since the server updates the status.
    pub async fn activate_connection(
        &self,
        id: &ResourceId,
        mut on_event: impl FnMut(&ActivationEvent),
    ) -> Result<ActivationOutcome, CoreError> {
        let url = self
            .client()
            .websocket_url(&format!("ws/connections/{id}/activate"))?;
        let socket = SocketHandle::<ConnectionActivation>::connect(url, self.socket_auth()).await?;
        let mut events = socket.subscribe();
        socket.send(&ActivationRequest::Activate)?;

        let outcome = loop {
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Ok(event) => {
                        on_event(&event);
                        match event.as_ref() {
                            ActivationEvent::Success { message } => {
                                break ActivationOutcome::Activated { message: message.clone() };
                            }
                            ActivationEvent::Error { error } => {
                                break ActivationOutcome::Failed { error: error.clone() };
                            }
                            ActivationEvent::Activate { .. } | ActivationEvent::Output { .. } => {}
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "activation events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(closed_early("activation"));
                    }
                },
                () = socket.closed() => return Err(closed_early("activation")),
            }
        };

        socket.close();
        debug!(connection = %id, ?outcome, "activation finished");
        self.invalidate(&NodeKey::Connections).await;
        Ok(outcome)
    }

    /// Open an interactive session with the published app `slug`.
    pub async fn open_app_session(&self, slug: &str) -> Result<AppSessionRunner, CoreError> {
        let url = self.client().websocket_url(&format!("ws/store/apps/{slug}"))?;
        let socket = SocketHandle::<AppSession>::connect(url, self.socket_auth()).await?;
        let events = socket.subscribe();
        Ok(AppSessionRunner {
            socket,
            events,
            session_id: None,
        })
    }
}

/// An open app session. Inputs run one at a time; the server session id
/// from earlier outputs is sent with later inputs so the app keeps context.
pub struct AppSessionRunner {
    socket: SocketHandle<AppSession>,
    events: broadcast::Receiver<Arc<AppSessionEvent>>,
    session_id: Option<String>,
}

impl AppSessionRunner {
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Submit `input` and collect output until the app finishes.
    ///
    /// `on_output` sees each chunk as it streams in.
    pub async fn run(
        &mut self,
        input: Value,
        mut on_output: impl FnMut(&Value),
    ) -> Result<AppRunOutput, CoreError> {
        let request_id = Uuid::new_v4().to_string();
        self.socket.send(&AppSessionRequest::Input {
            id: request_id.clone(),
            input,
            session_id: self.session_id.clone(),
        })?;

        let mut chunks = Vec::new();
        loop {
            tokio::select! {
                biased;
                event = self.events.recv() => match event {
                    Ok(event) => {
                        if event.request_id().is_some_and(|id| id != request_id) {
                            continue;
                        }
                        match event.as_ref() {
                            AppSessionEvent::Output { output, session_id, .. } => {
                                if session_id.is_some() {
                                    self.session_id.clone_from(session_id);
                                }
                                on_output(output);
                                chunks.push(output.clone());
                            }
                            AppSessionEvent::Success { .. } => {
                                return Ok(AppRunOutput {
                                    chunks,
                                    session_id: self.session_id.clone(),
                                });
                            }
                            AppSessionEvent::Error { error, .. } => {
                                return Err(CoreError::Live { message: error.clone() });
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "app output dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return Err(closed_early("app session")),
                },
                () = self.socket.closed() => return Err(closed_early("app session")),
            }
        }
    }

    pub fn close(&self) {
        self.socket.close();
    }
}

fn closed_early(what: &str) -> CoreError {
    CoreError::Live {
        message: format!("{what} socket closed before the server finished"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_early_names_the_session() {
        let err = closed_early("activation");
        assert_eq!(
            err.to_string(),
            "Live session failed: activation socket closed before the server finished"
        );
    }

    #[tokio::test]
    async fn activation_against_unreachable_server_fails() {
        let client = llmstack_api::ApiClient::new(
            "http://127.0.0.1:9",
            &llmstack_api::TransportConfig::default(),
            None,
        )
        .unwrap_or_else(|e| panic!("client: {e}"));
        let store = DataStore::new(client);

        let res = store.activate_connection(&ResourceId::Number(1), |_| {}).await;
        assert!(matches!(res, Err(CoreError::Live { .. })));
        // Nothing ran, so nothing was refreshed.
        assert_eq!(store.connections().status(), crate::store::NodeStatus::Uninitialized);
    }
}
