//! Typed frame protocols for the WebSocket endpoints.
//!
//! Every frame is a JSON object with an `event` discriminator. Each
//! endpoint gets a [`SocketProtocol`] marker pairing the frames the client
//! sends with the frames the server sends; [`SocketHandle`](crate::SocketHandle)
//! is generic over it and decodes at the boundary.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Pairs the outgoing and incoming frame types of one socket endpoint.
pub trait SocketProtocol: Send + Sync + 'static {
    type Outgoing: Serialize + Send + Sync + 'static;
    type Incoming: DeserializeOwned + Send + Sync + 'static;
}

// ── Connection activation: /ws/connections/{id}/activate ─────────────

/// Protocol marker for testing/activating a stored connection.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionActivation;

impl SocketProtocol for ConnectionActivation {
    type Outgoing = ActivationRequest;
    type Incoming = ActivationEvent;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActivationRequest {
    /// Ask the server to start activating the connection.
    Activate,
}

/// Remote browser the user must drive to finish a `browser_login` connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBrowserSession {
    #[serde(default)]
    pub ws_url: String,
    /// Seconds until the remote browser is torn down.
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActivationEvent {
    /// Activation started; browser-login connections carry a remote session.
    Activate {
        #[serde(default)]
        session: Option<RemoteBrowserSession>,
    },
    /// Progress output from the activation.
    Output {
        #[serde(default)]
        output: serde_json::Value,
    },
    /// The connection is now active.
    Success {
        #[serde(default)]
        message: Option<String>,
    },
    Error {
        #[serde(default)]
        error: String,
    },
}

impl ActivationEvent {
    /// Whether the server will send nothing further for this activation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error { .. })
    }
}

// ── Live app sessions: /ws/store/apps/{slug} ─────────────────────────

/// Protocol marker for running a store app interactively.
#[derive(Debug, Clone, Copy)]
pub struct AppSession;

impl SocketProtocol for AppSession {
    type Outgoing = AppSessionRequest;
    type Incoming = AppSessionEvent;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AppSessionRequest {
    /// Submit one input to the app. `id` correlates the response frames.
    Input {
        id: String,
        input: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AppSessionEvent {
    /// A (possibly partial) chunk of output for request `id`.
    Output {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        output: serde_json::Value,
        #[serde(default)]
        session_id: Option<String>,
    },
    /// Request `id` finished.
    Success {
        #[serde(default)]
        id: Option<String>,
    },
    Error {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        error: String,
    },
}

impl AppSessionEvent {
    /// The request id this frame belongs to.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Output { id, .. } | Self::Success { id } | Self::Error { id, .. } => id.as_deref(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error { .. })
    }
}
