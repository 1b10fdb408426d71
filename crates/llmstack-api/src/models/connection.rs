use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ResourceId;

/// A kind of connection the user can create (`/api/connection_types`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ConnectionType {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub provider_slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// `credentials`, `browser_login`, `oauth2`, ...
    #[serde(default)]
    pub base_connection_type: String,
    #[serde(default)]
    pub config_schema: serde_json::Value,
    #[serde(default)]
    pub config_ui_schema: serde_json::Value,
}

/// Lifecycle state of a stored connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ConnectionStatus {
    #[default]
    Created,
    Connecting,
    Active,
    Failed,
    Locked,
    #[serde(other)]
    Unknown,
}

/// A stored connection (`/api/connections`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Connection {
    pub id: ResourceId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub connection_type_slug: String,
    #[serde(default)]
    pub provider_slug: String,
    #[serde(default)]
    pub base_connection_type: String,
    #[serde(default)]
    pub status: ConnectionStatus,
    #[serde(default)]
    pub configuration: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/connections`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateConnectionRequest {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub connection_type_slug: String,
    pub provider_slug: String,
    pub base_connection_type: String,
    pub configuration: serde_json::Value,
}

/// Body of `PATCH /api/connections/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateConnectionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<serde_json::Value>,
}
