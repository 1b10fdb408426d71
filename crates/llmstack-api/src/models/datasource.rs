use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A kind of data source (`/api/datasource_types`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DataSourceType {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub entry_config_schema: serde_json::Value,
    #[serde(default)]
    pub is_external_datasource: bool,
}

/// The type summary embedded in a data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DataSourceTypeRef {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
}

/// A data source (`/api/datasources`, `/api/org/datasources`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DataSource {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub source_type: DataSourceTypeRef,
    /// Size of the indexed content in bytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub visibility: Option<u8>,
    #[serde(default)]
    pub owner_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/datasources`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateDataSourceRequest {
    pub name: String,
    pub type_slug: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub config: serde_json::Value,
}
