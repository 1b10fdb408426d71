use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An app owned by (or shared with) the user (`/api/apps`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct App {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub app_type_name: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub published_uuid: Option<String>,
    #[serde(default)]
    pub visibility: Option<u8>,
    #[serde(default)]
    pub owner_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated_at: Option<DateTime<Utc>>,
}

/// A starter template (`/api/apps/templates`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppTemplate {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// One saved version of an app (`/api/apps/{uuid}/versions`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppVersion {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A published app listing (`/api/store/apps/{slug}`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StoreApp {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// App definition (input schema, processors, config) as published.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A store category (`/api/store/categories`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreCategory {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A shared app run (`/api/app/run/share/{code}`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppRunShare {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub store_app_slug: Option<String>,
    #[serde(default)]
    pub app_uuid: Option<Uuid>,
    /// Recorded inputs and outputs of the run.
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn app_requires_only_uuid() {
        let app: App =
            serde_json::from_str(r#"{"uuid": "5e0f3bde-6b62-4fd4-9b27-2cf0e3d1a6e0"}"#).unwrap();
        assert!(app.name.is_empty());
        assert!(!app.is_published);
    }

    #[test]
    fn store_app_keeps_definition_payload() {
        let app: StoreApp = serde_json::from_str(
            r#"{"slug": "summarizer", "name": "Summarizer", "data": {"type_slug": "web"}}"#,
        )
        .unwrap();
        assert_eq!(app.slug, "summarizer");
        assert_eq!(app.data["type_slug"], "web");
    }
}
