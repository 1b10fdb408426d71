use serde::{Deserialize, Serialize};

use super::ResourceId;

/// A model/API provider (`/api/apiproviders`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Provider {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub config_schema: serde_json::Value,
}

/// The provider summary embedded in a processor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// A processor, i.e. one API backend of a provider (`/api/apibackends`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Processor {
    #[serde(default)]
    pub id: ResourceId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub api_provider: ProviderRef,
    #[serde(default)]
    pub input_schema: serde_json::Value,
    #[serde(default)]
    pub output_schema: serde_json::Value,
    #[serde(default)]
    pub config_schema: serde_json::Value,
}

impl Processor {
    /// The `provider_slug/processor_slug` form used by org settings.
    pub fn backend_id(&self) -> String {
        format!("{}/{}", self.api_provider.slug, self.slug)
    }
}
