use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The signed-in user's profile (`/api/profiles/me`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Name of the organization the user belongs to, if any.
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub flags: ProfileFlags,
    /// Per-provider configuration (API keys, deployment settings).
    #[serde(default)]
    pub provider_configs: BTreeMap<String, serde_json::Value>,
}

/// Feature flags attached to a profile, e.g. `IS_ORGANIZATION_OWNER`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ProfileFlags(pub BTreeMap<String, bool>);

impl ProfileFlags {
    /// Whether `flag` is present and set.
    pub fn is_set(&self, flag: &str) -> bool {
        self.0.get(flag).copied().unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Partial profile update (`PATCH /api/profiles/me`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_configs: Option<BTreeMap<String, serde_json::Value>>,
}

/// The caller's organization (`/api/org`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Organization {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    /// Processor backends the org admin has switched off, as
    /// `provider_slug/processor_slug` or bare processor ids.
    #[serde(default)]
    pub disabled_api_backends: Vec<String>,
}

/// Organization-wide settings (`/api/org/settings`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OrganizationSettings {
    #[serde(default)]
    pub disabled_api_backends: Vec<String>,
    #[serde(default)]
    pub default_app_visibility: Option<u8>,
    #[serde(default)]
    pub max_app_visibility: Option<u8>,
    #[serde(default)]
    pub allow_user_keys: bool,
    #[serde(default)]
    pub logo: Option<String>,
    /// Provider keys and any settings this client does not model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn profile_tolerates_missing_fields() {
        let profile: Profile = serde_json::from_str(r#"{"name": "Ada"}"#).unwrap();
        assert_eq!(profile.name, "Ada");
        assert!(profile.flags.is_empty());
        assert!(profile.provider_configs.is_empty());
    }

    #[test]
    fn flags_are_read_by_name() {
        let profile: Profile = serde_json::from_str(
            r#"{"name": "Ada", "flags": {"IS_ORGANIZATION_OWNER": true, "CAN_ADD_KEYS": false}}"#,
        )
        .unwrap();
        assert!(profile.flags.is_set("IS_ORGANIZATION_OWNER"));
        assert!(!profile.flags.is_set("CAN_ADD_KEYS"));
        assert!(!profile.flags.is_set("UNKNOWN"));
    }

    #[test]
    fn org_settings_keep_unmodelled_keys() {
        let settings: OrganizationSettings = serde_json::from_str(
            r#"{"disabled_api_backends": ["openai/chatgpt"], "openai_key": "sk-..."}"#,
        )
        .unwrap();
        assert_eq!(settings.disabled_api_backends, vec!["openai/chatgpt"]);
        assert!(settings.extra.contains_key("openai_key"));
    }
}
