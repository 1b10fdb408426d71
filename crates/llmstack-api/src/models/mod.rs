// Wire types for the REST API.
//
// Every field the UI tolerates being absent carries `#[serde(default)]`:
// the server is not validated here, consumers default missing fields.

mod account;
mod app;
mod billing;
mod connection;
mod datasource;
mod processor;
mod sheet;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use account::{Organization, OrganizationSettings, Profile, ProfileFlags, ProfileUpdate};
pub use app::{App, AppRunShare, AppTemplate, AppVersion, StoreApp, StoreCategory};
pub use billing::{CheckoutRequest, CheckoutSession, SubscriptionPrice};
pub use connection::{
    Connection, ConnectionStatus, ConnectionType, CreateConnectionRequest,
    UpdateConnectionRequest,
};
pub use datasource::{CreateDataSourceRequest, DataSource, DataSourceType, DataSourceTypeRef};
pub use processor::{Processor, Provider, ProviderRef};
pub use sheet::{CreateSheetRequest, Sheet, SheetTemplate};

// ── ResourceId ──────────────────────────────────────────────────────

/// Identifier that the server sends either as a number or as a string.
///
/// Connections and processors have historically used both; consumers
/// compare and display them without caring which.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(u64),
    Text(String),
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for ResourceId {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        s.parse::<u64>()
            .map_or_else(|_| Self::Text(s.to_owned()), Self::Number)
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

// ── Pagination ──────────────────────────────────────────────────────

/// A page of results from a paginated list endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// List endpoints answer with either a bare array or a [`Page`].
#[derive(Debug, Deserialize)]
#[serde(untagged, bound = "T: DeserializeOwned")]
pub(crate) enum ListResponse<T> {
    Bare(Vec<T>),
    Paged(Page<T>),
}

impl<T> ListResponse<T> {
    /// Split into this page's items and the `next` link, if any.
    pub(crate) fn into_parts(self) -> (Vec<T>, Option<String>) {
        match self {
            Self::Bare(items) => (items, None),
            Self::Paged(page) => (page.results, page.next.filter(|n| !n.is_empty())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_accepts_numbers_and_strings() {
        let ids: Vec<ResourceId> = serde_json::from_str(r#"[1, "abc", "42"]"#).unwrap();
        assert_eq!(ids[0], ResourceId::Number(1));
        assert_eq!(ids[1], ResourceId::Text("abc".into()));
        // A numeric string stays a string on the wire.
        assert_eq!(ids[2], ResourceId::Text("42".into()));
        assert_eq!(ResourceId::from("42"), ResourceId::Number(42));
        assert_eq!(ids[0].to_string(), "1");
    }

    #[test]
    fn list_response_handles_bare_arrays() {
        let resp: ListResponse<u32> = serde_json::from_str("[1,2,3]").unwrap();
        let (items, next) = resp.into_parts();
        assert_eq!(items, vec![1, 2, 3]);
        assert!(next.is_none());
    }

    #[test]
    fn list_response_handles_pages() {
        let resp: ListResponse<u32> = serde_json::from_str(
            r#"{"count": 4, "next": "/api/x?page=2", "previous": null, "results": [1, 2]}"#,
        )
        .unwrap();
        let (items, next) = resp.into_parts();
        assert_eq!(items, vec![1, 2]);
        assert_eq!(next.as_deref(), Some("/api/x?page=2"));
    }

    #[test]
    fn empty_next_link_ends_pagination() {
        let resp: ListResponse<u32> =
            serde_json::from_str(r#"{"next": "", "results": [7]}"#).unwrap();
        let (_, next) = resp.into_parts();
        assert!(next.is_none());
    }
}
