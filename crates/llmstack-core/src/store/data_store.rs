// ── Central reactive data store ──
//
// One cache node per server entity, one family per keyed entity, and the
// derived views built over them. Nodes are created up front and live as
// long as the store; nothing is fetched until something reads it.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use llmstack_api::ApiClient;
use llmstack_api::models::{
    App, AppRunShare, AppTemplate, AppVersion, Connection, ConnectionType, DataSource,
    DataSourceType, Organization, OrganizationSettings, Processor, Profile, ProfileFlags,
    Provider, Sheet, SheetTemplate, StoreApp, StoreCategory, SubscriptionPrice,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::derived::Derived;
use super::family::{CacheFamily, FamilyKey};
use super::node::CacheNode;
use crate::config::ClientConfig;
use crate::derive::{self, DataSourceRow};
use crate::error::{CacheError, CoreError};

// ── Node keys ────────────────────────────────────────────────────────

/// Identifies one cache node, including family entries.
///
/// The `Display` form is the node's key in logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Profile,
    Organization,
    OrganizationSettings,
    ConnectionTypes,
    Connections,
    Processors,
    Providers,
    Apps,
    AppTemplates,
    StoreCategories,
    Sheets,
    SheetTemplates,
    DataSources,
    OrgDataSources,
    DataSourceTypes,
    SubscriptionPrices,
    AppVersions(Uuid),
    AppDetail(Uuid),
    StoreApp(String),
    AppRunShare(String),
}

const APP_VERSIONS: &str = "app_versions";
const APP_DETAIL: &str = "app_detail";
const STORE_APP: &str = "store_app";
const APP_RUN_SHARE: &str = "app_run_share";

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => f.write_str("profile"),
            Self::Organization => f.write_str("organization"),
            Self::OrganizationSettings => f.write_str("organization_settings"),
            Self::ConnectionTypes => f.write_str("connection_types"),
            Self::Connections => f.write_str("connections"),
            Self::Processors => f.write_str("processors"),
            Self::Providers => f.write_str("providers"),
            Self::Apps => f.write_str("apps"),
            Self::AppTemplates => f.write_str("app_templates"),
            Self::StoreCategories => f.write_str("store_categories"),
            Self::Sheets => f.write_str("sheets"),
            Self::SheetTemplates => f.write_str("sheet_templates"),
            Self::DataSources => f.write_str("datasources"),
            Self::OrgDataSources => f.write_str("org_datasources"),
            Self::DataSourceTypes => f.write_str("datasource_types"),
            Self::SubscriptionPrices => f.write_str("subscription_prices"),
            Self::AppVersions(uuid) => write!(f, "{APP_VERSIONS}[{uuid}]"),
            Self::AppDetail(uuid) => write!(f, "{APP_DETAIL}[{uuid}]"),
            Self::StoreApp(slug) => write!(f, "{STORE_APP}[{slug}]"),
            Self::AppRunShare(code) => write!(f, "{APP_RUN_SHARE}[{code}]"),
        }
    }
}

impl NodeKey {
    /// Whether the key names an entry of a parameterized family.
    pub fn is_family_entry(&self) -> bool {
        matches!(
            self,
            Self::AppVersions(_) | Self::AppDetail(_) | Self::StoreApp(_) | Self::AppRunShare(_)
        )
    }
}

// ── DataStore ────────────────────────────────────────────────────────

/// Central reactive store for all server-derived state.
///
/// Reads go through the nodes (`store.connections().ensure_loaded()`),
/// writes go through [`execute`](Self::execute), which re-fetches every
/// node the mutation affects.
pub struct DataStore {
    client: Arc<ApiClient>,

    profile: CacheNode<Option<Profile>>,
    organization: CacheNode<Option<Organization>>,
    organization_settings: CacheNode<OrganizationSettings>,
    connection_types: CacheNode<Vec<ConnectionType>>,
    connections: CacheNode<Vec<Connection>>,
    processors: CacheNode<Vec<Processor>>,
    providers: CacheNode<Vec<Provider>>,
    apps: CacheNode<Vec<App>>,
    app_templates: CacheNode<Vec<AppTemplate>>,
    store_categories: CacheNode<Vec<StoreCategory>>,
    sheets: CacheNode<Vec<Sheet>>,
    sheet_templates: CacheNode<Vec<SheetTemplate>>,
    datasources: CacheNode<Vec<DataSource>>,
    org_datasources: CacheNode<Vec<DataSource>>,
    datasource_types: CacheNode<Vec<DataSourceType>>,
    subscription_prices: CacheNode<Vec<SubscriptionPrice>>,

    app_versions: CacheFamily<Uuid, Vec<AppVersion>>,
    app_detail: CacheFamily<Uuid, Option<App>>,
    store_apps: CacheFamily<String, Option<StoreApp>>,
    app_run_shares: CacheFamily<String, Option<AppRunShare>>,
}

impl DataStore {
    /// Build a store over an existing client. Nothing is fetched yet.
    pub fn new(client: ApiClient) -> Self {
        let client = Arc::new(client);
        let api = &client;

        Self {
            profile: node(api, NodeKey::Profile, |c| async move { c.get_profile().await.map(Some) }),
            organization: node(api, NodeKey::Organization, |c| async move {
                c.get_organization().await.map(Some)
            }),
            organization_settings: node(api, NodeKey::OrganizationSettings, |c| async move {
                c.get_organization_settings().await
            }),
            connection_types: node(api, NodeKey::ConnectionTypes, |c| async move {
                c.list_connection_types().await
            }),
            connections: node(api, NodeKey::Connections, |c| async move {
                c.list_connections().await
            }),
            processors: node(api, NodeKey::Processors, |c| async move { c.list_processors().await }),
            providers: node(api, NodeKey::Providers, |c| async move { c.list_providers().await }),
            apps: node(api, NodeKey::Apps, |c| async move { c.list_apps().await }),
            app_templates: node(api, NodeKey::AppTemplates, |c| async move {
                c.list_app_templates().await
            }),
            store_categories: node(api, NodeKey::StoreCategories, |c| async move {
                c.list_store_categories().await
            }),
            sheets: node(api, NodeKey::Sheets, |c| async move { c.list_sheets().await }),
            sheet_templates: node(api, NodeKey::SheetTemplates, |c| async move {
                c.list_sheet_templates().await
            }),
            datasources: node(api, NodeKey::DataSources, |c| async move {
                c.list_datasources().await
            }),
            org_datasources: node(api, NodeKey::OrgDataSources, |c| async move {
                c.list_org_datasources().await
            }),
            datasource_types: node(api, NodeKey::DataSourceTypes, |c| async move {
                c.list_datasource_types().await
            }),
            subscription_prices: node(api, NodeKey::SubscriptionPrices, |c| async move {
                c.list_subscription_prices().await
            }),

            app_versions: family(api, APP_VERSIONS, |c, uuid: Uuid| async move {
                c.list_app_versions(&uuid).await
            }),
            app_detail: family(api, APP_DETAIL, |c, uuid: Uuid| async move {
                c.get_app(&uuid).await.map(Some)
            }),
            store_apps: family(api, STORE_APP, |c, slug: String| async move {
                c.get_store_app(&slug).await.map(Some)
            }),
            app_run_shares: family(api, APP_RUN_SHARE, |c, code: String| async move {
                c.get_app_run_share(&code).await.map(Some)
            }),

            client,
        }
    }

    /// Build the client from `config` and wrap it in a store.
    pub fn connect(config: &ClientConfig) -> Result<Self, CoreError> {
        debug!(url = %config.url, "building data store");
        Ok(Self::new(config.build_client()?))
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    // ── Cache nodes ──────────────────────────────────────────────────

    /// The signed-in user's profile; `None` when logged out or on failure.
    pub fn profile(&self) -> &CacheNode<Option<Profile>> {
        &self.profile
    }

    pub fn organization(&self) -> &CacheNode<Option<Organization>> {
        &self.organization
    }

    /// Readable by organization admins only; others get the default.
    pub fn organization_settings(&self) -> &CacheNode<OrganizationSettings> {
        &self.organization_settings
    }

    pub fn connection_types(&self) -> &CacheNode<Vec<ConnectionType>> {
        &self.connection_types
    }

    pub fn connections(&self) -> &CacheNode<Vec<Connection>> {
        &self.connections
    }

    /// Every processor (API backend) the server knows, before org filtering.
    pub fn processors(&self) -> &CacheNode<Vec<Processor>> {
        &self.processors
    }

    pub fn providers(&self) -> &CacheNode<Vec<Provider>> {
        &self.providers
    }

    pub fn apps(&self) -> &CacheNode<Vec<App>> {
        &self.apps
    }

    pub fn app_templates(&self) -> &CacheNode<Vec<AppTemplate>> {
        &self.app_templates
    }

    pub fn store_categories(&self) -> &CacheNode<Vec<StoreCategory>> {
        &self.store_categories
    }

    pub fn sheets(&self) -> &CacheNode<Vec<Sheet>> {
        &self.sheets
    }

    pub fn sheet_templates(&self) -> &CacheNode<Vec<SheetTemplate>> {
        &self.sheet_templates
    }

    /// Data sources owned by the user.
    pub fn datasources(&self) -> &CacheNode<Vec<DataSource>> {
        &self.datasources
    }

    /// Data sources shared with the user's organization.
    pub fn org_datasources(&self) -> &CacheNode<Vec<DataSource>> {
        &self.org_datasources
    }

    pub fn datasource_types(&self) -> &CacheNode<Vec<DataSourceType>> {
        &self.datasource_types
    }

    pub fn subscription_prices(&self) -> &CacheNode<Vec<SubscriptionPrice>> {
        &self.subscription_prices
    }

    // ── Families ─────────────────────────────────────────────────────

    pub fn app_versions(&self) -> &CacheFamily<Uuid, Vec<AppVersion>> {
        &self.app_versions
    }

    pub fn app_detail(&self) -> &CacheFamily<Uuid, Option<App>> {
        &self.app_detail
    }

    pub fn store_apps(&self) -> &CacheFamily<String, Option<StoreApp>> {
        &self.store_apps
    }

    pub fn app_run_shares(&self) -> &CacheFamily<String, Option<AppRunShare>> {
        &self.app_run_shares
    }

    // ── Derived views ────────────────────────────────────────────────

    /// Load the profile if needed and report whether it is present.
    pub async fn is_logged_in(&self) -> bool {
        let profile = self.profile.ensure_loaded().await;
        derive::is_logged_in((*profile).as_ref())
    }

    pub fn logged_in_view(&self) -> Derived<bool> {
        let profile = self.profile.clone();
        Derived::new("is_logged_in", move || {
            derive::is_logged_in((*profile.get()).as_ref())
        })
        .watching(&self.profile)
    }

    pub async fn profile_flags(&self) -> ProfileFlags {
        let profile = self.profile.ensure_loaded().await;
        derive::profile_flags((*profile).as_ref())
    }

    pub fn profile_flags_view(&self) -> Derived<ProfileFlags> {
        let profile = self.profile.clone();
        Derived::new("profile_flags", move || {
            derive::profile_flags((*profile.get()).as_ref())
        })
        .watching(&self.profile)
    }

    /// Processors minus the backends the organization disabled.
    pub async fn available_processors(&self) -> Vec<Processor> {
        let (processors, organization) =
            tokio::join!(self.processors.ensure_loaded(), self.organization.ensure_loaded());
        derive::available_processors(&processors, disabled_backends((*organization).as_ref()))
    }

    pub fn available_processors_view(&self) -> Derived<Vec<Processor>> {
        let processors = self.processors.clone();
        let organization = self.organization.clone();
        Derived::new("available_processors", move || {
            let org = organization.get();
            derive::available_processors(&processors.get(), disabled_backends((*org).as_ref()))
        })
        .watching(&self.processors)
        .watching(&self.organization)
    }

    /// Available processors grouped by provider slug.
    pub async fn processors_by_provider(&self) -> BTreeMap<String, Vec<Processor>> {
        derive::processors_by_provider(&self.available_processors().await)
    }

    /// User and organization data sources, de-duplicated.
    pub async fn merged_datasources(&self) -> Vec<DataSourceRow> {
        let (user, org) =
            tokio::join!(self.datasources.ensure_loaded(), self.org_datasources.ensure_loaded());
        derive::merged_datasources(&user, &org)
    }

    pub fn merged_datasources_view(&self) -> Derived<Vec<DataSourceRow>> {
        let user = self.datasources.clone();
        let org = self.org_datasources.clone();
        Derived::new("merged_datasources", move || {
            derive::merged_datasources(&user.get(), &org.get())
        })
        .watching(&self.datasources)
        .watching(&self.org_datasources)
    }

    // ── Keyed refresh / eviction ─────────────────────────────────────

    /// Force a re-fetch of the node `key` names.
    pub async fn refresh(&self, key: &NodeKey) -> Result<(), CacheError> {
        match key {
            NodeKey::Profile => self.profile.refresh().await.map(drop),
            NodeKey::Organization => self.organization.refresh().await.map(drop),
            NodeKey::OrganizationSettings => self.organization_settings.refresh().await.map(drop),
            NodeKey::ConnectionTypes => self.connection_types.refresh().await.map(drop),
            NodeKey::Connections => self.connections.refresh().await.map(drop),
            NodeKey::Processors => self.processors.refresh().await.map(drop),
            NodeKey::Providers => self.providers.refresh().await.map(drop),
            NodeKey::Apps => self.apps.refresh().await.map(drop),
            NodeKey::AppTemplates => self.app_templates.refresh().await.map(drop),
            NodeKey::StoreCategories => self.store_categories.refresh().await.map(drop),
            NodeKey::Sheets => self.sheets.refresh().await.map(drop),
            NodeKey::SheetTemplates => self.sheet_templates.refresh().await.map(drop),
            NodeKey::DataSources => self.datasources.refresh().await.map(drop),
            NodeKey::OrgDataSources => self.org_datasources.refresh().await.map(drop),
            NodeKey::DataSourceTypes => self.datasource_types.refresh().await.map(drop),
            NodeKey::SubscriptionPrices => self.subscription_prices.refresh().await.map(drop),
            NodeKey::AppVersions(uuid) => self.app_versions.refresh(uuid).await.map(drop),
            NodeKey::AppDetail(uuid) => self.app_detail.refresh(uuid).await.map(drop),
            NodeKey::StoreApp(slug) => self.store_apps.refresh(slug).await.map(drop),
            NodeKey::AppRunShare(code) => self.app_run_shares.refresh(code).await.map(drop),
        }
    }

    /// Re-fetch after a write. Family entries nobody has loaded are left
    /// alone; failures keep the last known good value and are only logged.
    pub(crate) async fn invalidate(&self, key: &NodeKey) {
        let result = match key {
            NodeKey::AppVersions(uuid) => present(self.app_versions.refresh_if_present(uuid).await),
            NodeKey::AppDetail(uuid) => present(self.app_detail.refresh_if_present(uuid).await),
            NodeKey::StoreApp(slug) => present(self.store_apps.refresh_if_present(slug).await),
            NodeKey::AppRunShare(code) => present(self.app_run_shares.refresh_if_present(code).await),
            other => self.refresh(other).await,
        };
        match result {
            Ok(()) => debug!(node = %key, "invalidated"),
            Err(e) => warn!(node = %key, error = %e, "refresh after mutation failed, keeping cached value"),
        }
    }

    /// Drop a family entry. Returns `false` for non-family keys.
    pub fn evict(&self, key: &NodeKey) -> bool {
        match key {
            NodeKey::AppVersions(uuid) => self.app_versions.evict(uuid),
            NodeKey::AppDetail(uuid) => self.app_detail.evict(uuid),
            NodeKey::StoreApp(slug) => self.store_apps.evict(slug),
            NodeKey::AppRunShare(code) => self.app_run_shares.evict(code),
            _ => false,
        }
    }
}

// ── Construction helpers ─────────────────────────────────────────────

fn node<T, F, Fut>(client: &Arc<ApiClient>, key: NodeKey, fetch: F) -> CacheNode<T>
where
    T: Default + Send + Sync + 'static,
    F: Fn(Arc<ApiClient>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, llmstack_api::Error>> + Send + 'static,
{
    let client = Arc::clone(client);
    CacheNode::new(key.to_string(), move || {
        let request = fetch(Arc::clone(&client));
        async move { request.await.map_err(CoreError::from) }
    })
}

fn family<K, T, F, Fut>(client: &Arc<ApiClient>, name: &'static str, fetch: F) -> CacheFamily<K, T>
where
    K: FamilyKey,
    T: Default + Send + Sync + 'static,
    F: Fn(Arc<ApiClient>, K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, llmstack_api::Error>> + Send + 'static,
{
    let client = Arc::clone(client);
    CacheFamily::new(name, move |key: K| {
        let request = fetch(Arc::clone(&client), key);
        async move { request.await.map_err(CoreError::from) }
    })
}

fn disabled_backends(organization: Option<&Organization>) -> &[String] {
    organization
        .map(|org| org.disabled_api_backends.as_slice())
        .unwrap_or_default()
}

fn present<T>(result: Option<Result<T, CacheError>>) -> Result<(), CacheError> {
    result.map_or(Ok(()), |r| r.map(drop))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use llmstack_api::TransportConfig;

    use super::*;

    fn offline_store() -> DataStore {
        // Port 9 (discard) refuses connections, so every fetch fails fast.
        let client =
            ApiClient::new("http://127.0.0.1:9", &TransportConfig::default(), None).unwrap();
        DataStore::new(client)
    }

    #[test]
    fn node_keys_render_family_entries_with_their_key() {
        let uuid = Uuid::nil();
        assert_eq!(NodeKey::Connections.to_string(), "connections");
        assert_eq!(
            NodeKey::AppVersions(uuid).to_string(),
            format!("app_versions[{uuid}]")
        );
        assert_eq!(NodeKey::StoreApp("demo".into()).to_string(), "store_app[demo]");
        assert!(NodeKey::AppRunShare("x".into()).is_family_entry());
        assert!(!NodeKey::Apps.is_family_entry());
    }

    #[tokio::test]
    async fn failed_profile_reads_as_logged_out() {
        let store = offline_store();
        assert!(!store.is_logged_in().await);
        assert!(store.profile().error().is_some());
        assert!(store.profile_flags().await.is_empty());
    }

    #[tokio::test]
    async fn logged_in_view_follows_profile_writes() {
        let store = offline_store();
        let mut view = store.logged_in_view();
        assert!(!view.get());

        store.profile().write(Some(Profile::default()));
        assert_eq!(view.changed().await, Some(true));

        store.profile().write(None);
        assert_eq!(view.changed().await, Some(false));
    }

    #[tokio::test]
    async fn family_keys_share_node_names() {
        let store = offline_store();
        let uuid = Uuid::new_v4();
        let node = store.app_versions().node(&uuid);
        assert_eq!(node.key(), NodeKey::AppVersions(uuid).to_string());
    }

    #[tokio::test]
    async fn evict_only_applies_to_family_entries() {
        let store = offline_store();
        store.store_apps().set(&"demo".to_string(), None);
        assert!(store.evict(&NodeKey::StoreApp("demo".into())));
        assert!(!store.evict(&NodeKey::Apps));
    }
}
