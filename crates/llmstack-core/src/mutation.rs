// ── Mutation API ──
//
// All writes flow through a unified `Mutation` enum. The store sends the
// request, and only after the server accepts it re-fetches every node the
// mutation can have changed. A rejected write leaves the cache untouched.

use futures_util::future::join_all;
use llmstack_api::models::{
    Connection, CreateConnectionRequest, CreateDataSourceRequest, CreateSheetRequest, DataSource,
    OrganizationSettings, Profile, ProfileUpdate, ResourceId, Sheet, UpdateConnectionRequest,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::store::{DataStore, NodeKey};

/// All write operations against the server.
#[derive(Debug, Clone, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Mutation {
    // ── Connections ──────────────────────────────────────────────────
    CreateConnection(CreateConnectionRequest),
    UpdateConnection {
        id: ResourceId,
        update: UpdateConnectionRequest,
    },
    DeleteConnection {
        id: ResourceId,
    },

    // ── Data sources ─────────────────────────────────────────────────
    CreateDataSource(CreateDataSourceRequest),
    DeleteDataSource {
        uuid: Uuid,
    },

    // ── Sheets ───────────────────────────────────────────────────────
    CreateSheet(CreateSheetRequest),
    DeleteSheet {
        uuid: Uuid,
    },

    // ── Account ──────────────────────────────────────────────────────
    UpdateProfile(ProfileUpdate),
    UpdateOrganizationSettings(OrganizationSettings),

    // ── Apps ─────────────────────────────────────────────────────────
    DeleteApp {
        uuid: Uuid,
    },
    PublishApp {
        uuid: Uuid,
    },
    UnpublishApp {
        uuid: Uuid,
    },
}

/// What the server answered with.
#[derive(Debug, Clone)]
pub enum MutationResult {
    Connection(Connection),
    DataSource(DataSource),
    Sheet(Sheet),
    Profile(Profile),
    OrganizationSettings(OrganizationSettings),
    /// The server accepted the write without returning an entity.
    Ok,
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Nodes re-fetched once the write succeeds.
    pub fn invalidates(&self) -> Vec<NodeKey> {
        match self {
            Self::CreateConnection(_)
            | Self::UpdateConnection { .. }
            | Self::DeleteConnection { .. } => vec![NodeKey::Connections],
            Self::CreateDataSource(_) | Self::DeleteDataSource { .. } => {
                vec![NodeKey::DataSources, NodeKey::OrgDataSources]
            }
            Self::CreateSheet(_) | Self::DeleteSheet { .. } => vec![NodeKey::Sheets],
            Self::UpdateProfile(_) => vec![NodeKey::Profile],
            // Disabled backends surface through the organization as well.
            Self::UpdateOrganizationSettings(_) => {
                vec![NodeKey::OrganizationSettings, NodeKey::Organization]
            }
            Self::DeleteApp { .. } => vec![NodeKey::Apps],
            Self::PublishApp { uuid } | Self::UnpublishApp { uuid } => vec![
                NodeKey::Apps,
                NodeKey::AppDetail(*uuid),
                NodeKey::AppVersions(*uuid),
            ],
        }
    }

    /// Family entries dropped once the write succeeds.
    pub fn evicts(&self) -> Vec<NodeKey> {
        match self {
            Self::DeleteApp { uuid } => vec![NodeKey::AppDetail(*uuid), NodeKey::AppVersions(*uuid)],
            _ => Vec::new(),
        }
    }
}

impl DataStore {
    /// Run a mutation, then resynchronize the affected nodes.
    ///
    /// Errors from the write itself are returned and leave every node as
    /// it was. Errors from the follow-up refreshes are logged only: the
    /// write already happened and the nodes keep their last known value.
    pub async fn execute(&self, mutation: Mutation) -> Result<MutationResult, CoreError> {
        debug!(mutation = mutation.name(), "executing");
        let result = match self.apply(&mutation).await {
            Ok(result) => result,
            Err(e) => {
                warn!(mutation = mutation.name(), error = %e, "mutation rejected");
                return Err(e);
            }
        };
        info!(mutation = mutation.name(), "mutation applied");

        for key in mutation.evicts() {
            self.evict(&key);
        }
        let stale = mutation.invalidates();
        join_all(stale.iter().map(|key| self.invalidate(key))).await;

        Ok(result)
    }

    async fn apply(&self, mutation: &Mutation) -> Result<MutationResult, CoreError> {
        let client = self.client();
        let result = match mutation {
            Mutation::CreateConnection(req) => {
                MutationResult::Connection(client.create_connection(req).await?)
            }
            Mutation::UpdateConnection { id, update } => {
                MutationResult::Connection(client.update_connection(id, update).await?)
            }
            Mutation::DeleteConnection { id } => {
                client.delete_connection(id).await?;
                MutationResult::Ok
            }
            Mutation::CreateDataSource(req) => {
                MutationResult::DataSource(client.create_datasource(req).await?)
            }
            Mutation::DeleteDataSource { uuid } => {
                client.delete_datasource(uuid).await?;
                MutationResult::Ok
            }
            Mutation::CreateSheet(req) => MutationResult::Sheet(client.create_sheet(req).await?),
            Mutation::DeleteSheet { uuid } => {
                client.delete_sheet(uuid).await?;
                MutationResult::Ok
            }
            Mutation::UpdateProfile(update) => {
                MutationResult::Profile(client.update_profile(update).await?)
            }
            Mutation::UpdateOrganizationSettings(settings) => MutationResult::OrganizationSettings(
                client.update_organization_settings(settings).await?,
            ),
            Mutation::DeleteApp { uuid } => {
                client.delete_app(uuid).await?;
                MutationResult::Ok
            }
            Mutation::PublishApp { uuid } => {
                client.publish_app(uuid).await?;
                MutationResult::Ok
            }
            Mutation::UnpublishApp { uuid } => {
                client.unpublish_app(uuid).await?;
                MutationResult::Ok
            }
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_writes_invalidate_their_collection() {
        let create = Mutation::CreateConnection(CreateConnectionRequest::default());
        assert_eq!(create.invalidates(), vec![NodeKey::Connections]);

        let delete = Mutation::DeleteSheet { uuid: Uuid::nil() };
        assert_eq!(delete.invalidates(), vec![NodeKey::Sheets]);
        assert!(delete.evicts().is_empty());
    }

    #[test]
    fn datasource_writes_refresh_both_owners() {
        let m = Mutation::DeleteDataSource { uuid: Uuid::nil() };
        assert_eq!(
            m.invalidates(),
            vec![NodeKey::DataSources, NodeKey::OrgDataSources]
        );
    }

    #[test]
    fn publish_touches_only_that_apps_family_entries() {
        let uuid = Uuid::new_v4();
        let keys = Mutation::PublishApp { uuid }.invalidates();
        assert!(keys.contains(&NodeKey::AppVersions(uuid)));
        assert!(keys.contains(&NodeKey::AppDetail(uuid)));
        assert_eq!(
            keys.iter().filter(|k| k.is_family_entry()).count(),
            2,
            "only the published app's entries"
        );
    }

    #[test]
    fn delete_app_evicts_its_entries() {
        let uuid = Uuid::new_v4();
        let m = Mutation::DeleteApp { uuid };
        assert_eq!(m.invalidates(), vec![NodeKey::Apps]);
        assert_eq!(
            m.evicts(),
            vec![NodeKey::AppDetail(uuid), NodeKey::AppVersions(uuid)]
        );
    }

    #[test]
    fn names_are_snake_case() {
        assert_eq!(
            Mutation::UpdateOrganizationSettings(OrganizationSettings::default()).name(),
            "update_organization_settings"
        );
    }
}
