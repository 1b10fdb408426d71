// llmstack-core: Reactive cache layer between llmstack-api and consumers (CLI).

pub mod config;
pub mod derive;
pub mod error;
pub mod live;
pub mod mutation;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthCredentials, ClientConfig, TlsVerification};
pub use derive::DataSourceRow;
pub use error::{CacheError, CoreError};
pub use live::{ActivationOutcome, AppRunOutput, AppSessionRunner};
pub use mutation::{Mutation, MutationResult};
pub use store::{
    CacheFamily, CacheNode, DataStore, Derived, FamilyKey, NodeKey, NodeState, NodeStatus,
};
pub use stream::NodeStream;

// Wire types are shared with the transport crate.
pub use llmstack_api::{models, protocol};
