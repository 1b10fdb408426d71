// ── Reactive data store ──
//
// Cache nodes with push-based change notification, keyed families of
// them, and views derived from their current values.

mod data_store;
mod derived;
mod family;
mod node;

pub use data_store::{DataStore, NodeKey};
pub use derived::Derived;
pub use family::{CacheFamily, FamilyKey};
pub use node::{CacheNode, FetchFuture, NodeState, NodeStatus};
