// Endpoint methods, grouped by resource. Each file adds inherent methods
// to `ApiClient`; request mechanics live in `crate::client`.

mod account;
mod apps;
mod billing;
mod connections;
mod datasources;
mod processors;
mod sheets;
mod store;
