//! Command dispatch: bridges CLI args -> data store -> output formatting.

pub mod account;
pub mod apps;
pub mod billing;
pub mod config_cmd;
pub mod connections;
pub mod datasources;
pub mod processors;
pub mod sheets;
pub mod store;
pub mod util;

use llmstack_core::DataStore;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, store: &DataStore, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Profile(args) => account::handle_profile(store, args, global).await,
        Command::Org(args) => account::handle_org(store, args, global).await,
        Command::Connections(args) => connections::handle(store, args, global).await,
        Command::Processors(args) => processors::handle(store, args, global).await,
        Command::Datasources(args) => datasources::handle(store, args, global).await,
        Command::Apps(args) => apps::handle(store, args, global).await,
        Command::Store(args) => store::handle(store, args, global).await,
        Command::Sheets(args) => sheets::handle(store, args, global).await,
        Command::Share { code } => apps::handle_share(store, &code, global).await,
        Command::Billing(args) => billing::handle(store, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
