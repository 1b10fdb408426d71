//! Connection command handlers.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use llmstack_core::models::{
    Connection, ConnectionStatus, ConnectionType, CreateConnectionRequest, ResourceId,
    UpdateConnectionRequest,
};
use llmstack_core::protocol::ActivationEvent;
use llmstack_core::{ActivationOutcome, DataStore, Mutation, MutationResult};

use crate::cli::{ConnectionsArgs, ConnectionsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ConnectionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    connection_type: String,
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

fn status_name(status: ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Created => "created",
        ConnectionStatus::Connecting => "connecting",
        ConnectionStatus::Active => "active",
        ConnectionStatus::Failed => "failed",
        ConnectionStatus::Locked => "locked",
        ConnectionStatus::Unknown => "unknown",
    }
}

fn connection_row(c: &Connection, color: bool) -> ConnectionRow {
    ConnectionRow {
        id: c.id.to_string(),
        name: c.name.clone(),
        connection_type: c.connection_type_slug.clone(),
        provider: c.provider_slug.clone(),
        status: output::status_text(status_name(c.status), color),
        updated: util::format_time(c.updated_at.as_ref()),
    }
}

#[derive(Tabled)]
struct ConnectionTypeRow {
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Base")]
    base: String,
}

impl From<&ConnectionType> for ConnectionTypeRow {
    fn from(t: &ConnectionType) -> Self {
        Self {
            slug: t.slug.clone(),
            provider: t.provider_slug.clone(),
            name: t.name.clone(),
            base: t.base_connection_type.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    store: &DataStore,
    args: ConnectionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ConnectionsCommand::List => {
            let connections = util::load(store.connections()).await?;
            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &connections,
                |c| connection_row(c, color),
                |c| c.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConnectionsCommand::Types => {
            let types = util::load(store.connection_types()).await?;
            let out = output::render_list(&global.output, &types, |t| ConnectionTypeRow::from(t), |t| {
                t.slug.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConnectionsCommand::Create {
            name,
            type_slug,
            provider,
            base_type,
            description,
            from_file,
        } => {
            let configuration = match from_file {
                Some(path) => util::read_json_file(&path)?,
                None => serde_json::json!({}),
            };
            let result = store
                .execute(Mutation::CreateConnection(CreateConnectionRequest {
                    name,
                    description,
                    connection_type_slug: type_slug,
                    provider_slug: provider,
                    base_connection_type: base_type,
                    configuration,
                }))
                .await?;
            if let MutationResult::Connection(created) = result {
                util::notice(&format!("Connection {} created", created.id), global.quiet);
            }
            Ok(())
        }

        ConnectionsCommand::Update {
            id,
            name,
            description,
            from_file,
        } => {
            let configuration = from_file.map(|p| util::read_json_file(&p)).transpose()?;
            store
                .execute(Mutation::UpdateConnection {
                    id: ResourceId::from(id.as_str()),
                    update: UpdateConnectionRequest {
                        name,
                        description,
                        configuration,
                    },
                })
                .await?;
            util::notice(&format!("Connection {id} updated"), global.quiet);
            Ok(())
        }

        ConnectionsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete connection '{id}'?"), global.yes)? {
                return Ok(());
            }
            store
                .execute(Mutation::DeleteConnection {
                    id: ResourceId::from(id.as_str()),
                })
                .await?;
            util::notice(&format!("Connection {id} deleted"), global.quiet);
            Ok(())
        }

        ConnectionsCommand::Activate { id } => activate(store, &ResourceId::from(id), global).await,
    }
}

async fn activate(store: &DataStore, id: &ResourceId, global: &GlobalOpts) -> Result<(), CliError> {
    let spinner = if global.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!("Activating connection {id}"));

    let outcome = store
        .activate_connection(id, |event| match event {
            ActivationEvent::Activate {
                session: Some(session),
            } => {
                spinner.println(format!("Remote browser session: {}", session.ws_url));
            }
            ActivationEvent::Output { output } => {
                spinner.set_message(output.to_string());
            }
            _ => {}
        })
        .await;
    spinner.finish_and_clear();

    match outcome? {
        ActivationOutcome::Activated { message } => {
            util::notice(
                &message.unwrap_or_else(|| format!("Connection {id} activated")),
                global.quiet,
            );
            Ok(())
        }
        ActivationOutcome::Failed { error } => Err(CliError::Live { message: error }),
    }
}
