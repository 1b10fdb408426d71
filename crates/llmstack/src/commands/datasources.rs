//! Data source command handlers.

use tabled::Tabled;

use llmstack_core::models::{CreateDataSourceRequest, DataSource, DataSourceType};
use llmstack_core::{DataSourceRow, DataStore, Mutation, MutationResult};

use crate::cli::{DatasourcesArgs, DatasourcesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    source_type: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Owner")]
    owner: String,
}

fn source_row(source: &DataSource, is_user_owned: bool) -> SourceRow {
    SourceRow {
        uuid: source.uuid.to_string(),
        name: source.name.clone(),
        source_type: source.source_type.name.clone(),
        size: format_size(source.size),
        owner: if is_user_owned {
            "me".into()
        } else {
            source.owner_email.clone().unwrap_or_else(|| "org".into())
        },
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    match UNITS.get(unit) {
        Some(&"B") | None => format!("{bytes} B"),
        Some(name) => format!("{value:.1} {name}"),
    }
}

#[derive(Tabled)]
struct TypeRow {
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "External")]
    external: bool,
}

impl From<&DataSourceType> for TypeRow {
    fn from(t: &DataSourceType) -> Self {
        Self {
            slug: t.slug.clone(),
            name: t.name.clone(),
            external: t.is_external_datasource,
        }
    }
}

pub async fn handle(
    store: &DataStore,
    args: DatasourcesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DatasourcesCommand::List { mine } => {
            util::load(store.datasources()).await?;
            let rows: Vec<DataSourceRow> = if mine {
                store
                    .datasources()
                    .get()
                    .iter()
                    .map(|source| DataSourceRow {
                        source: source.clone(),
                        is_user_owned: true,
                    })
                    .collect()
            } else {
                util::load(store.org_datasources()).await?;
                store.merged_datasources().await
            };
            let out = output::render_list(
                &global.output,
                &rows,
                |r| source_row(&r.source, r.is_user_owned),
                |r| r.source.uuid.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DatasourcesCommand::Types => {
            let types = util::load(store.datasource_types()).await?;
            let out = output::render_list(&global.output, &types, |t| TypeRow::from(t), |t| {
                t.slug.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DatasourcesCommand::Create {
            name,
            type_slug,
            from_file,
        } => {
            let config = match from_file {
                Some(path) => util::read_json_file(&path)?,
                None => serde_json::Value::Null,
            };
            let result = store
                .execute(Mutation::CreateDataSource(CreateDataSourceRequest {
                    name,
                    type_slug,
                    config,
                }))
                .await?;
            if let MutationResult::DataSource(created) = result {
                util::notice(&format!("Data source {} created", created.uuid), global.quiet);
            }
            Ok(())
        }

        DatasourcesCommand::Delete { uuid } => {
            let uuid = util::parse_uuid(&uuid, "uuid")?;
            if !util::confirm(&format!("Delete data source {uuid} and its entries?"), global.yes)? {
                return Ok(());
            }
            store.execute(Mutation::DeleteDataSource { uuid }).await?;
            util::notice(&format!("Data source {uuid} deleted"), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
