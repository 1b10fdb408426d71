//! Sheet command handlers.

use tabled::Tabled;

use llmstack_core::models::{CreateSheetRequest, Sheet, SheetTemplate};
use llmstack_core::{DataStore, Mutation, MutationResult};

use crate::cli::{GlobalOpts, SheetsArgs, SheetsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct SheetRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Rows")]
    rows: u64,
    #[tabled(rename = "Columns")]
    columns: u64,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&Sheet> for SheetRow {
    fn from(s: &Sheet) -> Self {
        Self {
            uuid: s.uuid.to_string(),
            name: s.name.clone(),
            rows: s.total_rows,
            columns: s.total_columns,
            updated: util::format_time(s.updated_at.as_ref()),
        }
    }
}

#[derive(Tabled)]
struct SheetTemplateRow {
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&SheetTemplate> for SheetTemplateRow {
    fn from(t: &SheetTemplate) -> Self {
        Self {
            slug: t.slug.clone(),
            name: t.name.clone(),
            description: t.description.clone(),
        }
    }
}

pub async fn handle(store: &DataStore, args: SheetsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SheetsCommand::List => {
            let sheets = util::load(store.sheets()).await?;
            let out = output::render_list(&global.output, &sheets, |s| SheetRow::from(s), |s| {
                s.uuid.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SheetsCommand::Templates => {
            let templates = util::load(store.sheet_templates()).await?;
            let out = output::render_list(
                &global.output,
                &templates,
                |t| SheetTemplateRow::from(t),
                |t| t.slug.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SheetsCommand::Create {
            name,
            description,
            template,
        } => {
            let result = store
                .execute(Mutation::CreateSheet(CreateSheetRequest {
                    name,
                    description,
                    template_slug: template,
                }))
                .await?;
            if let MutationResult::Sheet(sheet) = result {
                let out = output::render_single(
                    &global.output,
                    &sheet,
                    |s| format!("Sheet {} created", s.uuid),
                    |s| s.uuid.to_string(),
                )?;
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }

        SheetsCommand::Delete { uuid } => {
            let uuid = util::parse_uuid(&uuid, "uuid")?;
            if !util::confirm(&format!("Delete sheet {uuid}?"), global.yes)? {
                return Ok(());
            }
            store.execute(Mutation::DeleteSheet { uuid }).await?;
            util::notice(&format!("Sheet {uuid} deleted"), global.quiet);
            Ok(())
        }
    }
}
