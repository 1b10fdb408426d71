//! App, app version and shared-run command handlers.

use tabled::Tabled;

use llmstack_core::models::{App, AppRunShare, AppTemplate, AppVersion};
use llmstack_core::{DataStore, Mutation};

use crate::cli::{AppsArgs, AppsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct AppRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    app_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

fn app_row(app: &App, color: bool) -> AppRow {
    let status = if app.is_published { "published" } else { "draft" };
    AppRow {
        uuid: app.uuid.to_string(),
        name: app.name.clone(),
        app_type: app.app_type_name.clone().unwrap_or_default(),
        status: output::status_text(status, color),
        updated: util::format_time(app.last_updated_at.as_ref()),
    }
}

fn app_detail(app: &App) -> String {
    output::detail(&[
        ("UUID", app.uuid.to_string()),
        ("Name", app.name.clone()),
        ("Description", app.description.clone()),
        ("Type", app.app_type_name.clone().unwrap_or_default()),
        ("Published", app.is_published.to_string()),
        ("Published UUID", app.published_uuid.clone().unwrap_or_default()),
        ("Owner", app.owner_email.clone().unwrap_or_default()),
        ("Created", util::format_time(app.created_at.as_ref())),
        ("Updated", util::format_time(app.last_updated_at.as_ref())),
    ])
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Categories")]
    categories: String,
}

impl From<&AppTemplate> for TemplateRow {
    fn from(t: &AppTemplate) -> Self {
        Self {
            slug: t.slug.clone(),
            name: t.name.clone(),
            categories: t.categories.join(", "),
        }
    }
}

#[derive(Tabled)]
struct VersionRow {
    #[tabled(rename = "Version")]
    version: u32,
    #[tabled(rename = "Draft")]
    draft: bool,
    #[tabled(rename = "Comment")]
    comment: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&AppVersion> for VersionRow {
    fn from(v: &AppVersion) -> Self {
        Self {
            version: v.version,
            draft: v.is_draft,
            comment: v.comment.clone(),
            created: util::format_time(v.created_at.as_ref()),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(store: &DataStore, args: AppsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AppsCommand::List => {
            let apps = util::load(store.apps()).await?;
            let color = output::should_color(&global.color);
            let out = output::render_list(&global.output, &apps, |a| app_row(a, color), |a| {
                a.uuid.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::Templates => {
            let templates = util::load(store.app_templates()).await?;
            let out = output::render_list(
                &global.output,
                &templates,
                |t| TemplateRow::from(t),
                |t| t.slug.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::Show { uuid } => {
            let uuid = util::parse_uuid(&uuid, "uuid")?;
            let app = util::load(&store.app_detail().node(&uuid)).await?;
            let app = (*app).clone().ok_or_else(|| CliError::NotFound {
                resource_type: "app".into(),
                identifier: uuid.to_string(),
                list_command: "apps list".into(),
            })?;
            let out = output::render_single(&global.output, &app, app_detail, |a| a.uuid.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::Versions { uuid } => {
            let uuid = util::parse_uuid(&uuid, "uuid")?;
            let versions = util::load(&store.app_versions().node(&uuid)).await?;
            let out = output::render_list(
                &global.output,
                &versions,
                |v| VersionRow::from(v),
                |v| v.version.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::Delete { uuid } => {
            let uuid = util::parse_uuid(&uuid, "uuid")?;
            if !util::confirm(&format!("Delete app {uuid}? This cannot be undone."), global.yes)? {
                return Ok(());
            }
            store.execute(Mutation::DeleteApp { uuid }).await?;
            util::notice(&format!("App {uuid} deleted"), global.quiet);
            Ok(())
        }

        AppsCommand::Publish { uuid } => {
            let uuid = util::parse_uuid(&uuid, "uuid")?;
            store.execute(Mutation::PublishApp { uuid }).await?;
            util::notice(&format!("App {uuid} published"), global.quiet);
            Ok(())
        }

        AppsCommand::Unpublish { uuid } => {
            let uuid = util::parse_uuid(&uuid, "uuid")?;
            store.execute(Mutation::UnpublishApp { uuid }).await?;
            util::notice(&format!("App {uuid} unpublished"), global.quiet);
            Ok(())
        }
    }
}

// ── Shared runs ─────────────────────────────────────────────────────

fn share_detail(share: &AppRunShare) -> String {
    output::detail(&[
        ("Code", share.code.clone()),
        ("Store app", share.store_app_slug.clone().unwrap_or_default()),
        (
            "App",
            share.app_uuid.map(|u| u.to_string()).unwrap_or_default(),
        ),
        ("Created", util::format_time(share.created_at.as_ref())),
        ("Data", share.data.to_string()),
    ])
}

pub async fn handle_share(store: &DataStore, code: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let code = util::require_key(code, "code")?;
    let share = util::load(&store.app_run_shares().node(&code)).await?;
    let share = (*share).clone().ok_or_else(|| CliError::NotFound {
        resource_type: "shared run".into(),
        identifier: code.clone(),
        list_command: "apps list".into(),
    })?;
    let out = output::render_single(&global.output, &share, share_detail, |s| s.code.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
