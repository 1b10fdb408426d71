//! Store command handlers: browsing, searching and running published apps.

use std::io::Write;

use tabled::Tabled;

use llmstack_core::models::{StoreApp, StoreCategory};
use llmstack_core::{CoreError, DataStore};

use crate::cli::{GlobalOpts, OutputFormat, StoreArgs, StoreCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct StoreAppRow {
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Categories")]
    categories: String,
}

impl From<&StoreApp> for StoreAppRow {
    fn from(a: &StoreApp) -> Self {
        Self {
            slug: a.slug.clone(),
            name: a.name.clone(),
            author: a.username.clone().unwrap_or_default(),
            categories: a.categories.join(", "),
        }
    }
}

fn store_app_detail(a: &StoreApp) -> String {
    output::detail(&[
        ("Slug", a.slug.clone()),
        ("Name", a.name.clone()),
        ("Description", a.description.clone()),
        ("Author", a.username.clone().unwrap_or_default()),
        ("Version", a.version.clone().unwrap_or_default()),
        ("Categories", a.categories.join(", ")),
    ])
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&StoreCategory> for CategoryRow {
    fn from(c: &StoreCategory) -> Self {
        Self {
            slug: c.slug.clone(),
            name: c.name.clone(),
        }
    }
}

pub async fn handle(store: &DataStore, args: StoreArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        StoreCommand::App { slug } => {
            let slug = util::require_key(&slug, "slug")?;
            let app = util::load(&store.store_apps().node(&slug)).await?;
            let app = (*app).clone().ok_or_else(|| CliError::NotFound {
                resource_type: "store app".into(),
                identifier: slug.clone(),
                list_command: "store search".into(),
            })?;
            let out = output::render_single(&global.output, &app, store_app_detail, |a| a.slug.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StoreCommand::Categories => {
            let categories = util::load(store.store_categories()).await?;
            let out = output::render_list(
                &global.output,
                &categories,
                |c| CategoryRow::from(c),
                |c| c.slug.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StoreCommand::Search {
            query,
            category,
            page,
        } => {
            let results = store
                .client()
                .search_store(&query, category.as_deref(), page)
                .await
                .map_err(CoreError::from)?;
            // Search hits are also store app entries.
            for app in &results.results {
                store.store_apps().set(&app.slug, Some(app.clone()));
            }
            let out = output::render_list(
                &global.output,
                &results.results,
                |a| StoreAppRow::from(a),
                |a| a.slug.clone(),
            )?;
            output::print_output(&out, global.quiet);
            if results.next.is_some() {
                util::notice(&format!("More results: --page {}", page + 1), global.quiet);
            }
            Ok(())
        }

        StoreCommand::Run { slug, input } => run(store, &slug, &input, global).await,
    }
}

async fn run(store: &DataStore, slug: &str, inputs: &[String], global: &GlobalOpts) -> Result<(), CliError> {
    let inputs = inputs
        .iter()
        .map(|raw| serde_json::from_str::<serde_json::Value>(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let slug = util::require_key(slug, "slug")?;
    let mut session = store.open_app_session(&slug).await?;
    let streaming = matches!(global.output, OutputFormat::Table | OutputFormat::Plain) && !global.quiet;
    let mut runs = Vec::with_capacity(inputs.len());

    for input in inputs {
        let result = session
            .run(input, |chunk| {
                if streaming {
                    let mut stdout = std::io::stdout().lock();
                    let _ = write!(stdout, "{}", chunk_text(chunk));
                    let _ = stdout.flush();
                }
            })
            .await;
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                session.close();
                return Err(e.into());
            }
        };
        if streaming {
            println!();
        }
        runs.push(result.chunks);
    }
    session.close();

    if !streaming {
        let out = output::render_single(&global.output, &runs, |_| String::new(), |_| String::new())?;
        output::print_output(&out, global.quiet);
    }
    Ok(())
}

/// Text to show for one streamed chunk: bare strings print as-is.
fn chunk_text(chunk: &serde_json::Value) -> String {
    match chunk {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
