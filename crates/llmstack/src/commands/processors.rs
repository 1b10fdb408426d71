//! Processor and provider command handlers.

use tabled::Tabled;

use llmstack_core::DataStore;
use llmstack_core::models::{Processor, Provider};

use crate::cli::{GlobalOpts, ProcessorsArgs, ProcessorsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ProcessorRow {
    #[tabled(rename = "Backend")]
    backend: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Provider")]
    provider: String,
}

impl From<&Processor> for ProcessorRow {
    fn from(p: &Processor) -> Self {
        Self {
            backend: p.backend_id(),
            name: p.name.clone(),
            provider: p.api_provider.name.clone(),
        }
    }
}

#[derive(Tabled)]
struct ProviderRow {
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&Provider> for ProviderRow {
    fn from(p: &Provider) -> Self {
        Self {
            slug: p.slug.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
        }
    }
}

pub async fn handle(
    store: &DataStore,
    args: ProcessorsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ProcessorsCommand::List { provider, all } => {
            let processors = if all {
                util::load(store.processors()).await?.to_vec()
            } else {
                // Surface a failed fetch instead of an empty list.
                util::load(store.processors()).await?;
                store.available_processors().await
            };

            let shown: Vec<Processor> = match provider {
                Some(slug) => provider_group(&processors, &slug),
                None => processors,
            };
            let out = output::render_list(&global.output, &shown, |p| ProcessorRow::from(p), |p| {
                p.backend_id()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProcessorsCommand::Providers => {
            let providers = util::load(store.providers()).await?;
            let out = output::render_list(&global.output, &providers, |p| ProviderRow::from(p), |p| {
                p.slug.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

/// Keep one provider's processors.
fn provider_group(processors: &[Processor], slug: &str) -> Vec<Processor> {
    llmstack_core::derive::processors_by_provider(processors)
        .remove(slug)
        .unwrap_or_default()
}
