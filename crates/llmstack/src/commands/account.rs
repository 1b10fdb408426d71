//! Profile and organization command handlers.

use std::collections::BTreeMap;

use tabled::Tabled;

use llmstack_core::models::{Organization, OrganizationSettings, Profile, ProfileUpdate};
use llmstack_core::{DataStore, Mutation};

use crate::cli::{GlobalOpts, OrgArgs, OrgCommand, ProfileArgs, ProfileCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Detail views ────────────────────────────────────────────────────

fn profile_detail(p: &Profile) -> String {
    output::detail(&[
        ("Name", p.name.clone()),
        ("Username", p.username.clone()),
        ("Email", p.email.clone().unwrap_or_default()),
        ("Organization", p.organization.clone().unwrap_or_default()),
        ("Providers", p.provider_configs.keys().cloned().collect::<Vec<_>>().join(", ")),
    ])
}

fn org_detail(o: &Organization) -> String {
    output::detail(&[
        ("Name", o.name.clone()),
        ("Slug", o.slug.clone().unwrap_or_default()),
        ("Domains", o.domains.join(", ")),
        ("Disabled", o.disabled_api_backends.join(", ")),
    ])
}

fn settings_detail(s: &OrganizationSettings) -> String {
    let visibility = |v: Option<u8>| v.map(|v| v.to_string()).unwrap_or_default();
    output::detail(&[
        ("Disabled backends", s.disabled_api_backends.join(", ")),
        ("Default visibility", visibility(s.default_app_visibility)),
        ("Max visibility", visibility(s.max_app_visibility)),
        ("User keys", s.allow_user_keys.to_string()),
    ])
}

#[derive(Tabled)]
struct FlagRow {
    #[tabled(rename = "Flag")]
    flag: String,
    #[tabled(rename = "Enabled")]
    enabled: bool,
}

// ── Profile ─────────────────────────────────────────────────────────

async fn signed_in_profile(store: &DataStore) -> Result<Profile, CliError> {
    let profile = util::load(store.profile()).await?;
    (*profile).clone().ok_or_else(|| CliError::AuthFailed {
        message: "not signed in".into(),
    })
}

pub async fn handle_profile(
    store: &DataStore,
    args: ProfileArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command.unwrap_or(ProfileCommand::Show) {
        ProfileCommand::Show => {
            let profile = signed_in_profile(store).await?;
            let out = output::render_single(&global.output, &profile, profile_detail, |p| {
                p.username.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProfileCommand::Flags => {
            signed_in_profile(store).await?;
            let flags: Vec<(String, bool)> = store.profile_flags().await.0.into_iter().collect();
            let out = output::render_list(
                &global.output,
                &flags,
                |(flag, enabled)| FlagRow {
                    flag: flag.clone(),
                    enabled: *enabled,
                },
                |(flag, _)| flag.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProfileCommand::Update {
            name,
            provider_configs,
        } => {
            let provider_configs = match provider_configs {
                Some(path) => {
                    let value = util::read_json_file(&path)?;
                    Some(serde_json::from_value::<BTreeMap<String, serde_json::Value>>(value)?)
                }
                None => None,
            };
            if name.is_none() && provider_configs.is_none() {
                return Err(CliError::Validation {
                    field: "profile".into(),
                    reason: "nothing to update (pass --name or --provider-configs)".into(),
                });
            }

            store
                .execute(Mutation::UpdateProfile(ProfileUpdate {
                    name,
                    provider_configs,
                }))
                .await?;
            util::notice("Profile updated", global.quiet);
            Ok(())
        }
    }
}

// ── Organization ────────────────────────────────────────────────────

pub async fn handle_org(store: &DataStore, args: OrgArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command.unwrap_or(OrgCommand::Show) {
        OrgCommand::Show => {
            let org = util::load(store.organization()).await?;
            let org = (*org).clone().ok_or_else(|| CliError::NotFound {
                resource_type: "organization".into(),
                identifier: "current".into(),
                list_command: "profile".into(),
            })?;
            let out = output::render_single(&global.output, &org, org_detail, |o| o.name.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OrgCommand::Settings => {
            let settings = util::load(store.organization_settings()).await?;
            let out = output::render_single(&global.output, settings.as_ref(), settings_detail, |s| {
                s.disabled_api_backends.join("\n")
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OrgCommand::DisableBackend { backend } => {
            let mut settings = (*util::load(store.organization_settings()).await?).clone();
            if settings.disabled_api_backends.contains(&backend) {
                util::notice(&format!("{backend} is already disabled"), global.quiet);
                return Ok(());
            }
            settings.disabled_api_backends.push(backend.clone());
            store.execute(Mutation::UpdateOrganizationSettings(settings)).await?;
            util::notice(&format!("Disabled {backend}"), global.quiet);
            Ok(())
        }

        OrgCommand::EnableBackend { backend } => {
            let mut settings = (*util::load(store.organization_settings()).await?).clone();
            let before = settings.disabled_api_backends.len();
            settings.disabled_api_backends.retain(|b| b != &backend);
            if settings.disabled_api_backends.len() == before {
                util::notice(&format!("{backend} is not disabled"), global.quiet);
                return Ok(());
            }
            store.execute(Mutation::UpdateOrganizationSettings(settings)).await?;
            util::notice(&format!("Enabled {backend}"), global.quiet);
            Ok(())
        }
    }
}
