//! Config subcommand handlers.

use dialoguer::{Input, Select};
use secrecy::SecretString;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking secrets.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let Some(p) = cfg.profiles.get(name) else {
            continue;
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "server = \"{}\"", p.server);
        let _ = writeln!(out, "auth_mode = \"{}\"", p.auth_mode);
        if p.token.is_some() {
            let _ = writeln!(out, "token = \"****\"");
        }
        if let Some(ref env) = p.token_env {
            let _ = writeln!(out, "token_env = \"{env}\"");
        }
        if p.session.is_some() {
            let _ = writeln!(out, "session = \"****\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

/// Copy of `cfg` with plaintext secrets replaced, for structured output.
fn redacted(cfg: &Config) -> Config {
    let mask = |secret: &Option<String>| secret.as_ref().map(|_| "****".to_owned());
    Config {
        default_profile: cfg.default_profile.clone(),
        defaults: config::Defaults {
            output: cfg.defaults.output.clone(),
            color: cfg.defaults.color.clone(),
            insecure: cfg.defaults.insecure,
            timeout: cfg.defaults.timeout,
        },
        profiles: cfg
            .profiles
            .iter()
            .map(|(name, p)| {
                let profile = Profile {
                    token: mask(&p.token),
                    session: mask(&p.session),
                    ..p.clone()
                };
                (name.clone(), profile)
            })
            .collect(),
    }
}

/// Map a dialoguer / interactive I/O failure into `CliError`.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Prompt for a secret without echo, rejecting empty input.
fn prompt_secret(label: &str, field: &str) -> Result<String, CliError> {
    let secret = rpassword::prompt_password(label).map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: "value cannot be empty".into(),
        });
    }
    Ok(secret)
}

/// Offer keyring storage for a secret.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in the keyring.
fn prompt_keyring_storage(
    secret: String,
    prompt: &str,
    store: impl FnOnce(&SecretString) -> Result<(), llmstack_config::ConfigError>,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(prompt)
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        store(&SecretString::from(secret))?;
        eprintln!("   ✓ stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(&global.output, &redacted(&cfg), format_config_redacted, |_| {
                "config".into()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::SetToken => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let token = prompt_secret("API token: ", "token")?;
            config::store_token(&profile_name, &SecretString::from(token))?;
            eprintln!("✓ Token stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("LLMStack CLI configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    // Profiles other than the one being written survive a re-run.
    let mut cfg = config::load_config_or_default();

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(config::active_profile_name(global, &cfg))
        .interact_text()
        .map_err(prompt_err)?;

    let server: String = Input::new()
        .with_prompt("Server URL")
        .default(Profile::default().server)
        .validate_with(|raw: &String| {
            llmstack_config::parse_server_url(raw)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    let auth_choices = &[
        "API token (recommended)",
        "Browser session cookie",
        "Anonymous (public store apps only)",
    ];
    let auth_selection = Select::new()
        .with_prompt("Authentication method")
        .items(auth_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let (auth_mode, token, session) = match auth_selection {
        0 => {
            let token = prompt_secret("API token: ", "token")?;
            let name = profile_name.clone();
            let token = prompt_keyring_storage(token, "Where to store the API token?", |s| {
                config::store_token(&name, s)
            })?;
            ("token", token, None)
        }
        1 => {
            let session = prompt_secret("Session cookie: ", "session")?;
            let name = profile_name.clone();
            let session = prompt_keyring_storage(session, "Where to store the session cookie?", |s| {
                config::store_session(&name, s)
            })?;
            ("session", None, session)
        }
        _ => ("anonymous", None, None),
    };

    let profile = Profile {
        server,
        auth_mode: auth_mode.into(),
        token,
        session,
        ..Profile::default()
    };
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());

    let written = config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", written.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: llmstack profile show");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "work".into(),
            Profile {
                token: Some("secret-token".into()),
                session: Some("cookie".into()),
                token_env: Some("WORK_TOKEN".into()),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn text_view_masks_secrets() {
        let text = format_config_redacted(&sample());
        assert!(text.contains("[profiles.work]"));
        assert!(text.contains("token = \"****\""));
        assert!(text.contains("session = \"****\""));
        assert!(text.contains("token_env = \"WORK_TOKEN\""));
        assert!(!text.contains("secret-token"));
        assert!(!text.contains("cookie\""));
    }

    #[test]
    fn structured_view_masks_secrets() {
        let cfg = redacted(&sample());
        let work = cfg.profiles.get("work").unwrap();
        assert_eq!(work.token.as_deref(), Some("****"));
        assert_eq!(work.session.as_deref(), Some("****"));
        assert_eq!(work.token_env.as_deref(), Some("WORK_TOKEN"));
    }
}
