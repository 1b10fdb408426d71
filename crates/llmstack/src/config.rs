//! CLI configuration: thin wrapper around `llmstack_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--server, --token, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use llmstack_core::{AuthCredentials, ClientConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use llmstack_config::{
    Config, Defaults, Profile, config_path, load_config, load_config_or_default, save_config,
    store_session, store_token,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the `ClientConfig` for this invocation.
///
/// Flags win over the profile, the profile wins over config defaults.
/// Without a profile, `--server` alone is enough: the token flag is used
/// when given, anonymous access otherwise.
pub fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, global, cfg.defaults.insecure);
    }

    let server = global.server.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url = llmstack_config::parse_server_url(server)?;

    let auth = global
        .token
        .as_ref()
        .map_or(AuthCredentials::Anonymous, |token| {
            AuthCredentials::Token(SecretString::from(token.clone()))
        });

    let tls = if global.insecure || cfg.defaults.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(ClientConfig {
        url,
        auth,
        tls,
        timeout: Duration::from_secs(global.timeout),
    })
}

/// Translate a `Profile` + global flags into a `ClientConfig`.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
    default_insecure: bool,
) -> Result<ClientConfig, CliError> {
    // 1. Server URL (flag > env > profile)
    let url = llmstack_config::parse_server_url(global.server.as_deref().unwrap_or(&profile.server))?;

    // 2. Credentials (token flag > profile chain)
    let auth = match global.token {
        Some(ref token) => AuthCredentials::Token(SecretString::from(token.clone())),
        None => llmstack_config::resolve_auth(profile, profile_name)?,
    };

    // 3. TLS verification
    let tls = if global.insecure || profile.insecure.unwrap_or(default_insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    // 4. Timeout (profile > flag default)
    let timeout = Duration::from_secs(profile.timeout.unwrap_or(global.timeout));

    Ok(ClientConfig {
        url,
        auth,
        tls,
        timeout,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["llmstack"];
        argv.extend_from_slice(args);
        argv.push("org");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn anonymous_profile() -> Profile {
        Profile {
            server: "https://stack.example.com".into(),
            auth_mode: "anonymous".into(),
            ..Profile::default()
        }
    }

    #[test]
    fn server_flag_overrides_profile() {
        let g = global(&["--server", "http://localhost:3000"]);
        let config = resolve_profile(&anonymous_profile(), "default", &g, false).unwrap();
        assert_eq!(config.url.as_str(), "http://localhost:3000/");
    }

    #[test]
    fn token_flag_overrides_profile_auth() {
        let g = global(&["--token", "tok"]);
        let config = resolve_profile(&anonymous_profile(), "default", &g, false).unwrap();
        assert!(matches!(config.auth, AuthCredentials::Token(_)));
    }

    #[test]
    fn profile_inherits_insecure_default() {
        let g = global(&[]);
        let config = resolve_profile(&anonymous_profile(), "default", &g, true).unwrap();
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
