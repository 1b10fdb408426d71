// ── Runtime connection configuration ──
//
// These types describe *how* to reach an LLMStack server. They carry
// credential data and connection tuning, but never touch disk.
// The CLI constructs a `ClientConfig` and hands it in.

use std::time::Duration;

use llmstack_api::{ApiClient, TlsMode, TransportConfig};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::CoreError;

/// Django's session cookie name.
const SESSION_COOKIE: &str = "sessionid";

/// How to authenticate with the server.
#[derive(Debug, Clone, Default)]
pub enum AuthCredentials {
    /// API token, sent as `Authorization: Token ...`.
    Token(SecretString),
    /// Browser session cookie value (`sessionid`).
    Session(SecretString),
    /// No credentials: only public endpoints (store, shared runs) work.
    #[default]
    Anonymous,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed development servers).
    DangerAcceptInvalid,
}

/// Configuration for talking to one server.
///
/// Built by the CLI, passed to [`DataStore`](crate::DataStore); core never
/// reads config files.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root (e.g. `https://trypromptly.com`).
    pub url: Url,
    pub auth: AuthCredentials,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            auth: AuthCredentials::default(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Build the transport client this configuration describes.
    pub fn build_client(&self) -> Result<ApiClient, CoreError> {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        let transport = TransportConfig {
            tls,
            timeout: self.timeout,
            cookie_jar: None,
        };

        let token = match &self.auth {
            AuthCredentials::Token(token) => Some(token.clone()),
            AuthCredentials::Session(_) | AuthCredentials::Anonymous => None,
        };
        let client = ApiClient::new(self.url.as_str(), &transport, token)?;

        if let AuthCredentials::Session(session) = &self.auth {
            client.add_cookie(&format!("{SESSION_COOKIE}={}", session.expose_secret()));
        }
        Ok(client)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn session_credentials_seed_the_cookie_jar() {
        let mut config = ClientConfig::new("https://stack.example.com".parse().unwrap());
        config.auth = AuthCredentials::Session(SecretString::from("s3ss10n".to_string()));

        let client = config.build_client().unwrap();
        assert!(client.token().is_none());
        assert_eq!(client.cookie_header().as_deref(), Some("sessionid=s3ss10n"));
    }

    #[test]
    fn token_credentials_are_kept_on_the_client() {
        let mut config = ClientConfig::new("http://localhost:3000".parse().unwrap());
        config.auth = AuthCredentials::Token(SecretString::from("tok".to_string()));

        let client = config.build_client().unwrap();
        assert_eq!(client.token().map(|t| t.expose_secret()), Some("tok"));
    }
}
