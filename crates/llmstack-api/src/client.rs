// REST API HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, token and CSRF headers,
// error normalization, and `next`-link pagination. Endpoint methods live
// in `crate::endpoints` as inherent impls, so this module stays focused
// on transport mechanics.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::ListResponse;
use crate::transport::TransportConfig;

/// Django's CSRF cookie and header names.
const CSRF_COOKIE: &str = "csrftoken";
const CSRF_HEADER: &str = "X-CSRFToken";

/// Longest server body kept in an error message.
const ERROR_PREVIEW_CHARS: usize = 200;

/// Upper bound on pages followed by [`ApiClient::get_all`].
const MAX_PAGES: usize = 1000;

/// Async client for the REST API under `{base}/api/`.
///
/// Authenticates either with a session cookie (the jar is shared with the
/// WebSocket helper) or an `Authorization: Token ...` header. Unsafe verbs
/// carry the CSRF token when one is known.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    /// Explicit CSRF token. When unset the `csrftoken` cookie is used.
    csrf_token: ArcSwapOption<String>,
    cookie_jar: Option<Arc<Jar>>,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from a transport config and optional API token.
    ///
    /// A cookie jar is always attached so that session cookies and the
    /// CSRF cookie set by the server are replayed on later requests.
    pub fn new(
        base_url: &str,
        transport: &TransportConfig,
        token: Option<SecretString>,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };

        let mut headers = HeaderMap::new();
        if let Some(ref token) = token {
            let mut value = HeaderValue::from_str(&format!("Token {}", token.expose_secret()))
                .map_err(|e| Error::Authentication {
                    message: format!("invalid API token header value: {e}"),
                })?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let http = config.build_client_with_headers(headers)?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            token,
            csrf_token: ArcSwapOption::empty(),
            cookie_jar: config.cookie_jar,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            token: None,
            csrf_token: ArcSwapOption::empty(),
            cookie_jar: None,
        })
    }

    /// The server root, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The API token, if token auth is configured.
    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// The `Cookie` header value for the server, for WebSocket auth.
    pub fn cookie_header(&self) -> Option<String> {
        let jar = self.cookie_jar.as_ref()?;
        let cookies = jar.cookies(&self.base_url)?;
        cookies.to_str().ok().map(String::from)
    }

    /// Seed the session cookie (e.g. a `sessionid` copied from a browser).
    pub fn add_cookie(&self, cookie: &str) {
        if let Some(ref jar) = self.cookie_jar {
            jar.add_cookie_str(cookie, &self.base_url);
        }
    }

    // ── CSRF token management ────────────────────────────────────────

    /// Pin a CSRF token instead of reading it from the cookie jar.
    pub fn set_csrf_token(&self, token: String) {
        debug!("storing CSRF token");
        self.csrf_token.store(Some(Arc::new(token)));
    }

    /// The CSRF token to send on unsafe verbs, if any is known.
    pub fn csrf_token(&self) -> Option<String> {
        if let Some(token) = self.csrf_token.load_full() {
            return Some(token.as_ref().clone());
        }
        self.cookie_header()
            .and_then(|header| cookie_value(&header, CSRF_COOKIE).map(String::from))
    }

    fn apply_csrf(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.csrf_token() {
            Some(token) => {
                trace!("attaching CSRF token");
                builder
                    .header(CSRF_HEADER, token)
                    .header(reqwest::header::REFERER, self.base_url.as_str())
            }
            None => builder,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Join an API path (e.g. `"api/connections"`) onto the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Resolve a pagination `next` link against the page it came from.
    ///
    /// Absolute links keep only their path and query: servers behind a
    /// proxy often answer with their internal host name. Root-relative
    /// links go onto the base URL; anything else (`?page=2`,
    /// `apps?page=2`) is relative to `current`.
    pub(crate) fn resolve_next(&self, current: &Url, next: &str) -> Result<Url, Error> {
        let rooted = match Url::parse(next) {
            Ok(absolute) => match absolute.query() {
                Some(query) => format!("{}?{query}", absolute.path()),
                None => absolute.path().to_owned(),
            },
            Err(_) if next.starts_with('/') => next.to_owned(),
            Err(_) => return Ok(current.join(next)?),
        };
        let (path, query) = match rooted.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rooted.as_str(), None),
        };
        let mut url = self.url(path)?;
        url.set_query(query);
        Ok(url)
    }

    /// Build a WebSocket URL for `path` on the same host (`http`→`ws`).
    pub fn websocket_url(&self, path: &str) -> Result<Url, Error> {
        let mut url = self.url(path)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::WebSocketConnect(format!("cannot derive ws URL from {url}")))?;
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    /// GET a list endpoint and follow `next` links until exhausted.
    pub(crate) async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, Error> {
        let mut url = self.url(path)?;
        let mut items = Vec::new();

        for page in 0..MAX_PAGES {
            debug!(page, "GET {url}");
            let resp = self.http.get(url.clone()).send().await?;
            let body: ListResponse<T> = self.handle_response(resp).await?;
            let (mut batch, next) = body.into_parts();
            items.append(&mut batch);

            match next {
                Some(link) => url = self.resolve_next(&url, &link)?,
                None => return Ok(items),
            }
        }

        debug!(max = MAX_PAGES, "page limit reached, returning partial list");
        Ok(items)
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.apply_csrf(self.http.post(url).json(body)).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post_no_response<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.apply_csrf(self.http.post(url).json(body)).send().await?;
        self.handle_empty(resp).await
    }

    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PATCH {url}");

        let resp = self
            .apply_csrf(self.http.patch(url).json(body))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.apply_csrf(self.http.delete(url)).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::error_from(resp).await);
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(resp).await)
        }
    }

    /// Normalize a non-2xx response into an [`Error`].
    async fn error_from(resp: reqwest::Response) -> Error {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let message = server_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_owned());

        match status {
            reqwest::StatusCode::UNAUTHORIZED => Error::Authentication { message },
            reqwest::StatusCode::FORBIDDEN => Error::Forbidden { message },
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Ensure the base URL ends with `/` so relative joins keep any prefix.
fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    Ok(url)
}

/// Extract the human-readable message from an error body.
///
/// Understands `{"detail": ...}`, `{"error": ...}`, `{"message": ...}`,
/// field-error maps (`{"name": ["required"]}`) and lists of strings.
/// Falls back to a truncated copy of a non-JSON body.
pub(crate) fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return Some(preview(trimmed));
    };

    match value {
        serde_json::Value::Object(map) => {
            for key in ["detail", "error", "message", "errors"] {
                if let Some(text) = map.get(key).and_then(flatten_message) {
                    return Some(text);
                }
            }
            let fields: Vec<String> = map
                .iter()
                .filter_map(|(field, v)| flatten_message(v).map(|m| format!("{field}: {m}")))
                .collect();
            (!fields.is_empty()).then(|| fields.join("; "))
        }
        other => flatten_message(&other),
    }
}

fn flatten_message(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(flatten_message).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

fn preview(body: &str) -> String {
    body.chars().take(ERROR_PREVIEW_CHARS).collect()
}

/// Find `name=value` in a `Cookie` header string.
fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find_map(|(k, v)| (k == name).then_some(v))
}
