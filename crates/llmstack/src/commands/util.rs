//! Shared helpers for command handlers.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use llmstack_core::{CacheError, CacheNode, FamilyKey};
use uuid::Uuid;

use crate::error::CliError;

/// Load a node, turning a recorded fetch failure into an error.
///
/// Cache reads never fail on their own (they fall back to the node's
/// default), but a CLI listing an empty result after a 401 would mislead.
pub async fn load<T>(node: &CacheNode<T>) -> Result<Arc<T>, CliError>
where
    T: Send + Sync + 'static,
{
    let value = node.ensure_loaded().await;
    match node.error() {
        Some(err) => Err(cache_error(&err)),
        None => Ok(value),
    }
}

/// Map a node's recorded failure to a CLI error.
pub fn cache_error(err: &CacheError) -> CliError {
    match err.status {
        Some(401) => CliError::AuthFailed {
            message: err.message.clone(),
        },
        Some(403) => CliError::Forbidden {
            message: err.message.clone(),
        },
        status => CliError::ApiError {
            status,
            message: err.message.clone(),
        },
    }
}

/// Parse a UUID argument.
pub fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("'{raw}' is not a UUID"),
    })
}

/// Reject an empty slug or share code before it reaches a cache family.
pub fn require_key(raw: &str, field: &str) -> Result<String, CliError> {
    let key = raw.trim().to_owned();
    if key.is_blank() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: "cannot be empty".into(),
        });
    }
    Ok(key)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<serde_json::Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Short local timestamp for table cells.
pub fn format_time(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Print a one-line status message to stderr unless quiet.
pub fn notice(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}
