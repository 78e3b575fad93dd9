use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed screen load. The first seven kinds cover
/// every transport/HTTP failure; `Validation` and `NoResults` are produced
/// locally without (or after) the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    BadRequest,
    ServerError(u16),
    Timeout,
    NetworkUnreachable,
    Unknown,
    Validation,
    NoResults,
}

impl ErrorKind {
    /// Whether the failure came back from (or failed to reach) the server.
    pub fn is_remote(self) -> bool {
        !matches!(self, ErrorKind::Validation | ErrorKind::NoResults)
    }

    pub fn requires_reauth(self) -> bool {
        self == ErrorKind::Unauthorized
    }
}

/// Human-readable failure stored in view state.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ViewError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ViewError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Extracts the most useful human-readable detail from an API error body.
///
/// The backend answers with `{"detail": ..}`, `{"error": ..}`,
/// `{"non_field_errors": [..]}` or per-field lists such as
/// `{"username": ["A user with that username already exists."]}`.
pub fn server_detail(body: &serde_json::Value) -> Option<String> {
    let object = body.as_object()?;

    for key in ["detail", "error"] {
        if let Some(text) = object.get(key).and_then(first_text) {
            return Some(text);
        }
    }

    if let Some(text) = object.get("non_field_errors").and_then(first_text) {
        return Some(text);
    }

    object
        .iter()
        .find_map(|(field, value)| first_text(value).map(|text| format!("{field}: {text}")))
}

fn first_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        serde_json::Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}
