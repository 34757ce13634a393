//! Mapping of GitHub HTTP failures onto [`ErrorKind`].
//!
//! Classification happens exactly once, here; everything above this crate
//! only reads the resulting [`PlatformError`].

use provisioning::{ErrorKind, PlatformError};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;

/// GitHub's JSON error body.
///
/// `errors` entries are either bare strings or objects with a `message`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

/// Builds the human-readable message for a failed response.
///
/// Uses the body's `message`, followed by any detail messages, falling back to
/// the raw body and finally to the status line.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let details: Vec<String> = parsed
        .errors
        .iter()
        .filter_map(|e| match e {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(map) => map
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect();

    let base = match parsed.message {
        Some(m) if !m.trim().is_empty() => m,
        _ if !body.trim().is_empty() && details.is_empty() => body.trim().to_string(),
        _ => status.to_string(),
    };

    if details.is_empty() {
        base
    } else {
        format!("{base} ({})", details.join("; "))
    }
}

/// Classifies a non-success response.
pub fn classify_response(status: StatusCode, headers: &HeaderMap, body: &str) -> PlatformError {
    let message = error_message(status, body);
    let lowered = message.to_ascii_lowercase();

    let kind = match status {
        StatusCode::UNAUTHORIZED => ErrorKind::Auth,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        StatusCode::FORBIDDEN if is_rate_limited(headers, &lowered) => ErrorKind::RateLimited,
        StatusCode::FORBIDDEN => ErrorKind::Auth,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::CONFLICT => ErrorKind::Conflict,
        StatusCode::UNPROCESSABLE_ENTITY if lowered.contains("already exists") => {
            ErrorKind::Conflict
        }
        s if s.is_server_error() => ErrorKind::Transport,
        _ => ErrorKind::Unknown,
    };

    PlatformError::new(kind, message)
}

fn is_rate_limited(headers: &HeaderMap, lowered_message: &str) -> bool {
    let exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");
    exhausted || headers.contains_key("retry-after") || lowered_message.contains("rate limit")
}

/// Classifies a failure that happened before a response was received.
pub fn classify_transport(err: &reqwest::Error) -> PlatformError {
    if err.is_decode() {
        PlatformError::unknown(format!("Unexpected response from GitHub: {err}"))
    } else {
        PlatformError::transport(err.to_string())
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
