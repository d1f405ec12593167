//! Wire-level status parsing for long-running operations
//!
//! ARM reports operation progress in two places: a `status` field in the
//! operation-status document (Azure-AsyncOperation flows) and a
//! `properties.provisioningState` field embedded in the resource itself
//! (PUT/PATCH body flows). Both feed [`OperationStatus`].

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Status of a long-running operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationStatus {
    /// Normalize a wire string onto the status enum. ARM services report a
    /// number of in-progress spellings (`InProgress`, `Updating`,
    /// `Deleting`, ...); anything unrecognized is treated as still running
    /// rather than terminal.
    pub fn parse(value: &str) -> Self {
        match value {
            "NotStarted" => OperationStatus::NotStarted,
            "Succeeded" | "Completed" => OperationStatus::Succeeded,
            "Failed" => OperationStatus::Failed,
            // "Cancelled" is a non-conformant spelling seen in the wild
            "Canceled" | "Cancelled" => OperationStatus::Canceled,
            _ => OperationStatus::Running,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationStatus::Succeeded | OperationStatus::Failed | OperationStatus::Canceled
        )
    }

    /// True for the terminal states that carry a server error detail.
    pub fn is_failed(self) -> bool {
        matches!(self, OperationStatus::Failed | OperationStatus::Canceled)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationStatus::NotStarted => "NotStarted",
            OperationStatus::Running => "Running",
            OperationStatus::Succeeded => "Succeeded",
            OperationStatus::Failed => "Failed",
            OperationStatus::Canceled => "Canceled",
        };
        f.write_str(s)
    }
}

fn parse_body(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body)
        .map_err(|_| Error::MalformedResponse("response body is not valid JSON".to_string()))
}

/// Read `properties.provisioningState` from a resource body. Returns `None`
/// when the body is empty or carries no state.
pub(crate) fn provisioning_state(body: &[u8]) -> Result<Option<OperationStatus>> {
    if body.is_empty() {
        return Ok(None);
    }
    let value = parse_body(body)?;
    Ok(value
        .get("properties")
        .and_then(|p| p.get("provisioningState"))
        .and_then(|s| s.as_str())
        .map(OperationStatus::parse))
}

/// Read the top-level `status` field of an operation-status document.
pub(crate) fn status_field(body: &[u8]) -> Result<Option<OperationStatus>> {
    if body.is_empty() {
        return Ok(None);
    }
    let value = parse_body(body)?;
    Ok(value
        .get("status")
        .and_then(|s| s.as_str())
        .map(OperationStatus::parse))
}

/// Extract the `error: {code, message}` detail from a terminal failure body.
pub(crate) fn error_detail(body: &[u8]) -> (String, String) {
    let detail = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned());
    let field = |name: &str| {
        detail
            .as_ref()
            .and_then(|e| e.get(name))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    (
        field("code").unwrap_or_else(|| "Unknown".to_string()),
        field("message")
            .unwrap_or_else(|| "the operation failed without error detail".to_string()),
    )
}

fn http_date_delay(value: &str) -> Option<Duration> {
    let when = DateTime::parse_from_rfc2822(value).ok()?;
    let delay = when.with_timezone(&Utc).signed_duration_since(Utc::now());
    // a date in the past means no wait
    delay.to_std().ok()
}

/// Extract the server-requested poll delay from response headers.
///
/// Checked in order: `retry-after-ms`, `x-ms-retry-after-ms` (both in
/// milliseconds), then `retry-after` (seconds, or an HTTP-date).
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header_str =
        |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    for name in ["retry-after-ms", "x-ms-retry-after-ms"] {
        if let Some(value) = header_str(name) {
            if let Ok(ms) = value.parse::<u64>() {
                return Some(Duration::from_millis(ms));
            }
        }
    }

    if let Some(value) = header_str("retry-after") {
        if let Ok(secs) = value.parse::<u64>() {
            return Some(Duration::from_secs(secs));
        }
        return http_date_delay(value);
    }

    None
}

/// Status codes a poll response may carry without being an error.
pub(crate) fn is_valid_poll_code(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 200 | 201 | 202 | 204)
}

/// Status codes that indicate throttling or a transient server problem;
/// Location polling keeps its current state when it sees one.
pub(crate) fn is_non_terminal_http_code(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
}
