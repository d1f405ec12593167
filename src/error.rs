//! Error types for the client and the long-running-operation poller.

use crate::poller::OperationStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure from the HTTP pipeline. Never retried by the
    /// poller; retry policy belongs to the caller.
    #[error("transport error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response does not match any known ARM convention (missing status
    /// payload, unparseable polling URL, invalid JSON where JSON is
    /// required). Permanent, but never cached as a terminal operation state.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The service reported a terminal Failed or Canceled state for a
    /// long-running operation.
    #[error("long-running operation reached terminal state {status}: {code}: {message}")]
    OperationFailed {
        status: OperationStatus,
        code: String,
        message: String,
    },

    /// The caller's cancellation token fired while waiting between polls.
    #[error("operation canceled by caller")]
    Canceled,

    /// `final_response` was called before the operation reached a terminal
    /// state.
    #[error("the long-running operation has not reached a terminal state")]
    NotDone,

    /// The service rejected a request with a non-success status code.
    #[error("service returned {status}: {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required path parameter was empty.
    #[error("parameter {0} must not be empty")]
    EmptyParameter(&'static str),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
