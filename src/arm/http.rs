//! HTTP pipeline for ARM REST calls
//!
//! The pipeline attaches authentication and correlation headers, sends JSON
//! bodies, and buffers responses so the caller (and the poller) can inspect
//! status, headers and body as plain values. It does not police status
//! codes; callers state which codes they expect via [`expect_status`].

use crate::arm::auth::{TokenCredential, MANAGEMENT_SCOPE};
use crate::error::{Error, Result};
use crate::resources::models::CloudError;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and masks potentially sensitive patterns
fn sanitize_for_log(body: &[u8]) -> String {
    // truncate on the raw bytes; lossy conversion keeps a split character
    // from panicking the slice
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        format!(
            "{}... [truncated, {} bytes total]",
            String::from_utf8_lossy(&body[..MAX_LOG_BODY_LENGTH]),
            body.len()
        )
    } else {
        String::from_utf8_lossy(body).to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    /// Decode the body as JSON. An empty body decodes as JSON `null`, which
    /// covers 204 responses and DELETE results.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.is_empty() {
            Ok(serde_json::from_slice(b"null")?)
        } else {
            Ok(serde_json::from_slice(&self.body)?)
        }
    }
}

/// HTTP pipeline shared by every client and poller
#[derive(Clone)]
pub struct Pipeline {
    http: reqwest::Client,
    credential: Arc<dyn TokenCredential>,
}

impl Pipeline {
    /// Create a new pipeline around the given credential
    pub fn new(credential: Arc<dyn TokenCredential>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("aznet/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, credential })
    }

    /// Send a request with an optional JSON body and buffer the response.
    pub async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Response> {
        let token = self.credential.token(MANAGEMENT_SCOPE).await?;
        let request_id = Uuid::new_v4();

        tracing::debug!("{} {} [{}]", method, url, request_id);

        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(token.token)
            .header("x-ms-client-request-id", request_id.to_string())
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        if status.is_success() {
            tracing::debug!("{} - {}", status, sanitize_for_log(&body));
        } else {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::warn!("API error: {} - {}", status, sanitize_for_log(&body));
        }

        Ok(Response {
            status,
            headers,
            body,
        })
    }

    /// Issue a GET request
    pub async fn get(&self, url: Url) -> Result<Response> {
        self.send(Method::GET, url, None).await
    }
}

/// Check the response against the status codes the operation expects,
/// mapping anything else to an [`Error::Api`] built from the ARM error
/// envelope.
pub fn expect_status(response: &Response, expected: &[StatusCode]) -> Result<()> {
    if expected.contains(&response.status) {
        Ok(())
    } else {
        Err(error_from_response(response))
    }
}

/// Build an [`Error::Api`] from an ARM error-envelope response.
pub(crate) fn error_from_response(response: &Response) -> Error {
    let envelope: CloudError = response.json().unwrap_or_default();
    let detail = envelope.error.unwrap_or_default();
    Error::Api {
        status: response.status.as_u16(),
        code: detail.code.unwrap_or_default(),
        message: detail.message.unwrap_or_default(),
    }
}
