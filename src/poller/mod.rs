//! Long-running-operation poller
//!
//! Mutating ARM operations (create/update/delete) return before the work
//! finishes; the response carries a handle describing where to poll for
//! progress. [`Poller`] wraps that initial response, tracks the operation
//! until a terminal state, and yields the final resource.
//!
//! A poller owns exactly one operation and is not meant to be shared: it
//! mutates its own poll URL and status, which is why every polling method
//! takes `&mut self`. The poller never retries transport failures - that is
//! the caller's (or an outer retry policy's) decision.
//!
//! # Polling strategies
//!
//! The initial response selects one of the ARM conventions:
//!
//! - `Azure-AsyncOperation` header: poll the operation-status document URL
//!   and read its `status` field
//! - `Location` header: poll the given URL; HTTP status codes carry the
//!   progress
//! - PUT/PATCH with neither header: poll the resource itself and read
//!   `properties.provisioningState`
//! - anything else that already finished: no polling at all

mod status;

pub use status::OperationStatus;
// re-exported so callers don't need a direct tokio-util dependency
pub use tokio_util::sync::CancellationToken;

use crate::arm::http::{error_from_response, Pipeline, Response};
use crate::error::{Error, Result};
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::time::Duration;
use url::Url;

/// Poll interval used when the service sends no `Retry-After` header and
/// the caller does not override the frequency.
pub const DEFAULT_POLL_FREQUENCY: Duration = Duration::from_secs(30);

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
const LOCATION: &str = "location";

/// Which ARM convention the initial response selected.
#[derive(Debug, Clone)]
enum Strategy {
    AsyncOperation(Url),
    Location(Url),
    ProvisioningState,
    Completed,
}

/// Options for [`Poller::poll_until_done`].
#[derive(Debug, Clone, Default)]
pub struct PollUntilDoneOptions {
    /// Time between polls when the service does not send a `Retry-After`
    /// header. Defaults to [`DEFAULT_POLL_FREQUENCY`].
    pub frequency: Option<Duration>,
    /// Cooperative cancellation, checked while waiting between polls. An
    /// in-flight HTTP call is never interrupted.
    pub cancel: Option<CancellationToken>,
}

fn header_url(headers: &HeaderMap, name: &str) -> Result<Option<Url>> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| Error::MalformedResponse(format!("header `{name}` is not valid text")))?;
    let url = Url::parse(value).map_err(|_| {
        Error::MalformedResponse(format!("header `{name}` is not a valid URL: {value}"))
    })?;
    Ok(Some(url))
}

async fn wait_or_cancel(delay: Duration, cancel: Option<&CancellationToken>) -> Result<()> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(Error::Canceled),
            _ = tokio::time::sleep(delay) => Ok(()),
        },
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
    }
}

/// Tracks one long-running operation until it reaches a terminal state and
/// decodes the final resource as `T`.
pub struct Poller<T> {
    pipeline: Pipeline,
    method: Method,
    origin_url: Url,
    strategy: Strategy,
    /// Location header from the initial response; used to resolve the final
    /// resource of POST operations under the async-operation strategy.
    location: Option<Url>,
    status: OperationStatus,
    last: Response,
    retry_after: Option<Duration>,
    resolved: Option<Response>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for Poller<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("method", &self.method)
            .field("origin_url", &self.origin_url)
            .field("strategy", &self.strategy)
            .field("location", &self.location)
            .field("status", &self.status)
            .field("last", &self.last)
            .field("retry_after", &self.retry_after)
            .field("resolved", &self.resolved)
            .finish()
    }
}

impl<T: DeserializeOwned> Poller<T> {
    /// Build a poller from the response to the triggering request.
    ///
    /// Inspects headers and body to pick the polling strategy. Fails with
    /// [`Error::MalformedResponse`] when no valid polling mechanism can be
    /// determined (a 202 on DELETE/POST without a polling header, or an
    /// unparseable polling URL).
    pub fn from_initial_response(
        pipeline: Pipeline,
        method: Method,
        origin_url: Url,
        initial: Response,
    ) -> Result<Self> {
        // Back-stop: callers check expected status codes before handing the
        // response over, but a poller must never be built on a failure.
        if !status::is_valid_poll_code(initial.status) {
            return Err(error_from_response(&initial));
        }

        let async_url = header_url(&initial.headers, AZURE_ASYNC_OPERATION)?;
        let location = header_url(&initial.headers, LOCATION)?;
        let retry_after = status::retry_after(&initial.headers);

        let (strategy, current) = if let Some(url) = async_url {
            // async-operation must win: such responses can carry a Location
            // header as well
            let state =
                status::provisioning_state(&initial.body)?.unwrap_or(OperationStatus::Running);
            (Strategy::AsyncOperation(url), state)
        } else if let Some(url) = location.clone() {
            let state =
                status::provisioning_state(&initial.body)?.unwrap_or(OperationStatus::Running);
            (Strategy::Location(url), state)
        } else if method == Method::PUT || method == Method::PATCH {
            let state = status::provisioning_state(&initial.body)?;
            let current = match initial.status.as_u16() {
                200 => state.unwrap_or(OperationStatus::Succeeded),
                204 => OperationStatus::Succeeded,
                _ => state.unwrap_or(OperationStatus::Running),
            };
            (Strategy::ProvisioningState, current)
        } else if initial.status.as_u16() == 202 {
            // a 202 on DELETE/POST with no polling headers leaves nowhere
            // to poll
            return Err(Error::MalformedResponse(
                "response is missing a polling URL".to_string(),
            ));
        } else {
            // the operation completed synchronously
            let state = status::provisioning_state(&initial.body)?
                .filter(|s| s.is_terminal())
                .unwrap_or(OperationStatus::Succeeded);
            (Strategy::Completed, state)
        };

        tracing::debug!("created poller: strategy {:?}, status {}", strategy, current);

        Ok(Self {
            pipeline,
            method,
            origin_url,
            strategy,
            location,
            status: current,
            last: initial,
            retry_after,
            resolved: None,
            _marker: PhantomData,
        })
    }

    /// True iff the last observed status is terminal. Pure read; no I/O.
    pub fn done(&self) -> bool {
        self.status.is_terminal()
    }

    /// The last observed status. Pure read; no I/O.
    pub fn status(&self) -> OperationStatus {
        self.status
    }

    /// Issue one poll request and update the tracked state.
    ///
    /// Once the poller is terminal this is an idempotent no-op issuing no
    /// network call. Errors (transport failures, malformed bodies) leave
    /// the tracked state untouched, so the caller may retry.
    pub async fn poll(&mut self) -> Result<OperationStatus> {
        if self.done() {
            return Ok(self.status);
        }

        let poll_url = match &self.strategy {
            Strategy::AsyncOperation(url) | Strategy::Location(url) => url.clone(),
            Strategy::ProvisioningState => self.origin_url.clone(),
            // terminal at construction; unreachable past the done() check
            Strategy::Completed => return Ok(self.status),
        };

        let response = self.pipeline.get(poll_url).await?;

        let (next, new_location) = match &self.strategy {
            Strategy::AsyncOperation(_) => {
                if !status::is_valid_poll_code(response.status) {
                    return Err(error_from_response(&response));
                }
                match status::status_field(&response.body)? {
                    Some(state) => (state, None),
                    None => {
                        return Err(Error::MalformedResponse(
                            "the operation response did not contain a status".to_string(),
                        ))
                    }
                }
            }
            Strategy::Location(_) => {
                // location polling can return an updated polling URL
                let new_location = header_url(&response.headers, LOCATION)?;
                let state = if let Some(state) = status::provisioning_state(&response.body)? {
                    // some ARM scenarios (e.g. DELETE with a Location
                    // header) do carry a provisioning state
                    state
                } else if response.status.as_u16() == 202 {
                    OperationStatus::Running
                } else if response.status.is_success() {
                    // any 2xx other than a 202 indicates success
                    OperationStatus::Succeeded
                } else if status::is_non_terminal_http_code(response.status) {
                    // throttled or timed out; keep the current state
                    self.status
                } else {
                    OperationStatus::Failed
                };
                (state, new_location)
            }
            Strategy::ProvisioningState => {
                if !status::is_valid_poll_code(response.status) {
                    return Err(error_from_response(&response));
                }
                if response.status.as_u16() == 204 {
                    (OperationStatus::Succeeded, None)
                } else if response.body.is_empty() {
                    return Err(Error::MalformedResponse(
                        "non-204 poll response has no body".to_string(),
                    ));
                } else {
                    // a body without provisioning state is terminal success
                    let state = status::provisioning_state(&response.body)?
                        .unwrap_or(OperationStatus::Succeeded);
                    (state, None)
                }
            }
            Strategy::Completed => (self.status, None),
        };

        self.retry_after = status::retry_after(&response.headers);
        if let (Strategy::Location(url), Some(new_location)) = (&mut self.strategy, new_location) {
            *url = new_location;
        }
        self.status = next;
        self.last = response;

        tracing::debug!("poll: status {}", self.status);
        Ok(self.status)
    }

    /// Poll until the operation reaches a terminal state, then resolve the
    /// final resource.
    ///
    /// Between polls the poller waits for the server-requested
    /// `Retry-After`, or the configured frequency. The wait races the
    /// cancellation token in `options`: if it fires, [`Error::Canceled`] is
    /// returned immediately and no further network I/O happens.
    pub async fn poll_until_done(&mut self, options: PollUntilDoneOptions) -> Result<T> {
        let frequency = options.frequency.unwrap_or(DEFAULT_POLL_FREQUENCY);

        // Honor a Retry-After from the most recent response (including the
        // triggering one) before the first poll.
        let mut wait = self.retry_after;
        loop {
            if self.done() {
                return self.final_response().await;
            }
            if let Some(delay) = wait {
                wait_or_cancel(delay, options.cancel.as_ref()).await?;
            }
            self.poll().await?;
            wait = Some(self.retry_after.unwrap_or(frequency));
        }
    }

    /// Resolve the final result of a terminal operation.
    ///
    /// Fails with [`Error::NotDone`] before the operation is terminal, and
    /// with [`Error::OperationFailed`] when the server reported Failed or
    /// Canceled. On success the resource is taken from the last poll
    /// response when the strategy embeds it there, or fetched with a single
    /// final GET; the result is cached, so repeated calls do no further I/O.
    pub async fn final_response(&mut self) -> Result<T> {
        if !self.done() {
            return Err(Error::NotDone);
        }
        if self.status.is_failed() {
            let (code, message) = status::error_detail(&self.last.body);
            return Err(Error::OperationFailed {
                status: self.status,
                code,
                message,
            });
        }

        if self.resolved.is_none() {
            let response = self.resolve_success().await?;
            self.resolved = Some(response);
        }
        match &self.resolved {
            Some(response) => response.json(),
            None => Err(Error::NotDone),
        }
    }

    async fn resolve_success(&self) -> Result<Response> {
        // a DELETE has no final resource; whatever the last poll carried is
        // a status document, not a body for `T`
        if self.method == Method::DELETE {
            return Ok(Response {
                status: self.last.status,
                headers: self.last.headers.clone(),
                body: Bytes::new(),
            });
        }

        match &self.strategy {
            // these flows end with the resource already in the last response
            Strategy::Completed | Strategy::ProvisioningState | Strategy::Location(_) => {
                Ok(self.last.clone())
            }
            Strategy::AsyncOperation(_) => {
                if self.method == Method::PUT || self.method == Method::PATCH {
                    // the final GET is on the original resource URL
                    self.fetch_final(self.origin_url.clone()).await
                } else if let Some(url) = &self.location {
                    self.fetch_final(url.clone()).await
                } else {
                    Ok(self.last.clone())
                }
            }
        }
    }

    async fn fetch_final(&self, url: Url) -> Result<Response> {
        let response = self.pipeline.get(url).await?;
        if !response.status.is_success() {
            return Err(error_from_response(&response));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::auth::StaticTokenCredential;
    use reqwest::header::HeaderValue;
    use reqwest::StatusCode;
    use std::sync::Arc;

    fn pipeline() -> Pipeline {
        Pipeline::new(Arc::new(StaticTokenCredential::new("token"))).unwrap()
    }

    fn origin() -> Url {
        Url::parse("https://management.azure.com/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/v").unwrap()
    }

    fn response(status: u16, headers: &[(&'static str, &str)], body: &str) -> Response {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        Response {
            status: StatusCode::from_u16(status).unwrap(),
            headers: map,
            body: Bytes::from(body.to_string().into_bytes()),
        }
    }

    #[test]
    fn test_async_operation_strategy_selected() {
        let initial = response(
            201,
            &[(
                "azure-asyncoperation",
                "https://management.azure.com/operations/1",
            )],
            "{}",
        );
        let poller: Poller<serde_json::Value> =
            Poller::from_initial_response(pipeline(), Method::PUT, origin(), initial).unwrap();
        assert!(!poller.done());
        assert_eq!(poller.status(), OperationStatus::Running);
        assert!(matches!(poller.strategy, Strategy::AsyncOperation(_)));
    }

    #[test]
    fn test_put_without_headers_polls_the_body() {
        let initial = response(201, &[], r#"{"properties":{"provisioningState":"Updating"}}"#);
        let poller: Poller<serde_json::Value> =
            Poller::from_initial_response(pipeline(), Method::PUT, origin(), initial).unwrap();
        assert!(matches!(poller.strategy, Strategy::ProvisioningState));
        assert_eq!(poller.status(), OperationStatus::Running);
    }

    #[test]
    fn test_put_200_with_terminal_state_is_done() {
        let initial = response(
            200,
            &[],
            r#"{"properties":{"provisioningState":"Succeeded"}}"#,
        );
        let poller: Poller<serde_json::Value> =
            Poller::from_initial_response(pipeline(), Method::PUT, origin(), initial).unwrap();
        assert!(poller.done());
    }

    #[test]
    fn test_delete_202_without_headers_is_malformed() {
        let initial = response(202, &[], "");
        let err = Poller::<serde_json::Value>::from_initial_response(
            pipeline(),
            Method::DELETE,
            origin(),
            initial,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_unparseable_polling_url_is_malformed() {
        let initial = response(202, &[("location", "not a url")], "");
        let err = Poller::<serde_json::Value>::from_initial_response(
            pipeline(),
            Method::DELETE,
            origin(),
            initial,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_initial_retry_after_is_recorded() {
        let initial = response(
            202,
            &[
                ("location", "https://management.azure.com/operations/2"),
                ("retry-after", "5"),
            ],
            "",
        );
        let poller: Poller<serde_json::Value> =
            Poller::from_initial_response(pipeline(), Method::DELETE, origin(), initial).unwrap();
        assert_eq!(poller.retry_after, Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_synchronous_completion_needs_no_polling() {
        let initial = response(200, &[], r#"{"name":"probe","ready":true}"#);
        let mut poller: Poller<serde_json::Value> =
            Poller::from_initial_response(pipeline(), Method::POST, origin(), initial).unwrap();
        assert!(poller.done());
        // no network is reachable from here; poll must be a no-op
        assert_eq!(poller.poll().await.unwrap(), OperationStatus::Succeeded);
        let value = poller.final_response().await.unwrap();
        assert_eq!(value["name"], "probe");
    }

    #[tokio::test]
    async fn test_final_response_before_terminal_is_not_done() {
        let initial = response(201, &[], r#"{"properties":{"provisioningState":"Updating"}}"#);
        let mut poller: Poller<serde_json::Value> =
            Poller::from_initial_response(pipeline(), Method::PUT, origin(), initial).unwrap();
        let err = poller.final_response().await.unwrap_err();
        assert!(matches!(err, Error::NotDone));
    }
}
