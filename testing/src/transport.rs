//! Scripted transport doubles.
//!
//! `MockTransport` stands in for the production HTTP transport so lifecycle
//! tests can script every outcome the controller classifies: a completed
//! response (any status, headers, JSON or text body), a transport-level
//! failure, a body whose read fails, and a call that hangs until the
//! cancellation signal interrupts it.

use fetch_lifecycle_runtime::{
    BodyError, FetchResponse, RequestOptions, Transport, TransportError,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A scripted response returned by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Result<String, String>,
    delay: Option<Duration>,
}

impl MockResponse {
    /// A response whose body is the JSON rendering of `body`.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Ok(body.to_string()),
            delay: None,
        }
    }

    /// A response with a plain-text body.
    #[must_use]
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Ok(body.to_string()),
            delay: None,
        }
    }

    /// A response whose body read fails with this detail.
    #[must_use]
    pub fn failing_body(status: u16, detail: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Err(detail.to_string()),
            delay: None,
        }
    }

    /// Append a response header entry.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Delay completion; a cancellation signal fired during the delay
    /// interrupts the call with a transport abort, like a real client.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// What the mock does when the controller issues the call.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Complete with the scripted response.
    Respond(MockResponse),

    /// Fail at the transport level with this detail.
    FailTransport(String),

    /// Never complete on its own; settle only through the bound
    /// cancellation signal.
    Hang,
}

/// Transport double driven by a scripted [`MockBehavior`].
///
/// Counts calls so tests can assert the gate really suppressed the network
/// call. Clones share the call counter.
#[derive(Debug, Clone)]
pub struct MockTransport {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
    options_seen: Arc<Mutex<Vec<RequestOptions>>>,
}

impl MockTransport {
    /// A transport that completes with the scripted response.
    #[must_use]
    pub fn respond(response: MockResponse) -> Self {
        Self::with_behavior(MockBehavior::Respond(response))
    }

    /// A transport that fails every call with this detail.
    #[must_use]
    pub fn failing(detail: &str) -> Self {
        Self::with_behavior(MockBehavior::FailTransport(detail.to_string()))
    }

    /// A transport that hangs until cancelled.
    #[must_use]
    pub fn hanging() -> Self {
        Self::with_behavior(MockBehavior::Hang)
    }

    /// A transport driven by any scripted behavior.
    #[must_use]
    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            options_seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of calls issued through this transport.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The request options each call was issued with, in call order.
    #[must_use]
    pub fn options_seen(&self) -> Vec<RequestOptions> {
        self.options_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for MockTransport {
    type Response = MockHttpResponse;

    async fn execute(
        &self,
        _url: &str,
        options: RequestOptions,
        cancellation: Option<&CancellationToken>,
    ) -> Result<Self::Response, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.options_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(options);

        match &self.behavior {
            MockBehavior::Respond(response) => {
                if let Some(delay) = response.delay {
                    match cancellation {
                        Some(token) => tokio::select! {
                            () = token.cancelled() => return Err(TransportError::Aborted),
                            () = tokio::time::sleep(delay) => {},
                        },
                        None => tokio::time::sleep(delay).await,
                    }
                }
                Ok(MockHttpResponse {
                    status: response.status,
                    headers: response.headers.clone(),
                    body: response.body.clone(),
                })
            },
            MockBehavior::FailTransport(detail) => Err(TransportError::Failed(detail.clone())),
            MockBehavior::Hang => match cancellation {
                Some(token) => {
                    token.cancelled().await;
                    Err(TransportError::Aborted)
                },
                None => std::future::pending().await,
            },
        }
    }
}

/// Response double handed to the interpreter.
#[derive(Debug)]
pub struct MockHttpResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Result<String, String>,
}

impl FetchResponse for MockHttpResponse {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn header_entries(&self) -> Vec<(String, String)> {
        self.headers.clone()
    }

    async fn into_body_text(self) -> Result<String, BodyError> {
        self.body.map_err(|detail| BodyError { detail })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_issued_calls() {
        tokio_test::block_on(async {
            let transport = MockTransport::failing("boom");
            assert_eq!(transport.calls(), 0);

            let first = transport
                .execute("http://unused", RequestOptions::default(), None)
                .await;
            let second = transport
                .execute("http://unused", RequestOptions::default(), None)
                .await;

            assert!(first.is_err());
            assert!(second.is_err());
            assert_eq!(transport.calls(), 2);
        });
    }

    #[test]
    fn hanging_transport_settles_on_cancellation() {
        tokio_test::block_on(async {
            let token = CancellationToken::new();
            token.cancel();

            let transport = MockTransport::hanging();
            let result = transport
                .execute("http://unused", RequestOptions::default(), Some(&token))
                .await;

            assert!(matches!(result, Err(TransportError::Aborted)));
        });
    }

    #[test]
    fn delayed_response_is_interrupted_by_cancellation() {
        tokio_test::block_on(async {
            let token = CancellationToken::new();
            token.cancel();

            let response = MockResponse::text(200, "late").with_delay(Duration::from_secs(30));
            let transport = MockTransport::respond(response);
            let result = transport
                .execute("http://unused", RequestOptions::default(), Some(&token))
                .await;

            assert!(matches!(result, Err(TransportError::Aborted)));
        });
    }
}
