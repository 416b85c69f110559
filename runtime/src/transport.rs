//! The transport seam: issuing the outbound call.
//!
//! The controller never talks to the network directly. It goes through the
//! [`Transport`] trait, with the production [`HttpTransport`] backed by
//! `reqwest` and test doubles supplied by the testing crate. Cancellation is
//! wired in here: when a token is bound to the call, the in-flight send is
//! raced against it so the transport itself can be interrupted.

use crate::error::BodyError;
use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use reqwest::Method;

/// Errors from the transport level: the call itself failed to complete.
///
/// These never escape the controller; they are folded into a Reject event
/// with no response metadata.
#[derive(Debug, Error)]
pub enum TransportError {
    /// DNS, connection, TLS, or protocol failure reported by the client.
    #[error("{0}")]
    Failed(String),

    /// The cancellation signal interrupted the call in flight.
    #[error("request aborted")]
    Aborted,
}

/// Options for an outbound request.
///
/// Mirrors the small slice of call configuration a lifecycle run needs:
/// method, headers, and an optional body. Anything not set falls back to a
/// plain GET with no headers.
///
/// # Example
///
/// ```
/// use fetch_lifecycle_runtime::transport::{Method, RequestOptions};
///
/// let options = RequestOptions::new()
///     .with_method(Method::POST)
///     .with_header("content-type", "application/json")
///     .with_body(r#"{"name":"example"}"#);
/// assert_eq!(options.method, Method::POST);
/// ```
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method; GET when unspecified.
    pub method: Method,

    /// Header name/value pairs applied to the request in order.
    pub headers: Vec<(String, String)>,

    /// Optional request body.
    pub body: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    /// Create options for a plain GET request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Append a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A completed exchange as seen by the response interpreter.
///
/// The interpreter only needs three capabilities from a response: the
/// numeric status, the raw header entries, and a consuming read of the body
/// text. Keeping this a trait lets tests interpret scripted responses the
/// same way production interprets `reqwest` ones.
pub trait FetchResponse: Send {
    /// Numeric response status.
    fn status_code(&self) -> u16;

    /// Response headers as raw name/value entries, in wire order.
    fn header_entries(&self) -> Vec<(String, String)>;

    /// Consume the response and read its body as text.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError`] when the body cannot be read to completion.
    fn into_body_text(self) -> impl Future<Output = Result<String, BodyError>> + Send;
}

/// Issues outbound calls on behalf of the controller.
///
/// This is the dependency-injection seam: the controller is generic over
/// its transport, so production wires in [`HttpTransport`] while tests
/// inject scripted doubles.
pub trait Transport: Send + Sync {
    /// Response type produced on transport-level success.
    type Response: FetchResponse;

    /// Issue the call, racing it against the cancellation signal when one
    /// is bound to the invocation.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Failed`] when the call cannot complete and
    /// [`TransportError::Aborted`] when the cancellation signal fires while
    /// the call is in flight.
    fn execute(
        &self,
        url: &str,
        options: RequestOptions,
        cancellation: Option<&CancellationToken>,
    ) -> impl Future<Output = Result<Self::Response, TransportError>> + Send;
}

/// Production transport backed by `reqwest`.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a fresh `reqwest` client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a transport over an existing client (custom TLS, proxies,
    /// default headers).
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    type Response = reqwest::Response;

    async fn execute(
        &self,
        url: &str,
        options: RequestOptions,
        cancellation: Option<&CancellationToken>,
    ) -> Result<Self::Response, TransportError> {
        let mut request = self.client.request(options.method, url);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let send = request.send();
        let outcome = match cancellation {
            Some(token) => tokio::select! {
                () = token.cancelled() => return Err(TransportError::Aborted),
                outcome = send => outcome,
            },
            None => send.await,
        };

        outcome.map_err(|err| TransportError::Failed(err.to_string()))
    }
}

impl FetchResponse for reqwest::Response {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    fn header_entries(&self) -> Vec<(String, String)> {
        self.headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }

    async fn into_body_text(self) -> Result<String, BodyError> {
        self.text().await.map_err(|err| BodyError {
            detail: err.to_string(),
        })
    }
}
