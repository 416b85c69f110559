//! Response interpretation: body decode with raw-text fallback.

use crate::error::BodyError;
use crate::transport::FetchResponse;
use fetch_lifecycle_core::{Body, Headers};
use serde_json::Value;

/// The (body, headers, status) triple extracted from a completed response.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretedResponse {
    /// Decoded body, or the raw-text fallback.
    pub body: Body,

    /// Flattened response headers.
    pub headers: Headers,

    /// Numeric response status.
    pub status_code: u16,
}

/// Extract body, headers, and status from a completed response.
///
/// Structured decoding is attempted first; a body that is not valid JSON
/// silently falls back to the raw text. Header entries flatten into a plain
/// mapping, later entries overwriting earlier ones on name collision.
///
/// # Errors
///
/// Returns [`BodyError`] when the body text itself cannot be read. The
/// controller deliberately does not guard this: it is the one failure that
/// propagates to the caller instead of settling into a Reject event.
pub async fn interpret<R: FetchResponse>(response: R) -> Result<InterpretedResponse, BodyError> {
    let status_code = response.status_code();
    let headers: Headers = response.header_entries().into_iter().collect();

    let text = response.into_body_text().await?;
    let body = match serde_json::from_str::<Value>(&text) {
        Ok(decoded) => Body::Json(decoded),
        Err(_) => Body::Text(text),
    };

    Ok(InterpretedResponse {
        body,
        headers,
        status_code,
    })
}
