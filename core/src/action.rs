//! Lifecycle actions and their dispatched JSON form.
//!
//! A single network-call invocation emits up to three of the four lifecycle
//! actions defined here. Each action is constructed once, converted into the
//! JSON object an event-consuming store expects, and handed to the consumer;
//! the controller retains no reference after dispatch.
//!
//! The JSON field names (`type`, `body`, `error`, `headers`, `statusCode`)
//! are part of the external contract and must not be renamed.

use crate::names::ActionNames;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashMap;

/// Flattened response headers: header name to value.
///
/// When the transport reports the same header name more than once, the last
/// entry wins.
pub type Headers = HashMap<String, String>;

/// The body carried by a settled exchange.
///
/// Structured decoding is attempted first; when it fails, the raw text is
/// carried instead. Serializes transparently as the inner value, so a JSON
/// body dispatches as its decoded structure and a text body as a plain
/// string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Body {
    /// Structured decoding succeeded.
    Json(Value),

    /// Structured decoding failed; the raw response text is used as-is.
    Text(String),
}

impl Body {
    /// Convert into the JSON value dispatched to the consumer.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }
}

/// One lifecycle action, tagged by stage.
///
/// Every variant carries its event-type string, derived from the run's base
/// identifier via [`ActionNames`]. The `Resolve`/`Reject` variants carry the
/// interpreted exchange outcome; a `Reject` born from a transport-level
/// failure has no response metadata, so its headers and status are absent
/// (and dispatch as explicit JSON `null`).
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleAction {
    /// The gate passed and the call is about to be issued.
    Request {
        /// `{id}_REQUEST`
        action_type: String,
    },

    /// The call settled with a non-error status.
    Resolve {
        /// `{id}_RESOLVE`
        action_type: String,
        /// Decoded body, or the raw-text fallback.
        body: Body,
        /// Flattened response headers.
        headers: Headers,
        /// Numeric response status.
        status_code: u16,
    },

    /// The call failed: transport-level, or an error-range status.
    Reject {
        /// `{id}_REJECT`
        action_type: String,
        /// Failure message, or the decoded error body.
        error: Body,
        /// Flattened response headers; absent for transport failures.
        headers: Option<Headers>,
        /// Numeric response status; absent for transport failures.
        status_code: Option<u16>,
    },

    /// The external cancellation signal fired.
    Abort {
        /// `{id}_ABORT`
        action_type: String,
    },
}

impl LifecycleAction {
    /// Build the request-started action for a run.
    #[must_use]
    pub fn request(names: &ActionNames) -> Self {
        Self::Request {
            action_type: names.request.clone(),
        }
    }

    /// Build the success action for a settled exchange.
    #[must_use]
    pub fn resolve(names: &ActionNames, body: Body, headers: Headers, status_code: u16) -> Self {
        Self::Resolve {
            action_type: names.resolve.clone(),
            body,
            headers,
            status_code,
        }
    }

    /// Build the failure action.
    ///
    /// Server-classified failures carry both headers and status; transport
    /// failures carry neither.
    #[must_use]
    pub fn reject(
        names: &ActionNames,
        error: Body,
        headers: Option<Headers>,
        status_code: Option<u16>,
    ) -> Self {
        Self::Reject {
            action_type: names.reject.clone(),
            error,
            headers,
            status_code,
        }
    }

    /// Build the cancellation action.
    #[must_use]
    pub fn abort(names: &ActionNames) -> Self {
        Self::Abort {
            action_type: names.abort.clone(),
        }
    }

    /// The event-type string this action dispatches under.
    #[must_use]
    pub fn action_type(&self) -> &str {
        match self {
            Self::Request { action_type }
            | Self::Resolve { action_type, .. }
            | Self::Reject { action_type, .. }
            | Self::Abort { action_type } => action_type,
        }
    }

    /// Convert into the JSON object handed to the consumer.
    ///
    /// `Request` and `Abort` dispatch as `{"type": ...}` alone; `Resolve`
    /// and `Reject` add their outcome fields, with absent headers/status on
    /// a transport-failure `Reject` serialized as explicit `null`.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Request { action_type } | Self::Abort { action_type } => {
                json!({ "type": action_type })
            },
            Self::Resolve {
                action_type,
                body,
                headers,
                status_code,
            } => json!({
                "type": action_type,
                "body": body,
                "headers": headers,
                "statusCode": status_code,
            }),
            Self::Reject {
                action_type,
                error,
                headers,
                status_code,
            } => json!({
                "type": action_type,
                "error": error,
                "headers": headers,
                "statusCode": status_code,
            }),
        }
    }
}
