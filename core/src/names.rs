//! Lifecycle event-type naming.
//!
//! Every lifecycle run derives its four event-type identifiers from a single
//! caller-supplied base identifier. The format is a stable, bit-exact
//! contract: external stores and reducers pattern-match on these strings, so
//! the concatenation rule must never change.
//!
//! # Naming Convention
//!
//! For a base identifier `id`, the derived types are:
//!
//! - `{id}_REQUEST` — the call was gated in and is about to start
//! - `{id}_RESOLVE` — the call settled successfully
//! - `{id}_REJECT` — the call failed (transport or server classified)
//! - `{id}_ABORT` — the external cancellation signal fired
//!
//! # Example
//!
//! ```
//! use fetch_lifecycle_core::names::ActionNames;
//!
//! let names = ActionNames::new("FETCH_USER");
//! assert_eq!(names.request, "FETCH_USER_REQUEST");
//! assert_eq!(names.abort, "FETCH_USER_ABORT");
//! ```

use serde::{Deserialize, Serialize};

/// The four lifecycle event-type identifiers derived from a base identifier.
///
/// Construction is pure and total: any base identifier yields a record, and
/// the same identifier always yields an identical record.
///
/// Serialization uses the uppercase stage names as keys, matching the record
/// shape consumers on the store side expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionNames {
    /// Type string for the request-started event: `{id}_REQUEST`.
    #[serde(rename = "REQUEST")]
    pub request: String,

    /// Type string for the success event: `{id}_RESOLVE`.
    #[serde(rename = "RESOLVE")]
    pub resolve: String,

    /// Type string for the failure event: `{id}_REJECT`.
    #[serde(rename = "REJECT")]
    pub reject: String,

    /// Type string for the cancellation event: `{id}_ABORT`.
    #[serde(rename = "ABORT")]
    pub abort: String,
}

impl ActionNames {
    /// Derive the four event-type identifiers from a base identifier.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            request: format!("{id}_REQUEST"),
            resolve: format!("{id}_RESOLVE"),
            reject: format!("{id}_REJECT"),
            abort: format!("{id}_ABORT"),
        }
    }
}
