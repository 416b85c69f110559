//! # Fetch Lifecycle Runtime
//!
//! The imperative shell around `fetch-lifecycle-core`: the controller that
//! turns one outbound network request into a deterministic sequence of
//! lifecycle events handed to an external consumer.
//!
//! ## Core Components
//!
//! - **[`LifecycleController`]**: evaluates the gate, dispatches the
//!   Request event, issues the call, races it against cancellation,
//!   classifies the outcome, and dispatches the shaped terminal event
//! - **[`Transport`]** / **[`HttpTransport`]**: the injected seam to the
//!   network, production-backed by `reqwest`
//! - **[`interpret()`]**: response interpretation — structured body decode
//!   with raw-text fallback, header flattening, status extraction
//!
//! ## Example
//!
//! ```ignore
//! use fetch_lifecycle_runtime::{FetchRequest, LifecycleController};
//! use std::sync::Arc;
//!
//! let controller = LifecycleController::new(
//!     Arc::new(|event| println!("{event}")),
//!     Arc::new(|| ()),
//! );
//!
//! let outcome = controller
//!     .run(FetchRequest::new("FETCH_USER", "https://api.example.com/user/7"))
//!     .await?;
//! ```

/// The lifecycle controller: gate, dispatch, race, classify.
pub mod controller;

/// Response interpretation: body decode with raw-text fallback.
pub mod interpret;

/// The transport seam: issuing the outbound call.
pub mod transport;

/// Error types for the controller boundary
pub mod error {
    use thiserror::Error;

    /// Failure to read the response body text.
    ///
    /// The one failure the controller does not fold into a Reject event:
    /// a response arrived, but its body could not be read, and the
    /// raw-text fallback has no second fallback behind it. It propagates
    /// out of `run` as an `Err`.
    #[derive(Debug, Error)]
    #[error("failed to read response body: {detail}")]
    pub struct BodyError {
        /// Transport-reported reason the body text could not be produced.
        pub detail: String,
    }
}

// Re-export the core vocabulary so embedders depend on one crate
pub use fetch_lifecycle_core::{
    ActionNames, Body, EventSpec, EventSpecs, Headers, LifecycleAction, shape,
};

pub use controller::{
    Dispatch, FetchRequest, GateFn, Init, LifecycleController, RunOutcome, StateAccessor,
};
pub use error::BodyError;
pub use interpret::{InterpretedResponse, interpret};
pub use transport::{
    FetchResponse, HttpTransport, Method, RequestOptions, Transport, TransportError,
};
