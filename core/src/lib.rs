//! # Fetch Lifecycle Core
//!
//! Core types for converting a single outbound network request into a
//! deterministic sequence of observable lifecycle events.
//!
//! This crate is pure: no I/O, no async. It defines the vocabulary the
//! runtime crate orchestrates with:
//!
//! - **[`ActionNames`]**: the four event-type identifiers derived from a
//!   base identifier (`{id}_REQUEST`, `{id}_RESOLVE`, `{id}_REJECT`,
//!   `{id}_ABORT`)
//! - **[`LifecycleAction`]**: the tagged lifecycle stages and their
//!   dispatched JSON form
//! - **[`EventSpec`]** / **[`EventSpecs`]**: per-stage customization
//!   (structural merge or full transform) applied by [`shape()`] before an
//!   event reaches the consumer
//!
//! ## Example
//!
//! ```
//! use fetch_lifecycle_core::{ActionNames, EventSpec, LifecycleAction, shape};
//! use serde_json::json;
//!
//! let names = ActionNames::new("FETCH_USER");
//! let spec = EventSpec::transform(|_| json!({ "type": "NEW" }));
//!
//! let event = shape(LifecycleAction::request(&names), Some(&spec));
//! assert_eq!(event, json!({ "type": "NEW" }));
//! ```

// Re-export commonly used types
pub use serde::{Deserialize, Serialize};
pub use serde_json::Value;

/// Lifecycle actions and their dispatched JSON form.
pub mod action;

/// Lifecycle event-type naming.
pub mod names;

/// Per-stage event shaping.
pub mod shape;

pub use action::{Body, Headers, LifecycleAction};
pub use names::ActionNames;
pub use shape::{EventSpec, EventSpecs, TransformFn, shape};
