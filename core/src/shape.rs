//! Per-stage event shaping.
//!
//! Before an action is handed to the consumer it may be customized by an
//! [`EventSpec`]: a structural merge overlaid on the base event, or a
//! transform function that replaces it wholesale. The spec is an explicit
//! tagged variant, so the shaper dispatches on the tag rather than
//! inspecting runtime types.

use crate::action::LifecycleAction;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A full-replacement transform over a base event.
///
/// Receives the base event as a JSON object and returns the event to
/// dispatch in its place; the result is used verbatim, including whatever
/// it does to `"type"`.
pub type TransformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Per-stage customization applied to a base event before dispatch.
///
/// Absence of a spec (the `Option` around it) means the base event is
/// dispatched unchanged.
#[derive(Clone)]
pub enum EventSpec {
    /// Overlay these keys on the base event object. Shallow; overlay values
    /// win on collision, including `"type"`.
    Merge(Map<String, Value>),

    /// Replace the base event with the function's result.
    Transform(TransformFn),
}

// Manual Debug implementation since the transform closure doesn't implement Debug
impl fmt::Debug for EventSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge(overlay) => f.debug_tuple("EventSpec::Merge").field(overlay).finish(),
            Self::Transform(_) => write!(f, "EventSpec::Transform(<fn>)"),
        }
    }
}

impl EventSpec {
    /// Build a merge spec from an overlay object.
    #[must_use]
    pub const fn merge(overlay: Map<String, Value>) -> Self {
        Self::Merge(overlay)
    }

    /// Build a transform spec from a replacement function.
    pub fn transform<F>(transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::Transform(Arc::new(transform))
    }
}

/// The four independently optional per-stage specs for one run.
///
/// # Example
///
/// ```
/// use fetch_lifecycle_core::shape::{EventSpec, EventSpecs};
/// use serde_json::json;
///
/// let specs = EventSpecs::new()
///     .with_on_request(EventSpec::transform(|_| json!({ "type": "NEW" })));
/// assert!(specs.on_request.is_some());
/// assert!(specs.on_resolve.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventSpecs {
    /// Applied to the request-started event.
    pub on_request: Option<EventSpec>,

    /// Applied to the success event.
    pub on_resolve: Option<EventSpec>,

    /// Applied to the failure event.
    pub on_reject: Option<EventSpec>,

    /// Applied to the cancellation event.
    pub on_abort: Option<EventSpec>,
}

impl EventSpecs {
    /// Create a record with no customization on any stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the spec for the request-started event.
    #[must_use]
    pub fn with_on_request(mut self, spec: EventSpec) -> Self {
        self.on_request = Some(spec);
        self
    }

    /// Set the spec for the success event.
    #[must_use]
    pub fn with_on_resolve(mut self, spec: EventSpec) -> Self {
        self.on_resolve = Some(spec);
        self
    }

    /// Set the spec for the failure event.
    #[must_use]
    pub fn with_on_reject(mut self, spec: EventSpec) -> Self {
        self.on_reject = Some(spec);
        self
    }

    /// Set the spec for the cancellation event.
    #[must_use]
    pub fn with_on_abort(mut self, spec: EventSpec) -> Self {
        self.on_abort = Some(spec);
        self
    }
}

/// Shape a base action into the event to dispatch.
///
/// - no spec → the base event unchanged
/// - [`EventSpec::Merge`] → the base object with the overlay written over it
/// - [`EventSpec::Transform`] → the function's result, verbatim
#[must_use]
pub fn shape(base: LifecycleAction, spec: Option<&EventSpec>) -> Value {
    let base = base.into_value();
    match spec {
        None => base,
        Some(EventSpec::Merge(overlay)) => match base {
            Value::Object(mut object) => {
                for (key, value) in overlay {
                    object.insert(key.clone(), value.clone());
                }
                Value::Object(object)
            },
            // Base events are always objects; anything else passes through.
            other => other,
        },
        Some(EventSpec::Transform(transform)) => transform(base),
    }
}
