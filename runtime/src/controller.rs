//! The lifecycle controller.
//!
//! One [`LifecycleController::run`] invocation turns a single outbound call
//! into a deterministic sequence of lifecycle events: evaluate the gate,
//! dispatch the Request event, issue the call with cancellation wired in,
//! classify the outcome, and dispatch the shaped terminal event.
//!
//! ## Event ordering
//!
//! The Request event is dispatched before the first await point, so it is
//! always the first observable event of a gated-in run. The terminal
//! Resolve/Reject event is dispatched only after both the call and response
//! interpretation complete. The Abort event is orthogonal: it is sourced
//! from the cancellation signal and its ordering relative to the terminal
//! event is deliberately unspecified — a cancellation that fails the
//! transport produces both an Abort and a Reject for the same invocation,
//! in whichever order the race settles. That dual dispatch is part of the
//! contract, not a bug to suppress.

use crate::error::BodyError;
use crate::interpret::interpret;
use crate::transport::{HttpTransport, RequestOptions, Transport};
use fetch_lifecycle_core::{ActionNames, Body, EventSpecs, LifecycleAction, shape};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Consumer callback receiving every dispatched lifecycle event.
///
/// Invoked zero or more times per run; its return value is ignored. The
/// event is owned by the consumer once handed over.
pub type Dispatch = Arc<dyn Fn(Value) + Send + Sync>;

/// Zero-argument read of the embedding runtime's state snapshot.
///
/// The controller treats the snapshot as read-only; it is consulted by the
/// gate and by state-derived request options.
pub type StateAccessor<S> = Arc<dyn Fn() -> S + Send + Sync>;

/// Predicate that can suppress an entire invocation before any side effect.
pub type GateFn<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

/// Fallback error message for a transport failure that carries no detail.
const GENERIC_TRANSPORT_FAILURE: &str = "network request failed";

/// Error-range status boundary: `[400, 600)` classifies as Reject.
const ERROR_STATUS_RANGE: std::ops::Range<u16> = 400..600;

/// How the effective request options for a run are obtained.
pub enum Init<S> {
    /// Use these options as-is.
    Options(RequestOptions),

    /// Compute options at call time, without state.
    Lazy(Arc<dyn Fn() -> RequestOptions + Send + Sync>),

    /// Compute options at call time from the current state snapshot.
    FromState(Arc<dyn Fn(&S) -> RequestOptions + Send + Sync>),
}

impl<S> Clone for Init<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Options(options) => Self::Options(options.clone()),
            Self::Lazy(make) => Self::Lazy(Arc::clone(make)),
            Self::FromState(make) => Self::FromState(Arc::clone(make)),
        }
    }
}

// Manual Debug implementation since the option-producing closures don't implement Debug
impl<S> fmt::Debug for Init<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Options(options) => f.debug_tuple("Init::Options").field(options).finish(),
            Self::Lazy(_) => write!(f, "Init::Lazy(<fn>)"),
            Self::FromState(_) => write!(f, "Init::FromState(<fn>)"),
        }
    }
}

/// Description of one lifecycle run.
///
/// Built with the `with_*` methods; everything beyond the identifier and
/// URL is optional.
///
/// # Example
///
/// ```ignore
/// let request = FetchRequest::new("FETCH_USER", "https://api.example.com/user/7")
///     .with_specs(EventSpecs::new().with_on_request(EventSpec::merge(overlay)))
///     .with_cancellation(token.clone())
///     .with_gate(|state: &AppState| !state.loading);
///
/// let outcome = controller.run(request).await?;
/// ```
pub struct FetchRequest<S> {
    id: String,
    url: String,
    init: Option<Init<S>>,
    specs: EventSpecs,
    cancellation: Option<CancellationToken>,
    gate: Option<GateFn<S>>,
}

impl<S> FetchRequest<S> {
    /// Describe a run with its base identifier and target URL.
    ///
    /// The identifier determines the four event-type strings via
    /// [`ActionNames`].
    #[must_use]
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            init: None,
            specs: EventSpecs::default(),
            cancellation: None,
            gate: None,
        }
    }

    /// Use literal request options.
    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.init = Some(Init::Options(options));
        self
    }

    /// Use an explicit [`Init`] variant.
    #[must_use]
    pub fn with_init(mut self, init: Init<S>) -> Self {
        self.init = Some(init);
        self
    }

    /// Compute request options at call time, without state.
    #[must_use]
    pub fn with_lazy_init<F>(mut self, make: F) -> Self
    where
        F: Fn() -> RequestOptions + Send + Sync + 'static,
    {
        self.init = Some(Init::Lazy(Arc::new(make)));
        self
    }

    /// Compute request options at call time from the state snapshot.
    #[must_use]
    pub fn with_state_init<F>(mut self, make: F) -> Self
    where
        F: Fn(&S) -> RequestOptions + Send + Sync + 'static,
    {
        self.init = Some(Init::FromState(Arc::new(make)));
        self
    }

    /// Attach per-stage event customization.
    #[must_use]
    pub fn with_specs(mut self, specs: EventSpecs) -> Self {
        self.specs = specs;
        self
    }

    /// Bind an externally owned cancellation token to the run.
    ///
    /// Ownership stays with the caller; the controller only listens for the
    /// signal and forwards it to the transport.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Gate the run on a predicate over the state snapshot.
    ///
    /// A `false` verdict suppresses the invocation entirely: no events, no
    /// network call.
    #[must_use]
    pub fn with_gate<F>(mut self, gate: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.gate = Some(Arc::new(gate));
        self
    }

    /// The run's base identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The run's target URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Result of a lifecycle run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The gate suppressed the invocation; nothing was dispatched and no
    /// call was made.
    Skipped,

    /// The run settled; carries the shaped terminal Resolve or Reject
    /// event, exactly as it was dispatched. An Abort event is never the
    /// settled value — it is only ever a side dispatch.
    Settled(Value),
}

impl RunOutcome {
    /// Whether the gate suppressed the run.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// The terminal event, if the run settled.
    #[must_use]
    pub const fn as_event(&self) -> Option<&Value> {
        match self {
            Self::Skipped => None,
            Self::Settled(event) => Some(event),
        }
    }

    /// Consume the outcome, yielding the terminal event if the run settled.
    #[must_use]
    pub fn into_event(self) -> Option<Value> {
        match self {
            Self::Skipped => None,
            Self::Settled(event) => Some(event),
        }
    }
}

/// Orchestrates lifecycle runs against an injected transport, consumer
/// callback, and state accessor.
///
/// Each [`run`](Self::run) invocation is fully independent: no locks, no
/// request deduplication, no in-flight coalescing. Concurrent runs with
/// identical parameters perform redundant, uncoordinated calls.
///
/// # Example
///
/// ```ignore
/// let controller = LifecycleController::new(
///     Arc::new(move |event| store.dispatch(event)),
///     Arc::new(move || store.state()),
/// );
///
/// let outcome = controller
///     .run(FetchRequest::new("FETCH_USER", url))
///     .await?;
/// ```
pub struct LifecycleController<S, T = HttpTransport> {
    transport: T,
    dispatch: Dispatch,
    get_state: StateAccessor<S>,
}

impl<S> LifecycleController<S, HttpTransport> {
    /// Create a controller over the production HTTP transport.
    #[must_use]
    pub fn new(dispatch: Dispatch, get_state: StateAccessor<S>) -> Self {
        Self::with_transport(HttpTransport::new(), dispatch, get_state)
    }
}

impl<S, T> LifecycleController<S, T>
where
    T: Transport,
{
    /// Create a controller over a custom transport (tests, alternative
    /// clients).
    #[must_use]
    pub const fn with_transport(transport: T, dispatch: Dispatch, get_state: StateAccessor<S>) -> Self {
        Self {
            transport,
            dispatch,
            get_state,
        }
    }

    /// Run one request lifecycle to its settled outcome.
    ///
    /// 1. Evaluate the gate; a `false` verdict returns
    ///    [`RunOutcome::Skipped`] with zero events dispatched.
    /// 2. Dispatch the shaped Request event.
    /// 3. Arm the abort listener (when a token is bound) before issuing the
    ///    call; a fired signal dispatches a shaped Abort event independent
    ///    of the primary path.
    /// 4. Resolve the effective options and issue the call with the token
    ///    attached.
    /// 5. Classify: transport failure or error-range status dispatches a
    ///    shaped Reject; anything else a shaped Resolve.
    ///
    /// The returned [`RunOutcome::Settled`] value is exactly the dispatched
    /// terminal event.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError`] when reading the response body text fails.
    /// Every other failure settles into a Reject event rather than an
    /// `Err`.
    #[tracing::instrument(skip_all, fields(id = %request.id), name = "lifecycle_run")]
    pub async fn run(&self, request: FetchRequest<S>) -> Result<RunOutcome, BodyError> {
        let FetchRequest {
            id,
            url,
            init,
            specs,
            cancellation,
            gate,
        } = request;
        let names = ActionNames::new(&id);

        if let Some(gate) = gate {
            let state = (self.get_state)();
            if !gate(&state) {
                tracing::debug!("gate suppressed invocation");
                metrics::counter!("lifecycle.suppressed").increment(1);
                return Ok(RunOutcome::Skipped);
            }
        }

        // Dispatched before the first await point: always the first event.
        (self.dispatch)(shape(
            LifecycleAction::request(&names),
            specs.on_request.as_ref(),
        ));
        metrics::counter!("lifecycle.request").increment(1);

        // Armed before the call is issued; stays armed until the run
        // settles. The guard's drop releases the listener, and `biased`
        // keeps a fired signal ahead of the release when both are ready.
        let _abort_guard = cancellation.clone().map(|token| {
            let dispatch = Arc::clone(&self.dispatch);
            let on_abort = specs.on_abort.clone();
            let abort_names = names.clone();
            let (guard, settled) = oneshot::channel::<()>();
            tokio::spawn(async move {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        dispatch(shape(LifecycleAction::abort(&abort_names), on_abort.as_ref()));
                        metrics::counter!("lifecycle.abort").increment(1);
                    }
                    _ = settled => {}
                }
            });
            guard
        });

        let options = match init {
            None => RequestOptions::default(),
            Some(Init::Options(options)) => options,
            Some(Init::Lazy(make)) => make(),
            Some(Init::FromState(make)) => make(&(self.get_state)()),
        };

        let settled = self
            .transport
            .execute(&url, options, cancellation.as_ref())
            .await;

        let (action, spec) = match settled {
            Err(failure) => {
                tracing::debug!(error = %failure, "transport failure");
                let mut message = failure.to_string();
                if message.is_empty() {
                    message = GENERIC_TRANSPORT_FAILURE.to_string();
                }
                (
                    LifecycleAction::reject(&names, Body::Text(message), None, None),
                    specs.on_reject.as_ref(),
                )
            },
            Ok(response) => {
                let interpreted = interpret(response).await?;
                if ERROR_STATUS_RANGE.contains(&interpreted.status_code) {
                    (
                        LifecycleAction::reject(
                            &names,
                            interpreted.body,
                            Some(interpreted.headers),
                            Some(interpreted.status_code),
                        ),
                        specs.on_reject.as_ref(),
                    )
                } else {
                    (
                        LifecycleAction::resolve(
                            &names,
                            interpreted.body,
                            interpreted.headers,
                            interpreted.status_code,
                        ),
                        specs.on_resolve.as_ref(),
                    )
                }
            },
        };

        let is_reject = matches!(action, LifecycleAction::Reject { .. });
        let event = shape(action, spec);
        (self.dispatch)(event.clone());
        if is_reject {
            metrics::counter!("lifecycle.reject").increment(1);
        } else {
            metrics::counter!("lifecycle.resolve").increment(1);
        }

        Ok(RunOutcome::Settled(event))
    }
}
