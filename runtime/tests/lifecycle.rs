//! Integration tests for the lifecycle controller.
//!
//! Exercises the full gate → REQUEST → in-flight race → terminal event path
//! against scripted transports, covering every classification the
//! controller can settle into.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use fetch_lifecycle_runtime::{
    FetchRequest, LifecycleController, Method, RequestOptions, RunOutcome,
};
use fetch_lifecycle_testing::{MockResponse, MockTransport, RecordingDispatcher};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Clone)]
struct AppState {
    fetching_allowed: bool,
    auth_token: String,
}

impl AppState {
    fn permissive() -> Self {
        Self {
            fetching_allowed: true,
            auth_token: "token-123".to_string(),
        }
    }

    fn blocked() -> Self {
        Self {
            fetching_allowed: false,
            auth_token: String::new(),
        }
    }
}

fn controller(
    transport: MockTransport,
    dispatcher: &RecordingDispatcher,
    state: AppState,
) -> LifecycleController<AppState, MockTransport> {
    LifecycleController::with_transport(
        transport,
        dispatcher.dispatch_fn(),
        Arc::new(move || state.clone()),
    )
}

fn settled_event(outcome: RunOutcome) -> Value {
    outcome.into_event().expect("run should settle")
}

// ============================================================================
// Gate
// ============================================================================

/// A failing gate suppresses the entire invocation: no events, no call.
#[tokio::test]
async fn failing_gate_suppresses_events_and_network_call() {
    let dispatcher = RecordingDispatcher::new();
    let transport = MockTransport::respond(MockResponse::json(200, &json!({})));
    let controller = controller(transport.clone(), &dispatcher, AppState::blocked());

    let outcome = controller
        .run(
            FetchRequest::new("FETCH_USER", "http://unused")
                .with_gate(|state: &AppState| state.fetching_allowed),
        )
        .await
        .unwrap();

    assert!(outcome.is_skipped());
    assert!(dispatcher.is_empty());
    assert_eq!(transport.calls(), 0);
}

/// A passing gate lets the run proceed normally.
#[tokio::test]
async fn passing_gate_runs_the_lifecycle() {
    let dispatcher = RecordingDispatcher::new();
    let transport = MockTransport::respond(MockResponse::json(200, &json!({})));
    let controller = controller(transport.clone(), &dispatcher, AppState::permissive());

    let outcome = tokio_test::assert_ok!(
        controller
            .run(
                FetchRequest::new("FETCH_USER", "http://unused")
                    .with_gate(|state: &AppState| state.fetching_allowed),
            )
            .await
    );

    assert!(!outcome.is_skipped());
    assert_eq!(transport.calls(), 1);
}

// ============================================================================
// Classification
// ============================================================================

/// A 200 with a JSON body dispatches REQUEST then RESOLVE, and the settled
/// value is exactly the dispatched RESOLVE event.
#[tokio::test]
async fn ok_json_response_resolves() {
    let dispatcher = RecordingDispatcher::new();
    let transport = MockTransport::respond(MockResponse::json(
        200,
        &json!({ "user": { "id": 7, "name": "Ada" } }),
    ));
    let controller = controller(transport, &dispatcher, AppState::permissive());

    let outcome = controller
        .run(FetchRequest::new("FETCH_USER", "http://unused"))
        .await
        .unwrap();

    assert_eq!(
        dispatcher.event_types(),
        ["FETCH_USER_REQUEST", "FETCH_USER_RESOLVE"]
    );

    let event = settled_event(outcome);
    assert_eq!(event, dispatcher.events()[1]);
    assert_eq!(event["statusCode"], 200);
    assert_eq!(event["body"]["user"]["name"], "Ada");
    assert_eq!(event["headers"]["content-type"], "application/json");
}

/// A 404 is a server-classified failure: REQUEST then REJECT, carrying the
/// decoded error body and the status.
#[tokio::test]
async fn not_found_rejects_with_status_and_error() {
    let dispatcher = RecordingDispatcher::new();
    let transport =
        MockTransport::respond(MockResponse::json(404, &json!({ "message": "no such user" })));
    let controller = controller(transport, &dispatcher, AppState::permissive());

    let outcome = controller
        .run(FetchRequest::new("FETCH_USER", "http://unused"))
        .await
        .unwrap();

    assert_eq!(
        dispatcher.event_types(),
        ["FETCH_USER_REQUEST", "FETCH_USER_REJECT"]
    );

    let event = settled_event(outcome);
    assert_eq!(event["statusCode"], 404);
    assert_ne!(event["error"], Value::Null);
    assert_eq!(event["error"]["message"], "no such user");
}

/// The error-range boundary is inclusive at 400 and exclusive at 600; 399
/// and 600 both resolve.
#[tokio::test]
async fn status_range_boundaries_classify_correctly() {
    for (status, expected_stage) in [(399, "RESOLVE"), (400, "REJECT"), (599, "REJECT"), (600, "RESOLVE")] {
        let dispatcher = RecordingDispatcher::new();
        let transport = MockTransport::respond(MockResponse::json(status, &json!({})));
        let controller = controller(transport, &dispatcher, AppState::permissive());

        let outcome = controller
            .run(FetchRequest::new("PROBE", "http://unused"))
            .await
            .unwrap();

        let event = settled_event(outcome);
        assert_eq!(
            event["type"],
            format!("PROBE_{expected_stage}"),
            "status {status} should classify as {expected_stage}"
        );
    }
}

/// A body that is not valid JSON falls back to the raw text, not an error.
#[tokio::test]
async fn undecodable_body_falls_back_to_raw_text() {
    let dispatcher = RecordingDispatcher::new();
    let transport = MockTransport::respond(MockResponse::text(200, "<html>hello</html>"));
    let controller = controller(transport, &dispatcher, AppState::permissive());

    let outcome = controller
        .run(FetchRequest::new("FETCH_PAGE", "http://unused"))
        .await
        .unwrap();

    let event = settled_event(outcome);
    assert_eq!(event["type"], "FETCH_PAGE_RESOLVE");
    assert_eq!(event["body"], "<html>hello</html>");
}

// ============================================================================
// Transport failures
// ============================================================================

/// A transport-level failure rejects with the failure message and explicit
/// null response metadata.
#[tokio::test]
async fn transport_failure_rejects_with_null_metadata() {
    let dispatcher = RecordingDispatcher::new();
    let transport = MockTransport::failing("connection reset by peer");
    let controller = controller(transport, &dispatcher, AppState::permissive());

    let outcome = controller
        .run(FetchRequest::new("FETCH_USER", "http://unused"))
        .await
        .unwrap();

    assert_eq!(
        dispatcher.event_types(),
        ["FETCH_USER_REQUEST", "FETCH_USER_REJECT"]
    );

    let event = settled_event(outcome);
    assert_eq!(event["error"], "connection reset by peer");
    assert_eq!(event["headers"], Value::Null);
    assert_eq!(event["statusCode"], Value::Null);
}

/// A failure with no detail of its own falls back to the generic message.
#[tokio::test]
async fn detail_less_transport_failure_uses_generic_message() {
    let dispatcher = RecordingDispatcher::new();
    let transport = MockTransport::failing("");
    let controller = controller(transport, &dispatcher, AppState::permissive());

    let outcome = controller
        .run(FetchRequest::new("FETCH_USER", "http://unused"))
        .await
        .unwrap();

    let event = settled_event(outcome);
    assert_eq!(event["error"], "network request failed");
}

/// A failing body read is the one failure that propagates out of `run`
/// instead of settling into a Reject.
#[tokio::test]
async fn body_read_failure_propagates_as_an_error() {
    let dispatcher = RecordingDispatcher::new();
    let transport = MockTransport::respond(MockResponse::failing_body(200, "stream truncated"));
    let controller = controller(transport, &dispatcher, AppState::permissive());

    let failure = controller
        .run(FetchRequest::new("FETCH_USER", "http://unused"))
        .await
        .unwrap_err();

    assert!(failure.to_string().contains("stream truncated"));
    // The Request event was already out before the body read failed.
    assert_eq!(dispatcher.event_types(), ["FETCH_USER_REQUEST"]);
}

// ============================================================================
// Cancellation
// ============================================================================

/// Cancellation fired mid-flight dispatches an ABORT event after REQUEST;
/// the cancellation-induced transport Reject is tolerated alongside it.
#[tokio::test]
async fn cancellation_dispatches_abort_after_request() {
    fetch_lifecycle_testing::init_test_tracing();

    let dispatcher = RecordingDispatcher::new();
    let transport = MockTransport::hanging();
    let controller = controller(transport, &dispatcher, AppState::permissive());
    let token = CancellationToken::new();

    let request = FetchRequest::new("FETCH_USER", "http://unused")
        .with_cancellation(token.clone());
    let handle = tokio::spawn(async move { controller.run(request).await });

    // Let the run dispatch REQUEST and park in the transport.
    assert!(
        dispatcher
            .wait_for_type("FETCH_USER_REQUEST", Duration::from_secs(1))
            .await
    );
    token.cancel();

    let outcome = handle.await.unwrap().unwrap();

    assert!(
        dispatcher
            .wait_for_type("FETCH_USER_ABORT", Duration::from_secs(1))
            .await
    );
    let abort_index = dispatcher.index_of_type("FETCH_USER_ABORT").unwrap();
    assert!(abort_index >= 2, "ABORT must come after REQUEST");

    // The settled value is the transport-failure Reject, never the Abort.
    let event = settled_event(outcome);
    assert_eq!(event["type"], "FETCH_USER_REJECT");
    assert_eq!(event["error"], "request aborted");
    assert_eq!(event["statusCode"], Value::Null);
}

/// A run without a cancellation binding never dispatches ABORT.
#[tokio::test]
async fn uncancelled_run_never_aborts() {
    let dispatcher = RecordingDispatcher::new();
    let transport = MockTransport::respond(MockResponse::json(200, &json!({})));
    let controller = controller(transport, &dispatcher, AppState::permissive());

    controller
        .run(FetchRequest::new("FETCH_USER", "http://unused"))
        .await
        .unwrap();

    assert!(dispatcher.index_of_type("FETCH_USER_ABORT").is_none());
}

/// Cancellation during a delayed response interrupts the transport; both
/// the ABORT side dispatch and the Reject settle for the same invocation.
#[tokio::test]
async fn cancellation_race_preserves_dual_dispatch() {
    let dispatcher = RecordingDispatcher::new();
    let response = MockResponse::json(200, &json!({})).with_delay(Duration::from_secs(30));
    let transport = MockTransport::respond(response);
    let controller = controller(transport, &dispatcher, AppState::permissive());
    let token = CancellationToken::new();

    let request = FetchRequest::new("SLOW_SYNC", "http://unused")
        .with_cancellation(token.clone());
    let handle = tokio::spawn(async move { controller.run(request).await });

    assert!(
        dispatcher
            .wait_for_type("SLOW_SYNC_REQUEST", Duration::from_secs(1))
            .await
    );
    token.cancel();

    let outcome = handle.await.unwrap().unwrap();
    assert_eq!(settled_event(outcome)["type"], "SLOW_SYNC_REJECT");
    assert!(
        dispatcher
            .wait_for_type("SLOW_SYNC_ABORT", Duration::from_secs(1))
            .await
    );
}

// ============================================================================
// Init resolution
// ============================================================================

/// Literal options are passed to the transport unchanged.
#[tokio::test]
async fn literal_options_reach_the_transport() {
    let dispatcher = RecordingDispatcher::new();
    let transport = MockTransport::respond(MockResponse::json(200, &json!({})));
    let controller = controller(transport.clone(), &dispatcher, AppState::permissive());

    controller
        .run(
            FetchRequest::new("CREATE_ITEM", "http://unused").with_options(
                RequestOptions::new()
                    .with_method(Method::POST)
                    .with_body(r#"{"name":"widget"}"#),
            ),
        )
        .await
        .unwrap();

    let seen = transport.options_seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, Method::POST);
    assert_eq!(seen[0].body.as_deref(), Some(r#"{"name":"widget"}"#));
}

/// State-derived options read the snapshot at call time.
#[tokio::test]
async fn state_derived_options_read_the_snapshot() {
    let dispatcher = RecordingDispatcher::new();
    let transport = MockTransport::respond(MockResponse::json(200, &json!({})));
    let controller = controller(transport.clone(), &dispatcher, AppState::permissive());

    controller
        .run(
            FetchRequest::new("FETCH_PROFILE", "http://unused").with_state_init(
                |state: &AppState| {
                    RequestOptions::new().with_header("authorization", state.auth_token.clone())
                },
            ),
        )
        .await
        .unwrap();

    let seen = transport.options_seen();
    assert_eq!(
        seen[0].headers,
        [("authorization".to_string(), "token-123".to_string())]
    );
}

/// Lazy options are computed with no arguments at call time.
#[tokio::test]
async fn lazy_options_are_computed_at_call_time() {
    let dispatcher = RecordingDispatcher::new();
    let transport = MockTransport::respond(MockResponse::json(200, &json!({})));
    let controller = controller(transport.clone(), &dispatcher, AppState::permissive());

    controller
        .run(
            FetchRequest::new("DELETE_ITEM", "http://unused")
                .with_lazy_init(|| RequestOptions::new().with_method(Method::DELETE)),
        )
        .await
        .unwrap();

    assert_eq!(transport.options_seen()[0].method, Method::DELETE);
}
