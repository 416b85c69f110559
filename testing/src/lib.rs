//! # Fetch Lifecycle Testing
//!
//! Testing utilities for the fetch lifecycle crates.
//!
//! This crate provides:
//! - [`RecordingDispatcher`] — captures every dispatched event so tests can
//!   assert on contents and ordering
//! - [`MockTransport`] / [`MockResponse`] — scripted transport doubles for
//!   every outcome the controller classifies
//! - [`init_test_tracing`] — opt-in log output while debugging tests
//!
//! ## Example
//!
//! ```ignore
//! use fetch_lifecycle_runtime::{FetchRequest, LifecycleController};
//! use fetch_lifecycle_testing::{MockResponse, MockTransport, RecordingDispatcher};
//!
//! #[tokio::test]
//! async fn resolves_a_200() {
//!     let dispatcher = RecordingDispatcher::new();
//!     let transport = MockTransport::respond(MockResponse::json(200, &json!({ "ok": true })));
//!     let controller = LifecycleController::with_transport(
//!         transport,
//!         dispatcher.dispatch_fn(),
//!         Arc::new(|| ()),
//!     );
//!
//!     controller.run(FetchRequest::new("PING", "http://unused")).await?;
//!     assert_eq!(dispatcher.event_types(), ["PING_REQUEST", "PING_RESOLVE"]);
//! }
//! ```

/// Recording dispatcher for asserting on dispatched events.
pub mod dispatch;

/// Scripted transport doubles.
pub mod transport;

pub use dispatch::RecordingDispatcher;
pub use transport::{MockBehavior, MockHttpResponse, MockResponse, MockTransport};

/// Initialize tracing output for a test run.
///
/// Respects `RUST_LOG`; safe to call from every test, repeat calls are
/// no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
