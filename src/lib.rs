pub mod admin;
pub mod broker;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod record;
pub mod registry;
pub mod signal;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;

use crate::broker::Broker;
use crate::metrics::Metrics;

/// Signaling payloads are opaque blobs the core never parses (spec.md
/// §1); this is a transport-level ceiling only, grounded on the
/// teacher's use of `tower_http`'s body limit layer elsewhere in its
/// router stack.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Builds the public broker router (`/client`, `/proxy`, `/answer`),
/// spawning its own serialiser task.
pub fn broker_router(proxy_timeout: Duration, client_timeout: Duration, metrics: Arc<Metrics>) -> Router {
	let broker = Broker::spawn(proxy_timeout, client_timeout, metrics);
	Router::new()
		.route("/client", post(handlers::client))
		.route("/proxy", post(handlers::proxy))
		.route("/answer", post(handlers::answer))
		.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
		.with_state(broker)
}
