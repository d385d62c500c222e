//! Prometheus counters for the broker, exposed the way
//! `examples/vishalbelsare-agentgateway/src/metrics.rs` exposes its
//! `/metrics` route: a small `Router` of its own, mounted next to the
//! broker's main router, backed by an `Arc<Registry>`.
//!
//! spec.md §1 lists metrics as an external collaborator the matching
//! engine itself does not depend on; this module only observes the
//! engine through the counters [`Metrics`] passes down, it never gates
//! a request. The Deferred/Recorder abstraction the teacher builds in
//! this file isn't carried over: the broker has nothing that needs an
//! on-drop recording (no per-connection latency to capture at body-end),
//! just plain counters incremented at the call site.

use std::sync::Arc;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::registry::Registry;

pub struct Metrics {
	pub proxies_admitted: Counter,
	pub proxies_matched: Counter,
	pub proxies_timed_out: Counter,
	pub client_requests_served: Counter,
	pub client_requests_rejected: Counter,
	pub client_requests_timed_out: Counter,
	pub answers_accepted: Counter,
	pub answers_rejected: Counter,
}

impl Metrics {
	pub fn new(registry: &mut Registry) -> Arc<Self> {
		let sub = registry.sub_registry_with_prefix("snowflake_broker");
		let metrics = Self {
			proxies_admitted: Counter::default(),
			proxies_matched: Counter::default(),
			proxies_timed_out: Counter::default(),
			client_requests_served: Counter::default(),
			client_requests_rejected: Counter::default(),
			client_requests_timed_out: Counter::default(),
			answers_accepted: Counter::default(),
			answers_rejected: Counter::default(),
		};
		sub.register(
			"proxies_admitted",
			"Proxy polls admitted into the registry",
			metrics.proxies_admitted.clone(),
		);
		sub.register(
			"proxies_matched",
			"Proxy records matched to a client offer",
			metrics.proxies_matched.clone(),
		);
		sub.register(
			"proxies_timed_out",
			"Proxy polls that timed out unmatched",
			metrics.proxies_timed_out.clone(),
		);
		sub.register(
			"client_requests_served",
			"Client offers answered within the deadline",
			metrics.client_requests_served.clone(),
		);
		sub.register(
			"client_requests_rejected",
			"Client offers rejected for lack of capacity",
			metrics.client_requests_rejected.clone(),
		);
		sub.register(
			"client_requests_timed_out",
			"Client offers that timed out waiting for an answer",
			metrics.client_requests_timed_out.clone(),
		);
		sub.register(
			"answers_accepted",
			"Proxy answers accepted and delivered",
			metrics.answers_accepted.clone(),
		);
		sub.register(
			"answers_rejected",
			"Proxy answers rejected (unknown session or empty body)",
			metrics.answers_rejected.clone(),
		);
		Arc::new(metrics)
	}
}

#[derive(Clone)]
pub struct App {
	registry: Arc<Registry>,
}

impl App {
	pub fn new(registry: Arc<Registry>) -> Self {
		Self { registry }
	}

	pub fn router(&self) -> Router {
		Router::new()
			.route("/metrics", get(metrics_handler))
			.with_state(self.clone())
	}
}

async fn metrics_handler(State(app): State<App>) -> Result<String, StatusCode> {
	let mut buffer = String::new();
	encode(&mut buffer, &app.registry).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
	Ok(buffer)
}
