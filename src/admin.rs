//! Liveness endpoint, mounted next to the metrics router the same way
//! (SPEC_FULL.md §11): a standalone `Router` an operator can put behind
//! a separate listener or path prefix from the public broker routes.

use axum::{Router, http::StatusCode, routing::get};

#[derive(Clone, Default)]
pub struct App;

impl App {
	pub fn new() -> Self {
		Self
	}

	pub fn router(&self) -> Router {
		Router::new().route("/healthz", get(healthz))
	}
}

async fn healthz() -> StatusCode {
	StatusCode::OK
}
