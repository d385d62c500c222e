//! Core error taxonomy (spec.md §7) and its mapping onto the contractual
//! HTTP statuses of spec.md §6. Every variant here corresponds to exactly
//! one status code; none of them carry a message into the response body
//! (error-path bodies are always empty, per §6).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
	/// No proxy available when a client arrived (spec.md §7 "No capacity").
	#[error("no proxy available")]
	NoCapacity,

	/// Matched peer missed its deadline (spec.md §7 "Peer silence").
	#[error("peer did not respond before the deadline")]
	PeerSilence,

	/// Answer posted for an id the session index doesn't know about
	/// (spec.md §7 "Unknown session").
	#[error("unknown session")]
	UnknownSession,

	/// Empty answer body (spec.md §7 "Malformed request").
	#[error("empty answer body")]
	MalformedAnswer,
}

impl IntoResponse for BrokerError {
	fn into_response(self) -> Response {
		let status = match self {
			BrokerError::NoCapacity => StatusCode::SERVICE_UNAVAILABLE,
			BrokerError::PeerSilence => StatusCode::GATEWAY_TIMEOUT,
			BrokerError::UnknownSession => StatusCode::GONE,
			BrokerError::MalformedAnswer => StatusCode::BAD_REQUEST,
		};
		(status, ()).into_response()
	}
}
