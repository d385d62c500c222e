//! The three HTTP handlers (spec.md §4.2–§4.4, §6): thin skins over
//! [`Broker`] that do nothing but translate bytes and headers into
//! broker calls and broker outcomes into status codes.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::broker::Broker;
use crate::error::BrokerError;
use crate::record::SessionId;

const SESSION_ID_HEADER: &str = "x-session-id";

/// `Access-Control-Allow-Headers` carried on every `/client` response
/// regardless of outcome (spec.md §4.3, §6). The concrete header set
/// is an external-interface concern the core only has to attach, not
/// decide in full generality — this covers the signaling headers
/// snowflake clients are known to send.
const CLIENT_CORS_ALLOW_HEADERS: &str = "Content-Type";

fn session_id(headers: &HeaderMap) -> Option<SessionId> {
	headers
		.get(SESSION_ID_HEADER)
		.and_then(|v| v.to_str().ok())
		.filter(|s| !s.is_empty())
		.map(SessionId::from)
}

/// `POST /client` — submit a client offer (spec.md §4.3).
pub async fn client(State(broker): State<Broker>, offer: Bytes) -> Response {
	let mut response = match broker.submit_offer(offer).await {
		Ok(answer) => (StatusCode::OK, answer).into_response(),
		Err(err) => err.into_response(),
	};
	response.headers_mut().insert(
		header::ACCESS_CONTROL_ALLOW_HEADERS,
		HeaderValue::from_static(CLIENT_CORS_ALLOW_HEADERS),
	);
	response
}

/// `POST /proxy` — a proxy long-polls for an offer (spec.md §4.2). The
/// request body, if any, is a heartbeat and carries no meaning the
/// core interprets.
pub async fn proxy(State(broker): State<Broker>, headers: HeaderMap, _body: Bytes) -> Response {
	let Some(id) = session_id(&headers) else {
		return StatusCode::BAD_REQUEST.into_response();
	};
	match broker.poll(id).await {
		Some(offer) => (StatusCode::OK, offer).into_response(),
		None => StatusCode::GATEWAY_TIMEOUT.into_response(),
	}
}

/// `POST /answer` — a proxy delivers the answer for its matched client
/// (spec.md §4.4).
pub async fn answer(State(broker): State<Broker>, headers: HeaderMap, body: Bytes) -> Response {
	let Some(id) = session_id(&headers) else {
		return BrokerError::UnknownSession.into_response();
	};
	match broker.submit_answer(id, body).await {
		Ok(()) => StatusCode::OK.into_response(),
		Err(err) => err.into_response(),
	}
}
