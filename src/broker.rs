//! The broker context (spec.md §3 "Broker context (D)") and the three
//! matching operations (§4.2–§4.4) built on top of it.
//!
//! A single serialiser task owns the registry and the session index
//! (§5 "Shared resources"); every other task reaches them only by
//! sending a [`Command`] and awaiting a reply, the same pattern the
//! teacher's `ListenerManager::run` uses for its own admin channel —
//! one `tokio::select!` loop over an `mpsc::Receiver`, with work it
//! can't finish inline handed off to a spawned task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::BrokerError;
use crate::metrics::Metrics;
use crate::record::{ProxyRecord, SessionId};
use crate::registry::ProxyRegistry;

/// Messages the serialiser consumes. Every mutation of the registry or
/// the session index happens in response to one of these, on the
/// serialiser's task alone (spec.md §5).
enum Command {
	/// A proxy is long-polling under `id`. The serialiser admits it
	/// (§4.2 "Admission") and replies on `delivery` once an offer
	/// arrives or `Tp` elapses.
	Poll {
		id: SessionId,
		delivery: oneshot::Sender<Option<Bytes>>,
	},
	/// Pop the least-loaded proxy for a client offer (§4.3 step 1).
	Pop {
		reply: oneshot::Sender<Option<Arc<ProxyRecord>>>,
	},
	/// Look a proxy up by session id for the answer path (§4.4 step 1).
	Lookup {
		id: SessionId,
		reply: oneshot::Sender<Option<Arc<ProxyRecord>>>,
	},
	/// Retire a record: drop it from the registry if still present, and
	/// from the session index if it still owns that slot (§4.5
	/// Available → Done, Matched → Done).
	Forget { id: SessionId, record: Arc<ProxyRecord> },
}

/// A handle to the running broker. Cloning it is cheap (it's just a
/// channel sender); every HTTP handler gets its own clone.
#[derive(Clone)]
pub struct Broker {
	cmd_tx: mpsc::Sender<Command>,
	proxy_timeout: Duration,
	client_timeout: Duration,
	metrics: Arc<Metrics>,
}

impl Broker {
	/// Spawns the serialiser task and returns a handle to it.
	pub fn spawn(proxy_timeout: Duration, client_timeout: Duration, metrics: Arc<Metrics>) -> Self {
		let (cmd_tx, cmd_rx) = mpsc::channel(1024);
		let loopback = cmd_tx.clone();
		tokio::spawn(run_serialiser(cmd_rx, loopback, proxy_timeout, metrics.clone()));
		Self {
			cmd_tx,
			proxy_timeout,
			client_timeout,
			metrics,
		}
	}

	/// Proxy poll path (spec.md §4.2). Registers `id`, then waits up to
	/// `Tp` for an offer. `None` covers both "timed out" and "offer
	/// channel closed without a value" — both map to 504 at the
	/// handler.
	pub async fn poll(&self, id: SessionId) -> Option<Bytes> {
		let (delivery_tx, delivery_rx) = oneshot::channel();
		if self
			.cmd_tx
			.send(Command::Poll {
				id,
				delivery: delivery_tx,
			})
			.await
			.is_err()
		{
			return None;
		}
		match tokio::time::timeout(self.proxy_timeout, delivery_rx).await {
			Ok(Ok(offer)) => offer,
			Ok(Err(_)) | Err(_) => None,
		}
	}

	/// Client offer path (spec.md §4.3).
	pub async fn submit_offer(&self, offer: Bytes) -> Result<Bytes, BrokerError> {
		let (reply_tx, reply_rx) = oneshot::channel();
		if self
			.cmd_tx
			.send(Command::Pop { reply: reply_tx })
			.await
			.is_err()
		{
			warn!("client offer rejected: broker unavailable");
			self.metrics.client_requests_rejected.inc();
			return Err(BrokerError::NoCapacity);
		}
		let record = match reply_rx.await {
			Ok(Some(record)) => record,
			_ => {
				debug!("client offer rejected: no proxy available");
				self.metrics.client_requests_rejected.inc();
				return Err(BrokerError::NoCapacity);
			},
		};

		let offer_tx = record
			.take_offer_tx()
			.expect("a just-popped record's offer sender has never been taken");
		let answer_rx = record
			.take_answer_rx()
			.expect("a just-popped record's answer receiver has never been taken");

		// The record was just popped, so its admission forwarder is
		// parked on the other end of this channel (§5 "offer send
		// strictly happens-before answer receive").
		let _ = offer_tx.send(offer);

		match tokio::time::timeout(self.client_timeout, answer_rx).await {
			Ok(Ok(answer)) => {
				info!(id = %record.id(), "client offer answered");
				self.metrics.client_requests_served.inc();
				Ok(answer)
			},
			Ok(Err(_)) | Err(_) => {
				debug!(id = %record.id(), "client offer timed out waiting for an answer");
				self.metrics.client_requests_timed_out.inc();
				self.forget(record).await;
				Err(BrokerError::PeerSilence)
			},
		}
	}

	/// Proxy answer path (spec.md §4.4).
	pub async fn submit_answer(&self, id: SessionId, answer: Bytes) -> Result<(), BrokerError> {
		if answer.is_empty() {
			warn!(id = %id, "answer rejected: empty body");
			self.metrics.answers_rejected.inc();
			return Err(BrokerError::MalformedAnswer);
		}
		let (reply_tx, reply_rx) = oneshot::channel();
		if self
			.cmd_tx
			.send(Command::Lookup {
				id: id.clone(),
				reply: reply_tx,
			})
			.await
			.is_err()
		{
			warn!(id = %id, "answer rejected: broker unavailable");
			self.metrics.answers_rejected.inc();
			return Err(BrokerError::UnknownSession);
		}
		let record = match reply_rx.await {
			Ok(Some(record)) => record,
			_ => {
				warn!(id = %id, "answer rejected: unknown session");
				self.metrics.answers_rejected.inc();
				return Err(BrokerError::UnknownSession);
			},
		};
		// A late answer with no armed receiver is silently discarded
		// (spec.md §4.4, §9 "shared single-slot channels"); either way
		// the proxy sees success, it has met its contract.
		if let Some(tx) = record.take_answer_tx() {
			let _ = tx.send(answer);
		}
		info!(id = %id, "answer accepted");
		self.metrics.answers_accepted.inc();
		Ok(())
	}

	async fn forget(&self, record: Arc<ProxyRecord>) {
		let id = record.id().clone();
		let _ = self.cmd_tx.send(Command::Forget { id, record }).await;
	}
}

async fn run_serialiser(
	mut cmd_rx: mpsc::Receiver<Command>,
	cmd_tx: mpsc::Sender<Command>,
	proxy_timeout: Duration,
	metrics: Arc<Metrics>,
) {
	let mut registry: ProxyRegistry<Arc<ProxyRecord>> = ProxyRegistry::new();
	let mut session_index: HashMap<SessionId, Arc<ProxyRecord>> = HashMap::new();

	while let Some(cmd) = cmd_rx.recv().await {
		match cmd {
			Command::Poll { id, delivery } => {
				let (record, offer_rx) = ProxyRecord::new(id.clone());
				registry.push(record.clone());
				if let Some(displaced) = session_index.insert(id.clone(), record.clone()) {
					warn!(id = %id, "duplicate session id displaced a prior poll");
					// The displaced record keeps whatever registry slot it
					// had; ordinary pop/timeout cleanup (§4.2) retires it.
					drop(displaced);
				}
				info!(id = %id, "proxy admitted");
				metrics.proxies_admitted.inc();
				tokio::spawn(admission_forwarder(
					id,
					record,
					offer_rx,
					proxy_timeout,
					delivery,
					cmd_tx.clone(),
				));
			},
			Command::Pop { reply } => {
				let popped = registry.pop().ok();
				if let Some(record) = &popped {
					record.mark_matched();
					debug!(id = %record.id(), "proxy matched to client offer");
					metrics.proxies_matched.inc();
				}
				let _ = reply.send(popped);
			},
			Command::Lookup { id, reply } => {
				let _ = reply.send(session_index.get(&id).cloned());
			},
			Command::Forget { id, record } => {
				let index = record.index();
				if index >= 0 {
					registry.remove(index as usize);
					metrics.proxies_timed_out.inc();
				}
				if let Some(existing) = session_index.get(&id) {
					if Arc::ptr_eq(existing, &record) {
						session_index.remove(&id);
					}
				}
			},
		}
	}
}

/// Spawned once per admitted proxy (spec.md §4.2 "Admission"). Waits
/// up to `Tp` for an offer on the record's own channel and forwards it
/// to the poll handler; on timeout it tells the serialiser to retire
/// the record instead.
async fn admission_forwarder(
	id: SessionId,
	record: Arc<ProxyRecord>,
	offer_rx: oneshot::Receiver<Bytes>,
	proxy_timeout: Duration,
	delivery: oneshot::Sender<Option<Bytes>>,
	cmd_tx: mpsc::Sender<Command>,
) {
	match tokio::time::timeout(proxy_timeout, offer_rx).await {
		Ok(Ok(offer)) => {
			let _ = delivery.send(Some(offer));
		},
		Ok(Err(_)) | Err(_) => {
			debug!(id = %id, "proxy poll timed out unmatched");
			let _ = delivery.send(None);
			let _ = cmd_tx.send(Command::Forget { id, record }).await;
		},
	}
}
