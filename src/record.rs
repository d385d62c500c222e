//! The proxy record (spec.md §3 "Proxy record (B)") and the single-slot
//! channels it carries.
//!
//! A record is shared by three parties at different points in its life:
//! the serialiser (admission, registry membership), the client-offer
//! path (writes the offer, reads the answer), and the proxy-poll /
//! proxy-answer paths (read the offer, write the answer). Rather than a
//! lock per record, each direction is a one-shot channel; `Slot` just
//! gives the one-time "take if still here" semantics spec.md §9 asks
//! for ("a late send after receiver timeout is silently discarded").

use std::sync::Mutex;
use std::sync::atomic::{AtomicIsize, AtomicU32, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::registry::HeapIndexed;

pub type SessionId = Arc<str>;

/// A value that can be taken at most once, even under concurrent access.
struct Slot<T>(Mutex<Option<T>>);

impl<T> Slot<T> {
	fn new(value: T) -> Self {
		Self(Mutex::new(Some(value)))
	}

	fn take(&self) -> Option<T> {
		self.0.lock().expect("slot mutex poisoned").take()
	}
}

/// Per-proxy rendezvous state (spec.md §3, §4.5).
///
/// `clients` and `index` are mutated only by the serialiser task; they
/// are atomics purely so the record can be shared behind an `Arc`
/// without a lock on that hot path, not because multiple writers exist
/// (spec.md §5 "Shared resources").
pub struct ProxyRecord {
	id: SessionId,
	clients: AtomicU32,
	index: AtomicIsize,
	offer_tx: Slot<oneshot::Sender<Bytes>>,
	answer_rx: Slot<oneshot::Receiver<Bytes>>,
	answer_tx: Slot<oneshot::Sender<Bytes>>,
}

impl ProxyRecord {
	/// Create a new `Available` record for `id`. Returns the record and
	/// the receive half of its offer channel, which the caller (the
	/// admission forwarder, spec.md §4.2) owns directly rather than
	/// storing back on the record — nothing else ever needs it.
	pub fn new(id: SessionId) -> (Arc<Self>, oneshot::Receiver<Bytes>) {
		let (offer_tx, offer_rx) = oneshot::channel();
		let (answer_tx, answer_rx) = oneshot::channel();
		let record = Arc::new(Self {
			id,
			clients: AtomicU32::new(0),
			index: AtomicIsize::new(-1),
			offer_tx: Slot::new(offer_tx),
			answer_rx: Slot::new(answer_rx),
			answer_tx: Slot::new(answer_tx),
		});
		(record, offer_rx)
	}

	pub fn id(&self) -> &SessionId {
		&self.id
	}

	pub fn index(&self) -> isize {
		self.index.load(Ordering::SeqCst)
	}

	/// Marks the record Matched (spec.md §4.5): a client has popped it.
	/// See SPEC_FULL.md §13.1 for why this never decrements back to 0.
	pub fn mark_matched(&self) {
		self.clients.store(1, Ordering::SeqCst);
	}

	/// Takes the sender half of the offer channel, if it hasn't already
	/// been taken. Used once, by the client-offer path after popping
	/// this record from the registry.
	pub fn take_offer_tx(&self) -> Option<oneshot::Sender<Bytes>> {
		self.offer_tx.take()
	}

	/// Takes the receiver half of the answer channel. Used once, by the
	/// client-offer path after popping this record.
	pub fn take_answer_rx(&self) -> Option<oneshot::Receiver<Bytes>> {
		self.answer_rx.take()
	}

	/// Takes the sender half of the answer channel. Used once, by the
	/// proxy-answer path after looking this record up by session id.
	pub fn take_answer_tx(&self) -> Option<oneshot::Sender<Bytes>> {
		self.answer_tx.take()
	}
}

impl HeapIndexed for Arc<ProxyRecord> {
	fn clients(&self) -> u32 {
		self.clients.load(Ordering::SeqCst)
	}

	fn set_index(&self, index: isize) {
		self.index.store(index, Ordering::SeqCst);
	}
}
