//! Bounded multi-producer, single-consumer command inbox.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

/// Inbox send error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxSendError {
	/// Inbox is closed.
	Closed,
}

/// Non-blocking receive error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxRecvError {
	/// Nothing queued right now.
	Empty,
	/// Closed and fully drained.
	Closed,
}

struct InboxState<T> {
	queue: VecDeque<T>,
	closed: bool,
}

struct InboxInner<T> {
	capacity: usize,
	state: Mutex<InboxState<T>>,
	notify_recv: Notify,
	notify_send: Notify,
}

/// Bounded FIFO inbox. Producers wait while it is full.
pub(crate) struct Inbox<T> {
	inner: Arc<InboxInner<T>>,
}

/// Producer side. Cloneable.
pub(crate) struct InboxSender<T> {
	inner: Arc<InboxInner<T>>,
}

/// Consumer side. Owned by the run-loop.
pub(crate) struct InboxReceiver<T> {
	inner: Arc<InboxInner<T>>,
}

impl<T> Clone for InboxSender<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T> Inbox<T> {
	/// Creates an empty inbox.
	///
	/// # Panics
	///
	/// Panics if `capacity` is zero.
	pub(crate) fn new(capacity: usize) -> Self {
		assert!(capacity > 0, "inbox capacity must be > 0");
		Self {
			inner: Arc::new(InboxInner {
				capacity,
				state: Mutex::new(InboxState {
					queue: VecDeque::with_capacity(capacity),
					closed: false,
				}),
				notify_recv: Notify::new(),
				notify_send: Notify::new(),
			}),
		}
	}

	pub(crate) fn sender(&self) -> InboxSender<T> {
		InboxSender {
			inner: Arc::clone(&self.inner),
		}
	}

	pub(crate) fn receiver(&self) -> InboxReceiver<T> {
		InboxReceiver {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T> InboxInner<T> {
	fn close(&self) {
		self.state.lock().closed = true;
		// Single consumer: a stored permit covers a receiver that has not
		// parked yet.
		self.notify_recv.notify_one();
		self.notify_send.notify_waiters();
	}
}

impl<T> InboxSender<T> {
	/// Enqueues one message, waiting for capacity when full.
	pub(crate) async fn send(&self, msg: T) -> Result<(), InboxSendError> {
		loop {
			// Register before checking capacity so a pop between the check
			// and the await is not lost.
			let notified = self.inner.notify_send.notified();
			{
				let mut state = self.inner.state.lock();
				if state.closed {
					return Err(InboxSendError::Closed);
				}
				if state.queue.len() < self.inner.capacity {
					state.queue.push_back(msg);
					drop(state);
					self.inner.notify_recv.notify_one();
					return Ok(());
				}
			}
			notified.await;
		}
	}

	/// Closes the inbox. Queued messages stay available to the receiver.
	pub(crate) fn close(&self) {
		self.inner.close();
	}

	pub(crate) fn is_closed(&self) -> bool {
		self.inner.state.lock().closed
	}
}

impl<T> InboxReceiver<T> {
	/// Receives one message. Returns `None` once the inbox is closed and drained.
	pub(crate) async fn recv(&self) -> Option<T> {
		loop {
			let notified = self.inner.notify_recv.notified();
			match self.try_recv() {
				Ok(msg) => return Some(msg),
				Err(InboxRecvError::Closed) => return None,
				Err(InboxRecvError::Empty) => notified.await,
			}
		}
	}

	/// Dequeues without waiting.
	pub(crate) fn try_recv(&self) -> Result<T, InboxRecvError> {
		let mut state = self.inner.state.lock();
		match state.queue.pop_front() {
			Some(msg) => {
				drop(state);
				self.inner.notify_send.notify_one();
				Ok(msg)
			}
			None if state.closed => Err(InboxRecvError::Closed),
			None => Err(InboxRecvError::Empty),
		}
	}

	/// Closes the inbox and discards whatever is still queued. Returns the
	/// number of discarded messages.
	pub(crate) fn close_and_drain(&self) -> usize {
		let discarded = {
			let mut state = self.inner.state.lock();
			state.closed = true;
			let n = state.queue.len();
			state.queue.clear();
			n
		};
		self.inner.notify_send.notify_waiters();
		discarded
	}
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[tokio::test]
	async fn delivers_in_send_order() {
		let inbox = Inbox::new(3);
		let tx = inbox.sender();
		let rx = inbox.receiver();

		tx.send(1u32).await.unwrap();
		tx.send(2).await.unwrap();
		tx.send(3).await.unwrap();

		assert_eq!(rx.recv().await, Some(1));
		assert_eq!(rx.recv().await, Some(2));
		assert_eq!(rx.recv().await, Some(3));
		assert_eq!(rx.try_recv(), Err(InboxRecvError::Empty));
	}

	#[tokio::test]
	async fn send_blocks_until_capacity_freed() {
		let inbox = Inbox::new(1);
		let tx = inbox.sender();
		let rx = inbox.receiver();

		tx.send(1u32).await.unwrap();

		let tx2 = tx.clone();
		let send_task = tokio::spawn(async move { tx2.send(2).await });

		tokio::time::sleep(Duration::from_millis(10)).await;
		assert!(!send_task.is_finished(), "send into a full inbox must wait");

		assert_eq!(rx.recv().await, Some(1));
		let result = tokio::time::timeout(Duration::from_millis(200), send_task)
			.await
			.expect("send should unblock after pop")
			.unwrap();
		assert_eq!(result, Ok(()));
		assert_eq!(rx.recv().await, Some(2));
	}

	#[tokio::test]
	async fn recv_waits_for_send() {
		let inbox = Inbox::new(2);
		let tx = inbox.sender();
		let rx = inbox.receiver();

		let recv_task = tokio::spawn(async move { rx.recv().await });
		tokio::time::sleep(Duration::from_millis(10)).await;
		tx.send(42u32).await.unwrap();

		let got = tokio::time::timeout(Duration::from_millis(200), recv_task).await.unwrap().unwrap();
		assert_eq!(got, Some(42));
	}

	#[tokio::test]
	async fn close_drains_then_reports_closed() {
		let inbox = Inbox::new(2);
		let tx = inbox.sender();
		let rx = inbox.receiver();

		tx.send(1u32).await.unwrap();
		tx.close();

		assert!(tx.is_closed());
		assert_eq!(tx.send(2).await, Err(InboxSendError::Closed));
		assert_eq!(rx.recv().await, Some(1));
		assert_eq!(rx.recv().await, None);
		assert_eq!(rx.try_recv(), Err(InboxRecvError::Closed));
	}

	#[tokio::test]
	async fn close_wakes_parked_receiver() {
		let inbox = Inbox::<u32>::new(2);
		let tx = inbox.sender();
		let rx = inbox.receiver();

		let recv_task = tokio::spawn(async move { rx.recv().await });
		tokio::time::sleep(Duration::from_millis(10)).await;
		tx.close();

		let got = tokio::time::timeout(Duration::from_millis(200), recv_task).await.unwrap().unwrap();
		assert_eq!(got, None);
	}

	#[tokio::test]
	async fn close_and_drain_releases_blocked_senders() {
		let inbox = Inbox::new(1);
		let tx = inbox.sender();
		let rx = inbox.receiver();

		tx.send(1u32).await.unwrap();
		let tx2 = tx.clone();
		let blocked = tokio::spawn(async move { tx2.send(2).await });
		tokio::time::sleep(Duration::from_millis(10)).await;

		assert_eq!(rx.close_and_drain(), 1);
		let result = tokio::time::timeout(Duration::from_millis(200), blocked).await.unwrap().unwrap();
		assert_eq!(result, Err(InboxSendError::Closed));
	}

	#[tokio::test]
	async fn many_producers_never_drop() {
		let inbox = Inbox::new(2);
		let rx = inbox.receiver();

		let mut producers = Vec::new();
		for p in 0..4u32 {
			let tx = inbox.sender();
			producers.push(tokio::spawn(async move {
				for i in 0..25u32 {
					tx.send(p * 100 + i).await.unwrap();
				}
			}));
		}

		let mut seen = Vec::new();
		while seen.len() < 100 {
			let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
			seen.push(msg);
		}
		for producer in producers {
			producer.await.unwrap();
		}

		// Per-producer order is preserved.
		for p in 0..4u32 {
			let from_p: Vec<_> = seen.iter().copied().filter(|v| v / 100 == p).collect();
			let expected: Vec<_> = (0..25u32).map(|i| p * 100 + i).collect();
			assert_eq!(from_p, expected);
		}
	}
}
