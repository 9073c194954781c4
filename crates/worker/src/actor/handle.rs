//! Control and observation surface for one actor.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::run::RunLoop;
use super::{Actor, ActorExit, ActorExitKind, ActorSpec, Shared};
use crate::barrier::{self, Lifecycle};
use crate::error::{ActorError, Result};
use crate::inbox::{Inbox, InboxSender};
use crate::message::{Message, MessageType, Origin};
use crate::spawn::{join_error_panic_message, spawn};
use crate::state::ActorState;

/// Iteration counters for one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActorStats {
	pub loop_iterations: u64,
	pub commands_handled: u64,
}

/// Cloneable enqueue port for one actor's inbox.
pub struct ActorSender<D>
where
	D: Send + 'static,
{
	name: Arc<str>,
	tx: InboxSender<Message<D>>,
}

impl<D> Clone for ActorSender<D>
where
	D: Send + 'static,
{
	fn clone(&self) -> Self {
		Self {
			name: Arc::clone(&self.name),
			tx: self.tx.clone(),
		}
	}
}

impl<D> ActorSender<D>
where
	D: Send + 'static,
{
	/// Sends a bare command. Waits while the inbox is full.
	pub async fn send(&self, kind: impl Into<MessageType>) -> Result<()> {
		self.send_message(Message::new(kind, None, None)).await
	}

	/// Sends a command tagged with its origin.
	pub async fn send_from(&self, kind: impl Into<MessageType>, origin: Origin) -> Result<()> {
		self.send_message(Message::new(kind, Some(origin), None)).await
	}

	/// Sends a command with origin and payload.
	pub async fn send_with(&self, kind: impl Into<MessageType>, origin: Option<Origin>, data: D) -> Result<()> {
		self.send_message(Message::new(kind, origin, Some(data))).await
	}

	/// Enqueues a prebuilt message.
	pub async fn send_message(&self, msg: Message<D>) -> Result<()> {
		let kind = msg.kind();
		self.tx.send(msg).await.map_err(|_| ActorError::InboxClosed {
			actor: self.name.to_string(),
		})?;
		tracing::trace!(actor = %self.name, command = %kind, "command sent");
		Ok(())
	}

	/// Returns `true` once the actor no longer accepts commands.
	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}
}

/// Handle binding one concrete actor to the runtime.
///
/// Constructed in `INITIALIZING`; [`Self::startup`] or [`Self::start`] spawns
/// the run-loop. Dropping the handle closes the inbox, which ends a running
/// actor on the normal path.
pub struct ActorHandle<A>
where
	A: Actor,
{
	shared: Arc<Shared>,
	sender: ActorSender<A::Data>,
	origin: Origin,
	launch: Mutex<Option<RunLoop<A>>>,
	ready: Mutex<Option<oneshot::Receiver<ActorState>>>,
}

impl<A> Drop for ActorHandle<A>
where
	A: Actor,
{
	fn drop(&mut self) {
		self.sender.tx.close();
	}
}

impl<A> ActorHandle<A>
where
	A: Actor,
{
	/// Binds the actor described by `spec` without starting it.
	pub fn new(spec: ActorSpec<A>) -> Self {
		let name: Arc<str> = Arc::from(spec.name);
		let inbox = Inbox::new(spec.inbox_capacity);
		let shared = Arc::new(Shared::new(Arc::clone(&name)));
		let (ready_tx, ready_rx) = oneshot::channel();

		tracing::trace!(actor = %name, capacity = spec.inbox_capacity, "actor bound");
		Self {
			origin: Origin::new(Arc::clone(&name)),
			sender: ActorSender {
				name,
				tx: inbox.sender(),
			},
			launch: Mutex::new(Some(RunLoop {
				actor: spec.actor,
				rx: inbox.receiver(),
				discipline: spec.discipline,
				shared: Arc::clone(&shared),
				ready: Some(ready_tx),
			})),
			ready: Mutex::new(Some(ready_rx)),
			shared,
		}
	}

	/// Actor name.
	pub fn name(&self) -> &str {
		&self.shared.name
	}

	/// Non-blocking snapshot of the lifecycle state.
	pub fn state(&self) -> ActorState {
		self.shared.state.load()
	}

	/// States entered so far, starting with `INITIALIZING`.
	pub fn history(&self) -> Vec<ActorState> {
		self.shared.state.history()
	}

	/// Exit summary, available once the actor is `STOPPED`.
	pub fn exit(&self) -> Option<ActorExit> {
		if !self.state().is_terminal() {
			return None;
		}
		self.shared.exit.lock().clone()
	}

	pub fn stats(&self) -> ActorStats {
		ActorStats {
			loop_iterations: self.shared.loop_iterations.load(Ordering::Relaxed),
			commands_handled: self.shared.commands_handled.load(Ordering::Relaxed),
		}
	}

	/// Returns a cloneable enqueue port.
	pub fn sender(&self) -> ActorSender<A::Data> {
		self.sender.clone()
	}

	/// Sends a bare command. Waits while the inbox is full.
	pub async fn send(&self, kind: impl Into<MessageType>) -> Result<()> {
		self.sender.send(kind).await
	}

	/// Sends a command tagged with its origin.
	pub async fn send_from(&self, kind: impl Into<MessageType>, origin: Origin) -> Result<()> {
		self.sender.send_from(kind, origin).await
	}

	/// Sends a command with origin and payload.
	pub async fn send_with(&self, kind: impl Into<MessageType>, origin: Option<Origin>, data: A::Data) -> Result<()> {
		self.sender.send_with(kind, origin, data).await
	}

	/// Spawns the run-loop and returns immediately.
	///
	/// A second call is ignored with a warning.
	pub fn startup(&self) {
		tracing::debug!(actor = %self.shared.name, "actor starting");
		if !self.launch() {
			tracing::warn!(actor = %self.shared.name, "startup called on an actor that was already started");
		}
	}

	/// Spawns the run-loop and waits until setup has finished.
	///
	/// Returns [`ActorError::StartupFailed`] unless the actor reports
	/// `RUNNING`.
	pub async fn start(&self) -> Result<()> {
		tracing::debug!(actor = %self.shared.name, "actor starting");
		let already_started = || ActorError::AlreadyStarted {
			actor: self.shared.name.to_string(),
		};
		let Some(ready) = self.ready.lock().take() else {
			return Err(already_started());
		};
		if !self.launch() {
			return Err(already_started());
		}

		let state = match ready.await {
			Ok(state) => state,
			Err(_) => {
				// Run-loop died before reporting; wait for the watcher to close it out.
				self.wait_for_shutdown().await;
				self.state()
			}
		};
		tracing::trace!(actor = %self.shared.name, %state, "startup report received");

		if state == ActorState::Running {
			Ok(())
		} else {
			tracing::error!(actor = %self.shared.name, %state, "actor failed to start");
			Err(ActorError::StartupFailed {
				actor: self.shared.name.to_string(),
				state,
			})
		}
	}

	/// Enqueues the reserved shutdown command and returns.
	///
	/// Waits while the inbox is full. Does nothing if the actor has already
	/// terminated.
	pub async fn shutdown(&self) {
		tracing::debug!(actor = %self.shared.name, "actor shutting down");
		if self.sender.send_from(MessageType::SHUTDOWN, self.origin.clone()).await.is_err() {
			tracing::debug!(actor = %self.shared.name, "actor already terminated");
		}
	}

	/// Enqueues the shutdown command and waits for `STOPPED`.
	///
	/// An abnormal termination is logged as a warning, not returned as an
	/// error. Returns the exit summary, or `None` if the actor was never
	/// started.
	pub async fn stop(&self) -> Option<ActorExit> {
		if self.launch.lock().is_some() {
			tracing::warn!(actor = %self.shared.name, "stop called on an actor that was never started");
			return None;
		}

		self.shutdown().await;
		self.wait_for_shutdown().await;

		let exit = self.exit();
		match &exit {
			Some(exit) if !exit.is_failure() => tracing::debug!(actor = %self.shared.name, "actor closed"),
			Some(exit) => tracing::warn!(
				actor = %self.shared.name,
				reason = exit.kind().as_str(),
				error = exit.message().unwrap_or_default(),
				"actor closed abnormally"
			),
			None => tracing::warn!(actor = %self.shared.name, "actor closed without an exit record"),
		}
		exit
	}

	/// Polls until the actor has left `INITIALIZING`.
	pub async fn wait_for_startup(&self) -> bool {
		barrier::wait_for_startup(self).await
	}

	/// Like [`Self::wait_for_startup`], giving up after `timeout`.
	pub async fn wait_for_startup_timeout(&self, timeout: Duration) -> bool {
		barrier::wait_for_startup_timeout(self, timeout).await
	}

	/// Polls until the actor is `STOPPED`.
	pub async fn wait_for_shutdown(&self) -> bool {
		barrier::wait_for_shutdown(self).await
	}

	/// Like [`Self::wait_for_shutdown`], giving up after `timeout`.
	pub async fn wait_for_shutdown_timeout(&self, timeout: Duration) -> bool {
		barrier::wait_for_shutdown_timeout(self, timeout).await
	}

	/// Spawns the run-loop plus a watcher that closes out the actor if the
	/// run-loop task dies. Returns `false` if already launched.
	fn launch(&self) -> bool {
		let Some(run_loop) = self.launch.lock().take() else {
			return false;
		};

		let run = spawn(&self.shared.name, run_loop.run());
		let shared = Arc::clone(&self.shared);
		let tx = self.sender.tx.clone();
		spawn(&self.shared.name, async move {
			let Err(err) = run.await else {
				return;
			};
			tx.close();
			let exit = match join_error_panic_message(err) {
				Some(message) => {
					tracing::error!(actor = %shared.name, error = %message, "actor panicked");
					ActorExit::new(ActorExitKind::Panicked, Some(message))
				}
				None => {
					tracing::warn!(actor = %shared.name, "actor task aborted");
					ActorExit::new(ActorExitKind::Aborted, None)
				}
			};
			shared.abandon(exit);
		});
		true
	}
}

impl<A> Lifecycle for ActorHandle<A>
where
	A: Actor,
{
	fn name(&self) -> &str {
		&self.shared.name
	}

	fn state(&self) -> ActorState {
		self.shared.state.load()
	}
}
