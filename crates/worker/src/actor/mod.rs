//! Actor contract and the generic runtime that drives it.
//!
//! A concrete actor supplies four hooks through [`Actor`]; [`ActorHandle`]
//! owns the state register and inbox, spawns the run-loop, and exposes the
//! control and observation surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::message::Message;
use crate::state::{ActorState, StateRegister};

pub mod exit;
pub mod handle;
mod run;
pub mod spec;

pub use exit::{ActorExit, ActorExitKind};
pub use handle::{ActorHandle, ActorSender, ActorStats};
pub use spec::{ActorSpec, DEFAULT_INBOX_CAPACITY, DEFAULT_TICK, Discipline, MAX_INBOX_CAPACITY};

/// Continuation directive returned by [`Actor::run_once`] and [`Actor::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
	/// Keep looping.
	Continue,
	/// Leave the loop on the normal path.
	Stop,
}

/// Hooks executed by the run-loop.
///
/// Hooks never run concurrently with each other for the same actor. Any
/// error ends the loop on the failure path.
#[async_trait]
pub trait Actor: Send + 'static {
	/// Payload carried in the data slot of this actor's messages.
	type Data: Send + 'static;

	/// One-time setup. Failure aborts the actor before any work or command,
	/// and `after_loop` is not called.
	async fn pre_loop(&mut self, _ctx: &ActorContext) -> anyhow::Result<()> {
		Ok(())
	}

	/// One unit of background work.
	async fn run_once(&mut self, _ctx: &ActorContext) -> anyhow::Result<Flow> {
		Ok(Flow::Continue)
	}

	/// Cleanup after the loop, including after a failure in the loop.
	async fn after_loop(&mut self, _ctx: &ActorContext) {}

	/// Handles one non-reserved command.
	async fn handle(&mut self, msg: Message<Self::Data>, ctx: &ActorContext) -> anyhow::Result<Flow>;
}

/// State shared between a handle, its run-loop and its watcher.
pub(crate) struct Shared {
	pub(crate) name: Arc<str>,
	pub(crate) state: StateRegister,
	pub(crate) exit: Mutex<Option<ActorExit>>,
	pub(crate) loop_iterations: AtomicU64,
	pub(crate) commands_handled: AtomicU64,
}

impl Shared {
	pub(crate) fn new(name: Arc<str>) -> Self {
		Self {
			name,
			state: StateRegister::new(),
			exit: Mutex::new(None),
			loop_iterations: AtomicU64::new(0),
			commands_handled: AtomicU64::new(0),
		}
	}

	/// Records how the loop ended. Callers see it once the actor is `STOPPED`.
	pub(crate) fn record(&self, exit: ActorExit) {
		*self.exit.lock() = Some(exit);
	}

	pub(crate) fn finish(&self) {
		self.state.advance(ActorState::Stopped);
	}

	/// Closes out an actor whose run-loop task died without finishing.
	///
	/// The path always passes through `FAILED`, including a panic in
	/// `after_loop` on the normal path. A failure recorded before the task
	/// died is kept.
	pub(crate) fn abandon(&self, exit: ActorExit) {
		match self.state.load() {
			ActorState::Stopped => return,
			ActorState::Failed => {}
			_ => self.state.force(ActorState::Failed),
		}
		{
			let mut slot = self.exit.lock();
			match slot.as_ref() {
				Some(first) if first.is_failure() => {
					tracing::debug!(
						actor = %self.name,
						kept = first.kind().as_str(),
						dropped = exit.kind().as_str(),
						"keeping earlier failure"
					);
				}
				_ => *slot = Some(exit),
			}
		}
		self.state.force(ActorState::Stopped);
	}
}

/// Read-only view of the running actor handed to every hook.
#[derive(Clone)]
pub struct ActorContext {
	shared: Arc<Shared>,
}

impl ActorContext {
	pub(crate) fn new(shared: Arc<Shared>) -> Self {
		Self { shared }
	}

	/// Actor name.
	pub fn name(&self) -> &str {
		&self.shared.name
	}

	/// Current lifecycle state.
	pub fn state(&self) -> ActorState {
		self.shared.state.load()
	}

	/// Completed `run_once` calls so far.
	pub fn loop_iterations(&self) -> u64 {
		self.shared.loop_iterations.load(Ordering::Relaxed)
	}

	/// Completed `handle` calls so far.
	pub fn commands_handled(&self) -> u64 {
		self.shared.commands_handled.load(Ordering::Relaxed)
	}
}
