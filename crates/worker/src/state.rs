//! Lifecycle state register.
//!
//! The register is written only by the actor's own run-loop task and read
//! lock-free from anywhere else.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;

/// Lifecycle state of one actor.
///
/// Ordinals are stable and may be compared or logged by collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActorState {
	/// Constructed, `pre_loop` has not completed yet.
	Initializing = 0,
	/// `pre_loop` succeeded; the run-loop is multiplexing commands and work.
	Running = 1,
	/// The run-loop exited normally and `after_loop` is executing.
	Stopping = 2,
	/// A hook reported an error or the run-loop task died; `Stopped` follows.
	Failed = 3,
	/// Terminal.
	Stopped = 4,
	/// Reserved. No runtime path enters this state.
	Pausing = 5,
}

impl ActorState {
	/// Returns the fixed upper-case name of this state.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Initializing => "INITIALIZING",
			Self::Running => "RUNNING",
			Self::Stopping => "STOPPING",
			Self::Failed => "FAILED",
			Self::Stopped => "STOPPED",
			Self::Pausing => "PAUSING",
		}
	}

	/// Returns the stable ordinal.
	pub const fn ordinal(self) -> u8 {
		self as u8
	}

	/// Decodes an ordinal produced by [`Self::ordinal`].
	pub const fn from_ordinal(value: u8) -> Option<Self> {
		match value {
			0 => Some(Self::Initializing),
			1 => Some(Self::Running),
			2 => Some(Self::Stopping),
			3 => Some(Self::Failed),
			4 => Some(Self::Stopped),
			5 => Some(Self::Pausing),
			_ => None,
		}
	}

	/// Returns `true` only for [`ActorState::Stopped`].
	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Stopped)
	}

	/// Transition table for the success and failure paths.
	///
	/// Every allowed edge moves forward; nothing leaves `Stopped` and nothing
	/// enters `Pausing`.
	pub const fn can_advance_to(self, next: Self) -> bool {
		matches!(
			(self, next),
			(Self::Initializing, Self::Running)
				| (Self::Initializing, Self::Failed)
				| (Self::Running, Self::Stopping)
				| (Self::Running, Self::Failed)
				| (Self::Stopping, Self::Stopped)
				| (Self::Failed, Self::Stopped)
		)
	}
}

impl fmt::Display for ActorState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Atomic single-writer state cell plus the path it has taken so far.
#[derive(Debug)]
pub(crate) struct StateRegister {
	current: AtomicU8,
	history: Mutex<Vec<ActorState>>,
}

impl StateRegister {
	pub(crate) fn new() -> Self {
		Self {
			current: AtomicU8::new(ActorState::Initializing.ordinal()),
			history: Mutex::new(vec![ActorState::Initializing]),
		}
	}

	/// Lock-free snapshot.
	pub(crate) fn load(&self) -> ActorState {
		// Only ordinals written by `advance`/`force` are ever stored.
		ActorState::from_ordinal(self.current.load(Ordering::Acquire)).unwrap_or(ActorState::Stopped)
	}

	/// Moves along the transition table. Returns `false` and leaves the
	/// register untouched when the edge is not allowed.
	pub(crate) fn advance(&self, next: ActorState) -> bool {
		let current = self.load();
		if !current.can_advance_to(next) {
			tracing::warn!(from = %current, to = %next, "rejected actor state transition");
			return false;
		}
		self.store(next);
		true
	}

	/// Writes without consulting the table. Only used to close out a run-loop
	/// task that died mid-transition.
	pub(crate) fn force(&self, next: ActorState) {
		self.store(next);
	}

	pub(crate) fn history(&self) -> Vec<ActorState> {
		self.history.lock().clone()
	}

	fn store(&self, next: ActorState) {
		self.history.lock().push(next);
		self.current.store(next.ordinal(), Ordering::Release);
	}
}
