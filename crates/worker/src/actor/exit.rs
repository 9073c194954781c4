/// How one actor's run-loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActorExitKind {
	/// A hook returned [`crate::Flow::Stop`].
	Stopped,
	/// The reserved shutdown command was received.
	ShutdownRequested,
	/// Every handle was dropped and the inbox closed.
	InboxClosed,
	/// `pre_loop` failed.
	SetupFailed,
	/// `run_once` failed.
	LoopFailed,
	/// `handle` failed.
	CommandFailed,
	/// A hook panicked.
	Panicked,
	/// The run-loop task was torn down by its runtime.
	Aborted,
}

impl ActorExitKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Stopped => "stopped",
			Self::ShutdownRequested => "shutdown_requested",
			Self::InboxClosed => "inbox_closed",
			Self::SetupFailed => "setup_failed",
			Self::LoopFailed => "loop_failed",
			Self::CommandFailed => "command_failed",
			Self::Panicked => "panicked",
			Self::Aborted => "aborted",
		}
	}
}

/// Exit summary recorded right before an actor reaches `STOPPED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorExit {
	kind: ActorExitKind,
	message: Option<String>,
}

impl ActorExit {
	pub(crate) fn new(kind: ActorExitKind, message: Option<String>) -> Self {
		Self { kind, message }
	}

	pub fn kind(&self) -> ActorExitKind {
		self.kind
	}

	/// Error or panic text for failed exits.
	pub fn message(&self) -> Option<&str> {
		self.message.as_deref()
	}

	/// Returns `true` when the terminal path passed through `FAILED`.
	pub fn is_failure(&self) -> bool {
		matches!(
			self.kind,
			ActorExitKind::SetupFailed | ActorExitKind::LoopFailed | ActorExitKind::CommandFailed | ActorExitKind::Panicked | ActorExitKind::Aborted
		)
	}
}
