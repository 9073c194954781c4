//! Errors returned across the actor API boundary.

use thiserror::Error;

use crate::ActorState;

/// Errors surfaced to callers of an [`crate::ActorHandle`].
///
/// Failures inside the actor's own hooks are never returned here; they are
/// observable through [`crate::ActorHandle::state`], [`crate::ActorHandle::exit`]
/// and the logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActorError {
	/// The startup handshake observed a report other than `RUNNING`.
	#[error("actor {actor} failed to start: reported {state}")]
	StartupFailed {
		/// Name of the actor.
		actor: String,
		/// State observed instead of `RUNNING`.
		state: ActorState,
	},

	/// `start` or `startup` was already called on this actor.
	#[error("actor {actor} was already started")]
	AlreadyStarted {
		/// Name of the actor.
		actor: String,
	},

	/// The actor has terminated and no longer accepts commands.
	#[error("actor {actor} inbox is closed")]
	InboxClosed {
		/// Name of the actor.
		actor: String,
	},
}

/// Result type for actor API operations.
pub type Result<T> = std::result::Result<T, ActorError>;
