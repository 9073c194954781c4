//! Supervised run-loop actors.
//!
//! An [`Actor`] supplies four hooks (`pre_loop`, `run_once`, `after_loop`,
//! `handle`). [`ActorHandle`] binds it to a lifecycle state register and a
//! small bounded inbox, spawns the run-loop on demand, and exposes
//! startup/shutdown barriers so other code can wait for known states.
//!
//! ```text
//! INITIALIZING -> RUNNING -> STOPPING -> STOPPED
//!       |            |           |
//!       +---------> FAILED <-----+ (after_loop panicked)
//!                     |
//!                     +-> STOPPED
//! ```

mod actor;
pub mod barrier;
mod error;
mod inbox;
mod message;
mod spawn;
mod state;

pub use actor::{
	Actor, ActorContext, ActorExit, ActorExitKind, ActorHandle, ActorSender, ActorSpec, ActorStats, DEFAULT_INBOX_CAPACITY, DEFAULT_TICK, Discipline,
	Flow, MAX_INBOX_CAPACITY,
};
pub use barrier::{
	Lifecycle, POLL_INTERVAL, wait_for_shutdown, wait_for_shutdown_all, wait_for_shutdown_all_timeout, wait_for_shutdown_timeout, wait_for_startup,
	wait_for_startup_all, wait_for_startup_all_timeout, wait_for_startup_timeout,
};
pub use error::{ActorError, Result};
pub use message::{Message, MessageType, Origin};
pub use spawn::spawn;
pub use state::ActorState;
