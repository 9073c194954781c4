//! Actor construction spec.

use std::time::Duration;

use super::Actor;

/// Inbox capacity used when none is configured.
pub const DEFAULT_INBOX_CAPACITY: usize = 2;
/// Largest accepted inbox capacity.
pub const MAX_INBOX_CAPACITY: usize = 5;
/// Work period of [`Discipline::Ticked`] when none is configured.
pub const DEFAULT_TICK: Duration = Duration::from_millis(10);

/// How the run-loop interleaves commands with background work.
///
/// Every discipline keeps hook calls strictly sequential and lets a queued
/// shutdown through after at most one more unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
	/// Check the inbox without waiting; run one unit of work whenever it is
	/// empty. Yields to the scheduler after every unit.
	PriorityDrain,
	/// Wait on inbox-or-timer, preferring the inbox; each timer tick runs one
	/// unit of work.
	Ticked { period: Duration },
	/// Only drain the inbox. `run_once` is never called.
	InboxOnly,
}

impl Discipline {
	/// Timer-driven discipline with [`DEFAULT_TICK`].
	pub const fn ticked() -> Self {
		Self::Ticked { period: DEFAULT_TICK }
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::PriorityDrain => "priority_drain",
			Self::Ticked { .. } => "ticked",
			Self::InboxOnly => "inbox_only",
		}
	}
}

impl Default for Discipline {
	fn default() -> Self {
		Self::ticked()
	}
}

/// Builder spec binding one concrete actor to the runtime.
pub struct ActorSpec<A>
where
	A: Actor,
{
	pub(crate) name: String,
	pub(crate) actor: A,
	pub(crate) inbox_capacity: usize,
	pub(crate) discipline: Discipline,
}

impl<A> ActorSpec<A>
where
	A: Actor,
{
	/// Creates a spec with the default inbox capacity and discipline.
	pub fn new(name: impl Into<String>, actor: A) -> Self {
		Self {
			name: name.into(),
			actor,
			inbox_capacity: DEFAULT_INBOX_CAPACITY,
			discipline: Discipline::default(),
		}
	}

	/// Sets the inbox capacity.
	///
	/// # Panics
	///
	/// Panics if `capacity` is zero or above [`MAX_INBOX_CAPACITY`].
	#[must_use]
	pub fn inbox_capacity(mut self, capacity: usize) -> Self {
		assert!(
			(1..=MAX_INBOX_CAPACITY).contains(&capacity),
			"inbox capacity must be within 1..={MAX_INBOX_CAPACITY}"
		);
		self.inbox_capacity = capacity;
		self
	}

	/// Sets the multiplexing discipline.
	///
	/// # Panics
	///
	/// Panics if a ticked discipline has a zero period.
	#[must_use]
	pub fn discipline(mut self, discipline: Discipline) -> Self {
		if let Discipline::Ticked { period } = discipline {
			assert!(!period.is_zero(), "tick period must be > 0");
		}
		self.discipline = discipline;
		self
	}
}
