//! Run-loop multiplexer.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::oneshot;
use tokio::time::{Interval, MissedTickBehavior};

use super::{Actor, ActorContext, ActorExit, ActorExitKind, Discipline, Flow, Shared};
use crate::inbox::{InboxReceiver, InboxRecvError};
use crate::message::{Message, Origin};
use crate::state::ActorState;

/// Everything the run-loop task owns. Built by the handle, consumed on launch.
pub(crate) struct RunLoop<A>
where
	A: Actor,
{
	pub(crate) actor: A,
	pub(crate) rx: InboxReceiver<Message<A::Data>>,
	pub(crate) discipline: Discipline,
	pub(crate) shared: Arc<Shared>,
	pub(crate) ready: Option<oneshot::Sender<ActorState>>,
}

enum Step<D> {
	Command(Message<D>),
	Work,
	Closed,
}

enum Driver {
	PriorityDrain,
	Ticked(Interval),
	InboxOnly,
}

impl Driver {
	fn new(discipline: Discipline) -> Self {
		match discipline {
			Discipline::PriorityDrain => Self::PriorityDrain,
			Discipline::Ticked { period } => {
				let mut interval = tokio::time::interval(period);
				interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
				Self::Ticked(interval)
			}
			Discipline::InboxOnly => Self::InboxOnly,
		}
	}

	async fn next_step<D>(&mut self, rx: &InboxReceiver<Message<D>>) -> Step<D> {
		match self {
			Self::PriorityDrain => match rx.try_recv() {
				Ok(msg) => Step::Command(msg),
				Err(InboxRecvError::Empty) => Step::Work,
				Err(InboxRecvError::Closed) => Step::Closed,
			},
			Self::Ticked(interval) => {
				tokio::select! {
					biased;
					msg = rx.recv() => msg.map_or(Step::Closed, Step::Command),
					_ = interval.tick() => Step::Work,
				}
			}
			Self::InboxOnly => rx.recv().await.map_or(Step::Closed, Step::Command),
		}
	}
}

impl<A> RunLoop<A>
where
	A: Actor,
{
	pub(crate) async fn run(mut self) {
		let ctx = ActorContext::new(Arc::clone(&self.shared));
		let name = Arc::clone(&self.shared.name);
		tracing::debug!(actor = %name, discipline = self.discipline.as_str(), "actor initializing");

		if let Err(err) = self.actor.pre_loop(&ctx).await {
			let message = format!("{err:#}");
			tracing::error!(actor = %name, error = %message, "actor setup failed");
			self.shared.state.advance(ActorState::Failed);
			self.report(ActorState::Failed);
			self.close_inbox();
			self.shared.record(ActorExit::new(ActorExitKind::SetupFailed, Some(message)));
			self.shared.finish();
			tracing::debug!(actor = %name, "actor stopped");
			return;
		}

		self.shared.state.advance(ActorState::Running);
		self.report(ActorState::Running);
		tracing::debug!(actor = %name, "actor running");

		let exit = self.multiplex(&ctx).await;
		self.close_inbox();
		if exit.is_failure() {
			tracing::error!(actor = %name, reason = exit.kind().as_str(), error = exit.message().unwrap_or_default(), "actor failed");
			self.shared.state.advance(ActorState::Failed);
		} else {
			tracing::trace!(actor = %name, reason = exit.kind().as_str(), "actor stopping");
			self.shared.state.advance(ActorState::Stopping);
		}

		self.shared.record(exit);
		self.actor.after_loop(&ctx).await;
		self.shared.finish();
		tracing::debug!(actor = %name, "actor stopped");
	}

	async fn multiplex(&mut self, ctx: &ActorContext) -> ActorExit {
		let mut driver = Driver::new(self.discipline);
		loop {
			let outcome = match driver.next_step(&self.rx).await {
				Step::Closed => {
					tracing::debug!(actor = %self.shared.name, "actor inbox closed");
					return ActorExit::new(ActorExitKind::InboxClosed, None);
				}
				Step::Command(msg) if msg.kind().is_shutdown() => {
					tracing::trace!(actor = %self.shared.name, from = msg.origin().map(Origin::as_str), "SHUTDOWN received");
					return ActorExit::new(ActorExitKind::ShutdownRequested, None);
				}
				Step::Command(msg) => {
					tracing::trace!(actor = %self.shared.name, command = %msg.kind(), "command received");
					let result = self.actor.handle(msg, ctx).await;
					self.shared.commands_handled.fetch_add(1, Ordering::Relaxed);
					result.map_err(|err| (ActorExitKind::CommandFailed, err))
				}
				Step::Work => {
					let result = self.actor.run_once(ctx).await;
					self.shared.loop_iterations.fetch_add(1, Ordering::Relaxed);
					if matches!(driver, Driver::PriorityDrain) {
						tokio::task::yield_now().await;
					}
					result.map_err(|err| (ActorExitKind::LoopFailed, err))
				}
			};

			match outcome {
				Ok(Flow::Continue) => {}
				Ok(Flow::Stop) => return ActorExit::new(ActorExitKind::Stopped, None),
				Err((kind, err)) => return ActorExit::new(kind, Some(format!("{err:#}"))),
			}
		}
	}

	fn report(&mut self, state: ActorState) {
		if let Some(ready) = self.ready.take() {
			// Nobody listens unless the handshake form of startup was used.
			let _ = ready.send(state);
		}
	}

	fn close_inbox(&self) {
		let discarded = self.rx.close_and_drain();
		if discarded > 0 {
			tracing::debug!(actor = %self.shared.name, discarded, "discarded queued commands");
		}
	}
}
