//! Startup/shutdown barriers.
//!
//! Every barrier polls [`Lifecycle::state`] once per [`POLL_INTERVAL`]. A
//! timed-out barrier only gives up waiting; the polled actors keep running.

use std::sync::Arc;
use std::time::Duration;

use crate::state::ActorState;

/// Poll period of every barrier.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Anything whose lifecycle state can be observed by a barrier.
pub trait Lifecycle: Send + Sync {
	fn name(&self) -> &str;
	fn state(&self) -> ActorState;
}

impl<T> Lifecycle for Arc<T>
where
	T: Lifecycle + ?Sized,
{
	fn name(&self) -> &str {
		(**self).name()
	}

	fn state(&self) -> ActorState {
		(**self).state()
	}
}

fn started(state: ActorState) -> bool {
	state != ActorState::Initializing
}

fn stopped(state: ActorState) -> bool {
	state == ActorState::Stopped
}

async fn poll_until(actors: &[&dyn Lifecycle], reached: fn(ActorState) -> bool) {
	while !actors.iter().all(|actor| reached(actor.state())) {
		tokio::time::sleep(POLL_INTERVAL).await;
	}
}

async fn poll_until_timeout(actors: &[&dyn Lifecycle], reached: fn(ActorState) -> bool, timeout: Duration, barrier: &'static str) -> bool {
	if tokio::time::timeout(timeout, poll_until(actors, reached)).await.is_ok() {
		return true;
	}
	let pending: Vec<&str> = actors.iter().filter(|actor| !reached(actor.state())).map(|actor| actor.name()).collect();
	tracing::debug!(barrier, ?timeout, ?pending, "barrier timed out");
	false
}

/// Waits until `actor` has left `INITIALIZING`. Always returns `true`.
pub async fn wait_for_startup(actor: &dyn Lifecycle) -> bool {
	wait_for_startup_all(&[actor]).await
}

/// Waits until `actor` has left `INITIALIZING`; `false` if `timeout` elapses first.
pub async fn wait_for_startup_timeout(actor: &dyn Lifecycle, timeout: Duration) -> bool {
	wait_for_startup_all_timeout(&[actor], timeout).await
}

/// Waits until none of `actors` is `INITIALIZING`. Always returns `true`.
pub async fn wait_for_startup_all(actors: &[&dyn Lifecycle]) -> bool {
	poll_until(actors, started).await;
	true
}

/// Waits until none of `actors` is `INITIALIZING`; `false` if `timeout`
/// elapses with at least one still initializing.
pub async fn wait_for_startup_all_timeout(actors: &[&dyn Lifecycle], timeout: Duration) -> bool {
	poll_until_timeout(actors, started, timeout, "startup").await
}

/// Waits until `actor` is `STOPPED`. Always returns `true`.
pub async fn wait_for_shutdown(actor: &dyn Lifecycle) -> bool {
	wait_for_shutdown_all(&[actor]).await
}

/// Waits until `actor` is `STOPPED`; `false` if `timeout` elapses first.
pub async fn wait_for_shutdown_timeout(actor: &dyn Lifecycle, timeout: Duration) -> bool {
	wait_for_shutdown_all_timeout(&[actor], timeout).await
}

/// Waits until every one of `actors` is `STOPPED`. Always returns `true`.
pub async fn wait_for_shutdown_all(actors: &[&dyn Lifecycle]) -> bool {
	poll_until(actors, stopped).await;
	true
}

/// Waits until every one of `actors` is `STOPPED`; `false` if `timeout`
/// elapses with at least one still alive.
pub async fn wait_for_shutdown_all_timeout(actors: &[&dyn Lifecycle], timeout: Duration) -> bool {
	poll_until_timeout(actors, stopped, timeout, "shutdown").await
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
	use std::sync::atomic::{AtomicU8, Ordering};
	use std::time::Instant;

	use super::*;

	struct Probe {
		name: &'static str,
		state: AtomicU8,
	}

	impl Probe {
		fn new(name: &'static str, state: ActorState) -> Arc<Self> {
			Arc::new(Self {
				name,
				state: AtomicU8::new(state.ordinal()),
			})
		}

		fn set(&self, state: ActorState) {
			self.state.store(state.ordinal(), Ordering::Release);
		}
	}

	impl Lifecycle for Probe {
		fn name(&self) -> &str {
			self.name
		}

		fn state(&self) -> ActorState {
			ActorState::from_ordinal(self.state.load(Ordering::Acquire)).unwrap()
		}
	}

	#[tokio::test]
	async fn startup_returns_once_state_leaves_initializing() {
		let probe = Probe::new("a", ActorState::Initializing);
		let flip = Arc::clone(&probe);
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(30)).await;
			flip.set(ActorState::Failed);
		});

		assert!(wait_for_startup_timeout(&probe, Duration::from_secs(2)).await);
		assert_eq!(probe.state(), ActorState::Failed);
	}

	#[tokio::test]
	async fn startup_timeout_leaves_actor_untouched() {
		let probe = Probe::new("slow", ActorState::Initializing);
		let began = Instant::now();
		assert!(!wait_for_startup_timeout(&probe, Duration::from_millis(50)).await);
		assert!(began.elapsed() >= Duration::from_millis(50));
		assert_eq!(probe.state(), ActorState::Initializing);
	}

	#[tokio::test]
	async fn startup_all_waits_for_every_actor() {
		let a = Probe::new("a", ActorState::Running);
		let b = Probe::new("b", ActorState::Initializing);
		let actors: [&dyn Lifecycle; 2] = [&a, &b];

		assert!(!wait_for_startup_all_timeout(&actors, Duration::from_millis(40)).await);
		b.set(ActorState::Running);
		assert!(wait_for_startup_all_timeout(&actors, Duration::from_millis(200)).await);
		assert!(wait_for_startup_all(&actors).await);
	}

	#[tokio::test]
	async fn shutdown_all_requires_every_actor_stopped() {
		let a = Probe::new("a", ActorState::Stopped);
		let b = Probe::new("b", ActorState::Stopping);
		let actors: [&dyn Lifecycle; 2] = [&a, &b];

		// One stopped actor is not enough.
		assert!(!wait_for_shutdown_all_timeout(&actors, Duration::from_millis(40)).await);

		let flip = Arc::clone(&b);
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(20)).await;
			flip.set(ActorState::Stopped);
		});
		assert!(wait_for_shutdown_all_timeout(&actors, Duration::from_secs(2)).await);
	}

	#[tokio::test]
	async fn empty_set_is_trivially_reached() {
		assert!(wait_for_startup_all_timeout(&[], Duration::ZERO).await);
		assert!(wait_for_shutdown_all(&[]).await);
	}

	#[tokio::test]
	async fn already_reached_state_wins_over_zero_timeout() {
		let probe = Probe::new("done", ActorState::Stopped);
		assert!(wait_for_shutdown_timeout(&probe, Duration::ZERO).await);
		assert!(wait_for_shutdown(&probe).await);
	}
}
