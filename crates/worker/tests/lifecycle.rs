//! End-to-end lifecycle scenarios driven only through the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use keel_worker::{
	Actor, ActorContext, ActorExitKind, ActorHandle, ActorSpec, ActorState, Discipline, Flow, Lifecycle, Message, wait_for_shutdown_all_timeout,
	wait_for_startup_all, wait_for_startup_all_timeout,
};
use pretty_assertions::assert_eq;

/// Periodic actor whose work unit sleeps briefly.
struct Heartbeat {
	beats: Arc<AtomicU64>,
	commands: Arc<AtomicU64>,
	cleaned_up: Arc<AtomicBool>,
}

#[async_trait]
impl Actor for Heartbeat {
	type Data = ();

	async fn run_once(&mut self, _ctx: &ActorContext) -> anyhow::Result<Flow> {
		tokio::time::sleep(Duration::from_millis(50)).await;
		self.beats.fetch_add(1, Ordering::SeqCst);
		Ok(Flow::Continue)
	}

	async fn after_loop(&mut self, _ctx: &ActorContext) {
		self.cleaned_up.store(true, Ordering::SeqCst);
	}

	async fn handle(&mut self, _msg: Message<()>, _ctx: &ActorContext) -> anyhow::Result<Flow> {
		self.commands.fetch_add(1, Ordering::SeqCst);
		Ok(Flow::Continue)
	}
}

/// Actor whose setup always fails.
struct Unopenable {
	cleaned_up: Arc<AtomicBool>,
}

#[async_trait]
impl Actor for Unopenable {
	type Data = ();

	async fn pre_loop(&mut self, _ctx: &ActorContext) -> anyhow::Result<()> {
		anyhow::bail!("device unavailable")
	}

	async fn after_loop(&mut self, _ctx: &ActorContext) {
		self.cleaned_up.store(true, Ordering::SeqCst);
	}

	async fn handle(&mut self, _msg: Message<()>, _ctx: &ActorContext) -> anyhow::Result<Flow> {
		Ok(Flow::Continue)
	}
}

fn heartbeat(name: &str, discipline: Discipline) -> (ActorHandle<Heartbeat>, Arc<AtomicU64>, Arc<AtomicU64>, Arc<AtomicBool>) {
	let beats = Arc::new(AtomicU64::new(0));
	let commands = Arc::new(AtomicU64::new(0));
	let cleaned_up = Arc::new(AtomicBool::new(false));
	let actor = Heartbeat {
		beats: Arc::clone(&beats),
		commands: Arc::clone(&commands),
		cleaned_up: Arc::clone(&cleaned_up),
	};
	(ActorHandle::new(ActorSpec::new(name, actor).discipline(discipline)), beats, commands, cleaned_up)
}

#[tokio::test]
async fn periodic_actor_runs_until_shutdown() {
	let (actor, beats, commands, cleaned_up) = heartbeat("heartbeat", Discipline::PriorityDrain);

	actor.startup();
	assert!(actor.wait_for_startup().await);
	assert_eq!(actor.state(), ActorState::Running);

	actor.send(2).await.expect("inbox open");
	tokio::time::sleep(Duration::from_secs(2)).await;
	actor.shutdown().await;

	assert!(actor.wait_for_shutdown().await);
	assert_eq!(actor.state(), ActorState::Stopped);
	assert!(beats.load(Ordering::SeqCst) > 0);
	assert_eq!(actor.stats().loop_iterations, beats.load(Ordering::SeqCst));
	assert_eq!(commands.load(Ordering::SeqCst), 1);
	assert!(cleaned_up.load(Ordering::SeqCst));
	assert_eq!(actor.exit().map(|e| e.kind()), Some(ActorExitKind::ShutdownRequested));
}

#[tokio::test]
async fn failed_setup_never_reaches_running() {
	let cleaned_up = Arc::new(AtomicBool::new(false));
	let actor = ActorHandle::new(ActorSpec::new("unopenable", Unopenable {
		cleaned_up: Arc::clone(&cleaned_up),
	}));

	actor.startup();
	assert!(actor.wait_for_startup().await);
	assert!(actor.wait_for_shutdown_timeout(Duration::from_secs(2)).await);

	assert_eq!(actor.state(), ActorState::Stopped);
	assert!(!actor.history().contains(&ActorState::Running));
	assert!(!cleaned_up.load(Ordering::SeqCst));
	let exit = actor.exit().expect("exit recorded");
	assert!(exit.is_failure());
	assert_eq!(exit.message(), Some("device unavailable"));
}

#[tokio::test]
async fn aggregate_barriers_cover_mixed_actor_types() {
	let (first, _, _, _) = heartbeat("first", Discipline::ticked());
	let (second, _, _, _) = heartbeat("second", Discipline::InboxOnly);
	let broken = ActorHandle::new(ActorSpec::new("broken", Unopenable {
		cleaned_up: Arc::new(AtomicBool::new(false)),
	}));
	let all: [&dyn Lifecycle; 3] = [&first, &second, &broken];

	// Nothing started yet.
	assert!(!wait_for_startup_all_timeout(&all, Duration::from_millis(50)).await);

	first.startup();
	second.startup();
	broken.startup();
	assert!(wait_for_startup_all(&all).await);
	assert!(wait_for_startup_all_timeout(&all, Duration::from_secs(1)).await);

	// Two are still running.
	assert!(!wait_for_shutdown_all_timeout(&all, Duration::from_millis(50)).await);
	assert_eq!(first.state(), ActorState::Running);

	first.shutdown().await;
	second.shutdown().await;
	assert!(wait_for_shutdown_all_timeout(&all, Duration::from_secs(2)).await);
	assert!(all.iter().all(|actor| actor.state() == ActorState::Stopped));
}

#[test]
fn startup_from_synchronous_code() {
	let (actor, beats, _, _) = heartbeat("sync", Discipline::ticked());
	actor.startup();

	let observer = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
	assert!(observer.block_on(actor.wait_for_startup_timeout(Duration::from_secs(2))));
	// `Sleep` registers with the reactor on construction, so build it inside the runtime.
	observer.block_on(async { tokio::time::sleep(Duration::from_millis(200)).await });

	let exit = observer.block_on(actor.stop()).expect("exit recorded");
	assert_eq!(exit.kind(), ActorExitKind::ShutdownRequested);
	assert!(beats.load(Ordering::SeqCst) > 0);
}
