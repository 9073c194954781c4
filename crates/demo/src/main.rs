//! keel demo binary.
//!
//! Starts a periodic counter actor next to an actor whose setup fails, drives
//! the counter with a few commands, then shuts both down through the
//! barriers and prints how each one ended.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use keel_worker::{ActorHandle, ActorSpec, Discipline, Lifecycle, Origin, wait_for_shutdown_all_timeout, wait_for_startup_all_timeout};
use tracing::info;

mod actors;

use actors::{CMD_FAIL, CMD_REPORT, Counter, Unopenable};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
	PriorityDrain,
	Ticked,
	InboxOnly,
}

/// Demo command line arguments.
#[derive(Parser, Debug)]
#[command(name = "keel-demo")]
#[command(about = "Run sample keel actors and watch their lifecycle")]
struct Args {
	/// Run-loop discipline for the counter actor
	#[arg(short, long, value_enum, default_value_t = Mode::Ticked)]
	discipline: Mode,

	/// Tick period for the ticked discipline, in milliseconds
	#[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
	tick_ms: u64,

	/// Nap taken by every counter work unit, in milliseconds
	#[arg(long, default_value_t = 50)]
	nap_ms: u64,

	/// How long to let the counter run, in milliseconds
	#[arg(long, default_value_t = 2000)]
	run_for_ms: u64,

	/// Counter inbox capacity
	#[arg(long, default_value_t = keel_worker::DEFAULT_INBOX_CAPACITY, value_parser = parse_capacity)]
	capacity: usize,

	/// Make the counter fail before shutdown
	#[arg(long)]
	fail: bool,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

impl Args {
	fn discipline(&self) -> Discipline {
		match self.discipline {
			Mode::PriorityDrain => Discipline::PriorityDrain,
			Mode::Ticked => Discipline::Ticked {
				period: Duration::from_millis(self.tick_ms),
			},
			Mode::InboxOnly => Discipline::InboxOnly,
		}
	}
}

fn parse_capacity(raw: &str) -> Result<usize, String> {
	let capacity: usize = raw.parse().map_err(|err| format!("{err}"))?;
	if (1..=keel_worker::MAX_INBOX_CAPACITY).contains(&capacity) {
		Ok(capacity)
	} else {
		Err(format!("capacity must be within 1..={}", keel_worker::MAX_INBOX_CAPACITY))
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let counter = ActorHandle::new(
		ActorSpec::new("counter", Counter::new(Duration::from_millis(args.nap_ms)))
			.discipline(args.discipline())
			.inbox_capacity(args.capacity),
	);
	let unopenable = ActorHandle::new(ActorSpec::new("unopenable", Unopenable {
		resource: "/dev/keel0".to_string(),
	}));
	let demo = Origin::new("keel-demo");

	counter.start().await?;
	unopenable.startup();

	let all: [&dyn Lifecycle; 2] = [&counter, &unopenable];
	if !wait_for_startup_all_timeout(&all, STARTUP_TIMEOUT).await {
		anyhow::bail!("actors still initializing after {STARTUP_TIMEOUT:?}");
	}
	for actor in all {
		info!(actor = actor.name(), state = %actor.state(), "past initialization");
	}

	counter.send_with(CMD_REPORT, Some(demo.clone()), "first".to_string()).await?;
	tokio::time::sleep(Duration::from_millis(args.run_for_ms)).await;
	counter.send_with(CMD_REPORT, Some(demo.clone()), "last".to_string()).await?;
	if args.fail {
		counter.send_from(CMD_FAIL, demo).await?;
	}

	counter.stop().await;
	if !wait_for_shutdown_all_timeout(&all, SHUTDOWN_TIMEOUT).await {
		anyhow::bail!("actors still alive after {SHUTDOWN_TIMEOUT:?}");
	}

	let stats = counter.stats();
	info!(
		loop_iterations = stats.loop_iterations,
		commands_handled = stats.commands_handled,
		"counter stats"
	);
	for (name, exit, history) in [
		(counter.name(), counter.exit(), counter.history()),
		(unopenable.name(), unopenable.exit(), unopenable.history()),
	] {
		let path: Vec<_> = history.iter().map(|state| state.as_str()).collect();
		match exit {
			Some(exit) => info!(
				actor = name,
				reason = exit.kind().as_str(),
				failed = exit.is_failure(),
				error = exit.message().unwrap_or_default(),
				path = %path.join(" -> "),
				"actor ended"
			),
			None => info!(actor = name, path = %path.join(" -> "), "actor has no exit record"),
		}
	}

	Ok(())
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("keel_worker=trace,keel_demo=debug")
		} else {
			EnvFilter::new("keel_worker=info,keel_demo=info")
		}
	});

	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_target(true))
		.init();
}
