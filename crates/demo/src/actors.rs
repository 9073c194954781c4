//! Sample actors.

use std::time::Duration;

use async_trait::async_trait;
use keel_worker::{Actor, ActorContext, Flow, Message};

/// Command code that asks [`Counter`] to log its tally.
pub const CMD_REPORT: u32 = 2;
/// Command code that resets [`Counter`].
pub const CMD_RESET: u32 = 3;
/// Command code that makes [`Counter`] fail on purpose.
pub const CMD_FAIL: u32 = 4;

/// Periodic actor: every work unit naps briefly and bumps a counter.
pub struct Counter {
	nap: Duration,
	count: u64,
}

impl Counter {
	pub fn new(nap: Duration) -> Self {
		Self { nap, count: 0 }
	}
}

#[async_trait]
impl Actor for Counter {
	type Data = String;

	async fn pre_loop(&mut self, ctx: &ActorContext) -> anyhow::Result<()> {
		tracing::info!(actor = ctx.name(), nap = ?self.nap, "counter ready");
		Ok(())
	}

	async fn run_once(&mut self, _ctx: &ActorContext) -> anyhow::Result<Flow> {
		tokio::time::sleep(self.nap).await;
		self.count += 1;
		Ok(Flow::Continue)
	}

	async fn after_loop(&mut self, ctx: &ActorContext) {
		tracing::info!(actor = ctx.name(), count = self.count, "counter done");
	}

	async fn handle(&mut self, msg: Message<String>, ctx: &ActorContext) -> anyhow::Result<Flow> {
		let from = msg.origin().map(|origin| origin.as_str().to_string());
		match msg.kind().0 {
			CMD_REPORT => {
				tracing::info!(actor = ctx.name(), ?from, count = self.count, note = msg.data().map(String::as_str), "report");
			}
			CMD_RESET => self.count = 0,
			CMD_FAIL => anyhow::bail!("failure requested by {}", from.as_deref().unwrap_or("anonymous")),
			other => tracing::debug!(actor = ctx.name(), command = other, "ignoring unknown command"),
		}
		Ok(Flow::Continue)
	}
}

/// Actor whose setup always fails; exercises the failure path.
pub struct Unopenable {
	pub resource: String,
}

#[async_trait]
impl Actor for Unopenable {
	type Data = ();

	async fn pre_loop(&mut self, _ctx: &ActorContext) -> anyhow::Result<()> {
		anyhow::bail!("cannot open {}", self.resource)
	}

	async fn handle(&mut self, _msg: Message<()>, _ctx: &ActorContext) -> anyhow::Result<Flow> {
		Ok(Flow::Continue)
	}
}
