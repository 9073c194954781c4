use std::future::Future;
use std::sync::OnceLock;

use tokio::task::{JoinError, JoinHandle};

fn runtime_handle() -> tokio::runtime::Handle {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return handle;
	}

	static GLOBAL_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
	let runtime = GLOBAL_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(2)
			.thread_name("keel-worker-global")
			.build()
			.expect("failed to build keel-worker global tokio runtime")
	});
	runtime.handle().clone()
}

/// Spawns an async task on the ambient runtime, or on a lazily built global
/// runtime when called outside of one.
pub fn spawn<F>(actor: &str, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(actor, "worker.spawn");
	runtime_handle().spawn(fut)
}

/// Extracts the panic payload text from a failed join, if it was a panic.
pub(crate) fn join_error_panic_message(err: JoinError) -> Option<String> {
	if !err.is_panic() {
		return None;
	}
	let payload = err.into_panic();
	let msg = if let Some(s) = payload.downcast_ref::<&'static str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"non-string panic payload".to_string()
	};
	Some(msg)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
#[path = "panic_tests.rs"]
mod panic_tests;
