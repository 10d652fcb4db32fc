//! Per-wait producer runtime.

use std::io;

use tokio::runtime::{Builder, Runtime};

const THREAD_NAME: &str = "tarry-producer";

/// Build the runtime one wait drives its producer on.
///
/// Each wait owns a fresh runtime; shutting it down at release drops every task
/// the producer spawned, so nothing outlives the wait that started it.
pub(crate) fn producer_runtime(worker_threads: usize) -> io::Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(worker_threads.max(1))
        .thread_name(THREAD_NAME)
        .enable_all()
        .build()
}
