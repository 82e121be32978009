use std::future::Future;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::error::AdError;
use crate::types::AdResult;

/// Tokio runtime manager
///
/// Owns the background runtime that stands in for the threads a native SDK completes on.
/// The runtime is destroyed when the last clone is dropped.
#[derive(Clone, Debug)]
pub struct RuntimeManager {
    runtime: Arc<Runtime>,
}

impl RuntimeManager {
    /// Create a new runtime
    /// threads == 0: default worker count (CPU cores)
    /// threads > 0: exactly that many worker threads
    ///
    /// Always multi-threaded: spawned completions must make progress while no one blocks on
    /// the runtime.
    pub fn new(threads: usize) -> Result<Self, AdError> {
        let mut builder = Builder::new_multi_thread();
        if threads > 0 {
            builder.worker_threads(threads);
        }
        let runtime = builder
            .thread_name("ads-completion")
            .enable_all()
            .build()
            .map_err(|e| {
                AdError::with_message(AdResult::InternalError, format!("Failed to create Tokio runtime: {e}"))
            })?;
        tracing::debug!(threads, "completion runtime started");
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }

    /// Spawn a future on the runtime; callable from any thread
    pub fn spawn<F>(&self, future: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime.spawn(future)
    }
}
