use std::future::Future;

use anyhow::Context;
use scale_tunnel_core::prelude::{ShutdownHandle, ShutdownSignalError};

use crate::types::HarnessResult;

/// Drives the async process management from the single benchmark thread.
///
/// Uses a current thread runtime, so nothing runs in parallel with the benchmark loop. Spawned
/// tasks only make progress while [Executor::execute_in_place] is blocking.
#[derive(Debug)]
pub struct Executor {
    runtime: tokio::runtime::Runtime,
    shutdown_handle: ShutdownHandle,
}

impl Executor {
    pub fn current_thread(shutdown_handle: ShutdownHandle) -> HarnessResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create Tokio runtime")?;

        Ok(Self {
            runtime,
            shutdown_handle,
        })
    }

    pub fn shutdown_handle(&self) -> &ShutdownHandle {
        &self.shutdown_handle
    }

    /// Run async code in place, blocking until it completes.
    ///
    /// The future is cancelled if a shutdown signal arrives while it runs, in which case a
    /// [ShutdownSignalError] is returned.
    pub fn execute_in_place<T>(
        &self,
        fut: impl Future<Output = HarnessResult<T>>,
    ) -> HarnessResult<T> {
        let mut shutdown_listener = self.shutdown_handle.new_listener();
        self.runtime.block_on(async move {
            tokio::select! {
                result = fut => result,
                _ = shutdown_listener.wait_for_shutdown() => {
                    Err(anyhow::anyhow!(ShutdownSignalError::default()))
                },
            }
        })
    }

    /// Submit async code to run in the background while the benchmark thread is blocked in
    /// [Executor::execute_in_place].
    pub fn spawn(&self, fut: impl Future<Output = ()> + Send + 'static) {
        self.runtime.spawn(fut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn returns_the_future_output() {
        let executor = Executor::current_thread(ShutdownHandle::default()).unwrap();
        let value = executor.execute_in_place(async { Ok(42) }).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn shutdown_cancels_a_pending_future() {
        let handle = ShutdownHandle::default();
        let executor = Executor::current_thread(handle.clone()).unwrap();

        let result = executor.execute_in_place(async move {
            handle.shutdown();
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        });

        let err = result.unwrap_err();
        assert!(err.is::<ShutdownSignalError>());
    }
}
