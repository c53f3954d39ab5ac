use crate::executor::Executor;
use scale_tunnel_core::prelude::ShutdownHandle;
use tokio::signal;

/// Forward Ctrl-C to the shutdown handle so that a blocked wait on a child process is cancelled.
pub(crate) fn start_shutdown_listener(executor: &Executor, handle: ShutdownHandle) {
    executor.spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                println!("Received shutdown signal, shutting down...");
                handle.shutdown();
            }
            Err(e) => log::error!("Failed to listen for Ctrl-C: {e}"),
        }
    });
}
