use std::fs;
use std::io;
use std::sync::Arc;

use scale_tunnel_core::prelude::HarnessError;
use tokio::time::{timeout_at, Instant};

use crate::client::send_command;
use crate::engine::EngineConfig;
use crate::executor::Executor;
use crate::server::ServerProcess;
use crate::types::HarnessResult;

/// Controls the server process and the state it persists between runs.
pub trait ProcessOrchestrator {
    /// Delete the persisted-state file so that the next server starts empty.
    ///
    /// A missing file counts as deleted.
    fn reset_state(&mut self) -> HarnessResult<()>;

    /// Start the server, returning once it is ready for clients.
    fn start(&mut self) -> HarnessResult<()>;

    /// Ask the server to persist its state and exit, and wait for it to do so.
    fn stop(&mut self) -> HarnessResult<()>;

    fn is_running(&self) -> bool;

    /// Restart the server from its persisted state.
    fn restart(&mut self) -> HarnessResult<()> {
        self.stop()?;
        self.start()
    }
}

/// Orchestrates the engine's server binary.
///
/// Owns the running [ServerProcess], if any, so the server is killed when this is dropped.
#[derive(Debug)]
pub struct EngineOrchestrator {
    config: Arc<EngineConfig>,
    executor: Arc<Executor>,
    server: Option<ServerProcess>,
}

impl EngineOrchestrator {
    pub fn new(config: Arc<EngineConfig>, executor: Arc<Executor>) -> Self {
        Self {
            config,
            executor,
            server: None,
        }
    }

    pub fn server_id(&self) -> Option<u32> {
        self.server.as_ref().and_then(ServerProcess::id)
    }
}

impl ProcessOrchestrator for EngineOrchestrator {
    fn reset_state(&mut self) -> HarnessResult<()> {
        let state_path = self.config.state_path();
        if self.server.is_some() {
            log::warn!(
                "Deleting '{}' while the server is running, it may write it again",
                state_path.display()
            );
        }

        match fs::remove_file(state_path) {
            Ok(()) => {
                log::info!("Deleted persisted state '{}'", state_path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No persisted state at '{}'", state_path.display());
                Ok(())
            }
            Err(e) => Err(HarnessError::stale_state(state_path, e).into()),
        }
    }

    fn start(&mut self) -> HarnessResult<()> {
        if self.server.is_some() {
            log::warn!("Server is already running, not starting another");
            return Ok(());
        }

        let server = self
            .executor
            .execute_in_place(ServerProcess::start(&self.config))?;
        self.server = Some(server);
        Ok(())
    }

    fn stop(&mut self) -> HarnessResult<()> {
        let Some(mut server) = self.server.take() else {
            log::debug!("Server is not running, nothing to stop");
            return Ok(());
        };

        let config = &self.config;
        self.executor.execute_in_place(async move {
            log::info!("Stopping the server");
            // The stop timeout covers both the client sending the token and the server exiting.
            let deadline = Instant::now() + config.stop_timeout();
            match timeout_at(deadline, send_command(config, config.shutdown_token())).await {
                Ok(sent) => sent?,
                // Dropping the unfinished command kills its client.
                Err(_) => log::warn!(
                    "Client sending '{}' did not exit within {:?}, killing it",
                    config.shutdown_token(),
                    config.stop_timeout()
                ),
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            match server.wait_with_timeout(remaining).await? {
                Some(status) => log::debug!("Server exited with {status}"),
                None => {
                    log::warn!(
                        "Server did not exit within {:?} of '{}'",
                        config.stop_timeout(),
                        config.shutdown_token()
                    );
                    server.terminate().await?;
                }
            }

            server.remove_stale_socket()
        })
    }

    fn is_running(&self) -> bool {
        self.server.is_some()
    }
}
