//! Provides the ability to run the engine's server as a [`Child`] process.

use std::{fs, io, path::PathBuf, process::ExitStatus, process::Stdio, time::Duration};

use anyhow::Context;
use scale_tunnel_core::prelude::HarnessError;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::{Child, Command},
    time::{sleep, timeout, Instant},
};

use crate::engine::EngineConfig;
use crate::types::HarnessResult;

const INITIAL_READY_BACKOFF: Duration = Duration::from_millis(10);
const MAX_READY_BACKOFF: Duration = Duration::from_millis(500);

/// Holds the [`Child`] process running the server.
///
/// The process is killed if this is dropped without a graceful shutdown, so no server outlives
/// the harness, whichever way the run ends.
#[derive(Debug)]
pub struct ServerProcess {
    handle: Child,

    /// The socket the server listens on, which only exists once it is ready.
    socket_path: PathBuf,
}

impl ServerProcess {
    /// Start the server and wait until it is ready to accept clients.
    ///
    /// The server counts as ready once its socket exists. It is polled with exponential backoff
    /// until the configured ready timeout passes.
    pub async fn start(config: &EngineConfig) -> HarnessResult<Self> {
        let socket_path = config.socket_path().to_path_buf();
        if socket_path.exists() {
            log::debug!(
                "Removing leftover server socket '{}'",
                socket_path.display()
            );
            remove_if_exists(&socket_path)?;
        }

        log::info!("Starting the server '{}'", config.server_bin().display());
        let mut handle = Command::new(config.server_bin())
            .args(config.server_args())
            .current_dir(config.engine_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HarnessError::process_launch("server", e))?;

        if let Some(stdout) = handle.stdout.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    log::debug!(target: "engine_server", "{line}");
                }
            });
        }

        let mut server = Self {
            handle,
            socket_path,
        };
        server.wait_until_ready(config.ready_timeout()).await?;

        Ok(server)
    }

    async fn wait_until_ready(&mut self, ready_timeout: Duration) -> HarnessResult<()> {
        log::trace!("Waiting for the server to start");
        let deadline = Instant::now() + ready_timeout;
        let mut backoff = INITIAL_READY_BACKOFF;

        loop {
            if let Some(status) = self
                .handle
                .try_wait()
                .context("Failed to check the status of the server process")?
            {
                return Err(HarnessError::process_launch(
                    "server",
                    format!("exited with {status} before it was ready"),
                )
                .into());
            }

            if self.socket_path.exists() {
                log::info!("Server ready");
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(HarnessError::process_launch(
                    "server",
                    format!(
                        "no socket at '{}' after {ready_timeout:?}",
                        self.socket_path.display()
                    ),
                )
                .into());
            }

            sleep(backoff.min(deadline - now)).await;
            backoff = (backoff * 2).min(MAX_READY_BACKOFF);
        }
    }

    /// The OS process id, if the server is still running.
    pub fn id(&self) -> Option<u32> {
        self.handle.id()
    }

    /// Wait for the server to exit, giving up after `limit`.
    ///
    /// Returns [`None`] if the server is still running after `limit`.
    pub async fn wait_with_timeout(&mut self, limit: Duration) -> HarnessResult<Option<ExitStatus>> {
        match timeout(limit, self.handle.wait()).await {
            Ok(status) => Ok(Some(
                status.context("Failed to wait for the server process to exit")?,
            )),
            Err(_) => Ok(None),
        }
    }

    /// Kill the server and wait for it to exit.
    pub async fn terminate(&mut self) -> HarnessResult<()> {
        log::warn!("Killing the server");
        self.handle
            .kill()
            .await
            .context("Failed to kill the server process")
    }

    /// Remove the socket of a server that has exited, so that the next start cannot mistake it
    /// for a ready server.
    pub fn remove_stale_socket(&self) -> HarnessResult<()> {
        remove_if_exists(&self.socket_path)
    }
}

fn remove_if_exists(path: &std::path::Path) -> HarnessResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove '{}'", path.display())),
    }
}
