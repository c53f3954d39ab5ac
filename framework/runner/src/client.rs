use std::fs::File;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::Context;
use scale_tunnel_core::prelude::HarnessError;
use scale_tunnel_summary_model::{ClientInvocation, WorkloadScale};
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};
use tokio::time::timeout;

use crate::engine::EngineConfig;
use crate::executor::Executor;
use crate::types::HarnessResult;

/// Runs one workload against the running server.
pub trait ClientInvoker {
    /// Run the workload of `scale` to completion.
    ///
    /// An unsuccessful client is not an error, it is reported through the returned
    /// [ClientInvocation]. Errors are reserved for failing to run the client at all.
    fn run(&mut self, scale: &WorkloadScale) -> HarnessResult<ClientInvocation>;
}

/// Invokes the engine's client binary.
#[derive(Debug, Clone)]
pub struct EngineClient {
    config: Arc<EngineConfig>,
    executor: Arc<Executor>,
}

impl EngineClient {
    pub fn new(config: Arc<EngineConfig>, executor: Arc<Executor>) -> Self {
        Self { config, executor }
    }
}

impl ClientInvoker for EngineClient {
    fn run(&mut self, scale: &WorkloadScale) -> HarnessResult<ClientInvocation> {
        self.executor
            .execute_in_place(run_workload(&self.config, scale.workload_path()))
    }
}

/// Stream the workload file into a new client's stdin, with its stdout redirected to the sink
/// file, and wait for the client to exit.
///
/// The sink file is truncated first, so it only ever holds the output of the latest client.
pub async fn run_workload(config: &EngineConfig, workload: &Path) -> HarnessResult<ClientInvocation> {
    let workload_path = config.workload_path(workload);
    let mut workload_file = tokio::fs::File::open(&workload_path)
        .await
        .with_context(|| format!("Failed to open workload '{}'", workload_path.display()))?;

    let sink = File::create(config.sink_path()).with_context(|| {
        format!(
            "Failed to create the sink file '{}'",
            config.sink_path().display()
        )
    })?;

    log::trace!("Running client with workload '{}'", workload_path.display());
    let mut child = Command::new(config.client_bin())
        .args(config.client_args())
        .current_dir(config.engine_dir())
        .stdin(Stdio::piped())
        .stdout(Stdio::from(sink))
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| HarnessError::process_launch("client", e))?;
    let stdin = child
        .stdin
        .take()
        .context("Failed to get stdin for the client")?;

    let exchange = async {
        feed(&mut workload_file, stdin).await?;
        child
            .wait()
            .await
            .context("Failed to wait for the client to exit")
    };

    let status = match config.client_timeout() {
        Some(limit) => match timeout(limit, exchange).await {
            Ok(status) => status?,
            Err(_) => {
                log::warn!(
                    "Client running '{}' did not finish within {limit:?}, killing it",
                    workload_path.display()
                );
                // Dropping the child kills it.
                return Ok(ClientInvocation {
                    exit_code: None,
                    bytes_written: sink_len(config)?,
                    timed_out: true,
                });
            }
        },
        None => exchange.await?,
    };

    Ok(ClientInvocation {
        exit_code: status.code(),
        bytes_written: sink_len(config)?,
        timed_out: false,
    })
}

/// Send a single command line to the server through a short lived client.
pub async fn send_command(config: &EngineConfig, command: &str) -> HarnessResult<()> {
    log::trace!("Sending '{command}' to the server");
    let mut child = Command::new(config.client_bin())
        .args(config.client_args())
        .current_dir(config.engine_dir())
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| HarnessError::process_launch("client", e))?;
    let mut stdin = child
        .stdin
        .take()
        .context("Failed to get stdin for the client")?;

    let line = format!("{command}\n");
    if let Err(e) = stdin.write_all(line.as_bytes()).await {
        log::debug!("Client stopped reading before the command was written: {e}");
    }
    drop(stdin);

    let status = child
        .wait()
        .await
        .context("Failed to wait for the client to exit")?;
    if !status.success() {
        log::warn!("Client sending '{command}' exited with {status}");
    }

    Ok(())
}

async fn feed(workload: &mut tokio::fs::File, mut stdin: ChildStdin) -> HarnessResult<()> {
    match tokio::io::copy(workload, &mut stdin).await {
        Ok(bytes) => log::trace!("Wrote {bytes} bytes of workload to the client"),
        // The client is allowed to stop reading early, its exit status tells the rest.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            log::debug!("Client stopped reading its workload early");
        }
        Err(e) => return Err(e).context("Failed to write the workload to the client"),
    }

    // Closing stdin tells the client that the workload is complete.
    drop(stdin);
    Ok(())
}

fn sink_len(config: &EngineConfig) -> HarnessResult<u64> {
    Ok(std::fs::metadata(config.sink_path())
        .with_context(|| {
            format!(
                "Failed to read the sink file '{}'",
                config.sink_path().display()
            )
        })?
        .len())
}
