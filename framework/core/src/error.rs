use std::path::PathBuf;

/// The failures that the harness tells apart.
///
/// These are returned inside an [anyhow::Error] so callers that care about the kind of failure
/// can recover it with `error.downcast_ref::<HarnessError>()`.
///
/// [anyhow::Error]: https://docs.rs/anyhow
#[derive(derive_more::Error, derive_more::Display, Debug)]
pub enum HarnessError {
    /// The server or a client process could not be started, or the server never became ready.
    ///
    /// Fatal to the benchmark run, never retried.
    #[display("Failed to launch the {process}: {reason}")]
    ProcessLaunch { process: String, reason: String },
    /// The persisted-state file could not be deleted before a load benchmark.
    #[display("Failed to delete persisted state '{}': {reason}", path.display())]
    StaleState { path: PathBuf, reason: String },
    /// The client exited unsuccessfully while running a workload.
    ///
    /// Whether this stops anything is decided by the runner's client failure policy.
    #[display("Client failed while running workload '{}': {reason}", workload.display())]
    ClientExecution { workload: PathBuf, reason: String },
}

impl HarnessError {
    pub fn process_launch(process: impl Into<String>, reason: impl ToString) -> Self {
        Self::ProcessLaunch {
            process: process.into(),
            reason: reason.to_string(),
        }
    }

    pub fn stale_state(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::StaleState {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn client_execution(workload: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ClientExecution {
            workload: workload.into(),
            reason: reason.to_string(),
        }
    }
}
