mod catalog;

use anyhow::bail;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use catalog::{load_catalog_overrides, parse_catalog_overrides, CatalogOverrides};

/// One benchmark tier: a workload file and how many times to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadScale {
    label: String,
    workload_path: PathBuf,
    iterations: usize,
}

impl WorkloadScale {
    /// Create a scale, which must run at least one iteration.
    pub fn new(
        label: impl Into<String>,
        workload_path: impl Into<PathBuf>,
        iterations: usize,
    ) -> anyhow::Result<Self> {
        let label = label.into();
        if iterations == 0 {
            bail!("Workload scale '{label}' must run at least one iteration");
        }

        Ok(Self {
            label,
            workload_path: workload_path.into(),
            iterations,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Path of the workload file. Relative paths are resolved against the engine directory.
    pub fn workload_path(&self) -> &Path {
        &self.workload_path
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// The ordered list of scales that one benchmark runs through.
///
/// Scales are benchmarked, and reported, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadCatalog {
    scales: Vec<WorkloadScale>,
}

impl WorkloadCatalog {
    pub fn new(scales: Vec<WorkloadScale>) -> Self {
        Self { scales }
    }

    /// Build a catalog from `(label, workload path, iterations)` entries.
    pub fn from_entries<L, P>(
        entries: impl IntoIterator<Item = (L, P, usize)>,
    ) -> anyhow::Result<Self>
    where
        L: Into<String>,
        P: Into<PathBuf>,
    {
        let scales = entries
            .into_iter()
            .map(|(label, path, iterations)| WorkloadScale::new(label, path, iterations))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self { scales })
    }

    pub fn scales(&self) -> &[WorkloadScale] {
        &self.scales
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    /// Total client invocations needed to run every scale.
    pub fn total_iterations(&self) -> usize {
        self.scales.iter().map(WorkloadScale::iterations).sum()
    }
}

/// What a single client invocation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientInvocation {
    /// The exit code of the client, `None` if it was terminated by a signal or killed.
    pub exit_code: Option<i32>,
    /// Size of the sink file after the client exited.
    pub bytes_written: u64,
    /// Whether the client was killed for running past the configured timeout.
    pub timed_out: bool,
}

impl ClientInvocation {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// The timing of one iteration of a scale.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingSample {
    pub scale_label: String,
    pub iteration: usize,
    pub duration: Duration,
    pub invocation: ClientInvocation,
}

impl TimingSample {
    pub fn new(
        scale: &WorkloadScale,
        iteration: usize,
        duration: Duration,
        invocation: ClientInvocation,
    ) -> Self {
        Self {
            scale_label: scale.label().to_string(),
            iteration,
            duration,
            invocation,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.invocation.succeeded()
    }
}

/// The result of benchmarking one scale.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub scale: WorkloadScale,
    /// Arithmetic mean of the recorded sample durations, in seconds.
    pub mean_duration_s: f64,
    pub min_duration_s: f64,
    pub max_duration_s: f64,
    /// Number of samples the mean was computed over.
    pub samples: usize,
    /// Number of client invocations that did not succeed, whether or not they were recorded.
    pub failed_invocations: usize,
}
