use scale_tunnel_core::prelude::{DelegatedShutdownListener, HarnessError, ShutdownSignalError};
use scale_tunnel_instruments::{Reporter, ScaleAccumulator, Timer};
use scale_tunnel_summary_model::{RunSummary, TimingSample, WorkloadScale};

use crate::client::ClientInvoker;
use crate::definition::{Benchmark, BenchmarkMode, ClientFailurePolicy};
use crate::orchestrator::ProcessOrchestrator;
use crate::progress::scale_progress;
use crate::types::HarnessResult;

/// How a single scale ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleOutcome {
    Completed(RunSummary),
    Failed {
        scale: WorkloadScale,
        /// Client invocations of the scale that did not succeed before it stopped.
        failed_invocations: usize,
        reason: String,
    },
}

/// Runs benchmarks one scale and one iteration at a time.
///
/// The orchestrator, invoker and timer are generic so that the loop can be driven by the real
/// engine or by test doubles.
pub struct Harness<O, C, T> {
    orchestrator: O,
    invoker: C,
    timer: T,
    reporter: Reporter,
    policy: ClientFailurePolicy,
    shutdown_listener: Option<DelegatedShutdownListener>,
    show_progress: bool,
}

impl<O, C, T> Harness<O, C, T>
where
    O: ProcessOrchestrator,
    C: ClientInvoker,
    T: Timer,
{
    pub fn new(orchestrator: O, invoker: C, timer: T, reporter: Reporter) -> Self {
        Self {
            orchestrator,
            invoker,
            timer,
            reporter,
            policy: ClientFailurePolicy::default(),
            shutdown_listener: None,
            show_progress: false,
        }
    }

    pub fn with_failure_policy(mut self, policy: ClientFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stop between iterations once a shutdown signal is seen.
    pub fn with_shutdown_listener(mut self, listener: DelegatedShutdownListener) -> Self {
        self.shutdown_listener = Some(listener);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn orchestrator(&self) -> &O {
        &self.orchestrator
    }

    pub fn invoker(&self) -> &C {
        &self.invoker
    }

    /// Run every benchmark in order, stopping at the first fatal error.
    pub fn run_all(&mut self, benchmarks: &[Benchmark]) -> HarnessResult<Vec<ScaleOutcome>> {
        let mut outcomes = Vec::new();
        for benchmark in benchmarks {
            outcomes.extend(self.run_benchmark(benchmark)?);
        }
        Ok(outcomes)
    }

    /// Run every scale of one benchmark in catalog order.
    pub fn run_benchmark(&mut self, benchmark: &Benchmark) -> HarnessResult<Vec<ScaleOutcome>> {
        log::info!(
            "Running {:?} benchmark '{}' over {} scales",
            benchmark.mode,
            benchmark.name,
            benchmark.catalog.scales().len()
        );

        if benchmark.mode == BenchmarkMode::Query && !self.orchestrator.is_running() {
            self.orchestrator.start()?;
        }

        let mut outcomes = Vec::with_capacity(benchmark.catalog.scales().len());
        for scale in benchmark.catalog.scales() {
            let outcome = self.run_scale(benchmark, scale)?;
            match &outcome {
                ScaleOutcome::Completed(summary) => {
                    self.reporter.add_summary(&benchmark.name, summary)
                }
                ScaleOutcome::Failed {
                    scale,
                    failed_invocations,
                    reason,
                } => self
                    .reporter
                    .add_failure(&benchmark.name, scale, *failed_invocations, reason),
            }
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    fn run_scale(&mut self, benchmark: &Benchmark, scale: &WorkloadScale) -> HarnessResult<ScaleOutcome> {
        let is_load = benchmark.mode == BenchmarkMode::Load;
        if is_load {
            if self.orchestrator.is_running() {
                self.orchestrator.stop()?;
            }
            self.orchestrator.reset_state()?;
            self.orchestrator.start()?;
        }

        let mut accumulator = ScaleAccumulator::new(scale.clone());
        let progress = scale_progress(&benchmark.name, scale, self.show_progress);

        for iteration in 0..scale.iterations() {
            self.check_shutdown()?;

            let invoker = &mut self.invoker;
            let (invocation, duration) = self.timer.time(|| invoker.run(scale));
            let sample = TimingSample::new(scale, iteration, duration, invocation?);
            log::debug!(
                "{} [{}] iteration {iteration} took {duration:?}",
                benchmark.name,
                scale.label()
            );

            if sample.succeeded() {
                accumulator.record(sample);
            } else {
                let failure = client_failure(scale, &sample);
                match self.policy {
                    ClientFailurePolicy::Record => {
                        log::warn!("{failure}, recording the sample anyway");
                        accumulator.record(sample);
                    }
                    ClientFailurePolicy::Exclude => {
                        log::warn!("{failure}, excluding the sample");
                        accumulator.exclude(sample);
                    }
                    ClientFailurePolicy::AbortScale => {
                        log::error!("{failure}, aborting the scale");
                        progress.abandon();
                        accumulator.exclude(sample);
                        return Ok(ScaleOutcome::Failed {
                            scale: scale.clone(),
                            failed_invocations: accumulator.failed(),
                            reason: failure.to_string(),
                        });
                    }
                }
            }
            progress.inc(1);

            if is_load && iteration + 1 < scale.iterations() {
                self.orchestrator.restart()?;
            }
        }
        progress.finish_and_clear();

        let failed_invocations = accumulator.failed();
        Ok(match accumulator.finish() {
            Some(summary) => ScaleOutcome::Completed(summary),
            None => ScaleOutcome::Failed {
                scale: scale.clone(),
                failed_invocations,
                reason: "no successful client invocations".to_string(),
            },
        })
    }

    fn check_shutdown(&mut self) -> HarnessResult<()> {
        if let Some(listener) = &mut self.shutdown_listener {
            if listener.should_shutdown() {
                return Err(anyhow::anyhow!(ShutdownSignalError::default()));
            }
        }
        Ok(())
    }

    /// Stop the server if it is still running and finalize the reporters.
    ///
    /// When `graceful` is false the server is left to be killed when the orchestrator is dropped.
    pub fn finish(mut self, graceful: bool) -> HarnessResult<()> {
        let stopped = if graceful && self.orchestrator.is_running() {
            self.orchestrator.stop()
        } else {
            Ok(())
        };
        self.reporter.finalize();
        stopped
    }
}

fn client_failure(scale: &WorkloadScale, sample: &TimingSample) -> HarnessError {
    let reason = match (sample.invocation.timed_out, sample.invocation.exit_code) {
        (true, _) => format!("iteration {} timed out", sample.iteration),
        (false, Some(code)) => format!("iteration {} exited with code {code}", sample.iteration),
        (false, None) => format!("iteration {} was terminated by a signal", sample.iteration),
    };
    HarnessError::client_execution(scale.workload_path(), reason)
}
