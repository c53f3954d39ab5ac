use scale_tunnel_summary_model::{RunSummary, TimingSample, WorkloadScale};
use std::time::Duration;

/// Running totals for the samples of a single scale.
///
/// A new accumulator is created for every scale so that timings from one scale never leak into
/// the mean of another.
#[derive(Debug)]
pub struct ScaleAccumulator {
    scale: WorkloadScale,
    total_s: f64,
    min: Option<Duration>,
    max: Option<Duration>,
    recorded: usize,
    failed: usize,
}

impl ScaleAccumulator {
    pub fn new(scale: WorkloadScale) -> Self {
        Self {
            scale,
            total_s: 0.0,
            min: None,
            max: None,
            recorded: 0,
            failed: 0,
        }
    }

    /// Add a sample to the mean. Failed invocations that are recorded are still counted as
    /// failures.
    pub fn record(&mut self, sample: TimingSample) {
        debug_assert_eq!(sample.scale_label, self.scale.label());

        if !sample.succeeded() {
            self.failed += 1;
        }
        self.total_s += sample.duration.as_secs_f64();
        self.min = Some(self.min.map_or(sample.duration, |m| m.min(sample.duration)));
        self.max = Some(self.max.map_or(sample.duration, |m| m.max(sample.duration)));
        self.recorded += 1;
    }

    /// Count a failed invocation without letting its duration affect the mean.
    pub fn exclude(&mut self, sample: TimingSample) {
        log::trace!(
            "Excluding iteration {} of scale '{}' from the mean",
            sample.iteration,
            sample.scale_label
        );
        self.failed += 1;
    }

    pub fn recorded(&self) -> usize {
        self.recorded
    }

    /// Invocations that did not succeed so far, recorded or excluded.
    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn scale(&self) -> &WorkloadScale {
        &self.scale
    }

    /// The summary for this scale, or `None` if no sample was recorded.
    pub fn finish(self) -> Option<RunSummary> {
        let (min, max) = self.min.zip(self.max)?;

        Some(RunSummary {
            mean_duration_s: self.total_s / self.recorded as f64,
            min_duration_s: min.as_secs_f64(),
            max_duration_s: max.as_secs_f64(),
            samples: self.recorded,
            failed_invocations: self.failed,
            scale: self.scale,
        })
    }
}
