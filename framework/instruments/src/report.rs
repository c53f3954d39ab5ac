mod line_reporter;
mod summary_table_reporter;

use scale_tunnel_summary_model::{RunSummary, WorkloadScale};

pub use line_reporter::LineReporter;
pub use summary_table_reporter::SummaryTableReporter;

pub trait ReportCollector {
    /// Called once per scale that produced a summary, in the order the scales were benchmarked.
    fn add_summary(&mut self, benchmark: &str, summary: &RunSummary);

    /// Called once per scale that was stopped before it could produce a summary.
    fn add_failure(
        &mut self,
        benchmark: &str,
        scale: &WorkloadScale,
        failed_invocations: usize,
        reason: &str,
    );

    fn finalize(&self);
}

/// The line reported for a completed scale.
pub fn summary_line(benchmark: &str, summary: &RunSummary) -> String {
    format!(
        "{benchmark} [{}] average time: {:.6}s",
        summary.scale.label(),
        summary.mean_duration_s
    )
}

/// The line reported for a scale that did not complete.
pub fn failure_line(benchmark: &str, scale: &WorkloadScale, reason: &str) -> String {
    format!("{benchmark} [{}] failed: {reason}", scale.label())
}

/// Chooses which collectors a [Reporter] forwards results to.
#[derive(Default)]
pub struct ReportConfig {
    lines: bool,
    summary_table: bool,
    collectors: Vec<Box<dyn ReportCollector>>,
}

impl ReportConfig {
    /// Print one line per scale to stdout as soon as the scale finishes.
    pub fn enable_lines(mut self) -> Self {
        self.lines = true;
        self
    }

    /// Print a table of every scale at the end of the run.
    pub fn enable_summary_table(mut self) -> Self {
        self.summary_table = true;
        self
    }

    pub fn with_collector(mut self, collector: impl ReportCollector + 'static) -> Self {
        self.collectors.push(Box::new(collector));
        self
    }

    pub fn init(self) -> Reporter {
        let mut collectors = self.collectors;
        if self.lines {
            collectors.push(Box::new(LineReporter::stdout()));
        }
        if self.summary_table {
            collectors.push(Box::new(SummaryTableReporter::new()));
        }

        Reporter { collectors }
    }
}

/// Forwards results to every configured [ReportCollector].
pub struct Reporter {
    collectors: Vec<Box<dyn ReportCollector>>,
}

impl Reporter {
    pub fn add_summary(&mut self, benchmark: &str, summary: &RunSummary) {
        for collector in &mut self.collectors {
            collector.add_summary(benchmark, summary);
        }
    }

    pub fn add_failure(
        &mut self,
        benchmark: &str,
        scale: &WorkloadScale,
        failed_invocations: usize,
        reason: &str,
    ) {
        for collector in &mut self.collectors {
            collector.add_failure(benchmark, scale, failed_invocations, reason);
        }
    }

    pub fn finalize(&self) {
        for collector in &self.collectors {
            collector.finalize();
        }
    }
}
