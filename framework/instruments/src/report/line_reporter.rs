use crate::report::{failure_line, summary_line, ReportCollector};
use scale_tunnel_summary_model::{RunSummary, WorkloadScale};
use std::io::Write;

/// Writes one human readable line per scale as soon as the scale finishes.
pub struct LineReporter<W: Write> {
    writer: W,
}

impl LineReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> LineReporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, line: String) {
        if let Err(e) = writeln!(self.writer, "{line}").and_then(|_| self.writer.flush()) {
            log::error!("Failed to write report line '{line}': {e}");
        }
    }
}

impl<W: Write> ReportCollector for LineReporter<W> {
    fn add_summary(&mut self, benchmark: &str, summary: &RunSummary) {
        self.write_line(summary_line(benchmark, summary));
    }

    fn add_failure(
        &mut self,
        benchmark: &str,
        scale: &WorkloadScale,
        _failed_invocations: usize,
        reason: &str,
    ) {
        self.write_line(failure_line(benchmark, scale, reason));
    }

    fn finalize(&self) {
        // Lines are written as results arrive.
    }
}
