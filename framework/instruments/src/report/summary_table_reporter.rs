mod scale_table;

use crate::report::summary_table_reporter::scale_table::ScaleRow;
use crate::report::ReportCollector;
use scale_tunnel_summary_model::{RunSummary, WorkloadScale};
use tabled::settings::Style;
use tabled::Table;

/// Keeps a row per scale in memory and prints them as a table at the end of the run.
#[derive(Default)]
pub struct SummaryTableReporter {
    rows: Vec<ScaleRow>,
}

impl SummaryTableReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn render(&self) -> String {
        let mut table = Table::new(&self.rows);
        table.with(Style::modern());
        table.to_string()
    }
}

impl ReportCollector for SummaryTableReporter {
    fn add_summary(&mut self, benchmark: &str, summary: &RunSummary) {
        self.rows.push(ScaleRow {
            benchmark: benchmark.to_string(),
            scale: summary.scale.label().to_string(),
            iterations: summary.scale.iterations(),
            avg_time_ms: Some(summary.mean_duration_s * 1000.0),
            min_time_ms: Some(summary.min_duration_s * 1000.0),
            max_time_ms: Some(summary.max_duration_s * 1000.0),
            failed: summary.failed_invocations,
            outcome: "ok".to_string(),
        });
    }

    fn add_failure(
        &mut self,
        benchmark: &str,
        scale: &WorkloadScale,
        failed_invocations: usize,
        reason: &str,
    ) {
        self.rows.push(ScaleRow {
            benchmark: benchmark.to_string(),
            scale: scale.label().to_string(),
            iterations: scale.iterations(),
            avg_time_ms: None,
            min_time_ms: None,
            max_time_ms: None,
            failed: failed_invocations,
            outcome: reason.to_string(),
        });
    }

    fn finalize(&self) {
        if self.rows.is_empty() {
            return;
        }

        println!("\nSummary of scales");
        println!("{}", self.render());
    }
}
