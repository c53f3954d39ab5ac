mod aggregator;
mod report;
mod timer;

pub use aggregator::ScaleAccumulator;
pub use report::{
    failure_line, summary_line, LineReporter, ReportCollector, ReportConfig, Reporter,
    SummaryTableReporter,
};
pub use timer::{MonotonicTimer, Timer};
