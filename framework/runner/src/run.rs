use std::sync::Arc;

use scale_tunnel_core::prelude::{ShutdownHandle, ShutdownSignalError};
use scale_tunnel_instruments::{MonotonicTimer, ReportConfig};

use crate::{
    client::EngineClient,
    definition::BenchmarkDefinitionBuilder,
    engine::EngineConfigBuilder,
    executor::Executor,
    harness::{Harness, ScaleOutcome},
    orchestrator::EngineOrchestrator,
    shutdown::start_shutdown_listener,
    types::HarnessResult,
};

/// Run every benchmark of the definition against the engine, printing a line per scale.
///
/// The server is stopped gracefully once the run is over. If the run is aborted, the server is
/// killed instead when the orchestrator is dropped.
pub fn run(definition: BenchmarkDefinitionBuilder) -> HarnessResult<Vec<ScaleOutcome>> {
    let definition = definition.build()?;

    log::info!("Running benchmark suite: {}", definition.name);

    let shutdown_handle = ShutdownHandle::default();
    let executor = Arc::new(Executor::current_thread(shutdown_handle.clone())?);
    start_shutdown_listener(&executor, shutdown_handle.clone());

    let config = Arc::new(EngineConfigBuilder::from_cli(&definition.cli).build()?);
    log::debug!("Engine configuration: {config:?}");

    let mut report_config = ReportConfig::default().enable_lines();
    if definition.cli.summary_table {
        report_config = report_config.enable_summary_table();
    }

    let mut harness = Harness::new(
        EngineOrchestrator::new(config.clone(), executor.clone()),
        EngineClient::new(config, executor),
        MonotonicTimer,
        report_config.init(),
    )
    .with_failure_policy(definition.cli.failure_policy)
    .with_shutdown_listener(shutdown_handle.new_listener())
    .with_progress(!definition.cli.no_progress);

    let outcomes = harness.run_all(&definition.benchmarks);

    let graceful = !matches!(&outcomes, Err(e) if e.is::<ShutdownSignalError>());
    if let Err(e) = harness.finish(graceful) {
        log::error!("Failed to stop the server cleanly: {e:?}");
    }

    outcomes
}
