mod cli;
mod client;
mod definition;
mod engine;
mod engine_binary;
mod executor;
mod harness;
mod init;
mod orchestrator;
mod progress;
mod run;
mod server;
mod shutdown;
mod types;

pub mod prelude {
    pub use crate::cli::ScaleTunnelCli;
    pub use crate::client::{run_workload, send_command, ClientInvoker, EngineClient};
    pub use crate::definition::{
        Benchmark, BenchmarkDefinitionBuilder, BenchmarkMode, ClientFailurePolicy,
    };
    pub use crate::engine::{EngineConfig, EngineConfigBuilder};
    pub use crate::engine_binary::{
        engine_binary_path, EngineBinary, ST_CLIENT_PATH_ENV, ST_SERVER_PATH_ENV,
    };
    pub use crate::executor::Executor;
    pub use crate::harness::{Harness, ScaleOutcome};
    pub use crate::orchestrator::{EngineOrchestrator, ProcessOrchestrator};
    pub use crate::run::run;
    pub use crate::server::ServerProcess;
    pub use crate::types::HarnessResult;

    pub use scale_tunnel_core::prelude::{HarnessError, ShutdownHandle, ShutdownSignalError};
    pub use scale_tunnel_instruments::{
        LineReporter, MonotonicTimer, ReportCollector, ReportConfig, Reporter, Timer,
    };
    pub use scale_tunnel_summary_model::{
        ClientInvocation, RunSummary, TimingSample, WorkloadCatalog, WorkloadScale,
    };
}
