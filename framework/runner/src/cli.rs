use std::path::PathBuf;

use clap::Parser;

use crate::definition::ClientFailurePolicy;
use crate::engine::{
    DEFAULT_SHUTDOWN_TOKEN, DEFAULT_SINK_FILE, DEFAULT_SOCKET_PATH, DEFAULT_STATE_FILE,
};

/// Every option has a default so that a benchmark can be run with no flags from the directory
/// holding the engine binaries.
#[derive(Parser, Debug, Clone)]
#[command(about, long_about = None)]
pub struct ScaleTunnelCli {
    /// The directory the engine runs in.
    ///
    /// The server and client are started with this as their working directory. The persisted-state
    /// file, the server socket, the sink file and relative workload paths are resolved against it.
    #[clap(long, default_value = ".")]
    pub engine_dir: PathBuf,

    /// Path to the server binary.
    ///
    /// Defaults to `ST_SERVER_PATH`, then `<engine-dir>/server`, then `server` on the `PATH`.
    #[clap(long)]
    pub server_bin: Option<PathBuf>,

    /// Path to the client binary.
    ///
    /// Defaults to `ST_CLIENT_PATH`, then `<engine-dir>/client`, then `client` on the `PATH`.
    #[clap(long)]
    pub client_bin: Option<PathBuf>,

    /// The file the server persists its state to. Deleted before each load benchmark scale.
    #[clap(long, default_value = DEFAULT_STATE_FILE)]
    pub state_file: PathBuf,

    /// The socket the server listens on. The server counts as ready once this path exists.
    #[clap(long, default_value = DEFAULT_SOCKET_PATH)]
    pub socket_path: PathBuf,

    /// The file the client output is written to. Overwritten on every iteration.
    #[clap(long, default_value = DEFAULT_SINK_FILE)]
    pub sink_file: PathBuf,

    /// The command that tells the server to persist its state and exit.
    #[clap(long, default_value = DEFAULT_SHUTDOWN_TOKEN)]
    pub shutdown_token: String,

    /// How long to wait for the server to become ready after it is started.
    #[clap(long, default_value_t = 10)]
    pub ready_timeout_s: u64,

    /// How long to wait for the server to exit after the shutdown command before killing it.
    #[clap(long, default_value_t = 10)]
    pub stop_timeout_s: u64,

    /// Kill a client that runs for longer than this. By default clients may run indefinitely.
    #[clap(long)]
    pub client_timeout_s: Option<u64>,

    /// What to do with an iteration whose client exits unsuccessfully.
    #[clap(long, value_enum, default_value_t = ClientFailurePolicy::Record)]
    pub failure_policy: ClientFailurePolicy,

    /// A TOML file with workload catalogs that replace the built-in catalogs, keyed by benchmark
    /// name.
    #[clap(long)]
    pub catalog: Option<PathBuf>,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar is just adding noise to
    /// the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    /// Print a table summarising every scale at the end of the run.
    #[clap(long, default_value = "false")]
    pub summary_table: bool,
}
