//! Configuration of the external engine: where its binaries live, where it keeps its state and
//! how long the harness is willing to wait on it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use crate::cli::ScaleTunnelCli;
use crate::engine_binary::{engine_binary_path, EngineBinary};
use crate::types::HarnessResult;

pub const DEFAULT_STATE_FILE: &str = "db1.bin";
pub const DEFAULT_SOCKET_PATH: &str = "cs165_unix_socket";
pub const DEFAULT_SINK_FILE: &str = "output.txt";
pub const DEFAULT_SHUTDOWN_TOKEN: &str = "real_shutdown";
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Used to build an [`EngineConfig`], which is then shared by the orchestrator and the client
/// invoker.
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    /// The working directory of the engine processes.
    ///
    /// If [`None`] when [`Self::build`] is called then the current directory is used.
    engine_dir: Option<PathBuf>,

    /// Explicit path to the server binary, see [`engine_binary_path`] for the fallbacks.
    server_bin: Option<PathBuf>,

    /// Explicit path to the client binary, see [`engine_binary_path`] for the fallbacks.
    client_bin: Option<PathBuf>,

    server_args: Vec<String>,

    client_args: Vec<String>,

    state_file: Option<PathBuf>,

    socket_path: Option<PathBuf>,

    sink_file: Option<PathBuf>,

    shutdown_token: Option<String>,

    ready_timeout: Option<Duration>,

    stop_timeout: Option<Duration>,

    /// Leave as [`None`] to let clients run for as long as they need.
    client_timeout: Option<Duration>,
}

impl EngineConfigBuilder {
    /// Start from the values given on the command line.
    pub fn from_cli(cli: &ScaleTunnelCli) -> Self {
        let mut builder = Self::default();
        builder
            .with_engine_dir(&cli.engine_dir)
            .with_state_file(&cli.state_file)
            .with_socket_path(&cli.socket_path)
            .with_sink_file(&cli.sink_file)
            .with_shutdown_token(&cli.shutdown_token)
            .with_ready_timeout(Duration::from_secs(cli.ready_timeout_s))
            .with_stop_timeout(Duration::from_secs(cli.stop_timeout_s));
        if let Some(server_bin) = &cli.server_bin {
            builder.with_server_bin(server_bin);
        }
        if let Some(client_bin) = &cli.client_bin {
            builder.with_client_bin(client_bin);
        }
        if let Some(client_timeout_s) = cli.client_timeout_s {
            builder.with_client_timeout(Duration::from_secs(client_timeout_s));
        }
        builder
    }

    pub fn with_engine_dir(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.engine_dir = Some(path.into());
        self
    }

    pub fn with_server_bin(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.server_bin = Some(path.into());
        self
    }

    pub fn with_client_bin(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.client_bin = Some(path.into());
        self
    }

    /// Arguments passed to the server every time it is started.
    pub fn with_server_args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.server_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Arguments passed to the client every time it is started.
    pub fn with_client_args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.client_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_state_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.state_file = Some(path.into());
        self
    }

    pub fn with_socket_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.socket_path = Some(path.into());
        self
    }

    pub fn with_sink_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.sink_file = Some(path.into());
        self
    }

    pub fn with_shutdown_token(&mut self, token: impl Into<String>) -> &mut Self {
        self.shutdown_token = Some(token.into());
        self
    }

    pub fn with_ready_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.ready_timeout = Some(timeout);
        self
    }

    pub fn with_stop_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.stop_timeout = Some(timeout);
        self
    }

    pub fn with_client_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.client_timeout = Some(timeout);
        self
    }

    /// Build an [`EngineConfig`], resolving the engine directory and both binaries.
    ///
    /// Returns an error if the engine directory or either binary cannot be found.
    pub fn build(self) -> HarnessResult<EngineConfig> {
        let engine_dir = self.engine_dir.unwrap_or_else(|| PathBuf::from("."));
        let engine_dir = engine_dir.canonicalize().with_context(|| {
            format!("Engine directory '{}' does not exist", engine_dir.display())
        })?;

        let server_bin =
            engine_binary_path(EngineBinary::Server, self.server_bin.as_deref(), &engine_dir)?;
        let client_bin =
            engine_binary_path(EngineBinary::Client, self.client_bin.as_deref(), &engine_dir)?;

        Ok(EngineConfig {
            server_bin,
            client_bin,
            server_args: self.server_args,
            client_args: self.client_args,
            state_path: engine_dir.join(
                self.state_file
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
            ),
            socket_path: engine_dir.join(
                self.socket_path
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET_PATH)),
            ),
            sink_path: engine_dir.join(
                self.sink_file
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SINK_FILE)),
            ),
            shutdown_token: self
                .shutdown_token
                .unwrap_or_else(|| DEFAULT_SHUTDOWN_TOKEN.to_string()),
            ready_timeout: self.ready_timeout.unwrap_or(DEFAULT_READY_TIMEOUT),
            stop_timeout: self.stop_timeout.unwrap_or(DEFAULT_STOP_TIMEOUT),
            client_timeout: self.client_timeout,
            engine_dir,
        })
    }
}

/// The resolved engine configuration.
///
/// Must be created with an [`EngineConfigBuilder`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    engine_dir: PathBuf,
    server_bin: PathBuf,
    client_bin: PathBuf,
    server_args: Vec<String>,
    client_args: Vec<String>,
    state_path: PathBuf,
    socket_path: PathBuf,
    sink_path: PathBuf,
    shutdown_token: String,
    ready_timeout: Duration,
    stop_timeout: Duration,
    client_timeout: Option<Duration>,
}

impl EngineConfig {
    pub fn engine_dir(&self) -> &Path {
        &self.engine_dir
    }

    pub fn server_bin(&self) -> &Path {
        &self.server_bin
    }

    pub fn client_bin(&self) -> &Path {
        &self.client_bin
    }

    pub fn server_args(&self) -> &[String] {
        &self.server_args
    }

    pub fn client_args(&self) -> &[String] {
        &self.client_args
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn sink_path(&self) -> &Path {
        &self.sink_path
    }

    pub fn shutdown_token(&self) -> &str {
        &self.shutdown_token
    }

    pub fn ready_timeout(&self) -> Duration {
        self.ready_timeout
    }

    pub fn stop_timeout(&self) -> Duration {
        self.stop_timeout
    }

    pub fn client_timeout(&self) -> Option<Duration> {
        self.client_timeout
    }

    /// Resolve a workload path against the engine directory.
    pub fn workload_path(&self, workload: &Path) -> PathBuf {
        self.engine_dir.join(workload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use scale_tunnel_core::prelude::HarnessError;
    use std::ffi::OsString;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn paths_are_resolved_against_the_engine_dir() {
        let engine_dir = TempDir::new().unwrap();
        let server = NamedTempFile::new().unwrap();
        let client = NamedTempFile::new().unwrap();

        let mut builder = EngineConfigBuilder::default();
        builder
            .with_engine_dir(engine_dir.path())
            .with_server_bin(server.path())
            .with_client_bin(client.path());
        let config = builder.build().unwrap();

        let root = engine_dir.path().canonicalize().unwrap();
        assert_eq!(config.engine_dir(), root);
        assert_eq!(config.state_path(), root.join("db1.bin"));
        assert_eq!(config.socket_path(), root.join("cs165_unix_socket"));
        assert_eq!(config.sink_path(), root.join("output.txt"));
        assert_eq!(
            config.workload_path(Path::new("analysis/t10.dsl")),
            root.join("analysis/t10.dsl")
        );
        assert_eq!(config.shutdown_token(), "real_shutdown");
        assert_eq!(config.client_timeout(), None);
    }

    #[test]
    fn takes_values_from_the_cli() {
        let engine_dir = TempDir::new().unwrap();
        let server = NamedTempFile::new().unwrap();
        let client = NamedTempFile::new().unwrap();
        let args: Vec<OsString> = vec![
            "bench".into(),
            "--engine-dir".into(),
            engine_dir.path().into(),
            "--server-bin".into(),
            server.path().into(),
            "--client-bin".into(),
            client.path().into(),
            "--state-file".into(),
            "db2.bin".into(),
            "--shutdown-token".into(),
            "shutdown".into(),
            "--client-timeout-s".into(),
            "7".into(),
        ];
        let cli = ScaleTunnelCli::try_parse_from(args).unwrap();

        let config = EngineConfigBuilder::from_cli(&cli).build().unwrap();

        assert_eq!(config.server_bin(), server.path().canonicalize().unwrap());
        assert_eq!(config.client_bin(), client.path().canonicalize().unwrap());
        assert!(config.state_path().ends_with("db2.bin"));
        assert_eq!(config.shutdown_token(), "shutdown");
        assert_eq!(config.client_timeout(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn missing_server_binary_fails_to_launch() {
        let engine_dir = TempDir::new().unwrap();
        let client = NamedTempFile::new().unwrap();

        let mut builder = EngineConfigBuilder::default();
        builder
            .with_engine_dir(engine_dir.path())
            .with_server_bin("/no/such/server")
            .with_client_bin(client.path());
        let err = builder.build().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::ProcessLaunch { process, .. }) if process == "server"
        ));
    }

    #[test]
    fn missing_engine_dir_is_an_error() {
        let mut builder = EngineConfigBuilder::default();
        builder.with_engine_dir("/no/such/engine/dir");
        let err = builder.build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Engine directory '/no/such/engine/dir' does not exist"
        );
    }
}
