use std::env;
use std::path::{Path, PathBuf};

use anyhow::bail;
use anyhow::Context;
use scale_tunnel_core::prelude::HarnessError;

use crate::types::HarnessResult;

/// Environment variable to override the path to the engine's server binary.
pub const ST_SERVER_PATH_ENV: &str = "ST_SERVER_PATH";

/// Environment variable to override the path to the engine's client binary.
pub const ST_CLIENT_PATH_ENV: &str = "ST_CLIENT_PATH";

/// One of the two engine binaries that the harness drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineBinary {
    Server,
    Client,
}

impl EngineBinary {
    pub fn name(&self) -> &'static str {
        match self {
            EngineBinary::Server => "server",
            EngineBinary::Client => "client",
        }
    }

    fn env_var(&self) -> &'static str {
        match self {
            EngineBinary::Server => ST_SERVER_PATH_ENV,
            EngineBinary::Client => ST_CLIENT_PATH_ENV,
        }
    }
}

/// Get the path to an engine binary.
///
/// In order of preference:
/// - An explicit path, given on the command line. A bare name is looked up on the `PATH`.
/// - The [`ST_SERVER_PATH_ENV`] or [`ST_CLIENT_PATH_ENV`] environment variable, which must point
///   at an existing file.
/// - A binary named `server` or `client` in the engine directory.
/// - A binary named `server` or `client` on the `PATH`.
///
/// The result is absolute so that it does not depend on the working directory of the child.
///
/// A binary that cannot be found is a [`HarnessError::ProcessLaunch`] failure.
pub fn engine_binary_path(
    binary: EngineBinary,
    explicit: Option<&Path>,
    engine_dir: &Path,
) -> HarnessResult<PathBuf> {
    resolve(binary, explicit, engine_dir)
        .map_err(|e| HarnessError::process_launch(binary.name(), format!("{e:#}")).into())
}

fn resolve(
    binary: EngineBinary,
    explicit: Option<&Path>,
    engine_dir: &Path,
) -> HarnessResult<PathBuf> {
    let name = binary.name();
    let env_var = binary.env_var();

    if let Some(path) = explicit {
        return locate(path).with_context(|| {
            format!("The {name} binary '{}' could not be found", path.display())
        });
    }

    match env::var(env_var).ok().as_deref() {
        Some("") => {
            bail!("'{env_var}' set to empty string");
        }
        Some(path) => {
            let path = PathBuf::from(path);
            if !path.exists() {
                bail!(
                    "Path to the {name} binary overwritten with '{env_var}={path}' but that path doesn't exist",
                    path = path.display()
                );
            }
            absolute(&path)
        }
        None => {
            let in_engine_dir = engine_dir.join(name);
            if in_engine_dir.is_file() {
                return absolute(&in_engine_dir);
            }

            log::warn!(
                "No '{name}' in '{}' and '{env_var}' is not set so looking in user's 'PATH'",
                engine_dir.display()
            );
            which::which(name).with_context(|| {
                format!(
                    "The {name} binary was not found in '{}' or the PATH. Please build the engine or set '{env_var}' to the correct path.",
                    engine_dir.display()
                )
            })
        }
    }
}

fn locate(path: &Path) -> HarnessResult<PathBuf> {
    if path.is_file() {
        absolute(path)
    } else {
        Ok(which::which(path)?)
    }
}

fn absolute(path: &Path) -> HarnessResult<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("Failed to resolve '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt as _;

    use serial_test::serial;
    use tempfile::{NamedTempFile, TempDir};

    use super::*;

    #[cfg(unix)]
    fn make_executable(path: &Path) {
        std::fs::write(path, "#!/bin/sh\n").expect("failed to create binary");
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).unwrap();
    }

    #[test]
    #[serial]
    fn test_should_not_get_server_path_if_env_path_not_exist() {
        env::set_var(ST_SERVER_PATH_ENV, "/non/existent/path/to/server");
        let result = engine_binary_path(EngineBinary::Server, None, Path::new("."));
        env::remove_var(ST_SERVER_PATH_ENV);
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_should_not_accept_empty_env_path() {
        env::set_var(ST_CLIENT_PATH_ENV, "");
        let result = engine_binary_path(EngineBinary::Client, None, Path::new("."));
        env::remove_var(ST_CLIENT_PATH_ENV);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Failed to launch the client: 'ST_CLIENT_PATH' set to empty string"
        );
    }

    #[test]
    #[serial]
    fn test_missing_explicit_binary_is_a_launch_failure() {
        let err = engine_binary_path(
            EngineBinary::Server,
            Some(Path::new("/no/such/server")),
            Path::new("."),
        )
        .unwrap_err();

        match err.downcast_ref::<HarnessError>() {
            Some(HarnessError::ProcessLaunch { process, reason }) => {
                assert_eq!(process, "server");
                assert!(reason.starts_with("The server binary '/no/such/server' could not be found"));
            }
            other => panic!("expected a launch failure, got {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn test_should_get_client_path_from_env() {
        let temp = NamedTempFile::new().expect("failed to create temp file");
        env::set_var(ST_CLIENT_PATH_ENV, temp.path());
        let result = engine_binary_path(EngineBinary::Client, None, Path::new("."));
        env::remove_var(ST_CLIENT_PATH_ENV);
        assert_eq!(result.unwrap(), temp.path().canonicalize().unwrap());
    }

    #[test]
    #[serial]
    fn test_explicit_path_wins_over_env() {
        let explicit = NamedTempFile::new().expect("failed to create temp file");
        env::set_var(ST_SERVER_PATH_ENV, "/non/existent/path/to/server");
        let result = engine_binary_path(EngineBinary::Server, Some(explicit.path()), Path::new("."));
        env::remove_var(ST_SERVER_PATH_ENV);
        assert_eq!(result.unwrap(), explicit.path().canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_should_get_server_from_engine_dir() {
        env::remove_var(ST_SERVER_PATH_ENV);
        let engine_dir = TempDir::new().expect("failed to create temp dir");
        let server = engine_dir.path().join("server");
        make_executable(&server);

        let result = engine_binary_path(EngineBinary::Server, None, engine_dir.path())
            .expect("failed to get server path");
        assert_eq!(result, server.canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_should_fall_back_to_path() {
        env::remove_var(ST_CLIENT_PATH_ENV);
        let engine_dir = TempDir::new().expect("failed to create temp dir");
        let bin_dir = TempDir::new().expect("failed to create temp dir");
        let client = bin_dir.path().join("client");
        make_executable(&client);

        let original_path = env::var_os("PATH");
        env::set_var("PATH", bin_dir.path());
        let result = engine_binary_path(EngineBinary::Client, None, engine_dir.path());
        match original_path {
            Some(path) => env::set_var("PATH", path),
            None => env::remove_var("PATH"),
        }

        let result = result.expect("failed to get client path");
        assert_eq!(result.canonicalize().unwrap(), client.canonicalize().unwrap());
    }

    #[test]
    #[serial]
    fn test_should_fail_when_binary_missing_everywhere() {
        env::remove_var(ST_SERVER_PATH_ENV);
        let engine_dir = TempDir::new().expect("failed to create temp dir");

        let original_path = env::var_os("PATH");
        env::remove_var("PATH");
        let result = engine_binary_path(EngineBinary::Server, None, engine_dir.path());
        if let Some(path) = original_path {
            env::set_var("PATH", path);
        }

        assert!(result.is_err());
    }
}
