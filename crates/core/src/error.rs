// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading a runner settings file.
///
/// These never reach a client: [`crate::settings::load_settings`] logs them
/// and falls back to an empty mapping.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Permission denied reading settings file: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed YAML in {path}: {message}")]
    MalformedYaml { path: PathBuf, message: String },

    #[error("Settings file {path} is not a key/value mapping")]
    NotAMapping { path: PathBuf },
}

impl SettingsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Errors raised while preparing or launching an external run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Runner not found: {program}")]
    RunnerNotFound { program: String },

    #[error("Permission denied executing runner: {program}")]
    PermissionDenied { program: String },

    #[error("Failed to start runner {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        let program = program.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::RunnerNotFound { program },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { program },
            _ => Self::Spawn { program, source },
        }
    }
}
