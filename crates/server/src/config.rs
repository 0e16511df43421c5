// crates/server/src/config.rs
//! Server configuration read from environment variables.
//!
//! | Variable                 | Default       |
//! |--------------------------|---------------|
//! | `RUNWATCH_HOST`          | `127.0.0.1`   |
//! | `RUNWATCH_PORT` / `PORT` | `3001`        |
//! | `RUNWATCH_RUNNER`        | `python3`     |
//! | `RUNWATCH_RUNNER_ARGS`   | `-m robot`    |
//! | `RUNWATCH_OUTPUT_ROOT`   | `./output`    |
//! | `RUNWATCH_LOG_CAPACITY`  | `1000`        |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use runwatch_core::{RunnerProgram, MAX_LOG_LINES};

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub runner: RunnerProgram,
    pub output_root: PathBuf,
    pub log_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            runner: RunnerProgram::default(),
            output_root: PathBuf::from("output"),
            log_capacity: MAX_LOG_LINES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unparseable values fall back to
    /// their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port_var = get("RUNWATCH_PORT").map(|v| ("RUNWATCH_PORT", v));
        let port = port_var
            .or_else(|| get("PORT").map(|v| ("PORT", v)))
            .map(|(key, v)| parse_or(key, &v, defaults.port))
            .unwrap_or(defaults.port);

        let runner = match (get("RUNWATCH_RUNNER"), get("RUNWATCH_RUNNER_ARGS")) {
            (None, None) => defaults.runner,
            (program, args) => RunnerProgram::new(
                program.unwrap_or(defaults.runner.program),
                args.map(|a| a.split_whitespace().map(String::from).collect())
                    .unwrap_or(defaults.runner.base_args),
            ),
        };

        Self {
            host: get("RUNWATCH_HOST")
                .map(|v| parse_or("RUNWATCH_HOST", &v, defaults.host))
                .unwrap_or(defaults.host),
            port,
            runner,
            output_root: get("RUNWATCH_OUTPUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_root),
            log_capacity: get("RUNWATCH_LOG_CAPACITY")
                .map(|v| parse_or("RUNWATCH_LOG_CAPACITY", &v, defaults.log_capacity))
                .unwrap_or(defaults.log_capacity),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T: FromStr>(key: &str, value: &str, default: T) -> T {
    match value.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::warn!(key, value, "Ignoring unparseable configuration value");
            default
        }
    }
}
