//! Engine configuration.
//!
//! The binary fills an [`EngineConfig`] from command-line flags and calls
//! [`EngineConfig::validate`] before starting any front end.
//!
//! | Field             | Default   | Valid range        |
//! |-------------------|-----------|--------------------|
//! | `host`            | `0.0.0.0` | any bind address   |
//! | `port`            | `7333`    | `1024..=65535`     |
//! | `buffer_size`     | `256`     | `17..=1024` bytes  |
//! | `max_connections` | `256`     | `>= 1`             |
//! | `mode`            | `both`    | `tcp`, `cli`, `both` |

use std::fmt;

use clap::ValueEnum;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 7333;
pub const DEFAULT_BUFFER_SIZE: usize = 256;
pub const DEFAULT_MAX_CONNECTIONS: usize = 256;

pub const MIN_PORT: u16 = 1024;
pub const MIN_BUFFER_SIZE: usize = 17;
pub const MAX_BUFFER_SIZE: usize = 1024;

/// Which front ends to run.
///
/// In every mode the engine runs until Ctrl-C or SIGTERM; ending the
/// console session does not stop the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RunMode {
    /// TCP listener only.
    Tcp,
    /// Console only.
    Cli,
    /// TCP listener and console side by side.
    #[default]
    Both,
}

impl RunMode {
    pub fn runs_tcp(self) -> bool {
        matches!(self, RunMode::Tcp | RunMode::Both)
    }

    pub fn runs_console(self) -> bool {
        matches!(self, RunMode::Cli | RunMode::Both)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunMode::Tcp => "tcp",
            RunMode::Cli => "cli",
            RunMode::Both => "both",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub host: String,
    pub port: u16,
    /// Receive buffer length per TCP connection, in bytes.
    pub buffer_size: usize,
    pub max_connections: usize,
    pub mode: RunMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            mode: RunMode::default(),
        }
    }
}

impl EngineConfig {
    /// Checks every field against its valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port < MIN_PORT {
            return Err(ConfigError::new(
                "port must be a number between 1024 and 65535",
            ));
        }
        if !(MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&self.buffer_size) {
            return Err(ConfigError::new(
                "buffer size must be between 17 and 1024 bytes",
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::new("max connections must be at least 1"));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::new("host must not be empty"));
        }
        Ok(())
    }

    /// Listener address as `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
