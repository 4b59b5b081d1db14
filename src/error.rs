//! Error types for the lrue engine.
//!
//! ## Key Components
//!
//! - [`InvariantError`]: Returned by `check_invariants` methods when the slot
//!   arena, recency list, or key index disagree with each other.
//! - [`ConfigError`]: Returned when engine configuration parameters are
//!   invalid (port out of range, receive buffer too small, ...).
//! - [`CommandError`]: Parse and lookup failures of the text protocol. These
//!   are always recoverable and are rendered back to the client as one line.
//! - [`ServeError`]: Listener failures of the TCP front end.
//!
//! ## Example Usage
//!
//! ```
//! use lrue::error::CommandError;
//! use lrue::protocol::parse;
//!
//! let err = parse(b"GET only-a-name").unwrap_err();
//! assert_eq!(err, CommandError::Usage("GET <cache_name> <key>"));
//! assert_eq!(err.to_string(), "usage: GET <cache_name> <key>");
//! ```

use std::io;

use thiserror::Error;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when engine configuration parameters are invalid.
///
/// # Example
///
/// ```
/// use lrue::config::EngineConfig;
///
/// let config = EngineConfig { port: 80, ..EngineConfig::default() };
/// let err = config.validate().unwrap_err();
/// assert!(err.to_string().contains("port"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// CommandError
// ---------------------------------------------------------------------------

/// Failure of a single protocol request.
///
/// Parse errors reject the offending line; lookup errors report a missing
/// cache or key. Neither ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    /// The request did not fit in the receive buffer.
    #[error("line too long")]
    LineTooLong,
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("unknown command: {0}")]
    UnknownOperation(String),
    #[error("invalid capacity: {0}")]
    InvalidCapacity(String),
    #[error("cache not found")]
    CacheNotFound,
    #[error("key not found")]
    KeyNotFound,
}

impl CommandError {
    /// Returns `true` for errors raised while parsing a line.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            CommandError::Empty
                | CommandError::LineTooLong
                | CommandError::Usage(_)
                | CommandError::UnknownOperation(_)
                | CommandError::InvalidCapacity(_)
        )
    }
}

// ---------------------------------------------------------------------------
// ServeError
// ---------------------------------------------------------------------------

/// Error returned by the TCP front end.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The listener could not be bound. Fatal at startup.
    #[error("failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    /// Listener limits that cannot serve any client.
    #[error("invalid listener settings: {0}")]
    Settings(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
