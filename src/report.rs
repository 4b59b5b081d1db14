//! Process-level error reporting.
//!
//! Front ends hand failures they cannot answer on the wire to these two
//! helpers. Neither returns a value to the caller.

use std::error::Error;

use tracing::{error, warn};

/// Logs `message` with its cause chain and terminates the process.
pub fn fatal(message: &str, cause: &dyn Error) -> ! {
    error!(cause = %chain(cause), "{message}");
    std::process::exit(1);
}

/// Logs `message` with its cause chain and carries on.
pub fn non_fatal(message: &str, cause: &dyn Error) {
    warn!(cause = %chain(cause), "{message}");
}

/// Joins an error and its sources with `": "`.
fn chain(cause: &dyn Error) -> String {
    let mut text = cause.to_string();
    let mut source = cause.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}
