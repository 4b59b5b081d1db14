//! Line-oriented text protocol shared by the TCP and console front ends.
//!
//! ## Request Flow
//!
//! ```text
//!   raw line ──► parse() ──► Command ──► execute(&CacheManager) ──► reply
//!                  │                           │
//!                  └── CommandError ───────────┴──► "ERR <message>"
//! ```
//!
//! Parsing and execution are stateless; the session loop in each front end
//! only decides when to stop reading. Every failure is a one-line
//! [`CommandError`] rendered as `ERR <message>` and never ends the session.
//!
//! ## Commands
//!
//! | Request                       | Reply                                  |
//! |-------------------------------|----------------------------------------|
//! | `CREATE <name> <capacity>`    | `OK`                                   |
//! | `DESTROY <name>`              | `OK` or `ERR cache not found`          |
//! | `LIST`                        | titles and entries, or `No caches`     |
//! | `SET <name> <key> <value...>` | `OK`                                   |
//! | `GET <name> <key>`            | value, or `ERR key not found`          |
//! | `DEL <name> <key>`            | `OK`                                   |
//! | `PRINT <name>`                | entry lines, or `(empty)`              |
//! | `CLEAR <name>`                | `OK`                                   |
//! | `CLEAR_ALL`                   | `OK`                                   |
//! | `HELP`                        | usage text                             |
//! | `EXIT` / `QUIT`               | ends the session, no reply             |

pub mod command;
pub mod exec;
pub mod hash;

pub use command::{Command, Operation, parse};
pub use exec::{HELP_TEXT, execute};
pub use hash::hash_bytes;

use tracing::{debug, trace};

use crate::ds::SlotIndex;
use crate::error::CommandError;
use crate::manager::CacheManager;

/// Outcome of one request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Reply(String),
    Error(CommandError),
    /// The client asked to end the session.
    Exit,
}

impl Response {
    /// Renders the reply body without a line terminator.
    ///
    /// Returns `None` for [`Response::Exit`].
    ///
    /// ```
    /// use lrue::error::CommandError;
    /// use lrue::protocol::Response;
    ///
    /// assert_eq!(Response::Reply("OK".into()).render().as_deref(), Some("OK"));
    /// assert_eq!(
    ///     Response::Error(CommandError::KeyNotFound).render().as_deref(),
    ///     Some("ERR key not found")
    /// );
    /// assert_eq!(Response::Exit.render(), None);
    /// ```
    pub fn render(&self) -> Option<String> {
        match self {
            Response::Reply(text) => Some(text.clone()),
            Response::Error(err) => Some(format!("ERR {err}")),
            Response::Exit => None,
        }
    }

    /// Renders the reply followed by `terminator`, converting any embedded
    /// newlines to the same terminator.
    pub fn render_with(&self, terminator: &str) -> Option<String> {
        let body = self.render()?;
        let mut out = String::with_capacity(body.len() + terminator.len());
        for (i, line) in body.split('\n').enumerate() {
            if i > 0 {
                out.push_str(terminator);
            }
            out.push_str(line);
        }
        out.push_str(terminator);
        Some(out)
    }
}

/// Parses and executes one line.
pub fn respond<I: SlotIndex>(manager: &CacheManager<I>, line: &[u8]) -> Response {
    let command = match parse(line) {
        Ok(command) => command,
        Err(err) => return rejected(err),
    };
    if command.operation == Operation::Exit {
        return Response::Exit;
    }
    match execute(manager, &command) {
        Ok(reply) => Response::Reply(reply),
        Err(err) => rejected(err),
    }
}

/// Wraps a failed request. Malformed input is logged louder than a miss.
pub fn rejected(err: CommandError) -> Response {
    if err.is_parse_error() {
        debug!(%err, "malformed request");
    } else {
        trace!(%err, "lookup failed");
    }
    Response::Error(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respond_round_trip() {
        let manager: CacheManager = CacheManager::new();
        let script = [
            ("CREATE demo 2", Response::Reply("OK".into())),
            ("SET demo a 1", Response::Reply("OK".into())),
            ("SET demo b 2", Response::Reply("OK".into())),
            ("SET demo c 3", Response::Reply("OK".into())),
            ("GET demo a", Response::Error(CommandError::KeyNotFound)),
            ("GET demo c", Response::Reply("3".into())),
            ("quit", Response::Exit),
        ];
        for (line, expected) in script {
            assert_eq!(respond(&manager, line.as_bytes()), expected, "{line}");
        }
    }

    #[test]
    fn parse_errors_do_not_touch_manager() {
        let manager: CacheManager = CacheManager::new();
        let response = respond(&manager, b"CREATE demo");
        assert_eq!(
            response.render().as_deref(),
            Some("ERR usage: CREATE <cache_name> <capacity>")
        );
        assert!(manager.is_empty());
    }

    #[test]
    fn rejected_keeps_error_for_both_classes() {
        assert_eq!(
            rejected(CommandError::LineTooLong).render().as_deref(),
            Some("ERR line too long")
        );
        assert_eq!(
            rejected(CommandError::CacheNotFound),
            Response::Error(CommandError::CacheNotFound)
        );
    }

    #[test]
    fn render_with_uses_terminator_for_every_line() {
        let response = Response::Reply("a\nb".into());
        assert_eq!(response.render_with("\r\n").as_deref(), Some("a\r\nb\r\n"));
        assert_eq!(response.render_with("\n").as_deref(), Some("a\nb\n"));
        assert_eq!(Response::Exit.render_with("\r\n"), None);
    }
}
