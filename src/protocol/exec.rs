//! Command execution against a [`CacheManager`].

use std::sync::Arc;

use tracing::debug;

use crate::ds::SlotIndex;
use crate::error::CommandError;
use crate::manager::{CacheManager, EngineCache};
use crate::protocol::command::{Command, Operation};

pub const OK: &str = "OK";
pub const NO_CACHES: &str = "No caches";
pub const EMPTY_CACHE: &str = "(empty)";

pub const HELP_TEXT: &str = "Available commands:
CREATE <cache_name> <capacity>
DESTROY <cache_name>
LIST
SET <cache_name> <key> <value>
GET <cache_name> <key>
DEL <cache_name> <key>
PRINT <cache_name>
CLEAR <cache_name>
CLEAR_ALL
HELP
QUIT";

/// Parses a CREATE capacity literal for an index of width `I`.
///
/// A literal equal to the sentinel is accepted and clamped by the arena;
/// anything wider than the sentinel is rejected.
fn parse_capacity<I: SlotIndex>(literal: &[u8]) -> Result<usize, CommandError> {
    let invalid = || CommandError::InvalidCapacity(String::from_utf8_lossy(literal).into_owned());
    let capacity: usize = std::str::from_utf8(literal)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(invalid)?;
    if capacity > I::NONE.as_usize() {
        return Err(invalid());
    }
    Ok(capacity)
}

fn lookup<I: SlotIndex>(
    manager: &CacheManager<I>,
    command: &Command,
) -> Result<Arc<EngineCache<I>>, CommandError> {
    manager
        .get_cache(command.target)
        .ok_or(CommandError::CacheNotFound)
}

/// Applies a parsed command and returns the reply text.
///
/// `EXIT` is a transport concern; executing it directly yields an empty
/// reply.
///
/// ```
/// use lrue::manager::CacheManager;
/// use lrue::protocol::{execute, parse};
///
/// let manager: CacheManager = CacheManager::new();
/// let run = |line: &str| execute(&manager, &parse(line.as_bytes()).unwrap());
///
/// assert_eq!(run("CREATE demo 2").unwrap(), "OK");
/// assert_eq!(run("SET demo a hello").unwrap(), "OK");
/// assert_eq!(run("GET demo a").unwrap(), "hello");
/// ```
pub fn execute<I: SlotIndex>(
    manager: &CacheManager<I>,
    command: &Command,
) -> Result<String, CommandError> {
    debug!(operation = %command.operation, target = command.target, "execute");

    match command.operation {
        Operation::Create => {
            let capacity = parse_capacity::<I>(&command.value)?;
            manager.create_cache(command.name.as_str(), command.target, capacity);
            Ok(OK.to_string())
        },
        Operation::Destroy => {
            if !manager.destroy_cache(command.target) {
                return Err(CommandError::CacheNotFound);
            }
            Ok(OK.to_string())
        },
        Operation::List => {
            let lines = manager.list_caches();
            if lines.is_empty() {
                return Ok(NO_CACHES.to_string());
            }
            Ok(lines.join("\n"))
        },
        Operation::Set => {
            lookup(manager, command)?.put(command.key, command.value.clone());
            Ok(OK.to_string())
        },
        Operation::Get => {
            let value = lookup(manager, command)?
                .get(&command.key)
                .ok_or(CommandError::KeyNotFound)?;
            Ok(String::from_utf8_lossy(&value).into_owned())
        },
        Operation::Del => {
            lookup(manager, command)?.eject(&command.key);
            Ok(OK.to_string())
        },
        Operation::Print => {
            let lines = lookup(manager, command)?.dump();
            if lines.is_empty() {
                return Ok(EMPTY_CACHE.to_string());
            }
            Ok(lines.join("\n"))
        },
        Operation::Clear => {
            lookup(manager, command)?.clear();
            Ok(OK.to_string())
        },
        Operation::ClearAll => {
            manager.clear_all_caches();
            Ok(OK.to_string())
        },
        Operation::Help => Ok(HELP_TEXT.to_string()),
        Operation::Exit => Ok(String::new()),
    }
}
