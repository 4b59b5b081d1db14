//! Typed commands and the line parser.

use std::fmt;

use bytes::Bytes;

use crate::error::CommandError;
use crate::manager::{CacheId, EntryKey};
use crate::protocol::hash::hash_bytes;

/// Operation named by the first token of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Destroy,
    List,
    Set,
    Get,
    Del,
    Print,
    Clear,
    ClearAll,
    Help,
    /// `EXIT` or `QUIT`.
    Exit,
}

impl Operation {
    /// Looks up an operation by its uppercased token.
    pub fn from_token(token: &str) -> Option<Self> {
        let op = match token {
            "CREATE" => Operation::Create,
            "DESTROY" => Operation::Destroy,
            "LIST" => Operation::List,
            "SET" => Operation::Set,
            "GET" => Operation::Get,
            "DEL" => Operation::Del,
            "PRINT" => Operation::Print,
            "CLEAR" => Operation::Clear,
            "CLEAR_ALL" => Operation::ClearAll,
            "HELP" => Operation::Help,
            "EXIT" | "QUIT" => Operation::Exit,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Destroy => "DESTROY",
            Operation::List => "LIST",
            Operation::Set => "SET",
            Operation::Get => "GET",
            Operation::Del => "DEL",
            Operation::Print => "PRINT",
            Operation::Clear => "CLEAR",
            Operation::ClearAll => "CLEAR_ALL",
            Operation::Help => "HELP",
            Operation::Exit => "QUIT",
        }
    }

    /// Usage line reported on an arity mismatch.
    pub fn usage(self) -> &'static str {
        match self {
            Operation::Create => "CREATE <cache_name> <capacity>",
            Operation::Destroy => "DESTROY <cache_name>",
            Operation::List => "LIST",
            Operation::Set => "SET <cache_name> <key> <value>",
            Operation::Get => "GET <cache_name> <key>",
            Operation::Del => "DEL <cache_name> <key>",
            Operation::Print => "PRINT <cache_name>",
            Operation::Clear => "CLEAR <cache_name>",
            Operation::ClearAll => "CLEAR_ALL",
            Operation::Help => "HELP",
            Operation::Exit => "QUIT",
        }
    }

    /// Accepted argument counts, excluding the operation token.
    fn arity(self) -> (usize, Option<usize>) {
        match self {
            Operation::Create => (2, Some(2)),
            Operation::Destroy | Operation::Print | Operation::Clear => (1, Some(1)),
            Operation::Get | Operation::Del => (2, Some(2)),
            Operation::Set => (3, None),
            Operation::List | Operation::ClearAll | Operation::Help | Operation::Exit => {
                (0, Some(0))
            },
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed request line.
///
/// Fields an operation does not use are left at their defaults: `0` for
/// identifiers, empty for `name` and `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub operation: Operation,
    /// Hashed cache name.
    pub target: CacheId,
    /// Hashed entry key.
    pub key: EntryKey,
    /// Raw cache name, kept for display.
    pub name: String,
    /// SET payload, or the CREATE capacity literal.
    pub value: Bytes,
}

impl Command {
    fn bare(operation: Operation) -> Self {
        Self {
            operation,
            target: 0,
            key: 0,
            name: String::new(),
            value: Bytes::new(),
        }
    }
}

/// Splits on spaces, dropping empty tokens.
fn tokenize(line: &[u8]) -> Vec<&[u8]> {
    line.split(|&b| b == b' ')
        .filter(|token| !token.is_empty())
        .collect()
}

fn trim_line_ending(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = line {
        line = rest;
    }
    line
}

/// Parses one request line.
///
/// Trailing `\r`/`\n` are ignored, runs of spaces collapse, and the
/// operation token is matched case-insensitively. SET joins its remaining
/// tokens with a single space.
///
/// ```
/// use lrue::protocol::{Operation, hash_bytes, parse};
///
/// let cmd = parse(b"set  users 42 hello   world\r\n").unwrap();
/// assert_eq!(cmd.operation, Operation::Set);
/// assert_eq!(cmd.target, hash_bytes(b"users"));
/// assert_eq!(cmd.key, hash_bytes(b"42"));
/// assert_eq!(cmd.value, "hello world");
/// ```
pub fn parse(line: &[u8]) -> Result<Command, CommandError> {
    let tokens = tokenize(trim_line_ending(line));
    let (head, args) = tokens.split_first().ok_or(CommandError::Empty)?;

    let token = String::from_utf8_lossy(head).to_ascii_uppercase();
    let operation =
        Operation::from_token(&token).ok_or(CommandError::UnknownOperation(token))?;

    let (min, max) = operation.arity();
    if args.len() < min || max.is_some_and(|max| args.len() > max) {
        return Err(CommandError::Usage(operation.usage()));
    }

    let mut command = Command::bare(operation);
    if let Some(name) = args.first() {
        command.target = hash_bytes(name);
        command.name = String::from_utf8_lossy(name).into_owned();
    }

    match operation {
        Operation::Create => {
            command.value = Bytes::copy_from_slice(args[1]);
        },
        Operation::Get | Operation::Del => {
            command.key = hash_bytes(args[1]);
        },
        Operation::Set => {
            command.key = hash_bytes(args[1]);
            command.value = Bytes::from(args[2..].join(&b' '));
        },
        _ => {},
    }

    Ok(command)
}
