//! Command parser for inbound (host to device) protocol lines.
//!
//! Recognized forms:
//!
//! ```text
//! HELLO
//! SET <key> <value>
//! GET <key>
//! READ <key> <type>
//! WRITE <key> <type> <value>
//! CMD <path>
//! PING | STATUS | LIST | TEST
//! ```
//!
//! Any other first token yields [`Command::Unknown`] with the whole line;
//! unknown verbs are a runtime concept, not a syntax error.

use core::fmt;

use crate::key::KeyRef;

/// Parse errors for lines with a known verb but malformed arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// The line is empty after trimming.
    Empty,
    /// The line is not valid UTF-8.
    Encoding,
    /// A key argument is missing.
    MissingKey,
    /// A value argument is missing.
    MissingValue,
    /// A type argument is missing.
    MissingType,
    /// `CMD` without a path.
    MissingPath,
    /// Unbalanced or misplaced brackets in a key.
    InvalidKey,
    /// Array index is not an integer.
    InvalidIndex,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::Encoding => write!(f, "invalid UTF-8"),
            Self::MissingKey => write!(f, "missing key"),
            Self::MissingValue => write!(f, "missing value"),
            Self::MissingType => write!(f, "missing type"),
            Self::MissingPath => write!(f, "missing command path"),
            Self::InvalidKey => write!(f, "malformed key"),
            Self::InvalidIndex => write!(f, "array index is not an integer"),
        }
    }
}

/// Verb of a command, without its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verb {
    Hello,
    Set,
    Get,
    Read,
    Write,
    Cmd,
    Ping,
    Status,
    List,
    Test,
    Unknown,
}

impl Verb {
    /// Match a verb token. Verbs are case-sensitive.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            "HELLO" => Self::Hello,
            "SET" => Self::Set,
            "GET" => Self::Get,
            "READ" => Self::Read,
            "WRITE" => Self::Write,
            "CMD" => Self::Cmd,
            "PING" => Self::Ping,
            "STATUS" => Self::Status,
            "LIST" => Self::List,
            "TEST" => Self::Test,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hello => "HELLO",
            Self::Set => "SET",
            Self::Get => "GET",
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Cmd => "CMD",
            Self::Ping => "PING",
            Self::Status => "STATUS",
            Self::List => "LIST",
            Self::Test => "TEST",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// A parsed command, borrowing from the line it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command<'a> {
    Hello,
    Set { key: KeyRef<'a>, value: &'a str },
    Get { key: KeyRef<'a> },
    Read { key: KeyRef<'a>, kind: &'a str },
    Write { key: KeyRef<'a>, kind: &'a str, value: &'a str },
    Cmd { path: &'a str },
    Ping,
    Status,
    List,
    Test,
    /// Unrecognized verb; `line` is the full trimmed line.
    Unknown { line: &'a str },
}

impl<'a> Command<'a> {
    #[must_use]
    pub const fn verb(&self) -> Verb {
        match self {
            Self::Hello => Verb::Hello,
            Self::Set { .. } => Verb::Set,
            Self::Get { .. } => Verb::Get,
            Self::Read { .. } => Verb::Read,
            Self::Write { .. } => Verb::Write,
            Self::Cmd { .. } => Verb::Cmd,
            Self::Ping => Verb::Ping,
            Self::Status => Verb::Status,
            Self::List => Verb::List,
            Self::Test => Verb::Test,
            Self::Unknown { .. } => Verb::Unknown,
        }
    }

    /// The key argument, for commands that take one.
    #[must_use]
    pub const fn key(&self) -> Option<&KeyRef<'a>> {
        match self {
            Self::Set { key, .. }
            | Self::Get { key }
            | Self::Read { key, .. }
            | Self::Write { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// Renders the command in wire form (without the line terminator).
impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set { key, value } => write!(f, "SET {} {}", key, value),
            Self::Get { key } => write!(f, "GET {}", key),
            Self::Read { key, kind } => write!(f, "READ {} {}", key, kind),
            Self::Write { key, kind, value } => write!(f, "WRITE {} {} {}", key, kind, value),
            Self::Cmd { path } => write!(f, "CMD {}", path),
            Self::Unknown { line } => f.write_str(line),
            other => f.write_str(other.verb().as_str()),
        }
    }
}

/// Parse a raw line (line ending allowed) into a [`Command`].
pub fn parse(line: &[u8]) -> Result<Command<'_>, ParseError> {
    let line = core::str::from_utf8(line).map_err(|_| ParseError::Encoding)?;
    parse_command(line)
}

/// Parse a text line into a [`Command`].
///
/// # Example
///
/// ```
/// use dataref_proto::{parse_command, Command};
///
/// let cmd = parse_command("SET LED_STATE[3] 300").unwrap();
/// let Command::Set { key, value } = cmd else { panic!() };
/// assert_eq!(key.name(), "LED_STATE");
/// assert_eq!(key.index(), Some(3));
/// assert_eq!(value, "300");
/// ```
pub fn parse_command(line: &str) -> Result<Command<'_>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let (verb, rest) = match line.split_once(' ') {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    Ok(match Verb::from_token(verb) {
        Verb::Hello => Command::Hello,
        Verb::Ping => Command::Ping,
        Verb::Status => Command::Status,
        Verb::List => Command::List,
        Verb::Test => Command::Test,
        Verb::Set => {
            let (key, value) = split_last(rest).ok_or(missing(rest, ParseError::MissingValue))?;
            Command::Set {
                key: KeyRef::parse(key)?,
                value,
            }
        }
        Verb::Get => Command::Get {
            key: KeyRef::parse(rest)?,
        },
        Verb::Read => {
            let (key, kind) = rest
                .split_once(' ')
                .ok_or(missing(rest, ParseError::MissingType))?;
            Command::Read {
                key: KeyRef::parse(key)?,
                kind: kind.trim(),
            }
        }
        Verb::Write => {
            let (key, tail) = rest
                .split_once(' ')
                .ok_or(missing(rest, ParseError::MissingType))?;
            let (kind, value) = split_last(tail.trim()).ok_or(ParseError::MissingValue)?;
            Command::Write {
                key: KeyRef::parse(key)?,
                kind,
                value,
            }
        }
        Verb::Cmd => {
            if rest.is_empty() {
                return Err(ParseError::MissingPath);
            }
            Command::Cmd { path: rest }
        }
        Verb::Unknown => Command::Unknown { line },
    })
}

/// Split at the last space: everything before (trimmed) and everything after.
#[inline]
fn split_last(s: &str) -> Option<(&str, &str)> {
    let (head, tail) = s.rsplit_once(' ')?;
    let head = head.trim_end();
    if head.is_empty() || tail.is_empty() {
        return None;
    }
    Some((head, tail))
}

/// `MissingKey` when there are no arguments at all, otherwise `err`.
#[inline]
fn missing(rest: &str, err: ParseError) -> ParseError {
    if rest.is_empty() {
        ParseError::MissingKey
    } else {
        err
    }
}
