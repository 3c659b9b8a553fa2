//! The operations a caller can run against a PSU, and parsing them from command line tokens.
//!
//! Tokens are consumed as a sequence of verbs, each followed by its arguments:
//!
//! * `query NAME` (or any word starting with `q`)
//! * `command NAME` (or any word starting with `c`)
//! * `set NAME VALUE` (or any word starting with `s`)
//!
//! e.g. `q vset1? q iset1? set vset1 12.5 c out1`.

use core::fmt;

use crate::{
    error::{Error, Result},
    protocol::{KoradPsu, STATUS_QUERY},
    status::StatusReport,
    transport::{Connector, PortError},
};

/// One operation against the PSU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation<'a> {
    /// Text query, answered by one line.
    Query(&'a str),
    /// The `STATUS?` query, answered by a status byte.
    Status,
    /// Bare command, no reply.
    Command(&'a str),
    /// Set a parameter, no reply.
    Set { name: &'a str, value: &'a str },
}

/// What an [`Operation`] produced.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<const L: usize> {
    Reply(heapless::String<L>),
    Status(StatusReport),
    Done,
}

impl<const L: usize> fmt::Display for Outcome<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Reply(text) => f.write_str(text),
            Outcome::Status(report) => fmt::Display::fmt(report, f),
            Outcome::Done => Ok(()),
        }
    }
}

impl<'a> Operation<'a> {
    /// Build a query, switching to [`Operation::Status`] for `STATUS?` in any case.
    pub fn query(name: &'a str) -> Self {
        if name.eq_ignore_ascii_case(STATUS_QUERY) {
            Operation::Status
        } else {
            Operation::Query(name)
        }
    }

    /// Command name this operation sends.
    pub fn name(&self) -> &'a str {
        match *self {
            Operation::Query(name) | Operation::Command(name) => name,
            Operation::Status => STATUS_QUERY,
            Operation::Set { name, .. } => name,
        }
    }

    /// Run this operation against `psu`.
    pub fn execute<C: Connector, const L: usize>(
        &self,
        psu: &mut KoradPsu<'_, C, L>,
    ) -> Result<Outcome<L>, PortError<C>> {
        match *self {
            Operation::Query(name) => psu.query(name).map(Outcome::Reply),
            Operation::Status => {
                let reply = psu.query_raw(STATUS_QUERY)?;
                // query_raw never returns an empty reply.
                let report = StatusReport::from_reply(&reply).ok_or(Error::NoReply)?;
                Ok(Outcome::Status(report))
            }
            Operation::Command(name) => psu.command(name).map(|()| Outcome::Done),
            Operation::Set { name, value } => psu.set(name, value).map(|()| Outcome::Done),
        }
    }
}

/// Why a token sequence could not be turned into operations.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError<'a> {
    #[error("Unknown verb `{0}`, expected query, command or set")]
    UnknownVerb(&'a str),
    #[error("`{0}` needs a name")]
    MissingName(&'a str),
    #[error("`set {0}` needs a value")]
    MissingValue(&'a str),
}

/// Iterator turning command line tokens into [`Operation`]s.
///
/// Verbs are matched on their first letter, ignoring case.
pub struct Operations<'a, S> {
    tokens: core::slice::Iter<'a, S>,
}

/// Parse `tokens` lazily into operations.
pub fn parse_operations<S: AsRef<str>>(tokens: &[S]) -> Operations<'_, S> {
    Operations {
        tokens: tokens.iter(),
    }
}

impl<'a, S: AsRef<str>> Operations<'a, S> {
    fn argument(&mut self) -> Option<&'a str> {
        self.tokens.next().map(|token| token.as_ref())
    }
}

impl<'a, S: AsRef<str>> Iterator for Operations<'a, S> {
    type Item = core::result::Result<Operation<'a>, ParseError<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let verb = self.argument()?;

        let operation = match verb.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('q') => self
                .argument()
                .map(Operation::query)
                .ok_or(ParseError::MissingName(verb)),
            Some('c') => self
                .argument()
                .map(Operation::Command)
                .ok_or(ParseError::MissingName(verb)),
            Some('s') => match self.argument() {
                Some(name) => self
                    .argument()
                    .map(|value| Operation::Set { name, value })
                    .ok_or(ParseError::MissingValue(name)),
                None => Err(ParseError::MissingName(verb)),
            },
            _ => Err(ParseError::UnknownVerb(verb)),
        };
        Some(operation)
    }
}
