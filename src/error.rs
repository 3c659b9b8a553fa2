//! Our error types for the KORAD power supplies.

use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for KORAD PSU communications.
///
/// `I` is the error type of the serial interface the PSU is reached through.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    SerialError(I),
    /// A query got an empty reply, or the read timed out before a reply arrived.
    #[error("No reply from device")]
    NoReply,
    /// The interface accepted fewer bytes than the frame holds.
    ///
    /// Write-only frames are never acknowledged, so this is the only failure we can see for them.
    #[error("Incomplete write: {written} of {expected} bytes accepted")]
    IncompleteWrite { written: usize, expected: usize },
    #[error("Device handle was not found")]
    DeviceNotFound,
    #[error("Frame exceeds buffer capacity")]
    BufferError,
    #[error("Invalid response received")]
    InvalidResponse,
    /// A command name would not survive the trip through the wire format.
    #[error("Command name must not contain ':'")]
    InvalidName,
}

/// Why a [`CommandFrame`](crate::protocol::CommandFrame) could not be built.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("Frame exceeds buffer capacity")]
    Overflow,
    /// The name of a `NAME:VALUE` frame holds a `:`, so the name would end early on the wire.
    #[error("Command name must not contain ':'")]
    SeparatorInName,
}

impl<I: embedded_io::Error> From<FrameError> for Error<I> {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Overflow => Error::BufferError,
            FrameError::SeparatorInName => Error::InvalidName,
        }
    }
}
