//! The line-oriented ASCII protocol spoken by the KORAD PSUs.
//!
//! Every frame is an uppercased command name, optionally followed by `:` and a value, and
//! terminated by `\n`. Queries (`VSET1?`, `STATUS?`, `*IDN?`) get one reply line back, everything
//! else is fire-and-forget.

use embedded_io::Error as _;
use fugit::MillisDurationU32;
use tracing::debug;

use crate::{
    error::{Error, FrameError, Result},
    transport::{Connector, PortError},
};

/// Baud rate used by the KD3305P.
pub const BAUD_RATE: u32 = 9600;

/// How long to wait for a reply before treating it as empty.
pub const READ_TIMEOUT: MillisDurationU32 = MillisDurationU32::millis(500);

/// Query used to identify the device.
pub const IDENTIFY_QUERY: &str = "*IDN?";

/// Prefix of the identification reply of a KD3305P.
pub const DEVICE_ID: &str = "KORAD KD3305P";

/// Query returning the raw status byte, see [`crate::status`].
pub const STATUS_QUERY: &str = "STATUS?";

/// One outgoing message: `NAME\n` or `NAME:VALUE\n`.
///
/// The name is uppercased, the value is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame<const L: usize> {
    text: heapless::String<L>,
    name_len: usize,
    has_value: bool,
}

impl<const L: usize> CommandFrame<L> {
    /// Frame for a query or a bare command.
    ///
    /// The whole text is uppercased, so `vset1:5` goes out exactly like
    /// `with_value("vset1", "5")` and reads back as that name and value.
    pub fn new(name: &str) -> core::result::Result<Self, FrameError> {
        let mut text = heapless::String::new();
        push_upper(&mut text, name)?;
        let (name_len, has_value) = match text.find(':') {
            Some(index) => (index, true),
            None => (text.len(), false),
        };
        text.push('\n').map_err(|_| FrameError::Overflow)?;

        Ok(Self {
            text,
            name_len,
            has_value,
        })
    }

    /// Frame setting `name` to `value`.
    ///
    /// Fails with [`FrameError::SeparatorInName`] if `name` contains `:`.
    pub fn with_value(name: &str, value: &str) -> core::result::Result<Self, FrameError> {
        if name.contains(':') {
            return Err(FrameError::SeparatorInName);
        }
        let mut text = heapless::String::new();
        push_upper(&mut text, name)?;
        let name_len = text.len();
        text.push(':').map_err(|_| FrameError::Overflow)?;
        text.push_str(value).map_err(|_| FrameError::Overflow)?;
        text.push('\n').map_err(|_| FrameError::Overflow)?;

        Ok(Self {
            text,
            name_len,
            has_value: true,
        })
    }

    /// Parse a frame as it appears on the wire.
    ///
    /// The name ends at the first `:`. Returns `None` without the trailing newline.
    pub fn parse(line: &str) -> Option<Self> {
        let body = line.strip_suffix('\n')?;
        let (name_len, has_value) = match body.find(':') {
            Some(index) => (index, true),
            None => (body.len(), false),
        };
        let text = heapless::String::try_from(line).ok()?;

        Some(Self {
            text,
            name_len,
            has_value,
        })
    }

    pub fn name(&self) -> &str {
        &self.text[..self.name_len]
    }

    pub fn value(&self) -> Option<&str> {
        self.has_value
            .then(|| &self.text[self.name_len + 1..self.text.len() - 1])
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }
}

fn push_upper<const L: usize>(
    text: &mut heapless::String<L>,
    name: &str,
) -> core::result::Result<(), FrameError> {
    for upper in name.chars().flat_map(char::to_uppercase) {
        text.push(upper).map_err(|_| FrameError::Overflow)?;
    }
    Ok(())
}

/// A KORAD power supply reachable at a known path.
///
/// Each operation opens its own session through the connector and closes it before returning.
/// `L` bounds both outgoing frames and reply lines.
pub struct KoradPsu<'p, C: Connector, const L: usize = 128> {
    connector: C,
    path: &'p str,
}

impl<'p, C: Connector, const L: usize> KoradPsu<'p, C, L> {
    pub fn new(connector: C, path: &'p str) -> Self {
        Self { connector, path }
    }

    pub fn path(&self) -> &'p str {
        self.path
    }

    /// Send a query and return the reply with trailing whitespace removed.
    pub fn query(&mut self, name: &str) -> Result<heapless::String<L>, PortError<C>> {
        let reply = self.query_raw(name)?;
        let text = core::str::from_utf8(&reply).map_err(|_| Error::InvalidResponse)?;
        let text = text.trim_end();
        if text.is_empty() {
            return Err(Error::NoReply);
        }

        let mut trimmed = heapless::String::new();
        trimmed.push_str(text).map_err(|_| Error::BufferError)?;
        Ok(trimmed)
    }

    /// Send a query and return the reply bytes untouched, terminator included.
    ///
    /// Used for binary replies such as the status byte.
    pub fn query_raw(&mut self, name: &str) -> Result<heapless::Vec<u8, L>, PortError<C>> {
        let frame = CommandFrame::<L>::new(name)?;
        let mut port = self.connector.open(self.path).map_err(Error::SerialError)?;

        write_frame(&mut port, &frame)?;
        let reply = read_line::<_, L>(&mut port)?;
        debug!(path = self.path, query = frame.name(), bytes = reply.len(), "reply read");

        if reply.is_empty() {
            return Err(Error::NoReply);
        }
        Ok(reply)
    }

    /// Send a bare command such as `OUT1`.
    pub fn command(&mut self, name: &str) -> Result<(), PortError<C>> {
        let frame = CommandFrame::<L>::new(name)?;
        self.send(&frame)
    }

    /// Set `name` to `value`. The value is passed through as is; the device decides what it accepts.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), PortError<C>> {
        let frame = CommandFrame::<L>::with_value(name, value)?;
        self.send(&frame)
    }

    /// Ask the device to identify itself.
    pub fn identify(&mut self) -> Result<heapless::String<L>, PortError<C>> {
        self.query(IDENTIFY_QUERY)
    }

    fn send(&mut self, frame: &CommandFrame<L>) -> Result<(), PortError<C>> {
        let mut port = self.connector.open(self.path).map_err(Error::SerialError)?;

        let written = write_frame(&mut port, frame)?;
        if written != frame.as_bytes().len() {
            return Err(Error::IncompleteWrite {
                written,
                expected: frame.as_bytes().len(),
            });
        }
        Ok(())
    }
}

/// Write a frame with a single write call and report how many bytes the port accepted.
fn write_frame<P, const L: usize>(
    port: &mut P,
    frame: &CommandFrame<L>,
) -> Result<usize, P::Error>
where
    P: embedded_io::Write,
{
    let written = port.write(frame.as_bytes()).map_err(Error::SerialError)?;
    port.flush().map_err(Error::SerialError)?;
    debug!(frame = frame.as_str().trim_end(), written, "frame written");
    Ok(written)
}

/// Read up to and including the next `\n`.
///
/// A timeout ends the line early, so a silent device yields an empty line.
fn read_line<P, const L: usize>(port: &mut P) -> Result<heapless::Vec<u8, L>, P::Error>
where
    P: embedded_io::Read,
{
    let mut line: heapless::Vec<u8, L> = heapless::Vec::new();
    // One byte at a time so nothing past the terminator is consumed.
    let mut byte = [0u8; 1];
    loop {
        match port.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                line.push(byte[0]).map_err(|_| Error::BufferError)?;
                if byte[0] == b'\n' {
                    break;
                }
            }
            Err(e) if matches!(e.kind(), embedded_io::ErrorKind::TimedOut) => break,
            Err(e) => return Err(Error::SerialError(e)),
        }
    }
    Ok(line)
}
