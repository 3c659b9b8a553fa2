//! We use this mocking module in unit tests to emulate the PSU's serial port.
//!
//! A [`MockSerial`] is a shared handle: the test keeps one copy to script replies and inspect
//! what was written, while [`MockConnector`] hands out sessions backed by the same state.

use std::{cell::RefCell, rc::Rc};

use crate::transport::Connector;

struct MockState {
    /// Buffer to store data written to the mock serial port
    write_buffer: heapless::Vec<u8, 256>,
    /// Buffer containing pre-configured response data to be read
    read_buffer: heapless::Vec<u8, 256>,
    /// Current position in the read buffer
    read_position: usize,
    /// Maximum number of bytes a single write call accepts
    write_limit: Option<usize>,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
    sessions_opened: usize,
    sessions_live: usize,
}

/// Our mock type used to emulate a serial port.
#[derive(Clone)]
pub struct MockSerial {
    state: Rc<RefCell<MockState>>,
}

#[derive(thiserror::Error, Debug)]
pub enum MockSerialError {
    /// Simulated read timeout, also returned once the read data is exhausted
    #[error("Simulated read timeout")]
    Timeout,
    /// Simulated buffer overflow
    #[error("Simulated buffer overflow")]
    BufferOverflow,
    /// No device behind the requested path
    #[error("No mock device at this path")]
    NotFound,
    /// Generic simulated error for testing
    #[error("Simulated serial error")]
    SimulatedError,
}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::Timeout => embedded_io::ErrorKind::TimedOut,
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::NotFound => embedded_io::ErrorKind::NotFound,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                write_buffer: heapless::Vec::new(),
                read_buffer: heapless::Vec::new(),
                read_position: 0,
                write_limit: None,
                should_error_on_write: false,
                should_error_on_read: false,
                sessions_opened: 0,
                sessions_live: 0,
            })),
        }
    }

    /// Create a MockSerial that answers with `data`.
    pub fn with_reply(data: &[u8]) -> Self {
        let mock = Self::new();
        mock.set_read_data(data).unwrap();
        mock
    }

    /// Set the data that will be returned when read() is called
    pub fn set_read_data(&self, data: &[u8]) -> Result<(), MockSerialError> {
        let mut state = self.state.borrow_mut();
        state.read_buffer.clear();
        state.read_position = 0;
        state
            .read_buffer
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Get a copy of the data that was written to this mock serial port
    pub fn written_data(&self) -> Vec<u8> {
        self.state.borrow().write_buffer.to_vec()
    }

    /// Accept at most `limit` bytes per write call.
    pub fn set_write_limit(&self, limit: Option<usize>) {
        self.state.borrow_mut().write_limit = limit;
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&self, should_error: bool) {
        self.state.borrow_mut().should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&self, should_error: bool) {
        self.state.borrow_mut().should_error_on_read = should_error;
    }

    /// How many sessions have been opened on this port.
    pub fn sessions_opened(&self) -> usize {
        self.state.borrow().sessions_opened
    }

    /// How many sessions are currently open (not yet dropped).
    pub fn sessions_live(&self) -> usize {
        self.state.borrow().sessions_live
    }
}

/// An open session on a [`MockSerial`]. Dropping it closes the session.
pub struct MockSession(MockSerial);

impl Drop for MockSession {
    fn drop(&mut self) {
        self.0.state.borrow_mut().sessions_live -= 1;
    }
}

impl embedded_io::ErrorType for MockSession {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSession {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut state = self.0.state.borrow_mut();
        if state.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        let accepted = state.write_limit.map_or(buf.len(), |limit| buf.len().min(limit));
        state
            .write_buffer
            .extend_from_slice(&buf[..accepted])
            .map_err(|_| MockSerialError::BufferOverflow)?;

        Ok(accepted)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.0.state.borrow().should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSession {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut state = self.0.state.borrow_mut();
        if state.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        if state.read_position >= state.read_buffer.len() {
            return Err(MockSerialError::Timeout);
        }

        let start = state.read_position;
        let bytes_to_read = buf.len().min(state.read_buffer.len() - start);
        buf[..bytes_to_read].copy_from_slice(&state.read_buffer[start..start + bytes_to_read]);

        state.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

/// Hands out sessions on mock ports registered under a path.
///
/// Opening a path that was never registered fails with [`MockSerialError::NotFound`].
#[derive(Default)]
pub struct MockConnector {
    ports: Vec<(String, MockSerial)>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `port` under `path`.
    pub fn with_port(mut self, path: &str, port: &MockSerial) -> Self {
        self.ports.push((path.into(), port.clone()));
        self
    }
}

impl Connector for MockConnector {
    type Port = MockSession;

    fn open(&mut self, path: &str) -> Result<MockSession, MockSerialError> {
        let (_, port) = self
            .ports
            .iter()
            .find(|(registered, _)| registered == path)
            .ok_or(MockSerialError::NotFound)?;

        {
            let mut state = port.state.borrow_mut();
            state.sessions_opened += 1;
            state.sessions_live += 1;
        }
        Ok(MockSession(port.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, Write};

    fn open_session(mock: &MockSerial) -> MockSession {
        MockConnector::new()
            .with_port("/dev/mock", mock)
            .open("/dev/mock")
            .unwrap()
    }

    #[test]
    fn test_new_mock_serial() {
        let mock = MockSerial::new();
        assert!(mock.written_data().is_empty());
        assert_eq!(mock.sessions_opened(), 0);
        assert_eq!(mock.sessions_live(), 0);
    }

    #[test]
    fn test_write_multiple_times() {
        let mock = MockSerial::new();
        let mut session = open_session(&mock);

        session.write(b"Hello, ").unwrap();
        session.write(b"World!").unwrap();

        assert_eq!(mock.written_data(), b"Hello, World!");
    }

    #[test]
    fn test_write_limit_simulates_short_write() {
        let mock = MockSerial::new();
        mock.set_write_limit(Some(3));
        let mut session = open_session(&mock);

        let result = session.write(b"VSET1:5\n");
        assert_eq!(result.unwrap(), 3);
        assert_eq!(mock.written_data(), b"VSE");
    }

    #[test]
    fn test_write_buffer_overflow() {
        let mock = MockSerial::new();
        let mut session = open_session(&mock);

        let result = session.write(&[0u8; 300]); // Larger than 256 byte capacity
        assert!(matches!(result, Err(MockSerialError::BufferOverflow)));
    }

    #[test]
    fn test_read_partial_data() {
        let mock = MockSerial::with_reply(b"Long response data");
        let mut session = open_session(&mock);

        let mut buffer = [0u8; 5];
        assert_eq!(session.read(&mut buffer).unwrap(), 5);
        assert_eq!(&buffer, b"Long ");
    }

    #[test]
    fn test_read_timeout_after_data_exhausted() {
        let mock = MockSerial::with_reply(b"Hi");
        let mut session = open_session(&mock);

        let mut buffer = [0u8; 10];
        assert_eq!(session.read(&mut buffer).unwrap(), 2);

        let result = session.read(&mut buffer);
        assert!(matches!(result, Err(MockSerialError::Timeout)));
    }

    #[test]
    fn test_error_simulation() {
        let mock = MockSerial::with_reply(b"data");
        mock.set_write_error(true);
        mock.set_read_error(true);
        let mut session = open_session(&mock);

        assert!(matches!(session.write(b"test"), Err(MockSerialError::SimulatedError)));
        assert!(matches!(session.flush(), Err(MockSerialError::SimulatedError)));
        assert!(matches!(session.read(&mut [0u8; 4]), Err(MockSerialError::SimulatedError)));
        assert!(mock.written_data().is_empty());
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(MockSerialError::Timeout.kind(), embedded_io::ErrorKind::TimedOut));
        assert!(matches!(MockSerialError::BufferOverflow.kind(), embedded_io::ErrorKind::OutOfMemory));
        assert!(matches!(MockSerialError::NotFound.kind(), embedded_io::ErrorKind::NotFound));
        assert!(matches!(MockSerialError::SimulatedError.kind(), embedded_io::ErrorKind::Other));
    }

    #[test]
    fn test_session_tracking() {
        let mock = MockSerial::new();
        let mut connector = MockConnector::new().with_port("/dev/mock", &mock);

        let session = connector.open("/dev/mock").unwrap();
        assert_eq!(mock.sessions_live(), 1);
        drop(session);

        assert_eq!(mock.sessions_opened(), 1);
        assert_eq!(mock.sessions_live(), 0);
    }

    #[test]
    fn test_unknown_path_fails_to_open() {
        let mut connector = MockConnector::new().with_port("/dev/mock", &MockSerial::new());
        assert!(matches!(connector.open("/dev/other"), Err(MockSerialError::NotFound)));
    }

    #[test]
    fn test_error_display_and_kind() {
        let error = MockSerialError::Timeout;
        assert_eq!(error.to_string(), "Simulated read timeout");
        assert_eq!(error.kind(), embedded_io::ErrorKind::TimedOut);

        let wrapped = crate::error::Error::SerialError(MockSerialError::NotFound);
        assert_eq!(wrapped.to_string(), "Serial communication error");
        assert!(std::error::Error::source(&wrapped).is_none());
    }
}
