//! The link between the codec and a physical device.
//!
//! A [`Connector`] opens one session per operation. The session is an ordinary
//! [`embedded_io::Read`] + [`embedded_io::Write`] value and is closed by dropping it, so every
//! exit path of an operation releases the port.
//!
//! Reads on a session are expected to give up after a bounded timeout and report it with
//! [`embedded_io::ErrorKind::TimedOut`]. The codec treats that the same as the device sending
//! nothing.

/// Opens sessions to a device identified by its path.
pub trait Connector {
    type Port: embedded_io::Read + embedded_io::Write;

    /// Open a new session to the device at `path`.
    fn open(
        &mut self,
        path: &str,
    ) -> Result<Self::Port, <Self::Port as embedded_io::ErrorType>::Error>;
}

/// The error type of the sessions opened by connector `C`.
pub type PortError<C> = <<C as Connector>::Port as embedded_io::ErrorType>::Error;

impl<C: Connector + ?Sized> Connector for &mut C {
    type Port = C::Port;

    fn open(
        &mut self,
        path: &str,
    ) -> Result<Self::Port, <Self::Port as embedded_io::ErrorType>::Error> {
        (**self).open(path)
    }
}
