//! This crate provides an interface for discovering and controlling KORAD KD3305P bench power
//! supplies over their serial link.
//!
//! The PSU speaks a line-oriented ASCII protocol: each command is an uppercased name, optionally
//! followed by `:` and a value, terminated by a newline. Queries end in `?` and are answered with
//! one line; everything else gets no reply.
//!
//! The serial port used for PSU comms should be configured like so:
//! * Baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//!
//! The codec ([`protocol`]) and status decoder ([`status`]) work in `no_std` environments over
//! any [`embedded_io`] interface. Discovery ([`locator`]), the remembered device path ([`store`])
//! and the [`serialport`](https://docs.rs/serialport) backed transport ([`serial`]) need the
//! `std` feature.
//!
//! ```no_run
//! use korad_psu::{
//!     locator::{DeviceLocator, SerialPortScan},
//!     protocol::KoradPsu,
//!     serial::SerialConnector,
//!     store::FileStore,
//! };
//!
//! let store = FileStore::in_home().unwrap();
//! let mut locator = DeviceLocator::new(SerialConnector::default(), store, SerialPortScan::default());
//! let path = locator.locate().unwrap();
//!
//! let mut psu: KoradPsu<_> = KoradPsu::new(SerialConnector::default(), &path);
//! psu.set("vset1", "12.00").unwrap();
//! println!("{}", psu.query("vset1?").unwrap());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod error;
pub mod operation;
pub mod protocol;
pub mod status;
pub mod transport;

#[cfg(feature = "std")]
pub mod locator;
#[cfg(feature = "std")]
pub mod serial;
#[cfg(feature = "std")]
pub mod store;

#[cfg(all(test, feature = "std"))]
mod mock_serial;
