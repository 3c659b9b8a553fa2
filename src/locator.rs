//! Finding the serial device the PSU is attached to.
//!
//! Candidates are probed in order with `*IDN?`: first the path remembered from the last
//! successful discovery, then every serial device the system lists. The first one answering
//! with [`DEVICE_ID`] wins and is remembered for next time.

use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    protocol::{DEVICE_ID, KoradPsu},
    store::{DevicePath, DeviceStore},
    transport::{Connector, PortError},
};

/// Prefix of the device files the KD3305P shows up as on Linux.
pub const SERIAL_DEVICE_PREFIX: &str = "/dev/ttyACM";

/// Lists device paths that might have a PSU behind them.
pub trait CandidateSource {
    fn candidates(&mut self) -> Vec<DevicePath>;
}

impl CandidateSource for Vec<DevicePath> {
    fn candidates(&mut self) -> Vec<DevicePath> {
        self.clone()
    }
}

/// Serial ports reported by the system whose path starts with a prefix.
#[derive(Debug, Clone)]
pub struct SerialPortScan {
    prefix: String,
}

impl SerialPortScan {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for SerialPortScan {
    fn default() -> Self {
        Self::new(SERIAL_DEVICE_PREFIX)
    }
}

impl CandidateSource for SerialPortScan {
    fn candidates(&mut self) -> Vec<DevicePath> {
        match serialport::available_ports() {
            Ok(ports) => ports
                .into_iter()
                .map(|port| port.port_name)
                .filter(|name| name.starts_with(&self.prefix))
                .collect(),
            Err(e) => {
                warn!(error = %e, "cannot list serial ports");
                Vec::new()
            }
        }
    }
}

/// Probes candidate paths for a KD3305P and remembers where it was found.
pub struct DeviceLocator<C, S, D> {
    connector: C,
    store: S,
    source: D,
}

impl<C: Connector, S: DeviceStore, D: CandidateSource> DeviceLocator<C, S, D> {
    pub fn new(connector: C, store: S, source: D) -> Self {
        Self {
            connector,
            store,
            source,
        }
    }

    /// Find the PSU.
    ///
    /// Candidates that cannot be opened, stay silent or identify as something else are skipped.
    /// Fails with [`Error::DeviceNotFound`] once every candidate has been tried.
    pub fn locate(&mut self) -> Result<DevicePath, PortError<C>> {
        let remembered = self.store.load();

        let mut candidates: Vec<DevicePath> = remembered.iter().cloned().collect();
        candidates.extend(
            self.source
                .candidates()
                .into_iter()
                .filter(|path| remembered.as_ref() != Some(path)),
        );

        for candidate in candidates {
            if !self.probe(&candidate) {
                continue;
            }

            info!(path = %candidate, "found power supply");
            if remembered.as_ref() != Some(&candidate) {
                if let Err(e) = self.store.save(&candidate) {
                    warn!(path = %candidate, error = %e, "cannot remember device path");
                }
            }
            return Ok(candidate);
        }

        Err(Error::DeviceNotFound)
    }

    /// Whether `path` answers the identification query as a KD3305P.
    fn probe(&mut self, path: &str) -> bool {
        let mut psu: KoradPsu<'_, _> = KoradPsu::new(&mut self.connector, path);
        match psu.identify() {
            Ok(id) if id.starts_with(DEVICE_ID) => true,
            Ok(id) => {
                debug!(path, id = id.as_str(), "skipping candidate, not a KD3305P");
                false
            }
            Err(e) => {
                debug!(path, error = %e, "skipping candidate");
                false
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (C, S, D) {
        (self.connector, self.store, self.source)
    }
}
