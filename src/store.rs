//! Remembering which device path the PSU was last found on.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

/// Path of a serial endpoint, e.g. `/dev/ttyACM0`. Not checked until it is probed.
pub type DevicePath = String;

/// Name of the file, in the user's home directory, holding the remembered path.
pub const STORE_FILE_NAME: &str = ".korad-power-supply";

/// Persistent record of the last device path the PSU was discovered on.
pub trait DeviceStore {
    type Error: core::fmt::Debug + core::fmt::Display;

    /// The remembered path, or `None` if nothing usable is stored.
    fn load(&mut self) -> Option<DevicePath>;

    /// Overwrite the remembered path.
    fn save(&mut self, path: &str) -> Result<(), Self::Error>;
}

/// Stores the path as a single line of text in a file.
#[derive(Debug, Clone)]
pub struct FileStore {
    file: PathBuf,
}

impl FileStore {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    /// The per-user store, `~/.korad-power-supply`.
    ///
    /// Returns `None` when the home directory cannot be determined.
    pub fn in_home() -> Option<Self> {
        let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))?;
        Some(Self::new(Path::new(&home).join(STORE_FILE_NAME)))
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl DeviceStore for FileStore {
    type Error = io::Error;

    fn load(&mut self) -> Option<DevicePath> {
        match fs::read_to_string(&self.file) {
            Ok(contents) => {
                let path = contents.trim();
                (!path.is_empty()).then(|| path.to_owned())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(file = %self.file.display(), "no remembered device");
                None
            }
            Err(e) => {
                warn!(file = %self.file.display(), error = %e, "cannot read remembered device");
                None
            }
        }
    }

    fn save(&mut self, path: &str) -> Result<(), io::Error> {
        fs::write(&self.file, path)
    }
}

/// Keeps the path in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    path: Option<DevicePath>,
    saves: usize,
}

impl MemoryStore {
    pub fn new(path: Option<&str>) -> Self {
        Self {
            path: path.map(str::to_owned),
            saves: 0,
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// How many times [`DeviceStore::save`] was called.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl DeviceStore for MemoryStore {
    type Error = core::convert::Infallible;

    fn load(&mut self) -> Option<DevicePath> {
        self.path.clone()
    }

    fn save(&mut self, path: &str) -> Result<(), Self::Error> {
        self.path = Some(path.to_owned());
        self.saves += 1;
        Ok(())
    }
}
