//! Device Registry
//!
//! Maps logical comm device names to filesystem paths. Entries live for the
//! lifetime of the registry and are never expired.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, PoisonError, RwLock};
use thiserror::Error;
use tracing::debug;

use crate::error::CommError;

/// Win32 `MAX_PATH`
pub const MAX_PATH: usize = 260;

/// Prefix that lets any name be defined, e.g. `\\.\ttyUSB0`
pub const DEVICE_NAMESPACE_PREFIX: &str = r"\\.\";

/// `COM1`-`COM9` and `LPT1`-`LPT9`
pub fn is_reserved_name(name: &str) -> bool {
    let Some(digit) = name
        .strip_prefix("COM")
        .or_else(|| name.strip_prefix("LPT"))
    else {
        return false;
    };
    matches!(digit.as_bytes(), [b'1'..=b'9'])
}

/// Logical name to path map
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, String>>,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, created on first use
    pub fn global() -> &'static DeviceRegistry {
        static REGISTRY: OnceLock<DeviceRegistry> = OnceLock::new();
        REGISTRY.get_or_init(DeviceRegistry::new)
    }

    /// Define a device
    ///
    /// The name must be reserved or carry the `\\.\` prefix, and must not be
    /// defined yet.
    pub fn define(&self, name: &str, target_path: &str) -> Result<(), CommError> {
        if !name.starts_with(DEVICE_NAMESPACE_PREFIX) && !is_reserved_name(name) {
            return Err(CommError::InvalidParameter("not a reserved comm device name"));
        }

        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        if devices.contains_key(name) {
            return Err(CommError::InvalidParameter("comm device already defined"));
        }
        debug!(device = name, target_path, "Defining comm device");
        devices.insert(name.to_string(), target_path.to_string());
        Ok(())
    }

    /// Look up the target path of a device
    ///
    /// `max_chars` is the caller's capacity in characters; the path is
    /// returned double-NUL terminated, so it needs `len + 2`.
    pub fn query(&self, name: &str, max_chars: usize) -> Result<String, CommError> {
        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        let path = devices
            .get(name)
            .ok_or_else(|| CommError::FileNotFound(name.to_string()))?;

        let required = path.len() + 2;
        if required > max_chars {
            return Err(CommError::InsufficientBuffer {
                required,
                available: max_chars,
            });
        }
        Ok(path.clone())
    }

    /// Resolve a name to a path, with `MAX_PATH` capacity
    pub fn resolve(&self, name: &str) -> Result<PathBuf, CommError> {
        self.query(name, MAX_PATH).map(PathBuf::from)
    }

    /// Whether `name` is a defined comm device
    pub fn is_comm_device(&self, name: &str) -> bool {
        self.query(name, MAX_PATH).is_ok()
    }

    /// Number of defined devices
    pub fn len(&self) -> usize {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no device is defined
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Define every device listed in `config`, stopping at the first rejected entry
    pub fn apply_config(&self, config: &RegistryConfig) -> Result<usize, CommError> {
        for mapping in &config.devices {
            self.define(&mapping.name, &mapping.path)?;
        }
        Ok(config.devices.len())
    }
}

/// Errors loading a registry configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// One `name -> path` mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMapping {
    /// Logical name, e.g. `COM5`
    pub name: String,
    /// Device path, e.g. `/dev/ttyS4`
    pub path: String,
}

/// Device mappings loaded from JSON
///
/// ```json
/// { "devices": [ { "name": "COM5", "path": "/dev/ttyS4" } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Mappings in definition order
    #[serde(default)]
    pub devices: Vec<DeviceMapping>,
}

impl RegistryConfig {
    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
