//! # Saved Printer Record
//!
//! The last successfully connected printer is remembered across restarts
//! under a fixed key:
//!
//! ```json
//! { "connected_printer": { "id": "AA:BB:CC:DD:EE:FF", "name": "Printer1" } }
//! ```
//!
//! It is written on every successful connect and removed on an explicit
//! disconnect. An absent record means "never connected" or "explicitly
//! disconnected". The record is only a hint: reconnecting always goes
//! through a real connect and service discovery.
//!
//! [`FileStore`] keeps the map in a JSON file readable only by the current
//! user; [`MemoryStore`] keeps it in memory for tests and embedding.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::{debug, info};
use tokio::io::AsyncWriteExt;
use serde::{Deserialize, Serialize};

use crate::ble::DeviceDescriptor;
use crate::error::{Result, SudsyError};
use crate::printer::settings::project_dirs;

/// Key under which the record is stored.
pub const CONNECTED_PRINTER_KEY: &str = "connected_printer";

const STORE_FILE_NAME: &str = "store.json";

/// The persisted `{ id, name }` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPrinter {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl From<&DeviceDescriptor> for SavedPrinter {
    fn from(device: &DeviceDescriptor) -> Self {
        Self {
            id: device.id.clone(),
            name: device.name.clone().unwrap_or_default(),
        }
    }
}

impl From<SavedPrinter> for DeviceDescriptor {
    fn from(saved: SavedPrinter) -> Self {
        let name = (!saved.name.is_empty()).then_some(saved.name);
        DeviceDescriptor::new(saved.id, name)
    }
}

/// Where the saved printer record lives.
#[async_trait]
pub trait PrinterStore: Send + Sync + 'static {
    async fn load(&self) -> Result<Option<SavedPrinter>>;

    async fn save(&self, printer: &SavedPrinter) -> Result<()>;

    /// Remove the record. Removing an absent record is not an error.
    async fn clear(&self) -> Result<()>;
}

// ============================================================================
// FILE STORE
// ============================================================================

/// JSON key-value file in the platform data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform default location (e.g.
    /// `~/.local/share/sudsy/store.json` on Linux).
    pub fn open_default() -> Result<Self> {
        project_dirs()
            .map(|dirs| Self::new(dirs.data_dir().join(STORE_FILE_NAME)))
            .ok_or(SudsyError::NoConfigPath)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<HashMap<String, serde_json::Value>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_map(&self, map: &HashMap<String, serde_json::Value>) -> Result<()> {
        if let Some(directory) = self.path.parent() {
            tokio::fs::create_dir_all(directory).await?;
        }
        let content = serde_json::to_string_pretty(map)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&self.path).await?;

        // The mode only applies on creation; tighten files from older runs.
        restrict_permissions(&self.path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[async_trait]
impl PrinterStore for FileStore {
    async fn load(&self) -> Result<Option<SavedPrinter>> {
        let mut map = self.read_map().await?;
        match map.remove(CONNECTED_PRINTER_KEY) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, printer: &SavedPrinter) -> Result<()> {
        let mut map = self.read_map().await?;
        map.insert(CONNECTED_PRINTER_KEY.to_string(), serde_json::to_value(printer)?);
        self.write_map(&map).await?;
        info!("Saved printer {} to {}", printer.id, self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut map = self.read_map().await?;
        if map.remove(CONNECTED_PRINTER_KEY).is_some() {
            self.write_map(&map).await?;
            debug!("Cleared saved printer in {}", self.path.display());
        }
        Ok(())
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value for `key`, as JSON text.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PrinterStore for MemoryStore {
    async fn load(&self) -> Result<Option<SavedPrinter>> {
        match self.raw(CONNECTED_PRINTER_KEY) {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, printer: &SavedPrinter) -> Result<()> {
        let json = serde_json::to_string(printer)?;
        self.lock().insert(CONNECTED_PRINTER_KEY.to_string(), json);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.lock().remove(CONNECTED_PRINTER_KEY);
        Ok(())
    }
}
