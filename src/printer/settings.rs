//! # Runtime Settings
//!
//! Everything about a deployment that is not fixed by the hardware profile:
//! transport pacing, scan windows, label layout knobs and optional pinned
//! characteristics.
//!
//! ## Location
//!
//! Settings are read from an explicit path if one is given, otherwise from
//! `settings.json` in the platform config directory (e.g.
//! `~/.config/sudsy/settings.json` on Linux). A missing file means defaults.
//!
//! ## Format
//!
//! ```json
//! {
//!   "printer": { "name": "58mm label", "protocol": "raster",
//!                "widthBytes": 48, "columns": 32 },
//!   "chunkSize": 100,
//!   "chunkDelayMs": 5,
//!   "textScale": 2,
//!   "barcode": false
//! }
//! ```
//!
//! Every field is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories_next::ProjectDirs;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::config::PrinterConfig;
use crate::ble::CharacteristicPin;
use crate::error::{Result, SudsyError};
use crate::transport::ChunkConfig;

const SETTINGS_FILE_NAME: &str = "settings.json";

/// Largest accepted `textScale`. At 8 a 384-dot label fits six glyphs.
pub const MAX_TEXT_SCALE: usize = 8;

/// Platform directories for this application.
pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "sudsy", "sudsy")
}

/// Printer and transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrinterSettings {
    /// Hardware profile, including the wire protocol.
    pub printer: PrinterConfig,

    /// Bytes per BLE write.
    pub chunk_size: usize,

    /// Pause between chunk writes.
    pub chunk_delay_ms: u64,

    /// Pause between copies of a multi-label job.
    pub label_settle_ms: u64,

    /// How long an explicit scan runs before stopping itself.
    pub scan_timeout_secs: u64,

    /// How long a reconnect looks for a device the stack has not seen.
    pub reconnect_scan_secs: u64,

    /// Bitmap scale for body text on raster printers (1..=8).
    pub text_scale: usize,

    /// Raster heat level (1..=8).
    pub density: u8,

    /// Column budget for wrapping addresses.
    pub address_wrap: usize,

    /// Print the order id as a Code128 barcode (ESC/POS only).
    pub barcode: bool,

    /// Known (service, characteristic) pairs tried before first-writable.
    pub pinned_characteristics: Vec<CharacteristicPin>,
}

impl Default for PrinterSettings {
    fn default() -> Self {
        Self {
            printer: PrinterConfig::default(),
            chunk_size: 100,
            chunk_delay_ms: 5,
            label_settle_ms: 500,
            scan_timeout_secs: 10,
            reconnect_scan_secs: 5,
            text_scale: 2,
            density: 5,
            address_wrap: 20,
            barcode: false,
            pinned_characteristics: Vec::new(),
        }
    }
}

impl PrinterSettings {
    /// Default settings file location.
    pub fn default_path() -> Result<PathBuf> {
        project_dirs()
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE_NAME))
            .ok_or(SudsyError::NoConfigPath)
    }

    /// Load settings from `path`, or from [`default_path`](Self::default_path).
    ///
    /// A missing file yields defaults. A malformed file is an error.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                info!("Using settings file {}", path.display());
                Self::from_json(&content)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {}; using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Parse settings JSON. Missing fields take their defaults.
    pub fn from_json(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut settings: Self = serde_json::from_str(content)?;
        if settings.text_scale != settings.text_scale() {
            warn!(
                "textScale {} out of range; using {}",
                settings.text_scale,
                settings.text_scale()
            );
            settings.text_scale = settings.text_scale();
        }
        Ok(settings)
    }

    /// Write settings as pretty JSON, creating parent directories.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(directory) = path.parent() {
            tokio::fs::create_dir_all(directory).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Body text scale, bounded to `1..=MAX_TEXT_SCALE`.
    pub fn text_scale(&self) -> usize {
        self.text_scale.clamp(1, MAX_TEXT_SCALE)
    }

    /// Chunking parameters for the transport.
    pub fn chunk_config(&self) -> ChunkConfig {
        ChunkConfig {
            size: self.chunk_size.max(1),
            delay: Duration::from_millis(self.chunk_delay_ms),
        }
    }

    pub fn label_settle(&self) -> Duration {
        Duration::from_millis(self.label_settle_ms)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    pub fn reconnect_scan(&self) -> Duration {
        Duration::from_secs(self.reconnect_scan_secs)
    }
}
