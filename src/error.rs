//! # Error Types
//!
//! This module defines the error type used throughout the sudsy library.
//!
//! Errors are grouped by what the caller should ask the user to do:
//!
//! | Ask the user to... | Variants |
//! |--------------------|----------|
//! | enable Bluetooth | [`SudsyError::AdapterUnavailable`] |
//! | reconnect the printer | [`SudsyError::NotConnected`], [`SudsyError::NoWritableCharacteristic`], [`SudsyError::ConnectFailed`], [`SudsyError::DeviceNotFound`], [`SudsyError::NoSavedPrinter`] |
//! | retry the print | [`SudsyError::TransportWriteFailed`] |

use std::io;

use thiserror::Error;

/// Stage of a connection attempt that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStage {
    /// Opening the BLE link.
    Link,
    /// GATT service discovery.
    Discovery,
}

impl std::fmt::Display for ConnectStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectStage::Link => write!(f, "link"),
            ConnectStage::Discovery => write!(f, "service discovery"),
        }
    }
}

/// Main error type for sudsy operations
#[derive(Debug, Error)]
pub enum SudsyError {
    /// Bluetooth is off or no adapter exists.
    #[error("Bluetooth adapter unavailable")]
    AdapterUnavailable,

    /// The device exposes no characteristic we can write print data to.
    #[error("Printer exposes no writable characteristic")]
    NoWritableCharacteristic,

    /// A chunk write failed mid-job. The label may be partially printed.
    #[error("Write failed at chunk {chunk} of {total}: {reason}")]
    TransportWriteFailed {
        chunk: usize,
        total: usize,
        reason: String,
    },

    /// A print was attempted with no active link.
    #[error("Printer not connected")]
    NotConnected,

    /// Opening the link or discovering services failed.
    #[error("Failed to connect to {device} ({stage}): {reason}")]
    ConnectFailed {
        device: String,
        stage: ConnectStage,
        reason: String,
    },

    /// No peripheral with this id is reachable.
    #[error("Printer {0} not found")]
    DeviceNotFound(String),

    /// Reconnect requested but no printer was ever saved.
    #[error("No saved printer")]
    NoSavedPrinter,

    /// The print job cannot be encoded (e.g. zero copies).
    #[error("Invalid print job: {0}")]
    InvalidJob(String),

    /// Error from the platform BLE stack.
    #[error("Bluetooth error (btleplug): {source}")]
    Btle {
        #[from]
        source: btleplug::Error,
    },

    /// Error from a non-btleplug link backend.
    #[error("Link error: {0}")]
    Link(String),

    /// PNG preview encoding failed.
    #[error("Image encoding error: {0}")]
    ImageEncode(String),

    /// Failed to determine a configuration or data directory.
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    /// A global logger was already installed.
    #[error("Failed to initialize logger: {0}")]
    Logging(#[from] log::SetLoggerError),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encode/decode error wrapper
    #[error("Failed to parse/build JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl SudsyError {
    /// The user should turn Bluetooth on.
    pub fn needs_bluetooth(&self) -> bool {
        matches!(self, SudsyError::AdapterUnavailable)
    }

    /// The user should (re)connect a printer before trying again.
    pub fn needs_reconnect(&self) -> bool {
        matches!(
            self,
            SudsyError::NotConnected
                | SudsyError::NoWritableCharacteristic
                | SudsyError::ConnectFailed { .. }
                | SudsyError::DeviceNotFound(_)
                | SudsyError::NoSavedPrinter
        )
    }

    /// Re-issuing the same job may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SudsyError::TransportWriteFailed { .. })
    }
}

/// Result alias for sudsy operations.
pub type Result<T> = std::result::Result<T, SudsyError>;
