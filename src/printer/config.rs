//! # Printer Configuration
//!
//! Hardware profiles for the printers used at the counter.
//!
//! ## Built-in Profiles
//!
//! | Profile | Protocol | Width (bytes) | Text columns |
//! |---------|----------|---------------|--------------|
//! | `label58` | Raster | 48 (384 dots) | 32 |
//! | `receipt80` | ESC/POS | 72 (576 dots) | 48 |
//!
//! ## Usage
//!
//! ```
//! use sudsy::printer::PrinterConfig;
//!
//! let config = PrinterConfig::label_58mm();
//! println!("Print width: {} bytes ({} dots)",
//!          config.width_bytes,
//!          config.width_bytes * 8);
//! ```

use serde::{Deserialize, Serialize};

use crate::protocol::PrinterProtocol;

/// # Printer Configuration
///
/// Defines the hardware characteristics of a thermal printer and the wire
/// protocol it speaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterConfig {
    /// Human-readable profile name
    pub name: String,

    /// Wire protocol (raster bitmap or ESC/POS)
    pub protocol: PrinterProtocol,

    /// Print width in bytes; each byte is eight dots of one raster row
    pub width_bytes: u16,

    /// Characters per line in the printer's built-in font (ESC/POS only)
    pub columns: u16,
}

impl PrinterConfig {
    /// # 58mm Raster Label Printer
    ///
    /// ```text
    /// ├─ 5mm ─┼──── 48mm printable ────┼─ 5mm ─┤
    /// │margin │       384 dots         │margin │
    /// ```
    pub fn label_58mm() -> Self {
        Self {
            name: "58mm label".to_string(),
            protocol: PrinterProtocol::Raster,
            width_bytes: 48,
            columns: 32,
        }
    }

    /// # 80mm ESC/POS Receipt Printer
    ///
    /// 72mm printable (576 dots), 48 columns in Font A.
    pub fn receipt_80mm() -> Self {
        Self {
            name: "80mm receipt".to_string(),
            protocol: PrinterProtocol::EscPos,
            width_bytes: 72,
            columns: 48,
        }
    }

    /// Parse a profile string (CLI args or display name).
    ///
    /// Accepts `"label58"`, `"receipt80"` or a built-in display name.
    pub fn parse(s: &str) -> Result<Self, String> {
        if let Some(profile) = Self::built_in().into_iter().find(|p| p.name == s) {
            return Ok(profile);
        }

        match s.to_lowercase().as_str() {
            "label58" | "label" => Ok(Self::label_58mm()),
            "receipt80" | "receipt" => Ok(Self::receipt_80mm()),
            _ => Err(format!(
                "Unknown profile '{}'. Use 'label58' or 'receipt80'",
                s
            )),
        }
    }

    /// List all built-in profiles.
    pub fn built_in() -> Vec<Self> {
        vec![Self::label_58mm(), Self::receipt_80mm()]
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::label_58mm()
    }
}

// ============================================================================
// TESTS
// ============================================================================
