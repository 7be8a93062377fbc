//! # Printer Protocols
//!
//! Low-level command builders for the two printer classes in use:
//!
//! - **Raster label printers** ([`raster`]): no built-in font; every scanline
//!   is sent as a bitmap row rendered by [`crate::render::bitmap`].
//! - **ESC/POS receipt printers** ([`commands`], [`text`], [`barcode`]):
//!   escape sequences interleaved with literal text in the printer's font.
//!
//! Which one a printer speaks is configuration ([`PrinterProtocol`]), never
//! detected.
//!
//! ## Usage Example
//!
//! ```
//! use sudsy::protocol::{commands, text};
//!
//! let mut data = Vec::new();
//! data.extend(commands::init());
//! data.extend(text::align(text::Alignment::Center));
//! data.extend(text::bold_on());
//! data.extend(b"ORDER #42\n");
//! data.extend(text::bold_off());
//! data.extend(commands::cut_feed(0));
//! ```
//!
//! None of these builders perform I/O; their output goes to any transport.

use serde::{Deserialize, Serialize};

pub mod barcode;
pub mod commands;
pub mod raster;
pub mod text;

/// Wire protocol spoken by a printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrinterProtocol {
    /// Bitmap rows, one command per scanline (label printers).
    #[default]
    Raster,
    /// ESC/POS escape sequences with the printer's own font (receipt printers).
    EscPos,
}

impl std::fmt::Display for PrinterProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PrinterProtocol::Raster => "raster",
            PrinterProtocol::EscPos => "escpos",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for PrinterProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raster" => Ok(PrinterProtocol::Raster),
            "escpos" | "esc/pos" | "esc_pos" => Ok(PrinterProtocol::EscPos),
            other => Err(format!("Unknown protocol '{}'. Use 'raster' or 'escpos'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_parse() {
        assert_eq!("raster".parse::<PrinterProtocol>(), Ok(PrinterProtocol::Raster));
        assert_eq!("ESCPOS".parse::<PrinterProtocol>(), Ok(PrinterProtocol::EscPos));
        assert_eq!("esc/pos".parse::<PrinterProtocol>(), Ok(PrinterProtocol::EscPos));
        assert!("zpl".parse::<PrinterProtocol>().is_err());
    }

    #[test]
    fn test_protocol_serde() {
        let json = serde_json::to_string(&PrinterProtocol::EscPos).unwrap();
        assert_eq!(json, "\"esc_pos\"");
        let parsed: PrinterProtocol = serde_json::from_str("\"raster\"").unwrap();
        assert_eq!(parsed, PrinterProtocol::Raster);
    }
}
