//! # Sudsy - Laundromat Label Printer Library
//!
//! Sudsy drives the Bluetooth Low Energy thermal printers used at a
//! laundromat counter. It provides:
//!
//! - **Connection management**: BLE scanning, writable-characteristic
//!   negotiation, link-loss detection and reconnecting the saved printer
//! - **Protocols**: raster bitmap label printers and ESC/POS receipt printers
//! - **Rendering**: an 8x8 bitmap font for printers without one
//! - **Transport**: paced, chunked BLE writes (and raw TCP for network printers)
//!
//! ## Quick Start
//!
//! ```no_run
//! use sudsy::{
//!     ble::BtleAdapter,
//!     label::OrderLabel,
//!     manager::PrinterManager,
//!     printer::PrinterSettings,
//!     store::FileStore,
//! };
//!
//! # async fn demo() -> sudsy::error::Result<()> {
//! let settings = PrinterSettings::load(None).await?;
//! let adapter = BtleAdapter::new().await?;
//! let mut manager = PrinterManager::new(adapter, FileStore::open_default()?, settings).await?;
//!
//! // Use the printer from last time
//! manager.reconnect_saved_printer().await?;
//!
//! let order = OrderLabel {
//!     is_same_day: true,
//!     ..OrderLabel::new("42", "Jane Doe")
//! };
//! manager.print_multiple_bag_labels(&order, 3).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`manager`] | Connection state machine and print job API |
//! | [`ble`] | Adapter/link traits and the btleplug backend |
//! | [`label`] | Print jobs and their layout |
//! | [`ir`] | Protocol-neutral op list and codegen |
//! | [`protocol`] | Raster and ESC/POS command builders |
//! | [`render`] | Glyph table and bitmap text renderer |
//! | [`transport`] | Chunked BLE writes, TCP |
//! | [`store`] | Saved printer record |
//! | [`printer`] | Printer profiles and settings |
//! | [`preview`] | PNG preview of raster output |
//! | [`error`] | Error types |

use std::env;

pub mod ble;
pub mod error;
pub mod ir;
pub mod label;
pub mod manager;
pub mod preview;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod store;
pub mod transport;

// Re-exports for convenience
pub use error::SudsyError;
pub use label::{OrderLabel, PrintJob};
pub use manager::{ConnectionState, PrinterEvent, PrinterManager};
pub use printer::{PrinterConfig, PrinterSettings};

/// Install a stderr logger with RFC 3339 timestamps.
///
/// If `LOG_FILE` is set, log lines are also appended to that file.
pub fn init_logging(level: log::LevelFilter) -> Result<(), SudsyError> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("btleplug", log::LevelFilter::Warn)
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        dispatch = dispatch.chain(fern::log_file(log_file)?);
    }

    dispatch.apply()?;
    Ok(())
}
