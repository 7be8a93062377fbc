//! # Printer Module
//!
//! Printer hardware profiles and the runtime settings that go with them.
//!
//! ## Modules
//!
//! - [`config`]: Printer hardware specifications
//! - [`settings`]: Transport pacing, scan windows and layout knobs

pub mod config;
pub mod settings;

pub use config::PrinterConfig;
pub use settings::PrinterSettings;
