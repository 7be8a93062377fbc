//! # Printer Transport Layer
//!
//! This module moves encoded print jobs to printers.
//!
//! ## Available Transports
//!
//! - [`chunk`]: paced, chunked writes over a BLE GATT characteristic
//! - [`tcp`]: raw TCP for network-attached receipt printers
//!
//! Both take the same byte stream; the encoder does not know which one is used.

pub mod chunk;
pub mod tcp;

pub use chunk::{Chunk, ChunkConfig, send, split_chunks};
pub use tcp::TcpPrinter;
