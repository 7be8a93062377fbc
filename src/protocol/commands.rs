//! # ESC/POS Printer Commands
//!
//! Basic control commands for ESC/POS receipt printers: initialization,
//! paper feed and the cutter.
//!
//! ## Escape Sequence Structure
//!
//! Commands follow these patterns:
//! - Single byte: `LF`, `FF`
//! - Two bytes: `ESC @`
//! - Multi-byte with parameters: `ESC d n`, `GS V m n`
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`
//!
//! The raster label protocol in [`super::raster`] reuses the same control
//! bytes and [`u16_le`] helper.

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// Used for character size, cutter and barcode commands.
pub const GS: u8 = 0x1D;

/// LF (Line Feed) - Print the line buffer and advance one line
pub const LF: u8 = 0x0A;

/// FF (Form Feed) - Advance to the next form (label gap / tear line)
pub const FF: u8 = 0x0C;

// ============================================================================
// INITIALIZATION COMMANDS
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Clears the print buffer and resets text modes to power-on defaults.
/// Every job starts with this so a previous aborted job cannot leak
/// bold or size settings into the next one.
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
/// | Decimal | 27 64 |
///
/// ## Example
///
/// ```
/// use sudsy::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

// ============================================================================
// PAPER FEED COMMANDS
// ============================================================================

/// # Print and Feed n Lines (ESC d n)
///
/// Prints the line buffer and feeds `n` lines at the current line spacing.
///
/// ## Protocol Details
///
/// | Format  | Bytes   |
/// |---------|---------|
/// | ASCII   | ESC d n |
/// | Hex     | 1B 64 n |
/// | Decimal | 27 100 n |
///
/// ## Example
///
/// ```
/// use sudsy::protocol::commands;
///
/// assert_eq!(commands::feed_lines(3), vec![0x1B, 0x64, 3]);
/// ```
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

// ============================================================================
// CUTTER CONTROL COMMANDS
// ============================================================================

/// # Feed, Then Partial Cut (GS V B n)
///
/// Feeds `n` dots past the cutter position and then performs a partial
/// cut, so the last printed line is not sliced through. This is the cut
/// used at the end of every receipt job.
///
/// ## Protocol Details
///
/// | Format  | Bytes       |
/// |---------|-------------|
/// | ASCII   | GS V B n    |
/// | Hex     | 1D 56 42 n  |
/// | Decimal | 29 86 66 n  |
///
/// ## Example
///
/// ```
/// use sudsy::protocol::commands;
///
/// assert_eq!(commands::cut_feed(0), vec![0x1D, 0x56, 0x42, 0x00]);
/// ```
#[inline]
pub fn cut_feed(n: u8) -> Vec<u8> {
    vec![GS, b'V', b'B', n]
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Encode a u16 value as little-endian bytes [low, high]
///
/// ## Example
///
/// ```
/// use sudsy::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(0x1234), [0x34, 0x12]);
/// assert_eq!(u16_le(48), [0x30, 0x00]);
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}

// ============================================================================
// TESTS
// ============================================================================
