//! # Raster Label Protocol
//!
//! Line-oriented bitmap protocol for label printers with no built-in font.
//! Every printed scanline is sent as its own command carrying the raw dots.
//!
//! ## Command Set
//!
//! | Command | Bytes | Purpose |
//! |---------|-------|---------|
//! | Reset | `ESC @` | Clear buffer, default settings |
//! | Raster mode | `ESC i a 1` | Switch the head to bitmap input |
//! | Density | `ESC i D n` | Heat level, 1 (light) to 8 (dark) |
//! | Row | `G nL nH d1...dn` | One scanline of `n` bytes |
//! | Feed | `ESC J n` | Advance `n` dots without printing |
//! | Form feed | `FF` | End of label, advance to next tear line |
//!
//! ## Bit Packing
//!
//! Row bytes are packed like the glyph table: bit 7 (MSB) is the leftmost
//! dot, 1 = burn, 0 = blank.
//!
//! ```text
//! Byte value 0xF0 = 11110000 = ████░░░░
//! Byte value 0x0F = 00001111 = ░░░░████
//! ```
//!
//! A 48-byte row covers the 384 printable dots of a 58mm label head.

use super::commands::{ESC, FF, u16_le};

/// Row command byte.
pub const ROW: u8 = b'G';

/// Lightest supported heat level.
pub const DENSITY_MIN: u8 = 1;

/// Darkest supported heat level.
pub const DENSITY_MAX: u8 = 8;

/// # Reset (ESC @)
///
/// ```
/// use sudsy::protocol::raster;
///
/// assert_eq!(raster::reset(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn reset() -> Vec<u8> {
    vec![ESC, b'@']
}

/// # Enter Raster Mode (ESC i a 1)
#[inline]
pub fn raster_mode() -> Vec<u8> {
    vec![ESC, b'i', b'a', 1]
}

/// # Set Print Density (ESC i D n)
///
/// Values outside `DENSITY_MIN..=DENSITY_MAX` are clamped.
///
/// ```
/// use sudsy::protocol::raster;
///
/// assert_eq!(raster::density(12), vec![0x1B, b'i', b'D', 8]);
/// ```
#[inline]
pub fn density(level: u8) -> Vec<u8> {
    vec![ESC, b'i', b'D', level.clamp(DENSITY_MIN, DENSITY_MAX)]
}

/// # Print One Scanline (G nL nH d1...dn)
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | G nL nH d1...dn |
/// | Hex     | 47 nL nH d1...dn |
///
/// `nL nH` is the little-endian byte count of the row that follows.
///
/// ## Example
///
/// ```
/// use sudsy::protocol::raster;
///
/// let cmd = raster::row(&[0xFF; 48]);
/// assert_eq!(&cmd[..3], &[b'G', 48, 0]);
/// assert_eq!(cmd.len(), 3 + 48);
/// ```
pub fn row(data: &[u8]) -> Vec<u8> {
    debug_assert!(data.len() <= u16::MAX as usize, "row too wide: {} bytes", data.len());

    let [nl, nh] = u16_le(data.len() as u16);
    let mut cmd = Vec::with_capacity(3 + data.len());
    cmd.push(ROW);
    cmd.push(nl);
    cmd.push(nh);
    cmd.extend_from_slice(data);
    cmd
}

/// # Feed n Dots (ESC J n)
#[inline]
pub fn feed(dots: u8) -> Vec<u8> {
    vec![ESC, b'J', dots]
}

/// # Form Feed (FF)
///
/// Finishes the label and advances to the next gap.
#[inline]
pub fn form_feed() -> Vec<u8> {
    vec![FF]
}

// ============================================================================
// TESTS
// ============================================================================
