//! # ESC/POS Text Styling Commands
//!
//! Text formatting for receipt printers that use their own built-in font.
//!
//! | Style | Command | Effect |
//! |-------|---------|--------|
//! | Bold | ESC E n | **Emphasized** text |
//! | Alignment | ESC a n | Left / center / right |
//! | Size | GS ! n | Double width and/or height |
//!
//! ## Text Alignment
//!
//! ```text
//! Left aligned (default)    |LEFT TEXT
//! Center aligned            |  CENTER TEXT
//! Right aligned             |      RIGHT TEXT
//! ```

use super::commands::{ESC, GS};

// ============================================================================
// TEXT ALIGNMENT
// ============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

/// # Select Justification (ESC a n)
///
/// ## Protocol Details
///
/// | Format  | Bytes   |
/// |---------|---------|
/// | ASCII   | ESC a n |
/// | Hex     | 1B 61 n |
/// | Decimal | 27 97 n |
///
/// Takes effect at the start of the next line.
///
/// ## Example
///
/// ```
/// use sudsy::protocol::text::{align, Alignment};
///
/// assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

// ============================================================================
// TEXT EMPHASIS (BOLD)
// ============================================================================

/// # Enable Bold (ESC E 1)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | Hex     | 1B 45 01 |
#[inline]
pub fn bold_on() -> Vec<u8> {
    vec![ESC, b'E', 1]
}

/// # Disable Bold (ESC E 0)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | Hex     | 1B 45 00 |
#[inline]
pub fn bold_off() -> Vec<u8> {
    vec![ESC, b'E', 0]
}

// ============================================================================
// CHARACTER SIZE
// ============================================================================

/// Character size presets used by labels and receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSize {
    #[default]
    Normal,
    DoubleHeight,
    DoubleWidth,
    /// Double width and double height.
    Double,
}

impl TextSize {
    /// Horizontal and vertical magnification as `(width, height)`.
    pub fn multipliers(self) -> (u8, u8) {
        match self {
            TextSize::Normal => (1, 1),
            TextSize::DoubleHeight => (1, 2),
            TextSize::DoubleWidth => (2, 1),
            TextSize::Double => (2, 2),
        }
    }
}

/// # Select Character Size (GS ! n)
///
/// ## Protocol Details
///
/// | Format  | Bytes   |
/// |---------|---------|
/// | ASCII   | GS ! n  |
/// | Hex     | 1D 21 n |
///
/// ## Parameter Encoding
///
/// ```text
/// n = (width_mult - 1) << 4 | (height_mult - 1)
///
/// Normal         = 0x00
/// Double height  = 0x01
/// Double width   = 0x10
/// Double both    = 0x11
/// ```
///
/// ## Example
///
/// ```
/// use sudsy::protocol::text::{size, TextSize};
///
/// assert_eq!(size(TextSize::Double), vec![0x1D, 0x21, 0x11]);
/// ```
pub fn size(size: TextSize) -> Vec<u8> {
    let (w, h) = size.multipliers();
    vec![GS, b'!', ((w - 1) << 4) | (h - 1)]
}

// ============================================================================
// TEXT ENCODING
// ============================================================================

/// Encode text for the printer's built-in ASCII font.
///
/// Control characters and anything outside printable ASCII are replaced
/// with `?` so they cannot be misread as command bytes.
///
/// ```
/// use sudsy::protocol::text::encode;
///
/// assert_eq!(encode("Café"), b"Caf?".to_vec());
/// ```
pub fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() {
                c as u8
            } else {
                b'?'
            }
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
