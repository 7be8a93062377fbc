//! # ESC/POS Barcode Commands
//!
//! Code128 barcodes for receipt printers, used to put the order number on
//! a ticket in scannable form.
//!
//! ## Command Sequence
//!
//! ```text
//! GS H 2         HRI (human readable) text below the bars
//! GS h height    bar height in dots
//! GS w width     module width (2-6)
//! GS k 73 n {B data...
//! ```
//!
//! The `{B` prefix selects Code128 code set B (printable ASCII), and
//! counts towards `n`. Inside the data `{` starts a code-set escape, so a
//! literal brace is sent as `{{`.

use super::commands::GS;

/// Code128 function number for `GS k m n d1..dn`.
const CODE128: u8 = 73;

/// Code set B selector.
const CODE_SET_B: [u8; 2] = [b'{', b'B'];

/// Largest escaped payload that fits in the one-byte length after the `{B`
/// prefix.
pub const MAX_CODE128_LEN: usize = 253;

/// # Print Code128 Barcode
///
/// Returns `None` when `data` is empty, contains characters outside
/// printable ASCII, or is longer than [`MAX_CODE128_LEN`] once braces are
/// escaped.
///
/// ## Example
///
/// ```
/// use sudsy::protocol::barcode;
///
/// let cmd = barcode::code128("42", 60, 2).unwrap();
/// assert_eq!(&cmd[cmd.len() - 6..], &[0x49, 4, b'{', b'B', b'4', b'2']);
/// ```
pub fn code128(data: &str, height: u8, module_width: u8) -> Option<Vec<u8>> {
    if data.is_empty() || !data.bytes().all(|b| (0x20..0x7F).contains(&b)) {
        return None;
    }

    let payload = escape(data);
    if payload.len() > MAX_CODE128_LEN {
        return None;
    }

    let mut cmd = Vec::with_capacity(13 + payload.len());
    cmd.extend([GS, b'H', 2]);
    cmd.extend([GS, b'h', height.max(1)]);
    cmd.extend([GS, b'w', module_width.clamp(2, 6)]);
    cmd.extend([GS, b'k', CODE128, (payload.len() + CODE_SET_B.len()) as u8]);
    cmd.extend(CODE_SET_B);
    cmd.extend(payload);
    Some(cmd)
}

/// Double every `{` so the printer reads it as data.
fn escape(data: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for b in data.bytes() {
        out.push(b);
        if b == b'{' {
            out.push(b'{');
        }
    }
    out
}
