//! # Bitmap Text Renderer
//!
//! Turns a single line of text into monochrome raster rows for printers
//! that have no built-in font.
//!
//! ## Algorithm
//!
//! ```text
//! "AB" at scale 2 on a 48-byte (384 dot) label:
//!
//!   rendered width = 2 chars × 8 dots × 2 = 32 dots
//!   offset         = (384 - 32) / 2     = 176 dots
//!
//!   ├──── 176 ────┼── 32 ──┼──── 176 ────┤
//!   │   (blank)   │ A  B   │   (blank)   │
//! ```
//!
//! - Input is uppercased and newlines are stripped (one line per call).
//! - Every glyph row is repeated `scale` times vertically, and every source
//!   bit becomes `scale` dots horizontally.
//! - The offset is floored and may be negative when the text is wider than
//!   the label. Dots outside the label are dropped, never wrapped.
//!
//! Rows are produced lazily by [`Rows`], one at a time, so the encoder can
//! emit each scanline as soon as it exists.
//!
//! Rendering is a pure function of `(text, scale, width_bytes)`: the same
//! input always yields byte-identical rows.

use super::glyphs::{GLYPH_HEIGHT, GLYPH_WIDTH, Glyph, glyph};

/// Largest scale the renderer honours. One glyph at this scale is wider
/// than any supported label.
pub const MAX_SCALE: usize = 64;

/// Iterator over the raster rows of one rendered line.
///
/// Yields `GLYPH_HEIGHT × scale` rows of exactly `width_bytes` bytes each.
#[derive(Debug, Clone)]
pub struct Rows {
    glyphs: Vec<Glyph>,
    scale: usize,
    width_bytes: usize,
    offset: i64,
    next_row: usize,
}

/// Render `text` into a lazy sequence of raster rows.
///
/// `scale` is clamped to `1..=MAX_SCALE`.
///
/// ## Example
///
/// ```
/// use sudsy::render::bitmap::render_rows;
///
/// let rows: Vec<Vec<u8>> = render_rows("ok", 2, 48).collect();
/// assert_eq!(rows.len(), 16);
/// assert!(rows.iter().all(|row| row.len() == 48));
/// ```
pub fn render_rows(text: &str, scale: usize, width_bytes: usize) -> Rows {
    let scale = scale.clamp(1, MAX_SCALE);
    let glyphs: Vec<Glyph> = normalize(text).chars().map(glyph).collect();

    let label_dots = (width_bytes * 8) as i64;
    let rendered_dots = (glyphs.len() * GLYPH_WIDTH * scale) as i64;
    let offset = (label_dots - rendered_dots).div_euclid(2);

    Rows {
        glyphs,
        scale,
        width_bytes,
        offset,
        next_row: 0,
    }
}

/// Render `text` and collect every row.
pub fn render(text: &str, scale: usize, width_bytes: usize) -> Vec<Vec<u8>> {
    render_rows(text, scale, width_bytes).collect()
}

/// Number of glyph cells that fit on one line at `scale`.
///
/// ```
/// use sudsy::render::bitmap::columns_for;
///
/// assert_eq!(columns_for(48, 2), 24);
/// assert_eq!(columns_for(48, 3), 16);
/// ```
pub fn columns_for(width_bytes: usize, scale: usize) -> usize {
    (width_bytes * 8) / (GLYPH_WIDTH * scale.clamp(1, MAX_SCALE))
}

/// Uppercase and drop line breaks.
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .flat_map(char::to_uppercase)
        .collect()
}

impl Rows {
    /// Horizontal offset of the first glyph, in dots. Negative when clipped.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Total number of rows this line produces.
    pub fn height(&self) -> usize {
        GLYPH_HEIGHT * self.scale
    }

    fn build_row(&self, glyph_row: usize) -> Vec<u8> {
        let mut row = vec![0u8; self.width_bytes];
        let label_dots = (self.width_bytes * 8) as i64;
        let scale = self.scale as i64;
        let mut cursor = self.offset;

        for g in &self.glyphs {
            let bits = g[glyph_row];
            for bit in (0..GLYPH_WIDTH).rev() {
                if bits & (1 << bit) != 0 {
                    for x in cursor..cursor + scale {
                        if (0..label_dots).contains(&x) {
                            let x = x as usize;
                            row[x / 8] |= 0x80 >> (x % 8);
                        }
                    }
                }
                cursor += scale;
            }
        }

        row
    }
}

impl Iterator for Rows {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_row >= self.height() {
            return None;
        }
        let glyph_row = self.next_row / self.scale;
        self.next_row += 1;
        Some(self.build_row(glyph_row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.height() - self.next_row;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Rows {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Columns of every "on" dot across all rows.
    fn on_columns(rows: &[Vec<u8>]) -> Vec<usize> {
        let mut cols = Vec::new();
        for row in rows {
            for (i, byte) in row.iter().enumerate() {
                for bit in 0..8 {
                    if byte & (0x80 >> bit) != 0 {
                        cols.push(i * 8 + bit);
                    }
                }
            }
        }
        cols
    }

    #[test]
    fn test_row_count_and_width() {
        let rows = render("HELLO", 3, 48);
        assert_eq!(rows.len(), 24);
        assert!(rows.iter().all(|r| r.len() == 48));
    }

    #[test]
    fn test_deterministic() {
        for scale in 1..=4 {
            assert_eq!(render("Order #42", scale, 48), render("Order #42", scale, 48));
        }
    }

    #[test]
    fn test_lowercase_matches_uppercase() {
        assert_eq!(render("jane doe", 2, 48), render("JANE DOE", 2, 48));
    }

    #[test]
    fn test_newlines_are_stripped() {
        assert_eq!(render("AB\nC\r\n", 1, 48), render("ABC", 1, 48));
    }

    #[test]
    fn test_single_a_is_centered() {
        let rows = render("A", 2, 48);
        let cols = on_columns(&rows);
        let min = *cols.iter().min().unwrap() as f64;
        let max = *cols.iter().max().unwrap() as f64;
        let label_mid = (48.0 * 8.0 - 1.0) / 2.0;
        assert!(((min + max) / 2.0 - label_mid).abs() <= 1.0);
    }

    #[test]
    fn test_scale_one_copies_glyph() {
        // 1 char at scale 1 on a 1-byte label: offset 0, glyph copied verbatim.
        let rows = render("A", 1, 1);
        assert_eq!(rows, vec![
            vec![0x18],
            vec![0x3C],
            vec![0x66],
            vec![0x66],
            vec![0x7E],
            vec![0x66],
            vec![0x66],
            vec![0x00],
        ]);
    }

    #[test]
    fn test_scale_doubles_rows_and_dots() {
        // 'I' top row 0x3C at scale 2 on a 2-byte label => 0x0F, 0xF0
        let rows = render("I", 2, 2);
        assert_eq!(rows.len(), 16);
        assert_eq!(rows[0], vec![0x0F, 0xF0]);
        assert_eq!(rows[1], rows[0]);
    }

    #[test]
    fn test_huge_scale_is_capped() {
        let rows = render_rows("AB", usize::MAX, 48);
        assert_eq!(rows.height(), GLYPH_HEIGHT * MAX_SCALE);
        assert_eq!(rows.take(1).next().map(|r| r.len()), Some(48));
        assert_eq!(columns_for(48, usize::MAX), 0);
    }

    #[test]
    fn test_overflow_is_clipped_not_wrapped() {
        let text = "W".repeat(100);
        let rows = render_rows(&text, 4, 48);
        assert!(rows.offset() < 0);
        for row in rows {
            assert_eq!(row.len(), 48);
        }
    }

    #[test]
    fn test_negative_offset_is_floored() {
        // 3 chars at scale 1 = 24 dots on a 1-byte (8 dot) label: (8 - 24) / 2 = -8
        assert_eq!(render_rows("ABC", 1, 1).offset(), -8);
        // 1 char at scale 1 = 8 dots on a 3-byte (24 dot) label: offset 8
        assert_eq!(render_rows("A", 1, 3).offset(), 8);
        assert_eq!(render_rows("AB", 1, 1).offset(), -4);
    }

    #[test]
    fn test_clipped_middle_is_what_is_visible() {
        // "ABC" at scale 1 on an 8-dot label shows exactly the 'B' glyph.
        let rows = render("ABC", 1, 1);
        let b: Vec<Vec<u8>> = glyph('B').iter().map(|r| vec![*r]).collect();
        assert_eq!(rows, b);
    }

    #[test]
    fn test_empty_text_is_blank() {
        let rows = render("", 2, 48);
        assert_eq!(rows.len(), 16);
        assert!(rows.iter().all(|r| r.iter().all(|b| *b == 0)));
    }

    #[test]
    fn test_zero_scale_treated_as_one() {
        assert_eq!(render("A", 0, 4), render("A", 1, 4));
    }

    #[test]
    fn test_exact_size() {
        let mut rows = render_rows("X", 3, 10);
        assert_eq!(rows.len(), 24);
        rows.next();
        assert_eq!(rows.len(), 23);
    }

    #[test]
    fn test_columns_for() {
        assert_eq!(columns_for(48, 1), 48);
        assert_eq!(columns_for(48, 2), 24);
        assert_eq!(columns_for(72, 2), 36);
        assert_eq!(columns_for(48, 0), 48);
    }
}
