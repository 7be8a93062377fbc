//! # Rendering Module
//!
//! Text-to-raster rendering for printers without a built-in font.
//!
//! ## Modules
//!
//! - [`glyphs`]: 8x8 monochrome glyph table
//! - [`bitmap`]: Scaled, centered, clipped line rendering
//!
//! ## Usage Example
//!
//! ```
//! use sudsy::render::bitmap;
//! use sudsy::protocol::raster;
//!
//! // Render one line at 2x on a 384-dot label and emit each scanline.
//! let mut data = Vec::new();
//! for row in bitmap::render_rows("BAG 1 OF 2", 2, 48) {
//!     data.extend(raster::row(&row));
//! }
//! assert_eq!(data.len(), 16 * (3 + 48));
//! ```

pub mod bitmap;
pub mod glyphs;
