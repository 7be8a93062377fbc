//! # IR to PNG Preview Renderer
//!
//! Renders IR programs to PNG images showing what a label would look like
//! when printed, without a printer.
//!
//! ## Architecture
//!
//! ```text
//! Program (IR) → walk_raster → rows / feeds → GrayImage → PNG bytes
//! ```
//!
//! The preview reuses the raster codegen walk, so it shows exactly the dots
//! a raster label printer would burn. For ESC/POS profiles the same walk is
//! used at the profile's width, which approximates the printer's own font.
//!
//! ## Example
//!
//! ```
//! use sudsy::ir::{Op, Program};
//! use sudsy::preview::render_preview;
//! use sudsy::printer::PrinterSettings;
//!
//! let mut program = Program::with_init();
//! program.push(Op::Line("ORDER #42".into()));
//! let png_bytes = render_preview(&program, &PrinterSettings::default()).unwrap();
//! assert_eq!(&png_bytes[1..4], b"PNG");
//! ```

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder, Luma};

use crate::error::{Result, SudsyError};
use crate::ir::{Program, RasterEvent};
use crate::printer::PrinterSettings;

/// White border around the label, in dots.
pub const MARGIN: u32 = 8;

/// Dots of the program as rows of on/off pixels, up to the first form feed.
pub fn rasterize(program: &Program, settings: &PrinterSettings) -> Vec<Vec<bool>> {
    let width = settings.printer.width_bytes as usize * 8;
    let mut rows: Vec<Vec<bool>> = Vec::new();
    let mut finished = false;

    program.walk_raster(settings, |event| {
        if finished {
            return;
        }
        match event {
            RasterEvent::Row(bytes) => rows.push(
                (0..width)
                    .map(|x| bytes.get(x / 8).is_some_and(|b| b & (0x80 >> (x % 8)) != 0))
                    .collect(),
            ),
            RasterEvent::Feed(dots) => {
                rows.extend(std::iter::repeat_n(vec![false; width], dots as usize));
            }
            RasterEvent::FormFeed => finished = true,
            RasterEvent::Reset | RasterEvent::Density(_) => {}
        }
    });

    rows
}

/// Render a program to PNG bytes.
pub fn render_preview(program: &Program, settings: &PrinterSettings) -> Result<Vec<u8>> {
    let rows = rasterize(program, settings);
    let dots = settings.printer.width_bytes as u32 * 8;
    let width = dots + 2 * MARGIN;
    let height = rows.len() as u32 + 2 * MARGIN;

    let mut img = GrayImage::from_pixel(width, height, Luma([255u8]));
    for (y, row) in rows.iter().enumerate() {
        for (x, on) in row.iter().enumerate() {
            if *on {
                img.put_pixel(x as u32 + MARGIN, y as u32 + MARGIN, Luma([0u8]));
            }
        }
    }

    let mut png_bytes = Vec::new();
    PngEncoder::new(&mut png_bytes)
        .write_image(img.as_raw(), width, height, ExtendedColorType::L8)
        .map_err(|e| SudsyError::ImageEncode(e.to_string()))?;

    Ok(png_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{LINE_GAP_DOTS, Op, RULE_DOTS};

    #[test]
    fn test_rasterize_line_height() {
        let settings = PrinterSettings::default();
        let program: Program = [Op::Init, Op::Line("A".into())].into_iter().collect();
        let rows = rasterize(&program, &settings);
        assert_eq!(rows.len(), 16 + LINE_GAP_DOTS as usize);
        assert!(rows.iter().all(|r| r.len() == 384));
        assert!(rows[0].iter().any(|on| *on));
    }

    #[test]
    fn test_rasterize_stops_at_form_feed() {
        let settings = PrinterSettings::default();
        let program: Program = [Op::Rule, Op::Cut, Op::Line("after".into())]
            .into_iter()
            .collect();
        let rows = rasterize(&program, &settings);
        assert_eq!(rows.len(), RULE_DOTS + 2 * LINE_GAP_DOTS as usize);
        assert!(rows[LINE_GAP_DOTS as usize].iter().all(|on| *on));
    }

    #[test]
    fn test_png_dimensions() {
        let settings = PrinterSettings::default();
        let program: Program = [Op::Rule].into_iter().collect();
        let png = render_preview(&program, &settings).unwrap();

        let img = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(img.width(), 384 + 2 * MARGIN);
        assert_eq!(img.height(), 10 + 2 * MARGIN);
        assert_eq!(img.get_pixel(MARGIN, MARGIN + LINE_GAP_DOTS as u32).0, [0]);
        assert_eq!(img.get_pixel(0, 0).0, [255]);
    }
}
