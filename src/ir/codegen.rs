//! # Code Generation
//!
//! Converts IR programs to printer bytes for either protocol.
//!
//! ## Raster
//!
//! | Op | Output |
//! |----|--------|
//! | `Init` | `ESC @`, `ESC i a 1` |
//! | `SetDensity(n)` | `ESC i D n` |
//! | `Line(text)` | one `G` row per rendered scanline, then a 4-dot gap |
//! | `Rule` | 2 solid rows between 4-dot gaps |
//! | `Feed { lines }` | `ESC J` for `lines` text heights |
//! | `Cut` | `FF` |
//! | `SetAlign`, `SetBold`, `Barcode` | nothing |
//!
//! Rows are emitted as soon as they are rendered, so only one scanline of
//! bitmap is ever held at a time.
//!
//! ## ESC/POS
//!
//! Ops map one-to-one onto the builders in [`crate::protocol`]; text goes
//! out as ASCII with a trailing LF and a rule is a line of dashes.

use log::warn;

use super::ops::{Op, Program};
use crate::printer::PrinterSettings;
use crate::protocol::text::TextSize;
use crate::protocol::{PrinterProtocol, barcode, commands, raster, text};
use crate::render::bitmap::render_rows;

/// Blank dots after each raster text line.
pub const LINE_GAP_DOTS: u8 = 4;

/// Thickness of a raster separator.
pub const RULE_DOTS: usize = 2;

/// Lines fed inside the ESC/POS cut command.
const CUT_FEED_LINES: u8 = 3;

/// Code128 bar height in dots.
const BARCODE_HEIGHT: u8 = 60;

/// Code128 module width.
const BARCODE_MODULE: u8 = 2;

/// One unit of raster output, before it is turned into bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterEvent {
    /// Reset and enter raster mode.
    Reset,
    /// Heat level.
    Density(u8),
    /// One scanline, exactly `width_bytes` long.
    Row(Vec<u8>),
    /// Blank advance in dots.
    Feed(u8),
    /// End of label.
    FormFeed,
}

impl Program {
    /// Compile to bytes for the protocol configured in `settings`.
    pub fn to_bytes(&self, settings: &PrinterSettings) -> Vec<u8> {
        match settings.printer.protocol {
            PrinterProtocol::Raster => self.to_raster_bytes(settings),
            PrinterProtocol::EscPos => self.to_escpos_bytes(settings),
        }
    }

    /// Compile to raster label bytes.
    pub fn to_raster_bytes(&self, settings: &PrinterSettings) -> Vec<u8> {
        let mut out = Vec::new();
        self.walk_raster(settings, |event| match event {
            RasterEvent::Reset => {
                out.extend(raster::reset());
                out.extend(raster::raster_mode());
            }
            RasterEvent::Density(level) => out.extend(raster::density(level)),
            RasterEvent::Row(row) => out.extend(raster::row(&row)),
            RasterEvent::Feed(dots) => out.extend(raster::feed(dots)),
            RasterEvent::FormFeed => out.extend(raster::form_feed()),
        });
        out
    }

    /// Walk the program as raster output, handing each event to `emit` as
    /// soon as it exists.
    pub fn walk_raster(&self, settings: &PrinterSettings, mut emit: impl FnMut(RasterEvent)) {
        let width_bytes = settings.printer.width_bytes as usize;
        let base_scale = settings.text_scale();
        let mut size = TextSize::Normal;

        for op in &self.ops {
            match op {
                // ===== Printer Control =====
                Op::Init => emit(RasterEvent::Reset),
                Op::SetDensity(level) => emit(RasterEvent::Density(*level)),
                Op::Feed { lines } => {
                    let line_dots = 8 * line_scale(base_scale, size) + LINE_GAP_DOTS as usize;
                    feed_dots(*lines as usize * line_dots, &mut emit);
                }
                Op::Cut => emit(RasterEvent::FormFeed),

                // ===== Style Changes =====
                Op::SetSize(new_size) => size = *new_size,
                Op::SetAlign(_) | Op::SetBold(_) => {}

                // ===== Content =====
                Op::Line(line) => {
                    for row in render_rows(line, line_scale(base_scale, size), width_bytes) {
                        emit(RasterEvent::Row(row));
                    }
                    emit(RasterEvent::Feed(LINE_GAP_DOTS));
                }
                Op::Rule => {
                    emit(RasterEvent::Feed(LINE_GAP_DOTS));
                    for _ in 0..RULE_DOTS {
                        emit(RasterEvent::Row(vec![0xFF; width_bytes]));
                    }
                    emit(RasterEvent::Feed(LINE_GAP_DOTS));
                }
                Op::Barcode(_) => {}
            }
        }
    }

    /// Compile to ESC/POS bytes.
    pub fn to_escpos_bytes(&self, settings: &PrinterSettings) -> Vec<u8> {
        let mut out = Vec::new();

        for op in &self.ops {
            match op {
                // ===== Printer Control =====
                Op::Init => out.extend(commands::init()),
                Op::SetDensity(_) => {}
                Op::Feed { lines } => out.extend(commands::feed_lines(*lines)),
                Op::Cut => out.extend(commands::cut_feed(CUT_FEED_LINES)),

                // ===== Style Changes =====
                Op::SetAlign(alignment) => out.extend(text::align(*alignment)),
                Op::SetBold(true) => out.extend(text::bold_on()),
                Op::SetBold(false) => out.extend(text::bold_off()),
                Op::SetSize(size) => out.extend(text::size(*size)),

                // ===== Content =====
                Op::Line(line) => {
                    out.extend(text::encode(line));
                    out.push(commands::LF);
                }
                Op::Rule => {
                    out.extend(std::iter::repeat_n(b'-', settings.printer.columns as usize));
                    out.push(commands::LF);
                }
                Op::Barcode(data) => {
                    match barcode::code128(data, BARCODE_HEIGHT, BARCODE_MODULE) {
                        Some(cmd) => {
                            out.extend(cmd);
                            out.push(commands::LF);
                        }
                        None => warn!("Skipping barcode that Code128 cannot encode: {:?}", data),
                    }
                }
            }
        }

        out
    }
}

/// Bitmap scale for a text size: the larger multiplier wins, since glyphs
/// are scaled uniformly.
fn line_scale(base: usize, size: TextSize) -> usize {
    let (w, h) = size.multipliers();
    base * w.max(h) as usize
}

fn feed_dots(mut dots: usize, emit: &mut impl FnMut(RasterEvent)) {
    while dots > 0 {
        let step = dots.min(u8::MAX as usize);
        emit(RasterEvent::Feed(step as u8));
        dots -= step;
    }
}
