//! # Intermediate Representation (IR)
//!
//! This module provides the IR layer for label printing. The IR is a
//! "bytecode" representation that sits between print jobs and the raw bytes
//! of whichever protocol the printer speaks.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────┐
//! │  PrintJob   │ ──► │     IR      │ ──► │ Codegen          │
//! │  (label)    │     │  (Vec<Op>)  │     │ raster | ESC/POS │
//! └─────────────┘     └─────────────┘     └──────────────────┘
//! ```
//!
//! ## Benefits of IR
//!
//! 1. **Inspectable**: Tests assert on lines and ordering without decoding bytes
//! 2. **Protocol-neutral**: One layout, two wire formats
//! 3. **Previewable**: The raster walk also feeds the PNG preview
//!
//! ## Example
//!
//! ```
//! use sudsy::ir::{Op, Program};
//! use sudsy::printer::PrinterSettings;
//! use sudsy::protocol::text::Alignment;
//!
//! let mut program = Program::with_init();
//! program.push(Op::SetAlign(Alignment::Center));
//! program.push(Op::SetBold(true));
//! program.push(Op::Line("HELLO".into()));
//! program.push(Op::Cut);
//!
//! let bytes = program.to_bytes(&PrinterSettings::default());
//! assert!(!bytes.is_empty());
//! ```

mod codegen;
mod ops;

// Re-export the ops types (codegen adds methods to Program via impl)
pub use codegen::{LINE_GAP_DOTS, RULE_DOTS, RasterEvent};
pub use ops::*;
