//! # IR Opcodes
//!
//! This module defines the intermediate representation (IR) for label and
//! receipt printing. The IR is a sequence of opcodes that can be inspected
//! and compiled to either printer protocol.
//!
//! ## Design Philosophy
//!
//! The IR sits between print jobs and raw printer bytes:
//!
//! ```text
//! PrintJob → IR (inspectable) → Codegen (raster | ESC/POS) → Bytes
//! ```
//!
//! Ops describe intent ("a line of text", "a separator"), not bytes. Each
//! protocol decides how to realize them: the raster codegen renders text
//! into bitmap rows, the ESC/POS codegen hands it to the printer's font.

use crate::protocol::text::{Alignment, TextSize};

/// IR opcodes - the "bytecode" for a label.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    // ========== Printer Control ==========
    /// Reset the printer and enter its print mode.
    Init,

    /// Raster heat level. Ignored by ESC/POS printers.
    SetDensity(u8),

    /// Feed `lines` blank text lines.
    Feed { lines: u8 },

    /// End of job: cut (ESC/POS) or form feed to the tear line (raster).
    Cut,

    // ========== Style Changes ==========
    /// Text alignment. Raster output is always centered.
    SetAlign(Alignment),

    /// Enable/disable bold. Ignored by the raster renderer.
    SetBold(bool),

    /// Character size for following lines.
    SetSize(TextSize),

    // ========== Content ==========
    /// One line of text, terminated by a line feed.
    Line(String),

    /// A full-width separator.
    Rule,

    /// Code128 barcode. Skipped by raster printers.
    Barcode(String),
}

/// A compiled IR program.
///
/// Contains a sequence of ops that can be compiled to bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub ops: Vec<Op>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Create a program with an initial Init op.
    pub fn with_init() -> Self {
        Self {
            ops: vec![Op::Init],
        }
    }

    /// Add an op to the program.
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Add multiple ops to the program.
    pub fn extend(&mut self, ops: impl IntoIterator<Item = Op>) {
        self.ops.extend(ops);
    }

    /// Get the number of ops in the program.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the program is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate over ops.
    pub fn iter(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter()
    }

    /// Text of every `Line` op, in order.
    pub fn lines(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Line(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl FromIterator<Op> for Program {
    fn from_iter<T: IntoIterator<Item = Op>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Program {
    type Item = Op;
    type IntoIter = std::vec::IntoIter<Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_new() {
        let program = Program::new();
        assert!(program.is_empty());
    }

    #[test]
    fn test_program_with_init() {
        let program = Program::with_init();
        assert_eq!(program.len(), 1);
        assert_eq!(program.ops[0], Op::Init);
    }

    #[test]
    fn test_lines_skips_control_ops() {
        let mut program = Program::with_init();
        program.push(Op::SetBold(true));
        program.push(Op::Line("ORDER #42".into()));
        program.push(Op::Rule);
        program.push(Op::Line("JANE DOE".into()));
        program.push(Op::Cut);
        assert_eq!(program.lines(), vec!["ORDER #42", "JANE DOE"]);
    }

    #[test]
    fn test_collect() {
        let program: Program = [Op::Init, Op::Cut].into_iter().collect();
        assert_eq!(program.len(), 2);
        assert_eq!(program.into_iter().last(), Some(Op::Cut));
    }
}
