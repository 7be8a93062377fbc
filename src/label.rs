//! # Print Jobs and Label Layout
//!
//! The three kinds of job the counter prints, and how each is laid out as an
//! IR [`Program`].
//!
//! ## Order Label
//!
//! ```text
//!         ORDER #42          order id (always, large)
//!         |||||||||          Code128 of the id (ESC/POS, when enabled)
//!         JANE DOE           customer name (always)
//!       12 ELM STREET,       address, wrapped at ~20 columns (if present)
//!        SPRINGFIELD
//!      2026-10-16 09:30      timestamp (always)
//!        BAG 1 OF 3          if bag number and total are both present
//!         12.5 LBS           weight (if present)
//!     *** SAME DAY ***       if same-day
//!       FRAGILE ITEMS        notes (if present)
//!   ──────────────────────   separator
//! ```
//!
//! ## Pickup Manifest
//!
//! A header and date, then each order prefixed with its 1-based position in
//! the order given, then `TOTAL ORDERS: n`.
//!
//! Layout is a pure function of the job, the settings and the timestamp it
//! is handed, so tests can pin the clock.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SudsyError};
use crate::ir::{Op, Program};
use crate::printer::PrinterSettings;
use crate::protocol::PrinterProtocol;
use crate::protocol::text::{Alignment, TextSize};
use crate::render::bitmap::columns_for;

/// Format of the date/time line on labels.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Format of the date line on manifests.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Emphasis line for same-day orders.
pub const SAME_DAY_MARKER: &str = "*** SAME DAY ***";

/// Manifest heading.
pub const MANIFEST_HEADER: &str = "PICKUP MANIFEST";

const TRAILING_FEED_LINES: u8 = 2;

// ============================================================================
// JOB TYPES
// ============================================================================

/// An order (or one bag of it) as printed on a label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLabel {
    pub order_id: String,
    pub customer_name: String,
    #[serde(default)]
    pub address: Option<String>,
    /// Weight in pounds.
    #[serde(default)]
    pub weight: Option<f32>,
    #[serde(default)]
    pub bag_number: Option<u32>,
    #[serde(default)]
    pub total_bags: Option<u32>,
    #[serde(default)]
    pub is_same_day: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl OrderLabel {
    pub fn new(order_id: impl Into<String>, customer_name: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            customer_name: customer_name.into(),
            ..Default::default()
        }
    }

    /// The same label for bag `bag_number` of `total_bags`.
    pub fn for_bag(&self, bag_number: u32, total_bags: u32) -> Self {
        Self {
            bag_number: Some(bag_number),
            total_bags: Some(total_bags),
            ..self.clone()
        }
    }
}

/// Something to print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PrintJob {
    PlainText { body: String },
    OrderLabel(OrderLabel),
    PickupManifest { entries: Vec<OrderLabel> },
}

impl PrintJob {
    /// Lay the job out as an IR program.
    pub fn build(&self, settings: &PrinterSettings, stamp: NaiveDateTime) -> Program {
        match self {
            PrintJob::PlainText { body } => plain_text(body, settings),
            PrintJob::OrderLabel(order) => order_label(order, settings, stamp),
            PrintJob::PickupManifest { entries } => pickup_manifest(entries, settings, stamp),
        }
    }

    /// Lay out and compile to printer bytes.
    pub fn encode(&self, settings: &PrinterSettings, stamp: NaiveDateTime) -> Vec<u8> {
        self.build(settings, stamp).to_bytes(settings)
    }
}

/// One label per bag, numbered `1..=count` of `count`.
pub fn bag_labels(order: &OrderLabel, count: u32) -> Result<Vec<PrintJob>> {
    if count == 0 {
        return Err(SudsyError::InvalidJob("label count must be at least 1".into()));
    }
    Ok((1..=count)
        .map(|bag| PrintJob::OrderLabel(order.for_bag(bag, count)))
        .collect())
}

/// A pickup manifest listing `orders` in the order given.
pub fn pickup_sheet(orders: &[OrderLabel]) -> Result<PrintJob> {
    if orders.is_empty() {
        return Err(SudsyError::InvalidJob("pickup sheet has no orders".into()));
    }
    Ok(PrintJob::PickupManifest {
        entries: orders.to_vec(),
    })
}

// ============================================================================
// LAYOUT
// ============================================================================

/// Characters that fit on one body line for the configured printer.
pub fn text_columns(settings: &PrinterSettings) -> usize {
    match settings.printer.protocol {
        PrinterProtocol::Raster => {
            columns_for(settings.printer.width_bytes as usize, settings.text_scale())
        }
        PrinterProtocol::EscPos => settings.printer.columns as usize,
    }
}

fn preamble(settings: &PrinterSettings) -> Program {
    let mut program = Program::with_init();
    if settings.printer.protocol == PrinterProtocol::Raster {
        program.push(Op::SetDensity(settings.density));
    }
    program
}

fn push_wrapped(program: &mut Program, text: &str, columns: usize) {
    program.extend(wrap_words(text, columns).into_iter().map(Op::Line));
}

fn finish(program: &mut Program) {
    program.push(Op::Feed {
        lines: TRAILING_FEED_LINES,
    });
    program.push(Op::Cut);
}

fn plain_text(body: &str, settings: &PrinterSettings) -> Program {
    let columns = text_columns(settings);
    let mut program = preamble(settings);
    program.push(Op::SetAlign(Alignment::Left));

    for line in body.lines() {
        if line.trim().is_empty() {
            program.push(Op::Line(String::new()));
        } else {
            push_wrapped(&mut program, line, columns);
        }
    }

    finish(&mut program);
    program
}

fn order_label(order: &OrderLabel, settings: &PrinterSettings, stamp: NaiveDateTime) -> Program {
    let columns = text_columns(settings);
    let mut program = preamble(settings);
    program.push(Op::SetAlign(Alignment::Center));

    program.push(Op::SetSize(TextSize::DoubleHeight));
    program.push(Op::SetBold(true));
    program.push(Op::Line(format!("ORDER #{}", order.order_id)));
    program.push(Op::SetBold(false));
    program.push(Op::SetSize(TextSize::Normal));

    if settings.barcode {
        program.push(Op::Barcode(order.order_id.clone()));
    }

    program.push(Op::Line(order.customer_name.clone()));

    if let Some(address) = order.address.as_deref().filter(|a| !a.trim().is_empty()) {
        push_wrapped(&mut program, address, settings.address_wrap);
    }

    program.push(Op::Line(stamp.format(TIMESTAMP_FORMAT).to_string()));

    if let (Some(bag), Some(total)) = (order.bag_number, order.total_bags) {
        program.push(Op::Line(format!("BAG {} OF {}", bag, total)));
    }

    if let Some(weight) = order.weight {
        program.push(Op::Line(format!("{:.1} LBS", weight)));
    }

    if order.is_same_day {
        program.push(Op::SetBold(true));
        program.push(Op::Line(SAME_DAY_MARKER.to_string()));
        program.push(Op::SetBold(false));
    }

    if let Some(notes) = order.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        push_wrapped(&mut program, notes, columns);
    }

    program.push(Op::Rule);
    finish(&mut program);
    program
}

fn pickup_manifest(
    entries: &[OrderLabel],
    settings: &PrinterSettings,
    stamp: NaiveDateTime,
) -> Program {
    let columns = text_columns(settings);
    let mut program = preamble(settings);

    program.push(Op::SetAlign(Alignment::Center));
    program.push(Op::SetBold(true));
    program.push(Op::Line(MANIFEST_HEADER.to_string()));
    program.push(Op::SetBold(false));
    program.push(Op::Line(stamp.format(DATE_FORMAT).to_string()));
    program.push(Op::Rule);
    program.push(Op::SetAlign(Alignment::Left));

    for (i, entry) in entries.iter().enumerate() {
        push_wrapped(
            &mut program,
            &format!("{}. #{} {}", i + 1, entry.order_id, entry.customer_name),
            columns,
        );
        if let Some(address) = entry.address.as_deref().filter(|a| !a.trim().is_empty()) {
            push_wrapped(&mut program, address, settings.address_wrap);
        }
        if let Some(total) = entry.total_bags {
            program.push(Op::Line(format!("BAGS: {}", total)));
        }
        if entry.is_same_day {
            program.push(Op::Line(SAME_DAY_MARKER.to_string()));
        }
    }

    program.push(Op::Rule);
    program.push(Op::SetAlign(Alignment::Center));
    program.push(Op::SetBold(true));
    program.push(Op::Line(format!("TOTAL ORDERS: {}", entries.len())));
    program.push(Op::SetBold(false));
    finish(&mut program);
    program
}

// ============================================================================
// WORD WRAP
// ============================================================================

/// Greedy word wrap at `columns` characters.
///
/// Words break at whitespace and after commas; a comma stays with the word
/// before it. Words are never split, so a word longer than `columns` gets a
/// line of its own.
///
/// ```
/// use sudsy::label::wrap_words;
///
/// assert_eq!(
///     wrap_words("12 Elm Street, Springfield", 20),
///     vec!["12 Elm Street,", "Springfield"],
/// );
/// ```
pub fn wrap_words(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in words(text) {
        let needed = if line.is_empty() {
            word.chars().count()
        } else {
            line.chars().count() + 1 + word.chars().count()
        };

        if needed > columns && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Split at whitespace and after commas.
fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace().flat_map(|token| {
        token
            .split_inclusive(',')
            .filter(|piece| !piece.is_empty())
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::PrinterConfig;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_wrap_basic() {
        assert_eq!(wrap_words("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_words("", 20), Vec::<String>::new());
        assert_eq!(wrap_words("   ", 20), Vec::<String>::new());
    }

    #[test]
    fn test_wrap_splits_after_commas() {
        assert_eq!(
            wrap_words("Apt 4,12 Elm St,Springfield", 12),
            vec!["Apt 4, 12", "Elm St,", "Springfield"]
        );
    }

    #[test]
    fn test_wrap_never_splits_words() {
        let lines = wrap_words("a supercalifragilistic word", 10);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "word"]);
    }

    #[test]
    fn test_wrap_respects_budget() {
        let text = "1600 Pennsylvania Avenue NW, Washington, DC 20500";
        for line in wrap_words(text, 20) {
            assert!(line.chars().count() <= 20, "{line}");
        }
    }

    #[test]
    fn test_bag_labels() {
        let jobs = bag_labels(&OrderLabel::new("42", "Jane Doe"), 3).unwrap();
        let bags: Vec<(Option<u32>, Option<u32>)> = jobs
            .iter()
            .map(|job| match job {
                PrintJob::OrderLabel(order) => (order.bag_number, order.total_bags),
                other => panic!("unexpected job {other:?}"),
            })
            .collect();
        assert_eq!(bags, vec![(Some(1), Some(3)), (Some(2), Some(3)), (Some(3), Some(3))]);

        let err = bag_labels(&OrderLabel::new("42", "Jane Doe"), 0).unwrap_err();
        assert!(matches!(err, SudsyError::InvalidJob(_)));
    }

    #[test]
    fn test_pickup_sheet() {
        let orders = vec![OrderLabel::new("7", "Ann"), OrderLabel::new("9", "Bo")];
        assert_eq!(
            pickup_sheet(&orders).unwrap(),
            PrintJob::PickupManifest {
                entries: orders.clone()
            }
        );
        assert!(matches!(pickup_sheet(&[]), Err(SudsyError::InvalidJob(_))));
    }

    #[test]
    fn test_text_columns() {
        assert_eq!(text_columns(&PrinterSettings::default()), 24);
        let receipt = PrinterSettings {
            printer: PrinterConfig::receipt_80mm(),
            ..Default::default()
        };
        assert_eq!(text_columns(&receipt), 48);
    }

    #[test]
    fn test_order_label_minimal() {
        let order = OrderLabel {
            is_same_day: true,
            ..OrderLabel::new("42", "Jane Doe")
        };
        let program = PrintJob::OrderLabel(order).build(&PrinterSettings::default(), stamp());

        assert_eq!(
            program.lines(),
            vec!["ORDER #42", "Jane Doe", "2026-10-16 09:30", SAME_DAY_MARKER]
        );
        let ops: Vec<&Op> = program.iter().collect();
        let rule = ops.iter().position(|op| **op == Op::Rule).unwrap();
        let marker = ops
            .iter()
            .position(|op| **op == Op::Line(SAME_DAY_MARKER.into()))
            .unwrap();
        assert!(rule > marker);
        assert_eq!(ops.last(), Some(&&Op::Cut));
    }

    #[test]
    fn test_order_label_full() {
        let order = OrderLabel {
            address: Some("12 Elm Street, Springfield".into()),
            weight: Some(12.5),
            bag_number: Some(2),
            total_bags: Some(3),
            notes: Some("No starch".into()),
            ..OrderLabel::new("A-7", "Sam Lee")
        };
        let program = PrintJob::OrderLabel(order).build(&PrinterSettings::default(), stamp());

        assert_eq!(
            program.lines(),
            vec![
                "ORDER #A-7",
                "Sam Lee",
                "12 Elm Street,",
                "Springfield",
                "2026-10-16 09:30",
                "BAG 2 OF 3",
                "12.5 LBS",
                "No starch",
            ]
        );
    }

    #[test]
    fn test_bag_line_needs_both_numbers() {
        let order = OrderLabel {
            bag_number: Some(1),
            ..OrderLabel::new("1", "A")
        };
        let program = PrintJob::OrderLabel(order).build(&PrinterSettings::default(), stamp());
        assert!(!program.lines().iter().any(|l| l.starts_with("BAG")));
    }

    #[test]
    fn test_barcode_toggle() {
        let settings = PrinterSettings {
            barcode: true,
            ..Default::default()
        };
        let program = PrintJob::OrderLabel(OrderLabel::new("42", "Jane")).build(&settings, stamp());
        assert!(program.iter().any(|op| *op == Op::Barcode("42".into())));

        let program =
            PrintJob::OrderLabel(OrderLabel::new("42", "Jane")).build(&PrinterSettings::default(), stamp());
        assert!(!program.iter().any(|op| matches!(op, Op::Barcode(_))));
    }

    #[test]
    fn test_density_only_for_raster() {
        let job = PrintJob::PlainText { body: "hi".into() };
        let raster = job.build(&PrinterSettings::default(), stamp());
        assert!(raster.iter().any(|op| matches!(op, Op::SetDensity(5))));

        let receipt = PrinterSettings {
            printer: PrinterConfig::receipt_80mm(),
            ..Default::default()
        };
        let escpos = job.build(&receipt, stamp());
        assert!(!escpos.iter().any(|op| matches!(op, Op::SetDensity(_))));
    }

    #[test]
    fn test_plain_text_wraps_and_keeps_blank_lines() {
        let job = PrintJob::PlainText {
            body: "Thank you for choosing us today\n\nBye".into(),
        };
        let program = job.build(&PrinterSettings::default(), stamp());
        assert_eq!(
            program.lines(),
            vec!["Thank you for choosing", "us today", "", "Bye"]
        );
    }

    #[test]
    fn test_manifest() {
        let entries = vec![
            OrderLabel {
                total_bags: Some(2),
                ..OrderLabel::new("7", "Ann")
            },
            OrderLabel {
                is_same_day: true,
                ..OrderLabel::new("9", "Bo")
            },
        ];
        let program = PrintJob::PickupManifest { entries }.build(&PrinterSettings::default(), stamp());
        assert_eq!(
            program.lines(),
            vec![
                MANIFEST_HEADER,
                "2026-10-16",
                "1. #7 Ann",
                "BAGS: 2",
                "2. #9 Bo",
                SAME_DAY_MARKER,
                "TOTAL ORDERS: 2",
            ]
        );
    }

    #[test]
    fn test_job_json() {
        let job: PrintJob = serde_json::from_str(
            r#"{"type":"orderLabel","orderId":"42","customerName":"Jane Doe","isSameDay":true}"#,
        )
        .unwrap();
        let PrintJob::OrderLabel(order) = job else {
            panic!("expected order label");
        };
        assert_eq!(order.order_id, "42");
        assert!(order.is_same_day);
        assert_eq!(order.address, None);
    }

    #[test]
    fn test_for_bag() {
        let order = OrderLabel::new("42", "Jane").for_bag(2, 3);
        assert_eq!(order.bag_number, Some(2));
        assert_eq!(order.total_bags, Some(3));
    }
}
