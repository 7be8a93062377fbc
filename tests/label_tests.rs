//! # Label Output Tests
//!
//! End-to-end checks from a print job to the bytes each printer family
//! receives, and to the PNG preview. The clock is pinned so output is
//! reproducible.

use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;

use sudsy::ir::RasterEvent;
use sudsy::label::{OrderLabel, PrintJob, SAME_DAY_MARKER};
use sudsy::preview::{MARGIN, rasterize, render_preview};
use sudsy::printer::{PrinterConfig, PrinterSettings};
use sudsy::protocol::commands;

fn stamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

fn receipt() -> PrinterSettings {
    PrinterSettings {
        printer: PrinterConfig::receipt_80mm(),
        ..Default::default()
    }
}

fn jane() -> OrderLabel {
    OrderLabel {
        is_same_day: true,
        ..OrderLabel::new("42", "Jane Doe")
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ============================================================================
// ESC/POS OUTPUT
// ============================================================================

#[test]
fn test_escpos_label_field_order() {
    let bytes = PrintJob::OrderLabel(jane()).encode(&receipt(), stamp());

    assert!(bytes.starts_with(&commands::init()));
    assert!(bytes.ends_with(&commands::cut_feed(3)));

    let fields: Vec<usize> = [
        &b"ORDER #42\n"[..],
        b"Jane Doe\n",
        b"2026-10-16 09:30\n",
        SAME_DAY_MARKER.as_bytes(),
    ]
    .iter()
    .map(|field| find(&bytes, field).unwrap())
    .collect();
    assert!(fields.windows(2).all(|w| w[0] < w[1]), "{fields:?}");

    // No address, weight or bag line on a bare label.
    assert_eq!(find(&bytes, b"LBS"), None);
    assert_eq!(find(&bytes, b"BAG "), None);

    let rule = vec![b'-'; 48];
    let marker = find(&bytes, SAME_DAY_MARKER.as_bytes()).unwrap();
    assert!(find(&bytes, &rule).unwrap() > marker);
}

#[test]
fn test_escpos_address_wraps_at_comma() {
    let order = OrderLabel {
        address: Some("1600 Pennsylvania Avenue NW, Washington, DC 20500".into()),
        ..OrderLabel::new("7", "Ann")
    };
    let bytes = PrintJob::OrderLabel(order).encode(&receipt(), stamp());

    assert!(find(&bytes, b"1600 Pennsylvania\n").is_some());
    assert!(find(&bytes, b"Avenue NW,\n").is_some());
    assert!(find(&bytes, b"Washington, DC 20500\n").is_some());
}

#[test]
fn test_escpos_non_ascii_is_replaced() {
    let bytes = PrintJob::OrderLabel(OrderLabel::new("9", "Zoë")).encode(&receipt(), stamp());
    assert!(find(&bytes, b"Zo?\n").is_some());
}

#[test]
fn test_escpos_barcode_follows_order_number() {
    let settings = PrinterSettings {
        barcode: true,
        ..receipt()
    };
    let bytes = PrintJob::OrderLabel(jane()).encode(&settings, stamp());

    let order = find(&bytes, b"ORDER #42").unwrap();
    let barcode = find(&bytes, &[0x1D, b'k']).unwrap();
    let name = find(&bytes, b"Jane Doe").unwrap();
    assert!(order < barcode && barcode < name);
}

#[test]
fn test_manifest_from_json() {
    let json = r#"[
        {"orderId": "7", "customerName": "Ann", "totalBags": 2},
        {"orderId": "9", "customerName": "Bo", "isSameDay": true, "address": "4 Oak Rd"}
    ]"#;
    let entries: Vec<OrderLabel> = serde_json::from_str(json).unwrap();
    let bytes = PrintJob::PickupManifest { entries }.encode(&receipt(), stamp());

    let expected = [
        &b"PICKUP MANIFEST\n"[..],
        b"2026-10-16\n",
        b"1. #7 Ann\n",
        b"BAGS: 2\n",
        b"2. #9 Bo\n",
        b"4 Oak Rd\n",
        SAME_DAY_MARKER.as_bytes(),
        b"TOTAL ORDERS: 2\n",
    ];
    let positions: Vec<usize> = expected
        .iter()
        .map(|line| find(&bytes, line).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
}

// ============================================================================
// RASTER OUTPUT
// ============================================================================

#[test]
fn test_raster_label_is_deterministic() {
    let settings = PrinterSettings::default();
    let a = PrintJob::OrderLabel(jane()).encode(&settings, stamp());
    let b = PrintJob::OrderLabel(jane()).encode(&settings, stamp());
    assert_eq!(a, b);

    let other = PrintJob::OrderLabel(OrderLabel::new("43", "Jane Doe")).encode(&settings, stamp());
    assert_ne!(a, other);
}

#[test]
fn test_raster_rows_never_exceed_width() {
    let settings = PrinterSettings::default();
    let order = OrderLabel {
        notes: Some("Pneumonoultramicroscopicsilicovolcanoconiosis".into()),
        ..OrderLabel::new("123456789012345678901234567890", "A very long customer name indeed")
    };
    let program = PrintJob::OrderLabel(order).build(&settings, stamp());

    let mut rows = 0;
    program.walk_raster(&settings, |event| {
        if let RasterEvent::Row(row) = event {
            assert_eq!(row.len(), settings.printer.width_bytes as usize);
            rows += 1;
        }
    });
    assert!(rows > 0);
}

#[test]
fn test_raster_label_framing() {
    let settings = PrinterSettings::default();
    let bytes = PrintJob::OrderLabel(jane()).encode(&settings, stamp());

    assert_eq!(&bytes[..6], &[0x1B, 0x40, 0x1B, b'i', b'a', 1]);
    assert_eq!(&bytes[6..10], &[0x1B, b'i', b'D', 5]);
    assert_eq!(bytes.last(), Some(&0x0C));
}

// ============================================================================
// PREVIEW
// ============================================================================

#[test]
fn test_preview_matches_rasterized_size() {
    let settings = PrinterSettings::default();
    let program = PrintJob::OrderLabel(jane()).build(&settings, stamp());

    let rows = rasterize(&program, &settings);
    let png = render_preview(&program, &settings).unwrap();
    let img = image::load_from_memory(&png).unwrap();

    assert_eq!(img.width(), 384 + 2 * MARGIN);
    assert_eq!(img.height(), rows.len() as u32 + 2 * MARGIN);
    assert!(rows.iter().flatten().any(|on| *on));
}
