// Reconciliation tests: row identity, append order, partial updates, stale marking

mod common;

use common::{TABLE_ID, empty_document, full_snapshot, named};
use statsmon::decoder::decode_batch;
use statsmon::error::MonitorError;
use statsmon::models::ContainerSnapshot;
use statsmon::reconciler::TableReconciler;
use statsmon::table::{Column, Document};
use std::time::{Duration, Instant};

fn reconciler() -> TableReconciler {
    TableReconciler::new(TABLE_ID, None)
}

fn row_ids(doc: &Document) -> Vec<String> {
    doc.table_body(TABLE_ID)
        .unwrap()
        .rows()
        .iter()
        .map(|r| r.id().to_string())
        .collect()
}

#[test]
fn test_end_to_end_web_batch() {
    let mut doc = empty_document();
    let batch = decode_batch(common::WEB_BATCH).unwrap();
    let summary = reconciler()
        .reconcile(&mut doc, &batch, Instant::now())
        .unwrap();
    assert_eq!(summary.rows_created, 1);

    let body = doc.table_body(TABLE_ID).unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body.query("web", "name"), Some("web"));
    assert_eq!(body.query("web", "cpu"), Some("5.50%"));
    assert_eq!(body.query("web", "mem"), Some("1.00 MiB / 2.00 MiB"));
    assert_eq!(body.query("web", "memperc"), Some("50.00%"));
    assert_eq!(body.query("web", "net"), Some("0.00 MiB / 0.00 MiB"));
    assert_eq!(body.query("web", "block"), Some("0.00 MiB / 0.00 MiB"));
}

#[test]
fn test_repeated_identity_creates_one_row() {
    let mut doc = empty_document();
    let mut r = reconciler();
    let now = Instant::now();
    for i in 0..25 {
        let summary = r
            .reconcile(&mut doc, &[full_snapshot("/abc", i as f64)], now)
            .unwrap();
        assert_eq!(summary.rows_created, usize::from(i == 0));
    }
    assert_eq!(row_ids(&doc), vec!["abc"]);
    assert_eq!(
        doc.table_body(TABLE_ID).unwrap().cell("abc", Column::Cpu),
        Some("24.00%")
    );
}

#[test]
fn test_duplicate_identity_within_one_batch() {
    let mut doc = empty_document();
    let batch = vec![full_snapshot("/abc", 1.0), full_snapshot("/abc", 2.0)];
    let summary = reconciler()
        .reconcile(&mut doc, &batch, Instant::now())
        .unwrap();
    assert_eq!(summary.rows_created, 1);
    assert_eq!(summary.rows_updated, 1);
    assert_eq!(row_ids(&doc), vec!["abc"]);
    // last snapshot wins
    assert_eq!(
        doc.table_body(TABLE_ID).unwrap().cell("abc", Column::Cpu),
        Some("2.00%")
    );
}

#[test]
fn test_new_rows_are_appended_in_arrival_order() {
    let mut doc = empty_document();
    let mut r = reconciler();
    let now = Instant::now();
    r.reconcile(&mut doc, &[named("/b"), named("/a")], now)
        .unwrap();
    r.reconcile(&mut doc, &[named("/c"), named("/a"), named("/b")], now)
        .unwrap();
    assert_eq!(row_ids(&doc), vec!["b", "a", "c"]);
}

#[test]
fn test_missing_field_keeps_previous_cell() {
    let mut doc = empty_document();
    let mut r = reconciler();
    let now = Instant::now();
    r.reconcile(&mut doc, &[full_snapshot("/web", 12.34)], now)
        .unwrap();

    let update = ContainerSnapshot {
        name: Some("/web".into()),
        memory_percent: Some(75.0),
        ..Default::default()
    };
    r.reconcile(&mut doc, &[update], now).unwrap();

    let body = doc.table_body(TABLE_ID).unwrap();
    assert_eq!(body.cell("web", Column::Cpu), Some("12.34%"));
    assert_eq!(body.cell("web", Column::MemPerc), Some("75.00%"));
    assert_eq!(body.cell("web", Column::Mem), Some("1.00 MiB / 2.00 MiB"));
}

#[test]
fn test_new_row_has_full_schema_even_when_sparse() {
    let mut doc = empty_document();
    reconciler()
        .reconcile(&mut doc, &[named("/sparse")], Instant::now())
        .unwrap();
    let body = doc.table_body(TABLE_ID).unwrap();
    let row = body.row("sparse").unwrap();
    let columns: Vec<Column> = row.cells().iter().map(|c| c.column).collect();
    assert_eq!(columns, Column::ALL.to_vec());
    assert_eq!(row.cell(Column::Name), Some("sparse"));
    assert_eq!(row.cell(Column::Cpu), Some(""));
    assert_eq!(row.cell(Column::Block), Some(""));
}

#[test]
fn test_half_of_a_pair_leaves_cell_untouched() {
    let mut doc = empty_document();
    let mut r = reconciler();
    let now = Instant::now();
    r.reconcile(&mut doc, &[full_snapshot("/web", 1.0)], now)
        .unwrap();
    let update = ContainerSnapshot {
        name: Some("/web".into()),
        net_in_bytes: Some(5.0 * common::MIB),
        ..Default::default()
    };
    r.reconcile(&mut doc, &[update], now).unwrap();
    assert_eq!(
        doc.table_body(TABLE_ID).unwrap().cell("web", Column::Net),
        Some("0.00 MiB / 0.00 MiB")
    );
}

#[test]
fn test_identity_strips_only_leading_separator() {
    let mut doc = empty_document();
    reconciler()
        .reconcile(
            &mut doc,
            &[named("/db/replica"), named("plain"), named("//double")],
            Instant::now(),
        )
        .unwrap();
    assert_eq!(row_ids(&doc), vec!["db/replica", "plain", "/double"]);
    assert_eq!(
        doc.table_body(TABLE_ID).unwrap().query("db/replica", "name"),
        Some("db/replica")
    );
}

#[test]
fn test_records_without_usable_name_are_skipped() {
    let mut doc = empty_document();
    let batch = vec![
        ContainerSnapshot {
            cpu_percent: Some(1.0),
            ..Default::default()
        },
        named("/"),
        named(""),
        named("/kept"),
    ];
    let summary = reconciler()
        .reconcile(&mut doc, &batch, Instant::now())
        .unwrap();
    assert_eq!(summary.records_skipped, 3);
    assert_eq!(summary.rows_created, 1);
    assert_eq!(row_ids(&doc), vec!["kept"]);
}

#[test]
fn test_missing_table_body_is_an_error() {
    let mut doc = Document::new();
    let mut r = reconciler();
    for _ in 0..3 {
        let err = r
            .reconcile(&mut doc, &[named("/web")], Instant::now())
            .unwrap_err();
        assert!(matches!(err, MonitorError::MissingContainerElement(ref id) if id == TABLE_ID));
    }
}

#[test]
fn test_rows_go_stale_and_recover() {
    let mut doc = empty_document();
    let mut r = TableReconciler::new(TABLE_ID, Some(Duration::from_secs(10)));
    let t0 = Instant::now();
    r.reconcile(&mut doc, &[named("/web"), named("/db")], t0)
        .unwrap();

    let summary = r
        .reconcile(&mut doc, &[named("/web")], t0 + Duration::from_secs(11))
        .unwrap();
    assert_eq!(summary.rows_stale, 1);
    let body = doc.table_body(TABLE_ID).unwrap();
    assert!(!body.row("web").unwrap().is_stale());
    assert!(body.row("db").unwrap().is_stale());

    let summary = r
        .reconcile(&mut doc, &[named("/db")], t0 + Duration::from_secs(12))
        .unwrap();
    assert_eq!(summary.rows_stale, 0);
    let body = doc.table_body(TABLE_ID).unwrap();
    assert!(!body.row("db").unwrap().is_stale());
    // stale rows are never removed
    assert_eq!(body.len(), 2);
}

#[test]
fn test_stale_marking_disabled() {
    let mut doc = empty_document();
    let mut r = reconciler();
    let t0 = Instant::now();
    r.reconcile(&mut doc, &[named("/web"), named("/db")], t0)
        .unwrap();
    let summary = r
        .reconcile(&mut doc, &[named("/web")], t0 + Duration::from_secs(3600))
        .unwrap();
    assert_eq!(summary.rows_stale, 0);
    assert!(!doc.table_body(TABLE_ID).unwrap().row("db").unwrap().is_stale());
}

#[test]
fn test_sweep_marks_rows_stale_without_a_batch() {
    let mut doc = empty_document();
    let mut r = TableReconciler::new(TABLE_ID, Some(Duration::from_secs(10)));
    let t0 = Instant::now();
    r.reconcile(&mut doc, &[named("/web"), named("/db")], t0)
        .unwrap();

    assert_eq!(r.sweep_stale(&mut doc, t0 + Duration::from_secs(5)).unwrap(), 0);
    assert_eq!(r.sweep_stale(&mut doc, t0 + Duration::from_secs(10)).unwrap(), 2);
    // already flagged rows are not counted again
    assert_eq!(r.sweep_stale(&mut doc, t0 + Duration::from_secs(20)).unwrap(), 0);
    let body = doc.table_body(TABLE_ID).unwrap();
    assert!(body.row("web").unwrap().is_stale());
    assert!(body.row("db").unwrap().is_stale());
    assert_eq!(body.len(), 2);
}

#[test]
fn test_sweep_is_a_no_op_when_disabled_or_body_missing() {
    let mut doc = empty_document();
    let mut r = reconciler();
    let t0 = Instant::now();
    r.reconcile(&mut doc, &[named("/web")], t0).unwrap();
    assert_eq!(r.sweep_stale(&mut doc, t0 + Duration::from_secs(3600)).unwrap(), 0);

    let mut r = TableReconciler::new(TABLE_ID, Some(Duration::from_secs(1)));
    let err = r.sweep_stale(&mut Document::new(), t0).unwrap_err();
    assert!(matches!(err, MonitorError::MissingContainerElement(_)));
}
