//! Store and cleaner integration tests over real files.

use std::fs;
use std::path::PathBuf;

use cpu_bench_core::record::{parse_timestamp, CSV_HEADER, CSV_HEADER_PER_CORE};
use cpu_bench_core::{summarize, BenchmarkRecord, Cleaner, RawMetrics, RecordStore};
use tempfile::TempDir;

fn record(ops: f64) -> BenchmarkRecord {
    let ts = parse_timestamp("2025-01-01_00:00:00").unwrap();
    BenchmarkRecord::from_capture(
        ts,
        10.0,
        RawMetrics {
            ops,
            real_time: 10.1,
            usr_time: 2.0,
            sys_time: 3.0,
        },
    )
}

fn paths(dir: &TempDir) -> (PathBuf, PathBuf) {
    (
        dir.path().join("results").join("raw.csv"),
        dir.path().join("results").join("clean.csv"),
    )
}

#[test]
fn append_writes_header_exactly_once() {
    let dir = TempDir::new().unwrap();
    let (raw, _) = paths(&dir);
    let store = RecordStore::new(&raw);

    for ops in [100.0, 200.0, 300.0] {
        store.append(&record(ops)).unwrap();
    }

    let text = fs::read_to_string(&raw).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4, "header plus three data rows");
    assert_eq!(lines[0], CSV_HEADER);
    assert!(lines[1].starts_with("2025-01-01_00:00:00,10,100,"));

    // reopening an existing log must not write a second header
    store.append(&record(400.0)).unwrap();
    let text = fs::read_to_string(&raw).unwrap();
    assert_eq!(text.matches("timestamp").count(), 1);
    assert_eq!(text.lines().count(), 5);
}

#[test]
fn cleaning_recomputes_derived_metrics_end_to_end() {
    let dir = TempDir::new().unwrap();
    let (raw, clean) = paths(&dir);

    // stale derived columns (999) must be recomputed, not trusted
    let mut log = String::from(CSV_HEADER);
    log.push('\n');
    for ops in [100, 200, 300] {
        log.push_str(&format!("2025-01-01_00:00:0{},10,{},10.1,2,3,999,999\n", ops / 100, ops));
    }
    fs::create_dir_all(raw.parent().unwrap()).unwrap();
    fs::write(&raw, &log).unwrap();

    let rows = Cleaner::new(&raw, &clean).clean().unwrap();
    assert_eq!(rows.len(), 3);
    let real: Vec<f64> = rows.iter().map(|r| r.ops_per_sec_real).collect();
    let cpu: Vec<f64> = rows.iter().map(|r| r.ops_per_sec_cpu).collect();
    assert_eq!(real, vec![10.0, 20.0, 30.0]);
    assert_eq!(cpu, vec![20.0, 40.0, 60.0]);

    let summary = summarize(&rows).unwrap();
    assert!((summary.ops_per_sec_real.min - 10.0).abs() < 1e-9);
    assert!((summary.ops_per_sec_real.max - 30.0).abs() < 1e-9);
    assert!((summary.ops_per_sec_real.mean - 20.0).abs() < 1e-9);
}

#[test]
fn malformed_timestamp_is_excluded_but_raw_log_untouched() {
    let dir = TempDir::new().unwrap();
    let (raw, clean) = paths(&dir);

    let log = format!(
        "{CSV_HEADER}\n\
         2025-01-01_00:00:01,10,100,10.1,2,3,10,20\n\
         2025-01-01 00:00:02,10,200,10.1,2,3,20,40\n\
         not-a-row-at-all\n\
         2025-01-01_00:00:03,10,300,10.1,2,3,30,60\n"
    );
    fs::create_dir_all(raw.parent().unwrap()).unwrap();
    fs::write(&raw, &log).unwrap();

    let rows = Cleaner::new(&raw, &clean).clean().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].ops, 100.0);
    assert_eq!(rows[1].ops, 300.0);

    // raw log is the immutable source of truth
    assert_eq!(fs::read_to_string(&raw).unwrap(), log);
}

#[test]
fn degenerate_cpu_denominator_row_is_excluded() {
    let dir = TempDir::new().unwrap();
    let (raw, clean) = paths(&dir);

    let log = format!(
        "{CSV_HEADER}\n\
         2025-01-01_00:00:01,10,100,10.1,0,0,10,20\n\
         2025-01-01_00:00:02,10,200,10.1,2,3,20,40\n"
    );
    fs::create_dir_all(raw.parent().unwrap()).unwrap();
    fs::write(&raw, &log).unwrap();

    let rows = Cleaner::new(&raw, &clean).clean().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].ops, 200.0);
    let canonical = fs::read_to_string(&clean).unwrap();
    assert!(!canonical.contains("00:00:01"));
}

#[test]
fn missing_raw_log_is_no_data_not_a_crash() {
    let dir = TempDir::new().unwrap();
    let (raw, clean) = paths(&dir);

    let rows = Cleaner::new(&raw, &clean).clean().unwrap();
    assert!(rows.is_empty());
    assert_eq!(fs::read_to_string(&clean).unwrap(), format!("{CSV_HEADER}\n"));
    assert_eq!(summarize(&rows), None);
}

#[test]
fn cleaning_is_byte_for_byte_idempotent() {
    let dir = TempDir::new().unwrap();
    let (raw, clean) = paths(&dir);

    let store = RecordStore::new(&raw);
    for ops in [101.5, 202.25, 333.0] {
        store.append(&record(ops)).unwrap();
    }

    let cleaner = Cleaner::new(&raw, &clean);
    cleaner.clean().unwrap();
    let first = fs::read(&clean).unwrap();
    cleaner.clean().unwrap();
    let second = fs::read(&clean).unwrap();
    assert_eq!(first, second);
}

#[test]
fn load_or_clean_short_circuits_on_existing_canonical() {
    let dir = TempDir::new().unwrap();
    let (raw, clean) = paths(&dir);

    let store = RecordStore::new(&raw);
    store.append(&record(100.0)).unwrap();

    let cleaner = Cleaner::new(&raw, &clean);
    assert_eq!(cleaner.load_or_clean().unwrap().len(), 1);

    // more raw data arrives, but the cached canonical dataset wins
    store.append(&record(200.0)).unwrap();
    assert_eq!(cleaner.load_or_clean().unwrap().len(), 1);

    // a forced re-clean regenerates from the raw log
    assert_eq!(cleaner.clean().unwrap().len(), 2);
    assert_eq!(cleaner.load_or_clean().unwrap().len(), 2);
}

#[test]
fn per_core_log_preserves_core_id_column() {
    let dir = TempDir::new().unwrap();
    let (raw, clean) = paths(&dir);

    let log = format!(
        "{CSV_HEADER_PER_CORE}\n\
         2025-01-01_00:00:01,10,100,10.1,2,3,10,20,0\n\
         2025-01-01_00:00:02,10,200,10.1,2,3,20,40,1\n\
         2025-01-01_00:00:03,10,300,10.1,2,3,30,60\n"
    );
    fs::create_dir_all(raw.parent().unwrap()).unwrap();
    fs::write(&raw, &log).unwrap();

    let rows = Cleaner::new(&raw, &clean).clean().unwrap();
    // the 8-column row does not match the per-core shape and is dropped
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].core_id, Some(0));
    assert_eq!(rows[1].core_id, Some(1));

    let canonical = fs::read_to_string(&clean).unwrap();
    assert!(canonical.starts_with(CSV_HEADER_PER_CORE));
    assert!(canonical.contains(",20,40,1\n"));
}

#[test]
fn non_finite_fields_are_excluded_from_canonical_dataset() {
    let dir = TempDir::new().unwrap();
    let (raw, clean) = paths(&dir);

    // NaN and inf parse as f64 but violate the positive-real field contract
    let log = format!(
        "{CSV_HEADER}\n\
         2025-01-01_00:00:01,10,100,NaN,2,3,10,20\n\
         2025-01-01_00:00:02,inf,100,10.1,2,3,0,20\n\
         2025-01-01_00:00:03,10,300,10.1,2,3,30,60\n"
    );
    fs::create_dir_all(raw.parent().unwrap()).unwrap();
    fs::write(&raw, &log).unwrap();

    let rows = Cleaner::new(&raw, &clean).clean().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].ops, 300.0);
    let canonical = fs::read_to_string(&clean).unwrap();
    assert!(!canonical.contains("NaN"));
    assert!(!canonical.contains("inf"));
}

#[test]
fn interleaved_garbage_from_partial_writes_is_tolerated() {
    let dir = TempDir::new().unwrap();
    let (raw, clean) = paths(&dir);

    let log = format!(
        "{CSV_HEADER}\n\
         2025-01-01_00:00:01,10,100,10.1,2,3,10,20\n\
         2025-01-01_00:00:02,10,2\n\
         stress-ng: info: interleaved stderr noise\n\
         \n\
         2025-01-01_00:00:03,10,abc,10.1,2,3,30,60\n\
         2025-01-01_00:00:04,10,400,10.1,2,3,40,80\n"
    );
    fs::create_dir_all(raw.parent().unwrap()).unwrap();
    fs::write(&raw, &log).unwrap();

    let rows = Cleaner::new(&raw, &clean).clean().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].ops, 100.0);
    assert_eq!(rows[1].ops, 400.0);
}
