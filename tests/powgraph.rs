use simmix::{ LayoutDims, PowerTrace, RowFormula };
use std::fs;
use std::process::Command;

#[test]
fn feed_logs_from_files() {
    let tmp = tempfile::tempdir().unwrap();
    let a = tmp.path().join("run.brd0.chp0.unt0.blk0.log");
    let b = tmp.path().join("run.brd0.chp0.unt1.blk2.log");
    let other = tmp.path().join("notes.log");
    fs::write(&a, "boot\n[RMD_TRACE_POWER] Power 12.5 100\n\
                   [RMD_TRACE_POWER] Power 1.0 200\n").unwrap();
    fs::write(&b, "[RMD_TRACE_POWER] Power 2.5 100\n").unwrap();
    fs::write(&other, "[RMD_TRACE_POWER] Power 99 100\n").unwrap();

    let mut trace = PowerTrace::new(LayoutDims::default(), RowFormula::Legacy).unwrap();
    assert_eq!(trace.feed_log(&a).unwrap(), Some(2));
    assert_eq!(trace.feed_log(&b).unwrap(), Some(1));
    assert_eq!(trace.feed_log(&other).unwrap(), None);

    assert_eq!(trace.cycles[&100].get(0, 0), Some(12.5));
    // unit 1, block 2: col 2 + 1 * 4
    assert_eq!(trace.cycles[&100].get(0, 6), Some(2.5));
    let totals: Vec<_> = trace.totals().collect();
    assert_eq!(totals, vec![(100.0 / 4200000.0, 15.0), (200.0 / 4200000.0, 1.0)]);

    let mut again = PowerTrace::new(LayoutDims::default(), RowFormula::Legacy).unwrap();
    for p in [&a, &b, &other] {
        again.feed_log(p).unwrap();
    }
    assert_eq!(trace, again);
}

#[test]
fn powgraph_report() {
    let tmp = tempfile::tempdir().unwrap();
    let log = tmp.path().join("x.brd0.chp0.unt0.blk0.log");
    fs::write(&log, "[RMD_TRACE_POWER] Power 12.5 100\n").unwrap();
    let db = tmp.path().join("trace.cbor");
    let out = Command::new(env!("CARGO_BIN_EXE_powgraph"))
        .arg(&log)
        .arg(tmp.path().join("unrelated.txt"))
        .arg("--db-output").arg(&db)
        .output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines, vec![
        "Power Over Time".to_string(),
        "time (ms) , Power (W)".to_string(),
        format!("{}, {}", 100.0 / 4200000.0, 12.5),
    ]);
    let saved = PowerTrace::load(&db, LayoutDims::default()).unwrap();
    assert_eq!(saved.cycles.len(), 1);
}

#[test]
fn powgraph_zero_dims() {
    let tmp = tempfile::tempdir().unwrap();
    let log = tmp.path().join("x.brd0.chp0.unt0.blk0.log");
    fs::write(&log, "[RMD_TRACE_POWER] Power 1 1\n").unwrap();
    let out = Command::new(env!("CARGO_BIN_EXE_powgraph"))
        .arg(&log)
        .args(["--unit-height", "0"])
        .output().unwrap();
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
}
