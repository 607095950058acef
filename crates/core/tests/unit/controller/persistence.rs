//! Q-Table Persistence Tests.
//!
//! Loading at construction, periodic and final saves, and recovery from
//! unusable files.

use pretty_assertions::assert_eq;
use rlpf_core::common::{AccessInfo, QTableError};
use rlpf_core::config::ControllerConfig;
use rlpf_core::controller::{PrefetchController, TableOrigin};
use rlpf_core::rl::{LoadOutcome, QTable, State};
use tempfile::tempdir;

use crate::common::{config, counters, init_tracing};

fn persistent(path: &std::path::Path, lr: f64) -> ControllerConfig {
    ControllerConfig {
        qtable_file: Some(path.to_path_buf()),
        ..config(100, lr, 0.0)
    }
}

#[test]
fn absent_file_starts_fresh() {
    let dir = tempdir().unwrap();
    let (_cpu, source) = counters();
    let ctl = PrefetchController::new(&persistent(&dir.path().join("q.bin"), 0.2), source).unwrap();
    assert!(matches!(ctl.table_origin(), TableOrigin::Fresh));
    assert!(ctl.qtable().is_empty());
}

#[test]
fn shutdown_then_reload_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("q.bin");
    let config = persistent(&path, 0.5);

    let (cpu, source) = counters();
    let mut first = PrefetchController::new(&config, source).unwrap();
    for epoch in 1..=10 {
        cpu.advance(epoch * 37, 100);
        let _ = first.on_tick(epoch * 100);
    }
    first.shutdown().unwrap();
    let learned = first.qtable().clone();
    assert!(!learned.is_empty());
    drop(first);

    let (_cpu, source) = counters();
    let second = PrefetchController::new(&config, source).unwrap();
    assert!(matches!(second.table_origin(), TableOrigin::Loaded));
    assert_eq!(second.qtable(), &learned);
}

#[test]
fn drop_performs_final_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("q.bin");
    {
        let (cpu, source) = counters();
        let mut ctl = PrefetchController::new(&persistent(&path, 0.5), source).unwrap();
        cpu.advance(100, 100);
        let _ = ctl.on_tick(100);
    }
    match QTable::load(&path, 2, "stride;tagged;") {
        LoadOutcome::Loaded(table) => assert_eq!(table.value(State::INITIAL, 0), 0.5),
        other => panic!("expected a saved table, got {other:?}"),
    }
}

#[test]
fn three_action_table_with_two_children_is_recovered() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = dir.path().join("q.bin");
    let mut three = QTable::new(3);
    three.update(State(121), 2, 9.0).unwrap();
    three.save(&path, "stride;tagged;stream;").unwrap();

    let (cpu, source) = counters();
    let mut ctl = PrefetchController::new(&persistent(&path, 0.2), source).unwrap();
    assert!(matches!(
        ctl.table_origin(),
        TableOrigin::Recovered(QTableError::ActionCountMismatch { expected: 2, found: 3 })
    ));
    assert!(ctl.qtable().is_empty());

    // Runs normally afterwards.
    for tick in 0..1000 {
        cpu.advance(1, 2);
        let _ = ctl.on_access(&AccessInfo::new(tick, tick * 64, false));
    }
    assert_eq!(ctl.epochs(), 9);
    assert!(ctl.active_action() < 2);
}

#[test]
fn reordered_children_do_not_reuse_table() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("q.bin");
    QTable::new(2).save(&path, "tagged;stride;").unwrap();

    let (_cpu, source) = counters();
    let ctl = PrefetchController::new(&persistent(&path, 0.2), source).unwrap();
    assert!(matches!(
        ctl.table_origin(),
        TableOrigin::Recovered(QTableError::SignatureMismatch { .. })
    ));
}

#[test]
fn periodic_save_every_n_epochs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("q.bin");
    let mut config = persistent(&path, 0.2);
    config.save_interval_epochs = 2;

    let (_cpu, source) = counters();
    let mut ctl = PrefetchController::new(&config, source).unwrap();
    let _ = ctl.on_tick(100);
    assert!(!path.exists());
    let _ = ctl.on_tick(200);
    assert!(path.exists());
}

#[test]
fn save_failure_does_not_abort_run() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("q.bin");
    let mut config = persistent(&path, 0.2);
    config.save_interval_epochs = 1;

    let (_cpu, source) = counters();
    let mut ctl = PrefetchController::new(&config, source).unwrap();
    for t in 1..=5 {
        assert!(ctl.on_tick(t * 100).is_some());
    }
    assert!(matches!(ctl.shutdown(), Err(QTableError::Io(_))));
    assert_eq!(ctl.epochs(), 5);
}

#[test]
fn no_path_means_no_file_io() {
    let (_cpu, source) = counters();
    let mut ctl = PrefetchController::new(&config(100, 0.2, 0.0), source).unwrap();
    assert_eq!(ctl.qtable_path(), None);
    assert!(ctl.save_qtable().is_ok());
    assert!(ctl.shutdown().is_ok());
}
