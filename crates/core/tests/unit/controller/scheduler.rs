//! Epoch Scheduler Tests.

use rlpf_core::controller::scheduler::{Boundary, EpochPhase, EpochScheduler};

#[test]
fn idle_until_epoch_length_elapses() {
    let mut s = EpochScheduler::new(1000, 0);
    assert_eq!(s.phase(999), EpochPhase::Idle);
    assert_eq!(s.poll(999), None);
    assert_eq!(s.phase(1000), EpochPhase::Boundary);
}

#[test]
fn boundary_restarts_epoch_at_observed_tick() {
    let mut s = EpochScheduler::new(1000, 0);
    assert_eq!(
        s.poll(1003),
        Some(Boundary {
            epoch: 0,
            started_at: 0,
            ended_at: 1003
        })
    );
    assert_eq!(s.epoch_start(), 1003);
    assert_eq!(s.poll(2002), None);
    assert_eq!(s.poll(2003).map(|b| b.epoch), Some(1));
    assert_eq!(s.completed(), 2);
}

#[test]
fn one_boundary_per_poll_when_jumping() {
    let mut s = EpochScheduler::new(1000, 0);
    assert_eq!(s.poll(5500).map(|b| b.epoch), Some(0));
    // The skipped windows collapsed into the first one.
    assert_eq!(s.poll(5500), None);
    assert_eq!(s.poll(6000), None);
    assert_eq!(s.poll(6500).map(|b| b.started_at), Some(5500));
    assert_eq!(s.completed(), 2);
}

#[test]
fn stale_ticks_are_ignored() {
    let mut s = EpochScheduler::new(1000, 0);
    let _ = s.poll(1000);
    assert_eq!(s.poll(100), None);
    assert_eq!(s.phase(100), EpochPhase::Idle);
    assert_eq!(s.completed(), 1);
}

#[test]
fn same_tick_never_processed_twice() {
    let mut s = EpochScheduler::new(1, 0);
    assert!(s.poll(1).is_some());
    assert!(s.poll(1).is_none());
    assert!(s.poll(2).is_some());
}

#[test]
fn zero_length_is_treated_as_one_tick() {
    let s = EpochScheduler::new(0, 10);
    assert_eq!(s.ticks_per_epoch(), 1);
    assert_eq!(s.phase(11), EpochPhase::Boundary);
}
