use super::*;
use cryoflow_core::SessionState;

fn config(threshold: u64, interval_ms: u64) -> Class2dConfig {
    Class2dConfig {
        particle_threshold: threshold,
        batch_interval_ms: interval_ms,
        ..Class2dConfig::default()
    }
}

#[test]
fn does_not_trigger_below_threshold() {
    let state = SessionState {
        particles_extracted: 500,
        ..SessionState::default()
    };
    assert!(!should_trigger(&state, &config(1000, 0), 0));
}

#[test]
fn triggers_on_first_batch_once_threshold_reached() {
    let state = SessionState {
        particles_extracted: 1000,
        last_batch_2d_ms: None,
        ..SessionState::default()
    };
    assert!(should_trigger(&state, &config(1000, 3_600_000), 10));
}

#[test]
fn does_not_retrigger_within_the_batch_interval() {
    let state = SessionState {
        particles_extracted: 5000,
        last_batch_2d_ms: Some(1_000_000),
        ..SessionState::default()
    };
    assert!(!should_trigger(&state, &config(1000, 3_600_000), 1_500_000));
}

#[test]
fn retriggers_once_the_batch_interval_has_elapsed() {
    let state = SessionState {
        particles_extracted: 5000,
        last_batch_2d_ms: Some(1_000_000),
        ..SessionState::default()
    };
    assert!(should_trigger(
        &state,
        &config(1000, 3_600_000),
        1_000_000 + 3_600_001
    ));
}

#[test]
fn exact_interval_boundary_does_not_retrigger() {
    let state = SessionState {
        particles_extracted: 5000,
        last_batch_2d_ms: Some(1_000_000),
        ..SessionState::default()
    };
    assert!(!should_trigger(
        &state,
        &config(1000, 3_600_000),
        1_000_000 + 3_600_000
    ));
}
