use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use scrape_core::{IdleBackoff, MAX_IDLE_SLEEP};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(worker_logging::initialize_for_tests);
}

fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_secs).collect()
}

#[test]
fn twenty_five_empty_polls_climb_the_staircase() {
    init_logging();
    let mut backoff = IdleBackoff::new(Duration::from_secs(5));
    let sleeps: Vec<Duration> = (0..25).map(|_| backoff.on_empty_poll()).collect();

    let mut expected = vec![5; 10];
    expected.extend(vec![10; 10]);
    expected.extend(vec![15; 5]);
    assert_eq!(sleeps, secs(&expected));
    assert_eq!(backoff.idle_polls(), 25);
}

#[test]
fn sleeps_are_monotonic_and_capped() {
    init_logging();
    let mut backoff = IdleBackoff::new(Duration::from_secs(5));
    let mut previous = Duration::ZERO;
    for _ in 0..500 {
        let sleep = backoff.on_empty_poll();
        assert!(sleep >= previous);
        assert!(sleep <= MAX_IDLE_SLEEP);
        previous = sleep;
    }
    assert_eq!(previous, MAX_IDLE_SLEEP);
}

#[test]
fn job_resets_to_base_interval() {
    init_logging();
    let mut backoff = IdleBackoff::new(Duration::from_secs(5));
    for _ in 0..30 {
        backoff.on_empty_poll();
    }
    assert_eq!(backoff.current_interval(), Duration::from_secs(20));

    backoff.on_job();
    assert_eq!(backoff.idle_polls(), 0);
    assert_eq!(backoff.on_empty_poll(), Duration::from_secs(5));
}

#[test]
fn base_above_cap_is_clamped() {
    init_logging();
    let mut backoff = IdleBackoff::new(Duration::from_secs(45));
    assert_eq!(backoff.on_empty_poll(), MAX_IDLE_SLEEP);
}
