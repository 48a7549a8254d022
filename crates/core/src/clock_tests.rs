// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_starts_where_told() {
    let start = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
        .unwrap()
        .with_timezone(&Utc);
    let clock = FakeClock::new(start);
    assert_eq!(clock.now(), start);
}

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::default();
    let before = clock.now();
    clock.advance(Duration::seconds(90));
    assert_eq!(clock.now() - before, Duration::seconds(90));
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::default();
    let other = clock.clone();
    clock.advance(Duration::seconds(5));
    assert_eq!(other.now(), clock.now());
}

#[test]
fn system_clock_is_monotonic_enough() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}
