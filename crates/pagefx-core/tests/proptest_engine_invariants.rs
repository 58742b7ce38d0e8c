//! Property-based invariant tests for the pure engine pieces.
//!
//! 1. Scroll progress is always finite and inside `[0, 100]`; header opacity
//!    is always inside `[0, 0.95]`.
//! 2. The key window never exceeds the target length, and matches exactly
//!    when the last `N` codes equal the target.
//! 3. Counter frames are monotonic, never overshoot, and finish at the
//!    target after exactly `total_ticks` steps.
//! 4. Scheduler deadlines fire in non-decreasing order.
//! 5. `format_number` only inserts commas.

use core::time::Duration;

use pagefx_core::counter::CounterAnimation;
use pagefx_core::key_sequence::{KONAMI, KeySequenceMatcher};
use pagefx_core::scheduler::Scheduler;
use pagefx_core::telemetry::{MAX_HEADER_OPACITY, ScrollSample};
use pagefx_core::utils::format_number;
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

fn any_f64() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -1.0e6f64..1.0e6,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
        1 => Just(0.0),
    ]
}

fn key_code() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("ArrowUp"),
        Just("ArrowDown"),
        Just("ArrowLeft"),
        Just("ArrowRight"),
        Just("KeyA"),
        Just("KeyB"),
        Just("Enter"),
    ]
}

proptest! {
    #[test]
    fn progress_and_opacity_stay_in_range(
        top in any_f64(),
        doc in any_f64(),
        view in any_f64(),
    ) {
        let sample = ScrollSample::new(top, doc, view);
        let p = sample.progress_percent();
        prop_assert!(p.is_finite());
        prop_assert!((0.0..=100.0).contains(&p));
        let o = sample.header_opacity();
        prop_assert!((0.0..=MAX_HEADER_OPACITY).contains(&o));
    }

    #[test]
    fn unscrollable_page_reports_zero(top in 0.0f64..5000.0, h in 0.0f64..5000.0) {
        prop_assert_eq!(ScrollSample::new(top, h, h).progress_percent(), 0.0);
    }

    #[test]
    fn key_window_matches_iff_tail_equals_target(codes in prop::collection::vec(key_code(), 0..60)) {
        let mut m = KeySequenceMatcher::konami();
        for (i, code) in codes.iter().enumerate() {
            let matched = m.feed(code);
            prop_assert!(m.buffered() <= KONAMI.len());
            let tail_matches = i + 1 >= KONAMI.len()
                && codes[i + 1 - KONAMI.len()..=i] == KONAMI[..];
            prop_assert_eq!(matched, tail_matches);
        }
    }

    #[test]
    fn counter_is_monotonic_and_exact(target in 0u64..10_000_000, duration_ms in 0u64..10_000) {
        let mut c = CounterAnimation::new((), target, "+", Duration::from_millis(duration_ms));
        let total = c.total_ticks();
        let mut last = 0;
        for step in 1..=total {
            let frame = c.step();
            prop_assert!(frame.value >= last);
            prop_assert!(frame.value <= target);
            prop_assert_eq!(frame.finished, step == total);
            last = frame.value;
        }
        prop_assert_eq!(last, target);
        prop_assert!(c.is_finished());
    }

    #[test]
    fn scheduler_fires_in_deadline_order(delays in prop::collection::vec(0u64..1000, 1..40)) {
        let mut s = Scheduler::new();
        for (i, d) in delays.iter().enumerate() {
            s.after(Duration::from_millis(*d), i);
        }
        let mut last = Duration::ZERO;
        let mut count = 0;
        while let Some((_, i)) = s.pop_due(Duration::from_secs(2)) {
            let due = Duration::from_millis(delays[i]);
            prop_assert!(due >= last);
            prop_assert_eq!(s.now(), due);
            last = due;
            count += 1;
        }
        prop_assert_eq!(count, delays.len());
    }

    #[test]
    fn format_number_only_adds_commas(n in any::<i64>()) {
        let raw = n.to_string();
        let formatted = format_number(&raw);
        prop_assert_eq!(formatted.replace(',', ""), raw);
        for group in formatted.trim_start_matches('-').split(',').skip(1) {
            prop_assert_eq!(group.len(), 3);
        }
    }
}
