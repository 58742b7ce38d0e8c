#![forbid(unsafe_code)]

//! Scroll-position-derived values and scroll rate limiting.
//!
//! [`ScrollSample`] is read fresh from the host each time and turned into the
//! progress-bar width and the header background. [`ScrollGate`] sits in front
//! of every sample: raw scroll events only arm a timer, so layout is read at
//! most once per gate interval no matter how many events arrive. The latest
//! scroll position always wins because the sample is taken when the timer
//! fires, not when the event arrives.

use core::time::Duration;

use crate::dom::Dom;
use crate::scheduler::{Scheduler, TimerId};

/// Header opacity reaches its cap after this many pixels of scroll.
pub const OPACITY_RAMP_PX: f64 = 100.0;
/// Header background never becomes fully opaque.
pub const MAX_HEADER_OPACITY: f64 = 0.95;
/// Header background colour (without alpha).
pub const HEADER_RGB: (u8, u8, u8) = (37, 54, 56);
/// Inline style of the progress indicator created at init.
pub const PROGRESS_BAR_CSS: &str = "position: fixed; top: 0; left: 0; width: 0%; height: 3px; \
     background: linear-gradient(90deg, #54FF8F, #42E87A); z-index: 9999; \
     transition: width 0.1s ease;";

/// Scroll geometry at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollSample {
    pub scroll_top: f64,
    pub document_height: f64,
    pub viewport_height: f64,
}

impl ScrollSample {
    #[must_use]
    pub const fn new(scroll_top: f64, document_height: f64, viewport_height: f64) -> Self {
        Self {
            scroll_top,
            document_height,
            viewport_height,
        }
    }

    /// Read the current geometry from the host.
    pub fn read<D: Dom>(dom: &D) -> Self {
        Self {
            scroll_top: dom.scroll_top(),
            document_height: dom.document_height(),
            viewport_height: dom.viewport().height,
        }
    }

    /// Scroll progress in percent, clamped to `[0, 100]`.
    ///
    /// A page that cannot scroll (or non-finite input) reports `0`.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        let scrollable = self.document_height - self.viewport_height;
        if !scrollable.is_finite() || !self.scroll_top.is_finite() || scrollable <= 0.0 {
            return 0.0;
        }
        (self.scroll_top / scrollable * 100.0).clamp(0.0, 100.0)
    }

    /// Header background alpha in `[0, MAX_HEADER_OPACITY]`.
    #[must_use]
    pub fn header_opacity(&self) -> f64 {
        if !self.scroll_top.is_finite() {
            return 0.0;
        }
        (self.scroll_top / OPACITY_RAMP_PX).clamp(0.0, MAX_HEADER_OPACITY)
    }
}

/// CSS width value for the progress indicator.
#[must_use]
pub fn progress_width(percent: f64) -> String {
    format!("{percent}%")
}

/// CSS background value for the header at `opacity`.
#[must_use]
pub fn header_background(rgb: (u8, u8, u8), opacity: f64) -> String {
    let (r, g, b) = rgb;
    format!("rgba({r}, {g}, {b}, {opacity})")
}

/// How raw scroll events are turned into samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "config",
    serde(tag = "mode", content = "ms", rename_all = "snake_case")
)]
pub enum ScrollPolicy {
    /// Sample on every event.
    Immediate,
    /// First event arms a trailing sample `ms` later; later events coalesce.
    Throttle(u64),
    /// Every event re-arms the sample; it runs after `ms` of quiet.
    Debounce(u64),
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self::Throttle(16)
    }
}

/// What the caller should do with a scroll event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Take a sample right now.
    SampleNow,
    /// A timer will deliver the sample later.
    Deferred(TimerId),
}

/// Applies a [`ScrollPolicy`] on top of a [`Scheduler`].
#[derive(Debug, Clone, Default)]
pub struct ScrollGate {
    policy: ScrollPolicy,
    pending: Option<TimerId>,
}

impl ScrollGate {
    #[must_use]
    pub fn new(policy: ScrollPolicy) -> Self {
        Self {
            policy,
            pending: None,
        }
    }

    #[must_use]
    pub fn pending(&self) -> Option<TimerId> {
        self.pending
    }

    /// Register a raw scroll event; `sample` is the action the timer carries.
    pub fn on_scroll<A>(&mut self, scheduler: &mut Scheduler<A>, sample: A) -> GateDecision {
        match self.policy {
            ScrollPolicy::Immediate => GateDecision::SampleNow,
            ScrollPolicy::Throttle(ms) => match self.pending {
                Some(id) if scheduler.is_scheduled(id) => GateDecision::Deferred(id),
                _ => {
                    let id = scheduler.after(Duration::from_millis(ms), sample);
                    self.pending = Some(id);
                    GateDecision::Deferred(id)
                }
            },
            ScrollPolicy::Debounce(ms) => {
                if let Some(id) = self.pending.take() {
                    scheduler.cancel(id);
                }
                let id = scheduler.after(Duration::from_millis(ms), sample);
                self.pending = Some(id);
                GateDecision::Deferred(id)
            }
        }
    }

    /// Called when the gate's timer fires.
    pub fn fired(&mut self, id: TimerId) {
        if self.pending == Some(id) {
            self.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn progress_endpoints() {
        assert_eq!(ScrollSample::new(0.0, 3000.0, 1000.0).progress_percent(), 0.0);
        assert_eq!(ScrollSample::new(2000.0, 3000.0, 1000.0).progress_percent(), 100.0);
        assert_eq!(ScrollSample::new(500.0, 3000.0, 1000.0).progress_percent(), 25.0);
    }

    #[test]
    fn progress_guards_unscrollable_and_overscroll() {
        let flat = ScrollSample::new(0.0, 800.0, 800.0).progress_percent();
        assert_eq!(flat, 0.0);
        assert!(!flat.is_nan());
        assert_eq!(ScrollSample::new(50.0, 600.0, 800.0).progress_percent(), 0.0);
        assert_eq!(ScrollSample::new(2500.0, 3000.0, 1000.0).progress_percent(), 100.0);
        assert_eq!(ScrollSample::new(-40.0, 3000.0, 1000.0).progress_percent(), 0.0);
        assert_eq!(ScrollSample::new(f64::NAN, 3000.0, 1000.0).progress_percent(), 0.0);
    }

    #[test]
    fn header_opacity_ramps_and_caps() {
        assert_eq!(ScrollSample::new(0.0, 0.0, 0.0).header_opacity(), 0.0);
        assert_eq!(ScrollSample::new(50.0, 0.0, 0.0).header_opacity(), 0.5);
        assert_eq!(ScrollSample::new(5000.0, 0.0, 0.0).header_opacity(), 0.95);
        assert_eq!(ScrollSample::new(-10.0, 0.0, 0.0).header_opacity(), 0.0);
    }

    #[test]
    fn css_values() {
        assert_eq!(progress_width(25.0), "25%");
        assert_eq!(progress_width(12.5), "12.5%");
        assert_eq!(header_background(HEADER_RGB, 0.5), "rgba(37, 54, 56, 0.5)");
    }

    #[test]
    fn throttle_coalesces_until_fired() {
        let mut s: Scheduler<()> = Scheduler::new();
        let mut gate = ScrollGate::new(ScrollPolicy::Throttle(16));
        let GateDecision::Deferred(first) = gate.on_scroll(&mut s, ()) else {
            panic!("throttle should defer");
        };
        assert_eq!(gate.on_scroll(&mut s, ()), GateDecision::Deferred(first));
        assert_eq!(s.pending(), 1);

        let (id, ()) = s.pop_due(Duration::from_millis(16)).expect("due");
        gate.fired(id);
        assert_eq!(gate.pending(), None);
        assert_ne!(gate.on_scroll(&mut s, ()), GateDecision::Deferred(first));
    }

    #[test]
    fn debounce_rearms_on_every_event() {
        let mut s: Scheduler<()> = Scheduler::new();
        let mut gate = ScrollGate::new(ScrollPolicy::Debounce(100));
        gate.on_scroll(&mut s, ());
        s.settle(Duration::from_millis(60));
        gate.on_scroll(&mut s, ());
        assert_eq!(s.pending(), 1);
        assert_eq!(s.next_deadline(), Some(Duration::from_millis(160)));
    }

    #[test]
    fn immediate_never_schedules() {
        let mut s: Scheduler<()> = Scheduler::new();
        let mut gate = ScrollGate::new(ScrollPolicy::Immediate);
        assert_eq!(gate.on_scroll(&mut s, ()), GateDecision::SampleNow);
        assert_eq!(s.pending(), 0);
    }
}
