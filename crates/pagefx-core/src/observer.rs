#![forbid(unsafe_code)]

//! Viewport observation: one abstraction for every visibility trigger.
//!
//! Each [`ViewportObserver`] subscription pairs a node with an
//! [`ObserverConfig`] and a trigger value. The host groups native observers by
//! config (one browser `IntersectionObserver` per distinct config) and feeds
//! their callback batches into [`ViewportObserver::deliver`]; hosts without a
//! native observer are served by [`ViewportObserver::poll_geometry`], which
//! computes the same entries from layout.
//!
//! # Invariants
//!
//! 1. A subscription fires on the transition from "not visible" to "visible",
//!    never twice without leaving view in between.
//! 2. [`Repeat::Once`] subscriptions fire at most once; they are removed and
//!    natively unobserved in the same call that fires them.
//! 3. Fired subscriptions are returned in entry order; entries that did not
//!    cross are skipped.

use crate::dom::{Dom, Rect, Viewport};

/// Ratios within this distance below a threshold still count as crossing it.
/// Browsers report crossings at slightly under the configured value.
const RATIO_EPSILON: f64 = 1e-3;

/// Root margin in CSS pixels; positive grows the viewport box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RootMargin {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl RootMargin {
    /// Margin applied to the bottom edge only.
    #[must_use]
    pub const fn bottom(px: i32) -> Self {
        Self {
            top: 0,
            right: 0,
            bottom: px,
            left: 0,
        }
    }
}

/// Visibility threshold plus root margin.
///
/// The threshold is stored in per-mille so configs hash and compare exactly;
/// hosts use a config as the key for their shared native observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ObserverConfig {
    pub threshold_permille: u16,
    pub root_margin: RootMargin,
}

impl ObserverConfig {
    /// Config with a visible-fraction threshold in `[0, 1]`.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        let clamped = if threshold.is_finite() {
            threshold.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            threshold_permille: (clamped * 1000.0).round() as u16,
            root_margin: RootMargin::default(),
        }
    }

    #[must_use]
    pub fn with_root_margin(mut self, margin: RootMargin) -> Self {
        self.root_margin = margin;
        self
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        f64::from(self.threshold_permille.min(1000)) / 1000.0
    }

    /// Margin in the CSS shorthand order the browser API expects.
    #[must_use]
    pub fn root_margin_css(&self) -> String {
        let m = self.root_margin;
        format!("{}px {}px {}px {}px", m.top, m.right, m.bottom, m.left)
    }

    fn crosses(&self, ratio: f64, is_intersecting: bool) -> bool {
        is_intersecting && ratio.is_finite() && ratio + RATIO_EPSILON >= self.threshold()
    }
}

/// Whether a subscription survives its first trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Once,
    Always,
}

/// One visibility report for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry<N> {
    pub node: N,
    pub ratio: f64,
    pub is_intersecting: bool,
}

/// A subscription that crossed into view.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<N, T> {
    pub node: N,
    pub trigger: T,
}

#[derive(Debug)]
struct Subscription<N, T> {
    node: N,
    config: ObserverConfig,
    trigger: T,
    repeat: Repeat,
    inside: bool,
    native: bool,
}

/// Per-element visibility subscriptions.
#[derive(Debug)]
pub struct ViewportObserver<N, T> {
    subs: Vec<Subscription<N, T>>,
}

impl<N, T> Default for ViewportObserver<N, T> {
    fn default() -> Self {
        Self { subs: Vec::new() }
    }
}

impl<N: Clone + PartialEq, T: Clone> ViewportObserver<N, T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `node` and ask the host to observe it natively.
    pub fn observe<D: Dom<Node = N>>(
        &mut self,
        dom: &D,
        node: N,
        config: ObserverConfig,
        trigger: T,
        repeat: Repeat,
    ) {
        let native = dom.observe(&node, &config);
        self.subs.push(Subscription {
            node,
            config,
            trigger,
            repeat,
            inside: false,
            native,
        });
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// True when some subscription relies on geometry sampling.
    #[must_use]
    pub fn needs_geometry(&self) -> bool {
        self.subs.iter().any(|s| !s.native)
    }

    /// Apply a native observer batch for `config`.
    pub fn deliver<D: Dom<Node = N>>(
        &mut self,
        dom: &D,
        config: &ObserverConfig,
        entries: &[IntersectionEntry<N>],
    ) -> Vec<Fired<N, T>> {
        let mut fired = Vec::new();
        for entry in entries {
            let visible = config.crosses(entry.ratio, entry.is_intersecting);
            self.step(dom, |s| s.node == entry.node && s.config == *config, visible, &mut fired);
        }
        fired
    }

    /// Evaluate every geometry-sampled subscription against current layout.
    pub fn poll_geometry<D: Dom<Node = N>>(&mut self, dom: &D) -> Vec<Fired<N, T>> {
        let viewport = dom.viewport();
        let samples: Vec<(N, ObserverConfig, bool)> = self
            .subs
            .iter()
            .filter(|s| !s.native)
            .map(|s| {
                let ratio = visible_fraction(dom.bounding_rect(&s.node), viewport, s.config.root_margin);
                (s.node.clone(), s.config, s.config.crosses(ratio, ratio > 0.0))
            })
            .collect();

        let mut fired = Vec::new();
        for (node, config, visible) in samples {
            self.step(
                dom,
                |s| !s.native && s.node == node && s.config == config,
                visible,
                &mut fired,
            );
        }
        fired
    }

    fn step<D: Dom<Node = N>>(
        &mut self,
        dom: &D,
        matches: impl Fn(&Subscription<N, T>) -> bool,
        visible: bool,
        fired: &mut Vec<Fired<N, T>>,
    ) {
        let mut idx = 0;
        while idx < self.subs.len() {
            let sub = &mut self.subs[idx];
            if !matches(sub) {
                idx += 1;
                continue;
            }
            if !visible {
                sub.inside = false;
                idx += 1;
                continue;
            }
            if sub.inside {
                idx += 1;
                continue;
            }
            sub.inside = true;
            fired.push(Fired {
                node: sub.node.clone(),
                trigger: sub.trigger.clone(),
            });
            if sub.repeat == Repeat::Once {
                let sub = self.subs.remove(idx);
                if sub.native {
                    dom.unobserve(&sub.node, &sub.config);
                }
                tracing::trace!(config = ?sub.config, "one-shot subscription retired");
            } else {
                idx += 1;
            }
        }
    }
}

/// Fraction of `rect` inside the viewport box grown by `margin`.
///
/// Zero-area elements count as fully visible when they sit inside the box.
#[must_use]
pub fn visible_fraction(rect: Rect, viewport: Viewport, margin: RootMargin) -> f64 {
    let root_left = -f64::from(margin.left);
    let root_top = -f64::from(margin.top);
    let root_right = viewport.width + f64::from(margin.right);
    let root_bottom = viewport.height + f64::from(margin.bottom);

    let area = rect.area();
    if area <= 0.0 {
        let inside = rect.left >= root_left
            && rect.left <= root_right
            && rect.top >= root_top
            && rect.top <= root_bottom;
        return if inside { 1.0 } else { 0.0 };
    }

    let w = (rect.right().min(root_right) - rect.left.max(root_left)).max(0.0);
    let h = (rect.bottom().min(root_bottom) - rect.top.max(root_top)).max(0.0);
    let fraction = (w * h) / area;
    if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Whether `rect` lies entirely inside the viewport.
#[must_use]
pub fn is_fully_in_viewport(rect: Rect, viewport: Viewport) -> bool {
    rect.top >= 0.0
        && rect.left >= 0.0
        && rect.bottom() <= viewport.height
        && rect.right() <= viewport.width
}
