#![forbid(unsafe_code)]

//! Count-up animation for statistic figures.
//!
//! A counter ticks every [`COUNTER_TICK`] and shows
//! `floor(target * elapsed / duration)` until the elapsed time reaches the
//! duration; that final tick shows exactly `target` followed by the suffix.
//! Intermediate values are computed from the tick index with integer math,
//! so they are monotonic and can never overshoot.

use core::time::Duration;

use crate::dom::Dom;
use crate::error::SetupError;
use crate::scheduler::TimerId;

/// Interval between displayed values (~60 fps).
pub const COUNTER_TICK: Duration = Duration::from_millis(16);

pub const COUNT_ATTR: &str = "data-count";
pub const SUFFIX_ATTR: &str = "data-suffix";
pub const DURATION_ATTR: &str = "data-duration";

/// One frame of a counter animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterFrame {
    pub text: String,
    pub value: u64,
    pub finished: bool,
}

/// State of one count-up animation.
#[derive(Debug, Clone)]
pub struct CounterAnimation<N> {
    node: N,
    target: u64,
    suffix: String,
    duration: Duration,
    tick: u32,
    timer: Option<TimerId>,
}

impl<N: Clone> CounterAnimation<N> {
    #[must_use]
    pub fn new(node: N, target: u64, suffix: impl Into<String>, duration: Duration) -> Self {
        Self {
            node,
            target,
            suffix: suffix.into(),
            duration,
            tick: 0,
            timer: None,
        }
    }

    /// Build from the node's `data-count`, `data-suffix` and `data-duration`.
    ///
    /// Digit-group separators (`,`, `_`, spaces) in `data-count` are ignored.
    pub fn from_node<D: Dom<Node = N>>(
        dom: &D,
        node: N,
        default_duration: Duration,
    ) -> Result<Self, SetupError> {
        let raw = dom
            .attribute(&node, COUNT_ATTR)
            .ok_or_else(|| SetupError::missing_attribute(COUNT_ATTR))?;
        let digits: String = raw
            .chars()
            .filter(|c| !matches!(c, ',' | '_' | ' '))
            .collect();
        let target = digits
            .parse::<u64>()
            .map_err(|_| SetupError::invalid_attribute(COUNT_ATTR, &raw))?;

        let duration = match dom.attribute(&node, DURATION_ATTR) {
            Some(ms) => ms
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| SetupError::invalid_attribute(DURATION_ATTR, &ms))?,
            None => default_duration,
        };
        let suffix = dom.attribute(&node, SUFFIX_ATTR).unwrap_or_default();
        Ok(Self::new(node, target, suffix, duration))
    }

    #[must_use]
    pub fn node(&self) -> &N {
        &self.node
    }

    #[must_use]
    pub fn target(&self) -> u64 {
        self.target
    }

    #[must_use]
    pub fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    pub fn set_timer(&mut self, timer: Option<TimerId>) {
        self.timer = timer;
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.tick >= self.total_ticks()
    }

    /// Ticks needed to reach the target; at least one.
    #[must_use]
    pub fn total_ticks(&self) -> u32 {
        let tick_ms = COUNTER_TICK.as_millis();
        let ticks = self.duration.as_millis().div_ceil(tick_ms);
        u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
    }

    /// Value shown after `tick` ticks.
    #[must_use]
    pub fn value_at(&self, tick: u32) -> u64 {
        if tick >= self.total_ticks() {
            return self.target;
        }
        let duration_ms = self.duration.as_millis();
        if duration_ms == 0 {
            return self.target;
        }
        let elapsed_ms = u128::from(tick) * COUNTER_TICK.as_millis();
        let value = u128::from(self.target) * elapsed_ms / duration_ms;
        u64::try_from(value).unwrap_or(self.target).min(self.target)
    }

    /// Advance one tick and return what to display.
    pub fn step(&mut self) -> CounterFrame {
        if !self.is_finished() {
            self.tick += 1;
        }
        let value = self.value_at(self.tick);
        let finished = self.is_finished();
        let text = if finished {
            format!("{value}{}", self.suffix)
        } else {
            value.to_string()
        };
        CounterFrame {
            text,
            value,
            finished,
        }
    }
}
