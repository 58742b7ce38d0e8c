#![forbid(unsafe_code)]

//! Deterministic timer queue.
//!
//! Every delayed or repeating effect in the engine is a [`Scheduler`] entry
//! with an explicit [`TimerId`]. Time only moves when the host calls
//! [`Scheduler::pop_due`] with a new reading, so the whole queue can be driven
//! from a [`DeterministicClock`](crate::clock::DeterministicClock) in tests.
//!
//! # Invariants
//!
//! 1. Timers fire in `(due, id)` order; ties resolve by creation order.
//! 2. `now()` never decreases.
//! 3. A repeating timer keeps firing until [`Scheduler::cancel`] removes it.
//!    Nothing cancels it implicitly.
//! 4. A zero period is clamped to [`MIN_PERIOD`] so a repeating timer can
//!    never fire twice at the same instant.

use core::time::Duration;
use std::collections::BTreeMap;

/// Smallest period a repeating timer may have.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct Timer<A> {
    due: Duration,
    period: Option<Duration>,
    action: A,
}

/// Queue of one-shot and repeating timers carrying actions of type `A`.
#[derive(Debug)]
pub struct Scheduler<A> {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<TimerId, Timer<A>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 1,
            timers: BTreeMap::new(),
        }
    }

    /// Current scheduler time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Run `action` once, `delay` from now.
    pub fn after(&mut self, delay: Duration, action: A) -> TimerId {
        self.insert(self.now.saturating_add(delay), None, action)
    }

    /// Run `action` every `period`, first at `now + period`.
    pub fn every(&mut self, period: Duration, action: A) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.insert(self.now.saturating_add(period), Some(period), action)
    }

    /// Remove a timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    #[must_use]
    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Number of live timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Deadline of the earliest live timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.earliest().map(|(_, due)| due)
    }

    /// Move time forward without firing anything.
    pub fn settle(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    fn insert(&mut self, due: Duration, period: Option<Duration>, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.insert(id, Timer { due, period, action });
        id
    }

    fn earliest(&self) -> Option<(TimerId, Duration)> {
        self.timers
            .iter()
            .map(|(id, t)| (*id, t.due))
            .min_by_key(|(id, due)| (*due, *id))
    }
}

impl<A: Clone> Scheduler<A> {
    /// Pop the earliest timer due at or before `until`.
    ///
    /// Time advances to the popped timer's deadline, not to `until`, so an
    /// action that schedules follow-up work measures delays from the moment it
    /// logically ran. Repeating timers are re-armed before being returned;
    /// call [`Scheduler::settle`] once the loop drains.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, A)> {
        let (id, due) = self.earliest()?;
        if due > until {
            return None;
        }
        self.now = self.now.max(due);

        let period = self.timers.get(&id).and_then(|t| t.period);
        match period {
            Some(period) => {
                let timer = self.timers.get_mut(&id)?;
                timer.due = due.saturating_add(period);
                Some((id, timer.action.clone()))
            }
            None => self.timers.remove(&id).map(|t| (id, t.action)),
        }
    }
}
