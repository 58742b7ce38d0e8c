#![forbid(unsafe_code)]

//! Copy-button feedback.
//!
//! After the host reports a successful clipboard write, the button label is
//! swapped for a confirmation and restored later. The original label is
//! captured on the first success only; a second success while the
//! confirmation is showing re-arms the restore timer and keeps the label
//! captured the first time.

use core::time::Duration;

use crate::config::Labels;
use crate::dom::Dom;
use crate::scheduler::{Scheduler, TimerId};

/// Attribute holding the text to copy.
pub const COPY_ATTR: &str = "data-copy";

#[derive(Debug)]
struct PendingLabel<N> {
    node: N,
    original: String,
    timer: TimerId,
}

/// Buttons currently showing the confirmation label.
#[derive(Debug)]
pub struct CopyFeedback<N> {
    pending: Vec<PendingLabel<N>>,
}

impl<N> Default for CopyFeedback<N> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<N: Clone + PartialEq> CopyFeedback<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured label for `node`, if it is showing the confirmation.
    #[must_use]
    pub fn original(&self, node: &N) -> Option<&str> {
        self.pending
            .iter()
            .find(|p| &p.node == node)
            .map(|p| p.original.as_str())
    }

    /// Show the confirmation on `node`; `restore` is the action the restore
    /// timer carries.
    pub fn confirm<D, A>(
        &mut self,
        dom: &D,
        node: &N,
        labels: &Labels,
        scheduler: &mut Scheduler<A>,
        restore: A,
    ) -> TimerId
    where
        D: Dom<Node = N>,
    {
        let delay = Duration::from_millis(labels.copy_restore_ms);
        let timer = scheduler.after(delay, restore);
        match self.pending.iter_mut().find(|p| &p.node == node) {
            Some(existing) => {
                scheduler.cancel(existing.timer);
                existing.timer = timer;
            }
            None => self.pending.push(PendingLabel {
                node: node.clone(),
                original: dom.text(node),
                timer,
            }),
        }
        dom.set_text(node, &labels.copy_confirmation);
        dom.set_style(node, "background", &labels.copy_highlight);
        timer
    }

    /// Put the captured label back. Returns `false` if nothing was pending.
    pub fn restore<D: Dom<Node = N>>(&mut self, dom: &D, node: &N) -> bool {
        let Some(idx) = self.pending.iter().position(|p| &p.node == node) else {
            return false;
        };
        let pending = self.pending.swap_remove(idx);
        dom.set_text(node, &pending.original);
        dom.set_style(node, "background", "");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDom;

    use pretty_assertions::assert_eq;

    #[test]
    fn confirm_then_restore() {
        let dom = MockDom::new();
        let btn = dom.element("button");
        dom.set_text(&btn, "+49 30 1234");
        let labels = Labels::default();
        let mut sched: Scheduler<()> = Scheduler::new();
        let mut fb = CopyFeedback::new();

        fb.confirm(&dom, &btn, &labels, &mut sched, ());
        assert_eq!(dom.text(&btn), "Скопійовано!");
        assert_eq!(dom.style(btn, "background").as_deref(), Some("#54FF8F"));
        assert_eq!(sched.next_deadline(), Some(Duration::from_millis(2000)));

        assert!(fb.restore(&dom, &btn));
        assert_eq!(dom.text(&btn), "+49 30 1234");
        assert_eq!(dom.style(btn, "background"), None);
        assert!(!fb.restore(&dom, &btn));
    }

    #[test]
    fn second_success_keeps_first_label_and_rearms() {
        let dom = MockDom::new();
        let btn = dom.element("button");
        dom.set_text(&btn, "mail@example.com");
        let labels = Labels::default();
        let mut sched: Scheduler<()> = Scheduler::new();
        let mut fb = CopyFeedback::new();

        let first = fb.confirm(&dom, &btn, &labels, &mut sched, ());
        sched.settle(Duration::from_millis(1500));
        let second = fb.confirm(&dom, &btn, &labels, &mut sched, ());
        assert!(!sched.is_scheduled(first));
        assert!(sched.is_scheduled(second));
        assert_eq!(sched.pending(), 1);
        assert_eq!(fb.original(&btn), Some("mail@example.com"));

        fb.restore(&dom, &btn);
        assert_eq!(dom.text(&btn), "mail@example.com");
    }
}
