#![forbid(unsafe_code)]

//! Mobile navigation overlay state.
//!
//! [`MenuController`] is the single owner of the open/closed flag. Every entry
//! point (trigger button, close button, overlay, menu links, Escape, anchor
//! navigation) ends up in [`MenuController::open`] or
//! [`MenuController::close`].
//!
//! # Invariants
//!
//! 1. Body scroll is locked iff the state is [`MenuState::Open`].
//! 2. Transitions are idempotent: opening an open menu or closing a closed
//!    one changes nothing and moves no focus.
//! 3. The state flag and body class change before focus moves.

use crate::dom::Dom;

/// Key that closes an open menu.
pub const ESCAPE_KEY: &str = "Escape";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuState {
    #[default]
    Closed,
    Open,
}

/// Handles the controller needs; any of them may be absent from the page.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuNodes<N> {
    pub trigger: Option<N>,
    pub close_button: Option<N>,
    pub body: Option<N>,
}

/// Owner of the overlay's open/closed state and focus hand-off.
#[derive(Debug)]
pub struct MenuController<N> {
    state: MenuState,
    nodes: MenuNodes<N>,
    open_class: String,
}

impl<N: Clone + PartialEq> MenuController<N> {
    #[must_use]
    pub fn new(nodes: MenuNodes<N>, open_class: impl Into<String>) -> Self {
        Self {
            state: MenuState::Closed,
            nodes,
            open_class: open_class.into(),
        }
    }

    #[must_use]
    pub fn state(&self) -> MenuState {
        self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == MenuState::Open
    }

    /// Open the overlay. Returns `false` if it was already open.
    pub fn open<D: Dom<Node = N>>(&mut self, dom: &D) -> bool {
        if self.is_open() {
            return false;
        }
        self.state = MenuState::Open;
        if let Some(body) = &self.nodes.body {
            dom.add_class(body, &self.open_class);
            dom.set_style(body, "overflow", "hidden");
        }
        if let Some(close) = &self.nodes.close_button {
            dom.focus(close);
        }
        tracing::debug!("mobile menu opened");
        true
    }

    /// Close the overlay. Returns `false` if it was already closed.
    pub fn close<D: Dom<Node = N>>(&mut self, dom: &D) -> bool {
        if !self.is_open() {
            return false;
        }
        self.state = MenuState::Closed;
        if let Some(body) = &self.nodes.body {
            dom.remove_class(body, &self.open_class);
            dom.set_style(body, "overflow", "");
        }
        if let Some(trigger) = &self.nodes.trigger {
            dom.focus(trigger);
        }
        tracing::debug!("mobile menu closed");
        true
    }

    /// Flip the state; returns the new state.
    pub fn toggle<D: Dom<Node = N>>(&mut self, dom: &D) -> MenuState {
        match self.state {
            MenuState::Closed => self.open(dom),
            MenuState::Open => self.close(dom),
        };
        self.state
    }

    /// Keyboard entry point: Escape closes an open menu.
    pub fn on_key<D: Dom<Node = N>>(&mut self, dom: &D, key: &str) -> bool {
        key == ESCAPE_KEY && self.close(dom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockDom, NodeId};

    use pretty_assertions::assert_eq;

    fn fixture() -> (MockDom, MenuController<NodeId>, NodeId, NodeId) {
        let dom = MockDom::new();
        let trigger = dom.element("button");
        let close = dom.element("button");
        let body = dom.body_node();
        let menu = MenuController::new(
            MenuNodes {
                trigger: Some(trigger),
                close_button: Some(close),
                body: Some(body),
            },
            "menu-open",
        );
        (dom, menu, trigger, close)
    }

    #[test]
    fn open_locks_scroll_and_focuses_close_button() {
        let (dom, mut menu, _, close) = fixture();
        assert!(menu.open(&dom));
        let body = dom.body_node();
        assert!(dom.has_class(&body, "menu-open"));
        assert_eq!(dom.style(body, "overflow").as_deref(), Some("hidden"));
        assert_eq!(dom.focused(), Some(close));
    }

    #[test]
    fn close_restores_scroll_and_returns_focus() {
        let (dom, mut menu, trigger, _) = fixture();
        menu.open(&dom);
        assert!(menu.close(&dom));
        let body = dom.body_node();
        assert!(!dom.has_class(&body, "menu-open"));
        assert_eq!(dom.style(body, "overflow"), None);
        assert_eq!(dom.focused(), Some(trigger));
    }

    #[test]
    fn transitions_are_idempotent() {
        let (dom, mut menu, _, _) = fixture();
        assert!(!menu.close(&dom));
        assert_eq!(dom.focused(), None);

        menu.open(&dom);
        let focus_moves = dom.focus_log().len();
        assert!(!menu.open(&dom));
        assert_eq!(dom.focus_log().len(), focus_moves);
        assert_eq!(menu.state(), MenuState::Open);
    }

    #[test]
    fn escape_only_acts_when_open() {
        let (dom, mut menu, _, _) = fixture();
        assert!(!menu.on_key(&dom, ESCAPE_KEY));
        assert_eq!(menu.state(), MenuState::Closed);

        menu.open(&dom);
        assert!(!menu.on_key(&dom, "Enter"));
        assert!(menu.on_key(&dom, ESCAPE_KEY));
        assert_eq!(menu.state(), MenuState::Closed);
    }

    #[test]
    fn toggle_alternates() {
        let (dom, mut menu, _, _) = fixture();
        assert_eq!(menu.toggle(&dom), MenuState::Open);
        assert_eq!(menu.toggle(&dom), MenuState::Closed);
    }

    #[test]
    fn missing_nodes_still_track_state() {
        let dom = MockDom::new();
        let mut menu = MenuController::new(
            MenuNodes {
                trigger: None,
                close_button: None,
                body: None,
            },
            "menu-open",
        );
        assert!(menu.open(&dom));
        assert!(menu.is_open());
        assert!(menu.close(&dom));
    }
}
