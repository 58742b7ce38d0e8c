#![forbid(unsafe_code)]

//! Declarative event bindings.
//!
//! The engine does not register listeners. It publishes a table of
//! [`Binding`]s; the host attaches one listener per binding and matching
//! element, calls `preventDefault` when the binding asks for it, and forwards
//! a [`DomEvent`] carrying the binding's [`Action`] back to
//! [`Engine::dispatch`](crate::engine::Engine::dispatch).

use crate::config::Selectors;

/// DOM event types the engine listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    KeyDown,
    Scroll,
    MouseEnter,
    MouseLeave,
    Submit,
}

impl EventKind {
    /// The DOM event name.
    #[must_use]
    pub const fn dom_name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::KeyDown => "keydown",
            Self::Scroll => "scroll",
            Self::MouseEnter => "mouseenter",
            Self::MouseLeave => "mouseleave",
            Self::Submit => "submit",
        }
    }
}

/// Where a listener is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Document,
    Window,
    /// Every element matching the selector at init time.
    Selector(String),
}

/// What the engine does with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ToggleMenu,
    CloseMenu,
    AnchorNavigate,
    HoverEnter,
    HoverLeave,
    Ripple,
    Copy,
    SubmitForm,
    KeyPress,
    Scroll,
}

/// One `{target, event, action}` row of the binding table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub target: Target,
    pub event: EventKind,
    pub action: Action,
    pub prevent_default: bool,
}

impl Binding {
    fn on(selector: &str, event: EventKind, action: Action) -> Self {
        Self {
            target: Target::Selector(selector.to_owned()),
            event,
            action,
            prevent_default: false,
        }
    }

    fn global(target: Target, event: EventKind, action: Action) -> Self {
        Self {
            target,
            event,
            action,
            prevent_default: false,
        }
    }

    fn prevent_default(mut self) -> Self {
        self.prevent_default = true;
        self
    }
}

/// The full binding table for a page using `selectors`.
#[must_use]
pub fn bindings(selectors: &Selectors) -> Vec<Binding> {
    vec![
        Binding::on(&selectors.menu_trigger, EventKind::Click, Action::ToggleMenu).prevent_default(),
        Binding::on(&selectors.menu_close, EventKind::Click, Action::CloseMenu).prevent_default(),
        Binding::on(&selectors.menu_overlay, EventKind::Click, Action::CloseMenu),
        Binding::on(&selectors.menu_links, EventKind::Click, Action::CloseMenu),
        Binding::on(&selectors.anchor_links, EventKind::Click, Action::AnchorNavigate)
            .prevent_default(),
        Binding::on(&selectors.hover_cards, EventKind::MouseEnter, Action::HoverEnter),
        Binding::on(&selectors.hover_cards, EventKind::MouseLeave, Action::HoverLeave),
        Binding::on(&selectors.ripple_buttons, EventKind::Click, Action::Ripple),
        Binding::on(&selectors.copy_buttons, EventKind::Click, Action::Copy),
        Binding::on(&selectors.forms, EventKind::Submit, Action::SubmitForm).prevent_default(),
        Binding::global(Target::Document, EventKind::KeyDown, Action::KeyPress),
        Binding::global(Target::Window, EventKind::Scroll, Action::Scroll),
    ]
}

/// An event forwarded by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent<N> {
    pub action: Action,
    /// Element the listener was attached to (`currentTarget`).
    pub node: Option<N>,
    /// `KeyboardEvent.key`.
    pub key: Option<String>,
    /// `KeyboardEvent.code`.
    pub code: Option<String>,
    pub client_x: f64,
    pub client_y: f64,
}

impl<N> DomEvent<N> {
    #[must_use]
    pub fn new(action: Action) -> Self {
        Self {
            action,
            node: None,
            key: None,
            code: None,
            client_x: 0.0,
            client_y: 0.0,
        }
    }

    #[must_use]
    pub fn on(mut self, node: N) -> Self {
        self.node = Some(node);
        self
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>, code: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn at(mut self, client_x: f64, client_y: f64) -> Self {
        self.client_x = client_x;
        self.client_y = client_y;
        self
    }

    /// Key press where `key` and `code` coincide (arrows, Escape).
    #[must_use]
    pub fn key(code: &str) -> Self {
        Self::new(Action::KeyPress).with_key(code, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn table_covers_every_action() {
        let table = bindings(&Selectors::default());
        for action in [
            Action::ToggleMenu,
            Action::CloseMenu,
            Action::AnchorNavigate,
            Action::HoverEnter,
            Action::HoverLeave,
            Action::Ripple,
            Action::Copy,
            Action::SubmitForm,
            Action::KeyPress,
            Action::Scroll,
        ] {
            assert!(table.iter().any(|b| b.action == action), "{action:?} unbound");
        }
    }

    #[test]
    fn submit_and_anchor_prevent_default() {
        let table = bindings(&Selectors::default());
        let submit = table.iter().find(|b| b.action == Action::SubmitForm).expect("submit");
        assert!(submit.prevent_default);
        assert_eq!(submit.event.dom_name(), "submit");

        let overlay = table
            .iter()
            .find(|b| b.target == Target::Selector(".mobile-menu-overlay".into()))
            .expect("overlay");
        assert!(!overlay.prevent_default);
    }

    #[test]
    fn scroll_and_keys_are_global() {
        let table = bindings(&Selectors::default());
        let scroll = table.iter().find(|b| b.action == Action::Scroll).expect("scroll");
        assert_eq!(scroll.target, Target::Window);
        let keys = table.iter().find(|b| b.action == Action::KeyPress).expect("keys");
        assert_eq!(keys.target, Target::Document);
    }
}
