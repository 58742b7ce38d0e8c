#![forbid(unsafe_code)]

//! The page surface the engine manipulates.
//!
//! The engine never touches a browser API directly. Everything it reads or
//! mutates goes through [`Dom`], which the host implements: `pagefx-web`
//! binds it to `web-sys`, tests bind it to the in-memory `MockDom`.
//!
//! Every lookup is fallible by shape (`Option`, empty `Vec`) because markup is
//! edited independently of this crate. Mutating calls are fire-and-forget: a
//! host that cannot apply a style to a node simply skips it.

use core::fmt::Debug;

use crate::observer::ObserverConfig;

/// Axis-aligned box in CSS pixels, relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Area in square pixels; negative extents count as empty.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// Size of the visible browser window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// How a programmatic scroll should move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    #[default]
    Auto,
    Smooth,
}

/// Host-provided access to the document.
///
/// `Node` is whatever handle the host uses for elements. It must be cheap to
/// clone and comparable, since the engine keeps handles in its subscription
/// and timer tables.
pub trait Dom {
    type Node: Clone + PartialEq + Debug;

    // --- queries ---

    /// First element matching `selector`.
    fn query(&self, selector: &str) -> Option<Self::Node>;
    /// All elements matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;
    /// All descendants of `root` matching `selector`.
    fn query_within(&self, root: &Self::Node, selector: &str) -> Vec<Self::Node>;
    fn body(&self) -> Option<Self::Node>;
    fn head(&self) -> Option<Self::Node>;

    // --- classes, styles, attributes, text ---

    fn add_class(&self, node: &Self::Node, class: &str);
    fn remove_class(&self, node: &Self::Node, class: &str);
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    /// Set one inline style property. An empty `value` clears it.
    fn set_style(&self, node: &Self::Node, property: &str, value: &str);
    /// Replace the whole inline style declaration.
    fn set_css_text(&self, node: &Self::Node, css: &str);
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
    fn text(&self, node: &Self::Node) -> String;
    fn set_text(&self, node: &Self::Node, text: &str);
    /// Serialized child markup (`innerHTML`).
    fn inner_html(&self, node: &Self::Node) -> String;
    fn set_inner_html(&self, node: &Self::Node, html: &str);
    /// Current value of a form control; `None` for non-controls.
    fn value(&self, node: &Self::Node) -> Option<String>;
    fn focus(&self, node: &Self::Node);

    // --- tree ---

    fn create_element(&self, tag: &str) -> Option<Self::Node>;
    fn append_child(&self, parent: &Self::Node, child: &Self::Node);
    fn remove(&self, node: &Self::Node);

    // --- layout ---

    fn bounding_rect(&self, node: &Self::Node) -> Rect;
    fn offset_top(&self, node: &Self::Node) -> f64;
    fn offset_height(&self, node: &Self::Node) -> f64;
    fn scroll_top(&self) -> f64;
    fn document_height(&self) -> f64;
    fn viewport(&self) -> Viewport;
    fn scroll_to(&self, top: f64, behavior: ScrollBehavior);

    // --- host services ---

    /// Start native visibility observation of `node` under `config`.
    ///
    /// Returns `false` when the host has no native observer; the engine then
    /// falls back to geometry sampling on scroll.
    fn observe(&self, node: &Self::Node, config: &ObserverConfig) -> bool {
        let _ = (node, config);
        false
    }

    /// Stop native observation started by [`Dom::observe`].
    fn unobserve(&self, node: &Self::Node, config: &ObserverConfig) {
        let _ = (node, config);
    }

    /// Begin an asynchronous clipboard write on behalf of `node`.
    ///
    /// The host reports the outcome later through
    /// [`Engine::clipboard_settled`](crate::engine::Engine::clipboard_settled).
    fn write_clipboard(&self, node: &Self::Node, text: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges_and_area() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.area(), 1200.0);
        assert_eq!(Rect::new(0.0, 0.0, -5.0, 10.0).area(), 0.0);
    }
}
