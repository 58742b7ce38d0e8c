#![forbid(unsafe_code)]

//! In-memory [`Dom`] for tests.
//!
//! `MockDom` is an arena of nodes with classes, inline styles, attributes,
//! text and layout that tests set directly. Selector matching is explicit:
//! a node matches a selector string when its tag equals it or when the test
//! [`mark`](MockDom::mark)ed it with that exact string. Every host service
//! call (focus, observe, clipboard, scroll) is recorded for assertions.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use crate::dom::{Dom, Rect, ScrollBehavior, Viewport};
use crate::observer::ObserverConfig;

/// Handle to a [`MockDom`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Default)]
struct Node {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    marks: Vec<String>,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    attrs: BTreeMap<String, String>,
    text: String,
    html: Option<String>,
    value: Option<String>,
    rect: Rect,
    offset_top: f64,
    offset_height: f64,
    removed: bool,
}

#[derive(Debug)]
struct State {
    nodes: Vec<Node>,
    body: NodeId,
    head: NodeId,
    viewport: Viewport,
    scroll_top: f64,
    document_height: f64,
    native_observer: bool,
    refuse_create: bool,
    observed: HashSet<(NodeId, ObserverConfig)>,
    focus_log: Vec<NodeId>,
    scrolls: Vec<(f64, ScrollBehavior)>,
    clipboard: Vec<(NodeId, String)>,
}

/// Recording in-memory document.
#[derive(Debug)]
pub struct MockDom {
    state: RefCell<State>,
}

impl Default for MockDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDom {
    /// Empty document with `<head>` and `<body>`, a 1280x800 viewport and no
    /// scrollable content.
    #[must_use]
    pub fn new() -> Self {
        let head = Node {
            tag: "head".into(),
            ..Node::default()
        };
        let body = Node {
            tag: "body".into(),
            ..Node::default()
        };
        Self {
            state: RefCell::new(State {
                nodes: vec![head, body],
                head: NodeId(0),
                body: NodeId(1),
                viewport: Viewport::new(1280.0, 800.0),
                scroll_top: 0.0,
                document_height: 800.0,
                native_observer: true,
                refuse_create: false,
                observed: HashSet::new(),
                focus_log: Vec::new(),
                scrolls: Vec::new(),
                clipboard: Vec::new(),
            }),
        }
    }

    /// Report that no native observer exists; `observe` returns `false`.
    #[must_use]
    pub fn without_native_observer(self) -> Self {
        self.state.borrow_mut().native_observer = false;
        self
    }

    /// Make `create_element` fail.
    pub fn refuse_create(&self) {
        self.state.borrow_mut().refuse_create = true;
    }

    // --- building ---

    /// New element appended to `<body>`.
    pub fn element(&self, tag: &str) -> NodeId {
        let body = self.body_node();
        self.child(body, tag)
    }

    /// New element appended to `parent`.
    pub fn child(&self, parent: NodeId, tag: &str) -> NodeId {
        let mut s = self.state.borrow_mut();
        let id = NodeId(s.nodes.len());
        s.nodes.push(Node {
            tag: tag.to_owned(),
            parent: Some(parent),
            ..Node::default()
        });
        s.nodes[parent.0].children.push(id);
        id
    }

    /// Make `node` match `selector`.
    pub fn mark(&self, node: NodeId, selector: &str) {
        self.state.borrow_mut().nodes[node.0]
            .marks
            .push(selector.to_owned());
    }

    /// New element under `<body>` that matches `selector`.
    pub fn marked(&self, tag: &str, selector: &str) -> NodeId {
        let node = self.element(tag);
        self.mark(node, selector);
        node
    }

    pub fn set_attr(&self, node: NodeId, name: &str, value: &str) {
        self.state.borrow_mut().nodes[node.0]
            .attrs
            .insert(name.to_owned(), value.to_owned());
    }

    /// Give `node` inline markup; its text becomes the markup without tags.
    pub fn set_html(&self, node: NodeId, html: &str) {
        Dom::set_inner_html(self, &node, html);
    }

    pub fn set_value(&self, node: NodeId, value: &str) {
        self.state.borrow_mut().nodes[node.0].value = Some(value.to_owned());
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        self.state.borrow_mut().nodes[node.0].rect = rect;
    }

    pub fn set_offset(&self, node: NodeId, top: f64, height: f64) {
        let mut s = self.state.borrow_mut();
        s.nodes[node.0].offset_top = top;
        s.nodes[node.0].offset_height = height;
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.state.borrow_mut().viewport = viewport;
    }

    pub fn set_scroll_top(&self, top: f64) {
        self.state.borrow_mut().scroll_top = top;
    }

    pub fn set_document_height(&self, height: f64) {
        self.state.borrow_mut().document_height = height;
    }

    // --- inspection ---

    #[must_use]
    pub fn body_node(&self) -> NodeId {
        self.state.borrow().body
    }

    #[must_use]
    pub fn head_node(&self) -> NodeId {
        self.state.borrow().head
    }

    #[must_use]
    pub fn tag(&self, node: NodeId) -> String {
        self.state.borrow().nodes[node.0].tag.clone()
    }

    /// Inline style property; `None` when unset or cleared.
    #[must_use]
    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.state.borrow().nodes[node.0].styles.get(property).cloned()
    }

    #[must_use]
    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.state.borrow().nodes[node.0].attrs.get(name).cloned()
    }

    /// Attached children of `node`, in insertion order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        let s = self.state.borrow();
        s.nodes[node.0]
            .children
            .iter()
            .copied()
            .filter(|c| !s.nodes[c.0].removed)
            .collect()
    }

    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        Self::attached(&self.state.borrow(), node)
    }

    /// Last focused node.
    #[must_use]
    pub fn focused(&self) -> Option<NodeId> {
        self.state.borrow().focus_log.last().copied()
    }

    /// Every focus call, oldest first.
    #[must_use]
    pub fn focus_log(&self) -> Vec<NodeId> {
        self.state.borrow().focus_log.clone()
    }

    #[must_use]
    pub fn is_observed(&self, node: NodeId, config: &ObserverConfig) -> bool {
        self.state.borrow().observed.contains(&(node, *config))
    }

    #[must_use]
    pub fn observed_count(&self) -> usize {
        self.state.borrow().observed.len()
    }

    /// Every `scroll_to` call, oldest first.
    #[must_use]
    pub fn scrolls(&self) -> Vec<(f64, ScrollBehavior)> {
        self.state.borrow().scrolls.clone()
    }

    /// Every clipboard write request, oldest first.
    #[must_use]
    pub fn clipboard_writes(&self) -> Vec<(NodeId, String)> {
        self.state.borrow().clipboard.clone()
    }

    fn attached(s: &State, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            let n = &s.nodes[id.0];
            if n.removed {
                return false;
            }
            if id == s.body || id == s.head {
                return true;
            }
            cur = n.parent;
        }
        false
    }

    fn matches(n: &Node, selector: &str) -> bool {
        n.tag == selector || n.marks.iter().any(|m| m == selector)
    }

    fn is_descendant(s: &State, node: NodeId, root: NodeId) -> bool {
        let mut cur = s.nodes[node.0].parent;
        while let Some(id) = cur {
            if id == root {
                return true;
            }
            cur = s.nodes[id.0].parent;
        }
        false
    }
}

impl Dom for MockDom {
    type Node = NodeId;

    fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let s = self.state.borrow();
        (0..s.nodes.len())
            .map(NodeId)
            .filter(|id| Self::matches(&s.nodes[id.0], selector) && Self::attached(&s, *id))
            .collect()
    }

    fn query_within(&self, root: &NodeId, selector: &str) -> Vec<NodeId> {
        let s = self.state.borrow();
        (0..s.nodes.len())
            .map(NodeId)
            .filter(|id| {
                Self::matches(&s.nodes[id.0], selector)
                    && !s.nodes[id.0].removed
                    && Self::is_descendant(&s, *id, *root)
            })
            .collect()
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body_node())
    }

    fn head(&self) -> Option<NodeId> {
        Some(self.head_node())
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        let mut s = self.state.borrow_mut();
        let classes = &mut s.nodes[node.0].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_owned());
        }
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        self.state.borrow_mut().nodes[node.0]
            .classes
            .retain(|c| c != class);
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.state.borrow().nodes[node.0]
            .classes
            .iter()
            .any(|c| c == class)
    }

    fn set_style(&self, node: &NodeId, property: &str, value: &str) {
        let mut s = self.state.borrow_mut();
        let styles = &mut s.nodes[node.0].styles;
        if value.is_empty() {
            styles.remove(property);
        } else {
            styles.insert(property.to_owned(), value.to_owned());
        }
    }

    fn set_css_text(&self, node: &NodeId, css: &str) {
        let mut s = self.state.borrow_mut();
        let styles = &mut s.nodes[node.0].styles;
        styles.clear();
        for decl in css.split(';') {
            if let Some((prop, value)) = decl.split_once(':') {
                let (prop, value) = (prop.trim(), value.trim());
                if !prop.is_empty() && !value.is_empty() {
                    styles.insert(prop.to_owned(), value.to_owned());
                }
            }
        }
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.attr(*node, name)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.set_attr(*node, name, value);
    }

    fn text(&self, node: &NodeId) -> String {
        self.state.borrow().nodes[node.0].text.clone()
    }

    fn set_text(&self, node: &NodeId, text: &str) {
        let n = &mut self.state.borrow_mut().nodes[node.0];
        text.clone_into(&mut n.text);
        n.html = None;
    }

    fn inner_html(&self, node: &NodeId) -> String {
        let s = self.state.borrow();
        let n = &s.nodes[node.0];
        n.html.clone().unwrap_or_else(|| n.text.clone())
    }

    fn set_inner_html(&self, node: &NodeId, html: &str) {
        let n = &mut self.state.borrow_mut().nodes[node.0];
        n.text = strip_tags(html);
        n.html = Some(html.to_owned());
    }

    fn value(&self, node: &NodeId) -> Option<String> {
        let s = self.state.borrow();
        let n = &s.nodes[node.0];
        match n.tag.as_str() {
            "input" | "textarea" | "select" => Some(n.value.clone().unwrap_or_default()),
            _ => None,
        }
    }

    fn focus(&self, node: &NodeId) {
        self.state.borrow_mut().focus_log.push(*node);
    }

    fn create_element(&self, tag: &str) -> Option<NodeId> {
        let mut s = self.state.borrow_mut();
        if s.refuse_create {
            return None;
        }
        let id = NodeId(s.nodes.len());
        s.nodes.push(Node {
            tag: tag.to_owned(),
            ..Node::default()
        });
        Some(id)
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        let mut s = self.state.borrow_mut();
        if let Some(old) = s.nodes[child.0].parent {
            s.nodes[old.0].children.retain(|c| c != child);
        }
        s.nodes[child.0].parent = Some(*parent);
        s.nodes[child.0].removed = false;
        s.nodes[parent.0].children.push(*child);
    }

    fn remove(&self, node: &NodeId) {
        let mut s = self.state.borrow_mut();
        if let Some(parent) = s.nodes[node.0].parent.take() {
            s.nodes[parent.0].children.retain(|c| c != node);
        }
        s.nodes[node.0].removed = true;
    }

    fn bounding_rect(&self, node: &NodeId) -> Rect {
        self.state.borrow().nodes[node.0].rect
    }

    fn offset_top(&self, node: &NodeId) -> f64 {
        self.state.borrow().nodes[node.0].offset_top
    }

    fn offset_height(&self, node: &NodeId) -> f64 {
        self.state.borrow().nodes[node.0].offset_height
    }

    fn scroll_top(&self) -> f64 {
        self.state.borrow().scroll_top
    }

    fn document_height(&self) -> f64 {
        self.state.borrow().document_height
    }

    fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        self.state.borrow_mut().scrolls.push((top, behavior));
    }

    fn observe(&self, node: &NodeId, config: &ObserverConfig) -> bool {
        let mut s = self.state.borrow_mut();
        if !s.native_observer {
            return false;
        }
        s.observed.insert((*node, *config));
        true
    }

    fn unobserve(&self, node: &NodeId, config: &ObserverConfig) {
        self.state.borrow_mut().observed.remove(&(*node, *config));
    }

    fn write_clipboard(&self, node: &NodeId, text: &str) {
        self.state
            .borrow_mut()
            .clipboard
            .push((*node, text.to_owned()));
    }
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn query_matches_tags_and_marks() {
        let dom = MockDom::new();
        let a = dom.marked("section", ".hero");
        let b = dom.element("section");
        assert_eq!(dom.query(".hero"), Some(a));
        assert_eq!(dom.query_all("section"), vec![a, b]);
        assert_eq!(dom.query(".missing"), None);
    }

    #[test]
    fn removed_nodes_stop_matching() {
        let dom = MockDom::new();
        let span = dom.marked("span", ".ripple");
        dom.remove(&span);
        assert!(dom.query(".ripple").is_none());
        assert!(!dom.is_attached(span));
    }

    #[test]
    fn created_nodes_are_detached_until_appended() {
        let dom = MockDom::new();
        let div = dom.create_element("div").expect("create");
        assert!(!dom.is_attached(div));
        dom.append_child(&dom.body_node(), &div);
        assert!(dom.is_attached(div));
        assert_eq!(dom.children(dom.body_node()), vec![div]);
    }

    #[test]
    fn css_text_replaces_inline_style() {
        let dom = MockDom::new();
        let n = dom.element("div");
        dom.set_style(&n, "color", "red");
        dom.set_css_text(&n, "position: fixed; width: 0%;");
        assert_eq!(dom.style(n, "color"), None);
        assert_eq!(dom.style(n, "width").as_deref(), Some("0%"));
    }

    #[test]
    fn markup_and_text_stay_in_step() {
        let dom = MockDom::new();
        let n = dom.element("h1");
        dom.set_html(n, "a<br>b");
        assert_eq!(dom.text(&n), "ab");
        assert_eq!(dom.inner_html(&n), "a<br>b");
        dom.set_text(&n, "plain");
        assert_eq!(dom.inner_html(&n), "plain");
    }
}
