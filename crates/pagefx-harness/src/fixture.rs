#![forbid(unsafe_code)]

//! The landing page as a `MockDom`.
//!
//! Node handles are returned in [`LandingNodes`] so tests can address them
//! directly. The document is 4000px tall in a 1280x800 viewport; every
//! element starts below the fold.

use pagefx_core::config::Selectors;
use pagefx_core::counter::{COUNT_ATTR, DURATION_ATTR, SUFFIX_ATTR};
use pagefx_core::dom::{Dom, Rect, Viewport};
use pagefx_core::testing::{MockDom, NodeId};

/// Handles to the interesting nodes of the landing page.
#[derive(Debug, Clone)]
pub struct LandingNodes {
    pub header: NodeId,
    pub menu_button: NodeId,
    pub menu: NodeId,
    pub menu_overlay: NodeId,
    pub menu_close: NodeId,
    pub menu_links: Vec<NodeId>,
    pub anchor: NodeId,
    pub hero_title: NodeId,
    pub sections: Vec<NodeId>,
    pub timeline: Vec<NodeId>,
    /// `1000+` over the default duration, then `250 M€` over 800ms.
    pub counters: Vec<NodeId>,
    pub bars: Vec<NodeId>,
    pub images: Vec<NodeId>,
    pub cards: Vec<NodeId>,
    pub cta: NodeId,
    pub copy_button: NodeId,
    pub form: NodeId,
    pub form_fields: Vec<NodeId>,
}

pub const HERO_TITLE: &str = "Berlin Storage Network";
pub const PAGE_HEIGHT: f64 = 4000.0;
pub const HEADER_HEIGHT: f64 = 80.0;

fn below_fold(dom: &MockDom, node: NodeId, top: f64) {
    dom.set_rect(node, Rect::new(0.0, top, 1280.0, 300.0));
    dom.set_offset(node, top, 300.0);
}

/// Build the page.
#[must_use]
pub fn landing_page() -> (MockDom, LandingNodes) {
    let s = Selectors::default();
    let dom = MockDom::new();
    dom.set_viewport(Viewport::new(1280.0, 800.0));
    dom.set_document_height(PAGE_HEIGHT);

    let header = dom.marked("header", &s.header);
    dom.set_offset(header, 0.0, HEADER_HEIGHT);
    let menu_button = dom.child(header, "button");
    dom.mark(menu_button, &s.menu_trigger);

    let menu = dom.marked("nav", &s.menu);
    let menu_overlay = dom.marked("div", &s.menu_overlay);
    let menu_close = dom.child(menu, "button");
    dom.mark(menu_close, &s.menu_close);
    let menu_links = ["#market", "#timeline"]
        .iter()
        .map(|href| {
            let link = dom.child(menu, "a");
            dom.mark(link, &s.menu_links);
            dom.mark(link, &s.anchor_links);
            dom.set_attr(link, "href", href);
            link
        })
        .collect();

    let hero = dom.element("section");
    below_fold(&dom, hero, 900.0);
    let hero_title = dom.child(hero, "h1");
    dom.mark(hero_title, &s.hero_title);
    dom.set_text(&hero_title, HERO_TITLE);
    let cta = dom.child(hero, "a");
    dom.mark(cta, &s.ripple_buttons);
    dom.set_rect(cta, Rect::new(100.0, 1000.0, 200.0, 48.0));
    let anchor = dom.child(hero, "a");
    dom.mark(anchor, &s.anchor_links);
    dom.set_attr(anchor, "href", "#market");

    let market = dom.element("section");
    dom.mark(market, "#market");
    below_fold(&dom, market, 1300.0);
    let bars = (0..3)
        .map(|_| {
            let bar = dom.child(market, "div");
            dom.mark(bar, &s.progress_bars);
            bar
        })
        .collect();
    let counters = [("1000", "+", None), ("250", " M€", Some("800"))]
        .iter()
        .map(|(count, suffix, duration)| {
            let stat = dom.child(market, "span");
            dom.mark(stat, &s.counters);
            dom.set_attr(stat, COUNT_ATTR, count);
            dom.set_attr(stat, SUFFIX_ATTR, suffix);
            if let Some(ms) = duration {
                dom.set_attr(stat, DURATION_ATTR, ms);
            }
            dom.set_text(&stat, "0");
            stat
        })
        .collect();
    let cards = (0..2)
        .map(|_| {
            let card = dom.child(market, "div");
            dom.mark(card, &s.hover_cards);
            card
        })
        .collect();

    let timeline_section = dom.element("section");
    dom.mark(timeline_section, "#timeline");
    below_fold(&dom, timeline_section, 2000.0);
    let timeline = (0..4)
        .map(|_| {
            let item = dom.child(timeline_section, "div");
            dom.mark(item, &s.timeline_items);
            item
        })
        .collect();

    let gallery = dom.element("section");
    below_fold(&dom, gallery, 2600.0);
    let images = ["/img/warehouse.webp", "/img/team.webp"]
        .iter()
        .map(|src| {
            let img = dom.child(gallery, "img");
            dom.mark(img, &s.lazy_images);
            dom.set_attr(img, "data-src", src);
            dom.add_class(&img, "lazy");
            img
        })
        .collect();

    let contact = dom.element("section");
    below_fold(&dom, contact, 3300.0);
    let copy_button = dom.child(contact, "button");
    dom.mark(copy_button, &s.copy_buttons);
    dom.set_attr(copy_button, "data-copy", "hello@berlin-storage.example");
    dom.set_text(&copy_button, "hello@berlin-storage.example");
    let form = dom.child(contact, "form");
    let form_fields = ["input", "textarea"]
        .iter()
        .map(|tag| {
            let field = dom.child(form, tag);
            dom.mark(field, &s.required_fields);
            field
        })
        .collect();

    let sections = vec![hero, market, timeline_section, gallery, contact];
    let nodes = LandingNodes {
        header,
        menu_button,
        menu,
        menu_overlay,
        menu_close,
        menu_links,
        anchor,
        hero_title,
        sections,
        timeline,
        counters,
        bars,
        images,
        cards,
        cta,
        copy_button,
        form,
        form_fields,
    };
    (dom, nodes)
}
