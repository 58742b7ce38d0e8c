#![forbid(unsafe_code)]

//! `wasm-bindgen` exports and the `web-sys` implementation of [`Dom`].
//!
//! Only compiled on `wasm32` targets.
//!
//! # Ownership
//!
//! The `Runtime` lives in a thread-local for the lifetime of the page.
//! Every browser callback (listeners, observers, the timer, clipboard
//! promises) holds a `Weak` to it and goes through `Runtime::pump`, which
//! borrows the engine, advances it to the current time, runs the callback, and
//! re-arms the single `setTimeout` for the next deadline.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use js_sys::{Array, Function, Promise, Reflect};
use pagefx_core::binding::{Binding, Target};
use pagefx_core::clock::{Clock, SystemClock};
use pagefx_core::dom::{Dom, Rect, ScrollBehavior, Viewport};
use pagefx_core::engine::Engine;
use pagefx_core::menu::MenuState;
use pagefx_core::observer::{IntersectionEntry, ObserverConfig, is_fully_in_viewport};
use pagefx_core::utils;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, HtmlInputElement,
    HtmlSelectElement, HtmlTextAreaElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, KeyboardEvent, MouseEvent, NodeList, ScrollToOptions, Window,
};

use crate::console;
use crate::host::{self, EventFields, StartError, StartGate, StartOptions};

thread_local! {
    static RUNTIME: RefCell<Option<Rc<Runtime>>> = const { RefCell::new(None) };
    static GATE: RefCell<StartGate> = RefCell::new(StartGate::default());
}

fn js_error(err: StartError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

// ---------------------------------------------------------------------------
// Dom over web-sys
// ---------------------------------------------------------------------------

/// The live document.
pub struct WebDom {
    window: Window,
    document: Document,
    runtime: Weak<Runtime>,
    observers: RefCell<HashMap<ObserverConfig, IntersectionObserver>>,
}

impl core::fmt::Debug for WebDom {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebDom")
            .field("observers", &self.observers.borrow().len())
            .finish_non_exhaustive()
    }
}

fn collect(list: &NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn as_html(node: &Element) -> Option<&HtmlElement> {
    node.dyn_ref::<HtmlElement>()
}

fn window_dimension(value: Result<JsValue, JsValue>) -> f64 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
}

impl WebDom {
    fn native_observer(&self, config: &ObserverConfig) -> Result<IntersectionObserver, JsValue> {
        if let Some(existing) = self.observers.borrow().get(config) {
            return Ok(existing.clone());
        }
        let runtime = self.runtime.clone();
        let key = *config;
        let callback = Closure::<dyn Fn(Array)>::new(move |entries: Array| {
            let Some(runtime) = runtime.upgrade() else {
                return;
            };
            let batch: Vec<IntersectionEntry<Element>> = entries
                .iter()
                .filter_map(|value| value.dyn_into::<IntersectionObserverEntry>().ok())
                .map(|entry| IntersectionEntry {
                    node: entry.target(),
                    ratio: entry.intersection_ratio(),
                    is_intersecting: entry.is_intersecting(),
                })
                .collect();
            runtime.pump(|engine| engine.intersections(&key, &batch));
        });

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(config.threshold()));
        init.set_root_margin(&config.root_margin_css());
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        callback.forget();
        self.observers
            .borrow_mut()
            .insert(*config, observer.clone());
        Ok(observer)
    }

    fn clipboard_promise(&self, text: &str) -> Result<Promise, JsValue> {
        let navigator = Reflect::get(&self.window, &"navigator".into())?;
        let clipboard = Reflect::get(&navigator, &"clipboard".into())?;
        let write = Reflect::get(&clipboard, &"writeText".into())?.dyn_into::<Function>()?;
        write
            .call1(&clipboard, &JsValue::from_str(text))?
            .dyn_into::<Promise>()
    }
}

impl Dom for WebDom {
    type Node = Element;

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        self.document
            .query_selector_all(selector)
            .map(|list| collect(&list))
            .unwrap_or_default()
    }

    fn query_within(&self, root: &Element, selector: &str) -> Vec<Element> {
        root.query_selector_all(selector)
            .map(|list| collect(&list))
            .unwrap_or_default()
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn head(&self) -> Option<Element> {
        self.document.head().map(Element::from)
    }

    fn add_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().add_1(class);
    }

    fn remove_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().remove_1(class);
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        let Some(html) = as_html(node) else {
            return;
        };
        let style = html.style();
        let _ = if value.is_empty() {
            style.remove_property(property).map(drop)
        } else {
            style.set_property(property, value)
        };
    }

    fn set_css_text(&self, node: &Element, css: &str) {
        if let Some(html) = as_html(node) {
            html.style().set_css_text(css);
        }
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn text(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn inner_html(&self, node: &Element) -> String {
        node.inner_html()
    }

    fn set_inner_html(&self, node: &Element, html: &str) {
        node.set_inner_html(html);
    }

    fn value(&self, node: &Element) -> Option<String> {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            Some(input.value())
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            Some(area.value())
        } else {
            node.dyn_ref::<HtmlSelectElement>().map(HtmlSelectElement::value)
        }
    }

    fn focus(&self, node: &Element) {
        if let Some(html) = as_html(node) {
            let _ = html.focus();
        }
    }

    fn create_element(&self, tag: &str) -> Option<Element> {
        self.document.create_element(tag).ok()
    }

    fn append_child(&self, parent: &Element, child: &Element) {
        let _ = parent.append_child(child);
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn bounding_rect(&self, node: &Element) -> Rect {
        let r = node.get_bounding_client_rect();
        Rect::new(r.left(), r.top(), r.width(), r.height())
    }

    fn offset_top(&self, node: &Element) -> f64 {
        as_html(node).map_or(0.0, |html| f64::from(html.offset_top()))
    }

    fn offset_height(&self, node: &Element) -> f64 {
        as_html(node).map_or(0.0, |html| f64::from(html.offset_height()))
    }

    fn scroll_top(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn document_height(&self) -> f64 {
        self.document
            .document_element()
            .map_or(0.0, |root| f64::from(root.scroll_height()))
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(
            window_dimension(self.window.inner_width()),
            window_dimension(self.window.inner_height()),
        )
    }

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(match behavior {
            ScrollBehavior::Auto => web_sys::ScrollBehavior::Auto,
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
        });
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn observe(&self, node: &Element, config: &ObserverConfig) -> bool {
        match self.native_observer(config) {
            Ok(observer) => {
                observer.observe(node);
                true
            }
            Err(err) => {
                tracing::debug!(?err, "IntersectionObserver unavailable; sampling geometry");
                false
            }
        }
    }

    fn unobserve(&self, node: &Element, config: &ObserverConfig) {
        if let Some(observer) = self.observers.borrow().get(config) {
            observer.unobserve(node);
        }
    }

    fn write_clipboard(&self, node: &Element, text: &str) {
        let pending = self.clipboard_promise(text);
        let runtime = self.runtime.clone();
        let node = node.clone();
        // Always settle from a task so the engine is not re-entered mid-dispatch.
        wasm_bindgen_futures::spawn_local(async move {
            let ok = match pending {
                Ok(promise) => JsFuture::from(promise).await.is_ok(),
                Err(err) => {
                    tracing::debug!(?err, "clipboard API unavailable");
                    false
                }
            };
            if let Some(runtime) = runtime.upgrade() {
                runtime.pump(|engine| engine.clipboard_settled(&node, ok));
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

struct Runtime {
    window: Window,
    engine: RefCell<Engine<WebDom>>,
    clock: SystemClock,
    tick: RefCell<Option<Closure<dyn Fn()>>>,
    timeout: RefCell<Option<i32>>,
}

impl Runtime {
    fn boot(window: Window, document: Document, options: StartOptions) -> Rc<Self> {
        let runtime = Rc::new_cyclic(|weak: &Weak<Self>| {
            let dom = WebDom {
                window: window.clone(),
                document,
                runtime: weak.clone(),
                observers: RefCell::new(HashMap::new()),
            };
            Self {
                window,
                engine: RefCell::new(Engine::new(dom, options.config)),
                clock: SystemClock::new(),
                tick: RefCell::new(None),
                timeout: RefCell::new(None),
            }
        });

        let weak = Rc::downgrade(&runtime);
        let tick = Closure::<dyn Fn()>::new(move || {
            if let Some(runtime) = weak.upgrade() {
                runtime.timeout.borrow_mut().take();
                runtime.pump(|_| {});
            }
        });
        runtime.tick.replace(Some(tick));
        runtime.wire_listeners();
        runtime.pump(|_| {});
        runtime
    }

    /// Run `f` against the engine at the current time, then re-arm the timer.
    fn pump(&self, f: impl FnOnce(&mut Engine<WebDom>)) {
        let Ok(mut engine) = self.engine.try_borrow_mut() else {
            tracing::warn!("re-entrant browser callback dropped");
            return;
        };
        let now = self.clock.now_mono();
        engine.advance_to(now);
        f(&mut engine);
        let next = engine.next_deadline();
        drop(engine);
        self.arm(next.map(|deadline| host::timeout_delay_ms(deadline, now)));
    }

    fn arm(&self, delay_ms: Option<i32>) {
        if let Some(handle) = self.timeout.borrow_mut().take() {
            self.window.clear_timeout_with_handle(handle);
        }
        let Some(delay_ms) = delay_ms else {
            return;
        };
        let tick = self.tick.borrow();
        let Some(tick) = tick.as_ref() else {
            return;
        };
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                delay_ms,
            ) {
            Ok(handle) => {
                self.timeout.replace(Some(handle));
            }
            Err(err) => tracing::warn!(?err, "setTimeout failed; timers stalled"),
        }
    }

    fn wire_listeners(self: &Rc<Self>) {
        let (bindings, targets) = {
            let engine = self.engine.borrow();
            let bindings = engine.bindings();
            let targets: Vec<Vec<(EventTarget, Option<Element>)>> = bindings
                .iter()
                .map(|binding| self.targets(engine.dom(), binding))
                .collect();
            (bindings, targets)
        };
        let mut wired = 0_usize;
        for (binding, targets) in bindings.iter().zip(targets) {
            for (target, node) in targets {
                match self.listen(&target, binding, node) {
                    Ok(()) => wired += 1,
                    Err(err) => {
                        tracing::warn!(?err, event = binding.event.dom_name(), "listener not attached");
                    }
                }
            }
        }
        tracing::debug!(bindings = bindings.len(), listeners = wired, "listeners wired");
    }

    fn targets(&self, dom: &WebDom, binding: &Binding) -> Vec<(EventTarget, Option<Element>)> {
        match &binding.target {
            Target::Document => vec![(dom.document.clone().into(), None)],
            Target::Window => vec![(self.window.clone().into(), None)],
            Target::Selector(selector) => dom
                .query_all(selector)
                .into_iter()
                .map(|el| (el.clone().into(), Some(el)))
                .collect(),
        }
    }

    fn listen(
        self: &Rc<Self>,
        target: &EventTarget,
        binding: &Binding,
        node: Option<Element>,
    ) -> Result<(), JsValue> {
        let runtime = Rc::downgrade(self);
        let action = binding.action;
        let prevent_default = binding.prevent_default;
        let closure = Closure::<dyn Fn(Event)>::new(move |event: Event| {
            if prevent_default {
                event.prevent_default();
            }
            let Some(runtime) = runtime.upgrade() else {
                return;
            };
            let dom_event = host::dom_event(action, node.clone(), event_fields(&event));
            runtime.pump(|engine| engine.dispatch(dom_event));
        });
        target.add_event_listener_with_callback(
            binding.event.dom_name(),
            closure.as_ref().unchecked_ref(),
        )?;
        closure.forget();
        Ok(())
    }
}

fn event_fields(event: &Event) -> EventFields {
    let mut fields = EventFields::default();
    if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
        fields.key = Some(key.key());
        fields.code = Some(key.code());
    }
    if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
        fields.client_x = f64::from(mouse.client_x());
        fields.client_y = f64::from(mouse.client_y());
    }
    fields
}

fn boot(options: StartOptions) -> Result<(), StartError> {
    if RUNTIME.with(|slot| slot.borrow().is_some()) {
        return Err(StartError::AlreadyStarted);
    }
    let window = web_sys::window().ok_or(StartError::NoWindow)?;
    let document = window.document().ok_or(StartError::NoWindow)?;
    let runtime = Runtime::boot(window, document, options);
    {
        let engine = runtime.engine.borrow();
        tracing::debug!(report = ?engine.report(), "page runtime started");
    }
    RUNTIME.with(|slot| slot.replace(Some(runtime)));
    Ok(())
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

/// Boot the page runtime.
///
/// `options_json` is optional; see `StartOptions` for its shape. When the
/// document is still loading, wiring waits for `DOMContentLoaded`.
#[wasm_bindgen]
pub fn start(options_json: Option<String>) -> Result<(), JsValue> {
    install_panic_hook();
    if GATE.with(|gate| gate.borrow().is_claimed()) {
        return Err(js_error(StartError::AlreadyStarted));
    }
    let options = StartOptions::parse(options_json.as_deref()).map_err(js_error)?;

    let window = web_sys::window().ok_or_else(|| js_error(StartError::NoWindow))?;
    let document = window
        .document()
        .ok_or_else(|| js_error(StartError::NoWindow))?;
    GATE.with(|gate| gate.borrow_mut().claim()).map_err(js_error)?;
    console::init(options.log_level);

    if document.ready_state() != "loading" {
        return boot(options).map_err(|err| {
            GATE.with(|gate| gate.borrow_mut().release());
            js_error(err)
        });
    }

    let pending = RefCell::new(Some(options));
    let on_ready = Closure::<dyn Fn()>::new(move || {
        let Some(options) = pending.borrow_mut().take() else {
            return;
        };
        if let Err(err) = boot(options) {
            GATE.with(|gate| gate.borrow_mut().release());
            console_error(&format!("pagefx: {err}"));
        }
    });
    document.add_event_listener_with_callback(
        "DOMContentLoaded",
        on_ready.as_ref().unchecked_ref(),
    )?;
    on_ready.forget();
    Ok(())
}

/// `1234567` -> `"1,234,567"`.
#[wasm_bindgen(js_name = formatNumber)]
pub fn format_number(value: &JsValue) -> String {
    let raw = match value.as_f64() {
        Some(n) => n.to_string(),
        None => value.as_string().unwrap_or_default(),
    };
    utils::format_number(&raw)
}

/// ROI in percent with one decimal, or `undefined` for a zero investment.
#[wasm_bindgen(js_name = calculateRoi)]
pub fn calculate_roi(investment: f64, returns: f64) -> Option<String> {
    utils::calculate_roi(investment, returns)
}

/// Whether `element` lies entirely inside the viewport.
#[wasm_bindgen(js_name = isInViewport)]
pub fn is_in_viewport(element: &Element) -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let r = element.get_bounding_client_rect();
    let viewport = Viewport::new(
        window_dimension(window.inner_width()),
        window_dimension(window.inner_height()),
    );
    is_fully_in_viewport(Rect::new(r.left(), r.top(), r.width(), r.height()), viewport)
}

/// Smooth-scroll to `element`'s top plus `offset` pixels.
///
/// Pass a negative offset to stop short of the element, e.g. `-80` for a
/// fixed header.
#[wasm_bindgen(js_name = scrollToElement)]
pub fn scroll_to_element(element: &Element, offset: Option<f64>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let top = host::element_scroll_top(
        element.get_bounding_client_rect().top(),
        window.scroll_y().unwrap_or(0.0),
        offset,
    );
    let options = ScrollToOptions::new();
    options.set_top(top);
    options.set_behavior(web_sys::ScrollBehavior::Smooth);
    window.scroll_to_with_scroll_to_options(&options);
}

/// Whether the mobile menu is open. `false` before `start`.
#[wasm_bindgen(js_name = menuOpen)]
pub fn menu_open() -> bool {
    RUNTIME.with(|slot| {
        slot.borrow().as_ref().is_some_and(|runtime| {
            runtime
                .engine
                .try_borrow()
                .is_ok_and(|engine| engine.menu_state() == MenuState::Open)
        })
    })
}

/// Toggle the mobile menu from a page script.
#[wasm_bindgen(js_name = toggleMenu)]
pub fn toggle_menu() {
    let runtime = RUNTIME.with(|slot| slot.borrow().clone());
    if let Some(runtime) = runtime {
        runtime.pump(|engine| {
            engine.toggle_menu();
        });
    }
}
