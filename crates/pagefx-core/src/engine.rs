#![forbid(unsafe_code)]

//! The page engine.
//!
//! [`Engine`] owns every piece of interaction state on the page. It is built
//! once from a [`Dom`] and an [`EngineConfig`]; after that the host drives it
//! through four entry points and nothing else:
//!
//! - [`Engine::dispatch`] for DOM events routed through the binding table,
//! - [`Engine::intersections`] for native visibility batches,
//! - [`Engine::clipboard_settled`] for clipboard write outcomes,
//! - [`Engine::advance_to`] for clock readings.
//!
//! The host must call `advance_to` with the current time before `dispatch`
//! so timers armed by the event are measured from the right instant.
//!
//! # Invariants
//!
//! 1. Feature setup is isolated: a feature that fails to wire is recorded in
//!    the [`InitReport`] and every other feature is still wired.
//! 2. A finished counter holds no live timer.
//! 3. At most one easter-egg removal timer is live.

use core::fmt;
use core::time::Duration;

use crate::binding::{Action, Binding, DomEvent, bindings};
use crate::clipboard::{COPY_ATTR, CopyFeedback};
use crate::config::EngineConfig;
use crate::counter::{COUNTER_TICK, CounterAnimation};
use crate::dom::{Dom, ScrollBehavior};
use crate::effects::{self, HOVER_LIFT, HOVER_REST, TIMELINE_HIDDEN, TIMELINE_SHOWN, Typewriter};
use crate::error::SetupError;
use crate::form;
use crate::key_sequence::KeySequenceMatcher;
use crate::menu::{MenuController, MenuNodes, MenuState};
use crate::observer::{Fired, IntersectionEntry, ObserverConfig, Repeat, ViewportObserver};
use crate::scheduler::{Scheduler, TimerId};
use crate::styles::INJECTED_CSS;
use crate::telemetry::{
    GateDecision, HEADER_RGB, PROGRESS_BAR_CSS, ScrollGate, ScrollSample, header_background,
    progress_width,
};

/// Attribute holding a lazy image's real source.
pub const LAZY_SRC_ATTR: &str = "data-src";

/// Independently wired page features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Styles,
    Menu,
    AnchorScroll,
    FadeIn,
    Timeline,
    Counters,
    ProgressBars,
    LazyImages,
    ScrollProgress,
    HeaderOpacity,
    HoverCards,
    Ripple,
    Clipboard,
    Forms,
    EasterEgg,
    Typewriter,
}

impl Feature {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Styles => "styles",
            Self::Menu => "menu",
            Self::AnchorScroll => "anchor_scroll",
            Self::FadeIn => "fade_in",
            Self::Timeline => "timeline",
            Self::Counters => "counters",
            Self::ProgressBars => "progress_bars",
            Self::LazyImages => "lazy_images",
            Self::ScrollProgress => "scroll_progress",
            Self::HeaderOpacity => "header_opacity",
            Self::HoverCards => "hover_cards",
            Self::Ripple => "ripple",
            Self::Clipboard => "clipboard",
            Self::Forms => "forms",
            Self::EasterEgg => "easter_egg",
            Self::Typewriter => "typewriter",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which features were wired at init and why the rest were not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitReport {
    pub wired: Vec<Feature>,
    pub skipped: Vec<(Feature, SetupError)>,
}

impl InitReport {
    #[must_use]
    pub fn is_wired(&self, feature: Feature) -> bool {
        self.wired.contains(&feature)
    }

    #[must_use]
    pub fn skipped(&self, feature: Feature) -> Option<&SetupError> {
        self.skipped
            .iter()
            .find(|(f, _)| *f == feature)
            .map(|(_, e)| e)
    }
}

/// What a visibility subscription does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    FadeIn,
    Timeline,
    Counter(usize),
    ProgressBar,
    LazyImage,
}

/// Deferred work carried by scheduler timers.
#[derive(Debug, Clone, PartialEq)]
pub enum Task<N> {
    ScrollSample,
    RevealTimeline(N),
    CounterTick(usize),
    RemoveRipple(N),
    RestoreLabel(N),
    EndEasterEgg,
    TypewriterTick,
}

/// Interaction engine for one page.
pub struct Engine<D: Dom> {
    dom: D,
    config: EngineConfig,
    scheduler: Scheduler<Task<D::Node>>,
    observer: ViewportObserver<D::Node, Trigger>,
    menu: MenuController<D::Node>,
    header: Option<D::Node>,
    progress_bar: Option<D::Node>,
    gate: ScrollGate,
    counters: Vec<CounterAnimation<D::Node>>,
    /// Title node, typing state, and the title's markup to put back at the end.
    typewriter: Option<(D::Node, Typewriter, String)>,
    keys: KeySequenceMatcher,
    easter_egg: Option<TimerId>,
    easter_egg_activations: usize,
    copy: CopyFeedback<D::Node>,
    report: InitReport,
}

impl<D: Dom> fmt::Debug for Engine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("menu", &self.menu.state())
            .field("subscriptions", &self.observer.len())
            .field("timers", &self.scheduler.pending())
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

impl<D: Dom> Engine<D> {
    /// Wire every feature against the current document.
    pub fn new(dom: D, config: EngineConfig) -> Self {
        let menu = MenuController::new(
            MenuNodes {
                trigger: dom.query(&config.selectors.menu_trigger),
                close_button: dom.query(&config.selectors.menu_close),
                body: dom.body(),
            },
            config.classes.menu_open.clone(),
        );
        let header = dom.query(&config.selectors.header);
        let keys = KeySequenceMatcher::new(config.easter_egg.sequence.iter().cloned());
        let gate = ScrollGate::new(config.scroll_policy);

        let mut engine = Self {
            dom,
            config,
            scheduler: Scheduler::new(),
            observer: ViewportObserver::new(),
            menu,
            header,
            progress_bar: None,
            gate,
            counters: Vec::new(),
            typewriter: None,
            keys,
            easter_egg: None,
            easter_egg_activations: 0,
            copy: CopyFeedback::new(),
            report: InitReport::default(),
        };
        engine.init();
        engine
    }

    fn init(&mut self) {
        if self.config.inject_styles {
            let r = self.setup_styles();
            self.wire(Feature::Styles, r);
        }
        let r = self.setup_menu();
        self.wire(Feature::Menu, r);
        let r = self.require_any(&self.config.selectors.anchor_links);
        self.wire(Feature::AnchorScroll, r);
        let r = self.setup_fade_in();
        self.wire(Feature::FadeIn, r);
        let r = self.setup_timeline();
        self.wire(Feature::Timeline, r);
        let r = self.setup_counters();
        self.wire(Feature::Counters, r);
        let r = self.setup_progress_bars();
        self.wire(Feature::ProgressBars, r);
        let r = self.setup_lazy_images();
        self.wire(Feature::LazyImages, r);
        let r = self.setup_scroll_progress();
        self.wire(Feature::ScrollProgress, r);
        let r = match self.header {
            Some(_) => Ok(()),
            None => Err(SetupError::missing(&self.config.selectors.header)),
        };
        self.wire(Feature::HeaderOpacity, r);
        let r = self.require_any(&self.config.selectors.hover_cards);
        self.wire(Feature::HoverCards, r);
        let r = self.require_any(&self.config.selectors.ripple_buttons);
        self.wire(Feature::Ripple, r);
        let r = self.require_any(&self.config.selectors.copy_buttons);
        self.wire(Feature::Clipboard, r);
        let r = self.require_any(&self.config.selectors.forms);
        self.wire(Feature::Forms, r);
        self.wire(Feature::EasterEgg, Ok(()));
        if self.config.typewriter.enabled {
            let r = self.setup_typewriter();
            self.wire(Feature::Typewriter, r);
        }

        if self.observer.needs_geometry() {
            let fired = self.observer.poll_geometry(&self.dom);
            self.on_fired(fired);
        }
        tracing::debug!(
            wired = self.report.wired.len(),
            skipped = self.report.skipped.len(),
            "page engine initialized"
        );
    }

    fn wire(&mut self, feature: Feature, result: Result<(), SetupError>) {
        match result {
            Ok(()) => {
                tracing::debug!(%feature, "feature wired");
                self.report.wired.push(feature);
            }
            Err(err) => {
                if err.is_absent() {
                    tracing::debug!(%feature, %err, "feature not on this page");
                } else {
                    tracing::warn!(%feature, %err, "feature skipped");
                }
                self.report.skipped.push((feature, err));
            }
        }
    }

    fn require_any(&self, selector: &str) -> Result<(), SetupError> {
        if self.dom.query(selector).is_some() {
            Ok(())
        } else {
            Err(SetupError::missing(selector))
        }
    }

    fn setup_styles(&self) -> Result<(), SetupError> {
        let head = self.dom.head().ok_or_else(|| SetupError::missing("head"))?;
        let style = self
            .dom
            .create_element("style")
            .ok_or_else(|| SetupError::create_failed("style"))?;
        self.dom.set_text(&style, INJECTED_CSS);
        self.dom.append_child(&head, &style);
        Ok(())
    }

    fn setup_menu(&self) -> Result<(), SetupError> {
        let s = &self.config.selectors;
        let present = [&s.menu_trigger, &s.menu_close, &s.menu_overlay, &s.menu]
            .iter()
            .any(|sel| self.dom.query(sel).is_some());
        if present {
            Ok(())
        } else {
            Err(SetupError::missing(&s.menu_trigger))
        }
    }

    fn observe_all(
        &mut self,
        selector: &str,
        config: ObserverConfig,
        trigger: Trigger,
        repeat: Repeat,
    ) -> Result<Vec<D::Node>, SetupError> {
        let nodes = self.dom.query_all(selector);
        if nodes.is_empty() {
            return Err(SetupError::missing(selector));
        }
        for node in &nodes {
            self.observer
                .observe(&self.dom, node.clone(), config, trigger, repeat);
        }
        Ok(nodes)
    }

    fn setup_fade_in(&mut self) -> Result<(), SetupError> {
        let selector = self.config.selectors.sections.clone();
        let config = self.config.fade_in;
        self.observe_all(&selector, config, Trigger::FadeIn, Repeat::Once)?;
        Ok(())
    }

    fn setup_timeline(&mut self) -> Result<(), SetupError> {
        let selector = self.config.selectors.timeline_items.clone();
        let config = self.config.timeline.observer;
        let items = self.observe_all(&selector, config, Trigger::Timeline, Repeat::Always)?;
        for item in &items {
            for (property, value) in TIMELINE_HIDDEN {
                self.dom.set_style(item, property, value);
            }
        }
        Ok(())
    }

    fn setup_counters(&mut self) -> Result<(), SetupError> {
        let selector = &self.config.selectors.counters;
        let nodes = self.dom.query_all(selector);
        if nodes.is_empty() {
            return Err(SetupError::missing(selector));
        }
        let default_duration = self.config.counters.default_duration();
        let config = self.config.counters.observer;
        let mut first_error = None;
        for node in nodes {
            match CounterAnimation::from_node(&self.dom, node.clone(), default_duration) {
                Ok(counter) => {
                    let idx = self.counters.len();
                    self.counters.push(counter);
                    self.observer
                        .observe(&self.dom, node, config, Trigger::Counter(idx), Repeat::Once);
                }
                Err(err) => {
                    tracing::warn!(?node, %err, "counter skipped");
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) if self.counters.is_empty() => Err(err),
            _ => Ok(()),
        }
    }

    fn setup_progress_bars(&mut self) -> Result<(), SetupError> {
        let selector = self.config.selectors.progress_bars.clone();
        let config = self.config.progress_bars;
        self.observe_all(&selector, config, Trigger::ProgressBar, Repeat::Once)?;
        Ok(())
    }

    fn setup_lazy_images(&mut self) -> Result<(), SetupError> {
        let selector = self.config.selectors.lazy_images.clone();
        let config = self.config.lazy_images;
        self.observe_all(&selector, config, Trigger::LazyImage, Repeat::Once)?;
        Ok(())
    }

    fn setup_scroll_progress(&mut self) -> Result<(), SetupError> {
        let body = self.dom.body().ok_or_else(|| SetupError::missing("body"))?;
        let bar = self
            .dom
            .create_element("div")
            .ok_or_else(|| SetupError::create_failed("div"))?;
        self.dom.set_css_text(&bar, PROGRESS_BAR_CSS);
        self.dom.append_child(&body, &bar);
        self.progress_bar = Some(bar);
        Ok(())
    }

    fn setup_typewriter(&mut self) -> Result<(), SetupError> {
        let selector = &self.config.selectors.hero_title;
        let title = self
            .dom
            .query(selector)
            .ok_or_else(|| SetupError::missing(selector))?;
        let markup = self.dom.inner_html(&title);
        let writer = Typewriter::new(&self.dom.text(&title));
        self.dom.set_text(&title, "");
        self.typewriter = Some((title, writer, markup));
        let delay = Duration::from_millis(self.config.typewriter.start_delay_ms);
        self.scheduler.after(delay, Task::TypewriterTick);
        Ok(())
    }

    // --- accessors ---

    #[must_use]
    pub fn dom(&self) -> &D {
        &self.dom
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn report(&self) -> &InitReport {
        &self.report
    }

    /// The listener table the host must wire.
    #[must_use]
    pub fn bindings(&self) -> Vec<Binding> {
        bindings(&self.config.selectors)
    }

    #[must_use]
    pub fn menu_state(&self) -> MenuState {
        self.menu.state()
    }

    /// Live visibility subscriptions.
    #[must_use]
    pub fn subscriptions(&self) -> usize {
        self.observer.len()
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// When the host should next call [`Engine::advance_to`].
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    #[must_use]
    pub fn easter_egg_active(&self) -> bool {
        self.easter_egg.is_some()
    }

    /// Number of key-sequence matches so far.
    #[must_use]
    pub fn easter_egg_activations(&self) -> usize {
        self.easter_egg_activations
    }

    // --- menu ---

    pub fn open_menu(&mut self) -> bool {
        self.menu.open(&self.dom)
    }

    pub fn close_menu(&mut self) -> bool {
        self.menu.close(&self.dom)
    }

    pub fn toggle_menu(&mut self) -> MenuState {
        self.menu.toggle(&self.dom)
    }

    // --- host entry points ---

    /// Handle one DOM event routed through the binding table.
    pub fn dispatch(&mut self, event: DomEvent<D::Node>) {
        tracing::trace!(action = ?event.action, "dispatch");
        match event.action {
            Action::ToggleMenu => {
                self.menu.toggle(&self.dom);
            }
            Action::CloseMenu => {
                self.menu.close(&self.dom);
            }
            Action::KeyPress => self.on_key(event.key.as_deref(), event.code.as_deref()),
            Action::Scroll => self.on_scroll(),
            Action::AnchorNavigate
            | Action::HoverEnter
            | Action::HoverLeave
            | Action::Ripple
            | Action::Copy
            | Action::SubmitForm => {
                let Some(node) = event.node.clone() else {
                    tracing::trace!(action = ?event.action, "event without target node");
                    return;
                };
                match event.action {
                    Action::AnchorNavigate => self.navigate(&node),
                    Action::HoverEnter => self.dom.set_style(&node, "transform", HOVER_LIFT),
                    Action::HoverLeave => self.dom.set_style(&node, "transform", HOVER_REST),
                    Action::Ripple => self.ripple(&node, event.client_x, event.client_y),
                    Action::Copy => self.copy(&node),
                    _ => self.submit(&node),
                }
            }
        }
    }

    /// Apply a native visibility batch observed under `config`.
    pub fn intersections(&mut self, config: &ObserverConfig, entries: &[IntersectionEntry<D::Node>]) {
        let fired = self.observer.deliver(&self.dom, config, entries);
        self.on_fired(fired);
    }

    /// Outcome of a clipboard write started by [`Dom::write_clipboard`].
    pub fn clipboard_settled(&mut self, node: &D::Node, ok: bool) {
        if !ok {
            tracing::warn!(?node, "clipboard write failed; label left unchanged");
            return;
        }
        self.copy.confirm(
            &self.dom,
            node,
            &self.config.labels,
            &mut self.scheduler,
            Task::RestoreLabel(node.clone()),
        );
    }

    /// Fire every timer due at or before `now`, in deadline order.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some((id, task)) = self.scheduler.pop_due(now) {
            self.run(id, task);
        }
        self.scheduler.settle(now);
    }

    // --- event handlers ---

    fn on_key(&mut self, key: Option<&str>, code: Option<&str>) {
        if let Some(key) = key {
            self.menu.on_key(&self.dom, key);
        }
        if let Some(code) = code
            && self.keys.feed(code)
        {
            self.activate_easter_egg();
        }
    }

    fn activate_easter_egg(&mut self) {
        if let Some(body) = self.dom.body() {
            self.dom
                .set_style(&body, "animation", &self.config.easter_egg.animation);
        }
        if let Some(old) = self.easter_egg.take() {
            self.scheduler.cancel(old);
        }
        let active = Duration::from_millis(self.config.easter_egg.active_ms);
        self.easter_egg = Some(self.scheduler.after(active, Task::EndEasterEgg));
        self.easter_egg_activations += 1;
        tracing::info!(activations = self.easter_egg_activations, "key sequence matched");
    }

    fn on_scroll(&mut self) {
        match self.gate.on_scroll(&mut self.scheduler, Task::ScrollSample) {
            GateDecision::SampleNow => self.sample_scroll(),
            GateDecision::Deferred(_) => {}
        }
    }

    fn sample_scroll(&mut self) {
        let sample = ScrollSample::read(&self.dom);
        if let Some(bar) = &self.progress_bar {
            self.dom
                .set_style(bar, "width", &progress_width(sample.progress_percent()));
        }
        if let Some(header) = &self.header {
            self.dom.set_style(
                header,
                "background",
                &header_background(HEADER_RGB, sample.header_opacity()),
            );
        }
        if self.observer.needs_geometry() {
            let fired = self.observer.poll_geometry(&self.dom);
            self.on_fired(fired);
        }
    }

    fn navigate(&mut self, link: &D::Node) {
        let href = self.dom.attribute(link, "href").unwrap_or_default();
        if href.len() > 1 && href.starts_with('#') {
            match self.dom.query(&href) {
                Some(target) => {
                    let header_height = self
                        .header
                        .as_ref()
                        .map_or(0.0, |h| self.dom.offset_height(h));
                    let top = self.dom.offset_top(&target) - header_height;
                    self.dom.scroll_to(top, ScrollBehavior::Smooth);
                }
                None => tracing::debug!(%href, "anchor target not found"),
            }
        }
        self.menu.close(&self.dom);
    }

    fn ripple(&mut self, button: &D::Node, client_x: f64, client_y: f64) {
        let Some(span) = self.dom.create_element("span") else {
            tracing::warn!("could not create ripple element");
            return;
        };
        let geometry = effects::ripple_geometry(self.dom.bounding_rect(button), client_x, client_y);
        for (property, value) in geometry.styles() {
            self.dom.set_style(&span, property, &value);
        }
        self.dom.add_class(&span, &self.config.classes.ripple);
        self.dom.append_child(button, &span);
        self.scheduler
            .after(self.config.ripple_lifetime(), Task::RemoveRipple(span));
    }

    fn copy(&mut self, button: &D::Node) {
        match self.dom.attribute(button, COPY_ATTR) {
            Some(text) => self.dom.write_clipboard(button, &text),
            None => tracing::debug!(?button, "copy button without data-copy"),
        }
    }

    fn submit(&mut self, form_node: &D::Node) {
        let report = form::validate(
            &self.dom,
            form_node,
            &self.config.selectors.required_fields,
            &self.config.classes.error,
        );
        if report.is_valid() {
            tracing::info!(fields = report.checked, "form is valid, submitting");
        } else {
            tracing::debug!(invalid = report.invalid, "form has empty required fields");
        }
    }

    fn on_fired(&mut self, fired: Vec<Fired<D::Node, Trigger>>) {
        let mut timeline_index: u32 = 0;
        for Fired { node, trigger } in fired {
            match trigger {
                Trigger::FadeIn => self.dom.add_class(&node, &self.config.classes.animate_in),
                Trigger::Timeline => {
                    let delay = self.config.timeline.stagger() * timeline_index;
                    timeline_index += 1;
                    if delay.is_zero() {
                        self.reveal_timeline(&node);
                    } else {
                        self.scheduler.after(delay, Task::RevealTimeline(node));
                    }
                }
                Trigger::Counter(idx) => self.start_counter(idx),
                Trigger::ProgressBar => {
                    self.dom.set_style(&node, "animation-play-state", "running");
                }
                Trigger::LazyImage => {
                    if let Some(src) = self.dom.attribute(&node, LAZY_SRC_ATTR) {
                        self.dom.set_attribute(&node, "src", &src);
                    }
                    self.dom.remove_class(&node, &self.config.classes.lazy);
                }
            }
        }
    }

    fn reveal_timeline(&self, node: &D::Node) {
        for (property, value) in TIMELINE_SHOWN {
            self.dom.set_style(node, property, value);
        }
    }

    fn start_counter(&mut self, idx: usize) {
        let Some(counter) = self.counters.get_mut(idx) else {
            return;
        };
        if counter.timer().is_some() || counter.is_finished() {
            return;
        }
        let timer = self.scheduler.every(COUNTER_TICK, Task::CounterTick(idx));
        counter.set_timer(Some(timer));
        tracing::trace!(idx, target = counter.target(), "counter started");
    }

    // --- timers ---

    fn run(&mut self, id: TimerId, task: Task<D::Node>) {
        match task {
            Task::ScrollSample => {
                self.gate.fired(id);
                self.sample_scroll();
            }
            Task::RevealTimeline(node) => self.reveal_timeline(&node),
            Task::CounterTick(idx) => {
                let Some(counter) = self.counters.get_mut(idx) else {
                    self.scheduler.cancel(id);
                    return;
                };
                let frame = counter.step();
                self.dom.set_text(counter.node(), &frame.text);
                if frame.finished {
                    self.scheduler.cancel(id);
                    counter.set_timer(None);
                }
            }
            Task::RemoveRipple(span) => self.dom.remove(&span),
            Task::RestoreLabel(node) => {
                self.copy.restore(&self.dom, &node);
            }
            Task::EndEasterEgg => {
                if let Some(body) = self.dom.body() {
                    self.dom.set_style(&body, "animation", "");
                }
                self.easter_egg = None;
            }
            Task::TypewriterTick => {
                let Some((title, writer, _)) = self.typewriter.as_mut() else {
                    return;
                };
                if let Some(prefix) = writer.advance() {
                    self.dom.set_text(title, &prefix);
                    let interval = Duration::from_millis(self.config.typewriter.char_interval_ms);
                    self.scheduler.after(interval, Task::TypewriterTick);
                } else if let Some((title, _, markup)) = self.typewriter.take() {
                    self.dom.set_inner_html(&title, &markup);
                }
            }
        }
    }
}
