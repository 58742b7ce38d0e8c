#![forbid(unsafe_code)]

//! Deterministic session driver.
//!
//! [`PageSession`] owns an engine over the landing-page fixture and a
//! [`DeterministicClock`]. Every helper advances the engine to the clock
//! before acting, the way the browser adapter does, and appends one JSON
//! object to the session transcript.

use core::time::Duration;

use pagefx_core::binding::{Action, DomEvent};
use pagefx_core::clock::{Clock, DeterministicClock};
use pagefx_core::config::EngineConfig;
use pagefx_core::dom::Dom;
use pagefx_core::engine::Engine;
use pagefx_core::observer::{IntersectionEntry, ObserverConfig};
use pagefx_core::testing::{MockDom, NodeId};
use serde_json::{Value, json};

use crate::fixture::{LandingNodes, landing_page};

/// Engine plus clock plus transcript.
#[derive(Debug)]
pub struct PageSession {
    engine: Engine<MockDom>,
    clock: DeterministicClock,
    nodes: LandingNodes,
    transcript: Vec<Value>,
}

impl PageSession {
    /// Landing page with the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        let (dom, nodes) = landing_page();
        let engine = Engine::new(dom, config);
        tracing::debug!(report = ?engine.report(), "session started");
        Self {
            engine,
            clock: DeterministicClock::new(),
            nodes,
            transcript: Vec::new(),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &Engine<MockDom> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<MockDom> {
        &mut self.engine
    }

    #[must_use]
    pub fn dom(&self) -> &MockDom {
        self.engine.dom()
    }

    #[must_use]
    pub fn nodes(&self) -> &LandingNodes {
        &self.nodes
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now_mono()
    }

    /// Move the clock forward and fire due timers.
    pub fn advance(&mut self, dt: Duration) {
        self.clock.advance(dt);
        self.engine.advance_to(self.clock.now_mono());
        self.record("advance", json!({ "dt_ms": millis(dt) }));
    }

    pub fn advance_ms(&mut self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Dispatch an event at the current clock reading.
    pub fn send(&mut self, event: DomEvent<NodeId>) {
        self.engine.advance_to(self.clock.now_mono());
        let detail = json!({
            "action": format!("{:?}", event.action),
            "node": event.node.map(NodeId::index),
            "code": event.code.clone(),
        });
        self.engine.dispatch(event);
        self.record("dispatch", detail);
    }

    /// Click routed to `action` on `node`.
    pub fn click(&mut self, action: Action, node: NodeId) {
        self.send(DomEvent::new(action).on(node));
    }

    pub fn key(&mut self, code: &str) {
        self.send(DomEvent::key(code));
    }

    /// Press each code in turn; returns how many times the key sequence
    /// matched.
    pub fn type_codes<'a>(&mut self, codes: impl IntoIterator<Item = &'a str>) -> usize {
        let before = self.engine.easter_egg_activations();
        for code in codes {
            self.key(code);
        }
        self.engine.easter_egg_activations() - before
    }

    /// Scroll the document to `top` and send one scroll event.
    pub fn scroll_to(&mut self, top: f64) {
        self.dom().set_scroll_top(top);
        self.send(DomEvent::new(Action::Scroll));
    }

    /// Deliver a native visibility entry for `node` under `config`.
    pub fn reveal(&mut self, config: ObserverConfig, node: NodeId, ratio: f64) {
        self.reveal_batch(config, &[(node, ratio)]);
    }

    pub fn reveal_batch(&mut self, config: ObserverConfig, entries: &[(NodeId, f64)]) {
        self.engine.advance_to(self.clock.now_mono());
        let entries: Vec<_> = entries
            .iter()
            .map(|&(node, ratio)| IntersectionEntry {
                node,
                ratio,
                is_intersecting: ratio > 0.0,
            })
            .collect();
        self.engine.intersections(&config, &entries);
        self.record(
            "intersections",
            json!({
                "threshold_permille": config.threshold_permille,
                "entries": entries.iter().map(|e| json!([e.node.index(), e.ratio])).collect::<Vec<_>>(),
            }),
        );
    }

    /// Host reply to a clipboard write.
    pub fn settle_clipboard(&mut self, node: NodeId, ok: bool) {
        self.engine.advance_to(self.clock.now_mono());
        self.engine.clipboard_settled(&node, ok);
        self.record("clipboard", json!({ "node": node.index(), "ok": ok }));
    }

    /// Text currently shown by `node`.
    #[must_use]
    pub fn text(&self, node: NodeId) -> String {
        self.dom().text(&node)
    }

    /// Transcript as JSON lines.
    #[must_use]
    pub fn jsonl(&self) -> String {
        self.transcript
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[must_use]
    pub fn transcript(&self) -> &[Value] {
        &self.transcript
    }

    fn record(&mut self, kind: &str, detail: Value) {
        self.transcript.push(json!({
            "seq": self.transcript.len(),
            "t_ms": millis(self.clock.now_mono()),
            "kind": kind,
            "detail": detail,
            "menu": format!("{:?}", self.engine.menu_state()),
            "timers": self.engine.pending_timers(),
        }));
    }
}

impl Default for PageSession {
    fn default() -> Self {
        Self::new()
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
