//! End-to-end properties of the engine on the landing-page fixture.
//!
//! 1. Menu state equals the net effect of its transitions; scroll is locked
//!    iff the menu is open.
//! 2. Escape is a no-op while closed and closes while open.
//! 3. Counters are monotonic, end exactly at target + suffix, then stop.
//! 4. The key sequence matches once, never with one wrong code, twice when
//!    typed twice.
//! 5. Scroll progress is 0 at the top, 100 at the bottom, never NaN.
//! 6. Lazy images load exactly once.

use pagefx_core::binding::Action;
use pagefx_core::config::EngineConfig;
use pagefx_core::dom::Dom;
use pagefx_core::key_sequence::KONAMI;
use pagefx_core::menu::MenuState;
use pagefx_harness::PageSession;
use pagefx_harness::fixture::{HEADER_HEIGHT, HERO_TITLE, PAGE_HEIGHT};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn session_without_typewriter() -> PageSession {
    let mut config = EngineConfig::default();
    config.typewriter.enabled = false;
    PageSession::with_config(config)
}

fn body_locked(session: &PageSession) -> bool {
    let body = session.dom().body_node();
    session.dom().style(body, "overflow").as_deref() == Some("hidden")
        && session.dom().has_class(&body, "menu-open")
}

// ── 1. menu parity ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum MenuOp {
    Trigger,
    CloseButton,
    Overlay,
    Link,
    Escape,
    Enter,
}

fn menu_op() -> impl Strategy<Value = MenuOp> {
    prop_oneof![
        3 => Just(MenuOp::Trigger),
        1 => Just(MenuOp::CloseButton),
        1 => Just(MenuOp::Overlay),
        1 => Just(MenuOp::Link),
        1 => Just(MenuOp::Escape),
        1 => Just(MenuOp::Enter),
    ]
}

proptest! {
    #[test]
    fn menu_state_tracks_effective_transitions(ops in prop::collection::vec(menu_op(), 0..40)) {
        let mut session = session_without_typewriter();
        let nodes = session.nodes().clone();
        let mut expected = MenuState::Closed;

        for op in ops {
            match op {
                MenuOp::Trigger => {
                    session.click(Action::ToggleMenu, nodes.menu_button);
                    expected = match expected {
                        MenuState::Closed => MenuState::Open,
                        MenuState::Open => MenuState::Closed,
                    };
                }
                MenuOp::CloseButton => {
                    session.click(Action::CloseMenu, nodes.menu_close);
                    expected = MenuState::Closed;
                }
                MenuOp::Overlay => {
                    session.click(Action::CloseMenu, nodes.menu_overlay);
                    expected = MenuState::Closed;
                }
                MenuOp::Link => {
                    session.click(Action::CloseMenu, nodes.menu_links[0]);
                    session.click(Action::AnchorNavigate, nodes.menu_links[0]);
                    expected = MenuState::Closed;
                }
                MenuOp::Escape => {
                    session.key("Escape");
                    expected = MenuState::Closed;
                }
                MenuOp::Enter => session.key("Enter"),
            }
            prop_assert_eq!(session.engine().menu_state(), expected);
            prop_assert_eq!(body_locked(&session), expected == MenuState::Open);
        }
    }
}

#[test]
fn focus_moves_only_on_effective_transitions() {
    let mut session = session_without_typewriter();
    let nodes = session.nodes().clone();

    session.click(Action::CloseMenu, nodes.menu_overlay);
    assert!(session.dom().focus_log().is_empty());

    session.click(Action::ToggleMenu, nodes.menu_button);
    assert_eq!(session.dom().focused(), Some(nodes.menu_close));
    session.click(Action::CloseMenu, nodes.menu_close);
    assert_eq!(session.dom().focused(), Some(nodes.menu_button));
    session.click(Action::CloseMenu, nodes.menu_close);
    assert_eq!(session.dom().focus_log().len(), 2);
}

// ── 2. escape ───────────────────────────────────────────────────────────

#[test]
fn escape_closes_only_an_open_menu() {
    let mut session = session_without_typewriter();
    let trigger = session.nodes().menu_button;

    session.key("Escape");
    assert_eq!(session.engine().menu_state(), MenuState::Closed);
    assert!(session.dom().focus_log().is_empty());

    session.click(Action::ToggleMenu, trigger);
    session.key("Escape");
    assert_eq!(session.engine().menu_state(), MenuState::Closed);
    assert!(!body_locked(&session));
}

// ── 3. counters ─────────────────────────────────────────────────────────

#[test]
fn counter_counts_up_to_target_then_stops() {
    let mut session = session_without_typewriter();
    let stat = session.nodes().counters[0];
    let config = session.engine().config().counters.observer;
    session.reveal(config, stat, 0.8);

    let mut last = 0u64;
    let mut finished_at = None;
    for step in 1..=200u32 {
        session.advance_ms(16);
        let text = session.text(stat);
        if let Some(done) = text.strip_suffix('+') {
            assert_eq!(done, "1000");
            finished_at.get_or_insert(step);
            continue;
        }
        let value: u64 = text.parse().expect("intermediate values carry no suffix");
        assert!(value >= last, "{value} < {last}");
        assert!(value < 1000);
        last = value;
    }
    assert_eq!(finished_at, Some(125));
    assert_eq!(session.text(stat), "1000+");
    assert_eq!(session.engine().pending_timers(), 0);
}

#[test]
fn counters_honour_their_own_duration() {
    let mut session = session_without_typewriter();
    let stat = session.nodes().counters[1];
    let config = session.engine().config().counters.observer;
    session.reveal(config, stat, 1.0);
    session.advance_ms(799);
    assert_ne!(session.text(stat), "250 M€");
    session.advance_ms(1);
    assert_eq!(session.text(stat), "250 M€");
}

#[test]
fn counter_does_not_restart_on_reentry() {
    let mut session = session_without_typewriter();
    let stat = session.nodes().counters[0];
    let config = session.engine().config().counters.observer;
    session.reveal(config, stat, 1.0);
    session.advance_ms(3000);
    session.reveal(config, stat, 0.0);
    session.reveal(config, stat, 1.0);
    assert_eq!(session.engine().pending_timers(), 0);
    assert_eq!(session.text(stat), "1000+");
}

// ── 4. key sequence ─────────────────────────────────────────────────────

#[test]
fn exact_sequence_triggers_once() {
    let mut session = session_without_typewriter();
    assert_eq!(session.type_codes(KONAMI), 1);
    let body = session.dom().body_node();
    assert_eq!(
        session.dom().style(body, "animation").as_deref(),
        Some("rainbow 2s infinite")
    );
    session.advance_ms(5000);
    assert_eq!(session.dom().style(body, "animation"), None);
}

#[test]
fn any_single_wrong_code_never_triggers() {
    for wrong in 0..KONAMI.len() {
        let mut session = session_without_typewriter();
        let mut codes = KONAMI;
        codes[wrong] = "KeyZ";
        assert_eq!(session.type_codes(codes), 0, "position {wrong}");
    }
}

#[test]
fn sequence_typed_twice_triggers_twice() {
    let mut session = session_without_typewriter();
    let twice: Vec<&str> = KONAMI.iter().chain(KONAMI.iter()).copied().collect();
    assert_eq!(session.type_codes(twice), 2);
    assert_eq!(session.engine().pending_timers(), 1);
}

// ── 5. scroll progress ──────────────────────────────────────────────────

fn progress_bar(session: &PageSession) -> pagefx_harness::NodeId {
    let body = session.dom().body_node();
    session
        .dom()
        .children(body)
        .into_iter()
        .find(|n| session.dom().style(*n, "height").as_deref() == Some("3px"))
        .expect("progress bar appended to body")
}

#[test]
fn progress_runs_from_zero_to_hundred() {
    let mut session = session_without_typewriter();
    let bar = progress_bar(&session);
    let header = session.nodes().header;

    session.scroll_to(0.0);
    session.advance_ms(16);
    assert_eq!(session.dom().style(bar, "width").as_deref(), Some("0%"));
    assert_eq!(
        session.dom().style(header, "background").as_deref(),
        Some("rgba(37, 54, 56, 0)")
    );

    session.scroll_to(PAGE_HEIGHT - 800.0);
    session.advance_ms(16);
    assert_eq!(session.dom().style(bar, "width").as_deref(), Some("100%"));
}

#[test]
fn unscrollable_page_never_reports_nan() {
    let mut session = session_without_typewriter();
    let bar = progress_bar(&session);
    session.dom().set_document_height(800.0);
    session.scroll_to(0.0);
    session.advance_ms(16);
    assert_eq!(session.dom().style(bar, "width").as_deref(), Some("0%"));
}

#[test]
fn scroll_bursts_are_sampled_once_per_interval() {
    let mut session = session_without_typewriter();
    let bar = progress_bar(&session);
    for top in [100.0, 400.0, 800.0] {
        session.scroll_to(top);
    }
    assert_eq!(session.engine().pending_timers(), 1);
    session.advance_ms(16);
    assert_eq!(session.dom().style(bar, "width").as_deref(), Some("25%"));
}

// ── 6. lazy images ──────────────────────────────────────────────────────

#[test]
fn lazy_image_loads_exactly_once() {
    let mut session = session_without_typewriter();
    let img = session.nodes().images[0];
    let config = session.engine().config().lazy_images;

    session.reveal(config, img, 0.2);
    assert_eq!(session.dom().attr(img, "src").as_deref(), Some("/img/warehouse.webp"));
    assert!(!session.dom().has_class(&img, "lazy"));
    assert!(!session.dom().is_observed(img, &config));

    session.dom().set_attr(img, "src", "/img/replaced.webp");
    session.reveal(config, img, 0.0);
    session.reveal(config, img, 0.9);
    assert_eq!(session.dom().attr(img, "src").as_deref(), Some("/img/replaced.webp"));
}

// ── page effects ────────────────────────────────────────────────────────

#[test]
fn every_fixture_feature_is_wired() {
    let session = PageSession::new();
    let report = session.engine().report();
    assert!(report.skipped.is_empty(), "{:?}", report.skipped);
}

#[test]
fn anchor_scrolls_below_the_header() {
    let mut session = session_without_typewriter();
    let anchor = session.nodes().anchor;
    session.click(Action::AnchorNavigate, anchor);
    let (top, _) = session.dom().scrolls()[0];
    assert_eq!(top, 1300.0 - HEADER_HEIGHT);
}

#[test]
fn hero_title_is_typed_out() {
    let mut session = PageSession::new();
    let title = session.nodes().hero_title;
    assert_eq!(session.text(title), "");
    session.advance_ms(1000);
    assert_eq!(session.text(title), "B");
    session.advance_ms(50 * 40);
    assert_eq!(session.text(title), HERO_TITLE);
}

#[test]
fn clipboard_label_round_trip() {
    let mut session = session_without_typewriter();
    let btn = session.nodes().copy_button;
    let label = session.text(btn);

    session.click(Action::Copy, btn);
    assert_eq!(session.dom().clipboard_writes().len(), 1);
    session.settle_clipboard(btn, true);
    session.advance_ms(1000);
    session.click(Action::Copy, btn);
    session.settle_clipboard(btn, true);
    session.advance_ms(1999);
    assert_eq!(session.text(btn), "Скопійовано!");
    session.advance_ms(1);
    assert_eq!(session.text(btn), label);
}

#[test]
fn timeline_batch_is_staggered() {
    let mut session = session_without_typewriter();
    let items = session.nodes().timeline.clone();
    let config = session.engine().config().timeline.observer;
    let batch: Vec<_> = items.iter().map(|n| (*n, 0.5)).collect();
    session.reveal_batch(config, &batch);

    for (i, item) in items.iter().enumerate() {
        let expect = if i == 0 { "1" } else { "0" };
        assert_eq!(session.dom().style(*item, "opacity").as_deref(), Some(expect));
    }
    session.advance_ms(600);
    for item in &items {
        assert_eq!(session.dom().style(*item, "opacity").as_deref(), Some("1"));
    }
}

#[test]
fn form_validation_round_trip() {
    let mut session = session_without_typewriter();
    let nodes = session.nodes().clone();
    session.click(Action::SubmitForm, nodes.form);
    assert!(nodes.form_fields.iter().all(|f| session.dom().has_class(f, "error")));

    for field in &nodes.form_fields {
        session.dom().set_value(*field, "filled");
    }
    session.click(Action::SubmitForm, nodes.form);
    assert!(nodes.form_fields.iter().all(|f| !session.dom().has_class(f, "error")));
}

#[test]
fn transcript_is_valid_jsonl() {
    let mut session = session_without_typewriter();
    session.key("Escape");
    session.advance_ms(10);
    let jsonl = session.jsonl();
    let lines: Vec<serde_json::Value> = jsonl
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["kind"], "advance");
    assert_eq!(lines[1]["t_ms"], 10);
}
