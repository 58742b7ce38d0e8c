#![forbid(unsafe_code)]

//! Host-side plumbing that does not need a browser.
//!
//! Everything here is plain Rust so it runs under native `cargo test`; the
//! `wasm` module only converts between these types and `web-sys` objects.

use core::str::FromStr;
use core::time::Duration;

use pagefx_core::binding::{Action, DomEvent};
use pagefx_core::config::EngineConfig;
use pagefx_core::error::ConfigError;
use pagefx_core::utils;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;

/// Failure to boot the page runtime.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("invalid start options: {0}")]
    Options(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unknown log level `{0}`")]
    LogLevel(String),

    #[error("already started")]
    AlreadyStarted,

    #[error("no browser window")]
    NoWindow,
}

/// Options passed to `start` as a JSON string.
///
/// ```json
/// { "logLevel": "debug", "config": { "ripple_ms": 400 } }
/// ```
///
/// Both keys are optional; an omitted `config` means the page defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
struct RawOptions {
    config: Option<EngineConfig>,
    log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartOptions {
    pub config: EngineConfig,
    pub log_level: LevelFilter,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            log_level: LevelFilter::INFO,
        }
    }
}

impl StartOptions {
    /// Parse the optional JSON handed over by the page script.
    ///
    /// `None`, an empty string, and `null` all mean defaults.
    pub fn parse(json: Option<&str>) -> Result<Self, StartError> {
        let json = json.map(str::trim).unwrap_or_default();
        if json.is_empty() || json == "null" {
            return Ok(Self::default());
        }
        let raw: RawOptions = serde_json::from_str(json)?;
        let config = raw.config.unwrap_or_default();
        if let Some(err) = config.validate().into_iter().next() {
            return Err(err.into());
        }
        let log_level = match raw.log_level {
            Some(level) => parse_level(&level)?,
            None => LevelFilter::INFO,
        };
        Ok(Self { config, log_level })
    }
}

/// `"trace"` .. `"error"` or `"off"`, case-insensitive.
pub fn parse_level(raw: &str) -> Result<LevelFilter, StartError> {
    LevelFilter::from_str(raw.trim()).map_err(|_| StartError::LogLevel(raw.to_owned()))
}

/// `setTimeout` delay for a deadline, in whole milliseconds.
///
/// Rounds up so the timer never fires before the deadline, and clamps to the
/// range browsers accept.
#[must_use]
pub fn timeout_delay_ms(deadline: Duration, now: Duration) -> i32 {
    let remaining = deadline.saturating_sub(now);
    let mut ms = remaining.as_millis();
    if remaining.subsec_nanos() % 1_000_000 != 0 {
        ms += 1;
    }
    i32::try_from(ms).unwrap_or(i32::MAX)
}

/// Document-relative target for `scrollToElement(element, offset)`.
///
/// `offset` is added as given, so a negative offset stops short of the
/// element (e.g. `-80` to clear a fixed header).
#[must_use]
pub fn element_scroll_top(rect_top: f64, scroll_y: f64, offset: Option<f64>) -> f64 {
    utils::scroll_target(rect_top, scroll_y, offset.unwrap_or(0.0))
}

/// One-shot guard for `start`.
///
/// Claimed before boot is deferred to `DOMContentLoaded`, so a second call
/// made while the document is still loading is rejected too.
#[derive(Debug, Default)]
pub struct StartGate {
    claimed: bool,
}

impl StartGate {
    pub fn claim(&mut self) -> Result<(), StartError> {
        if self.claimed {
            return Err(StartError::AlreadyStarted);
        }
        self.claimed = true;
        Ok(())
    }

    /// Give the claim back after a boot that failed before wiring anything.
    pub fn release(&mut self) {
        self.claimed = false;
    }

    #[must_use]
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }
}

/// Raw fields read off a browser event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFields {
    pub key: Option<String>,
    pub code: Option<String>,
    pub client_x: f64,
    pub client_y: f64,
}

/// Build the engine event for a listener bound to `action` on `node`.
#[must_use]
pub fn dom_event<N>(action: Action, node: Option<N>, fields: EventFields) -> DomEvent<N> {
    let mut event = DomEvent::new(action).at(fields.client_x, fields.client_y);
    event.node = node;
    event.key = fields.key;
    event.code = fields.code;
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn missing_options_mean_defaults() {
        for json in [None, Some(""), Some("  "), Some("null"), Some("{}")] {
            let options = StartOptions::parse(json).unwrap();
            assert_eq!(options, StartOptions::default(), "{json:?}");
        }
    }

    #[test]
    fn partial_config_overrides_keep_defaults() {
        let options =
            StartOptions::parse(Some(r#"{"logLevel":"Debug","config":{"ripple_ms":400}}"#))
                .unwrap();
        assert_eq!(options.log_level, LevelFilter::DEBUG);
        assert_eq!(options.config.ripple_ms, 400);
        assert_eq!(
            options.config.selectors,
            EngineConfig::default().selectors
        );
    }

    #[test]
    fn invalid_options_are_rejected() {
        assert!(matches!(
            StartOptions::parse(Some("{not json")),
            Err(StartError::Options(_))
        ));
        assert!(matches!(
            StartOptions::parse(Some(r#"{"verbose":true}"#)),
            Err(StartError::Options(_))
        ));
        assert!(matches!(
            StartOptions::parse(Some(r#"{"logLevel":"loud"}"#)),
            Err(StartError::LogLevel(level)) if level == "loud"
        ));
        assert!(matches!(
            StartOptions::parse(Some(r#"{"config":{"easter_egg":{"sequence":[]}}}"#)),
            Err(StartError::Config(ConfigError::EmptyKeySequence))
        ));
    }

    #[test]
    fn timeout_delay_rounds_up_and_clamps() {
        let ms = Duration::from_millis;
        assert_eq!(timeout_delay_ms(ms(1000), ms(400)), 600);
        assert_eq!(timeout_delay_ms(ms(400), ms(1000)), 0);
        assert_eq!(
            timeout_delay_ms(Duration::from_micros(1500), Duration::ZERO),
            2
        );
        assert_eq!(timeout_delay_ms(Duration::MAX, Duration::ZERO), i32::MAX);
    }

    #[test]
    fn scroll_offset_is_added_as_given() {
        assert_eq!(element_scroll_top(120.0, 800.0, Some(-80.0)), 840.0);
        assert_eq!(element_scroll_top(120.0, 800.0, Some(40.0)), 960.0);
        assert_eq!(element_scroll_top(120.0, 800.0, None), 920.0);
    }

    #[test]
    fn start_gate_admits_one_claim() {
        let mut gate = StartGate::default();
        assert!(!gate.is_claimed());
        gate.claim().unwrap();
        assert!(matches!(gate.claim(), Err(StartError::AlreadyStarted)));
        assert!(matches!(gate.claim(), Err(StartError::AlreadyStarted)));
        gate.release();
        gate.claim().unwrap();
    }

    #[test]
    fn event_fields_carry_over() {
        let event = dom_event(
            Action::KeyPress,
            Some(7_u32),
            EventFields {
                key: Some("a".into()),
                code: Some("KeyA".into()),
                client_x: 3.0,
                client_y: 4.0,
            },
        );
        assert_eq!(event.action, Action::KeyPress);
        assert_eq!(event.node, Some(7));
        assert_eq!(event.key.as_deref(), Some("a"));
        assert_eq!(event.code.as_deref(), Some("KeyA"));
        assert_eq!((event.client_x, event.client_y), (3.0, 4.0));
    }
}
