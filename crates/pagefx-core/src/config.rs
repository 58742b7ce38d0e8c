#![forbid(unsafe_code)]

//! Policy-as-data configuration for the page engine.
//!
//! Every selector, threshold, duration and label the engine uses lives in
//! [`EngineConfig`]. The defaults reproduce the landing page exactly, so
//! `EngineConfig::default()` needs no markup changes. With the `config`
//! feature a partial override can be loaded from JSON or TOML; missing
//! fields keep their defaults.
//!
//! ```toml
//! scroll_policy = { mode = "debounce", ms = 50 }
//!
//! [counters]
//! default_duration_ms = 1500
//!
//! [labels]
//! copy_confirmation = "Copied!"
//! ```

use core::time::Duration;

use crate::error::ConfigError;
use crate::key_sequence::KONAMI;
use crate::observer::{ObserverConfig, RootMargin};
use crate::telemetry::ScrollPolicy;

/// CSS selectors for every element the engine looks up.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct Selectors {
    pub menu_trigger: String,
    pub menu: String,
    pub menu_overlay: String,
    pub menu_close: String,
    pub menu_links: String,
    pub anchor_links: String,
    pub header: String,
    pub sections: String,
    pub progress_bars: String,
    pub timeline_items: String,
    pub counters: String,
    pub hover_cards: String,
    pub ripple_buttons: String,
    pub copy_buttons: String,
    pub lazy_images: String,
    pub forms: String,
    pub required_fields: String,
    pub hero_title: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            menu_trigger: ".menu-btn".into(),
            menu: ".mobile-menu".into(),
            menu_overlay: ".mobile-menu-overlay".into(),
            menu_close: ".mobile-menu__close".into(),
            menu_links: ".mobile-menu__link".into(),
            anchor_links: "a[href^=\"#\"]".into(),
            header: ".header".into(),
            sections: "section".into(),
            progress_bars: ".market__bar".into(),
            timeline_items: ".timeline__item".into(),
            counters: "[data-count]".into(),
            hover_cards: ".imbalance__card, .competitor, .property, .tech-feature, .service, .story"
                .into(),
            ripple_buttons: ".hero__cta-btn, .cta__btn, .menu__contacts".into(),
            copy_buttons: "[data-copy]".into(),
            lazy_images: "img[data-src]".into(),
            forms: "form".into(),
            required_fields: "input[required], textarea[required]".into(),
            hero_title: ".hero__title".into(),
        }
    }
}

/// Class names the engine adds and removes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ClassNames {
    pub menu_open: String,
    pub animate_in: String,
    pub error: String,
    pub lazy: String,
    pub ripple: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            menu_open: "menu-open".into(),
            animate_in: "animate-in".into(),
            error: "error".into(),
            lazy: "lazy".into(),
            ripple: "ripple".into(),
        }
    }
}

/// Timeline reveal parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct TimelineConfig {
    pub observer: ObserverConfig,
    /// Delay between items revealed by the same batch.
    pub stagger_ms: u64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            observer: ObserverConfig::new(0.2),
            stagger_ms: 200,
        }
    }
}

impl TimelineConfig {
    #[must_use]
    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

/// Count-up animation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct CounterConfig {
    pub observer: ObserverConfig,
    /// Used when an element has no `data-duration`.
    pub default_duration_ms: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            observer: ObserverConfig::new(0.5),
            default_duration_ms: 2000,
        }
    }
}

impl CounterConfig {
    #[must_use]
    pub fn default_duration(&self) -> Duration {
        Duration::from_millis(self.default_duration_ms)
    }
}

/// User-visible strings and colours.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct Labels {
    pub copy_confirmation: String,
    pub copy_highlight: String,
    pub copy_restore_ms: u64,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            copy_confirmation: "Скопійовано!".into(),
            copy_highlight: "#54FF8F".into(),
            copy_restore_ms: 2000,
        }
    }
}

/// Hidden key-sequence effect.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct EasterEggConfig {
    /// `KeyboardEvent.code` values, oldest first.
    pub sequence: Vec<String>,
    /// Inline `animation` applied to the body on a match.
    pub animation: String,
    pub active_ms: u64,
}

impl Default for EasterEggConfig {
    fn default() -> Self {
        Self {
            sequence: KONAMI.iter().map(|s| (*s).to_owned()).collect(),
            animation: "rainbow 2s infinite".into(),
            active_ms: 5000,
        }
    }
}

/// Hero title typing effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct TypewriterConfig {
    pub enabled: bool,
    pub start_delay_ms: u64,
    pub char_interval_ms: u64,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_delay_ms: 1000,
            char_interval_ms: 50,
        }
    }
}

/// Everything the engine can be tuned with.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct EngineConfig {
    pub selectors: Selectors,
    pub classes: ClassNames,
    pub fade_in: ObserverConfig,
    pub timeline: TimelineConfig,
    pub counters: CounterConfig,
    pub progress_bars: ObserverConfig,
    pub lazy_images: ObserverConfig,
    pub scroll_policy: ScrollPolicy,
    pub ripple_ms: u64,
    pub labels: Labels,
    pub easter_egg: EasterEggConfig,
    pub typewriter: TypewriterConfig,
    /// Append the effect stylesheet to `<head>` at init.
    pub inject_styles: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            selectors: Selectors::default(),
            classes: ClassNames::default(),
            fade_in: ObserverConfig::new(0.1).with_root_margin(RootMargin::bottom(-50)),
            timeline: TimelineConfig::default(),
            counters: CounterConfig::default(),
            progress_bars: ObserverConfig::new(0.3),
            lazy_images: ObserverConfig::new(0.0),
            scroll_policy: ScrollPolicy::default(),
            ripple_ms: 600,
            labels: Labels::default(),
            easter_egg: EasterEggConfig::default(),
            typewriter: TypewriterConfig::default(),
            inject_styles: true,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON string and validate.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.checked()
    }

    /// Load from a TOML string and validate.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.checked()
    }

    /// Every problem with this config; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.easter_egg.sequence.is_empty() {
            errors.push(ConfigError::EmptyKeySequence);
        }
        let thresholds = [
            ("fade_in", self.fade_in),
            ("timeline.observer", self.timeline.observer),
            ("counters.observer", self.counters.observer),
            ("progress_bars", self.progress_bars),
            ("lazy_images", self.lazy_images),
        ];
        for (field, observer) in thresholds {
            if observer.threshold_permille > 1000 {
                errors.push(ConfigError::ThresholdOutOfRange {
                    field,
                    value: observer.threshold_permille,
                });
            }
        }
        errors
    }

    #[cfg(feature = "config")]
    fn checked(self) -> Result<Self, ConfigError> {
        match self.validate().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    #[must_use]
    pub fn ripple_lifetime(&self) -> Duration {
        Duration::from_millis(self.ripple_ms)
    }
}
