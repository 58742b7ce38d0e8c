#![forbid(unsafe_code)]

//! Core: the scroll-driven interaction engine for a static landing page.
//!
//! # Role in pagefx
//! `pagefx-core` owns every piece of interaction state on the page: the
//! mobile menu, visibility-triggered animations, count-up counters, scroll
//! progress and header opacity, copy feedback, form validation and the hidden
//! key sequence. It never touches a browser API; the page is reached through
//! the [`Dom`] trait and time only moves when the host says so.
//!
//! # Primary responsibilities
//! - **Engine**: wires features at init and reacts to host input.
//! - **ViewportObserver**: one visibility abstraction for every trigger.
//! - **MenuController**: open/closed state, scroll lock, focus hand-off.
//! - **Scheduler**: deterministic one-shot and repeating timers.
//! - **EngineConfig**: every selector, threshold and duration as data.
//!
//! # How it fits in the system
//! `pagefx-web` implements [`Dom`] with `web-sys`, attaches listeners from
//! [`Engine::bindings`], and forwards events, observer batches and
//! `performance.now()` readings. `pagefx-harness` drives the same engine
//! against the in-memory `MockDom` with a [`DeterministicClock`].

pub mod binding;
pub mod clipboard;
pub mod clock;
pub mod config;
pub mod counter;
pub mod dom;
pub mod effects;
pub mod engine;
pub mod error;
pub mod form;
pub mod key_sequence;
pub mod menu;
pub mod observer;
pub mod scheduler;
pub mod styles;
pub mod telemetry;
pub mod utils;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use binding::{Action, Binding, DomEvent, EventKind, Target};
pub use clock::{Clock, DeterministicClock, SystemClock};
pub use config::EngineConfig;
pub use dom::{Dom, Rect, ScrollBehavior, Viewport};
pub use engine::{Engine, Feature, InitReport};
pub use error::{ConfigError, SetupError};
pub use menu::MenuState;
pub use observer::{IntersectionEntry, ObserverConfig, RootMargin};
pub use telemetry::ScrollPolicy;
