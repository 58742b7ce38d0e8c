#![forbid(unsafe_code)]

//! Browser adapter for the pagefx engine.
//!
//! Page scripts call `start(optionsJson?)` once. The adapter then:
//!
//! - implements [`pagefx_core::Dom`] over `web-sys`, with one native
//!   `IntersectionObserver` per distinct observer config;
//! - attaches one listener per row of the engine's binding table;
//! - keeps a single `setTimeout` armed for the engine's next deadline;
//! - routes `tracing` output to the browser console.
//!
//! Only the `wasm` module touches browser APIs. [`host`] and [`console`] are
//! plain Rust and are tested natively.

pub mod console;
pub mod host;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{
    WebDom, calculate_roi, format_number, is_in_viewport, menu_open, scroll_to_element, start,
    toggle_menu,
};

pub use host::{StartError, StartOptions};
