#![forbid(unsafe_code)]

//! Test harness for pagefx.
//!
//! - [`fixture`] builds an in-memory copy of the landing page whose markup
//!   matches the default selectors.
//! - [`session`] drives an [`Engine`](pagefx_core::Engine) over that page with
//!   a deterministic clock and records every step as a JSONL transcript.

pub mod fixture;
pub mod session;

pub use fixture::{LandingNodes, landing_page};
pub use pagefx_core::testing::{MockDom, NodeId};
pub use session::PageSession;
