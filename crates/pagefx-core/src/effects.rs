#![forbid(unsafe_code)]

//! Small presentational effects: card hover lift, button ripple, timeline
//! reveal styles and the hero title typewriter.

use crate::dom::Rect;

/// Card transform while hovered.
pub const HOVER_LIFT: &str = "translateY(-10px) scale(1.02)";
/// Card transform at rest.
pub const HOVER_REST: &str = "translateY(0) scale(1)";

/// Timeline item styles applied at init (hidden, shifted down).
pub const TIMELINE_HIDDEN: [(&str, &str); 3] = [
    ("opacity", "0"),
    ("transform", "translateY(50px)"),
    ("transition", "all 0.6s ease"),
];
/// Timeline item styles applied on reveal.
pub const TIMELINE_SHOWN: [(&str, &str); 2] = [("opacity", "1"), ("transform", "translateY(0)")];

/// Square ripple placed so its centre sits under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RippleGeometry {
    pub size: f64,
    pub left: f64,
    pub top: f64,
}

impl RippleGeometry {
    /// Inline `(property, value)` pairs for the ripple `<span>`.
    #[must_use]
    pub fn styles(&self) -> [(&'static str, String); 4] {
        [
            ("width", px(self.size)),
            ("height", px(self.size)),
            ("left", px(self.left)),
            ("top", px(self.top)),
        ]
    }
}

/// Ripple for a click at `(client_x, client_y)` on a button occupying `rect`.
#[must_use]
pub fn ripple_geometry(rect: Rect, client_x: f64, client_y: f64) -> RippleGeometry {
    let size = rect.width.max(rect.height);
    RippleGeometry {
        size,
        left: client_x - rect.left - size / 2.0,
        top: client_y - rect.top - size / 2.0,
    }
}

fn px(v: f64) -> String {
    format!("{v}px")
}

/// Reveals a string one character at a time.
///
/// Typing works on plain text, so inline markup (`<br>`, accent spans) is not
/// visible while the title types. The engine puts the title's original markup
/// back once the last character is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typewriter {
    chars: Vec<char>,
    shown: usize,
}

impl Typewriter {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            shown: 0,
        }
    }

    /// Reveal one more character and return the visible prefix, or `None`
    /// once the whole text is visible.
    pub fn advance(&mut self) -> Option<String> {
        if self.is_done() {
            return None;
        }
        self.shown += 1;
        Some(self.chars[..self.shown].iter().collect())
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.shown >= self.chars.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}
