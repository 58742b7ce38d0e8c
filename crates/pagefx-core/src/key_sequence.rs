#![forbid(unsafe_code)]

//! Fixed key-sequence detection (the page's hidden easter egg).
//!
//! The matcher keeps a sliding window of the last `N` key codes, where `N` is
//! the length of the target sequence, and compares the whole window after
//! every key. There is no partial-match state.
//!
//! The window keeps sliding after a match. Two back-to-back sequences
//! therefore match twice, and a sequence that overlaps itself can match again
//! before `N` more keys arrive.

use std::collections::VecDeque;

/// Up, Up, Down, Down, Left, Right, Left, Right, B, A.
pub const KONAMI: [&str; 10] = [
    "ArrowUp",
    "ArrowUp",
    "ArrowDown",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
    "ArrowLeft",
    "ArrowRight",
    "KeyB",
    "KeyA",
];

/// Sliding-window matcher over physical key codes.
#[derive(Debug, Clone)]
pub struct KeySequenceMatcher {
    target: Vec<String>,
    window: VecDeque<String>,
}

impl KeySequenceMatcher {
    #[must_use]
    pub fn new<I, S>(target: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let target: Vec<String> = target.into_iter().map(Into::into).collect();
        let window = VecDeque::with_capacity(target.len());
        Self { target, window }
    }

    #[must_use]
    pub fn konami() -> Self {
        Self::new(KONAMI)
    }

    /// Number of codes currently buffered; never more than the target length.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.window.len()
    }

    /// Push one key code; `true` when the window now equals the target.
    pub fn feed(&mut self, code: &str) -> bool {
        let n = self.target.len();
        if n == 0 {
            return false;
        }
        if self.window.len() == n {
            self.window.pop_front();
        }
        self.window.push_back(code.to_owned());
        self.window.len() == n && self.window.iter().eq(self.target.iter())
    }
}

impl Default for KeySequenceMatcher {
    fn default() -> Self {
        Self::konami()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn feed_all(m: &mut KeySequenceMatcher, codes: &[&str]) -> usize {
        codes.iter().filter(|c| m.feed(c)).count()
    }

    #[test]
    fn exact_sequence_matches_once() {
        let mut m = KeySequenceMatcher::konami();
        assert_eq!(feed_all(&mut m, &KONAMI), 1);
        assert_eq!(m.buffered(), 10);
    }

    #[test]
    fn one_wrong_code_never_matches() {
        let mut m = KeySequenceMatcher::konami();
        let mut codes = KONAMI;
        codes[8] = "KeyA";
        assert_eq!(feed_all(&mut m, &codes), 0);
    }

    #[test]
    fn noise_before_the_sequence_is_ignored() {
        let mut m = KeySequenceMatcher::konami();
        assert_eq!(feed_all(&mut m, &["KeyX", "ArrowUp", "Enter"]), 0);
        assert_eq!(feed_all(&mut m, &KONAMI), 1);
    }

    #[test]
    fn back_to_back_sequences_match_twice() {
        let mut m = KeySequenceMatcher::konami();
        let twice: Vec<&str> = KONAMI.iter().chain(KONAMI.iter()).copied().collect();
        assert_eq!(feed_all(&mut m, &twice), 2);
    }

    #[test]
    fn window_is_bounded() {
        let mut m = KeySequenceMatcher::new(["a", "b"]);
        for _ in 0..50 {
            m.feed("z");
        }
        assert_eq!(m.buffered(), 2);
    }

    #[test]
    fn empty_target_never_matches() {
        let mut m = KeySequenceMatcher::new(Vec::<String>::new());
        assert!(!m.feed("KeyA"));
        assert_eq!(m.buffered(), 0);
    }
}
