//! Search box state: the raw term, its debounced value and recent history.

use std::collections::VecDeque;
use std::time::Instant;

use crate::catalog::{Debouncer, SEARCH_DEBOUNCE};

/// Number of recent searches kept.
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug)]
pub struct SearchState {
    term: String,
    debouncer: Debouncer<String>,
    history: VecDeque<String>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            term: String::new(),
            debouncer: Debouncer::new(SEARCH_DEBOUNCE),
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }
}

impl SearchState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The term as typed, which may not have settled yet.
    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Record a keystroke. The listing only sees it once it settles.
    pub fn set_term(&mut self, term: impl Into<String>, now: Instant) {
        self.term = term.into();
        self.debouncer.push(self.term.clone(), now);
    }

    /// Empty the box and drop any pending term. Callers apply the empty
    /// term to the listing right away.
    pub fn clear(&mut self) {
        self.term.clear();
        self.debouncer.flush();
    }

    /// The settled term, once the input has been idle for the debounce interval.
    pub fn poll_settled(&mut self, now: Instant) -> Option<String> {
        self.debouncer.poll(now)
    }

    /// Apply whatever is pending right away (Enter key) and remember it.
    pub fn submit(&mut self) -> String {
        let term = self.debouncer.flush().unwrap_or_else(|| self.term.clone());
        self.add_to_history(&term);
        term
    }

    /// Put `term` at the front of the history. Blank terms are ignored and
    /// an existing identical entry moves to the front.
    pub fn add_to_history(&mut self, term: &str) {
        if term.trim().is_empty() {
            return;
        }
        self.history.retain(|t| t != term);
        self.history.push_front(term.to_string());
        self.history.truncate(HISTORY_LIMIT);
    }

    /// Recent terms, most recent first.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_history_is_most_recent_first_and_deduplicated() {
        let mut search = SearchState::new();
        search.add_to_history("lawn");
        search.add_to_history("kurta");
        search.add_to_history("lawn");
        search.add_to_history("   ");
        assert_eq!(search.history().collect::<Vec<_>>(), vec!["lawn", "kurta"]);
    }

    #[test]
    fn test_history_keeps_ten() {
        let mut search = SearchState::new();
        for i in 0..15 {
            search.add_to_history(&format!("term {i}"));
        }
        let history: Vec<_> = search.history().collect();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0], "term 14");
        assert_eq!(history[9], "term 5");
    }

    #[test]
    fn test_term_settles_after_debounce() {
        let start = Instant::now();
        let mut search = SearchState::new();
        search.set_term("s", start);
        search.set_term("shirt", start + Duration::from_millis(120));

        assert_eq!(search.term(), "shirt");
        assert_eq!(search.poll_settled(start + Duration::from_millis(300)), None);
        assert_eq!(
            search.poll_settled(start + Duration::from_millis(420)).as_deref(),
            Some("shirt")
        );
    }

    #[test]
    fn test_submit_flushes_and_records() {
        let mut search = SearchState::new();
        search.set_term("jeans", Instant::now());
        assert_eq!(search.submit(), "jeans");
        assert_eq!(search.poll_settled(Instant::now()), None);
        assert_eq!(search.history().next(), Some("jeans"));
    }

    #[test]
    fn test_clear_drops_pending_term() {
        let start = Instant::now();
        let mut search = SearchState::new();
        search.set_term("abc", start);
        search.clear();
        assert_eq!(search.term(), "");
        assert_eq!(search.poll_settled(start + Duration::from_secs(1)), None);
    }
}
