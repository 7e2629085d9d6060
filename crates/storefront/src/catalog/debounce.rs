//! Delay/coalesce policy for rapidly changing inputs such as search text.
//!
//! Only the most recent value pushed is ever released, and only once the
//! input has been idle for the configured interval. Intermediate values are
//! superseded, never queued. Callers pass the current [`Instant`] in, which
//! keeps the policy deterministic and lets a UI drive it from its own tick.

use std::time::{Duration, Instant};

/// Idle interval before a search term is applied to the listing.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    interval: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Record a new value, replacing any value still waiting.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Release the pending value if the input has been idle long enough.
    ///
    /// Returns each value at most once.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let settled = self
            .pending
            .as_ref()
            .is_some_and(|(_, at)| now.saturating_duration_since(*at) >= self.interval);
        if settled {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }

    /// Release the pending value immediately, e.g. when the user presses Enter.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left until the pending value settles, if any.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(_, at)| self.interval.saturating_sub(now.saturating_duration_since(*at)))
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_releases_only_after_idle_interval() {
        let start = Instant::now();
        let mut d = Debouncer::new(SEARCH_DEBOUNCE);
        d.push("s", start);

        assert_eq!(d.poll(start + Duration::from_millis(299)), None);
        assert_eq!(d.poll(start + Duration::from_millis(300)), Some("s"));
        assert_eq!(d.poll(start + Duration::from_millis(900)), None);
    }

    #[test]
    fn test_intermediate_values_are_superseded() {
        let start = Instant::now();
        let mut d = Debouncer::default();
        d.push("s", start);
        d.push("sh", start + Duration::from_millis(100));
        d.push("shirt", start + Duration::from_millis(250));

        // 300ms after the first keystroke but only 50ms after the last
        assert_eq!(d.poll(start + Duration::from_millis(300)), None);
        assert_eq!(
            d.remaining(start + Duration::from_millis(300)),
            Some(Duration::from_millis(250))
        );
        assert_eq!(d.poll(start + Duration::from_millis(550)), Some("shirt"));
        assert!(!d.is_pending());
    }

    #[test]
    fn test_flush_skips_the_wait() {
        let mut d = Debouncer::default();
        d.push(String::from("jeans"), Instant::now());
        assert_eq!(d.flush().as_deref(), Some("jeans"));
        assert_eq!(d.flush(), None);
    }
}
