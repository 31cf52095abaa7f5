//! Retrigger debounce for the user button.
//!
//! Each raw edge restarts the settle window, so a logical press fires only
//! after the line has been quiet for the full window. This collapses any
//! burst of contact bounce into at most one press.

/// Settle window between the last raw edge and the logical press.
pub const SETTLE_WINDOW_MS: u64 = 15;

#[derive(Debug)]
pub struct RetriggerDebounce {
    window_ms: u64,
    deadline_ms: Option<u64>,
}

impl RetriggerDebounce {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            deadline_ms: None,
        }
    }

    /// Record a raw edge at `now_ms`. Restarts the settle window; any press
    /// pending from earlier edges is superseded.
    pub fn on_edge(&mut self, now_ms: u64) {
        self.deadline_ms = Some(now_ms + self.window_ms);
    }

    /// Milliseconds left until the pending press fires, or `None` when no
    /// press is pending. Zero means the press is due.
    pub fn time_to_fire(&self, now_ms: u64) -> Option<u64> {
        self.deadline_ms.map(|d| d.saturating_sub(now_ms))
    }

    /// Fire the pending press if the settle window has elapsed. Returns
    /// `true` at most once per quiescent window.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn single_edge_fires_after_window() {
        let mut db = RetriggerDebounce::new(SETTLE_WINDOW_MS);
        db.on_edge(0);
        assert!(!db.fire(14));
        assert!(db.fire(15));
    }

    #[test]
    fn fires_at_most_once_per_window() {
        let mut db = RetriggerDebounce::new(SETTLE_WINDOW_MS);
        db.on_edge(0);
        assert!(db.fire(20));
        assert!(!db.fire(40));
        assert_eq!(db.time_to_fire(40), None);
    }

    #[test]
    fn bounce_burst_collapses_to_one_press() {
        let mut db = RetriggerDebounce::new(SETTLE_WINDOW_MS);
        let mut presses = 0;
        for t in [0u64, 2, 5, 9, 12, 14] {
            db.on_edge(t);
            if db.fire(t) {
                presses += 1;
            }
        }
        // Quiescence starts at the last edge; the press fires once after it.
        assert_eq!(presses, 0);
        assert!(db.fire(14 + SETTLE_WINDOW_MS));
        assert!(!db.fire(14 + 2 * SETTLE_WINDOW_MS));
    }

    #[test]
    fn late_edge_supersedes_pending_press() {
        let mut db = RetriggerDebounce::new(SETTLE_WINDOW_MS);
        db.on_edge(0);
        db.on_edge(10);
        // Deadline moved to 25; the original deadline at 15 must not fire.
        assert!(!db.fire(15));
        assert_eq!(db.time_to_fire(15), Some(10));
        assert!(db.fire(25));
    }

    #[test]
    fn separate_presses_fire_separately() {
        let mut db = RetriggerDebounce::new(SETTLE_WINDOW_MS);
        db.on_edge(0);
        assert!(db.fire(15));
        db.on_edge(100);
        assert!(db.fire(115));
    }

    proptest! {
        /// Any burst of edges inside one settle window yields exactly one
        /// press, and only after the window closes behind the last edge.
        #[test]
        fn burst_within_window_yields_one_press(
            mut offsets in prop::collection::vec(0u64..SETTLE_WINDOW_MS, 1..32)
        ) {
            offsets.sort_unstable();
            let mut db = RetriggerDebounce::new(SETTLE_WINDOW_MS);
            let mut fired = 0;
            for &t in &offsets {
                db.on_edge(t);
                if db.fire(t) {
                    fired += 1;
                }
            }
            prop_assert_eq!(fired, 0);

            let last = *offsets.last().unwrap();
            prop_assert!(!db.fire(last + SETTLE_WINDOW_MS - 1));
            prop_assert!(db.fire(last + SETTLE_WINDOW_MS));
            prop_assert!(!db.fire(last + 10 * SETTLE_WINDOW_MS));
        }
    }
}
