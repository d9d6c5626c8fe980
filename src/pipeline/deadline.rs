//! Upcoming deadline detection.
//!
//! A leaf is reported once, on the first poll at which its deadline lies
//! inside the look-ahead window while the previous observation still saw it
//! outside. The observation time (`last_checked_at`) is refreshed by the
//! source on every fetch, never here.

use chrono::{DateTime, Duration, Utc};

use crate::models::Item;

/// Default look-ahead window.
pub const DEFAULT_WINDOW_HOURS: i64 = 16;

/// Scanner for deadlines newly entering the look-ahead window.
#[derive(Debug, Clone)]
pub struct DeadlineWindow {
    window: Duration,
}

impl DeadlineWindow {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Leaves of `previous` whose deadline has newly entered the window at `now`.
    ///
    /// A leaf without an observation time is never reported: there is no
    /// evidence that its deadline was outside the window before.
    pub fn due_soon(&self, previous: &Item, now: DateTime<Utc>) -> Vec<Item> {
        let threshold = now
            .checked_add_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        previous
            .leaves()
            .into_iter()
            .filter(|leaf| {
                let Some(due) = leaf.deadline.and_then(|d| d.due()) else {
                    return false;
                };
                let Some(last_check) = leaf.last_checked_at else {
                    return false;
                };
                // Unrepresentable means the deadline was never outside the window.
                let Some(outside_until) = last_check.checked_add_signed(self.window) else {
                    return false;
                };
                due >= now && due <= threshold && due > outside_until
            })
            .cloned()
            .collect()
    }
}

impl Default for DeadlineWindow {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_WINDOW_HOURS))
    }
}
