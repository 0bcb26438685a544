//! In-memory expiry tracking for depleted activity sites.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::game::types::ActivityKind;

/// Per-player map of activity kind to cooldown expiry. Entries are created
/// when a grid is fully depleted and dropped the first time they are
/// consulted after expiry.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    entries: HashMap<ActivityKind, Instant>,
}

impl CooldownTracker {
    pub fn start(&mut self, kind: ActivityKind, duration: Duration) {
        self.entries.insert(kind, Instant::now() + duration);
    }

    /// Time left before this kind reopens, or `None` when not on cooldown.
    /// Expired entries are removed on the way out.
    pub fn remaining(&mut self, kind: ActivityKind) -> Option<Duration> {
        match self.entries.get(&kind) {
            Some(expiry) => {
                let now = Instant::now();
                if *expiry <= now {
                    self.entries.remove(&kind);
                    None
                } else {
                    Some(*expiry - now)
                }
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cooldown_expires_after_its_duration() {
        let mut tracker = CooldownTracker::default();
        tracker.start(ActivityKind::Mining, Duration::from_secs(60));

        let left = tracker.remaining(ActivityKind::Mining).expect("active");
        assert!(left <= Duration::from_secs(60));
        assert!(left > Duration::from_secs(59));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(tracker.remaining(ActivityKind::Mining).is_none());
        // The expired entry is gone, not just masked.
        assert!(tracker.entries.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn kinds_are_tracked_independently() {
        let mut tracker = CooldownTracker::default();
        tracker.start(ActivityKind::Mining, Duration::from_secs(60));
        assert!(tracker.remaining(ActivityKind::Hunting).is_none());
        assert!(tracker.remaining(ActivityKind::Mining).is_some());
    }
}
