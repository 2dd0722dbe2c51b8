use slap_core::LATE_SLAP_GRACE_MS;
use slap_core::Millis;
use slap_engine::UserId;

struct ResolvedWindow {
    event_id: String,
    resolved_at: Millis,
    participants: Vec<UserId>,
}

/// Remembers recently resolved slap windows so retransmitted slaps from
/// players who already landed one are dropped instead of routed through
/// the engine, where they would read as false slaps.
#[derive(Default)]
pub struct DedupCache {
    entries: Vec<ResolvedWindow>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event_id: String, resolved_at: Millis, participants: Vec<UserId>) {
        self.entries.push(ResolvedWindow {
            event_id,
            resolved_at,
            participants,
        });
    }

    /// True if this slap is a late duplicate inside the grace period.
    /// Expired entries are pruned as a side effect.
    pub fn is_late_duplicate(&mut self, event_id: &str, user: &UserId, now: Millis) -> bool {
        self.entries
            .retain(|e| now.saturating_sub(e.resolved_at) <= LATE_SLAP_GRACE_MS);
        self.entries
            .iter()
            .any(|e| e.event_id == event_id && e.participants.contains(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::uid;

    #[test]
    fn duplicates_inside_grace_are_dropped() {
        let mut cache = DedupCache::new();
        cache.record("slap-00000001".into(), 1000, vec![uid(1), uid(2)]);
        assert!(cache.is_late_duplicate("slap-00000001", &uid(1), 1100));
        // Non-participants still reach the engine (and its penalty).
        assert!(!cache.is_late_duplicate("slap-00000001", &uid(3), 1100));
        assert!(!cache.is_late_duplicate("slap-00000002", &uid(1), 1100));
    }

    #[test]
    fn entries_expire_after_the_grace_period() {
        let mut cache = DedupCache::new();
        cache.record("slap-00000001".into(), 1000, vec![uid(1)]);
        assert!(!cache.is_late_duplicate("slap-00000001", &uid(1), 1000 + LATE_SLAP_GRACE_MS + 1));
    }
}
