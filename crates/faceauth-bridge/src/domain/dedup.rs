//! Redelivery filter: remembers recent `requestId`s for a bounded time.
//!
//! The broker may deliver the same request more than once (QoS 1).  A
//! request id seen within the TTL is a duplicate.  The set is bounded: when
//! full, the oldest id is forgotten early.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RecentRequests {
    ttl: Duration,
    capacity: usize,
    order: VecDeque<(String, Instant)>,
    ids: HashSet<String>,
}

impl RecentRequests {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ttl,
            capacity,
            order: VecDeque::with_capacity(capacity),
            ids: HashSet::with_capacity(capacity),
        }
    }

    /// Records `request_id` as seen at `now`.
    ///
    /// Returns `false` if it was already seen within the TTL.
    pub fn insert(&mut self, request_id: &str, now: Instant) -> bool {
        self.evict_expired(now);
        if self.ids.contains(request_id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some((oldest, _)) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        self.order.push_back((request_id.to_string(), now));
        self.ids.insert(request_id.to_string());
        true
    }

    /// Whether `request_id` was recorded within the TTL, without recording it.
    pub fn contains(&mut self, request_id: &str, now: Instant) -> bool {
        self.evict_expired(now);
        self.ids.contains(request_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn evict_expired(&mut self, now: Instant) {
        while let Some((id, seen_at)) = self.order.front() {
            if now.saturating_duration_since(*seen_at) < self.ttl {
                break;
            }
            self.ids.remove(id);
            self.order.pop_front();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_within_ttl_is_rejected() {
        // Arrange
        let mut recent = RecentRequests::new(Duration::from_secs(60), 8);
        let t0 = Instant::now();

        // Act / Assert
        assert!(recent.insert("req-1", t0));
        assert!(!recent.insert("req-1", t0 + Duration::from_secs(30)));
        assert!(recent.insert("req-2", t0 + Duration::from_secs(30)));
    }

    #[test]
    fn test_id_is_accepted_again_after_ttl() {
        let mut recent = RecentRequests::new(Duration::from_secs(60), 8);
        let t0 = Instant::now();

        recent.insert("req-1", t0);

        assert!(recent.insert("req-1", t0 + Duration::from_secs(61)));
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn test_capacity_forgets_oldest_first() {
        let mut recent = RecentRequests::new(Duration::from_secs(60), 2);
        let t0 = Instant::now();

        recent.insert("a", t0);
        recent.insert("b", t0);
        recent.insert("c", t0);

        assert_eq!(recent.len(), 2);
        assert!(recent.insert("a", t0), "a was evicted by capacity");
        assert!(!recent.insert("c", t0));
    }

    #[test]
    fn test_contains_does_not_record() {
        let mut recent = RecentRequests::new(Duration::from_secs(60), 8);
        let t0 = Instant::now();

        assert!(!recent.contains("req-1", t0));
        assert!(recent.is_empty());
        assert!(recent.insert("req-1", t0));
        assert!(recent.contains("req-1", t0 + Duration::from_secs(1)));
        assert!(!recent.contains("req-1", t0 + Duration::from_secs(61)));
    }
}
