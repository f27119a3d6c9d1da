//! Message-layer deduplication (RFC 7252 §4.5)
//!
//! A device that misses our ACK sends the same message again with the same
//! message id. The first copy is handled; later copies within the exchange
//! lifetime get the stored response bytes, so the report is appended once.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Messages are identified by sender and message id
pub type ExchangeKey = (SocketAddr, u16);

/// What to do with an inbound request message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// First copy; handle it and record the response
    New,
    /// First copy is still being handled; drop this one
    InFlight,
    /// Already answered; send these bytes again
    Replay(Vec<u8>),
}

#[derive(Debug)]
enum Exchange {
    InFlight,
    Answered(Vec<u8>),
}

#[derive(Debug)]
struct Entry {
    exchange: Exchange,
    seen: Instant,
}

#[derive(Debug)]
pub struct ExchangeCache {
    entries: HashMap<ExchangeKey, Entry>,
    arrival: VecDeque<(ExchangeKey, Instant)>,
    lifetime: Duration,
    capacity: usize,
}

impl ExchangeCache {
    pub fn new(lifetime: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            arrival: VecDeque::new(),
            lifetime,
            capacity,
        }
    }

    /// Register a message, or report that it is a duplicate
    pub fn admit(&mut self, key: ExchangeKey, now: Instant) -> Admission {
        self.evict(now);

        if let Some(entry) = self.entries.get(&key) {
            return match &entry.exchange {
                Exchange::InFlight => Admission::InFlight,
                Exchange::Answered(bytes) => Admission::Replay(bytes.clone()),
            };
        }

        while self.entries.len() >= self.capacity.max(1) {
            if !self.evict_oldest() {
                break;
            }
        }

        self.entries.insert(
            key,
            Entry {
                exchange: Exchange::InFlight,
                seen: now,
            },
        );
        self.arrival.push_back((key, now));
        Admission::New
    }

    /// Store the response sent for an admitted message
    pub fn complete(&mut self, key: ExchangeKey, response: Vec<u8>) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.exchange = Exchange::Answered(response);
        }
    }

    /// Forget a message that produced no response
    pub fn abandon(&mut self, key: ExchangeKey) {
        self.entries.remove(&key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict(&mut self, now: Instant) {
        while let Some((_, seen)) = self.arrival.front() {
            if now.saturating_duration_since(*seen) < self.lifetime {
                break;
            }
            self.evict_oldest();
        }
    }

    /// Drop the oldest arrival; the queue may hold keys already abandoned
    /// or re-admitted, so only an entry with the same arrival time goes
    fn evict_oldest(&mut self) -> bool {
        let Some((key, seen)) = self.arrival.pop_front() else {
            return false;
        };
        if self.entries.get(&key).is_some_and(|entry| entry.seen == seen) {
            self.entries.remove(&key);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(message_id: u16) -> ExchangeKey {
        ("127.0.0.1:40000".parse().unwrap(), message_id)
    }

    #[test]
    fn test_duplicate_replays_response() {
        let mut cache = ExchangeCache::new(Duration::from_secs(247), 16);
        let now = Instant::now();

        assert_eq!(cache.admit(key(7), now), Admission::New);
        assert_eq!(cache.admit(key(7), now), Admission::InFlight);

        cache.complete(key(7), vec![0x60, 0x45, 0x00, 0x07]);
        assert_eq!(
            cache.admit(key(7), now),
            Admission::Replay(vec![0x60, 0x45, 0x00, 0x07])
        );
    }

    #[test]
    fn test_message_ids_are_per_peer() {
        let mut cache = ExchangeCache::new(Duration::from_secs(247), 16);
        let now = Instant::now();
        let other: ExchangeKey = ("127.0.0.1:40001".parse().unwrap(), 7);

        assert_eq!(cache.admit(key(7), now), Admission::New);
        assert_eq!(cache.admit(other, now), Admission::New);
        assert_eq!(cache.admit(key(8), now), Admission::New);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_entries_expire_after_lifetime() {
        let mut cache = ExchangeCache::new(Duration::from_secs(10), 16);
        let start = Instant::now();

        cache.admit(key(1), start);
        cache.complete(key(1), vec![1]);
        assert_eq!(
            cache.admit(key(1), start + Duration::from_secs(11)),
            Admission::New
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_bounds_entries() {
        let mut cache = ExchangeCache::new(Duration::from_secs(247), 3);
        let now = Instant::now();

        for message_id in 0..10 {
            cache.admit(key(message_id), now);
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.admit(key(9), now), Admission::InFlight);
        assert_eq!(cache.admit(key(0), now), Admission::New);
    }

    #[test]
    fn test_abandoned_message_is_handled_again() {
        let mut cache = ExchangeCache::new(Duration::from_secs(247), 16);
        let now = Instant::now();

        cache.admit(key(3), now);
        cache.abandon(key(3));
        assert!(cache.is_empty());
        assert_eq!(cache.admit(key(3), now), Admission::New);
    }
}
