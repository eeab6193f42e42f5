//! Latest-frame cache
//!
//! Holds the most recent encoded frame for both variants. The producer is
//! the only writer; both variants are published inside one critical section
//! so readers can never observe a real frame from one iteration paired with
//! a mask from another.

use std::sync::Mutex;

use bytes::Bytes;

use super::handle::StreamVariant;

/// Both encoded variants of one producer iteration
#[derive(Debug, Clone)]
pub struct FramePair {
    /// Raw camera frame, JPEG-encoded
    pub real: Bytes,
    /// Foreground mask, JPEG-encoded
    pub virt: Bytes,
    /// Producer iteration counter, strictly increasing per publish
    pub seq: u64,
}

impl FramePair {
    /// The encoded bytes for one variant
    pub fn variant(&self, variant: StreamVariant) -> &Bytes {
        match variant {
            StreamVariant::Real => &self.real,
            StreamVariant::Virtual => &self.virt,
        }
    }
}

/// Most-recently-published frame pair, `None` until the first publish
#[derive(Debug, Default)]
pub struct FrameCache {
    latest: Mutex<Option<FramePair>>,
}

impl FrameCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish both variants of one iteration atomically
    ///
    /// Returns the sequence number assigned to the pair.
    pub fn publish(&self, real: Bytes, virt: Bytes) -> u64 {
        let mut latest = self.latest.lock().unwrap();
        let seq = latest.as_ref().map(|p| p.seq + 1).unwrap_or(0);
        *latest = Some(FramePair { real, virt, seq });
        seq
    }

    /// Latest encoded frame for one variant, if any iteration has completed
    pub fn snapshot(&self, variant: StreamVariant) -> Option<Bytes> {
        self.latest
            .lock()
            .unwrap()
            .as_ref()
            .map(|pair| pair.variant(variant).clone())
    }

    /// Latest full pair, if any
    pub fn latest_pair(&self) -> Option<FramePair> {
        self.latest.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_empty_cache_is_absent() {
        let cache = FrameCache::new();

        assert!(cache.snapshot(StreamVariant::Real).is_none());
        assert!(cache.snapshot(StreamVariant::Virtual).is_none());
        assert!(cache.latest_pair().is_none());
    }

    #[test]
    fn test_publish_and_snapshot() {
        let cache = FrameCache::new();
        cache.publish(Bytes::from_static(b"real"), Bytes::from_static(b"virt"));

        assert_eq!(
            cache.snapshot(StreamVariant::Real).unwrap(),
            Bytes::from_static(b"real")
        );
        assert_eq!(
            cache.snapshot(StreamVariant::Virtual).unwrap(),
            Bytes::from_static(b"virt")
        );
    }

    #[test]
    fn test_seq_increases_per_publish() {
        let cache = FrameCache::new();

        assert_eq!(cache.publish(Bytes::new(), Bytes::new()), 0);
        assert_eq!(cache.publish(Bytes::new(), Bytes::new()), 1);
        assert_eq!(cache.publish(Bytes::new(), Bytes::new()), 2);
    }

    #[test]
    fn test_readers_never_observe_torn_pairs() {
        let cache = Arc::new(FrameCache::new());

        // Writer tags both variants of each iteration with the same payload.
        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0u64..2000 {
                    let tag = Bytes::from(i.to_be_bytes().to_vec());
                    cache.publish(tag.clone(), tag);
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..2000 {
                        if let Some(pair) = cache.latest_pair() {
                            assert_eq!(pair.real, pair.virt, "torn pair at seq {}", pair.seq);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
