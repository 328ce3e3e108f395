//! Fixed-capacity channel allocator.

use crate::sound::ChannelId;
use std::collections::BTreeSet;

/// Hands out channel identifiers from an inclusive `[min, max]` range.
///
/// Reservation always yields the lowest free identifier, so allocation order
/// is reproducible. Running out is an expected condition under heavy emitter
/// activity and is reported as `None`, never as a panic.
#[derive(Debug, Clone)]
pub struct ChannelPool {
    min: ChannelId,
    max: ChannelId,
    free: BTreeSet<ChannelId>,
}

impl ChannelPool {
    /// Creates a pool with every identifier in `[min, max]` free.
    pub fn new(min: ChannelId, max: ChannelId) -> Self {
        let free = (min.get()..=max.get()).map(ChannelId::new).collect();
        Self { min, max, free }
    }

    /// Removes and returns the lowest free identifier.
    pub fn reserve(&mut self) -> Option<ChannelId> {
        self.free.pop_first()
    }

    /// Returns `id` to the free set.
    ///
    /// Identifiers outside the pool's range are ignored, and releasing an
    /// identifier that is already free leaves the free set unchanged.
    pub fn release(&mut self, id: ChannelId) {
        if !self.contains(id) {
            log::debug!("Ignoring release of {} outside pool range", id);
            return;
        }
        if !self.free.insert(id) {
            log::trace!("{} released while already free", id);
        }
    }

    /// True if `id` belongs to this pool's range.
    pub fn contains(&self, id: ChannelId) -> bool {
        self.min <= id && id <= self.max
    }

    /// True if `id` is in range and currently handed out.
    pub fn is_reserved(&self, id: ChannelId) -> bool {
        self.contains(id) && !self.free.contains(&id)
    }

    pub fn capacity(&self) -> usize {
        (self.max.get() as usize + 1).saturating_sub(self.min.get() as usize)
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn reserved(&self) -> usize {
        self.capacity() - self.available()
    }

    pub fn is_exhausted(&self) -> bool {
        self.free.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_pool() -> ChannelPool {
        ChannelPool::new(ChannelId::new(1), ChannelId::new(512))
    }

    #[test]
    fn test_reserve_lowest_first() {
        let mut pool = default_pool();
        assert_eq!(pool.reserve(), Some(ChannelId::new(1)));
        assert_eq!(pool.reserve(), Some(ChannelId::new(2)));

        pool.release(ChannelId::new(1));
        assert_eq!(pool.reserve(), Some(ChannelId::new(1)));
        assert_eq!(pool.reserve(), Some(ChannelId::new(3)));
    }

    #[test]
    fn test_exhaustion_and_recovery() {
        let mut pool = default_pool();
        for expected in 1..=512u16 {
            assert_eq!(pool.reserve(), Some(ChannelId::new(expected)));
        }
        assert!(pool.is_exhausted());
        assert_eq!(pool.reserve(), None);

        pool.release(ChannelId::new(200));
        assert_eq!(pool.reserve(), Some(ChannelId::new(200)));
        assert_eq!(pool.reserve(), None);
    }

    #[test]
    fn test_bogus_releases_do_not_corrupt_free_set() {
        let mut pool = ChannelPool::new(ChannelId::new(1), ChannelId::new(4));
        pool.release(ChannelId::new(0));
        pool.release(ChannelId::new(5));
        pool.release(ChannelId::new(2));
        assert_eq!(pool.available(), 4);

        let first = pool.reserve().unwrap();
        pool.release(first);
        pool.release(first);
        assert_eq!(pool.available(), 4);
        assert_eq!(pool.reserved(), 0);
    }

    #[test]
    fn test_reservations_stay_in_range_and_unique() {
        let mut pool = ChannelPool::new(ChannelId::new(10), ChannelId::new(20));
        let mut live = Vec::new();

        for step in 0..200u32 {
            if step % 3 == 2 && !live.is_empty() {
                let id = live.remove((step as usize * 7) % live.len());
                pool.release(id);
            } else if let Some(id) = pool.reserve() {
                assert!(pool.contains(id));
                assert!(!live.contains(&id));
                live.push(id);
            }
            assert_eq!(pool.reserved(), live.len());
            assert!(live.iter().all(|id| pool.is_reserved(*id)));
        }
    }
}
