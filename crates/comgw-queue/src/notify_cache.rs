//! Bounded notification cache
//!
//! Collects notification ids while a critical section is held so that the
//! callbacks can run after it is released. The cache borrows its storage from
//! the caller, which lets the immediate receive path keep it on the stack.
//!
//! A caller that sees [`NotifyCache::push`] fail must fire the rejected value
//! and everything cached ([`NotifyCache::flush`]) before pushing again. Every
//! notification then fires exactly once; order is FIFO within one fill of the
//! cache.

/// Cache of pending notifications over a borrowed backing slice
#[derive(Debug)]
pub struct NotifyCache<'a, T: Copy> {
    backing: &'a mut [T],
    size: usize,
    write: usize,
    read: usize,
    overflowed: bool,
}

impl<'a, T: Copy> NotifyCache<'a, T> {
    /// Cache using the first `logical_size` entries of `backing`.
    ///
    /// A size of 0 disables caching: every push overflows.
    pub fn new(backing: &'a mut [T], logical_size: usize) -> Self {
        let size = logical_size.min(backing.len());
        Self {
            backing,
            size,
            write: 0,
            read: 0,
            overflowed: false,
        }
    }

    /// Cache `value`. Returns false and sets the overflow flag if no slot is
    /// left; the value is not stored in that case.
    pub fn push(&mut self, value: T) -> bool {
        if self.write >= self.size {
            self.overflowed = true;
            return false;
        }
        self.backing[self.write] = value;
        self.write += 1;
        true
    }

    /// True once a push was rejected since the last reset
    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn is_empty(&self) -> bool {
        self.read >= self.write
    }

    /// Next cached value in push order
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.backing[self.read];
        self.read += 1;
        Some(value)
    }

    pub fn reset_read_cursor(&mut self) {
        self.read = 0;
    }

    /// True once a drain has read `logical_size` entries
    pub fn is_read_threshold_reached(&self) -> bool {
        self.read >= self.size
    }

    /// Forget all cached values and clear the overflow flag
    pub fn reset(&mut self) {
        self.write = 0;
        self.read = 0;
        self.overflowed = false;
    }

    /// Hand every cached value to `fire`, then `current` if given, and reset.
    ///
    /// At most `logical_size` cached values are read, so values pushed from
    /// inside `fire` cannot extend the drain.
    pub fn flush(&mut self, current: Option<T>, mut fire: impl FnMut(T)) -> usize {
        let mut fired = 0;
        self.reset_read_cursor();
        while !self.is_read_threshold_reached() {
            let Some(value) = self.pop() else { break };
            fire(value);
            fired += 1;
        }
        if let Some(value) = current {
            fire(value);
            fired += 1;
        }
        self.reset();
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overflow_then_drain() {
        let mut backing = [0u32; 3];
        let mut cache = NotifyCache::new(&mut backing, 3);

        let mut rejected = None;
        for value in [10, 20, 30, 40] {
            if !cache.push(value) {
                rejected = Some(value);
            }
        }
        assert!(cache.is_overflowed());
        assert_eq!(rejected, Some(40));

        let mut fired = Vec::new();
        let count = cache.flush(rejected, |v| fired.push(v));
        assert_eq!(count, 4);
        assert_eq!(fired, vec![10, 20, 30, 40]);
        assert!(cache.is_empty());
        assert!(!cache.is_overflowed());
    }

    #[test]
    fn test_zero_size_disables_caching() {
        let mut backing = [0u8; 4];
        let mut cache = NotifyCache::new(&mut backing, 0);
        assert!(!cache.push(1));
        assert!(cache.is_overflowed());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_size_clamped_to_backing() {
        let mut backing = [0u8; 2];
        let mut cache = NotifyCache::new(&mut backing, 10);
        assert!(cache.push(1));
        assert!(cache.push(2));
        assert!(!cache.push(3));
        assert!(cache.is_overflowed());
    }

    #[test]
    fn test_pop_in_push_order() {
        let mut backing = [0u8; 4];
        let mut cache = NotifyCache::new(&mut backing, 4);
        cache.push(1);
        cache.push(2);
        assert_eq!(cache.pop(), Some(1));
        assert_eq!(cache.pop(), Some(2));
        assert_eq!(cache.pop(), None);

        cache.reset_read_cursor();
        assert_eq!(cache.pop(), Some(1));
    }

    #[test]
    fn test_read_threshold_bounds_drain() {
        let mut backing = [0u8; 2];
        let mut cache = NotifyCache::new(&mut backing, 2);
        cache.push(1);
        cache.push(2);
        assert!(!cache.is_read_threshold_reached());
        cache.pop();
        cache.pop();
        assert!(cache.is_read_threshold_reached());
    }

    #[test]
    fn test_flush_empty_cache() {
        let mut backing = [0u8; 2];
        let mut cache = NotifyCache::new(&mut backing, 2);
        let mut fired = Vec::new();
        assert_eq!(cache.flush(None, |v| fired.push(v)), 0);
        assert!(fired.is_empty());
    }
}
