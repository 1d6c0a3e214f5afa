//! Bounded circular event queue
//!
//! Remembers *which* PDUs arrived so the periodic task does not have to scan
//! the whole table. One slot is always left unused so that `read == write`
//! means empty and `write + 1 == read` means full without a separate counter.
//!
//! The queue performs no locking; callers hold their own critical section.

use crate::error::QueueError;

/// Circular FIFO of small integer handles
#[derive(Debug, Clone)]
pub struct BoundedRingQueue {
    slots: Box<[u16]>,
    read: usize,
    write: usize,
    /// Handles must be below this value (size of the served table)
    handle_limit: u16,
}

impl BoundedRingQueue {
    /// Queue holding up to `capacity` handles, each below `handle_limit`
    pub fn new(capacity: usize, handle_limit: u16) -> Self {
        Self {
            slots: vec![0; capacity + 1].into_boxed_slice(),
            read: 0,
            write: 0,
            handle_limit,
        }
    }

    /// Maximum number of resident handles
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// Upper bound on reads in one drain
    pub fn read_limit(&self) -> usize {
        self.capacity()
    }

    pub fn len(&self) -> usize {
        (self.write + self.slots.len() - self.read) % self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    pub fn is_full(&self) -> bool {
        self.next(self.write) == self.read
    }

    /// Append a handle
    pub fn put(&mut self, handle: u16) -> Result<(), QueueError> {
        let next = self.next(self.write);
        if next == self.read {
            return Err(QueueError::Full);
        }
        self.slots[self.write] = handle;
        self.write = next;
        Ok(())
    }

    /// Remove the oldest handle.
    ///
    /// A handle outside the served table is consumed and reported as an error.
    pub fn get(&mut self) -> Result<Option<u16>, QueueError> {
        if self.is_empty() {
            return Ok(None);
        }
        let handle = self.slots[self.read];
        self.read = self.next(self.read);
        if handle >= self.handle_limit {
            return Err(QueueError::HandleOutOfRange {
                handle,
                limit: self.handle_limit,
            });
        }
        Ok(Some(handle))
    }

    /// Discard every pending handle
    pub fn flush(&mut self) {
        self.read = self.write;
    }

    fn next(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.slots.len() {
            0
        } else {
            next
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    const A: u16 = 1;
    const B: u16 = 2;
    const C: u16 = 3;
    const D: u16 = 4;
    const E: u16 = 5;

    #[test]
    fn test_capacity_four() {
        let mut queue = BoundedRingQueue::new(4, 16);
        for handle in [A, B, C, D] {
            assert_eq!(queue.put(handle), Ok(()));
        }
        assert!(queue.is_full());
        assert_eq!(queue.put(E), Err(QueueError::Full));

        let drained: Vec<u16> = (0..4).map(|_| queue.get().unwrap().unwrap()).collect();
        assert_eq!(drained, vec![A, B, C, D]);
        assert_eq!(queue.get(), Ok(None));
    }

    #[test]
    fn test_wraps_around() {
        let mut queue = BoundedRingQueue::new(3, 16);
        for round in 0..10u16 {
            queue.put(round).unwrap();
            queue.put(round + 1).unwrap();
            assert_eq!(queue.get(), Ok(Some(round)));
            assert_eq!(queue.get(), Ok(Some(round + 1)));
            assert!(queue.is_empty());
        }
    }

    #[test]
    fn test_read_limit_matches_capacity() {
        let queue = BoundedRingQueue::new(7, 16);
        assert_eq!(queue.read_limit(), 7);
        assert_eq!(queue.capacity(), 7);
    }

    #[test]
    fn test_zero_capacity_is_always_full() {
        let mut queue = BoundedRingQueue::new(0, 16);
        assert!(queue.is_full());
        assert!(queue.is_empty());
        assert_eq!(queue.put(A), Err(QueueError::Full));
    }

    #[test]
    fn test_flush() {
        let mut queue = BoundedRingQueue::new(4, 16);
        queue.flush();
        assert!(queue.is_empty());
        assert_eq!(queue.get(), Ok(None));

        queue.put(A).unwrap();
        queue.put(B).unwrap();
        assert_eq!(queue.get(), Ok(Some(A)));
        queue.flush();
        // A was already returned, B was discarded: neither comes back
        assert_eq!(queue.get(), Ok(None));
        queue.put(C).unwrap();
        assert_eq!(queue.get(), Ok(Some(C)));
    }

    #[test]
    fn test_handle_out_of_range() {
        let mut queue = BoundedRingQueue::new(4, 3);
        queue.put(7).unwrap();
        queue.put(2).unwrap();
        assert_eq!(
            queue.get(),
            Err(QueueError::HandleOutOfRange {
                handle: 7,
                limit: 3
            })
        );
        assert_eq!(queue.get(), Ok(Some(2)));
    }

    #[test]
    fn test_matches_fifo_model() {
        let mut queue = BoundedRingQueue::new(5, u16::MAX);
        let mut model = VecDeque::new();
        let mut seed = 0x2545_F491u32;
        let mut next_handle = 0u16;

        for _ in 0..2_000 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            if (seed >> 16) & 1 == 0 {
                let result = queue.put(next_handle);
                if model.len() < 5 {
                    assert_eq!(result, Ok(()));
                    model.push_back(next_handle);
                } else {
                    assert_eq!(result, Err(QueueError::Full));
                }
                next_handle = next_handle.wrapping_add(1);
            } else {
                assert_eq!(queue.get().unwrap(), model.pop_front());
            }
            assert!(queue.len() <= 5);
            assert_eq!(queue.len(), model.len());
        }
    }
}
