//! Notification sink backed by a [`NotifyCache`]

use comgw_core::{NotificationId, NotificationSink, Notifier};
use comgw_queue::NotifyCache;
use parking_lot::MutexGuard;
use tracing::trace;

/// Caches notifications while `guard` is held.
///
/// When the cache overflows, the lock is released, the rejected id and every
/// cached id are fired, and the lock is taken again before processing
/// continues. Notifications therefore never fire inside the critical section.
pub(crate) struct CachingSink<'a, 'b, 'g, T> {
    cache: &'a mut NotifyCache<'b, NotificationId>,
    guard: &'a mut MutexGuard<'g, T>,
    notifier: &'a dyn Notifier,
}

impl<'a, 'b, 'g, T> CachingSink<'a, 'b, 'g, T> {
    pub(crate) fn new(
        cache: &'a mut NotifyCache<'b, NotificationId>,
        guard: &'a mut MutexGuard<'g, T>,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            cache,
            guard,
            notifier,
        }
    }
}

impl<T> NotificationSink for CachingSink<'_, '_, '_, T> {
    fn push(&mut self, id: NotificationId) {
        if self.cache.push(id) {
            return;
        }
        let cache = &mut *self.cache;
        let notifier = self.notifier;
        MutexGuard::unlocked(self.guard, || {
            let fired = cache.flush(Some(id), |n| notifier.notify(n));
            trace!(fired, "notification cache overflow drained");
        });
    }
}

/// Fire everything still cached. Call with the lock released.
pub(crate) fn drain(cache: &mut NotifyCache<'_, NotificationId>, notifier: &dyn Notifier) -> usize {
    cache.flush(None, |n| notifier.notify(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use comgw_core::testing::RecordingNotifier;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_overflow_fires_unlocked() {
        let lock = Arc::new(Mutex::new(()));
        let locked_while_firing = Arc::new(AtomicBool::new(false));
        let notifier = {
            let lock = lock.clone();
            let flag = locked_while_firing.clone();
            RecordingNotifier::with_hook(move |_| {
                if lock.is_locked() {
                    flag.store(true, Ordering::SeqCst);
                }
            })
        };

        let mut backing = [NotificationId(0); 2];
        let mut cache = NotifyCache::new(&mut backing, 2);
        let mut guard = lock.lock();
        {
            let mut sink = CachingSink::new(&mut cache, &mut guard, &notifier);
            for id in 1..=3 {
                sink.push(NotificationId(id));
            }
            sink.push(NotificationId(4));
        }
        assert_eq!(
            notifier.fired(),
            vec![NotificationId(1), NotificationId(2), NotificationId(3)]
        );
        drop(guard);

        assert_eq!(drain(&mut cache, &notifier), 1);
        assert_eq!(notifier.fired().len(), 4);
        assert!(!locked_while_firing.load(Ordering::SeqCst));
    }
}
