//! Cooperative preemption budget
//!
//! Long scans (event-queue drains, full PDU scans, gateway group walks) run
//! inside a critical section. A [`PreemptionBudget`] counts iterations and,
//! when the budget is spent, releases the lock for a moment so pending
//! interrupts can run. Worst-case lock hold time is then bounded by the budget,
//! not by the table size.
//!
//! One budget per scheduling context; it is reset at the start of every task
//! invocation.

use parking_lot::MutexGuard;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct PreemptionBudget {
    threshold: u16,
    remaining: u16,
    yields: u32,
}

impl PreemptionBudget {
    /// Budget releasing the lock every `threshold` iterations.
    ///
    /// A threshold of 0 never releases.
    pub fn new(threshold: u16) -> Self {
        Self {
            threshold,
            remaining: threshold,
            yields: 0,
        }
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Refill the budget and clear the yield count
    pub fn reset(&mut self) {
        self.remaining = self.threshold;
        self.yields = 0;
    }

    /// Count one iteration. Returns true when the budget is spent and the
    /// caller must release and reacquire its lock.
    pub fn decrement_and_check(&mut self) -> bool {
        if self.threshold == 0 {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }

    /// Count one iteration; when the budget is spent, run `flush` with the
    /// lock released, reacquire it and refill the budget.
    ///
    /// The guard is valid again when this returns, but state read before the
    /// call may have changed. Returns whether the lock was released.
    pub fn checkpoint<T>(&mut self, guard: &mut MutexGuard<'_, T>, flush: impl FnOnce()) -> bool {
        if !self.decrement_and_check() {
            return false;
        }
        MutexGuard::unlocked(guard, flush);
        self.remaining = self.threshold;
        self.yields += 1;
        trace!(yields = self.yields, "budget spent, lock released");
        true
    }

    /// Lock releases since the last reset
    pub fn yields(&self) -> u32 {
        self.yields
    }
}
