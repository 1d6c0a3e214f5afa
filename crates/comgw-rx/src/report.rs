//! Receive cycle reporting

/// How a receive main function found its work
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanStrategy {
    /// Invalid id or concurrent invocation; nothing was done
    #[default]
    Skipped,
    /// Drained the event queue
    EventQueue,
    /// Visited every deferred PDU of the main function in table order
    FullScan,
}

/// Outcome of one `main_function_rx` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxCycleReport {
    pub strategy: ScanStrategy,
    /// PDUs whose signals were processed
    pub processed: usize,
    /// Times the lock was released because the budget was spent
    pub yields: u32,
}
