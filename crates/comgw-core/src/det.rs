//! Development and runtime error reporting
//!
//! Errors on the interrupt and task entry points are never returned as
//! `Err` or panics. They are reported through a [`DetReporter`] and the
//! operation continues with a safe default.

use std::sync::Arc;

use tracing::warn;

/// Entry point that detected an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiId {
    Init,
    RxIndication,
    MainFunctionRx,
    MainFunctionGateway,
    GatewayRoute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetErrorCode {
    /// PDU handle outside the receive table
    ParamPduId,
    /// Main function id outside its table
    ParamMainFunction,
    /// Partition id outside its table
    ParamPartition,
    /// Description-group index outside its table
    ParamGroup,
    /// Main function entered while already running
    Reentrant,
    /// Event queue returned a handle outside the table
    QueueHandleOutOfRange,
    /// Cross-partition queue had no room for a frame
    CrossPartitionOverflow,
    /// Cross-partition queue held an unreadable frame
    CorruptFrame,
    /// Gateway bit copy failed
    CopyFailed,
}

/// Sink for error reports
pub trait DetReporter: Send + Sync {
    /// Configuration-impossible condition (only reported with runtime checks on)
    fn report_error(&self, api: ApiId, code: DetErrorCode);

    /// Resource exhaustion or copy failure (always reported)
    fn report_runtime_error(&self, api: ApiId, code: DetErrorCode) {
        self.report_error(api, code);
    }
}

/// Reporter that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDet;

impl DetReporter for TracingDet {
    fn report_error(&self, api: ApiId, code: DetErrorCode) {
        warn!(?api, ?code, "development error");
    }

    fn report_runtime_error(&self, api: ApiId, code: DetErrorCode) {
        warn!(?api, ?code, "runtime error");
    }
}

/// Reporter handle shared by the dispatcher and the gateway
#[derive(Clone)]
pub struct Det {
    reporter: Arc<dyn DetReporter>,
    runtime_checks: bool,
}

impl Det {
    pub fn new(reporter: Arc<dyn DetReporter>, runtime_checks: bool) -> Self {
        Self {
            reporter,
            runtime_checks,
        }
    }

    /// Log-only reporter
    pub fn tracing(runtime_checks: bool) -> Self {
        Self::new(Arc::new(TracingDet), runtime_checks)
    }

    pub fn runtime_checks(&self) -> bool {
        self.runtime_checks
    }

    /// Report a development error if runtime checks are enabled
    pub fn development(&self, api: ApiId, code: DetErrorCode) {
        if self.runtime_checks {
            self.reporter.report_error(api, code);
        }
    }

    /// Report a runtime error
    pub fn runtime(&self, api: ApiId, code: DetErrorCode) {
        self.reporter.report_runtime_error(api, code);
    }
}

impl std::fmt::Debug for Det {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Det")
            .field("runtime_checks", &self.runtime_checks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingDet;

    #[test]
    fn test_development_errors_need_runtime_checks() {
        let recorder = Arc::new(RecordingDet::default());

        let det = Det::new(recorder.clone(), false);
        det.development(ApiId::RxIndication, DetErrorCode::ParamPduId);
        assert!(recorder.reports().is_empty());

        let det = Det::new(recorder.clone(), true);
        det.development(ApiId::RxIndication, DetErrorCode::ParamPduId);
        assert_eq!(recorder.count(DetErrorCode::ParamPduId), 1);
    }

    #[test]
    fn test_runtime_errors_always_reported() {
        let recorder = Arc::new(RecordingDet::default());
        let det = Det::new(recorder.clone(), false);
        det.runtime(ApiId::GatewayRoute, DetErrorCode::CrossPartitionOverflow);

        let reports = recorder.reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].runtime);
        assert_eq!(reports[0].api, ApiId::GatewayRoute);
    }
}
