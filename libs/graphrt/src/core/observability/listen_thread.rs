//! [`ListenThread`] — the status/error reporting surface consulted by the
//! [`crate::core::runtime::Engine`] during graph bring-up and by worker
//! threads whenever `do_work` fails.

use std::sync::Arc;

use crate::core::error::GraphErrorKind;

/// Which phase of a graph/element's lifecycle produced a [`StatusReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPhase {
    Init,
    Start,
    DoWork,
    Stop,
}

/// One status/error observation surfaced to outer supervision. `do_work`
/// failures are reported but never torn down the graph — see §7 of the
/// spec's error handling design. `kind` is `None` for a success report and
/// `Some(GraphErrorKind)` for a failure, so a caller can branch on the
/// taxonomy discriminant instead of parsing `message`.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub graph_id: u64,
    pub element_id: Option<u64>,
    pub phase: ReportPhase,
    pub kind: Option<GraphErrorKind>,
    pub message: String,
}

/// Callback surface the core consumes: only `report_status`. Embedding
/// applications implement this to wire graph bring-up outcomes and
/// `do_work` failures into their own logging/alerting.
pub trait ListenThread: Send + Sync {
    fn report_status(&self, report: StatusReport);
}

/// Default listener used when the embedding application hasn't configured
/// one: discards every report. `do_work` errors are still logged via
/// `tracing::warn!` regardless of which listener is installed.
pub struct NullListenThread;

impl ListenThread for NullListenThread {
    fn report_status(&self, _report: StatusReport) {}
}

/// Test/dev listener that forwards every report over an unbounded
/// `crossbeam_channel`, so integration tests can assert on bring-up and
/// `do_work` failures without polling a mutable log sink.
pub struct ChannelListenThread {
    tx: crossbeam_channel::Sender<StatusReport>,
}

impl ChannelListenThread {
    pub fn new() -> (Arc<Self>, crossbeam_channel::Receiver<StatusReport>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Arc::new(Self { tx }), rx)
    }
}

impl ListenThread for ChannelListenThread {
    fn report_status(&self, report: StatusReport) {
        let _ = self.tx.send(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_listener_forwards_reports() {
        let (listener, rx) = ChannelListenThread::new();
        listener.report_status(StatusReport {
            graph_id: 1,
            element_id: Some(2),
            phase: ReportPhase::DoWork,
            kind: Some(GraphErrorKind::Unknown),
            message: "boom".into(),
        });
        let report = rx.try_recv().unwrap();
        assert_eq!(report.graph_id, 1);
        assert_eq!(report.element_id, Some(2));
        assert_eq!(report.message, "boom");
    }

    #[test]
    fn null_listener_discards_silently() {
        let listener = NullListenThread;
        listener.report_status(StatusReport {
            graph_id: 1,
            element_id: None,
            phase: ReportPhase::Init,
            kind: None,
            message: "ignored".into(),
        });
    }
}
