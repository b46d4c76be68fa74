//! Worker thread main loop: one OS thread per data pipe, running
//! `do_work(worker_index)` while the owning element is RUN, spinning
//! without consuming while PAUSE, and exiting on STOP.

use std::sync::Arc;

use parking_lot::Mutex;

use super::base::BaseElement;
use super::state::ThreadStatus;
use super::traits::Element;
use crate::core::bus::POLL_INTERVAL;
use crate::core::observability::{ListenThread, ReportPhase, StatusReport};

/// Spawn the worker thread for data pipe `worker_index` of element `ctx`.
/// Returns the `JoinHandle` on success so the caller (the owning
/// [`crate::core::graph::Graph`]) can join it after setting the element's
/// status to STOP. Returns the OS error on spawn failure so `Graph::start`
/// can revert every element it already started instead of panicking.
pub(crate) fn spawn_worker(
    graph_id: u64,
    element: Arc<Mutex<Box<dyn Element>>>,
    ctx: Arc<BaseElement>,
    worker_index: usize,
    listener: Arc<dyn ListenThread>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name(format!("graphrt-el{}-w{}", ctx.id, worker_index))
        .spawn(move || run_worker_loop(graph_id, element, ctx, worker_index, listener))
}

fn run_worker_loop(
    graph_id: u64,
    element: Arc<Mutex<Box<dyn Element>>>,
    ctx: Arc<BaseElement>,
    worker_index: usize,
    listener: Arc<dyn ListenThread>,
) {
    tracing::info!(
        element_id = ctx.id,
        worker_index,
        "worker thread started"
    );

    loop {
        match ctx.status() {
            ThreadStatus::Stop => break,
            ThreadStatus::Pause | ThreadStatus::Init => {
                std::thread::sleep(POLL_INTERVAL);
            }
            ThreadStatus::Run => {
                let mut guard = element.lock();
                if let Err(e) = guard.do_work(&ctx, worker_index) {
                    tracing::warn!(element_id = ctx.id, worker_index, error = %e, "do_work failed");
                    listener.report_status(StatusReport {
                        graph_id,
                        element_id: Some(ctx.id),
                        phase: ReportPhase::DoWork,
                        kind: Some(e.kind()),
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    tracing::debug!(element_id = ctx.id, worker_index, "worker thread stopped");
}
