//! [`Connector`] — the bounded multi-lane queue between two element ports.

use std::time::Duration;

use crate::core::error::{GraphError, Result};
use crate::core::frames::ObjectMetadata;

/// Poll interval used throughout the runtime for non-blocking-poll-plus-sleep
/// loops (Connector draining, PAUSE spinning, blocking pushes). Kept as a
/// single named constant rather than a scattered magic literal so every
/// "≤ one poll interval" latency bound in the spec traces to one place.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A bounded FIFO between one upstream output port and one downstream input
/// port, partitioned into independently-serviced lanes ("data pipes").
///
/// Each lane is a `crossbeam_channel` bounded MPMC queue: the spec's
/// one-producer-one-consumer-per-lane contract is the expected usage
/// pattern, but the channel itself tolerates the multi-producer case that
/// arises when an upstream element runs more than one worker thread, all of
/// which may compute the same outbound lane for different channels.
pub struct Connector {
    lanes: Vec<(
        crossbeam_channel::Sender<ObjectMetadata>,
        crossbeam_channel::Receiver<ObjectMetadata>,
    )>,
    capacity: usize,
}

impl Connector {
    /// Build a connector with `lane_count` independent bounded lanes, each
    /// holding up to `capacity` in-flight frames.
    pub fn new(lane_count: usize, capacity: usize) -> Self {
        assert!(lane_count > 0, "a Connector must have at least one lane");
        let lanes = (0..lane_count)
            .map(|_| crossbeam_channel::bounded(capacity))
            .collect();
        Self { lanes, capacity }
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn capacity(&self, lane: usize) -> usize {
        let _ = lane;
        self.capacity
    }

    /// Deterministic lane assignment from a channel id: keeps a channel
    /// pinned to one downstream worker so per-channel order is preserved.
    pub fn lane_for_channel(&self, channel_id_internal: u64) -> usize {
        (channel_id_internal % self.lanes.len() as u64) as usize
    }

    /// Non-blocking enqueue onto `lane`. Fails with [`GraphError::QueueFull`]
    /// if the lane is at capacity.
    pub fn push(&self, lane: usize, value: ObjectMetadata, port: u32) -> Result<()> {
        let (tx, _) = &self.lanes[lane];
        tx.try_send(value)
            .map_err(|_| GraphError::QueueFull(port, lane))
    }

    /// Blocking enqueue that polls at [`POLL_INTERVAL`], checking
    /// `should_continue` between attempts so the caller's worker can observe
    /// a state transition (e.g. STOP) instead of blocking forever on a
    /// permanently-full downstream.
    pub fn push_blocking(
        &self,
        lane: usize,
        mut value: ObjectMetadata,
        port: u32,
        mut should_continue: impl FnMut() -> bool,
    ) -> Result<()> {
        let tx = &self.lanes[lane].0;
        loop {
            match tx.try_send(value) {
                Ok(()) => return Ok(()),
                Err(crossbeam_channel::TrySendError::Full(returned)) => {
                    if !should_continue() {
                        return Err(GraphError::Timeout(format!(
                            "push to port {port} lane {lane} aborted: element stopping"
                        )));
                    }
                    std::thread::sleep(POLL_INTERVAL);
                    value = returned;
                }
                Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                    return Err(GraphError::Timeout(format!(
                        "push to port {port} lane {lane} failed: connector disconnected"
                    )));
                }
            }
        }
    }

    /// Non-blocking dequeue from `lane`. Returns `None` if the lane is
    /// currently empty.
    pub fn pop(&self, lane: usize) -> Option<ObjectMetadata> {
        let (_, rx) = &self.lanes[lane];
        rx.try_recv().ok()
    }
}
