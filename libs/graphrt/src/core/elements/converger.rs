//! [`Converger`] — joins a [`super::Distributer`]'s fan-out back into one
//! stream, releasing each frame only once every branch has reported and in
//! strict per-channel input order.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::core::bus::POLL_INTERVAL;
use crate::core::element::{BaseElement, Element, ThreadStatus};
use crate::core::error::{GraphError, Result};
use crate::core::frames::ObjectMetadata;

/// The converger has exactly one output port; `default_port` in its
/// configuration names an *input* port only (spec §4.7).
const OUTPUT_PORT: u32 = 0;

#[derive(Debug, Deserialize)]
struct ConvergerConfig {
    default_port: u32,
}

/// Joins fan-out sub-results per `(channel_id_internal, frame_id)`. See
/// spec §4.7 for the join algorithm and DESIGN.md for the branch-count map
/// leak resolution (erase both maps atomically on emission).
#[derive(Default)]
pub struct Converger {
    default_port: u32,
    candidates: BTreeMap<u64, BTreeMap<u64, ObjectMetadata>>,
    branches: BTreeMap<u64, BTreeMap<u64, u32>>,
}

impl Converger {
    fn pop_any_lane(&self, ctx: &BaseElement, port: u32) -> Option<ObjectMetadata> {
        for lane in 0..ctx.thread_number.max(1) {
            if let Some(frame) = ctx.pop_input_data(port, lane) {
                return Some(frame);
            }
        }
        None
    }
}

impl Element for Converger {
    fn init_internal(&mut self, _ctx: &BaseElement, configure: &serde_json::Value) -> Result<()> {
        let config: ConvergerConfig = serde_json::from_value(configure.clone())
            .map_err(|e| GraphError::ParseConfigureFail(e.to_string()))?;
        self.default_port = config.default_port;
        Ok(())
    }

    fn do_work(&mut self, ctx: &BaseElement, _worker_index: usize) -> Result<()> {
        // Step 1: blocking poll for one parent frame on default_port,
        // honoring thread state so a PAUSE/STOP transition is observed
        // within one poll interval instead of spinning forever.
        let mut parent = None;
        while ctx.status() == ThreadStatus::Run {
            parent = self.pop_any_lane(ctx, self.default_port);
            if parent.is_some() {
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        let Some(parent) = parent else {
            return Ok(());
        };

        let (channel_id, frame_id) = parent.join_key();
        self.branches.entry(channel_id).or_default().insert(frame_id, 1);
        self.candidates.entry(channel_id).or_default().insert(frame_id, parent);

        // Step 2: non-blocking poll of every other input port, once.
        for port in ctx.input_ports() {
            if port == self.default_port {
                continue;
            }
            if let Some(sub) = self.pop_any_lane(ctx, port) {
                let (c, f) = sub.join_key();
                if let Some(count) = self.branches.get_mut(&c).and_then(|m| m.get_mut(&f)) {
                    *count += 1;
                }
            }
        }

        // Step 3: release satisfied heads, ascending (channel, frame),
        // stopping at the first unsatisfied head per channel.
        let channel_ids: Vec<u64> = self.candidates.keys().copied().collect();
        for channel_id in channel_ids {
            loop {
                let Some(frame_id) = self
                    .candidates
                    .get(&channel_id)
                    .and_then(|frames| frames.keys().next().copied())
                else {
                    break;
                };

                let satisfied = {
                    let expected = self.candidates[&channel_id][&frame_id].num_branches;
                    let observed = self.branches[&channel_id][&frame_id];
                    observed >= expected
                };
                if !satisfied {
                    break;
                }

                let frame = self.candidates.get_mut(&channel_id).unwrap().remove(&frame_id).unwrap();
                self.branches.get_mut(&channel_id).unwrap().remove(&frame_id);
                ctx.push_output_data(OUTPUT_PORT, frame)?;
            }

            if self.candidates.get(&channel_id).is_some_and(|m| m.is_empty()) {
                self.candidates.remove(&channel_id);
                self.branches.remove(&channel_id);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::Connector;
    use crate::core::frames::Payload;
    use std::sync::Arc;

    fn new_converger(thread_number: usize) -> (Converger, BaseElement, Arc<Connector>) {
        let mut conv = Converger::default();
        let ctx = BaseElement::new(1, thread_number, false, false, -1);
        ctx.bind_input(0, Arc::new(Connector::new(thread_number, 8)));
        ctx.bind_input(1, Arc::new(Connector::new(thread_number, 8)));
        conv.init_internal(&ctx, &serde_json::json!({ "default_port": 0 })).unwrap();
        let output = Arc::new(Connector::new(thread_number, 8));
        ctx.bind_output(OUTPUT_PORT, output.clone());
        ctx.set_status(ThreadStatus::Run);
        (conv, ctx, output)
    }

    #[test]
    fn single_branch_frame_releases_immediately() {
        let (mut conv, ctx, output) = new_converger(1);
        let frame = ObjectMetadata::new(1, 1, 0, Payload::empty());
        ctx.push_input_data(0, 0, frame).unwrap();
        conv.do_work(&ctx, 0).unwrap();
        assert_eq!(output.pop(0).unwrap().frame_id, 0);
    }

    /// The blocking default-port poll only re-checks branch ports when a
    /// new parent frame pumps it, so releasing a satisfied-but-delayed
    /// frame takes a following default-port arrival — exactly as a live
    /// upstream channel would eventually provide.
    #[test]
    fn waits_for_all_branches_before_releasing() {
        let (mut conv, ctx, output) = new_converger(1);
        let mut frame0 = ObjectMetadata::new(1, 1, 0, Payload::empty());
        frame0.num_branches = 2;
        ctx.push_input_data(0, 0, frame0).unwrap();
        conv.do_work(&ctx, 0).unwrap();
        assert!(output.pop(0).is_none());

        ctx.push_input_data(1, 0, ObjectMetadata::new(1, 1, 0, Payload::empty())).unwrap();
        ctx.push_input_data(0, 0, ObjectMetadata::new(1, 1, 1, Payload::empty())).unwrap();
        conv.do_work(&ctx, 0).unwrap();
        assert_eq!(output.pop(0).unwrap().frame_id, 0);
        assert_eq!(output.pop(0).unwrap().frame_id, 1);
    }

    /// An unsatisfied head on one channel must not hold back a satisfied
    /// frame on a different channel.
    #[test]
    fn channels_are_independent() {
        let (mut conv, ctx, output) = new_converger(1);
        let mut pending = ObjectMetadata::new(10, 10, 0, Payload::empty());
        pending.num_branches = 2;
        ctx.push_input_data(0, 0, pending).unwrap();
        conv.do_work(&ctx, 0).unwrap();
        assert!(output.pop(0).is_none());

        ctx.push_input_data(0, 0, ObjectMetadata::new(20, 20, 0, Payload::empty())).unwrap();
        conv.do_work(&ctx, 0).unwrap();
        let released = output.pop(0).unwrap();
        assert_eq!(released.channel_id_internal, 20);
        assert!(output.pop(0).is_none(), "channel 10's frame is still withheld");
    }
}
