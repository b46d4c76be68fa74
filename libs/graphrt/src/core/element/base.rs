//! [`BaseElement`] — the port/connector/lifecycle plumbing shared by every
//! element, independent of what its `do_work` hook actually computes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::state::{AtomicThreadStatus, ThreadStatus};
use crate::core::bus::Connector;
use crate::core::error::{GraphError, Result};
use crate::core::frames::ObjectMetadata;

/// Callback a sink element invokes synchronously on its worker thread
/// instead of forwarding to a downstream Connector.
pub type SinkHandler = Arc<dyn Fn(ObjectMetadata) + Send + Sync>;

/// Port/connector bookkeeping and lifecycle state for one element.
///
/// An input port is bound to exactly one [`Connector`] (shared with the
/// upstream element's matching output-port binding). An output port may be
/// bound to several connectors — one per downstream consumer — in which
/// case [`BaseElement::push_output_data`] broadcasts to all of them.
pub struct BaseElement {
    pub id: u64,
    pub thread_number: usize,
    pub is_source: bool,
    pub is_sink: bool,
    pub device_id: i32,
    status: AtomicThreadStatus,
    input_connectors: RwLock<HashMap<u32, Arc<Connector>>>,
    output_connectors: RwLock<HashMap<u32, Vec<Arc<Connector>>>>,
    sink_handlers: RwLock<HashMap<u32, SinkHandler>>,
}

impl BaseElement {
    pub fn new(id: u64, thread_number: usize, is_source: bool, is_sink: bool, device_id: i32) -> Self {
        Self {
            id,
            thread_number,
            is_source,
            is_sink,
            device_id,
            status: AtomicThreadStatus::new(ThreadStatus::Init),
            input_connectors: RwLock::new(HashMap::new()),
            output_connectors: RwLock::new(HashMap::new()),
            sink_handlers: RwLock::new(HashMap::new()),
        }
    }

    pub fn status(&self) -> ThreadStatus {
        self.status.load()
    }

    pub(crate) fn set_status(&self, status: ThreadStatus) {
        self.status.store(status);
    }

    pub fn bind_input(&self, port: u32, connector: Arc<Connector>) {
        self.input_connectors.write().insert(port, connector);
    }

    pub fn bind_output(&self, port: u32, connector: Arc<Connector>) {
        self.output_connectors
            .write()
            .entry(port)
            .or_default()
            .push(connector);
    }

    pub fn set_sink_handler(&self, port: u32, handler: SinkHandler) {
        self.sink_handlers.write().insert(port, handler);
    }

    pub fn has_input(&self, port: u32) -> bool {
        self.input_connectors.read().contains_key(&port)
    }

    pub fn has_output(&self, port: u32) -> bool {
        self.output_connectors.read().contains_key(&port)
    }

    pub fn has_any_output(&self) -> bool {
        !self.output_connectors.read().is_empty()
    }

    pub fn input_ports(&self) -> Vec<u32> {
        self.input_connectors.read().keys().copied().collect()
    }

    /// Non-blocking dequeue, used from inside `do_work`.
    pub fn pop_input_data(&self, port: u32, lane: usize) -> Option<ObjectMetadata> {
        let connectors = self.input_connectors.read();
        connectors.get(&port)?.pop(lane)
    }

    /// External entry used by source adapters (`Graph::push_source_data`)
    /// and tests to inject data directly onto an input port.
    pub fn push_input_data(&self, port: u32, lane: usize, value: ObjectMetadata) -> Result<()> {
        let connectors = self.input_connectors.read();
        let connector = connectors
            .get(&port)
            .ok_or_else(|| GraphError::NoSuchWorker(self.id, lane))?;
        connector.push(lane, value, port)
    }

    /// Emit `value` on `port`: invokes the registered sink handler if one
    /// exists, otherwise broadcasts to every connector bound to the port,
    /// selecting each connector's lane from the channel id.
    pub fn push_output_data(&self, port: u32, value: ObjectMetadata) -> Result<()> {
        if let Some(handler) = self.sink_handlers.read().get(&port) {
            handler(value);
            return Ok(());
        }

        let connectors = self.output_connectors.read();
        let Some(targets) = connectors.get(&port) else {
            return Ok(());
        };
        for connector in targets {
            let lane = connector.lane_for_channel(value.channel_id_internal);
            let status = &self.status;
            connector.push_blocking(lane, value.clone(), port, || status.load() != ThreadStatus::Stop)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frames::Payload;

    #[test]
    fn push_input_then_pop_round_trips() {
        let elem = BaseElement::new(1, 1, true, false, -1);
        elem.bind_input(0, Arc::new(Connector::new(1, 4)));
        elem.push_input_data(0, 0, ObjectMetadata::new(1, 1, 0, Payload::empty()))
            .unwrap();
        let popped = elem.pop_input_data(0, 0).unwrap();
        assert_eq!(popped.frame_id, 0);
    }

    #[test]
    fn sink_handler_takes_priority_over_connector() {
        use std::sync::atomic::{AtomicU64, Ordering};
        let elem = BaseElement::new(1, 1, false, true, -1);
        let received = Arc::new(AtomicU64::new(0));
        let received2 = received.clone();
        elem.set_sink_handler(
            0,
            Arc::new(move |meta| {
                received2.store(meta.frame_id, Ordering::SeqCst);
            }),
        );
        elem.push_output_data(0, ObjectMetadata::new(1, 1, 42, Payload::empty()))
            .unwrap();
        assert_eq!(received.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn push_output_broadcasts_to_every_bound_connector() {
        let elem = BaseElement::new(1, 1, false, false, -1);
        let a = Arc::new(Connector::new(1, 4));
        let b = Arc::new(Connector::new(1, 4));
        elem.bind_output(0, a.clone());
        elem.bind_output(0, b.clone());
        elem.push_output_data(0, ObjectMetadata::new(1, 1, 0, Payload::empty()))
            .unwrap();
        assert!(a.pop(0).is_some());
        assert!(b.pop(0).is_some());
    }
}
