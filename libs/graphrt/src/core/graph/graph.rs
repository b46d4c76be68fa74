//! [`Graph`] — builds and manages one pipeline's elements and connectors.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::config::GraphConfig;
use super::validation::validate_acyclic;
use crate::core::bus::Connector;
use crate::core::element::{spawn_worker, BaseElement, Element, SinkHandler, ThreadStatus};
use crate::core::error::{GraphError, Result};
use crate::core::frames::ObjectMetadata;
use crate::core::observability::{ListenThread, NullListenThread};
use crate::core::registry::ElementFactory;

/// Graph-level lifecycle, distinct from each element's [`ThreadStatus`]:
/// drives the idempotence rules in spec §8 ("repeated start/stop is a
/// no-op success").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    Init,
    Running,
    Paused,
    Stopped,
}

struct ElementEntry {
    element: Arc<Mutex<Box<dyn Element>>>,
    ctx: Arc<BaseElement>,
    workers: Vec<std::thread::JoinHandle<()>>,
}

/// One pipeline: an acyclic wiring of elements connected by bounded queues.
pub struct Graph {
    pub id: u64,
    pub name: String,
    elements: BTreeMap<u64, ElementEntry>,
    sources: Vec<u64>,
    sinks: Vec<u64>,
    /// Kept alive for the graph's lifetime; elements reference the same
    /// `Arc<Connector>`s through their port bindings.
    _connectors: Vec<Arc<Connector>>,
    state: RwLock<GraphState>,
    listener: Arc<dyn ListenThread>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph").field("id", &self.id).field("name", &self.name).finish()
    }
}

impl Graph {
    /// Build a graph from its JSON document (spec §4.4, steps 1-5).
    pub fn init(json: &serde_json::Value, listener: Arc<dyn ListenThread>) -> Result<Graph> {
        Self::init_with_factory(json, listener, &crate::core::registry::global_factory())
    }

    pub fn init_with_factory(
        json: &serde_json::Value,
        listener: Arc<dyn ListenThread>,
        factory: &ElementFactory,
    ) -> Result<Graph> {
        let config: GraphConfig = serde_json::from_value(json.clone())
            .map_err(|e| GraphError::ParseConfigureFail(e.to_string()))?;

        // Step 1: instantiate + init_internal every element.
        let mut elements = BTreeMap::new();
        for el_cfg in &config.elements {
            let mut element = factory.make(&el_cfg.name)?;
            let ctx = Arc::new(BaseElement::new(
                el_cfg.id,
                el_cfg.thread_number.max(1),
                el_cfg.is_source,
                el_cfg.is_sink,
                el_cfg.device_id,
            ));
            element
                .init_internal(&ctx, &el_cfg.configure)
                .map_err(|e| GraphError::InitFail(format!("element {}: {}", el_cfg.id, e)))?;
            elements.insert(
                el_cfg.id,
                ElementEntry {
                    element: Arc::new(Mutex::new(element)),
                    ctx,
                    workers: Vec::new(),
                },
            );
        }

        // Step 3 (acyclicity) runs before wiring so a bad graph never
        // allocates connectors.
        let element_ids: Vec<u64> = elements.keys().copied().collect();
        validate_acyclic(&element_ids, &config.connections)?;

        // Step 2: wire connections. Lane count on the downstream side must
        // equal its thread_number (spec §3 invariant); per-lane capacity is
        // sized generously from both endpoints' parallelism so neither side
        // throttles the other purely from under-provisioned buffering.
        let mut connectors = Vec::with_capacity(config.connections.len());
        for conn in &config.connections {
            let upstream_threads = elements
                .get(&conn.src_id)
                .ok_or(GraphError::NoSuchElementId(conn.src_id, config.graph_id))?
                .ctx
                .thread_number;
            let downstream = elements
                .get(&conn.dst_id)
                .ok_or(GraphError::NoSuchElementId(conn.dst_id, config.graph_id))?;
            let lane_count = downstream.ctx.thread_number;
            let capacity = upstream_threads.max(lane_count).max(1);
            let connector = Arc::new(Connector::new(lane_count, capacity));

            elements[&conn.src_id].ctx.bind_output(conn.src_port, connector.clone());
            elements[&conn.dst_id].ctx.bind_input(conn.dst_port, connector.clone());
            connectors.push(connector);
        }

        // Source elements have no upstream connection to bind their input
        // port, but `push_source_data` still needs somewhere to deliver
        // into — bind a dedicated single-lane port-0 connector per spec
        // §4.4's "source inputs are single-lane by convention".
        for el_cfg in &config.elements {
            if !el_cfg.is_source {
                continue;
            }
            let entry = &elements[&el_cfg.id];
            if !entry.ctx.has_input(0) {
                let connector = Arc::new(Connector::new(1, entry.ctx.thread_number.max(1)));
                entry.ctx.bind_input(0, connector.clone());
                connectors.push(connector);
            }
        }

        // Step 4: source/sink sets, plus the wiring invariants from §3.
        let mut sources = Vec::new();
        let mut sinks = Vec::new();
        for (id, entry) in &elements {
            let el_cfg = config.elements.iter().find(|c| c.id == *id).unwrap();
            if el_cfg.is_source {
                sources.push(*id);
            } else if entry.ctx.input_ports().is_empty() {
                return Err(GraphError::ParseConfigureFail(format!(
                    "non-source element {id} has no input port wired"
                )));
            }
            if el_cfg.is_sink {
                sinks.push(*id);
            } else if !entry.ctx.has_any_output() {
                return Err(GraphError::ParseConfigureFail(format!(
                    "non-sink element {id} has no output port wired"
                )));
            }
        }

        Ok(Graph {
            id: config.graph_id,
            name: config.graph_name,
            elements,
            sources,
            sinks,
            _connectors: connectors,
            state: RwLock::new(GraphState::Init),
            listener,
        })
    }

    pub fn state(&self) -> GraphState {
        *self.state.read()
    }

    pub fn source_ids(&self) -> &[u64] {
        &self.sources
    }

    pub fn sink_ids(&self) -> &[u64] {
        &self.sinks
    }

    fn entry(&self, element_id: u64) -> Result<&ElementEntry> {
        self.elements
            .get(&element_id)
            .ok_or(GraphError::NoSuchElementId(element_id, self.id))
    }

    /// Transition every element to RUN and spawn its worker threads.
    /// Reverts (stops everything already started) if any element fails to
    /// spawn. A no-op success if the graph is already running.
    pub fn start(&mut self) -> Result<()> {
        if *self.state.read() == GraphState::Running {
            return Ok(());
        }

        for (id, entry) in self.elements.iter_mut() {
            entry.ctx.set_status(ThreadStatus::Run);
            for worker_index in 0..entry.ctx.thread_number {
                match spawn_worker(
                    self.id,
                    entry.element.clone(),
                    entry.ctx.clone(),
                    worker_index,
                    self.listener.clone(),
                ) {
                    Ok(handle) => entry.workers.push(handle),
                    Err(io_err) => {
                        let failure = GraphError::InitFail(format!(
                            "element {id} worker {worker_index} failed to spawn: {io_err}"
                        ));
                        self.revert_start();
                        return Err(failure);
                    }
                }
            }
        }

        *self.state.write() = GraphState::Running;
        tracing::info!(graph_id = self.id, "graph started");
        Ok(())
    }

    /// Stops and joins every worker already spawned this `start()` attempt,
    /// then releases resources exactly as `stop()` does — `uninit_internal`
    /// must run on every exit path, including a failed bring-up (spec §5).
    fn revert_start(&mut self) {
        for entry in self.elements.values_mut() {
            entry.ctx.set_status(ThreadStatus::Stop);
        }
        for entry in self.elements.values_mut() {
            for handle in entry.workers.drain(..) {
                let _ = handle.join();
            }
        }
        for entry in self.elements.values_mut() {
            let mut guard = entry.element.lock();
            if let Err(e) = guard.uninit_internal(&entry.ctx) {
                tracing::warn!(graph_id = self.id, element_id = entry.ctx.id, error = %e, "uninit_internal failed during start rollback");
            }
        }
        *self.state.write() = GraphState::Stopped;
    }

    /// Stop every element, join every worker, then release resources. A
    /// no-op success if the graph is already stopped.
    pub fn stop(&mut self) -> Result<()> {
        if *self.state.read() == GraphState::Stopped {
            return Ok(());
        }

        for entry in self.elements.values_mut() {
            entry.ctx.set_status(ThreadStatus::Stop);
        }
        for entry in self.elements.values_mut() {
            for handle in entry.workers.drain(..) {
                let _ = handle.join();
            }
        }
        for entry in self.elements.values_mut() {
            let mut guard = entry.element.lock();
            if let Err(e) = guard.uninit_internal(&entry.ctx) {
                tracing::warn!(graph_id = self.id, element_id = entry.ctx.id, error = %e, "uninit_internal failed");
            }
        }

        *self.state.write() = GraphState::Stopped;
        tracing::info!(graph_id = self.id, "graph stopped");
        Ok(())
    }

    /// Soft-stop: workers spin without calling `do_work`. No-op if already
    /// paused.
    pub fn pause(&mut self) -> Result<()> {
        let mut state = self.state.write();
        if *state != GraphState::Running {
            return Ok(());
        }
        for entry in self.elements.values() {
            entry.ctx.set_status(ThreadStatus::Pause);
        }
        *state = GraphState::Paused;
        Ok(())
    }

    /// Resume from PAUSE back to RUN. No-op if already running.
    pub fn resume(&mut self) -> Result<()> {
        let mut state = self.state.write();
        if *state != GraphState::Paused {
            return Ok(());
        }
        for entry in self.elements.values() {
            entry.ctx.set_status(ThreadStatus::Run);
        }
        *state = GraphState::Running;
        Ok(())
    }

    /// Forward `payload` into a source element's input port on lane 0
    /// (source inputs are single-lane by convention).
    pub fn push_source_data(&self, element_id: u64, port: u32, payload: ObjectMetadata) -> Result<()> {
        let entry = self.entry(element_id)?;
        if !self.sources.contains(&element_id) {
            return Err(GraphError::ParseConfigureFail(format!(
                "element {element_id} is not a source"
            )));
        }
        entry.ctx.push_input_data(port, 0, payload)
    }

    /// Register the user callback a sink element invokes for every payload
    /// on `port`.
    pub fn set_sink_handler(&self, element_id: u64, port: u32, handler: SinkHandler) -> Result<()> {
        let entry = self.entry(element_id)?;
        if !self.sinks.contains(&element_id) {
            return Err(GraphError::ParseConfigureFail(format!(
                "element {element_id} is not a sink"
            )));
        }
        entry.ctx.set_sink_handler(port, handler);
        Ok(())
    }
}
