//! [`Engine`] — process-wide singleton mapping graph id to [`Graph`].

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::core::element::SinkHandler;
use crate::core::error::{GraphError, Result};
use crate::core::frames::ObjectMetadata;
use crate::core::graph::Graph;
use crate::core::observability::{ListenThread, ReportPhase, StatusReport};

/// Holds every live graph behind one mutex, guarding only map lookups and
/// mutations — once a `Graph` handle is cloned out, the map lock is
/// released before calling into it. `add_graph` is the one exception: it
/// holds the map lock for its whole init+start sequence, so a concurrent
/// `add_graph` for a different id blocks rather than interleaving.
pub struct Engine {
    graphs: Mutex<HashMap<u64, Arc<Mutex<Graph>>>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            graphs: Mutex::new(HashMap::new()),
        }
    }

    /// Build and start a graph from its JSON document, reporting init and
    /// start outcomes to `listener` along the way. Fails if a graph with
    /// the same id is already registered.
    pub fn add_graph(&self, json: &serde_json::Value, listener: Arc<dyn ListenThread>) -> Result<u64> {
        let mut graphs = self.graphs.lock();

        let graph_id = json
            .get("graph_id")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| GraphError::ParseConfigureFail("graph document missing graph_id".into()))?;
        if graphs.contains_key(&graph_id) {
            return Err(GraphError::ParseConfigureFail(format!(
                "graph {graph_id} is already registered"
            )));
        }

        let mut graph = match Graph::init(json, listener.clone()) {
            Ok(g) => g,
            Err(e) => {
                listener.report_status(StatusReport {
                    graph_id,
                    element_id: None,
                    phase: ReportPhase::Init,
                    kind: Some(e.kind()),
                    message: e.to_string(),
                });
                return Err(e);
            }
        };
        listener.report_status(StatusReport {
            graph_id,
            element_id: None,
            phase: ReportPhase::Init,
            kind: None,
            message: "graph initialized".to_string(),
        });

        if let Err(e) = graph.start() {
            listener.report_status(StatusReport {
                graph_id,
                element_id: None,
                phase: ReportPhase::Start,
                kind: Some(e.kind()),
                message: e.to_string(),
            });
            return Err(e);
        }
        listener.report_status(StatusReport {
            graph_id,
            element_id: None,
            phase: ReportPhase::Start,
            kind: None,
            message: "graph started".to_string(),
        });

        graphs.insert(graph_id, Arc::new(Mutex::new(graph)));
        tracing::info!(graph_id, "graph added to engine");
        Ok(graph_id)
    }

    /// Stop and drop a graph. A no-op success if it's not registered.
    pub fn remove_graph(&self, graph_id: u64) -> Result<()> {
        let handle = self.graphs.lock().remove(&graph_id);
        if let Some(handle) = handle {
            handle.lock().stop()?;
            tracing::info!(graph_id, "graph removed from engine");
        }
        Ok(())
    }

    pub fn graph_exists(&self, graph_id: u64) -> bool {
        self.graphs.lock().contains_key(&graph_id)
    }

    pub fn get_graph_ids(&self) -> Vec<u64> {
        self.graphs.lock().keys().copied().collect()
    }

    fn handle(&self, graph_id: u64) -> Result<Arc<Mutex<Graph>>> {
        self.graphs
            .lock()
            .get(&graph_id)
            .cloned()
            .ok_or(GraphError::NoSuchGraphId(graph_id))
    }

    pub fn start(&self, graph_id: u64) -> Result<()> {
        self.handle(graph_id)?.lock().start()
    }

    pub fn stop(&self, graph_id: u64) -> Result<()> {
        self.handle(graph_id)?.lock().stop()
    }

    pub fn pause(&self, graph_id: u64) -> Result<()> {
        self.handle(graph_id)?.lock().pause()
    }

    pub fn resume(&self, graph_id: u64) -> Result<()> {
        self.handle(graph_id)?.lock().resume()
    }

    pub fn push_source_data(
        &self,
        graph_id: u64,
        element_id: u64,
        port: u32,
        payload: ObjectMetadata,
    ) -> Result<()> {
        self.handle(graph_id)?.lock().push_source_data(element_id, port, payload)
    }

    pub fn set_sink_handler(
        &self,
        graph_id: u64,
        element_id: u64,
        port: u32,
        handler: SinkHandler,
    ) -> Result<()> {
        self.handle(graph_id)?.lock().set_sink_handler(element_id, port, handler)
    }
}

static GLOBAL_ENGINE: OnceLock<Arc<Engine>> = OnceLock::new();

/// The process-wide [`Engine`].
pub fn global() -> Arc<Engine> {
    GLOBAL_ENGINE.get_or_init(|| Arc::new(Engine::new())).clone()
}
