use serde::{Deserialize, Serialize};

use crate::core::element::ElementConfig;

/// One `src -> dst` wire between two element ports (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub src_id: u64,
    pub src_port: u32,
    pub dst_id: u64,
    pub dst_port: u32,
}

/// The JSON document describing one graph, accepted one-at-a-time by
/// [`crate::core::runtime::Engine::add_graph`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub graph_id: u64,
    pub graph_name: String,
    pub elements: Vec<ElementConfig>,
    pub connections: Vec<ConnectionConfig>,
}
