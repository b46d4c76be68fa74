use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::core::error::{GraphError, Result};
use crate::core::graph::ConnectionConfig;

/// Validate that the wiring implied by `connections` over `element_ids` is
/// acyclic. The runtime has no backward-edge concept (Non-goals, spec §1):
/// any cycle is a configuration error, never a runtime condition to detect.
pub fn validate_acyclic(element_ids: &[u64], connections: &[ConnectionConfig]) -> Result<()> {
    let mut graph: DiGraphMap<u64, ()> = DiGraphMap::new();
    for &id in element_ids {
        graph.add_node(id);
    }
    for conn in connections {
        graph.add_edge(conn.src_id, conn.dst_id, ());
    }

    toposort(&graph, None)
        .map(|_| ())
        .map_err(|cycle| GraphError::ParseConfigureFail(format!(
            "graph contains a cycle through element {}",
            cycle.node_id()
        )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(src: u64, dst: u64) -> ConnectionConfig {
        ConnectionConfig { src_id: src, src_port: 0, dst_id: dst, dst_port: 0 }
    }

    #[test]
    fn accepts_dag() {
        let ids = [1, 2, 3];
        let conns = vec![conn(1, 2), conn(2, 3)];
        assert!(validate_acyclic(&ids, &conns).is_ok());
    }

    #[test]
    fn rejects_cycle() {
        let ids = [1, 2, 3];
        let conns = vec![conn(1, 2), conn(2, 3), conn(3, 1)];
        assert!(validate_acyclic(&ids, &conns).is_err());
    }

    #[test]
    fn accepts_fan_out_and_fan_in() {
        let ids = [1, 2, 3, 4];
        let conns = vec![conn(1, 2), conn(1, 3), conn(2, 4), conn(3, 4)];
        assert!(validate_acyclic(&ids, &conns).is_ok());
    }
}
