//! Dependency matrix and call-order computation.
//!
//! `requires(i, j)` is true when node `i` has a require port whose outer node
//! is `j`. The call order is computed on a working copy that is reset from
//! the immutable matrix every time, so [`GraphMatrix::call_order`] can be
//! called repeatedly with the same result.

use nalgebra::DMatrix;
use tn_core::NodeId;
use tracing::trace;

use crate::bimap::BiMap;
use crate::error::{GraphError, GraphResult, NodeRef, PortRef};
use crate::node::Node;
use crate::port::PortArena;

#[derive(Debug, Clone)]
pub struct GraphMatrix {
    ids: BiMap<usize, NodeId>,
    names: Vec<String>,
    matrix: DMatrix<bool>,
    matrix_copy: DMatrix<bool>,
}

impl GraphMatrix {
    /// Validate `nodes` and record their dependency edges.
    ///
    /// Checks run in order: duplicate nodes, unconnected ports, nodes with
    /// undefined context, then dependencies on nodes outside the list.
    pub fn new(nodes: &[Box<dyn Node>], ports: &PortArena) -> GraphResult<Self> {
        let n = nodes.len();
        let mut ids = BiMap::new();
        for (i, node) in nodes.iter().enumerate() {
            if ids.add(i, node.id()).is_err() {
                return Err(GraphError::DuplicateNode {
                    node: node_ref(node.as_ref()),
                });
            }
        }

        let mut unconnected = Vec::new();
        for node in nodes {
            for port in node.ports() {
                if ports.outer_node(port)?.is_none() {
                    unconnected.push(PortRef {
                        port,
                        node: node.name().to_string(),
                        tag: ports.tag(port)?.to_string(),
                    });
                }
            }
        }
        if !unconnected.is_empty() {
            return Err(GraphError::UnconnectedPorts { ports: unconnected });
        }

        let undefined: Vec<NodeRef> = nodes
            .iter()
            .enumerate()
            .filter(|(i, node)| !node.context_defined(*i))
            .map(|(_, node)| node_ref(node.as_ref()))
            .collect();
        if !undefined.is_empty() {
            return Err(GraphError::ContextUndefined { nodes: undefined });
        }

        let mut matrix = DMatrix::from_element(n, n, false);
        for (i, node) in nodes.iter().enumerate() {
            for port in node.require_ports() {
                let port_ref = || -> GraphResult<PortRef> {
                    Ok(PortRef {
                        port,
                        node: node.name().to_string(),
                        tag: ports.tag(port)?.to_string(),
                    })
                };
                let Some(outer) = ports.outer_node(port)? else {
                    return Err(GraphError::UnconnectedPorts {
                        ports: vec![port_ref()?],
                    });
                };
                match ids.get_by_val(&outer) {
                    Some(&j) => matrix[(i, j)] = true,
                    None => {
                        return Err(GraphError::ForeignNode {
                            port: port_ref()?,
                            outer,
                        });
                    }
                }
            }
        }

        Ok(Self {
            ids,
            names: nodes.iter().map(|node| node.name().to_string()).collect(),
            matrix_copy: matrix.clone(),
            matrix,
        })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True if node `i` requires the output of node `j`.
    pub fn requires(&self, i: usize, j: usize) -> bool {
        i < self.len() && j < self.len() && self.matrix[(i, j)]
    }

    pub fn node_id(&self, index: usize) -> Option<NodeId> {
        self.ids.get_by_key(&index).copied()
    }

    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.ids.get_by_val(&node).copied()
    }

    /// Topological order of node indices, dependencies first.
    ///
    /// Each round emits every node whose remaining row is empty, in index
    /// order, then clears their columns. Nodes never emitted are part of (or
    /// downstream of) a cycle and are reported as inaccessible.
    pub fn call_order(&mut self) -> GraphResult<Vec<usize>> {
        let n = self.len();
        self.matrix_copy.copy_from(&self.matrix);

        let mut emitted = vec![false; n];
        let mut order = Vec::with_capacity(n);
        loop {
            let free: Vec<usize> = (0..n)
                .filter(|&i| !emitted[i] && self.matrix_copy.row(i).iter().all(|dep| !dep))
                .collect();
            if free.is_empty() {
                break;
            }
            for &i in &free {
                emitted[i] = true;
                order.push(i);
                self.matrix_copy.column_mut(i).fill(false);
            }
        }

        if order.len() < n {
            let nodes = (0..n)
                .filter(|&i| !emitted[i])
                .map(|i| self.node_ref(i))
                .collect();
            return Err(GraphError::InaccessibleNodes { nodes });
        }

        trace!(order = ?order, "computed call order");
        Ok(order)
    }

    fn node_ref(&self, index: usize) -> NodeRef {
        NodeRef {
            id: self
                .node_id(index)
                .unwrap_or_else(|| NodeId::from_index(index as u32)),
            name: self.names[index].clone(),
        }
    }
}

fn node_ref(node: &dyn Node) -> NodeRef {
    NodeRef {
        id: node.id(),
        name: node.name().to_string(),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::testing::{StubNode, connect};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn acyclic_order_respects_every_edge(
            n in 1usize..8,
            edges in prop::collection::vec((0usize..8, 0usize..8), 0..20),
        ) {
            let mut arena = PortArena::new();
            let mut stubs: Vec<StubNode> = (0..n)
                .map(|i| StubNode::new(&mut arena, &format!("n{i}")))
                .collect();

            // Only lower -> higher edges, so the graph is acyclic.
            for (a, b) in edges {
                let (a, b) = (a % n, b % n);
                if a < b {
                    let (left, right) = stubs.split_at_mut(b);
                    connect(&mut arena, &mut left[a], &mut right[0]);
                }
            }

            // Reverse the listing so index order is not already topological.
            stubs.reverse();
            let nodes: Vec<Box<dyn Node>> = stubs
                .into_iter()
                .map(|s| Box::new(s) as Box<dyn Node>)
                .collect();
            let mut matrix = GraphMatrix::new(&nodes, &arena).unwrap();
            let order = matrix.call_order().unwrap();

            let mut seen = order.clone();
            seen.sort_unstable();
            prop_assert_eq!(seen, (0..n).collect::<Vec<_>>());

            for (pos, &i) in order.iter().enumerate() {
                for j in 0..n {
                    if matrix.requires(i, j) {
                        let dep_pos = order.iter().position(|&x| x == j).unwrap();
                        prop_assert!(dep_pos < pos);
                    }
                }
            }
            prop_assert_eq!(matrix.call_order().unwrap(), order);
        }
    }
}
