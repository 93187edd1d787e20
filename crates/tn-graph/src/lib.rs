//! tn-graph: dataflow graph engine for turbonet.
//!
//! Provides:
//! - A port arena holding ports, weak (view) ports and their links
//! - Port states that can be blended and compared
//! - The `Node` trait and a dependency matrix giving a safe call order
//! - `Network`, the relaxed fixed-point driver
//! - Reduce and vector-assembler nodes for balance equations
//!
//! # Example
//!
//! ```
//! use tn_graph::{Network, Node, PortArena, PortState, SinkNode, SourceNode};
//!
//! let mut ports = PortArena::new();
//! let source = SourceNode::new(&mut ports, Some("inlet"), PortState::scalar(2.0)).unwrap();
//! let sink = SinkNode::new(&mut ports, Some("outlet")).unwrap();
//! ports.link(source.output_port(), sink.input_port()).unwrap();
//! let input = sink.input_port();
//!
//! let nodes: Vec<Box<dyn Node>> = vec![Box::new(sink), Box::new(source)];
//! let mut network = Network::new(ports, nodes).unwrap();
//! assert!(network.solve(1.0, 1, 10, 1e-9).unwrap());
//! assert_eq!(network.ports().state(input).unwrap(), Some(&PortState::scalar(2.0)));
//! ```

pub mod assembler;
pub mod bimap;
pub mod error;
pub mod helpers;
pub mod matrix;
pub mod network;
pub mod node;
pub mod port;
pub mod reduce;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for ergonomics
pub use assembler::VectorAssemblerNode;
pub use bimap::BiMap;
pub use error::{
    BiMapError, GraphError, GraphResult, NodeError, NodeRef, NodeResult, PortError, PortRef,
    PortResult, SnapshotMismatch, SolveError, SolveResult, StateError,
};
pub use helpers::{CycleBreakNode, SinkNode, SourceNode};
pub use matrix::GraphMatrix;
pub use network::{Network, SolveConfig, SolveOutcome};
pub use node::{Node, NodeCore};
pub use port::{Endpoint, PortArena};
pub use reduce::{GroupReduceFn, ReduceNode, TotalReduceFn};
pub use state::{GasState, PortState, StateKind};
pub use tn_core::{NodeId, PortId, WeakPortId};
