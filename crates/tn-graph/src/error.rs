//! Graph-specific error types.
//!
//! Structural problems found while building a network (`GraphError`) are kept
//! apart from runtime failures raised while it is solved (`SolveError`).

use std::fmt;

use thiserror::Error;
use tn_core::{NodeId, PortId, TnError, WeakPortId};

use crate::port::Endpoint;
use crate::state::StateKind;

/// Node identity as reported in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub id: NodeId,
    pub name: String,
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Port identity as reported in diagnostics: the owning node's name and the port tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub port: PortId,
    pub node: String,
    pub tag: String,
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} ({})", self.node, self.tag, self.port)
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Bidirectional map insertion conflicts.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiMapError {
    #[error("Key already present")]
    KeyConflict,

    #[error("Value already present")]
    ValueConflict,
}

/// Incompatible port state kinds or shapes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("State kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: StateKind, found: StateKind },

    #[error("Vector dimension mismatch: {expected} vs {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// Misuse of the port arena.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error("Unknown port {port}")]
    UnknownPort { port: PortId },

    #[error("Unknown weak port {port}")]
    UnknownWeakPort { port: WeakPortId },

    #[error("Unknown node {node}")]
    UnknownNode { node: NodeId },

    #[error("Endpoint {endpoint} is already linked")]
    AlreadyLinked { endpoint: Endpoint },

    #[error("Endpoint {endpoint} cannot be linked to itself")]
    SelfLink { endpoint: Endpoint },

    #[error("Length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Too many {what} for 32-bit handles")]
    CapacityExceeded { what: &'static str },

    #[error("Input registry conflict: {0}")]
    Registry(#[from] BiMapError),
}

/// Structural errors raised while validating a node set.
///
/// Each variant carries the offending entities so callers can report them
/// precisely; use [`GraphError::nodes`] and [`GraphError::ports`] to query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unconnected ports: {}", join(.ports))]
    UnconnectedPorts { ports: Vec<PortRef> },

    #[error("Context undefined for nodes: {}", join(.nodes))]
    ContextUndefined { nodes: Vec<NodeRef> },

    #[error("Inaccessible nodes: {}", join(.nodes))]
    InaccessibleNodes { nodes: Vec<NodeRef> },

    #[error("Node {node} is listed more than once")]
    DuplicateNode { node: NodeRef },

    #[error("Port {port} depends on node {outer} which is not part of the network")]
    ForeignNode { port: PortRef, outer: NodeId },

    #[error("Port arena error: {0}")]
    Port(#[from] PortError),
}

impl GraphError {
    /// Nodes named by this error (empty for port-level errors).
    pub fn nodes(&self) -> &[NodeRef] {
        match self {
            GraphError::ContextUndefined { nodes } | GraphError::InaccessibleNodes { nodes } => {
                nodes
            }
            GraphError::DuplicateNode { node } => std::slice::from_ref(node),
            _ => &[],
        }
    }

    /// Ports named by this error (empty for node-level errors).
    pub fn ports(&self) -> &[PortRef] {
        match self {
            GraphError::UnconnectedPorts { ports } => ports,
            GraphError::ForeignNode { port, .. } => std::slice::from_ref(port),
            _ => &[],
        }
    }
}

/// Errors a node may return from `process`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Port error: {0}")]
    Port(#[from] PortError),

    #[error("Port '{port}' carries no state")]
    MissingState { port: String },

    #[error("Reduce failed: {what}")]
    Reduce { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

pub type NodeResult<T> = Result<T, NodeError>;

/// Disagreement between two state snapshots taken around one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotMismatch {
    /// Exactly one side of the pair carries a state.
    OneSidedState { port: PortId },
    /// Snapshots hold a different number of port states for the node.
    PortCount { before: usize, after: usize },
    /// The node is present in only one snapshot.
    MissingNode,
}

impl fmt::Display for SnapshotMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotMismatch::OneSidedState { port } => {
                write!(f, "port {} has a state in only one snapshot", port)
            }
            SnapshotMismatch::PortCount { before, after } => {
                write!(f, "port count changed from {} to {}", before, after)
            }
            SnapshotMismatch::MissingNode => write!(f, "node missing from one snapshot"),
        }
    }
}

/// Errors returned by `Network::solve`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Iteration {iteration}: node '{node}' failed: {source}")]
    Process {
        iteration: usize,
        node: String,
        #[source]
        source: NodeError,
    },

    #[error("Residual error at node '{node}': {what}")]
    Residual { node: String, what: SnapshotMismatch },

    #[error("State error at node '{node}': {source}")]
    State {
        node: String,
        #[source]
        source: StateError,
    },

    #[error("Non-finite residual at port {port} of node '{node}': {source}")]
    NonFinite {
        node: String,
        port: PortId,
        #[source]
        source: TnError,
    },
}

pub type GraphResult<T> = Result<T, GraphError>;
pub type PortResult<T> = Result<T, PortError>;
pub type SolveResult<T> = Result<T, SolveError>;

impl From<PortError> for SolveError {
    fn from(err: PortError) -> Self {
        SolveError::Graph(GraphError::Port(err))
    }
}

impl From<GraphError> for TnError {
    fn from(err: GraphError) -> Self {
        TnError::Invariant {
            what: err.to_string(),
        }
    }
}

impl From<SolveError> for TnError {
    fn from(err: SolveError) -> Self {
        match err {
            SolveError::NonFinite { source, .. } => source,
            other => TnError::Invariant {
                what: other.to_string(),
            },
        }
    }
}
