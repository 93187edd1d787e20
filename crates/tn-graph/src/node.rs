//! The node abstraction evaluated by a [`Network`](crate::Network).

use tn_core::{NodeId, PortId, Real};

use crate::error::{NodeResult, PortResult};
use crate::port::PortArena;

/// A computational unit with required (input) and updated (output) ports.
///
/// `process` must be a function of the required port states and may only
/// write to the node's own update ports.
pub trait Node {
    fn id(&self) -> NodeId;

    fn name(&self) -> &str;

    fn require_ports(&self) -> Vec<PortId>;

    fn update_ports(&self) -> Vec<PortId>;

    /// Every port the node owns. Ports outside both role sets (for example a
    /// cycle breaker's data port) must be listed here so they are checked for
    /// connectivity.
    fn ports(&self) -> Vec<PortId> {
        let mut ports = self.require_ports();
        ports.extend(self.update_ports());
        ports
    }

    /// Whether the node can decide its required/updated split on its own.
    ///
    /// `key` is the dense index the dependency matrix assigned to the node.
    fn context_defined(&self, _key: usize) -> bool {
        true
    }

    /// Evaluate the node once. `relax_coef` is offered for nodes that blend
    /// their previous output with the new one.
    fn process(&mut self, ports: &mut PortArena, relax_coef: Real) -> NodeResult<()>;
}

/// Identity shared by the built-in nodes.
#[derive(Debug, Clone)]
pub struct NodeCore {
    id: NodeId,
    name: String,
}

impl NodeCore {
    /// Register a node in `ports`, falling back to `default_name`.
    pub fn new(ports: &mut PortArena, name: Option<&str>, default_name: &str) -> PortResult<Self> {
        let name = name.unwrap_or(default_name).to_string();
        let id = ports.add_node(name.clone())?;
        Ok(Self { id, name })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
