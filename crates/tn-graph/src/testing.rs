//! Topology stubs shared by unit tests.

use tn_core::{NodeId, PortId, Real};

use crate::error::NodeResult;
use crate::node::{Node, NodeCore};
use crate::port::PortArena;

/// Node with arbitrary port roles whose `process` does nothing.
pub(crate) struct StubNode {
    core: NodeCore,
    pub(crate) require: Vec<PortId>,
    pub(crate) update: Vec<PortId>,
    pub(crate) context: bool,
}

impl StubNode {
    pub(crate) fn new(arena: &mut PortArena, name: &str) -> Self {
        Self {
            core: NodeCore::new(arena, Some(name), "StubNode").unwrap(),
            require: Vec::new(),
            update: Vec::new(),
            context: true,
        }
    }

    pub(crate) fn input(&mut self, arena: &mut PortArena) -> PortId {
        let port = arena
            .add_port(self.core.id(), format!("in{}", self.require.len()))
            .unwrap();
        self.require.push(port);
        port
    }

    pub(crate) fn output(&mut self, arena: &mut PortArena) -> PortId {
        let port = arena
            .add_port(self.core.id(), format!("out{}", self.update.len()))
            .unwrap();
        self.update.push(port);
        port
    }
}

impl Node for StubNode {
    fn id(&self) -> NodeId {
        self.core.id()
    }

    fn name(&self) -> &str {
        self.core.name()
    }

    fn require_ports(&self) -> Vec<PortId> {
        self.require.clone()
    }

    fn update_ports(&self) -> Vec<PortId> {
        self.update.clone()
    }

    fn context_defined(&self, _key: usize) -> bool {
        self.context
    }

    fn process(&mut self, _ports: &mut PortArena, _relax_coef: Real) -> NodeResult<()> {
        Ok(())
    }
}

/// `to` requires `from`: links a new output of `from` to a new input of `to`.
pub(crate) fn connect(arena: &mut PortArena, from: &mut StubNode, to: &mut StubNode) {
    let out = from.output(arena);
    let inp = to.input(arena);
    arena.link(out, inp).unwrap();
}
