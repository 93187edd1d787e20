//! Small utility nodes used to seed, terminate and break cycles in networks.

use tn_core::{NodeId, PortId, Real};

use crate::error::{NodeResult, PortResult};
use crate::node::{Node, NodeCore};
use crate::port::PortArena;
use crate::state::PortState;

/// Free source writing a fixed state to its output every pass.
pub struct SourceNode {
    core: NodeCore,
    output: PortId,
    value: PortState,
}

impl SourceNode {
    pub fn new(ports: &mut PortArena, name: Option<&str>, value: PortState) -> PortResult<Self> {
        let core = NodeCore::new(ports, name, "SourceNode")?;
        let output = ports.add_port(core.id(), "output")?;
        Ok(Self {
            core,
            output,
            value,
        })
    }

    pub fn output_port(&self) -> PortId {
        self.output
    }

    pub fn value(&self) -> &PortState {
        &self.value
    }

    /// Replace the emitted state; takes effect on the next pass.
    pub fn set_value(&mut self, value: PortState) {
        self.value = value;
    }
}

impl Node for SourceNode {
    fn id(&self) -> NodeId {
        self.core.id()
    }

    fn name(&self) -> &str {
        self.core.name()
    }

    fn require_ports(&self) -> Vec<PortId> {
        Vec::new()
    }

    fn update_ports(&self) -> Vec<PortId> {
        vec![self.output]
    }

    fn process(&mut self, ports: &mut PortArena, _relax_coef: Real) -> NodeResult<()> {
        ports.set_state(self.output, self.value.clone())?;
        Ok(())
    }
}

/// Terminal node that consumes one port.
pub struct SinkNode {
    core: NodeCore,
    input: PortId,
}

impl SinkNode {
    pub fn new(ports: &mut PortArena, name: Option<&str>) -> PortResult<Self> {
        let core = NodeCore::new(ports, name, "SinkNode")?;
        let input = ports.add_port(core.id(), "input")?;
        Ok(Self { core, input })
    }

    pub fn input_port(&self) -> PortId {
        self.input
    }
}

impl Node for SinkNode {
    fn id(&self) -> NodeId {
        self.core.id()
    }

    fn name(&self) -> &str {
        self.core.name()
    }

    fn require_ports(&self) -> Vec<PortId> {
        vec![self.input]
    }

    fn update_ports(&self) -> Vec<PortId> {
        Vec::new()
    }

    fn process(&mut self, _ports: &mut PortArena, _relax_coef: Real) -> NodeResult<()> {
        Ok(())
    }
}

/// Breaks a dependency cycle.
///
/// The data port receives the value closing the loop but is not a required
/// port, so the breaker is free in the dependency matrix. Each pass the
/// update port is moved toward the data port state by `relax_coef`; until
/// the data port carries a state, the seed is emitted.
pub struct CycleBreakNode {
    core: NodeCore,
    update: PortId,
    data: PortId,
    seed: PortState,
}

impl CycleBreakNode {
    pub fn new(ports: &mut PortArena, name: Option<&str>, seed: PortState) -> PortResult<Self> {
        let core = NodeCore::new(ports, name, "CycleBreakNode")?;
        let update = ports.add_port(core.id(), "update")?;
        let data = ports.add_port(core.id(), "data")?;
        Ok(Self {
            core,
            update,
            data,
            seed,
        })
    }

    pub fn update_port(&self) -> PortId {
        self.update
    }

    pub fn data_port(&self) -> PortId {
        self.data
    }
}

impl Node for CycleBreakNode {
    fn id(&self) -> NodeId {
        self.core.id()
    }

    fn name(&self) -> &str {
        self.core.name()
    }

    fn require_ports(&self) -> Vec<PortId> {
        Vec::new()
    }

    fn update_ports(&self) -> Vec<PortId> {
        vec![self.update]
    }

    fn ports(&self) -> Vec<PortId> {
        vec![self.update, self.data]
    }

    fn process(&mut self, ports: &mut PortArena, relax_coef: Real) -> NodeResult<()> {
        let next = match (ports.state(self.data)?, ports.state(self.update)?) {
            (Some(data), Some(previous)) => previous.mix(data, relax_coef)?,
            (Some(data), None) => data.clone(),
            (None, _) => self.seed.clone(),
        };
        ports.set_state(self.update, next)?;
        Ok(())
    }
}
