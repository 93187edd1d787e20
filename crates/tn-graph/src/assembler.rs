//! Collects scalar port states into one vector state.

use std::collections::HashMap;

use nalgebra::DVector;
use tn_core::{NodeId, PortId, Real};

use crate::bimap::BiMap;
use crate::error::{NodeResult, PortError, PortResult};
use crate::node::{Node, NodeCore};
use crate::port::{Endpoint, PortArena};
use crate::state::PortState;

/// Assembles the states of its inputs, in insertion order, into a vector.
///
/// Inputs get sequential ids that are never reused, so deleting an input
/// does not shift the position of the others.
pub struct VectorAssemblerNode {
    core: NodeCore,
    inputs: BiMap<usize, Endpoint>,
    pairs: HashMap<usize, PortId>,
    next_id: usize,
    output: PortId,
}

impl VectorAssemblerNode {
    pub fn new(ports: &mut PortArena, name: Option<&str>) -> PortResult<Self> {
        let core = NodeCore::new(ports, name, "VectorAssemblerNode")?;
        let output = ports.add_port(core.id(), "vector_output")?;
        Ok(Self {
            core,
            inputs: BiMap::new(),
            pairs: HashMap::new(),
            next_id: 0,
            output,
        })
    }

    /// Add inputs; endpoints already present are ignored.
    ///
    /// Every new endpoint is checked first, so a rejected call leaves the
    /// node and the arena untouched.
    pub fn add_input_ports(&mut self, ports: &mut PortArena, inputs: &[Endpoint]) -> PortResult<()> {
        let mut fresh: Vec<Endpoint> = Vec::with_capacity(inputs.len());
        for &input in inputs {
            if self.inputs.contains_val(&input) || fresh.contains(&input) {
                continue;
            }
            if ports.link_port(input)?.is_some() {
                return Err(PortError::AlreadyLinked { endpoint: input });
            }
            fresh.push(input);
        }

        for input in fresh {
            let id = self.next_id;
            self.inputs.add(id, input)?;
            let pair = ports.add_port(self.core.id(), format!("input{id}"))?;
            ports.link(pair, input)?;
            self.pairs.insert(id, pair);
            self.next_id += 1;
        }
        Ok(())
    }

    /// Remove inputs; endpoints not present are ignored.
    pub fn delete_input_ports(&mut self, ports: &mut PortArena, inputs: &[Endpoint]) -> PortResult<()> {
        for input in inputs {
            if let Some(&id) = self.inputs.get_by_val(input) {
                self.remove(ports, id)?;
            }
        }
        Ok(())
    }

    /// Remove the input served by one of this node's pair ports.
    pub fn delete_pair_port(&mut self, ports: &mut PortArena, pair: PortId) -> PortResult<()> {
        let id = self
            .pairs
            .iter()
            .find(|(_, p)| **p == pair)
            .map(|(id, _)| *id);
        if let Some(id) = id {
            self.remove(ports, id)?;
        }
        Ok(())
    }

    /// Input endpoints in vector order.
    pub fn input_ports(&self) -> Vec<Endpoint> {
        self.sorted_ids()
            .into_iter()
            .filter_map(|id| self.inputs.get_by_key(&id).copied())
            .collect()
    }

    pub fn output_port(&self) -> PortId {
        self.output
    }

    pub fn output_vector<'a>(&self, ports: &'a PortArena) -> Option<&'a DVector<Real>> {
        ports
            .state(self.output)
            .ok()
            .flatten()
            .and_then(|state| state.as_vector().ok())
    }

    /// `(input owner name, value)` pairs sorted by name. Diagnostics only.
    pub fn named_report(&self, ports: &PortArena) -> NodeResult<Vec<(String, Real)>> {
        let mut report = Vec::with_capacity(self.pairs.len());
        for pair in self.require_ports() {
            let name = match ports.outer_node(pair)? {
                Some(node) => ports.node_label(node)?.to_string(),
                None => ports.tag(pair)?.to_string(),
            };
            report.push((name, self.input_value(ports, pair)?));
        }
        report.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(report)
    }

    fn remove(&mut self, ports: &mut PortArena, id: usize) -> PortResult<()> {
        if let Some(pair) = self.pairs.remove(&id) {
            ports.unlink(pair)?;
        }
        self.inputs.delete_by_key(&id);
        Ok(())
    }

    fn sorted_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.pairs.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn input_value(&self, ports: &PortArena, pair: PortId) -> NodeResult<Real> {
        let state = match ports.link_port(pair)? {
            Some(input) => ports.require_state(input)?,
            None => ports.require_state(pair)?,
        };
        Ok(state.as_scalar()?)
    }
}

impl Node for VectorAssemblerNode {
    fn id(&self) -> NodeId {
        self.core.id()
    }

    fn name(&self) -> &str {
        self.core.name()
    }

    fn require_ports(&self) -> Vec<PortId> {
        self.sorted_ids()
            .into_iter()
            .filter_map(|id| self.pairs.get(&id).copied())
            .collect()
    }

    fn update_ports(&self) -> Vec<PortId> {
        vec![self.output]
    }

    fn process(&mut self, ports: &mut PortArena, _relax_coef: Real) -> NodeResult<()> {
        let reader: &PortArena = ports;
        let values = self
            .require_ports()
            .into_iter()
            .map(|pair| self.input_value(reader, pair))
            .collect::<NodeResult<Vec<Real>>>()?;
        ports.set_state(self.output, PortState::Vector(DVector::from_vec(values)))?;
        Ok(())
    }
}
