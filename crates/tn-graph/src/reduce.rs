//! Two-level fold over groups of observed ports.
//!
//! Used to build balance equations (mass rate equality, power balance) whose
//! scalar output feeds an outer root finder.

use tn_core::{NodeId, PortId, Real};

use crate::error::{NodeResult, PortError, PortResult};
use crate::node::{Node, NodeCore};
use crate::port::{Endpoint, PortArena};
use crate::state::PortState;

/// Folds one port state into a group accumulator.
pub type GroupReduceFn = Box<dyn Fn(Real, &PortState) -> NodeResult<Real>>;
/// Folds one group result into the total accumulator.
pub type TotalReduceFn = Box<dyn Fn(Real, Real) -> NodeResult<Real>>;

pub struct ReduceNode {
    core: NodeCore,
    group_fn: GroupReduceFn,
    total_fn: TotalReduceFn,
    group_init: Real,
    total_init: Real,
    pair_ports: Vec<PortId>,
    /// Group g covers `pair_ports[bounds[g]..bounds[g + 1]]`.
    bounds: Vec<usize>,
    output: PortId,
}

impl ReduceNode {
    pub fn new(
        ports: &mut PortArena,
        name: Option<&str>,
        group_fn: impl Fn(Real, &PortState) -> NodeResult<Real> + 'static,
        total_fn: impl Fn(Real, Real) -> NodeResult<Real> + 'static,
        group_init: Real,
        total_init: Real,
    ) -> PortResult<Self> {
        let core = NodeCore::new(ports, name, "ReduceNode")?;
        let output = ports.add_port(core.id(), "output")?;
        Ok(Self {
            core,
            group_fn: Box::new(group_fn),
            total_fn: Box::new(total_fn),
            group_init,
            total_init,
            pair_ports: Vec::new(),
            bounds: vec![0],
            output,
        })
    }

    /// Append a group. Each endpoint gets its own pair port linked to it, so
    /// the node becomes a consumer of every endpoint's owner. Pass weak ports
    /// to observe ports that are already linked.
    pub fn add_port_group(&mut self, ports: &mut PortArena, group: &[Endpoint]) -> PortResult<()> {
        for (i, &endpoint) in group.iter().enumerate() {
            if ports.link_port(endpoint)?.is_some() || group[..i].contains(&endpoint) {
                return Err(PortError::AlreadyLinked { endpoint });
            }
        }
        let group_index = self.bounds.len() - 1;
        for (k, &endpoint) in group.iter().enumerate() {
            let pair = ports.add_port(self.core.id(), format!("group{group_index}_port{k}"))?;
            ports.link(pair, endpoint)?;
            self.pair_ports.push(pair);
        }
        self.bounds.push(self.pair_ports.len());
        Ok(())
    }

    pub fn output_port(&self) -> PortId {
        self.output
    }

    pub fn group_count(&self) -> usize {
        self.bounds.len() - 1
    }
}

impl Node for ReduceNode {
    fn id(&self) -> NodeId {
        self.core.id()
    }

    fn name(&self) -> &str {
        self.core.name()
    }

    fn require_ports(&self) -> Vec<PortId> {
        self.pair_ports.clone()
    }

    fn update_ports(&self) -> Vec<PortId> {
        vec![self.output]
    }

    fn process(&mut self, ports: &mut PortArena, _relax_coef: Real) -> NodeResult<()> {
        let mut total = self.total_init;
        for window in self.bounds.windows(2) {
            let mut acc = self.group_init;
            for &pair in &self.pair_ports[window[0]..window[1]] {
                let state = match ports.link_port(pair)? {
                    Some(observed) => ports.require_state(observed)?,
                    None => ports.require_state(pair)?,
                };
                acc = (self.group_fn)(acc, state)?;
            }
            total = (self.total_fn)(total, acc)?;
        }
        ports.set_state(self.output, PortState::scalar(total))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NodeError;

    fn multiply(acc: Real, state: &PortState) -> NodeResult<Real> {
        Ok(acc * state.as_scalar()?)
    }

    fn add(acc: Real, group: Real) -> NodeResult<Real> {
        Ok(acc + group)
    }

    /// Ports owned by a dummy node, each holding `values[i]`.
    fn valued_ports(arena: &mut PortArena, values: &[Real]) -> Vec<PortId> {
        let owner = arena.add_node("source").unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let p = arena.add_port(owner, format!("v{i}")).unwrap();
                arena.set_state(p, PortState::scalar(v)).unwrap();
                p
            })
            .collect()
    }

    #[test]
    fn product_per_group_sum_across_groups() {
        let mut arena = PortArena::new();
        let values = valued_ports(&mut arena, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut node = ReduceNode::new(&mut arena, None, multiply, add, 1.0, 0.0).unwrap();

        let first: Vec<Endpoint> = values[..2].iter().map(|&p| p.into()).collect();
        // Observe the second group through weak views.
        let second: Vec<Endpoint> = values[2..]
            .iter()
            .map(|&p| arena.add_weak_port(p).unwrap().into())
            .collect();
        node.add_port_group(&mut arena, &first).unwrap();
        node.add_port_group(&mut arena, &second).unwrap();
        assert_eq!(node.group_count(), 2);
        assert_eq!(node.name(), "ReduceNode");

        node.process(&mut arena, 1.0).unwrap();
        let out = arena.state(node.output_port()).unwrap().unwrap();
        assert_eq!(out.as_scalar().unwrap(), 62.0);
    }

    #[test]
    fn empty_node_outputs_total_init() {
        let mut arena = PortArena::new();
        let mut node = ReduceNode::new(&mut arena, Some("balance"), multiply, add, 1.0, -3.5)
            .unwrap();
        node.process(&mut arena, 1.0).unwrap();
        let out = arena.state(node.output_port()).unwrap().unwrap();
        assert_eq!(out.as_scalar().unwrap(), -3.5);
        assert!(node.require_ports().is_empty());
    }

    #[test]
    fn reduce_error_is_surfaced_unchanged() {
        let mut arena = PortArena::new();
        let values = valued_ports(&mut arena, &[1.0]);
        let failing = |_: Real, _: &PortState| -> NodeResult<Real> {
            Err(NodeError::Reduce {
                what: "negative mass rate".into(),
            })
        };
        let mut node = ReduceNode::new(&mut arena, None, failing, add, 0.0, 0.0).unwrap();
        node.add_port_group(&mut arena, &[values[0].into()]).unwrap();

        let err = node.process(&mut arena, 1.0).unwrap_err();
        assert_eq!(
            err,
            NodeError::Reduce {
                what: "negative mass rate".into()
            }
        );
        assert_eq!(arena.state(node.output_port()).unwrap(), None);
    }

    #[test]
    fn already_linked_endpoint_is_rejected_whole_group() {
        let mut arena = PortArena::new();
        let values = valued_ports(&mut arena, &[1.0, 2.0]);
        let other = arena.add_node("other").unwrap();
        let sink = arena.add_port(other, "in").unwrap();
        arena.link(values[1], sink).unwrap();

        let mut node = ReduceNode::new(&mut arena, None, multiply, add, 1.0, 0.0).unwrap();
        let err = node
            .add_port_group(&mut arena, &[values[0].into(), values[1].into()])
            .unwrap_err();
        assert!(matches!(err, PortError::AlreadyLinked { .. }));
        assert_eq!(node.group_count(), 0);
        assert_eq!(arena.link_port(values[0]).unwrap(), None);
    }
}
