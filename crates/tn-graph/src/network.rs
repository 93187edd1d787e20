//! Fixed-point driver over a validated node set.

use std::collections::HashMap;

use tn_core::{NodeId, PortId, Real, ensure_finite};
use tracing::{debug, info, warn};

use crate::error::{GraphResult, PortResult, SnapshotMismatch, SolveError, SolveResult};
use crate::matrix::GraphMatrix;
use crate::node::Node;
use crate::port::{Endpoint, PortArena};
use crate::state::PortState;

/// Iteration settings for [`Network::solve_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolveConfig {
    /// Passed to every node's `process`; nodes that blend old and new
    /// states use it as the weight of the new state.
    pub relax_coef: Real,
    /// Leading passes run without a convergence check.
    pub skip_iterations: usize,
    pub max_iterations: usize,
    /// Convergence threshold on the largest relative port residual.
    pub precision: Real,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            relax_coef: 1.0,
            skip_iterations: 1,
            max_iterations: 100,
            precision: 1e-6,
        }
    }
}

/// Result of a solve that did not fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOutcome {
    pub converged: bool,
    /// Passes executed.
    pub iterations: usize,
    /// Residual of the last checked pass; `None` if every pass was skipped.
    pub residual: Option<Real>,
}

type Snapshot = HashMap<NodeId, Vec<(PortId, Option<PortState>)>>;

/// A validated node set together with the ports it reads and writes.
///
/// Construction checks the structure once; afterwards only port states and
/// the matrix's working copy change.
pub struct Network {
    ports: PortArena,
    nodes: Vec<Box<dyn Node>>,
    matrix: GraphMatrix,
}

impl Network {
    pub fn new(ports: PortArena, nodes: Vec<Box<dyn Node>>) -> GraphResult<Self> {
        let matrix = GraphMatrix::new(&nodes, &ports)?;
        Ok(Self {
            ports,
            nodes,
            matrix,
        })
    }

    pub fn ports(&self) -> &PortArena {
        &self.ports
    }

    /// Seed a port between solves, e.g. a breaker's update port. Links are
    /// fixed once the network is built, so only states can be written.
    pub fn set_state(&mut self, endpoint: impl Into<Endpoint>, state: PortState) -> PortResult<()> {
        self.ports.set_state(endpoint, state)
    }

    pub fn set_all<E>(&mut self, endpoints: &[E], states: Vec<PortState>) -> PortResult<()>
    where
        E: Into<Endpoint> + Copy,
    {
        self.ports.set_all(endpoints, states)
    }

    pub fn nodes(&self) -> &[Box<dyn Node>] {
        &self.nodes
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut (dyn Node + 'static)> {
        let index = self.matrix.index_of(id)?;
        self.nodes.get_mut(index).map(|node| node.as_mut())
    }

    pub fn matrix(&self) -> &GraphMatrix {
        &self.matrix
    }

    /// Node indices in evaluation order.
    pub fn call_order(&mut self) -> GraphResult<Vec<usize>> {
        self.matrix.call_order()
    }

    /// Iterate until the largest port residual drops to `precision` or the
    /// budget runs out. Returns `Ok(false)` when the budget is exhausted.
    pub fn solve(
        &mut self,
        relax_coef: Real,
        skip_iterations: usize,
        max_iterations: usize,
        precision: Real,
    ) -> SolveResult<bool> {
        let config = SolveConfig {
            relax_coef,
            skip_iterations,
            max_iterations,
            precision,
        };
        Ok(self.solve_with(&config)?.converged)
    }

    pub fn solve_with(&mut self, config: &SolveConfig) -> SolveResult<SolveOutcome> {
        let order = self.matrix.call_order()?;
        let mut last_residual = None;

        for iteration in 0..config.max_iterations {
            let before = self.snapshot()?;
            for &i in &order {
                let node = &mut self.nodes[i];
                node.process(&mut self.ports, config.relax_coef)
                    .map_err(|source| SolveError::Process {
                        iteration,
                        node: node.name().to_string(),
                        source,
                    })?;
            }
            let after = self.snapshot()?;

            if iteration < config.skip_iterations {
                continue;
            }

            let residual = self.max_residual(&before, &after)?;
            debug!(iteration, residual, "network pass");
            last_residual = Some(residual);
            if residual <= config.precision {
                info!(iterations = iteration + 1, residual, "network converged");
                return Ok(SolveOutcome {
                    converged: true,
                    iterations: iteration + 1,
                    residual: Some(residual),
                });
            }
        }

        warn!(
            max_iterations = config.max_iterations,
            residual = ?last_residual,
            "network did not converge"
        );
        Ok(SolveOutcome {
            converged: false,
            iterations: config.max_iterations,
            residual: last_residual,
        })
    }

    fn snapshot(&self) -> SolveResult<Snapshot> {
        let mut snapshot = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let mut states = Vec::new();
            for port in node.ports() {
                states.push((port, self.ports.state(port)?.cloned()));
            }
            snapshot.insert(node.id(), states);
        }
        Ok(snapshot)
    }

    /// Largest residual over every port present in both snapshots.
    ///
    /// A pair with no state on either side is skipped; a state on only one
    /// side is an error, since nodes may legitimately leave a port empty
    /// until their first activation but must not clear it afterwards. A
    /// non-finite port residual (NaN or infinite states) is always an error.
    fn max_residual(&self, before: &Snapshot, after: &Snapshot) -> SolveResult<Real> {
        let mut residual: Real = 0.0;

        for (node, old_states) in before {
            let mismatch = |what| SolveError::Residual {
                node: self.label(*node),
                what,
            };
            let Some(new_states) = after.get(node) else {
                return Err(mismatch(SnapshotMismatch::MissingNode));
            };
            if old_states.len() != new_states.len() {
                return Err(mismatch(SnapshotMismatch::PortCount {
                    before: old_states.len(),
                    after: new_states.len(),
                }));
            }

            for ((port, old), (_, new)) in old_states.iter().zip(new_states) {
                match (old, new) {
                    (None, None) => continue,
                    (Some(old), Some(new)) => {
                        let r = old.max_residual(new).map_err(|source| SolveError::State {
                            node: self.label(*node),
                            source,
                        })?;
                        let r = ensure_finite(r, "port residual").map_err(|source| {
                            SolveError::NonFinite {
                                node: self.label(*node),
                                port: *port,
                                source,
                            }
                        })?;
                        residual = residual.max(r);
                    }
                    _ => return Err(mismatch(SnapshotMismatch::OneSidedState { port: *port })),
                }
            }
        }

        if let Some(node) = after.keys().find(|node| !before.contains_key(*node)) {
            return Err(SolveError::Residual {
                node: self.label(*node),
                what: SnapshotMismatch::MissingNode,
            });
        }

        Ok(residual)
    }

    fn label(&self, node: NodeId) -> String {
        self.ports
            .node_label(node)
            .map(str::to_string)
            .unwrap_or_else(|_| node.to_string())
    }
}
