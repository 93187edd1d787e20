//! Port arena: owning ports, weak ports and the links between them.
//!
//! Nodes never hold references to each other. They hold `PortId` handles
//! into a [`PortArena`], and every link is recorded on both endpoints as
//! `(outer node, link endpoint)`. A port's inner node is fixed when it is
//! created; its link side is set exactly once, by [`PortArena::link`].
//!
//! Weak ports are views: state reads and writes go to their target port,
//! while their link side is their own. Linking a weak port therefore never
//! disturbs the target's existing link.

use std::fmt;

use tn_core::{NodeId, PortId, WeakPortId};

use crate::error::{NodeError, NodeResult, PortError, PortResult};
use crate::state::PortState;

/// Either kind of linkable endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Port(PortId),
    Weak(WeakPortId),
}

impl From<PortId> for Endpoint {
    fn from(id: PortId) -> Self {
        Endpoint::Port(id)
    }
}

impl From<WeakPortId> for Endpoint {
    fn from(id: WeakPortId) -> Self {
        Endpoint::Weak(id)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Port(p) => write!(f, "{}", p),
            Endpoint::Weak(w) => write!(f, "{}", w),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LinkSide {
    outer: NodeId,
    link: Endpoint,
}

#[derive(Debug, Clone)]
struct PortSlot {
    inner: NodeId,
    tag: String,
    state: Option<PortState>,
    link: Option<LinkSide>,
    attached: Vec<PortId>,
}

#[derive(Debug, Clone)]
struct WeakSlot {
    target: PortId,
    link: Option<LinkSide>,
}

/// Storage for every node label, port and weak port of one network.
#[derive(Debug, Clone, Default)]
pub struct PortArena {
    nodes: Vec<String>,
    ports: Vec<PortSlot>,
    weak: Vec<WeakSlot>,
}

impl PortArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node identity. The label is used in diagnostics and reports.
    pub fn add_node(&mut self, label: impl Into<String>) -> PortResult<NodeId> {
        let id = NodeId::from_index(next_index(self.nodes.len(), "nodes")?);
        self.nodes.push(label.into());
        Ok(id)
    }

    /// Create a port owned by `inner`.
    pub fn add_port(&mut self, inner: NodeId, tag: impl Into<String>) -> PortResult<PortId> {
        self.node_label(inner)?;
        let id = PortId::from_index(next_index(self.ports.len(), "ports")?);
        self.ports.push(PortSlot {
            inner,
            tag: tag.into(),
            state: None,
            link: None,
            attached: Vec::new(),
        });
        Ok(id)
    }

    /// Create a weak view of `target`.
    pub fn add_weak_port(&mut self, target: PortId) -> PortResult<WeakPortId> {
        self.port(target)?;
        let id = WeakPortId::from_index(next_index(self.weak.len(), "weak ports")?);
        self.weak.push(WeakSlot { target, link: None });
        Ok(id)
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn node_label(&self, node: NodeId) -> PortResult<&str> {
        self.nodes
            .get(node.slot())
            .map(String::as_str)
            .ok_or(PortError::UnknownNode { node })
    }

    /// Node owning the endpoint. A weak port reports its target's owner.
    pub fn inner_node(&self, endpoint: impl Into<Endpoint>) -> PortResult<NodeId> {
        let port = self.resolve(endpoint.into())?;
        Ok(self.port(port)?.inner)
    }

    /// Node on the other side of the endpoint's link, if linked.
    pub fn outer_node(&self, endpoint: impl Into<Endpoint>) -> PortResult<Option<NodeId>> {
        Ok(self.link_side(endpoint.into())?.map(|side| side.outer))
    }

    /// Endpoint on the other side of the link, if linked.
    pub fn link_port(&self, endpoint: impl Into<Endpoint>) -> PortResult<Option<Endpoint>> {
        Ok(self.link_side(endpoint.into())?.map(|side| side.link))
    }

    /// Diagnostic tag. A weak port reports its target's tag.
    pub fn tag(&self, endpoint: impl Into<Endpoint>) -> PortResult<&str> {
        let port = self.resolve(endpoint.into())?;
        Ok(self.port(port)?.tag.as_str())
    }

    pub fn state(&self, endpoint: impl Into<Endpoint>) -> PortResult<Option<&PortState>> {
        let port = self.resolve(endpoint.into())?;
        Ok(self.port(port)?.state.as_ref())
    }

    /// State of the endpoint at the other side of the link.
    pub fn linked_state(&self, endpoint: impl Into<Endpoint>) -> PortResult<Option<&PortState>> {
        match self.link_port(endpoint)? {
            Some(other) => self.state(other),
            None => Ok(None),
        }
    }

    /// State of `endpoint`, or `NodeError::MissingState` naming its tag.
    pub fn require_state(&self, endpoint: impl Into<Endpoint>) -> NodeResult<&PortState> {
        let endpoint = endpoint.into();
        match self.state(endpoint)? {
            Some(state) => Ok(state),
            None => Err(NodeError::MissingState {
                port: self.tag(endpoint)?.to_string(),
            }),
        }
    }

    /// Link two endpoints in both directions.
    ///
    /// Fails without mutating anything if either endpoint is already linked.
    pub fn link(&mut self, a: impl Into<Endpoint>, b: impl Into<Endpoint>) -> PortResult<()> {
        let (a, b) = (a.into(), b.into());
        if a == b {
            return Err(PortError::SelfLink { endpoint: a });
        }
        let inner_a = self.inner_node(a)?;
        let inner_b = self.inner_node(b)?;
        for endpoint in [a, b] {
            if self.link_side(endpoint)?.is_some() {
                return Err(PortError::AlreadyLinked { endpoint });
            }
        }

        *self.link_side_mut(a)? = Some(LinkSide {
            outer: inner_b,
            link: b,
        });
        *self.link_side_mut(b)? = Some(LinkSide {
            outer: inner_a,
            link: a,
        });
        Ok(())
    }

    /// Dissolve the link of `endpoint` on both sides; no-op if unlinked.
    ///
    /// Only nodes that drop one of their own ports call this.
    pub fn unlink(&mut self, endpoint: impl Into<Endpoint>) -> PortResult<()> {
        let endpoint = endpoint.into();
        if let Some(side) = self.link_side(endpoint)? {
            *self.link_side_mut(side.link)? = None;
            *self.link_side_mut(endpoint)? = None;
        }
        Ok(())
    }

    /// Link `left[i]` with `right[i]` for every i.
    pub fn link_all<A, B>(&mut self, left: &[A], right: &[B]) -> PortResult<()>
    where
        A: Into<Endpoint> + Copy,
        B: Into<Endpoint> + Copy,
    {
        if left.len() != right.len() {
            return Err(PortError::LengthMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        for (&a, &b) in left.iter().zip(right) {
            self.link(a, b)?;
        }
        Ok(())
    }

    /// Store `state`, then push it to the linked endpoint and to every
    /// attached port without bouncing back.
    pub fn set_state(&mut self, endpoint: impl Into<Endpoint>, state: PortState) -> PortResult<()> {
        let port = self.resolve(endpoint.into())?;
        let slot = self.port(port)?;
        let link = slot.link.map(|side| side.link);
        let attached = slot.attached.clone();

        if let Some(other) = link {
            self.set_state_no_reverse(other, state.clone())?;
        }
        for dependent in attached {
            self.set_state_no_reverse(dependent, state.clone())?;
        }
        self.port_mut(port)?.state = Some(state);
        Ok(())
    }

    /// Store `state` on the endpoint only.
    pub fn set_state_no_reverse(
        &mut self,
        endpoint: impl Into<Endpoint>,
        state: PortState,
    ) -> PortResult<()> {
        let port = self.resolve(endpoint.into())?;
        self.port_mut(port)?.state = Some(state);
        Ok(())
    }

    /// Set `states[i]` on `endpoints[i]` for every i.
    pub fn set_all<E>(&mut self, endpoints: &[E], states: Vec<PortState>) -> PortResult<()>
    where
        E: Into<Endpoint> + Copy,
    {
        if endpoints.len() != states.len() {
            return Err(PortError::LengthMismatch {
                left: endpoints.len(),
                right: states.len(),
            });
        }
        for (&endpoint, state) in endpoints.iter().zip(states) {
            self.set_state(endpoint, state)?;
        }
        Ok(())
    }

    /// Mirror every state written to `port` onto `dependent` as well.
    ///
    /// This is one-way fan-out; it adds no link and no dependency edge.
    pub fn attach(&mut self, port: PortId, dependent: PortId) -> PortResult<()> {
        self.port(dependent)?;
        self.port_mut(port)?.attached.push(dependent);
        Ok(())
    }

    fn resolve(&self, endpoint: Endpoint) -> PortResult<PortId> {
        match endpoint {
            Endpoint::Port(p) => {
                self.port(p)?;
                Ok(p)
            }
            Endpoint::Weak(w) => Ok(self.weak_slot(w)?.target),
        }
    }

    fn link_side(&self, endpoint: Endpoint) -> PortResult<Option<LinkSide>> {
        match endpoint {
            Endpoint::Port(p) => Ok(self.port(p)?.link),
            Endpoint::Weak(w) => Ok(self.weak_slot(w)?.link),
        }
    }

    fn link_side_mut(&mut self, endpoint: Endpoint) -> PortResult<&mut Option<LinkSide>> {
        match endpoint {
            Endpoint::Port(p) => Ok(&mut self.port_mut(p)?.link),
            Endpoint::Weak(w) => self
                .weak
                .get_mut(w.slot())
                .map(|slot| &mut slot.link)
                .ok_or(PortError::UnknownWeakPort { port: w }),
        }
    }

    fn port(&self, port: PortId) -> PortResult<&PortSlot> {
        self.ports
            .get(port.slot())
            .ok_or(PortError::UnknownPort { port })
    }

    fn port_mut(&mut self, port: PortId) -> PortResult<&mut PortSlot> {
        self.ports
            .get_mut(port.slot())
            .ok_or(PortError::UnknownPort { port })
    }

    fn weak_slot(&self, weak: WeakPortId) -> PortResult<&WeakSlot> {
        self.weak
            .get(weak.slot())
            .ok_or(PortError::UnknownWeakPort { port: weak })
    }
}

/// Index for the next entry of a collection holding `len` entries.
///
/// `u32::MAX` itself is refused since ids store `index + 1`.
fn next_index(len: usize, what: &'static str) -> PortResult<u32> {
    u32::try_from(len)
        .ok()
        .filter(|&index| index < u32::MAX)
        .ok_or(PortError::CapacityExceeded { what })
}
