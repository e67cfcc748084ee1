//! The node graph: aggregate root, wiring, and incremental evaluation
//!
//! `NodeGraph` owns every node and connection in arena maps keyed by opaque
//! ids. Sockets and connections never hold references to each other; all
//! resolution goes through the graph, which keeps ownership single-rooted
//! and the whole structure serializable.
//!
//! Evaluation is pull-based: `get_output_value` serves the cache when the
//! node is Clean and otherwise recomputes, recursively pulling upstream
//! values first. `mark_dirty` pushes staleness downstream so the next pull
//! recomputes exactly the affected region.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ComputeError, GraphError};
use crate::hooks::GraphObserver;
use crate::node::{ComputeContext, Node, NodeId, NodeState};
use crate::socket::{Socket, SocketDirection};
use crate::socket_types::SocketType;
use crate::value::Value;

/// Unique identifier for a connection, assigned by the owning graph.
pub type ConnectionId = usize;

/// A directed edge from an output socket to an input socket. Endpoints are
/// stored as ids and names, resolved through the graph on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub from_node: NodeId,
    pub from_socket: String,
    pub to_node: NodeId,
    pub to_socket: String,
}

/// Everything an input socket needs resolved before its node can compute,
/// cloned out of the graph so evaluation can recurse without holding borrows.
struct InputPlan {
    name: String,
    socket_type: SocketType,
    multi: bool,
    default: Value,
    sources: Vec<(NodeId, String)>,
}

/// Aggregate root owning all nodes and connections.
pub struct NodeGraph {
    nodes: HashMap<NodeId, Node>,
    connections: HashMap<ConnectionId, Connection>,
    next_node_id: NodeId,
    next_connection_id: ConnectionId,
    observers: Vec<Box<dyn GraphObserver>>,
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeGraph {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            connections: HashMap::new(),
            next_node_id: 1,
            next_connection_id: 1,
            observers: Vec::new(),
        }
    }

    /// Adds a node and returns its assigned id.
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        node.assign_id(id);
        debug!("added node {} ({})", id, node.type_name());
        self.nodes.insert(id, node);
        id
    }

    /// Removes a node, disconnecting it first, and returns it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        let mut attached: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| c.from_node == id || c.to_node == id)
            .map(|c| c.id)
            .collect();
        attached.sort_unstable();
        for cid in attached {
            self.disconnect(cid)?;
        }
        debug!("removed node {id}");
        self.nodes.remove(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Mutable access for title/position edits. Parameter and cache changes
    /// go through [`NodeGraph::set_parameter`] and friends so staleness is
    /// tracked.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// All node ids in ascending (insertion) order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Registers an observer for state and value change notifications.
    pub fn add_observer(&mut self, observer: Box<dyn GraphObserver>) {
        self.observers.push(observer);
    }

    /// Removes every node and connection. Observers stay registered.
    pub fn clear(&mut self) {
        debug!(
            "cleared graph ({} nodes, {} connections)",
            self.nodes.len(),
            self.connections.len()
        );
        self.nodes.clear();
        self.connections.clear();
        self.next_node_id = 1;
        self.next_connection_id = 1;
    }

    /// Wires an output socket to an input socket. Validates everything
    /// before touching any state; on failure the graph is unchanged. On
    /// success the input node and its downstream region are marked dirty.
    pub fn connect_nodes(
        &mut self,
        from_node: NodeId,
        from_socket: &str,
        to_node: NodeId,
        to_socket: &str,
    ) -> Result<ConnectionId, GraphError> {
        {
            let from = self
                .nodes
                .get(&from_node)
                .ok_or(GraphError::NodeNotFound(from_node))?;
            let to = self
                .nodes
                .get(&to_node)
                .ok_or(GraphError::NodeNotFound(to_node))?;
            let output = from.output(from_socket).ok_or_else(|| GraphError::SocketNotFound {
                node: from_node,
                name: from_socket.to_string(),
                direction: SocketDirection::Output,
            })?;
            let input = to.input(to_socket).ok_or_else(|| GraphError::SocketNotFound {
                node: to_node,
                name: to_socket.to_string(),
                direction: SocketDirection::Input,
            })?;
            output.check_connection(input)?;
        }

        let id = self.next_connection_id;
        self.next_connection_id += 1;
        self.connections.insert(
            id,
            Connection {
                id,
                from_node,
                from_socket: from_socket.to_string(),
                to_node,
                to_socket: to_socket.to_string(),
            },
        );
        if let Some(node) = self.nodes.get_mut(&from_node) {
            if let Some(socket) = node.output_mut(from_socket) {
                socket.add_connection(id);
            }
        }
        if let Some(node) = self.nodes.get_mut(&to_node) {
            if let Some(socket) = node.input_mut(to_socket) {
                socket.add_connection(id);
            }
        }
        debug!("connected {from_node}.{from_socket} -> {to_node}.{to_socket} as connection {id}");
        self.mark_dirty(to_node, true)?;
        Ok(id)
    }

    /// Removes a connection, deregistering it from both endpoint sockets
    /// and marking the input node dirty.
    pub fn disconnect(&mut self, id: ConnectionId) -> Result<(), GraphError> {
        let conn = self
            .connections
            .remove(&id)
            .ok_or(GraphError::ConnectionNotFound(id))?;
        if let Some(node) = self.nodes.get_mut(&conn.from_node) {
            if let Some(socket) = node.output_mut(&conn.from_socket) {
                socket.remove_connection(id);
            }
        }
        if let Some(node) = self.nodes.get_mut(&conn.to_node) {
            if let Some(socket) = node.input_mut(&conn.to_socket) {
                socket.remove_connection(id);
            }
        }
        debug!(
            "disconnected {}.{} -> {}.{}",
            conn.from_node, conn.from_socket, conn.to_node, conn.to_socket
        );
        if self.nodes.contains_key(&conn.to_node) {
            self.mark_dirty(conn.to_node, true)?;
        }
        Ok(())
    }

    /// Advisory pre-check: would `connect_nodes` with these endpoints
    /// succeed, and would the new edge keep the graph acyclic?
    pub fn can_connect(
        &self,
        from_node: NodeId,
        from_socket: &str,
        to_node: NodeId,
        to_socket: &str,
    ) -> bool {
        let valid = match (self.nodes.get(&from_node), self.nodes.get(&to_node)) {
            (Some(from), Some(to)) => match (from.output(from_socket), to.input(to_socket)) {
                (Some(output), Some(input)) => output.can_connect_to(input),
                _ => false,
            },
            _ => false,
        };
        valid && !self.dependencies(from_node).contains(&to_node)
    }

    /// Transitive upstream nodes feeding `node`, ascending id order.
    pub fn dependencies(&self, node: NodeId) -> Vec<NodeId> {
        self.traverse(node, SocketDirection::Input)
    }

    /// Transitive downstream nodes fed by `node`, ascending id order.
    pub fn dependents(&self, node: NodeId) -> Vec<NodeId> {
        self.traverse(node, SocketDirection::Output)
    }

    fn traverse(&self, start: NodeId, direction: SocketDirection) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get(&id) else { continue };
            let sockets: &[Socket] = match direction {
                SocketDirection::Input => node.inputs(),
                SocketDirection::Output => node.outputs(),
            };
            for socket in sockets {
                for cid in socket.connection_ids() {
                    if let Some(conn) = self.connections.get(cid) {
                        queue.push_back(match direction {
                            SocketDirection::Input => conn.from_node,
                            SocketDirection::Output => conn.to_node,
                        });
                    }
                }
            }
        }
        visited.remove(&start);
        let mut out: Vec<NodeId> = visited.into_iter().collect();
        out.sort_unstable();
        out
    }

    /// Marks a node stale, invalidating its cache. With `propagate`, walks
    /// the downstream region breadth-first using a visited set scoped to
    /// this call, so nodes that were already Dirty still forward staleness
    /// to their own dependents.
    pub fn mark_dirty(&mut self, start: NodeId, propagate: bool) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&start) {
            return Err(GraphError::NodeNotFound(start));
        }
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);
        let mut transitioned = Vec::new();
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            let mut outgoing = Vec::new();
            if let Some(node) = self.nodes.get_mut(&id) {
                node.invalidate_cache();
                if node.set_state(NodeState::Dirty) {
                    transitioned.push(id);
                }
                if propagate {
                    for socket in node.outputs() {
                        outgoing.extend_from_slice(socket.connection_ids());
                    }
                }
            }
            for cid in outgoing {
                if let Some(conn) = self.connections.get(&cid) {
                    queue.push_back(conn.to_node);
                }
            }
        }
        for id in transitioned {
            self.emit_state_changed(id, NodeState::Dirty);
        }
        Ok(())
    }

    /// Resolves the current value arriving on an input socket: the upstream
    /// value (or ordered array of them for `multi` inputs), converted to the
    /// socket's type; the converted default while unconnected. Pulls stale
    /// upstream nodes through recompute.
    pub fn get_input_value(&mut self, node: NodeId, name: &str) -> Result<Value, GraphError> {
        let plan = {
            let n = self.nodes.get(&node).ok_or(GraphError::NodeNotFound(node))?;
            let socket = n.input(name).ok_or_else(|| GraphError::SocketNotFound {
                node,
                name: name.to_string(),
                direction: SocketDirection::Input,
            })?;
            self.plan_input(socket)?
        };
        self.resolve_input(plan)
    }

    /// Reads an output value, recomputing the node first when it is stale.
    /// A node left in the Error state fails fast without re-running its
    /// compute; `mark_dirty` re-arms it.
    pub fn get_output_value(&mut self, node: NodeId, name: &str) -> Result<Value, GraphError> {
        {
            let n = self.nodes.get(&node).ok_or(GraphError::NodeNotFound(node))?;
            if n.output(name).is_none() {
                return Err(GraphError::SocketNotFound {
                    node,
                    name: name.to_string(),
                    direction: SocketDirection::Output,
                });
            }
            match n.state() {
                // Pulling a node that is mid-recompute means evaluation
                // looped back into itself.
                NodeState::Processing => return Err(GraphError::CycleDetected),
                NodeState::Error => {
                    return Err(GraphError::Compute {
                        node,
                        source: ComputeError::new("previous compute failed; mark dirty to retry"),
                    })
                }
                NodeState::Clean if n.is_cache_valid() => {
                    return Ok(n.cached_output(name).cloned().unwrap_or(Value::Null))
                }
                _ => {}
            }
        }
        self.recalculate(node)?;
        let n = self.nodes.get(&node).ok_or(GraphError::NodeNotFound(node))?;
        Ok(n.cached_output(name).cloned().unwrap_or(Value::Null))
    }

    /// Topological execution order via Kahn's algorithm. In-degree counts
    /// incoming connections; ties break toward the smallest node id, which
    /// is insertion order. Read-only; an incomplete order reports a cycle
    /// without touching any state.
    pub fn get_execution_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let mut indegree: HashMap<NodeId, usize> =
            self.nodes.keys().map(|&id| (id, 0)).collect();
        let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut cids: Vec<ConnectionId> = self.connections.keys().copied().collect();
        cids.sort_unstable();
        for cid in cids {
            if let Some(conn) = self.connections.get(&cid) {
                adjacency.entry(conn.from_node).or_default().push(conn.to_node);
                if let Some(d) = indegree.get_mut(&conn.to_node) {
                    *d += 1;
                }
            }
        }

        let mut ready: BTreeSet<NodeId> = indegree
            .iter()
            .filter(|&(_, &d)| d == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.pop_first() {
            order.push(id);
            if let Some(targets) = adjacency.get(&id) {
                for &to in targets {
                    if let Some(d) = indegree.get_mut(&to) {
                        *d -= 1;
                        if *d == 0 {
                            ready.insert(to);
                        }
                    }
                }
            }
        }
        if order.len() != self.nodes.len() {
            return Err(GraphError::CycleDetected);
        }
        Ok(order)
    }

    /// Recomputes every stale node in execution order and returns the ids
    /// that ran. Nodes parked in the Error state are skipped; the first
    /// fresh compute failure aborts the batch.
    pub fn execute(&mut self) -> Result<Vec<NodeId>, GraphError> {
        let order = self.get_execution_order()?;
        let mut executed = Vec::new();
        for id in order {
            let stale = match self.nodes.get(&id) {
                Some(n) => {
                    n.state() == NodeState::Dirty
                        || (!n.is_cache_valid() && n.state() != NodeState::Error)
                }
                None => false,
            };
            if stale {
                self.recalculate(id)?;
                executed.push(id);
            }
        }
        debug!("executed {} stale nodes", executed.len());
        Ok(executed)
    }

    /// Updates a node parameter; marks the node dirty only when the value
    /// actually changed.
    pub fn set_parameter(
        &mut self,
        node: NodeId,
        name: &str,
        value: Value,
    ) -> Result<(), GraphError> {
        let changed = self
            .nodes
            .get_mut(&node)
            .ok_or(GraphError::NodeNotFound(node))?
            .set_parameter(name, value);
        if changed {
            self.mark_dirty(node, true)?;
        }
        Ok(())
    }

    /// Updates an input socket's fallback value, converting it to the
    /// socket's type. Ignored while the socket is connected: the upstream
    /// value wins and the default is not observable.
    pub fn set_input_default(
        &mut self,
        node: NodeId,
        socket: &str,
        value: Value,
    ) -> Result<(), GraphError> {
        {
            let n = self.nodes.get_mut(&node).ok_or(GraphError::NodeNotFound(node))?;
            let s = n.input_mut(socket).ok_or_else(|| GraphError::SocketNotFound {
                node,
                name: socket.to_string(),
                direction: SocketDirection::Input,
            })?;
            if s.has_connections() {
                debug!("default on connected socket {node}.{socket} ignored");
                return Ok(());
            }
            s.default_value = s.socket_type.convert_value(&value);
        }
        self.mark_dirty(node, true)
    }

    fn plan_input(&self, socket: &Socket) -> Result<InputPlan, GraphError> {
        let mut sources = Vec::with_capacity(socket.connection_ids().len());
        for &cid in socket.connection_ids() {
            let conn = self
                .connections
                .get(&cid)
                .ok_or(GraphError::ConnectionNotFound(cid))?;
            sources.push((conn.from_node, conn.from_socket.clone()));
        }
        Ok(InputPlan {
            name: socket.name.clone(),
            socket_type: socket.socket_type.clone(),
            multi: socket.multi,
            default: socket.default_value.clone(),
            sources,
        })
    }

    fn resolve_input(&mut self, plan: InputPlan) -> Result<Value, GraphError> {
        if plan.sources.is_empty() {
            return Ok(plan.default);
        }
        let mut incoming = Vec::with_capacity(plan.sources.len());
        for (src_node, src_socket) in &plan.sources {
            let raw = self.get_output_value(*src_node, src_socket)?;
            incoming.push(plan.socket_type.convert_value(&raw));
        }
        if plan.multi {
            Ok(Value::Array(incoming))
        } else {
            Ok(incoming.swap_remove(0))
        }
    }

    /// Runs one node's compute: Processing while inputs gather and the
    /// logic runs, then Clean with a fresh cache, or Error. An upstream
    /// failure during input gathering leaves this node Dirty (its own
    /// compute never ran) and propagates the upstream error.
    fn recalculate(&mut self, id: NodeId) -> Result<(), GraphError> {
        let plans: Vec<InputPlan> = {
            let node = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?;
            node.inputs()
                .iter()
                .map(|s| self.plan_input(s))
                .collect::<Result<_, _>>()?
        };
        self.set_node_state(id, NodeState::Processing);

        let mut inputs = HashMap::with_capacity(plans.len());
        for plan in plans {
            let name = plan.name.clone();
            match self.resolve_input(plan) {
                Ok(value) => {
                    inputs.insert(name, value);
                }
                Err(err) => {
                    self.set_node_state(id, NodeState::Dirty);
                    return Err(err);
                }
            }
        }

        let result = {
            let node = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?;
            let ctx = ComputeContext::new(&inputs, node.parameters());
            node.logic().compute(&ctx)
        };
        match result {
            Ok(outputs) => {
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.store_cache(outputs);
                }
                self.set_node_state(id, NodeState::Clean);
                self.emit_value_changed(id);
                debug!("node {id} recomputed");
                Ok(())
            }
            Err(err) => {
                self.set_node_state(id, NodeState::Error);
                warn!("node {id} compute failed: {err}");
                Err(GraphError::Compute { node: id, source: err })
            }
        }
    }

    fn set_node_state(&mut self, id: NodeId, state: NodeState) {
        let changed = match self.nodes.get_mut(&id) {
            Some(node) => node.set_state(state),
            None => false,
        };
        if changed {
            self.emit_state_changed(id, state);
        }
    }

    // Observers are pulled out of the graph while they run so they can
    // never alias a mutable borrow of it.
    fn emit_state_changed(&mut self, node: NodeId, state: NodeState) {
        let mut observers = std::mem::take(&mut self.observers);
        for observer in observers.iter_mut() {
            observer.on_state_changed(node, state);
        }
        self.observers = observers;
    }

    fn emit_value_changed(&mut self, node: NodeId) {
        let mut observers = std::mem::take(&mut self.observers);
        for observer in observers.iter_mut() {
            observer.on_value_changed(node);
        }
        self.observers = observers;
    }
}

impl std::fmt::Debug for NodeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeGraph")
            .field("nodes", &self.nodes.len())
            .field("connections", &self.connections.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}
