//! Node types and the compute lifecycle
//!
//! A [`Node`] owns its sockets, a parameter map and an output cache, and
//! runs the Clean/Dirty/Processing/Error lifecycle. The actual computation
//! is supplied by a [`NodeLogic`] implementation; the engine only ever
//! depends on that trait, never on concrete node kinds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::socket::{Socket, SocketDef, SocketDirection};
use crate::value::Value;

/// Unique identifier for a node, assigned by the owning graph.
pub type NodeId = usize;

/// Lifecycle state of a node's output cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// Cache valid and up to date
    Clean,
    /// Cache stale, recompute pending
    Dirty,
    /// compute() currently in flight
    Processing,
    /// Last compute() failed; stays until marked dirty again
    Error,
}

static NULL_VALUE: Value = Value::Null;

/// Read-only view handed to [`NodeLogic::compute`]: the gathered input
/// values plus the node's parameters. Compute bodies cannot reach the graph
/// through it, which keeps them pure with respect to topology.
pub struct ComputeContext<'a> {
    inputs: &'a HashMap<String, Value>,
    parameters: &'a HashMap<String, Value>,
}

impl<'a> ComputeContext<'a> {
    pub(crate) fn new(
        inputs: &'a HashMap<String, Value>,
        parameters: &'a HashMap<String, Value>,
    ) -> Self {
        Self { inputs, parameters }
    }

    /// Raw input value; `Null` for names the node never declared.
    pub fn input(&self, name: &str) -> &Value {
        self.inputs.get(name).unwrap_or(&NULL_VALUE)
    }

    /// Raw parameter value; `Null` when unset.
    pub fn parameter(&self, name: &str) -> &Value {
        self.parameters.get(name).unwrap_or(&NULL_VALUE)
    }

    /// Input coerced to a scalar (0.0 when unconvertible).
    pub fn number(&self, name: &str) -> f64 {
        self.input(name).coerce_number()
    }

    /// Input coerced to a vector of the given dimension.
    pub fn vector(&self, name: &str, dimensions: usize) -> Vec<f64> {
        self.input(name).coerce_vector(dimensions)
    }

    /// Input coerced to a boolean.
    pub fn boolean(&self, name: &str) -> bool {
        self.input(name).coerce_boolean()
    }

    /// All values arriving on an input: the elements of a multi input's
    /// array in connection order, or a single-element slice otherwise.
    pub fn values(&self, name: &str) -> &[Value] {
        match self.input(name) {
            Value::Array(items) => items,
            single => std::slice::from_ref(single),
        }
    }
}

/// Behavior supplied by a concrete node kind: socket layout (declared once,
/// at construction) and the pure compute function.
pub trait NodeLogic: Send {
    /// Type tag used for dispatch and serialization.
    fn type_name(&self) -> &'static str;

    /// Input socket declarations, in display order.
    fn inputs(&self) -> Vec<SocketDef>;

    /// Output socket declarations, in display order.
    fn outputs(&self) -> Vec<SocketDef>;

    /// Initial parameter values for a fresh node.
    fn default_parameters(&self) -> HashMap<String, Value> {
        HashMap::new()
    }

    /// Pure function of the current input values and parameters to output
    /// values. Must return an entry for every output it wants defined;
    /// omitted outputs read as `Null`. Must not assume anything about graph
    /// topology.
    fn compute(&self, ctx: &ComputeContext) -> Result<HashMap<String, Value>, ComputeError>;
}

/// A computational unit in the graph.
pub struct Node {
    pub(crate) id: NodeId,
    pub title: String,
    /// Editor position, carried for the serialization boundary only
    pub position: [f32; 2],
    state: NodeState,
    inputs: Vec<Socket>,
    outputs: Vec<Socket>,
    parameters: HashMap<String, Value>,
    output_cache: HashMap<String, Value>,
    cache_valid: bool,
    logic: Box<dyn NodeLogic>,
}

impl Node {
    /// Creates a node from its logic. Sockets are declared here, exactly
    /// once; the id is assigned when the node joins a graph.
    pub fn new<L: NodeLogic + 'static>(logic: L) -> Self {
        let title = logic.type_name().to_string();
        let inputs: Vec<Socket> = logic
            .inputs()
            .into_iter()
            .map(|mut def| {
                def.direction = SocketDirection::Input;
                Socket::from_def(def)
            })
            .collect();
        let outputs: Vec<Socket> = logic
            .outputs()
            .into_iter()
            .map(|mut def| {
                def.direction = SocketDirection::Output;
                Socket::from_def(def)
            })
            .collect();
        let parameters = logic.default_parameters();
        Self {
            id: 0,
            title,
            position: [0.0, 0.0],
            state: NodeState::Clean,
            inputs,
            outputs,
            parameters,
            output_cache: HashMap::new(),
            cache_valid: false,
            logic: Box::new(logic),
        }
    }

    /// Sets the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the editor position.
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn type_name(&self) -> &'static str {
        self.logic.type_name()
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Input socket by name.
    pub fn input(&self, name: &str) -> Option<&Socket> {
        self.inputs.iter().find(|s| s.name == name)
    }

    /// Output socket by name.
    pub fn output(&self, name: &str) -> Option<&Socket> {
        self.outputs.iter().find(|s| s.name == name)
    }

    /// All input sockets in declaration order.
    pub fn inputs(&self) -> &[Socket] {
        &self.inputs
    }

    /// All output sockets in declaration order.
    pub fn outputs(&self) -> &[Socket] {
        &self.outputs
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    pub fn parameters(&self) -> &HashMap<String, Value> {
        &self.parameters
    }

    /// Whether the output cache may be served without recompute.
    pub fn is_cache_valid(&self) -> bool {
        self.cache_valid
    }

    /// Plain attribute record for the persistence layer. The core defines
    /// only these in-memory fields, not an on-disk format.
    pub fn to_record(&self) -> NodeRecord {
        NodeRecord {
            id: self.id,
            node_type: self.type_name().to_string(),
            title: self.title.clone(),
            position: self.position,
            state: self.state,
            parameters: self.parameters.clone(),
        }
    }

    /// Restores record fields onto this node. The node type must already
    /// match; sockets are never restored from records.
    pub fn apply_record(&mut self, record: &NodeRecord) {
        self.title = record.title.clone();
        self.position = record.position;
        self.parameters = record.parameters.clone();
    }

    pub(crate) fn assign_id(&mut self, id: NodeId) {
        self.id = id;
        for socket in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            socket.owner = id;
        }
    }

    pub(crate) fn input_mut(&mut self, name: &str) -> Option<&mut Socket> {
        self.inputs.iter_mut().find(|s| s.name == name)
    }

    pub(crate) fn output_mut(&mut self, name: &str) -> Option<&mut Socket> {
        self.outputs.iter_mut().find(|s| s.name == name)
    }

    /// Returns true when the state actually changed.
    pub(crate) fn set_state(&mut self, state: NodeState) -> bool {
        if self.state != state {
            self.state = state;
            true
        } else {
            false
        }
    }

    pub(crate) fn invalidate_cache(&mut self) {
        self.cache_valid = false;
        self.output_cache.clear();
    }

    pub(crate) fn store_cache(&mut self, outputs: HashMap<String, Value>) {
        self.output_cache = outputs;
        self.cache_valid = true;
    }

    pub(crate) fn cached_output(&self, name: &str) -> Option<&Value> {
        self.output_cache.get(name)
    }

    pub(crate) fn set_parameter(&mut self, name: &str, value: Value) -> bool {
        if self.parameters.get(name) == Some(&value) {
            return false;
        }
        self.parameters.insert(name.to_string(), value);
        true
    }

    pub(crate) fn logic(&self) -> &dyn NodeLogic {
        &*self.logic
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type", &self.type_name())
            .field("title", &self.title)
            .field("state", &self.state)
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .finish()
    }
}

/// Plain attribute record exposed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub node_type: String,
    pub title: String,
    pub position: [f32; 2],
    pub state: NodeState,
    pub parameters: HashMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket_types::SocketType;

    struct Doubler;

    impl NodeLogic for Doubler {
        fn type_name(&self) -> &'static str {
            "doubler"
        }

        fn inputs(&self) -> Vec<SocketDef> {
            vec![SocketDef::input("value", SocketType::number()).with_default(Value::Number(1.0))]
        }

        fn outputs(&self) -> Vec<SocketDef> {
            vec![SocketDef::output("result", SocketType::number())]
        }

        fn compute(&self, ctx: &ComputeContext) -> Result<HashMap<String, Value>, ComputeError> {
            Ok(HashMap::from([(
                "result".to_string(),
                Value::Number(ctx.number("value") * 2.0),
            )]))
        }
    }

    #[test]
    fn test_sockets_declared_once_at_construction() {
        let node = Node::new(Doubler);
        assert_eq!(node.inputs().len(), 1);
        assert_eq!(node.outputs().len(), 1);
        assert!(node.input("value").is_some());
        assert!(node.input("missing").is_none());
        assert_eq!(node.input("value").unwrap().default_value, Value::Number(1.0));
        assert_eq!(node.state(), NodeState::Clean);
        assert!(!node.is_cache_valid());
    }

    #[test]
    fn test_compute_context_fallbacks() {
        let inputs = HashMap::from([("value".to_string(), Value::Number(3.0))]);
        let params = HashMap::new();
        let ctx = ComputeContext::new(&inputs, &params);
        assert_eq!(ctx.number("value"), 3.0);
        assert_eq!(ctx.number("missing"), 0.0);
        assert!(ctx.parameter("missing").is_null());
        assert_eq!(ctx.values("value"), &[Value::Number(3.0)]);
    }

    #[test]
    fn test_record_round_trip() {
        let mut node = Node::new(Doubler).with_title("My Doubler").with_position(10.0, 20.0);
        node.assign_id(5);
        let record = node.to_record();
        assert_eq!(record.node_type, "doubler");
        assert_eq!(record.state, NodeState::Clean);

        let json = serde_json::to_string(&record).unwrap();
        let parsed: NodeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);

        let mut fresh = Node::new(Doubler);
        fresh.apply_record(&parsed);
        assert_eq!(fresh.title, "My Doubler");
        assert_eq!(fresh.position, [10.0, 20.0]);
    }
}
