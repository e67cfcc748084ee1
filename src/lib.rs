//! GoboFlow core: a typed dataflow node graph for procedural gobo patterns
//!
//! Nodes expose named, typed sockets; connections wire outputs to inputs;
//! the graph tracks staleness per node and recomputes only what a pull
//! actually needs. The building blocks:
//!
//! - [`Value`] — the runtime values flowing between sockets
//! - [`SocketType`] — the closed type system deciding which connections are
//!   legal and how values are coerced
//! - [`NodeLogic`] — the trait a node kind implements to declare sockets
//!   and compute outputs
//! - [`NodeGraph`] — the aggregate root owning nodes and connections and
//!   running the Clean/Dirty/Processing/Error lifecycle
//!
//! ```
//! use goboflow::{CircleNode, Node, NodeGraph, NumberNode};
//!
//! let mut graph = NodeGraph::new();
//! let radius = graph.add_node(Node::new(NumberNode::new(150.0)));
//! let circle = graph.add_node(Node::new(CircleNode));
//! graph.connect_nodes(radius, "value", circle, "radius").unwrap();
//!
//! let area = graph.get_output_value(circle, "area").unwrap();
//! assert!((area.coerce_number() - 70685.83).abs() < 0.01);
//! ```

pub mod error;
pub mod graph;
pub mod hooks;
pub mod math;
pub mod node;
pub mod primitives;
pub mod socket;
pub mod socket_types;
pub mod value;

pub use error::{ComputeError, ConnectionError, GraphError};
pub use graph::{Connection, ConnectionId, NodeGraph};
pub use hooks::GraphObserver;
pub use math::{AddNode, DivideNode, MultiplyNode, SubtractNode, SumNode};
pub use node::{ComputeContext, Node, NodeId, NodeLogic, NodeRecord, NodeState};
pub use primitives::{CircleNode, NumberNode, RectangleNode};
pub use socket::{Socket, SocketDef, SocketDirection};
pub use socket_types::SocketType;
pub use value::{ColorValue, GeometryData, Value};
