//! Sockets: typed, directional connection points on nodes

use serde::{Deserialize, Serialize};

use crate::error::ConnectionError;
use crate::graph::ConnectionId;
use crate::node::NodeId;
use crate::socket_types::SocketType;
use crate::value::Value;

/// Direction of a socket (input or output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketDirection {
    Input,
    Output,
}

impl std::fmt::Display for SocketDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SocketDirection::Input => write!(f, "input"),
            SocketDirection::Output => write!(f, "output"),
        }
    }
}

/// Declarative socket description, produced once by a node's logic when the
/// node is constructed.
#[derive(Debug, Clone)]
pub struct SocketDef {
    pub name: String,
    pub direction: SocketDirection,
    pub socket_type: SocketType,
    pub default_value: Option<Value>,
    pub multi: bool,
}

impl SocketDef {
    /// Declare an input socket.
    pub fn input(name: &str, socket_type: SocketType) -> Self {
        Self {
            name: name.to_string(),
            direction: SocketDirection::Input,
            socket_type,
            default_value: None,
            multi: false,
        }
    }

    /// Declare an output socket.
    pub fn output(name: &str, socket_type: SocketType) -> Self {
        Self {
            name: name.to_string(),
            direction: SocketDirection::Output,
            socket_type,
            default_value: None,
            multi: false,
        }
    }

    /// Set the default value used while the socket is unconnected.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Allow more than one connection on this input.
    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }
}

/// A connection point on a node. Owned exclusively by its node; connections
/// reference sockets by id through the graph, never directly.
#[derive(Debug, Clone)]
pub struct Socket {
    pub name: String,
    pub direction: SocketDirection,
    pub socket_type: SocketType,
    /// Used only when an input has no connection; stored pre-converted to
    /// the socket type's canonical representation.
    pub default_value: Value,
    /// Whether more than one connection is permitted (inputs only).
    pub multi: bool,
    pub(crate) owner: NodeId,
    pub(crate) connections: Vec<ConnectionId>,
}

impl Socket {
    pub(crate) fn from_def(def: SocketDef) -> Self {
        let default_value = match def.default_value {
            Some(raw) => def.socket_type.convert_value(&raw),
            None => def.socket_type.default_value(),
        };
        Self {
            name: def.name,
            direction: def.direction,
            socket_type: def.socket_type,
            default_value,
            multi: def.multi,
            owner: 0,
            connections: Vec::new(),
        }
    }

    /// Id of the owning node. Valid once the node has joined a graph.
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn is_input(&self) -> bool {
        matches!(self.direction, SocketDirection::Input)
    }

    pub fn is_output(&self) -> bool {
        matches!(self.direction, SocketDirection::Output)
    }

    pub fn has_connections(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Connection ids attached to this socket, in connection order.
    pub fn connection_ids(&self) -> &[ConnectionId] {
        &self.connections
    }

    /// Full validity check for a connection from this socket to `other`,
    /// in order: same node, direction, type compatibility (producer to
    /// consumer), capacity. Outputs fan out to any number of consumers;
    /// a non-multi input accepts a single producer.
    pub fn check_connection(&self, other: &Socket) -> Result<(), ConnectionError> {
        if self.owner == other.owner {
            return Err(ConnectionError::SameNode);
        }
        if self.direction == other.direction {
            return Err(ConnectionError::DirectionConflict(self.direction));
        }
        let (producer, consumer) = if self.is_output() { (self, other) } else { (other, self) };
        if !producer.socket_type.is_compatible_with(&consumer.socket_type) {
            return Err(ConnectionError::IncompatibleTypes {
                from: producer.socket_type.name(),
                to: consumer.socket_type.name(),
            });
        }
        if !consumer.multi && consumer.has_connections() {
            return Err(ConnectionError::SocketOccupied(consumer.name.clone()));
        }
        Ok(())
    }

    /// Boolean form of [`Socket::check_connection`].
    pub fn can_connect_to(&self, other: &Socket) -> bool {
        self.check_connection(other).is_ok()
    }

    pub(crate) fn add_connection(&mut self, id: ConnectionId) {
        if !self.connections.contains(&id) {
            self.connections.push(id);
        }
    }

    pub(crate) fn remove_connection(&mut self, id: ConnectionId) {
        self.connections.retain(|&c| c != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn socket(owner: NodeId, direction: SocketDirection, ty: SocketType) -> Socket {
        let def = match direction {
            SocketDirection::Input => SocketDef::input("in", ty),
            SocketDirection::Output => SocketDef::output("out", ty),
        };
        let mut s = Socket::from_def(def);
        s.owner = owner;
        s
    }

    #[test]
    fn test_check_connection_rejects_same_node() {
        let out = socket(1, SocketDirection::Output, SocketType::number());
        let inp = socket(1, SocketDirection::Input, SocketType::number());
        assert_eq!(out.check_connection(&inp), Err(ConnectionError::SameNode));
    }

    #[test]
    fn test_check_connection_rejects_same_direction() {
        let a = socket(1, SocketDirection::Output, SocketType::number());
        let b = socket(2, SocketDirection::Output, SocketType::number());
        assert_eq!(
            a.check_connection(&b),
            Err(ConnectionError::DirectionConflict(SocketDirection::Output))
        );
    }

    #[test]
    fn test_check_connection_uses_producer_to_consumer_order() {
        // Boolean output may feed a Number input...
        let bool_out = socket(1, SocketDirection::Output, SocketType::Boolean);
        let num_in = socket(2, SocketDirection::Input, SocketType::number());
        assert!(bool_out.can_connect_to(&num_in));
        // ...but a Number output may not feed a Boolean input, regardless of
        // which endpoint the check starts from.
        let num_out = socket(1, SocketDirection::Output, SocketType::number());
        let bool_in = socket(2, SocketDirection::Input, SocketType::Boolean);
        assert!(!num_out.can_connect_to(&bool_in));
        assert!(!bool_in.can_connect_to(&num_out));
    }

    #[test]
    fn test_check_connection_capacity() {
        let out = socket(1, SocketDirection::Output, SocketType::number());
        let mut inp = socket(2, SocketDirection::Input, SocketType::number());
        inp.add_connection(7);
        assert_eq!(
            out.check_connection(&inp),
            Err(ConnectionError::SocketOccupied("in".into()))
        );

        let mut multi = socket(2, SocketDirection::Input, SocketType::number());
        multi.multi = true;
        multi.add_connection(7);
        assert!(out.can_connect_to(&multi));
    }

    #[test]
    fn test_occupied_output_still_accepts_consumers() {
        let mut out = socket(1, SocketDirection::Output, SocketType::number());
        out.add_connection(7);
        let inp = socket(2, SocketDirection::Input, SocketType::number());
        assert!(out.can_connect_to(&inp));
        assert!(inp.can_connect_to(&out));
    }

    #[test]
    fn test_default_is_converted_at_declaration() {
        let def = SocketDef::input("radius", SocketType::number()).with_default(Value::String("42".into()));
        let s = Socket::from_def(def);
        assert_eq!(s.default_value, Value::Number(42.0));

        let no_default = Socket::from_def(SocketDef::input("center", SocketType::vector2()));
        assert_eq!(no_default.default_value, Value::Vector(vec![0.0, 0.0]));
    }
}
