//! Error types for graph construction and evaluation

use thiserror::Error;

use crate::graph::ConnectionId;
use crate::node::NodeId;
use crate::socket::SocketDirection;

/// Why a proposed connection was rejected. Raised by the connection
/// factory before any state is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConnectionError {
    #[error("cannot connect sockets on the same node")]
    SameNode,
    #[error("cannot connect two {0} sockets")]
    DirectionConflict(SocketDirection),
    #[error("socket type {from} cannot feed {to}")]
    IncompatibleTypes { from: String, to: String },
    #[error("socket '{0}' already has a connection")]
    SocketOccupied(String),
}

/// Failure reported by a node's `compute`. The node transitions to the
/// Error state and the failure surfaces to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ComputeError {
    pub message: String,
}

impl ComputeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Top-level error for all graph operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("connection {0} not found")]
    ConnectionNotFound(ConnectionId),
    #[error("{direction} socket '{name}' not found on node {node}")]
    SocketNotFound {
        node: NodeId,
        name: String,
        direction: SocketDirection,
    },
    #[error("connection rejected: {0}")]
    Connection(#[from] ConnectionError),
    #[error("cycle detected in node graph")]
    CycleDetected,
    #[error("node {node} failed to compute: {source}")]
    Compute {
        node: NodeId,
        #[source]
        source: ComputeError,
    },
}
