//! Observer hooks for graph lifecycle events
//!
//! Embedding applications (editors, renderers, remote mirrors) register a
//! [`GraphObserver`] on the graph to hear about state transitions and fresh
//! output values without polling. All methods have no-op defaults so an
//! observer implements only what it cares about.

use crate::node::{NodeId, NodeState};

/// Callbacks fired by [`crate::graph::NodeGraph`] after its own state is
/// fully updated. Observers must not assume they can call back into the
/// graph; they receive plain data.
pub trait GraphObserver: Send {
    /// A node entered a new lifecycle state.
    fn on_state_changed(&mut self, node: NodeId, state: NodeState) {
        let _ = (node, state);
    }

    /// A node finished recomputing and its output cache holds new values.
    fn on_value_changed(&mut self, node: NodeId) {
        let _ = node;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;
    impl GraphObserver for Silent {}

    #[test]
    fn test_default_methods_are_noops() {
        let mut observer = Silent;
        observer.on_state_changed(1, NodeState::Dirty);
        observer.on_value_changed(1);
    }
}
