//! Arithmetic nodes

use std::collections::HashMap;

use crate::error::ComputeError;
use crate::node::{ComputeContext, NodeLogic};
use crate::socket::SocketDef;
use crate::socket_types::SocketType;
use crate::value::Value;

fn binary_inputs() -> Vec<SocketDef> {
    vec![
        SocketDef::input("a", SocketType::number()).with_default(Value::Number(0.0)),
        SocketDef::input("b", SocketType::number()).with_default(Value::Number(0.0)),
    ]
}

fn binary_result(value: f64) -> HashMap<String, Value> {
    HashMap::from([("result".to_string(), Value::Number(value))])
}

/// Adds two numbers.
pub struct AddNode;

impl NodeLogic for AddNode {
    fn type_name(&self) -> &'static str {
        "add"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        binary_inputs()
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::output("result", SocketType::number())]
    }

    fn compute(&self, ctx: &ComputeContext) -> Result<HashMap<String, Value>, ComputeError> {
        Ok(binary_result(ctx.number("a") + ctx.number("b")))
    }
}

/// Subtracts `b` from `a`.
pub struct SubtractNode;

impl NodeLogic for SubtractNode {
    fn type_name(&self) -> &'static str {
        "subtract"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        binary_inputs()
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::output("result", SocketType::number())]
    }

    fn compute(&self, ctx: &ComputeContext) -> Result<HashMap<String, Value>, ComputeError> {
        Ok(binary_result(ctx.number("a") - ctx.number("b")))
    }
}

/// Multiplies two numbers.
pub struct MultiplyNode;

impl NodeLogic for MultiplyNode {
    fn type_name(&self) -> &'static str {
        "multiply"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        binary_inputs()
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::output("result", SocketType::number())]
    }

    fn compute(&self, ctx: &ComputeContext) -> Result<HashMap<String, Value>, ComputeError> {
        Ok(binary_result(ctx.number("a") * ctx.number("b")))
    }
}

/// Divides `a` by `b`; division by zero yields 0.0 so a live graph keeps
/// flowing while a denominator passes through zero.
pub struct DivideNode;

impl NodeLogic for DivideNode {
    fn type_name(&self) -> &'static str {
        "divide"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        binary_inputs()
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::output("result", SocketType::number())]
    }

    fn compute(&self, ctx: &ComputeContext) -> Result<HashMap<String, Value>, ComputeError> {
        let b = ctx.number("b");
        let result = if b == 0.0 { 0.0 } else { ctx.number("a") / b };
        Ok(binary_result(result))
    }
}

/// Sums every value arriving on its multi input, in connection order.
pub struct SumNode;

impl NodeLogic for SumNode {
    fn type_name(&self) -> &'static str {
        "sum"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::input("values", SocketType::number()).multi()]
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::output("sum", SocketType::number())]
    }

    fn compute(&self, ctx: &ComputeContext) -> Result<HashMap<String, Value>, ComputeError> {
        let sum: f64 = ctx.values("values").iter().map(Value::coerce_number).sum();
        Ok(HashMap::from([("sum".to_string(), Value::Number(sum))]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeGraph;
    use crate::node::Node;
    use crate::primitives::NumberNode;

    #[test]
    fn test_add_defaults_to_zero() {
        let mut graph = NodeGraph::new();
        let add = graph.add_node(Node::new(AddNode));
        assert_eq!(graph.get_output_value(add, "result"), Ok(Value::Number(0.0)));
    }

    #[test]
    fn test_add_two_numbers() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(Node::new(NumberNode::new(2.5)));
        let b = graph.add_node(Node::new(NumberNode::new(4.0)));
        let add = graph.add_node(Node::new(AddNode));
        graph.connect_nodes(a, "value", add, "a").unwrap();
        graph.connect_nodes(b, "value", add, "b").unwrap();
        assert_eq!(graph.get_output_value(add, "result"), Ok(Value::Number(6.5)));
    }

    #[test]
    fn test_binary_operations() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(Node::new(NumberNode::new(10.0)));
        let b = graph.add_node(Node::new(NumberNode::new(4.0)));
        for (node, expected) in [
            (Node::new(SubtractNode), 6.0),
            (Node::new(MultiplyNode), 40.0),
            (Node::new(DivideNode), 2.5),
        ] {
            let op = graph.add_node(node);
            graph.connect_nodes(a, "value", op, "a").unwrap();
            graph.connect_nodes(b, "value", op, "b").unwrap();
            assert_eq!(graph.get_output_value(op, "result"), Ok(Value::Number(expected)));
        }
    }

    #[test]
    fn test_divide_by_zero_yields_zero() {
        let mut graph = NodeGraph::new();
        let div = graph.add_node(Node::new(DivideNode));
        graph.set_input_default(div, "a", Value::Number(7.0)).unwrap();
        assert_eq!(graph.get_output_value(div, "result"), Ok(Value::Number(0.0)));
    }

    #[test]
    fn test_sum_over_multi_input() {
        let mut graph = NodeGraph::new();
        let sum = graph.add_node(Node::new(SumNode));
        // Unconnected multi input sums to zero
        assert_eq!(graph.get_output_value(sum, "sum"), Ok(Value::Number(0.0)));

        for v in [1.0, 2.0, 3.5] {
            let n = graph.add_node(Node::new(NumberNode::new(v)));
            graph.connect_nodes(n, "value", sum, "values").unwrap();
        }
        assert_eq!(graph.get_output_value(sum, "sum"), Ok(Value::Number(6.5)));
    }
}
