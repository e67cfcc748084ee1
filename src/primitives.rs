//! Value sources and procedural shape generators
//!
//! The shape nodes turn socket inputs into [`GeometryData`] outlines plus
//! derived measurements (area, perimeter, bounding box). Out-of-range
//! inputs are clamped rather than rejected so a live graph keeps producing
//! geometry while the user drags values around.

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::error::ComputeError;
use crate::node::{ComputeContext, NodeLogic};
use crate::socket::SocketDef;
use crate::socket_types::SocketType;
use crate::value::{GeometryData, Value};

/// Constant number source driven by its `value` parameter.
pub struct NumberNode {
    initial: f64,
}

impl NumberNode {
    pub fn new(value: f64) -> Self {
        Self { initial: value }
    }
}

impl Default for NumberNode {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl NodeLogic for NumberNode {
    fn type_name(&self) -> &'static str {
        "number"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        vec![]
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![SocketDef::output("value", SocketType::number())]
    }

    fn default_parameters(&self) -> HashMap<String, Value> {
        HashMap::from([("value".to_string(), Value::Number(self.initial))])
    }

    fn compute(&self, ctx: &ComputeContext) -> Result<HashMap<String, Value>, ComputeError> {
        Ok(HashMap::from([(
            "value".to_string(),
            Value::Number(ctx.parameter("value").coerce_number()),
        )]))
    }
}

/// Generates a circle as a regular polygon outline.
///
/// `radius` is clamped to at least 0.1 and `segments` to 3..=256. The
/// measurement outputs use the exact formulas (pi r^2, 2 pi r), not the
/// polygon approximation.
pub struct CircleNode;

impl NodeLogic for CircleNode {
    fn type_name(&self) -> &'static str {
        "circle"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        vec![
            SocketDef::input("center", SocketType::vector2()),
            SocketDef::input("radius", SocketType::positive_number())
                .with_default(Value::Number(100.0)),
            SocketDef::input("segments", SocketType::number()).with_default(Value::Number(32.0)),
        ]
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![
            SocketDef::output("geometry", SocketType::Geometry),
            SocketDef::output("area", SocketType::number()),
            SocketDef::output("perimeter", SocketType::number()),
            SocketDef::output("center_out", SocketType::vector2()),
        ]
    }

    fn compute(&self, ctx: &ComputeContext) -> Result<HashMap<String, Value>, ComputeError> {
        let center = ctx.vector("center", 2);
        let radius = ctx.number("radius").max(0.1);
        let segments = (ctx.number("segments") as i64).clamp(3, 256) as usize;

        let points = (0..segments)
            .map(|i| {
                let angle = TAU * i as f64 / segments as f64;
                [
                    center[0] + radius * angle.cos(),
                    center[1] + radius * angle.sin(),
                ]
            })
            .collect();

        Ok(HashMap::from([
            (
                "geometry".to_string(),
                Value::Geometry(GeometryData::new(points, true)),
            ),
            ("area".to_string(), Value::Number(PI * radius * radius)),
            ("perimeter".to_string(), Value::Number(TAU * radius)),
            ("center_out".to_string(), Value::Vector(center)),
        ]))
    }
}

/// Generates an axis-aligned rectangle outline, optionally with rounded
/// corners.
///
/// `width` and `height` are clamped to at least 1.0 and `corner_radius` to
/// half the short side. Rounded corners are emitted as arc segments, more
/// of them for larger radii.
pub struct RectangleNode;

impl RectangleNode {
    fn outline(cx: f64, cy: f64, width: f64, height: f64, radius: f64) -> Vec<[f64; 2]> {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        if radius == 0.0 {
            return vec![
                [cx - half_w, cy - half_h],
                [cx + half_w, cy - half_h],
                [cx + half_w, cy + half_h],
                [cx - half_w, cy + half_h],
            ];
        }
        let per_corner = ((radius / 5.0) as usize).max(4);
        // Arc centers with the quarter-turn each one starts at
        let corners = [
            (cx + half_w - radius, cy - half_h + radius, 1.5 * PI),
            (cx + half_w - radius, cy + half_h - radius, 0.0),
            (cx - half_w + radius, cy + half_h - radius, FRAC_PI_2),
            (cx - half_w + radius, cy - half_h + radius, PI),
        ];
        let mut points = Vec::with_capacity(4 * (per_corner + 1));
        for (ox, oy, start) in corners {
            for j in 0..=per_corner {
                let angle = start + FRAC_PI_2 * j as f64 / per_corner as f64;
                points.push([ox + radius * angle.cos(), oy + radius * angle.sin()]);
            }
        }
        points
    }
}

impl NodeLogic for RectangleNode {
    fn type_name(&self) -> &'static str {
        "rectangle"
    }

    fn inputs(&self) -> Vec<SocketDef> {
        vec![
            SocketDef::input("center", SocketType::vector2()),
            SocketDef::input("width", SocketType::positive_number())
                .with_default(Value::Number(200.0)),
            SocketDef::input("height", SocketType::positive_number())
                .with_default(Value::Number(100.0)),
            SocketDef::input("corner_radius", SocketType::positive_number())
                .with_default(Value::Number(0.0)),
        ]
    }

    fn outputs(&self) -> Vec<SocketDef> {
        vec![
            SocketDef::output("geometry", SocketType::Geometry),
            SocketDef::output("area", SocketType::number()),
            SocketDef::output("perimeter", SocketType::number()),
            SocketDef::output("bbox", SocketType::Vector { dimensions: 4 }),
            SocketDef::output("aspect_ratio", SocketType::number()),
        ]
    }

    fn compute(&self, ctx: &ComputeContext) -> Result<HashMap<String, Value>, ComputeError> {
        let center = ctx.vector("center", 2);
        let width = ctx.number("width").max(1.0);
        let height = ctx.number("height").max(1.0);
        let radius = ctx
            .number("corner_radius")
            .clamp(0.0, width.min(height) / 2.0);

        let (area, perimeter) = if radius == 0.0 {
            (width * height, 2.0 * (width + height))
        } else {
            // Square corner blocks replaced by quarter circles
            let removed = 4.0 * (radius * radius - PI * radius * radius / 4.0);
            let straight = 2.0 * (width - 2.0 * radius) + 2.0 * (height - 2.0 * radius);
            (width * height - removed, straight + TAU * radius)
        };
        let points = Self::outline(center[0], center[1], width, height, radius);
        let bbox = vec![
            center[0] - width / 2.0,
            center[1] - height / 2.0,
            center[0] + width / 2.0,
            center[1] + height / 2.0,
        ];

        Ok(HashMap::from([
            (
                "geometry".to_string(),
                Value::Geometry(GeometryData::new(points, true)),
            ),
            ("area".to_string(), Value::Number(area)),
            ("perimeter".to_string(), Value::Number(perimeter)),
            ("bbox".to_string(), Value::Vector(bbox)),
            ("aspect_ratio".to_string(), Value::Number(width / height)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeGraph;
    use crate::node::Node;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_number_node_reads_its_parameter() {
        let mut graph = NodeGraph::new();
        let n = graph.add_node(Node::new(NumberNode::new(12.5)));
        assert_eq!(graph.get_output_value(n, "value"), Ok(Value::Number(12.5)));

        graph.set_parameter(n, "value", Value::Number(-3.0)).unwrap();
        assert_eq!(graph.get_output_value(n, "value"), Ok(Value::Number(-3.0)));
    }

    #[test]
    fn test_circle_defaults() {
        let mut graph = NodeGraph::new();
        let c = graph.add_node(Node::new(CircleNode));

        let area = graph.get_output_value(c, "area").unwrap().coerce_number();
        assert!((area - PI * 100.0 * 100.0).abs() < EPS);
        let perimeter = graph.get_output_value(c, "perimeter").unwrap().coerce_number();
        assert!((perimeter - TAU * 100.0).abs() < EPS);

        let geometry = graph.get_output_value(c, "geometry").unwrap();
        let geometry = geometry.as_geometry().unwrap();
        assert_eq!(geometry.point_count(), 32);
        assert!(geometry.closed);
        assert_eq!(
            graph.get_output_value(c, "center_out"),
            Ok(Value::Vector(vec![0.0, 0.0]))
        );
    }

    #[test]
    fn test_circle_clamps_inputs() {
        let mut graph = NodeGraph::new();
        let c = graph.add_node(Node::new(CircleNode));
        graph.set_input_default(c, "radius", Value::Number(-5.0)).unwrap();
        graph.set_input_default(c, "segments", Value::Number(1000.0)).unwrap();

        let area = graph.get_output_value(c, "area").unwrap().coerce_number();
        assert!((area - PI * 0.1 * 0.1).abs() < EPS);
        let geometry = graph.get_output_value(c, "geometry").unwrap();
        assert_eq!(geometry.as_geometry().unwrap().point_count(), 256);
    }

    #[test]
    fn test_rectangle_defaults() {
        let mut graph = NodeGraph::new();
        let r = graph.add_node(Node::new(RectangleNode));

        assert_eq!(graph.get_output_value(r, "area"), Ok(Value::Number(20000.0)));
        assert_eq!(graph.get_output_value(r, "perimeter"), Ok(Value::Number(600.0)));
        assert_eq!(
            graph.get_output_value(r, "bbox"),
            Ok(Value::Vector(vec![-100.0, -50.0, 100.0, 50.0]))
        );
        assert_eq!(
            graph.get_output_value(r, "aspect_ratio"),
            Ok(Value::Number(2.0))
        );
        let geometry = graph.get_output_value(r, "geometry").unwrap();
        assert_eq!(geometry.as_geometry().unwrap().point_count(), 4);
    }

    #[test]
    fn test_rectangle_rounded_corners() {
        let mut graph = NodeGraph::new();
        let r = graph.add_node(Node::new(RectangleNode));
        graph.set_input_default(r, "corner_radius", Value::Number(20.0)).unwrap();

        let area = graph.get_output_value(r, "area").unwrap().coerce_number();
        let expected_area = 20000.0 - 4.0 * (400.0 - PI * 400.0 / 4.0);
        assert!((area - expected_area).abs() < EPS);

        let perimeter = graph.get_output_value(r, "perimeter").unwrap().coerce_number();
        let expected_perimeter = 2.0 * 160.0 + 2.0 * 60.0 + TAU * 20.0;
        assert!((perimeter - expected_perimeter).abs() < EPS);

        // Arc points stay inside the unrounded bounding box
        let geometry = graph.get_output_value(r, "geometry").unwrap();
        let geometry = geometry.as_geometry().unwrap();
        assert!(geometry.point_count() > 4);
        let (min_x, min_y, max_x, max_y) = geometry.bbox().unwrap();
        assert!(min_x >= -100.0 - EPS && max_x <= 100.0 + EPS);
        assert!(min_y >= -50.0 - EPS && max_y <= 50.0 + EPS);
    }

    #[test]
    fn test_rectangle_corner_radius_clamped_to_short_side() {
        let mut graph = NodeGraph::new();
        let r = graph.add_node(Node::new(RectangleNode));
        graph.set_input_default(r, "corner_radius", Value::Number(500.0)).unwrap();

        // Clamped to height / 2 = 50: a stadium shape
        let area = graph.get_output_value(r, "area").unwrap().coerce_number();
        let expected = 20000.0 - 4.0 * (2500.0 - PI * 2500.0 / 4.0);
        assert!((area - expected).abs() < EPS);
    }
}
