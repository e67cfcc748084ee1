//! Core data values that flow between sockets
//!
//! Every socket carries a [`Value`]. The variants mirror the socket type
//! system one-to-one, plus [`Value::Null`] for "no value yet" (unconnected
//! geometry inputs, outputs a node chose not to produce).

use serde::{Deserialize, Serialize};

/// A runtime value travelling through the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Empty/null value
    Null,
    /// Scalar number
    Number(f64),
    /// N-dimensional vector
    Vector(Vec<f64>),
    /// RGBA color, components in 0..=1
    Color(ColorValue),
    /// Text string
    String(String),
    /// Boolean value
    Boolean(bool),
    /// 2D geometry payload
    Geometry(GeometryData),
    /// Ordered list of values
    Array(Vec<Value>),
}

impl Value {
    /// Returns a short name for the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Number(_) => "Number",
            Value::Vector(_) => "Vector",
            Value::Color(_) => "Color",
            Value::String(_) => "String",
            Value::Boolean(_) => "Boolean",
            Value::Geometry(_) => "Geometry",
            Value::Array(_) => "Array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<&ColorValue> {
        match self {
            Value::Color(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_geometry(&self) -> Option<&GeometryData> {
        match self {
            Value::Geometry(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Best-effort scalar coercion. Unconvertible inputs yield `0.0`.
    pub fn coerce_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::String(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Best-effort boolean coercion. Unconvertible inputs yield `false`.
    pub fn coerce_boolean(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on"),
            _ => false,
        }
    }

    /// Best-effort vector coercion: scalars broadcast, shorter vectors are
    /// zero-padded, longer ones truncated, colors contribute their
    /// components. Unconvertible inputs yield the zero vector.
    pub fn coerce_vector(&self, dimensions: usize) -> Vec<f64> {
        let mut out = match self {
            Value::Number(n) => vec![*n; dimensions],
            Value::Vector(v) => v.clone(),
            Value::Color(c) => vec![c.r, c.g, c.b, c.a],
            Value::Array(items) => items.iter().map(Value::coerce_number).collect(),
            _ => vec![0.0; dimensions],
        };
        out.resize(dimensions, 0.0);
        out
    }
}

/// RGBA color with components in the 0..=1 range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorValue {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ColorValue {
    /// Opaque white, the identity color used as a coercion fallback.
    pub const WHITE: ColorValue = ColorValue {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#RGB`, `#RRGGBB` or `#RRGGBBAA` hex notation.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f64 / 255.0);
        match digits.len() {
            3 => {
                let mut rgb = [0.0; 3];
                for (slot, ch) in rgb.iter_mut().zip(digits.chars()) {
                    *slot = channel(&format!("{ch}{ch}"))?;
                }
                Some(Self::new(rgb[0], rgb[1], rgb[2], 1.0))
            }
            6 | 8 => {
                let mut rgba = [1.0; 4];
                for (i, slot) in rgba.iter_mut().take(digits.len() / 2).enumerate() {
                    *slot = channel(&digits[i * 2..i * 2 + 2])?;
                }
                Some(Self::new(rgba[0], rgba[1], rgba[2], rgba[3]))
            }
            _ => None,
        }
    }
}

/// 2D geometry as a point outline, the payload produced by generator nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryData {
    /// Outline points in drawing order
    pub points: Vec<[f64; 2]>,
    /// Whether the outline forms a closed shape
    pub closed: bool,
}

impl GeometryData {
    pub fn new(points: Vec<[f64; 2]>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Bounding box as `(min_x, min_y, max_x, max_y)`, or `None` when empty.
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.points.first()?;
        let mut bbox = (first[0], first[1], first[0], first[1]);
        for p in &self.points[1..] {
            bbox.0 = bbox.0.min(p[0]);
            bbox.1 = bbox.1.min(p[1]);
            bbox.2 = bbox.2.max(p[0]);
            bbox.3 = bbox.3.max(p[1]);
        }
        Some(bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex_formats() {
        let red = ColorValue::from_hex("#FF0000").unwrap();
        assert!((red.r - 1.0).abs() < 1e-9);
        assert!((red.g - 0.0).abs() < 1e-9);
        assert!((red.a - 1.0).abs() < 1e-9);

        let short = ColorValue::from_hex("#F00").unwrap();
        assert_eq!(short, red);

        let translucent = ColorValue::from_hex("#00FF0080").unwrap();
        assert!((translucent.a - 128.0 / 255.0).abs() < 1e-9);

        assert!(ColorValue::from_hex("FF0000").is_none());
        assert!(ColorValue::from_hex("#F0").is_none());
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(Value::Number(3.5).coerce_number(), 3.5);
        assert_eq!(Value::Boolean(true).coerce_number(), 1.0);
        assert_eq!(Value::String(" 2.25 ".into()).coerce_number(), 2.25);
        assert_eq!(Value::String("nope".into()).coerce_number(), 0.0);
        assert_eq!(Value::Vector(vec![1.0, 2.0]).coerce_number(), 0.0);
    }

    #[test]
    fn test_coerce_vector_broadcast_and_pad() {
        assert_eq!(Value::Number(5.0).coerce_vector(3), vec![5.0, 5.0, 5.0]);
        assert_eq!(Value::Vector(vec![1.0]).coerce_vector(2), vec![1.0, 0.0]);
        assert_eq!(Value::Vector(vec![1.0, 2.0, 3.0]).coerce_vector(2), vec![1.0, 2.0]);
        let c = Value::Color(ColorValue::new(0.5, 0.25, 0.75, 1.0));
        assert_eq!(c.coerce_vector(3), vec![0.5, 0.25, 0.75]);
    }

    #[test]
    fn test_geometry_bbox() {
        let geo = GeometryData::new(vec![[0.0, 0.0], [4.0, -1.0], [2.0, 3.0]], true);
        assert_eq!(geo.bbox(), Some((0.0, -1.0, 4.0, 3.0)));
        assert_eq!(GeometryData::new(vec![], true).bbox(), None);
    }
}
