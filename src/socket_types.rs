//! Socket type system: compatibility rules and value coercion
//!
//! The type of a socket decides which connections are legal and how raw
//! values are normalized. Compatibility is directional (producer to
//! consumer) and deliberately asymmetric: a Boolean may feed a Number input
//! but not the other way around.

use serde::{Deserialize, Serialize};

use crate::value::{ColorValue, Value};

/// The closed set of value types a socket can declare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SocketType {
    /// Scalar number, optionally range-restricted
    Number { min: Option<f64>, max: Option<f64> },
    /// Vector of a fixed dimension
    Vector { dimensions: usize },
    /// Opaque geometry payload
    Geometry,
    /// RGBA color
    Color,
    /// Text string
    String,
    /// Boolean value
    Boolean,
    /// Homogeneous list of the element type
    Array(Box<SocketType>),
    /// Wildcard accepting anything
    Any,
}

impl SocketType {
    /// Unrestricted number type.
    pub fn number() -> Self {
        SocketType::Number { min: None, max: None }
    }

    /// Number restricted to `min..` (e.g. radii, sizes).
    pub fn positive_number() -> Self {
        SocketType::Number { min: Some(0.0), max: None }
    }

    /// Number restricted to the 0..=1 range.
    pub fn normalized_number() -> Self {
        SocketType::Number { min: Some(0.0), max: Some(1.0) }
    }

    pub fn vector2() -> Self {
        SocketType::Vector { dimensions: 2 }
    }

    pub fn vector3() -> Self {
        SocketType::Vector { dimensions: 3 }
    }

    pub fn array_of(element: SocketType) -> Self {
        SocketType::Array(Box::new(element))
    }

    /// Display name, e.g. `Vector2D` or `Array[Number]`.
    pub fn name(&self) -> std::string::String {
        match self {
            SocketType::Number { .. } => "Number".into(),
            SocketType::Vector { dimensions } => format!("Vector{dimensions}D"),
            SocketType::Geometry => "Geometry".into(),
            SocketType::Color => "Color".into(),
            SocketType::String => "String".into(),
            SocketType::Boolean => "Boolean".into(),
            SocketType::Array(element) => format!("Array[{}]", element.name()),
            SocketType::Any => "Any".into(),
        }
    }

    /// Whether a value produced by a socket of type `self` may be accepted
    /// by a socket of type `other`. Directional: test both orders when a
    /// symmetric answer is needed.
    pub fn is_compatible_with(&self, other: &SocketType) -> bool {
        use SocketType::*;
        match (self, other) {
            (Any, _) | (_, Any) => true,
            (Number { .. }, Number { .. }) | (Number { .. }, Vector { .. }) => true,
            (Vector { .. }, Vector { .. }) | (Vector { .. }, Number { .. }) => true,
            (Geometry, Geometry) => true,
            (Color, Color) | (Color, Vector { .. }) => true,
            (Boolean, Boolean) | (Boolean, Number { .. }) => true,
            (String, String) => true,
            // Element-wise match, or singleton collapse onto a bare element
            (Array(a), Array(b)) => a.is_compatible_with(b),
            (Array(a), b) => a.is_compatible_with(b),
            _ => false,
        }
    }

    /// Non-throwing predicate: can `value` be used as-is for this type?
    pub fn validate_value(&self, value: &Value) -> bool {
        match self {
            SocketType::Number { min, max } => match value {
                Value::Number(n) => {
                    min.map_or(true, |lo| *n >= lo) && max.map_or(true, |hi| *n <= hi)
                }
                Value::Boolean(_) => true,
                Value::String(s) => s.trim().parse::<f64>().is_ok(),
                _ => false,
            },
            SocketType::Vector { .. } => matches!(
                value,
                Value::Number(_) | Value::Vector(_)
            ) || matches!(value, Value::Array(items)
                    if items.iter().all(|v| matches!(v, Value::Number(_)))),
            SocketType::Geometry => matches!(value, Value::Geometry(_) | Value::Null),
            SocketType::Color => match value {
                Value::Color(_) => true,
                Value::String(s) => ColorValue::from_hex(s).is_some(),
                Value::Vector(v) => (3..=4).contains(&v.len()),
                Value::Array(items) => (3..=4).contains(&items.len()),
                _ => false,
            },
            SocketType::String => matches!(value, Value::String(_) | Value::Null),
            SocketType::Boolean => matches!(value, Value::Boolean(_) | Value::Null),
            SocketType::Array(element) => match value {
                Value::Null => true,
                Value::Array(items) => items.iter().all(|v| element.validate_value(v)),
                single => element.validate_value(single),
            },
            SocketType::Any => true,
        }
    }

    /// Best-effort coercion to this type's canonical representation.
    /// Never fails: unconvertible input yields [`SocketType::default_value`].
    pub fn convert_value(&self, value: &Value) -> Value {
        match self {
            SocketType::Number { .. } => Value::Number(value.coerce_number()),
            SocketType::Vector { dimensions } => Value::Vector(value.coerce_vector(*dimensions)),
            SocketType::Geometry => match value {
                Value::Geometry(g) => Value::Geometry(g.clone()),
                _ => Value::Null,
            },
            SocketType::Color => Value::Color(Self::coerce_color(value)),
            SocketType::String => Value::String(match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Boolean(b) => b.to_string(),
                _ => std::string::String::new(),
            }),
            SocketType::Boolean => Value::Boolean(value.coerce_boolean()),
            SocketType::Array(element) => Value::Array(match value {
                Value::Null => Vec::new(),
                Value::Array(items) => items.iter().map(|v| element.convert_value(v)).collect(),
                single => vec![element.convert_value(single)],
            }),
            SocketType::Any => value.clone(),
        }
    }

    /// The zero/identity value for this type, used as the coercion fallback
    /// and as the implicit socket default.
    pub fn default_value(&self) -> Value {
        match self {
            SocketType::Number { .. } => Value::Number(0.0),
            SocketType::Vector { dimensions } => Value::Vector(vec![0.0; *dimensions]),
            SocketType::Geometry => Value::Null,
            SocketType::Color => Value::Color(ColorValue::WHITE),
            SocketType::String => Value::String(std::string::String::new()),
            SocketType::Boolean => Value::Boolean(false),
            SocketType::Array(_) => Value::Array(Vec::new()),
            SocketType::Any => Value::Null,
        }
    }

    fn coerce_color(value: &Value) -> ColorValue {
        match value {
            Value::Color(c) => *c,
            Value::String(s) => ColorValue::from_hex(s).unwrap_or(ColorValue::WHITE),
            Value::Vector(v) if v.len() >= 3 => {
                ColorValue::new(v[0], v[1], v[2], v.get(3).copied().unwrap_or(1.0))
            }
            Value::Array(items) if items.len() >= 3 => {
                let c: Vec<f64> = items.iter().map(Value::coerce_number).collect();
                ColorValue::new(c[0], c[1], c[2], c.get(3).copied().unwrap_or(1.0))
            }
            _ => ColorValue::WHITE,
        }
    }
}
