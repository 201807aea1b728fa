//! The value vocabulary evaluated by properties.
//!
//! Every property evaluation produces one of these closed variants.
//! Interpolable kinds expose a flat f64 component packing that the
//! sampled-property interpolators work on; quaternions interpolate by
//! spherical-linear interpolation only so unit norm is preserved.

use std::fmt;

use smallvec::SmallVec;

use crate::util::{Color, DQuat, DVec2, DVec3};

/// Flat component buffer used by the interpolators.
pub type Components = SmallVec<[f64; 4]>;

/// A value produced by evaluating a property at a time.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Boolean(bool),
    Number(f64),
    String(String),
    Vec2(DVec2),
    Vec3(DVec3),
    Quat(DQuat),
    Color(Color),
    /// A flat list of 3D positions (polyline and polygon outlines).
    VertexList(Vec<DVec3>),
}

/// The kind tag for a [`Value`], used to keep sampled series homogeneous.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Number,
    String,
    Vec2,
    Vec3,
    Quat,
    Color,
    VertexList,
}

impl ValueKind {
    /// Number of f64 components for interpolable kinds, None otherwise.
    pub fn component_count(self) -> Option<usize> {
        match self {
            Self::Number => Some(1),
            Self::Vec2 => Some(2),
            Self::Vec3 => Some(3),
            Self::Color => Some(4),
            Self::Quat | Self::Boolean | Self::String | Self::VertexList => None,
        }
    }

    /// Whether a sampled series of this kind can be interpolated at all
    /// (component-wise or, for quaternions, spherically).
    pub fn is_interpolable(self) -> bool {
        self.component_count().is_some() || self == Self::Quat
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Quat => "quat",
            Self::Color => "color",
            Self::VertexList => "vertex list",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Vec2(_) => ValueKind::Vec2,
            Self::Vec3(_) => ValueKind::Vec3,
            Self::Quat(_) => ValueKind::Quat,
            Self::Color(_) => ValueKind::Color,
            Self::VertexList(_) => ValueKind::VertexList,
        }
    }

    /// Flatten into f64 components for interpolation. None for kinds
    /// that do not interpolate component-wise.
    pub fn components(&self) -> Option<Components> {
        let mut out = Components::new();
        match self {
            Self::Number(n) => out.push(*n),
            Self::Vec2(v) => out.extend_from_slice(&[v.x, v.y]),
            Self::Vec3(v) => out.extend_from_slice(&[v.x, v.y, v.z]),
            Self::Color(c) => {
                out.extend_from_slice(&[c.r as f64, c.g as f64, c.b as f64, c.a as f64])
            }
            _ => return None,
        }
        Some(out)
    }

    /// Rebuild a value of `kind` from flat components.
    pub fn from_components(kind: ValueKind, c: &[f64]) -> Option<Self> {
        match (kind, c) {
            (ValueKind::Number, [n]) => Some(Self::Number(*n)),
            (ValueKind::Vec2, [x, y]) => Some(Self::Vec2(DVec2::new(*x, *y))),
            (ValueKind::Vec3, [x, y, z]) => Some(Self::Vec3(DVec3::new(*x, *y, *z))),
            (ValueKind::Color, [r, g, b, a]) => Some(Self::Color(Color::new(
                *r as f32, *g as f32, *b as f32, *a as f32,
            ))),
            _ => None,
        }
    }

    /// Convenience accessors for consumers that know the expected kind.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<DVec3> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_roundtrip() {
        let v = Value::Vec3(DVec3::new(1.0, 2.0, 3.0));
        let c = v.components().unwrap();
        assert_eq!(c.as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(Value::from_components(ValueKind::Vec3, &c), Some(v));
    }

    #[test]
    fn test_color_components() {
        let v = Value::Color(Color::new(0.5, 0.25, 0.0, 1.0));
        let c = v.components().unwrap();
        let back = Value::from_components(ValueKind::Color, &c).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_non_interpolable_kinds() {
        assert!(Value::Boolean(true).components().is_none());
        assert!(Value::String("x".into()).components().is_none());
        assert!(ValueKind::Quat.is_interpolable());
        assert!(!ValueKind::String.is_interpolable());
        assert_eq!(ValueKind::Quat.component_count(), None);
    }
}
