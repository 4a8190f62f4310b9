//! Scene document adapter.
//!
//! Source scenes arrive as a tree of named nodes carrying string-keyed
//! attributes, the shape produced by an XML DOM. [`SceneNode`] is that tree;
//! it can be built in code or deserialized from JSON:
//!
//! ```json
//! { "name": "bone", "attributes": { "id": 0, "name": "root" },
//!   "children": [ { "name": "position", "attributes": { "x": 0, "y": 0, "z": 0 } } ] }
//! ```
//!
//! Attribute reads default to `0`, `0.0`, `""` or `false` when the attribute
//! is absent, mirroring how DOM attribute conversions behave.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glam::{Quat, Vec3};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{Result, RigError};

/// Name of the root bone. Never prefixed, never has a parent.
pub const ROOT_BONE: &str = "root";

/// Options shared by the skeleton, mesh and animation loaders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Prepended to every non-root bone name (bones, hierarchy entries, tracks).
    pub bone_prefix: Option<String>,
    /// Sampling rate assigned to loaded animations.
    pub fps: u32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            bone_prefix: None,
            fps: 30,
        }
    }
}

impl LoadOptions {
    /// Applies the bone prefix to a raw source name.
    #[must_use]
    pub fn bone_name(&self, raw: &str) -> String {
        match &self.bone_prefix {
            Some(prefix) if raw != ROOT_BONE => format!("{prefix}{raw}"),
            _ => raw.to_string(),
        }
    }
}

/// Builds a unit quaternion from a source axis and an angle in radians.
///
/// This is the single place raw source angles are interpreted. The axis is
/// normalized first; a zero axis yields the identity rotation.
#[must_use]
pub fn quat_from_axis_angle(axis: Vec3, angle: f32) -> Quat {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(axis, angle)
}

/// A node of the external scene tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    #[serde(default, deserialize_with = "scalar_attributes")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<SceneNode>,
}

/// Accepts strings, numbers and booleans as attribute values.
fn scalar_attributes<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_attr(mut self, key: &str, value: impl ToString) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = SceneNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let node = Self::from_json_str(&text)?;
        log::debug!("Loaded scene document {} (<{}>)", path.display(), node.name);
        Ok(node)
    }

    /// Checks that this node is the `expected` element.
    pub fn expect_element(&self, expected: &'static str) -> Result<&Self> {
        if self.name == expected {
            Ok(self)
        } else {
            Err(RigError::UnexpectedElement {
                expected,
                found: self.name.clone(),
            })
        }
    }

    // ========================================================================
    // Children
    // ========================================================================

    /// First child element called `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&SceneNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Children of the first `name` child, or nothing when it is absent.
    pub fn children_of(&self, name: &str) -> impl Iterator<Item = &SceneNode> {
        self.child(name).into_iter().flat_map(|c| c.children.iter())
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a SceneNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn attr_str(&self, key: &str) -> &str {
        self.attr(key).unwrap_or_default()
    }

    #[must_use]
    pub fn attr_i32(&self, key: &str) -> i32 {
        self.attr_i32_or(key, 0)
    }

    #[must_use]
    pub fn attr_i32_or(&self, key: &str, default: i32) -> i32 {
        self.parse_attr(key).unwrap_or(default)
    }

    #[must_use]
    pub fn attr_f32(&self, key: &str) -> f32 {
        self.parse_attr(key).unwrap_or_default()
    }

    #[must_use]
    pub fn attr_bool(&self, key: &str) -> bool {
        self.attr(key) == Some("true")
    }

    fn parse_attr<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.attr(key)?.trim();
        match raw.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                log::debug!("<{}> attribute {key}={raw:?} is not numeric", self.name);
                None
            }
        }
    }

    // ========================================================================
    // Composite reads
    // ========================================================================

    /// Reads `x`, `y`, `z` attributes.
    #[must_use]
    pub fn vec3(&self) -> Vec3 {
        Vec3::new(self.attr_f32("x"), self.attr_f32("y"), self.attr_f32("z"))
    }

    /// Reads a rotation element: `angle` attribute (radians) plus an `axis` child.
    #[must_use]
    pub fn axis_angle(&self) -> Quat {
        let axis = self.child("axis").map(SceneNode::vec3).unwrap_or_default();
        quat_from_axis_angle(axis, self.attr_f32("angle"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_attributes_accept_numbers() {
        let node = SceneNode::from_json_str(
            r#"{ "name": "position", "attributes": { "x": 1.5, "y": "2", "z": -3, "flag": true } }"#,
        )
        .unwrap();

        assert_eq!(node.vec3(), Vec3::new(1.5, 2.0, -3.0));
        assert!(node.attr_bool("flag"));
        assert_eq!(node.attr_i32("missing"), 0);
        assert_eq!(node.attr_str("missing"), "");
    }

    #[test]
    fn prefix_skips_root() {
        let options = LoadOptions {
            bone_prefix: Some("Dx_".into()),
            ..Default::default()
        };
        assert_eq!(options.bone_name("root"), "root");
        assert_eq!(options.bone_name("Spine"), "Dx_Spine");
    }

    #[test]
    fn zero_axis_is_identity() {
        assert_eq!(quat_from_axis_angle(Vec3::ZERO, 1.0), Quat::IDENTITY);
    }
}
