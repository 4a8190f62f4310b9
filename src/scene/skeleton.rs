use std::collections::VecDeque;

use glam::{Quat, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};

use super::document::{LoadOptions, ROOT_BONE, SceneNode};
use crate::errors::{Result, RigError};

/// Id given to bones appended after loading.
pub const PSEUDO_BONE_ID: i32 = 100;

/// A single bone of a rest pose.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Source-assigned id. Vertex weights refer to bones through it.
    pub id: i32,
    /// `None` for the root.
    pub parent: Option<String>,
    /// Child names in hierarchy declaration order.
    pub children: Vec<String>,

    // === Bind transform (local to parent) ===
    pub position: Vec3,
    pub rotation: Quat,
}

impl Bone {
    pub fn new(name: impl Into<String>, id: i32, position: Vec3, rotation: Quat) -> Self {
        Self {
            name: name.into(),
            id,
            parent: None,
            children: Vec::new(),
            position,
            rotation,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.name == ROOT_BONE
    }
}

/// A named bone hierarchy.
///
/// Bones are keyed by name. Declaration order is kept alongside so iteration
/// is deterministic; [`breadth_first`](Self::breadth_first) defines the
/// order every encoder relies on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    bones: FxHashMap<String, Bone>,
    order: Vec<String>,
}

impl Skeleton {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a skeleton from a `<skeleton>` document.
    ///
    /// Reads `bones/bone` (id, name, `position`, `rotation`/`axis`), then
    /// `bonehierarchy/boneparent` (bone, parent). An id that does not match
    /// the bone's list position and hierarchy entries naming unknown bones
    /// are reported and tolerated.
    pub fn from_node(node: &SceneNode, options: &LoadOptions) -> Result<Self> {
        node.expect_element("skeleton")?;
        let mut skeleton = Self::new();

        for (index, element) in node.children_of("bones").enumerate() {
            let id = element.attr_i32("id");
            let name = options.bone_name(element.attr_str("name"));
            if usize::try_from(id).ok() != Some(index) {
                log::warn!("Bone '{name}' has id {id}, expected {index}");
            }

            let position = element.child("position").map(SceneNode::vec3).unwrap_or_default();
            let rotation = element
                .child("rotation")
                .map_or(Quat::IDENTITY, SceneNode::axis_angle);
            skeleton.insert(Bone::new(name, id, position, rotation));
        }

        for link in node.children_of("bonehierarchy") {
            let child = options.bone_name(link.attr_str("bone"));
            let parent = options.bone_name(link.attr_str("parent"));
            if let Err(err) = skeleton.link(&child, &parent) {
                log::warn!("Skipping hierarchy entry {child} -> {parent}: {err}");
            }
        }

        if !skeleton.contains(ROOT_BONE) {
            log::warn!("Skeleton document has no '{ROOT_BONE}' bone");
        }
        log::debug!("Loaded skeleton with {} bones", skeleton.bone_count());
        Ok(skeleton)
    }

    /// Loads a skeleton from a JSON scene document on disk.
    pub fn load(path: impl AsRef<std::path::Path>, options: &LoadOptions) -> Result<Self> {
        Self::from_node(&SceneNode::load_json(path)?, options)
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Adds or replaces a bone. Hierarchy links are left as given.
    pub fn insert(&mut self, bone: Bone) {
        if !self.bones.contains_key(&bone.name) {
            self.order.push(bone.name.clone());
        }
        self.bones.insert(bone.name.clone(), bone);
    }

    /// Makes `child` a child of `parent`, keeping both sides consistent.
    pub fn link(&mut self, child: &str, parent: &str) -> Result<()> {
        if !self.bones.contains_key(parent) {
            return Err(RigError::MissingBone(parent.to_string()));
        }
        let bone = self
            .bones
            .get_mut(child)
            .ok_or_else(|| RigError::MissingBone(child.to_string()))?;
        bone.parent = Some(parent.to_string());

        let parent_bone = self.bone_mut(parent)?;
        if !parent_bone.children.iter().any(|c| c == child) {
            parent_bone.children.push(child.to_string());
        }
        Ok(())
    }

    /// Appends a bone with [`PSEUDO_BONE_ID`] and identity rotation under `parent`.
    pub fn add_pseudo_bone(&mut self, name: &str, parent: &str, position: Vec3) -> Result<()> {
        if !self.bones.contains_key(parent) {
            return Err(RigError::MissingBone(parent.to_string()));
        }
        self.insert(Bone::new(name, PSEUDO_BONE_ID, position, Quat::IDENTITY));
        self.link(name, parent)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Looks up a bone that must exist.
    pub fn bone(&self, name: &str) -> Result<&Bone> {
        self.bones
            .get(name)
            .ok_or_else(|| RigError::MissingBone(name.to_string()))
    }

    pub fn bone_mut(&mut self, name: &str) -> Result<&mut Bone> {
        self.bones
            .get_mut(name)
            .ok_or_else(|| RigError::MissingBone(name.to_string()))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Bone> {
        self.bones.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bones.contains_key(name)
    }

    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Bones in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Bone> {
        self.order.iter().filter_map(|name| self.bones.get(name))
    }

    /// Bones level by level from the root, children in declaration order.
    ///
    /// Bones not reachable from the root are not part of the sequence.
    pub fn breadth_first(&self) -> Result<Vec<&Bone>> {
        let root = self.bones.get(ROOT_BONE).ok_or(RigError::MissingRoot)?;

        let mut visited = FxHashSet::default();
        visited.insert(root.name.as_str());
        let mut queue = VecDeque::from([root]);
        let mut sequence = Vec::with_capacity(self.bones.len());

        while let Some(bone) = queue.pop_front() {
            sequence.push(bone);
            for child in &bone.children {
                let child = self.bone(child)?;
                if visited.insert(child.name.as_str()) {
                    queue.push_back(child);
                } else {
                    log::warn!("Bone '{}' reached twice; hierarchy is not a tree", child.name);
                }
            }
        }

        let unreachable = self.bones.len() - sequence.len();
        if unreachable > 0 {
            log::warn!("{unreachable} bones are not reachable from '{ROOT_BONE}'");
        }
        Ok(sequence)
    }
}
