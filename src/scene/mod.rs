//! Scene Module
//!
//! In-memory models built from external scene documents:
//!
//! - [`SceneNode`]: the attribute-keyed node tree handed over by the parser
//! - [`Skeleton`] / [`Bone`]: a named bone hierarchy with bind transforms
//! - [`Mesh`] / [`Geometry`]: index-aligned vertex streams and triangles

pub mod document;
pub mod geometry;
pub mod skeleton;

pub use document::{LoadOptions, ROOT_BONE, SceneNode, quat_from_axis_angle};
pub use geometry::{BoneWeight, Geometry, Mesh, Triangle, WeightList};
pub use skeleton::{Bone, PSEUDO_BONE_ID, Skeleton};
