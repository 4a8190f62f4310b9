//! Static mesh asset (`.mdl`) encoder.
//!
//! Layout, every scalar in the stream's byte order:
//!
//! ```text
//! u32   magic (MDL_MAGIC)
//! i32   material count (1), node count (1), bone count, reserved (0)
//! ...   material block (see MaterialDesc::write)
//! per bone, breadth-first from the root:
//!   str   name (root renamed)
//!   i32   first child slot (running counter seeded at 1)
//!   i32   child count
//!   f32×9 bind rotation, row-major 3×3
//!   f32×3 bind position
//! i32   submesh count (1)
//! i32   length of the rest of the block
//!   str   mesh name
//!   i32×2 reserved
//!   i32×6 face, position, normal, uv, weight-list counts, reserved
//!   per face, per corner: vertex, normal, uv, 0, weight; then 0, 0
//!   f32×3 positions, f32×3 normals, f32×2 uvs (v flipped)
//!   per vertex: i32 count, (i32 bone index, f32 weight) pairs
//! ```

use glam::Mat3;
use rustc_hash::FxHashMap;

use super::material::MaterialDesc;
use crate::errors::{Result, RigError};
use crate::io::{BinaryStream, StreamDevice};
use crate::scene::{Mesh, Skeleton};

pub const MDL_MAGIC: u32 = 0x074C_444D;

/// Source bone id → breadth-first bone index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoneRemap(FxHashMap<i32, u32>);

impl BoneRemap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source_id: i32, index: u32) {
        if let Some(previous) = self.0.insert(source_id, index) {
            log::warn!("Bone id {source_id} assigned twice (index {previous} then {index})");
        }
    }

    /// The encoded index of `source_id`. Unmapped ids are a contract violation.
    pub fn get(&self, source_id: i32) -> Result<u32> {
        self.0
            .get(&source_id)
            .copied()
            .ok_or(RigError::UnmappedBoneId(source_id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(i32, u32)> for BoneRemap {
    fn from_iter<I: IntoIterator<Item = (i32, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Writes one `.mdl` asset into a [`BinaryStream`].
pub struct MdlWriter<'s, D: StreamDevice> {
    stream: &'s mut BinaryStream<D>,
    root_token: &'s str,
}

impl<'s, D: StreamDevice> MdlWriter<'s, D> {
    /// `root_token` replaces the root bone's name in the bone block.
    pub fn new(stream: &'s mut BinaryStream<D>, root_token: &'s str) -> Self {
        Self { stream, root_token }
    }

    /// Header, material, bones and mesh. Returns the bone index map used for
    /// the weights.
    pub fn write_model(
        &mut self,
        skeleton: &Skeleton,
        mesh: &Mesh,
        material: &MaterialDesc,
        mesh_name: &str,
    ) -> Result<BoneRemap> {
        self.write_header(skeleton.bone_count())?;
        material.write(&mut *self.stream)?;
        let remap = if skeleton.bone_count() > 0 {
            self.write_bones(skeleton)?
        } else {
            BoneRemap::new()
        };
        self.write_mesh(mesh_name, mesh, &remap)?;
        Ok(remap)
    }

    pub fn write_header(&mut self, bone_count: usize) -> Result<()> {
        self.stream.write_u32(MDL_MAGIC)?;
        self.stream.write_i32(1)?;
        self.stream.write_i32(1)?;
        self.stream.write_i32(bone_count as i32)?;
        self.stream.write_i32(0)
    }

    /// Emits the bone block and records each bone's breadth-first index.
    pub fn write_bones(&mut self, skeleton: &Skeleton) -> Result<BoneRemap> {
        let mut remap = BoneRemap::new();
        let mut child_slot: i32 = 1;

        for (index, bone) in skeleton.breadth_first()?.into_iter().enumerate() {
            let name = if bone.is_root() { self.root_token } else { bone.name.as_str() };
            let child_count = bone.children.len() as i32;

            self.stream.write_sized_string(name)?;
            self.stream.write_i32(child_slot)?;
            self.stream.write_i32(child_count)?;
            for value in Mat3::from_quat(bone.rotation).transpose().to_cols_array() {
                self.stream.write_f32(value)?;
            }
            self.stream.write_f32x3(bone.position.to_array())?;

            child_slot += child_count;
            remap.insert(bone.id, index as u32);
        }

        log::debug!("Wrote {} bone records", remap.len());
        Ok(remap)
    }

    /// Emits the mesh block. Returns the patched block length.
    pub fn write_mesh(&mut self, name: &str, mesh: &Mesh, remap: &BoneRemap) -> Result<u32> {
        let geometry = &mesh.geometry;
        let stream = &mut *self.stream;

        stream.write_i32(1)?;
        stream.begin_sized_block()?;
        stream.write_sized_string(name)?;
        stream.write_i32(0)?;
        stream.write_i32(0)?;

        for count in [
            mesh.faces.len(),
            geometry.positions.len(),
            geometry.normals.len(),
            geometry.uvs.len(),
            geometry.weights.len(),
            0,
        ] {
            stream.write_i32(count as i32)?;
        }

        for face in &mesh.faces {
            for v in face.corners() {
                let v = v as i32;
                stream.write_i32(v)?;
                stream.write_i32(v)?;
                stream.write_i32(v)?;
                stream.write_i32(0)?;
                stream.write_i32(v)?;
            }
            stream.write_i32(0)?;
            stream.write_i32(0)?;
        }

        for p in &geometry.positions {
            stream.write_f32x3(p.to_array())?;
        }
        for n in &geometry.normals {
            stream.write_f32x3(n.to_array())?;
        }
        for uv in &geometry.uvs {
            stream.write_f32(uv.x)?;
            stream.write_f32(1.0 - uv.y)?;
        }
        for list in &geometry.weights {
            stream.write_i32(list.len() as i32)?;
            for w in list {
                stream.write_i32(remap.get(w.bone_id)? as i32)?;
                stream.write_f32(w.weight)?;
            }
        }

        let len = stream.end_sized_block()?;
        log::debug!("Mesh block '{name}': {} faces, {len} bytes", mesh.faces.len());
        Ok(len)
    }
}
