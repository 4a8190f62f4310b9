use glam::{Vec2, Vec3};
use smallvec::SmallVec;

use super::document::SceneNode;
use crate::errors::Result;

/// One (bone, weight) influence on a vertex. `bone_id` is the source bone id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneWeight {
    pub bone_id: i32,
    pub weight: f32,
}

impl BoneWeight {
    #[must_use]
    pub const fn new(bone_id: i32, weight: f32) -> Self {
        Self { bone_id, weight }
    }
}

/// Influences of one vertex. Rarely more than four.
pub type WeightList = SmallVec<[BoneWeight; 4]>;

/// Three vertex indices shared by every per-vertex stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub v1: u32,
    pub v2: u32,
    pub v3: u32,
}

impl Triangle {
    #[must_use]
    pub const fn new(v1: u32, v2: u32, v3: u32) -> Self {
        Self { v1, v2, v3 }
    }

    #[inline]
    #[must_use]
    pub const fn corners(&self) -> [u32; 3] {
        [self.v1, self.v2, self.v3]
    }
}

/// Index-aligned vertex streams.
///
/// Entry `i` of every array describes vertex `i`; there are no independent
/// index streams.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub weights: Vec<WeightList>,
}

impl Geometry {
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Adds a weight to vertex `vertex`, growing the weight array as needed.
    pub fn add_weight(&mut self, vertex: usize, weight: BoneWeight) {
        if self.weights.len() <= vertex {
            self.weights.resize_with(vertex + 1, WeightList::new);
        }
        self.weights[vertex].push(weight);
    }

    /// Whether every populated stream has one entry per vertex.
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        let n = self.positions.len();
        [self.normals.len(), self.uvs.len(), self.weights.len()]
            .iter()
            .all(|&len| len == 0 || len == n)
    }
}

/// A skinned mesh: shared geometry plus the triangles of every submesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub geometry: Geometry,
    pub faces: Vec<Triangle>,
}

impl Mesh {
    /// Builds a mesh from a `<mesh>` document.
    ///
    /// Vertex buffers contribute positions and normals only when flagged, and
    /// UVs only for a single 2D texture coordinate set. Faces of all submeshes
    /// are concatenated.
    pub fn from_node(node: &SceneNode) -> Result<Self> {
        node.expect_element("mesh")?;
        let mut mesh = Self::default();
        let geometry = &mut mesh.geometry;

        for buffer in node.children_of("sharedgeometry") {
            let has_positions = buffer.attr_bool("positions");
            let has_normals = buffer.attr_bool("normals");
            let has_uvs = buffer.attr_i32("texture_coords") == 1
                && buffer.attr_i32("texture_coord_dimensions_0") == 2;

            for vertex in buffer.children_named("vertex") {
                if has_positions {
                    geometry
                        .positions
                        .push(vertex.child("position").map(SceneNode::vec3).unwrap_or_default());
                }
                if has_normals {
                    geometry
                        .normals
                        .push(vertex.child("normal").map(SceneNode::vec3).unwrap_or_default());
                }
                if has_uvs {
                    let uv = vertex
                        .child("texcoord")
                        .map(|t| Vec2::new(t.attr_f32("u"), t.attr_f32("v")))
                        .unwrap_or_default();
                    geometry.uvs.push(uv);
                }
            }
        }

        for submesh in node.children_of("submeshes") {
            for face in submesh.children_of("faces") {
                mesh.faces.push(Triangle::new(
                    vertex_index(face, "v1"),
                    vertex_index(face, "v2"),
                    vertex_index(face, "v3"),
                ));
            }
        }

        for assignment in node.children_of("boneassignments") {
            let vertex = vertex_index(assignment, "vertexindex") as usize;
            let weight = BoneWeight::new(assignment.attr_i32("boneindex"), assignment.attr_f32("weight"));
            mesh.geometry.add_weight(vertex, weight);
        }

        // Vertices without assignments still get an (empty) list.
        let vertex_count = mesh.geometry.vertex_count();
        if mesh.geometry.weights.len() < vertex_count {
            mesh.geometry.weights.resize_with(vertex_count, WeightList::new);
        }

        if !mesh.geometry.is_aligned() {
            let g = &mesh.geometry;
            log::warn!(
                "Vertex streams are not aligned: {} positions, {} normals, {} uvs, {} weight lists",
                g.positions.len(),
                g.normals.len(),
                g.uvs.len(),
                g.weights.len()
            );
        }
        if let Some(face) = mesh
            .faces
            .iter()
            .find(|f| f.corners().iter().any(|&v| v as usize >= vertex_count))
        {
            log::warn!("Face {face:?} references a vertex past {vertex_count}");
        }

        log::debug!(
            "Loaded mesh with {} vertices and {} faces",
            vertex_count,
            mesh.faces.len()
        );
        Ok(mesh)
    }

    /// Loads a mesh from a JSON scene document on disk.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Self::from_node(&SceneNode::load_json(path)?)
    }
}

fn vertex_index(node: &SceneNode, key: &str) -> u32 {
    let raw = node.attr_i32(key);
    u32::try_from(raw).unwrap_or_else(|_| {
        log::warn!("<{}> has negative {key}={raw}", node.name);
        0
    })
}
