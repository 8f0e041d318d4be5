use glam::{Vec2, Vec3};
use log::info;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("failed to load OBJ file: {0}")]
    Load(#[from] tobj::LoadError),
    #[error("mesh contains no triangles")]
    Empty,
}

#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Vec3,
    pub texcoord: Vec2,
    pub normal: Vec3,
}

/// Indexed triangle mesh. Read-only once loaded; the index count is always
/// a multiple of 3 and every index is in bounds.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn from_obj(path: &Path) -> Result<Self, MeshError> {
        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )?;

        let mut mesh = Mesh::default();

        for model in models {
            let m = model.mesh;
            let base = mesh.vertices.len() as u32;

            for (i, pos) in m.positions.chunks(3).enumerate() {
                let texcoord = if m.texcoords.len() >= (i + 1) * 2 {
                    Vec2::new(m.texcoords[i * 2], m.texcoords[i * 2 + 1])
                } else {
                    Vec2::ZERO
                };
                let normal = if m.normals.len() >= (i + 1) * 3 {
                    Vec3::new(m.normals[i * 3], m.normals[i * 3 + 1], m.normals[i * 3 + 2])
                } else {
                    Vec3::Y
                };
                mesh.vertices.push(Vertex {
                    position: Vec3::new(pos[0], pos[1], pos[2]),
                    texcoord,
                    normal,
                });
            }

            mesh.indices.extend(m.indices.iter().map(|&i| base + i));
        }

        if mesh.indices.is_empty() {
            return Err(MeshError::Empty);
        }

        info!(
            "loaded {:?}: {} vertices, {} triangles",
            path,
            mesh.vertices.len(),
            mesh.indices.len() / 3
        );
        Ok(mesh)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// AABB midpoint and largest edge, used to frame the mesh at the origin.
    pub fn bounds(&self) -> (Vec3, f32) {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for v in &self.vertices {
            min = min.min(v.position);
            max = max.max(v.position);
        }
        let size = max - min;
        let extent = size.x.max(size.y).max(size.z);
        ((min + max) * 0.5, extent)
    }
}
