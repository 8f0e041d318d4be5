mod camera;
mod color;
mod mesh;
mod texture;

pub use camera::{Camera, MAX_PITCH};
pub use color::Color;
pub use mesh::{Mesh, MeshError, Vertex};
pub use texture::{Texture, TextureError};
