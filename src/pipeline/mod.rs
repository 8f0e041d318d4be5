mod framebuffer;
mod geometry;
mod raster;

pub use framebuffer::{Framebuffer, FrameTile};
pub use geometry::{edge_function, prepare_triangles, setup_triangle, PreparedTriangle};
pub use raster::{render_serial, render_tiled, render_tiled_with, TILE_SIZE};
