use crate::core::Mesh;
use glam::{Mat4, Vec2, Vec3, Vec4};
use rayon::prelude::*;

/// Vertices this close to (or behind) the eye plane kill the whole triangle.
const MIN_CLIP_W: f32 = 0.001;
/// Screen-space triangles smaller than this are treated as degenerate.
const MIN_AREA: f32 = 0.001;

/// One triangle after the geometry and setup stages: clip-space positions
/// for perspective correction, screen-space positions for edge tests,
/// attributes to interpolate, and the precomputed raster bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreparedTriangle {
    pub clip: [Vec4; 3],
    /// x, y in pixels; z is NDC depth.
    pub screen: [Vec3; 3],
    pub texcoords: [Vec2; 3],
    /// View-space normals, left un-normalized until after interpolation.
    pub normals: [Vec3; 3],
    /// Signed twice-area in screen space; the edge-function normalizer.
    pub area: f32,
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    pub valid: bool,
}

/// Signed twice-area of (a, b, p). Same sign for all p on one side of ab.
#[inline]
pub fn edge_function(a: Vec3, b: Vec3, px: f32, py: f32) -> f32 {
    (px - a.x) * (b.y - a.y) - (py - a.y) * (b.x - a.x)
}

/// Transform every mesh triangle into a `PreparedTriangle`, in parallel.
/// Results land in `out` so the caller can reuse the allocation per frame.
pub fn prepare_triangles(
    mesh: &Mesh,
    mvp: &Mat4,
    model_view: &Mat4,
    width: usize,
    height: usize,
    out: &mut Vec<PreparedTriangle>,
) {
    (0..mesh.triangle_count())
        .into_par_iter()
        .map(|tri| {
            let mut clip = [Vec4::ZERO; 3];
            let mut texcoords = [Vec2::ZERO; 3];
            let mut normals = [Vec3::ZERO; 3];

            for j in 0..3 {
                let v = &mesh.vertices[mesh.indices[tri * 3 + j] as usize];
                clip[j] = *mvp * v.position.extend(1.0);
                texcoords[j] = v.texcoord;
                // w = 0: direction, not position.
                normals[j] = (*model_view * v.normal.extend(0.0)).truncate();
            }

            setup_triangle(clip, texcoords, normals, width, height)
        })
        .collect_into_vec(out);
}

/// Perspective divide, viewport map, area and bounds. Marks the triangle
/// invalid if any vertex sits behind the eye or the screen area degenerates.
pub fn setup_triangle(
    clip: [Vec4; 3],
    texcoords: [Vec2; 3],
    normals: [Vec3; 3],
    width: usize,
    height: usize,
) -> PreparedTriangle {
    let mut tri = PreparedTriangle {
        clip,
        texcoords,
        normals,
        ..Default::default()
    };

    let mut screen = [Vec3::ZERO; 3];
    for j in 0..3 {
        let w = clip[j].w;
        if w <= MIN_CLIP_W {
            return tri;
        }
        let ndc = clip[j].truncate() / w;
        screen[j] = Vec3::new(
            (ndc.x + 1.0) * 0.5 * width as f32,
            (1.0 - ndc.y) * 0.5 * height as f32,
            ndc.z,
        );
    }
    tri.screen = screen;

    tri.area = edge_function(screen[0], screen[1], screen[2].x, screen[2].y);
    if tri.area.abs() < MIN_AREA {
        return tri;
    }

    let min_x = screen[0].x.min(screen[1].x).min(screen[2].x);
    let max_x = screen[0].x.max(screen[1].x).max(screen[2].x);
    let min_y = screen[0].y.min(screen[1].y).min(screen[2].y);
    let max_y = screen[0].y.max(screen[1].y).max(screen[2].y);

    tri.min_x = (min_x.floor() as i32).max(0);
    tri.max_x = (max_x.ceil() as i32).min(width as i32 - 1);
    tri.min_y = (min_y.floor() as i32).max(0);
    tri.max_y = (max_y.ceil() as i32).min(height as i32 - 1);
    tri.valid = true;
    tri
}
