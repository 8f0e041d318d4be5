use crate::core::{Color, Texture};
use crate::pipeline::framebuffer::{Framebuffer, FrameTile};
use crate::pipeline::geometry::{edge_function, PreparedTriangle};
use glam::{Vec2, Vec3};
use rayon::prelude::*;

/// Tile edge in pixels. One tile's color + depth stay resident in L1/L2
/// for the whole triangle scan.
pub const TILE_SIZE: usize = 16;

/// The light is a constant vector dotted against view-space normals, so it
/// is effectively head-mounted and rotates with the camera. Intentional.
fn light_dir() -> Vec3 {
    Vec3::new(0.5, 1.0, 0.8).normalize()
}

/// Rasterize all triangles with one worker per framebuffer tile. Every
/// pixel of every tile is blitted, so the framebuffer does not need to be
/// cleared beforehand.
pub fn render_tiled(fb: &mut Framebuffer, triangles: &[PreparedTriangle], texture: &Texture) {
    render_tiled_with(fb, triangles, texture, TILE_SIZE);
}

/// Same as [`render_tiled`] with an explicit tile size. Output is identical
/// for any tile size; the parameter exists for tuning and for tests.
pub fn render_tiled_with(
    fb: &mut Framebuffer,
    triangles: &[PreparedTriangle],
    texture: &Texture,
    tile_size: usize,
) {
    let tiles = fb.split_into_tiles(tile_size);
    tiles.into_par_iter().for_each(|mut tile| {
        let mut colors = vec![Color::BACKGROUND; tile.len()];
        let mut depths = vec![f32::INFINITY; tile.len()];

        for tri in triangles {
            raster_triangle_in_tile(tri, &tile, texture, &mut colors, &mut depths);
        }

        tile.blit(&colors, &depths);
    });
}

/// Serial per-triangle fallback writing straight through `set_pixel`.
/// Produces the same framebuffer as the tiled path; callers must clear
/// the framebuffer first.
pub fn render_serial(fb: &mut Framebuffer, triangles: &[PreparedTriangle], texture: &Texture) {
    for tri in triangles {
        if !tri.valid {
            continue;
        }
        let inv_area = 1.0 / tri.area;
        for y in tri.min_y..=tri.max_y {
            for x in tri.min_x..=tri.max_x {
                if let Some((depth, b)) = coverage(tri, inv_area, x, y) {
                    fb.set_pixel(x, y, shade(tri, b, texture), depth);
                }
            }
        }
    }
}

fn raster_triangle_in_tile(
    tri: &PreparedTriangle,
    tile: &FrameTile,
    texture: &Texture,
    colors: &mut [Color],
    depths: &mut [f32],
) {
    if !tri.valid {
        return;
    }

    let (tx0, ty0, tx1, ty1) = tile.rect();
    if tri.max_x < tx0 || tri.min_x > tx1 || tri.max_y < ty0 || tri.min_y > ty1 {
        return;
    }

    let x0 = tri.min_x.max(tx0);
    let x1 = tri.max_x.min(tx1);
    let y0 = tri.min_y.max(ty0);
    let y1 = tri.max_y.min(ty1);

    let inv_area = 1.0 / tri.area;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let Some((depth, b)) = coverage(tri, inv_area, x, y) else {
                continue;
            };

            let local = (y - ty0) as usize * tile.width + (x - tx0) as usize;
            if depth >= depths[local] {
                continue;
            }
            depths[local] = depth;
            colors[local] = shade(tri, b, texture);
        }
    }
}

/// Evaluate the three edge functions at the pixel center. Returns the
/// interpolated NDC depth and barycentrics if the pixel is covered and its
/// depth is inside [-1, 1]. Pixels exactly on an edge count as covered, and
/// both windings are accepted.
#[inline]
fn coverage(tri: &PreparedTriangle, inv_area: f32, x: i32, y: i32) -> Option<(f32, Vec3)> {
    let px = x as f32 + 0.5;
    let py = y as f32 + 0.5;

    let e0 = edge_function(tri.screen[1], tri.screen[2], px, py);
    let e1 = edge_function(tri.screen[2], tri.screen[0], px, py);
    let e2 = edge_function(tri.screen[0], tri.screen[1], px, py);

    let inside = (e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0) || (e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0);
    if !inside {
        return None;
    }

    let b = Vec3::new(e0 * inv_area, e1 * inv_area, e2 * inv_area);
    let depth = b.x * tri.screen[0].z + b.y * tri.screen[1].z + b.z * tri.screen[2].z;
    if !(-1.0..=1.0).contains(&depth) {
        return None;
    }
    Some((depth, b))
}

/// Perspective-correct attribute interpolation, texture lookup, and the
/// fixed diffuse term.
#[inline]
fn shade(tri: &PreparedTriangle, b: Vec3, texture: &Texture) -> Color {
    let iw0 = 1.0 / tri.clip[0].w;
    let iw1 = 1.0 / tri.clip[1].w;
    let iw2 = 1.0 / tri.clip[2].w;
    let corr = 1.0 / (b.x * iw0 + b.y * iw1 + b.z * iw2);

    let uv: Vec2 = (b.x * tri.texcoords[0] * iw0
        + b.y * tri.texcoords[1] * iw1
        + b.z * tri.texcoords[2] * iw2)
        * corr;

    let normal: Vec3 = ((b.x * tri.normals[0] * iw0
        + b.y * tri.normals[1] * iw1
        + b.z * tri.normals[2] * iw2)
        * corr)
        .normalize();

    let base = texture.sample(uv.x, uv.y);

    let ndotl = normal.dot(light_dir()).max(0.0);
    base * (0.3 + 0.7 * ndotl)
}
