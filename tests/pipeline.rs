//! End-to-end rendering scenarios: synthetic meshes go through the geometry
//! stage and both rasterizer paths, and the tests assert on the resulting
//! color and depth grids.

use glam::{Mat4, Vec2, Vec3, Vec4};
use termrast::core::{Color, Mesh, Texture, Vertex};
use termrast::pipeline::{
    edge_function, prepare_triangles, render_serial, render_tiled, render_tiled_with,
    setup_triangle, Framebuffer, PreparedTriangle,
};

fn light_brightness(normal: Vec3) -> f32 {
    let light = Vec3::new(0.5, 1.0, 0.8).normalize();
    0.3 + 0.7 * normal.dot(light).max(0.0)
}

/// Quad in NDC (w = 1 everywhere) as an indexed mesh: two triangles, UVs
/// spanning [0,1]^2, normals facing the camera.
fn ndc_quad(min: Vec2, max: Vec2, z: f32) -> Mesh {
    let corners = [
        (Vec3::new(min.x, min.y, z), Vec2::new(0.0, 0.0)),
        (Vec3::new(max.x, min.y, z), Vec2::new(1.0, 0.0)),
        (Vec3::new(max.x, max.y, z), Vec2::new(1.0, 1.0)),
        (Vec3::new(min.x, max.y, z), Vec2::new(0.0, 1.0)),
    ];
    Mesh {
        vertices: corners
            .iter()
            .map(|&(position, texcoord)| Vertex {
                position,
                texcoord,
                normal: Vec3::Z,
            })
            .collect(),
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

fn quad_with_uv(min: Vec2, max: Vec2, z: f32, uv: Vec2) -> Mesh {
    let mut mesh = ndc_quad(min, max, z);
    for v in &mut mesh.vertices {
        v.texcoord = uv;
    }
    mesh
}

fn prepare(mesh: &Mesh, width: usize, height: usize) -> Vec<PreparedTriangle> {
    let mut out = Vec::new();
    prepare_triangles(
        mesh,
        &Mat4::IDENTITY,
        &Mat4::IDENTITY,
        width,
        height,
        &mut out,
    );
    out
}

#[test]
fn empty_mesh_leaves_background() {
    let mut fb = Framebuffer::new(33, 18);
    render_tiled(&mut fb, &[], &Texture::default());
    assert!(fb.color.iter().all(|&c| c == Color::new(20, 20, 30)));
    assert!(fb.depth.iter().all(|&d| d == f32::INFINITY));
}

#[test]
fn full_screen_quad_matches_texture_and_depth() {
    let width = 8;
    let height = 8;
    // 2x2 checker: red, green / blue, white.
    let checker = Texture::from_rgb8(
        2,
        2,
        vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255],
    );
    let mesh = ndc_quad(Vec2::splat(-1.0), Vec2::splat(1.0), 0.5);

    let tris = prepare(&mesh, width, height);
    let mut fb = Framebuffer::new(width, height);
    render_tiled(&mut fb, &tris, &checker);

    let brightness = light_brightness(Vec3::Z);
    for y in 0..height {
        for x in 0..width {
            // The quad maps UVs straight onto the viewport.
            let u = (x as f32 + 0.5) / width as f32;
            let v = 1.0 - (y as f32 + 0.5) / height as f32;
            let expected = checker.sample(u, v) * brightness;
            assert_eq!(fb.pixel(x as i32, y as i32), expected, "pixel ({x},{y})");
            let depth = fb.depth[y * width + x];
            assert!((depth - 0.5).abs() < 1e-5, "depth at ({x},{y}) = {depth}");
        }
    }
}

#[test]
fn nearer_quad_occludes_farther() {
    let width = 16;
    let height = 16;
    // 3x1 palette: red, green, blue. u = 0.25 lands on red, 0.75 on green.
    let palette = Texture::from_rgb8(3, 1, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);

    let far = quad_with_uv(Vec2::splat(-1.0), Vec2::splat(1.0), 0.9, Vec2::new(0.25, 0.0));
    let near = quad_with_uv(Vec2::splat(-0.5), Vec2::splat(0.5), 0.1, Vec2::new(0.75, 0.0));

    let mut mesh = far;
    let base = mesh.vertices.len() as u32;
    let near_mesh = near;
    mesh.vertices.extend(near_mesh.vertices);
    mesh.indices.extend(near_mesh.indices.iter().map(|&i| base + i));

    let tris = prepare(&mesh, width, height);
    let mut fb = Framebuffer::new(width, height);
    render_tiled(&mut fb, &tris, &palette);

    // NDC [-0.5, 0.5] maps to pixels [4, 12); stay a pixel away from the
    // boundary so edge rounding cannot flip the expectation.
    for y in 0..height {
        for x in 0..width {
            let color = fb.pixel(x as i32, y as i32);
            let depth = fb.depth[y * width + x];
            let inner = (6..10).contains(&x) && (6..10).contains(&y);
            let outer = !(4..12).contains(&x) || !(4..12).contains(&y);
            if inner {
                assert!(color.g > 100 && color.r == 0, "expected green at ({x},{y})");
                assert!((depth - 0.1).abs() < 1e-5);
            } else if outer {
                assert!(color.r > 100 && color.g == 0, "expected red at ({x},{y})");
                assert!((depth - 0.9).abs() < 1e-5);
            }
        }
    }
}

#[test]
fn interpolation_is_perspective_correct() {
    let width = 40;
    let height = 40;
    // Vertex C sits four times farther from the eye than A and B.
    let w = [1.0f32, 1.0, 4.0];
    let ndc = [
        Vec2::new(-0.8, -0.8),
        Vec2::new(0.8, -0.8),
        Vec2::new(-0.8, 0.8),
    ];
    let clip: [Vec4; 3] = std::array::from_fn(|j| {
        Vec4::new(ndc[j].x * w[j], ndc[j].y * w[j], 0.0, w[j])
    });
    let uvs = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
    let tri = setup_triangle(clip, uvs, [Vec3::Z; 3], width, height);
    assert!(tri.valid);

    // A 10x1 gradient texture turns the interpolated u into a texel index.
    let gradient = Texture::from_rgb8(
        10,
        1,
        (0..10u8).flat_map(|i| [i * 25, 0, 0]).collect(),
    );

    let mut fb = Framebuffer::new(width, height);
    render_tiled(&mut fb, &[tri], &gradient);

    // Pixel nearest the screen-space centroid.
    let centroid = (tri.screen[0] + tri.screen[1] + tri.screen[2]) / 3.0;
    let x = centroid.x as i32;
    let y = centroid.y as i32;
    let px = x as f32 + 0.5;
    let py = y as f32 + 0.5;

    // Barycentrics at that pixel, bit-identical to the rasterizer's own
    // construction (multiply by the reciprocal, not divide).
    let inv_area = 1.0 / tri.area;
    let b = Vec3::new(
        edge_function(tri.screen[1], tri.screen[2], px, py) * inv_area,
        edge_function(tri.screen[2], tri.screen[0], px, py) * inv_area,
        edge_function(tri.screen[0], tri.screen[1], px, py) * inv_area,
    );

    let iw = [1.0 / w[0], 1.0 / w[1], 1.0 / w[2]];
    let corr = 1.0 / (b.x * iw[0] + b.y * iw[1] + b.z * iw[2]);
    let u_correct = (b.x * uvs[0].x * iw[0] + b.y * uvs[1].x * iw[1] + b.z * uvs[2].x * iw[2]) * corr;
    let v_correct = (b.x * uvs[0].y * iw[0] + b.y * uvs[1].y * iw[1] + b.z * uvs[2].y * iw[2]) * corr;
    let u_affine = b.x * uvs[0].x + b.y * uvs[1].x + b.z * uvs[2].x;

    // The two schemes must disagree by a whole texel here, or the test
    // proves nothing.
    assert_ne!(
        (u_correct * 9.0) as u32,
        (u_affine * 9.0) as u32,
        "test geometry no longer separates the two interpolation schemes"
    );

    let brightness = light_brightness(Vec3::Z);
    let expected = gradient.sample(u_correct, v_correct) * brightness;
    assert_eq!(fb.pixel(x, y), expected);
}

#[test]
fn equal_w_reduces_to_affine_interpolation() {
    // With all clip w equal, perspective-correct UVs must match the plain
    // barycentric blend.
    let w = 2.0f32;
    let clip = [
        Vec4::new(-1.6, -1.6, 0.0, w),
        Vec4::new(1.6, -1.6, 0.0, w),
        Vec4::new(-1.6, 1.6, 0.0, w),
    ];
    let uvs = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
    let tri = setup_triangle(clip, uvs, [Vec3::Z; 3], 20, 20);
    assert!(tri.valid);

    let gradient = Texture::from_rgb8(
        10,
        1,
        (0..10u8).flat_map(|i| [i * 25, 0, 0]).collect(),
    );
    let mut fb = Framebuffer::new(20, 20);
    render_tiled(&mut fb, &[tri], &gradient);

    let brightness = light_brightness(Vec3::Z);
    for y in 0..20 {
        for x in 0..20 {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let inv_area = 1.0 / tri.area;
            let b = Vec3::new(
                edge_function(tri.screen[1], tri.screen[2], px, py) * inv_area,
                edge_function(tri.screen[2], tri.screen[0], px, py) * inv_area,
                edge_function(tri.screen[0], tri.screen[1], px, py) * inv_area,
            );
            if b.min_element() < 0.0 {
                continue;
            }
            let u = b.x * uvs[0].x + b.y * uvs[1].x + b.z * uvs[2].x;
            let v = b.x * uvs[0].y + b.y * uvs[1].y + b.z * uvs[2].y;
            let expected = gradient.sample(u, v) * brightness;
            assert_eq!(fb.pixel(x, y), expected, "pixel ({x},{y})");
        }
    }
}

fn test_scene(width: usize, height: usize) -> Vec<PreparedTriangle> {
    // A handful of overlapping triangles with mixed depths and w values.
    let mut tris = Vec::new();
    let uvs = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.5, 1.0)];
    for i in 0..6 {
        let t = i as f32 / 6.0;
        let w = 1.0 + t * 3.0;
        let offset = t - 0.4;
        let clip = [
            Vec4::new((-0.9 + offset) * w, (-0.9 + offset) * w, (t - 0.5) * w, w),
            Vec4::new((0.9 + offset) * w, (-0.7 + offset) * w, (0.5 - t) * w, w),
            Vec4::new((offset) * w, (0.9 - offset) * w, 0.2 * w, w),
        ];
        let normal = Vec3::new(t - 0.5, 0.5, 1.0 - t);
        tris.push(setup_triangle(clip, uvs, [normal; 3], width, height));
    }
    tris
}

#[test]
fn output_is_invariant_over_tile_size() {
    let width = 53;
    let height = 37;
    let tris = test_scene(width, height);
    let tex = Texture::from_rgb8(4, 4, (0..48).collect());

    let mut reference = Framebuffer::new(width, height);
    render_tiled_with(&mut reference, &tris, &tex, 16);

    for tile_size in [8, 32, 64] {
        let mut fb = Framebuffer::new(width, height);
        render_tiled_with(&mut fb, &tris, &tex, tile_size);
        assert_eq!(fb.color, reference.color, "tile size {tile_size}");
        assert_eq!(fb.depth, reference.depth, "tile size {tile_size}");
    }

    let mut serial = Framebuffer::new(width, height);
    serial.clear(Color::new(20, 20, 30));
    render_serial(&mut serial, &tris, &tex);
    assert_eq!(serial.color, reference.color);
    assert_eq!(serial.depth, reference.depth);
}

#[test]
fn output_is_invariant_over_worker_count() {
    let width = 64;
    let height = 48;
    let tris = test_scene(width, height);
    let tex = Texture::from_rgb8(4, 4, (0..48).collect());

    let mut parallel = Framebuffer::new(width, height);
    render_tiled(&mut parallel, &tris, &tex);

    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap();
    let mut serial_pool = Framebuffer::new(width, height);
    single.install(|| render_tiled(&mut serial_pool, &tris, &tex));

    assert_eq!(parallel.color, serial_pool.color);
    assert_eq!(parallel.depth, serial_pool.depth);
}

#[test]
fn no_writes_outside_bounds_for_offscreen_geometry() {
    let width = 12;
    let height = 10;
    // Triangles poking past every screen edge.
    let mesh = ndc_quad(Vec2::new(-3.0, -3.0), Vec2::new(3.0, 3.0), 0.0);
    let tris = prepare(&mesh, width, height);
    for tri in &tris {
        assert!(tri.min_x >= 0 && tri.max_x < width as i32);
        assert!(tri.min_y >= 0 && tri.max_y < height as i32);
    }
    let mut fb = Framebuffer::new(width, height);
    render_tiled(&mut fb, &tris, &Texture::default());
    // Every pixel belongs to the quad, none untouched.
    assert!(fb.depth.iter().all(|&d| d.is_finite()));
}

#[test]
fn depth_equality_keeps_first_triangle() {
    // Two coincident quads with different UVs: the one earlier in the list
    // must win because the depth test is strict.
    let width = 8;
    let height = 8;
    let palette = Texture::from_rgb8(3, 1, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);

    let mut mesh = quad_with_uv(Vec2::splat(-1.0), Vec2::splat(1.0), 0.3, Vec2::new(0.25, 0.0));
    let base = mesh.vertices.len() as u32;
    let second = quad_with_uv(Vec2::splat(-1.0), Vec2::splat(1.0), 0.3, Vec2::new(0.75, 0.0));
    mesh.vertices.extend(second.vertices);
    mesh.indices.extend(second.indices.iter().map(|&i| base + i));

    let tris = prepare(&mesh, width, height);
    let mut fb = Framebuffer::new(width, height);
    render_tiled(&mut fb, &tris, &palette);

    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let c = fb.pixel(x, y);
            assert!(c.r > 0 && c.g == 0, "first quad must win at ({x},{y})");
        }
    }
}
