use crate::core::Color;
use std::path::Path;

/// Color + depth grids for one frame. The grids always have the same
/// length; depth is `f32::INFINITY` wherever nothing has been drawn.
///
/// Writes during rasterization go through disjoint [`FrameTile`] views;
/// `set_pixel` exists for the serial path and for tests.
pub struct Framebuffer {
    pub width: usize,
    pub height: usize,
    pub color: Vec<Color>,
    pub depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let mut fb = Framebuffer {
            width,
            height,
            color: Vec::new(),
            depth: Vec::new(),
        };
        fb.resize(width, height);
        fb
    }

    pub fn clear(&mut self, bg: Color) {
        self.color.fill(bg);
        self.depth.fill(f32::INFINITY);
    }

    /// Reallocate both grids and reset contents.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let len = width * height;
        self.color.clear();
        self.color.resize(len, Color::BACKGROUND);
        self.depth.clear();
        self.depth.resize(len, f32::INFINITY);
    }

    /// Read a pixel; out of bounds reads as black.
    pub fn pixel(&self, x: i32, y: i32) -> Color {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return Color::BLACK;
        }
        self.color[y as usize * self.width + x as usize]
    }

    /// Depth-tested write for the serial rasterizer path. The test is
    /// strict: on an exact tie the existing fragment wins.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color, depth: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if depth < self.depth[idx] {
            self.depth[idx] = depth;
            self.color[idx] = color;
        }
    }

    /// Partition the framebuffer into disjoint rectangular tiles of at most
    /// `tile_size` pixels on a side. Together the tiles cover every pixel
    /// exactly once, which is what makes the parallel blit race-free.
    pub fn split_into_tiles(&mut self, tile_size: usize) -> Vec<FrameTile> {
        let tile_size = tile_size.max(1);
        let color_ptr = self.color.as_mut_ptr();
        let depth_ptr = self.depth.as_mut_ptr();

        let mut tiles = Vec::new();
        let mut y0 = 0;
        while y0 < self.height {
            let h = (self.height - y0).min(tile_size);
            let mut x0 = 0;
            while x0 < self.width {
                let w = (self.width - x0).min(tile_size);
                tiles.push(FrameTile {
                    x0,
                    y0,
                    width: w,
                    height: h,
                    stride: self.width,
                    color_ptr,
                    depth_ptr,
                });
                x0 += tile_size;
            }
            y0 += tile_size;
        }
        tiles
    }

    /// Dump the color grid as an RGB8 PNG.
    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        let mut pixels = Vec::with_capacity(self.width * self.height * 3);
        for c in &self.color {
            pixels.extend_from_slice(&[c.r, c.g, c.b]);
        }
        image::save_buffer(
            path,
            &pixels,
            self.width as u32,
            self.height as u32,
            image::ExtendedColorType::Rgb8,
        )
    }
}

/// Mutable view of one tile's rectangle inside the framebuffer. Carries raw
/// pointers into the backing grids; the rectangle coordinates guarantee that
/// simultaneously live tiles never alias, which is the entire synchronization
/// story of the rasterizer.
pub struct FrameTile {
    pub x0: usize,
    pub y0: usize,
    pub width: usize,
    pub height: usize,
    stride: usize,
    color_ptr: *mut Color,
    depth_ptr: *mut f32,
}

// Safety: tiles produced by `split_into_tiles` cover disjoint pixel
// rectangles, so concurrent workers never write the same index.
unsafe impl Send for FrameTile {}
unsafe impl Sync for FrameTile {}

impl FrameTile {
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inclusive pixel rectangle in framebuffer coordinates.
    pub fn rect(&self) -> (i32, i32, i32, i32) {
        (
            self.x0 as i32,
            self.y0 as i32,
            (self.x0 + self.width - 1) as i32,
            (self.y0 + self.height - 1) as i32,
        )
    }

    /// Copy tile-local color and depth rows into the framebuffer.
    pub fn blit(&mut self, colors: &[Color], depths: &[f32]) {
        debug_assert_eq!(colors.len(), self.len());
        debug_assert_eq!(depths.len(), self.len());
        for row in 0..self.height {
            let local = row * self.width;
            let global = (self.y0 + row) * self.stride + self.x0;
            unsafe {
                std::ptr::copy_nonoverlapping(
                    colors.as_ptr().add(local),
                    self.color_ptr.add(global),
                    self.width,
                );
                std::ptr::copy_nonoverlapping(
                    depths.as_ptr().add(local),
                    self.depth_ptr.add(global),
                    self.width,
                );
            }
        }
    }
}
