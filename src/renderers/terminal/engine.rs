use crate::core::{Camera, Mesh, Texture};
use crate::pipeline::{prepare_triangles, render_tiled, Framebuffer, PreparedTriangle};
use crate::renderers::terminal::encoder;
use crate::Metrics;
use crossterm::{
    cursor::MoveTo,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    queue,
    style::Print,
    terminal::{self, Clear, ClearType},
};
use glam::{Mat4, Vec3};
use log::{info, warn};
use std::io::{self, Write};
use std::time::Duration;

/// Character rows at the bottom kept free of pixels: two status lines plus
/// one spare so the final newline never scrolls the frame.
pub const STATUS_ROWS: u16 = 3;

const MOVE_SPEED: f32 = 0.15;
const ROTATE_SPEED: f32 = 0.06;

const HELP_LINE: &str = "[WASD] Move  [QE] Up/Down  [IJKL] Look  [R] Reset  [P] Screenshot";

/// The per-frame driver: owns the framebuffer, the camera, the prepared
/// triangle scratch buffer, and the terminal-size cache.
pub struct Engine {
    mesh: Mesh,
    texture: Texture,
    camera: Camera,
    framebuffer: Framebuffer,
    projection: Mat4,
    mesh_center: Vec3,
    mesh_extent: f32,
    term_size: (u16, u16),
    char_rows: u16,
    /// Reused across frames so the geometry stage never reallocates.
    prepared: Vec<PreparedTriangle>,
    metrics: Metrics,
    screenshot_count: u32,
}

/// Pixel dimensions for a terminal of `cols` x `rows` characters. Each
/// character row carries two pixel rows; the status rows are excluded.
fn render_size(cols: u16, rows: u16) -> (usize, u16) {
    let char_rows = rows.saturating_sub(STATUS_ROWS).max(1);
    (cols as usize, char_rows)
}

fn perspective(width: usize, height: usize) -> Mat4 {
    let aspect = width as f32 / height as f32;
    // NDC z in [-1, 1], matching the rasterizer's depth range clip.
    Mat4::perspective_rh_gl(45f32.to_radians(), aspect, 0.1, 100.0)
}

impl Engine {
    pub fn new(mesh: Mesh, texture: Texture) -> io::Result<Self> {
        let term_size = terminal::size()?;
        let (width, char_rows) = render_size(term_size.0, term_size.1);
        let height = char_rows as usize * 2;

        let (mesh_center, mesh_extent) = mesh.bounds();

        Ok(Engine {
            mesh,
            texture,
            camera: Camera::default(),
            framebuffer: Framebuffer::new(width, height),
            projection: perspective(width, height),
            mesh_center,
            mesh_extent: if mesh_extent > 0.0 { mesh_extent } else { 1.0 },
            term_size,
            char_rows,
            prepared: Vec::new(),
            metrics: Metrics::new(),
            screenshot_count: 0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.handle_resize()?;
            self.render_frame();
            encoder::present(&self.framebuffer)?;
            self.draw_status()?;
            if self.handle_input()? {
                return Ok(());
            }
            self.metrics.tick();
        }
    }

    /// Re-query the terminal each frame; on a change, rebuild the
    /// framebuffer and projection and clear once so no stale cells survive.
    fn handle_resize(&mut self) -> io::Result<()> {
        let size = terminal::size()?;
        if size == self.term_size {
            return Ok(());
        }
        self.term_size = size;
        let (width, char_rows) = render_size(size.0, size.1);
        self.char_rows = char_rows;
        let height = char_rows as usize * 2;

        self.framebuffer.resize(width, height);
        self.projection = perspective(width, height);
        info!("resized to {}x{} pixels", width, height);

        let mut stdout = io::stdout();
        queue!(stdout, Clear(ClearType::All))?;
        stdout.flush()
    }

    /// Geometry + rasterization. The tiled rasterizer overwrites every
    /// pixel, so no clear is needed between frames.
    fn render_frame(&mut self) {
        let model = Mat4::from_scale(Vec3::splat(2.0 / self.mesh_extent))
            * Mat4::from_translation(-self.mesh_center);
        let view = self.camera.view_matrix();
        let model_view = view * model;
        let mvp = self.projection * model_view;

        prepare_triangles(
            &self.mesh,
            &mvp,
            &model_view,
            self.framebuffer.width,
            self.framebuffer.height,
            &mut self.prepared,
        );
        render_tiled(&mut self.framebuffer, &self.prepared, &self.texture);
    }

    /// Two status lines just below the rendered rows.
    fn draw_status(&self) -> io::Result<()> {
        let pos = self.camera.position;
        let mut stdout = io::stdout();
        queue!(
            stdout,
            MoveTo(0, self.char_rows + 1),
            Clear(ClearType::UntilNewLine),
            Print(format!(
                "FPS: {:.0}  Vertices: {}  Res: {}x{}  Pos: ({:.1}, {:.1}, {:.1})",
                self.metrics.current_fps,
                self.mesh.vertices.len(),
                self.framebuffer.width,
                self.framebuffer.height,
                pos.x,
                pos.y,
                pos.z
            )),
            MoveTo(0, self.char_rows + 2),
            Clear(ClearType::UntilNewLine),
            Print(HELP_LINE),
        )?;
        stdout.flush()
    }

    /// Drain pending key events without blocking. Returns true to exit.
    fn handle_input(&mut self) -> io::Result<bool> {
        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind == KeyEventKind::Release {
                continue;
            }
            if key.code == KeyCode::Esc
                || (key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL))
            {
                return Ok(true);
            }
            if let KeyCode::Char(c) = key.code {
                self.handle_key(c.to_ascii_lowercase())?;
            }
        }
        Ok(false)
    }

    fn handle_key(&mut self, key: char) -> io::Result<()> {
        match key {
            'w' => self.camera.move_forward(MOVE_SPEED),
            's' => self.camera.move_forward(-MOVE_SPEED),
            'a' => self.camera.move_right(-MOVE_SPEED),
            'd' => self.camera.move_right(MOVE_SPEED),
            'q' => self.camera.move_up(-MOVE_SPEED),
            'e' => self.camera.move_up(MOVE_SPEED),
            'i' => self.camera.rotate_pitch(ROTATE_SPEED),
            'k' => self.camera.rotate_pitch(-ROTATE_SPEED),
            'j' => self.camera.rotate_yaw(-ROTATE_SPEED),
            'l' => self.camera.rotate_yaw(ROTATE_SPEED),
            'r' => self.camera.reset(),
            'p' => self.save_screenshot()?,
            _ => {}
        }
        Ok(())
    }

    /// Dump the current framebuffer as `screenshot_NNN.png`. Failure is
    /// logged and the frame continues.
    fn save_screenshot(&mut self) -> io::Result<()> {
        let filename = format!("screenshot_{:03}.png", self.screenshot_count);
        self.screenshot_count += 1;
        match self.framebuffer.save_png(filename.as_ref()) {
            Ok(()) => {
                info!("saved {}", filename);
                let mut stdout = io::stdout();
                queue!(
                    stdout,
                    MoveTo(0, self.char_rows + 3),
                    Clear(ClearType::UntilNewLine),
                    Print(format!("Saved: {}", filename)),
                )?;
                stdout.flush()?;
            }
            Err(e) => warn!("screenshot failed: {}", e),
        }
        Ok(())
    }
}
