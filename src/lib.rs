use clap::{Arg, Command};
use std::time::Instant;

pub mod core;
pub mod pipeline;
pub mod renderers;

pub const DEFAULT_MESH: &str = "assets/models/suzanne.obj";
pub const DEFAULT_TEXTURE: &str = "assets/models/suzanne_diffuse.png";

/// Frame counter with a once-a-second FPS readout for the status line.
pub struct Metrics {
    fps_timer: Instant,
    frame_count: u32,
    pub current_fps: f32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            fps_timer: Instant::now(),
            frame_count: 0,
            current_fps: 0.0,
        }
    }

    pub fn tick(&mut self) {
        self.frame_count += 1;
        let elapsed = self.fps_timer.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            self.current_fps = self.frame_count as f32 / elapsed;
            self.frame_count = 0;
            self.fps_timer = Instant::now();
        }
    }
}

pub fn cli_command() -> Command {
    Command::new("termrast")
        .about("Textured-mesh 3D renderer for the terminal")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("mesh")
                .value_name("MESH")
                .index(1)
                .help("Path to the .obj mesh to render")
                .required(false),
        )
        .arg(
            Arg::new("texture")
                .value_name("TEXTURE")
                .index(2)
                .help("Path to the diffuse texture; gray shading if missing")
                .required(false),
        )
}
