use crate::core::Color;
use log::info;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to load texture: {0}")]
pub struct TextureError(#[from] image::ImageError);

/// Diffuse texture: tightly packed RGB8, read-only after load.
#[derive(Debug, Clone, Default)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl Texture {
    pub fn from_file(path: &Path) -> Result<Self, TextureError> {
        let img = image::open(path)?.to_rgb8();
        let (width, height) = img.dimensions();
        info!("loaded texture {:?}: {}x{}", path, width, height);
        Ok(Texture {
            width,
            height,
            data: img.into_raw(),
        })
    }

    pub fn from_rgb8(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height * 3) as usize);
        Texture {
            width,
            height,
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Point sample with wrap addressing. V is flipped so v=0 is the bottom
    /// of the image, matching the image-origin-top-left convention.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        if self.is_empty() {
            return Color::NEUTRAL_GRAY;
        }

        let u = u - u.floor();
        let v = v - v.floor();

        let x = (u * (self.width - 1) as f32) as i64;
        let y = ((1.0 - v) * (self.height - 1) as f32) as i64;
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;

        let idx = (y * self.width as usize + x) * 3;
        Color::new(self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }
}
