use std::ops::{Add, Mul};

/// 8-bit RGB color, the unit of both the framebuffer and texture storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    /// Shading fallback when no texture is bound.
    pub const NEUTRAL_GRAY: Color = Color::new(200, 200, 200);
    /// Background everything is cleared to.
    pub const BACKGROUND: Color = Color::new(20, 20, 30);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Mul<f32> for Color {
    type Output = Color;

    /// Channel-wise scale, saturating into [0, 255].
    fn mul(self, f: f32) -> Color {
        Color::new(
            (self.r as f32 * f).clamp(0.0, 255.0) as u8,
            (self.g as f32 * f).clamp(0.0, 255.0) as u8,
            (self.b as f32 * f).clamp(0.0, 255.0) as u8,
        )
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        Color::new(
            self.r.saturating_add(other.r),
            self.g.saturating_add(other.g),
            self.b.saturating_add(other.b),
        )
    }
}
