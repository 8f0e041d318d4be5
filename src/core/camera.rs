use glam::{Mat4, Vec3};

/// Pitch is clamped to roughly ±80 degrees so the look vector never
/// degenerates against the world up axis.
pub const MAX_PITCH: f32 = 1.4;

const HOME_POSITION: Vec3 = Vec3::new(0.0, 1.0, 3.0);

/// Free camera: a position plus yaw/pitch angles. Yaw 0 looks down -Z.
///
/// Movement is deliberately split from looking: forward/right ignore pitch
/// so flying feels like walking, while the view matrix uses the full
/// pitched look direction.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: HOME_POSITION,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl Camera {
    /// Forward direction in the XZ plane (pitch ignored).
    pub fn forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Right direction in the XZ plane.
    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Full look direction including pitch.
    pub fn look_direction(&self) -> Vec3 {
        Vec3::new(
            -self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            -self.yaw.cos() * self.pitch.cos(),
        )
    }

    pub fn move_forward(&mut self, amount: f32) {
        self.position += self.forward() * amount;
    }

    pub fn move_right(&mut self, amount: f32) {
        self.position += self.right() * amount;
    }

    pub fn move_up(&mut self, amount: f32) {
        self.position.y += amount;
    }

    pub fn rotate_yaw(&mut self, amount: f32) {
        self.yaw += amount;
    }

    pub fn rotate_pitch(&mut self, amount: f32) {
        self.pitch = (self.pitch + amount).clamp(-MAX_PITCH, MAX_PITCH);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn view_matrix(&self) -> Mat4 {
        let target = self.position + self.look_direction();
        Mat4::look_at_rh(self.position, target, Vec3::Y)
    }
}
