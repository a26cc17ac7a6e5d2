//! Camera for 3D orbit view.

use glam::{Mat4, Vec3};

const MIN_DISTANCE: f32 = 5.0;
const MAX_DISTANCE: f32 = 80.0;
const PITCH_LIMIT: f32 = 1.5;

/// Orbit camera looking at the formation.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl Camera {
    /// Camera on the +Z axis, 20 units out, with a 60° field of view.
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: 20.0,
            target: Vec3::ZERO,
            fov_y: 60.0_f32.to_radians(),
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Perspective projection for the given aspect ratio.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, 0.1, 500.0)
    }

    /// Orbit by a mouse drag of `dx`, `dy` pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * 0.005;
        self.pitch = (self.pitch + dy * 0.005).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Move toward (positive) or away from (negative) the target.
    pub fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance - amount).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Slow idle drift around the target, `speed` in radians per second.
    pub fn auto_rotate(&mut self, delta: f32, speed: f32) {
        self.yaw = (self.yaw + delta * speed).rem_euclid(std::f32::consts::TAU);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
