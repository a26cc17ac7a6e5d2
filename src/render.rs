//! The boundary between the engine and whatever draws it.

use glam::Vec3;

/// Anything that can draw one frame of the particle set.
///
/// Called exactly once per frame, after the live buffer has been stepped.
/// Drawing failures stay inside the adapter; the engine keeps stepping so its
/// state is consistent whenever drawing resumes.
pub trait RenderAdapter {
    /// Draw `positions` rotated by `rotation` radians about the Y axis.
    /// `aligned` selects the aligned presentation (overlay label, spin).
    fn render(&mut self, positions: &[Vec3], rotation: f32, aligned: bool);
}

impl<F> RenderAdapter for F
where
    F: FnMut(&[Vec3], f32, bool),
{
    fn render(&mut self, positions: &[Vec3], rotation: f32, aligned: bool) {
        self(positions, rotation, aligned)
    }
}

/// Adapter that draws nothing. Useful for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl RenderAdapter for NullRenderer {
    fn render(&mut self, _positions: &[Vec3], _rotation: f32, _aligned: bool) {}
}
