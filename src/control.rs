//! The user-facing toggle and its optional celebration burst.

use crate::engine::MorphEngine;
use glam::Vec2;

/// Parameters for a one-shot celebratory burst.
///
/// Opaque to the engine; handed to the registered callback and forgotten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Celebration {
    /// Number of burst particles.
    pub particle_count: u32,
    /// Spread of the burst cone in degrees.
    pub spread: f32,
    /// Burst origin in normalized screen coordinates (0..1, top-left origin).
    pub origin: Vec2,
}

impl Default for Celebration {
    fn default() -> Self {
        Self {
            particle_count: 150,
            spread: 70.0,
            origin: Vec2::new(0.5, 0.6),
        }
    }
}

type CelebrationFn = Box<dyn FnMut(&Celebration) + Send>;

/// A single toggle action that flips the engine between formations.
///
/// When a toggle brings the particles into the aligned formation the
/// celebration callback, if any, fires once.
#[derive(Default)]
pub struct ControlSurface {
    celebration: Celebration,
    on_celebrate: Option<CelebrationFn>,
}

impl ControlSurface {
    /// A toggle with no celebration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback fired when the particles align.
    pub fn with_celebration<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Celebration) + Send + 'static,
    {
        self.on_celebrate = Some(Box::new(callback));
        self
    }

    /// Override the burst parameters passed to the callback.
    pub fn with_burst(mut self, celebration: Celebration) -> Self {
        self.celebration = celebration;
        self
    }

    /// Flip the alignment flag. Returns the new value.
    pub fn toggle(&mut self, engine: &mut MorphEngine) -> bool {
        let aligned = engine.toggle_alignment();
        if aligned {
            if let Some(celebrate) = self.on_celebrate.as_mut() {
                celebrate(&self.celebration);
            }
        }
        aligned
    }
}

impl std::fmt::Debug for ControlSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlSurface")
            .field("celebration", &self.celebration)
            .field("has_callback", &self.on_celebrate.is_some())
            .finish()
    }
}
