//! # Constellation - particle formation morph engine
//!
//! A fixed population of point particles that drift in a random scatter and,
//! on command, converge into a shape traced by a parametric curve, while the
//! whole set slowly rotates.
//!
//! ## Quick Start
//!
//! ```ignore
//! use constellation::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     Constellation::new()
//!         .with_particle_count(400)
//!         .with_curve(Heart)
//!         .with_curve_scale(0.4)
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Formations
//!
//! A [`Formation`] is a fixed target arrangement generated once from an
//! injected random source: a uniform [`Formation::scatter`] over a cube, or a
//! [`Formation::curve`] sampled along any [`Curve`].
//!
//! ### Morphing
//!
//! [`MorphState`] holds both formations and the alignment flag. Each frame the
//! [`Stepper`] moves every live particle a clamped fraction of the way to the
//! active target:
//!
//! ```text
//! live[i] += (target[i] - live[i]) * clamp01(delta * speed)
//! ```
//!
//! ### Headless driving
//!
//! ```ignore
//! let mut engine = Constellation::new().with_seed(7).build()?;
//! engine.toggle_alignment();
//! engine.frame(1.0 / 60.0, &mut |positions: &[Vec3], rotation: f32, aligned: bool| {
//!     // draw
//! })?;
//! ```

pub mod control;
pub mod engine;
pub mod error;
pub mod formation;
mod gpu;
pub mod morph;
pub mod render;
pub mod stepper;
pub mod time;
mod viewer;

pub use control::{Celebration, ControlSurface};
pub use engine::{Backdrop, Constellation, MorphEngine};
pub use error::{GpuError, MorphError, ViewerError};
pub use formation::{Curve, Formation, Heart};
pub use glam::{Vec2, Vec3};
pub use morph::MorphState;
pub use render::{NullRenderer, RenderAdapter};
pub use stepper::{MorphParams, Stepper};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use constellation::prelude::*;
/// ```
pub mod prelude {
    pub use crate::control::{Celebration, ControlSurface};
    pub use crate::engine::{Backdrop, Constellation, MorphEngine};
    pub use crate::error::{MorphError, ViewerError};
    pub use crate::formation::{Curve, Formation, Heart};
    pub use crate::morph::MorphState;
    pub use crate::render::{NullRenderer, RenderAdapter};
    pub use crate::stepper::{MorphParams, Stepper};
    pub use crate::time::FrameClock;
    pub use crate::{Vec2, Vec3};
}
