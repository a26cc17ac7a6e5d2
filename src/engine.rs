//! Engine builder and per-frame driver.

use crate::control::{Celebration, ControlSurface};
use crate::error::{MorphError, ViewerError};
use crate::formation::{check_non_negative, check_positive, Curve, Formation, Heart};
use crate::morph::MorphState;
use crate::render::RenderAdapter;
use crate::stepper::{MorphParams, Stepper};
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Static starfield drawn behind the morphing particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backdrop {
    /// Number of stars.
    pub count: usize,
    /// Inner radius of the star shell.
    pub radius: f32,
    /// Thickness of the star shell.
    pub depth: f32,
}

impl Default for Backdrop {
    fn default() -> Self {
        Self {
            count: 5000,
            radius: 100.0,
            depth: 50.0,
        }
    }
}

/// A particle morph engine builder.
///
/// Use method chaining to configure, then call `.build()` for a headless
/// engine or `.run()` to open a window.
///
/// ```ignore
/// Constellation::new()
///     .with_particle_count(400)
///     .with_curve_scale(0.4)
///     .with_label("Written in the stars")
///     .run()?;
/// ```
pub struct Constellation {
    particle_count: usize,
    scatter_size: f32,
    curve: Box<dyn Curve + Send>,
    curve_scale: f32,
    depth_jitter: f32,
    seed: Option<u64>,
    params: MorphParams,
    pub(crate) backdrop: Option<Backdrop>,
    pub(crate) label: String,
    pub(crate) control: ControlSurface,
}

impl Constellation {
    /// Create a builder with default settings: 400 particles scattered in a
    /// cube of edge 60, aligning into a heart scaled by 0.4.
    pub fn new() -> Self {
        Self {
            particle_count: 400,
            scatter_size: 60.0,
            curve: Box::new(Heart),
            curve_scale: 0.4,
            depth_jitter: 2.5,
            seed: None,
            params: MorphParams::new(),
            backdrop: Some(Backdrop::default()),
            label: "Written in the stars".to_string(),
            control: ControlSurface::new(),
        }
    }

    /// Set the number of particles. Fixed for the life of the engine.
    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    /// Set the edge length of the scatter cube.
    pub fn with_scatter_size(mut self, size: f32) -> Self {
        self.scatter_size = size;
        self
    }

    /// Set the curve the particles align into.
    pub fn with_curve<C>(mut self, curve: C) -> Self
    where
        C: Curve + Send + 'static,
    {
        self.curve = Box::new(curve);
        self
    }

    /// Set the uniform XY scale applied to the curve.
    pub fn with_curve_scale(mut self, scale: f32) -> Self {
        self.curve_scale = scale;
        self
    }

    /// Set the half-width of the random depth offset on the curve formation.
    pub fn with_depth_jitter(mut self, jitter: f32) -> Self {
        self.depth_jitter = jitter;
        self
    }

    /// Seed the random source so formations are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the easing and spin rates.
    pub fn with_params(mut self, params: MorphParams) -> Self {
        self.params = params;
        self
    }

    /// Set or disable the backdrop starfield. `None` and a backdrop with a
    /// zero `count` both turn it off.
    pub fn with_backdrop(mut self, backdrop: Option<Backdrop>) -> Self {
        self.backdrop = backdrop;
        self
    }

    /// Set the overlay label shown while aligned.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Register a callback fired whenever the particles are toggled into
    /// alignment.
    pub fn with_celebration<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Celebration) + Send + 'static,
    {
        self.control = std::mem::take(&mut self.control).with_celebration(callback);
        self
    }

    /// Generate the formations and the live buffer.
    pub fn build(&self) -> Result<MorphEngine, MorphError> {
        check_positive("scatter_size", self.scatter_size)?;
        check_positive("curve_scale", self.curve_scale)?;
        check_non_negative("depth_jitter", self.depth_jitter)?;
        self.params.validate()?;

        let mut rng = self.rng(0);
        let scatter = Formation::scatter(self.particle_count, self.scatter_size, &mut rng)?;
        let curve = Formation::curve(
            self.particle_count,
            self.curve.as_ref(),
            self.curve_scale,
            self.depth_jitter,
            &mut rng,
        )?;

        let state = MorphState::new(scatter, curve)?;
        log::info!(
            "Built morph engine: {} particles, scatter size {}, curve scale {}",
            self.particle_count,
            self.scatter_size,
            self.curve_scale
        );
        MorphEngine::new(state, self.params)
    }

    /// Generate the backdrop starfield, if one is configured with any stars.
    pub(crate) fn build_backdrop(&self) -> Result<Option<Formation>, MorphError> {
        match self.backdrop {
            Some(b) if b.count > 0 => {
                Formation::shell(b.count, b.radius, b.depth, &mut self.rng(1)).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Open a window and run the engine. Blocks until the window is closed.
    pub fn run(self) -> Result<(), ViewerError> {
        crate::viewer::run(self)
    }

    fn rng(&self, stream: u64) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(stream)),
            None => SmallRng::from_entropy(),
        }
    }
}

impl Default for Constellation {
    fn default() -> Self {
        Self::new()
    }
}

/// The running particle set: live buffer, targets and rotation.
///
/// Owns the live buffer exclusively. Each [`frame`](Self::frame) steps the
/// buffer in place and then hands it, read-only, to the renderer.
#[derive(Debug, Clone)]
pub struct MorphEngine {
    state: MorphState,
    stepper: Stepper,
    live: Vec<Vec3>,
}

impl MorphEngine {
    /// Create an engine whose live buffer starts on the scatter formation.
    /// Fails if `params` does not validate.
    pub fn new(state: MorphState, params: MorphParams) -> Result<Self, MorphError> {
        let stepper = Stepper::new(params)?;
        let live = state.scatter().points().to_vec();
        Ok(Self {
            state,
            stepper,
            live,
        })
    }

    /// Advance the live buffer by `delta` seconds. Returns the rotation angle.
    pub fn step(&mut self, delta: f32) -> Result<f32, MorphError> {
        self.stepper.step(delta, &self.state, &mut self.live)
    }

    /// Step once, then draw once.
    pub fn frame<R>(&mut self, delta: f32, renderer: &mut R) -> Result<(), MorphError>
    where
        R: RenderAdapter + ?Sized,
    {
        let rotation = self.step(delta)?;
        renderer.render(&self.live, rotation, self.state.is_aligned());
        Ok(())
    }

    /// Flip between the scatter and curve formations. Returns the new flag.
    pub fn toggle_alignment(&mut self) -> bool {
        let aligned = !self.state.is_aligned();
        self.set_aligned(aligned);
        aligned
    }

    /// Select the target formation. Takes effect on the next step.
    pub fn set_aligned(&mut self, aligned: bool) {
        if aligned != self.state.is_aligned() {
            log::info!("{}", if aligned { "Aligning stars" } else { "Scattering stars" });
        }
        self.state.set_aligned(aligned);
    }

    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.state.is_aligned()
    }

    /// Current particle positions.
    #[inline]
    pub fn live_positions(&self) -> &[Vec3] {
        &self.live
    }

    /// Current rotation about the Y axis, in `[0, 2π)`.
    #[inline]
    pub fn rotation_angle(&self) -> f32 {
        self.stepper.rotation()
    }

    /// Both target formations and the alignment flag.
    #[inline]
    pub fn state(&self) -> &MorphState {
        &self.state
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.live.len()
    }

    #[inline]
    pub fn params(&self) -> &MorphParams {
        self.stepper.params()
    }
}
