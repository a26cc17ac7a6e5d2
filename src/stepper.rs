//! Per-frame interpolation of the live buffer toward the active formation.
//!
//! Every frame each particle moves a fraction of the way to its target:
//!
//! ```text
//! live[i] += (target[i] - live[i]) * clamp01(delta * speed)
//! ```
//!
//! This gives exponential-decay easing that converges monotonically and never
//! overshoots, even when a long stall produces a huge `delta`.

use crate::error::MorphError;
use crate::formation::{check_non_negative, check_positive};
use crate::morph::MorphState;
use glam::Vec3;
use std::f32::consts::TAU;

/// Tunable easing and spin rates.
///
/// Aligning is faster than scattering so the shape snaps in while the return
/// to chaos drifts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphParams {
    /// Lerp rate (1/s) while converging onto the curve formation.
    pub align_speed: f32,
    /// Lerp rate (1/s) while returning to the scatter formation.
    pub scatter_speed: f32,
    /// Rotation rate (rad/s) while aligned.
    pub align_spin: f32,
    /// Rotation rate (rad/s) while scattered.
    pub scatter_spin: f32,
}

impl MorphParams {
    /// Default rates.
    pub fn new() -> Self {
        Self {
            align_speed: 2.5,
            scatter_speed: 1.5,
            align_spin: 0.2,
            scatter_spin: 0.05,
        }
    }

    /// Set the convergence rate toward the curve formation.
    pub fn with_align_speed(mut self, speed: f32) -> Self {
        self.align_speed = speed;
        self
    }

    /// Set the convergence rate toward the scatter formation.
    pub fn with_scatter_speed(mut self, speed: f32) -> Self {
        self.scatter_speed = speed;
        self
    }

    /// Set the rotation rates for the aligned and scattered modes.
    pub fn with_spin(mut self, aligned: f32, scattered: f32) -> Self {
        self.align_spin = aligned;
        self.scatter_spin = scattered;
        self
    }

    /// Lerp rate for the given mode.
    #[inline]
    pub fn speed(&self, aligned: bool) -> f32 {
        if aligned {
            self.align_speed
        } else {
            self.scatter_speed
        }
    }

    /// Rotation rate for the given mode.
    #[inline]
    pub fn spin(&self, aligned: bool) -> f32 {
        if aligned {
            self.align_spin
        } else {
            self.scatter_spin
        }
    }

    /// Check that both speeds are positive and both spins non-negative.
    /// NaN and infinite rates are rejected.
    pub fn validate(&self) -> Result<(), MorphError> {
        check_positive("align_speed", self.align_speed)?;
        check_positive("scatter_speed", self.scatter_speed)?;
        check_non_negative("align_spin", self.align_spin)?;
        check_non_negative("scatter_spin", self.scatter_spin)?;
        Ok(())
    }
}

impl Default for MorphParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Interpolation factor for one frame, clamped to `[0, 1]`.
#[inline]
pub fn lerp_factor(delta: f32, speed: f32) -> f32 {
    (delta * speed).clamp(0.0, 1.0)
}

/// Advances the live buffer and the rotation angle.
#[derive(Debug, Clone)]
pub struct Stepper {
    params: MorphParams,
    rotation: f32,
}

impl Stepper {
    /// Create a stepper at rotation zero. Fails if `params` does not validate.
    pub fn new(params: MorphParams) -> Result<Self, MorphError> {
        params.validate()?;
        Ok(Self {
            params,
            rotation: 0.0,
        })
    }

    /// Move every particle in `live` toward the target selected by `state`
    /// and advance the rotation angle. Returns the new angle in `[0, 2π)`.
    ///
    /// The alignment flag is read once, so a toggle never takes effect
    /// halfway through the buffer. A `delta` of zero leaves everything
    /// untouched; negative or non-finite deltas are treated as zero.
    pub fn step(
        &mut self,
        delta: f32,
        state: &MorphState,
        live: &mut [Vec3],
    ) -> Result<f32, MorphError> {
        if live.len() != state.scatter().len() || live.len() != state.curve().len() {
            return Err(MorphError::LengthMismatch {
                live: live.len(),
                scatter: state.scatter().len(),
                curve: state.curve().len(),
            });
        }

        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        if delta == 0.0 {
            return Ok(self.rotation);
        }

        let aligned = state.is_aligned();
        let target = state.active_target();
        let f = lerp_factor(delta, self.params.speed(aligned));

        if f >= 1.0 {
            // Full step lands exactly on the target
            live.copy_from_slice(target);
        } else {
            // a + (b - a) * f keeps every axis moving monotonically toward
            // the target down to the last ulp
            for (p, t) in live.iter_mut().zip(target) {
                *p += (*t - *p) * f;
            }
        }

        self.rotation = (self.rotation + delta * self.params.spin(aligned)).rem_euclid(TAU);
        Ok(self.rotation)
    }

    /// Current rotation angle in radians.
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// The easing and spin rates in use.
    #[inline]
    pub fn params(&self) -> &MorphParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::{Formation, Heart};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn setup(count: usize) -> (MorphState, Vec<Vec3>) {
        let mut rng = SmallRng::seed_from_u64(7);
        let scatter = Formation::scatter(count, 60.0, &mut rng).unwrap();
        let curve = Formation::curve(count, &Heart, 0.4, 2.5, &mut rng).unwrap();
        let live = scatter.points().to_vec();
        (MorphState::new(scatter, curve).unwrap(), live)
    }

    #[test]
    fn test_lerp_factor_clamps() {
        assert_eq!(lerp_factor(0.0, 2.5), 0.0);
        assert_eq!(lerp_factor(10.0, 2.5), 1.0);
        assert_eq!(lerp_factor(-1.0, 2.5), 0.0);
        assert!((lerp_factor(0.1, 2.5) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_zero_delta_is_noop() {
        let (mut state, mut live) = setup(20);
        state.set_aligned(true);
        let mut stepper = Stepper::new(MorphParams::new()).unwrap();
        stepper.step(0.5, &state, &mut live).unwrap();

        let before = live.clone();
        let angle = stepper.rotation();
        assert_eq!(stepper.step(0.0, &state, &mut live).unwrap(), angle);
        assert_eq!(live, before);
    }

    #[test]
    fn test_large_delta_lands_on_target() {
        let (mut state, mut live) = setup(50);
        state.set_aligned(true);
        let mut stepper = Stepper::new(MorphParams::new()).unwrap();
        stepper.step(1.0, &state, &mut live).unwrap();
        assert_eq!(live.as_slice(), state.curve().points());
    }

    #[test]
    fn test_length_mismatch_fails_fast() {
        let (state, mut live) = setup(10);
        live.pop();
        let before = live.clone();
        let mut stepper = Stepper::new(MorphParams::new()).unwrap();
        assert!(matches!(
            stepper.step(0.016, &state, &mut live),
            Err(MorphError::LengthMismatch { live: 9, scatter: 10, curve: 10 })
        ));
        assert_eq!(live, before);
    }

    #[test]
    fn test_rotation_uses_mode_spin_and_wraps() {
        let (mut state, mut live) = setup(4);
        let params = MorphParams::new().with_spin(2.0, 1.0);
        let mut stepper = Stepper::new(params).unwrap();

        stepper.step(0.5, &state, &mut live).unwrap();
        assert!((stepper.rotation() - 0.5).abs() < 1e-6);

        state.set_aligned(true);
        stepper.step(0.5, &state, &mut live).unwrap();
        assert!((stepper.rotation() - 1.5).abs() < 1e-6);

        for _ in 0..100 {
            stepper.step(0.5, &state, &mut live).unwrap();
        }
        assert!(stepper.rotation() >= 0.0 && stepper.rotation() < TAU);
    }

    #[test]
    fn test_params_validation() {
        assert!(MorphParams::new().validate().is_ok());
        assert!(MorphParams::new().with_align_speed(0.0).validate().is_err());
        assert!(MorphParams::new().with_spin(-1.0, 0.0).validate().is_err());
        assert!(MorphParams::new().with_spin(0.0, 0.0).validate().is_ok());
        assert!(MorphParams::new().with_align_speed(f32::NAN).validate().is_err());
        assert!(MorphParams::new().with_spin(f32::INFINITY, 0.0).validate().is_err());
    }

    #[test]
    fn test_stepper_rejects_non_finite_params() {
        let nan_speed = MorphParams {
            align_speed: f32::NAN,
            ..MorphParams::new()
        };
        assert!(matches!(
            Stepper::new(nan_speed),
            Err(MorphError::InvalidParameter { name: "align_speed", .. })
        ));

        let infinite_spin = MorphParams {
            align_spin: f32::INFINITY,
            ..MorphParams::new()
        };
        assert!(matches!(
            Stepper::new(infinite_spin),
            Err(MorphError::InvalidParameter { name: "align_spin", .. })
        ));
    }

    #[test]
    fn test_per_axis_error_never_grows() {
        for seed in 0..20u64 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let scatter = Formation::scatter(400, 60.0, &mut rng).unwrap();
            let curve = Formation::curve(400, &Heart, 0.4, 2.5, &mut rng).unwrap();
            let mut live = scatter.points().to_vec();
            let mut state = MorphState::new(scatter, curve).unwrap();
            state.set_aligned(true);
            let target = state.curve().points().to_vec();

            let mut stepper = Stepper::new(MorphParams::new()).unwrap();
            let mut previous: Vec<Vec3> =
                live.iter().zip(&target).map(|(p, t)| (*p - *t).abs()).collect();

            for step in 0..2000 {
                stepper.step(1.0 / 60.0, &state, &mut live).unwrap();
                for (i, (p, t)) in live.iter().zip(&target).enumerate() {
                    let err = (*p - *t).abs();
                    let prev = previous[i];
                    assert!(
                        err.x <= prev.x && err.y <= prev.y && err.z <= prev.z,
                        "seed {} step {} particle {}: {:?} -> {:?}",
                        seed,
                        step,
                        i,
                        prev,
                        err
                    );
                    previous[i] = err;
                }
            }
        }
    }
}
