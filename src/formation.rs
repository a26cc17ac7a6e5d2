//! Target formations for the particle set.
//!
//! A [`Formation`] is a fixed arrangement of `count` points that the live
//! buffer interpolates toward. Formations are generated once, from an injected
//! random source, and are never mutated afterwards.
//!
//! ```ignore
//! use rand::{rngs::SmallRng, SeedableRng};
//!
//! let mut rng = SmallRng::seed_from_u64(7);
//! let scatter = Formation::scatter(400, 60.0, &mut rng)?;
//! let heart = Formation::curve(400, &Heart, 0.4, 2.5, &mut rng)?;
//! ```

use crate::error::MorphError;
use glam::{Vec2, Vec3};
use rand::Rng;
use std::f32::consts::TAU;

/// Parameter samples tried per particle before a curve is declared broken.
pub const MAX_CURVE_ATTEMPTS: u32 = 64;

/// A closed 2D parametric curve over `t` in `[0, 2π)`.
///
/// Any `Fn(f32) -> Vec2` closure is a curve:
///
/// ```ignore
/// let circle = |t: f32| Vec2::new(t.cos(), t.sin());
/// let ring = Formation::curve(100, &circle, 10.0, 0.0, &mut rng)?;
/// ```
pub trait Curve {
    /// Evaluate the curve at parameter `t`.
    fn point(&self, t: f32) -> Vec2;
}

impl<F> Curve for F
where
    F: Fn(f32) -> Vec2,
{
    fn point(&self, t: f32) -> Vec2 {
        self(t)
    }
}

/// The classic heart curve.
///
/// `x = 16 sin³t`, `y = 13 cos t − 5 cos 2t − 2 cos 3t − cos 4t`.
/// Spans roughly `[-16, 16]` horizontally and `[-17, 6]` vertically.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Heart;

impl Curve for Heart {
    fn point(&self, t: f32) -> Vec2 {
        let s = t.sin();
        Vec2::new(
            16.0 * s * s * s,
            13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos(),
        )
    }
}

/// A fixed, index-aligned set of particle target positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Formation {
    points: Vec<Vec3>,
}

impl Formation {
    /// Uniform random scatter inside an axis-aligned cube of edge `bound_size`
    /// centered on the origin.
    pub fn scatter<R: Rng + ?Sized>(
        count: usize,
        bound_size: f32,
        rng: &mut R,
    ) -> Result<Self, MorphError> {
        check_count(count)?;
        check_positive("bound_size", bound_size)?;

        // Offset from a unit sample so the span never overflows for huge sizes
        let mut axis = || (rng.gen::<f32>() - 0.5) * bound_size;
        let points = (0..count)
            .map(|_| Vec3::new(axis(), axis(), axis()))
            .collect();

        Ok(Self { points })
    }

    /// Points sampled along `curve` at independent uniform `t`, scaled in the
    /// XY plane and jittered in depth by up to `depth_jitter` either way.
    ///
    /// Samples where the curve yields a non-finite point are redrawn with a
    /// fresh `t`, so the result is always fully finite.
    pub fn curve<C, R>(
        count: usize,
        curve: &C,
        scale: f32,
        depth_jitter: f32,
        rng: &mut R,
    ) -> Result<Self, MorphError>
    where
        C: Curve + ?Sized,
        R: Rng + ?Sized,
    {
        check_count(count)?;
        check_positive("scale", scale)?;
        check_non_negative("depth_jitter", depth_jitter)?;

        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            let xy = sample_finite(curve, scale, rng)?;
            let z = if depth_jitter > 0.0 {
                (rng.gen::<f32>() * 2.0 - 1.0) * depth_jitter
            } else {
                0.0
            };
            points.push(xy.extend(z));
        }

        Ok(Self { points })
    }

    /// Uniformly distributed directions at a distance in
    /// `[radius, radius + depth]` from the origin. Used for the backdrop.
    pub fn shell<R: Rng + ?Sized>(
        count: usize,
        radius: f32,
        depth: f32,
        rng: &mut R,
    ) -> Result<Self, MorphError> {
        check_count(count)?;
        check_positive("radius", radius)?;
        check_non_negative("depth", depth)?;
        check_positive("depth", radius + depth)?;

        let points = (0..count)
            .map(|_| {
                let theta = rng.gen_range(0.0..TAU);
                let cos_phi: f32 = rng.gen_range(-1.0..=1.0);
                let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
                let r = radius + depth * rng.gen::<f32>();
                Vec3::new(r * sin_phi * theta.cos(), r * cos_phi, r * sin_phi * theta.sin())
            })
            .collect();

        Ok(Self { points })
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed formation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The points as a slice.
    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }
}

impl AsRef<[Vec3]> for Formation {
    fn as_ref(&self) -> &[Vec3] {
        &self.points
    }
}

fn sample_finite<C, R>(curve: &C, scale: f32, rng: &mut R) -> Result<Vec2, MorphError>
where
    C: Curve + ?Sized,
    R: Rng + ?Sized,
{
    for _ in 0..MAX_CURVE_ATTEMPTS {
        let t = rng.gen_range(0.0..TAU);
        let p = curve.point(t) * scale;
        if p.is_finite() {
            return Ok(p);
        }
    }
    Err(MorphError::CurveDiverged {
        attempts: MAX_CURVE_ATTEMPTS,
    })
}

fn check_count(count: usize) -> Result<(), MorphError> {
    if count == 0 {
        return Err(MorphError::InvalidCount);
    }
    Ok(())
}

pub(crate) fn check_positive(name: &'static str, value: f32) -> Result<(), MorphError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(MorphError::InvalidParameter { name, value });
    }
    Ok(())
}

pub(crate) fn check_non_negative(name: &'static str, value: f32) -> Result<(), MorphError> {
    if !value.is_finite() || value < 0.0 {
        return Err(MorphError::InvalidParameter { name, value });
    }
    Ok(())
}
