//! Morph state: the two target formations and the alignment flag.

use crate::error::MorphError;
use crate::formation::Formation;
use glam::Vec3;

/// Holds both target formations and which one is currently active.
///
/// The formations are fixed at construction. The alignment flag is the only
/// mutable state and is the single source of truth for the active target.
#[derive(Debug, Clone)]
pub struct MorphState {
    scatter: Formation,
    curve: Formation,
    aligned: bool,
}

impl MorphState {
    /// Create a scattered morph state from two formations of equal length.
    pub fn new(scatter: Formation, curve: Formation) -> Result<Self, MorphError> {
        if scatter.len() != curve.len() {
            return Err(MorphError::LengthMismatch {
                live: scatter.len(),
                scatter: scatter.len(),
                curve: curve.len(),
            });
        }
        Ok(Self {
            scatter,
            curve,
            aligned: false,
        })
    }

    /// Set the alignment flag. Nothing else changes.
    #[inline]
    pub fn set_aligned(&mut self, aligned: bool) {
        self.aligned = aligned;
    }

    /// Whether the curve formation is the active target.
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.aligned
    }

    /// The formation particles are currently moving toward.
    ///
    /// Borrows the stored formation; never allocates.
    #[inline]
    pub fn active_target(&self) -> &[Vec3] {
        if self.aligned {
            self.curve.points()
        } else {
            self.scatter.points()
        }
    }

    /// The random-scatter formation.
    #[inline]
    pub fn scatter(&self) -> &Formation {
        &self.scatter
    }

    /// The curve-shaped formation.
    #[inline]
    pub fn curve(&self) -> &Formation {
        &self.curve
    }

    /// Number of particles in each formation.
    #[inline]
    pub fn count(&self) -> usize {
        self.scatter.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::Heart;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn state(count: usize) -> MorphState {
        let mut rng = SmallRng::seed_from_u64(42);
        let scatter = Formation::scatter(count, 60.0, &mut rng).unwrap();
        let curve = Formation::curve(count, &Heart, 0.4, 2.5, &mut rng).unwrap();
        MorphState::new(scatter, curve).unwrap()
    }

    #[test]
    fn test_starts_scattered() {
        let s = state(10);
        assert!(!s.is_aligned());
        assert_eq!(s.active_target(), s.scatter().points());
    }

    #[test]
    fn test_active_target_follows_flag() {
        let mut s = state(10);
        s.set_aligned(true);
        assert!(std::ptr::eq(s.active_target(), s.curve().points()));
        s.set_aligned(false);
        assert!(std::ptr::eq(s.active_target(), s.scatter().points()));
    }

    #[test]
    fn test_rejects_mismatched_formations() {
        let mut rng = SmallRng::seed_from_u64(1);
        let scatter = Formation::scatter(10, 1.0, &mut rng).unwrap();
        let curve = Formation::curve(9, &Heart, 1.0, 0.0, &mut rng).unwrap();
        assert!(matches!(
            MorphState::new(scatter, curve),
            Err(MorphError::LengthMismatch { scatter: 10, curve: 9, .. })
        ));
    }
}
