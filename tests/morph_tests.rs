//! Integration tests for formation generation and morph convergence.
//!
//! These drive the public engine API the way a frame loop would and check the
//! convergence, idempotence and toggle behavior of the live buffer.

use constellation::prelude::*;
use constellation::stepper::lerp_factor;
use rand::rngs::SmallRng;
use rand::SeedableRng;

const DT: f32 = 1.0 / 60.0;

fn engine(count: usize, seed: u64) -> MorphEngine {
    Constellation::new()
        .with_particle_count(count)
        .with_seed(seed)
        .build()
        .unwrap()
}

fn max_error(live: &[Vec3], target: &[Vec3]) -> f32 {
    live.iter()
        .zip(target)
        .map(|(a, b)| (*a - *b).abs().max_element())
        .fold(0.0, f32::max)
}

// ============================================================================
// Formation generation
// ============================================================================

#[test]
fn test_formations_have_count_finite_points() {
    let mut rng = SmallRng::seed_from_u64(123);
    for count in [1, 2, 17, 400, 5000] {
        let scatter = Formation::scatter(count, 60.0, &mut rng).unwrap();
        let heart = Formation::curve(count, &Heart, 0.4, 2.5, &mut rng).unwrap();
        assert_eq!(scatter.len(), count);
        assert_eq!(heart.len(), count);
        assert!(scatter.points().iter().all(|p| p.is_finite()));
        assert!(heart.points().iter().all(|p| p.is_finite()));
    }
}

#[test]
fn test_heart_scenario_bounds() {
    let mut rng = SmallRng::seed_from_u64(2023);
    let heart = Formation::curve(400, &Heart, 0.4, 2.5, &mut rng).unwrap();
    assert_eq!(heart.len(), 400);
    for p in heart.points() {
        assert!(!p.is_nan());
        assert!(p.y >= -0.4 * 18.0 && p.y <= 0.4 * 18.0, "y out of range: {}", p.y);
        assert!(p.x.abs() <= 0.4 * 16.0 + 1e-4);
    }
}

#[test]
fn test_zero_count_is_configuration_error() {
    let result = Constellation::new().with_particle_count(0).build();
    assert!(matches!(result, Err(MorphError::InvalidCount)));
}

// ============================================================================
// Convergence
// ============================================================================

#[test]
fn test_converges_to_curve_when_aligned() {
    let mut engine = engine(400, 1);
    engine.set_aligned(true);
    for _ in 0..500 {
        engine.step(DT).unwrap();
    }
    assert!(max_error(engine.live_positions(), engine.state().curve().points()) < 1e-3);
}

#[test]
fn test_converges_back_to_scatter() {
    let mut engine = engine(400, 2);
    engine.set_aligned(true);
    engine.step(1.0).unwrap();
    assert_eq!(engine.live_positions(), engine.state().curve().points());

    engine.set_aligned(false);
    for _ in 0..500 {
        engine.step(DT).unwrap();
    }
    assert!(max_error(engine.live_positions(), engine.state().scatter().points()) < 1e-3);
}

#[test]
fn test_error_is_non_increasing() {
    let mut engine = engine(200, 3);
    engine.set_aligned(true);
    let target = engine.state().curve().points().to_vec();

    let mut previous: Vec<Vec3> = engine
        .live_positions()
        .iter()
        .zip(&target)
        .map(|(a, b)| (*a - *b).abs())
        .collect();

    // Long enough to reach the float floor
    for step in 0..2000 {
        engine.step(DT).unwrap();
        for (i, (a, b)) in engine.live_positions().iter().zip(&target).enumerate() {
            let err = (*a - *b).abs();
            let prev = previous[i];
            assert!(
                err.x <= prev.x && err.y <= prev.y && err.z <= prev.z,
                "particle {} moved away on step {}: {:?} -> {:?}",
                i,
                step,
                prev,
                err
            );
            previous[i] = err;
        }
    }
    assert!(max_error(engine.live_positions(), &target) < 1e-4);
}

#[test]
fn test_zero_delta_changes_nothing() {
    let mut engine = engine(50, 4);
    engine.set_aligned(true);
    engine.step(0.1).unwrap();

    let live = engine.live_positions().to_vec();
    let angle = engine.rotation_angle();
    engine.step(0.0).unwrap();
    assert_eq!(engine.live_positions(), live.as_slice());
    assert_eq!(engine.rotation_angle(), angle);
}

#[test]
fn test_toggle_mid_convergence_retargets() {
    let mut engine = engine(100, 5);
    engine.set_aligned(true);
    for _ in 0..10 {
        engine.step(DT).unwrap();
    }

    engine.set_aligned(false);
    let scatter = engine.state().scatter().points().to_vec();
    let curve = engine.state().curve().points().to_vec();
    let before = engine.live_positions().to_vec();
    engine.step(DT).unwrap();

    for (i, p) in engine.live_positions().iter().enumerate() {
        // Moves along the segment toward the scatter target, away from the curve
        assert!(p.distance(scatter[i]) < before[i].distance(scatter[i]));
        assert!(p.distance(curve[i]) > before[i].distance(curve[i]));
    }
}

#[test]
fn test_single_full_step_lands_exactly() {
    let mut engine = engine(400, 6);
    let start = engine.live_positions().to_vec();
    assert_eq!(start.as_slice(), engine.state().scatter().points());

    engine.set_aligned(true);
    assert_eq!(lerp_factor(1.0, engine.params().align_speed), 1.0);
    engine.step(1.0).unwrap();

    for (i, p) in engine.live_positions().iter().enumerate() {
        assert_eq!(*p, engine.state().curve().points()[i]);
    }
}

#[test]
fn test_stall_spike_does_not_overshoot() {
    let mut engine = engine(100, 7);
    engine.set_aligned(true);
    engine.step(3600.0).unwrap();
    assert_eq!(engine.live_positions(), engine.state().curve().points());
}

// ============================================================================
// Stepper with externally owned buffers
// ============================================================================

#[test]
fn test_stepper_rejects_mismatched_buffer() {
    let engine = engine(10, 8);
    let mut stepper = Stepper::new(MorphParams::new()).unwrap();
    let mut live = vec![Vec3::ZERO; 11];
    let result = stepper.step(DT, engine.state(), &mut live);
    assert!(matches!(result, Err(MorphError::LengthMismatch { live: 11, .. })));
    assert!(live.iter().all(|p| *p == Vec3::ZERO));
}

#[test]
fn test_unvalidated_params_are_rejected() {
    let params = MorphParams {
        align_speed: f32::NAN,
        align_spin: f32::INFINITY,
        ..MorphParams::new()
    };
    assert!(Stepper::new(params).is_err());

    let engine = engine(10, 11);
    let state = engine.state().clone();
    assert!(MorphEngine::new(state, params).is_err());
}

#[test]
fn test_rotation_stays_wrapped() {
    let mut engine = Constellation::new()
        .with_particle_count(4)
        .with_seed(9)
        .with_params(MorphParams::new().with_spin(50.0, 50.0))
        .build()
        .unwrap();
    for _ in 0..10_000 {
        engine.step(DT).unwrap();
        let angle = engine.rotation_angle();
        assert!((0.0..std::f32::consts::TAU).contains(&angle));
    }
}

#[test]
fn test_frame_hands_latest_buffer_to_renderer() {
    let mut engine = engine(16, 10);
    let mut frames = Vec::new();
    for i in 0..3 {
        if i == 1 {
            engine.toggle_alignment();
        }
        let mut renderer = |positions: &[Vec3], rotation: f32, aligned: bool| {
            frames.push((positions.to_vec(), rotation, aligned));
        };
        engine.frame(DT, &mut renderer).unwrap();
        assert_eq!(frames.last().unwrap().0.as_slice(), engine.live_positions());
    }
    let flags: Vec<bool> = frames.iter().map(|f| f.2).collect();
    assert_eq!(flags, vec![false, true, true]);

    engine.frame(DT, &mut NullRenderer).unwrap();
}
