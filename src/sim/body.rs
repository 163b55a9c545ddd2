//! Kinematic body and integration step

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Position/velocity/acceleration state owned by exactly one entity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KinematicBody {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
}

impl KinematicBody {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_acceleration(mut self, acceleration: Vec2) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Advance by `dt`: acceleration into velocity, then velocity into position.
    ///
    /// Non-positive (or NaN) deltas leave the body untouched.
    #[inline]
    pub fn integrate(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        self.velocity += self.acceleration * dt;
        self.position += self.velocity * dt;
    }

    /// Exponential drag toward rest: `velocity = lerp(velocity, 0, dt * rate)`
    #[inline]
    pub fn apply_damping(&mut self, dt: f32, rate: f32) {
        if !(dt > 0.0) || !(rate > 0.0) {
            return;
        }
        // t > 1 would overshoot past zero and flip the direction
        let t = (dt * rate).min(1.0);
        self.velocity = self.velocity.lerp(Vec2::ZERO, t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_integrate_order() {
        let mut body = KinematicBody::at(Vec2::ZERO)
            .with_velocity(Vec2::new(1.0, 0.0))
            .with_acceleration(Vec2::new(0.0, -2.0));
        body.integrate(0.5);
        // velocity updated first, so position sees the new velocity
        assert_eq!(body.velocity, Vec2::new(1.0, -1.0));
        assert_eq!(body.position, Vec2::new(0.5, -0.5));
    }

    #[test]
    fn test_negative_dt_is_noop() {
        let mut body = KinematicBody::at(Vec2::ONE).with_velocity(Vec2::ONE);
        let before = body;
        body.integrate(-0.1);
        body.integrate(f32::NAN);
        body.apply_damping(-0.1, 2.0);
        assert_eq!(body, before);
    }

    #[test]
    fn test_damping_decays_toward_zero() {
        let mut body = KinematicBody::default().with_velocity(Vec2::new(1.0, -1.0));
        body.apply_damping(0.1, 2.0);
        assert!((body.velocity.x - 0.8).abs() < 1e-6);
        assert!((body.velocity.y + 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_damping_never_overshoots() {
        let mut body = KinematicBody::default().with_velocity(Vec2::new(3.0, 0.0));
        body.apply_damping(1.0, 10.0);
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    proptest! {
        #[test]
        fn prop_integrate_zero_is_identity(
            px in -100.0f32..100.0, py in -100.0f32..100.0,
            vx in -100.0f32..100.0, vy in -100.0f32..100.0,
            ax in -100.0f32..100.0, ay in -100.0f32..100.0,
        ) {
            let mut body = KinematicBody {
                position: Vec2::new(px, py),
                velocity: Vec2::new(vx, vy),
                acceleration: Vec2::new(ax, ay),
            };
            let before = body;
            body.integrate(0.0);
            prop_assert_eq!(body, before);
        }
    }
}
