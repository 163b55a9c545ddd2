//! Arcade Kit - shared core for four small 2D arcade demos
//!
//! Core modules:
//! - `sim`: Fixed-step simulation (kinematics, collisions, entities, modes)
//! - `games`: Plane Glider, Pong, Invaders and Platformer rule sets
//! - `game`: Frame driver tying clock, mode, world and platform together
//! - `platform`: Renderer/audio/input/clock interface plus a headless impl
//! - `settings`: Data-driven configuration

pub mod error;
pub mod game;
pub mod games;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::GameError;
pub use game::{FrameOutcome, GameLoop};
pub use games::GameVariant;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 6;
    /// Frame deltas above this are treated as a stall and clipped
    pub const MAX_FRAME_DELTA: f32 = 0.25;

    /// Half height of the visible play field in world units 
    pub const SCREEN_HALF_HEIGHT: f32 = 1.78;

    /// Offset used when sampling the tile grid just outside a body edge
    pub const TILE_SAMPLE_EPSILON: f32 = 0.001;
}

/// Linear interpolation `a + (b - a) * t`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp a frame delta into something the simulation can consume.
///
/// Negative, NaN and infinite deltas become zero; they are never propagated.
#[inline]
pub fn sanitize_delta(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(2.0, 6.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 6.0, 1.0), 6.0);
        assert_eq!(lerp(2.0, 6.0, 0.5), 4.0);
    }

    #[test]
    fn test_sanitize_delta() {
        assert_eq!(sanitize_delta(0.016), 0.016);
        assert_eq!(sanitize_delta(-1.0), 0.0);
        assert_eq!(sanitize_delta(f32::NAN), 0.0);
        assert_eq!(sanitize_delta(f32::INFINITY), 0.0);
    }
}
