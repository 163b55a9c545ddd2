//! The four titles as rule sets over one shared core
//!
//! Every game uses the same registry, collision oracle, clock and mode
//! machine; what differs is captured by a [`GameRules`] implementation.

pub mod glider;
pub mod invaders;
pub mod platformer;
pub mod pong;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::platform::{InputState, MusicHandle, PlatformServices, Renderer, TextRenderer};
use crate::settings::Settings;
use crate::sim::{DespawnReason, Despawned, Entity, EntityKind, GameMode, Outcome, Transition, World};

pub use glider::Glider;
pub use invaders::Invaders;
pub use platformer::Platformer;
pub use pong::Pong;

/// Which game to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameVariant {
    #[default]
    Glider,
    Pong,
    Invaders,
    Platformer,
}

impl GameVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameVariant::Glider => "glider",
            GameVariant::Pong => "pong",
            GameVariant::Invaders => "invaders",
            GameVariant::Platformer => "platformer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "glider" | "plane" => Some(GameVariant::Glider),
            "pong" => Some(GameVariant::Pong),
            "invaders" | "space-invaders" => Some(GameVariant::Invaders),
            "platformer" => Some(GameVariant::Platformer),
            _ => None,
        }
    }

    /// Fresh rule set for this variant
    pub fn rules(&self) -> Box<dyn GameRules> {
        match self {
            GameVariant::Glider => Box::new(Glider::default()),
            GameVariant::Pong => Box::new(Pong::default()),
            GameVariant::Invaders => Box::new(Invaders::default()),
            GameVariant::Platformer => Box::new(Platformer::default()),
        }
    }
}

/// Per-game behaviour plugged into the shared loop.
///
/// Call order within one fixed step while playing:
/// `control` -> `before_step` -> integrate -> tile pass -> `resolve` ->
/// prune with `expiry` -> `score` per despawn -> `outcome`.
pub trait GameRules {
    fn name(&self) -> &'static str;

    /// Resolve assets and load-time data (tile maps) once at startup
    fn load_assets(
        &mut self,
        platform: &mut PlatformServices,
        world: &mut World,
        settings: &Settings,
    ) -> Result<(), GameError>;

    /// Spawn the initial entity set and reset per-round rule state
    fn populate(&mut self, world: &mut World);

    /// Apply held keys and this step's presses to the player entities
    fn control(&mut self, world: &mut World, input: &InputState, dt: f32);

    /// Spawn timers and scripted motion, before integration
    fn before_step(&mut self, _world: &mut World, _dt: f32) {}

    /// Entity-vs-entity contacts after integration. Removals go through
    /// `registry.mark`; a fatal contact returns its outcome.
    fn resolve(&mut self, world: &mut World, dt: f32) -> Option<Outcome>;

    /// Expiry predicate applied by the prune pass
    fn expiry(&self, entity: &Entity) -> Option<DespawnReason> {
        entity.is_expired().then_some(DespawnReason::Expired)
    }

    /// Points awarded for one despawn
    fn score(&self, _despawned: &Despawned) -> u64 {
        0
    }

    /// Win/loss predicate over the post-step state
    fn outcome(&self, world: &World) -> Option<Outcome>;

    /// Velocity damping rate for a kind
    fn damping(&self, _kind: EntityKind) -> f32 {
        0.0
    }

    /// React to a mode change (music, sprite swaps)
    fn on_transition(&mut self, _world: &mut World, _transition: Transition) {}

    /// Background music, started once at load
    fn music(&self) -> Option<MusicHandle> {
        None
    }

    /// Non-entity geometry drawn under the entities (tiles)
    fn draw_background(&self, _world: &World, _renderer: &mut dyn Renderer) {}

    /// Text and overlay drawn over the entities
    fn draw_hud(&self, world: &World, mode: GameMode, renderer: &mut dyn Renderer, text: &mut dyn TextRenderer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_names_roundtrip() {
        for v in [
            GameVariant::Glider,
            GameVariant::Pong,
            GameVariant::Invaders,
            GameVariant::Platformer,
        ] {
            assert_eq!(GameVariant::from_str(v.as_str()), Some(v));
            assert_eq!(v.rules().name(), v.as_str());
        }
        assert_eq!(GameVariant::from_str("PONG"), Some(GameVariant::Pong));
        assert_eq!(GameVariant::from_str("tetris"), None);
    }
}
