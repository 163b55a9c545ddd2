//! World state shared by every game
//!
//! Everything a restart must put back lives here: entities, score, play
//! time and the seeded RNG. The tile grid is load-time input and survives
//! restarts untouched.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::resolve_tile_contacts;
use super::entity::EntityKind;
use super::mode::GameMode;
use super::registry::EntityRegistry;
use super::tilemap::{TileGrid, TilePalette};
use crate::platform::{MusicHandle, SoundHandle};

/// Audio requests queued during simulation, flushed once per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEvent {
    Play(SoundHandle),
    Loop(MusicHandle),
    PauseMusic,
    ResumeMusic,
}

#[derive(Debug, Clone)]
pub struct World {
    pub registry: EntityRegistry,
    pub score: u64,
    /// Simulated seconds since the round started
    pub time: f32,
    /// Fixed steps taken in any mode
    pub ticks: u64,
    /// Simulated seconds in any mode; drives title/overlay animation
    pub uptime: f32,
    pub tiles: Option<TileGrid>,
    pub palette: TilePalette,
    seed: u64,
    rng: Pcg32,
    events: Vec<AudioEvent>,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self {
            registry: EntityRegistry::new(),
            score: 0,
            time: 0.0,
            ticks: 0,
            uptime: 0.0,
            tiles: None,
            palette: TilePalette::default(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Back to a fresh round: same seed, no entities, zero score
    pub fn reset(&mut self) {
        self.registry.clear();
        self.score = 0;
        self.time = 0.0;
        self.ticks = 0;
        self.uptime = 0.0;
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.events.clear();
    }

    pub fn play(&mut self, sound: SoundHandle) {
        self.events.push(AudioEvent::Play(sound));
    }

    pub fn queue_audio(&mut self, event: AudioEvent) {
        self.events.push(event);
    }

    pub fn drain_audio(&mut self) -> Vec<AudioEvent> {
        std::mem::take(&mut self.events)
    }

    /// Integrate every entity the mode lets move and age it
    pub fn integrate(&mut self, dt: f32, mode: GameMode, damping: impl Fn(EntityKind) -> f32) {
        for entity in self.registry.iter_mut() {
            if !entity.alive || !mode.simulates(entity.kind) {
                continue;
            }
            entity.body.integrate(dt);
            entity.body.apply_damping(dt, damping(entity.kind));
            entity.age += dt;
        }
    }

    /// Tile pass for every simulated player; true if any touched a lethal tile
    pub fn resolve_terrain(&mut self, mode: GameMode) -> bool {
        let Some(grid) = &self.tiles else {
            return false;
        };
        let palette = &self.palette;
        let mut lethal = false;
        for entity in self.registry.iter_mut() {
            if !entity.alive || entity.kind != EntityKind::Player || !mode.simulates(entity.kind) {
                continue;
            }
            let report =
                resolve_tile_contacts(&mut entity.body, &entity.bbox, &mut entity.contacts, grid, palette);
            lethal |= report.lethal;
        }
        lethal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::Rng;

    use crate::platform::TextureHandle;
    use crate::sim::body::KinematicBody;
    use crate::sim::collision::BoundingBox;
    use crate::sim::entity::{EntityInit, Sprite};

    fn init(vx: f32) -> EntityInit {
        EntityInit::new(
            KinematicBody::at(Vec2::ZERO).with_velocity(Vec2::new(vx, 0.0)),
            BoundingBox::new(0.1, 0.1),
            Sprite::new(TextureHandle(0), Vec2::ONE),
        )
    }

    #[test]
    fn test_reset_restores_rng_and_score() {
        let mut world = World::new(7);
        let first: f32 = world.rng().random();
        world.score = 30;
        world.uptime = 2.5;
        world.registry.spawn(EntityKind::Player, init(0.0));
        world.reset();
        assert_eq!(world.score, 0);
        assert_eq!(world.uptime, 0.0);
        assert!(world.registry.is_empty());
        let again: f32 = world.rng().random();
        assert_eq!(first, again);
    }

    #[test]
    fn test_terminal_mode_freezes_non_cosmetic() {
        let mut world = World::new(1);
        let p = world.registry.spawn(EntityKind::Obstacle, init(1.0));
        let d = world.registry.spawn(EntityKind::Decoration, init(1.0));
        world.integrate(0.5, GameMode::Lost, |_| 0.0);
        assert_eq!(world.registry.get(p).unwrap().body.position.x, 0.0);
        assert_eq!(world.registry.get(d).unwrap().body.position.x, 0.5);
        assert_eq!(world.registry.get(d).unwrap().age, 0.5);
    }

    #[test]
    fn test_audio_queue_drains() {
        let mut world = World::new(1);
        world.play(SoundHandle(3));
        world.queue_audio(AudioEvent::PauseMusic);
        assert_eq!(world.drain_audio().len(), 2);
        assert!(world.drain_audio().is_empty());
    }
}
