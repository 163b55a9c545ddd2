//! Space invaders: a marching formation, one ship, rate-limited shots
//!
//! The formation walks sideways until any invader reaches the edge, then
//! the whole block reverses and steps down. Clearing every invader wins;
//! letting one touch the ship or reach its altitude loses.

use glam::Vec2;

use super::GameRules;
use crate::error::GameError;
use crate::platform::{
    FontHandle, InputState, Key, PlatformServices, Renderer, SoundHandle, TextRenderer, TextureHandle,
    UvRect,
};
use crate::settings::Settings;
use crate::sim::{
    BoundingBox, DespawnReason, Despawned, EntityId, EntityInit, EntityKind, GameMode, KinematicBody,
    Outcome, Sprite, World,
};

const SHIP_START: Vec2 = Vec2::new(0.0, -0.8);
const SHIP_SPEED: f32 = 0.5;
const SHIP_LIMIT: f32 = 1.6;

pub const FORMATION_SIZE: u32 = 20;
const FORMATION_ROWS: u32 = 4;
const FORMATION_LEFT: f32 = -1.0;
const FORMATION_TOP: f32 = 0.6;
const COLUMN_SPACING: f32 = 0.4;
const ROW_SPACING: f32 = 0.3;
const MARCH_SPEED: f32 = 0.3;
const EDGE_X: f32 = 1.7;
/// Pulled back inside the edge on reversal so the next step doesn't re-trigger
const EDGE_NUDGE: f32 = 0.01;
const STEP_DOWN: f32 = 0.1;

const SHOT_COOLDOWN: f32 = 1.0;
const BULLET_VELOCITY: Vec2 = Vec2::new(0.0, 1.0);
const BULLET_TTL: f32 = 2.0;
const BULLET_OFFSET: f32 = 0.05;
pub const HIT_POINTS: u64 = 10;

const SHEET_SHIP: UvRect = UvRect::new(0.25, 0.85, 0.15, 0.15);
const SHEET_INVADER: UvRect = UvRect::new(0.02, 0.02, 0.20, 0.15);

#[derive(Debug, Clone, Copy, Default)]
struct Assets {
    sheet: TextureHandle,
    bullet: TextureHandle,
    font: FontHandle,
    shot: SoundHandle,
    hit: SoundHandle,
}

#[derive(Debug, Default)]
pub struct Invaders {
    assets: Assets,
    since_shot: f32,
}

impl Invaders {
    fn spawn_bullet(&self, world: &mut World, from: Vec2) -> EntityId {
        world.registry.spawn(
            EntityKind::Projectile,
            EntityInit::new(
                KinematicBody::at(from + Vec2::new(0.0, BULLET_OFFSET)).with_velocity(BULLET_VELOCITY),
                BoundingBox::new(0.015, 0.03),
                Sprite::new(self.assets.bullet, Vec2::new(0.0225, 0.12)),
            )
            .with_ttl(BULLET_TTL),
        )
    }

    /// Reverse and drop the whole block once any invader passes the edge
    fn march(world: &mut World) {
        let reverse = world.registry.iter().any(|e| {
            e.kind == EntityKind::Obstacle
                && e.alive
                && e.body.position.x.abs() > EDGE_X
                && e.body.position.x.signum() == e.body.velocity.x.signum()
        });
        if !reverse {
            return;
        }
        for invader in world
            .registry
            .iter_mut()
            .filter(|e| e.kind == EntityKind::Obstacle)
        {
            let body = &mut invader.body;
            body.position.x -= body.velocity.x.signum() * EDGE_NUDGE;
            body.position.y -= STEP_DOWN;
            body.velocity.x = -body.velocity.x;
        }
    }
}

impl GameRules for Invaders {
    fn name(&self) -> &'static str {
        "invaders"
    }

    fn load_assets(
        &mut self,
        platform: &mut PlatformServices,
        _world: &mut World,
        _settings: &Settings,
    ) -> Result<(), GameError> {
        self.assets = Assets {
            sheet: platform.renderer.load_texture("InvadersSheet.png")?,
            bullet: platform.renderer.load_texture("Bullet.png")?,
            font: platform.text.load_font("pixel_font.png")?,
            shot: platform.audio.load_sound("shoot.wav")?,
            hit: platform.audio.load_sound("invaderkilled.wav")?,
        };
        Ok(())
    }

    fn populate(&mut self, world: &mut World) {
        self.since_shot = SHOT_COOLDOWN;

        world.registry.spawn(
            EntityKind::Player,
            EntityInit::new(
                KinematicBody::at(SHIP_START),
                BoundingBox::new(0.2, 0.1),
                Sprite::new(self.assets.sheet, Vec2::splat(0.225)).with_uv(SHEET_SHIP),
            ),
        );
        for i in 0..FORMATION_SIZE {
            let col = (i / FORMATION_ROWS) as f32;
            let row = (i % FORMATION_ROWS) as f32;
            let pos = Vec2::new(
                FORMATION_LEFT + col * COLUMN_SPACING,
                FORMATION_TOP - row * ROW_SPACING,
            );
            world.registry.spawn(
                EntityKind::Obstacle,
                EntityInit::new(
                    KinematicBody::at(pos).with_velocity(Vec2::new(MARCH_SPEED, 0.0)),
                    BoundingBox::new(0.2, 0.2),
                    Sprite::new(self.assets.sheet, Vec2::new(0.3, 0.225)).with_uv(SHEET_INVADER),
                ),
            );
        }
    }

    fn control(&mut self, world: &mut World, input: &InputState, dt: f32) {
        self.since_shot += dt;
        let Some(ship) = world.registry.find_tag_mut(EntityKind::Player, 0) else {
            return;
        };
        let dir = input.axis(Key::Left, Key::Right);
        let x = ship.body.position.x;
        let can_move = (dir < 0.0 && x > -SHIP_LIMIT) || (dir > 0.0 && x < SHIP_LIMIT);
        ship.body.velocity.x = if can_move { dir * SHIP_SPEED } else { 0.0 };
        let from = ship.body.position;

        if input.pressed(Key::Action) && self.since_shot > SHOT_COOLDOWN {
            self.since_shot = 0.0;
            self.spawn_bullet(world, from);
            world.play(self.assets.shot);
        }
    }

    fn resolve(&mut self, world: &mut World, _dt: f32) -> Option<Outcome> {
        Self::march(world);

        let bullets: Vec<_> = world
            .registry
            .iter()
            .filter(|e| e.kind == EntityKind::Projectile && e.is_collidable())
            .cloned()
            .collect();
        for bullet in bullets {
            let target = world
                .registry
                .iter()
                .find(|e| e.kind == EntityKind::Obstacle && e.is_collidable() && bullet.overlaps(e))
                .map(|e| e.id);
            if let Some(invader) = target {
                world.registry.mark(invader, DespawnReason::Destroyed);
                world.registry.mark(bullet.id, DespawnReason::Consumed);
                world.play(self.assets.hit);
            }
        }

        let ship = world.registry.find_tag(EntityKind::Player, 0)?;
        let ship_y = ship.position().y;
        let landed = world.registry.iter().any(|e| {
            e.kind == EntityKind::Obstacle
                && e.alive
                && (e.body.position.y <= ship_y || (e.is_collidable() && ship.overlaps(e)))
        });
        landed.then_some(Outcome::Lost)
    }

    fn score(&self, despawned: &Despawned) -> u64 {
        match (despawned.kind, despawned.reason) {
            (EntityKind::Obstacle, DespawnReason::Destroyed) => HIT_POINTS,
            _ => 0,
        }
    }

    fn outcome(&self, world: &World) -> Option<Outcome> {
        (world.registry.hostile_count() == 0).then_some(Outcome::Won)
    }

    fn draw_hud(&self, world: &World, mode: GameMode, _renderer: &mut dyn Renderer, text: &mut dyn TextRenderer) {
        let font = self.assets.font;
        match mode {
            GameMode::Title => {
                text.draw_text(font, "SPACE INVADERS", 0.12, 0.0, -0.84, 0.2);
                text.draw_text(font, "arrows to move, space to fire", 0.05, 0.0, -0.72, -0.1);
            }
            GameMode::Playing => {
                text.draw_text(font, &format!("SCORE {}", world.score), 0.06, 0.0, -1.5, 0.95);
            }
            GameMode::Won => {
                text.draw_text(font, "YOU WIN", 0.15, 0.0, -0.52, 0.2);
                text.draw_text(font, &format!("SCORE {}", world.score), 0.08, 0.0, -0.4, 0.0);
            }
            GameMode::Lost => {
                text.draw_text(font, "GAME OVER", 0.15, 0.0, -0.67, 0.2);
                text.draw_text(font, &format!("SCORE {}", world.score), 0.08, 0.0, -0.4, 0.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::tests::headless_loop;
    use crate::games::GameVariant;

    const FRAME: f32 = 1.0 / 60.0;

    fn populated() -> (Invaders, World) {
        let mut rules = Invaders::default();
        let mut world = World::new(3);
        rules.populate(&mut world);
        (rules, world)
    }

    #[test]
    fn test_formation_layout() {
        let (_, world) = populated();
        assert_eq!(world.registry.hostile_count(), FORMATION_SIZE as usize);
        let invaders: Vec<_> = world
            .registry
            .iter()
            .filter(|e| e.kind == EntityKind::Obstacle)
            .map(|e| e.position())
            .collect();
        assert!((invaders[0] - Vec2::new(-1.0, 0.6)).length() < 1e-6);
        assert!((invaders[5] - Vec2::new(-0.6, 0.3)).length() < 1e-6);
        assert!((invaders[19] - Vec2::new(0.6, -0.3)).length() < 1e-5);
    }

    #[test]
    fn test_formation_reverses_together() {
        let (mut rules, mut world) = populated();
        let before: Vec<_> = world
            .registry
            .iter()
            .filter(|e| e.kind == EntityKind::Obstacle)
            .map(|e| e.position())
            .collect();
        let last = world.registry.iter_mut().last().unwrap();
        last.body.position.x = 1.71;
        rules.resolve(&mut world, FRAME);

        for (invader, old) in world
            .registry
            .iter()
            .filter(|e| e.kind == EntityKind::Obstacle)
            .zip(before)
        {
            assert_eq!(invader.body.velocity.x, -MARCH_SPEED);
            assert!((invader.position().y - (old.y - STEP_DOWN)).abs() < 1e-6);
        }
        // no second reversal on the next pass
        rules.resolve(&mut world, FRAME);
        assert!(world
            .registry
            .iter()
            .filter(|e| e.kind == EntityKind::Obstacle)
            .all(|e| e.body.velocity.x == -MARCH_SPEED));
    }

    #[test]
    fn test_shot_cooldown() {
        let (mut rules, mut world) = populated();
        let fire = InputState::pressing(&[Key::Action]);
        rules.control(&mut world, &fire, FRAME);
        rules.control(&mut world, &fire, FRAME);
        assert_eq!(world.registry.count(EntityKind::Projectile), 1);
        for _ in 0..61 {
            rules.control(&mut world, &InputState::default(), FRAME);
        }
        rules.control(&mut world, &fire, FRAME);
        assert_eq!(world.registry.count(EntityKind::Projectile), 2);
    }

    #[test]
    fn test_ship_stays_in_bounds() {
        let (mut rules, mut world) = populated();
        world.registry.find_tag_mut(EntityKind::Player, 0).unwrap().body.position.x = SHIP_LIMIT + 0.01;
        rules.control(&mut world, &InputState::holding(&[Key::Right]), FRAME);
        let ship = world.registry.find_tag(EntityKind::Player, 0).unwrap();
        assert_eq!(ship.body.velocity.x, 0.0);
    }

    #[test]
    fn test_each_hit_removes_one_and_scores_ten() {
        let (mut game, _probe) = headless_loop(GameVariant::Invaders);
        game.update(FRAME, &InputState::pressing(&[Key::Left]));
        assert_eq!(game.mode(), GameMode::Playing);

        let targets: Vec<Vec2> = game
            .world()
            .registry
            .iter()
            .filter(|e| e.kind == EntityKind::Obstacle)
            .map(|e| e.position())
            .collect();
        assert_eq!(targets.len(), 20);

        for n in 0..targets.len() {
            // fire straight into whichever invader is first in line now
            let pos = game
                .world()
                .registry
                .iter()
                .find(|e| e.kind == EntityKind::Obstacle)
                .map(|e| e.position())
                .unwrap();
            let world = game.world_mut();
            world.registry.spawn(
                EntityKind::Projectile,
                EntityInit::new(
                    KinematicBody::at(pos),
                    BoundingBox::new(0.015, 0.03),
                    Sprite::new(TextureHandle(0), Vec2::ONE),
                )
                .with_ttl(BULLET_TTL),
            );
            game.update(FRAME, &InputState::default());
            assert_eq!(game.world().registry.hostile_count(), 19 - n);
            assert_eq!(game.world().score, HIT_POINTS * (n as u64 + 1));
            assert_eq!(game.world().registry.count(EntityKind::Projectile), 0);
        }

        game.update(FRAME, &InputState::default());
        assert_eq!(game.mode(), GameMode::Won);
    }

    #[test]
    fn test_invader_reaching_ship_loses() {
        let (mut rules, mut world) = populated();
        let first = world
            .registry
            .iter_mut()
            .find(|e| e.kind == EntityKind::Obstacle)
            .unwrap();
        first.body.position.y = SHIP_START.y;
        assert_eq!(rules.resolve(&mut world, FRAME), Some(Outcome::Lost));
    }

    #[test]
    fn test_invader_touching_ship_loses() {
        let (mut rules, mut world) = populated();
        let first = world
            .registry
            .iter_mut()
            .find(|e| e.kind == EntityKind::Obstacle)
            .unwrap();
        // still above the ship, boxes overlapping
        first.body.position = SHIP_START + Vec2::new(0.05, 0.1);
        assert_eq!(rules.resolve(&mut world, FRAME), Some(Outcome::Lost));
    }
}
