//! Glider: steer a plane left and right past falling crates and birds.
//!
//! Crates that fall off the bottom score a point each. Touching any
//! obstacle ends the run.

use glam::Vec2;
use rand::Rng;

use super::GameRules;
use crate::consts::SCREEN_HALF_HEIGHT;
use crate::error::GameError;
use crate::platform::{
    FontHandle, InputState, Key, MusicHandle, PlatformServices, Renderer, SoundHandle, TextRenderer,
    TextureHandle, UvRect, model_matrix,
};
use crate::settings::Settings;
use crate::sim::{
    AudioEvent, BoundingBox, DespawnReason, Despawned, Entity, EntityInit, EntityKind, GameMode,
    KinematicBody, Outcome, Sprite, Transition, World,
};

const PLANE_START: Vec2 = Vec2::new(0.0, -0.8);
const PLANE_SPEED: f32 = 1.5;
/// Crossing this x teleports the plane to the opposite edge
const WRAP_X: f32 = 1.05;

const CRATE_INTERVAL: f32 = 2.0;
const CRATE_VELOCITY: Vec2 = Vec2::new(0.0, -0.7);
const BIRD_FIRST: f32 = 10.0;
const BIRD_INTERVAL: f32 = 6.0;
const BIRD_VELOCITY: Vec2 = Vec2::new(0.3, -0.4);
const BIRD_BOUNCE_X: f32 = 0.95;
const FLAP_PERIOD: f32 = 0.5;
const OFFSCREEN_Y: f32 = -(SCREEN_HALF_HEIGHT + 0.2);
const ARROW_BLINK: f32 = 0.5;

pub const TAG_CRATE: u32 = 1;
pub const TAG_BIRD: u32 = 2;

#[derive(Debug, Clone, Copy, Default)]
struct Assets {
    plane: TextureHandle,
    crate_box: TextureHandle,
    clouds: [TextureHandle; 2],
    /// [facing right, facing left][flap frame]
    bird: [[TextureHandle; 2]; 2],
    explosion: TextureHandle,
    arrow_left: TextureHandle,
    arrow_right: TextureHandle,
    font: FontHandle,
    crash: SoundHandle,
    music: MusicHandle,
}

#[derive(Debug, Default)]
pub struct Glider {
    assets: Assets,
    next_crate: f32,
    next_bird: f32,
}

impl Glider {
    fn spawn_crate(&self, world: &mut World) {
        let x = world.rng().random_range(-1.0..1.0);
        world.registry.spawn(
            EntityKind::Obstacle,
            EntityInit::new(
                KinematicBody::at(Vec2::new(x, SCREEN_HALF_HEIGHT)).with_velocity(CRATE_VELOCITY),
                BoundingBox::new(0.2, 0.2),
                Sprite::new(self.assets.crate_box, Vec2::splat(0.2)),
            )
            .with_tag(TAG_CRATE),
        );
    }

    fn spawn_bird(&self, world: &mut World) {
        let x = world.rng().random_range(-0.9..0.9);
        world.registry.spawn(
            EntityKind::Obstacle,
            EntityInit::new(
                KinematicBody::at(Vec2::new(x, SCREEN_HALF_HEIGHT)).with_velocity(BIRD_VELOCITY),
                BoundingBox::new(0.14, 0.1),
                Sprite::new(self.assets.bird[0][0], Vec2::new(0.21, 0.14)),
            )
            .with_tag(TAG_BIRD),
        );
    }

    fn draw_line(&self, text: &mut dyn TextRenderer, line: &str, size: f32, y: f32) {
        // centre on the fixed-width glyph grid
        let x = -(line.chars().count() as f32) * size * 0.5;
        text.draw_text(self.assets.font, line, size, 0.0, x, y);
    }
}

impl GameRules for Glider {
    fn name(&self) -> &'static str {
        "glider"
    }

    fn load_assets(
        &mut self,
        platform: &mut PlatformServices,
        _world: &mut World,
        _settings: &Settings,
    ) -> Result<(), GameError> {
        let r = platform.renderer.as_mut();
        self.assets = Assets {
            plane: r.load_texture("Plane.png")?,
            crate_box: r.load_texture("crate.png")?,
            clouds: [r.load_texture("cloud.png")?, r.load_texture("cloud2.png")?],
            bird: [
                [r.load_texture("bird.png")?, r.load_texture("bird2.png")?],
                [r.load_texture("birdR1.png")?, r.load_texture("birdR2.png")?],
            ],
            explosion: r.load_texture("explosion.png")?,
            arrow_left: r.load_texture("arrowLeft.png")?,
            arrow_right: r.load_texture("arrowRight.png")?,
            font: platform.text.load_font("font1.png")?,
            crash: platform.audio.load_sound("Explosion.wav")?,
            music: platform.audio.load_music("music.mp3")?,
        };
        Ok(())
    }

    fn populate(&mut self, world: &mut World) {
        self.next_crate = 0.0;
        self.next_bird = BIRD_FIRST;

        for (texture, pos, scale) in [
            (self.assets.clouds[0], Vec2::new(-0.6, 1.0), Vec2::new(0.6, 0.3)),
            (self.assets.clouds[1], Vec2::new(0.55, -0.2), Vec2::new(0.5, 0.25)),
        ] {
            world.registry.spawn(
                EntityKind::Decoration,
                EntityInit::new(KinematicBody::at(pos), BoundingBox::default(), Sprite::new(texture, scale)),
            );
        }
        world.registry.spawn(
            EntityKind::Player,
            EntityInit::new(
                KinematicBody::at(PLANE_START),
                BoundingBox::new(0.16, 0.16),
                Sprite::new(self.assets.plane, Vec2::splat(0.16)),
            ),
        );
    }

    fn control(&mut self, world: &mut World, input: &InputState, _dt: f32) {
        if let Some(plane) = world.registry.find_tag_mut(EntityKind::Player, 0) {
            plane.body.velocity.x = input.axis(Key::Left, Key::Right) * PLANE_SPEED;
        }
    }

    fn before_step(&mut self, world: &mut World, dt: f32) {
        self.next_crate -= dt;
        if self.next_crate <= 0.0 {
            self.next_crate += CRATE_INTERVAL;
            self.spawn_crate(world);
        }
        self.next_bird -= dt;
        if self.next_bird <= 0.0 {
            self.next_bird += BIRD_INTERVAL;
            self.spawn_bird(world);
        }
    }

    fn resolve(&mut self, world: &mut World, _dt: f32) -> Option<Outcome> {
        let bird_textures = self.assets.bird;
        for entity in world.registry.iter_mut() {
            match (entity.kind, entity.tag) {
                (EntityKind::Player, _) => {
                    let x = entity.body.position.x;
                    if x > WRAP_X {
                        entity.body.position.x = -WRAP_X;
                    } else if x < -WRAP_X {
                        entity.body.position.x = WRAP_X;
                    }
                }
                (EntityKind::Obstacle, TAG_BIRD) => {
                    let body = &mut entity.body;
                    if body.position.x >= BIRD_BOUNCE_X && body.velocity.x > 0.0 {
                        body.velocity.x = -body.velocity.x;
                    } else if body.position.x <= -BIRD_BOUNCE_X && body.velocity.x < 0.0 {
                        body.velocity.x = -body.velocity.x;
                    }
                    let facing = usize::from(body.velocity.x < 0.0);
                    entity.sprite.frame = (entity.age / FLAP_PERIOD) as u32 % 2;
                    entity.sprite.texture = bird_textures[facing][entity.sprite.frame as usize];
                }
                _ => {}
            }
        }

        let plane = world.registry.find_tag(EntityKind::Player, 0)?.clone();
        let crashed = world
            .registry
            .iter()
            .any(|e| e.kind == EntityKind::Obstacle && e.is_collidable() && plane.overlaps(e));
        if !crashed {
            return None;
        }
        log::info!("Plane crashed at {:?}", plane.position());
        if let Some(plane) = world.registry.get_mut(plane.id) {
            plane.sprite.texture = self.assets.explosion;
        }
        world.play(self.assets.crash);
        Some(Outcome::Lost)
    }

    fn expiry(&self, entity: &Entity) -> Option<DespawnReason> {
        if entity.kind == EntityKind::Obstacle && entity.body.position.y < OFFSCREEN_Y {
            return Some(DespawnReason::OffScreen);
        }
        entity.is_expired().then_some(DespawnReason::Expired)
    }

    fn score(&self, despawned: &Despawned) -> u64 {
        match (despawned.kind, despawned.tag, despawned.reason) {
            (EntityKind::Obstacle, TAG_CRATE, DespawnReason::OffScreen) => 1,
            _ => 0,
        }
    }

    fn outcome(&self, _world: &World) -> Option<Outcome> {
        None
    }

    fn on_transition(&mut self, world: &mut World, transition: Transition) {
        match transition {
            Transition::Finish(Outcome::Lost) => world.queue_audio(AudioEvent::PauseMusic),
            Transition::Restart => world.queue_audio(AudioEvent::ResumeMusic),
            _ => {}
        }
    }

    fn music(&self) -> Option<MusicHandle> {
        Some(self.assets.music)
    }

    fn draw_hud(&self, world: &World, mode: GameMode, renderer: &mut dyn Renderer, text: &mut dyn TextRenderer) {
        match mode {
            GameMode::Title => {
                self.draw_line(text, "Plane", 0.2, 0.6);
                self.draw_line(text, "Glider", 0.2, 0.35);
                self.draw_line(text, "move left or right to start", 0.06, -0.4);

                let blink_on = (world.uptime / ARROW_BLINK) as u64 % 2 == 0;
                if blink_on {
                    let scale = Vec2::splat(0.15);
                    renderer.draw_quad(
                        self.assets.arrow_left,
                        model_matrix(PLANE_START + Vec2::new(-0.35, 0.0), scale, 0.0),
                        UvRect::FULL,
                    );
                    renderer.draw_quad(
                        self.assets.arrow_right,
                        model_matrix(PLANE_START + Vec2::new(0.35, 0.0), scale, 0.0),
                        UvRect::FULL,
                    );
                }
            }
            GameMode::Playing => {
                let line = format!("Score: {}", world.score);
                text.draw_text(self.assets.font, &line, 0.07, 0.0, -0.95, SCREEN_HALF_HEIGHT - 0.15);
            }
            GameMode::Won | GameMode::Lost => {
                self.draw_line(text, "Game Over", 0.15, 0.5);
                self.draw_line(text, &format!("Score: {}", world.score), 0.08, 0.25);
                self.draw_line(text, "press R to play again", 0.06, 0.0);
                self.draw_line(text, "or press esc to exit", 0.06, -0.1);
            }
        }
    }
}
