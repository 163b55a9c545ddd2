//! Two-player pong on a wide field
//!
//! Right paddle: Up/Down. Left paddle: W/S (`AltUp`/`AltDown`).
//! First side to `WINNING_SCORE` ends the match.

use glam::Vec2;

use super::GameRules;
use crate::error::GameError;
use crate::platform::{
    FontHandle, InputState, Key, PlatformServices, Renderer, SoundHandle, TextRenderer, TextureHandle,
};
use crate::settings::Settings;
use crate::sim::{
    BoundingBox, EntityInit, EntityKind, GameMode, KinematicBody, Outcome, Sprite, World,
};

const PADDLE_X: f32 = 1.525;
const PADDLE_SPEED: f32 = 1.0;
const PADDLE_LIMIT: f32 = 0.75;
/// Contact zone, narrower than the drawn paddle
const PADDLE_HIT: BoundingBox = BoundingBox::new(0.05, 0.5);
const SERVE_VELOCITY: Vec2 = Vec2::new(1.0, 0.0);
/// Vertical speed a flat ball picks up on its first paddle hit
const DEFLECT_VY: f32 = 0.5;
const WALL_Y: f32 = 0.9;
const GOAL_X: f32 = 2.0;
pub const WINNING_SCORE: u32 = 5;

pub const TAG_LEFT: u32 = 1;
pub const TAG_RIGHT: u32 = 2;

#[derive(Debug, Clone, Copy, Default)]
struct Assets {
    paddle: TextureHandle,
    ball: TextureHandle,
    font: FontHandle,
    bounce: SoundHandle,
    point: SoundHandle,
}

#[derive(Debug, Default)]
pub struct Pong {
    assets: Assets,
    /// Points for the left and right player
    points: [u32; 2],
}

impl Pong {
    pub fn points(&self) -> [u32; 2] {
        self.points
    }

    fn paddle(&self, x: f32, tag: u32) -> EntityInit {
        EntityInit::new(
            KinematicBody::at(Vec2::new(x, 0.0)),
            PADDLE_HIT,
            Sprite::new(self.assets.paddle, Vec2::new(0.05, 0.5)),
        )
        .with_tag(tag)
    }

    fn reset_rally(world: &mut World) {
        for entity in world.registry.iter_mut() {
            match entity.kind {
                EntityKind::Player => {
                    entity.body.position.y = 0.0;
                    entity.body.velocity = Vec2::ZERO;
                }
                EntityKind::Projectile => {
                    entity.body.position = Vec2::ZERO;
                    entity.body.velocity.y = 0.0;
                }
                _ => {}
            }
        }
    }
}

impl GameRules for Pong {
    fn name(&self) -> &'static str {
        "pong"
    }

    fn load_assets(
        &mut self,
        platform: &mut PlatformServices,
        _world: &mut World,
        _settings: &Settings,
    ) -> Result<(), GameError> {
        self.assets = Assets {
            paddle: platform.renderer.load_texture("paddle.png")?,
            ball: platform.renderer.load_texture("ball.png")?,
            font: platform.text.load_font("font1.png")?,
            bounce: platform.audio.load_sound("bounce.wav")?,
            point: platform.audio.load_sound("point.wav")?,
        };
        Ok(())
    }

    fn populate(&mut self, world: &mut World) {
        self.points = [0, 0];
        world.registry.spawn(EntityKind::Player, self.paddle(-PADDLE_X, TAG_LEFT));
        world.registry.spawn(EntityKind::Player, self.paddle(PADDLE_X, TAG_RIGHT));
        // zero-size box: the ball is tested as a point
        world.registry.spawn(
            EntityKind::Projectile,
            EntityInit::new(
                KinematicBody::at(Vec2::ZERO).with_velocity(SERVE_VELOCITY),
                BoundingBox::default(),
                Sprite::new(self.assets.ball, Vec2::splat(0.05)),
            ),
        );
    }

    fn control(&mut self, world: &mut World, input: &InputState, _dt: f32) {
        for (tag, down, up) in [
            (TAG_LEFT, Key::AltDown, Key::AltUp),
            (TAG_RIGHT, Key::Down, Key::Up),
        ] {
            if let Some(paddle) = world.registry.find_tag_mut(EntityKind::Player, tag) {
                paddle.body.velocity.y = input.axis(down, up) * PADDLE_SPEED;
            }
        }
    }

    fn resolve(&mut self, world: &mut World, _dt: f32) -> Option<Outcome> {
        let mut paddles = Vec::with_capacity(2);
        for entity in world.registry.iter_mut().filter(|e| e.kind == EntityKind::Player) {
            let y = entity.body.position.y.clamp(-PADDLE_LIMIT, PADDLE_LIMIT);
            entity.body.position.y = y;
            paddles.push(entity.clone());
        }

        let mut bounced = false;
        let mut scored_by = None;
        if let Some(ball) = world.registry.find_tag_mut(EntityKind::Projectile, 0) {
            for paddle in &paddles {
                // only reflect a ball still heading into the paddle
                let toward = paddle.position().x.signum() == ball.body.velocity.x.signum();
                if toward && ball.overlaps(paddle) {
                    ball.body.velocity.x = -ball.body.velocity.x;
                    if ball.body.velocity.y == 0.0 {
                        ball.body.velocity.y = DEFLECT_VY;
                    }
                    bounced = true;
                }
            }

            let pos = ball.body.position;
            if pos.y.abs() > WALL_Y && pos.y.signum() == ball.body.velocity.y.signum() {
                ball.body.velocity.y = -ball.body.velocity.y;
                bounced = true;
            }
            if pos.x > GOAL_X {
                scored_by = Some(0);
            } else if pos.x < -GOAL_X {
                scored_by = Some(1);
            }
        }

        if bounced {
            world.play(self.assets.bounce);
        }
        if let Some(side) = scored_by {
            self.points[side] += 1;
            world.score = u64::from(self.points[0].max(self.points[1]));
            log::info!("Point: {} - {}", self.points[0], self.points[1]);
            world.play(self.assets.point);
            Self::reset_rally(world);
        }
        None
    }

    fn outcome(&self, _world: &World) -> Option<Outcome> {
        self.points.iter().any(|p| *p >= WINNING_SCORE).then_some(Outcome::Won)
    }

    fn draw_hud(&self, _world: &World, mode: GameMode, _renderer: &mut dyn Renderer, text: &mut dyn TextRenderer) {
        let font = self.assets.font;
        let score = format!("{}   {}", self.points[0], self.points[1]);
        text.draw_text(font, &score, 0.1, 0.0, -0.25, 0.95);
        match mode {
            GameMode::Title => {
                text.draw_text(font, "PONG", 0.2, 0.0, -0.4, 0.4);
                text.draw_text(font, "W/S and Up/Down to play", 0.06, 0.0, -0.7, -0.3);
            }
            GameMode::Won | GameMode::Lost => {
                let winner = if self.points[0] > self.points[1] { "Left" } else { "Right" };
                text.draw_text(font, &format!("{winner} player wins"), 0.1, 0.0, -0.85, 0.3);
                text.draw_text(font, "press R to play again", 0.06, 0.0, -0.63, 0.0);
            }
            GameMode::Playing => {}
        }
    }
}
