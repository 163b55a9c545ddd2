//! Side-on platformer over a tile map
//!
//! The only game that uses the tile pass: the player falls under gravity,
//! lands on solid tiles and is stopped by walls. Collect every coin to win.

use glam::Vec2;

use super::GameRules;
use crate::error::GameError;
use crate::platform::{
    FontHandle, InputState, Key, PlatformServices, Renderer, SoundHandle, TextRenderer, TextureHandle,
    UvRect, model_matrix,
};
use crate::settings::Settings;
use crate::sim::{
    BoundingBox, DespawnReason, Despawned, EntityInit, EntityKind, GameMode, KinematicBody, Outcome,
    Sprite, TileGrid, TilePalette, World,
};

pub const CELL_SIZE: f32 = 0.3;
/// Top-left corner of cell (0, 0); cell centres land on multiples of the cell size
pub const MAP_ORIGIN: Vec2 = Vec2::new(-0.15, 0.15);

const SHEET_COLUMNS: u32 = 30;
const SHEET_ROWS: u32 = 16;
const PLAYER_FRAME: u32 = 19;
const COIN_FRAME: u32 = 78;

const PLAYER_START: Vec2 = Vec2::new(2.3, -2.5);
const RUN_SPEED: f32 = 0.5;
const MIN_X: f32 = 0.3;
const MAX_X: f32 = 5.7;
const JUMP_SPEED: f32 = 2.0;
const GRAVITY: f32 = -2.5;
const DAMPING: f32 = 2.0;
/// Falling past this is a loss
const FALL_Y: f32 = -4.5;

const COINS: [Vec2; 3] = [
    Vec2::new(2.8, -2.6),
    Vec2::new(4.7, -2.6),
    Vec2::new(3.8, -2.4),
];

#[derive(Debug, Clone, Copy, Default)]
struct Assets {
    sheet: TextureHandle,
    font: FontHandle,
    coin: SoundHandle,
    jump: SoundHandle,
}

#[derive(Debug, Default)]
pub struct Platformer {
    assets: Assets,
}

impl Platformer {
    /// Parse a map with the platformer's cell geometry
    pub fn grid_from_str(text: &str) -> Result<TileGrid, GameError> {
        TileGrid::parse(text, CELL_SIZE, MAP_ORIGIN)
    }
}

impl GameRules for Platformer {
    fn name(&self) -> &'static str {
        "platformer"
    }

    fn load_assets(
        &mut self,
        platform: &mut PlatformServices,
        world: &mut World,
        settings: &Settings,
    ) -> Result<(), GameError> {
        self.assets = Assets {
            sheet: platform.renderer.load_texture("spritesheet.png")?,
            font: platform.text.load_font("font1.png")?,
            coin: platform.audio.load_sound("coin.wav")?,
            jump: platform.audio.load_sound("jump.wav")?,
        };
        let grid = TileGrid::load(&settings.assets.tile_map, CELL_SIZE, MAP_ORIGIN)?;
        world.tiles = Some(grid);
        world.palette = TilePalette::default();
        Ok(())
    }

    fn populate(&mut self, world: &mut World) {
        world.registry.spawn(
            EntityKind::Player,
            EntityInit::new(
                KinematicBody::at(PLAYER_START),
                BoundingBox::new(0.2, 0.3),
                Sprite::new(self.assets.sheet, Vec2::splat(CELL_SIZE))
                    .with_uv(UvRect::from_sheet(PLAYER_FRAME, SHEET_COLUMNS, SHEET_ROWS)),
            ),
        );
        for pos in COINS {
            world.registry.spawn(
                EntityKind::Collectible,
                EntityInit::new(
                    KinematicBody::at(pos),
                    BoundingBox::new(0.15, 0.15),
                    Sprite::new(self.assets.sheet, Vec2::splat(0.2))
                        .with_uv(UvRect::from_sheet(COIN_FRAME, SHEET_COLUMNS, SHEET_ROWS)),
                ),
            );
        }
    }

    fn control(&mut self, world: &mut World, input: &InputState, _dt: f32) {
        let Some(player) = world.registry.find_tag_mut(EntityKind::Player, 0) else {
            return;
        };
        let contacts = player.contacts;
        let body = &mut player.body;

        body.acceleration.y = if contacts.grounded { 0.0 } else { GRAVITY };
        let jumped = contacts.grounded && input.pressed(Key::Action);
        if jumped {
            body.velocity.y = JUMP_SPEED;
            body.acceleration.y = GRAVITY;
        }

        let x = body.position.x;
        body.velocity.x = if input.held(Key::Right) && x < MAX_X && !contacts.blocked_right {
            RUN_SPEED
        } else if input.held(Key::Left) && x > MIN_X && !contacts.blocked_left {
            -RUN_SPEED
        } else {
            0.0
        };

        if jumped {
            world.play(self.assets.jump);
        }
    }

    fn resolve(&mut self, world: &mut World, _dt: f32) -> Option<Outcome> {
        let player = world.registry.find_tag(EntityKind::Player, 0)?.clone();
        let touched: Vec<_> = world
            .registry
            .iter()
            .filter(|e| e.kind == EntityKind::Collectible && e.is_collidable() && player.overlaps(e))
            .map(|e| e.id)
            .collect();
        for coin in touched {
            world.registry.mark(coin, DespawnReason::Collected);
            world.play(self.assets.coin);
        }
        None
    }

    fn score(&self, despawned: &Despawned) -> u64 {
        u64::from(despawned.kind == EntityKind::Collectible && despawned.reason == DespawnReason::Collected)
    }

    fn outcome(&self, world: &World) -> Option<Outcome> {
        let player = world.registry.find_tag(EntityKind::Player, 0)?;
        if player.position().y < FALL_Y {
            return Some(Outcome::Lost);
        }
        (world.registry.count(EntityKind::Collectible) == 0).then_some(Outcome::Won)
    }

    fn damping(&self, kind: EntityKind) -> f32 {
        match kind {
            EntityKind::Player => DAMPING,
            _ => 0.0,
        }
    }

    fn draw_background(&self, world: &World, renderer: &mut dyn Renderer) {
        let Some(grid) = &world.tiles else {
            return;
        };
        let scale = Vec2::splat(grid.cell_size());
        for (col, row, index) in grid.cells().filter(|(_, _, index)| *index != 0) {
            renderer.draw_quad(
                self.assets.sheet,
                model_matrix(grid.cell_center(col, row), scale, 0.0),
                UvRect::from_sheet(index, SHEET_COLUMNS, SHEET_ROWS),
            );
        }
    }

    fn draw_hud(&self, world: &World, mode: GameMode, _renderer: &mut dyn Renderer, text: &mut dyn TextRenderer) {
        let font = self.assets.font;
        let coins = format!("Coins: {}/{}", world.score, COINS.len());
        match mode {
            GameMode::Title => {
                text.draw_text(font, "Platformer", 0.15, 0.0, 1.9, -1.0);
                text.draw_text(font, "arrows to move, space to jump", 0.05, 0.0, 1.9, -1.3);
            }
            GameMode::Playing => text.draw_text(font, &coins, 0.06, 0.0, 0.3, -0.3),
            GameMode::Won => {
                text.draw_text(font, "All coins collected!", 0.08, 0.0, 1.9, -1.0);
                text.draw_text(font, "press R to play again", 0.06, 0.0, 1.9, -1.3);
            }
            GameMode::Lost => {
                text.draw_text(font, "You fell", 0.12, 0.0, 2.3, -1.0);
                text.draw_text(font, &coins, 0.06, 0.0, 2.3, -1.3);
                text.draw_text(font, "press R to play again", 0.06, 0.0, 1.9, -1.5);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::tests::headless_loop;
    use crate::games::GameVariant;
    use crate::sim::{Entity, TileKind};

    const FRAME: f32 = 1.0 / 60.0;

    fn player(world: &World) -> &Entity {
        world.registry.find_tag(EntityKind::Player, 0).unwrap()
    }

    fn started() -> crate::game::GameLoop {
        let (mut game, _probe) = headless_loop(GameVariant::Platformer);
        // Up is directional but does nothing here
        game.update(FRAME, &InputState::pressing(&[Key::Up]));
        assert_eq!(game.mode(), GameMode::Playing);
        game
    }

    fn settle(game: &mut crate::game::GameLoop) {
        for _ in 0..60 {
            game.update(FRAME, &InputState::default());
        }
    }

    #[test]
    fn test_bundled_map_geometry() {
        let grid = TileGrid::load(std::path::Path::new("assets/platformer.txt"), CELL_SIZE, MAP_ORIGIN).unwrap();
        assert_eq!(grid.width(), 21);
        assert_eq!(grid.height(), 12);
        let palette = TilePalette::default();
        // ground under the start position
        assert_eq!(grid.kind_at(Vec2::new(2.3, -2.9), &palette), TileKind::Solid);
        // the gap
        assert_eq!(grid.kind_at(Vec2::new(3.3, -2.9), &palette), TileKind::Empty);
        assert!((grid.cell_center(10, 10) - Vec2::new(3.0, -3.0)).length() < 1e-5);
    }

    #[test]
    fn test_player_lands_on_ground() {
        let mut game = started();
        settle(&mut game);
        let p = player(game.world());
        assert!(p.contacts.grounded);
        assert_eq!(p.body.velocity.y, 0.0);
        assert!((p.position().y - (-2.7)).abs() < 1e-4);
    }

    #[test]
    fn test_jump_lands_again() {
        let mut game = started();
        settle(&mut game);

        game.update(FRAME, &InputState::pressing(&[Key::Action]));
        assert!(player(game.world()).position().y > -2.7);
        assert!(!player(game.world()).contacts.grounded);

        let mut landed_after = None;
        for frame in 0..240 {
            game.update(FRAME, &InputState::default());
            if player(game.world()).contacts.grounded {
                landed_after = Some(frame);
                break;
            }
        }
        assert!(landed_after.is_some());
        let p = player(game.world());
        assert_eq!(p.body.velocity.y, 0.0);
        assert!((p.position().y - (-2.7)).abs() < 1e-4);
    }

    #[test]
    fn test_grounded_resets_in_air() {
        let mut game = started();
        settle(&mut game);
        game.world_mut()
            .registry
            .find_tag_mut(EntityKind::Player, 0)
            .unwrap()
            .body
            .position
            .y = -1.0;
        game.update(FRAME, &InputState::default());
        assert!(!player(game.world()).contacts.grounded);
    }

    #[test]
    fn test_collect_coin() {
        let mut game = started();
        settle(&mut game);
        game.world_mut()
            .registry
            .find_tag_mut(EntityKind::Player, 0)
            .unwrap()
            .body
            .position
            .x = 2.75;
        game.update(FRAME, &InputState::default());
        assert_eq!(game.world().score, 1);
        assert_eq!(game.world().registry.count(EntityKind::Collectible), 2);
    }

    #[test]
    fn test_all_coins_wins() {
        let mut game = started();
        game.world_mut().registry.for_each_mut(|e| {
            if e.kind == EntityKind::Collectible {
                e.body.position = PLAYER_START;
            }
        });
        game.update(FRAME, &InputState::default());
        game.update(FRAME, &InputState::default());
        assert_eq!(game.world().score, 3);
        assert_eq!(game.mode(), GameMode::Won);
    }

    #[test]
    fn test_falling_through_gap_loses() {
        let mut game = started();
        settle(&mut game);
        game.world_mut()
            .registry
            .find_tag_mut(EntityKind::Player, 0)
            .unwrap()
            .body
            .position
            .x = 3.3;
        for _ in 0..600 {
            game.update(FRAME, &InputState::default());
            if game.mode() == GameMode::Lost {
                break;
            }
        }
        assert_eq!(game.mode(), GameMode::Lost);
    }

    #[test]
    fn test_below_map_keeps_falling() {
        let mut game = started();
        settle(&mut game);
        // under the bottom row, feet clamped onto solid ground
        game.world_mut()
            .registry
            .find_tag_mut(EntityKind::Player, 0)
            .unwrap()
            .body
            .position = Vec2::new(3.36, -3.7);
        for _ in 0..600 {
            game.update(FRAME, &InputState::default());
            if game.mode() == GameMode::Lost {
                break;
            }
        }
        assert!(!player(game.world()).contacts.grounded);
        assert_eq!(game.mode(), GameMode::Lost);
    }

    #[test]
    fn test_run_clamped_to_field() {
        let mut game = started();
        settle(&mut game);
        game.world_mut()
            .registry
            .find_tag_mut(EntityKind::Player, 0)
            .unwrap()
            .body
            .position
            .x = MIN_X - 0.01;
        game.update(FRAME, &InputState::holding(&[Key::Left]));
        assert_eq!(player(game.world()).body.velocity.x, 0.0);
    }

    #[test]
    fn test_lethal_tile_loses() {
        let mut game = started();
        settle(&mut game);
        let grid = Platformer::grid_from_str("0 0\n9 9\n").unwrap();
        let world = game.world_mut();
        world.tiles = Some(grid);
        world.palette = TilePalette::from_pairs([(9, TileKind::Lethal)]);
        world.registry.find_tag_mut(EntityKind::Player, 0).unwrap().body.position = Vec2::new(0.1, -0.2);
        game.update(FRAME, &InputState::default());
        game.update(FRAME, &InputState::default());
        assert_eq!(game.mode(), GameMode::Lost);
    }
}
