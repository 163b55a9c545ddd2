//! Frame loop driver
//!
//! One frame: poll input and time, run the mode transition pass, advance
//! the fixed-step clock, run that many simulation steps, draw, flush audio.
//! Everything is owned here; the platform is only reached through the
//! injected [`PlatformServices`].

use crate::error::GameError;
use crate::games::GameRules;
use crate::platform::{InputState, PlatformServices, model_matrix};
use crate::sanitize_delta;
use crate::settings::Settings;
use crate::sim::{AudioEvent, GameMode, ModeMachine, Outcome, SimulationClock, Transition, World};

/// Whether the loop should keep going after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Quit,
}

/// Game instance holding all state
pub struct GameLoop {
    rules: Box<dyn GameRules>,
    world: World,
    modes: ModeMachine,
    clock: SimulationClock,
    platform: PlatformServices,
    settings: Settings,
    /// Input not yet seen by a step; presses survive zero-step frames
    input: InputState,
    last_time: Option<f64>,
}

impl GameLoop {
    /// Load assets, build the world and start the music
    pub fn new(
        mut rules: Box<dyn GameRules>,
        settings: Settings,
        mut platform: PlatformServices,
    ) -> Result<Self, GameError> {
        let mut world = World::new(settings.seed);
        rules.load_assets(&mut platform, &mut world, &settings)?;
        rules.populate(&mut world);

        let clock = SimulationClock::new(settings.sim.step_size, settings.sim.max_steps_per_frame);
        if settings.audio.music && !settings.audio.muted {
            if let Some(music) = rules.music() {
                world.queue_audio(AudioEvent::Loop(music));
            }
        }
        log::info!(
            "{} ready: {} entities, seed {:#x}",
            rules.name(),
            world.registry.len(),
            settings.seed
        );

        let mut game = Self {
            rules,
            world,
            modes: ModeMachine::new(),
            clock,
            platform,
            settings,
            input: InputState::default(),
            last_time: None,
        };
        game.flush_audio();
        Ok(game)
    }

    pub fn mode(&self) -> GameMode {
        self.modes.mode()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Simulation half of a frame: transitions, then fixed steps
    pub fn update(&mut self, frame_delta: f32, input: &InputState) -> FrameOutcome {
        self.input.merge(input);
        if self.input.close_requested {
            log::info!("Close requested");
            return FrameOutcome::Quit;
        }

        let transition = self.modes.evaluate(&self.input.mode_input());
        match transition {
            Transition::Quit => return FrameOutcome::Quit,
            Transition::Restart => self.restart(),
            _ => {}
        }
        if transition != Transition::Stay {
            self.rules.on_transition(&mut self.world, transition);
        }

        let dt = sanitize_delta(frame_delta).min(self.settings.sim.max_frame_delta);
        let steps = self.clock.advance(dt);
        for _ in 0..steps {
            let outcome = self.step();
            // Clear one-shot inputs after the first step sees them
            self.input.consume_presses();
            if let Some(outcome) = outcome {
                log::debug!("{:?} latched after {:.2}s", outcome, self.world.time);
                break;
            }
        }

        self.flush_audio();
        FrameOutcome::Continue
    }

    /// One fixed step; returns the outcome it latched, if any
    fn step(&mut self) -> Option<Outcome> {
        let mode = self.modes.mode();
        let dt = self.clock.step_size();
        self.world.ticks += 1;
        self.world.uptime += dt;

        let playing = mode == GameMode::Playing;
        if playing {
            self.rules.control(&mut self.world, &self.input, dt);
            self.rules.before_step(&mut self.world, dt);
        }

        let rules = &self.rules;
        self.world.integrate(dt, mode, |kind| rules.damping(kind));

        let mut outcome = None;
        if playing {
            if self.world.resolve_terrain(mode) {
                outcome = Some(Outcome::Lost);
            }
            let contact = self.rules.resolve(&mut self.world, dt);
            outcome = outcome.or(contact);
        }

        let rules = &self.rules;
        let despawned = self
            .world
            .registry
            .prune(|e| if mode.simulates(e.kind) { rules.expiry(e) } else { None });
        for gone in &despawned {
            self.world.score += self.rules.score(gone);
        }

        if !playing {
            return None;
        }
        self.world.time += dt;
        let outcome = outcome.or_else(|| self.rules.outcome(&self.world))?;
        self.modes.latch(outcome);
        Some(outcome)
    }

    /// Back to a fresh round with the same seed and assets
    fn restart(&mut self) {
        self.world.reset();
        self.rules.populate(&mut self.world);
        self.clock.reset();
        self.input.consume_presses();
        log::info!("{} restarted", self.rules.name());
    }

    fn flush_audio(&mut self) {
        let events = self.world.drain_audio();
        if self.settings.audio.muted {
            return;
        }
        let audio = self.platform.audio.as_mut();
        for event in events {
            match event {
                AudioEvent::Play(sound) => audio.play_once(sound),
                AudioEvent::Loop(music) => audio.play_loop(music),
                AudioEvent::PauseMusic => audio.pause(),
                AudioEvent::ResumeMusic => audio.resume(),
            }
        }
    }

    /// Render the current frame
    pub fn draw(&mut self) {
        let mode = self.modes.mode();
        let renderer = self.platform.renderer.as_mut();
        renderer.begin_frame();
        self.rules.draw_background(&self.world, renderer);
        for entity in self.world.registry.iter() {
            if !entity.alive || !entity.kind.capabilities().drawable {
                continue;
            }
            let sprite = &entity.sprite;
            renderer.draw_quad(
                sprite.texture,
                model_matrix(entity.position(), sprite.scale, 0.0),
                sprite.uv,
            );
        }
        self.rules
            .draw_hud(&self.world, mode, renderer, self.platform.text.as_mut());
        renderer.present();
    }

    /// Poll the platform, simulate and draw one frame
    pub fn frame(&mut self) -> FrameOutcome {
        let now = self.platform.clock.now_seconds();
        let delta = self.last_time.map_or(0.0, |last| (now - last) as f32);
        self.last_time = Some(now);

        let input = self.platform.input.poll();
        let outcome = self.update(delta, &input);
        if outcome == FrameOutcome::Continue {
            self.draw();
        }
        outcome
    }

    /// Run frames until quit; returns the process exit code
    pub fn run(&mut self) -> i32 {
        let mut frames: u64 = 0;
        while self.frame() == FrameOutcome::Continue {
            frames += 1;
        }
        log::info!(
            "{} finished after {} frames, score {}",
            self.rules.name(),
            frames,
            self.world.score
        );
        0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::games::GameVariant;
    use crate::platform::Key;
    use crate::platform::headless::{AudioCall, HeadlessProbe, ScriptedInput, headless_platform};
    use crate::sim::EntityKind;

    const FRAME: f32 = 1.0 / 60.0;

    /// A loop over the headless platform with no scripted input
    pub(crate) fn headless_loop(variant: GameVariant) -> (GameLoop, HeadlessProbe) {
        let (platform, probe) = headless_platform(None, f64::from(FRAME), ScriptedInput::new([]));
        let game = GameLoop::new(variant.rules(), Settings::for_variant(variant), platform).unwrap();
        (game, probe)
    }

    #[test]
    fn test_starts_on_title_with_music() {
        let (game, probe) = headless_loop(GameVariant::Glider);
        assert_eq!(game.mode(), GameMode::Title);
        assert!(matches!(probe.audio.borrow().first(), Some(AudioCall::Loop(_))));
    }

    #[test]
    fn test_title_is_frozen_until_directional_input() {
        let (mut game, _probe) = headless_loop(GameVariant::Invaders);
        let before: Vec<_> = game.world().registry.iter().map(|e| e.position()).collect();
        for _ in 0..10 {
            game.update(FRAME, &InputState::pressing(&[Key::Action]));
        }
        assert_eq!(game.mode(), GameMode::Title);
        let after: Vec<_> = game.world().registry.iter().map(|e| e.position()).collect();
        assert_eq!(before, after);
        assert_eq!(game.world().registry.count(EntityKind::Projectile), 0);

        game.update(FRAME, &InputState::holding(&[Key::Right]));
        assert_eq!(game.mode(), GameMode::Playing);
    }

    #[test]
    fn test_quit_from_title_and_close_request() {
        let (mut game, _probe) = headless_loop(GameVariant::Pong);
        assert_eq!(game.update(FRAME, &InputState::pressing(&[Key::Quit])), FrameOutcome::Quit);

        let (mut game, _probe) = headless_loop(GameVariant::Pong);
        let close = InputState {
            close_requested: true,
            ..Default::default()
        };
        assert_eq!(game.update(FRAME, &close), FrameOutcome::Quit);
    }

    #[test]
    fn test_quit_ignored_while_playing() {
        let (mut game, _probe) = headless_loop(GameVariant::Pong);
        game.update(FRAME, &InputState::pressing(&[Key::Left]));
        assert_eq!(game.update(FRAME, &InputState::pressing(&[Key::Quit])), FrameOutcome::Continue);
        assert_eq!(game.mode(), GameMode::Playing);
    }

    #[test]
    fn test_long_frame_is_capped() {
        let (mut game, _probe) = headless_loop(GameVariant::Pong);
        game.update(FRAME, &InputState::pressing(&[Key::Left]));
        let ticks = game.world().ticks;
        game.update(5.0, &InputState::default());
        let taken = game.world().ticks - ticks;
        assert_eq!(taken, u64::from(game.settings().sim.max_steps_per_frame));
        assert!(game.clock().accumulator() < game.clock().step_size());
    }

    #[test]
    fn test_bad_deltas_take_no_steps() {
        let (mut game, _probe) = headless_loop(GameVariant::Pong);
        for dt in [f32::NAN, -1.0, f32::INFINITY, 0.0] {
            game.update(dt, &InputState::default());
        }
        assert_eq!(game.world().ticks, 0);
    }

    #[test]
    fn test_restart_matches_fresh_start() {
        let (fresh, _) = headless_loop(GameVariant::Invaders);
        let (mut game, _probe) = headless_loop(GameVariant::Invaders);
        game.update(FRAME, &InputState::pressing(&[Key::Left]));

        // shoot one invader down, then let one land
        let target = game
            .world()
            .registry
            .iter()
            .find(|e| e.kind == EntityKind::Obstacle)
            .unwrap()
            .id;
        game.world_mut().registry.mark(target, crate::sim::DespawnReason::Destroyed);
        game.update(FRAME, &InputState::default());
        assert_eq!(game.world().score, 10);
        game.world_mut()
            .registry
            .iter_mut()
            .find(|e| e.kind == EntityKind::Obstacle)
            .unwrap()
            .body
            .position
            .y = -1.0;
        game.update(FRAME, &InputState::default());
        game.update(FRAME, &InputState::default());
        assert_eq!(game.mode(), GameMode::Lost);

        // restart, but take no step so the world is exactly as populated
        game.update(0.0, &InputState::pressing(&[Key::Restart]));
        assert_eq!(game.mode(), GameMode::Playing);
        assert_eq!(game.world().score, 0);
        assert_eq!(game.world().time, 0.0);
        let fresh_entities: Vec<_> = fresh.world().registry.iter().cloned().collect();
        let entities: Vec<_> = game.world().registry.iter().cloned().collect();
        assert_eq!(entities, fresh_entities);
        assert_eq!(game.clock().accumulator(), 0.0);
    }

    #[test]
    fn test_frame_draws_entities_and_hud() {
        let (platform, probe) = headless_platform(
            None,
            f64::from(FRAME),
            ScriptedInput::new([InputState::default(), InputState::holding(&[Key::Right])]),
        );
        let mut game =
            GameLoop::new(GameVariant::Glider.rules(), Settings::for_variant(GameVariant::Glider), platform)
                .unwrap();
        assert_eq!(game.frame(), FrameOutcome::Continue);
        assert!(probe.draws.borrow().has_text("Glider"));
        assert_eq!(game.frame(), FrameOutcome::Continue);
        assert_eq!(game.mode(), GameMode::Playing);

        let draws = probe.draws.borrow();
        assert_eq!(draws.frames, 2);
        assert!(draws.has_text("Score: 0"));
        // two clouds, the plane and the first crate
        assert_eq!(draws.quads.len(), 4);
    }

    #[test]
    fn test_run_until_scripted_close() {
        let (platform, probe) = headless_platform(
            None,
            f64::from(FRAME),
            ScriptedInput::new([InputState::holding(&[Key::Up])]).close_after(30),
        );
        let mut game = GameLoop::new(
            GameVariant::Platformer.rules(),
            Settings::for_variant(GameVariant::Platformer),
            platform,
        )
        .unwrap();
        assert_eq!(game.run(), 0);
        assert_eq!(probe.draws.borrow().frames, 30);
        assert_eq!(game.mode(), GameMode::Playing);
    }

    #[test]
    fn test_muted_audio_is_dropped() {
        let (platform, probe) = headless_platform(None, f64::from(FRAME), ScriptedInput::new([]));
        let mut settings = Settings::for_variant(GameVariant::Glider);
        settings.audio.muted = true;
        let mut game = GameLoop::new(GameVariant::Glider.rules(), settings, platform).unwrap();
        game.world_mut().play(crate::platform::SoundHandle(0));
        game.update(FRAME, &InputState::default());
        assert!(probe.audio.borrow().is_empty());
    }

    #[test]
    fn test_missing_assets_are_fatal() {
        let (platform, _probe) = headless_platform(
            Some(std::path::Path::new("/no/such/assets")),
            f64::from(FRAME),
            ScriptedInput::new([]),
        );
        let err = GameLoop::new(GameVariant::Glider.rules(), Settings::default(), platform)
            .err()
            .unwrap();
        assert!(err.is_fatal());
    }
}
