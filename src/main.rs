//! Arcade Kit native entry point
//!
//! Runs one game on the headless platform with a scripted demo input and
//! logs what happened. Usage: `arcade-kit [glider|pong|invaders|platformer] [settings.json]`

use std::path::PathBuf;

use arcade_kit::platform::headless::{ScriptedInput, headless_platform};
use arcade_kit::platform::{InputState, Key, KeySet};
use arcade_kit::settings::SETTINGS_FILE;
use arcade_kit::{GameLoop, GameVariant, Settings};

/// Frames each demo direction is held for
const DEMO_SWING: u64 = 45;
/// Frames between demo Action presses
const DEMO_FIRE: u64 = 40;

/// Deterministic input that wanders left and right and presses Action now and then
fn demo_script(variant: GameVariant, frames: u64) -> Vec<InputState> {
    let (a, b) = match variant {
        GameVariant::Pong => ([Key::Up, Key::AltDown], [Key::Down, Key::AltUp]),
        _ => ([Key::Left, Key::Left], [Key::Right, Key::Right]),
    };
    (0..frames)
        .map(|i| {
            let keys = if (i / DEMO_SWING) % 2 == 0 { a } else { b };
            let held: KeySet = keys.into_iter().collect();
            let mut state = InputState {
                held,
                pressed: if i == 0 { held } else { KeySet::default() },
                close_requested: false,
            };
            if i % DEMO_FIRE == DEMO_FIRE - 1 {
                state.held.insert(Key::Action);
                state.pressed.insert(Key::Action);
            }
            state
        })
        .collect()
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let variant_arg = args.next();
    let settings_path = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));

    let mut settings = Settings::load_or_default(&settings_path);
    if let Some(name) = variant_arg {
        match GameVariant::from_str(&name) {
            Some(variant) => settings.variant = variant,
            None => log::warn!("Unknown game '{name}', running {}", settings.variant.as_str()),
        }
    }
    log::info!("Arcade Kit (headless) starting {}", settings.variant.as_str());

    let frames = settings.headless_frames;
    let input = ScriptedInput::new(demo_script(settings.variant, frames)).close_after(frames);
    let frame_seconds = f64::from(settings.sim.step_size);
    let (platform, probe) = headless_platform(settings.assets.root.as_deref(), frame_seconds, input);

    let mut game = match GameLoop::new(settings.variant.rules(), settings, platform) {
        Ok(game) => game,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    let code = game.run();

    log::info!(
        "Final mode {:?}, score {}, {} quads last frame, {} audio calls",
        game.mode(),
        game.world().score,
        probe.draws.borrow().quads.len(),
        probe.audio.borrow().len()
    );
    std::process::exit(code);
}
