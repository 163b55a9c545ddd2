//! Headless platform
//!
//! Stand-ins for the real window/GPU/audio stack: a renderer that records
//! quads instead of drawing them, scripted input, a fixed-rate clock and a
//! silent audio player. Used by the native binary's demo run and by tests.
//!
//! Recorders share their logs through `Rc<RefCell<_>>` so the caller can
//! inspect them after handing the boxed services to the loop driver.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glam::Mat4;

use super::{
    AudioPlayer, ClockSource, FontHandle, InputSource, InputState, MusicHandle, PlatformServices,
    QuadInstance, Renderer, SoundHandle, TextRenderer, TextureHandle, UvRect, glyph_uv,
};
use crate::error::GameError;

/// Names resolved to handles, optionally checked against a directory
#[derive(Debug, Default)]
struct AssetTable {
    root: Option<PathBuf>,
    names: Vec<String>,
}

impl AssetTable {
    fn new(root: Option<&Path>) -> Self {
        Self {
            root: root.map(Path::to_path_buf),
            names: Vec::new(),
        }
    }

    fn resolve(&mut self, name: &str) -> Result<u32, GameError> {
        if let Some(root) = &self.root {
            if !root.join(name).is_file() {
                return Err(GameError::AssetMissing {
                    name: root.join(name).display().to_string(),
                });
            }
        }
        if let Some(idx) = self.names.iter().position(|n| n == name) {
            return Ok(idx as u32);
        }
        self.names.push(name.to_string());
        Ok(self.names.len() as u32 - 1)
    }
}

/// Everything drawn during the most recent frame
#[derive(Debug, Default)]
pub struct DrawLog {
    pub quads: Vec<(TextureHandle, QuadInstance)>,
    pub texts: Vec<String>,
    /// Glyph quads the text would have produced
    pub glyphs: usize,
    pub frames: u64,
}

impl DrawLog {
    pub fn has_text(&self, needle: &str) -> bool {
        self.texts.iter().any(|t| t.contains(needle))
    }
}

pub struct RecordingRenderer {
    assets: AssetTable,
    log: Rc<RefCell<DrawLog>>,
}

impl RecordingRenderer {
    pub fn new(asset_root: Option<&Path>, log: Rc<RefCell<DrawLog>>) -> Self {
        Self {
            assets: AssetTable::new(asset_root),
            log,
        }
    }
}

impl Renderer for RecordingRenderer {
    fn load_texture(&mut self, name: &str) -> Result<TextureHandle, GameError> {
        self.assets.resolve(name).map(TextureHandle)
    }

    fn begin_frame(&mut self) {
        let mut log = self.log.borrow_mut();
        log.quads.clear();
        log.texts.clear();
        log.glyphs = 0;
    }

    fn draw_quad(&mut self, texture: TextureHandle, model: Mat4, uv: UvRect) {
        self.log
            .borrow_mut()
            .quads
            .push((texture, QuadInstance::new(model, uv)));
    }

    fn present(&mut self) {
        let mut log = self.log.borrow_mut();
        log.frames += 1;
        log::trace!("Frame {}: {} quads", log.frames, log.quads.len());
    }
}

pub struct RecordingText {
    assets: AssetTable,
    log: Rc<RefCell<DrawLog>>,
}

impl RecordingText {
    pub fn new(asset_root: Option<&Path>, log: Rc<RefCell<DrawLog>>) -> Self {
        Self {
            assets: AssetTable::new(asset_root),
            log,
        }
    }
}

impl TextRenderer for RecordingText {
    fn load_font(&mut self, name: &str) -> Result<FontHandle, GameError> {
        self.assets.resolve(name).map(FontHandle)
    }

    fn draw_text(&mut self, _font: FontHandle, text: &str, _size: f32, _spacing: f32, _x: f32, _y: f32) {
        let mut log = self.log.borrow_mut();
        // one quad per glyph, whitespace included, like the atlas renderer
        log.glyphs += text.chars().map(glyph_uv).count();
        log.texts.push(text.to_string());
    }
}

/// What the silent player was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCall {
    Once(SoundHandle),
    Loop(MusicHandle),
    Pause,
    Resume,
}

pub struct SilentAudio {
    sounds: AssetTable,
    music: AssetTable,
    log: Rc<RefCell<Vec<AudioCall>>>,
}

impl SilentAudio {
    pub fn new(asset_root: Option<&Path>, log: Rc<RefCell<Vec<AudioCall>>>) -> Self {
        Self {
            sounds: AssetTable::new(asset_root),
            music: AssetTable::new(asset_root),
            log,
        }
    }
}

impl AudioPlayer for SilentAudio {
    fn load_sound(&mut self, name: &str) -> Result<SoundHandle, GameError> {
        self.sounds.resolve(name).map(SoundHandle)
    }

    fn load_music(&mut self, name: &str) -> Result<MusicHandle, GameError> {
        self.music.resolve(name).map(MusicHandle)
    }

    fn play_once(&mut self, sound: SoundHandle) {
        log::debug!("play {:?}", sound);
        self.log.borrow_mut().push(AudioCall::Once(sound));
    }

    fn play_loop(&mut self, music: MusicHandle) {
        self.log.borrow_mut().push(AudioCall::Loop(music));
    }

    fn pause(&mut self) {
        self.log.borrow_mut().push(AudioCall::Pause);
    }

    fn resume(&mut self) {
        self.log.borrow_mut().push(AudioCall::Resume);
    }
}

/// Clock that advances a fixed amount per poll
pub struct FixedClock {
    now: f64,
    frame: f64,
}

impl FixedClock {
    pub fn new(frame_seconds: f64) -> Self {
        Self {
            now: 0.0,
            frame: frame_seconds,
        }
    }
}

impl ClockSource for FixedClock {
    fn now_seconds(&mut self) -> f64 {
        let t = self.now;
        self.now += self.frame;
        t
    }
}

/// Replays a list of per-frame snapshots, then idles
pub struct ScriptedInput {
    frames: VecDeque<InputState>,
    close_after: Option<u64>,
    polled: u64,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputState>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            close_after: None,
            polled: 0,
        }
    }

    /// Request a close once this many frames have been polled
    pub fn close_after(mut self, frames: u64) -> Self {
        self.close_after = Some(frames);
        self
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> InputState {
        self.polled += 1;
        let mut state = self.frames.pop_front().unwrap_or_default();
        if self.close_after.is_some_and(|n| self.polled > n) {
            state.close_requested = true;
        }
        state
    }
}

/// Handles onto the recorders of a headless platform
#[derive(Clone, Default)]
pub struct HeadlessProbe {
    pub draws: Rc<RefCell<DrawLog>>,
    pub audio: Rc<RefCell<Vec<AudioCall>>>,
}

/// Assemble headless services plus a probe for inspecting them
pub fn headless_platform(
    asset_root: Option<&Path>,
    frame_seconds: f64,
    input: ScriptedInput,
) -> (PlatformServices, HeadlessProbe) {
    let probe = HeadlessProbe::default();
    let services = PlatformServices {
        renderer: Box::new(RecordingRenderer::new(asset_root, probe.draws.clone())),
        text: Box::new(RecordingText::new(asset_root, probe.draws.clone())),
        audio: Box::new(SilentAudio::new(asset_root, probe.audio.clone())),
        clock: Box::new(FixedClock::new(frame_seconds)),
        input: Box::new(input),
    };
    (services, probe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Key;

    #[test]
    fn test_asset_table_dedupes() {
        let mut table = AssetTable::new(None);
        assert_eq!(table.resolve("a.png").unwrap(), 0);
        assert_eq!(table.resolve("b.png").unwrap(), 1);
        assert_eq!(table.resolve("a.png").unwrap(), 0);
    }

    #[test]
    fn test_missing_asset_under_root() {
        let mut table = AssetTable::new(Some(Path::new("/definitely/not/here")));
        let err = table.resolve("plane.png").unwrap_err();
        assert!(matches!(err, GameError::AssetMissing { .. }));
    }

    #[test]
    fn test_scripted_input_then_close() {
        let mut input = ScriptedInput::new([InputState::holding(&[Key::Left])]).close_after(2);
        assert!(input.poll().held(Key::Left));
        let second = input.poll();
        assert!(!second.held(Key::Left) && !second.close_requested);
        assert!(input.poll().close_requested);
    }

    #[test]
    fn test_fixed_clock() {
        let mut clock = FixedClock::new(0.5);
        assert_eq!(clock.now_seconds(), 0.0);
        assert_eq!(clock.now_seconds(), 0.5);
    }

    #[test]
    fn test_text_counts_glyphs() {
        let log = Rc::new(RefCell::new(DrawLog::default()));
        let mut text = RecordingText::new(None, log.clone());
        text.draw_text(FontHandle(0), "Score: 10", 0.1, 0.0, 0.0, 0.0);
        assert_eq!(log.borrow().glyphs, 9);
        assert!(log.borrow().has_text("Score"));
    }
}
