//! Platform abstraction layer
//!
//! The simulation never touches a window, GPU, sound device or keyboard
//! directly. It talks to these collaborators through the traits below,
//! bundled in a [`PlatformServices`] handle that is injected into the loop
//! driver at construction.
//!
//! - Rendering: one textured unit quad per call, plus bitmap text
//! - Time: monotonic seconds since start
//! - Input: held keys plus edge-triggered presses
//! - Audio: fire-and-forget one-shots and a looping music track

pub mod headless;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::sim::mode::ModeInput;

/// Renderer-owned texture id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// Text atlas id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FontHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SoundHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MusicHandle(pub u32);

/// Texture sub-rectangle in normalized coordinates (origin top-left)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvRect {
    pub u: f32,
    pub v: f32,
    pub width: f32,
    pub height: f32,
}

impl UvRect {
    pub const FULL: UvRect = UvRect {
        u: 0.0,
        v: 0.0,
        width: 1.0,
        height: 1.0,
    };

    pub const fn new(u: f32, v: f32, width: f32, height: f32) -> Self {
        Self { u, v, width, height }
    }

    /// Cell `index` of a uniform sprite sheet, counted row by row
    pub fn from_sheet(index: u32, columns: u32, rows: u32) -> Self {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let width = 1.0 / columns as f32;
        let height = 1.0 / rows as f32;
        Self {
            u: (index % columns) as f32 * width,
            v: (index / columns) as f32 * height,
            width,
            height,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.u, self.v, self.width, self.height]
    }
}

/// Glyph cell for a character in a 16x16 bitmap font atlas (glyph = char code)
pub fn glyph_uv(ch: char) -> UvRect {
    let code = ch as u32;
    // anything outside the atlas renders as '?'
    let code = if code < 256 { code } else { '?' as u32 };
    UvRect::from_sheet(code, 16, 16)
}

/// Model matrix for a unit quad centred at the origin
pub fn model_matrix(position: Vec2, scale: Vec2, rotation: f32) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::new(scale.x, scale.y, 1.0),
        Quat::from_rotation_z(rotation),
        Vec3::new(position.x, position.y, 0.0),
    )
}

/// One quad draw packed for GPU instancing
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadInstance {
    pub model: [[f32; 4]; 4],
    pub uv: [f32; 4],
}

impl QuadInstance {
    pub fn new(model: Mat4, uv: UvRect) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            uv: uv.to_array(),
        }
    }

    /// World-space centre encoded in the model matrix
    pub fn translation(&self) -> Vec2 {
        Vec2::new(self.model[3][0], self.model[3][1])
    }
}

/// Draws textured quads
pub trait Renderer {
    /// Resolve a texture once at startup
    fn load_texture(&mut self, name: &str) -> Result<TextureHandle, GameError>;
    fn begin_frame(&mut self) {}
    fn draw_quad(&mut self, texture: TextureHandle, model: Mat4, uv: UvRect);
    fn present(&mut self) {}
}

/// Draws strings from a fixed-width glyph atlas
pub trait TextRenderer {
    fn load_font(&mut self, name: &str) -> Result<FontHandle, GameError>;
    fn draw_text(&mut self, font: FontHandle, text: &str, size: f32, spacing: f32, x: f32, y: f32);
}

/// Fire-and-forget audio
pub trait AudioPlayer {
    fn load_sound(&mut self, name: &str) -> Result<SoundHandle, GameError>;
    fn load_music(&mut self, name: &str) -> Result<MusicHandle, GameError>;
    fn play_once(&mut self, sound: SoundHandle);
    fn play_loop(&mut self, music: MusicHandle);
    fn pause(&mut self);
    fn resume(&mut self);
}

/// Monotonic time source
pub trait ClockSource {
    /// Seconds since start; polled once per frame
    fn now_seconds(&mut self) -> f64;
}

/// Keyboard-like input source
pub trait InputSource {
    /// Snapshot for this frame
    fn poll(&mut self) -> InputState;
}

/// The fixed key set the games understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    /// Second player's up (W)
    AltUp,
    /// Second player's down (S)
    AltDown,
    /// Jump / shoot
    Action,
    Restart,
    Quit,
}

impl Key {
    pub const ALL: [Key; 9] = [
        Key::Left,
        Key::Right,
        Key::Up,
        Key::Down,
        Key::AltUp,
        Key::AltDown,
        Key::Action,
        Key::Restart,
        Key::Quit,
    ];

    #[inline]
    fn bit(self) -> u16 {
        1 << (self as u8)
    }

    pub fn is_directional(self) -> bool {
        matches!(
            self,
            Key::Left | Key::Right | Key::Up | Key::Down | Key::AltUp | Key::AltDown
        )
    }
}

/// Small bitset of keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeySet(u16);

impl KeySet {
    pub fn insert(&mut self, key: Key) {
        self.0 |= key.bit();
    }

    pub fn contains(&self, key: Key) -> bool {
        self.0 & key.bit() != 0
    }

    pub fn union(self, other: KeySet) -> KeySet {
        KeySet(self.0 | other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = Key> {
        Key::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl FromIterator<Key> for KeySet {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        let mut set = KeySet::default();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

/// Input for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    /// Keys currently down
    pub held: KeySet,
    /// Keys that went down since the previous poll
    pub pressed: KeySet,
    /// Window close / OS quit request
    pub close_requested: bool,
}

impl InputState {
    /// Keys held this frame (a press implies held)
    pub fn holding(keys: &[Key]) -> Self {
        let held: KeySet = keys.iter().copied().collect();
        Self {
            held,
            ..Default::default()
        }
    }

    /// Keys pressed (and held) this frame
    pub fn pressing(keys: &[Key]) -> Self {
        let set: KeySet = keys.iter().copied().collect();
        Self {
            held: set,
            pressed: set,
            close_requested: false,
        }
    }

    pub fn held(&self, key: Key) -> bool {
        self.held.contains(key)
    }

    pub fn pressed(&self, key: Key) -> bool {
        self.pressed.contains(key)
    }

    /// Fold a newer snapshot in, keeping unconsumed presses
    pub fn merge(&mut self, newer: &InputState) {
        self.held = newer.held;
        self.pressed = self.pressed.union(newer.pressed);
        self.close_requested |= newer.close_requested;
    }

    /// Forget one-shot presses once a step has seen them
    pub fn consume_presses(&mut self) {
        self.pressed = KeySet::default();
    }

    /// -1, 0 or 1 along an axis given its negative/positive keys
    pub fn axis(&self, negative: Key, positive: Key) -> f32 {
        match (self.held(negative), self.held(positive)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    pub fn mode_input(&self) -> ModeInput {
        ModeInput {
            directional: self
                .held
                .union(self.pressed)
                .iter()
                .any(Key::is_directional),
            restart: self.pressed(Key::Restart),
            quit: self.pressed(Key::Quit),
        }
    }
}

/// Injected handle bundling every platform collaborator
pub struct PlatformServices {
    pub renderer: Box<dyn Renderer>,
    pub text: Box<dyn TextRenderer>,
    pub audio: Box<dyn AudioPlayer>,
    pub clock: Box<dyn ClockSource>,
    pub input: Box<dyn InputSource>,
}
