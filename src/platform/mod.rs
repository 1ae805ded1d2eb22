//! Platform abstraction layer
//!
//! The simulation core only talks to the outside world through these
//! contracts:
//! - a drawing surface (`Surface`)
//! - a fire-and-forget announcer for text and sounds (`Announcer`)
//! - a per-tick input snapshot (`TickInput`)

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::sprite::Sprite;

/// Something the core can draw sprites onto
pub trait Surface {
    /// Draw `sprite` centred at `screen_pos`, rotated by `rotation` degrees
    fn draw(&mut self, sprite: Sprite, screen_pos: Vec2, rotation: f32);
}

/// Surface that discards everything (headless runs)
#[derive(Debug, Default)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn draw(&mut self, _sprite: Sprite, _screen_pos: Vec2, _rotation: f32) {}
}

/// Surface that records draw calls, handy for tests and debugging
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<(Sprite, Vec2, f32)>,
}

impl Surface for RecordingSurface {
    fn draw(&mut self, sprite: Sprite, screen_pos: Vec2, rotation: f32) {
        self.calls.push((sprite, screen_pos, rotation));
    }
}

/// Sound cues the core can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    PlayerHit,
    EnemyHit,
    EnemyDeath,
    Blocked,
    Swing,
    Shoot,
    Explosion,
    Spawn,
    Pickup,
    BossDefeated,
    Alert,
}

/// Text-to-speech / sound collaborator
pub trait Announcer {
    fn announce(&mut self, text: &str);
    fn play(&mut self, cue: SoundCue);
}

/// Announcer that writes everything to the log
#[derive(Debug, Default)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&mut self, text: &str) {
        log::info!("[announce] {text}");
    }

    fn play(&mut self, cue: SoundCue) {
        log::debug!("[sound] {cue:?}");
    }
}

/// Announcer that keeps what it was told (tests)
#[derive(Debug, Default)]
pub struct RecordingAnnouncer {
    pub lines: Vec<String>,
    pub sounds: Vec<SoundCue>,
}

impl Announcer for RecordingAnnouncer {
    fn announce(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }

    fn play(&mut self, cue: SoundCue) {
        self.sounds.push(cue);
    }
}

/// Discrete keys the core understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    /// Use the item in the left hand
    LeftHand,
    /// Use the item in the right hand
    RightHand,
    /// Pick up / swap ground items
    Interact,
    /// Confirm (menus, text entry)
    Confirm,
    /// Back out (menus, text entry)
    Cancel,
    Backspace,
}

impl Key {
    pub const COUNT: usize = 10;

    pub fn index(self) -> usize {
        self as usize
    }

    /// Hand index bound to this key, if any
    pub fn hand(self) -> Option<usize> {
        match self {
            Key::LeftHand => Some(0),
            Key::RightHand => Some(1),
            _ => None,
        }
    }
}

/// Input commands for a single tick (deterministic)
///
/// `held` reflects keys down during this tick; `pressed` lists keys that
/// went down since the previous tick. Press times are stamped with the
/// simulation tick, never wall-clock time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickInput {
    held: [bool; Key::COUNT],
    pub pressed: Vec<Key>,
    /// Characters typed this tick (text entry)
    pub typed: Vec<char>,
}

impl TickInput {
    pub fn holding(keys: &[Key]) -> Self {
        let mut input = Self::default();
        for &key in keys {
            input.set_held(key, true);
        }
        input
    }

    pub fn with_press(mut self, key: Key) -> Self {
        self.pressed.push(key);
        self.set_held(key, true);
        self
    }

    /// Add typed characters (text entry)
    pub fn with_typed(mut self, text: &str) -> Self {
        self.typed.extend(text.chars());
        self
    }

    pub fn set_held(&mut self, key: Key, held: bool) {
        self.held[key.index()] = held;
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held[key.index()]
    }

    pub fn was_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    /// Vertical intent: +1 forward, -1 back, 0 none
    pub fn vertical(&self) -> f32 {
        (self.is_held(Key::Up) as i32 - self.is_held(Key::Down) as i32) as f32
    }

    /// Lateral intent: +1 right, -1 left, 0 none
    pub fn lateral(&self) -> f32 {
        (self.is_held(Key::Right) as i32 - self.is_held(Key::Left) as i32) as f32
    }
}

/// Tick-stamped record of the most recent presses per key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PressHistory {
    last: [Option<u64>; Key::COUNT],
    previous: [Option<u64>; Key::COUNT],
}

impl PressHistory {
    /// Stamp every press in `input` with `tick`
    pub fn record(&mut self, input: &TickInput, tick: u64) {
        for &key in &input.pressed {
            let i = key.index();
            self.previous[i] = self.last[i];
            self.last[i] = Some(tick);
        }
    }

    pub fn last_press(&self, key: Key) -> Option<u64> {
        self.last[key.index()]
    }

    /// Ticks between the two most recent presses of `key`
    pub fn press_gap(&self, key: Key) -> Option<u64> {
        let i = key.index();
        match (self.previous[i], self.last[i]) {
            (Some(a), Some(b)) => Some(b - a),
            _ => None,
        }
    }
}
