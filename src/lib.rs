//! Skyclimb - simulation core of a vertically scrolling action game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collision, areas, camera, scheduler)
//! - `platform`: Collaborator contracts (drawing surface, announcer, input snapshot)
//! - `persistence`: Append-only run log records
//! - `settings`: Data-driven configuration
//! - `ui`: Small input-driven widgets (seed entry)

pub mod error;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod ui;

pub use error::{SimError, SimResult};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate (ticks per second)
    pub const TICK_RATE: u32 = 60;

    /// Half width of the playable track (x runs from -HALF to +HALF)
    pub const TRACK_HALF_WIDTH: f32 = 280.0;

    /// Player start distance
    pub const PLAYER_START_Y: f32 = 150.0;
    /// Forward/backward speed per tick
    pub const PLAYER_SPEED: f32 = 10.0;
    /// Lateral speed per tick
    pub const PLAYER_LATERAL_SPEED: f32 = 6.0;
    pub const PLAYER_MAX_HEALTH: i32 = 20;
    /// Ticks of hit immunity after the player is struck
    pub const PLAYER_FLASH_TICKS: u32 = 40;

    /// Two Up presses within this many ticks start a dash
    pub const DASH_WINDOW_TICKS: u64 = 15;
    pub const DASH_COOLDOWN_TICKS: u32 = 45;

    /// Ticks an entity flashes (and ignores hits) after being struck
    pub const ENTITY_FLASH_TICKS: u32 = 12;

    /// Collision priorities (see `sim::board`)
    pub const COLLIDE_MOVEMENT: i32 = 0;
    pub const COLLIDE_PLAYER: i32 = 1;
    pub const COLLIDE_ATTACK: i32 = 2;
    pub const COLLIDE_NEVER: i32 = i32::MAX;

    /// Number of area type selection buckets
    pub const AREA_TYPE_BUCKETS: u64 = 64;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(degrees: f32) -> f32 {
    let d = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if d >= 360.0 { 0.0 } else { d }
}

/// Rotate a vector counter-clockwise by `degrees`
#[inline]
pub fn rotate_vec(v: Vec2, degrees: f32) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Unit vector pointing at `degrees` (0 = +x, 90 = +y)
#[inline]
pub fn heading(degrees: f32) -> Vec2 {
    rotate_vec(Vec2::X, degrees)
}

/// Sign helper that maps 0 to 0 (unlike `f32::signum`)
#[inline]
pub fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}
