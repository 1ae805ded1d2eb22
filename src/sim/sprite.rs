//! Sprite handles
//!
//! The core never sees pixels. A sprite is an opaque key the renderer maps to
//! an image, plus the nominal size the collision body is derived from. If the
//! renderer fails to load the image it draws a placeholder; the core keeps
//! using the nominal size.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sprite {
    Player,
    Slime,
    Crawler,
    Fencer,
    Archer,
    Knight,
    Spawner,
    Lazer,
    LazerCharging,
    Bomb,
    Obstacle,
    Arrow,
    Sword,
    Spear,
    Shield,
    Bow,
    Dagger,
    BombItem,
    SlimeKing,
    Juggernaut,
    Spark,
    Smoke,
    /// Invisible marker (area sentinels)
    Marker,
}

impl Sprite {
    /// Nominal (width, height) in world units
    pub fn size(self) -> Vec2 {
        match self {
            Sprite::Player => Vec2::new(32.0, 32.0),
            Sprite::Slime => Vec2::new(30.0, 24.0),
            Sprite::Crawler => Vec2::new(36.0, 20.0),
            Sprite::Fencer => Vec2::new(30.0, 34.0),
            Sprite::Archer => Vec2::new(28.0, 34.0),
            Sprite::Knight => Vec2::new(40.0, 42.0),
            Sprite::Spawner => Vec2::new(48.0, 48.0),
            Sprite::Lazer => Vec2::new(560.0, 8.0),
            Sprite::LazerCharging => Vec2::new(560.0, 2.0),
            Sprite::Bomb => Vec2::new(20.0, 20.0),
            Sprite::Obstacle => Vec2::new(64.0, 32.0),
            Sprite::Arrow => Vec2::new(24.0, 4.0),
            Sprite::Sword => Vec2::new(56.0, 8.0),
            Sprite::Spear => Vec2::new(80.0, 6.0),
            Sprite::Shield => Vec2::new(26.0, 26.0),
            Sprite::Bow => Vec2::new(30.0, 10.0),
            Sprite::Dagger => Vec2::new(22.0, 6.0),
            Sprite::BombItem => Vec2::new(18.0, 18.0),
            Sprite::SlimeKing => Vec2::new(110.0, 80.0),
            Sprite::Juggernaut => Vec2::new(96.0, 96.0),
            Sprite::Spark => Vec2::new(4.0, 4.0),
            Sprite::Smoke => Vec2::new(10.0, 10.0),
            Sprite::Marker => Vec2::ZERO,
        }
    }

    pub fn is_visible(self) -> bool {
        self != Sprite::Marker
    }
}
