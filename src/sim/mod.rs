//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (one stream per area plus one world stream)
//! - Stable iteration order (board sorted by y, then entity id)
//! - No rendering or platform dependencies beyond the collaborator traits

pub mod area;
pub mod board;
pub mod body;
pub mod bosses;
pub mod camera;
pub mod creatures;
pub mod entity;
pub mod generator;
pub mod glide;
pub mod holder;
pub mod items;
pub mod particle;
pub mod place;
pub mod player;
pub mod projectile;
pub mod spawner;
pub mod sprite;
pub mod state;
pub mod tick;

pub use area::{Area, AreaRng, AreaType, EntitySnapshot};
pub use board::{Anchor, Board};
pub use body::{Body, Rect};
pub use camera::{Camera, ScreenShake};
pub use entity::{Class, Entity, EntityId, EntityKind, HitOutcome, HitSource};
pub use generator::{AreaGenerator, AreaPipeline, AreaQueue};
pub use glide::Glide;
pub use items::{Inventory, Item, ItemKind};
pub use place::{Frame, GamePlace, HomePlace, Place, PlaceRunner, Transition};
pub use player::Player;
pub use sprite::Sprite;
pub use state::{GameEvent, WorldState};
pub use tick::{AreaSummary, GameBoard, TickReport};
