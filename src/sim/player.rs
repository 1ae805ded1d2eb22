//! The player
//!
//! The player lives outside the board. Entities reach it through the tick
//! context; it reaches them through board queries.

use glam::Vec2;

use super::board::{Anchor, Board};
use super::body::Body;
use super::camera::Camera;
use super::entity::{Entity, EntityKind, HitOutcome, HitSource, Owner};
use super::glide::Glide;
use super::items::{HolderView, Inventory, ItemPos};
use super::sprite::Sprite;
use super::state::WorldState;
use crate::consts::*;
use crate::error::SimResult;
use crate::platform::{Key, SoundCue, Surface, TickInput};
use crate::sign;

/// (speed, duration, taper) of a dash
pub const DASH: (f32, u32, f32) = (18.0, 6, 2.0);
/// (speed, duration, taper) of the knockback from a hit
pub const PLAYER_KNOCKBACK: (f32, u32, f32) = (8.0, 3, 1.0);

/// Vertical range the player may occupy this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub floor: f32,
    pub ceiling: f32,
}

impl Bounds {
    pub const UNBOUNDED: Bounds = Bounds {
        floor: f32::NEG_INFINITY,
        ceiling: f32::INFINITY,
    };
}

#[derive(Debug, Clone)]
pub struct Player {
    pub body: Body,
    health: i32,
    pub flashing: u32,
    pub glide: Glide,
    pub hands: Inventory,
    /// +1 facing forward, -1 back
    pub facing: f32,
    /// Sign of the last vertical movement (camera bias)
    pub last_move: f32,
    pub dash_cooldown: u32,
    pub immune_collide_below: i32,
    pub collide_priority: i32,
    /// Furthest y reached this run
    pub distance_reached: f32,
    /// Index of the area the player is in
    pub area: usize,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        let pos = Vec2::new(0.0, PLAYER_START_Y);
        Self {
            body: Body::from_sprite(pos, Sprite::Player),
            health: PLAYER_MAX_HEALTH,
            flashing: 0,
            glide: Glide::default(),
            hands: Inventory::new(2),
            facing: 1.0,
            last_move: 1.0,
            dash_cooldown: 0,
            immune_collide_below: COLLIDE_MOVEMENT,
            collide_priority: COLLIDE_PLAYER,
            distance_reached: PLAYER_START_Y,
            area: 0,
        }
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        PLAYER_MAX_HEALTH
    }

    pub fn set_health(&mut self, health: i32) {
        self.health = health.clamp(0, PLAYER_MAX_HEALTH);
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn y(&self) -> f32 {
        self.body.y()
    }

    pub fn view(&self, hand: usize) -> HolderView {
        HolderView {
            owner: Owner::Player,
            pos: self.body.pos(),
            facing: self.facing,
            hand,
            area: self.area,
        }
    }

    /// Take a hit; raised shields facing the source block it
    pub fn hit(&mut self, damage: i32, source: HitSource, world: &mut WorldState) -> HitOutcome {
        if !self.is_alive() || self.flashing > 0 || damage <= 0 {
            return HitOutcome::Ignored;
        }
        if self.hands.blocks(&self.view(0), source.pos) {
            world.sound(SoundCue::Blocked);
            return HitOutcome::Blocked;
        }
        self.set_health(self.health - damage);
        self.flashing = PLAYER_FLASH_TICKS;
        world.sound(SoundCue::PlayerHit);
        world.start_shake(2.0, 12);
        log::debug!("player hit for {damage}, health {}", self.health);
        if !self.is_alive() {
            return HitOutcome::Killed;
        }
        let mut dir = sign(self.body.y() - source.pos.y);
        if dir == 0.0 {
            dir = -self.facing;
        }
        let (speed, duration, taper) = PLAYER_KNOCKBACK;
        self.glide.start(speed, duration, taper, dir);
        HitOutcome::Damaged
    }

    /// Advance one tick of movement, items and pickups
    ///
    /// Presses must already be recorded in `world.presses` for this tick.
    pub fn update(&mut self, input: &TickInput, bounds: Bounds, world: &mut WorldState, board: &mut Board) -> SimResult<()> {
        if !self.is_alive() {
            return Ok(());
        }
        self.flashing = self.flashing.saturating_sub(1);
        self.dash_cooldown = self.dash_cooldown.saturating_sub(1);

        if input.was_pressed(Key::Up)
            && self.dash_cooldown == 0
            && !self.glide.is_gliding()
            && world.presses.press_gap(Key::Up).is_some_and(|gap| gap <= DASH_WINDOW_TICKS)
        {
            let (speed, duration, taper) = DASH;
            self.glide.start(speed, duration, taper, 1.0);
            self.dash_cooldown = DASH_COOLDOWN_TICKS;
            log::debug!("player dash at tick {}", world.tick);
        }

        let start = self.body.pos();
        let vertical = if self.glide.is_gliding() {
            self.glide.step().displacement
        } else {
            input.vertical() * PLAYER_SPEED
        };
        let lateral = input.lateral() * PLAYER_LATERAL_SPEED;
        self.body.translate(Vec2::new(lateral, vertical));
        if input.vertical() != 0.0 {
            self.facing = input.vertical();
        }
        self.clamp(bounds);

        let moved = self.body.pos() - start;
        let anchor = Anchor::Probe(self.body.y());
        board.exclude_wall_safe(&mut self.body, self.collide_priority, anchor, moved, |e| e.is_solid(), |_| {});
        self.clamp(bounds);

        let moved = self.body.pos() - start;
        if moved.y != 0.0 {
            self.last_move = sign(moved.y);
        }
        self.distance_reached = self.distance_reached.max(self.body.y());

        if input.was_pressed(Key::Interact) {
            self.interact(world, board);
        }
        for key in &input.pressed {
            let Some(hand) = key.hand() else { continue };
            let view = self.view(hand);
            let aim = Vec2::new(0.0, self.facing);
            if let Some(spawned) = self.hands.use_hand(hand, &view, aim, world) {
                board.insert(spawned);
            }
        }
        let base = self.view(0);
        self.hands.tick(&base, board, None, world);
        Ok(())
    }

    fn clamp(&mut self, bounds: Bounds) {
        let y = self.body.y().clamp(bounds.floor, bounds.ceiling.max(bounds.floor));
        self.body.set_y(y);
        let limit = TRACK_HALF_WIDTH - self.body.half_width();
        self.body.set_x(self.body.x().clamp(-limit, limit));
    }

    /// Pick up the ground item underfoot, swapping out a held one if both hands are full
    pub fn interact(&mut self, world: &mut WorldState, board: &mut Board) {
        let found = board.colliding(&self.body, self.collide_priority, Anchor::Probe(self.body.y()), |e| {
            matches!(e.kind, EntityKind::Dropped(_))
        });
        let Some(ground) = found.first().and_then(|&i| board.get_mut(i)) else {
            return;
        };
        let EntityKind::Dropped(item) = &ground.kind else {
            return;
        };
        match item.pos {
            ItemPos::Ground(pos) => log::debug!("Picking up {} at {pos}", item.name()),
            ItemPos::Hand(_) | ItemPos::HeldBy(..) => {
                log::warn!("Dropped {} is not on the ground", item.name());
                return;
            }
        }
        let item = item.clone();
        let area = ground.actor.area;
        ground.actor.despawn();

        let hand = self.hands.first_empty().unwrap_or(0);
        let name = item.name();
        if let Some(previous) = self.hands.put(hand, item) {
            let mut dropped = Entity::dropped(self.body.pos(), previous);
            dropped.actor.area = area;
            board.insert(dropped);
        }
        world.sound(SoundCue::Pickup);
        world.announce(format!("Picked up a {name}"));
    }

    pub fn draw(&self, surface: &mut dyn Surface, camera: &Camera, shake: f32) {
        // Flicker while invulnerable
        if self.flashing % 4 < 2 {
            let rotation = if self.facing < 0.0 { 270.0 } else { 90.0 };
            surface.draw(Sprite::Player, camera.to_screen(self.body.pos(), shake), rotation);
        }
        self.hands.draw(&self.view(0), surface, camera, shake);
    }
}
