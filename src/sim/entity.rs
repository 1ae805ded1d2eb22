//! Entities: the simulatable units of the world
//!
//! An `Entity` is an `Actor` (body, health, flashing, board position,
//! optional glide/hands components, wrapper chain) plus an `EntityKind`
//! carrying the per-type behaviour state. Behaviour is selected by matching on
//! the kind and by which components the actor carries.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::board::{Anchor, OrderCursor};
use super::body::Body;
use super::bosses::{self, Boss};
use super::camera::Camera;
use super::creatures::{self, Archer, Bomb, Crawler, Fencer, Knight, Lazer, Slime};
use super::glide::{Glide, GlideStep};
use super::holder::{HolderLayer, WrapperComponent};
use super::items::{HolderView, Inventory, Item, ItemPos};
use super::projectile::{self, Projectile};
use super::spawner::Spawner;
use super::sprite::Sprite;
use super::state::{TickCtx, WorldState};
use crate::consts::*;
use crate::error::SimResult;
use crate::platform::{SoundCue, Surface};
use crate::sign;

/// Stable identity of an entity on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Placeholder until the board assigns a real id
    pub const UNASSIGNED: EntityId = EntityId(0);

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

/// Entity type, used for class-level bookkeeping (tutorials, gating, registry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Class {
    AreaStarter,
    AreaStopper,
    Slime,
    Crawler,
    Fencer,
    Archer,
    Knight,
    Spawner,
    Lazer,
    Bomb,
    Obstacle,
    Projectile,
    DroppedItem,
    SlimeKing,
    Juggernaut,
}

impl Class {
    pub fn name(self) -> &'static str {
        match self {
            Class::AreaStarter => "area starter",
            Class::AreaStopper => "area stopper",
            Class::Slime => "slime",
            Class::Crawler => "crawler",
            Class::Fencer => "fencer",
            Class::Archer => "archer",
            Class::Knight => "knight",
            Class::Spawner => "spawner",
            Class::Lazer => "lazer",
            Class::Bomb => "bomb",
            Class::Obstacle => "obstacle",
            Class::Projectile => "projectile",
            Class::DroppedItem => "item",
            Class::SlimeKing => "slime king",
            Class::Juggernaut => "juggernaut",
        }
    }

    /// Earliest area index this class may be generated in
    pub fn min_area(self) -> usize {
        match self {
            Class::Slime => 1,
            Class::Crawler | Class::Obstacle => 3,
            Class::Fencer | Class::Spawner => 4,
            Class::Archer | Class::Bomb => 5,
            Class::Lazer => 6,
            Class::Knight => 7,
            Class::SlimeKing | Class::Juggernaut => 10,
            Class::AreaStarter | Class::AreaStopper | Class::Projectile | Class::DroppedItem => 0,
        }
    }

    /// Classes whose live instances are kept in the registry for AI queries
    pub fn tracks_instances(self) -> bool {
        matches!(self, Class::Slime | Class::Archer | Class::Spawner)
    }

    /// Shown once, the first time the class becomes visible
    pub fn tutorial(self) -> Option<&'static str> {
        match self {
            Class::Slime => Some("A slime. Get close and press a hand key to swing at it."),
            Class::Crawler => Some("Crawlers scuttle side to side. Time your approach."),
            Class::Fencer => Some("Fencers swing swords. Back off when they wind up."),
            Class::Archer => Some("Archers shoot from range. Close the distance or raise a shield."),
            Class::Knight => Some("Knights block attacks from the front while their shield is up."),
            Class::Spawner => Some("Spawners keep producing enemies. Break them to move on."),
            Class::Lazer => Some("Lazers charge before they fire. Stay out of the beam."),
            Class::Bomb => Some("Bombs explode after a short fuse. Keep your distance."),
            Class::DroppedItem => Some("An item. Stand on it and press interact to pick it up."),
            Class::SlimeKing => Some("The Slime King! Dodge its leaps."),
            Class::Juggernaut => Some("The Juggernaut! Sidestep its charges."),
            _ => None,
        }
    }

    /// Counts toward an area's live population
    pub fn is_population(self) -> bool {
        matches!(
            self,
            Class::Slime
                | Class::Crawler
                | Class::Fencer
                | Class::Archer
                | Class::Knight
                | Class::Spawner
                | Class::SlimeKing
                | Class::Juggernaut
        )
    }

    /// Something the player wants to hit
    pub fn is_hostile(self) -> bool {
        self.is_population() || matches!(self, Class::Lazer | Class::Bomb)
    }
}

/// Who caused a hit or owns a projectile/item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Entity(EntityId),
}

/// Where a hit came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitSource {
    pub pos: Vec2,
    pub owner: Owner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Target was immune (flashing, invulnerable or already dead)
    Ignored,
    /// A raised shield absorbed the hit
    Blocked,
    Damaged,
    Killed,
}

/// Knockback glide parameters (speed, duration, taper)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knockback {
    pub speed: f32,
    pub duration: u32,
    pub taper: f32,
}

impl Knockback {
    pub const STANDARD: Knockback = Knockback {
        speed: 8.0,
        duration: 3,
        taper: 1.0,
    };
}

/// State shared by every entity type
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: EntityId,
    pub body: Body,
    pub sprite: Sprite,
    health: i32,
    max_health: i32,
    /// Immortal actors only leave through `die`/despawn
    pub mortal: bool,
    expired: bool,
    pub despawned: bool,
    /// Ticks left in the hit-flash (immune) state
    pub flashing: u32,
    /// Board index as of the last commit
    pub index: usize,
    pub cursor: OrderCursor,
    pub collide_priority: i32,
    pub immune_collide_below: i32,
    /// Blocks movement of whoever excludes against it
    pub solid: bool,
    pub contact_damage: i32,
    /// +1 facing forward (increasing y), -1 facing back
    pub facing: f32,
    pub knockback: Option<Knockback>,
    pub glide: Option<Glide>,
    pub hands: Option<Inventory>,
    pub wrapper: WrapperComponent,
    /// Index of the owning area
    pub area: usize,
}

impl Actor {
    pub fn new(sprite: Sprite, pos: Vec2, max_health: i32) -> Self {
        Self {
            id: EntityId::UNASSIGNED,
            body: Body::from_sprite(pos, sprite),
            sprite,
            health: max_health,
            max_health,
            mortal: true,
            expired: false,
            despawned: false,
            flashing: 0,
            index: 0,
            cursor: OrderCursor::default(),
            collide_priority: COLLIDE_MOVEMENT,
            immune_collide_below: COLLIDE_MOVEMENT,
            solid: false,
            contact_damage: 0,
            facing: -1.0,
            knockback: None,
            glide: None,
            hands: None,
            wrapper: WrapperComponent::default(),
            area: 0,
        }
    }

    /// An actor that never takes damage and never blocks anything
    pub fn immortal(sprite: Sprite, pos: Vec2) -> Self {
        let mut actor = Self::new(sprite, pos, 1);
        actor.mortal = false;
        actor.immune_collide_below = COLLIDE_NEVER;
        actor
    }

    #[inline]
    pub fn health(&self) -> i32 {
        self.health
    }

    #[inline]
    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Set health, clamped to [0, max_health]
    pub fn set_health(&mut self, health: i32) {
        self.health = health.clamp(0, self.max_health);
    }

    pub fn damage(&mut self, amount: i32) {
        self.set_health(self.health.saturating_sub(amount.max(0)));
    }

    pub fn heal(&mut self, amount: i32) {
        self.set_health(self.health.saturating_add(amount.max(0)));
    }

    pub fn is_alive(&self) -> bool {
        !self.despawned && !self.expired && (!self.mortal || self.health > 0)
    }

    pub fn die(&mut self) {
        self.health = 0;
        self.expired = true;
    }

    /// Remove without death effects (area unload)
    pub fn despawn(&mut self) {
        self.despawned = true;
    }

    pub fn is_invulnerable(&self) -> bool {
        !self.mortal || self.wrapper.is_invulnerable()
    }

    pub fn is_spawning(&self) -> bool {
        self.wrapper.is_spawning()
    }

    pub fn is_gliding(&self) -> bool {
        self.glide.is_some_and(|g| g.is_gliding())
    }

    pub fn anchor(&self) -> Anchor {
        Anchor::Member(self.index, self.body.y())
    }

    pub fn face_toward(&mut self, y: f32) {
        let dir = sign(y - self.body.y());
        if dir != 0.0 {
            self.facing = dir;
        }
    }

    /// Start a glide on the motion component (if the actor has one)
    pub fn start_glide(&mut self, speed: f32, duration: u32, taper: f32, direction: f32) {
        if let Some(glide) = self.glide.as_mut() {
            glide.start(speed, duration, taper, direction);
        }
    }

    /// Advance the glide and apply its displacement along y
    pub fn step_glide(&mut self) -> GlideStep {
        let step = match self.glide.as_mut() {
            Some(glide) => glide.step(),
            None => {
                return GlideStep {
                    displacement: 0.0,
                    stopped: false,
                };
            }
        };
        self.body.translate(Vec2::new(0.0, step.displacement));
        step
    }

    /// Knock the actor away from `source_y`, invulnerable until it stops
    pub fn apply_knockback(&mut self, source_y: f32) {
        let Some(kb) = self.knockback else {
            return;
        };
        if self.glide.is_none() {
            return;
        }
        let mut dir = sign(self.body.y() - source_y);
        if dir == 0.0 {
            dir = -self.facing;
        }
        self.start_glide(kb.speed, kb.duration, kb.taper, dir);
        if !self.wrapper.has_knockback() {
            self.wrapper.push(HolderLayer::Knockback);
        }
    }

    /// Keep the body inside the track
    pub fn clamp_to_track(&mut self) {
        let limit = (TRACK_HALF_WIDTH - self.body.half_width()).max(0.0);
        let x = self.body.x().clamp(-limit, limit);
        self.body.set_x(x);
    }

    pub fn holder_view(&self, hand: usize) -> HolderView {
        HolderView {
            owner: Owner::Entity(self.id),
            pos: self.body.pos(),
            facing: self.facing,
            hand,
            area: self.area,
        }
    }
}

/// Per-type behaviour state
#[derive(Debug, Clone)]
pub enum EntityKind {
    AreaStarter,
    AreaStopper,
    Slime(Slime),
    Crawler(Crawler),
    Fencer(Fencer),
    Archer(Archer),
    Knight(Knight),
    Spawner(Spawner),
    Lazer(Lazer),
    Bomb(Bomb),
    Obstacle,
    Projectile(Projectile),
    Dropped(Item),
    Boss(Boss),
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub actor: Actor,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(actor: Actor, kind: EntityKind) -> Self {
        Self { actor, kind }
    }

    /// Left sentinel of an area's range on the board
    pub fn area_starter(y: f32, area: usize) -> Self {
        let mut actor = Actor::immortal(Sprite::Marker, Vec2::new(0.0, y));
        actor.area = area;
        Self::new(actor, EntityKind::AreaStarter)
    }

    /// Right sentinel of an area's range on the board
    pub fn area_stopper(y: f32, area: usize) -> Self {
        let mut actor = Actor::immortal(Sprite::Marker, Vec2::new(0.0, y));
        actor.area = area;
        Self::new(actor, EntityKind::AreaStopper)
    }

    pub fn obstacle(pos: Vec2) -> Self {
        let mut actor = Actor::new(Sprite::Obstacle, pos, 30);
        actor.solid = true;
        // Ordinary movement pushes ignore obstacles; players and attacks do not
        actor.immune_collide_below = COLLIDE_PLAYER;
        Self::new(actor, EntityKind::Obstacle)
    }

    /// An item lying on the ground
    pub fn dropped(pos: Vec2, mut item: Item) -> Self {
        item.pos = ItemPos::Ground(pos);
        item.reset();
        let mut actor = Actor::immortal(item.sprite(), pos);
        actor.immune_collide_below = COLLIDE_MOVEMENT;
        Self::new(actor, EntityKind::Dropped(item))
    }

    pub fn spawner(pos: Vec2, spawner: Spawner) -> Self {
        let mut actor = Actor::new(Sprite::Spawner, pos, 12);
        actor.solid = true;
        Self::new(actor, EntityKind::Spawner(spawner))
    }

    pub fn boss(pos: Vec2, boss: Boss) -> Self {
        let mut actor = Actor::new(boss.kind.sprite(), pos, boss.kind.max_health());
        actor.solid = true;
        actor.contact_damage = boss.kind.contact_damage();
        actor.glide = Some(Glide::default());
        Self::new(actor, EntityKind::Boss(boss))
    }

    pub fn projectile(pos: Vec2, projectile: Projectile) -> Self {
        let mut actor = Actor::immortal(projectile.sprite(), pos);
        actor.collide_priority = COLLIDE_ATTACK;
        if projectile.is_thrown() {
            actor.glide = Some(Glide::default());
        }
        actor.body.set_rotation(projectile.rotation());
        Self::new(actor, EntityKind::Projectile(projectile))
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.actor.id
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.actor.body.pos()
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.actor.body.y()
    }

    #[inline]
    pub fn body(&self) -> &Body {
        &self.actor.body
    }

    pub fn class(&self) -> Class {
        match &self.kind {
            EntityKind::AreaStarter => Class::AreaStarter,
            EntityKind::AreaStopper => Class::AreaStopper,
            EntityKind::Slime(_) => Class::Slime,
            EntityKind::Crawler(_) => Class::Crawler,
            EntityKind::Fencer(_) => Class::Fencer,
            EntityKind::Archer(_) => Class::Archer,
            EntityKind::Knight(_) => Class::Knight,
            EntityKind::Spawner(_) => Class::Spawner,
            EntityKind::Lazer(_) => Class::Lazer,
            EntityKind::Bomb(_) => Class::Bomb,
            EntityKind::Obstacle => Class::Obstacle,
            EntityKind::Projectile(_) => Class::Projectile,
            EntityKind::Dropped(_) => Class::DroppedItem,
            EntityKind::Boss(boss) => boss.kind.class(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.actor.is_alive()
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self.kind, EntityKind::AreaStarter | EntityKind::AreaStopper)
    }

    /// Live hostile that the camera and AI should care about
    pub fn is_hostile(&self) -> bool {
        self.is_alive() && self.class().is_hostile() && !self.actor.is_spawning()
    }

    /// Can be struck by the player's attacks
    pub fn is_target(&self) -> bool {
        self.is_alive()
            && self.actor.mortal
            && !self.actor.is_spawning()
            && (self.class().is_population() || matches!(self.kind, EntityKind::Obstacle))
    }

    /// Blocks movement
    pub fn is_solid(&self) -> bool {
        self.is_alive() && self.actor.solid && !self.actor.is_spawning()
    }

    /// Point every held item at this entity's id
    pub fn adopt_items(&mut self) {
        let id = self.actor.id;
        if let Some(hands) = self.actor.hands.as_mut() {
            hands.adopt(Owner::Entity(id));
        }
    }

    /// Shift along y (area finalize), keeping ground items in sync
    pub fn offset_y(&mut self, dy: f32) {
        self.actor.body.translate(Vec2::new(0.0, dy));
        let pos = self.pos();
        if let EntityKind::Dropped(item) = &mut self.kind {
            item.pos = ItemPos::Ground(pos);
        }
    }

    /// Called once when the owning area becomes visible
    pub fn final_load(&mut self, world: &mut WorldState) {
        let class = self.class();
        let first = world.registry.on_load(class, self.actor.id, self.actor.area);
        if first && let Some(text) = class.tutorial() {
            world.show_tutorial(text);
        }
    }

    /// Advance one tick
    pub fn tick(&mut self, ctx: &mut TickCtx<'_>) -> SimResult<()> {
        if !self.is_alive() {
            return Ok(());
        }
        self.actor.flashing = self.actor.flashing.saturating_sub(1);

        // A spawner holder owns the entity until it reaches its post
        if let Some(travel) = self.actor.wrapper.travel().cloned() {
            let (pos, arrived) = travel.advance(self.actor.body.pos());
            self.actor.body.set_pos(pos);
            if arrived {
                self.actor.body.freeze_x(false);
                self.actor.body.freeze_y(false);
                if let Some(claim) = self.actor.wrapper.deploy()
                    && let Some(EntityKind::Spawner(spawner)) =
                        ctx.board.by_id_mut(claim.spawner).map(|e| &mut e.kind)
                {
                    spawner.deployed(self.actor.id);
                }
                log::debug!("{} {:?} deployed", self.class().name(), self.actor.id);
            }
            return Ok(());
        }

        let step = self.actor.step_glide();
        if step.stopped {
            self.on_stop_gliding(ctx);
        }

        match &mut self.kind {
            EntityKind::AreaStarter
            | EntityKind::AreaStopper
            | EntityKind::Obstacle => {}
            EntityKind::Dropped(item) => item.pos = ItemPos::Ground(self.actor.body.pos()),
            EntityKind::Slime(slime) => creatures::tick_slime(slime, &mut self.actor, ctx),
            EntityKind::Crawler(crawler) => creatures::tick_crawler(crawler, &mut self.actor, ctx),
            EntityKind::Fencer(fencer) => creatures::tick_fencer(fencer, &mut self.actor, ctx),
            EntityKind::Archer(archer) => creatures::tick_archer(archer, &mut self.actor, ctx),
            EntityKind::Knight(knight) => creatures::tick_knight(knight, &mut self.actor, ctx),
            EntityKind::Spawner(spawner) => spawner.tick(&self.actor, ctx),
            EntityKind::Lazer(lazer) => creatures::tick_lazer(lazer, &mut self.actor, ctx),
            EntityKind::Bomb(bomb) => creatures::tick_bomb(bomb, &mut self.actor, ctx),
            EntityKind::Projectile(p) => projectile::tick_projectile(p, &mut self.actor, ctx),
            EntityKind::Boss(boss) => bosses::tick_boss(boss, &mut self.actor, ctx),
        }

        self.tick_hands(ctx);
        Ok(())
    }

    fn tick_hands(&mut self, ctx: &mut TickCtx<'_>) {
        if !self.is_alive() {
            return;
        }
        let base = self.actor.holder_view(0);
        if let Some(hands) = self.actor.hands.as_mut() {
            hands.tick(&base, ctx.board, Some(&mut *ctx.player), ctx.world);
        }
    }

    /// Glide came to rest
    pub fn on_stop_gliding(&mut self, ctx: &mut TickCtx<'_>) {
        self.actor.wrapper.release_knockback();
        match &mut self.kind {
            EntityKind::Projectile(p) => projectile::land(p, &mut self.actor, ctx),
            EntityKind::Boss(boss) => bosses::on_stop_gliding(boss, &mut self.actor, ctx),
            _ => {}
        }
    }

    /// Take a hit
    pub fn hit(&mut self, damage: i32, source: HitSource, world: &mut WorldState) -> HitOutcome {
        if !self.is_alive() || self.actor.is_invulnerable() || self.actor.flashing > 0 {
            return HitOutcome::Ignored;
        }
        let pos = self.pos();
        if let Some(hands) = self.actor.hands.as_ref() {
            let view = self.actor.holder_view(0);
            if hands.blocks(&view, source.pos) {
                world.sound(SoundCue::Blocked);
                return HitOutcome::Blocked;
            }
        }

        self.actor.damage(damage);
        self.actor.flashing = ENTITY_FLASH_TICKS;
        if let EntityKind::Boss(boss) = &mut self.kind {
            bosses::on_damaged(boss, &self.actor, world);
        }
        if !self.actor.is_alive() {
            log::debug!("{} {:?} killed at {:?}", self.class().name(), self.actor.id, pos);
            return HitOutcome::Killed;
        }
        world.sound(SoundCue::EnemyHit);
        self.actor.apply_knockback(source.pos.y);
        HitOutcome::Damaged
    }

    /// Death effects; returns entities left behind (drops)
    pub fn on_death(&mut self, world: &mut WorldState) -> Vec<Entity> {
        let pos = self.pos();
        let class = self.class();
        let mut drops = Vec::new();
        if class.is_population() {
            world.sound(SoundCue::EnemyDeath);
            world.burst(self.actor.area, pos, 6, Sprite::Smoke);
        }
        match &mut self.kind {
            EntityKind::Fencer(_) | EntityKind::Knight(_) => {
                // One in three drops the weapon it was holding
                if world.randint(0, 2) == 0
                    && let Some(item) = self.actor.hands.as_mut().and_then(|h| h.take(0))
                {
                    drops.push(Entity::dropped(pos, item));
                }
            }
            EntityKind::Boss(boss) => {
                world.sound(SoundCue::BossDefeated);
                world.announce(format!("The {} is defeated!", boss.kind.name()));
                let roll = world.randint(0, 4);
                drops.push(Entity::dropped(pos, Item::gift(roll)));
            }
            _ => {}
        }
        for drop in &mut drops {
            drop.actor.area = self.actor.area;
        }
        drops
    }

    pub fn draw(&self, surface: &mut dyn Surface, camera: &Camera, shake: f32) {
        if !self.is_alive() || !self.actor.sprite.is_visible() {
            return;
        }
        let screen = camera.to_screen(self.pos(), shake);
        surface.draw(self.actor.sprite, screen, self.actor.body.rotation());
        if let Some(hands) = self.actor.hands.as_ref() {
            hands.draw(&self.actor.holder_view(0), surface, camera, shake);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::board::Board;
    use crate::sim::player::Player;
    use crate::sim::state::WorldState;
    use crate::Settings;
    use proptest::prelude::*;

    fn source() -> HitSource {
        HitSource {
            pos: Vec2::new(0.0, -50.0),
            owner: Owner::Player,
        }
    }

    #[test]
    fn test_lethal_hit_kills() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut slime = creatures::spawn_creature(Class::Slime, Vec2::new(0.0, 100.0)).unwrap();
        assert_eq!(slime.actor.health(), 7);
        assert_eq!(slime.hit(7, source(), &mut world), HitOutcome::Killed);
        assert!(!slime.is_alive());
        assert_eq!(slime.actor.health(), 0);
    }

    #[test]
    fn test_flashing_ignores_followup_hits() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut slime = creatures::spawn_creature(Class::Slime, Vec2::new(0.0, 100.0)).unwrap();
        assert_eq!(slime.hit(2, source(), &mut world), HitOutcome::Damaged);
        assert_eq!(slime.hit(2, source(), &mut world), HitOutcome::Ignored);
        assert_eq!(slime.actor.health(), 5);
    }

    #[test]
    fn test_knockback_pushes_away_and_protects() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut slime = creatures::spawn_creature(Class::Slime, Vec2::new(0.0, 100.0)).unwrap();
        slime.hit(1, source(), &mut world);
        assert!(slime.actor.wrapper.has_knockback());
        assert!(slime.actor.is_invulnerable());
        let glide = slime.actor.glide.unwrap();
        assert_eq!(glide.direction, 1.0);
    }

    #[test]
    fn test_immortal_sentinels() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut starter = Entity::area_starter(0.0, 0);
        assert_eq!(starter.hit(100, source(), &mut world), HitOutcome::Ignored);
        assert!(starter.is_alive());
        assert!(starter.is_sentinel());
        starter.actor.despawn();
        assert!(!starter.is_alive());
    }

    #[test]
    fn test_first_load_shows_tutorial_once() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut a = creatures::spawn_creature(Class::Slime, Vec2::ZERO).unwrap();
        a.actor.id = EntityId(1);
        let mut b = creatures::spawn_creature(Class::Slime, Vec2::ZERO).unwrap();
        b.actor.id = EntityId(2);
        a.final_load(&mut world);
        assert!(world.tutorial_showing());
        world.tutorial = None;
        b.final_load(&mut world);
        assert!(!world.tutorial_showing());
        assert_eq!(world.registry.instances(Class::Slime), &[EntityId(1), EntityId(2)]);
    }

    #[test]
    fn test_ground_item_follows_its_entity() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut player = Player::new();
        let mut board = Board::new();
        let mut drop = Entity::dropped(Vec2::new(0.0, 100.0), Item::dagger());
        drop.offset_y(50.0);
        drop.actor.body.translate(Vec2::new(12.0, 0.0));
        let mut ctx = TickCtx {
            world: &mut world,
            player: &mut player,
            board: &mut board,
        };
        drop.tick(&mut ctx).unwrap();
        let EntityKind::Dropped(item) = &drop.kind else {
            panic!("expected a dropped item");
        };
        assert_eq!(item.pos, ItemPos::Ground(Vec2::new(12.0, 150.0)));
    }

    proptest! {
        #[test]
        fn prop_health_stays_clamped(ops in proptest::collection::vec((-30i32..30, any::<bool>()), 0..40)) {
            let mut actor = Actor::new(Sprite::Knight, Vec2::ZERO, 18);
            for (amount, heal) in ops {
                if heal { actor.heal(amount) } else { actor.damage(amount) }
                prop_assert!(actor.health() >= 0 && actor.health() <= actor.max_health());
            }
        }

        #[test]
        fn prop_lethal_damage_always_kills(health in 1i32..40, extra in 0i32..20) {
            let mut world = WorldState::new(3, &Settings::deterministic());
            let mut knight = creatures::spawn_creature(Class::Knight, Vec2::ZERO).unwrap();
            knight.actor.set_health(health);
            let dmg = knight.actor.health() + extra;
            // Attack from behind so the shield cannot block
            let behind = HitSource { pos: Vec2::new(0.0, 50.0), owner: Owner::Player };
            knight.actor.facing = -1.0;
            prop_assert_eq!(knight.hit(dmg, behind, &mut world), HitOutcome::Killed);
            prop_assert!(!knight.is_alive());
        }
    }
}
