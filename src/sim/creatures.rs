//! Regular creatures and hazards
//!
//! Each behaviour is a small state struct plus a `tick_*` function that
//! drives the actor it belongs to. All of them read the player through the
//! tick context and spawn through the board.

use glam::Vec2;

use super::entity::{Actor, Class, Entity, EntityId, EntityKind, HitSource, Knockback, Owner};
use super::glide::Glide;
use super::items::{Inventory, Item};
use super::sprite::Sprite;
use super::state::TickCtx;
use crate::consts::*;
use crate::platform::SoundCue;
use crate::sign;

/// (speed, duration, taper) of a slime hop
const SLIME_HOP: (f32, u32, f32) = (4.0, 6, 0.5);
const SLIME_HOP_INTERVAL: u32 = 50;
/// Slimes ignore a player further away than this
const SLIME_SIGHT: f32 = 400.0;

const CRAWLER_SPEED: f32 = 2.5;

const FENCER_SPEED: Vec2 = Vec2::new(1.5, 2.0);
const FENCER_COOLDOWN: u32 = 50;
/// Melee reach used by the sword wielders to decide when to swing
const MELEE_REACH: Vec2 = Vec2::new(50.0, 70.0);

const ARCHER_SPEED: Vec2 = Vec2::new(1.0, 1.5);
/// Archers try to keep the player between these distances
const ARCHER_BAND: (f32, f32) = (200.0, 340.0);
const ARCHER_RANGE: f32 = 450.0;
const ARCHER_COOLDOWN: u32 = 90;

const KNIGHT_SPEED: Vec2 = Vec2::new(1.0, 1.2);
const KNIGHT_COOLDOWN: u32 = 60;
/// Knights stay close to an archer within this distance
const KNIGHT_GUARD_RANGE: f32 = 300.0;
const KNIGHT_SHIELD_RANGE: f32 = 200.0;

pub const BOMB_FUSE: u32 = 60;
pub const BOMB_RADIUS: f32 = 90.0;
pub const BOMB_DAMAGE: i32 = 6;
/// Placed bombs light their fuse when the player gets this close
const BOMB_TRIGGER: f32 = 120.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slime {
    hop_timer: u32,
    drift: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Crawler {
    dir: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fencer {
    cooldown: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Archer {
    cooldown: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Knight {
    cooldown: u32,
    pub guarding: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bomb {
    /// Ticks until detonation once lit
    pub fuse: Option<u32>,
    pub radius: f32,
    pub damage: i32,
    pub owner: Option<Owner>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LazerMode {
    Fixed,
    /// Rotates by `speed` degrees per tick
    Spinning { speed: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazerPhase {
    Idle,
    Charging,
    Firing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lazer {
    pub mode: LazerMode,
    /// Full cycle length in ticks
    pub period: u32,
    pub warmup: u32,
    pub active: u32,
    pub damage: i32,
    timer: u32,
}

impl Lazer {
    pub fn new(mode: LazerMode, period: u32, warmup: u32, active: u32, offset: u32) -> Self {
        Self {
            mode,
            period: period.max(1),
            warmup,
            active,
            damage: 3,
            timer: offset,
        }
    }

    pub fn phase(&self) -> LazerPhase {
        let t = self.timer % self.period;
        if t < self.warmup {
            LazerPhase::Charging
        } else if t < self.warmup + self.active {
            LazerPhase::Firing
        } else {
            LazerPhase::Idle
        }
    }
}

fn walker(sprite: Sprite, pos: Vec2, health: i32, contact: i32) -> Actor {
    let mut actor = Actor::new(sprite, pos, health);
    actor.contact_damage = contact;
    actor.glide = Some(Glide::default());
    actor.knockback = Some(Knockback::STANDARD);
    actor
}

pub fn slime(pos: Vec2) -> Entity {
    let actor = walker(Sprite::Slime, pos, 7, 1);
    Entity::new(actor, EntityKind::Slime(Slime::default()))
}

/// Build a creature of `class`
///
/// None for classes that need more than a position to build (sentinels,
/// spawners, projectiles, items, bosses).
pub fn spawn_creature(class: Class, pos: Vec2) -> Option<Entity> {
    let entity = match class {
        Class::Slime => slime(pos),
        Class::Crawler => {
            let actor = walker(Sprite::Crawler, pos, 4, 2);
            let dir = if pos.x >= 0.0 { -1.0 } else { 1.0 };
            Entity::new(actor, EntityKind::Crawler(Crawler { dir }))
        }
        Class::Fencer => {
            let mut actor = walker(Sprite::Fencer, pos, 10, 0);
            actor.hands = Some(Inventory::with_items(vec![Some(Item::sword()), None]));
            Entity::new(actor, EntityKind::Fencer(Fencer::default()))
        }
        Class::Archer => {
            let mut actor = walker(Sprite::Archer, pos, 5, 0);
            actor.hands = Some(Inventory::with_items(vec![Some(Item::bow()), None]));
            Entity::new(actor, EntityKind::Archer(Archer::default()))
        }
        Class::Knight => {
            let mut actor = walker(Sprite::Knight, pos, 18, 0);
            actor.knockback = None;
            actor.hands = Some(Inventory::with_items(vec![Some(Item::sword()), Some(Item::shield())]));
            Entity::new(actor, EntityKind::Knight(Knight::default()))
        }
        Class::Bomb => bomb(pos, None),
        Class::Obstacle => Entity::obstacle(pos),
        Class::AreaStarter
        | Class::AreaStopper
        | Class::Spawner
        | Class::Lazer
        | Class::Projectile
        | Class::DroppedItem
        | Class::SlimeKing
        | Class::Juggernaut => return None,
    };
    Some(entity)
}

/// A bomb; thrown bombs (with an owner) are lit immediately
pub fn bomb(pos: Vec2, owner: Option<Owner>) -> Entity {
    let mut actor = Actor::immortal(Sprite::Bomb, pos);
    actor.immune_collide_below = COLLIDE_MOVEMENT;
    let state = Bomb {
        fuse: owner.map(|_| BOMB_FUSE),
        radius: BOMB_RADIUS,
        damage: BOMB_DAMAGE,
        owner,
    };
    Entity::new(actor, EntityKind::Bomb(state))
}

pub fn lazer(pos: Vec2, lazer: Lazer) -> Entity {
    let mut actor = Actor::immortal(Sprite::LazerCharging, pos);
    actor.collide_priority = COLLIDE_ATTACK;
    actor.body.freeze_x(true);
    let mut entity = Entity::new(actor, EntityKind::Lazer(lazer));
    if let EntityKind::Lazer(l) = &entity.kind {
        let sprite = lazer_sprite(l.phase());
        entity.actor.sprite = sprite;
        entity.actor.body.set_size(sprite.size());
    }
    entity
}

fn lazer_sprite(phase: LazerPhase) -> Sprite {
    match phase {
        LazerPhase::Idle => Sprite::Marker,
        LazerPhase::Charging => Sprite::LazerCharging,
        LazerPhase::Firing => Sprite::Lazer,
    }
}

/// Per-tick velocity of the current glide, for exclusion
fn glide_velocity(actor: &Actor) -> f32 {
    actor
        .glide
        .filter(|g| g.is_gliding())
        .map_or(0.0, |g| g.speed * g.direction)
}

/// Push the actor out of solid entities after it moved
pub(crate) fn settle(actor: &mut Actor, ctx: &mut TickCtx<'_>, moved: Vec2) {
    let anchor = actor.anchor();
    ctx.board
        .exclude_wall_safe(&mut actor.body, actor.collide_priority, anchor, moved, |e| e.is_solid(), |_| {});
    actor.clamp_to_track();
}

/// Hurt the player on contact
pub(crate) fn touch_player(actor: &Actor, ctx: &mut TickCtx<'_>) {
    if actor.contact_damage <= 0 || actor.is_spawning() || !actor.is_alive() {
        return;
    }
    if actor.collide_priority >= ctx.player.immune_collide_below && actor.body.collide(&ctx.player.body) {
        let source = HitSource {
            pos: actor.body.pos(),
            owner: Owner::Entity(actor.id),
        };
        ctx.player.hit(actor.contact_damage, source, ctx.world);
    }
}

/// Step toward `target` by at most `speed` on each axis
fn approach(actor: &mut Actor, target: Vec2, speed: Vec2) -> Vec2 {
    let delta = target - actor.body.pos();
    let step = Vec2::new(
        delta.x.clamp(-speed.x, speed.x),
        delta.y.clamp(-speed.y, speed.y),
    );
    actor.body.translate(step);
    step
}

/// Use the item in `hand`, putting whatever it produces on the board
fn use_hand(actor: &mut Actor, hand: usize, aim: Vec2, ctx: &mut TickCtx<'_>) {
    let view = actor.holder_view(hand);
    if let Some(hands) = actor.hands.as_mut()
        && let Some(spawned) = hands.use_hand(hand, &view, aim, ctx.world)
    {
        ctx.board.insert(spawned);
    }
}

pub fn tick_slime(slime: &mut Slime, actor: &mut Actor, ctx: &mut TickCtx<'_>) {
    slime.hop_timer = slime.hop_timer.saturating_sub(1);
    let to_player = ctx.player.body.pos() - actor.body.pos();
    if !actor.is_gliding() {
        slime.drift = 0.0;
        if slime.hop_timer == 0 && to_player.y.abs() < SLIME_SIGHT {
            let (speed, duration, taper) = SLIME_HOP;
            let dir = if to_player.y >= 0.0 { 1.0 } else { -1.0 };
            actor.start_glide(speed, duration, taper, dir);
            actor.face_toward(ctx.player.body.y());
            slime.drift = sign(to_player.x) * 1.5;
            slime.hop_timer = SLIME_HOP_INTERVAL;
        }
    }
    actor.body.translate(Vec2::new(slime.drift, 0.0));
    settle(actor, ctx, Vec2::new(slime.drift, glide_velocity(actor)));
    touch_player(actor, ctx);
}

pub fn tick_crawler(crawler: &mut Crawler, actor: &mut Actor, ctx: &mut TickCtx<'_>) {
    let limit = TRACK_HALF_WIDTH - actor.body.half_width();
    let x = actor.body.x() + crawler.dir * CRAWLER_SPEED;
    if x.abs() >= limit {
        crawler.dir = -crawler.dir;
    }
    let dy = ctx.player.body.y() - actor.body.y();
    let forward = if dy.abs() < 300.0 { sign(dy) * 0.5 } else { 0.0 };
    let moved = Vec2::new(crawler.dir * CRAWLER_SPEED, forward);
    actor.body.translate(moved);
    settle(actor, ctx, moved);
    touch_player(actor, ctx);
}

pub fn tick_fencer(fencer: &mut Fencer, actor: &mut Actor, ctx: &mut TickCtx<'_>) {
    fencer.cooldown = fencer.cooldown.saturating_sub(1);
    let player = ctx.player.body.pos();
    let to_player = player - actor.body.pos();
    actor.face_toward(player.y);
    let busy = actor.hands.as_ref().is_some_and(Inventory::is_busy);
    let moved = if !busy && !actor.is_gliding() && to_player.y.abs() > MELEE_REACH.y * 0.8 {
        approach(actor, player - Vec2::new(0.0, actor.facing * MELEE_REACH.y * 0.7), FENCER_SPEED)
    } else {
        Vec2::ZERO
    };
    if fencer.cooldown == 0 && to_player.x.abs() < MELEE_REACH.x && to_player.y.abs() < MELEE_REACH.y {
        use_hand(actor, 0, to_player, ctx);
        fencer.cooldown = FENCER_COOLDOWN;
    }
    settle(actor, ctx, moved);
    touch_player(actor, ctx);
}

pub fn tick_archer(archer: &mut Archer, actor: &mut Actor, ctx: &mut TickCtx<'_>) {
    archer.cooldown = archer.cooldown.saturating_sub(1);
    let player = ctx.player.body.pos();
    let to_player = player - actor.body.pos();
    let dist = to_player.y.abs();
    actor.face_toward(player.y);

    let (near, far) = ARCHER_BAND;
    let forward = if dist < near {
        -sign(to_player.y) * ARCHER_SPEED.y
    } else if dist > far && dist < ARCHER_RANGE * 1.5 {
        sign(to_player.y) * ARCHER_SPEED.y
    } else {
        0.0
    };
    let lateral = to_player.x.clamp(-ARCHER_SPEED.x, ARCHER_SPEED.x);
    let moved = if actor.is_gliding() { Vec2::ZERO } else { Vec2::new(lateral, forward) };
    actor.body.translate(moved);

    if archer.cooldown == 0 && dist < ARCHER_RANGE && line_of_fire_clear(actor, to_player, ctx) {
        use_hand(actor, 0, to_player, ctx);
        archer.cooldown = ARCHER_COOLDOWN;
    }
    settle(actor, ctx, moved);
}

/// No other creature stands between the archer and the player
fn line_of_fire_clear(actor: &mut Actor, to_player: Vec2, ctx: &TickCtx<'_>) -> bool {
    actor.cursor.recenter(actor.index);
    let origin = actor.body.y();
    let x = actor.body.x();
    let limit = Some(to_player.y.abs());
    let blocks = |e: &Entity| e.class().is_population() && (e.pos().x - x).abs() < 20.0;
    let blocker = if to_player.y >= 0.0 {
        ctx.board.next_entity_inorder(&mut actor.cursor, origin, limit, blocks)
    } else {
        ctx.board.prev_entity_inorder(&mut actor.cursor, origin, limit, blocks)
    };
    blocker.is_none()
}

pub fn tick_knight(knight: &mut Knight, actor: &mut Actor, ctx: &mut TickCtx<'_>) {
    knight.cooldown = knight.cooldown.saturating_sub(1);
    let pos = actor.body.pos();
    let player = ctx.player.body.pos();
    let to_player = player - pos;
    actor.face_toward(player.y);

    knight.guarding = ctx
        .world
        .registry
        .nearest(Class::Archer, pos, ctx.board)
        .filter(|&id| ctx.board.by_id(id).is_some_and(|a| a.pos().distance(pos) < KNIGHT_GUARD_RANGE));
    let guard_x = knight
        .guarding
        .and_then(|id| ctx.board.by_id(id))
        .map(|archer| archer.pos().x);
    let target = Vec2::new(guard_x.unwrap_or(player.x), player.y - actor.facing * MELEE_REACH.y * 0.7);

    let busy = actor.hands.as_ref().is_some_and(Inventory::is_busy);
    let moved = if busy || actor.is_gliding() {
        Vec2::ZERO
    } else {
        approach(actor, target, KNIGHT_SPEED)
    };

    let in_reach = to_player.x.abs() < MELEE_REACH.x && to_player.y.abs() < MELEE_REACH.y;
    if knight.cooldown == 0 && in_reach {
        use_hand(actor, 0, to_player, ctx);
        knight.cooldown = KNIGHT_COOLDOWN;
    } else if !busy && to_player.y.abs() < KNIGHT_SHIELD_RANGE {
        let raised = actor.hands.as_ref().and_then(|h| h.get(1)).is_some_and(Item::is_raised);
        if !raised {
            use_hand(actor, 1, to_player, ctx);
        }
    }
    settle(actor, ctx, moved);
}

pub fn tick_bomb(bomb: &mut Bomb, actor: &mut Actor, ctx: &mut TickCtx<'_>) {
    let pos = actor.body.pos();
    let Some(fuse) = bomb.fuse else {
        if ctx.player.body.pos().distance(pos) < BOMB_TRIGGER {
            bomb.fuse = Some(BOMB_FUSE);
        }
        return;
    };
    if fuse > 0 {
        bomb.fuse = Some(fuse - 1);
        return;
    }

    let source = HitSource {
        pos,
        owner: bomb.owner.unwrap_or(Owner::Entity(actor.id)),
    };
    let radius = bomb.radius;
    let hits = ctx
        .board
        .all_in_range(actor.anchor(), radius, |e| e.is_target() && e.pos().distance(pos) <= radius);
    for i in hits {
        if let Some(target) = ctx.board.get_mut(i) {
            target.hit(bomb.damage, source, ctx.world);
        }
    }
    if ctx.player.body.pos().distance(pos) <= radius {
        ctx.player.hit(bomb.damage, source, ctx.world);
    }
    ctx.world.sound(SoundCue::Explosion);
    ctx.world.start_shake(4.0, 20);
    ctx.world.burst(actor.area, pos, 12, Sprite::Spark);
    log::debug!("bomb {:?} exploded at {:?}", actor.id, pos);
    actor.die();
}

pub fn tick_lazer(lazer: &mut Lazer, actor: &mut Actor, ctx: &mut TickCtx<'_>) {
    lazer.timer = lazer.timer.wrapping_add(1);
    if let LazerMode::Spinning { speed } = lazer.mode {
        actor.body.rotate_by(speed);
    }
    let sprite = lazer_sprite(lazer.phase());
    if sprite != actor.sprite {
        actor.sprite = sprite;
        actor.body.set_size(sprite.size());
    }
    if lazer.phase() == LazerPhase::Firing && actor.body.collide(&ctx.player.body) {
        let source = HitSource {
            pos: Vec2::new(ctx.player.body.x(), actor.body.y()),
            owner: Owner::Entity(actor.id),
        };
        ctx.player.hit(lazer.damage, source, ctx.world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::sim::board::Board;
    use crate::sim::player::Player;
    use crate::sim::state::WorldState;

    struct Harness {
        world: WorldState,
        player: Player,
        board: Board,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                world: WorldState::new(11, &Settings::deterministic()),
                player: Player::new(),
                board: Board::new(),
            }
        }

        fn add(&mut self, entity: Entity) -> EntityId {
            let id = self.board.insert(entity);
            self.board.commit(&mut self.world);
            id
        }

        fn step(&mut self, ticks: u32) {
            for _ in 0..ticks {
                for i in 0..self.board.len() {
                    let Ok(mut e) = self.board.take(i) else { continue };
                    let mut ctx = TickCtx {
                        world: &mut self.world,
                        player: &mut self.player,
                        board: &mut self.board,
                    };
                    e.tick(&mut ctx).unwrap();
                    self.board.restore(i, e).unwrap();
                }
                self.board.commit(&mut self.world);
            }
        }
    }

    #[test]
    fn test_spawn_creature_only_builds_creatures() {
        for class in [Class::Slime, Class::Crawler, Class::Fencer, Class::Archer, Class::Knight, Class::Bomb] {
            let entity = spawn_creature(class, Vec2::ZERO).unwrap();
            assert_eq!(entity.class(), class);
        }
        for class in [Class::AreaStopper, Class::Spawner, Class::DroppedItem, Class::SlimeKing] {
            assert!(spawn_creature(class, Vec2::ZERO).is_none(), "{}", class.name());
        }
    }

    #[test]
    fn test_slime_hops_toward_player() {
        let mut h = Harness::new();
        let id = h.add(spawn_creature(Class::Slime, Vec2::new(0.0, 350.0)).unwrap());
        h.step(5);
        let slime = h.board.by_id(id).unwrap();
        assert!(slime.y() < 350.0);
    }

    #[test]
    fn test_crawler_stays_on_track() {
        let mut h = Harness::new();
        let id = h.add(spawn_creature(Class::Crawler, Vec2::new(250.0, 900.0)).unwrap());
        h.step(400);
        let crawler = h.board.by_id(id).unwrap();
        assert!(crawler.pos().x.abs() <= TRACK_HALF_WIDTH);
    }

    #[test]
    fn test_lit_bomb_explodes() {
        let mut h = Harness::new();
        let player_pos = h.player.body.pos();
        let wall = h.add(Entity::obstacle(player_pos + Vec2::new(60.0, 60.0)));
        h.add(bomb(player_pos + Vec2::new(0.0, 30.0), Some(Owner::Player)));
        h.step(BOMB_FUSE + 1);
        assert_eq!(h.player.health(), PLAYER_MAX_HEALTH - BOMB_DAMAGE);
        assert_eq!(h.board.by_id(wall).unwrap().actor.health(), 30 - BOMB_DAMAGE);
        assert!(h.board.iter().all(|e| e.class() != Class::Bomb));
        assert!(h.world.shake.is_active());
    }

    #[test]
    fn test_placed_bomb_waits_for_player() {
        let mut h = Harness::new();
        let id = h.add(bomb(Vec2::new(0.0, 900.0), None));
        h.step(BOMB_FUSE * 2);
        assert!(h.board.by_id(id).is_some());
    }

    #[test]
    fn test_lazer_cycles_and_burns() {
        let mut h = Harness::new();
        let y = h.player.body.y();
        h.add(lazer(Vec2::new(0.0, y), Lazer::new(LazerMode::Fixed, 100, 20, 30, 0)));
        h.step(19);
        assert_eq!(h.player.health(), PLAYER_MAX_HEALTH);
        h.step(2);
        assert_eq!(h.player.health(), PLAYER_MAX_HEALTH - 3);
    }

    #[test]
    fn test_lazer_phases() {
        let mut l = Lazer::new(LazerMode::Fixed, 10, 3, 4, 0);
        let phases: Vec<LazerPhase> = (0..10)
            .map(|_| {
                let p = l.phase();
                l.timer += 1;
                p
            })
            .collect();
        assert_eq!(phases[0], LazerPhase::Charging);
        assert_eq!(phases[3], LazerPhase::Firing);
        assert_eq!(phases[7], LazerPhase::Idle);
    }

    #[test]
    fn test_archer_fires_at_player() {
        let mut h = Harness::new();
        let y = h.player.body.y();
        h.add(spawn_creature(Class::Archer, Vec2::new(0.0, y + 260.0)).unwrap());
        h.step(2);
        assert!(h.board.iter().any(|e| e.class() == Class::Projectile));
    }

    #[test]
    fn test_knight_guards_nearby_archer() {
        let mut h = Harness::new();
        let mut loaded = Vec::new();
        for (class, pos) in [(Class::Archer, Vec2::new(-150.0, 700.0)), (Class::Knight, Vec2::new(100.0, 760.0))] {
            let mut entity = spawn_creature(class, pos).unwrap();
            entity.actor.id = h.board.allocate_id();
            entity.final_load(&mut h.world);
            loaded.push(h.add(entity));
        }
        let (archer, knight) = (loaded[0], loaded[1]);
        h.step(1);
        let EntityKind::Knight(k) = &h.board.by_id(knight).unwrap().kind else {
            panic!("not a knight");
        };
        assert_eq!(k.guarding, Some(archer));
        assert!(h.board.by_id(knight).unwrap().pos().x < 100.0);
    }
}
