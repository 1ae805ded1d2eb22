//! Bosses
//!
//! Both bosses alternate between idling toward the player and a committed
//! attack driven by the glide component. The attack resolves when the glide
//! stops. Below an enrage threshold they attack more often.

use glam::Vec2;

use super::creatures::{self, settle, touch_player};
use super::entity::{Actor, Class, Entity, EntityId, HitSource, Owner};
use super::projectile::Projectile;
use super::sprite::Sprite;
use super::state::{TickCtx, WorldState};
use crate::platform::SoundCue;
use crate::{rotate_vec, sign};

/// (speed, duration, taper) of the Slime King's leap
const LEAP: (f32, u32, f32) = (12.0, 10, 1.0);
/// (speed, duration, taper) of the Juggernaut's charge
const CHARGE: (f32, u32, f32) = (15.0, 12, 1.5);
const SLAM_RADIUS: f32 = 120.0;
const SLAM_DAMAGE: i32 = 4;
/// Live slimes of its own the Slime King keeps around at most
const MAX_SUMMONS: usize = 6;
const VOLLEY_GAP: u32 = 8;
/// Degrees between arrows in a volley
const VOLLEY_SPREAD: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossKind {
    SlimeKing,
    Juggernaut,
}

impl BossKind {
    pub fn name(self) -> &'static str {
        match self {
            BossKind::SlimeKing => "Slime King",
            BossKind::Juggernaut => "Juggernaut",
        }
    }

    pub fn class(self) -> Class {
        match self {
            BossKind::SlimeKing => Class::SlimeKing,
            BossKind::Juggernaut => Class::Juggernaut,
        }
    }

    pub fn sprite(self) -> Sprite {
        match self {
            BossKind::SlimeKing => Sprite::SlimeKing,
            BossKind::Juggernaut => Sprite::Juggernaut,
        }
    }

    pub fn max_health(self) -> i32 {
        match self {
            BossKind::SlimeKing => 60,
            BossKind::Juggernaut => 90,
        }
    }

    pub fn contact_damage(self) -> i32 {
        match self {
            BossKind::SlimeKing => 4,
            BossKind::Juggernaut => 5,
        }
    }

    /// Enraged once health drops below max / divisor
    fn enrage_divisor(self) -> i32 {
        match self {
            BossKind::SlimeKing => 2,
            BossKind::Juggernaut => 3,
        }
    }

    fn rest_ticks(self, enraged: bool) -> u32 {
        match (self, enraged) {
            (BossKind::SlimeKing, false) => 80,
            (BossKind::SlimeKing, true) => 50,
            (BossKind::Juggernaut, false) => 90,
            (BossKind::Juggernaut, true) => 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossAttack {
    Idle,
    Leaping,
    Charging,
    Volley { shots_left: u32, gap: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Boss {
    pub kind: BossKind,
    pub enraged: bool,
    pub attack: BossAttack,
    timer: u32,
    drift: f32,
    attacks_made: u32,
    /// Slimes this boss summoned
    summons: Vec<EntityId>,
}

impl Boss {
    pub fn new(kind: BossKind) -> Self {
        Self {
            kind,
            enraged: false,
            attack: BossAttack::Idle,
            timer: 90,
            drift: 0.0,
            attacks_made: 0,
            summons: Vec::new(),
        }
    }

    fn volley_size(&self) -> u32 {
        if self.enraged { 5 } else { 3 }
    }
}

pub fn tick_boss(boss: &mut Boss, actor: &mut Actor, ctx: &mut TickCtx<'_>) {
    boss.timer = boss.timer.saturating_sub(1);
    let player = ctx.player.body.pos();
    let to_player = player - actor.body.pos();

    let moved = match boss.attack {
        BossAttack::Idle => {
            actor.face_toward(player.y);
            let step = to_player.x.clamp(-1.0, 1.0);
            actor.body.translate(Vec2::new(step, 0.0));
            if boss.timer == 0 {
                start_attack(boss, actor, to_player);
            }
            Vec2::new(step, 0.0)
        }
        BossAttack::Leaping | BossAttack::Charging => {
            actor.body.translate(Vec2::new(boss.drift, 0.0));
            let glide = actor.glide.map_or(0.0, |g| g.speed * g.direction);
            Vec2::new(boss.drift, glide)
        }
        BossAttack::Volley { shots_left, gap } => {
            if gap > 0 {
                boss.attack = BossAttack::Volley {
                    shots_left,
                    gap: gap - 1,
                };
            } else {
                let index = boss.volley_size().saturating_sub(shots_left) as f32;
                let spread = (index - (boss.volley_size() as f32 - 1.0) / 2.0) * VOLLEY_SPREAD;
                let dir = rotate_vec(to_player.normalize_or(Vec2::new(0.0, actor.facing)), spread);
                let mut arrow = Entity::projectile(
                    actor.body.pos(),
                    Projectile::arrow(Owner::Entity(actor.id), dir),
                );
                arrow.actor.area = actor.area;
                ctx.board.insert(arrow);
                ctx.world.sound(SoundCue::Shoot);
                boss.attack = if shots_left <= 1 {
                    boss.timer = boss.kind.rest_ticks(boss.enraged);
                    BossAttack::Idle
                } else {
                    BossAttack::Volley {
                        shots_left: shots_left - 1,
                        gap: VOLLEY_GAP,
                    }
                };
            }
            Vec2::ZERO
        }
    };
    settle(actor, ctx, moved);
    touch_player(actor, ctx);
}

fn start_attack(boss: &mut Boss, actor: &mut Actor, to_player: Vec2) {
    let mut dir = sign(to_player.y);
    if dir == 0.0 {
        dir = actor.facing;
    }
    boss.attacks_made += 1;
    match boss.kind {
        BossKind::SlimeKing => {
            let (speed, duration, taper) = LEAP;
            actor.start_glide(speed, duration, taper, dir);
            boss.drift = sign(to_player.x) * 2.0;
            boss.attack = BossAttack::Leaping;
        }
        BossKind::Juggernaut if boss.attacks_made % 2 == 1 => {
            let (speed, duration, taper) = CHARGE;
            actor.start_glide(speed, duration, taper, dir);
            boss.drift = 0.0;
            boss.attack = BossAttack::Charging;
        }
        BossKind::Juggernaut => {
            boss.attack = BossAttack::Volley {
                shots_left: boss.volley_size(),
                gap: 0,
            };
        }
    }
    log::debug!("{} attacks: {:?}", boss.kind.name(), boss.attack);
}

/// The attack glide ended
pub fn on_stop_gliding(boss: &mut Boss, actor: &mut Actor, ctx: &mut TickCtx<'_>) {
    match boss.attack {
        BossAttack::Leaping => {
            slam(actor, ctx);
            summon(boss, actor, ctx);
        }
        BossAttack::Charging => ctx.world.start_shake(3.0, 10),
        _ => return,
    }
    boss.drift = 0.0;
    boss.attack = BossAttack::Idle;
    boss.timer = boss.kind.rest_ticks(boss.enraged);
}

fn slam(actor: &Actor, ctx: &mut TickCtx<'_>) {
    let pos = actor.body.pos();
    ctx.world.start_shake(6.0, 20);
    ctx.world.burst(actor.area, pos, 10, Sprite::Smoke);
    if ctx.player.body.pos().distance(pos) < SLAM_RADIUS {
        let source = HitSource {
            pos,
            owner: Owner::Entity(actor.id),
        };
        ctx.player.hit(SLAM_DAMAGE, source, ctx.world);
    }
}

/// Top the boss's own slimes back up, two at a time
fn summon(boss: &mut Boss, actor: &Actor, ctx: &mut TickCtx<'_>) {
    boss.summons.retain(|&id| ctx.board.is_live(id));
    let room = MAX_SUMMONS.saturating_sub(boss.summons.len()).min(2);
    for k in 0..room {
        let side = if k == 0 { -1.0 } else { 1.0 };
        let pos = actor.body.pos() + Vec2::new(side * 70.0, 0.0);
        let mut slime = creatures::slime(pos);
        slime.actor.area = actor.area;
        slime.actor.id = ctx.board.allocate_id();
        slime.final_load(ctx.world);
        boss.summons.push(ctx.board.insert(slime));
    }
    if room > 0 {
        ctx.world.sound(SoundCue::Spawn);
    }
}

/// Check the enrage threshold after damage
pub fn on_damaged(boss: &mut Boss, actor: &Actor, world: &mut WorldState) {
    if boss.enraged || !actor.is_alive() {
        return;
    }
    if actor.health() * boss.kind.enrage_divisor() < actor.max_health() {
        boss.enraged = true;
        world.announce(format!("The {} is enraged!", boss.kind.name()));
    }
}
