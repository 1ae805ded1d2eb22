//! Arrows and thrown items

use glam::Vec2;

use super::creatures;
use super::entity::{Actor, Entity, HitSource, Owner};
use super::items::{DAGGER_DAMAGE, Item, ItemKind};
use super::sprite::Sprite;
use super::state::TickCtx;
use crate::consts::*;

pub const ARROW_SPEED: f32 = 12.0;
pub const ARROW_TTL: u32 = 60;
pub const ARROW_DAMAGE: i32 = 2;
/// Thrown items land after this long even if their glide never stops
const THROWN_TTL: u32 = 120;

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Arrow,
    /// An item in flight; it lands as a ground item (or a bomb)
    Thrown(Item),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub owner: Owner,
    pub damage: i32,
    /// Per-tick velocity (arrows); thrown items ride their glide instead
    pub velocity: Vec2,
    pub ttl: u32,
    pub payload: Payload,
}

impl Projectile {
    pub fn arrow(owner: Owner, direction: Vec2) -> Self {
        Self {
            owner,
            damage: ARROW_DAMAGE,
            velocity: direction.normalize_or_zero() * ARROW_SPEED,
            ttl: ARROW_TTL,
            payload: Payload::Arrow,
        }
    }

    pub fn thrown(owner: Owner, item: Item) -> Self {
        let damage = match item.kind {
            ItemKind::Dagger => DAGGER_DAMAGE,
            _ => 0,
        };
        Self {
            owner,
            damage,
            velocity: Vec2::ZERO,
            ttl: THROWN_TTL,
            payload: Payload::Thrown(item),
        }
    }

    pub fn is_thrown(&self) -> bool {
        matches!(self.payload, Payload::Thrown(_))
    }

    pub fn sprite(&self) -> Sprite {
        match &self.payload {
            Payload::Arrow => Sprite::Arrow,
            Payload::Thrown(item) => item.sprite(),
        }
    }

    /// Body rotation in degrees
    pub fn rotation(&self) -> f32 {
        if self.velocity.length_squared() > 0.0 {
            self.velocity.y.atan2(self.velocity.x).to_degrees()
        } else {
            90.0
        }
    }
}

pub fn tick_projectile(p: &mut Projectile, actor: &mut Actor, ctx: &mut TickCtx<'_>) {
    if !actor.is_alive() {
        return;
    }
    p.ttl = p.ttl.saturating_sub(1);
    actor.body.translate(p.velocity);
    if p.ttl == 0 || actor.body.x().abs() > TRACK_HALF_WIDTH + 40.0 {
        land(p, actor, ctx);
        return;
    }
    if p.damage <= 0 {
        return;
    }

    let source = HitSource {
        pos: actor.body.pos(),
        owner: p.owner,
    };
    let struck = match p.owner {
        Owner::Player => {
            let hits = ctx
                .board
                .colliding(&actor.body, actor.collide_priority, actor.anchor(), |e| e.is_target());
            match hits.first().and_then(|&i| ctx.board.get_mut(i)) {
                Some(target) => {
                    target.hit(p.damage, source, ctx.world);
                    true
                }
                None => false,
            }
        }
        Owner::Entity(_) => {
            if actor.body.collide(&ctx.player.body) {
                ctx.player.hit(p.damage, source, ctx.world);
                true
            } else {
                false
            }
        }
    };
    if struck {
        if let Some(glide) = actor.glide.as_mut() {
            glide.halt();
        }
        land(p, actor, ctx);
    }
}

/// End of flight: arrows vanish, thrown items come to rest
pub fn land(p: &mut Projectile, actor: &mut Actor, ctx: &mut TickCtx<'_>) {
    if !actor.is_alive() {
        return;
    }
    actor.die();
    let Payload::Thrown(item) = &p.payload else {
        return;
    };
    let pos = actor.body.pos();
    let mut landed = match item.kind {
        ItemKind::BombItem => creatures::bomb(pos, Some(p.owner)),
        _ => Entity::dropped(pos, item.clone()),
    };
    landed.actor.area = actor.area;
    ctx.board.insert(landed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::sim::board::Board;
    use crate::sim::entity::{Class, EntityId, EntityKind};
    use crate::sim::player::Player;
    use crate::sim::state::WorldState;

    fn run(entity: Entity, player: &mut Player, board: &mut Board, world: &mut WorldState, ticks: u32) {
        board.insert(entity);
        board.commit(world);
        for _ in 0..ticks {
            for i in 0..board.len() {
                let Ok(mut e) = board.take(i) else { continue };
                let mut ctx = TickCtx { world: &mut *world, player: &mut *player, board: &mut *board };
                e.tick(&mut ctx).unwrap();
                board.restore(i, e).unwrap();
            }
            board.commit(world);
        }
    }

    #[test]
    fn test_enemy_arrow_hits_player() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut board = Board::new();
        let mut player = Player::new();
        let start = player.body.pos() + Vec2::new(0.0, 60.0);
        let arrow = Entity::projectile(start, Projectile::arrow(Owner::Entity(EntityId(99)), Vec2::NEG_Y));
        run(arrow, &mut player, &mut board, &mut world, 10);
        assert_eq!(player.health(), PLAYER_MAX_HEALTH - ARROW_DAMAGE);
        assert!(board.iter().all(|e| e.class() != Class::Projectile));
    }

    #[test]
    fn test_arrow_expires() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut board = Board::new();
        let mut player = Player::new();
        let arrow = Entity::projectile(Vec2::new(0.0, 2000.0), Projectile::arrow(Owner::Player, Vec2::Y));
        run(arrow, &mut player, &mut board, &mut world, ARROW_TTL);
        assert!(board.is_empty());
    }

    #[test]
    fn test_thrown_dagger_lands_as_item() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut board = Board::new();
        let mut player = Player::new();
        let mut dagger = Entity::projectile(Vec2::new(0.0, 1000.0), Projectile::thrown(Owner::Player, Item::dagger()));
        dagger.actor.start_glide(14.0, 8, 1.0, 1.0);
        run(dagger, &mut player, &mut board, &mut world, 40);
        assert_eq!(board.len(), 1);
        let landed = board.get(0).unwrap();
        assert!(matches!(&landed.kind, EntityKind::Dropped(item) if item.name() == "dagger"));
        assert!(landed.y() > 1000.0);
    }
}
