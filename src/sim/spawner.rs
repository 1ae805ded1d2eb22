//! Spawners
//!
//! A spawner produces creatures one at a time. Each spawned creature is
//! wrapped in a `Spawning` holder layer that carries it to its post and
//! records the spawner slot it occupies. The slot is reserved the moment the
//! creature is created and released when the creature leaves the board, no
//! matter how many layers were stacked on it in between.

use glam::Vec2;

use super::creatures::spawn_creature;
use super::entity::{Actor, Class, EntityId};
use super::holder::{HolderLayer, SlotRef, SpawnTravel};
use super::state::TickCtx;
use crate::platform::SoundCue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerState {
    Idle,
    /// Waiting for `entity` to reach its post
    Spawning { entity: EntityId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spawner {
    pub template: Class,
    /// Maximum tracked creatures alive at once (None = untracked)
    pub limit: Option<usize>,
    slots: Vec<Option<EntityId>>,
    /// Round-robin scan start
    scan: usize,
    /// Ticks between spawns
    pub delay: u32,
    timer: u32,
    pub state: SpawnerState,
    /// Post relative to the spawner; None leaves that axis alone
    pub offset: (Option<f32>, Option<f32>),
    /// Travel speed toward the post
    pub step: f32,
    /// Lateral jitter applied to each post
    pub jitter: f32,
}

impl Spawner {
    pub fn new(template: Class, limit: Option<usize>, delay: u32) -> Self {
        Self {
            template,
            limit,
            slots: vec![None; limit.unwrap_or(0)],
            scan: 0,
            delay,
            timer: delay / 2,
            state: SpawnerState::Idle,
            offset: (Some(0.0), Some(-140.0)),
            step: 3.0,
            jitter: 60.0,
        }
    }

    /// Slots currently holding an id
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn slot_ids(&self) -> &[Option<EntityId>] {
        &self.slots
    }

    /// First free slot in round-robin order; slots whose entity is gone count as free
    fn find_free_slot(&mut self, is_live: impl Fn(EntityId) -> bool) -> Option<usize> {
        let len = self.slots.len();
        for k in 0..len {
            let i = (self.scan + k) % len;
            let free = match self.slots[i] {
                None => true,
                Some(id) => !is_live(id),
            };
            if free {
                self.slots[i] = None;
                self.scan = (i + 1) % len;
                return Some(i);
            }
        }
        None
    }

    pub fn tick(&mut self, actor: &Actor, ctx: &mut TickCtx<'_>) {
        if self.state != SpawnerState::Idle {
            return;
        }
        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        let slot = match self.limit {
            Some(_) => {
                let board = &*ctx.board;
                match self.find_free_slot(|id| board.is_live(id)) {
                    Some(slot) => Some(slot),
                    None => return,
                }
            }
            None => None,
        };

        let origin = actor.body.pos();
        let Some(mut child) = spawn_creature(self.template, origin) else {
            log::warn!("spawner cannot build a {}", self.template.name());
            return;
        };
        child.actor.area = actor.area;
        let (dx, dy) = self.offset;
        let jitter = ctx.world.random_range(-self.jitter, self.jitter);
        let destination = Vec2::new(
            dx.map_or(origin.x, |dx| origin.x + dx + jitter),
            dy.map_or(origin.y, |dy| origin.y + dy),
        );
        child.actor.body.freeze_x(dx.is_none());
        child.actor.body.freeze_y(dy.is_none());
        child.actor.wrapper.push(HolderLayer::Spawning(SpawnTravel {
            destination,
            move_x: dx.is_some(),
            move_y: dy.is_some(),
            step: self.step,
            claim: SlotRef {
                spawner: actor.id,
                slot,
            },
        }));
        child.actor.id = ctx.board.allocate_id();
        child.final_load(ctx.world);
        let id = ctx.board.insert(child);
        if let Some(slot) = slot {
            self.slots[slot] = Some(id);
        }
        self.state = SpawnerState::Spawning { entity: id };
        ctx.world.sound(SoundCue::Spawn);
        log::debug!("spawner {:?} spawned {:?} into slot {:?}", actor.id, id, slot);
    }

    /// The spawned entity reached its post
    pub fn deployed(&mut self, id: EntityId) {
        if self.state == (SpawnerState::Spawning { entity: id }) {
            self.state = SpawnerState::Idle;
            self.timer = self.delay;
        }
    }

    /// An entity claimed by this spawner left the board
    pub fn release(&mut self, slot: Option<usize>, id: EntityId) {
        if let Some(held) = slot.and_then(|s| self.slots.get_mut(s))
            && *held == Some(id)
        {
            *held = None;
        }
        // Lost before it reached its post
        if self.state == (SpawnerState::Spawning { entity: id }) {
            self.state = SpawnerState::Idle;
            self.timer = self.delay;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::sim::board::Board;
    use crate::sim::entity::{Entity, EntityKind};
    use crate::sim::player::Player;
    use crate::sim::state::WorldState;
    use proptest::prelude::*;

    struct Harness {
        world: WorldState,
        player: Player,
        board: Board,
        spawner: EntityId,
    }

    impl Harness {
        fn new(limit: usize, delay: u32) -> Self {
            let mut world = WorldState::new(5, &Settings::deterministic());
            let mut board = Board::new();
            let spawner = board.insert(Entity::spawner(
                Vec2::new(0.0, 2000.0),
                Spawner::new(Class::Slime, Some(limit), delay),
            ));
            board.commit(&mut world);
            Self {
                world,
                player: Player::new(),
                board,
                spawner,
            }
        }

        fn step(&mut self) {
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

        fn spawner(&self) -> &Spawner {
            match &self.board.by_id(self.spawner).unwrap().kind {
                EntityKind::Spawner(sp) => sp,
                _ => panic!("not a spawner"),
            }
        }

        fn children(&self) -> Vec<EntityId> {
            self.board
                .iter()
                .filter(|e| e.class() == Class::Slime)
                .map(Entity::id)
                .collect()
        }
    }

    #[test]
    fn test_spawns_up_to_limit() {
        let mut h = Harness::new(2, 4);
        for _ in 0..400 {
            h.step();
        }
        assert_eq!(h.children().len(), 2);
        assert_eq!(h.spawner().occupied(), 2);
        assert_eq!(h.spawner().state, SpawnerState::Idle);
    }

    #[test]
    fn test_child_is_protected_while_travelling() {
        let mut h = Harness::new(1, 0);
        h.step();
        let child = h.children()[0];
        let e = h.board.by_id(child).unwrap();
        assert!(e.actor.is_spawning());
        assert!(e.actor.is_invulnerable());
        assert!(!e.is_target());
        assert!(matches!(h.spawner().state, SpawnerState::Spawning { entity } if entity == child));
    }

    #[test]
    fn test_death_frees_slot() {
        let mut h = Harness::new(1, 0);
        for _ in 0..120 {
            h.step();
        }
        let first = h.children()[0];
        assert!(!h.board.by_id(first).unwrap().actor.is_spawning());
        h.board.by_id_mut(first).unwrap().actor.die();
        h.board.commit(&mut h.world);
        assert_eq!(h.spawner().occupied(), 0);
        h.step();
        let second = h.children();
        assert_eq!(second.len(), 1);
        assert_ne!(second[0], first);
    }

    #[test]
    fn test_despawn_mid_travel_releases() {
        let mut h = Harness::new(1, 0);
        h.step();
        let child = h.children()[0];
        h.board.by_id_mut(child).unwrap().actor.despawn();
        h.board.commit(&mut h.world);
        assert_eq!(h.spawner().occupied(), 0);
        assert_eq!(h.spawner().state, SpawnerState::Idle);
    }

    #[test]
    fn test_unlimited_spawner_keeps_spawning() {
        let mut world = WorldState::new(5, &Settings::deterministic());
        let mut board = Board::new();
        board.insert(Entity::spawner(Vec2::new(0.0, 2000.0), Spawner::new(Class::Crawler, None, 0)));
        board.commit(&mut world);
        let mut h = Harness {
            world,
            player: Player::new(),
            board,
            spawner: EntityId(1),
        };
        for _ in 0..300 {
            h.step();
        }
        let crawlers = h.board.iter().filter(|e| e.class() == Class::Crawler).count();
        assert!(crawlers >= 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]
        #[test]
        fn prop_slots_are_conserved(limit in 1usize..4, kills in proptest::collection::vec((0usize..8, 1u32..40), 0..12)) {
            let mut h = Harness::new(limit, 2);
            for (victim, wait) in kills {
                for _ in 0..wait {
                    h.step();
                    let live = h.children().len() + h.board.pending_len();
                    prop_assert!(h.spawner().occupied() <= limit);
                    prop_assert!(live <= limit);
                }
                let children = h.children();
                if !children.is_empty() {
                    let id = children[victim % children.len()];
                    h.board.by_id_mut(id).unwrap().actor.die();
                    h.board.commit(&mut h.world);
                    // Every occupied slot points at a live child
                    for id in h.spawner().slot_ids().iter().flatten() {
                        prop_assert!(h.board.is_live(*id));
                    }
                }
            }
        }
    }
}
