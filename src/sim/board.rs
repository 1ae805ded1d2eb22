//! The ordered board
//!
//! Every live entity sits in a vector kept sorted by y (ties broken by id) as
//! of the last `commit`. Neighbourhood queries walk outward from an anchor
//! index and stop at the first candidate beyond the distance limit, so their
//! cost is proportional to the number of nearby entities. While an entity
//! ticks it is taken out of its slot, so the slot reads as empty.

use std::collections::HashMap;

use glam::Vec2;

use super::body::Body;
use super::entity::{Entity, EntityId, EntityKind};
use super::state::WorldState;
use crate::error::{SimError, SimResult};

/// Stateful scan position around an anchor index
///
/// `hi` is the next index to visit going forward, `lo` is one past the next
/// index to visit going back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderCursor {
    hi: usize,
    lo: usize,
}

impl OrderCursor {
    /// Cursor around a board member (the member itself is skipped)
    pub fn member(index: usize) -> Self {
        Self {
            hi: index + 1,
            lo: index,
        }
    }

    /// Cursor around an insertion point (a position that is not on the board)
    pub fn probe(insert_at: usize) -> Self {
        Self {
            hi: insert_at,
            lo: insert_at,
        }
    }

    /// Restart both scan directions around `index`
    pub fn recenter(&mut self, index: usize) {
        *self = Self::member(index);
    }
}

/// Where a neighbourhood query starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// A board member: (index at last commit, current y)
    Member(usize, f32),
    /// An arbitrary y that is not on the board (the player, a hitbox)
    Probe(f32),
}

/// Result of `exclude_wall_safe`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exclusion {
    /// Total correction applied to the mover
    pub pushed: Vec2,
    /// Entities still touching the mover after the y push
    pub contacts: Vec<EntityId>,
}

#[derive(Debug, Default)]
pub struct Board {
    slots: Vec<Option<Entity>>,
    /// y of every slot as of the last commit (drives binary search)
    order_y: Vec<f32>,
    /// Spawned this tick, merged at the next commit
    pending: Vec<Entity>,
    /// Id -> index as of the last commit; lookup only, never iterated
    lookup: HashMap<EntityId, usize>,
    next_id: u32,
    max_radius: f32,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Largest body radius on the board (widens collision scans)
    pub fn max_radius(&self) -> f32 {
        self.max_radius
    }

    /// Reserve a fresh id without inserting anything
    pub fn allocate_id(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }

    /// Queue an entity; it joins the ordered board at the next commit
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        if !entity.actor.id.is_assigned() {
            entity.actor.id = self.allocate_id();
        }
        entity.adopt_items();
        let id = entity.actor.id;
        self.pending.push(entity);
        id
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.lookup.get(&id).copied()
    }

    pub fn by_id(&self, id: EntityId) -> Option<&Entity> {
        match self.index_of(id) {
            Some(i) => self.get(i),
            None => self.pending.iter().find(|e| e.id() == id),
        }
    }

    pub fn by_id_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        match self.index_of(id) {
            Some(i) => self.slots.get_mut(i).and_then(Option::as_mut),
            None => self.pending.iter_mut().find(|e| e.id() == id),
        }
    }

    /// Is `id` on the board (or pending) and alive?
    ///
    /// An entity that is currently taken out for its own tick is reported
    /// as live; it cannot be dead while it is running.
    pub fn is_live(&self, id: EntityId) -> bool {
        match self.index_of(id) {
            Some(i) => match self.slots.get(i) {
                Some(Some(e)) => e.is_alive(),
                Some(None) => true,
                None => false,
            },
            None => self.pending.iter().any(|e| e.id() == id && e.is_alive()),
        }
    }

    /// Take an entity out of its slot for its tick
    pub fn take(&mut self, index: usize) -> SimResult<Entity> {
        self.slots
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(SimError::InvalidBoardIndex(index))
    }

    /// Put a taken entity back
    pub fn restore(&mut self, index: usize, entity: Entity) -> SimResult<()> {
        match self.slots.get_mut(index) {
            Some(slot @ None) => {
                *slot = Some(entity);
                Ok(())
            }
            _ => Err(SimError::InvalidBoardIndex(index)),
        }
    }

    /// Entities in board order (taken slots skipped)
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    /// Pending and committed entities
    pub fn iter_all_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.slots
            .iter_mut()
            .filter_map(Option::as_mut)
            .chain(self.pending.iter_mut())
    }

    /// Insertion point for `y` in board order
    pub fn locate(&self, y: f32) -> usize {
        self.order_y.partition_point(|&v| v < y)
    }

    fn cursor_at(&self, anchor: Anchor) -> (OrderCursor, f32) {
        match anchor {
            Anchor::Member(index, y) => (OrderCursor::member(index), y),
            Anchor::Probe(y) => (OrderCursor::probe(self.locate(y)), y),
        }
    }

    /// Next live entity forward in board order accepted by `accept`
    ///
    /// Stops (without consuming it) at the first entity further than `limit`
    /// from `origin_y`, so a later call with a larger limit resumes there.
    pub fn next_entity_inorder<F>(
        &self,
        cursor: &mut OrderCursor,
        origin_y: f32,
        limit: Option<f32>,
        mut accept: F,
    ) -> Option<usize>
    where
        F: FnMut(&Entity) -> bool,
    {
        while cursor.hi < self.slots.len() {
            let i = cursor.hi;
            let Some(e) = self.slots[i].as_ref() else {
                cursor.hi += 1;
                continue;
            };
            if limit.is_some_and(|l| (e.y() - origin_y).abs() > l) {
                return None;
            }
            cursor.hi += 1;
            if e.is_alive() && accept(e) {
                return Some(i);
            }
        }
        None
    }

    /// Mirror of `next_entity_inorder` walking backward
    pub fn prev_entity_inorder<F>(
        &self,
        cursor: &mut OrderCursor,
        origin_y: f32,
        limit: Option<f32>,
        mut accept: F,
    ) -> Option<usize>
    where
        F: FnMut(&Entity) -> bool,
    {
        while cursor.lo > 0 {
            let i = cursor.lo - 1;
            let Some(e) = self.slots.get(i).and_then(Option::as_ref) else {
                cursor.lo -= 1;
                continue;
            };
            if limit.is_some_and(|l| (e.y() - origin_y).abs() > l) {
                return None;
            }
            cursor.lo -= 1;
            if e.is_alive() && accept(e) {
                return Some(i);
            }
        }
        None
    }

    /// Every accepted live entity within `range` of the anchor, in board order
    pub fn all_in_range<F>(&self, anchor: Anchor, range: f32, mut accept: F) -> Vec<usize>
    where
        F: FnMut(&Entity) -> bool,
    {
        let (mut cursor, origin_y) = self.cursor_at(anchor);
        let mut found = Vec::new();
        while let Some(i) = self.prev_entity_inorder(&mut cursor, origin_y, Some(range), &mut accept) {
            found.push(i);
        }
        found.reverse();
        while let Some(i) = self.next_entity_inorder(&mut cursor, origin_y, Some(range), &mut accept) {
            found.push(i);
        }
        found
    }

    /// Entities whose bodies overlap `body`
    ///
    /// An entity only counts when `priority >= immune_collide_below` of that
    /// entity. The scan reaches `body.radius() + max_radius` either way.
    pub fn colliding<F>(&self, body: &Body, priority: i32, anchor: Anchor, mut accept: F) -> Vec<usize>
    where
        F: FnMut(&Entity) -> bool,
    {
        let reach = body.radius() + self.max_radius;
        self.all_in_range(anchor, reach, |e| {
            priority >= e.actor.immune_collide_below && accept(e) && body.collide(&e.actor.body)
        })
    }

    /// Resolve `mover`'s overlaps after it moved by `moved`
    ///
    /// First one push along y: against the direction of travel, far enough to
    /// clear the tightest conflicting displacer. Then every entity still
    /// touching the mover is reported to `on_hit`, and displacers that still
    /// overlap push the mover out sideways.
    pub fn exclude_wall_safe<D, H>(
        &mut self,
        mover: &mut Body,
        priority: i32,
        anchor: Anchor,
        moved: Vec2,
        displace: D,
        mut on_hit: H,
    ) -> Exclusion
    where
        D: Fn(&Entity) -> bool,
        H: FnMut(&mut Entity),
    {
        let start = mover.pos();
        let conflicts = self.colliding(mover, priority, anchor, &displace);
        if !conflicts.is_empty() {
            let dir = if moved.y > 0.0 {
                -1.0
            } else if moved.y < 0.0 {
                1.0
            } else {
                // Stationary: step away from the first conflict
                let first = self.get(conflicts[0]).map_or(mover.y(), Entity::y);
                if mover.y() >= first { 1.0 } else { -1.0 }
            };
            let half = mover.half_height();
            let target = conflicts
                .iter()
                .filter_map(|&i| self.get(i))
                .map(|e| {
                    let r = e.actor.body.aabb();
                    if dir < 0.0 { r.min.y - half } else { r.max.y + half }
                })
                .reduce(|a, b| if dir < 0.0 { a.min(b) } else { a.max(b) });
            if let Some(y) = target {
                mover.set_y(y);
            }
        }

        let anchor = match anchor {
            Anchor::Member(index, _) => Anchor::Member(index, mover.y()),
            Anchor::Probe(_) => Anchor::Probe(mover.y()),
        };
        let touching = self.colliding(mover, priority, anchor, |_| true);
        let mut contacts = Vec::with_capacity(touching.len());
        for i in touching {
            let Some(e) = self.slots[i].as_mut() else {
                continue;
            };
            on_hit(e);
            contacts.push(e.id());
            if displace(e) && mover.collide(&e.actor.body) {
                let theirs = e.actor.body.aabb();
                let mine = mover.aabb();
                let left = mine.max.x - theirs.min.x;
                let right = theirs.max.x - mine.min.x;
                if left < right {
                    mover.translate(Vec2::new(-left, 0.0));
                } else {
                    mover.translate(Vec2::new(right, 0.0));
                }
            }
        }
        Exclusion {
            pushed: mover.pos() - start,
            contacts,
        }
    }

    /// Reap dead entities, merge spawns and re-sort
    ///
    /// Dead entities release every spawner claim their wrapper chain holds and
    /// run their death hooks (unless they were despawned). Returns the
    /// removed entities.
    pub fn commit(&mut self, world: &mut WorldState) -> Vec<Entity> {
        let mut survivors = Vec::with_capacity(self.slots.len() + self.pending.len());
        let mut removed = Vec::new();
        for entity in self.slots.drain(..).flatten() {
            if entity.is_alive() {
                survivors.push(entity);
            } else {
                removed.push(entity);
            }
        }

        for entity in &mut removed {
            for claim in entity.actor.wrapper.lose() {
                let spawner = survivors
                    .iter_mut()
                    .chain(self.pending.iter_mut())
                    .find(|e| e.id() == claim.spawner);
                if let Some(EntityKind::Spawner(sp)) = spawner.map(|e| &mut e.kind) {
                    sp.release(claim.slot, entity.actor.id);
                }
            }
            world.registry.forget(entity.class(), entity.actor.id);
            if !entity.actor.despawned {
                for drop in entity.on_death(world) {
                    self.insert(drop);
                }
            }
        }

        for mut entity in self.pending.drain(..) {
            if entity.is_alive() {
                survivors.push(entity);
            } else {
                entity.actor.wrapper.lose();
            }
        }

        survivors.sort_by(|a, b| a.y().total_cmp(&b.y()).then(a.id().cmp(&b.id())));
        self.lookup.clear();
        self.order_y.clear();
        self.max_radius = 0.0;
        for (index, entity) in survivors.iter_mut().enumerate() {
            entity.actor.index = index;
            self.lookup.insert(entity.actor.id, index);
            self.order_y.push(entity.y());
            self.max_radius = self.max_radius.max(entity.actor.body.radius());
        }
        self.slots = survivors.into_iter().map(Some).collect();

        if !removed.is_empty() {
            log::trace!("board commit: {} removed, {} live", removed.len(), self.slots.len());
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::entity::Class;
    use crate::sim::creatures::spawn_creature;
    use crate::Settings;

    fn world() -> WorldState {
        WorldState::new(7, &Settings::deterministic())
    }

    fn board_with(ys: &[f32]) -> (Board, Vec<EntityId>) {
        let mut board = Board::new();
        let ids = ys
            .iter()
            .map(|&y| board.insert(spawn_creature(Class::Slime, Vec2::new(0.0, y)).unwrap()))
            .collect();
        board.commit(&mut world());
        (board, ids)
    }

    #[test]
    fn test_commit_sorts_by_y_then_id() {
        let (board, ids) = board_with(&[50.0, 10.0, 50.0, 30.0]);
        let order: Vec<EntityId> = board.iter().map(Entity::id).collect();
        assert_eq!(order, vec![ids[1], ids[3], ids[0], ids[2]]);
        for (i, e) in board.iter().enumerate() {
            assert_eq!(e.actor.index, i);
            assert_eq!(board.index_of(e.id()), Some(i));
        }
    }

    #[test]
    fn test_limit_does_not_consume_candidate() {
        let (board, _) = board_with(&[0.0, 10.0, 100.0]);
        let mut cursor = OrderCursor::member(0);
        assert_eq!(board.next_entity_inorder(&mut cursor, 0.0, Some(20.0), |_| true), Some(1));
        assert_eq!(board.next_entity_inorder(&mut cursor, 0.0, Some(20.0), |_| true), None);
        // The far entity is still there for a wider query
        assert_eq!(board.next_entity_inorder(&mut cursor, 0.0, Some(200.0), |_| true), Some(2));
    }

    #[test]
    fn test_all_in_range_is_sorted() {
        let (board, _) = board_with(&[0.0, 40.0, 80.0, 120.0, 400.0]);
        let found = board.all_in_range(Anchor::Probe(70.0), 60.0, |_| true);
        assert_eq!(found, vec![1, 2, 3]);
        let around = board.all_in_range(Anchor::Member(2, 80.0), 50.0, |_| true);
        assert_eq!(around, vec![1, 3]);
    }

    #[test]
    fn test_taken_slot_is_skipped() {
        let (mut board, ids) = board_with(&[0.0, 10.0, 20.0]);
        let taken = board.take(1).unwrap();
        assert_eq!(taken.id(), ids[1]);
        assert!(board.take(1).is_err());
        let found = board.all_in_range(Anchor::Probe(10.0), 50.0, |_| true);
        assert_eq!(found, vec![0, 2]);
        assert!(board.is_live(ids[1]));
        board.restore(1, taken).unwrap();
        assert!(board.restore(1, spawn_creature(Class::Slime, Vec2::ZERO).unwrap()).is_err());
    }

    #[test]
    fn test_invalid_index_errors() {
        let (mut board, _) = board_with(&[0.0]);
        assert!(matches!(board.take(9), Err(SimError::InvalidBoardIndex(9))));
    }

    #[test]
    fn test_priority_gates_collision() {
        let mut board = Board::new();
        board.insert(Entity::obstacle(Vec2::new(0.0, 0.0)));
        board.commit(&mut world());
        let probe = Body::new(Vec2::new(0.0, 5.0), Vec2::new(20.0, 20.0));
        assert!(board.colliding(&probe, COLLIDE_MOVEMENT, Anchor::Probe(5.0), |_| true).is_empty());
        assert_eq!(board.colliding(&probe, COLLIDE_PLAYER, Anchor::Probe(5.0), |_| true), vec![0]);
        assert_eq!(board.colliding(&probe, COLLIDE_ATTACK, Anchor::Probe(5.0), |_| true), vec![0]);
    }

    #[test]
    fn test_exclusion_pushes_back_along_y() {
        let mut board = Board::new();
        board.insert(Entity::obstacle(Vec2::new(0.0, 100.0)));
        board.commit(&mut world());
        // Obstacle spans y 84..116; a 32-tall mover moving up into it
        let mut mover = Body::new(Vec2::new(0.0, 75.0), Vec2::new(32.0, 32.0));
        let result = board.exclude_wall_safe(
            &mut mover,
            COLLIDE_PLAYER,
            Anchor::Probe(75.0),
            Vec2::new(0.0, 10.0),
            |e| e.is_solid(),
            |_| {},
        );
        assert_eq!(mover.y(), 68.0);
        assert_eq!(result.pushed, Vec2::new(0.0, -7.0));
        assert!(!mover.collide(&board.get(0).unwrap().actor.body));
    }

    #[test]
    fn test_exclusion_uses_tightest_constraint() {
        let mut board = Board::new();
        board.insert(Entity::obstacle(Vec2::new(-20.0, 100.0)));
        board.insert(Entity::obstacle(Vec2::new(20.0, 90.0)));
        board.commit(&mut world());
        let mut mover = Body::new(Vec2::new(0.0, 80.0), Vec2::new(32.0, 32.0));
        board.exclude_wall_safe(
            &mut mover,
            COLLIDE_PLAYER,
            Anchor::Probe(80.0),
            Vec2::new(0.0, 10.0),
            |e| e.is_solid(),
            |_| {},
        );
        // Clears the lower obstacle (min y 74), and so the higher one too
        assert_eq!(mover.y(), 58.0);
        assert!(board.iter().all(|e| !mover.collide(&e.actor.body)));
    }

    #[test]
    fn test_exclusion_reports_contacts() {
        let mut board = Board::new();
        let slime = board.insert(spawn_creature(Class::Slime, Vec2::new(0.0, 10.0)).unwrap());
        board.commit(&mut world());
        let mut mover = Body::new(Vec2::new(0.0, 0.0), Vec2::new(32.0, 32.0));
        let mut touched = Vec::new();
        let result = board.exclude_wall_safe(
            &mut mover,
            COLLIDE_PLAYER,
            Anchor::Probe(0.0),
            Vec2::ZERO,
            |e| e.is_solid(),
            |e| touched.push(e.id()),
        );
        // Slimes are not solid: no push, but the contact is reported
        assert_eq!(result.pushed, Vec2::ZERO);
        assert_eq!(touched, vec![slime]);
        assert_eq!(result.contacts, vec![slime]);
    }

    #[test]
    fn test_commit_reaps_dead() {
        let (mut board, ids) = board_with(&[0.0, 10.0]);
        board.get_mut(0).unwrap().actor.die();
        let removed = board.commit(&mut world());
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id(), ids[0]);
        assert_eq!(board.len(), 1);
        assert_eq!(board.index_of(ids[1]), Some(0));
        assert_eq!(board.index_of(ids[0]), None);
    }

    #[test]
    fn test_insert_is_pending_until_commit() {
        let (mut board, _) = board_with(&[0.0]);
        let id = board.insert(spawn_creature(Class::Slime, Vec2::new(0.0, 5.0)).unwrap());
        assert_eq!(board.len(), 1);
        assert_eq!(board.pending_len(), 1);
        assert!(board.is_live(id));
        board.commit(&mut world());
        assert_eq!(board.len(), 2);
        assert_eq!(board.index_of(id), Some(1));
    }
}
