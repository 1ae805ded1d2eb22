//! Items: weapons and tools held in hands or lying on the ground
//!
//! An item is either in one of the player's hands, in one of an entity's
//! hands, or on the ground (as a `Dropped` entity). Holders expose a
//! `HolderView` so the item can work out where it is and who it strikes.

use glam::Vec2;

use super::board::{Anchor, Board};
use super::body::Body;
use super::camera::Camera;
use super::entity::{Entity, EntityId, HitSource, Owner};
use super::player::Player;
use super::projectile::Projectile;
use super::sprite::Sprite;
use super::state::WorldState;
use crate::consts::*;
use crate::platform::{SoundCue, Surface};
use crate::{heading, sign};

pub const SWORD_SWING_TICKS: u32 = 12;
/// Half-angle of the sword arc in degrees
pub const SWORD_ARC: f32 = 60.0;
pub const SWORD_DAMAGE: i32 = 3;
pub const SWORD_COOLDOWN: u32 = 20;

pub const SPEAR_THRUST_TICKS: u32 = 10;
pub const SPEAR_DAMAGE: i32 = 4;
pub const SPEAR_COOLDOWN: u32 = 30;
/// Extra reach at full extension
pub const SPEAR_REACH: f32 = 40.0;

pub const SHIELD_RAISE_TICKS: u32 = 30;
pub const SHIELD_COOLDOWN: u32 = 40;

pub const BOW_COOLDOWN: u32 = 40;

pub const DAGGER_DAMAGE: i32 = 3;
/// (speed, duration, taper) of a thrown dagger
pub const DAGGER_THROW: (f32, u32, f32) = (14.0, 8, 1.0);
/// (speed, duration, taper) of a thrown bomb
pub const BOMB_THROW: (f32, u32, f32) = (10.0, 6, 1.0);

/// Lateral offset of each hand from the holder's centre
const HAND_OFFSET: f32 = 14.0;

/// Where an item currently is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemPos {
    /// In one of the player's hands
    Hand(usize),
    /// In hand `.1` of entity `.0`
    HeldBy(EntityId, usize),
    Ground(Vec2),
}

/// What an item needs to know about whoever holds it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HolderView {
    pub owner: Owner,
    pub pos: Vec2,
    pub facing: f32,
    pub hand: usize,
    pub area: usize,
}

impl HolderView {
    pub fn with_hand(&self, hand: usize) -> Self {
        Self { hand, ..*self }
    }

    pub fn hand_pos(&self) -> Vec2 {
        let side = if self.hand == 0 { -1.0 } else { 1.0 };
        self.pos + Vec2::new(side * HAND_OFFSET, 0.0)
    }

    /// Forward heading in degrees (90 = increasing y)
    pub fn base_angle(&self) -> f32 {
        if self.facing < 0.0 { 270.0 } else { 90.0 }
    }
}

/// An attack in progress
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Swing {
    remaining: u32,
    struck: Vec<EntityId>,
    struck_player: bool,
}

impl Swing {
    fn start(&mut self, ticks: u32) {
        self.remaining = ticks;
        self.struck.clear();
        self.struck_player = false;
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// 0 at the first tick of the swing, approaching 1 at the last
    fn progress(&self, total: u32) -> f32 {
        1.0 - self.remaining as f32 / total as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Sword(Swing),
    Spear(Swing),
    Shield { raised: u32 },
    Bow,
    Dagger,
    BombItem,
}

/// Outcome of using an item
#[derive(Debug, Clone)]
pub enum ItemAction {
    Nothing,
    /// Put a new entity on the board (arrows)
    Spawn(Entity),
    /// The item leaves the hand and travels as this entity
    Throw(Entity),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub kind: ItemKind,
    pub pos: ItemPos,
    cooldown: u32,
}

impl Item {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            pos: ItemPos::Hand(0),
            cooldown: 0,
        }
    }

    pub fn sword() -> Self {
        Self::new(ItemKind::Sword(Swing::default()))
    }

    pub fn spear() -> Self {
        Self::new(ItemKind::Spear(Swing::default()))
    }

    pub fn shield() -> Self {
        Self::new(ItemKind::Shield { raised: 0 })
    }

    pub fn bow() -> Self {
        Self::new(ItemKind::Bow)
    }

    pub fn dagger() -> Self {
        Self::new(ItemKind::Dagger)
    }

    pub fn bomb() -> Self {
        Self::new(ItemKind::BombItem)
    }

    /// Reward item picked by a roll in [0, 4]
    pub fn gift(roll: i32) -> Self {
        match roll {
            0 => Self::spear(),
            1 => Self::shield(),
            2 => Self::bow(),
            3 => Self::dagger(),
            _ => Self::bomb(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            ItemKind::Sword(_) => "sword",
            ItemKind::Spear(_) => "spear",
            ItemKind::Shield { .. } => "shield",
            ItemKind::Bow => "bow",
            ItemKind::Dagger => "dagger",
            ItemKind::BombItem => "bomb",
        }
    }

    pub fn sprite(&self) -> Sprite {
        match self.kind {
            ItemKind::Sword(_) => Sprite::Sword,
            ItemKind::Spear(_) => Sprite::Spear,
            ItemKind::Shield { .. } => Sprite::Shield,
            ItemKind::Bow => Sprite::Bow,
            ItemKind::Dagger => Sprite::Dagger,
            ItemKind::BombItem => Sprite::BombItem,
        }
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Mid-swing or mid-thrust
    pub fn is_busy(&self) -> bool {
        match &self.kind {
            ItemKind::Sword(swing) | ItemKind::Spear(swing) => swing.is_active(),
            _ => false,
        }
    }

    pub fn is_raised(&self) -> bool {
        matches!(self.kind, ItemKind::Shield { raised } if raised > 0)
    }

    /// Clear transient state (dropped or thrown)
    pub fn reset(&mut self) {
        self.cooldown = 0;
        match &mut self.kind {
            ItemKind::Sword(swing) | ItemKind::Spear(swing) => *swing = Swing::default(),
            ItemKind::Shield { raised } => *raised = 0,
            _ => {}
        }
    }

    /// The holder's view narrowed to the hand this item sits in
    ///
    /// None when the item is on the ground or `holder` is not the one its
    /// position names.
    pub fn held_view(&self, holder: &HolderView) -> Option<HolderView> {
        match (self.pos, holder.owner) {
            (ItemPos::Hand(hand), Owner::Player) => Some(holder.with_hand(hand)),
            (ItemPos::HeldBy(id, hand), Owner::Entity(owner)) if id == owner => Some(holder.with_hand(hand)),
            _ => None,
        }
    }

    /// World position of the item
    pub fn world_pos(&self, holder: &HolderView) -> Option<Vec2> {
        match self.pos {
            ItemPos::Ground(pos) => Some(pos),
            ItemPos::Hand(_) | ItemPos::HeldBy(..) => self.held_view(holder).map(|view| view.hand_pos()),
        }
    }

    /// Use the item; `aim` points at the intended target
    pub fn action(&mut self, holder: &HolderView, aim: Vec2, world: &mut WorldState) -> ItemAction {
        if self.cooldown > 0 || self.is_busy() {
            return ItemAction::Nothing;
        }
        let Some(view) = self.held_view(holder) else {
            return ItemAction::Nothing;
        };
        match &mut self.kind {
            ItemKind::Sword(swing) => {
                swing.start(SWORD_SWING_TICKS);
                self.cooldown = SWORD_COOLDOWN;
                world.sound(SoundCue::Swing);
                ItemAction::Nothing
            }
            ItemKind::Spear(swing) => {
                swing.start(SPEAR_THRUST_TICKS);
                self.cooldown = SPEAR_COOLDOWN;
                world.sound(SoundCue::Swing);
                ItemAction::Nothing
            }
            ItemKind::Shield { raised } => {
                *raised = SHIELD_RAISE_TICKS;
                self.cooldown = SHIELD_COOLDOWN;
                ItemAction::Nothing
            }
            ItemKind::Bow => {
                self.cooldown = BOW_COOLDOWN;
                world.sound(SoundCue::Shoot);
                let dir = if aim.length_squared() > 0.0 {
                    aim.normalize()
                } else {
                    Vec2::new(0.0, view.facing)
                };
                let mut arrow = Entity::projectile(view.hand_pos(), Projectile::arrow(view.owner, dir));
                arrow.actor.area = view.area;
                ItemAction::Spawn(arrow)
            }
            ItemKind::Dagger | ItemKind::BombItem => {
                let (speed, duration, taper) = if matches!(self.kind, ItemKind::Dagger) {
                    DAGGER_THROW
                } else {
                    BOMB_THROW
                };
                let mut item = self.clone();
                item.reset();
                let mut thrown = Entity::projectile(view.hand_pos(), Projectile::thrown(view.owner, item));
                thrown.actor.area = view.area;
                thrown.actor.start_glide(speed, duration, taper, view.facing);
                ItemAction::Throw(thrown)
            }
        }
    }

    /// Blade hitbox while swinging/thrusting
    pub fn hitbox(&self, holder: &HolderView) -> Option<Body> {
        let view = self.held_view(holder)?;
        match &self.kind {
            ItemKind::Sword(swing) if swing.is_active() => {
                let p = swing.progress(SWORD_SWING_TICKS);
                let angle = view.base_angle() + SWORD_ARC - 2.0 * SWORD_ARC * p;
                let size = Sprite::Sword.size();
                let center = view.hand_pos() + heading(angle) * (size.x / 2.0 + 6.0);
                let mut body = Body::new(center, size);
                body.set_rotation(angle);
                Some(body)
            }
            ItemKind::Spear(swing) if swing.is_active() => {
                let p = swing.progress(SPEAR_THRUST_TICKS);
                let extension = (std::f32::consts::PI * p).sin() * SPEAR_REACH;
                let angle = view.base_angle();
                let size = Sprite::Spear.size();
                let center = view.hand_pos() + heading(angle) * (size.x / 2.0 + extension);
                let mut body = Body::new(center, size);
                body.set_rotation(angle);
                Some(body)
            }
            _ => None,
        }
    }

    /// Would this item stop a hit coming from `source`?
    pub fn blocks(&self, holder: &HolderView, source: Vec2) -> bool {
        self.is_raised()
            && self
                .held_view(holder)
                .is_some_and(|view| sign(source.y - view.pos.y) == sign(view.facing))
    }

    /// Advance timers and resolve blade hits
    pub fn tick(
        &mut self,
        holder: &HolderView,
        board: &mut Board,
        player: Option<&mut Player>,
        world: &mut WorldState,
    ) {
        self.cooldown = self.cooldown.saturating_sub(1);
        let (damage, hitbox) = match &self.kind {
            ItemKind::Sword(_) => (SWORD_DAMAGE, self.hitbox(holder)),
            ItemKind::Spear(_) => (SPEAR_DAMAGE, self.hitbox(holder)),
            _ => (0, None),
        };
        match &mut self.kind {
            ItemKind::Sword(swing) | ItemKind::Spear(swing) => {
                if let Some(blade) = hitbox {
                    strike(&blade, damage, swing, holder, board, player, world);
                    swing.remaining -= 1;
                }
            }
            ItemKind::Shield { raised } => *raised = raised.saturating_sub(1),
            _ => {}
        }
    }

    pub fn draw(&self, holder: &HolderView, surface: &mut dyn Surface, camera: &Camera, shake: f32) {
        if let Some(blade) = self.hitbox(holder) {
            surface.draw(self.sprite(), camera.to_screen(blade.pos(), shake), blade.rotation());
            return;
        }
        let Some(pos) = self.world_pos(holder) else {
            return;
        };
        let angle = match self.pos {
            ItemPos::Ground(_) => 0.0,
            ItemPos::Hand(_) | ItemPos::HeldBy(..) => holder.base_angle(),
        };
        surface.draw(self.sprite(), camera.to_screen(pos, shake), angle);
    }
}

/// Apply a blade's damage to whatever it overlaps, once per swing
fn strike(
    blade: &Body,
    damage: i32,
    swing: &mut Swing,
    view: &HolderView,
    board: &mut Board,
    player: Option<&mut Player>,
    world: &mut WorldState,
) {
    let source = HitSource {
        pos: view.pos,
        owner: view.owner,
    };
    match view.owner {
        Owner::Player => {
            let hits = board.colliding(blade, COLLIDE_ATTACK, Anchor::Probe(blade.y()), |e| {
                e.is_target() && !swing.struck.contains(&e.id())
            });
            for i in hits {
                if let Some(target) = board.get_mut(i) {
                    swing.struck.push(target.id());
                    target.hit(damage, source, world);
                }
            }
        }
        Owner::Entity(_) => {
            if let Some(player) = player
                && !swing.struck_player
                && blade.collide(&player.body)
            {
                swing.struck_player = true;
                player.hit(damage, source, world);
            }
        }
    }
}

/// A set of hands
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    hands: Vec<Option<Item>>,
    /// None when the player holds it
    holder: Option<EntityId>,
}

impl Inventory {
    pub fn new(count: usize) -> Self {
        Self {
            hands: vec![None; count],
            holder: None,
        }
    }

    pub fn with_items(items: Vec<Option<Item>>) -> Self {
        let mut inventory = Self {
            hands: items,
            holder: None,
        };
        inventory.sync_positions();
        inventory
    }

    fn sync_positions(&mut self) {
        let holder = self.holder;
        for (hand, item) in self.hands.iter_mut().enumerate() {
            if let Some(item) = item {
                item.pos = match holder {
                    Some(id) => ItemPos::HeldBy(id, hand),
                    None => ItemPos::Hand(hand),
                };
            }
        }
    }

    /// Bind the inventory to its holder
    pub fn adopt(&mut self, owner: Owner) {
        self.holder = match owner {
            Owner::Player => None,
            Owner::Entity(id) => Some(id),
        };
        self.sync_positions();
    }

    pub fn len(&self) -> usize {
        self.hands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hands.iter().all(Option::is_none)
    }

    pub fn get(&self, hand: usize) -> Option<&Item> {
        self.hands.get(hand).and_then(Option::as_ref)
    }

    pub fn take(&mut self, hand: usize) -> Option<Item> {
        self.hands.get_mut(hand).and_then(Option::take)
    }

    /// Place `item` in `hand`, returning whatever was there
    pub fn put(&mut self, hand: usize, item: Item) -> Option<Item> {
        let slot = self.hands.get_mut(hand)?;
        let previous = slot.replace(item);
        self.sync_positions();
        previous
    }

    pub fn first_empty(&self) -> Option<usize> {
        self.hands.iter().position(Option::is_none)
    }

    pub fn is_busy(&self) -> bool {
        self.hands.iter().flatten().any(Item::is_busy)
    }

    /// Use the item in `hand`; returns an entity to put on the board
    pub fn use_hand(&mut self, hand: usize, view: &HolderView, aim: Vec2, world: &mut WorldState) -> Option<Entity> {
        let item = self.hands.get_mut(hand)?.as_mut()?;
        match item.action(view, aim, world) {
            ItemAction::Nothing => None,
            ItemAction::Spawn(entity) => Some(entity),
            ItemAction::Throw(entity) => {
                self.take(hand);
                Some(entity)
            }
        }
    }

    pub fn tick(
        &mut self,
        base: &HolderView,
        board: &mut Board,
        mut player: Option<&mut Player>,
        world: &mut WorldState,
    ) {
        for item in self.hands.iter_mut().flatten() {
            item.tick(base, board, player.as_deref_mut(), world);
        }
    }

    pub fn blocks(&self, base: &HolderView, source: Vec2) -> bool {
        self.hands.iter().flatten().any(|item| item.blocks(base, source))
    }

    pub fn draw(&self, base: &HolderView, surface: &mut dyn Surface, camera: &Camera, shake: f32) {
        for item in self.hands.iter().flatten() {
            item.draw(base, surface, camera, shake);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::creatures::spawn_creature;
    use crate::sim::entity::{Class, EntityKind};
    use crate::Settings;

    fn view(pos: Vec2) -> HolderView {
        HolderView {
            owner: Owner::Player,
            pos,
            facing: 1.0,
            hand: 0,
            area: 1,
        }
    }

    #[test]
    fn test_sword_sweeps_arc() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut sword = Item::sword();
        let v = view(Vec2::ZERO);
        assert!(sword.hitbox(&v).is_none());
        sword.action(&v, Vec2::Y, &mut world);
        let first = sword.hitbox(&v).unwrap();
        assert!((first.rotation() - 150.0).abs() < 1e-3);
        assert!(first.y() > 0.0);
        assert!(sword.is_busy());
        // Cooldown blocks a second swing
        assert!(matches!(sword.action(&v, Vec2::Y, &mut world), ItemAction::Nothing));
        assert_eq!(sword.cooldown(), SWORD_COOLDOWN);
    }

    #[test]
    fn test_sword_hits_each_target_once() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut board = Board::new();
        let id = board.insert(spawn_creature(Class::Slime, Vec2::new(0.0, 40.0)).unwrap());
        board.commit(&mut world);
        let mut sword = Item::sword();
        let v = view(Vec2::ZERO);
        sword.action(&v, Vec2::Y, &mut world);
        for _ in 0..SWORD_SWING_TICKS {
            sword.tick(&v, &mut board, None, &mut world);
        }
        assert!(!sword.is_busy());
        let slime = board.by_id(id).unwrap();
        assert_eq!(slime.actor.health(), 7 - SWORD_DAMAGE);
    }

    #[test]
    fn test_shield_blocks_front_only() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut shield = Item::shield();
        let v = view(Vec2::new(0.0, 100.0));
        assert!(!shield.blocks(&v, Vec2::new(0.0, 150.0)));
        shield.action(&v, Vec2::Y, &mut world);
        assert!(shield.blocks(&v, Vec2::new(0.0, 150.0)));
        assert!(!shield.blocks(&v, Vec2::new(0.0, 50.0)));
    }

    #[test]
    fn test_bow_spawns_arrow() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut inventory = Inventory::with_items(vec![Some(Item::bow()), None]);
        let spawned = inventory.use_hand(0, &view(Vec2::ZERO), Vec2::new(0.0, 3.0), &mut world);
        let arrow = spawned.unwrap();
        assert_eq!(arrow.class(), Class::Projectile);
        assert_eq!(arrow.actor.area, 1);
        // The bow stays in hand
        assert!(inventory.get(0).is_some());
    }

    #[test]
    fn test_dagger_leaves_hand_when_thrown() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut inventory = Inventory::with_items(vec![Some(Item::dagger()), None]);
        let thrown = inventory.use_hand(0, &view(Vec2::ZERO), Vec2::Y, &mut world).unwrap();
        assert!(inventory.get(0).is_none());
        assert!(thrown.actor.is_gliding());
        assert!(matches!(thrown.kind, EntityKind::Projectile(_)));
    }

    #[test]
    fn test_item_fires_from_its_own_hand() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut inventory = Inventory::with_items(vec![None, Some(Item::bow())]);
        // The view's hand is ignored; the bow knows it sits in hand 1
        let arrow = inventory.use_hand(1, &view(Vec2::ZERO), Vec2::Y, &mut world).unwrap();
        assert_eq!(arrow.pos(), Vec2::new(HAND_OFFSET, 0.0));

        let mut left = Inventory::with_items(vec![Some(Item::bow()), None]);
        let arrow = left.use_hand(0, &view(Vec2::ZERO).with_hand(1), Vec2::Y, &mut world).unwrap();
        assert_eq!(arrow.pos(), Vec2::new(-HAND_OFFSET, 0.0));
    }

    #[test]
    fn test_ground_item_is_inert() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut sword = Item::sword();
        sword.pos = ItemPos::Ground(Vec2::new(5.0, 70.0));
        let v = view(Vec2::ZERO);
        assert!(matches!(sword.action(&v, Vec2::Y, &mut world), ItemAction::Nothing));
        assert!(!sword.is_busy());
        assert!(sword.hitbox(&v).is_none());
        assert_eq!(sword.world_pos(&v), Some(Vec2::new(5.0, 70.0)));
    }

    #[test]
    fn test_item_only_serves_its_holder() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut inventory = Inventory::with_items(vec![Some(Item::spear()), None]);
        inventory.adopt(Owner::Entity(EntityId(5)));
        let stranger = HolderView {
            owner: Owner::Entity(EntityId(6)),
            ..view(Vec2::ZERO)
        };
        assert!(inventory.use_hand(0, &stranger, Vec2::Y, &mut world).is_none());
        assert!(!inventory.is_busy());
        // Nor does the player get to use an entity's item
        assert!(inventory.use_hand(0, &view(Vec2::ZERO), Vec2::Y, &mut world).is_none());

        let holder = HolderView {
            owner: Owner::Entity(EntityId(5)),
            ..view(Vec2::ZERO)
        };
        inventory.use_hand(0, &holder, Vec2::Y, &mut world);
        assert!(inventory.is_busy());
        assert_eq!(inventory.get(0).unwrap().world_pos(&holder), Some(Vec2::new(-HAND_OFFSET, 0.0)));
    }

    #[test]
    fn test_put_tracks_positions() {
        let mut inventory = Inventory::new(2);
        assert_eq!(inventory.first_empty(), Some(0));
        assert!(inventory.put(1, Item::spear()).is_none());
        assert_eq!(inventory.get(1).unwrap().pos, ItemPos::Hand(1));
        inventory.adopt(Owner::Entity(EntityId(5)));
        assert_eq!(inventory.get(1).unwrap().pos, ItemPos::HeldBy(EntityId(5), 1));
        let old = inventory.put(1, Item::sword()).unwrap();
        assert_eq!(old.name(), "spear");
    }
}
