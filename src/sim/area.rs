//! Areas: contiguous vertical slices of the world
//!
//! An area is generated from `(seed, index)` alone, in coordinates relative
//! to its own start. `finalize` places it in the world once the previous
//! area's end is known; `load` moves its entities onto the board between a
//! pair of sentinels. After that the board owns the entities and the area
//! only keeps ids (blockers, boss) plus its particle set and timers.

use std::collections::VecDeque;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::board::Board;
use super::bosses::{Boss, BossKind};
use super::camera::Camera;
use super::creatures::{self, Lazer, LazerMode};
use super::entity::{Class, Entity, EntityId, EntityKind};
use super::generator::splitmix64;
use super::items::Item;
use super::particle::ParticleSet;
use super::player::Player;
use super::spawner::Spawner;
use super::sprite::Sprite;
use super::state::WorldState;
use crate::error::{SimError, SimResult};
use crate::platform::{SoundCue, Surface};

/// Lateral extent used when scattering content
const SCATTER_X: i32 = 220;
/// Ticks a minigame must be survived
pub const MINIGAME_TICKS: u32 = 600;
/// Ticks between enslaught waves
const WAVE_GAP: u32 = 240;
/// Creatures a regular area may roll from, in gate order
const ROSTER: [Class; 7] = [
    Class::Slime,
    Class::Crawler,
    Class::Obstacle,
    Class::Fencer,
    Class::Archer,
    Class::Bomb,
    Class::Knight,
];
/// Creatures a spawner may be built around
const SPAWNABLE: [Class; 4] = [Class::Slime, Class::Crawler, Class::Fencer, Class::Archer];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AreaType {
    Opening,
    SlimeTutorial,
    ItemTutorial,
    Basic,
    BreakThrough,
    Gift,
    Enslaught,
    Minigame,
    Boss,
}

impl AreaType {
    pub const ALL: [AreaType; 9] = [
        AreaType::Opening,
        AreaType::SlimeTutorial,
        AreaType::ItemTutorial,
        AreaType::Basic,
        AreaType::BreakThrough,
        AreaType::Gift,
        AreaType::Enslaught,
        AreaType::Minigame,
        AreaType::Boss,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AreaType::Opening => "Opening",
            AreaType::SlimeTutorial => "SlimeTutorial",
            AreaType::ItemTutorial => "ItemTutorial",
            AreaType::Basic => "Basic",
            AreaType::BreakThrough => "BreakThrough",
            AreaType::Gift => "Gift",
            AreaType::Enslaught => "Enslaught",
            AreaType::Minigame => "Minigame",
            AreaType::Boss => "Boss",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

/// Per-area random stream; the same (seed, index) always yields the same draws
#[derive(Debug, Clone)]
pub struct AreaRng(Pcg32);

impl AreaRng {
    pub fn new(seed: u64, index: usize) -> Self {
        let mixed = splitmix64(seed ^ splitmix64(index as u64));
        Self(Pcg32::seed_from_u64(mixed))
    }

    /// Uniform integer in [lo, hi]
    pub fn randint(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.0.random_range(lo..=hi)
    }

    /// Pick one element
    pub fn choose<T: Copy>(&mut self, options: &[T]) -> Option<T> {
        if options.is_empty() {
            return None;
        }
        let i = self.randint(0, options.len() as i32 - 1) as usize;
        options.get(i).copied()
    }
}

/// A batch of creatures released some time after the player enters
#[derive(Debug, Clone)]
pub struct Wave {
    /// Ticks after entry
    pub at_tick: u32,
    /// Class and position relative to the area start
    pub spawns: Vec<(Class, Vec2)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaState {
    /// Generated, not yet placed in the world
    Pending,
    /// Placed; entities still held by the area
    Finalized,
    /// Entities are on the board
    Loaded,
}

/// Summary of one live entity, for inspection and logs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub class: Class,
    pub pos: (f32, f32),
    pub health: i32,
}

#[derive(Debug)]
pub struct Area {
    pub index: usize,
    pub kind: AreaType,
    pub length: f32,
    pub difficulty: f32,
    pub state: AreaState,
    start: f32,
    rng: AreaRng,
    entities: Vec<Entity>,
    /// Positions in `entities` that hold the area closed while alive
    blocker_slots: Vec<usize>,
    blockers: Vec<EntityId>,
    boss_slot: Option<usize>,
    boss: Option<EntityId>,
    waves: VecDeque<Wave>,
    /// Starter and stopper built by `finalize`, inserted by `load`
    sentinels: Option<(Entity, Entity)>,
    starter: Option<EntityId>,
    stopper: Option<EntityId>,
    entry_text: Option<String>,
    entered: bool,
    ticks_inside: u32,
    minigame_left: Option<u32>,
    particles: ParticleSet,
}

impl Area {
    fn empty(seed: u64, index: usize, kind: AreaType, length: f32) -> Self {
        Self {
            index,
            kind,
            length,
            difficulty: index as f32,
            state: AreaState::Pending,
            start: 0.0,
            rng: AreaRng::new(seed, index),
            entities: Vec::new(),
            blocker_slots: Vec::new(),
            blockers: Vec::new(),
            boss_slot: None,
            boss: None,
            waves: VecDeque::new(),
            sentinels: None,
            starter: None,
            stopper: None,
            entry_text: None,
            entered: false,
            ticks_inside: 0,
            minigame_left: None,
            particles: ParticleSet::new(),
        }
    }

    /// Build the area's content; a pure function of `(seed, index, kind)`
    pub fn generate(seed: u64, index: usize, kind: AreaType) -> SimResult<Self> {
        let mut area = Self::empty(seed, index, kind, 0.0);
        match kind {
            AreaType::Opening => {
                area.length = 300.0;
                area.entry_text = Some("Hold up to climb. Double tap up to dash.".into());
            }
            AreaType::SlimeTutorial => {
                area.length = 450.0;
                area.add(creatures::slime(Vec2::new(0.0, 225.0)));
            }
            AreaType::ItemTutorial => {
                area.length = 750.0;
                area.entry_text = Some("Stand on the sword and press interact to pick it up.".into());
                area.add(Entity::dropped(Vec2::new(0.0, 200.0), Item::sword()));
                area.add(creatures::slime(Vec2::new(-80.0, 450.0)));
                area.add(creatures::slime(Vec2::new(80.0, 600.0)));
            }
            AreaType::Basic => area.generate_basic()?,
            AreaType::BreakThrough => area.generate_breakthrough()?,
            AreaType::Gift => {
                area.length = 500.0;
                area.entry_text = Some("A gift lies ahead.".into());
                let roll = area.rng.randint(0, 4);
                area.add(Entity::dropped(Vec2::new(0.0, 250.0), Item::gift(roll)));
            }
            AreaType::Enslaught => area.generate_enslaught()?,
            AreaType::Minigame => area.generate_minigame(),
            AreaType::Boss => area.generate_boss(),
        }
        if area.length <= 0.0 {
            return Err(SimError::generation(index, format!("{} area has no length", kind.name())));
        }
        log::debug!(
            "generated area {} ({}) length {} with {} entities",
            index,
            kind.name(),
            area.length,
            area.entities.len()
        );
        Ok(area)
    }

    fn add(&mut self, entity: Entity) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    fn scatter(&mut self, lo: i32, hi: i32) -> Vec2 {
        let x = self.rng.randint(-SCATTER_X, SCATTER_X);
        let y = self.rng.randint(lo, hi);
        Vec2::new(x as f32, y as f32)
    }

    /// Roster classes unlocked at this index
    fn eligible(&self, pool: &[Class]) -> SimResult<Vec<Class>> {
        let classes: Vec<Class> = pool.iter().copied().filter(|c| c.min_area() <= self.index).collect();
        if classes.is_empty() {
            return Err(SimError::generation(self.index, "no creature class is unlocked yet"));
        }
        Ok(classes)
    }

    fn generate_basic(&mut self) -> SimResult<()> {
        self.length = self.rng.randint(600, 1200) as f32;
        let classes = self.eligible(&ROSTER)?;
        let target = (2 + self.index as i32 / 2).min(8);
        let count = self.rng.randint(target - 1, target + 1);
        let top = self.length as i32 - 100;
        for _ in 0..count {
            let Some(class) = self.rng.choose(&classes) else { break };
            let pos = self.scatter(150, top);
            let creature = creatures::spawn_creature(class, pos)
                .ok_or_else(|| SimError::generation(self.index, format!("{} is not a creature", class.name())))?;
            self.add(creature);
        }
        Ok(())
    }

    fn generate_breakthrough(&mut self) -> SimResult<()> {
        self.length = self.rng.randint(700, 1000) as f32;
        self.entry_text = Some("Break the spawners to open the way.".into());
        let templates = self.eligible(&SPAWNABLE)?;
        let spawners = self.rng.randint(1, if self.index > 8 { 3 } else { 2 });
        let y = self.length - 150.0;
        for k in 0..spawners {
            let Some(template) = self.rng.choose(&templates) else { break };
            let limit = self.rng.randint(2, 3) as usize;
            let delay = self.rng.randint(60, 120) as u32;
            let x = (k as f32 - (spawners as f32 - 1.0) / 2.0) * 160.0;
            let slot = self.add(Entity::spawner(Vec2::new(x, y), Spawner::new(template, Some(limit), delay)));
            self.blocker_slots.push(slot);
        }
        for _ in 0..self.rng.randint(0, 2) {
            let pos = self.scatter(200, self.length as i32 - 300);
            self.add(Entity::obstacle(pos));
        }
        Ok(())
    }

    fn generate_enslaught(&mut self) -> SimResult<()> {
        self.length = 800.0;
        self.entry_text = Some("They are coming. Hold your ground.".into());
        let classes = self.eligible(&SPAWNABLE)?;
        let waves = 3 + self.index / 5;
        for w in 0..waves {
            let mut spawns = Vec::new();
            for _ in 0..self.rng.randint(2, 4) {
                let Some(class) = self.rng.choose(&classes) else { break };
                let pos = self.scatter(self.length as i32 - 200, self.length as i32 - 60);
                spawns.push((class, pos));
            }
            self.waves.push_back(Wave {
                at_tick: w as u32 * WAVE_GAP,
                spawns,
            });
        }
        Ok(())
    }

    fn generate_minigame(&mut self) {
        self.length = 900.0;
        self.entry_text = Some("Survive the lazers!".into());
        let count = self.rng.randint(3, 5);
        let span = self.length - 400.0;
        for k in 0..count {
            let y = 200.0 + span * k as f32 / (count - 1).max(1) as f32;
            let spin = self.index > 12 && self.rng.randint(0, 2) == 0;
            let mode = if spin {
                LazerMode::Spinning { speed: 1.0 }
            } else {
                LazerMode::Fixed
            };
            let period = self.rng.randint(90, 150) as u32;
            let offset = self.rng.randint(0, period as i32) as u32;
            self.add(creatures::lazer(Vec2::new(0.0, y), Lazer::new(mode, period, 30, 30, offset)));
        }
        self.minigame_left = Some(MINIGAME_TICKS);
    }

    fn generate_boss(&mut self) {
        self.length = 1100.0;
        let kind = if self.rng.randint(0, 1) == 0 {
            BossKind::SlimeKing
        } else {
            BossKind::Juggernaut
        };
        self.entry_text = Some(format!("The {} approaches!", kind.name()));
        let slot = self.add(Entity::boss(Vec2::new(0.0, self.length * 0.6), Boss::new(kind)));
        self.boss_slot = Some(slot);
    }

    /// Place the area at `start`: shift every entity and install the sentinels
    pub fn finalize(&mut self, start: f32) {
        if self.state != AreaState::Pending {
            return;
        }
        self.start = start;
        for entity in &mut self.entities {
            entity.offset_y(start);
            entity.actor.area = self.index;
        }
        self.sentinels = Some((
            Entity::area_starter(self.start, self.index),
            Entity::area_stopper(self.end_coordinate(), self.index),
        ));
        self.state = AreaState::Finalized;
    }

    pub fn start_coordinate(&self) -> f32 {
        self.start
    }

    pub fn end_coordinate(&self) -> f32 {
        self.start + self.length
    }

    pub fn contains(&self, y: f32) -> bool {
        y >= self.start && y < self.end_coordinate()
    }

    pub fn is_loaded(&self) -> bool {
        self.state == AreaState::Loaded
    }

    /// Entities still held by the area (before `load`)
    pub fn pending_entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Sentinels installed by `finalize`, not yet on the board
    pub fn pending_sentinels(&self) -> Option<(&Entity, &Entity)> {
        self.sentinels.as_ref().map(|(starter, stopper)| (starter, stopper))
    }

    /// Move the area's entities onto the board, between its sentinels
    pub fn load(&mut self, world: &mut WorldState, board: &mut Board) {
        if self.state != AreaState::Finalized {
            return;
        }
        let Some((mut starter, mut stopper)) = self.sentinels.take() else {
            log::error!("area {} finalized without sentinels", self.index);
            return;
        };
        starter.actor.id = board.allocate_id();
        self.starter = Some(board.insert(starter));

        for (slot, mut entity) in std::mem::take(&mut self.entities).into_iter().enumerate() {
            entity.actor.id = board.allocate_id();
            entity.final_load(world);
            let id = board.insert(entity);
            if self.blocker_slots.contains(&slot) {
                self.blockers.push(id);
            }
            if self.boss_slot == Some(slot) {
                self.boss = Some(id);
                self.blockers.push(id);
            }
        }

        stopper.actor.id = board.allocate_id();
        self.stopper = Some(board.insert(stopper));
        self.state = AreaState::Loaded;
        log::info!(
            "loaded area {} ({}) at {}..{}",
            self.index,
            self.kind.name(),
            self.start,
            self.end_coordinate()
        );
    }

    /// Board range strictly between the sentinels
    fn board_range(&self, board: &Board) -> Option<std::ops::Range<usize>> {
        let lo = board.index_of(self.starter?)?;
        let hi = board.index_of(self.stopper?)?;
        (lo < hi).then(|| lo + 1..hi)
    }

    /// Live entities between this area's sentinels
    pub fn num_entities(&self, board: &Board) -> usize {
        self.board_range(board).map_or(0, |range| {
            range
                .filter_map(|i| board.get(i))
                .filter(|e| e.is_alive() && !e.is_sentinel())
                .count()
        })
    }

    pub fn get_entity_snapshot(&self, board: &Board) -> Vec<EntitySnapshot> {
        let Some(range) = self.board_range(board) else {
            return Vec::new();
        };
        range
            .filter_map(|i| board.get(i))
            .filter(|e| e.is_alive() && !e.is_sentinel())
            .map(|e| EntitySnapshot {
                id: e.id(),
                class: e.class(),
                pos: (e.pos().x, e.pos().y),
                health: e.actor.health(),
            })
            .collect()
    }

    /// Anything still holding the far boundary closed?
    pub fn is_blocking(&self, board: &Board) -> bool {
        !self.waves.is_empty()
            || self.minigame_left.is_some_and(|t| t > 0)
            || self.blockers.iter().any(|&id| board.is_live(id))
    }

    /// Highest y the player may reach while this area is loaded
    pub fn progress_limit(&self, board: &Board) -> Option<f32> {
        (self.is_loaded() && self.is_blocking(board)).then(|| self.end_coordinate() - Sprite::Player.size().y)
    }

    /// Camera centre this area insists on, if any
    pub fn enforce_center(&self, board: &Board) -> Option<f32> {
        if !self.entered {
            return None;
        }
        if self.minigame_left.is_some_and(|t| t > 0) {
            return Some(self.start + self.length / 2.0);
        }
        let boss = board.by_id(self.boss?)?;
        boss.is_alive().then(|| boss.y())
    }

    /// Per-tick area logic: particles, entry, waves, minigame timer
    pub fn tick(&mut self, world: &mut WorldState, player: &Player, board: &mut Board) {
        self.particles.tick();
        if !self.is_loaded() {
            return;
        }
        if !self.entered && player.y() >= self.start {
            self.entered = true;
            log::info!("player entered area {} ({})", self.index, self.kind.name());
            if let Some(text) = self.entry_text.take() {
                world.announce(text);
            }
        }
        if !self.entered {
            return;
        }
        self.ticks_inside += 1;

        while self.waves.front().is_some_and(|w| w.at_tick < self.ticks_inside) {
            let Some(wave) = self.waves.pop_front() else { break };
            for (class, rel) in wave.spawns {
                let Some(mut creature) = creatures::spawn_creature(class, rel + Vec2::new(0.0, self.start)) else {
                    log::warn!("area {} wave skipped a {}", self.index, class.name());
                    continue;
                };
                creature.actor.area = self.index;
                creature.actor.id = board.allocate_id();
                creature.final_load(world);
                self.blockers.push(board.insert(creature));
            }
            world.sound(SoundCue::Spawn);
            log::debug!("area {} released a wave, {} left", self.index, self.waves.len());
        }

        if let Some(left) = self.minigame_left.as_mut()
            && *left > 0
        {
            *left -= 1;
            if *left == 0 {
                world.announce("You survived!");
                self.clear_lazers(board);
            }
        }
    }

    fn clear_lazers(&self, board: &mut Board) {
        for entity in board.iter_all_mut() {
            if entity.actor.area == self.index && matches!(entity.kind, EntityKind::Lazer(_)) {
                entity.actor.despawn();
            }
        }
    }

    /// Scatter particles in this area
    pub fn burst(&mut self, pos: Vec2, count: usize, sprite: Sprite, seed: u32) {
        self.particles.burst(pos, count, sprite, seed);
    }

    /// Remove everything this area put on the board
    pub fn despawn(&mut self, board: &mut Board) {
        for entity in board.iter_all_mut() {
            if entity.actor.area == self.index {
                entity.actor.despawn();
            }
        }
        self.entities.clear();
        self.particles.clear();
        log::info!("retired area {} ({})", self.index, self.kind.name());
    }

    pub fn draw(&self, surface: &mut dyn Surface, camera: &Camera, shake: f32) {
        self.particles.draw(surface, camera, shake);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;

    fn loaded(kind: AreaType, index: usize, start: f32) -> (Area, WorldState, Board) {
        let mut world = WorldState::new(11, &Settings::deterministic());
        let mut board = Board::new();
        let mut area = Area::generate(11, index, kind).unwrap();
        area.finalize(start);
        area.load(&mut world, &mut board);
        board.commit(&mut world);
        (area, world, board)
    }

    #[test]
    fn test_area_rng_is_per_index() {
        let draws = |seed, index| {
            let mut rng = AreaRng::new(seed, index);
            (0..16).map(|_| rng.randint(0, 1000)).collect::<Vec<_>>()
        };
        assert_eq!(draws(5, 3), draws(5, 3));
        assert_ne!(draws(5, 3), draws(5, 4));
        assert_ne!(draws(5, 3), draws(6, 3));
    }

    #[test]
    fn test_generation_is_reproducible() {
        for kind in [AreaType::Basic, AreaType::BreakThrough, AreaType::Enslaught, AreaType::Minigame] {
            let a = Area::generate(99, 12, kind).unwrap();
            let b = Area::generate(99, 12, kind).unwrap();
            assert_eq!(a.length, b.length);
            let pa: Vec<_> = a.pending_entities().iter().map(|e| (e.class(), e.pos())).collect();
            let pb: Vec<_> = b.pending_entities().iter().map(|e| (e.class(), e.pos())).collect();
            assert_eq!(pa, pb);
        }
    }

    #[test]
    fn test_finalize_offsets_entities() {
        let mut area = Area::generate(1, 1, AreaType::SlimeTutorial).unwrap();
        area.finalize(300.0);
        assert_eq!(area.end_coordinate(), 750.0);
        let slime = &area.pending_entities()[0];
        assert_eq!(slime.y(), 525.0);
        assert_eq!(slime.actor.area, 1);
        // A second finalize is ignored
        area.finalize(1000.0);
        assert_eq!(area.start_coordinate(), 300.0);
    }

    #[test]
    fn test_finalize_installs_sentinels() {
        let mut area = Area::generate(1, 1, AreaType::SlimeTutorial).unwrap();
        assert!(area.pending_sentinels().is_none());
        area.finalize(300.0);
        let (starter, stopper) = area.pending_sentinels().unwrap();
        assert_eq!(starter.class(), Class::AreaStarter);
        assert_eq!(starter.y(), 300.0);
        assert_eq!(stopper.class(), Class::AreaStopper);
        assert_eq!(stopper.y(), 750.0);
        assert_eq!(stopper.actor.area, 1);

        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut board = Board::new();
        area.load(&mut world, &mut board);
        assert!(area.pending_sentinels().is_none());
        board.commit(&mut world);
        assert_eq!(board.get(0).unwrap().class(), Class::AreaStarter);
    }

    #[test]
    fn test_basic_respects_class_gates() {
        for seed in 0..20 {
            let area = Area::generate(seed, 3, AreaType::Basic).unwrap();
            assert!(area.pending_entities().iter().all(|e| e.class().min_area() <= 3));
            assert!((600.0..=1200.0).contains(&area.length));
        }
    }

    #[test]
    fn test_sentinels_delimit_entities() {
        let (area, _, board) = loaded(AreaType::ItemTutorial, 2, 750.0);
        assert_eq!(area.num_entities(&board), 3);
        let snapshot = area.get_entity_snapshot(&board);
        assert_eq!(snapshot[0].class, Class::DroppedItem);
        assert_eq!(snapshot[0].pos, (0.0, 950.0));
        assert!(board.get(0).unwrap().is_sentinel());
        assert!(board.get(board.len() - 1).unwrap().is_sentinel());
    }

    #[test]
    fn test_breakthrough_blocks_until_spawners_break() {
        let (area, mut world, mut board) = loaded(AreaType::BreakThrough, 6, 2000.0);
        assert!(area.is_blocking(&board));
        assert!(area.progress_limit(&board).is_some());
        for e in board.iter_mut() {
            if e.class() == Class::Spawner {
                e.actor.die();
            }
        }
        board.commit(&mut world);
        assert!(!area.is_blocking(&board));
        assert_eq!(area.progress_limit(&board), None);
    }

    #[test]
    fn test_enslaught_releases_waves_after_entry() {
        let (mut area, mut world, mut board) = loaded(AreaType::Enslaught, 5, 1000.0);
        let mut player = Player::new();
        assert_eq!(area.num_entities(&board), 0);
        area.tick(&mut world, &player, &mut board);
        assert_eq!(area.waves.len(), 4);
        player.body.set_y(1010.0);
        area.tick(&mut world, &player, &mut board);
        board.commit(&mut world);
        assert_eq!(area.waves.len(), 3);
        assert!(area.num_entities(&board) >= 2);
        assert!(area.is_blocking(&board));
        for _ in 0..(3 * WAVE_GAP) {
            area.tick(&mut world, &player, &mut board);
        }
        assert!(area.waves.is_empty());
    }

    #[test]
    fn test_minigame_enforces_center_until_survived() {
        let (mut area, mut world, mut board) = loaded(AreaType::Minigame, 7, 0.0);
        let mut player = Player::new();
        player.body.set_y(10.0);
        area.tick(&mut world, &player, &mut board);
        assert_eq!(area.enforce_center(&board), Some(450.0));
        for _ in 0..MINIGAME_TICKS {
            area.tick(&mut world, &player, &mut board);
        }
        board.commit(&mut world);
        assert_eq!(area.enforce_center(&board), None);
        assert!(!area.is_blocking(&board));
        assert!(board.iter().all(|e| e.class() != Class::Lazer));
    }

    #[test]
    fn test_despawn_removes_area_entities() {
        let (mut area, mut world, mut board) = loaded(AreaType::ItemTutorial, 2, 750.0);
        area.despawn(&mut board);
        let removed = board.commit(&mut world);
        assert_eq!(removed.len(), 5);
        assert!(board.is_empty());
    }

    #[test]
    fn test_type_names_round_trip() {
        for kind in AreaType::ALL {
            assert_eq!(AreaType::from_name(kind.name()), Some(kind));
        }
    }
}
