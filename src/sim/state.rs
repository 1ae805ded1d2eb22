//! World-level state shared by everything that ticks
//!
//! `WorldState` holds what is not an entity: the clock, the runtime RNG, the
//! camera and screen shake, the class registry, and the outgoing event queue.
//! Everything iterated during simulation lives in ordered containers, so a
//! run is a pure function of the seed and the input stream.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::board::Board;
use super::camera::{Camera, ScreenShake};
use super::entity::{Class, EntityId};
use super::player::Player;
use super::sprite::Sprite;
use crate::platform::{PressHistory, SoundCue};
use crate::Settings;

/// Fire-and-forget output of a tick, drained by the active Place
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Announce(String),
    Sound(SoundCue),
}

/// Request for a particle burst, routed to the owning area's particle set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleBurst {
    pub area: usize,
    pub pos: Vec2,
    pub count: usize,
    pub sprite: Sprite,
}

/// Tutorial text shown at the top of the screen
#[derive(Debug, Clone, PartialEq)]
pub struct TutorialPanel {
    pub text: String,
    pub ticks_left: u32,
}

/// Class-level bookkeeping: what has been seen, and where the tracked
/// instances are
#[derive(Debug, Clone, Default)]
pub struct Registry {
    seen: BTreeSet<Class>,
    first_occurs: BTreeMap<Class, usize>,
    instances: BTreeMap<Class, Vec<EntityId>>,
}

impl Registry {
    /// Record a loaded entity; returns true the first time its class is seen
    pub fn on_load(&mut self, class: Class, id: EntityId, area: usize) -> bool {
        if class.tracks_instances() {
            let list = self.instances.entry(class).or_default();
            if !list.contains(&id) {
                list.push(id);
            }
        }
        self.first_occurs.entry(class).or_insert(area);
        self.seen.insert(class)
    }

    pub fn forget(&mut self, class: Class, id: EntityId) {
        if let Some(list) = self.instances.get_mut(&class) {
            list.retain(|&other| other != id);
        }
    }

    /// Index of the area the class first appeared in
    pub fn first_occurs(&self, class: Class) -> Option<usize> {
        self.first_occurs.get(&class).copied()
    }

    pub fn instances(&self, class: Class) -> &[EntityId] {
        self.instances.get(&class).map_or(&[], Vec::as_slice)
    }

    /// Tracked instances of `class` that are still live on the board
    pub fn live_count(&self, class: Class, board: &Board) -> usize {
        self.instances(class).iter().filter(|&&id| board.is_live(id)).count()
    }

    /// Closest live tracked instance of `class` to `pos` (ties go to the lower id)
    pub fn nearest(&self, class: Class, pos: Vec2, board: &Board) -> Option<EntityId> {
        self.instances(class)
            .iter()
            .filter_map(|&id| board.by_id(id).filter(|e| e.is_alive()))
            .map(|e| (e.pos().distance_squared(pos), e.id()))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }
}

#[derive(Debug)]
pub struct WorldState {
    pub seed: u64,
    /// Ticks simulated so far
    pub tick: u64,
    /// Runtime randomness (jitter, drops); area content uses per-area RNGs
    pub rng: Pcg32,
    pub camera: Camera,
    pub shake: ScreenShake,
    pub registry: Registry,
    pub presses: PressHistory,
    pub tutorial: Option<TutorialPanel>,
    tutorial_ticks: u32,
    events: Vec<GameEvent>,
    bursts: Vec<ParticleBurst>,
}

impl WorldState {
    pub fn new(seed: u64, settings: &Settings) -> Self {
        Self {
            seed,
            tick: 0,
            rng: Pcg32::seed_from_u64(seed ^ 0x5EED_CAFE),
            camera: Camera::new(settings),
            shake: ScreenShake::default(),
            registry: Registry::default(),
            presses: PressHistory::default(),
            tutorial: None,
            tutorial_ticks: settings.tutorial_ticks,
            events: Vec::new(),
            bursts: Vec::new(),
        }
    }

    /// Uniform integer in [lo, hi]
    pub fn randint(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }

    /// Uniform float in [lo, hi)
    pub fn random_range(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..hi)
    }

    pub fn announce(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::info!("announce: {}", text);
        self.events.push(GameEvent::Announce(text));
    }

    pub fn sound(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::Sound(cue));
    }

    pub fn burst(&mut self, area: usize, pos: Vec2, count: usize, sprite: Sprite) {
        self.bursts.push(ParticleBurst {
            area,
            pos,
            count,
            sprite,
        });
    }

    pub fn start_shake(&mut self, delta: f32, duration: u32) {
        self.shake.start(delta, duration);
    }

    pub fn show_tutorial(&mut self, text: &str) {
        self.announce(text);
        self.tutorial = Some(TutorialPanel {
            text: text.to_string(),
            ticks_left: self.tutorial_ticks,
        });
    }

    pub fn tutorial_showing(&self) -> bool {
        self.tutorial.is_some()
    }

    /// Count down the tutorial panel
    pub fn tick_tutorial(&mut self) {
        if let Some(panel) = self.tutorial.as_mut() {
            panel.ticks_left = panel.ticks_left.saturating_sub(1);
            if panel.ticks_left == 0 {
                self.tutorial = None;
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_bursts(&mut self) -> Vec<ParticleBurst> {
        std::mem::take(&mut self.bursts)
    }
}

/// Everything an entity may touch while it ticks
///
/// The ticking entity itself is out of the board for the duration.
pub struct TickCtx<'a> {
    pub world: &'a mut WorldState,
    pub player: &'a mut Player,
    pub board: &'a mut Board,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::creatures::spawn_creature;

    #[test]
    fn test_randint_is_inclusive_and_seeded() {
        let settings = Settings::deterministic();
        let mut a = WorldState::new(9, &settings);
        let mut b = WorldState::new(9, &settings);
        let xs: Vec<i32> = (0..200).map(|_| a.randint(0, 3)).collect();
        let ys: Vec<i32> = (0..200).map(|_| b.randint(0, 3)).collect();
        assert_eq!(xs, ys);
        assert!(xs.contains(&0) && xs.contains(&3));
        assert_eq!(a.randint(5, 5), 5);
    }

    #[test]
    fn test_tutorial_panel_expires() {
        let settings = Settings {
            tutorial_ticks: 2,
            ..Settings::deterministic()
        };
        let mut world = WorldState::new(1, &settings);
        world.show_tutorial("hello");
        assert!(world.tutorial_showing());
        world.tick_tutorial();
        assert!(world.tutorial_showing());
        world.tick_tutorial();
        assert!(!world.tutorial_showing());
        assert_eq!(world.drain_events(), vec![GameEvent::Announce("hello".into())]);
        assert!(world.drain_events().is_empty());
    }

    #[test]
    fn test_registry_nearest() {
        let mut world = WorldState::new(1, &Settings::deterministic());
        let mut board = Board::new();
        let near = board.insert(spawn_creature(Class::Archer, Vec2::new(0.0, 100.0)).unwrap());
        let far = board.insert(spawn_creature(Class::Archer, Vec2::new(0.0, 400.0)).unwrap());
        world.registry.on_load(Class::Archer, near, 4);
        assert!(!world.registry.on_load(Class::Archer, far, 5));
        board.commit(&mut world);
        assert_eq!(world.registry.first_occurs(Class::Archer), Some(4));
        assert_eq!(world.registry.nearest(Class::Archer, Vec2::new(0.0, 350.0), &board), Some(far));
        assert_eq!(world.registry.live_count(Class::Archer, &board), 2);

        board.by_id_mut(far).unwrap().actor.die();
        board.commit(&mut world);
        assert_eq!(world.registry.nearest(Class::Archer, Vec2::new(0.0, 350.0), &board), Some(near));
        assert_eq!(world.registry.instances(Class::Archer), &[near]);
    }
}
