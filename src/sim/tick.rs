//! Fixed timestep game board tick
//!
//! `GameBoard` owns a run: the world state, the player, the ordered entity
//! board and the area pipeline. Each call to `tick` advances it by exactly one
//! simulation step; wall-clock time never enters.

use std::collections::BTreeMap;

use super::area::AreaType;
use super::board::Board;
use super::generator::AreaPipeline;
use super::player::{Bounds, Player};
use super::sprite::Sprite;
use super::state::{GameEvent, TickCtx, WorldState};
use crate::error::{SimError, SimResult};
use crate::persistence::{EndReason, RunRecord};
use crate::platform::{SoundCue, Surface, TickInput};
use crate::Settings;

/// Fewest areas a run can start with (the three tutorial areas)
const MIN_START_AREAS: usize = 3;

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub ended: Option<EndReason>,
}

/// Where an area sits and what it holds right now
#[derive(Debug, Clone, PartialEq)]
pub struct AreaSummary {
    pub index: usize,
    pub kind: AreaType,
    pub start: f32,
    pub end: f32,
    pub loaded: bool,
    pub live_entities: usize,
}

pub struct GameBoard {
    settings: Settings,
    pub world: WorldState,
    pub player: Player,
    pub board: Board,
    pipeline: AreaPipeline,
    ended: Option<EndReason>,
    area_index_reached: usize,
}

impl GameBoard {
    /// Start a run: generate the opening areas synchronously and frame the player
    pub fn new(seed: u64, settings: Settings) -> SimResult<Self> {
        Self::with_pipeline(seed, settings, AreaPipeline::new(seed))
    }

    pub fn with_pipeline(seed: u64, settings: Settings, mut pipeline: AreaPipeline) -> SimResult<Self> {
        settings.validate()?;
        let built = pipeline.generate_blocking(settings.initial_areas)?;
        if built < MIN_START_AREAS {
            return Err(SimError::generation(
                built,
                format!("only {built} of {} starting areas could be built", settings.initial_areas),
            ));
        }
        log::info!("Run started with seed {seed} and {built} areas");

        let mut world = WorldState::new(seed, &settings);
        let player = Player::new();
        world.camera.center_on(player.y());
        Ok(Self {
            settings,
            world,
            player,
            board: Board::new(),
            pipeline,
            ended: None,
            area_index_reached: 0,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn ended(&self) -> Option<EndReason> {
        self.ended
    }

    /// End the run from outside (quit, error boundary)
    pub fn end(&mut self, reason: EndReason) {
        if self.ended.is_none() {
            log::info!("Run ended at tick {}: {}", self.world.tick, reason.as_str());
            self.ended = Some(reason);
        }
    }

    pub fn distance(&self) -> f32 {
        self.player.distance_reached
    }

    pub fn area_index_reached(&self) -> usize {
        self.area_index_reached
    }

    /// Advance the run by one tick
    pub fn tick(&mut self, input: &TickInput) -> SimResult<TickReport> {
        if self.ended.is_some() {
            return Ok(self.report());
        }

        // Stamp presses and surface generation failures
        self.world.presses.record(input, self.world.tick);
        for alert in self.pipeline.drain_alerts() {
            self.world.announce(alert);
            self.world.sound(SoundCue::Alert);
        }

        // Retire areas that scrolled away, then bring new ones into view
        self.retire_passed_areas();
        self.load_visible();
        self.board.commit(&mut self.world);

        self.world.shake.update();
        self.world.tick_tutorial();

        // Player first, then everything on the board in y order
        let bounds = self.player_bounds();
        self.player.update(input, bounds, &mut self.world, &mut self.board)?;
        self.track_player_area();
        self.tick_entities()?;
        self.tick_areas();
        self.board.commit(&mut self.world);

        self.update_camera();

        self.world.tick += 1;
        if !self.player.is_alive() {
            self.world.announce("You died");
            self.end(EndReason::Death);
        }
        Ok(self.report())
    }

    fn report(&self) -> TickReport {
        TickReport {
            tick: self.world.tick,
            ended: self.ended,
        }
    }

    fn retire_passed_areas(&mut self) {
        let retired = {
            let mut queue = self.pipeline.queue();
            let mut retired = 0;
            while queue.len() > 1
                && queue
                    .areas
                    .front()
                    .is_some_and(|area| area.end_coordinate() < self.world.camera.bottom)
            {
                if let Some(mut area) = queue.areas.pop_front() {
                    area.despawn(&mut self.board);
                    retired += 1;
                }
            }
            retired
        };
        // The queue lock must be released before a synchronous request
        for _ in 0..retired {
            self.pipeline.request(self.settings.background_generation);
        }
    }

    /// Load every finalized area whose start is within reach of the screen
    pub fn load_visible(&mut self) {
        let horizon = self.world.camera.top() + self.settings.load_ahead;
        let mut queue = self.pipeline.queue();
        for area in queue.areas.iter_mut() {
            if area.start_coordinate() > horizon {
                break;
            }
            area.load(&mut self.world, &mut self.board);
        }
        drop(queue);
        self.board.commit(&mut self.world);
    }

    fn player_bounds(&self) -> Bounds {
        let height = Sprite::Player.size().y;
        let queue = self.pipeline.queue();
        let floor = queue
            .areas
            .front()
            .map_or(f32::NEG_INFINITY, |area| area.start_coordinate() + height / 2.0);
        let ceiling = queue
            .areas
            .iter()
            .filter_map(|area| area.progress_limit(&self.board))
            .fold(queue.world_end() - height, f32::min);
        Bounds { floor, ceiling }
    }

    fn track_player_area(&mut self) {
        let queue = self.pipeline.queue();
        if let Some(area) = queue.areas.iter().find(|area| area.contains(self.player.y())) {
            self.player.area = area.index;
            self.area_index_reached = self.area_index_reached.max(area.index);
        }
    }

    fn tick_entities(&mut self) -> SimResult<()> {
        for i in 0..self.board.len() {
            let Ok(mut entity) = self.board.take(i) else {
                continue;
            };
            let mut ctx = TickCtx {
                world: &mut self.world,
                player: &mut self.player,
                board: &mut self.board,
            };
            let result = entity.tick(&mut ctx);
            self.board.restore(i, entity)?;
            result?;
        }
        self.board.commit(&mut self.world);
        Ok(())
    }

    fn tick_areas(&mut self) {
        let mut queue = self.pipeline.queue();
        for area in queue.areas.iter_mut() {
            area.tick(&mut self.world, &self.player, &mut self.board);
        }
        // Route particle requests to the area that raised them
        let seed = self.world.tick as u32;
        for (i, burst) in self.world.drain_bursts().into_iter().enumerate() {
            if let Some(area) = queue.areas.iter_mut().find(|area| area.index == burst.area) {
                area.burst(burst.pos, burst.count, burst.sprite, seed.wrapping_add(i as u32));
            }
        }
    }

    fn update_camera(&mut self) {
        let threats: Vec<f32> = self
            .board
            .iter()
            .filter(|e| e.is_hostile() && self.world.camera.in_view(e.y()))
            .map(|e| e.y())
            .collect();
        let enforce_center = {
            let queue = self.pipeline.queue();
            queue.areas.iter().find_map(|area| area.enforce_center(&self.board))
        };
        let tutorial = self.world.tutorial_showing();
        self.world
            .camera
            .update(self.player.y(), self.player.last_move, threats, enforce_center, tutorial);
    }

    pub fn area_summaries(&self) -> Vec<AreaSummary> {
        let queue = self.pipeline.queue();
        queue
            .areas
            .iter()
            .map(|area| AreaSummary {
                index: area.index,
                kind: area.kind,
                start: area.start_coordinate(),
                end: area.end_coordinate(),
                loaded: area.is_loaded(),
                live_entities: area.num_entities(&self.board),
            })
            .collect()
    }

    /// Areas generated per type over the whole run
    pub fn area_counts(&self) -> BTreeMap<AreaType, usize> {
        self.pipeline.counts()
    }

    /// Block until background generation settles
    pub fn wait_for_generation(&mut self) {
        self.pipeline.wait_idle();
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.world.drain_events()
    }

    /// Summary for the run log
    pub fn record(&self, end_reason: EndReason) -> RunRecord {
        RunRecord {
            seed: self.world.seed,
            area_index_reached: self.area_index_reached,
            distance_reached: self.player.distance_reached,
            elapsed_ticks: self.world.tick,
            elapsed_secs: self.world.tick as f64 / f64::from(self.settings.tick_rate),
            end_reason,
            area_counts: self.area_counts(),
        }
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        let camera = &self.world.camera;
        let shake = self.world.shake.displacement;
        {
            let queue = self.pipeline.queue();
            for area in queue.areas.iter() {
                area.draw(surface, camera, shake);
            }
        }
        for entity in self.board.iter().filter(|e| camera.in_view(e.y())) {
            entity.draw(surface, camera, shake);
        }
        self.player.draw(surface, camera, shake);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Key, RecordingSurface};
    use crate::sim::entity::Class;

    fn new_game(seed: u64) -> GameBoard {
        GameBoard::new(seed, Settings::deterministic()).unwrap()
    }

    fn clear_board(game: &mut GameBoard) {
        for entity in game.board.iter_mut() {
            if !entity.is_sentinel() {
                entity.actor.despawn();
            }
        }
    }

    /// A varied but fixed input sequence
    fn scripted_input(t: u64) -> TickInput {
        let mut keys = vec![Key::Up];
        match t % 40 {
            0..10 => keys.push(Key::Left),
            20..30 => keys.push(Key::Right),
            _ => {}
        }
        let input = TickInput::holding(&keys);
        match t % 50 {
            5 => input.with_press(Key::LeftHand),
            17 => input.with_press(Key::Interact),
            _ => input,
        }
    }

    #[test]
    fn test_starts_with_tutorial_areas() {
        let game = new_game(42);
        let areas = game.area_summaries();
        assert_eq!(areas.len(), 5);
        let kinds: Vec<AreaType> = areas.iter().take(3).map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AreaType::Opening, AreaType::SlimeTutorial, AreaType::ItemTutorial]);
        let lengths: Vec<f32> = areas.iter().take(3).map(|a| a.end - a.start).collect();
        assert_eq!(lengths, vec![300.0, 450.0, 750.0]);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut settings = Settings::deterministic();
        settings.initial_areas = 1;
        assert!(matches!(GameBoard::new(1, settings), Err(SimError::Settings(_))));
    }

    #[test]
    fn test_determinism() {
        let mut a = new_game(12345);
        let mut b = new_game(12345);
        for t in 0..600 {
            let input = scripted_input(t);
            a.tick(&input).unwrap();
            b.tick(&input).unwrap();
        }
        assert_eq!(a.distance(), b.distance());
        assert_eq!(a.area_index_reached(), b.area_index_reached());
        assert_eq!(a.area_summaries(), b.area_summaries());
        assert_eq!(a.player.health(), b.player.health());
        let ys_a: Vec<(Class, f32)> = a.board.iter().map(|e| (e.class(), e.y())).collect();
        let ys_b: Vec<(Class, f32)> = b.board.iter().map(|e| (e.class(), e.y())).collect();
        assert_eq!(ys_a, ys_b);
    }

    #[test]
    fn test_areas_stay_adjacent() {
        let mut game = new_game(7);
        for _ in 0..400 {
            clear_board(&mut game);
            game.tick(&TickInput::holding(&[Key::Up])).unwrap();
        }
        let areas = game.area_summaries();
        assert!(areas.len() >= 2);
        for pair in areas.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert_eq!(pair[0].index + 1, pair[1].index);
        }
        // Retired areas were replaced
        assert!(areas[0].index > 0);
    }

    #[test]
    fn test_seed_42_scenario() {
        let mut game = new_game(42);
        game.load_visible();

        let areas = game.area_summaries();
        let slime_y = areas[1].start + 225.0;
        let slime = game
            .board
            .iter()
            .find(|e| e.class() == Class::Slime && e.actor.area == 1)
            .unwrap();
        assert_eq!(slime.y(), slime_y);
        assert_eq!(slime.actor.health(), 7);

        let up = TickInput::holding(&[Key::Up]);
        let mut last = game.player.y();
        let mut deltas = Vec::new();
        for _ in 0..200 {
            clear_board(&mut game);
            game.tick(&up).unwrap();
            deltas.push(game.player.y() - last);
            last = game.player.y();
        }
        // Full speed until the progress limit first holds the player back
        let clamp = deltas.iter().position(|&d| d != 10.0).unwrap_or(deltas.len());
        assert!(clamp >= 100, "held back at tick {clamp}: {:?}", &deltas[clamp..]);
        if let Some(&held) = deltas.get(clamp) {
            assert!((0.0..10.0).contains(&held), "tick {clamp}: moved {held}");
            // Once held, the player never speeds back up
            assert!(deltas[clamp..].iter().all(|&d| (0.0..=held).contains(&d)), "{:?}", &deltas[clamp..]);
        }
        assert_eq!(game.distance(), game.player.y());
    }

    #[test]
    fn test_camera_keeps_player_in_margins() {
        let mut game = new_game(99);
        let (bottom_margin, _) = game.settings().camera_thresholds;
        let height = game.settings().height;
        for t in 0..500 {
            let input = if t % 90 < 60 {
                scripted_input(t)
            } else {
                TickInput::holding(&[Key::Down])
            };
            game.tick(&input).unwrap();
            if game.ended().is_some() {
                break;
            }
            let camera = &game.world.camera;
            let y = game.player.y();
            let top_margin = camera.top_margin(game.world.tutorial_showing());
            assert!(camera.bottom + bottom_margin <= y + 1e-3, "tick {t}: {} vs {y}", camera.bottom);
            assert!(y <= camera.bottom + height - top_margin + 1e-3, "tick {t}: {} vs {y}", camera.bottom);
        }
    }

    #[test]
    fn test_player_death_ends_run() {
        let mut game = new_game(3);
        game.player.set_health(0);
        let report = game.tick(&TickInput::default()).unwrap();
        assert_eq!(report.ended, Some(EndReason::Death));
        // Later ticks are no-ops
        let again = game.tick(&TickInput::holding(&[Key::Up])).unwrap();
        assert_eq!(again.tick, report.tick);

        let record = game.record(EndReason::Death);
        assert_eq!(record.seed, 3);
        assert_eq!(record.elapsed_ticks, 1);
        assert_eq!(record.area_counts.get(&AreaType::Opening), Some(&1));
    }

    #[test]
    fn test_background_generation_replaces_retired_areas() {
        let settings = Settings {
            background_generation: true,
            ..Settings::deterministic()
        };
        let mut game = GameBoard::new(5, settings).unwrap();
        for _ in 0..300 {
            clear_board(&mut game);
            game.tick(&TickInput::holding(&[Key::Up])).unwrap();
        }
        game.wait_for_generation();
        let areas = game.area_summaries();
        assert_eq!(areas.len(), 5);
        for pair in areas.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_draw_puts_player_on_screen() {
        let mut game = new_game(8);
        game.tick(&TickInput::default()).unwrap();
        let mut surface = RecordingSurface::default();
        game.draw(&mut surface);
        let player = surface
            .calls
            .iter()
            .find(|(sprite, _, _)| *sprite == Sprite::Player)
            .unwrap();
        assert!(player.1.y >= 0.0 && player.1.y <= game.settings().height);
    }
}
