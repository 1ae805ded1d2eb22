//! Places: the top-level game states and their error boundary
//!
//! Exactly one place is active. `PlaceRunner` ticks it once per frame and
//! turns any error or panic it raises into a logged alert and a forced return
//! to the home place.

use std::panic::{AssertUnwindSafe, catch_unwind};

use super::state::GameEvent;
use super::tick::GameBoard;
use crate::error::{SimError, SimResult};
use crate::persistence::{EndReason, RunLog, RunRecord};
use crate::platform::{Announcer, Key, SoundCue, Surface, TickInput};
use crate::ui::{EntryEvent, TextEntry};
use crate::Settings;

/// Longest seed the home place accepts (fits in u64)
const SEED_DIGITS: usize = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Home,
    StartGame { seed: u64 },
    Quit,
}

/// Collaborators for one frame
pub struct Frame<'a> {
    pub input: &'a TickInput,
    pub surface: &'a mut dyn Surface,
    pub announcer: &'a mut dyn Announcer,
}

pub trait Place {
    fn name(&self) -> &'static str;

    fn tick(&mut self, frame: &mut Frame<'_>) -> SimResult<Transition>;

    /// Called when `tick` failed, before the place is dropped
    fn on_error(&mut self) {}

    /// Record of a run that finished in this place, if any
    fn take_record(&mut self) -> Option<RunRecord> {
        None
    }
}

/// Title screen with seed entry
pub struct HomePlace {
    default_seed: u64,
    entry: TextEntry,
}

impl HomePlace {
    pub fn new(default_seed: u64) -> Self {
        Self {
            default_seed,
            entry: TextEntry::digits(SEED_DIGITS),
        }
    }

    pub fn entry(&self) -> &TextEntry {
        &self.entry
    }
}

impl Place for HomePlace {
    fn name(&self) -> &'static str {
        "home"
    }

    fn tick(&mut self, frame: &mut Frame<'_>) -> SimResult<Transition> {
        if !self.entry.is_editing() {
            if frame.input.was_pressed(Key::Interact) {
                self.entry.begin();
                frame.announcer.announce("Type a seed, then confirm");
                return Ok(Transition::Stay);
            }
            if frame.input.was_pressed(Key::Confirm) {
                return Ok(Transition::StartGame {
                    seed: self.default_seed,
                });
            }
            if frame.input.was_pressed(Key::Cancel) {
                return Ok(Transition::Quit);
            }
            return Ok(Transition::Stay);
        }

        match self.entry.update(frame.input) {
            EntryEvent::Committed(text) if text.is_empty() => Ok(Transition::StartGame {
                seed: self.default_seed,
            }),
            EntryEvent::Committed(text) => match text.parse::<u64>() {
                Ok(seed) => Ok(Transition::StartGame { seed }),
                Err(_) => {
                    frame.announcer.announce("That seed is too large");
                    self.entry.reset();
                    Ok(Transition::Stay)
                }
            },
            EntryEvent::Cancelled => {
                frame.announcer.announce("Seed entry cancelled");
                Ok(Transition::Stay)
            }
            EntryEvent::Changed | EntryEvent::None => Ok(Transition::Stay),
        }
    }
}

/// A run in progress
pub struct GamePlace {
    game: GameBoard,
    run_log: Option<RunLog>,
    record: Option<RunRecord>,
}

impl GamePlace {
    pub fn new(game: GameBoard, run_log: Option<RunLog>) -> Self {
        Self {
            game,
            run_log,
            record: None,
        }
    }

    pub fn game(&self) -> &GameBoard {
        &self.game
    }

    fn finish(&mut self, reason: EndReason) {
        self.game.end(reason);
        let record = self.game.record(reason);
        if let Some(log) = &self.run_log
            && let Err(e) = log.append(&record)
        {
            log::warn!("Could not record run: {e}");
        }
        self.record = Some(record);
    }
}

impl Place for GamePlace {
    fn name(&self) -> &'static str {
        "game"
    }

    fn tick(&mut self, frame: &mut Frame<'_>) -> SimResult<Transition> {
        if frame.input.was_pressed(Key::Cancel) {
            self.finish(EndReason::Quit);
            return Ok(Transition::Home);
        }

        let report = self.game.tick(frame.input)?;
        for event in self.game.drain_events() {
            match event {
                GameEvent::Announce(text) => frame.announcer.announce(&text),
                GameEvent::Sound(cue) => frame.announcer.play(cue),
            }
        }
        self.game.draw(&mut *frame.surface);

        match report.ended {
            Some(reason) => {
                self.finish(reason);
                Ok(Transition::Home)
            }
            None => Ok(Transition::Stay),
        }
    }

    fn on_error(&mut self) {
        if self.record.is_none() {
            self.finish(EndReason::Error);
        }
    }

    fn take_record(&mut self) -> Option<RunRecord> {
        self.record.take()
    }
}

/// Drives the active place and recovers from its failures
pub struct PlaceRunner {
    settings: Settings,
    run_log: Option<RunLog>,
    default_seed: u64,
    current: Box<dyn Place>,
    records: Vec<RunRecord>,
}

impl PlaceRunner {
    pub fn new(settings: Settings, default_seed: u64) -> Self {
        let run_log = settings.run_log_path.clone().map(RunLog::new);
        Self {
            settings,
            run_log,
            default_seed,
            current: Box::new(HomePlace::new(default_seed)),
            records: Vec::new(),
        }
    }

    /// Replace the active place (tests, custom front ends)
    pub fn with_place(mut self, place: Box<dyn Place>) -> Self {
        self.current = place;
        self
    }

    pub fn place_name(&self) -> &'static str {
        self.current.name()
    }

    /// Runs finished so far, oldest first
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Tick the active place once
    pub fn tick(&mut self, frame: &mut Frame<'_>) -> Transition {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.current.tick(frame)));
        let result = outcome.unwrap_or_else(|payload| Err(SimError::from_panic(payload)));
        match result {
            Ok(Transition::Stay) => Transition::Stay,
            Ok(Transition::Home) => {
                self.go_home();
                Transition::Home
            }
            Ok(Transition::StartGame { seed }) => match GameBoard::new(seed, self.settings.clone()) {
                Ok(game) => {
                    log::info!("Starting game with seed {seed}");
                    self.collect_record();
                    self.current = Box::new(GamePlace::new(game, self.run_log.clone()));
                    Transition::StartGame { seed }
                }
                Err(e) => self.fail(e, &mut *frame.announcer),
            },
            Ok(Transition::Quit) => {
                self.collect_record();
                Transition::Quit
            }
            Err(e) => self.fail(e, &mut *frame.announcer),
        }
    }

    fn collect_record(&mut self) {
        if let Some(record) = self.current.take_record() {
            self.records.push(record);
        }
    }

    fn go_home(&mut self) {
        self.collect_record();
        self.current = Box::new(HomePlace::new(self.default_seed));
    }

    fn fail(&mut self, error: SimError, announcer: &mut dyn Announcer) -> Transition {
        log::error!("{} place failed: {error}", self.current.name());
        // Panics inside on_error must not escape the boundary either
        if catch_unwind(AssertUnwindSafe(|| self.current.on_error())).is_err() {
            log::error!("{} place failed while cleaning up", self.current.name());
        }
        announcer.announce(&format!("Something went wrong: {error}"));
        announcer.play(SoundCue::Alert);
        self.go_home();
        Transition::Home
    }
}
