//! Area selection and the generation pipeline
//!
//! Selection: `typ = determinator(seed, index) % 64`, then walk `AREA_TABLE`
//! and take the first rule whose threshold covers `typ` and whose gate
//! passes. The first three areas are fixed tutorials.
//!
//! The pipeline owns the generator and the area queue. Generation may run on
//! a worker thread; the generator mutex keeps it to one generation at a
//! time, and every queue access goes through the queue mutex.

use std::collections::{BTreeMap, VecDeque};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};

use super::area::{Area, AreaType};
use crate::consts::AREA_TYPE_BUCKETS;
use crate::error::{SimError, SimResult};

/// SplitMix64 finaliser
pub fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub fn determinator(seed: u64, index: usize) -> u64 {
    splitmix64(seed.wrapping_add(index as u64))
}

/// One row of the selection table
#[derive(Debug, Clone, Copy)]
pub struct AreaRule {
    pub kind: AreaType,
    /// Inclusive upper bound on `typ`
    pub threshold: u64,
    pub min_index: usize,
    /// Areas that must pass since the last area of this kind
    pub cooldown: usize,
    /// Kind that must already have been generated
    pub requires: Option<AreaType>,
}

impl AreaRule {
    pub fn allowed_at(&self, index: usize, history: &AreaHistory) -> bool {
        if index < self.min_index {
            return false;
        }
        if let Some(last) = history.last_index(self.kind)
            && index - last <= self.cooldown
        {
            return false;
        }
        self.requires.is_none_or(|kind| history.count(kind) > 0)
    }
}

pub const AREA_TABLE: [AreaRule; 6] = [
    AreaRule {
        kind: AreaType::Boss,
        threshold: 3,
        min_index: 10,
        cooldown: 8,
        requires: None,
    },
    AreaRule {
        kind: AreaType::Gift,
        threshold: 9,
        min_index: 0,
        cooldown: 5,
        requires: Some(AreaType::BreakThrough),
    },
    AreaRule {
        kind: AreaType::Minigame,
        threshold: 16,
        min_index: 6,
        cooldown: 6,
        requires: None,
    },
    AreaRule {
        kind: AreaType::Enslaught,
        threshold: 24,
        min_index: 5,
        cooldown: 4,
        requires: None,
    },
    AreaRule {
        kind: AreaType::BreakThrough,
        threshold: 38,
        min_index: 4,
        cooldown: 3,
        requires: None,
    },
    AreaRule {
        kind: AreaType::Basic,
        threshold: 63,
        min_index: 0,
        cooldown: 0,
        requires: None,
    },
];

/// What has been generated so far
#[derive(Debug, Clone, Default)]
pub struct AreaHistory {
    last: BTreeMap<AreaType, usize>,
    counts: BTreeMap<AreaType, usize>,
}

impl AreaHistory {
    pub fn record(&mut self, kind: AreaType, index: usize) {
        self.last.insert(kind, index);
        *self.counts.entry(kind).or_default() += 1;
    }

    pub fn last_index(&self, kind: AreaType) -> Option<usize> {
        self.last.get(&kind).copied()
    }

    pub fn count(&self, kind: AreaType) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<AreaType, usize> {
        &self.counts
    }
}

/// Injected failure for exercising the error paths
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Error(usize),
    Panic(usize),
}

#[derive(Debug)]
pub struct AreaGenerator {
    pub seed: u64,
    next_index: usize,
    history: AreaHistory,
    #[cfg(test)]
    pub fault: Option<Fault>,
}

impl AreaGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            next_index: 0,
            history: AreaHistory::default(),
            #[cfg(test)]
            fault: None,
        }
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn history(&self) -> &AreaHistory {
        &self.history
    }

    pub fn select_type(&self, index: usize) -> AreaType {
        match index {
            0 => return AreaType::Opening,
            1 => return AreaType::SlimeTutorial,
            2 => return AreaType::ItemTutorial,
            _ => {}
        }
        let typ = determinator(self.seed, index) % AREA_TYPE_BUCKETS;
        AREA_TABLE
            .iter()
            .find(|rule| rule.threshold >= typ && rule.allowed_at(index, &self.history))
            .map_or(AreaType::Basic, |rule| rule.kind)
    }

    /// Generate the next area; the index only advances on success
    pub fn generate_next(&mut self) -> SimResult<Area> {
        let index = self.next_index;
        #[cfg(test)]
        match self.fault {
            Some(Fault::Error(at)) if at == index => {
                return Err(SimError::generation(index, "injected failure"));
            }
            Some(Fault::Panic(at)) if at == index => panic!("injected panic at area {index}"),
            _ => {}
        }
        let kind = self.select_type(index);
        let area = Area::generate(self.seed, index, kind)?;
        self.history.record(kind, index);
        self.next_index += 1;
        log::info!("generated area {} as {}", index, kind.name());
        Ok(area)
    }
}

/// Generated areas in world order
#[derive(Debug, Default)]
pub struct AreaQueue {
    pub areas: VecDeque<Area>,
    /// Start coordinate for the next appended area
    next_start: f32,
}

impl AreaQueue {
    /// Finalize `area` at the end of the world and append it
    pub fn append(&mut self, mut area: Area) {
        area.finalize(self.next_start);
        self.next_start = area.end_coordinate();
        self.areas.push_back(area);
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// End of the last generated area
    pub fn world_end(&self) -> f32 {
        self.next_start
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run one generation, reporting failures as alerts instead of propagating
fn run_generation(generator: &Mutex<AreaGenerator>, queue: &Mutex<AreaQueue>, alerts: &Sender<String>) -> bool {
    let mut generator = lock(generator);
    let index = generator.next_index();
    let outcome = catch_unwind(AssertUnwindSafe(|| generator.generate_next()));
    let error = match outcome {
        Ok(Ok(area)) => {
            lock(queue).append(area);
            return true;
        }
        Ok(Err(e)) => e,
        Err(payload) => SimError::from_panic(payload),
    };
    log::error!("area generation failed at index {index}: {error}");
    let _ = alerts.send(format!("Could not build area {index}: {error}"));
    false
}

/// Generator + queue shared with worker threads
pub struct AreaPipeline {
    generator: Arc<Mutex<AreaGenerator>>,
    queue: Arc<Mutex<AreaQueue>>,
    alerts_tx: Sender<String>,
    alerts_rx: Receiver<String>,
    workers: Vec<JoinHandle<()>>,
}

impl AreaPipeline {
    pub fn new(seed: u64) -> Self {
        Self::with_generator(AreaGenerator::new(seed))
    }

    pub fn with_generator(generator: AreaGenerator) -> Self {
        let (alerts_tx, alerts_rx) = unbounded();
        Self {
            generator: Arc::new(Mutex::new(generator)),
            queue: Arc::new(Mutex::new(AreaQueue::default())),
            alerts_tx,
            alerts_rx,
            workers: Vec::new(),
        }
    }

    /// Generate `count` areas on a worker and wait for them
    ///
    /// Returns how many were appended.
    pub fn generate_blocking(&mut self, count: usize) -> SimResult<usize> {
        let generator = Arc::clone(&self.generator);
        let queue = Arc::clone(&self.queue);
        let alerts = self.alerts_tx.clone();
        let handle = std::thread::spawn(move || (0..count).filter(|_| run_generation(&generator, &queue, &alerts)).count());
        handle.join().map_err(SimError::from_panic)
    }

    /// Ask for one more area, on a worker when `background` is set
    pub fn request(&mut self, background: bool) {
        self.workers.retain(|w| !w.is_finished());
        if !background {
            run_generation(&self.generator, &self.queue, &self.alerts_tx);
            return;
        }
        let generator = Arc::clone(&self.generator);
        let queue = Arc::clone(&self.queue);
        let alerts = self.alerts_tx.clone();
        self.workers.push(std::thread::spawn(move || {
            run_generation(&generator, &queue, &alerts);
        }));
    }

    /// Block until every outstanding worker has finished
    pub fn wait_idle(&mut self) {
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("area worker exited abnormally");
            }
        }
    }

    pub fn queue(&self) -> MutexGuard<'_, AreaQueue> {
        lock(&self.queue)
    }

    pub fn drain_alerts(&self) -> Vec<String> {
        self.alerts_rx.try_iter().collect()
    }

    /// Areas generated per type so far
    pub fn counts(&self) -> BTreeMap<AreaType, usize> {
        lock(&self.generator).history().counts().clone()
    }

    pub fn generated(&self) -> usize {
        lock(&self.generator).next_index()
    }
}

impl Drop for AreaPipeline {
    fn drop(&mut self) {
        self.wait_idle();
    }
}
