//! Game settings
//!
//! Loaded from a JSON file next to the runner; every field has a default so
//! partial files are accepted.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Simulation and presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Visible width in world units
    pub width: f32,
    /// Visible height in world units
    pub height: f32,
    /// (bottom, top) margins the player must stay inside
    pub camera_thresholds: (f32, f32),
    /// Extra top margin while a tutorial panel is showing
    pub tutorial_panel_height: f32,
    /// Areas generated synchronously before the first tick
    pub initial_areas: usize,
    /// Areas load this far above the visible top
    pub load_ahead: f32,
    /// Generate replacement areas on a worker thread
    pub background_generation: bool,
    /// Ticks per second
    pub tick_rate: u32,
    /// Ticks a tutorial panel stays up
    pub tutorial_ticks: u32,
    /// Append-only run log (None disables logging runs)
    pub run_log_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 800.0,
            camera_thresholds: (100.0, 500.0),
            tutorial_panel_height: 120.0,
            initial_areas: 5,
            load_ahead: 200.0,
            background_generation: true,
            tick_rate: crate::consts::TICK_RATE,
            tutorial_ticks: 240,
            run_log_path: None,
        }
    }
}

impl Settings {
    /// Settings suitable for tests: synchronous generation, no run log
    pub fn deterministic() -> Self {
        Self {
            background_generation: false,
            ..Self::default()
        }
    }

    /// Parse settings from a JSON string and validate them
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| SimError::Settings(format!("malformed settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a file, falling back to defaults if it is missing
    pub fn load(path: &Path) -> SimResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let settings = Self::from_json_str(&json)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(SimError::io(path, e)),
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> SimResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| SimError::io(path, e))?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Reject configurations that leave the player no room on screen
    pub fn validate(&self) -> SimResult<()> {
        let (bottom, top) = self.camera_thresholds;
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(SimError::Settings("screen size must be positive".into()));
        }
        if bottom < 0.0 || top < 0.0 {
            return Err(SimError::Settings("camera thresholds must be non-negative".into()));
        }
        if bottom + top + self.tutorial_panel_height > self.height {
            return Err(SimError::Settings(format!(
                "camera thresholds ({bottom}, {top}) plus tutorial panel exceed height {}",
                self.height
            )));
        }
        if self.initial_areas < 3 {
            return Err(SimError::Settings("at least three initial areas are required".into()));
        }
        if self.tick_rate == 0 {
            return Err(SimError::Settings("tick rate must be positive".into()));
        }
        Ok(())
    }
}
