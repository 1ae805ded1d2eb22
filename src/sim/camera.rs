//! Camera follow and screen shake
//!
//! The camera tracks one number, `bottom`: the world y at the bottom edge of
//! the screen. Each tick it eases toward a goal biased toward whichever side
//! of the player has more threats, then hard-clamps so the player never leaves
//! the configured margins.

use glam::Vec2;

use crate::Settings;
use crate::sign;

/// Threats closer than this pull with full weight
const NEAR_MASS: f32 = 300.0;
/// Threats beyond this do not pull at all
const FAR_MASS: f32 = 600.0;
/// Bias toward the last movement direction when threats cancel out
const NEUTRAL_PULL: f32 = 0.5;
const BASE_EASE: f32 = 0.05;
const ENFORCE_EASE: f32 = 0.2;

/// Pull contributed by a threat `d` units ahead of (or behind) the player
pub fn threat_mass(d: f32) -> f32 {
    let dist = d.abs();
    if dist < NEAR_MASS {
        sign(d)
    } else if dist < FAR_MASS {
        sign(d) * (FAR_MASS - dist) / NEAR_MASS
    } else {
        0.0
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    /// World y at the bottom of the screen
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
    bottom_threshold: f32,
    top_threshold: f32,
    panel_height: f32,
}

impl Camera {
    pub fn new(settings: &Settings) -> Self {
        Self {
            bottom: 0.0,
            width: settings.width,
            height: settings.height,
            bottom_threshold: settings.camera_thresholds.0,
            top_threshold: settings.camera_thresholds.1,
            panel_height: settings.tutorial_panel_height,
        }
    }

    pub fn top(&self) -> f32 {
        self.bottom + self.height
    }

    pub fn bottom_threshold(&self) -> f32 {
        self.bottom_threshold
    }

    /// Top margin in effect
    pub fn top_margin(&self, tutorial_showing: bool) -> f32 {
        if tutorial_showing {
            self.top_threshold + self.panel_height
        } else {
            self.top_threshold
        }
    }

    /// Is `y` inside the visible window?
    pub fn in_view(&self, y: f32) -> bool {
        y >= self.bottom && y <= self.top()
    }

    /// Camera pull in [-1, 1] from the threats at `threat_ys`
    pub fn pull(player_y: f32, threat_ys: impl IntoIterator<Item = f32>, last_move: f32) -> (f32, f32) {
        let mut mass = 0.0;
        let mut total = 0.0;
        for y in threat_ys {
            let m = threat_mass(y - player_y);
            mass += m;
            total += m.abs();
        }
        if total == 0.0 || mass == 0.0 {
            return (sign(last_move) * NEUTRAL_PULL, total);
        }
        (mass * mass.abs() / (total * total), total)
    }

    /// Ease toward the goal, then clamp around the player
    pub fn update(
        &mut self,
        player_y: f32,
        last_move: f32,
        threat_ys: impl IntoIterator<Item = f32>,
        enforce_center: Option<f32>,
        tutorial_showing: bool,
    ) {
        let half = self.height / 2.0;
        let (goal_bottom, rate) = match enforce_center {
            Some(center) => (center - half, ENFORCE_EASE),
            None => {
                let (pull, total) = Self::pull(player_y, threat_ys, last_move);
                let goal_center = player_y + pull * (half - self.bottom_threshold);
                (goal_center - half, BASE_EASE * (1.0 + total.min(10.0) / 20.0))
            }
        };
        self.bottom += (goal_bottom - self.bottom) * rate;
        self.clamp_to(player_y, tutorial_showing);
    }

    /// Keep `player_y` within the margins
    pub fn clamp_to(&mut self, player_y: f32, tutorial_showing: bool) {
        let lower = player_y - self.height + self.top_margin(tutorial_showing);
        let upper = player_y - self.bottom_threshold;
        if self.bottom < lower {
            self.bottom = lower;
        }
        if self.bottom > upper {
            self.bottom = upper;
        }
    }

    /// Snap straight to the clamped position (start of a run)
    pub fn center_on(&mut self, player_y: f32) {
        self.bottom = player_y - self.bottom_threshold - (self.height - self.top_threshold - self.bottom_threshold) / 2.0;
        self.clamp_to(player_y, false);
    }

    /// World position to screen position
    pub fn to_screen(&self, pos: Vec2, shake: f32) -> Vec2 {
        Vec2::new(
            pos.x + self.width / 2.0 + shake,
            self.height - (pos.y - self.bottom),
        )
    }
}

/// Horizontal screen shake
///
/// The displacement grows by `delta` per tick and bounces off `±limit`
/// (with `limit = 3 * |delta|`); the shake ends when the duration runs out.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenShake {
    pub displacement: f32,
    delta: f32,
    limit: f32,
    remaining: u32,
}

impl ScreenShake {
    pub fn start(&mut self, delta: f32, duration: u32) {
        // A stronger shake replaces a weaker one
        if self.remaining > 0 && delta.abs() < self.delta.abs() {
            self.remaining = self.remaining.max(duration);
            return;
        }
        self.delta = delta.abs();
        self.limit = 3.0 * self.delta;
        self.remaining = duration;
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    pub fn update(&mut self) {
        if self.remaining == 0 {
            self.displacement = 0.0;
            return;
        }
        self.remaining -= 1;
        self.displacement += self.delta;
        if self.displacement > self.limit {
            self.displacement = 2.0 * self.limit - self.displacement;
            self.delta = -self.delta;
        } else if self.displacement < -self.limit {
            self.displacement = -2.0 * self.limit - self.displacement;
            self.delta = -self.delta;
        }
        if self.remaining == 0 {
            self.displacement = 0.0;
        }
    }
}
