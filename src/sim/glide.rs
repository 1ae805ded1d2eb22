//! Two-phase glide motion
//!
//! A glide travels at constant speed for `duration` ticks, then loses `taper`
//! speed per tick until it stops. Knockback, dashes, thrown weapons and boss
//! charges all use this; only the parameters differ.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Glide {
    pub speed: f32,
    /// +1 forward (increasing y), -1 back
    pub direction: f32,
    /// Speed lost per tick once the sustain phase is over
    pub taper: f32,
    /// Ticks of constant-speed travel left
    pub duration: u32,
    active: bool,
}

/// Outcome of advancing a glide by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlideStep {
    /// Signed displacement along y for this tick
    pub displacement: f32,
    /// True exactly once, on the tick the glide comes to rest
    pub stopped: bool,
}

impl Glide {
    pub fn new(speed: f32, duration: u32, taper: f32, direction: f32) -> Self {
        let mut glide = Self::default();
        glide.start(speed, duration, taper, direction);
        glide
    }

    /// Begin (or restart) a glide
    pub fn start(&mut self, speed: f32, duration: u32, taper: f32, direction: f32) {
        self.speed = speed.max(0.0);
        self.duration = duration;
        self.taper = taper.max(0.0);
        self.direction = if direction < 0.0 { -1.0 } else { 1.0 };
        self.active = self.speed > 0.0;
    }

    pub fn is_gliding(&self) -> bool {
        self.active
    }

    /// Cancel without firing the stop notification
    pub fn halt(&mut self) {
        self.speed = 0.0;
        self.duration = 0;
        self.active = false;
    }

    /// Advance one tick
    pub fn step(&mut self) -> GlideStep {
        if !self.active {
            return GlideStep {
                displacement: 0.0,
                stopped: false,
            };
        }
        if self.duration > 0 {
            self.duration -= 1;
        } else {
            self.speed = (self.speed - self.taper).max(0.0);
        }
        let displacement = self.speed * self.direction;
        let stopped = self.speed == 0.0;
        if stopped {
            self.active = false;
        } else if self.duration == 0 && self.taper == 0.0 {
            // A glide with no taper would never end; stop once the sustain phase ends
            self.speed = 0.0;
            self.active = false;
            return GlideStep {
                displacement,
                stopped: true,
            };
        }
        GlideStep {
            displacement,
            stopped,
        }
    }
}
