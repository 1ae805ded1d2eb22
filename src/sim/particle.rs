//! Particles
//!
//! Particles never collide and never touch the board. Each area owns a
//! `ParticleSet`; ids come from a counter that restarts whenever the set
//! empties, so it cannot run away over a long run.

use std::collections::BTreeMap;

use glam::Vec2;

use super::camera::Camera;
use super::sprite::Sprite;
use crate::platform::Surface;

/// Upper bound per set; the oldest particle goes first
pub const MAX_PARTICLES: usize = 256;
/// Speed lost per tick (multiplicative)
const DRAG: f32 = 0.92;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Ticks left to live
    pub lifespan: u32,
    pub sprite: Sprite,
}

#[derive(Debug, Clone, Default)]
pub struct ParticleSet {
    particles: BTreeMap<u32, Particle>,
    next_id: u32,
}

impl ParticleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.values()
    }

    fn allocate_id(&mut self) -> u32 {
        if self.particles.is_empty() {
            self.next_id = 0;
        }
        while self.particles.contains_key(&self.next_id) {
            self.next_id = self.next_id.wrapping_add(1);
        }
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn spawn(&mut self, pos: Vec2, vel: Vec2, lifespan: u32, sprite: Sprite) -> u32 {
        if self.particles.len() >= MAX_PARTICLES
            && let Some(&oldest) = self.particles.keys().next()
        {
            self.particles.remove(&oldest);
        }
        let id = self.allocate_id();
        self.particles.insert(
            id,
            Particle {
                id,
                pos,
                vel,
                lifespan,
                sprite,
            },
        );
        id
    }

    /// Scatter `count` particles from `pos`
    ///
    /// The spread comes from a hash of `seed` and the particle number, so a
    /// burst never consumes simulation randomness.
    pub fn burst(&mut self, pos: Vec2, count: usize, sprite: Sprite, seed: u32) {
        for i in 0..count as u32 {
            let hash = seed.wrapping_mul(2654435761).wrapping_add(i.wrapping_mul(7919));
            let angle = (hash % 1000) as f32 / 1000.0 * std::f32::consts::TAU;
            let speed = 1.5 + ((hash >> 10) % 1000) as f32 / 1000.0 * 3.0;
            let lifespan = 15 + (hash >> 20) % 20;
            let vel = Vec2::new(angle.cos(), angle.sin()) * speed;
            self.spawn(pos, vel, lifespan, sprite);
        }
    }

    pub fn tick(&mut self) {
        for particle in self.particles.values_mut() {
            particle.pos += particle.vel;
            particle.vel *= DRAG;
            particle.lifespan = particle.lifespan.saturating_sub(1);
        }
        self.particles.retain(|_, p| p.lifespan > 0);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn draw(&self, surface: &mut dyn Surface, camera: &Camera, shake: f32) {
        for particle in self.particles.values() {
            if camera.in_view(particle.pos.y) {
                surface.draw(particle.sprite, camera.to_screen(particle.pos, shake), 0.0);
            }
        }
    }
}
