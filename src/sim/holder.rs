//! Holder layers: transparent wrappers around an entity
//!
//! A wrapper never replaces the entity on the board. Layers stack on the real
//! entity (outermost last), so the entity keeps its id and board slot no
//! matter how many wrappers are applied. When the entity leaves the board,
//! `lose` walks every layer and hands back the spawner slots that must be
//! released.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;

/// A spawner's claim on an entity it produced
///
/// `slot` is the tracking slot held, or None for an untracked spawner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRef {
    pub spawner: EntityId,
    pub slot: Option<usize>,
}

/// Interpolated trip from a spawner to the spawned entity's post
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnTravel {
    pub destination: Vec2,
    /// Axes that stay where the spawner put them
    pub move_x: bool,
    pub move_y: bool,
    /// Units per tick
    pub step: f32,
    pub claim: SlotRef,
}

impl SpawnTravel {
    /// Advance `pos` one step; returns the new position and whether it arrived
    pub fn advance(&self, pos: Vec2) -> (Vec2, bool) {
        let target = Vec2::new(
            if self.move_x { self.destination.x } else { pos.x },
            if self.move_y { self.destination.y } else { pos.y },
        );
        let delta = target - pos;
        let distance = delta.length();
        if distance <= self.step {
            (target, true)
        } else {
            (pos + delta / distance * self.step, false)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HolderLayer {
    /// Being carried from a spawner to its post; the entity does not act
    Spawning(SpawnTravel),
    /// Deployed entity still counted against a spawner slot
    Tracked(SlotRef),
    /// Invulnerable until the current knockback glide stops
    Knockback,
    /// Permanently invulnerable
    Invulnerable,
}

impl HolderLayer {
    fn claim(&self) -> Option<SlotRef> {
        match self {
            HolderLayer::Spawning(travel) => Some(travel.claim),
            HolderLayer::Tracked(claim) => Some(*claim),
            HolderLayer::Knockback | HolderLayer::Invulnerable => None,
        }
    }
}

/// The wrapper chain of one entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrapperComponent {
    layers: Vec<HolderLayer>,
}

impl WrapperComponent {
    pub fn push(&mut self, layer: HolderLayer) {
        self.layers.push(layer);
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[HolderLayer] {
        &self.layers
    }

    pub fn is_invulnerable(&self) -> bool {
        self.layers.iter().any(|l| {
            matches!(
                l,
                HolderLayer::Spawning(_) | HolderLayer::Knockback | HolderLayer::Invulnerable
            )
        })
    }

    pub fn has_knockback(&self) -> bool {
        self.layers.iter().any(|l| matches!(l, HolderLayer::Knockback))
    }

    /// Remove knockback layers once the glide has stopped
    pub fn release_knockback(&mut self) {
        self.layers.retain(|l| !matches!(l, HolderLayer::Knockback));
    }

    /// Current spawn trip, if the entity is still being carried
    pub fn travel(&self) -> Option<&SpawnTravel> {
        self.layers.iter().find_map(|l| match l {
            HolderLayer::Spawning(travel) => Some(travel),
            _ => None,
        })
    }

    pub fn is_spawning(&self) -> bool {
        self.travel().is_some()
    }

    /// End the spawn trip; a claim with a slot stays registered as `Tracked`
    pub fn deploy(&mut self) -> Option<SlotRef> {
        let pos = self
            .layers
            .iter()
            .position(|l| matches!(l, HolderLayer::Spawning(_)))?;
        let claim = self.layers[pos].claim()?;
        if claim.slot.is_some() {
            self.layers[pos] = HolderLayer::Tracked(claim);
        } else {
            self.layers.remove(pos);
        }
        Some(claim)
    }

    /// Tear down every layer, returning each spawner claim that must be released
    pub fn lose(&mut self) -> Vec<SlotRef> {
        let claims = self.layers.iter().rev().filter_map(HolderLayer::claim).collect();
        self.layers.clear();
        claims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(spawner: u32, slot: usize) -> SlotRef {
        SlotRef {
            spawner: EntityId(spawner),
            slot: Some(slot),
        }
    }

    #[test]
    fn test_travel_respects_frozen_axes() {
        let travel = SpawnTravel {
            destination: Vec2::new(100.0, -40.0),
            move_x: false,
            move_y: true,
            step: 15.0,
            claim: SlotRef {
                spawner: EntityId(1),
                slot: None,
            },
        };
        let (pos, arrived) = travel.advance(Vec2::new(5.0, 0.0));
        assert_eq!(pos, Vec2::new(5.0, -15.0));
        assert!(!arrived);
        let (pos, arrived) = travel.advance(Vec2::new(5.0, -30.0));
        assert_eq!(pos, Vec2::new(5.0, -40.0));
        assert!(arrived);
    }

    #[test]
    fn test_deploy_keeps_slot() {
        let mut wrapper = WrapperComponent::default();
        wrapper.push(HolderLayer::Spawning(SpawnTravel {
            destination: Vec2::ZERO,
            move_x: true,
            move_y: true,
            step: 1.0,
            claim: slot(3, 1),
        }));
        assert!(wrapper.is_invulnerable());
        assert_eq!(wrapper.deploy(), Some(slot(3, 1)));
        assert!(!wrapper.is_spawning());
        assert!(!wrapper.is_invulnerable());
        assert_eq!(wrapper.layers(), &[HolderLayer::Tracked(slot(3, 1))]);
    }

    #[test]
    fn test_lose_propagates_through_every_layer() {
        let mut wrapper = WrapperComponent::default();
        wrapper.push(HolderLayer::Tracked(slot(1, 0)));
        wrapper.push(HolderLayer::Knockback);
        wrapper.push(HolderLayer::Tracked(slot(2, 4)));
        assert_eq!(wrapper.depth(), 3);
        let freed = wrapper.lose();
        assert_eq!(freed, vec![slot(2, 4), slot(1, 0)]);
        assert_eq!(wrapper.depth(), 0);
    }

    #[test]
    fn test_untracked_claim_is_dropped_on_deploy() {
        let mut wrapper = WrapperComponent::default();
        let claim = SlotRef {
            spawner: EntityId(8),
            slot: None,
        };
        wrapper.push(HolderLayer::Spawning(SpawnTravel {
            destination: Vec2::ZERO,
            move_x: true,
            move_y: true,
            step: 1.0,
            claim,
        }));
        assert_eq!(wrapper.deploy(), Some(claim));
        assert_eq!(wrapper.depth(), 0);
        assert!(wrapper.lose().is_empty());
    }

    #[test]
    fn test_release_knockback_only() {
        let mut wrapper = WrapperComponent::default();
        wrapper.push(HolderLayer::Tracked(slot(1, 0)));
        wrapper.push(HolderLayer::Knockback);
        assert!(wrapper.has_knockback());
        wrapper.release_knockback();
        assert!(!wrapper.has_knockback());
        assert_eq!(wrapper.depth(), 1);
    }
}
