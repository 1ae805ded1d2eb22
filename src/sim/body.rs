//! Oriented bounding boxes and collision tests
//!
//! Every collidable thing in the world is a `Body`: a rectangle with a centre,
//! a size taken from its sprite, and a rotation in degrees. Collision runs in
//! three stages:
//! 1. axis-aligned rectangle rejection (exact when both bodies are aligned)
//! 2. 16 edge-pair segment crossing tests between the rotated corners
//! 3. ray-crossing containment test for one corner in each direction

use std::cell::Cell;

use glam::Vec2;

use super::sprite::Sprite;
use crate::{normalize_degrees, rotate_vec};

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    /// Zero-area rectangles never collide with anything
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Strict overlap: rectangles that only share an edge do not overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }
}

/// A positioned, rotatable rectangle
#[derive(Debug, Clone)]
pub struct Body {
    pos: Vec2,
    frozen_x: bool,
    frozen_y: bool,
    /// Degrees, always in [0, 360)
    rotation: f32,
    size: Vec2,
    radius: f32,
    /// Corner offsets from `pos`, recomputed lazily after rotation/size changes
    corner_offsets: Cell<Option<[Vec2; 4]>>,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            frozen_x: false,
            frozen_y: false,
            rotation: 0.0,
            size,
            radius: size.length() / 2.0,
            corner_offsets: Cell::new(None),
        }
    }

    pub fn from_sprite(pos: Vec2, sprite: Sprite) -> Self {
        Self::new(pos, sprite.size())
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.pos.y
    }

    /// Move to `pos`; frozen axes keep their value
    pub fn set_pos(&mut self, pos: Vec2) {
        self.set_x(pos.x);
        self.set_y(pos.y);
    }

    pub fn set_x(&mut self, x: f32) {
        if !self.frozen_x {
            self.pos.x = x;
        }
    }

    pub fn set_y(&mut self, y: f32) {
        if !self.frozen_y {
            self.pos.y = y;
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        let target = self.pos + delta;
        self.set_pos(target);
    }

    pub fn freeze_x(&mut self, frozen: bool) {
        self.frozen_x = frozen;
    }

    pub fn freeze_y(&mut self, frozen: bool) {
        self.frozen_y = frozen;
    }

    pub fn is_frozen_x(&self) -> bool {
        self.frozen_x
    }

    pub fn is_frozen_y(&self) -> bool {
        self.frozen_y
    }

    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        let degrees = normalize_degrees(degrees);
        if degrees != self.rotation {
            self.rotation = degrees;
            self.corner_offsets.set(None);
        }
    }

    pub fn rotate_by(&mut self, degrees: f32) {
        self.set_rotation(self.rotation + degrees);
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Change the image-derived size (and bounding radius)
    pub fn set_size(&mut self, size: Vec2) {
        if size != self.size {
            self.size = size;
            self.radius = size.length() / 2.0;
            self.corner_offsets.set(None);
        }
    }

    /// Radius of the circle enclosing the body at any rotation
    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn is_axis_aligned(&self) -> bool {
        self.rotation % 90.0 == 0.0
    }

    fn corner_offsets(&self) -> [Vec2; 4] {
        if let Some(offsets) = self.corner_offsets.get() {
            return offsets;
        }
        let half = self.size / 2.0;
        let local = [
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ];
        let offsets = local.map(|c| rotate_vec(c, self.rotation));
        self.corner_offsets.set(Some(offsets));
        offsets
    }

    /// World-space corners, counter-clockwise
    pub fn corners(&self) -> [Vec2; 4] {
        self.corner_offsets().map(|c| c + self.pos)
    }

    /// Axis-aligned bounds (exact for aligned bodies)
    pub fn aabb(&self) -> Rect {
        if self.is_axis_aligned() {
            let size = if self.rotation % 180.0 == 0.0 {
                self.size
            } else {
                Vec2::new(self.size.y, self.size.x)
            };
            return Rect::from_center(self.pos, size);
        }
        let corners = self.corners();
        let mut min = corners[0];
        let mut max = corners[0];
        for c in &corners[1..] {
            min = min.min(*c);
            max = max.max(*c);
        }
        Rect { min, max }
    }

    /// Half the vertical extent of the bounds
    pub fn half_height(&self) -> f32 {
        self.aabb().height() / 2.0
    }

    /// Half the horizontal extent of the bounds
    pub fn half_width(&self) -> f32 {
        self.aabb().width() / 2.0
    }

    /// True iff this body overlaps the axis-aligned `rect`
    pub fn colliderect(&self, rect: &Rect) -> bool {
        if self.is_degenerate() || rect.is_degenerate() {
            return false;
        }
        if !self.aabb().overlaps(rect) {
            return false;
        }
        if self.is_axis_aligned() {
            return true;
        }
        polygons_overlap(&self.corners(), &rect.corners())
    }

    /// True iff the two oriented rectangles overlap
    pub fn collide(&self, other: &Body) -> bool {
        if self.is_degenerate() || other.is_degenerate() {
            return false;
        }
        if !self.aabb().overlaps(&other.aabb()) {
            return false;
        }
        if self.is_axis_aligned() && other.is_axis_aligned() {
            return true;
        }
        polygons_overlap(&self.corners(), &other.corners())
    }

    fn is_degenerate(&self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }
}

/// Signed area of the triangle (p, q, r); positive when counter-clockwise
#[inline]
fn orientation(p: Vec2, q: Vec2, r: Vec2) -> f32 {
    (q - p).perp_dot(r - p)
}

#[inline]
fn opposite_sides(a: f32, b: f32) -> bool {
    (a > 0.0 && b < 0.0) || (a < 0.0 && b > 0.0)
}

/// Proper crossing: each segment's endpoints straddle the other's line
fn segments_cross(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let o1 = orientation(a1, a2, b1);
    let o2 = orientation(a1, a2, b2);
    let o3 = orientation(b1, b2, a1);
    let o4 = orientation(b1, b2, a2);
    opposite_sides(o1, o2) && opposite_sides(o3, o4)
}

/// Ray-crossing parity test
fn point_in_polygon(p: Vec2, poly: &[Vec2; 4]) -> bool {
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let (pi, pj) = (poly[i], poly[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn polygons_overlap(a: &[Vec2; 4], b: &[Vec2; 4]) -> bool {
    for i in 0..4 {
        let (a1, a2) = (a[i], a[(i + 1) % 4]);
        for j in 0..4 {
            if segments_cross(a1, a2, b[j], b[(j + 1) % 4]) {
                return true;
            }
        }
    }
    // No edges cross: either disjoint or one contains the other
    point_in_polygon(a[0], b) || point_in_polygon(b[0], a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square(x: f32, y: f32, side: f32) -> Body {
        Body::new(Vec2::new(x, y), Vec2::splat(side))
    }

    #[test]
    fn test_touching_aligned_bodies_do_not_collide() {
        let a = square(0.0, 0.0, 10.0);
        // Edges touch exactly at x = 5
        let b = square(10.0, 0.0, 10.0);
        assert!(!a.collide(&b));
        assert!(!b.collide(&a));
        // One unit further apart
        let c = square(11.0, 0.0, 10.0);
        assert!(!a.collide(&c));
        // One unit of overlap
        let d = square(9.0, 0.0, 10.0);
        assert!(a.collide(&d));
        assert!(d.collide(&a));
    }

    #[test]
    fn test_rotated_aabb_overlap_but_no_contact() {
        let mut diamond = square(0.0, 0.0, 20.0);
        diamond.set_rotation(45.0);
        let corner = square(12.0, 12.0, 6.0);
        assert!(diamond.aabb().overlaps(&corner.aabb()));
        assert!(!diamond.collide(&corner));
        assert!(!corner.collide(&diamond));
    }

    #[test]
    fn test_containment_detected_without_edge_crossings() {
        let mut big = Body::new(Vec2::ZERO, Vec2::new(100.0, 60.0));
        big.set_rotation(30.0);
        let small = square(0.0, 0.0, 4.0);
        assert!(big.collide(&small));
        assert!(small.collide(&big));
    }

    #[test]
    fn test_rotated_bar_crossing() {
        let mut bar = Body::new(Vec2::ZERO, Vec2::new(200.0, 4.0));
        bar.set_rotation(30.0);
        let target = square(60.0, 35.0, 12.0);
        assert!(bar.collide(&target));
        let away = square(60.0, -35.0, 12.0);
        assert!(!bar.collide(&away));
    }

    #[test]
    fn test_zero_size_never_collides() {
        let a = Body::new(Vec2::ZERO, Vec2::ZERO);
        let b = square(0.0, 0.0, 50.0);
        assert!(!a.collide(&b));
        assert!(!b.collide(&a));
        let flat = Body::new(Vec2::ZERO, Vec2::new(30.0, 0.0));
        assert!(!flat.collide(&b));
        assert!(!b.colliderect(&Rect::from_center(Vec2::ZERO, Vec2::new(0.0, 10.0))));
    }

    #[test]
    fn test_rotation_is_normalized() {
        let mut a = square(0.0, 0.0, 10.0);
        a.set_rotation(450.0);
        assert_eq!(a.rotation(), 90.0);
        a.rotate_by(-180.0);
        assert_eq!(a.rotation(), 270.0);
        assert!(a.is_axis_aligned());
    }

    #[test]
    fn test_quarter_turn_swaps_bounds() {
        let mut bar = Body::new(Vec2::ZERO, Vec2::new(40.0, 10.0));
        bar.set_rotation(90.0);
        let bounds = bar.aabb();
        assert_eq!(bounds.width(), 10.0);
        assert_eq!(bounds.height(), 40.0);
    }

    #[test]
    fn test_corners_follow_rotation_and_size() {
        let mut bar = Body::new(Vec2::new(5.0, 5.0), Vec2::new(20.0, 10.0));
        assert_eq!(bar.corners()[0], Vec2::new(-5.0, 0.0));
        bar.set_size(Vec2::new(10.0, 10.0));
        assert_eq!(bar.corners()[0], Vec2::new(0.0, 0.0));
        assert_eq!(bar.radius(), Vec2::splat(10.0).length() / 2.0);
        bar.set_rotation(180.0);
        let c = bar.corners()[0];
        assert!((c - Vec2::new(10.0, 10.0)).length() < 1e-4);
    }

    #[test]
    fn test_frozen_axis_ignores_writes() {
        let mut a = square(1.0, 2.0, 4.0);
        a.freeze_y(true);
        a.set_pos(Vec2::new(10.0, 20.0));
        assert_eq!(a.pos(), Vec2::new(10.0, 2.0));
        a.translate(Vec2::new(1.0, 1.0));
        assert_eq!(a.pos(), Vec2::new(11.0, 2.0));
        a.freeze_y(false);
        a.freeze_x(true);
        a.set_pos(Vec2::new(0.0, 0.0));
        assert_eq!(a.pos(), Vec2::new(11.0, 0.0));
    }

    #[test]
    fn test_colliderect_rotated() {
        let mut bar = Body::new(Vec2::ZERO, Vec2::new(100.0, 4.0));
        bar.set_rotation(45.0);
        assert!(bar.colliderect(&Rect::from_center(Vec2::new(20.0, 20.0), Vec2::splat(6.0))));
        assert!(!bar.colliderect(&Rect::from_center(Vec2::new(20.0, -20.0), Vec2::splat(6.0))));
    }

    proptest! {
        #[test]
        fn prop_collision_is_symmetric(
            ax in -100.0f32..100.0, ay in -100.0f32..100.0,
            aw in 1.0f32..80.0, ah in 1.0f32..80.0, ar in 0.0f32..360.0,
            bx in -100.0f32..100.0, by in -100.0f32..100.0,
            bw in 1.0f32..80.0, bh in 1.0f32..80.0, br in 0.0f32..360.0,
            a_aligned in any::<bool>(), b_aligned in any::<bool>(),
        ) {
            let mut a = Body::new(Vec2::new(ax, ay), Vec2::new(aw, ah));
            let mut b = Body::new(Vec2::new(bx, by), Vec2::new(bw, bh));
            if !a_aligned { a.set_rotation(ar); }
            if !b_aligned { b.set_rotation(br); }
            prop_assert_eq!(a.collide(&b), b.collide(&a));
        }

        #[test]
        fn prop_aligned_touch_boundary(w in 2u32..60, h in 2u32..60, gap in 1u32..20) {
            let (w, h, gap) = (w as f32, h as f32, gap as f32);
            let a = Body::new(Vec2::ZERO, Vec2::new(w, h));
            let touching = Body::new(Vec2::new(w, 0.0), Vec2::new(w, h));
            let apart = Body::new(Vec2::new(w + gap, 0.0), Vec2::new(w, h));
            let past = Body::new(Vec2::new(w - 1.0, 0.0), Vec2::new(w, h));
            prop_assert!(!a.collide(&touching) && !touching.collide(&a));
            prop_assert!(!a.collide(&apart) && !apart.collide(&a));
            prop_assert!(a.collide(&past) && past.collide(&a));
        }
    }
}
