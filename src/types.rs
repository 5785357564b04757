//! Common types and traits for 3D geometry.
//!
//! This module defines the vector and axis-aligned box types shared by the
//! candidate point generator, the validator and the placement search.
//!
//! Axis convention used throughout the crate:
//! - X: container length (left → right)
//! - Y: height (bottom → top)
//! - Z: container width (back → front)

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Global numerical tolerance for floating-point comparisons.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// One of the three coordinate axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

/// Represents a 3D vector or point in space.
///
/// Used for positions, extents, and calculations in 3D space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Creates a vector with the same value on every axis.
    #[inline]
    pub const fn splat(value: f64) -> Self {
        Self::new(value, value, value)
    }

    /// Returns the component on the given axis.
    #[inline]
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Returns a copy with the component on `axis` replaced.
    #[inline]
    pub fn with(mut self, axis: Axis, value: f64) -> Self {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
        self
    }

    /// Calculates the volume (product of all components).
    ///
    /// Useful for extent vectors.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Smallest of the three components.
    #[inline]
    pub fn min_component(&self) -> f64 {
        self.x.min(self.y).min(self.z)
    }

    /// Returns half of this vector.
    #[inline]
    pub fn half(&self) -> Self {
        Self::new(self.x / 2.0, self.y / 2.0, self.z / 2.0)
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Trait for objects with 3D extents.
pub trait Dimensional {
    /// Returns the full extents of the object (X, Y, Z).
    fn dimensions(&self) -> Vec3;

    /// Calculates the volume.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }
}

/// Represents an Axis-Aligned Bounding Box (AABB).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a new bounding box.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates a bounding box from its minimum corner and full extents.
    #[inline]
    pub fn from_anchor_and_dims(anchor: Vec3, dims: Vec3) -> Self {
        Self {
            min: anchor,
            max: anchor + dims,
        }
    }

    /// Creates a bounding box from its center and full extents.
    #[inline]
    pub fn from_center_and_dims(center: Vec3, dims: Vec3) -> Self {
        let half = dims.half();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Grows the box by `amount` on every face. Negative values shrink it.
    #[inline]
    pub fn expanded(&self, amount: f64) -> Self {
        let delta = Vec3::splat(amount);
        Self {
            min: self.min - delta,
            max: self.max + delta,
        }
    }

    /// Checks if two bounding boxes intersect.
    ///
    /// Implements the Separating Axis Theorem (SAT) for AABBs. Boxes that only
    /// touch, or overlap by less than [`EPSILON_GENERAL`], do not intersect.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        Axis::ALL.iter().all(|&axis| {
            Self::overlap_1d(
                self.min.get(axis),
                self.max.get(axis),
                other.min.get(axis),
                other.max.get(axis),
            ) > EPSILON_GENERAL
        })
    }

    /// Calculates the overlap length in one dimension.
    #[inline]
    fn overlap_1d(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> f64 {
        (a_max.min(b_max) - a_min.max(b_min)).max(0.0)
    }

    /// Checks whether `inner` lies fully inside this box.
    #[inline]
    pub fn contains_box(&self, inner: &Self) -> bool {
        Axis::ALL.iter().all(|&axis| {
            inner.min.get(axis) >= self.min.get(axis) - EPSILON_GENERAL
                && inner.max.get(axis) <= self.max.get(axis) + EPSILON_GENERAL
        })
    }

    /// Checks if a point is inside the bounding box (boundary included).
    #[inline]
    pub fn contains_point(&self, point: &Vec3) -> bool {
        Axis::ALL.iter().all(|&axis| {
            point.get(axis) >= self.min.get(axis) - EPSILON_GENERAL
                && point.get(axis) <= self.max.get(axis) + EPSILON_GENERAL
        })
    }

    /// Returns the center point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    /// Returns the full extents.
    #[inline]
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }

    /// Volume enclosed by the box.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.dimensions().volume()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
    }

    #[test]
    fn test_vec3_axis_access() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.get(Axis::Y), 2.0);
        assert_eq!(v.with(Axis::Z, 9.0), Vec3::new(1.0, 2.0, 9.0));
        assert_eq!(v.min_component(), 1.0);
    }

    #[test]
    fn test_bounding_box_from_center() {
        let b = BoundingBox::from_center_and_dims(Vec3::zero(), Vec3::new(10.0, 20.0, 30.0));
        assert_eq!(b.min, Vec3::new(-5.0, -10.0, -15.0));
        assert_eq!(b.max, Vec3::new(5.0, 10.0, 15.0));
        assert_eq!(b.center(), Vec3::zero());
        assert!((b.volume() - 6000.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_bounding_box_intersects() {
        let a = BoundingBox::from_anchor_and_dims(Vec3::zero(), Vec3::splat(10.0));
        let b = BoundingBox::from_anchor_and_dims(Vec3::splat(5.0), Vec3::splat(10.0));
        let c = BoundingBox::from_anchor_and_dims(Vec3::splat(20.0), Vec3::splat(10.0));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_touching_boxes_do_not_intersect() {
        let a = BoundingBox::from_anchor_and_dims(Vec3::zero(), Vec3::splat(10.0));
        let b = BoundingBox::from_anchor_and_dims(Vec3::new(10.0, 0.0, 0.0), Vec3::splat(10.0));
        assert!(!a.intersects(&b));
        assert!(a.expanded(1.0).intersects(&b));
    }

    #[test]
    fn test_contains_box_and_point() {
        let outer = BoundingBox::from_anchor_and_dims(Vec3::zero(), Vec3::splat(10.0));
        let inner = BoundingBox::from_anchor_and_dims(Vec3::splat(2.0), Vec3::splat(8.0));
        let sticking_out = BoundingBox::from_anchor_and_dims(Vec3::splat(3.0), Vec3::splat(8.0));

        assert!(outer.contains_box(&inner));
        assert!(!outer.contains_box(&sticking_out));
        assert!(outer.contains_point(&Vec3::splat(10.0)));
        assert!(!outer.contains_point(&Vec3::new(10.5, 0.0, 0.0)));
    }
}
