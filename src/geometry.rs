//! Geometric helper functions for 3D collision and containment checks.
//!
//! All functions operate on axis-aligned boxes and are free of side effects.

use crate::types::BoundingBox;

/// Checks whether two boxes collide once `a` is grown by `gap` on every face.
///
/// Uses Axis-Aligned Bounding Box (AABB) separation: the boxes do NOT overlap
/// if they are separated on at least one axis. With `gap > 0` two boxes must be
/// at least `gap` apart to be considered separated.
///
/// # Parameters
/// * `a` - First box
/// * `b` - Second box
/// * `gap` - Minimum clearance between the boxes
///
/// # Example
/// ```
/// use container_loader::geometry::overlaps;
/// use container_loader::types::{BoundingBox, Vec3};
///
/// let a = BoundingBox::from_anchor_and_dims(Vec3::zero(), Vec3::splat(10.0));
/// let b = BoundingBox::from_anchor_and_dims(Vec3::new(11.0, 0.0, 0.0), Vec3::splat(10.0));
/// assert!(!overlaps(&a, &b, 1.0));
/// assert!(overlaps(&a, &b, 2.0));
/// ```
pub fn overlaps(a: &BoundingBox, b: &BoundingBox, gap: f64) -> bool {
    a.expanded(gap).intersects(b)
}

/// Checks whether `inner` lies fully inside `outer` on every axis.
pub fn contains(outer: &BoundingBox, inner: &BoundingBox) -> bool {
    outer.contains_box(inner)
}

/// Volume of a box.
pub fn volume(b: &BoundingBox) -> f64 {
    b.volume()
}
