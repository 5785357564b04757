//! Extreme point generation.
//!
//! Extreme points are positions where the lower-back-left corner of a new box
//! could start while touching at least two surfaces (walls or other boxes).
//! Every placed box contributes points next to its right, top and front faces
//! plus its near floor corner. Face points are also projected along their free
//! axes toward the interior minimum, so a point floating next to a tall box can
//! drop onto the floor or the nearest surface below it.
//!
//! The set is a pure function of the interior region and the placed boxes; it is
//! recomputed for every placement attempt.

use std::collections::HashMap;

use crate::model::PlacedBox;
use crate::types::{Axis, BoundingBox, EPSILON_GENERAL, Vec3};

/// A candidate anchor (minimum corner) for the next box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtremePoint {
    pub position: Vec3,
}

impl ExtremePoint {
    pub const fn new(position: Vec3) -> Self {
        Self { position }
    }
}

/// Quantized coordinate key. Buckets points so duplicates are found without
/// comparing against every collected point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PointKey(i64, i64, i64);

impl PointKey {
    fn quantize(point: &Vec3, origin: &Vec3, step: f64) -> Self {
        let q = |value: f64, base: f64| ((value - base) / step).round() as i64;
        Self(
            q(point.x, origin.x),
            q(point.y, origin.y),
            q(point.z, origin.z),
        )
    }
}

/// Collects candidate points, dropping points that coincide with one already seen.
///
/// Distinct points sharing a bucket are all kept: one of them may collide with
/// a placed box while its neighbour a fraction of a step away does not.
struct PointCollector<'a> {
    region: &'a BoundingBox,
    step: f64,
    buckets: HashMap<PointKey, Vec<Vec3>>,
    points: Vec<ExtremePoint>,
}

impl<'a> PointCollector<'a> {
    fn new(region: &'a BoundingBox, step: f64) -> Self {
        Self {
            region,
            step,
            buckets: HashMap::new(),
            points: Vec::new(),
        }
    }

    fn push(&mut self, point: Vec3) {
        // Points outside the interior are discarded, not errors.
        if !self.region.contains_point(&point) {
            return;
        }
        let bucket = self
            .buckets
            .entry(PointKey::quantize(&point, &self.region.min, self.step))
            .or_default();
        if bucket.iter().any(|seen| coincides(seen, &point)) {
            return;
        }
        bucket.push(point);
        self.points.push(ExtremePoint::new(point));
    }
}

fn coincides(a: &Vec3, b: &Vec3) -> bool {
    Axis::ALL
        .iter()
        .all(|&axis| (a.get(axis) - b.get(axis)).abs() <= EPSILON_GENERAL)
}

/// Generates the candidate anchor points for the next box.
///
/// # Parameters
/// * `region` - Usable interior (internal dimensions minus wall clearance)
/// * `placed` - Boxes placed so far, in placement order
/// * `gap` - Minimum box-to-box clearance, added in front of every face
/// * `step` - Bucket size used to look up duplicates, must be > 0
///
/// # Returns
/// The deduplicated points inside `region`, in generation order. An empty
/// vector means no further placement is possible.
pub fn candidate_points(
    region: &BoundingBox,
    placed: &[PlacedBox],
    gap: f64,
    step: f64,
) -> Vec<ExtremePoint> {
    let boxes: Vec<BoundingBox> = placed.iter().map(PlacedBox::bounds).collect();
    let mut collector = PointCollector::new(region, step.max(EPSILON_GENERAL));

    collector.push(region.min);

    for b in &boxes {
        let right = Vec3::new(b.max.x + gap, b.min.y, b.min.z);
        let top = Vec3::new(b.min.x, b.max.y + gap, b.min.z);
        let front = Vec3::new(b.min.x, b.min.y, b.max.z + gap);
        let near_corner = Vec3::new(b.max.x + gap, b.min.y, b.max.z + gap);

        for (point, free_axes) in [
            (right, [Axis::Y, Axis::Z]),
            (top, [Axis::X, Axis::Z]),
            (front, [Axis::Y, Axis::X]),
        ] {
            collector.push(point);
            for axis in free_axes {
                collector.push(project(point, axis, region, &boxes, gap));
            }
        }

        collector.push(near_corner);
        collector.push(project(near_corner, Axis::Y, region, &boxes, gap));
    }

    collector.points
}

/// Slides `point` along `axis` toward the interior minimum until it meets the
/// face of a box (plus gap) whose cross-section covers the point, or the wall.
fn project(point: Vec3, axis: Axis, region: &BoundingBox, boxes: &[BoundingBox], gap: f64) -> Vec3 {
    let start = point.get(axis);
    let others: Vec<Axis> = Axis::ALL.into_iter().filter(|a| *a != axis).collect();

    let limit = boxes
        .iter()
        .filter(|b| {
            others.iter().all(|&o| {
                let value = point.get(o);
                value >= b.min.get(o) - EPSILON_GENERAL && value < b.max.get(o) - EPSILON_GENERAL
            })
        })
        .map(|b| b.max.get(axis) + gap)
        .filter(|face| *face <= start + EPSILON_GENERAL)
        .fold(region.min.get(axis), f64::max);

    point.with(axis, limit)
}
