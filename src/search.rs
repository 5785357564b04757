//! Placement search for a single carton instance.
//!
//! For every orientation (un-rotated first) the search generates the extreme
//! points, orders them bottom-to-top (Y), left-to-right (X), back-to-front (Z)
//! and returns the first anchor the validator accepts. The first hit wins, so
//! the tie-break is gravity first, then left fill, then depth fill.

use std::cmp::Ordering;

use crate::extreme_points::{ExtremePoint, candidate_points};
use crate::model::{CartonType, Orientation, PlacedBox};
use crate::types::{BoundingBox, Vec3};
use crate::validator::PlacementValidator;

/// Configuration for the placement engine.
///
/// All lengths share the unit of the container and carton dimensions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Clearance kept between cartons and every container wall
    pub wall_clearance: f64,
    /// Minimum clearance between two cartons
    pub box_gap: f64,
    /// Scan step as a fraction of the carton's smallest dimension
    pub scan_step_ratio: f64,
    /// Lower bound for the scan step
    pub min_scan_step: f64,
}

impl PackingConfig {
    pub const DEFAULT_WALL_CLEARANCE: f64 = 5.0;
    pub const DEFAULT_BOX_GAP: f64 = 2.0;
    pub const DEFAULT_SCAN_STEP_RATIO: f64 = 0.01;
    pub const DEFAULT_MIN_SCAN_STEP: f64 = 1e-3;

    /// Creates a builder for custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }

    /// Bucket size used to find duplicate candidates for `orientation`.
    pub fn scan_step(&self, orientation: &Orientation) -> f64 {
        (orientation.dims().min_component() * self.scan_step_ratio).max(self.min_scan_step)
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            wall_clearance: Self::DEFAULT_WALL_CLEARANCE,
            box_gap: Self::DEFAULT_BOX_GAP,
            scan_step_ratio: Self::DEFAULT_SCAN_STEP_RATIO,
            min_scan_step: Self::DEFAULT_MIN_SCAN_STEP,
        }
    }
}

/// Builder for PackingConfig.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    /// Sets the wall clearance.
    pub fn wall_clearance(mut self, clearance: f64) -> Self {
        self.config.wall_clearance = clearance;
        self
    }

    /// Sets the box-to-box gap.
    pub fn box_gap(mut self, gap: f64) -> Self {
        self.config.box_gap = gap;
        self
    }

    /// Sets the scan step ratio.
    pub fn scan_step_ratio(mut self, ratio: f64) -> Self {
        self.config.scan_step_ratio = ratio;
        self
    }

    /// Sets the lower bound of the scan step.
    pub fn min_scan_step(mut self, step: f64) -> Self {
        self.config.min_scan_step = step;
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// A resolved position for one carton instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub orientation: Orientation,
    /// Minimum corner of the placed box.
    pub anchor: Vec3,
    /// Center of the placed box.
    pub center: Vec3,
}

/// Scan order: lowest Y, then lowest X, then lowest Z.
fn scan_order(a: &ExtremePoint, b: &ExtremePoint) -> Ordering {
    a.position
        .y
        .total_cmp(&b.position.y)
        .then_with(|| a.position.x.total_cmp(&b.position.x))
        .then_with(|| a.position.z.total_cmp(&b.position.z))
}

/// Finds the first valid position for `carton`.
///
/// # Parameters
/// * `carton` - The carton type to place
/// * `placed` - Boxes placed so far
/// * `region` - Usable interior region
/// * `config` - Engine configuration
///
/// # Returns
/// `Some(Placement)` on success, `None` if no orientation fits at any candidate.
pub fn find_position(
    carton: &CartonType,
    placed: &[PlacedBox],
    region: &BoundingBox,
    config: &PackingConfig,
) -> Option<Placement> {
    let validator = PlacementValidator::new(region, placed, config.box_gap);

    for orientation in carton.orientations() {
        let step = config.scan_step(&orientation);
        let mut points = candidate_points(region, placed, config.box_gap, step);
        points.sort_by(scan_order);

        let hit = points
            .iter()
            .find_map(|ep| validator.check(&orientation, ep.position).ok());

        if let Some(bounds) = hit {
            return Some(Placement {
                orientation,
                anchor: bounds.min,
                center: bounds.center(),
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight() -> PackingConfig {
        PackingConfig::builder()
            .wall_clearance(0.0)
            .box_gap(0.0)
            .build()
    }

    fn region() -> BoundingBox {
        BoundingBox::from_anchor_and_dims(Vec3::zero(), Vec3::new(100.0, 50.0, 40.0))
    }

    fn place(carton: &CartonType, placement: Placement) -> PlacedBox {
        PlacedBox {
            carton: carton.clone(),
            orientation: placement.orientation,
            position: placement.center,
            pallet: None,
        }
    }

    #[test]
    fn first_box_snaps_to_region_minimum() {
        let carton = CartonType::new(1, "A", 20.0, 10.0, 10.0).unwrap();
        let placement = find_position(&carton, &[], &region(), &tight()).unwrap();
        assert_eq!(placement.anchor, Vec3::zero());
        assert_eq!(placement.orientation, Orientation::of(&carton));
        assert_eq!(placement.center, Vec3::new(10.0, 5.0, 5.0));
    }

    #[test]
    fn prefers_floor_before_stacking() {
        let carton = CartonType::new(1, "A", 50.0, 40.0, 10.0).unwrap();
        let first = find_position(&carton, &[], &region(), &tight()).unwrap();
        let placed = vec![place(&carton, first)];

        let second = find_position(&carton, &placed, &region(), &tight()).unwrap();
        assert_eq!(second.anchor, Vec3::new(50.0, 0.0, 0.0));

        let placed = vec![place(&carton, first), place(&carton, second)];
        let third = find_position(&carton, &placed, &region(), &tight()).unwrap();
        assert_eq!(third.anchor, Vec3::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn falls_back_to_rotated_orientation() {
        // Un-rotated the carton needs 40 along Z, only 30 is left in front of
        // the first box.
        let region = BoundingBox::from_anchor_and_dims(Vec3::zero(), Vec3::new(40.0, 10.0, 70.0));
        let first_carton = CartonType::new(1, "A", 40.0, 40.0, 10.0).unwrap();
        let first = find_position(&first_carton, &[], &region, &tight()).unwrap();
        let placed = vec![place(&first_carton, first)];

        let long = CartonType::new(2, "B", 30.0, 40.0, 10.0).unwrap();
        let placement = find_position(&long, &placed, &region, &tight()).unwrap();
        assert_eq!(placement.orientation.length, 40.0);
        assert_eq!(placement.orientation.width, 30.0);
        assert_eq!(placement.anchor, Vec3::new(0.0, 0.0, 40.0));
    }

    #[test]
    fn finds_anchor_one_scan_step_past_a_blocked_point() {
        let config = PackingConfig::builder()
            .wall_clearance(0.0)
            .box_gap(2.0)
            .build();
        let region =
            BoundingBox::from_anchor_and_dims(Vec3::zero(), Vec3::new(1200.0, 1000.0, 1050.0));
        let wall = |id: usize, anchor: Vec3, length: f64, width: f64| {
            let carton = CartonType::new(id, "wall", length, width, 1000.0).unwrap();
            let orientation = Orientation::of(&carton);
            PlacedBox {
                position: BoundingBox::from_anchor_and_dims(anchor, orientation.dims()).center(),
                carton,
                orientation,
                pallet: None,
            }
        };
        // Right faces at x = 99 and x = 102; with gap 2 the candidates at x = 101
        // and x = 104 fall into the same bucket for a 1000 cube (step 10).
        let placed = vec![
            wall(1, Vec3::zero(), 99.0, 50.0),
            wall(2, Vec3::new(0.0, 0.0, 52.0), 102.0, 48.0),
        ];
        let cube = CartonType::new(3, "cube", 1000.0, 1000.0, 1000.0).unwrap();

        let validator = PlacementValidator::new(&region, &placed, config.box_gap);
        assert!(!validator.is_valid(&Orientation::of(&cube), Vec3::new(101.0, 0.0, 0.0)));

        let placement = find_position(&cube, &placed, &region, &config).unwrap();
        assert_eq!(placement.anchor, Vec3::new(104.0, 0.0, 0.0));
    }

    #[test]
    fn reports_no_fit_for_oversized_box() {
        let carton = CartonType::new(1, "huge", 200.0, 10.0, 10.0).unwrap();
        assert!(find_position(&carton, &[], &region(), &tight()).is_none());
    }

    #[test]
    fn scan_step_has_lower_bound() {
        let config = PackingConfig::default();
        let tiny = Orientation {
            length: 0.01,
            width: 0.01,
            height: 0.01,
        };
        assert_eq!(config.scan_step(&tiny), PackingConfig::DEFAULT_MIN_SCAN_STEP);

        let large = Orientation {
            length: 600.0,
            width: 400.0,
            height: 300.0,
        };
        assert!((config.scan_step(&large) - 3.0).abs() < 1e-9);
    }
}
