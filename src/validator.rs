//! Placement validation.
//!
//! Decides whether an orientation anchored at a candidate point is legal:
//! the box must stay inside the usable interior and keep the minimum gap to
//! every box placed so far. The check is deterministic and has no hidden state.

use crate::geometry::{contains, overlaps};
use crate::model::{Orientation, PlacedBox};
use crate::types::{BoundingBox, Vec3};

/// Reason a candidate anchor was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The box would stick out of the interior region.
    OutOfBounds,
    /// The box (grown by the gap) would overlap the placed box at this index.
    Collides(usize),
}

/// Fixed inputs of a validation pass: region, placed boxes and gap.
#[derive(Clone, Copy, Debug)]
pub struct PlacementValidator<'a> {
    region: &'a BoundingBox,
    placed: &'a [PlacedBox],
    gap: f64,
}

impl<'a> PlacementValidator<'a> {
    pub fn new(region: &'a BoundingBox, placed: &'a [PlacedBox], gap: f64) -> Self {
        Self { region, placed, gap }
    }

    /// Checks the candidate and reports why it fails, if it does.
    ///
    /// The boundary check runs first; collisions are tested in placement order
    /// and the first colliding box is reported.
    pub fn check(&self, orientation: &Orientation, anchor: Vec3) -> Result<BoundingBox, Rejection> {
        let candidate = BoundingBox::from_anchor_and_dims(anchor, orientation.dims());

        if !contains(self.region, &candidate) {
            return Err(Rejection::OutOfBounds);
        }

        match self
            .placed
            .iter()
            .position(|p| overlaps(&candidate, &p.bounds(), self.gap))
        {
            Some(index) => Err(Rejection::Collides(index)),
            None => Ok(candidate),
        }
    }

    /// `true` if the orientation fits at `anchor`.
    pub fn is_valid(&self, orientation: &Orientation, anchor: Vec3) -> bool {
        self.check(orientation, anchor).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CartonType;

    fn region() -> BoundingBox {
        BoundingBox::from_anchor_and_dims(Vec3::zero(), Vec3::splat(100.0))
    }

    fn cube(edge: f64) -> Orientation {
        Orientation {
            length: edge,
            width: edge,
            height: edge,
        }
    }

    fn placed_cube(anchor: Vec3, edge: f64) -> PlacedBox {
        let carton = CartonType::new(7, "cube", edge, edge, edge).unwrap();
        PlacedBox {
            orientation: Orientation::of(&carton),
            carton,
            position: BoundingBox::from_anchor_and_dims(anchor, Vec3::splat(edge)).center(),
            pallet: None,
        }
    }

    #[test]
    fn accepts_box_flush_with_walls() {
        let region = region();
        let validator = PlacementValidator::new(&region, &[], 0.0);
        assert!(validator.is_valid(&cube(100.0), Vec3::zero()));
    }

    #[test]
    fn rejects_box_crossing_boundary() {
        let region = region();
        let validator = PlacementValidator::new(&region, &[], 0.0);
        assert_eq!(
            validator.check(&cube(50.0), Vec3::new(60.0, 0.0, 0.0)),
            Err(Rejection::OutOfBounds)
        );
        assert_eq!(
            validator.check(&cube(10.0), Vec3::new(-1.0, 0.0, 0.0)),
            Err(Rejection::OutOfBounds)
        );
    }

    #[test]
    fn honors_minimum_gap() {
        let region = region();
        let placed = vec![placed_cube(Vec3::zero(), 10.0)];
        let validator = PlacementValidator::new(&region, &placed, 2.0);

        assert_eq!(
            validator.check(&cube(10.0), Vec3::new(11.0, 0.0, 0.0)),
            Err(Rejection::Collides(0))
        );
        assert!(validator.is_valid(&cube(10.0), Vec3::new(12.0, 0.0, 0.0)));
    }

    #[test]
    fn reports_first_colliding_box() {
        let region = region();
        let placed = vec![
            placed_cube(Vec3::new(50.0, 0.0, 0.0), 10.0),
            placed_cube(Vec3::zero(), 10.0),
        ];
        let validator = PlacementValidator::new(&region, &placed, 0.0);
        assert_eq!(
            validator.check(&cube(10.0), Vec3::new(5.0, 0.0, 0.0)),
            Err(Rejection::Collides(1))
        );
    }

    #[test]
    fn same_inputs_same_answer() {
        let region = region();
        let placed = vec![placed_cube(Vec3::zero(), 10.0)];
        let validator = PlacementValidator::new(&region, &placed, 2.0);
        let first = validator.check(&cube(20.0), Vec3::new(12.0, 0.0, 0.0));
        let second = validator.check(&cube(20.0), Vec3::new(12.0, 0.0, 0.0));
        assert_eq!(first, second);
    }
}
