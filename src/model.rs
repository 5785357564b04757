//! Data models for the container loading simulation.
//!
//! This module defines the catalog entries and run artifacts:
//! - `ContainerSpec`: The container with external/internal dimensions and wall thickness
//! - `CartonType` / `PalletType`: Catalog entries supplied by the caller
//! - `PackRequest`: One request line (carton, quantity, optional pallet)
//! - `Orientation`: One of the two horizontal rotations of a carton
//! - `PlacedBox`: A carton instance with its resolved center position
//!
//! Positions use the container coordinate system whose origin is the geometric
//! center of the container (see `types` for the axis convention).

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{BoundingBox, Dimensional, EPSILON_GENERAL, Vec3};

/// Validation error for catalog data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Helper function to validate a single dimension.
fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Fixed container description, usually taken from the catalog.
///
/// All values share one caller-defined unit (millimeters in the built-in catalog).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "external_length": 6058.0, "external_width": 2438.0, "external_height": 2591.0,
    "internal_length": 5898.0, "internal_width": 2352.0, "internal_height": 2393.0,
    "wall_thickness": 40.0
}))]
pub struct ContainerSpec {
    pub external_length: f64,
    pub external_width: f64,
    pub external_height: f64,
    pub internal_length: f64,
    pub internal_width: f64,
    pub internal_height: f64,
    pub wall_thickness: f64,
}

impl ContainerSpec {
    /// Creates a container whose walls have zero thickness (internal == external).
    pub fn with_interior(length: f64, width: f64, height: f64) -> Self {
        Self {
            external_length: length,
            external_width: width,
            external_height: height,
            internal_length: length,
            internal_width: width,
            internal_height: height,
            wall_thickness: 0.0,
        }
    }

    /// Checks positivity and that the interior fits inside the walls.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimension(self.external_length, "External length")?;
        validate_dimension(self.external_width, "External width")?;
        validate_dimension(self.external_height, "External height")?;
        validate_dimension(self.internal_length, "Internal length")?;
        validate_dimension(self.internal_width, "Internal width")?;
        validate_dimension(self.internal_height, "Internal height")?;

        if self.wall_thickness < 0.0 || !self.wall_thickness.is_finite() {
            return Err(ValidationError::InvalidDimension(format!(
                "Wall thickness must be zero or positive, got: {}",
                self.wall_thickness
            )));
        }

        let walls = 2.0 * self.wall_thickness;
        let axes = [
            ("length", self.internal_length, self.external_length),
            ("width", self.internal_width, self.external_width),
            ("height", self.internal_height, self.external_height),
        ];
        for (name, internal, external) in axes {
            if internal > external - walls + EPSILON_GENERAL {
                return Err(ValidationError::InvalidConfiguration(format!(
                    "Internal {} {} exceeds external {} minus walls ({})",
                    name,
                    internal,
                    external,
                    external - walls
                )));
            }
        }
        Ok(())
    }

    /// Interior extents in engine axes (X = length, Y = height, Z = width).
    #[inline]
    pub fn interior_dims(&self) -> Vec3 {
        Vec3::new(
            self.internal_length,
            self.internal_height,
            self.internal_width,
        )
    }

    /// Volume of the interior, used as the utilization denominator.
    pub fn interior_volume(&self) -> f64 {
        self.interior_dims().volume()
    }

    /// Region available to cartons: the interior shrunk by `wall_clearance` on every face.
    ///
    /// If the clearance consumes an axis completely the returned box is inverted
    /// and contains nothing.
    pub fn usable_region(&self, wall_clearance: f64) -> BoundingBox {
        BoundingBox::from_center_and_dims(Vec3::zero(), self.interior_dims())
            .expanded(-wall_clearance)
    }
}

/// Catalog entry of a carton (box) type.
///
/// `color` and `opacity` are presentation-only and never read by the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"id": 1, "name": "Euro carton", "length": 600.0, "width": 400.0, "height": 300.0}))]
pub struct CartonType {
    pub id: usize,
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl CartonType {
    /// Creates a new carton type with validation.
    ///
    /// # Examples
    /// ```
    /// use container_loader::model::CartonType;
    ///
    /// assert!(CartonType::new(1, "A", 10.0, 20.0, 30.0).is_ok());
    /// assert!(CartonType::new(1, "A", -10.0, 20.0, 30.0).is_err());
    /// ```
    pub fn new(
        id: usize,
        name: impl Into<String>,
        length: f64,
        width: f64,
        height: f64,
    ) -> Result<Self, ValidationError> {
        let carton = Self {
            id,
            name: name.into(),
            length,
            width,
            height,
            color: None,
            opacity: None,
        };
        carton.validate()?;
        Ok(carton)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimension(self.length, "Length")?;
        validate_dimension(self.width, "Width")?;
        validate_dimension(self.height, "Height")?;
        Ok(())
    }

    /// Distinct horizontal orientations, un-rotated first.
    ///
    /// A square footprint has only one distinct orientation.
    pub fn orientations(&self) -> Vec<Orientation> {
        let base = Orientation::of(self);
        let rotated = base.rotated();
        if (base.length - rotated.length).abs() <= EPSILON_GENERAL {
            vec![base]
        } else {
            vec![base, rotated]
        }
    }
}

impl Dimensional for CartonType {
    fn dimensions(&self) -> Vec3 {
        Orientation::of(self).dims()
    }
}

/// Pallet catalog entry. Carried through as metadata, never used for placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PalletType {
    pub id: usize,
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

/// One request line: `quantity` instances of `carton`, optionally tagged with a pallet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackRequest {
    pub carton: CartonType,
    pub quantity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pallet: Option<PalletType>,
}

impl PackRequest {
    pub fn new(carton: CartonType, quantity: usize) -> Self {
        Self {
            carton,
            quantity,
            pallet: None,
        }
    }

    /// Attaches pallet metadata (Builder pattern light).
    pub fn with_pallet(mut self, pallet: PalletType) -> Self {
        self.pallet = Some(pallet);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quantity < 1 {
            return Err(ValidationError::InvalidQuantity(format!(
                "Quantity for carton {} must be at least 1",
                self.carton.id
            )));
        }
        self.carton.validate()
    }
}

/// Extents of a carton as placed. Height is never rotated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Orientation {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Orientation {
    /// The un-rotated orientation of a carton.
    pub fn of(carton: &CartonType) -> Self {
        Self {
            length: carton.length,
            width: carton.width,
            height: carton.height,
        }
    }

    /// Quarter turn about the vertical axis (length and width swapped).
    pub fn rotated(&self) -> Self {
        Self {
            length: self.width,
            width: self.length,
            height: self.height,
        }
    }

    /// Extents in engine axes (X = length, Y = height, Z = width).
    #[inline]
    pub fn dims(&self) -> Vec3 {
        Vec3::new(self.length, self.height, self.width)
    }
}

/// A carton instance with its chosen orientation and center position.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PlacedBox {
    pub carton: CartonType,
    pub orientation: Orientation,
    /// Center of the box in container coordinates.
    pub position: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pallet: Option<PalletType>,
}

impl PlacedBox {
    /// Calculates the bounding box of the placed carton.
    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_center_and_dims(self.position, self.orientation.dims())
    }
}

impl Dimensional for PlacedBox {
    fn dimensions(&self) -> Vec3 {
        self.orientation.dims()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_with_interior_validates() {
        assert!(ContainerSpec::with_interior(100.0, 100.0, 100.0).validate().is_ok());
    }

    #[test]
    fn container_rejects_interior_larger_than_walls_allow() {
        let spec = ContainerSpec {
            external_length: 100.0,
            external_width: 100.0,
            external_height: 100.0,
            internal_length: 95.0,
            internal_width: 90.0,
            internal_height: 90.0,
            wall_thickness: 5.0,
        };
        assert!(matches!(
            spec.validate(),
            Err(ValidationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn container_rejects_non_positive_values() {
        let mut spec = ContainerSpec::with_interior(100.0, 100.0, 100.0);
        spec.internal_height = 0.0;
        assert!(spec.validate().is_err());

        let mut spec = ContainerSpec::with_interior(100.0, 100.0, 100.0);
        spec.wall_thickness = -1.0;
        assert!(spec.validate().is_err());

        let mut spec = ContainerSpec::with_interior(100.0, 100.0, 100.0);
        spec.external_width = f64::NAN;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn usable_region_is_centered_and_shrunk() {
        let spec = ContainerSpec::with_interior(100.0, 60.0, 40.0);
        let region = spec.usable_region(5.0);
        assert_eq!(region.min, Vec3::new(-45.0, -15.0, -25.0));
        assert_eq!(region.max, Vec3::new(45.0, 15.0, 25.0));
    }

    #[test]
    fn usable_region_does_not_subtract_walls_again() {
        let spec = ContainerSpec {
            external_length: 180.0,
            external_width: 140.0,
            external_height: 120.0,
            internal_length: 100.0,
            internal_width: 60.0,
            internal_height: 40.0,
            wall_thickness: 40.0,
        };
        assert!(spec.validate().is_ok());
        assert_eq!(
            spec.usable_region(5.0),
            ContainerSpec::with_interior(100.0, 60.0, 40.0).usable_region(5.0)
        );
        assert_eq!(spec.usable_region(0.0).dimensions(), Vec3::new(100.0, 40.0, 60.0));
    }

    #[test]
    fn carton_orientations_skip_duplicate_for_square_footprint() {
        let square = CartonType::new(1, "square", 10.0, 10.0, 5.0).unwrap();
        assert_eq!(square.orientations().len(), 1);

        let oblong = CartonType::new(2, "oblong", 20.0, 10.0, 5.0).unwrap();
        let orientations = oblong.orientations();
        assert_eq!(orientations.len(), 2);
        assert_eq!(orientations[0].length, 20.0);
        assert_eq!(orientations[1].length, 10.0);
        assert_eq!(orientations[1].height, 5.0);
    }

    #[test]
    fn orientation_dims_map_height_to_y() {
        let o = Orientation {
            length: 1.0,
            width: 2.0,
            height: 3.0,
        };
        assert_eq!(o.dims(), Vec3::new(1.0, 3.0, 2.0));
    }

    #[test]
    fn request_rejects_zero_quantity() {
        let carton = CartonType::new(1, "A", 10.0, 10.0, 10.0).unwrap();
        assert!(matches!(
            PackRequest::new(carton.clone(), 0).validate(),
            Err(ValidationError::InvalidQuantity(_))
        ));
        assert!(PackRequest::new(carton, 3).validate().is_ok());
    }

    #[test]
    fn placed_box_bounds_follow_center() {
        let carton = CartonType::new(1, "A", 10.0, 20.0, 30.0).unwrap();
        let placed = PlacedBox {
            orientation: Orientation::of(&carton),
            carton,
            position: Vec3::new(5.0, 15.0, 10.0),
            pallet: None,
        };
        let bounds = placed.bounds();
        assert_eq!(bounds.min, Vec3::zero());
        assert_eq!(bounds.max, Vec3::new(10.0, 30.0, 20.0));
    }
}
