//! Built-in container catalog (ISO shipping containers, millimeters).

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::ContainerSpec;

/// A named catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct CatalogEntry {
    pub code: String,
    pub name: String,
    pub spec: ContainerSpec,
}

const STEEL_WALL_MM: f64 = 40.0;

/// The fixed list of standard containers.
pub fn standard_containers() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            code: "20GP".into(),
            name: "20' Standard".into(),
            spec: ContainerSpec {
                external_length: 6058.0,
                external_width: 2438.0,
                external_height: 2591.0,
                internal_length: 5898.0,
                internal_width: 2352.0,
                internal_height: 2393.0,
                wall_thickness: STEEL_WALL_MM,
            },
        },
        CatalogEntry {
            code: "40GP".into(),
            name: "40' Standard".into(),
            spec: ContainerSpec {
                external_length: 12192.0,
                external_width: 2438.0,
                external_height: 2591.0,
                internal_length: 12032.0,
                internal_width: 2352.0,
                internal_height: 2393.0,
                wall_thickness: STEEL_WALL_MM,
            },
        },
        CatalogEntry {
            code: "40HC".into(),
            name: "40' High Cube".into(),
            spec: ContainerSpec {
                external_length: 12192.0,
                external_width: 2438.0,
                external_height: 2896.0,
                internal_length: 12032.0,
                internal_width: 2352.0,
                internal_height: 2698.0,
                wall_thickness: STEEL_WALL_MM,
            },
        },
    ]
}

/// Looks up a catalog entry by code (case-insensitive).
pub fn find(code: &str) -> Option<CatalogEntry> {
    standard_containers()
        .into_iter()
        .find(|entry| entry.code.eq_ignore_ascii_case(code.trim()))
}
