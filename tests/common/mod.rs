#![allow(dead_code)]

use std::sync::Arc;

use kcode_rs::geometry::{BoundaryCondition, CellDefinition, FillDefinition, Geometry, Surface, SurfaceKind};
use kcode_rs::interpolation::InterpolationScheme;
use kcode_rs::nuclear_data::{FissionSpectrum, IsotopeData, MaterialDefinition, NuData, NuclearDataStore, ReactionData};
use kcode_rs::source::{Source, SourceEnergy, SpatialDistribution};

// Isotope with energy independent cross sections (barns)
pub fn flat_isotope(name: &str, awr: f64, elastic: f64, fission: f64, capture: f64, nu: f64) -> IsotopeData {
    let mut reactions = vec![ReactionData { mt: 2, q_value: 0.0, threshold_index: 0, xs: vec![elastic; 2] }];
    if fission > 0.0 {
        reactions.push(ReactionData { mt: 18, q_value: 200.0, threshold_index: 0, xs: vec![fission; 2] });
    }
    if capture > 0.0 {
        reactions.push(ReactionData { mt: 102, q_value: 5.0, threshold_index: 0, xs: vec![capture; 2] });
    }
    IsotopeData {
        name: name.to_string(),
        awr,
        temperature: 293.6,
        interpolation: InterpolationScheme::LinLin,
        energy: vec![1e-11, 20.0],
        total: None,
        reactions,
        nu: (fission > 0.0).then(|| NuData::Polynomial { coefficients: vec![nu] }),
        fission_spectrum: (fission > 0.0).then(FissionSpectrum::default),
        thermal: vec![],
    }
}

// One material "fuel" (id 1) made of a single flat isotope
pub fn flat_store(elastic: f64, fission: f64, capture: f64, nu: f64, density: f64) -> Arc<NuclearDataStore> {
    let isotope = flat_isotope("F", 200.0, elastic, fission, capture, nu);
    let materials = [MaterialDefinition::new(1, "fuel", &[("F", density)])];
    Arc::new(NuclearDataStore::new(&[isotope], &materials).expect("flat store"))
}

pub fn plane(id: u32, kind: SurfaceKind, boundary: BoundaryCondition) -> Surface {
    Surface::new(id, kind, boundary).expect("valid surface")
}

// Material 1 inside a sphere
pub fn bare_sphere(data: &NuclearDataStore, radius: f64) -> Arc<Geometry> {
    let surfaces = vec![plane(
        1,
        SurfaceKind::Sphere { x0: 0.0, y0: 0.0, z0: 0.0, r: radius },
        BoundaryCondition::Vacuum,
    )];
    let cells = vec![
        CellDefinition::new(1, "-1", FillDefinition::Material(1)).named("fuel"),
        CellDefinition::new(2, "1", FillDefinition::Void).named("outside"),
    ];
    Arc::new(Geometry::new(surfaces, &cells, |id| data.material_index(id)).expect("bare sphere"))
}

// Material 1 in the box [-half, half]^3 with the given boundaries on the
// x faces and on the y and z faces
pub fn slab(data: &NuclearDataStore, half: f64, x_faces: BoundaryCondition, other_faces: BoundaryCondition) -> Arc<Geometry> {
    let surfaces = vec![
        plane(1, SurfaceKind::PlaneX { x0: -half }, x_faces),
        plane(2, SurfaceKind::PlaneX { x0: half }, x_faces),
        plane(3, SurfaceKind::PlaneY { y0: -half }, other_faces),
        plane(4, SurfaceKind::PlaneY { y0: half }, other_faces),
        plane(5, SurfaceKind::PlaneZ { z0: -half }, other_faces),
        plane(6, SurfaceKind::PlaneZ { z0: half }, other_faces),
    ];
    let cells = vec![CellDefinition::new(1, "1 -2 3 -4 5 -6", FillDefinition::Material(1))];
    Arc::new(Geometry::new(surfaces, &cells, |id| data.material_index(id)).expect("slab"))
}

pub fn point_source(energy: f64) -> Source {
    Source::new(SpatialDistribution::Point { position: [0.0; 3] }, SourceEnergy::Monoenergetic { energy })
}

pub fn box_source(half: f64) -> Source {
    Source::new(
        SpatialDistribution::Box { lower_left: [-half; 3], upper_right: [half; 3] },
        SourceEnergy::Monoenergetic { energy: 2.0 },
    )
}
