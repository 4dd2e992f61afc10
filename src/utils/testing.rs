//=====================================================================
// Shared fixtures for unit tests
//=====================================================================

use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use tempfile::TempDir;

use crate::interpolation::InterpolationScheme;
use crate::nuclear_data::{
    FissionSpectrum, IsotopeData, MaterialDefinition, NuData, NuclearDataStore, ReactionData, ThermalData,
};
use crate::utils::write_isotope_library;

const GRID: [f64; 6] = [1e-11, 1e-8, 1e-6, 1e-3, 1.0, 20.0];

// These are built once and shared by all tests in all files.
lazy_static! {
    static ref TEST_STORE: Mutex<Option<Arc<NuclearDataStore>>> = Mutex::new(None);

    // Libraries for the fixture isotopes, written as "<name>.kxs"
    pub static ref ISOTOPES_DIR: TempDir = {
        let dir = tempfile::tempdir().expect("Failed to create the isotope library directory");
        for data in [fissile_isotope(), moderator_isotope()] {
            write_isotope_library(dir.path().join(format!("{}.kxs", data.name)), &data)
                .expect("Failed to write fixture isotope library");
        }
        dir
    };
}

// Heavy fissile isotope with flat cross sections and one inelastic level
pub fn fissile_isotope() -> IsotopeData {
    IsotopeData {
        name: "U235".to_string(),
        awr: 233.0248,
        temperature: 293.6,
        interpolation: InterpolationScheme::LinLin,
        energy: GRID.to_vec(),
        total: None,
        reactions: vec![
            ReactionData { mt: 2, q_value: 0.0, threshold_index: 0, xs: vec![4.0; 6] },
            ReactionData { mt: 51, q_value: -0.5, threshold_index: 4, xs: vec![0.0, 0.3] },
            ReactionData { mt: 18, q_value: 193.7, threshold_index: 0, xs: vec![1.5; 6] },
            ReactionData { mt: 102, q_value: 6.5, threshold_index: 0, xs: vec![0.5; 6] },
        ],
        nu: Some(NuData::Polynomial { coefficients: vec![2.5] }),
        fission_spectrum: Some(FissionSpectrum::default()),
        thermal: vec![],
    }
}

// Light moderator with a 1/v capture, an explicit total and a bound
// scattering table at room temperature
pub fn moderator_isotope() -> IsotopeData {
    let elastic = vec![20.0, 20.0, 20.0, 19.0, 4.0, 0.5];
    let capture = vec![16.0, 0.5, 0.05, 0.0016, 0.00005, 0.00001];
    let total = elastic.iter().zip(&capture).map(|(e, c)| e + c).collect();
    IsotopeData {
        name: "H1".to_string(),
        awr: 0.99917,
        temperature: 293.6,
        interpolation: InterpolationScheme::LinLin,
        energy: GRID.to_vec(),
        total: Some(total),
        reactions: vec![
            ReactionData { mt: 2, q_value: 0.0, threshold_index: 0, xs: elastic },
            ReactionData { mt: 102, q_value: 2.22, threshold_index: 0, xs: capture },
        ],
        nu: None,
        fission_spectrum: None,
        thermal: vec![ThermalData {
            temperature: 293.6,
            cutoff: 4e-6,
            energy: vec![1e-11, 1e-8, 1e-6, 5e-6],
            elastic: vec![40.0, 30.0, 20.0, 20.0],
            inelastic: vec![60.0, 20.0, 5.0, 4.0],
        }],
    }
}

// Materials: 1 fuel, 2 water at room temperature, 3 fuel/water mix at
// room temperature, 4 water without a temperature
pub fn test_materials() -> Vec<MaterialDefinition> {
    vec![
        MaterialDefinition::new(1, "fuel", &[("U235", 0.02)]),
        MaterialDefinition::new(2, "water", &[("H1", 0.0669)]).at_temperature(293.6),
        MaterialDefinition::new(3, "mix", &[("U235", 0.001), ("H1", 0.06)]).at_temperature(293.6),
        MaterialDefinition::new(4, "cold water", &[("H1", 0.0669)]),
    ]
}

pub fn test_store() -> Arc<NuclearDataStore> {
    let mut store = TEST_STORE.lock().unwrap();

    // Only build the store if it is not already built
    if store.is_none() {
        let built = NuclearDataStore::new(&[fissile_isotope(), moderator_isotope()], &test_materials())
            .expect("Fixture nuclear data must be valid");
        *store = Some(Arc::new(built));
    }
    // Otherwise, return the already built store
    store.as_ref().unwrap().clone()
}
