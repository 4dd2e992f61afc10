use serde::{Deserialize, Serialize};

use crate::interpolation::{InterpolationError, InterpolationScheme, InterpolationTable};
use crate::utils::compute_kT_from_temperature;

// Material and table temperatures closer than this (K) are the same
pub const THERMAL_TEMPERATURE_TOLERANCE: f64 = 1.0;

// Bound thermal scattering data as supplied with an isotope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalData {
    // Kelvin
    pub temperature: f64,
    // Below this incident energy (MeV) the table replaces free elastic scattering
    pub cutoff: f64,
    pub energy: Vec<f64>,
    pub elastic: Vec<f64>,
    pub inelastic: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalXs {
    pub elastic: f64,
    pub inelastic: f64,
}

impl ThermalXs {
    pub fn total(&self) -> f64 {
        self.elastic + self.inelastic
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThermalTable {
    pub temperature: f64,
    pub cutoff: f64,
    elastic: InterpolationTable,
    inelastic: InterpolationTable,
}

impl ThermalTable {
    pub fn from_data(data: &ThermalData) -> Result<Self, String> {
        if !(data.temperature > 0.0) {
            return Err(format!("thermal table temperature {} K must be positive", data.temperature));
        }
        if data.energy.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(format!("thermal table at {} K has a non increasing energy grid", data.temperature));
        }
        if data.elastic.iter().chain(data.inelastic.iter()).any(|&xs| !(xs >= 0.0)) {
            return Err(format!("thermal table at {} K has negative cross sections", data.temperature));
        }
        let to_message = |err: InterpolationError| format!("thermal table at {} K: {}", data.temperature, err);
        let elastic = InterpolationTable::from_x_and_y(&data.energy, &data.elastic, InterpolationScheme::LinLin)
            .map_err(to_message)?;
        let inelastic = InterpolationTable::from_x_and_y(&data.energy, &data.inelastic, InterpolationScheme::LinLin)
            .map_err(to_message)?;
        if data.cutoff > elastic.x_max() || data.cutoff <= elastic.x_min() {
            return Err(format!(
                "thermal cutoff {:e} MeV lies outside the table grid [{:e}, {:e}]",
                data.cutoff,
                elastic.x_min(),
                elastic.x_max()
            ));
        }
        Ok(Self { temperature: data.temperature, cutoff: data.cutoff, elastic, inelastic })
    }

    pub fn matches_temperature(&self, temperature: f64) -> bool {
        (self.temperature - temperature).abs() <= THERMAL_TEMPERATURE_TOLERANCE
    }

    pub fn applies(&self, energy: f64) -> bool {
        energy < self.cutoff
    }

    #[allow(non_snake_case)]
    pub fn kT(&self) -> f64 {
        compute_kT_from_temperature(self.temperature)
    }

    pub fn energy_min(&self) -> f64 {
        self.elastic.x_min()
    }

    pub fn evaluate(&self, energy: f64) -> Result<ThermalXs, InterpolationError> {
        Ok(ThermalXs { elastic: self.elastic.interpolate(energy)?, inelastic: self.inelastic.interpolate(energy)? })
    }
}
