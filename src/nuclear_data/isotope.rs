use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::error::{ConfigurationError, DataError};
use crate::interpolation::InterpolationScheme;
use crate::nuclear_data::{
    CrossSectionTable, FissionSpectrum, NuData, NuFormulation, ReactionData, ReactionType, ThermalData,
    ThermalTable,
};
use crate::utils::{is_ascii_file, write_isotope_library, XsMmap};

//=====================================================================
// Nuclear data for one isotope as it crosses the crate boundary:
// deserialized from a model file, read from a binary library, or built
// directly by a caller.
//=====================================================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotopeData {
    pub name: String,
    // Atomic weight ratio to the neutron mass
    pub awr: f64,
    // Evaluation temperature (K)
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub interpolation: InterpolationScheme,
    pub energy: Vec<f64>,
    #[serde(default)]
    pub total: Option<Vec<f64>>,
    pub reactions: Vec<ReactionData>,
    #[serde(default)]
    pub nu: Option<NuData>,
    #[serde(default)]
    pub fission_spectrum: Option<FissionSpectrum>,
    #[serde(default)]
    pub thermal: Vec<ThermalData>,
}

impl IsotopeData {
    // Read an isotope from a binary library file
    pub fn from_library<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let path = file_path.as_ref();

        // Text files are never libraries, this usually means a JSON model was passed by mistake
        if is_ascii_file(path)? {
            return Err(anyhow::anyhow!(
                "File {} is ASCII, isotope libraries are binary files written by write_isotope_library",
                path.display()
            ));
        }

        let mmap = XsMmap::from_file(path)?;
        mmap.to_isotope_data().with_context(|| format!("Failed to decode isotope library {}", path.display()))
    }

    pub fn to_library<P: AsRef<Path>>(&self, file_path: P) -> Result<()> {
        write_isotope_library(file_path, self)
    }
}

// Load many libraries concurrently. Results keep the order of `paths`.
pub async fn load_isotope_libraries(paths: &[PathBuf]) -> Result<Vec<IsotopeData>> {
    let mut tasks = JoinSet::new();
    for (index, path) in paths.iter().cloned().enumerate() {
        tasks.spawn_blocking(move || IsotopeData::from_library(&path).map(|data| (index, data)));
    }

    let mut loaded = Vec::with_capacity(paths.len());
    while let Some(result) = tasks.join_next().await {
        loaded.push(result.context("Isotope library loading task failed")??);
    }
    loaded.sort_by_key(|(index, _)| *index);
    info!("Loaded {} isotope libraries", loaded.len());
    Ok(loaded.into_iter().map(|(_, data)| data).collect())
}

//=====================================================================
// Validated isotope held by the nuclear data store.
//=====================================================================
#[derive(Debug, Clone, PartialEq)]
pub struct Isotope {
    pub name: String,
    pub awr: f64,
    pub temperature: f64,
    pub xs: CrossSectionTable,
    pub nu: Option<NuFormulation>,
    pub spectrum: FissionSpectrum,
    pub thermal: Vec<ThermalTable>,
    fissile: bool,
}

impl Isotope {
    pub fn from_data(data: &IsotopeData) -> Result<Self, ConfigurationError> {
        let invalid = |message: String| ConfigurationError::InvalidTable { isotope: data.name.clone(), message };

        if !(data.awr > 0.0) || !data.awr.is_finite() {
            return Err(invalid(format!("atomic weight ratio {} must be positive", data.awr)));
        }

        let xs = CrossSectionTable::new(data.energy.clone(), data.total.clone(), &data.reactions, data.interpolation)
            .map_err(invalid)?;

        let fissile = xs.channels().iter().any(|channel| channel.kind.is_fission());
        let nu = data
            .nu
            .as_ref()
            .map(NuFormulation::from_data)
            .transpose()
            .map_err(|err| invalid(format!("nu-bar: {}", err)))?;
        if fissile && nu.is_none() {
            return Err(invalid("fission channel present but no nu-bar data".to_string()));
        }
        if let Some(nu) = &nu {
            let (min, max) = nu.range();
            if min > xs.energy_min() || max < xs.energy_max() {
                return Err(invalid(format!(
                    "nu-bar table [{:e}, {:e}] does not cover the energy grid [{:e}, {:e}]",
                    min,
                    max,
                    xs.energy_min(),
                    xs.energy_max()
                )));
            }
        }

        let spectrum = data.fission_spectrum.unwrap_or_default();
        spectrum.validate().map_err(invalid)?;

        let mut thermal = Vec::with_capacity(data.thermal.len());
        for table in &data.thermal {
            let table = ThermalTable::from_data(table).map_err(invalid)?;
            if table.energy_min() > xs.energy_min() {
                return Err(invalid(format!(
                    "thermal table at {} K starts at {:e} MeV, above the energy grid minimum {:e}",
                    table.temperature,
                    table.energy_min(),
                    xs.energy_min()
                )));
            }
            thermal.push(table);
        }

        debug!(
            "Isotope {}: {} energies, {} reactions, {} thermal tables",
            data.name,
            xs.energy().len(),
            xs.channels().len(),
            thermal.len()
        );

        Ok(Self { name: data.name.clone(), awr: data.awr, temperature: data.temperature, xs, nu, spectrum, thermal, fissile })
    }

    pub fn is_fissile(&self) -> bool {
        self.fissile
    }

    pub fn has_reaction(&self, kind: ReactionType) -> bool {
        self.xs.channels().iter().any(|channel| channel.kind == kind)
    }

    // Nu-bar at the incident energy
    pub fn nu(&self, energy: f64) -> Result<f64, DataError> {
        let nu = self.nu.as_ref().ok_or_else(|| DataError::MissingNu { isotope: self.name.clone() })?;
        nu.evaluate(energy).map_err(|source| DataError::Interpolation { table: format!("{} nu-bar", self.name), source })
    }

    // Thermal table matching a material temperature, if any
    pub fn thermal_for(&self, temperature: f64) -> Option<usize> {
        self.thermal.iter().position(|table| table.matches_temperature(temperature))
    }
}
