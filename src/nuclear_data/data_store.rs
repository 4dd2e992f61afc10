use std::collections::HashMap;

use log::{debug, warn};
use rayon::prelude::*;

use crate::error::{ConfigurationError, DataError};
use crate::nuclear_data::{
    EnergyRange, Isotope, IsotopeData, Material, MaterialComponent, MaterialDefinition, ReactionType, ThermalXs,
    UnionizedGrid,
};
use crate::unitf64::UnitF64;

// Macroscopic cross sections of a material at one energy (1/cm)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaterialXs {
    pub total: f64,
    pub absorption: f64,
    pub fission: f64,
    pub nu_fission: f64,
}

impl MaterialXs {
    pub fn scatter(&self) -> f64 {
        (self.total - self.absorption).max(0.0)
    }
}

// What a collision turned out to be, within the sampled isotope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampledReaction {
    // Index into the isotope's reaction channels
    Channel(usize),
    // Index into the isotope's thermal tables
    ThermalElastic(usize),
    ThermalInelastic(usize),
}

// Microscopic cross sections of one isotope at one energy (barns)
#[derive(Debug, Clone, Copy)]
struct MicroXs {
    index: usize,
    total: f64,
    absorption: f64,
    fission: f64,
    thermal: Option<(usize, ThermalXs)>,
}

//=====================================================================
// The immutable nuclear data of a run: isotopes, materials and the
// unionized energy grid over all isotopes. Shared by every history.
//=====================================================================
#[derive(Debug, Clone)]
pub struct NuclearDataStore {
    isotopes: Vec<Isotope>,
    isotope_index: HashMap<String, usize>,
    materials: Vec<Material>,
    material_index: HashMap<u32, usize>,
    grid: UnionizedGrid,
    energy_range: EnergyRange,
}

impl NuclearDataStore {
    pub fn new(isotopes: &[IsotopeData], materials: &[MaterialDefinition]) -> Result<Self, ConfigurationError> {
        // Isotopes validate independently of each other
        let isotopes: Vec<Isotope> = isotopes.par_iter().map(Isotope::from_data).collect::<Result<_, _>>()?;

        let mut isotope_index = HashMap::with_capacity(isotopes.len());
        for (index, isotope) in isotopes.iter().enumerate() {
            if isotope_index.insert(isotope.name.clone(), index).is_some() {
                return Err(ConfigurationError::DuplicateId { kind: "isotope", id: isotope.name.clone() });
            }
        }

        let mut resolved = Vec::with_capacity(materials.len());
        let mut material_index = HashMap::with_capacity(materials.len());
        for (index, definition) in materials.iter().enumerate() {
            if material_index.insert(definition.id, index).is_some() {
                return Err(ConfigurationError::DuplicateId { kind: "material", id: definition.id.to_string() });
            }
            let mut components = Vec::with_capacity(definition.components.len());
            for component in &definition.components {
                let isotope = *isotope_index.get(&component.isotope).ok_or_else(|| ConfigurationError::UnknownIsotope {
                    material: definition.id,
                    isotope: component.isotope.clone(),
                })?;
                if !(component.density >= 0.0) || !component.density.is_finite() {
                    return Err(ConfigurationError::NegativeDensity {
                        material: definition.id,
                        isotope: component.isotope.clone(),
                        density: component.density,
                    });
                }
                let thermal = definition.temperature.and_then(|temperature| isotopes[isotope].thermal_for(temperature));
                if definition.temperature.is_some() && thermal.is_none() && !isotopes[isotope].thermal.is_empty() {
                    warn!(
                        "Material {}: no thermal table of {} matches {:?} K, using free gas elastic scattering",
                        definition.id, component.isotope, definition.temperature
                    );
                }
                components.push(MaterialComponent { isotope, density: component.density, thermal });
            }
            resolved.push(Material {
                id: definition.id,
                name: definition.name.clone(),
                temperature: definition.temperature,
                components,
            });
        }

        let tables: Vec<_> = isotopes.iter().map(|isotope| &isotope.xs).collect();
        let grid = UnionizedGrid::new(&tables);

        // Range covered by every isotope that some material uses
        let mut used: Vec<usize> =
            resolved.iter().flat_map(|material| material.components.iter().map(|component| component.isotope)).collect();
        used.sort_unstable();
        used.dedup();
        let used_tables: Vec<_> = used.iter().map(|&isotope| &isotopes[isotope].xs).collect();
        let energy_range = EnergyRange::common(&used_tables);
        if energy_range.is_empty() {
            return Err(ConfigurationError::DisjointEnergyGrids { min: energy_range.min, max: energy_range.max });
        }
        debug!(
            "Built nuclear data with {} isotopes, {} materials, {} union grid points, energies [{:e}, {:e}] MeV",
            isotopes.len(),
            resolved.len(),
            grid.len(),
            energy_range.min,
            energy_range.max
        );

        Ok(Self { isotopes, isotope_index, materials: resolved, material_index, grid, energy_range })
    }

    pub fn isotopes(&self) -> &[Isotope] {
        &self.isotopes
    }

    pub fn isotope(&self, index: usize) -> &Isotope {
        &self.isotopes[index]
    }

    pub fn isotope_index(&self, name: &str) -> Option<usize> {
        self.isotope_index.get(name).copied()
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material(&self, index: usize) -> Result<&Material, DataError> {
        self.materials.get(index).ok_or(DataError::UnknownMaterial(index))
    }

    pub fn material_index(&self, id: u32) -> Option<usize> {
        self.material_index.get(&id).copied()
    }

    pub fn grid(&self) -> &UnionizedGrid {
        &self.grid
    }

    // Energies valid in every material; transport keeps particles inside it
    pub fn energy_range(&self) -> EnergyRange {
        self.energy_range
    }

    pub fn is_fissionable(&self, material: usize) -> bool {
        self.materials
            .get(material)
            .is_some_and(|material| material.is_fissionable(|isotope| self.isotopes[isotope].is_fissile()))
    }

    // Isotope grid interval for an energy, through the unionized grid
    fn isotope_interval(&self, isotope: usize, union_index: Option<usize>, energy: f64) -> Result<usize, DataError> {
        let xs = &self.isotopes[isotope].xs;
        let out_of_range = || DataError::EnergyOutOfRange {
            table: self.isotopes[isotope].name.clone(),
            energy,
            min: xs.energy_min(),
            max: xs.energy_max(),
        };
        if !xs.contains(energy) {
            return Err(out_of_range());
        }
        union_index.map(|j| self.grid.isotope_index(isotope, j)).ok_or_else(out_of_range)
    }

    fn micro(&self, component: &MaterialComponent, union_index: Option<usize>, energy: f64) -> Result<MicroXs, DataError> {
        let isotope = &self.isotopes[component.isotope];
        let index = self.isotope_interval(component.isotope, union_index, energy)?;
        let xs = &isotope.xs;

        let mut total = xs.total(index, energy);
        let thermal = match component.thermal {
            Some(table) if isotope.thermal[table].applies(energy) => {
                let thermal_xs = isotope.thermal[table].evaluate(energy).map_err(|source| DataError::Interpolation {
                    table: format!("{} thermal {} K", isotope.name, isotope.thermal[table].temperature),
                    source,
                })?;
                // Bound scattering replaces free elastic scattering
                let elastic = xs.elastic_channel().map_or(0.0, |channel| xs.channel(channel, index, energy));
                total = (total - elastic).max(0.0) + thermal_xs.total();
                Some((table, thermal_xs))
            }
            _ => None,
        };

        Ok(MicroXs {
            index,
            total,
            absorption: xs.sum_channels(index, energy, ReactionType::is_absorption),
            fission: xs.sum_channels(index, energy, ReactionType::is_fission),
            thermal,
        })
    }

    // Sum of N_i * sigma_t,i over the material's isotopes
    pub fn total_macroscopic_cross_section(&self, material: usize, energy: f64) -> Result<f64, DataError> {
        let material = self.material(material)?;
        let union_index = self.grid.locate(energy);
        let mut total = 0.0;
        for component in &material.components {
            total += component.density * self.micro(component, union_index, energy)?.total;
        }
        Ok(total)
    }

    pub fn macroscopic_cross_sections(&self, material: usize, energy: f64) -> Result<MaterialXs, DataError> {
        let material = self.material(material)?;
        let union_index = self.grid.locate(energy);
        let mut result = MaterialXs::default();
        for component in &material.components {
            let micro = self.micro(component, union_index, energy)?;
            result.total += component.density * micro.total;
            result.absorption += component.density * micro.absorption;
            if micro.fission > 0.0 {
                result.fission += component.density * micro.fission;
                result.nu_fission += component.density * micro.fission * self.isotopes[component.isotope].nu(energy)?;
            }
        }
        Ok(result)
    }

    // Pick the isotope and reaction of a collision with probability
    // N_i sigma_i,r / Sigma_t, from a single draw.
    pub fn sample_reaction(&self, material: usize, energy: f64, xi: UnitF64) -> Result<(usize, SampledReaction), DataError> {
        self.sample(material, energy, xi, true)
    }

    // Same as sample_reaction but restricted to scattering channels, for
    // collisions where absorption is accounted for by weight reduction.
    pub fn sample_scatter(&self, material: usize, energy: f64, xi: UnitF64) -> Result<(usize, SampledReaction), DataError> {
        self.sample(material, energy, xi, false)
    }

    // Isotope whose fission neutrons are banked, with probability
    // N_i nu_i sigma_f,i / nu Sigma_f. None if nothing can fission at E.
    pub fn sample_fissioning_isotope(&self, material: usize, energy: f64, xi: UnitF64) -> Result<Option<usize>, DataError> {
        let material = self.material(material)?;
        let union_index = self.grid.locate(energy);

        let mut weights = Vec::with_capacity(material.components.len());
        let mut sum = 0.0;
        for component in &material.components {
            let isotope = &self.isotopes[component.isotope];
            if !isotope.is_fissile() {
                continue;
            }
            let micro = self.micro(component, union_index, energy)?;
            let weight = component.density * micro.fission * isotope.nu(energy)?;
            if weight > 0.0 {
                sum += weight;
                weights.push((component.isotope, weight));
            }
        }

        let target = xi.value() * sum;
        let mut cumulative = 0.0;
        for &(isotope, weight) in &weights {
            cumulative += weight;
            if target < cumulative {
                return Ok(Some(isotope));
            }
        }
        Ok(weights.last().map(|&(isotope, _)| isotope))
    }

    fn sample(
        &self,
        material: usize,
        energy: f64,
        xi: UnitF64,
        include_absorption: bool,
    ) -> Result<(usize, SampledReaction), DataError> {
        let material_data = self.material(material)?;
        let union_index = self.grid.locate(energy);
        let no_reaction = || DataError::NoReaction { material: material_data.name.clone(), energy };

        let mut micros = Vec::with_capacity(material_data.components.len());
        let mut sigma = 0.0;
        for component in &material_data.components {
            let micro = self.micro(component, union_index, energy)?;
            let micro_sigma = if include_absorption { micro.total } else { (micro.total - micro.absorption).max(0.0) };
            sigma += component.density * micro_sigma;
            micros.push((component, micro, micro_sigma));
        }
        if !(sigma > 0.0) {
            return Err(no_reaction());
        }

        // Isotope first, then the reaction inside it, from the same draw
        let target = xi.value() * sigma;
        let mut cumulative = 0.0;
        let mut chosen = None;
        for &(component, micro, micro_sigma) in &micros {
            let weight = component.density * micro_sigma;
            if weight <= 0.0 {
                continue;
            }
            chosen = Some((component, micro, (target - cumulative) / component.density));
            cumulative += weight;
            if target < cumulative {
                break;
            }
        }
        let (component, micro, remaining) = chosen.ok_or_else(no_reaction)?;

        let isotope = &self.isotopes[component.isotope];
        let xs = &isotope.xs;
        let mut cumulative = 0.0;
        let mut last = None;
        if let Some((table, thermal)) = micro.thermal {
            for (reaction, value) in [
                (SampledReaction::ThermalElastic(table), thermal.elastic),
                (SampledReaction::ThermalInelastic(table), thermal.inelastic),
            ] {
                if value > 0.0 {
                    cumulative += value;
                    last = Some(reaction);
                    if remaining < cumulative {
                        return Ok((component.isotope, reaction));
                    }
                }
            }
        }
        for (channel, reaction) in xs.channels().iter().enumerate() {
            if (micro.thermal.is_some() && reaction.kind == ReactionType::Elastic)
                || (!include_absorption && reaction.kind.is_absorption())
            {
                continue;
            }
            let value = xs.channel(channel, micro.index, energy);
            if value > 0.0 {
                cumulative += value;
                last = Some(SampledReaction::Channel(channel));
                if remaining < cumulative {
                    return Ok((component.isotope, SampledReaction::Channel(channel)));
                }
            }
        }

        // Rounding, or a supplied total above the channel sum
        last.map(|reaction| (component.isotope, reaction)).ok_or_else(no_reaction)
    }
}
