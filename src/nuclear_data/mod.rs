mod cross_section;
mod data_store;
mod energy_grid;
mod isotope;
mod material;
mod nu;
mod reaction;
mod spectrum;
mod thermal;

pub use cross_section::{CrossSectionTable, ReactionChannel, ReactionData};
pub use data_store::{MaterialXs, NuclearDataStore, SampledReaction};
pub use energy_grid::{EnergyRange, UnionizedGrid};
pub use isotope::{load_isotope_libraries, Isotope, IsotopeData};
pub use material::{Material, MaterialComponent, MaterialComponentDefinition, MaterialDefinition};
pub use nu::{NuData, NuFormulation, PolynomialNu, TabulatedNu};
pub use reaction::ReactionType;
pub use spectrum::{sample_maxwell, sample_watt, FissionSpectrum, U235_WATT_A, U235_WATT_B};
pub use thermal::{ThermalData, ThermalTable, ThermalXs, THERMAL_TEMPERATURE_TOLERANCE};
