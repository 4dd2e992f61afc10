use thiserror::Error;

use crate::interpolation::InterpolationError;

//=====================================================================
// Error taxonomy for the transport core.
//
// ConfigurationError, GeometryError and DataError are fatal for a run.
// HistoryFailure only ends the offending history; whether the run goes
// on afterwards is decided by the FailurePolicy in the run settings.
//=====================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Cell {cell}: malformed region expression at token {position}: {message}")]
    MalformedRegion { cell: u32, position: usize, message: String },

    #[error("Cell {cell} references surface {surface}, which does not exist")]
    UnknownSurface { cell: u32, surface: u32 },

    #[error("Cell {cell} references material {material}, which does not exist")]
    UnknownMaterial { cell: u32, material: u32 },

    #[error("Cell {cell} is filled with universe {universe}, which contains no cells")]
    UnknownUniverse { cell: u32, universe: u32 },

    #[error("Root universe {0} contains no cells")]
    EmptyRootUniverse(u32),

    #[error("Universe {universe} is filled recursively through cell {cell}")]
    RecursiveFill { cell: u32, universe: u32 },

    #[error("Duplicate {kind} identifier: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("Surface {surface}: {message}")]
    InvalidSurface { surface: u32, message: String },

    #[error("Material {material} references isotope '{isotope}', which is not loaded")]
    UnknownIsotope { material: u32, isotope: String },

    #[error("Material {material}: atom density {density} for isotope '{isotope}' is negative")]
    NegativeDensity { material: u32, isotope: String, density: f64 },

    #[error("Isotope '{isotope}': {message}")]
    InvalidTable { isotope: String, message: String },

    #[error("Isotope energy grids share no range: the highest grid start {min:e} MeV is not below the lowest grid end {max:e} MeV")]
    DisjointEnergyGrids { min: f64, max: f64 },

    #[error("Run settings: {0}")]
    InvalidSettings(String),

    #[error("Source definition: {0}")]
    InvalidSource(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Point {point:?} is not inside any cell")]
    Unclassified { point: [f64; 3] },

    #[error("Point {point:?} is inside cell {cell}, whose fill universe {universe} does not cover it")]
    UnclassifiedInFill { point: [f64; 3], cell: u32, universe: u32 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Energy {energy:e} MeV is outside the tabulated range [{min:e}, {max:e}] of '{table}'")]
    EnergyOutOfRange { table: String, energy: f64, min: f64, max: f64 },

    #[error("Material index {0} is out of range")]
    UnknownMaterial(usize),

    #[error("Material '{material}' has zero total cross section at {energy:e} MeV, no reaction can be sampled")]
    NoReaction { material: String, energy: f64 },

    #[error("Isotope '{isotope}' fissioned but has no nu-bar data")]
    MissingNu { isotope: String },

    #[error("Interpolation failed for '{table}': {source}")]
    Interpolation { table: String, source: InterpolationError },
}

// Conditions which end a single history. These are recoverable unless
// the run is configured to treat them as fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryFailure {
    #[error("History {history}: {source}")]
    Lost { history: u64, source: GeometryError },

    #[error("History {history}: {source}")]
    Data { history: u64, source: DataError },

    #[error("History {history}: degenerate direction {direction:?}")]
    DegenerateDirection { history: u64, direction: [f64; 3] },

    #[error("History {history}: exceeded {max_events} events without terminating")]
    TooManyEvents { history: u64, max_events: usize },
}

impl HistoryFailure {
    pub fn history(&self) -> u64 {
        match self {
            HistoryFailure::Lost { history, .. }
            | HistoryFailure::Data { history, .. }
            | HistoryFailure::DegenerateDirection { history, .. }
            | HistoryFailure::TooManyEvents { history, .. } => *history,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BankError {
    #[error("Cycle {cycle} produced no fission sites, the next source bank cannot be formed")]
    Empty { cycle: usize },

    #[error("Cannot promote into a bank of zero particles")]
    ZeroTarget,
}

// Umbrella error returned by the run-level entry points.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error("Fatal history failure: {0}")]
    History(#[from] HistoryFailure),

    #[error("Worker pool: {0}")]
    ThreadPool(String),
}

pub type TransportResult<T> = Result<T, TransportError>;
