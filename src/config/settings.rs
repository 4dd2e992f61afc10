use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::driver::EntropyMesh;
use crate::error::ConfigurationError;
use crate::geometry::Geometry;
use crate::nuclear_data::NuclearDataStore;
use crate::source::Source;
use crate::transport::{TrackingSettings, DEFAULT_MAX_EVENTS, DEFAULT_WEIGHT_CUTOFF, DEFAULT_WEIGHT_SURVIVAL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    #[default]
    Eigenvalue,
    FixedSource,
}

// What a failed history does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    // Log it, count it, drop the history and carry on
    #[default]
    Abandon,
    // Stop the run with the first failure
    Fatal,
}

fn default_seed() -> u64 {
    1
}

fn default_weight_cutoff() -> f64 {
    DEFAULT_WEIGHT_CUTOFF
}

fn default_weight_survival() -> f64 {
    DEFAULT_WEIGHT_SURVIVAL
}

fn default_max_events() -> usize {
    DEFAULT_MAX_EVENTS
}

//=====================================================================
// Run settings, as handed over by the input layer.
//=====================================================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    #[serde(default)]
    pub problem: ProblemType,
    // Histories per cycle, or in total for a fixed source run
    pub particles: usize,
    #[serde(default)]
    pub cycles: usize,
    #[serde(default)]
    pub inactive: usize,
    pub source: Source,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub survival_biasing: bool,
    #[serde(default = "default_weight_cutoff")]
    pub weight_cutoff: f64,
    #[serde(default = "default_weight_survival")]
    pub weight_survival: f64,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    #[serde(default)]
    pub entropy_mesh: Option<EntropyMesh>,
    // Size of a dedicated worker pool, the global rayon pool if unset
    #[serde(default)]
    pub threads: Option<usize>,
}

impl RunSettings {
    pub fn eigenvalue(particles: usize, cycles: usize, inactive: usize, source: Source) -> Self {
        Self {
            problem: ProblemType::Eigenvalue,
            particles,
            cycles,
            inactive,
            source,
            seed: default_seed(),
            survival_biasing: false,
            weight_cutoff: DEFAULT_WEIGHT_CUTOFF,
            weight_survival: DEFAULT_WEIGHT_SURVIVAL,
            failure_policy: FailurePolicy::default(),
            max_events: DEFAULT_MAX_EVENTS,
            entropy_mesh: None,
            threads: None,
        }
    }

    pub fn fixed_source(particles: usize, source: Source) -> Self {
        Self { problem: ProblemType::FixedSource, ..Self::eigenvalue(particles, 0, 0, source) }
    }

    pub fn from_json_file<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let path = file_path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("Failed to read run settings {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse run settings {}", path.display()))
    }

    pub fn validate(&self, geometry: &Geometry, data: &NuclearDataStore) -> Result<(), ConfigurationError> {
        let invalid = |message: String| Err(ConfigurationError::InvalidSettings(message));
        if self.particles == 0 {
            return invalid("particles must be positive".to_string());
        }
        if self.problem == ProblemType::Eigenvalue && self.cycles <= self.inactive {
            return invalid(format!(
                "{} cycles with {} inactive leaves no active cycle",
                self.cycles, self.inactive
            ));
        }
        if !(self.weight_cutoff >= 0.0) || !self.weight_cutoff.is_finite() {
            return invalid(format!("weight cutoff {} must be non-negative", self.weight_cutoff));
        }
        if self.survival_biasing && !(self.weight_survival > self.weight_cutoff && self.weight_cutoff > 0.0) {
            return invalid(format!(
                "survival biasing needs 0 < weight cutoff ({}) < survival weight ({})",
                self.weight_cutoff, self.weight_survival
            ));
        }
        if self.max_events == 0 {
            return invalid("max_events must be positive".to_string());
        }
        if self.threads == Some(0) {
            return invalid("threads must be positive when set".to_string());
        }
        if let Some(mesh) = &self.entropy_mesh {
            mesh.validate()?;
        }
        self.source.validate(geometry, data.energy_range())
    }

    pub fn tracking(&self) -> TrackingSettings {
        TrackingSettings {
            survival_biasing: self.survival_biasing,
            weight_cutoff: self.weight_cutoff,
            weight_survival: self.weight_survival,
            max_events: self.max_events,
            bank_fission: self.problem == ProblemType::Eigenvalue,
        }
    }
}
