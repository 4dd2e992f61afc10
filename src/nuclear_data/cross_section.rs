use serde::{Deserialize, Serialize};

use crate::interpolation::InterpolationScheme;
use crate::nuclear_data::ReactionType;

// One reaction channel as supplied with an isotope. The values start at
// `threshold_index` of the isotope's energy grid and run to its end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionData {
    pub mt: u32,
    #[serde(default)]
    pub q_value: f64,
    #[serde(default)]
    pub threshold_index: usize,
    pub xs: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReactionChannel {
    pub mt: u32,
    pub kind: ReactionType,
    pub q_value: f64,
    pub threshold_index: usize,
    pub xs: Vec<f64>,
}

impl ReactionChannel {
    // Cross section inside grid interval `index`. Below threshold it is zero.
    #[inline]
    fn value(&self, grid: &[f64], index: usize, energy: f64, scheme: InterpolationScheme) -> f64 {
        if index < self.threshold_index {
            return 0.0;
        }
        let i = index - self.threshold_index;
        scheme.interpolate(grid[index], grid[index + 1], self.xs[i], self.xs[i + 1], energy)
    }
}

//=====================================================================
// Continuous energy cross sections of one isotope: a strictly increasing
// grid, the total cross section on it, and the reaction channels with
// their threshold offsets into the grid.
//
// Lookups take the grid interval up front, found by `locate` or through
// the unionized grid of the data store.
//=====================================================================
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSectionTable {
    energy: Vec<f64>,
    total: Vec<f64>,
    channels: Vec<ReactionChannel>,
    scheme: InterpolationScheme,
    elastic: Option<usize>,
}

impl CrossSectionTable {
    pub fn new(
        energy: Vec<f64>,
        total: Option<Vec<f64>>,
        reactions: &[ReactionData],
        scheme: InterpolationScheme,
    ) -> Result<Self, String> {
        if energy.len() < 2 {
            return Err(format!("energy grid needs at least two points, got {}", energy.len()));
        }
        if let Some(pair) = energy.windows(2).find(|pair| !(pair[1] > pair[0])) {
            return Err(format!("energy grid is not strictly increasing ({:e} then {:e})", pair[0], pair[1]));
        }
        if !(energy[0] > 0.0) {
            return Err(format!("energy grid starts at {:e} MeV, energies must be positive", energy[0]));
        }
        if !scheme.is_supported() {
            return Err(format!("interpolation scheme {} is not supported", scheme));
        }

        let mut channels = Vec::with_capacity(reactions.len());
        for reaction in reactions {
            let kind = ReactionType::from_mt(reaction.mt)
                .ok_or_else(|| format!("MT {} is not a supported reaction", reaction.mt))?;
            if channels.iter().any(|channel: &ReactionChannel| channel.mt == reaction.mt) {
                return Err(format!("MT {} is given more than once", reaction.mt));
            }
            if reaction.threshold_index >= energy.len() - 1
                || reaction.xs.len() != energy.len() - reaction.threshold_index
            {
                return Err(format!(
                    "MT {} has {} values from threshold index {}, expected {}",
                    reaction.mt,
                    reaction.xs.len(),
                    reaction.threshold_index,
                    energy.len().saturating_sub(reaction.threshold_index)
                ));
            }
            if reaction.xs.iter().any(|&xs| !(xs >= 0.0)) {
                return Err(format!("MT {} has negative cross sections", reaction.mt));
            }
            channels.push(ReactionChannel {
                mt: reaction.mt,
                kind,
                q_value: reaction.q_value,
                threshold_index: reaction.threshold_index,
                xs: reaction.xs.clone(),
            });
        }

        // Without an explicit total, it is the sum over the channels
        let total = match total {
            Some(total) => total,
            None => {
                let mut total = vec![0.0; energy.len()];
                for channel in &channels {
                    for (i, xs) in channel.xs.iter().enumerate() {
                        total[channel.threshold_index + i] += xs;
                    }
                }
                total
            }
        };
        if total.len() != energy.len() {
            return Err(format!("total cross section has {} values for {} energies", total.len(), energy.len()));
        }
        if total.iter().any(|&xs| !(xs >= 0.0)) {
            return Err("total cross section has negative values".to_string());
        }

        let elastic = channels.iter().position(|channel| channel.kind == ReactionType::Elastic);
        Ok(Self { energy, total, channels, scheme, elastic })
    }

    pub fn energy(&self) -> &[f64] {
        &self.energy
    }

    pub fn energy_min(&self) -> f64 {
        self.energy[0]
    }

    pub fn energy_max(&self) -> f64 {
        self.energy[self.energy.len() - 1]
    }

    pub fn contains(&self, energy: f64) -> bool {
        energy >= self.energy_min() && energy <= self.energy_max()
    }

    pub fn channels(&self) -> &[ReactionChannel] {
        &self.channels
    }

    pub fn elastic_channel(&self) -> Option<usize> {
        self.elastic
    }

    pub fn scheme(&self) -> InterpolationScheme {
        self.scheme
    }

    // Grid interval holding the energy, by binary search. The last point
    // belongs to the last interval.
    pub fn locate(&self, energy: f64) -> Option<usize> {
        if !self.contains(energy) {
            return None;
        }
        let upper = self.energy.partition_point(|&e| e <= energy);
        Some(upper.saturating_sub(1).min(self.energy.len() - 2))
    }

    #[inline]
    pub fn total(&self, index: usize, energy: f64) -> f64 {
        self.scheme
            .interpolate(self.energy[index], self.energy[index + 1], self.total[index], self.total[index + 1], energy)
    }

    #[inline]
    pub fn channel(&self, channel: usize, index: usize, energy: f64) -> f64 {
        self.channels[channel].value(&self.energy, index, energy, self.scheme)
    }

    // Sum over the channels matching the filter
    pub fn sum_channels<F>(&self, index: usize, energy: f64, filter: F) -> f64
    where
        F: Fn(ReactionType) -> bool,
    {
        self.channels
            .iter()
            .filter(|channel| filter(channel.kind))
            .map(|channel| channel.value(&self.energy, index, energy, self.scheme))
            .sum()
    }
}
