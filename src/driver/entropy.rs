use serde::{Deserialize, Serialize};

use crate::bank::Site;
use crate::error::ConfigurationError;

//=====================================================================
// Shannon entropy of the fission source over a regular mesh. Used to
// judge whether the source has converged during the inactive cycles.
//=====================================================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntropyMesh {
    pub lower_left: [f64; 3],
    pub upper_right: [f64; 3],
    pub dimension: [usize; 3],
}

impl EntropyMesh {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let bounds_ok = self
            .lower_left
            .iter()
            .zip(&self.upper_right)
            .all(|(lo, hi)| lo.is_finite() && hi.is_finite() && lo < hi);
        if !bounds_ok || self.dimension.contains(&0) {
            return Err(ConfigurationError::InvalidSettings(format!("entropy mesh {:?} is empty", self)));
        }
        Ok(())
    }

    pub fn bins(&self) -> usize {
        self.dimension.iter().product()
    }

    // Flat bin index of a point, None outside the mesh
    pub fn bin(&self, position: &[f64; 3]) -> Option<usize> {
        let mut flat = 0;
        for axis in (0..3).rev() {
            let width = (self.upper_right[axis] - self.lower_left[axis]) / self.dimension[axis] as f64;
            let offset = position[axis] - self.lower_left[axis];
            if !(offset >= 0.0) || position[axis] > self.upper_right[axis] {
                return None;
            }
            let index = ((offset / width) as usize).min(self.dimension[axis] - 1);
            flat = flat * self.dimension[axis] + index;
        }
        Some(flat)
    }

    // -sum p log2 p over the weighted site fractions. Sites outside the mesh
    // are ignored.
    pub fn entropy(&self, sites: &[Site]) -> f64 {
        let mut weights = vec![0.0; self.bins()];
        let mut total = 0.0;
        for site in sites {
            if let Some(bin) = self.bin(&site.position) {
                weights[bin] += site.weight;
                total += site.weight;
            }
        }
        if !(total > 0.0) {
            return 0.0;
        }
        weights
            .iter()
            .filter(|&&weight| weight > 0.0)
            .map(|weight| {
                let p = weight / total;
                -p * p.log2()
            })
            .sum()
    }
}
