use std::ops::Deref;

use crate::bank::Site;
use crate::error::BankError;
use crate::random::RandomSource;

// Starting sites of the histories of one cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBank(Vec<Site>);

impl Deref for SourceBank {
    type Target = Vec<Site>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Site>> for SourceBank {
    fn from(sites: Vec<Site>) -> Self {
        Self(sites)
    }
}

impl SourceBank {
    pub fn total_weight(&self) -> f64 {
        self.0.iter().map(|site| site.weight).sum()
    }

    // Resample fission sites into exactly `n_particles` unit weight sites by
    // systematic combing. One draw places the comb; each tooth selects the
    // site whose share of the total weight it falls into.
    pub fn promote<R: RandomSource + ?Sized>(
        sites: &[Site],
        n_particles: usize,
        cycle: usize,
        rng: &mut R,
    ) -> Result<Self, BankError> {
        if n_particles == 0 {
            return Err(BankError::ZeroTarget);
        }
        let total: f64 = sites.iter().map(|site| site.weight).sum();
        if sites.is_empty() || !(total > 0.0) {
            return Err(BankError::Empty { cycle });
        }

        let spacing = total / n_particles as f64;
        let offset = rng.next_unit().value() * spacing;
        let mut promoted = Vec::with_capacity(n_particles);
        let mut index = 0;
        let mut upper = sites[0].weight;
        for tooth in 0..n_particles {
            let position = offset + tooth as f64 * spacing;
            while position >= upper && index + 1 < sites.len() {
                index += 1;
                upper += sites[index].weight;
            }
            promoted.push(Site { weight: 1.0, ..sites[index] });
        }
        Ok(Self(promoted))
    }
}
