use serde::Serialize;

use crate::tally::WeightBalance;

// Summary of one cycle, handed to observers at the cycle barrier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleResult {
    pub cycle: usize,
    pub active: bool,
    // k of this cycle: fission site weight over starting weight
    pub k: f64,
    // Running estimate over the active cycles so far: sample standard
    // deviation of the cycle values and standard deviation of their mean
    pub k_mean: Option<f64>,
    pub k_std: Option<f64>,
    pub k_std_of_mean: Option<f64>,
    pub entropy: Option<f64>,
    pub source_weight: f64,
    pub fission_sites: usize,
    pub failed_histories: usize,
    pub balance: WeightBalance,
}

// Running mean, sample standard deviation and standard deviation of the
// mean of a sequence of batch estimates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStatistics {
    n: usize,
    sum: f64,
    sum_squares: f64,
}

impl RunningStatistics {
    pub fn add(&mut self, value: f64) {
        self.n += 1;
        self.sum += value;
        self.sum_squares += value * value;
    }

    pub fn count(&self) -> usize {
        self.n
    }

    pub fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }

    // Unbiased sample variance, needs at least two values
    fn variance(&self) -> Option<f64> {
        if self.n < 2 {
            return None;
        }
        let n = self.n as f64;
        let mean = self.sum / n;
        Some(((self.sum_squares - n * mean * mean) / (n - 1.0)).max(0.0))
    }

    pub fn std(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    pub fn std_of_mean(&self) -> Option<f64> {
        self.variance().map(|variance| (variance / self.n as f64).sqrt())
    }
}
