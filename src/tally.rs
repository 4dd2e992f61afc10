use std::collections::BTreeMap;

use serde::Serialize;

//=====================================================================
// Event tallies.
//
// Every history fills its own HistoryTally. At the cycle barrier the
// history tallies are folded into a Tally in history order, which keeps
// the floating point sums identical for any number of worker threads.
//=====================================================================

// Weighted event counts of one cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CellTally {
    pub collisions: f64,
    pub absorptions: f64,
    pub fissions: f64,
    // Weight leaving the system from this cell
    pub leakage: f64,
    // Track length estimate, weight * cm
    pub flux: f64,
}

impl CellTally {
    fn add(&mut self, other: &CellTally) {
        self.collisions += other.collisions;
        self.absorptions += other.absorptions;
        self.fissions += other.fissions;
        self.leakage += other.leakage;
        self.flux += other.flux;
    }
}

// Where particle weight came from and where it went
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WeightBalance {
    pub source: f64,
    pub secondary: f64,
    pub roulette_gain: f64,
    pub leaked: f64,
    pub absorbed: f64,
    pub fission: f64,
    pub cutoff: f64,
    pub roulette_loss: f64,
}

impl WeightBalance {
    pub fn produced(&self) -> f64 {
        self.source + self.secondary + self.roulette_gain
    }

    pub fn removed(&self) -> f64 {
        self.leaked + self.absorbed + self.fission + self.cutoff + self.roulette_loss
    }

    // Zero up to rounding once every particle has terminated
    pub fn residual(&self) -> f64 {
        self.produced() - self.removed()
    }

    fn add(&mut self, other: &WeightBalance) {
        self.source += other.source;
        self.secondary += other.secondary;
        self.roulette_gain += other.roulette_gain;
        self.leaked += other.leaked;
        self.absorbed += other.absorbed;
        self.fission += other.fission;
        self.cutoff += other.cutoff;
        self.roulette_loss += other.roulette_loss;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryTally {
    cells: BTreeMap<usize, CellTally>,
    pub balance: WeightBalance,
    pub fission_sites: usize,
    pub fission_site_weight: f64,
}

impl HistoryTally {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&mut self, cell: usize) -> &mut CellTally {
        self.cells.entry(cell).or_default()
    }

    pub fn cells(&self) -> impl Iterator<Item = (&usize, &CellTally)> {
        self.cells.iter()
    }

    pub fn track(&mut self, cell: usize, weight: f64, distance: f64) {
        self.cell(cell).flux += weight * distance;
    }

    pub fn collision(&mut self, cell: usize, weight: f64) {
        self.cell(cell).collisions += weight;
    }

    // Weight removed by capture or another non-fission absorption
    pub fn absorption(&mut self, cell: usize, weight: f64) {
        self.cell(cell).absorptions += weight;
        self.balance.absorbed += weight;
    }

    pub fn leak(&mut self, cell: usize, weight: f64) {
        self.cell(cell).leakage += weight;
        self.balance.leaked += weight;
    }

    pub fn cutoff(&mut self, weight: f64) {
        self.balance.cutoff += weight;
    }

    // Weight after a roulette game, zero when the particle was killed
    pub fn roulette(&mut self, before: f64, after: f64) {
        if after > 0.0 {
            self.balance.roulette_gain += after - before;
        } else {
            self.balance.roulette_loss += before;
        }
    }

    pub fn secondary(&mut self, weight: f64) {
        self.balance.secondary += weight;
    }

    // Weight removed by fission, together with the sites it produced
    pub fn fission(&mut self, cell: usize, weight: f64, sites: usize, site_weight: f64) {
        let tally = self.cell(cell);
        tally.absorptions += weight;
        tally.fissions += weight;
        self.balance.fission += weight;
        self.fission_sites += sites;
        self.fission_site_weight += site_weight;
    }
}

// Tally of a cycle or a whole run, dense over the cells of the geometry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tally {
    pub cells: Vec<CellTally>,
    pub balance: WeightBalance,
    pub histories: u64,
    pub fission_sites: usize,
    pub fission_site_weight: f64,
}

impl Tally {
    pub fn new(n_cells: usize) -> Self {
        Self { cells: vec![CellTally::default(); n_cells], ..Self::default() }
    }

    pub fn add_history(&mut self, history: &HistoryTally) {
        for (&cell, tally) in history.cells() {
            if cell >= self.cells.len() {
                self.cells.resize(cell + 1, CellTally::default());
            }
            self.cells[cell].add(tally);
        }
        self.balance.add(&history.balance);
        self.histories += 1;
        self.fission_sites += history.fission_sites;
        self.fission_site_weight += history.fission_site_weight;
    }

    pub fn merge(&mut self, other: &Tally) {
        if other.cells.len() > self.cells.len() {
            self.cells.resize(other.cells.len(), CellTally::default());
        }
        for (cell, tally) in self.cells.iter_mut().zip(&other.cells) {
            cell.add(tally);
        }
        self.balance.add(&other.balance);
        self.histories += other.histories;
        self.fission_sites += other.fission_sites;
        self.fission_site_weight += other.fission_site_weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    #[test]
    fn test_history_tally() {
        let mut history = HistoryTally::new();
        history.balance.source = 1.0;
        history.track(2, 1.0, 3.5);
        history.collision(2, 1.0);
        history.fission(2, 1.0, 3, 3.0);

        let (cell, tally) = history.cells().next().unwrap();
        assert_eq!(*cell, 2);
        assert_eq!(tally.flux, 3.5);
        assert_eq!(tally.fissions, 1.0);
        assert_eq!(tally.absorptions, 1.0);
        assert_eq!(history.fission_sites, 3);
        assert_abs_diff_eq!(history.balance.residual(), 0.0);
    }

    #[test]
    fn test_roulette_balance() {
        let mut history = HistoryTally::new();
        history.balance.source = 1.0;
        history.absorption(0, 0.9);
        history.roulette(0.1, 1.0);
        history.secondary(0.5);
        history.roulette(0.5, 0.0);
        history.leak(0, 1.0);
        assert_abs_diff_eq!(history.balance.roulette_gain, 0.9);
        assert_abs_diff_eq!(history.balance.roulette_loss, 0.5);
        assert_abs_diff_eq!(history.balance.residual(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_merge() {
        let mut a = HistoryTally::new();
        a.balance.source = 1.0;
        a.absorption(0, 1.0);
        let mut b = HistoryTally::new();
        b.balance.source = 1.0;
        b.track(3, 0.5, 2.0);
        b.leak(3, 1.0);

        let mut cycle = Tally::new(2);
        cycle.add_history(&a);
        cycle.add_history(&b);
        assert_eq!(cycle.cells.len(), 4);
        assert_eq!(cycle.cells[3].flux, 1.0);
        assert_eq!(cycle.cells[3].leakage, 1.0);
        assert_eq!(cycle.histories, 2);

        let mut run = Tally::new(4);
        run.merge(&cycle);
        run.merge(&cycle);
        assert_eq!(run.histories, 4);
        assert_eq!(run.cells[0].absorptions, 2.0);
        assert_eq!(run.balance.produced(), 4.0);
        assert_abs_diff_eq!(run.balance.residual(), 0.0);
    }
}
