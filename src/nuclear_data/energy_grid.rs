use serde::Serialize;

use crate::nuclear_data::CrossSectionTable;

// Energies at which every isotope of a store has data, MeV
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyRange {
    pub min: f64,
    pub max: f64,
}

impl Default for EnergyRange {
    fn default() -> Self {
        Self { min: 0.0, max: f64::INFINITY }
    }
}

impl EnergyRange {
    // Intersection of the table grids. May be empty (min >= max).
    pub fn common(tables: &[&CrossSectionTable]) -> Self {
        tables.iter().fold(Self::default(), |range, table| Self {
            min: range.min.max(table.energy_min()),
            max: range.max.min(table.energy_max()),
        })
    }

    pub fn is_empty(&self) -> bool {
        !(self.min < self.max)
    }

    pub fn contains(&self, energy: f64) -> bool {
        energy >= self.min && energy <= self.max
    }

    pub fn clamp(&self, energy: f64) -> f64 {
        energy.clamp(self.min, self.max)
    }
}

//=====================================================================
// Unionized energy grid.
//
// The union of every isotope grid, with a per-isotope map from each
// union interval to the isotope's own interval. One binary search on
// the union grid then serves every isotope of a material in O(1).
// Every isotope grid point is a union point.
//=====================================================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnionizedGrid {
    energy: Vec<f64>,
    index_map: Vec<Vec<u32>>,
}

impl UnionizedGrid {
    pub fn new(tables: &[&CrossSectionTable]) -> Self {
        let mut energy: Vec<f64> = tables.iter().flat_map(|table| table.energy().iter().copied()).collect();
        energy.sort_by(f64::total_cmp);
        energy.dedup();

        let index_map = tables
            .iter()
            .map(|table| {
                let own = table.energy();
                let last_interval = own.len() - 2;
                let mut map = Vec::with_capacity(energy.len());
                let mut i = 0;
                for &e in &energy {
                    while i < last_interval && own[i + 1] <= e {
                        i += 1;
                    }
                    map.push(i as u32);
                }
                map
            })
            .collect();

        Self { energy, index_map }
    }

    pub fn energy(&self) -> &[f64] {
        &self.energy
    }

    pub fn len(&self) -> usize {
        self.energy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energy.is_empty()
    }

    // Union interval holding the energy, None outside the grid
    pub fn locate(&self, energy: f64) -> Option<usize> {
        let n = self.energy.len();
        if n < 2 || !(energy >= self.energy[0] && energy <= self.energy[n - 1]) {
            return None;
        }
        let upper = self.energy.partition_point(|&e| e <= energy);
        Some(upper.saturating_sub(1).min(n - 2))
    }

    // The isotope's own grid interval for union interval `union_index`
    #[inline]
    pub fn isotope_index(&self, isotope: usize, union_index: usize) -> usize {
        self.index_map[isotope][union_index] as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::interpolation::InterpolationScheme;
    use crate::nuclear_data::ReactionData;

    fn table(energy: Vec<f64>) -> CrossSectionTable {
        let xs = vec![1.0; energy.len()];
        CrossSectionTable::new(energy, None, &[ReactionData { mt: 2, q_value: 0.0, threshold_index: 0, xs }], InterpolationScheme::LinLin)
            .unwrap()
    }

    #[test]
    fn test_union_and_index_map() {
        let a = table(vec![1.0, 3.0, 5.0]);
        let b = table(vec![2.0, 3.0, 4.0, 6.0]);
        let grid = UnionizedGrid::new(&[&a, &b]);
        assert_eq!(grid.energy(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        // Every energy maps onto the interval a direct search finds
        for energy in [1.0, 1.5, 2.0, 2.5, 3.0, 3.7, 4.0, 4.5, 5.0, 5.5, 6.0] {
            let j = grid.locate(energy).unwrap();
            for (isotope, own) in [&a, &b].iter().enumerate() {
                if let Some(expected) = own.locate(energy) {
                    assert_eq!(grid.isotope_index(isotope, j), expected, "isotope {} at {}", isotope, energy);
                }
            }
        }
        assert_eq!(grid.locate(0.5), None);
        assert_eq!(grid.locate(6.5), None);
        assert_eq!(grid.locate(6.0), Some(4));
    }

    #[test]
    fn test_common_energy_range() {
        let a = table(vec![1.0, 3.0, 5.0]);
        let b = table(vec![2.0, 3.0, 4.0, 6.0]);
        let range = EnergyRange::common(&[&a, &b]);
        assert_eq!(range, EnergyRange { min: 2.0, max: 5.0 });
        assert!(range.contains(2.0) && range.contains(5.0) && !range.contains(5.5));
        assert_eq!(range.clamp(1.0), 2.0);
        assert_eq!(range.clamp(7.0), 5.0);
        assert_eq!(range.clamp(3.3), 3.3);

        let c = table(vec![5.5, 8.0]);
        assert!(EnergyRange::common(&[&a, &c]).is_empty());
        assert_eq!(EnergyRange::common(&[]), EnergyRange::default());
    }
}
