use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bank::{Site, SourceBank};
use crate::error::ConfigurationError;
use crate::geometry::{Geometry, TINY_BIT};
use crate::nuclear_data::{sample_maxwell, sample_watt, EnergyRange, U235_WATT_A, U235_WATT_B};
use crate::random::{HistoryRng, RandomSource, RngStream};
use crate::transport::physics::sample_in_range;
use crate::utils::{isotropic_direction, rotate_direction};

// Rejection sampling attempts for a cell source before giving up
pub const MAX_REJECTIONS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpatialDistribution {
    Point { position: [f64; 3] },
    // Uniform in an axis aligned box
    Box { lower_left: [f64; 3], upper_right: [f64; 3] },
    // Uniform in a cell, sampled by rejection from a box enclosing it
    Cell { cell: u32, lower_left: [f64; 3], upper_right: [f64; 3] },
    // Uniform on a sphere, entering it with a cosine distribution
    Surface { center: [f64; 3], radius: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceEnergy {
    Monoenergetic { energy: f64 },
    Watt { a: f64, b: f64 },
    Maxwell { theta: f64 },
}

impl Default for SourceEnergy {
    fn default() -> Self {
        SourceEnergy::Watt { a: U235_WATT_A, b: U235_WATT_B }
    }
}

impl SourceEnergy {
    // Spectra are redrawn into `range`; a fixed energy is checked by `Source::validate`
    pub fn sample<R: RandomSource + ?Sized>(&self, range: EnergyRange, rng: &mut R) -> f64 {
        match *self {
            SourceEnergy::Monoenergetic { energy } => energy,
            SourceEnergy::Watt { a, b } => sample_in_range(range, rng, |rng| sample_watt(a, b, rng)),
            SourceEnergy::Maxwell { theta } => sample_in_range(range, rng, |rng| sample_maxwell(theta, rng)),
        }
    }
}

//=====================================================================
// External neutron source, also used for the initial fission source
// guess of a criticality run.
//=====================================================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub space: SpatialDistribution,
    #[serde(default)]
    pub energy: SourceEnergy,
}

impl Source {
    pub fn new(space: SpatialDistribution, energy: SourceEnergy) -> Self {
        Self { space, energy }
    }

    pub fn validate(&self, geometry: &Geometry, range: EnergyRange) -> Result<(), ConfigurationError> {
        let invalid = |message: String| Err(ConfigurationError::InvalidSource(message));
        match self.space {
            SpatialDistribution::Point { position } => {
                if !position.iter().all(|x| x.is_finite()) {
                    return invalid(format!("point {:?} is not finite", position));
                }
            }
            SpatialDistribution::Box { lower_left, upper_right } => check_box(&lower_left, &upper_right)?,
            SpatialDistribution::Cell { cell, lower_left, upper_right } => {
                if geometry.cell_index(cell).is_none() {
                    return invalid(format!("cell {} does not exist", cell));
                }
                check_box(&lower_left, &upper_right)?;
            }
            SpatialDistribution::Surface { radius, .. } => {
                if !(radius > 0.0) || !radius.is_finite() {
                    return invalid(format!("sphere radius {} must be positive", radius));
                }
            }
        }

        let energy_ok = match self.energy {
            SourceEnergy::Monoenergetic { energy } => energy > 0.0 && energy.is_finite(),
            SourceEnergy::Watt { a, b } => a > 0.0 && b >= 0.0 && a.is_finite() && b.is_finite(),
            SourceEnergy::Maxwell { theta } => theta > 0.0 && theta.is_finite(),
        };
        if !energy_ok {
            return invalid(format!("invalid energy distribution {:?}", self.energy));
        }
        if let SourceEnergy::Monoenergetic { energy } = self.energy {
            if !range.contains(energy) {
                return invalid(format!(
                    "energy {:e} MeV is outside the nuclear data range {:e} to {:e} MeV",
                    energy, range.min, range.max
                ));
            }
        }
        Ok(())
    }

    pub fn sample<R: RandomSource + ?Sized>(
        &self,
        geometry: &Geometry,
        range: EnergyRange,
        rng: &mut R,
    ) -> Result<Site, ConfigurationError> {
        let (position, direction) = match self.space {
            SpatialDistribution::Point { position } => (position, isotropic_direction(rng)),
            SpatialDistribution::Box { lower_left, upper_right } => {
                (uniform_in_box(&lower_left, &upper_right, rng), isotropic_direction(rng))
            }
            SpatialDistribution::Cell { cell, lower_left, upper_right } => {
                let index = geometry
                    .cell_index(cell)
                    .ok_or_else(|| ConfigurationError::InvalidSource(format!("cell {} does not exist", cell)))?;
                let direction = isotropic_direction(rng);
                let position = (0..MAX_REJECTIONS)
                    .map(|_| uniform_in_box(&lower_left, &upper_right, rng))
                    .find(|p| geometry.find_cell(p, &direction, None).is_ok_and(|path| path.contains(&index)))
                    .ok_or_else(|| {
                        ConfigurationError::InvalidSource(format!(
                            "no point of cell {} found in {} tries, check its bounding box",
                            cell, MAX_REJECTIONS
                        ))
                    })?;
                (position, direction)
            }
            SpatialDistribution::Surface { center, radius } => {
                let normal = isotropic_direction(rng);
                let inward = [-normal[0], -normal[1], -normal[2]];
                let mu = rng.next_unit().value().sqrt();
                let phi = 2.0 * std::f64::consts::PI * rng.next_unit().value();
                let direction = rotate_direction(inward, mu, phi);
                let position = [
                    center[0] + radius * normal[0] + TINY_BIT * direction[0],
                    center[1] + radius * normal[1] + TINY_BIT * direction[1],
                    center[2] + radius * normal[2] + TINY_BIT * direction[2],
                ];
                (position, direction)
            }
        };
        Ok(Site::new(position, direction, self.energy.sample(range, rng)))
    }

    // `n_particles` independent source sites. Site i draws from stream i.
    pub fn sample_bank(
        &self,
        geometry: &Geometry,
        range: EnergyRange,
        n_particles: usize,
        seed: u64,
    ) -> Result<SourceBank, ConfigurationError> {
        let sites = (0..n_particles)
            .into_par_iter()
            .map(|index| self.sample(geometry, range, &mut HistoryRng::new(seed, RngStream::Source, index as u64)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SourceBank::from(sites))
    }
}

fn check_box(lower_left: &[f64; 3], upper_right: &[f64; 3]) -> Result<(), ConfigurationError> {
    let ordered = lower_left.iter().zip(upper_right).all(|(lo, hi)| lo.is_finite() && hi.is_finite() && lo < hi);
    if ordered {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidSource(format!("box {:?} to {:?} is empty", lower_left, upper_right)))
    }
}

fn uniform_in_box<R: RandomSource + ?Sized>(lower_left: &[f64; 3], upper_right: &[f64; 3], rng: &mut R) -> [f64; 3] {
    let mut point = [0.0; 3];
    for axis in 0..3 {
        point[axis] = lower_left[axis] + rng.next_unit().value() * (upper_right[axis] - lower_left[axis]);
    }
    point
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use crate::geometry::{BoundaryCondition, CellDefinition, FillDefinition, Surface, SurfaceKind};
    use crate::utils::{dot, MockRng};

    fn two_shells() -> Geometry {
        let surfaces = vec![
            Surface::new(1, SurfaceKind::Sphere { x0: 0.0, y0: 0.0, z0: 0.0, r: 1.0 }, BoundaryCondition::Transmit)
                .unwrap(),
            Surface::new(2, SurfaceKind::Sphere { x0: 0.0, y0: 0.0, z0: 0.0, r: 2.0 }, BoundaryCondition::Vacuum)
                .unwrap(),
        ];
        let cells = vec![
            CellDefinition::new(1, "-1", FillDefinition::Void),
            CellDefinition::new(2, "1 -2", FillDefinition::Void),
        ];
        Geometry::new(surfaces, &cells, |_| None).unwrap()
    }

    #[test]
    fn test_point_source() {
        let source = Source::new(
            SpatialDistribution::Point { position: [1.0, 2.0, 3.0] },
            SourceEnergy::Monoenergetic { energy: 14.1 },
        );
        let mut rng = MockRng::new(vec![0.5, 0.0]);
        let site = source.sample(&two_shells(), EnergyRange::default(), &mut rng).unwrap();
        assert_eq!(site.position, [1.0, 2.0, 3.0]);
        assert_eq!(site.energy, 14.1);
        assert_eq!(site.weight, 1.0);
        assert_abs_diff_eq!(site.direction[0], 1.0, epsilon = 1e-12);
        assert_eq!(rng.consumed(), 2);
    }

    #[test]
    fn test_cell_source_rejects_outside_points() {
        let geometry = two_shells();
        let source = Source::new(
            SpatialDistribution::Cell { cell: 2, lower_left: [-2.0; 3], upper_right: [2.0; 3] },
            SourceEnergy::default(),
        );
        source.validate(&geometry, EnergyRange::default()).unwrap();
        let bank = source.sample_bank(&geometry, EnergyRange::default(), 500, 17).unwrap();
        assert_eq!(bank.len(), 500);
        for site in bank.iter() {
            let r = dot(&site.position, &site.position).sqrt();
            assert!(r > 1.0 && r < 2.0, "radius {}", r);
            assert!(site.energy > 0.0);
        }

        // A bounding box that misses the cell
        let missing = Source::new(
            SpatialDistribution::Cell { cell: 1, lower_left: [5.0; 3], upper_right: [6.0; 3] },
            SourceEnergy::default(),
        );
        let mut rng = HistoryRng::new(1, RngStream::Source, 0);
        assert!(matches!(missing.sample(&geometry, EnergyRange::default(), &mut rng), Err(ConfigurationError::InvalidSource(_))));
    }

    #[test]
    fn test_surface_source_points_inward() {
        let source = Source::new(
            SpatialDistribution::Surface { center: [0.0; 3], radius: 2.0 },
            SourceEnergy::Maxwell { theta: 1.0 },
        );
        let geometry = two_shells();
        let bank = source.sample_bank(&geometry, EnergyRange::default(), 1000, 3).unwrap();
        let mut mean_cosine = 0.0;
        for site in bank.iter() {
            assert_relative_eq!(dot(&site.position, &site.position).sqrt(), 2.0, max_relative = 1e-6);
            let cosine = -dot(&site.position, &site.direction) / 2.0;
            assert!(cosine >= -1e-8);
            mean_cosine += cosine / 1000.0;
        }
        // Cosine distributed: E[mu] = 2/3
        assert_relative_eq!(mean_cosine, 2.0 / 3.0, max_relative = 0.05);
    }

    #[test]
    fn test_bank_is_reproducible() {
        let geometry = two_shells();
        let source = Source::new(
            SpatialDistribution::Box { lower_left: [-1.0; 3], upper_right: [1.0; 3] },
            SourceEnergy::default(),
        );
        let range = EnergyRange::default();
        assert_eq!(source.sample_bank(&geometry, range, 64, 5).unwrap(), source.sample_bank(&geometry, range, 64, 5).unwrap());
    }

    #[test]
    fn test_validate() {
        let geometry = two_shells();
        let bad_box = Source::new(
            SpatialDistribution::Box { lower_left: [1.0; 3], upper_right: [0.0; 3] },
            SourceEnergy::default(),
        );
        assert!(bad_box.validate(&geometry, EnergyRange::default()).is_err());
        let bad_cell = Source::new(
            SpatialDistribution::Cell { cell: 9, lower_left: [0.0; 3], upper_right: [1.0; 3] },
            SourceEnergy::default(),
        );
        assert!(bad_cell.validate(&geometry, EnergyRange::default()).is_err());
        let bad_energy = Source::new(
            SpatialDistribution::Point { position: [0.0; 3] },
            SourceEnergy::Monoenergetic { energy: -1.0 },
        );
        assert!(bad_energy.validate(&geometry, EnergyRange::default()).is_err());
    }

    #[test]
    fn test_energy_outside_data_range() {
        let geometry = two_shells();
        let range = EnergyRange { min: 1e-11, max: 20.0 };
        let point = |energy: SourceEnergy| Source::new(SpatialDistribution::Point { position: [0.0; 3] }, energy);

        let fusion = point(SourceEnergy::Monoenergetic { energy: 30.0 });
        assert!(fusion.validate(&geometry, EnergyRange::default()).is_ok());
        assert!(matches!(fusion.validate(&geometry, range), Err(ConfigurationError::InvalidSource(_))));
        assert!(point(SourceEnergy::Monoenergetic { energy: 20.0 }).validate(&geometry, range).is_ok());

        // A hard Watt spectrum puts a good share of its draws above 3 MeV
        let narrow = EnergyRange { min: 1e-11, max: 3.0 };
        let hard = point(SourceEnergy::Watt { a: 2.0, b: 1.0 });
        hard.validate(&geometry, narrow).unwrap();
        let bank = hard.sample_bank(&geometry, narrow, 2000, 8).unwrap();
        assert!(bank.iter().all(|site| narrow.contains(site.energy)));
        let maxwell = point(SourceEnergy::Maxwell { theta: 4.0 }).sample_bank(&geometry, narrow, 2000, 8).unwrap();
        assert!(maxwell.iter().all(|site| narrow.contains(site.energy)));
    }

    #[test]
    fn test_source_from_json() {
        let json = r#"{"space": {"type": "box", "lower_left": [0, 0, 0], "upper_right": [1, 1, 1]}}"#;
        let source: Source = serde_json::from_str(json).unwrap();
        assert_eq!(source.energy, SourceEnergy::default());
        assert!(matches!(source.space, SpatialDistribution::Box { .. }));
    }
}
