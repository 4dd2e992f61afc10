use std::f64::consts::PI;

use crate::nuclear_data::{sample_maxwell, EnergyRange, FissionSpectrum};
use crate::random::RandomSource;
use crate::utils::{isotropic_direction, rotate_direction};

//=====================================================================
// Collision kinematics and weight games. Every function takes its
// randomness from a RandomSource.
//=====================================================================

// Sampled energies outside the data range are redrawn this many times
// before being clamped
pub const ENERGY_RESAMPLE_LIMIT: usize = 100;

// Outgoing energy and direction of a scattering event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outgoing {
    pub energy: f64,
    pub direction: [f64; 3],
}

// Two-body elastic scattering off a target at rest, isotropic in the
// centre of mass frame. Two draws.
pub fn elastic_scatter<R: RandomSource + ?Sized>(awr: f64, energy: f64, direction: [f64; 3], rng: &mut R) -> Outgoing {
    let mu_cm = 2.0 * rng.next_unit().value() - 1.0;
    let phi = 2.0 * PI * rng.next_unit().value();

    let a = awr;
    let a2 = a * a + 2.0 * a * mu_cm + 1.0;
    let energy_out = energy * a2 / ((a + 1.0) * (a + 1.0));
    let mu_lab = if a2 > 0.0 { (1.0 + a * mu_cm) / a2.sqrt() } else { 0.0 };
    Outgoing { energy: energy_out, direction: rotate_direction(direction, mu_lab, phi) }
}

// Discrete level inelastic scattering (ENDF law 3) with the level's
// Q value, isotropic in the centre of mass frame. Two draws. None when the
// incident energy cannot excite the level.
pub fn inelastic_level_scatter<R: RandomSource + ?Sized>(
    awr: f64,
    q_value: f64,
    energy: f64,
    direction: [f64; 3],
    rng: &mut R,
) -> Option<Outgoing> {
    let a = awr;
    let available = energy + (a + 1.0) / a * q_value;
    if available <= 0.0 {
        return None;
    }
    let energy_cm = (a / (a + 1.0)).powi(2) * available;

    let mu_cm = 2.0 * rng.next_unit().value() - 1.0;
    let phi = 2.0 * PI * rng.next_unit().value();

    let energy_out = energy_cm + (energy + 2.0 * mu_cm * (a + 1.0) * (energy * energy_cm).sqrt()) / ((a + 1.0) * (a + 1.0));
    if !(energy_out > 0.0) {
        return None;
    }
    let mu_lab = mu_cm * (energy_cm / energy_out).sqrt() + (energy / energy_out).sqrt() / (a + 1.0);
    Some(Outgoing { energy: energy_out, direction: rotate_direction(direction, mu_lab, phi) })
}

// One of the neutrons leaving an (n,xn) reaction: the energy left after
// the Q value is shared evenly, directions are isotropic. Two draws.
pub fn multiplying_emission<R: RandomSource + ?Sized>(
    energy: f64,
    q_value: f64,
    multiplicity: usize,
    floor: f64,
    rng: &mut R,
) -> Outgoing {
    let energy_out = (energy + q_value).max(floor) / multiplicity.max(1) as f64;
    Outgoing { energy: energy_out.max(floor), direction: isotropic_direction(rng) }
}

// Bound elastic scattering keeps the energy, isotropic direction. Two draws.
pub fn thermal_elastic<R: RandomSource + ?Sized>(energy: f64, rng: &mut R) -> Outgoing {
    Outgoing { energy, direction: isotropic_direction(rng) }
}

// Bound inelastic scattering leaves with a Maxwellian energy at the
// table's kT. Five draws.
#[allow(non_snake_case)]
pub fn thermal_inelastic<R: RandomSource + ?Sized>(kT: f64, rng: &mut R) -> Outgoing {
    let energy = sample_maxwell(kT, rng);
    Outgoing { energy, direction: isotropic_direction(rng) }
}

// Expected number of fission neutrons nu * w, rounded stochastically
pub fn fission_site_count(nu: f64, weight: f64, xi: f64) -> usize {
    let expected = nu * weight;
    if !(expected > 0.0) {
        return 0;
    }
    (expected + xi).floor() as usize
}

// Energy drawn from `sample` inside `range`, redrawn a bounded number of
// times before falling back to clamping.
pub fn sample_in_range<R, F>(range: EnergyRange, rng: &mut R, mut sample: F) -> f64
where
    R: RandomSource + ?Sized,
    F: FnMut(&mut R) -> f64,
{
    let mut energy = sample(rng);
    for _ in 1..ENERGY_RESAMPLE_LIMIT {
        if range.contains(energy) {
            break;
        }
        energy = sample(rng);
    }
    range.clamp(energy)
}

pub fn sample_fission_energy<R: RandomSource + ?Sized>(spectrum: &FissionSpectrum, range: EnergyRange, rng: &mut R) -> f64 {
    sample_in_range(range, rng, |rng| spectrum.sample(rng))
}

// Russian roulette on a low weight particle. Survivors carry `survival`.
pub fn russian_roulette(weight: f64, survival: f64, xi: f64) -> Option<f64> {
    (xi * survival < weight).then_some(survival)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use crate::nuclear_data::{U235_WATT_A, U235_WATT_B};
    use crate::random::HistoryRng;
    use crate::utils::{dot, MockRng};

    #[test]
    fn test_elastic_extremes() {
        // Head-on collision with hydrogen-like target stops the neutron
        let out = elastic_scatter(1.0, 2.0, [0.0, 0.0, 1.0], &mut MockRng::new(vec![0.0, 0.3]));
        assert_abs_diff_eq!(out.energy, 0.0, epsilon = 1e-15);

        // Forward scattering keeps energy and direction
        let out = elastic_scatter(12.0, 2.0, [0.0, 0.0, 1.0], &mut MockRng::new(vec![0.999_999_999, 0.3]));
        assert_relative_eq!(out.energy, 2.0, max_relative = 1e-8);
        assert_relative_eq!(out.direction[2], 1.0, max_relative = 1e-8);

        // Backscatter off a heavy nucleus loses ((A-1)/(A+1))^2
        let out = elastic_scatter(12.0, 2.0, [1.0, 0.0, 0.0], &mut MockRng::new(vec![0.0, 0.0]));
        assert_relative_eq!(out.energy, 2.0 * (11.0f64 / 13.0).powi(2), max_relative = 1e-12);
        assert_relative_eq!(out.direction[0], -1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_elastic_mean_energy_loss() {
        // Mean of E'/E is (A^2 + 1) / (A + 1)^2 for isotropic CM scattering
        let a: f64 = 2.0;
        let mut rng = HistoryRng::for_history(1, 0);
        let n = 100_000;
        let mean: f64 = (0..n).map(|_| elastic_scatter(a, 1.0, [0.0, 1.0, 0.0], &mut rng).energy).sum::<f64>() / n as f64;
        assert_relative_eq!(mean, (a * a + 1.0) / ((a + 1.0) * (a + 1.0)), max_relative = 0.01);
    }

    #[test]
    fn test_inelastic_level() {
        let u = [0.0, 0.0, 1.0];
        // Below threshold
        assert!(inelastic_level_scatter(233.0, -0.5, 0.4, u, &mut MockRng::new(vec![])).is_none());

        let mut rng = HistoryRng::for_history(2, 0);
        for _ in 0..1000 {
            let out = inelastic_level_scatter(233.0, -0.5, 2.0, u, &mut rng).unwrap();
            assert!(out.energy < 2.0 - 0.49 && out.energy > 0.0);
            assert_abs_diff_eq!(dot(&out.direction, &out.direction), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_multiplying_emission() {
        let out = multiplying_emission(10.0, -2.0, 2, 1e-11, &mut MockRng::new(vec![0.5, 0.5]));
        assert_abs_diff_eq!(out.energy, 4.0);
        let out = multiplying_emission(1.0, -2.0, 2, 1e-11, &mut MockRng::new(vec![0.5, 0.5]));
        assert!(out.energy >= 1e-11);
    }

    #[test]
    fn test_thermal_scattering() {
        let out = thermal_elastic(2e-8, &mut MockRng::new(vec![0.5, 0.25]));
        assert_eq!(out.energy, 2e-8);

        let mut rng = MockRng::new(vec![0.5, 0.5, 0.0, 0.5, 0.25]);
        let out = thermal_inelastic(2.53e-8, &mut rng);
        assert_relative_eq!(out.energy, -2.53e-8 * (0.5f64.ln() + 0.5f64.ln()), max_relative = 1e-12);
        assert_eq!(rng.consumed(), 5);
    }

    #[test]
    fn test_fission_site_count() {
        assert_eq!(fission_site_count(2.5, 1.0, 0.0), 2);
        assert_eq!(fission_site_count(2.5, 1.0, 0.5), 3);
        assert_eq!(fission_site_count(2.5, 0.0, 0.9), 0);
        assert_eq!(fission_site_count(2.5, 0.2, 0.49), 0);

        // Expected count equals nu * w
        let mut rng = HistoryRng::for_history(3, 0);
        let n = 100_000;
        let total: usize = (0..n).map(|_| fission_site_count(2.43, 0.7, rng.next_unit().value())).sum();
        assert_relative_eq!(total as f64 / n as f64, 2.43 * 0.7, max_relative = 0.01);
    }

    #[test]
    fn test_fission_energy_bounded() {
        let spectrum = FissionSpectrum::Watt { a: U235_WATT_A, b: U235_WATT_B };
        let mut rng = HistoryRng::for_history(4, 0);
        for _ in 0..10_000 {
            let energy = sample_fission_energy(&spectrum, EnergyRange { min: 1e-11, max: 3.0 }, &mut rng);
            assert!((1e-11..=3.0).contains(&energy));
        }
    }

    #[test]
    fn test_sample_in_range_redraws_then_clamps() {
        let range = EnergyRange { min: 1.0, max: 2.0 };
        let mut rng = MockRng::new(vec![0.1, 0.9, 0.5]);
        // 0.1 * 10 and 0.9 * 10 fall outside, 0.5 * 3 is kept
        let mut scale = [10.0, 10.0, 3.0].into_iter();
        let energy = sample_in_range(range, &mut rng, |rng| rng.next_unit().value() * scale.next().unwrap_or(1.0));
        assert_abs_diff_eq!(energy, 1.5, epsilon = 1e-12);
        assert_eq!(rng.consumed(), 3);

        // Never inside: clamped after the limit
        let mut rng = HistoryRng::for_history(9, 0);
        let mut draws = 0;
        let energy = sample_in_range(range, &mut rng, |_| {
            draws += 1;
            50.0
        });
        assert_eq!(energy, 2.0);
        assert_eq!(draws, ENERGY_RESAMPLE_LIMIT);
    }

    #[test]
    fn test_russian_roulette() {
        assert_eq!(russian_roulette(0.1, 1.0, 0.05), Some(1.0));
        assert_eq!(russian_roulette(0.1, 1.0, 0.2), None);

        // Unbiased in expectation
        let mut rng = HistoryRng::for_history(5, 0);
        let n = 100_000;
        let total: f64 = (0..n).filter_map(|_| russian_roulette(0.2, 0.8, rng.next_unit().value())).sum();
        assert_relative_eq!(total / n as f64, 0.2, max_relative = 0.02);
    }
}
