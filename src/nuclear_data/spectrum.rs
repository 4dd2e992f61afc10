use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::random::RandomSource;

// Watt parameters for thermal fission of U-235 (a in MeV, b in 1/MeV)
pub const U235_WATT_A: f64 = 0.988;
pub const U235_WATT_B: f64 = 2.249;

//=====================================================================
// Secondary neutron energy spectra for fission.
//=====================================================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FissionSpectrum {
    Watt { a: f64, b: f64 },
    Maxwell { theta: f64 },
}

impl Default for FissionSpectrum {
    fn default() -> Self {
        FissionSpectrum::Watt { a: U235_WATT_A, b: U235_WATT_B }
    }
}

impl FissionSpectrum {
    pub fn sample<R: RandomSource + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            FissionSpectrum::Watt { a, b } => sample_watt(a, b, rng),
            FissionSpectrum::Maxwell { theta } => sample_maxwell(theta, rng),
        }
    }

    pub fn mean(&self) -> f64 {
        match *self {
            FissionSpectrum::Watt { a, b } => 1.5 * a + 0.25 * a * a * b,
            FissionSpectrum::Maxwell { theta } => 1.5 * theta,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let ok = match *self {
            FissionSpectrum::Watt { a, b } => a > 0.0 && b >= 0.0 && a.is_finite() && b.is_finite(),
            FissionSpectrum::Maxwell { theta } => theta > 0.0 && theta.is_finite(),
        };
        if ok { Ok(()) } else { Err(format!("invalid fission spectrum parameters {:?}", self)) }
    }
}

// Maxwellian with temperature theta (MeV), three draws
pub fn sample_maxwell<R: RandomSource + ?Sized>(theta: f64, rng: &mut R) -> f64 {
    let r1 = rng.next_unit().open_below();
    let r2 = rng.next_unit().open_below();
    let c = (0.5 * PI * rng.next_unit().value()).cos();
    -theta * (r1.ln() + r2.ln() * c * c)
}

// Watt spectrum through a Maxwellian sample, four draws
pub fn sample_watt<R: RandomSource + ?Sized>(a: f64, b: f64, rng: &mut R) -> f64 {
    let w = sample_maxwell(a, rng);
    let xi = rng.next_unit().value();
    w + 0.25 * a * a * b + (2.0 * xi - 1.0) * (a * a * b * w).sqrt()
}
