use std::f64::consts::PI;

use crate::random::RandomSource;

//====================================================================
// Assorted helper functions.
//====================================================================

const BOLTZMANN_MEV_PER_K: f64 = 8.617333262e-11;

// Provided a temperature in K, convert to MeV
#[allow(non_snake_case)]
#[inline]
pub fn compute_kT_from_temperature(temperature: f64) -> f64 {
    temperature * BOLTZMANN_MEV_PER_K
}

#[inline]
pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

// Returns None for zero length or non-finite vectors
#[inline]
pub fn normalize(v: [f64; 3]) -> Option<[f64; 3]> {
    let norm = dot(&v, &v).sqrt();
    if !norm.is_finite() || norm == 0.0 {
        return None;
    }
    Some([v[0] / norm, v[1] / norm, v[2] / norm])
}

// Uniform direction on the unit sphere, two draws
pub fn isotropic_direction<R: RandomSource + ?Sized>(rng: &mut R) -> [f64; 3] {
    let mu = 2.0 * rng.next_unit().value() - 1.0;
    let phi = 2.0 * PI * rng.next_unit().value();
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();
    [sin_theta * phi.cos(), sin_theta * phi.sin(), mu]
}

// Rotate a unit direction by polar cosine `mu` about itself, with azimuth `phi`
pub fn rotate_direction(u: [f64; 3], mu: f64, phi: f64) -> [f64; 3] {
    let mu = mu.clamp(-1.0, 1.0);
    let sin_theta = (1.0 - mu * mu).sqrt();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let a = (1.0 - u[2] * u[2]).max(0.0).sqrt();

    let rotated = if a > 1e-10 {
        [
            mu * u[0] + sin_theta * (u[0] * u[2] * cos_phi - u[1] * sin_phi) / a,
            mu * u[1] + sin_theta * (u[1] * u[2] * cos_phi + u[0] * sin_phi) / a,
            mu * u[2] - sin_theta * a * cos_phi,
        ]
    } else {
        // Travelling along z, rotate about x instead
        let b = (1.0 - u[1] * u[1]).max(0.0).sqrt();
        [
            mu * u[0] + sin_theta * (u[0] * u[1] * cos_phi + u[2] * sin_phi) / b,
            mu * u[1] - sin_theta * b * cos_phi,
            mu * u[2] + sin_theta * (u[1] * u[2] * cos_phi - u[0] * sin_phi) / b,
        ]
    };
    normalize(rotated).unwrap_or(u)
}
