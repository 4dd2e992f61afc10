use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, IntoStaticStr};

use crate::error::ConfigurationError;
use crate::utils::{dot, normalize};

//=====================================================================
// Surfaces bounding the half-spaces cells are built from.
//
// Each surface is a level set f(x, y, z) = 0. The positive half-space is
// f > 0, the negative one f < 0. Quadric surfaces are all handled through
// the same quadratic along a ray, f(p + t u) = a t^2 + 2 k t + c; the
// axis-aligned box is a macrobody with its own slab intersection.
//=====================================================================

// Values of |f| below this are treated as lying on the surface
pub const FP_COINCIDENT: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryCondition {
    #[default]
    Transmit,
    Vacuum,
    Reflect,
}

#[derive(Debug, Clone, PartialEq, IntoStaticStr, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceKind {
    PlaneX { x0: f64 },
    PlaneY { y0: f64 },
    PlaneZ { z0: f64 },
    // a x + b y + c z - d
    Plane { a: f64, b: f64, c: f64, d: f64 },
    CylinderX { y0: f64, z0: f64, r: f64 },
    CylinderY { x0: f64, z0: f64, r: f64 },
    CylinderZ { x0: f64, y0: f64, r: f64 },
    Sphere { x0: f64, y0: f64, z0: f64, r: f64 },
    // Negative inside
    Box { min: [f64; 3], max: [f64; 3] },
    // A x^2 + B y^2 + C z^2 + D xy + E yz + F xz + G x + H y + J z + K
    Quadric { a: f64, b: f64, c: f64, d: f64, e: f64, f: f64, g: f64, h: f64, j: f64, k: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub id: u32,
    #[serde(flatten)]
    pub kind: SurfaceKind,
    #[serde(default)]
    pub boundary: BoundaryCondition,
}

impl Surface {
    pub fn new(id: u32, kind: SurfaceKind, boundary: BoundaryCondition) -> Result<Self, ConfigurationError> {
        let surface = Self { id, kind, boundary };
        surface.validate()?;
        Ok(surface)
    }

    pub fn tag(&self) -> &'static str {
        (&self.kind).into()
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |message: String| ConfigurationError::InvalidSurface { surface: self.id, message };
        let finite = |values: &[f64]| values.iter().all(|v| v.is_finite());

        match &self.kind {
            SurfaceKind::PlaneX { x0: v } | SurfaceKind::PlaneY { y0: v } | SurfaceKind::PlaneZ { z0: v } => {
                if !v.is_finite() {
                    return Err(invalid(format!("{} coefficient must be finite", self.tag())));
                }
            }
            SurfaceKind::Plane { a, b, c, d } => {
                if !finite(&[*a, *b, *c, *d]) {
                    return Err(invalid("plane coefficients must be finite".to_string()));
                }
                if a * a + b * b + c * c == 0.0 {
                    return Err(invalid("plane normal (a, b, c) must not be zero".to_string()));
                }
            }
            SurfaceKind::CylinderX { y0: p, z0: q, r }
            | SurfaceKind::CylinderY { x0: p, z0: q, r }
            | SurfaceKind::CylinderZ { x0: p, y0: q, r } => {
                if !finite(&[*p, *q, *r]) || *r <= 0.0 {
                    return Err(invalid(format!("{} radius must be positive and finite, got {}", self.tag(), r)));
                }
            }
            SurfaceKind::Sphere { x0, y0, z0, r } => {
                if !finite(&[*x0, *y0, *z0, *r]) || *r <= 0.0 {
                    return Err(invalid(format!("sphere radius must be positive and finite, got {}", r)));
                }
            }
            SurfaceKind::Box { min, max } => {
                if !finite(min) || !finite(max) || (0..3).any(|i| min[i] >= max[i]) {
                    return Err(invalid(format!("box bounds {:?} .. {:?} are empty", min, max)));
                }
            }
            SurfaceKind::Quadric { a, b, c, d, e, f, g, h, j, k } => {
                let coefficients = [*a, *b, *c, *d, *e, *f, *g, *h, *j, *k];
                if !finite(&coefficients) {
                    return Err(invalid("quadric coefficients must be finite".to_string()));
                }
                if coefficients[..9].iter().all(|&v| v == 0.0) {
                    return Err(invalid("quadric has no non-constant term".to_string()));
                }
            }
        }
        Ok(())
    }

    // Value of the defining function at a point
    pub fn evaluate(&self, p: &[f64; 3]) -> f64 {
        let [x, y, z] = *p;
        match &self.kind {
            SurfaceKind::PlaneX { x0 } => x - x0,
            SurfaceKind::PlaneY { y0 } => y - y0,
            SurfaceKind::PlaneZ { z0 } => z - z0,
            SurfaceKind::Plane { a, b, c, d } => a * x + b * y + c * z - d,
            SurfaceKind::CylinderX { y0, z0, r } => (y - y0).powi(2) + (z - z0).powi(2) - r * r,
            SurfaceKind::CylinderY { x0, z0, r } => (x - x0).powi(2) + (z - z0).powi(2) - r * r,
            SurfaceKind::CylinderZ { x0, y0, r } => (x - x0).powi(2) + (y - y0).powi(2) - r * r,
            SurfaceKind::Sphere { x0, y0, z0, r } => {
                (x - x0).powi(2) + (y - y0).powi(2) + (z - z0).powi(2) - r * r
            }
            SurfaceKind::Box { min, max } => (0..3)
                .map(|i| {
                    let center = 0.5 * (min[i] + max[i]);
                    let half = 0.5 * (max[i] - min[i]);
                    (p[i] - center).abs() - half
                })
                .fold(f64::NEG_INFINITY, f64::max),
            SurfaceKind::Quadric { a, b, c, d, e, f, g, h, j, k } => {
                x * (a * x + d * y + g) + y * (b * y + e * z + h) + z * (c * z + f * x + j) + k
            }
        }
    }

    // Gradient of the defining function, not normalized
    pub fn normal(&self, p: &[f64; 3]) -> [f64; 3] {
        let [x, y, z] = *p;
        match &self.kind {
            SurfaceKind::PlaneX { .. } => [1.0, 0.0, 0.0],
            SurfaceKind::PlaneY { .. } => [0.0, 1.0, 0.0],
            SurfaceKind::PlaneZ { .. } => [0.0, 0.0, 1.0],
            SurfaceKind::Plane { a, b, c, .. } => [*a, *b, *c],
            SurfaceKind::CylinderX { y0, z0, .. } => [0.0, 2.0 * (y - y0), 2.0 * (z - z0)],
            SurfaceKind::CylinderY { x0, z0, .. } => [2.0 * (x - x0), 0.0, 2.0 * (z - z0)],
            SurfaceKind::CylinderZ { x0, y0, .. } => [2.0 * (x - x0), 2.0 * (y - y0), 0.0],
            SurfaceKind::Sphere { x0, y0, z0, .. } => [2.0 * (x - x0), 2.0 * (y - y0), 2.0 * (z - z0)],
            SurfaceKind::Box { min, max } => {
                // Normal of the face whose slab is closest to being violated
                let mut best_axis = 0;
                let mut best_value = f64::NEG_INFINITY;
                let mut sign = 1.0;
                for i in 0..3 {
                    let center = 0.5 * (min[i] + max[i]);
                    let value = (p[i] - center).abs() - 0.5 * (max[i] - min[i]);
                    if value > best_value {
                        best_value = value;
                        best_axis = i;
                        sign = if p[i] >= center { 1.0 } else { -1.0 };
                    }
                }
                let mut n = [0.0; 3];
                n[best_axis] = sign;
                n
            }
            SurfaceKind::Quadric { a, b, c, d, e, f, g, h, j, .. } => [
                2.0 * a * x + d * y + f * z + g,
                2.0 * b * y + d * x + e * z + h,
                2.0 * c * z + e * y + f * x + j,
            ],
        }
    }

    // Which side of the surface the point is on. On the surface, or on the
    // surface just crossed, the side is the one the direction points into.
    pub fn sense(&self, p: &[f64; 3], u: &[f64; 3], on_surface: bool) -> bool {
        let f = self.evaluate(p);
        if on_surface || f.abs() < FP_COINCIDENT {
            return dot(&self.normal(p), u) > 0.0;
        }
        f > 0.0
    }

    // Distance along u to the next crossing of the surface. `coincident` marks
    // the surface the point is known to lie on, whose root at t = 0 is skipped.
    pub fn distance(&self, p: &[f64; 3], u: &[f64; 3], coincident: bool) -> Option<f64> {
        let [x, y, z] = *p;
        let [ux, uy, uz] = *u;
        let (a, k, c) = match &self.kind {
            SurfaceKind::PlaneX { x0 } => (0.0, 0.5 * ux, x - x0),
            SurfaceKind::PlaneY { y0 } => (0.0, 0.5 * uy, y - y0),
            SurfaceKind::PlaneZ { z0 } => (0.0, 0.5 * uz, z - z0),
            SurfaceKind::Plane { a, b, c, .. } => (0.0, 0.5 * (a * ux + b * uy + c * uz), self.evaluate(p)),
            SurfaceKind::CylinderX { y0, z0, r } => {
                let (dy, dz) = (y - y0, z - z0);
                (uy * uy + uz * uz, dy * uy + dz * uz, dy * dy + dz * dz - r * r)
            }
            SurfaceKind::CylinderY { x0, z0, r } => {
                let (dx, dz) = (x - x0, z - z0);
                (ux * ux + uz * uz, dx * ux + dz * uz, dx * dx + dz * dz - r * r)
            }
            SurfaceKind::CylinderZ { x0, y0, r } => {
                let (dx, dy) = (x - x0, y - y0);
                (ux * ux + uy * uy, dx * ux + dy * uy, dx * dx + dy * dy - r * r)
            }
            SurfaceKind::Sphere { x0, y0, z0, r } => {
                let d = [x - x0, y - y0, z - z0];
                (dot(u, u), dot(&d, u), dot(&d, &d) - r * r)
            }
            SurfaceKind::Box { min, max } => return box_distance(min, max, p, u, coincident),
            SurfaceKind::Quadric { a, b, c, d, e, f, g, h, j, .. } => {
                let quad_a = a * ux * ux + b * uy * uy + c * uz * uz + d * ux * uy + e * uy * uz + f * ux * uz;
                let quad_k = a * x * ux
                    + b * y * uy
                    + c * z * uz
                    + 0.5 * (d * (ux * y + uy * x) + e * (uy * z + uz * y) + f * (ux * z + uz * x) + g * ux + h * uy + j * uz);
                (quad_a, quad_k, self.evaluate(p))
            }
        };
        smallest_positive_root(a, k, c, coincident)
    }

    // Mirror a direction about the surface normal at p. None if the normal
    // vanishes there (e.g. on a cylinder axis).
    pub fn reflect(&self, p: &[f64; 3], u: &[f64; 3]) -> Option<[f64; 3]> {
        let n = self.normal(p);
        let nn = dot(&n, &n);
        if nn == 0.0 || !nn.is_finite() {
            return None;
        }
        let projection = 2.0 * dot(u, &n) / nn;
        normalize([u[0] - projection * n[0], u[1] - projection * n[1], u[2] - projection * n[2]])
    }
}

// Smallest t > 0 with a t^2 + 2 k t + c = 0
fn smallest_positive_root(a: f64, k: f64, c: f64, coincident: bool) -> Option<f64> {
    let on_surface = coincident || c.abs() < FP_COINCIDENT;

    // Linear case, planes or rays parallel to a cylinder axis
    if a.abs() < f64::EPSILON {
        if k == 0.0 || on_surface {
            return None;
        }
        let t = -c / (2.0 * k);
        return (t > 0.0).then_some(t);
    }

    let discriminant = k * k - a * c;
    if discriminant < 0.0 {
        return None;
    }

    // One root sits at t = 0, the other at -2k/a
    if on_surface {
        let t = -2.0 * k / a;
        return (t > 0.0).then_some(t);
    }

    // Numerically stable pair of roots
    let sq = discriminant.sqrt();
    let q = if k >= 0.0 { -(k + sq) } else { -k + sq };
    let r1 = q / a;
    let r2 = if q != 0.0 { c / q } else { r1 };
    let (lo, hi) = if r1 <= r2 { (r1, r2) } else { (r2, r1) };
    if lo > 0.0 {
        Some(lo)
    } else if hi > 0.0 {
        Some(hi)
    } else {
        None
    }
}

// Slab intersection with an axis-aligned box
fn box_distance(min: &[f64; 3], max: &[f64; 3], p: &[f64; 3], u: &[f64; 3], coincident: bool) -> Option<f64> {
    let threshold = if coincident { 1e-12 } else { 0.0 };
    let mut t_near = f64::NEG_INFINITY;
    let mut t_far = f64::INFINITY;
    for i in 0..3 {
        if u[i] == 0.0 {
            if p[i] < min[i] || p[i] > max[i] {
                return None;
            }
            continue;
        }
        let t1 = (min[i] - p[i]) / u[i];
        let t2 = (max[i] - p[i]) / u[i];
        t_near = t_near.max(t1.min(t2));
        t_far = t_far.min(t1.max(t2));
    }
    if t_near > t_far {
        return None;
    }
    if t_near > threshold {
        Some(t_near)
    } else if t_far > threshold {
        Some(t_far)
    } else {
        None
    }
}
