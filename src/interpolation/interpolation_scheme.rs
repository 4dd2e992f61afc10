use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

//=====================================================================
// Interpolation laws, numbered as in the ENDF standard.
//=====================================================================
#[derive(
    Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Hash,
    Display, EnumIter, IntoPrimitive, TryFromPrimitive, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum InterpolationScheme {
    Histogram = 1,
    LinLin = 2,
    LinLog = 3,
    LogLin = 4,
    LogLog = 5,
    Gamow = 6,
}

impl Default for InterpolationScheme {
    fn default() -> Self {
        InterpolationScheme::LinLin
    }
}

impl InterpolationScheme {
    // False only for Gamow, which table construction rejects
    pub fn is_supported(&self) -> bool {
        !matches!(self, InterpolationScheme::Gamow)
    }

    // Interpolate between (x0, y0) and (x1, y1) at x, with x0 <= x <= x1.
    #[inline]
    pub fn interpolate(&self, x0: f64, x1: f64, y0: f64, y1: f64, x: f64) -> f64 {
        if x1 == x0 {
            return y0;
        }
        match self {
            InterpolationScheme::Histogram => y0,
            InterpolationScheme::LinLin => y0 + (y1 - y0) * (x - x0) / (x1 - x0),
            InterpolationScheme::LinLog => y0 + (y1 - y0) * (x / x0).ln() / (x1 / x0).ln(),
            InterpolationScheme::LogLin => {
                if y0 <= 0.0 || y1 <= 0.0 {
                    // A log law through zero degenerates to linear
                    return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
                }
                y0 * ((x - x0) * (y1 / y0).ln() / (x1 - x0)).exp()
            }
            InterpolationScheme::LogLog => {
                if y0 <= 0.0 || y1 <= 0.0 {
                    return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
                }
                y0 * ((x / x0).ln() * (y1 / y0).ln() / (x1 / x0).ln()).exp()
            }
            // Rejected at load time, see is_supported
            InterpolationScheme::Gamow => y0 + (y1 - y0) * (x - x0) / (x1 - x0),
        }
    }
}
