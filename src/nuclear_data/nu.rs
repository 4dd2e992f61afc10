use serde::{Deserialize, Serialize};

use crate::interpolation::{InterpolationError, InterpolationScheme, InterpolationTable};

//=====================================================================
// Average number of neutrons released per fission.
//
// Nu-bar may be given in one of two forms, a polynomial in the incident
// energy or a tabulated function of it.
//=====================================================================

// Nu-bar as supplied with an isotope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NuData {
    Polynomial {
        coefficients: Vec<f64>,
    },
    Tabulated {
        // ENDF style region ends, empty for a single lin-lin region
        #[serde(default)]
        breakpoints: Vec<usize>,
        #[serde(default)]
        schemes: Vec<InterpolationScheme>,
        energy: Vec<f64>,
        nu: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum NuFormulation {
    Polynomial(PolynomialNu),
    Tabulated(TabulatedNu),
}

impl NuFormulation {
    pub fn from_data(data: &NuData) -> Result<Self, InterpolationError> {
        match data {
            NuData::Polynomial { coefficients } => {
                if coefficients.is_empty() {
                    return Err(InterpolationError::Empty);
                }
                Ok(NuFormulation::Polynomial(PolynomialNu { coefficients: coefficients.clone() }))
            }
            NuData::Tabulated { breakpoints, schemes, energy, nu } => {
                let table = if breakpoints.is_empty() {
                    InterpolationTable::from_x_and_y(energy, nu, InterpolationScheme::default())?
                } else {
                    InterpolationTable::from_breakpoints(breakpoints, schemes, energy, nu)?
                };
                Ok(NuFormulation::Tabulated(TabulatedNu { table }))
            }
        }
    }

    pub fn evaluate(&self, energy: f64) -> Result<f64, InterpolationError> {
        match self {
            NuFormulation::Polynomial(nu) => Ok(nu.evaluate(energy)),
            NuFormulation::Tabulated(nu) => nu.evaluate(energy),
        }
    }

    // Energy range over which the formulation is defined
    pub fn range(&self) -> (f64, f64) {
        match self {
            NuFormulation::Polynomial(_) => (f64::NEG_INFINITY, f64::INFINITY),
            NuFormulation::Tabulated(nu) => (nu.table.x_min(), nu.table.x_max()),
        }
    }
}

// Polynomial formulation for nu-bar
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialNu {
    pub coefficients: Vec<f64>,
}

impl PolynomialNu {
    // Evaluate the polynomial at an energy (given in MeV)
    pub fn evaluate(&self, energy: f64) -> f64 {
        self.coefficients.iter().rev().fold(0.0, |nu, coefficient| nu * energy + coefficient)
    }
}

// Tabulated formulation for nu-bar
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedNu {
    pub table: InterpolationTable,
}

impl TabulatedNu {
    // Evaluate the tabulated nu at an energy (given in MeV)
    pub fn evaluate(&self, energy: f64) -> Result<f64, InterpolationError> {
        self.table.interpolate(energy)
    }
}
