use std::ops::Deref;

use thiserror::Error;

use crate::interpolation::{InterpolationRegion, InterpolationScheme, XY};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolationError {
    #[error("Invalid interpolation table: empty")]
    Empty,

    #[error("x={x} is outside of the table range [{min}, {max}]")]
    OutOfRange { x: f64, min: f64, max: f64 },

    #[error("x ({x_len}) and y ({y_len}) vectors must be of the same length")]
    LengthMismatch { x_len: usize, y_len: usize },

    #[error("x values must be non-decreasing, found {previous} followed by {next}")]
    NotMonotonic { previous: f64, next: f64 },

    #[error("Interpolation scheme {0} is not supported")]
    UnsupportedScheme(InterpolationScheme),

    #[error("Breakpoints {breakpoints:?} do not describe {points} points")]
    BadBreakpoints { breakpoints: Vec<usize>, points: usize },
}

//=====================================================================
// Tabulated function y(x) made of one or more interpolation regions.
// Used for nu-bar tables and thermal scattering tables. The large,
// hot cross section tables do their own bracket lookup through the
// unionized grid and only borrow the scheme's pointwise law.
//=====================================================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpolationTable(Vec<InterpolationRegion>);

impl Deref for InterpolationTable {
    type Target = Vec<InterpolationRegion>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl InterpolationTable {
    // Single region table
    pub fn from_x_and_y(
        x: &[f64],
        y: &[f64],
        interpolation_scheme: InterpolationScheme,
    ) -> Result<Self, InterpolationError> {
        Self::from_breakpoints(&[x.len()], &[interpolation_scheme], x, y)
    }

    // Multi region table in ENDF style: `breakpoints` holds the 1-based index
    // of the last point of each region, `schemes` the law used up to it.
    // Neighbouring regions share their boundary point.
    pub fn from_breakpoints(
        breakpoints: &[usize],
        schemes: &[InterpolationScheme],
        x: &[f64],
        y: &[f64],
    ) -> Result<Self, InterpolationError> {
        if x.len() != y.len() {
            return Err(InterpolationError::LengthMismatch { x_len: x.len(), y_len: y.len() });
        }
        if x.is_empty() {
            return Err(InterpolationError::Empty);
        }
        if let Some(pair) = x.windows(2).find(|pair| pair[1] < pair[0]) {
            return Err(InterpolationError::NotMonotonic { previous: pair[0], next: pair[1] });
        }
        let bad_breakpoints = || InterpolationError::BadBreakpoints {
            breakpoints: breakpoints.to_vec(),
            points: x.len(),
        };
        if breakpoints.len() != schemes.len()
            || breakpoints.last() != Some(&x.len())
            || breakpoints.windows(2).any(|pair| pair[1] <= pair[0])
            || breakpoints[0] == 0
        {
            return Err(bad_breakpoints());
        }
        if let Some(scheme) = schemes.iter().find(|scheme| !scheme.is_supported()) {
            return Err(InterpolationError::UnsupportedScheme(*scheme));
        }

        // Convert the 1-based region ends into zero-based [start, end] ranges
        let mut regions = Vec::with_capacity(breakpoints.len());
        let mut start = 0;
        for (&end, &scheme) in breakpoints.iter().zip(schemes.iter()) {
            let end = end - 1;
            regions.push(InterpolationRegion::from_x_and_y(&x[start..=end], &y[start..=end], scheme));
            start = end;
        }
        Ok(Self(regions))
    }

    pub fn x_min(&self) -> f64 {
        self.0.first().map_or(f64::NAN, |region| region.x_min())
    }

    pub fn x_max(&self) -> f64 {
        self.0.last().map_or(f64::NAN, |region| region.x_max())
    }

    // Interpolate a value from the table. Values outside the table are an
    // error, never an extrapolation.
    pub fn interpolate(&self, x_val: f64) -> Result<f64, InterpolationError> {
        if self.0.is_empty() {
            return Err(InterpolationError::Empty);
        }
        let region = self.0.iter().find(|region| region.contains(x_val)).ok_or(
            InterpolationError::OutOfRange { x: x_val, min: self.x_min(), max: self.x_max() },
        )?;

        // Single point regions only match exactly
        if region.data.len() == 1 {
            return Ok(region.data[0].y);
        }

        // Find the bin x_val falls into, partition_point gives the first x > x_val
        let upper = region.data.partition_point(|xy| xy.x <= x_val);
        if upper == region.data.len() {
            // x_val is exactly the last point of the region
            return Ok(region.data[upper - 1].y);
        }
        let XY { x: x0, y: y0 } = region.data[upper - 1];
        let XY { x: x1, y: y1 } = region.data[upper];
        if x0 == x_val {
            return Ok(y0);
        }

        Ok(region.interpolation_scheme.interpolate(x0, x1, y0, y1, x_val))
    }
}
