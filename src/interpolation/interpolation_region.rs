use crate::interpolation::InterpolationScheme;

//=====================================================================
// X/Y pair for interpolation.
//=====================================================================
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct XY {
    pub x: f64,
    pub y: f64,
}

//=====================================================================
// Interpolation region. A run of X/Y pairs sharing one interpolation
// scheme. Regions of a table overlap at their shared end points.
//=====================================================================
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationRegion {
    pub data: Vec<XY>,
    pub interpolation_scheme: InterpolationScheme,
}

impl InterpolationRegion {
    pub fn from_x_and_y(x: &[f64], y: &[f64], interpolation_scheme: InterpolationScheme) -> Self {
        debug_assert_eq!(x.len(), y.len());
        let data = x.iter().zip(y.iter()).map(|(&x, &y)| XY { x, y }).collect();
        Self { data, interpolation_scheme }
    }

    pub fn x_min(&self) -> f64 {
        self.data.first().map_or(f64::NAN, |xy| xy.x)
    }

    pub fn x_max(&self) -> f64 {
        self.data.last().map_or(f64::NAN, |xy| xy.x)
    }

    pub fn contains(&self, x: f64) -> bool {
        self.x_min() <= x && x <= self.x_max()
    }
}
