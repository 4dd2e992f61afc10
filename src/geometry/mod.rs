mod cell;
mod csg;
mod geometry;
mod surface;

pub use cell::{Cell, CellDefinition, CellFill, FillDefinition, ROOT_UNIVERSE};
pub use csg::{CsgError, CsgToken, Region, RegionParseError};
pub use geometry::{BoundaryCrossing, CellPath, Geometry, TINY_BIT};
pub use surface::{BoundaryCondition, Surface, SurfaceKind, FP_COINCIDENT};
