use std::collections::HashMap;
use std::ops::Deref;

use log::debug;

use crate::error::{ConfigurationError, GeometryError};
use crate::geometry::{
    BoundaryCondition, Cell, CellDefinition, CellFill, FillDefinition, Region, RegionParseError, Surface,
    ROOT_UNIVERSE,
};

// Distance a particle is pushed past a surface it crosses
pub const TINY_BIT: f64 = 1e-8;

// Cell indices from the root universe down to the cell actually holding
// the point, one per universe level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CellPath(Vec<usize>);

impl Deref for CellPath {
    type Target = Vec<usize>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl CellPath {
    // Innermost cell, the one whose fill is a material or void
    pub fn lowest(&self) -> usize {
        *self.0.last().unwrap_or(&0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryCrossing {
    pub distance: f64,
    pub surface: usize,
    pub boundary: BoundaryCondition,
}

//=====================================================================
// The immutable geometry: surfaces, cells and universes, shared by
// every history of a run.
//=====================================================================
#[derive(Debug, Clone)]
pub struct Geometry {
    surfaces: Vec<Surface>,
    surface_index: HashMap<u32, usize>,
    cells: Vec<Cell>,
    cell_index: HashMap<u32, usize>,
    cell_names: HashMap<String, usize>,
    universes: HashMap<u32, Vec<usize>>,
    // Cells bounded by each surface
    neighbors: Vec<Vec<usize>>,
}

impl Geometry {
    // Resolve cell definitions against the surfaces and the material ids
    // known to the nuclear data store.
    pub fn new<F>(surfaces: Vec<Surface>, cells: &[CellDefinition], material_index: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(u32) -> Option<usize>,
    {
        let mut surface_index = HashMap::with_capacity(surfaces.len());
        for (index, surface) in surfaces.iter().enumerate() {
            surface.validate()?;
            if surface_index.insert(surface.id, index).is_some() {
                return Err(ConfigurationError::DuplicateId { kind: "surface", id: surface.id.to_string() });
            }
        }

        let mut resolved = Vec::with_capacity(cells.len());
        let mut cell_index = HashMap::with_capacity(cells.len());
        let mut cell_names = HashMap::new();
        let mut universes: HashMap<u32, Vec<usize>> = HashMap::new();
        for (index, definition) in cells.iter().enumerate() {
            if cell_index.insert(definition.id, index).is_some() {
                return Err(ConfigurationError::DuplicateId { kind: "cell", id: definition.id.to_string() });
            }
            if let Some(name) = &definition.name {
                if cell_names.insert(name.clone(), index).is_some() {
                    return Err(ConfigurationError::DuplicateId { kind: "cell name", id: name.clone() });
                }
            }

            let tokens = definition.tokens().map_err(|err| ConfigurationError::MalformedRegion {
                cell: definition.id,
                position: err.position,
                message: err.message,
            })?;
            let region = Region::parse(&tokens, |id| surface_index.get(&id).copied()).map_err(|err| match err {
                RegionParseError::Malformed(err) => ConfigurationError::MalformedRegion {
                    cell: definition.id,
                    position: err.position,
                    message: err.message,
                },
                RegionParseError::UnknownSurface(surface) => {
                    ConfigurationError::UnknownSurface { cell: definition.id, surface }
                }
            })?;

            let fill = match definition.fill {
                FillDefinition::Void => CellFill::Void,
                FillDefinition::Material(id) => CellFill::Material(
                    material_index(id).ok_or(ConfigurationError::UnknownMaterial { cell: definition.id, material: id })?,
                ),
                FillDefinition::Universe(universe) => CellFill::Universe(universe),
            };

            universes.entry(definition.universe).or_default().push(index);
            resolved.push(Cell::new(definition.id, definition.name.clone(), definition.universe, region, fill));
        }

        if !universes.contains_key(&ROOT_UNIVERSE) {
            return Err(ConfigurationError::EmptyRootUniverse(ROOT_UNIVERSE));
        }

        let mut neighbors = vec![Vec::new(); surfaces.len()];
        for (index, cell) in resolved.iter().enumerate() {
            for &surface in &cell.surfaces {
                neighbors[surface].push(index);
            }
        }

        let geometry = Self { surfaces, surface_index, cells: resolved, cell_index, cell_names, universes, neighbors };
        geometry.check_fills(ROOT_UNIVERSE, &mut Vec::new())?;
        debug!(
            "Built geometry with {} surfaces, {} cells and {} universes",
            geometry.surfaces.len(),
            geometry.cells.len(),
            geometry.universes.len()
        );
        Ok(geometry)
    }

    // Depth first walk over universe fills, rejecting unknown universes and
    // universes that (indirectly) contain themselves.
    fn check_fills(&self, universe: u32, stack: &mut Vec<u32>) -> Result<(), ConfigurationError> {
        stack.push(universe);
        for &index in self.universe_cells(universe) {
            let cell = &self.cells[index];
            if let CellFill::Universe(fill) = cell.fill {
                if !self.universes.contains_key(&fill) {
                    return Err(ConfigurationError::UnknownUniverse { cell: cell.id, universe: fill });
                }
                if stack.contains(&fill) {
                    return Err(ConfigurationError::RecursiveFill { cell: cell.id, universe: fill });
                }
                self.check_fills(fill, stack)?;
            }
        }
        stack.pop();
        Ok(())
    }

    fn universe_cells(&self, universe: u32) -> &[usize] {
        self.universes.get(&universe).map_or(&[], |cells| cells.as_slice())
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn surface(&self, index: usize) -> &Surface {
        &self.surfaces[index]
    }

    pub fn surface_index(&self, id: u32) -> Option<usize> {
        self.surface_index.get(&id).copied()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn cell_index(&self, id: u32) -> Option<usize> {
        self.cell_index.get(&id).copied()
    }

    pub fn cell_by_name(&self, name: &str) -> Option<&Cell> {
        self.cell_names.get(name).map(|&index| &self.cells[index])
    }

    // Locate the point, descending through universe fills. The first cell of
    // a universe containing the point wins.
    pub fn find_cell(&self, p: &[f64; 3], u: &[f64; 3], crossed: Option<usize>) -> Result<CellPath, GeometryError> {
        let mut path = Vec::new();
        self.descend(ROOT_UNIVERSE, p, u, crossed, &mut path)?;
        Ok(CellPath(path))
    }

    // Locate a particle that has just crossed `surface`, trying the root
    // cells bounded by that surface before a full search.
    pub fn find_cell_across(&self, surface: usize, p: &[f64; 3], u: &[f64; 3]) -> Result<CellPath, GeometryError> {
        let neighbor = self.neighbors[surface].iter().copied().find(|&index| {
            let cell = &self.cells[index];
            cell.universe == ROOT_UNIVERSE && cell.contains(p, u, &self.surfaces, Some(surface))
        });
        match neighbor {
            Some(index) => {
                let mut path = vec![index];
                self.fill(index, p, u, Some(surface), &mut path)?;
                Ok(CellPath(path))
            }
            None => self.find_cell(p, u, Some(surface)),
        }
    }

    fn descend(
        &self,
        universe: u32,
        p: &[f64; 3],
        u: &[f64; 3],
        crossed: Option<usize>,
        path: &mut Vec<usize>,
    ) -> Result<(), GeometryError> {
        let index = self
            .universe_cells(universe)
            .iter()
            .copied()
            .find(|&index| self.cells[index].contains(p, u, &self.surfaces, crossed))
            .ok_or(GeometryError::Unclassified { point: *p })?;
        path.push(index);
        self.fill(index, p, u, crossed, path)
    }

    fn fill(
        &self,
        index: usize,
        p: &[f64; 3],
        u: &[f64; 3],
        crossed: Option<usize>,
        path: &mut Vec<usize>,
    ) -> Result<(), GeometryError> {
        let cell = &self.cells[index];
        if let CellFill::Universe(universe) = cell.fill {
            self.descend(universe, p, u, crossed, path).map_err(|err| match err {
                GeometryError::Unclassified { point } => {
                    GeometryError::UnclassifiedInFill { point, cell: cell.id, universe }
                }
                other => other,
            })?;
        }
        Ok(())
    }

    // Nearest surface crossing over every level of the path. Equal distances
    // keep the first surface found.
    pub fn distance_to_boundary(
        &self,
        path: &CellPath,
        p: &[f64; 3],
        u: &[f64; 3],
        crossed: Option<usize>,
    ) -> Option<BoundaryCrossing> {
        let mut nearest: Option<BoundaryCrossing> = None;
        for &index in path.iter() {
            for &surface in &self.cells[index].surfaces {
                let Some(distance) = self.surfaces[surface].distance(p, u, crossed == Some(surface)) else {
                    continue;
                };
                if nearest.is_none_or(|best| distance < best.distance) {
                    nearest = Some(BoundaryCrossing { distance, surface, boundary: self.surfaces[surface].boundary });
                }
            }
        }
        nearest
    }

    // Ids of every cell of a universe containing the point. More than one
    // means the cells overlap there.
    pub fn cells_containing(&self, universe: u32, p: &[f64; 3], u: &[f64; 3]) -> Vec<u32> {
        self.universe_cells(universe)
            .iter()
            .filter(|&&index| self.cells[index].contains(p, u, &self.surfaces, None))
            .map(|&index| self.cells[index].id)
            .collect()
    }
}
