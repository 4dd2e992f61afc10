use serde::{Deserialize, Serialize};

use crate::geometry::{CsgToken, Region, Surface};

// Root universe every geometry search starts from
pub const ROOT_UNIVERSE: u32 = 0;

//=====================================================================
// Cell definitions as read from a model, and the resolved cells the
// geometry works with (dense surface and material indices).
//=====================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum FillDefinition {
    #[default]
    Void,
    Material(u32),
    Universe(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellDefinition {
    pub id: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub universe: u32,
    // Region expression, e.g. "-1 2 : (3 -4)"
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub fill: FillDefinition,
}

impl CellDefinition {
    pub fn new(id: u32, region: &str, fill: FillDefinition) -> Self {
        Self { id, name: None, universe: ROOT_UNIVERSE, region: region.to_string(), fill }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn in_universe(mut self, universe: u32) -> Self {
        self.universe = universe;
        self
    }

    pub fn tokens(&self) -> Result<Vec<CsgToken>, crate::geometry::CsgError> {
        CsgToken::tokenize(&self.region)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFill {
    Void,
    // Dense index into the nuclear data store's materials
    Material(usize),
    Universe(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: u32,
    pub name: Option<String>,
    pub universe: u32,
    pub region: Region,
    pub fill: CellFill,
    // Surfaces bounding the cell, used for distance to boundary
    pub surfaces: Vec<usize>,
}

impl Cell {
    pub fn new(id: u32, name: Option<String>, universe: u32, region: Region, fill: CellFill) -> Self {
        let surfaces = region.surfaces();
        Self { id, name, universe, region, fill, surfaces }
    }

    pub fn contains(&self, p: &[f64; 3], u: &[f64; 3], surfaces: &[Surface], crossed: Option<usize>) -> bool {
        self.region.contains(p, u, surfaces, crossed)
    }

    pub fn material(&self) -> Option<usize> {
        match self.fill {
            CellFill::Material(material) => Some(material),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_from_json() {
        let cell: CellDefinition =
            serde_json::from_str(r#"{"id": 3, "name": "fuel", "region": "-1", "fill": {"type": "material", "id": 10}}"#)
                .unwrap();
        assert_eq!(cell.fill, FillDefinition::Material(10));
        assert_eq!(cell.universe, ROOT_UNIVERSE);
        assert_eq!(cell.tokens().unwrap(), vec![CsgToken::Halfspace(-1)]);

        let cell: CellDefinition = serde_json::from_str(r#"{"id": 4, "region": "1", "fill": {"type": "void"}}"#).unwrap();
        assert_eq!(cell.fill, FillDefinition::Void);
    }

    #[test]
    fn test_cell_surfaces_and_material() {
        let region = Region::Intersection(vec![
            Region::Halfspace { surface: 2, positive: false },
            Region::Halfspace { surface: 0, positive: true },
            Region::Halfspace { surface: 2, positive: false },
        ]);
        let cell = Cell::new(1, None, ROOT_UNIVERSE, region, CellFill::Material(4));
        assert_eq!(cell.surfaces, vec![2, 0]);
        assert_eq!(cell.material(), Some(4));
    }
}
