use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::geometry::{CellDefinition, Geometry, Surface};
use crate::nuclear_data::{load_isotope_libraries, IsotopeData, MaterialDefinition, NuclearDataStore};

//=====================================================================
// A problem description as handed over by the input layer: surfaces,
// cells and materials. Isotope data arrives separately, either as
// values or as binary library files.
//=====================================================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub surfaces: Vec<Surface>,
    pub cells: Vec<CellDefinition>,
    #[serde(default)]
    pub materials: Vec<MaterialDefinition>,
}

impl ModelDefinition {
    pub fn from_json_file<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let path = file_path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("Failed to read model {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse model {}", path.display()))
    }

    // Resolve the model into the immutable stores of a run. Materials are
    // resolved first so cells can refer to them by index.
    pub fn build(&self, isotopes: &[IsotopeData]) -> Result<(Geometry, NuclearDataStore), ConfigurationError> {
        let data = NuclearDataStore::new(isotopes, &self.materials)?;
        let geometry = Geometry::new(self.surfaces.clone(), &self.cells, |id| data.material_index(id))?;
        Ok((geometry, data))
    }

    // Same as build, reading the isotopes from library files
    pub async fn build_from_libraries(&self, paths: &[PathBuf]) -> Result<(Geometry, NuclearDataStore)> {
        let isotopes = load_isotope_libraries(paths).await?;
        let built = self.build(&isotopes).context("Invalid model")?;
        info!("Built model with {} cells and {} materials", self.cells.len(), self.materials.len());
        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    use crate::geometry::BoundaryCondition;
    use crate::utils::{fissile_isotope, moderator_isotope, ISOTOPES_DIR};

    const MODEL: &str = r#"{
        "surfaces": [
            {"id": 1, "type": "sphere", "x0": 0.0, "y0": 0.0, "z0": 0.0, "r": 5.0},
            {"id": 2, "type": "sphere", "x0": 0.0, "y0": 0.0, "z0": 0.0, "r": 10.0, "boundary": "vacuum"}
        ],
        "cells": [
            {"id": 1, "name": "core", "region": "-1", "fill": {"type": "material", "id": 1}},
            {"id": 2, "name": "reflector", "region": "1 -2", "fill": {"type": "material", "id": 2}}
        ],
        "materials": [
            {"id": 1, "name": "fuel", "components": [{"isotope": "U235", "density": 0.02}]},
            {"id": 2, "name": "water", "temperature": 293.6, "components": [{"isotope": "H1", "density": 0.0669}]}
        ]
    }"#;

    #[test]
    fn test_build_from_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, MODEL).unwrap();

        let model = ModelDefinition::from_json_file(&path).unwrap();
        assert_eq!(model.surfaces[1].boundary, BoundaryCondition::Vacuum);
        let (geometry, data) = model.build(&[fissile_isotope(), moderator_isotope()]).unwrap();
        assert_eq!(geometry.cells().len(), 2);
        assert_eq!(geometry.cell_by_name("reflector").map(|cell| cell.id), Some(2));
        assert_eq!(data.materials().len(), 2);
        assert!(data.materials()[1].components[0].thermal.is_some());
    }

    #[test]
    fn test_build_reports_missing_material() {
        let mut model: ModelDefinition = serde_json::from_str(MODEL).unwrap();
        model.materials.pop();
        let err = model.build(&[fissile_isotope(), moderator_isotope()]).unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownMaterial { cell: 2, material: 2 });
    }

    #[tokio::test]
    async fn test_build_from_libraries() {
        let model: ModelDefinition = serde_json::from_str(MODEL).unwrap();
        let paths = vec![ISOTOPES_DIR.path().join("U235.kxs"), ISOTOPES_DIR.path().join("H1.kxs")];
        let (geometry, data) = model.build_from_libraries(&paths).await.unwrap();
        assert_eq!(geometry.surfaces().len(), 2);
        assert_eq!(data.isotope_index("H1"), Some(1));

        let missing = vec![ISOTOPES_DIR.path().join("Pu239.kxs")];
        assert!(model.build_from_libraries(&missing).await.is_err());
    }
}
