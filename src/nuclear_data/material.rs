use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialComponentDefinition {
    pub isotope: String,
    // atoms / (barn cm)
    pub density: f64,
}

// A material as written in a model: isotopes by name with atom densities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDefinition {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    // Kelvin, selects matching thermal scattering tables
    #[serde(default)]
    pub temperature: Option<f64>,
    pub components: Vec<MaterialComponentDefinition>,
}

impl MaterialDefinition {
    pub fn new(id: u32, name: &str, components: &[(&str, f64)]) -> Self {
        Self {
            id,
            name: name.to_string(),
            temperature: None,
            components: components
                .iter()
                .map(|(isotope, density)| MaterialComponentDefinition { isotope: isotope.to_string(), density: *density })
                .collect(),
        }
    }

    pub fn at_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialComponent {
    pub isotope: usize,
    pub density: f64,
    // Thermal table of the isotope in use at the material temperature
    pub thermal: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: u32,
    pub name: String,
    pub temperature: Option<f64>,
    pub components: Vec<MaterialComponent>,
}

impl Material {
    pub fn is_fissionable<F>(&self, fissile: F) -> bool
    where
        F: Fn(usize) -> bool,
    {
        self.components.iter().any(|component| component.density > 0.0 && fissile(component.isotope))
    }
}
