mod model;
mod settings;

pub use model::ModelDefinition;
pub use settings::{FailurePolicy, ProblemType, RunSettings};
