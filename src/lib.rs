#![allow(non_snake_case)]

pub mod bank;
pub mod config;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod interpolation;
pub mod nuclear_data;
pub mod random;
pub mod source;
pub mod tally;
pub mod transport;
pub mod unitf64;
pub mod utils;

pub use config::{FailurePolicy, ModelDefinition, ProblemType, RunSettings};
pub use driver::{CancelToken, CycleObserver, CycleResult, RunResult, Simulation};
pub use error::{TransportError, TransportResult};
