mod cycle;
mod entropy;
mod simulation;

pub use cycle::{CycleResult, RunningStatistics};
pub use entropy::EntropyMesh;
pub use simulation::{CancelToken, CycleObserver, RunResult, Simulation};
