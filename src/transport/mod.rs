mod particle;
pub mod physics;
mod tracker;

pub use particle::{Particle, ParticleState, ParticleType};
pub use tracker::{
    HistoryResult, Tracker, TrackingSettings, DEFAULT_MAX_EVENTS, DEFAULT_WEIGHT_CUTOFF, DEFAULT_WEIGHT_SURVIVAL,
};
