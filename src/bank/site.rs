use serde::{Deserialize, Serialize};

// Where and how a particle starts: a source particle, a fission
// neutron for the next cycle, or a secondary from an (n,xn) reaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub position: [f64; 3],
    pub direction: [f64; 3],
    pub energy: f64,
    pub weight: f64,
}

impl Site {
    pub fn new(position: [f64; 3], direction: [f64; 3], energy: f64) -> Self {
        Self { position, direction, energy, weight: 1.0 }
    }
}
