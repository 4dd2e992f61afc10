use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::bank::Site;
use crate::geometry::CellPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleType {
    #[default]
    Neutron,
    Photon,
    Electron,
}

// Where a particle is in its life. The last four are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ParticleState {
    Born,
    Tracking,
    Scattered,
    Absorbed,
    Leaked,
    Fission,
    WeightCutoff,
}

impl ParticleState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ParticleState::Absorbed | ParticleState::Leaked | ParticleState::Fission | ParticleState::WeightCutoff
        )
    }
}

//=====================================================================
// The state of one particle in flight. Owned by the history that
// transports it and never shared between threads.
//=====================================================================
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub history: u64,
    pub kind: ParticleType,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    pub energy: f64,
    pub weight: f64,
    pub path: CellPath,
    // Surface the particle is sitting on, if it was just moved onto one
    pub surface: Option<usize>,
    pub state: ParticleState,
    pub events: usize,
}

impl Particle {
    pub fn from_site(history: u64, site: &Site) -> Self {
        Self {
            history,
            kind: ParticleType::Neutron,
            position: site.position,
            direction: site.direction,
            energy: site.energy,
            weight: site.weight,
            path: CellPath::default(),
            surface: None,
            state: ParticleState::Born,
            events: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.state.is_terminal()
    }

    pub fn advance(&mut self, distance: f64) {
        for axis in 0..3 {
            self.position[axis] += distance * self.direction[axis];
        }
    }

    pub fn kill(&mut self, state: ParticleState) {
        debug_assert!(state.is_terminal(), "{state} is not a terminal state");
        self.state = state;
    }

    // Innermost cell, valid once the particle has been located
    pub fn cell(&self) -> usize {
        self.path.lowest()
    }
}
