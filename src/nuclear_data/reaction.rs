use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display, EnumIter};

//=====================================================================
// Reaction channels known to the transport, by ENDF MT number.
// Discrete inelastic levels (MT 51-91) collapse onto Inelastic, the
// partial fission chances onto Fission and the charged particle
// producing channels onto ChargedParticle. The channel itself keeps
// its original MT.
//=====================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum ReactionType {
    Elastic = 2,
    #[num_enum(alternatives = [
        51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64, 65, 66, 67, 68, 69, 70,
        71, 72, 73, 74, 75, 76, 77, 78, 79, 80, 81, 82, 83, 84, 85, 86, 87, 88, 89, 90, 91
    ])]
    Inelastic = 4,
    N2N = 16,
    N3N = 17,
    #[num_enum(alternatives = [19, 20, 21, 38])]
    Fission = 18,
    Capture = 102,
    #[num_enum(alternatives = [104, 105, 106, 107])]
    ChargedParticle = 103,
}

impl ReactionType {
    pub fn from_mt(mt: u32) -> Option<Self> {
        Self::try_from(mt).ok()
    }

    // Removes the neutron from the system. Fission counts as absorption.
    pub fn is_absorption(self) -> bool {
        matches!(self, ReactionType::Capture | ReactionType::ChargedParticle | ReactionType::Fission)
    }

    pub fn is_scatter(self) -> bool {
        self.multiplicity() > 0
    }

    pub fn is_fission(self) -> bool {
        self == ReactionType::Fission
    }

    // Neutrons leaving a scatter type reaction, zero for absorption
    pub fn multiplicity(self) -> usize {
        match self {
            ReactionType::Elastic | ReactionType::Inelastic => 1,
            ReactionType::N2N => 2,
            ReactionType::N3N => 3,
            ReactionType::Fission | ReactionType::Capture | ReactionType::ChargedParticle => 0,
        }
    }
}
