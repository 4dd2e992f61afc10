mod history_rng;

pub use history_rng::{HistoryRng, RandomSource, RngStream, HISTORY_STRIDE};
