//! Per-level statistics rows

use crate::binning::level::LevelAccumulator;
use crate::traits::Value;

/// Statistics of one binning level, with unavailable values left empty
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelStats<T> {
    /// Binning level index
    pub level: usize,
    /// Raw samples averaged into each value of this level
    pub block_size: u64,
    /// Completed pairs
    pub nelements: u64,
    /// Mean of the absorbed values
    pub mean: Option<T>,
    /// Sample variance of the absorbed values
    pub variance: Option<T>,
    /// Standard error of the mean assuming independent values
    pub std_error: Option<T>,
}

impl<T: Value> From<&LevelAccumulator<T>> for LevelStats<T> {
    fn from(level: &LevelAccumulator<T>) -> Self {
        Self {
            level: level.level(),
            block_size: level.block_size(),
            nelements: level.nelements(),
            mean: level.mean().ok(),
            variance: level.var().ok(),
            std_error: level.std_error().ok(),
        }
    }
}
