//! Exact per-level state for checkpointing

#[cfg(feature = "std")]
use std::format;

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::format;

use crate::traits::{DecodeError, Value};

/// Everything needed to continue a level exactly where it left off
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelSnapshot<T> {
    /// Binning level index
    pub level: usize,
    /// Number of completed pairs
    pub nelements: u64,
    /// Sum of the pair means
    pub sum: T,
    /// Sum of squared deviations of the absorbed values
    pub sum_squares: T,
    /// Value waiting for a partner
    pub pending: Option<T>,
}

impl<T> LevelSnapshot<T> {
    /// Number of values this level has received, pending one included
    pub fn received(&self) -> u64 {
        2 * self.nelements + u64::from(self.pending.is_some())
    }
}

/// Check that a sequence of level snapshots could have come from one stream
/// of `count` raw samples
pub(crate) fn validate<T: Value>(count: u64, levels: &[LevelSnapshot<T>]) -> Result<(), DecodeError> {
    if levels.is_empty() {
        if count != 0 {
            return Err(DecodeError::Corrupted(format!(
                "{} samples recorded but no levels present",
                count
            )));
        }
        return Ok(());
    }

    if count == 0 {
        return Err(DecodeError::Corrupted(format!(
            "{} levels present but no samples recorded",
            levels.len()
        )));
    }

    let mut expected = count;
    for (index, snapshot) in levels.iter().enumerate() {
        // a level only exists once something reached it
        if expected == 0 {
            return Err(DecodeError::Corrupted(format!(
                "level {} exists but nothing was promoted into it",
                index
            )));
        }
        if snapshot.level != index {
            return Err(DecodeError::Corrupted(format!(
                "level {} stored at position {}",
                snapshot.level, index
            )));
        }
        if snapshot.sum_squares < T::zero() {
            return Err(DecodeError::Corrupted(format!(
                "negative sum of squares at level {}",
                index
            )));
        }
        if snapshot.received() != expected {
            return Err(DecodeError::Corrupted(format!(
                "level {} received {} values, expected {}",
                index,
                snapshot.received(),
                expected
            )));
        }
        expected = snapshot.nelements;
    }

    if expected != 0 {
        return Err(DecodeError::Corrupted(format!(
            "top level {} promoted {} values into a missing level",
            levels.len() - 1,
            expected
        )));
    }

    Ok(())
}
