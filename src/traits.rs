//! Core traits and error types shared by the accumulators
//!
//! Every accumulator implements the base [`Sketch`] trait. Numeric element
//! types are bounded by [`Value`].

use core::fmt::Debug;

#[cfg(feature = "std")]
use std::string::String;

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::string::String;

use num_traits::Float;

/// Numeric element type accepted by the accumulators
///
/// Anything that behaves like a floating point number qualifies; in practice
/// this means `f32` and `f64`.
pub trait Value: Float + Debug {}

impl<T: Float + Debug> Value for T {}

/// Convert an integer count into the element type
///
/// Counts that cannot be represented become NaN rather than panicking.
#[inline]
pub(crate) fn from_count<T: Value>(n: u64) -> T {
    T::from(n).unwrap_or_else(T::nan)
}

/// Error returned when a statistic cannot be produced yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    /// The level has not absorbed enough pairs for the requested statistic
    InsufficientData {
        level: usize,
        nelements: u64,
        required: u64,
    },
    /// The level has never been created
    LevelNotFound { level: usize, levels: usize },
}

impl core::fmt::Display for QueryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            QueryError::InsufficientData {
                level,
                nelements,
                required,
            } => write!(
                f,
                "insufficient data at level {}: {} pairs absorbed, {} required",
                level, nelements, required
            ),
            QueryError::LevelNotFound { level, levels } => {
                write!(f, "level {} not found: only {} levels exist", level, levels)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for QueryError {}

/// Error during sketch merge operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// Sketches have incompatible configurations
    IncompatibleConfig { expected: String, found: String },
}

impl core::fmt::Display for MergeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MergeError::IncompatibleConfig { expected, found } => {
                write!(f, "incompatible config: expected {}, found {}", expected, found)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MergeError {}

/// Error while rebuilding an accumulator from saved state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The saved state is internally inconsistent
    Corrupted(String),
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecodeError::Corrupted(msg) => write!(f, "corrupted data: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

/// Core trait for all streaming accumulators
pub trait Sketch: Clone + Debug {
    /// The type of item this sketch processes
    type Item: ?Sized;

    /// Add an item to the sketch
    fn update(&mut self, item: &Self::Item);

    /// Merge another sketch into this one
    ///
    /// Returns an error if sketches are incompatible
    fn merge(&mut self, other: &Self) -> Result<(), MergeError>;

    /// Reset sketch to empty state
    fn clear(&mut self);

    /// Memory usage in bytes
    fn size_bytes(&self) -> usize;

    /// Number of items processed
    fn count(&self) -> u64;

    /// Check if sketch is empty
    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}
