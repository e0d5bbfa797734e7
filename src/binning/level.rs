//! Running statistics for a single binning level

use crate::binning::pair::PairAccumulator;
use crate::binning::snapshot::LevelSnapshot;
use crate::statistics::combine_moments;
use crate::traits::{from_count, QueryError, Value};

/// Accumulator for one binning level
///
/// Values arriving at level `k` are means of `2^k` consecutive raw samples.
/// They are buffered in pairs; each completed pair is folded into the running
/// totals and its mean is handed back to be pushed one level up.
///
/// The running totals describe every value absorbed so far:
/// - `nelements`: number of completed pairs
/// - `sum`: sum of the pair means, so `mean = sum / nelements`
/// - `sum_squares`: sum of squared deviations of the `2 * nelements`
///   absorbed values from their mean
///
/// A value still waiting for its partner is not part of the totals.
///
/// # Example
///
/// ```
/// use logbin::binning::LevelAccumulator;
///
/// let mut level = LevelAccumulator::<f64>::new(0);
///
/// assert_eq!(level.push(2.0), None);
/// assert_eq!(level.push(4.0), Some(3.0));
/// assert_eq!(level.push(6.0), None);
/// assert_eq!(level.push(8.0), Some(7.0));
///
/// assert_eq!(level.mean().unwrap(), 5.0);
/// assert!((level.var().unwrap() - 20.0 / 3.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LevelAccumulator<T> {
    level: usize,
    nelements: u64,
    sum: T,
    sum_squares: T,
    pair: PairAccumulator<T>,
}

impl<T: Value> LevelAccumulator<T> {
    /// Create an empty accumulator for the given level
    pub fn new(level: usize) -> Self {
        Self {
            level,
            nelements: 0,
            sum: T::zero(),
            sum_squares: T::zero(),
            pair: PairAccumulator::new(),
        }
    }

    /// Push a value into this level
    ///
    /// Returns the pair mean when the value completes a pair.
    pub fn push(&mut self, value: T) -> Option<T> {
        let done = self.pair.push(value)?;

        let n_old = self.nelements;
        let mean_old = if n_old == 0 {
            T::zero()
        } else {
            self.sum / from_count(n_old)
        };

        // Each pair carries two values of weight
        let (_, _, sum_squares) = combine_moments(
            2 * n_old,
            mean_old,
            self.sum_squares,
            2,
            done.promoted,
            done.square,
        );

        self.sum_squares = sum_squares;
        self.sum = self.sum + done.promoted;
        self.nelements = n_old + 1;

        Some(done.promoted)
    }

    /// Mean of the absorbed values
    ///
    /// Needs at least one completed pair.
    pub fn mean(&self) -> Result<T, QueryError> {
        self.require(1)?;
        Ok(self.sum / from_count(self.nelements))
    }

    /// Sample variance of the absorbed values (Bessel corrected)
    ///
    /// Needs at least two completed pairs.
    pub fn var(&self) -> Result<T, QueryError> {
        self.require(2)?;
        Ok(self.sum_squares / from_count(self.absorbed() - 1))
    }

    /// Variance of the mean, `var / absorbed`
    ///
    /// Treats the absorbed values as independent. Comparing this across
    /// levels is what reveals autocorrelation in the raw stream.
    pub fn var_of_mean(&self) -> Result<T, QueryError> {
        Ok(self.var()? / from_count(self.absorbed()))
    }

    /// Standard error of the mean, `sqrt(var_of_mean)`
    pub fn std_error(&self) -> Result<T, QueryError> {
        Ok(self.var_of_mean()?.sqrt())
    }

    fn require(&self, required: u64) -> Result<(), QueryError> {
        if self.nelements < required {
            return Err(QueryError::InsufficientData {
                level: self.level,
                nelements: self.nelements,
                required,
            });
        }
        Ok(())
    }

    /// Binning level index
    pub fn level(&self) -> usize {
        self.level
    }

    /// Number of raw samples averaged into each value arriving here
    pub fn block_size(&self) -> u64 {
        1u64.checked_shl(self.level as u32).unwrap_or(u64::MAX)
    }

    /// Number of completed pairs
    pub fn nelements(&self) -> u64 {
        self.nelements
    }

    /// Number of values folded into the running totals
    pub fn absorbed(&self) -> u64 {
        2 * self.nelements
    }

    /// Sum of the pair means
    pub fn sum(&self) -> T {
        self.sum
    }

    /// Sum of squared deviations of the absorbed values
    pub fn sum_squares(&self) -> T {
        self.sum_squares
    }

    /// The value waiting for a partner, if any
    pub fn pending(&self) -> Option<T> {
        self.pair.pending()
    }

    pub fn is_pending(&self) -> bool {
        self.pair.is_pending()
    }

    /// Capture the exact state of this level
    pub fn snapshot(&self) -> LevelSnapshot<T> {
        LevelSnapshot {
            level: self.level,
            nelements: self.nelements,
            sum: self.sum,
            sum_squares: self.sum_squares,
            pending: self.pair.pending(),
        }
    }

    /// Rebuild a level from a snapshot
    ///
    /// No consistency checks are made here; see
    /// [`BinningTree::from_snapshots`](crate::binning::BinningTree::from_snapshots).
    pub fn from_snapshot(snapshot: &LevelSnapshot<T>) -> Self {
        Self {
            level: snapshot.level,
            nelements: snapshot.nelements,
            sum: snapshot.sum,
            sum_squares: snapshot.sum_squares,
            pair: PairAccumulator::with_pending(snapshot.pending),
        }
    }

    /// Fold another level's totals into this one
    ///
    /// The other level's values are treated as arriving after ours, so its
    /// pending value replaces ours. Callers must make sure this level has
    /// no pending value.
    pub(crate) fn absorb(&mut self, other: &Self) {
        let mean_self = if self.nelements == 0 {
            T::zero()
        } else {
            self.sum / from_count(self.nelements)
        };
        let mean_other = if other.nelements == 0 {
            T::zero()
        } else {
            other.sum / from_count(other.nelements)
        };

        let (_, _, sum_squares) = combine_moments(
            self.absorbed(),
            mean_self,
            self.sum_squares,
            other.absorbed(),
            mean_other,
            other.sum_squares,
        );

        self.sum_squares = sum_squares;
        self.sum = self.sum + other.sum;
        self.nelements += other.nelements;
        self.pair = other.pair;
    }
}
