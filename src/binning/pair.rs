//! Two-value combination buffer

use crate::traits::Value;

/// Result of completing a pair
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletedPair<T> {
    /// Mean of the two values, forwarded to the next level
    pub promoted: T,
    /// Sum of squared deviations of the two values from their own mean
    pub square: T,
}

/// Combine two successive values into their mean and square term
///
/// With `T = a + b` the pair mean is `T / 2` and the square term is
/// `(a - T/2)^2 + (b - T/2)^2`, which equals `(a - b)^2 / 2`.
///
/// # Example
///
/// ```
/// use logbin::binning::combine;
///
/// let pair = combine::<f64>(2.0, 4.0);
/// assert_eq!(pair.promoted, 3.0);
/// assert_eq!(pair.square, 2.0);
/// ```
pub fn combine<T: Value>(first: T, second: T) -> CompletedPair<T> {
    let two = T::one() + T::one();
    let total = first + second;
    let promoted = total / two;
    let d1 = first - promoted;
    let d2 = second - promoted;
    CompletedPair {
        promoted,
        square: d1 * d1 + d2 * d2,
    }
}

/// Buffer holding at most one value awaiting its partner
///
/// # Example
///
/// ```
/// use logbin::binning::PairAccumulator;
///
/// let mut pair = PairAccumulator::<f64>::new();
/// assert!(pair.push(1.0).is_none());
/// assert!(pair.is_pending());
///
/// let done = pair.push(3.0).unwrap();
/// assert_eq!(done.promoted, 2.0);
/// assert!(!pair.is_pending());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairAccumulator<T> {
    pending: Option<T>,
}

impl<T: Value> Default for PairAccumulator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Value> PairAccumulator<T> {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self { pending: None }
    }

    pub(crate) fn with_pending(pending: Option<T>) -> Self {
        Self { pending }
    }

    /// Push a value, completing the pair if one was already waiting
    pub fn push(&mut self, value: T) -> Option<CompletedPair<T>> {
        match self.pending.take() {
            Some(first) => Some(combine(first, value)),
            None => {
                self.pending = Some(value);
                None
            }
        }
    }

    /// The value waiting for a partner, if any
    pub fn pending(&self) -> Option<T> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
