//! Running first and second moments
//!
//! Computes streaming mean and variance using Welford's numerically stable online
//! algorithm, and combines partial aggregates with Chan et al.'s parallel formula.

use crate::traits::{from_count, MergeError, Sketch, Value};

/// Combine two `(count, mean, sum of squared deviations)` aggregates
///
/// Returns the aggregate of the union of both groups, exactly as if all of
/// their values had been processed in a single pass (Chan, Golub & LeVeque):
///
/// ```text
/// n     = n_a + n_b
/// delta = mean_b - mean_a
/// mean  = mean_a + delta * n_b / n
/// s     = s_a + s_b + delta^2 * n_a * n_b / n
/// ```
///
/// An empty group on either side returns the other side unchanged.
///
/// # Example
///
/// ```
/// use logbin::statistics::combine_moments;
///
/// // [1, 2, 3] and [4, 5]
/// let (n, mean, s) = combine_moments::<f64>(3, 2.0, 2.0, 2, 4.5, 0.5);
/// assert_eq!(n, 5);
/// assert!((mean - 3.0).abs() < 1e-12);
/// assert!((s - 10.0).abs() < 1e-12);
/// ```
pub fn combine_moments<T: Value>(
    n_a: u64,
    mean_a: T,
    s_a: T,
    n_b: u64,
    mean_b: T,
    s_b: T,
) -> (u64, T, T) {
    if n_b == 0 {
        return (n_a, mean_a, s_a);
    }
    if n_a == 0 {
        return (n_b, mean_b, s_b);
    }

    let n = n_a + n_b;
    let n_f = from_count::<T>(n);
    let n_a_f = from_count::<T>(n_a);
    let n_b_f = from_count::<T>(n_b);

    let delta = mean_b - mean_a;
    let mean = mean_a + delta * (n_b_f / n_f);
    let s = s_a + s_b + delta * delta * (n_a_f * n_b_f / n_f);

    (n, mean, s)
}

/// Running mean and variance accumulator
///
/// Holds the count, mean, and sum of squared deviations (M2) of everything
/// pushed so far in O(1) memory.
///
/// # Example
///
/// ```
/// use logbin::statistics::Moments;
///
/// let mut moments = Moments::<f64>::new();
///
/// for value in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
///     moments.push(value);
/// }
///
/// assert!((moments.mean().unwrap() - 5.0).abs() < 1e-12);
/// assert!((moments.variance() - 4.0).abs() < 1e-12);
/// assert!((moments.sample_variance().unwrap() - 32.0 / 7.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Moments<T> {
    /// Number of values seen
    count: u64,
    /// Running mean
    mean: T,
    /// Sum of squared differences from mean
    m2: T,
}

impl<T: Value> Default for Moments<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Value> Moments<T> {
    /// Create a new empty accumulator
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: T::zero(),
            m2: T::zero(),
        }
    }

    /// Build an accumulator from an existing aggregate
    pub fn from_parts(count: u64, mean: T, m2: T) -> Self {
        if count == 0 {
            return Self::new();
        }
        Self { count, mean, m2 }
    }

    /// Add a value
    ///
    /// NaN values are ignored to prevent poisoning the statistics.
    pub fn push(&mut self, value: T) {
        if value.is_nan() {
            return;
        }

        self.count += 1;

        // Welford's algorithm
        let delta = value - self.mean;
        self.mean = self.mean + delta / from_count(self.count);
        let delta2 = value - self.mean;
        self.m2 = self.m2 + delta * delta2;
    }

    /// Number of values
    pub fn len(&self) -> u64 {
        self.count
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean, if any value has been seen
    pub fn mean(&self) -> Option<T> {
        if self.count == 0 {
            None
        } else {
            Some(self.mean)
        }
    }

    /// Sum of squared deviations from the mean
    pub fn m2(&self) -> T {
        self.m2
    }

    /// Population variance (zero when empty)
    pub fn variance(&self) -> T {
        if self.count == 0 {
            T::zero()
        } else {
            self.m2 / from_count(self.count)
        }
    }

    /// Sample variance with Bessel's correction, defined from two values on
    pub fn sample_variance(&self) -> Option<T> {
        if self.count < 2 {
            None
        } else {
            Some(self.m2 / from_count(self.count - 1))
        }
    }

    /// Sum of all values
    pub fn sum(&self) -> T {
        self.mean * from_count(self.count)
    }

    /// Merge another accumulator into this one using [`combine_moments`]
    pub fn merge_moments(&mut self, other: &Self) {
        let (count, mean, m2) =
            combine_moments(self.count, self.mean, self.m2, other.count, other.mean, other.m2);
        self.count = count;
        self.mean = mean;
        self.m2 = m2;
    }
}

impl<T: Value> Extend<T> for Moments<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T: Value> FromIterator<T> for Moments<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut moments = Self::new();
        moments.extend(iter);
        moments
    }
}

impl<T: Value> Sketch for Moments<T> {
    type Item = T;

    fn update(&mut self, item: &Self::Item) {
        self.push(*item);
    }

    fn merge(&mut self, other: &Self) -> Result<(), MergeError> {
        self.merge_moments(other);
        Ok(())
    }

    fn clear(&mut self) {
        *self = Self::new();
    }

    fn size_bytes(&self) -> usize {
        core::mem::size_of::<Self>()
    }

    fn count(&self) -> u64 {
        self.count
    }
}
