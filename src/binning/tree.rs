//! Lazily growing hierarchy of binning levels

#[cfg(feature = "std")]
use std::{format, vec::Vec};

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::{format, vec::Vec};

use crate::binning::level::LevelAccumulator;
use crate::binning::snapshot::{self, LevelSnapshot};
use crate::binning::summary::LevelStats;
use crate::traits::{DecodeError, MergeError, QueryError, Sketch, Value};

/// Online logarithmic binning of a data stream
///
/// Raw samples enter level 0. Whenever a level completes a pair, the pair
/// mean is pushed into the next level, which is created the first time it is
/// needed. Level `k` therefore sees the means of consecutive, non-overlapping
/// blocks of `2^k` raw samples, and the tree holds `O(log N)` levels after
/// `N` samples.
///
/// For correlated data the standard error estimated at level 0 is biased
/// low; it grows with the level until the block size exceeds the correlation
/// time and then plateaus. Reading off that plateau is left to the caller.
///
/// NaN samples are ignored. Very large magnitudes can lose precision or
/// overflow; no attempt is made to guard against that.
///
/// # Example
///
/// ```
/// use logbin::binning::BinningTree;
///
/// let mut tree = BinningTree::<f64>::new();
/// for value in [2.0, 4.0, 6.0, 8.0] {
///     tree.push(value);
/// }
///
/// assert_eq!(tree.levels_count(), 3);
/// assert_eq!(tree.mean(0).unwrap(), 5.0);
/// assert!((tree.var(0).unwrap() - 20.0 / 3.0).abs() < 1e-12);
/// assert_eq!(tree.mean(1).unwrap(), 5.0);
/// assert!(tree.var(1).is_err());
/// assert!(tree.mean(3).is_err());
/// ```
///
/// # Merging
///
/// A tree built from one chunk of a stream can absorb the tree of the chunk
/// that follows it, as long as the block boundaries line up:
///
/// ```
/// use logbin::binning::BinningTree;
/// use logbin::traits::Sketch;
///
/// let mut first: BinningTree<f64> = (0..16).map(f64::from).collect();
/// let second: BinningTree<f64> = (16..20).map(f64::from).collect();
/// first.merge(&second).unwrap();
///
/// let whole: BinningTree<f64> = (0..20).map(f64::from).collect();
/// assert_eq!(first.count(), whole.count());
/// assert_eq!(first.levels_count(), whole.levels_count());
/// assert!((first.mean(0).unwrap() - whole.mean(0).unwrap()).abs() < 1e-12);
/// assert!((first.var(1).unwrap() - whole.var(1).unwrap()).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BinningTree<T> {
    levels: Vec<LevelAccumulator<T>>,
    /// Raw samples ingested
    count: u64,
}

impl<T: Value> Default for BinningTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Value> BinningTree<T> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            levels: Vec::new(),
            count: 0,
        }
    }

    /// Create an empty tree with room for `levels` levels
    ///
    /// `N` samples need `floor(log2(N)) + 1` levels.
    pub fn with_capacity(levels: usize) -> Self {
        Self {
            levels: Vec::with_capacity(levels),
            count: 0,
        }
    }

    /// Push a raw sample, cascading pair means up the levels
    pub fn push(&mut self, value: T) {
        if value.is_nan() {
            return;
        }

        self.count += 1;
        if self.levels.is_empty() {
            self.open_level();
        }

        let mut current_level = 0;
        let mut current_value = value;
        while let Some(promoted) = self.levels[current_level].push(current_value) {
            current_level += 1;
            if current_level == self.levels.len() {
                self.open_level();
            }
            current_value = promoted;
        }
    }

    fn open_level(&mut self) {
        let level = self.levels.len();
        #[cfg(feature = "tracing")]
        tracing::trace!(new_level = level, samples = self.count, "opening binning level");
        self.levels.push(LevelAccumulator::new(level));
    }

    fn get(&self, level: usize) -> Result<&LevelAccumulator<T>, QueryError> {
        self.levels.get(level).ok_or(QueryError::LevelNotFound {
            level,
            levels: self.levels.len(),
        })
    }

    /// Mean at `level`
    pub fn mean(&self, level: usize) -> Result<T, QueryError> {
        self.get(level)?.mean()
    }

    /// Sample variance at `level`
    pub fn var(&self, level: usize) -> Result<T, QueryError> {
        self.get(level)?.var()
    }

    /// Variance of the mean at `level`, assuming independent values
    pub fn var_of_mean(&self, level: usize) -> Result<T, QueryError> {
        self.get(level)?.var_of_mean()
    }

    /// Standard error of the mean at `level`, assuming independent values
    pub fn std_error(&self, level: usize) -> Result<T, QueryError> {
        self.get(level)?.std_error()
    }

    /// Number of levels created so far
    pub fn levels_count(&self) -> usize {
        self.levels.len()
    }

    /// Accumulator for `level`, if it exists
    pub fn level(&self, level: usize) -> Option<&LevelAccumulator<T>> {
        self.levels.get(level)
    }

    /// All levels, lowest first
    pub fn levels(&self) -> &[LevelAccumulator<T>] {
        &self.levels
    }

    /// Number of raw samples ingested
    pub fn len(&self) -> u64 {
        self.count
    }

    /// Check if no sample has been ingested
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// One statistics row per level, lowest first
    pub fn summary(&self) -> Vec<LevelStats<T>> {
        self.levels.iter().map(LevelStats::from).collect()
    }

    /// Capture the exact state of every level
    pub fn snapshot(&self) -> Vec<LevelSnapshot<T>> {
        self.levels.iter().map(LevelAccumulator::snapshot).collect()
    }

    /// Rebuild a tree from `count` and the snapshots of its levels
    ///
    /// Fails if the snapshots could not have been produced by pushing
    /// `count` samples.
    pub fn from_snapshots(count: u64, levels: &[LevelSnapshot<T>]) -> Result<Self, DecodeError> {
        if let Err(err) = snapshot::validate(count, levels) {
            #[cfg(feature = "tracing")]
            tracing::debug!(error = %err, "rejecting binning snapshot");
            return Err(err);
        }

        Ok(Self {
            levels: levels.iter().map(LevelAccumulator::from_snapshot).collect(),
            count,
        })
    }

    /// Append the stream summarized by `other` to this one
    ///
    /// Exact when this tree has no pending value at any level `other`
    /// reaches, i.e. when `self.len()` is a multiple of
    /// `2^other.levels_count()`. Otherwise the tree is left untouched and an
    /// error is returned.
    pub fn merge_tree(&mut self, other: &Self) -> Result<(), MergeError> {
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            *self = other.clone();
            return Ok(());
        }

        let span = other.levels.len();
        let aligned = match 1u64.checked_shl(span as u32) {
            Some(block) => self.count % block == 0,
            None => false,
        };
        if !aligned {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                samples = self.count,
                levels = span,
                "rejecting merge of misaligned binning trees"
            );
            return Err(MergeError::IncompatibleConfig {
                expected: format!("sample count divisible by 2^{}", span),
                found: format!("{} samples", self.count),
            });
        }

        // a nonempty multiple of 2^span has already opened level span
        debug_assert!(self.levels.len() > span);
        for (ours, theirs) in self.levels.iter_mut().zip(&other.levels) {
            ours.absorb(theirs);
        }
        self.count += other.count;

        Ok(())
    }
}

impl<T: Value> Extend<T> for BinningTree<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T: Value> FromIterator<T> for BinningTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<T: Value> Sketch for BinningTree<T> {
    type Item = T;

    fn update(&mut self, item: &Self::Item) {
        self.push(*item);
    }

    fn merge(&mut self, other: &Self) -> Result<(), MergeError> {
        self.merge_tree(other)
    }

    fn clear(&mut self) {
        self.levels.clear();
        self.count = 0;
    }

    fn size_bytes(&self) -> usize {
        core::mem::size_of::<Self>()
            + self.levels.capacity() * core::mem::size_of::<LevelAccumulator<T>>()
    }

    fn count(&self) -> u64 {
        self.count
    }
}

#[cfg(feature = "serde")]
impl<T: Value + serde::Serialize> serde::Serialize for BinningTree<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("BinningTree", 2)?;
        state.serialize_field("count", &self.count)?;
        state.serialize_field("levels", &self.snapshot())?;
        state.end()
    }
}

#[cfg(feature = "serde")]
impl<'de, T: Value + serde::Deserialize<'de>> serde::Deserialize<'de> for BinningTree<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        struct TreeData<T> {
            count: u64,
            levels: Vec<LevelSnapshot<T>>,
        }

        let data: TreeData<T> = serde::Deserialize::deserialize(deserializer)?;
        BinningTree::from_snapshots(data.count, &data.levels).map_err(serde::de::Error::custom)
    }
}
