//! # Logbin
//!
//! Online logarithmic binning for correlated data streams.
//!
//! Successive samples from Monte Carlo chains and similar measurement
//! pipelines are usually correlated, which makes the naive standard error of
//! their mean too small. Blocking analysis fixes that by averaging blocks of
//! `2^k` samples and watching the standard error grow with `k` until it
//! plateaus. Logbin performs that analysis online: one pass, no stored
//! samples, `O(log N)` memory.
//!
//! ## Features
//!
//! - **Binning**: [`BinningTree`] with per-level mean, variance, and standard error
//! - **Moments**: [`Moments`] running mean and variance with exact parallel merge
//! - **Mergeability**: trees of consecutive stream chunks can be combined
//! - **Checkpointing**: exact per-level snapshots that restore a tree bit for bit
//!
//! ## Quick Start
//!
//! ```rust
//! use logbin::prelude::*;
//!
//! let mut tree = BinningTree::<f64>::new();
//! for i in 0..1024 {
//!     tree.push((i as f64 * 0.1).sin());
//! }
//!
//! for level in 0..tree.levels_count() {
//!     if let Ok(err) = tree.std_error(level) {
//!         println!("level {}: stderr {}", level, err);
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! Algorithm families:
//! - `statistics` (default): running moments and the parallel merge formula
//! - `binning` (default): the logarithmic binning engine
//! - `full`: everything, including `serde`
//!
//! Platform and integrations:
//! - `std` (default): Standard library support
//! - `libm`: float math for `no_std` builds; without `std` it is required
//! - `serde`: Enable serialization
//! - `tracing`: Emit `tracing` events on level growth and rejected merges

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("logbin needs either the `std` or the `libm` feature for float math");

#[cfg(not(feature = "std"))]
extern crate alloc;

// Core traits always available
pub mod traits;

#[cfg(feature = "statistics")]
#[cfg_attr(docsrs, doc(cfg(feature = "statistics")))]
pub mod statistics;

#[cfg(feature = "binning")]
#[cfg_attr(docsrs, doc(cfg(feature = "binning")))]
pub mod binning;

pub mod prelude {
    pub use crate::traits::*;

    #[cfg(feature = "statistics")]
    pub use crate::statistics::Moments;

    #[cfg(feature = "binning")]
    pub use crate::binning::{BinningTree, LevelAccumulator, LevelStats, PairAccumulator};
}

#[cfg(feature = "statistics")]
pub use statistics::Moments;

#[cfg(feature = "binning")]
pub use binning::BinningTree;
