//! Online logarithmic binning
//!
//! Estimates the mean of a correlated stream together with the variance of
//! block averages over block sizes `1, 2, 4, 8, ...`, in a single pass and
//! `O(log N)` memory.
//!
//! # Components
//!
//! - [`PairAccumulator`]: holds at most one value until its partner arrives
//! - [`LevelAccumulator`]: running mean and variance of one binning level
//! - [`BinningTree`]: the hierarchy of levels, grown on demand
//!
//! # Example
//!
//! ```
//! use logbin::binning::BinningTree;
//!
//! let mut tree = BinningTree::<f64>::new();
//!
//! // AR(1)-like correlated series
//! let mut x = 0.0;
//! for i in 0..4096u32 {
//!     let noise = ((i.wrapping_mul(2654435761) >> 16) % 1000) as f64 / 1000.0 - 0.5;
//!     x = 0.9 * x + noise;
//!     tree.push(x);
//! }
//!
//! for row in tree.summary() {
//!     println!("level {:2} block {:5} stderr {:?}", row.level, row.block_size, row.std_error);
//! }
//! ```

mod level;
mod pair;
mod snapshot;
mod summary;
mod tree;

pub use level::LevelAccumulator;
pub use pair::{combine, CompletedPair, PairAccumulator};
pub use snapshot::LevelSnapshot;
pub use summary::LevelStats;
pub use tree::BinningTree;
