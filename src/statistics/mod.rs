//! Statistical summaries for streaming data
//!
//! This module provides single-pass moment accumulation and the parallel
//! combination formula the binning levels are built on.
//!
//! # Example
//!
//! ```
//! use logbin::statistics::Moments;
//!
//! let mut moments = Moments::new();
//!
//! for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
//!     moments.push(value);
//! }
//!
//! println!("Mean: {:?}", moments.mean());
//! println!("Variance: {:?}", moments.sample_variance());
//! ```

mod moments;

pub use moments::{combine_moments, Moments};
