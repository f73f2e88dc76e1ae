//! # Columnar Kernels
//!
//! SIMD-accelerated relational operator kernels over flat, contiguous typed
//! columns: selection, projection, binary arithmetic, aggregation, hash-based
//! equi-join, grouping, and sorted-set intersection/merge.
//!
//! Every kernel is written once, generic over a [`simd::ProcessingStyle`]
//! (element type + lane width), and driven through a three-phase batching
//! plan: a scalar prologue up to the first aligned address, a full-width
//! vector body, and a scalar epilogue for the remainder.
//!
//! ## Quick Start
//!
//! ```rust
//! use columnar_kernels::columnar::Column;
//! use columnar_kernels::execution::select::{select, GreaterThan};
//! use columnar_kernels::simd::U64x4;
//!
//! let values: Vec<u64> = (0..100).collect();
//! let column = Column::from_slice(&values, 32);
//!
//! // Positions of all elements greater than 50
//! let positions = select::<U64x4, _>(&column, GreaterThan(50));
//! assert_eq!(positions.population_count(), 49);
//! ```

// Internal modules
pub mod columnar;
pub mod error;
pub mod execution;
pub mod hash;
pub mod simd;

// Public API - main types users need
pub use columnar::alignment::Alignment;
pub use columnar::column::Column;
pub use error::KernelError;
pub use simd::{Element, Lanes, ProcessingStyle, Scalar};

// Re-export the dispatching convenience layer
pub use execution::dispatch::FilterPredicate;
