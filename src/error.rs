/// Unified error type for the kernel library
/// Only reportable runtime conditions live here; contract violations
/// (mismatched populations, bad alignment values) fail fast via assertions.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Fixed-capacity hash table has no empty bucket left for a new key.
    /// Tables never resize; the caller's distinct-count estimate was too low.
    #[error("hash table full: all {bucket_count} buckets occupied")]
    TableFull { bucket_count: usize },

    /// The maximum representable key value collides with the empty-bucket
    /// sentinel encoding (keys are stored incremented by one).
    #[error("key {key} is reserved by the empty-bucket encoding")]
    ReservedKey { key: u64 },
}
