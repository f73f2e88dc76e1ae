/// Hash-based data structures for the join and grouping kernels
///
/// Fixed-capacity open-addressing tables with SIMD-batched linear probing.
/// Hash function and capacity/size policy are pluggable and selected
/// statically so they inline into the probe loops.

pub mod probing;
pub mod table;

pub use probing::GroupBatch;
pub use table::{BinaryKeyMap, HashMap, HashSet};

use crate::simd::{Element, ProcessingStyle};

/// Maximum load factor the sizing honors, in percent.
pub const MAX_LOAD_PERCENT: usize = 60;

/// Multiplicative hash prime, (1 << 16) + 1.
pub const HASH_PRIME: usize = 65_537;

/// Vectorized hash plug-in: maps a register of keys to a register of hash
/// values. The double-key form combines both keys before mixing.
pub trait HashFunction<T: Element> {
    fn hash<S: ProcessingStyle<Elem = T>>(keys: S::Register) -> S::Register;

    fn hash_pair<S: ProcessingStyle<Elem = T>>(
        first: S::Register,
        second: S::Register,
    ) -> S::Register;
}

/// Multiplicative hashing: `key * prime`, wrapping. The double-key form
/// multiplies the keys together first.
pub struct MultiplyModHash;

impl<T: Element> HashFunction<T> for MultiplyModHash {
    #[inline]
    fn hash<S: ProcessingStyle<Elem = T>>(keys: S::Register) -> S::Register {
        S::mul(keys, S::set1(T::from_usize(HASH_PRIME)))
    }

    #[inline]
    fn hash_pair<S: ProcessingStyle<Elem = T>>(
        first: S::Register,
        second: S::Register,
    ) -> S::Register {
        Self::hash::<S>(S::mul(first, second))
    }
}

/// FxHash-based mixing, lane by lane. Stronger scrambling than the
/// multiplicative hash for adversarial key sets.
pub struct FxMixHash;

impl<T: Element> HashFunction<T> for FxMixHash {
    #[inline]
    fn hash<S: ProcessingStyle<Elem = T>>(keys: S::Register) -> S::Register {
        S::map(keys, |key| {
            T::from_usize(fxhash::hash64(&key.to_usize()) as usize)
        })
    }

    #[inline]
    fn hash_pair<S: ProcessingStyle<Elem = T>>(
        first: S::Register,
        second: S::Register,
    ) -> S::Register {
        Self::hash::<S>(S::mul(first, second))
    }
}

/// Capacity policy: how the bucket count is chosen and how a hash value is
/// reduced into `[0, bucket_count)`.
pub trait SizePolicy {
    /// Bucket count for at least `min_slots` slots, rounded so it stays a
    /// multiple of `lane_align`.
    fn bucket_count(min_slots: usize, lane_align: usize) -> usize;

    /// Reduce a register of hash values into bucket indices.
    fn reduce<S: ProcessingStyle>(hashes: S::Register, bucket_count: usize) -> S::Register;
}

/// Arbitrary capacity with modulo reduction.
pub struct Arbitrary;

impl SizePolicy for Arbitrary {
    fn bucket_count(min_slots: usize, lane_align: usize) -> usize {
        let slots = min_slots.max(lane_align);
        slots.div_ceil(lane_align) * lane_align
    }

    #[inline]
    fn reduce<S: ProcessingStyle>(hashes: S::Register, bucket_count: usize) -> S::Register {
        S::map(hashes, |h| {
            <S::Elem as Element>::from_usize(h.to_usize() % bucket_count)
        })
    }
}

/// Power-of-two capacity with bitmask reduction.
pub struct Exponential;

impl SizePolicy for Exponential {
    fn bucket_count(min_slots: usize, lane_align: usize) -> usize {
        debug_assert!(lane_align.is_power_of_two());
        min_slots.max(lane_align).next_power_of_two()
    }

    #[inline]
    fn reduce<S: ProcessingStyle>(hashes: S::Register, bucket_count: usize) -> S::Register {
        debug_assert!(bucket_count.is_power_of_two());
        let mask = <S::Elem as Element>::from_usize(bucket_count - 1);
        S::bitand(hashes, S::set1(mask))
    }
}

/// Slot count needed to keep `distinct_estimate` keys under the maximum
/// load factor.
pub fn slots_for_estimate(distinct_estimate: usize) -> usize {
    distinct_estimate * 100 / MAX_LOAD_PERCENT + 1
}

/// Align a bucket index down to a lane boundary, so probing always loads a
/// full, naturally aligned lane of the bucket array.
#[inline]
pub fn align_bucket_index(index: usize, lane_align: usize) -> usize {
    debug_assert!(lane_align.is_power_of_two());
    index & !(lane_align - 1)
}
