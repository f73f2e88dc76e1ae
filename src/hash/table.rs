/// Fixed-capacity open-addressing containers
///
/// Three variants over the same bucket-array machinery: a key-only set, a
/// key-to-value map, and a composite-key map. Capacity is fixed at
/// construction from a distinct-count estimate and the maximum load factor;
/// there is no resizing, no deletion, and no tombstones. Bucket arrays are
/// zero-initialized and vector-width aligned so the probe loops always load
/// full lanes.
use std::marker::PhantomData;
use std::mem;

use tracing::debug;

use crate::columnar::column::AlignedBuffer;
use crate::error::KernelError;
use crate::hash::probing::{
    contains, insert_and_lookup, insert_and_lookup_pair, insert_key, insert_pair, lookup_value,
    GroupBatch,
};
use crate::hash::{slots_for_estimate, Exponential, HashFunction, MultiplyModHash, SizePolicy};
use crate::simd::{Element, LaneMask, ProcessingStyle};

fn bucket_array<T: Element>(bucket_count: usize, lane_align: usize) -> AlignedBuffer<T> {
    AlignedBuffer::zeroed(bucket_count, lane_align * mem::size_of::<T>())
}

/// Key-only hash set.
pub struct HashSet<T: Element, H = MultiplyModHash, P = Exponential> {
    keys: AlignedBuffer<T>,
    bucket_count: usize,
    lane_align: usize,
    occupied: usize,
    _plugins: PhantomData<(H, P)>,
}

impl<T, H, P> HashSet<T, H, P>
where
    T: Element,
    H: HashFunction<T>,
    P: SizePolicy,
{
    /// Size for `distinct_estimate` keys, probed at lane widths up to
    /// `lane_align` (a power of two).
    pub fn with_estimate(distinct_estimate: usize, lane_align: usize) -> Self {
        assert!(lane_align.is_power_of_two());
        let bucket_count = P::bucket_count(slots_for_estimate(distinct_estimate), lane_align);
        debug!(distinct_estimate, bucket_count, "hash set sized");
        Self {
            keys: bucket_array(bucket_count, lane_align),
            bucket_count,
            lane_align,
            occupied: 0,
            _plugins: PhantomData,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn occupied(&self) -> usize {
        self.occupied
    }

    pub fn insert<S: ProcessingStyle<Elem = T>>(
        &mut self,
        keys: S::Register,
    ) -> Result<(), KernelError> {
        debug_assert!(S::LANES <= self.lane_align);
        insert_key::<T, S, H, P>(
            keys,
            self.keys.as_mut_slice(),
            &mut self.occupied,
            self.lane_align,
        )
    }

    /// Mask and count of lanes whose key is present.
    pub fn lookup<S: ProcessingStyle<Elem = T>>(&self, keys: S::Register) -> (LaneMask, usize) {
        debug_assert!(S::LANES <= self.lane_align);
        contains::<T, S, H, P>(keys, self.keys.as_slice(), self.lane_align)
    }
}

/// Single-key, single-value hash map.
pub struct HashMap<T: Element, H = MultiplyModHash, P = Exponential> {
    keys: AlignedBuffer<T>,
    values: AlignedBuffer<T>,
    bucket_count: usize,
    lane_align: usize,
    occupied: usize,
    _plugins: PhantomData<(H, P)>,
}

impl<T, H, P> HashMap<T, H, P>
where
    T: Element,
    H: HashFunction<T>,
    P: SizePolicy,
{
    pub fn with_estimate(distinct_estimate: usize, lane_align: usize) -> Self {
        assert!(lane_align.is_power_of_two());
        let bucket_count = P::bucket_count(slots_for_estimate(distinct_estimate), lane_align);
        debug!(distinct_estimate, bucket_count, "hash map sized");
        Self {
            keys: bucket_array(bucket_count, lane_align),
            values: bucket_array(bucket_count, lane_align),
            bucket_count,
            lane_align,
            occupied: 0,
            _plugins: PhantomData,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn occupied(&self) -> usize {
        self.occupied
    }

    /// Insert a register of key/value pairs; an existing key has its value
    /// overwritten (last write wins).
    pub fn insert<S: ProcessingStyle<Elem = T>>(
        &mut self,
        keys: S::Register,
        values: S::Register,
    ) -> Result<(), KernelError> {
        debug_assert!(S::LANES <= self.lane_align);
        insert_pair::<T, S, H, P>(
            keys,
            values,
            self.keys.as_mut_slice(),
            self.values.as_mut_slice(),
            &mut self.occupied,
            self.lane_align,
        )
    }

    /// Values for the found lanes, the found mask, and the found count.
    pub fn lookup<S: ProcessingStyle<Elem = T>>(
        &self,
        keys: S::Register,
    ) -> (S::Register, LaneMask, usize) {
        debug_assert!(S::LANES <= self.lane_align);
        lookup_value::<T, S, H, P>(keys, self.keys.as_slice(), self.values.as_slice(), self.lane_align)
    }

    /// Insert-or-lookup with dense group-id assignment; the running
    /// counters are threaded through by the caller.
    pub fn insert_and_lookup<S: ProcessingStyle<Elem = T>>(
        &mut self,
        keys: S::Register,
        next_position: &mut T,
        next_group: &mut T,
    ) -> Result<GroupBatch<S>, KernelError> {
        debug_assert!(S::LANES <= self.lane_align);
        insert_and_lookup::<T, S, H, P>(
            keys,
            next_position,
            next_group,
            self.keys.as_mut_slice(),
            self.values.as_mut_slice(),
            &mut self.occupied,
            self.lane_align,
        )
    }
}

/// Composite-key (two keys), single-value hash map.
pub struct BinaryKeyMap<T: Element, H = MultiplyModHash, P = Exponential> {
    first_keys: AlignedBuffer<T>,
    second_keys: AlignedBuffer<T>,
    values: AlignedBuffer<T>,
    bucket_count: usize,
    lane_align: usize,
    occupied: usize,
    _plugins: PhantomData<(H, P)>,
}

impl<T, H, P> BinaryKeyMap<T, H, P>
where
    T: Element,
    H: HashFunction<T>,
    P: SizePolicy,
{
    pub fn with_estimate(distinct_estimate: usize, lane_align: usize) -> Self {
        assert!(lane_align.is_power_of_two());
        let bucket_count = P::bucket_count(slots_for_estimate(distinct_estimate), lane_align);
        debug!(distinct_estimate, bucket_count, "binary-key map sized");
        Self {
            first_keys: bucket_array(bucket_count, lane_align),
            second_keys: bucket_array(bucket_count, lane_align),
            values: bucket_array(bucket_count, lane_align),
            bucket_count,
            lane_align,
            occupied: 0,
            _plugins: PhantomData,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn occupied(&self) -> usize {
        self.occupied
    }

    pub fn insert_and_lookup<S: ProcessingStyle<Elem = T>>(
        &mut self,
        first: S::Register,
        second: S::Register,
        next_position: &mut T,
        next_group: &mut T,
    ) -> Result<GroupBatch<S>, KernelError> {
        debug_assert!(S::LANES <= self.lane_align);
        insert_and_lookup_pair::<T, S, H, P>(
            first,
            second,
            next_position,
            next_group,
            self.first_keys.as_mut_slice(),
            self.second_keys.as_mut_slice(),
            self.values.as_mut_slice(),
            &mut self.occupied,
            self.lane_align,
        )
    }
}
