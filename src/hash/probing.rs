/// SIMD-batched linear probing
///
/// A whole register of keys is hashed and reduced to bucket indices at
/// once; the open-addressing scan itself runs per lane, loading full,
/// lane-aligned chunks of the bucket array and comparing simultaneously
/// against the probed key and the empty sentinel. The bucket array is
/// logically circular: a scan that reaches the end wraps to the start.
///
/// Keys are stored incremented by one; bucket value zero is reserved for
/// "empty" and no slot is ever cleared. Every scan is bounded by one full
/// cycle over the table, so a table with no matching or empty slot reports
/// exhaustion instead of spinning.
use crate::error::KernelError;
use crate::hash::{align_bucket_index, HashFunction, SizePolicy};
use crate::simd::{Element, LaneMask, ProcessingStyle};

/// Per-batch result of `insert_and_lookup`: dense group ids for all lanes,
/// plus the input positions and lane mask of the keys inserted for the
/// first time ("active extension").
pub struct GroupBatch<S: ProcessingStyle> {
    pub group_ids: S::Register,
    pub representatives: S::Register,
    pub extension_mask: LaneMask,
    pub extension_count: usize,
}

/// Outcome of one per-lane bucket scan.
enum Scan {
    Found { slot: usize },
    Empty { slot: usize },
    Exhausted,
}

/// Scan the bucket array for `stored_key` (already sentinel-encoded),
/// starting at the lane-aligned index for `reduced`, stepping one load
/// width at a time and wrapping at the end.
fn scan_bucket<T, S>(table_keys: &[T], reduced: usize, stored_key: T, lane_align: usize) -> Scan
where
    T: Element,
    S: ProcessingStyle<Elem = T>,
{
    let bucket_count = table_keys.len();
    let key_register = S::set1(stored_key);
    let zero_register = S::set1(T::ZERO);
    let mut index = align_bucket_index(reduced, lane_align);
    let mut scanned = 0;

    loop {
        let buckets = S::load(&table_keys[index..]);
        let hit = S::equal(buckets, key_register);
        if hit != 0 {
            return Scan::Found {
                slot: index + hit.trailing_zeros() as usize,
            };
        }
        let empty = S::equal(buckets, zero_register);
        if empty != 0 {
            return Scan::Empty {
                slot: index + empty.trailing_zeros() as usize,
            };
        }
        scanned += S::LANES;
        if scanned >= bucket_count {
            return Scan::Exhausted;
        }
        if index < bucket_count - S::LANES {
            index += S::LANES;
        } else {
            index = 0;
        }
    }
}

/// Hash a register of keys and reduce to bucket indices.
fn bucket_indices<T, S, H, P>(keys: S::Register, bucket_count: usize) -> S::Register
where
    T: Element,
    S: ProcessingStyle<Elem = T>,
    H: HashFunction<T>,
    P: SizePolicy,
{
    P::reduce::<S>(H::hash::<S>(keys), bucket_count)
}

/// Key-only lookup: mask and count of lanes whose key is present.
pub(crate) fn contains<T, S, H, P>(
    keys: S::Register,
    table_keys: &[T],
    lane_align: usize,
) -> (LaneMask, usize)
where
    T: Element,
    S: ProcessingStyle<Elem = T>,
    H: HashFunction<T>,
    P: SizePolicy,
{
    let indices = bucket_indices::<T, S, H, P>(keys, table_keys.len());
    let mut found_mask: LaneMask = 0;
    let mut found_count = 0;

    for lane in 0..S::LANES {
        let key = keys.as_ref()[lane];
        if key == T::MAX_VALUE {
            continue;
        }
        let stored = key.wrapping_add(T::ONE);
        let reduced = indices.as_ref()[lane].to_usize();
        if let Scan::Found { .. } = scan_bucket::<T, S>(table_keys, reduced, stored, lane_align) {
            found_mask |= 1 << lane;
            found_count += 1;
        }
    }
    (found_mask, found_count)
}

/// Map lookup: values for the found lanes (undefined lanes stay zero),
/// found mask, found count.
pub(crate) fn lookup_value<T, S, H, P>(
    keys: S::Register,
    table_keys: &[T],
    table_values: &[T],
    lane_align: usize,
) -> (S::Register, LaneMask, usize)
where
    T: Element,
    S: ProcessingStyle<Elem = T>,
    H: HashFunction<T>,
    P: SizePolicy,
{
    let indices = bucket_indices::<T, S, H, P>(keys, table_keys.len());
    let mut value_lanes = [T::ZERO; 32];
    let mut found_mask: LaneMask = 0;
    let mut found_count = 0;

    for lane in 0..S::LANES {
        let key = keys.as_ref()[lane];
        if key == T::MAX_VALUE {
            continue;
        }
        let stored = key.wrapping_add(T::ONE);
        let reduced = indices.as_ref()[lane].to_usize();
        if let Scan::Found { slot } = scan_bucket::<T, S>(table_keys, reduced, stored, lane_align)
        {
            value_lanes[lane] = table_values[slot];
            found_mask |= 1 << lane;
            found_count += 1;
        }
    }
    (S::load(&value_lanes), found_mask, found_count)
}

/// Key-only insert. Re-inserting a present key is a no-op.
pub(crate) fn insert_key<T, S, H, P>(
    keys: S::Register,
    table_keys: &mut [T],
    occupied: &mut usize,
    lane_align: usize,
) -> Result<(), KernelError>
where
    T: Element,
    S: ProcessingStyle<Elem = T>,
    H: HashFunction<T>,
    P: SizePolicy,
{
    let indices = bucket_indices::<T, S, H, P>(keys, table_keys.len());

    for lane in 0..S::LANES {
        let key = keys.as_ref()[lane];
        if key == T::MAX_VALUE {
            return Err(KernelError::ReservedKey {
                key: key.to_usize() as u64,
            });
        }
        let stored = key.wrapping_add(T::ONE);
        let reduced = indices.as_ref()[lane].to_usize();
        match scan_bucket::<T, S>(table_keys, reduced, stored, lane_align) {
            Scan::Found { .. } => {}
            Scan::Empty { slot } => {
                table_keys[slot] = stored;
                *occupied += 1;
            }
            Scan::Exhausted => {
                return Err(KernelError::TableFull {
                    bucket_count: table_keys.len(),
                });
            }
        }
    }
    Ok(())
}

/// Map insert. An existing key has its value overwritten (last write wins).
pub(crate) fn insert_pair<T, S, H, P>(
    keys: S::Register,
    values: S::Register,
    table_keys: &mut [T],
    table_values: &mut [T],
    occupied: &mut usize,
    lane_align: usize,
) -> Result<(), KernelError>
where
    T: Element,
    S: ProcessingStyle<Elem = T>,
    H: HashFunction<T>,
    P: SizePolicy,
{
    let indices = bucket_indices::<T, S, H, P>(keys, table_keys.len());

    for lane in 0..S::LANES {
        let key = keys.as_ref()[lane];
        if key == T::MAX_VALUE {
            return Err(KernelError::ReservedKey {
                key: key.to_usize() as u64,
            });
        }
        let stored = key.wrapping_add(T::ONE);
        let value = values.as_ref()[lane];
        let reduced = indices.as_ref()[lane].to_usize();
        match scan_bucket::<T, S>(table_keys, reduced, stored, lane_align) {
            Scan::Found { slot } => {
                table_values[slot] = value;
            }
            Scan::Empty { slot } => {
                table_keys[slot] = stored;
                table_values[slot] = value;
                *occupied += 1;
            }
            Scan::Exhausted => {
                return Err(KernelError::TableFull {
                    bucket_count: table_keys.len(),
                });
            }
        }
    }
    Ok(())
}

/// Combined insert-or-lookup with dense id assignment. A lane whose key is
/// already present reports the stored group id; a first-seen key claims the
/// next id from `next_group`, records `next_position` as its representative
/// position, and sets its bit in the extension mask. `next_position`
/// advances once per lane regardless.
pub(crate) fn insert_and_lookup<T, S, H, P>(
    keys: S::Register,
    next_position: &mut T,
    next_group: &mut T,
    table_keys: &mut [T],
    table_values: &mut [T],
    occupied: &mut usize,
    lane_align: usize,
) -> Result<GroupBatch<S>, KernelError>
where
    T: Element,
    S: ProcessingStyle<Elem = T>,
    H: HashFunction<T>,
    P: SizePolicy,
{
    let indices = bucket_indices::<T, S, H, P>(keys, table_keys.len());
    let mut group_lanes = [T::ZERO; 32];
    let mut representative_lanes = [T::ZERO; 32];
    let mut extension_mask: LaneMask = 0;
    let mut extension_count = 0;

    for lane in 0..S::LANES {
        let key = keys.as_ref()[lane];
        if key == T::MAX_VALUE {
            return Err(KernelError::ReservedKey {
                key: key.to_usize() as u64,
            });
        }
        let stored = key.wrapping_add(T::ONE);
        let reduced = indices.as_ref()[lane].to_usize();
        match scan_bucket::<T, S>(table_keys, reduced, stored, lane_align) {
            Scan::Found { slot } => {
                group_lanes[lane] = table_values[slot];
            }
            Scan::Empty { slot } => {
                table_keys[slot] = stored;
                table_values[slot] = *next_group;
                group_lanes[lane] = *next_group;
                representative_lanes[lane] = *next_position;
                *next_group = next_group.wrapping_add(T::ONE);
                extension_mask |= 1 << lane;
                extension_count += 1;
                *occupied += 1;
            }
            Scan::Exhausted => {
                return Err(KernelError::TableFull {
                    bucket_count: table_keys.len(),
                });
            }
        }
        *next_position = next_position.wrapping_add(T::ONE);
    }

    Ok(GroupBatch {
        group_ids: S::load(&group_lanes),
        representatives: S::load(&representative_lanes),
        extension_mask,
        extension_count,
    })
}

/// Composite-key scan: both key arrays are compared in lockstep. Only the
/// first key carries the sentinel encoding, so the empty test needs only
/// the first array.
fn scan_bucket_pair<T, S>(
    first_keys: &[T],
    second_keys: &[T],
    reduced: usize,
    stored_first: T,
    second: T,
    lane_align: usize,
) -> Scan
where
    T: Element,
    S: ProcessingStyle<Elem = T>,
{
    let bucket_count = first_keys.len();
    let first_register = S::set1(stored_first);
    let second_register = S::set1(second);
    let zero_register = S::set1(T::ZERO);
    let mut index = align_bucket_index(reduced, lane_align);
    let mut scanned = 0;

    loop {
        let first_buckets = S::load(&first_keys[index..]);
        let second_buckets = S::load(&second_keys[index..]);
        let hit = S::equal(first_buckets, first_register)
            & S::equal(second_buckets, second_register);
        if hit != 0 {
            return Scan::Found {
                slot: index + hit.trailing_zeros() as usize,
            };
        }
        let empty = S::equal(first_buckets, zero_register);
        if empty != 0 {
            return Scan::Empty {
                slot: index + empty.trailing_zeros() as usize,
            };
        }
        scanned += S::LANES;
        if scanned >= bucket_count {
            return Scan::Exhausted;
        }
        if index < bucket_count - S::LANES {
            index += S::LANES;
        } else {
            index = 0;
        }
    }
}

/// `insert_and_lookup` over a composite (double) key.
#[allow(clippy::too_many_arguments)]
pub(crate) fn insert_and_lookup_pair<T, S, H, P>(
    first: S::Register,
    second: S::Register,
    next_position: &mut T,
    next_group: &mut T,
    first_keys: &mut [T],
    second_keys: &mut [T],
    table_values: &mut [T],
    occupied: &mut usize,
    lane_align: usize,
) -> Result<GroupBatch<S>, KernelError>
where
    T: Element,
    S: ProcessingStyle<Elem = T>,
    H: HashFunction<T>,
    P: SizePolicy,
{
    let indices = P::reduce::<S>(H::hash_pair::<S>(first, second), first_keys.len());
    let mut group_lanes = [T::ZERO; 32];
    let mut representative_lanes = [T::ZERO; 32];
    let mut extension_mask: LaneMask = 0;
    let mut extension_count = 0;

    for lane in 0..S::LANES {
        let first_key = first.as_ref()[lane];
        if first_key == T::MAX_VALUE {
            return Err(KernelError::ReservedKey {
                key: first_key.to_usize() as u64,
            });
        }
        let stored_first = first_key.wrapping_add(T::ONE);
        let second_key = second.as_ref()[lane];
        let reduced = indices.as_ref()[lane].to_usize();
        match scan_bucket_pair::<T, S>(
            first_keys,
            second_keys,
            reduced,
            stored_first,
            second_key,
            lane_align,
        ) {
            Scan::Found { slot } => {
                group_lanes[lane] = table_values[slot];
            }
            Scan::Empty { slot } => {
                first_keys[slot] = stored_first;
                second_keys[slot] = second_key;
                table_values[slot] = *next_group;
                group_lanes[lane] = *next_group;
                representative_lanes[lane] = *next_position;
                *next_group = next_group.wrapping_add(T::ONE);
                extension_mask |= 1 << lane;
                extension_count += 1;
                *occupied += 1;
            }
            Scan::Exhausted => {
                return Err(KernelError::TableFull {
                    bucket_count: first_keys.len(),
                });
            }
        }
        *next_position = next_position.wrapping_add(T::ONE);
    }

    Ok(GroupBatch {
        group_ids: S::load(&group_lanes),
        representatives: S::load(&representative_lanes),
        extension_mask,
        extension_count,
    })
}
