/// Grouping operator
///
/// Assigns a dense group id to every input element (equal values share an
/// id, ids are issued in first-occurrence order) and emits the positions
/// where each group first occurred. Built directly on the hash map's
/// insert-or-lookup path: the running position and group-id counters are
/// explicit accumulators threaded through the batches.
use tracing::debug;

use crate::columnar::Column;
use crate::error::KernelError;
use crate::execution::batch::BatchPlan;
use crate::hash::{Exponential, HashFunction, HashMap, MultiplyModHash, SizePolicy};
use crate::simd::{Element, ProcessingStyle, Scalar};

#[allow(clippy::too_many_arguments)]
fn group_batch<T, B, H, P>(
    map: &mut HashMap<T, H, P>,
    data: &[T],
    chunk_count: usize,
    next_position: &mut T,
    next_group: &mut T,
    out_ids: &mut [T],
    out_representatives: &mut [T],
    id_cursor: &mut usize,
    representative_cursor: &mut usize,
) -> Result<(), KernelError>
where
    T: Element,
    B: ProcessingStyle<Elem = T>,
    H: HashFunction<T>,
    P: SizePolicy,
{
    for chunk in 0..chunk_count {
        let keys = B::load(&data[chunk * B::LANES..]);
        let batch = map.insert_and_lookup::<B>(keys, next_position, next_group)?;
        B::store(&mut out_ids[*id_cursor..], batch.group_ids);
        *id_cursor += B::LANES;
        B::compress_store(
            batch.extension_mask,
            &mut out_representatives[*representative_cursor..],
            batch.representatives,
        );
        *representative_cursor += batch.extension_count;
    }
    Ok(())
}

/// Group a column: returns (group ids, first-occurrence positions).
/// The ids column has the input population; the representatives column has
/// one entry per distinct value.
pub fn group<S>(
    column: &Column<S::Elem>,
) -> Result<(Column<S::Elem>, Column<S::Elem>), KernelError>
where
    S: ProcessingStyle,
{
    let population = column.population_count();
    let mut ids = Column::create(population, S::vector_size_bytes());
    let mut representatives = Column::create(population, S::vector_size_bytes());
    if population == 0 {
        return Ok((ids, representatives));
    }

    let mut map: HashMap<S::Elem, MultiplyModHash, Exponential> =
        HashMap::with_estimate(population, S::LANES);

    let data = column.data();
    let plan = BatchPlan::for_style::<S>(data);

    let mut next_position = <S::Elem as Element>::ZERO;
    let mut next_group = <S::Elem as Element>::ZERO;
    let mut id_cursor = 0;
    let mut representative_cursor = 0;

    let out_ids = ids.data_mut();
    let out_representatives = representatives.data_mut();

    group_batch::<_, Scalar<S::Elem>, _, _>(
        &mut map,
        data,
        plan.prologue,
        &mut next_position,
        &mut next_group,
        out_ids,
        out_representatives,
        &mut id_cursor,
        &mut representative_cursor,
    )?;
    group_batch::<_, S, _, _>(
        &mut map,
        &data[plan.body_start()..],
        plan.body_chunks,
        &mut next_position,
        &mut next_group,
        out_ids,
        out_representatives,
        &mut id_cursor,
        &mut representative_cursor,
    )?;
    group_batch::<_, Scalar<S::Elem>, _, _>(
        &mut map,
        &data[plan.epilogue_start()..],
        plan.epilogue,
        &mut next_position,
        &mut next_group,
        out_ids,
        out_representatives,
        &mut id_cursor,
        &mut representative_cursor,
    )?;

    debug!(
        population,
        groups = representative_cursor,
        "grouping complete"
    );
    ids.set_population_count(population);
    representatives.set_population_count(representative_cursor);
    Ok((ids, representatives))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::U64x4;

    #[test]
    fn test_group_ids_dense_in_first_occurrence_order() {
        let values = vec![5u64, 5, 9, 5, 2, 9, 2];
        let column = Column::from_slice(&values, 32);
        let (ids, representatives) = group::<U64x4>(&column).unwrap();
        assert_eq!(ids.data(), &[0, 0, 1, 0, 2, 1, 2]);
        assert_eq!(representatives.data(), &[0, 2, 4]);
    }

    #[test]
    fn test_group_all_distinct() {
        let values: Vec<u64> = (0..20).collect();
        let column = Column::from_slice(&values, 32);
        let (ids, representatives) = group::<U64x4>(&column).unwrap();
        let expected: Vec<u64> = (0..20).collect();
        assert_eq!(ids.data(), expected.as_slice());
        assert_eq!(representatives.data(), expected.as_slice());
    }

    #[test]
    fn test_group_single_value() {
        let values = vec![3u64; 17];
        let column = Column::from_slice(&values, 32);
        let (ids, representatives) = group::<U64x4>(&column).unwrap();
        assert!(ids.data().iter().all(|&id| id == 0));
        assert_eq!(representatives.data(), &[0]);
    }

    #[test]
    fn test_group_empty() {
        let column: Column<u64> = Column::create(0, 32);
        let (ids, representatives) = group::<U64x4>(&column).unwrap();
        assert_eq!(ids.population_count(), 0);
        assert_eq!(representatives.population_count(), 0);
    }
}
