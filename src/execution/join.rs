/// Natural equi-join operator
///
/// Build phase: every element of the build column is inserted into a hash
/// map as (key = value, value = absolute position). Probe phase: every
/// element of the probe column is looked up and each hit compress-stores a
/// (build position, probe position) pair into two parallel output columns.
/// Both phases run through the same three-phase batching plan as every
/// other kernel, at the granularity of hash-table operations.
///
/// Single-match semantics: duplicate build keys keep the last stored
/// position, so each probe element emits at most one pair.
use tracing::debug;

use crate::columnar::Column;
use crate::error::KernelError;
use crate::execution::batch::BatchPlan;
use crate::hash::{Exponential, HashFunction, HashMap, MultiplyModHash, SizePolicy};
use crate::simd::{Element, ProcessingStyle, Scalar};

fn build_batch<T, B, H, P>(
    map: &mut HashMap<T, H, P>,
    data: &[T],
    chunk_count: usize,
    start_position: usize,
) -> Result<(), KernelError>
where
    T: Element,
    B: ProcessingStyle<Elem = T>,
    H: HashFunction<T>,
    P: SizePolicy,
{
    for chunk in 0..chunk_count {
        let offset = chunk * B::LANES;
        let keys = B::load(&data[offset..]);
        let positions = B::sequence(T::from_usize(start_position + offset));
        map.insert::<B>(keys, positions)?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn probe_batch<T, B, H, P>(
    map: &HashMap<T, H, P>,
    data: &[T],
    chunk_count: usize,
    start_position: usize,
    out_build: &mut [T],
    out_probe: &mut [T],
    written: &mut usize,
) where
    T: Element,
    B: ProcessingStyle<Elem = T>,
    H: HashFunction<T>,
    P: SizePolicy,
{
    for chunk in 0..chunk_count {
        let offset = chunk * B::LANES;
        let keys = B::load(&data[offset..]);
        let (values, mask, count) = map.lookup::<B>(keys);
        let positions = B::sequence(T::from_usize(start_position + offset));
        B::compress_store(mask, &mut out_build[*written..], values);
        B::compress_store(mask, &mut out_probe[*written..], positions);
        *written += count;
    }
}

/// Join with explicit hash-function and size-policy plug-ins.
pub fn natural_equi_join_with<S, H, P>(
    build: &Column<S::Elem>,
    probe: &Column<S::Elem>,
) -> Result<(Column<S::Elem>, Column<S::Elem>), KernelError>
where
    S: ProcessingStyle,
    H: HashFunction<S::Elem>,
    P: SizePolicy,
{
    let build_population = build.population_count();
    let probe_population = probe.population_count();

    // pessimistic estimate: at most one match per probe element
    let mut result_build = Column::create(probe_population, S::vector_size_bytes());
    let mut result_probe = Column::create(probe_population, S::vector_size_bytes());

    let mut map: HashMap<S::Elem, H, P> = HashMap::with_estimate(build_population, S::LANES);

    if build_population > 0 {
        let data = build.data();
        let plan = BatchPlan::for_style::<S>(data);
        build_batch::<_, Scalar<S::Elem>, H, P>(&mut map, data, plan.prologue, 0)?;
        build_batch::<_, S, H, P>(
            &mut map,
            &data[plan.body_start()..],
            plan.body_chunks,
            plan.body_start(),
        )?;
        build_batch::<_, Scalar<S::Elem>, H, P>(
            &mut map,
            &data[plan.epilogue_start()..],
            plan.epilogue,
            plan.epilogue_start(),
        )?;
    }

    let mut hit_count = 0;
    if probe_population > 0 {
        let data = probe.data();
        let plan = BatchPlan::for_style::<S>(data);
        let out_build = result_build.data_mut();
        let out_probe = result_probe.data_mut();
        // both outputs advance through one shared cursor
        probe_batch::<_, Scalar<S::Elem>, H, P>(
            &map,
            data,
            plan.prologue,
            0,
            out_build,
            out_probe,
            &mut hit_count,
        );
        probe_batch::<_, S, H, P>(
            &map,
            &data[plan.body_start()..],
            plan.body_chunks,
            plan.body_start(),
            out_build,
            out_probe,
            &mut hit_count,
        );
        probe_batch::<_, Scalar<S::Elem>, H, P>(
            &map,
            &data[plan.epilogue_start()..],
            plan.epilogue,
            plan.epilogue_start(),
            out_build,
            out_probe,
            &mut hit_count,
        );
    }

    debug!(
        build = build_population,
        probe = probe_population,
        pairs = hit_count,
        "equi-join complete"
    );
    result_build.set_population_count(hit_count);
    result_probe.set_population_count(hit_count);
    Ok((result_build, result_probe))
}

/// Natural equi-join with the default plug-ins: multiplicative hashing and
/// a power-of-two table kept under the configured load factor.
pub fn natural_equi_join<S>(
    build: &Column<S::Elem>,
    probe: &Column<S::Elem>,
) -> Result<(Column<S::Elem>, Column<S::Elem>), KernelError>
where
    S: ProcessingStyle,
{
    natural_equi_join_with::<S, MultiplyModHash, Exponential>(build, probe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::U64x4;

    #[test]
    fn test_join_evens() {
        let build_values: Vec<u64> = (0..100).collect();
        let probe_values: Vec<u64> = (0..100).filter(|v| v % 2 == 0).collect();
        let build = Column::from_slice(&build_values, 32);
        let probe = Column::from_slice(&probe_values, 32);

        let (build_pos, probe_pos) = natural_equi_join::<U64x4>(&build, &probe).unwrap();
        assert_eq!(build_pos.population_count(), 50);
        assert_eq!(probe_pos.population_count(), 50);
        for i in 0..50 {
            let bp = build_pos[i] as usize;
            let pp = probe_pos[i] as usize;
            assert_eq!(build_values[bp], probe_values[pp]);
        }
    }

    #[test]
    fn test_join_each_matching_probe_row_emitted_once() {
        let build = Column::from_slice(&[10u64, 20, 30], 32);
        let probe = Column::from_slice(&[20u64, 20, 5, 30], 32);
        let (build_pos, probe_pos) = natural_equi_join::<U64x4>(&build, &probe).unwrap();
        assert_eq!(build_pos.population_count(), 3);
        assert_eq!(probe_pos.data(), &[0, 1, 3]);
        assert_eq!(build_pos.data(), &[1, 1, 2]);
    }

    #[test]
    fn test_join_duplicate_build_keys_last_write_wins() {
        let build = Column::from_slice(&[7u64, 7], 32);
        let probe = Column::from_slice(&[7u64], 32);
        let (build_pos, probe_pos) = natural_equi_join::<U64x4>(&build, &probe).unwrap();
        assert_eq!(build_pos.data(), &[1]);
        assert_eq!(probe_pos.data(), &[0]);
    }

    #[test]
    fn test_join_no_matches() {
        let build = Column::from_slice(&[1u64, 2, 3], 32);
        let probe = Column::from_slice(&[4u64, 5], 32);
        let (build_pos, probe_pos) = natural_equi_join::<U64x4>(&build, &probe).unwrap();
        assert_eq!(build_pos.population_count(), 0);
        assert_eq!(probe_pos.population_count(), 0);
    }

    #[test]
    fn test_join_empty_inputs() {
        let empty: Column<u64> = Column::create(0, 32);
        let probe = Column::from_slice(&[1u64, 2], 32);
        let (build_pos, probe_pos) = natural_equi_join::<U64x4>(&empty, &probe).unwrap();
        assert_eq!(build_pos.population_count(), 0);
        assert_eq!(probe_pos.population_count(), 0);
    }

    #[test]
    fn test_join_reserved_build_key_reported() {
        let build = Column::from_slice(&[u64::MAX], 32);
        let probe = Column::from_slice(&[1u64], 32);
        let result = natural_equi_join::<U64x4>(&build, &probe);
        assert!(matches!(result, Err(KernelError::ReservedKey { .. })));
    }
}
