/// Join and hash-engine integration tests: pair correctness, duplicate
/// handling, capacity reporting, grouping, and the dispatch wrappers.
///
/// Run with: cargo test --test join_integration
use std::collections::{HashMap as StdHashMap, HashSet as StdHashSet};

use anyhow::Result;

use columnar_kernels::columnar::Column;
use columnar_kernels::execution::dispatch::{filter_u64, join_u64, FilterPredicate};
use columnar_kernels::execution::group::group;
use columnar_kernels::execution::join::{natural_equi_join, natural_equi_join_with};
use columnar_kernels::hash::{Arbitrary, FxMixHash, HashMap, MultiplyModHash};
use columnar_kernels::simd::{Scalar, U64x4, U64x8};
use columnar_kernels::KernelError;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_join_pairs_reference() -> Result<()> {
    let build_values: Vec<u64> = (0..100).collect();
    let probe_values: Vec<u64> = (0..100).filter(|v| v % 2 == 0).collect();
    let build = Column::from_slice(&build_values, 64);
    let probe = Column::from_slice(&probe_values, 64);

    let (build_pos, probe_pos) = natural_equi_join::<U64x4>(&build, &probe)?;
    assert_eq!(build_pos.population_count(), 50);
    assert_eq!(probe_pos.population_count(), 50);

    let mut seen_probe_rows = StdHashSet::new();
    for i in 0..50 {
        let bp = build_pos[i] as usize;
        let pp = probe_pos[i] as usize;
        assert_eq!(build_values[bp], probe_values[pp]);
        // exactly one pair per matching probe row
        assert!(seen_probe_rows.insert(pp));
    }
    Ok(())
}

#[test]
fn test_join_random_inputs_match_reference_join() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let build_values: Vec<u64> = (0..800).map(|_| rng.gen_range(1..2000)).collect();
    let probe_values: Vec<u64> = (0..600).map(|_| rng.gen_range(1..2000)).collect();

    // reference: last build position per key, one pair per matching probe row
    let mut reference: StdHashMap<u64, u64> = StdHashMap::new();
    for (position, &key) in build_values.iter().enumerate() {
        reference.insert(key, position as u64);
    }
    let expected_pairs: Vec<(u64, u64)> = probe_values
        .iter()
        .enumerate()
        .filter_map(|(pp, key)| reference.get(key).map(|&bp| (bp, pp as u64)))
        .collect();

    let (build_pos, probe_pos) = natural_equi_join::<U64x8>(
        &Column::from_slice(&build_values, 64),
        &Column::from_slice(&probe_values, 64),
    )?;

    let pairs: Vec<(u64, u64)> = (0..build_pos.population_count())
        .map(|i| (build_pos[i], probe_pos[i]))
        .collect();
    assert_eq!(pairs, expected_pairs);
    Ok(())
}

#[test]
fn test_join_scalar_and_vector_styles_agree() -> Result<()> {
    let build_values: Vec<u64> = (0..200).map(|v| v * 13 % 311).collect();
    let probe_values: Vec<u64> = (0..150).map(|v| v * 7 % 311).collect();
    let build = Column::from_slice(&build_values, 64);
    let probe = Column::from_slice(&probe_values, 64);

    let (narrow_build, narrow_probe) = natural_equi_join::<Scalar<u64>>(&build, &probe)?;
    let (wide_build, wide_probe) = natural_equi_join::<U64x8>(&build, &probe)?;
    assert_eq!(narrow_build.data(), wide_build.data());
    assert_eq!(narrow_probe.data(), wide_probe.data());
    Ok(())
}

#[test]
fn test_join_on_unaligned_chunks() -> Result<()> {
    let values: Vec<u64> = (0..128).collect();
    let column = Column::from_slice(&values, 64);
    let build = column.chunk(3, 100);
    let probe = column.chunk(7, 50);

    let (build_pos, probe_pos) = natural_equi_join::<U64x4>(&build, &probe)?;
    // probe values 7..57 all exist in build values 3..103
    assert_eq!(build_pos.population_count(), 50);
    for i in 0..50 {
        assert_eq!(build.get(build_pos[i] as usize), probe.get(probe_pos[i] as usize));
    }
    Ok(())
}

#[test]
fn test_join_with_alternate_plugins() -> Result<()> {
    let build = Column::from_slice(&(0..50u64).collect::<Vec<_>>(), 64);
    let probe = Column::from_slice(&[5u64, 15, 55], 64);

    let (fx_build, fx_probe) =
        natural_equi_join_with::<U64x4, FxMixHash, Arbitrary>(&build, &probe)?;
    assert_eq!(fx_build.data(), &[5, 15]);
    assert_eq!(fx_probe.data(), &[0, 1]);
    Ok(())
}

#[test]
fn test_undersized_table_reports_full_instead_of_spinning() {
    // a map sized for 2 distinct keys cannot absorb hundreds of them
    let mut map: HashMap<u64, MultiplyModHash> = HashMap::with_estimate(2, 4);
    let mut outcome = Ok(());
    for key in 0..1000u64 {
        outcome = map.insert::<Scalar<u64>>([key], [key]);
        if outcome.is_err() {
            break;
        }
    }
    assert!(matches!(outcome, Err(KernelError::TableFull { .. })));
}

#[test]
fn test_group_matches_reference() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let values: Vec<u64> = (0..500).map(|_| rng.gen_range(0..40)).collect();
    let column = Column::from_slice(&values, 64);

    let (ids, representatives) = group::<U64x4>(&column)?;

    // reference: dense ids in first-occurrence order
    let mut reference: StdHashMap<u64, u64> = StdHashMap::new();
    let mut expected_representatives = Vec::new();
    let mut expected_ids = Vec::new();
    for (position, &value) in values.iter().enumerate() {
        let next = reference.len() as u64;
        let id = *reference.entry(value).or_insert_with(|| {
            expected_representatives.push(position as u64);
            next
        });
        expected_ids.push(id);
    }

    assert_eq!(ids.data(), expected_ids.as_slice());
    assert_eq!(representatives.data(), expected_representatives.as_slice());
    Ok(())
}

#[test]
fn test_dispatch_join_and_filter_compose() -> Result<()> {
    let values: Vec<u64> = (0..64).collect();
    let column = Column::from_slice(&values, 64);

    let evens = filter_u64(
        &column,
        FilterPredicate::Between(0, 63),
    );
    assert_eq!(evens.population_count(), 64);

    let probe = Column::from_slice(&[10u64, 90], 64);
    let (build_pos, probe_pos) = join_u64(&column, &probe)?;
    assert_eq!(build_pos.data(), &[10]);
    assert_eq!(probe_pos.data(), &[0]);
    Ok(())
}
