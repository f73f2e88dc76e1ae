/// Equi-join benchmark: build/probe throughput across styles and
/// match rates
///
/// Run with: cargo bench --bench join_bench
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use columnar_kernels::columnar::Column;
use columnar_kernels::execution::join::natural_equi_join;
use columnar_kernels::simd::{Scalar, U64x4, U64x8};

fn join_benchmarks(c: &mut Criterion) {
    let sizes = vec![1_000usize, 10_000, 100_000];
    let mut rng = StdRng::seed_from_u64(0xBEEF);

    let mut group = c.benchmark_group("natural_equi_join_u64");
    for size in &sizes {
        // half the probe keys hit the build side
        let build_values: Vec<u64> = (0..*size as u64).collect();
        let probe_values: Vec<u64> = (0..*size)
            .map(|_| rng.gen_range(0..(*size as u64 * 2)))
            .collect();
        let build = Column::from_slice(&build_values, 64);
        let probe = Column::from_slice(&probe_values, 64);

        group.bench_with_input(BenchmarkId::new("scalar", size), size, |b, _| {
            b.iter(|| black_box(natural_equi_join::<Scalar<u64>>(&build, &probe).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("x4", size), size, |b, _| {
            b.iter(|| black_box(natural_equi_join::<U64x4>(&build, &probe).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("x8", size), size, |b, _| {
            b.iter(|| black_box(natural_equi_join::<U64x8>(&build, &probe).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, join_benchmarks);
criterion_main!(benches);
