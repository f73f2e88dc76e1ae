/// Projection (gather) kernel
///
/// Materializes `source[positions[i]]` for every valid position. The
/// batching plan is driven by the positions column; the source column is
/// random-accessed, so only the position loads benefit from alignment.
use tracing::trace;

use crate::columnar::Column;
use crate::execution::batch::BatchPlan;
use crate::simd::{Element, ProcessingStyle, Scalar};

fn project_batch<T, S>(out: &mut [T], source: &[T], positions: &[T], chunk_count: usize)
where
    T: Element,
    S: ProcessingStyle<Elem = T>,
{
    for chunk in 0..chunk_count {
        let offset = chunk * S::LANES;
        let position_chunk = S::load(&positions[offset..]);
        let values = S::gather(source, position_chunk);
        S::store(&mut out[offset..], values);
    }
}

/// Gather `source[positions[i]]` into a new column. Output population always
/// equals the positions population; positions past the source population are
/// a caller contract violation and panic.
pub fn project<S>(source: &Column<S::Elem>, positions: &Column<S::Elem>) -> Column<S::Elem>
where
    S: ProcessingStyle,
{
    let population = positions.population_count();
    let mut result = Column::create(population, S::vector_size_bytes());
    if population == 0 {
        result.set_population_count(0);
        return result;
    }

    let source_data = source.data();
    let position_data = positions.data();
    let plan = BatchPlan::for_style::<S>(position_data);
    trace!(
        population,
        prologue = plan.prologue,
        body_chunks = plan.body_chunks,
        epilogue = plan.epilogue,
        "project batching plan"
    );

    let out = result.data_mut();
    project_batch::<_, Scalar<S::Elem>>(
        out,
        source_data,
        &position_data[..plan.prologue],
        plan.prologue,
    );
    project_batch::<_, S>(
        &mut out[plan.body_start()..],
        source_data,
        &position_data[plan.body_start()..],
        plan.body_chunks,
    );
    project_batch::<_, Scalar<S::Elem>>(
        &mut out[plan.epilogue_start()..],
        source_data,
        &position_data[plan.epilogue_start()..],
        plan.epilogue,
    );

    result.set_population_count(population);
    result
}

/// Chained projection: resolves a sequence of position columns into a single
/// gather from `source`. Each stage's positions are looked up through the
/// next position column, right to left, before the final gather.
pub fn projection_path<S>(
    source: &Column<S::Elem>,
    positions: &[&Column<S::Elem>],
) -> Column<S::Elem>
where
    S: ProcessingStyle,
{
    assert!(
        !positions.is_empty(),
        "projection path needs at least one position column"
    );
    let mut current = positions[0].clone();
    for stage in &positions[1..] {
        current = project::<S>(stage, &current);
    }
    project::<S>(source, &current)
}
