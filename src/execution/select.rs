/// Selection (filter) kernel
///
/// Compares every element of a column against broadcast predicate constants
/// and emits the positions of the matches, compacted and in ascending order.
/// The position counter is seeded from the running absolute element index,
/// so matches land on correct positions no matter which phase found them.
use bitvec::vec::BitVec;
use tracing::trace;

use crate::columnar::Column;
use crate::execution::batch::BatchPlan;
use crate::simd::{Element, LaneMask, ProcessingStyle, Scalar};

/// Predicate plug-in: compares a register of data against constants that
/// were broadcast once per phase, not per chunk. Selected statically so the
/// comparison inlines into the chunk loop.
pub trait Comparator<T: Element>: Copy {
    /// Broadcast (register) form of the predicate constants.
    type Broadcast<S: ProcessingStyle<Elem = T>>: Copy;

    fn broadcast<S: ProcessingStyle<Elem = T>>(&self) -> Self::Broadcast<S>;

    /// Lane mask of elements satisfying the predicate.
    fn matches<S: ProcessingStyle<Elem = T>>(
        predicate: &Self::Broadcast<S>,
        data: S::Register,
    ) -> LaneMask;
}

macro_rules! single_bound_comparator {
    ($(#[$doc:meta])* $name:ident, $cmp:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name<T: Element>(pub T);

        impl<T: Element> Comparator<T> for $name<T> {
            type Broadcast<S: ProcessingStyle<Elem = T>> = S::Register;

            #[inline]
            fn broadcast<S: ProcessingStyle<Elem = T>>(&self) -> S::Register {
                S::set1(self.0)
            }

            #[inline]
            fn matches<S: ProcessingStyle<Elem = T>>(
                predicate: &S::Register,
                data: S::Register,
            ) -> LaneMask {
                S::$cmp(data, *predicate)
            }
        }
    };
}

single_bound_comparator!(
    /// Elements equal to the constant.
    Equals,
    equal
);
single_bound_comparator!(
    /// Elements different from the constant.
    NotEquals,
    not_equal
);
single_bound_comparator!(
    /// Elements strictly below the constant.
    LessThan,
    less_than
);
single_bound_comparator!(
    /// Elements at or below the constant.
    LessThanOrEqual,
    less_equal
);
single_bound_comparator!(
    /// Elements strictly above the constant.
    GreaterThan,
    greater_than
);
single_bound_comparator!(
    /// Elements at or above the constant.
    GreaterThanOrEqual,
    greater_equal
);

/// Elements within `[low, high]`, bounds included. Two predicate constants,
/// both broadcast up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BetweenInclusive<T: Element> {
    pub low: T,
    pub high: T,
}

impl<T: Element> Comparator<T> for BetweenInclusive<T> {
    type Broadcast<S: ProcessingStyle<Elem = T>> = (S::Register, S::Register);

    #[inline]
    fn broadcast<S: ProcessingStyle<Elem = T>>(&self) -> (S::Register, S::Register) {
        (S::set1(self.low), S::set1(self.high))
    }

    #[inline]
    fn matches<S: ProcessingStyle<Elem = T>>(
        predicate: &(S::Register, S::Register),
        data: S::Register,
    ) -> LaneMask {
        S::greater_equal(data, predicate.0) & S::less_equal(data, predicate.1)
    }
}

/// One phase of the selection: compare chunk-wise, compress-store the
/// positions of the matching lanes, return the match count.
fn select_batch<T, S, C>(
    out: &mut [T],
    input: &[T],
    predicate: &C::Broadcast<S>,
    chunk_count: usize,
    start_index: usize,
) -> usize
where
    T: Element,
    S: ProcessingStyle<Elem = T>,
    C: Comparator<T>,
{
    let mut written = 0;
    for chunk in 0..chunk_count {
        let offset = chunk * S::LANES;
        let data = S::load(&input[offset..]);
        let mask = C::matches::<S>(predicate, data);
        let positions = S::sequence(T::from_usize(start_index + offset));
        written += S::compress_store(mask, &mut out[written..], positions);
    }
    written
}

/// Select the positions of all elements satisfying `comparator`, as a new
/// column. Output capacity is the input population (worst case: all match).
pub fn select<S, C>(column: &Column<S::Elem>, comparator: C) -> Column<S::Elem>
where
    S: ProcessingStyle,
    C: Comparator<S::Elem>,
{
    let population = column.population_count();
    let mut result = Column::create(population, S::vector_size_bytes());
    if population == 0 {
        return result;
    }

    let input = column.data();
    let plan = BatchPlan::for_style::<S>(input);
    trace!(
        population,
        prologue = plan.prologue,
        body_chunks = plan.body_chunks,
        epilogue = plan.epilogue,
        "select batching plan"
    );

    let scalar_predicate = comparator.broadcast::<Scalar<S::Elem>>();
    let vector_predicate = comparator.broadcast::<S>();

    let out = result.data_mut();
    let mut match_count = select_batch::<_, Scalar<S::Elem>, C>(
        out,
        &input[..plan.prologue],
        &scalar_predicate,
        plan.prologue,
        0,
    );
    match_count += select_batch::<_, S, C>(
        &mut out[match_count..],
        &input[plan.body_start()..],
        &vector_predicate,
        plan.body_chunks,
        plan.body_start(),
    );
    match_count += select_batch::<_, Scalar<S::Elem>, C>(
        &mut out[match_count..],
        &input[plan.epilogue_start()..],
        &scalar_predicate,
        plan.epilogue,
        plan.epilogue_start(),
    );

    result.set_population_count(match_count);
    result
}

/// One phase of the mask-form selection: append one bit per element.
fn mask_batch<T, S, C>(
    bits: &mut BitVec,
    input: &[T],
    predicate: &C::Broadcast<S>,
    chunk_count: usize,
) where
    T: Element,
    S: ProcessingStyle<Elem = T>,
    C: Comparator<T>,
{
    for chunk in 0..chunk_count {
        let data = S::load(&input[chunk * S::LANES..]);
        let mask = C::matches::<S>(predicate, data);
        for lane in 0..S::LANES {
            bits.push(mask & (1 << lane) != 0);
        }
    }
}

/// Mask-form selection: one bit per input element instead of a position
/// list. Bit `i` is set when element `i` satisfies the predicate.
pub fn select_mask<S, C>(column: &Column<S::Elem>, comparator: C) -> BitVec
where
    S: ProcessingStyle,
    C: Comparator<S::Elem>,
{
    let population = column.population_count();
    let mut bits = BitVec::with_capacity(population);
    if population == 0 {
        return bits;
    }

    let input = column.data();
    let plan = BatchPlan::for_style::<S>(input);

    let scalar_predicate = comparator.broadcast::<Scalar<S::Elem>>();
    let vector_predicate = comparator.broadcast::<S>();

    mask_batch::<_, Scalar<S::Elem>, C>(
        &mut bits,
        &input[..plan.prologue],
        &scalar_predicate,
        plan.prologue,
    );
    mask_batch::<_, S, C>(
        &mut bits,
        &input[plan.body_start()..],
        &vector_predicate,
        plan.body_chunks,
    );
    mask_batch::<_, Scalar<S::Elem>, C>(
        &mut bits,
        &input[plan.epilogue_start()..],
        &scalar_predicate,
        plan.epilogue,
    );

    debug_assert_eq!(bits.len(), population);
    bits
}
