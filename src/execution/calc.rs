/// Elementwise binary arithmetic kernel
///
/// `result[i] = Op(lhs[i], rhs[i])` over two equal-population columns.
/// The prologue length is the smaller of the two operands' alignment
/// distances, so the vector body only starts once both pointers can be
/// walked in lockstep; operands that never co-align degrade towards the
/// scalar path through the min.
use tracing::trace;

use crate::columnar::{Alignment, Column};
use crate::execution::batch::BatchPlan;
use crate::simd::{Element, ProcessingStyle, Scalar};

/// Arithmetic plug-in with a register form (inlined into the chunk loop)
/// and a scalar form (shared with the aggregation tail fold).
pub trait CalcOperator<T: Element>: Copy {
    fn apply<S: ProcessingStyle<Elem = T>>(a: S::Register, b: S::Register) -> S::Register;
    fn apply_scalar(a: T, b: T) -> T;
}

macro_rules! calc_operator {
    ($(#[$doc:meta])* $name:ident, $vec:ident, $scalar:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl<T: Element> CalcOperator<T> for $name {
            #[inline]
            fn apply<S: ProcessingStyle<Elem = T>>(a: S::Register, b: S::Register) -> S::Register {
                S::$vec(a, b)
            }

            #[inline]
            fn apply_scalar(a: T, b: T) -> T {
                T::$scalar(a, b)
            }
        }
    };
}

calc_operator!(
    /// Wrapping addition.
    Add,
    add,
    wrapping_add
);
calc_operator!(
    /// Wrapping subtraction.
    Sub,
    sub,
    wrapping_sub
);
calc_operator!(
    /// Wrapping multiplication.
    Mul,
    mul,
    wrapping_mul
);
calc_operator!(
    /// Integer division; a zero divisor panics.
    Div,
    div,
    wrapping_div
);
calc_operator!(
    /// Bitwise AND.
    BitAnd,
    bitand,
    bit_and
);
calc_operator!(
    /// Bitwise OR.
    BitOr,
    bitor,
    bit_or
);

fn calc_batch<T, S, O>(out: &mut [T], lhs: &[T], rhs: &[T], chunk_count: usize)
where
    T: Element,
    S: ProcessingStyle<Elem = T>,
    O: CalcOperator<T>,
{
    for chunk in 0..chunk_count {
        let offset = chunk * S::LANES;
        let left = S::load(&lhs[offset..]);
        let right = S::load(&rhs[offset..]);
        S::store(&mut out[offset..], O::apply::<S>(left, right));
    }
}

/// Elementwise `Op(lhs[i], rhs[i])` into a new column. Populations must
/// match; a mismatch is a caller bug and fails fast.
pub fn calc_binary<S, O>(lhs: &Column<S::Elem>, rhs: &Column<S::Elem>) -> Column<S::Elem>
where
    S: ProcessingStyle,
    O: CalcOperator<S::Elem>,
{
    assert_eq!(
        lhs.population_count(),
        rhs.population_count(),
        "binary arithmetic over mismatched populations"
    );

    let population = lhs.population_count();
    let mut result = Column::create(population, S::vector_size_bytes());
    if population == 0 {
        return result;
    }

    let lhs_data = lhs.data();
    let rhs_data = rhs.data();

    // Both operands must reach an aligned address before the body starts.
    let lhs_until = Alignment::analyze(lhs_data.as_ptr(), S::vector_size_bytes())
        .elements_until_alignment::<S::Elem>();
    let rhs_until = Alignment::analyze(rhs_data.as_ptr(), S::vector_size_bytes())
        .elements_until_alignment::<S::Elem>();
    let plan = BatchPlan::compute(population, lhs_until.min(rhs_until), S::LANES);
    trace!(
        population,
        prologue = plan.prologue,
        body_chunks = plan.body_chunks,
        epilogue = plan.epilogue,
        "calc batching plan"
    );

    let out = result.data_mut();
    calc_batch::<_, Scalar<S::Elem>, O>(
        out,
        &lhs_data[..plan.prologue],
        &rhs_data[..plan.prologue],
        plan.prologue,
    );
    calc_batch::<_, S, O>(
        &mut out[plan.body_start()..],
        &lhs_data[plan.body_start()..],
        &rhs_data[plan.body_start()..],
        plan.body_chunks,
    );
    calc_batch::<_, Scalar<S::Elem>, O>(
        &mut out[plan.epilogue_start()..],
        &lhs_data[plan.epilogue_start()..],
        &rhs_data[plan.epilogue_start()..],
        plan.epilogue,
    );

    result.set_population_count(population);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::{I64x4, U64x4};

    #[test]
    fn test_add_matches_scalar_reference() {
        let a: Vec<u64> = (0..37).collect();
        let b: Vec<u64> = (0..37).map(|v| v * 2).collect();
        let result = calc_binary::<U64x4, Add>(
            &Column::from_slice(&a, 32),
            &Column::from_slice(&b, 32),
        );
        for i in 0..a.len() {
            assert_eq!(result[i], a[i] + b[i]);
        }
    }

    #[test]
    fn test_sub_self_is_zero() {
        let values: Vec<i64> = (-20..20).collect();
        let column = Column::from_slice(&values, 32);
        let result = calc_binary::<I64x4, Sub>(&column, &column);
        assert!(result.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_mul() {
        let a = Column::from_slice(&[2u64, 3, 4, 5, 6], 32);
        let b = Column::from_slice(&[7u64, 7, 7, 7, 7], 32);
        let result = calc_binary::<U64x4, Mul>(&a, &b);
        assert_eq!(result.data(), &[14, 21, 28, 35, 42]);
    }

    #[test]
    fn test_bitand_bitor() {
        let a = Column::from_slice(&[0b1100u64, 0b1010], 32);
        let b = Column::from_slice(&[0b1010u64, 0b0110], 32);
        assert_eq!(calc_binary::<U64x4, BitAnd>(&a, &b).data(), &[0b1000, 0b0010]);
        assert_eq!(calc_binary::<U64x4, BitOr>(&a, &b).data(), &[0b1110, 0b1110]);
    }

    #[test]
    fn test_unaligned_views_still_elementwise() {
        let values: Vec<u64> = (0..40).collect();
        let column = Column::from_slice(&values, 64);
        let lhs = column.chunk(3, 30);
        let rhs = column.chunk(7, 30);
        let result = calc_binary::<U64x4, Add>(&lhs, &rhs);
        for i in 0..30 {
            assert_eq!(result[i], values[3 + i] + values[7 + i]);
        }
    }

    #[test]
    #[should_panic(expected = "mismatched populations")]
    fn test_population_mismatch_fails_fast() {
        let a = Column::from_slice(&[1u64, 2], 32);
        let b = Column::from_slice(&[1u64, 2, 3], 32);
        let _ = calc_binary::<U64x4, Add>(&a, &b);
    }

    #[test]
    fn test_empty_inputs() {
        let a: Column<u64> = Column::create(0, 32);
        let b: Column<u64> = Column::create(0, 32);
        let result = calc_binary::<U64x4, Add>(&a, &b);
        assert_eq!(result.population_count(), 0);
    }
}
