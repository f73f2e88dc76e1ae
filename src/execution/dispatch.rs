/// Runtime dispatch layer
///
/// Thin, monomorphized entry points for the common element types. Each
/// wrapper picks the widest processing style the running CPU supports among
/// the compiled instantiations and forwards 1:1 to the generic kernel;
/// no bookkeeping of its own.
use tracing::trace;

use crate::columnar::Column;
use crate::error::KernelError;
use crate::execution::aggregate::{aggregate, average, Max, Min, Sum};
use crate::execution::calc::{calc_binary, Add, Mul, Sub};
use crate::execution::group::group;
use crate::execution::intersect::intersect_sorted;
use crate::execution::join::natural_equi_join;
use crate::execution::merge::merge_sorted;
use crate::execution::project::project;
use crate::execution::select::{
    select, BetweenInclusive, Equals, GreaterThan, GreaterThanOrEqual, LessThan,
    LessThanOrEqual, NotEquals,
};
use crate::simd::{
    is_avx2_available, is_avx512_available, Element, ProcessingStyle, I64x2, I64x4, I64x8,
    U64x2, U64x4, U64x8,
};

/// Filter predicate for the dispatching selection entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterPredicate<T: Element> {
    Equals(T),
    NotEquals(T),
    GreaterThan(T),
    LessThan(T),
    GreaterThanOrEqual(T),
    LessThanOrEqual(T),
    /// Bounds included.
    Between(T, T),
}

fn select_with<S: ProcessingStyle>(
    column: &Column<S::Elem>,
    predicate: FilterPredicate<S::Elem>,
) -> Column<S::Elem> {
    match predicate {
        FilterPredicate::Equals(value) => select::<S, _>(column, Equals(value)),
        FilterPredicate::NotEquals(value) => select::<S, _>(column, NotEquals(value)),
        FilterPredicate::GreaterThan(value) => select::<S, _>(column, GreaterThan(value)),
        FilterPredicate::LessThan(value) => select::<S, _>(column, LessThan(value)),
        FilterPredicate::GreaterThanOrEqual(value) => {
            select::<S, _>(column, GreaterThanOrEqual(value))
        }
        FilterPredicate::LessThanOrEqual(value) => {
            select::<S, _>(column, LessThanOrEqual(value))
        }
        FilterPredicate::Between(low, high) => {
            select::<S, _>(column, BetweenInclusive { low, high })
        }
    }
}

macro_rules! widest_style {
    ($x8:ty, $x4:ty, $x2:ty, $call:ident ( $($arg:expr),* )) => {
        if is_avx512_available() {
            trace!(lanes = 8, "dispatch");
            $call::<$x8>($($arg),*)
        } else if is_avx2_available() {
            trace!(lanes = 4, "dispatch");
            $call::<$x4>($($arg),*)
        } else {
            trace!(lanes = 2, "dispatch");
            $call::<$x2>($($arg),*)
        }
    };
}

macro_rules! widest_style_op {
    ($x8:ty, $x4:ty, $x2:ty, $call:ident, $op:ty, ( $($arg:expr),* )) => {
        if is_avx512_available() {
            $call::<$x8, $op>($($arg),*)
        } else if is_avx2_available() {
            $call::<$x4, $op>($($arg),*)
        } else {
            $call::<$x2, $op>($($arg),*)
        }
    };
}

// ============================================================================
// U64 ENTRY POINTS
// ============================================================================

pub fn filter_u64(column: &Column<u64>, predicate: FilterPredicate<u64>) -> Column<u64> {
    widest_style!(U64x8, U64x4, U64x2, select_with(column, predicate))
}

pub fn project_u64(source: &Column<u64>, positions: &Column<u64>) -> Column<u64> {
    widest_style!(U64x8, U64x4, U64x2, project(source, positions))
}

pub fn add_u64(lhs: &Column<u64>, rhs: &Column<u64>) -> Column<u64> {
    widest_style_op!(U64x8, U64x4, U64x2, calc_binary, Add, (lhs, rhs))
}

pub fn sub_u64(lhs: &Column<u64>, rhs: &Column<u64>) -> Column<u64> {
    widest_style_op!(U64x8, U64x4, U64x2, calc_binary, Sub, (lhs, rhs))
}

pub fn mul_u64(lhs: &Column<u64>, rhs: &Column<u64>) -> Column<u64> {
    widest_style_op!(U64x8, U64x4, U64x2, calc_binary, Mul, (lhs, rhs))
}

pub fn sum_u64(column: &Column<u64>) -> u64 {
    widest_style_op!(U64x8, U64x4, U64x2, aggregate, Sum, (column))
}

pub fn min_u64(column: &Column<u64>) -> u64 {
    widest_style_op!(U64x8, U64x4, U64x2, aggregate, Min, (column))
}

pub fn max_u64(column: &Column<u64>) -> u64 {
    widest_style_op!(U64x8, U64x4, U64x2, aggregate, Max, (column))
}

pub fn average_u64(column: &Column<u64>) -> f64 {
    widest_style!(U64x8, U64x4, U64x2, average(column))
}

pub fn join_u64(
    build: &Column<u64>,
    probe: &Column<u64>,
) -> Result<(Column<u64>, Column<u64>), KernelError> {
    widest_style!(U64x8, U64x4, U64x2, natural_equi_join(build, probe))
}

pub fn group_u64(column: &Column<u64>) -> Result<(Column<u64>, Column<u64>), KernelError> {
    widest_style!(U64x8, U64x4, U64x2, group(column))
}

pub fn intersect_u64(lhs: &Column<u64>, rhs: &Column<u64>) -> Column<u64> {
    widest_style!(U64x8, U64x4, U64x2, intersect_sorted(lhs, rhs))
}

pub fn merge_u64(lhs: &Column<u64>, rhs: &Column<u64>) -> Column<u64> {
    widest_style!(U64x8, U64x4, U64x2, merge_sorted(lhs, rhs))
}

// ============================================================================
// I64 ENTRY POINTS
// ============================================================================

pub fn filter_i64(column: &Column<i64>, predicate: FilterPredicate<i64>) -> Column<i64> {
    widest_style!(I64x8, I64x4, I64x2, select_with(column, predicate))
}

pub fn sum_i64(column: &Column<i64>) -> i64 {
    widest_style_op!(I64x8, I64x4, I64x2, aggregate, Sum, (column))
}

pub fn min_i64(column: &Column<i64>) -> i64 {
    widest_style_op!(I64x8, I64x4, I64x2, aggregate, Min, (column))
}

pub fn max_i64(column: &Column<i64>) -> i64 {
    widest_style_op!(I64x8, I64x4, I64x2, aggregate, Max, (column))
}
