/// Sorted-set intersection kernel
///
/// Merges two ascending, duplicate-free columns by broadcasting the current
/// left element against a full-width chunk of the right side. The equal mask
/// emits; the less-than mask steers the cursors: no right lane behind the
/// left value advances the left cursor by one, a fully-behind chunk advances
/// the right cursor by a whole lane width, and a partial mask advances both.
/// A scalar three-way merge drains the tails.
use tracing::trace;

use crate::columnar::Column;
use crate::simd::{Element, ProcessingStyle};

/// Cursor state shared between the vector loop and the scalar drain.
struct MergeState<'a, T> {
    left: &'a [T],
    right: &'a [T],
    left_index: usize,
    right_index: usize,
}

fn intersect_vector<T, S>(state: &mut MergeState<'_, T>, out: &mut [T], written: &mut usize)
where
    T: Element,
    S: ProcessingStyle<Elem = T>,
{
    let full = S::full_mask();
    while state.left_index < state.left.len()
        && state.right_index + S::LANES <= state.right.len()
    {
        let left_value = state.left[state.left_index];
        let left_register = S::set1(left_value);
        let right_register = S::load(&state.right[state.right_index..]);

        if S::equal(right_register, left_register) != 0 {
            out[*written] = left_value;
            *written += 1;
        }

        let behind = S::less_than(right_register, left_register);
        if behind == 0 {
            // left value is at or below every loaded right lane
            state.left_index += 1;
        } else if behind == full {
            // whole right chunk is behind the left value
            state.right_index += S::LANES;
        } else {
            state.left_index += 1;
            state.right_index += S::mask_population_count(behind);
        }
    }
}

fn intersect_flush<T: Element>(state: &mut MergeState<'_, T>, out: &mut [T], written: &mut usize) {
    while state.left_index < state.left.len() && state.right_index < state.right.len() {
        let l = state.left[state.left_index];
        let r = state.right[state.right_index];
        if l < r {
            state.left_index += 1;
        } else if r < l {
            state.right_index += 1;
        } else {
            out[*written] = l;
            *written += 1;
            state.left_index += 1;
            state.right_index += 1;
        }
    }
}

/// Intersection of two ascending, duplicate-free columns, ascending order
/// preserved. Output capacity is the smaller input population.
pub fn intersect_sorted<S>(lhs: &Column<S::Elem>, rhs: &Column<S::Elem>) -> Column<S::Elem>
where
    S: ProcessingStyle,
{
    let capacity = lhs.population_count().min(rhs.population_count());
    let mut result = Column::create(capacity, S::vector_size_bytes());
    if capacity == 0 {
        return result;
    }

    let mut state = MergeState {
        left: lhs.data(),
        right: rhs.data(),
        left_index: 0,
        right_index: 0,
    };
    let mut written = 0;

    let out = result.data_mut();
    intersect_vector::<_, S>(&mut state, out, &mut written);
    intersect_flush(&mut state, out, &mut written);
    trace!(
        left = state.left.len(),
        right = state.right.len(),
        matched = written,
        "sorted intersection"
    );

    result.set_population_count(written);
    result
}
