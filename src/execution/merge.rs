/// Sorted-set merge (union) kernel
///
/// Companion to the intersection kernel: emits the ascending union of two
/// ascending, duplicate-free columns, values present on both sides emitted
/// once. The vector loop broadcasts the current left element, compress-
/// stores every loaded right lane that is behind it, and steps the left
/// cursor when the left element is the smallest; a scalar merge drains the
/// tails.
use crate::columnar::Column;
use crate::simd::{Element, ProcessingStyle};

struct MergeState<'a, T> {
    left: &'a [T],
    right: &'a [T],
    left_index: usize,
    right_index: usize,
}

fn merge_vector<T, S>(state: &mut MergeState<'_, T>, out: &mut [T], written: &mut usize)
where
    T: Element,
    S: ProcessingStyle<Elem = T>,
{
    while state.left_index < state.left.len()
        && state.right_index + S::LANES <= state.right.len()
    {
        let left_value = state.left[state.left_index];
        let left_register = S::set1(left_value);
        let right_register = S::load(&state.right[state.right_index..]);

        let behind = S::less_than(right_register, left_register);
        if behind == 0 {
            // left value is the smallest; a duplicate on the right side is
            // left in place and emitted by a later iteration
            if S::equal(right_register, left_register) == 0 {
                out[*written] = left_value;
                *written += 1;
            }
            state.left_index += 1;
        } else {
            let count =
                S::compress_store(behind, &mut out[*written..], right_register);
            *written += count;
            state.right_index += count;
        }
    }
}

fn merge_flush<T: Element>(state: &mut MergeState<'_, T>, out: &mut [T], written: &mut usize) {
    while state.left_index < state.left.len() && state.right_index < state.right.len() {
        let l = state.left[state.left_index];
        let r = state.right[state.right_index];
        if l < r {
            out[*written] = l;
            state.left_index += 1;
        } else if r < l {
            out[*written] = r;
            state.right_index += 1;
        } else {
            out[*written] = l;
            state.left_index += 1;
            state.right_index += 1;
        }
        *written += 1;
    }
    while state.left_index < state.left.len() {
        out[*written] = state.left[state.left_index];
        state.left_index += 1;
        *written += 1;
    }
    while state.right_index < state.right.len() {
        out[*written] = state.right[state.right_index];
        state.right_index += 1;
        *written += 1;
    }
}

/// Union of two ascending, duplicate-free columns, ascending order
/// preserved, cross-side duplicates emitted once. Output capacity is the
/// sum of both input populations.
pub fn merge_sorted<S>(lhs: &Column<S::Elem>, rhs: &Column<S::Elem>) -> Column<S::Elem>
where
    S: ProcessingStyle,
{
    let capacity = lhs.population_count() + rhs.population_count();
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
    merge_vector::<_, S>(&mut state, out, &mut written);
    merge_flush(&mut state, out, &mut written);

    result.set_population_count(written);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::U64x4;

    fn run(a: &[u64], b: &[u64]) -> Vec<u64> {
        let result = merge_sorted::<U64x4>(
            &Column::from_slice(a, 32),
            &Column::from_slice(b, 32),
        );
        result.data().to_vec()
    }

    #[test]
    fn test_disjoint_union() {
        let a = vec![1u64, 3, 5, 7];
        let b = vec![2u64, 4, 6, 8];
        assert_eq!(run(&a, &b), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_overlap_emitted_once() {
        let a: Vec<u64> = (1..=9).collect();
        let b = vec![2u64, 4, 5, 6, 8, 9, 12];
        assert_eq!(run(&a, &b), vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 12]);
    }

    #[test]
    fn test_one_side_empty() {
        let a: Vec<u64> = (0..10).collect();
        assert_eq!(run(&a, &[]), a);
        assert_eq!(run(&[], &a), a);
    }

    #[test]
    fn test_union_is_sorted_and_deduplicated() {
        let a: Vec<u64> = (0..60).map(|v| v * 2).collect();
        let b: Vec<u64> = (0..60).map(|v| v * 3).collect();
        let merged = run(&a, &b);
        assert!(merged.windows(2).all(|w| w[0] < w[1]));
        let mut expected: Vec<u64> = a.iter().chain(b.iter()).copied().collect();
        expected.sort_unstable();
        expected.dedup();
        assert_eq!(merged, expected);
    }
}
