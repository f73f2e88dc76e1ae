/// Base element types the kernels operate on
///
/// Fixed-width integers only; the batching protocol, the hash engine, and
/// the merge kernels all operate on columns of these.
use std::fmt::Debug;

pub trait Element:
    Copy + Clone + Default + PartialEq + Eq + PartialOrd + Ord + Debug + Send + Sync + 'static
{
    const ZERO: Self;
    const ONE: Self;
    const MIN_VALUE: Self;
    const MAX_VALUE: Self;

    fn from_usize(value: usize) -> Self;
    fn to_usize(self) -> usize;
    fn to_f64(self) -> f64;

    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn wrapping_mul(self, rhs: Self) -> Self;
    /// Plain integer division; dividing by zero is a caller contract
    /// violation and panics.
    fn wrapping_div(self, rhs: Self) -> Self;
    fn bit_and(self, rhs: Self) -> Self;
    fn bit_or(self, rhs: Self) -> Self;
}

macro_rules! impl_element {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                const ZERO: Self = 0;
                const ONE: Self = 1;
                const MIN_VALUE: Self = <$t>::MIN;
                const MAX_VALUE: Self = <$t>::MAX;

                #[inline]
                fn from_usize(value: usize) -> Self {
                    value as $t
                }

                #[inline]
                fn to_usize(self) -> usize {
                    self as usize
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn wrapping_add(self, rhs: Self) -> Self {
                    <$t>::wrapping_add(self, rhs)
                }

                #[inline]
                fn wrapping_sub(self, rhs: Self) -> Self {
                    <$t>::wrapping_sub(self, rhs)
                }

                #[inline]
                fn wrapping_mul(self, rhs: Self) -> Self {
                    <$t>::wrapping_mul(self, rhs)
                }

                #[inline]
                fn wrapping_div(self, rhs: Self) -> Self {
                    <$t>::wrapping_div(self, rhs)
                }

                #[inline]
                fn bit_and(self, rhs: Self) -> Self {
                    self & rhs
                }

                #[inline]
                fn bit_or(self, rhs: Self) -> Self {
                    self | rhs
                }
            }
        )*
    };
}

impl_element!(u32, u64, i32, i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_constants() {
        assert_eq!(u64::ZERO, 0);
        assert_eq!(u64::ONE, 1);
        assert_eq!(i32::MIN_VALUE, i32::MIN);
        assert_eq!(i32::MAX_VALUE, i32::MAX);
    }

    #[test]
    fn test_position_round_trip() {
        for value in [0usize, 1, 7, 4096] {
            assert_eq!(u64::from_usize(value).to_usize(), value);
            assert_eq!(u32::from_usize(value).to_usize(), value);
        }
    }

    #[test]
    fn test_wrapping_arithmetic() {
        assert_eq!(u32::MAX.wrapping_add(1), 0);
        assert_eq!(0u32.wrapping_sub(1), u32::MAX);
        assert_eq!(7u64.wrapping_mul(65_537), 458_759);
    }
}
