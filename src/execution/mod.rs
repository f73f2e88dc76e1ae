// Vectorized operator kernels. Every kernel core is generic over a
// processing style and runs three times per call: scalar prologue,
// full-width body, scalar epilogue.

pub mod aggregate;
pub mod batch;
pub mod calc;
pub mod dispatch;
pub mod group;
pub mod intersect;
pub mod join;
pub mod merge;
pub mod project;
pub mod select;

pub use aggregate::{aggregate, average, AggOperator, AggState, Max, Min, Or, Sum};
pub use batch::BatchPlan;
pub use calc::{calc_binary, Add, BitAnd, BitOr, CalcOperator, Div, Mul, Sub};
pub use dispatch::FilterPredicate;
pub use group::group;
pub use intersect::intersect_sorted;
pub use join::{natural_equi_join, natural_equi_join_with};
pub use merge::merge_sorted;
pub use project::{project, projection_path};
pub use select::{select, select_mask, Comparator};
