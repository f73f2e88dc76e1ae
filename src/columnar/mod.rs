// Columnar storage primitives: the aligned column container and the
// pointer-alignment analyzer every kernel consults before batching.

pub mod alignment;
pub mod column;

pub use alignment::*;
pub use column::*;
