//! Графовые операции над булевыми матрицами смежности

pub mod closure;
mod sample;

pub use closure::{reference_squaring, squaring_rounds, ClosureMode};
pub use sample::{sample_closure, sample_graph};
