//! OpenCL-accelerated boolean matrix products and transitive closure
//!
//! Булево произведение (OR-AND) выполняется ядром `with_tiles` с тайлами
//! `TILE_SIDE x TILE_SIDE` в локальной памяти, замыкание графа строится
//! повторным возведением матрицы смежности в квадрат.

pub mod accelerator;
pub mod config;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod opencl;
pub mod utils;

// Реэкспорт основных типов для удобства
pub use accelerator::Accelerator;
pub use config::AcceleratorConfig;
pub use error::{Error, Result};
pub use graph::ClosureMode;
pub use matrix::{BoolMatrix, KernelSource, MatrixFill, ProductShape, TILE_SIDE};
