//! Модуль для работы с булевыми матрицами
//!
//! Предоставляет:
//! - Типы матриц и выравнивание до тайлов
//! - Эталонные операции на CPU
//! - Ядро OpenCL и его запуск на устройстве

mod types;
pub mod kernels;
pub mod multiply;
pub mod operations;

pub use kernels::{KernelSource, KERNEL_NAME, WITH_TILES_KERNEL};
pub use multiply::ProductPipeline;
pub use operations::{check_product, reference_closure, reference_product, reference_product_padded, show};
pub use types::{tiled_dim, BoolMatrix, MatrixFill, ProductShape, TILE_SIDE};
