//! Модуль для работы с OpenCL
//!
//! Содержит низкоуровневые привязки и безопасные обертки для OpenCL

pub mod bindings;
pub mod buffer;
pub mod context;
pub mod device;
pub mod kernel;
pub mod types;
pub mod utils;

pub use buffer::Buffer;
pub use context::{CommandQueue, Context, Event};
pub use device::Device;
pub use kernel::{Kernel, Program};
pub use utils::check;
