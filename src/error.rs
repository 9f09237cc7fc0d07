//! Ошибки библиотеки

use thiserror::Error;

/// Ошибки вычислений на OpenCL-устройстве
#[derive(Debug, Error)]
pub enum Error {
    /// OpenCL недоступен: нет загрузчика, платформы или устройства
    #[error("OpenCL backend unavailable: {0}")]
    BackendInit(String),

    /// Исходный код ядра не найден или пуст
    #[error("kernel source load failed: {0}")]
    ResourceLoad(String),

    /// Вызов OpenCL вернул код, отличный от CL_SUCCESS
    #[error("OpenCL error code {code} returned by {call} at {location}")]
    BackendCall {
        call: &'static str,
        code: i32,
        location: String,
    },

    /// Некорректные размеры или содержимое матриц
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Результат операций библиотеки
pub type Result<T> = std::result::Result<T, Error>;
