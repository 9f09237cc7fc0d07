//! Общие помощники для тестов на устройстве

use opencl_boolmat::{Accelerator, AcceleratorConfig, Error};

/// Если переменная задана, отсутствие OpenCL роняет тест вместо пропуска
pub const REQUIRE_DEVICE_ENV: &str = "BOOLMAT_REQUIRE_DEVICE";

/// Значение переменной `REQUIRE_DEVICE_ENV`, при котором пропуск запрещён
pub fn requires_device(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.is_empty() && value != "0")
}

fn device_required() -> bool {
    requires_device(std::env::var(REQUIRE_DEVICE_ENV).ok().as_deref())
}

/// Ускоритель с настройками по умолчанию или `None`, если OpenCL недоступен
pub fn accelerator(test: &str) -> Option<Accelerator> {
    accelerator_with(test, AcceleratorConfig::default())
}

pub fn accelerator_with(test: &str, config: AcceleratorConfig) -> Option<Accelerator> {
    match Accelerator::new(config) {
        Ok(accelerator) => Some(accelerator),
        Err(Error::BackendInit(reason)) if !device_required() => {
            eprintln!("SKIPPED {}: OpenCL not available ({}); set {}=1 to fail instead", test, reason, REQUIRE_DEVICE_ENV);
            None
        }
        Err(e) => panic!("failed to initialise OpenCL for {}: {}", test, e),
    }
}
