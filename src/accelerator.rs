//! Точка входа для вычислений на устройстве

use crate::config::AcceleratorConfig;
use crate::error::Result;
use crate::opencl::Device;

/// Выбранное OpenCL-устройство и настройки запуска.
///
/// Контекст, очередь, программа и буферы создаются заново на каждый вызов
/// `multiply`/`close` и освобождаются при выходе из него.
pub struct Accelerator {
    device: Device,
    config: AcceleratorConfig,
}

impl Accelerator {
    /// Загружает OpenCL и выбирает устройство по конфигурации
    pub fn new(config: AcceleratorConfig) -> Result<Self> {
        let device = Device::choose(config.platform_index, config.device_index)?;
        Ok(Self { device, config })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn config(&self) -> &AcceleratorConfig {
        &self.config
    }

    /// Имя устройства для отчётов
    pub fn device_name(&self) -> Result<String> {
        self.device.name()
    }
}
