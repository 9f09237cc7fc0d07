//! Настройки выбора устройства и источника ядра

use crate::error::{Error, Result};
use crate::matrix::KernelSource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const PLATFORM_ENV: &str = "BOOLMAT_PLATFORM";
pub const DEVICE_ENV: &str = "BOOLMAT_DEVICE";
pub const KERNEL_ENV: &str = "BOOLMAT_KERNEL";

/// Конфигурация ускорителя.
///
/// По умолчанию: первая платформа, первое устройство, встроенное ядро.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceleratorConfig {
    pub platform_index: usize,
    pub device_index: usize,
    pub kernel: KernelSource,
}

impl AcceleratorConfig {
    /// Читает конфигурацию из JSON-файла; отсутствующие поля берутся по умолчанию
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::ResourceLoad(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::InvalidInput(format!("{}: {}", path.display(), e)))
    }

    /// Конфигурация по умолчанию с переопределениями из переменных окружения
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = lookup(PLATFORM_ENV) {
            config.platform_index = parse_index(PLATFORM_ENV, &value)?;
        }
        if let Some(value) = lookup(DEVICE_ENV) {
            config.device_index = parse_index(DEVICE_ENV, &value)?;
        }
        if let Some(path) = lookup(KERNEL_ENV).filter(|path| !path.is_empty()) {
            config.kernel = KernelSource::File(path.into());
        }
        Ok(config)
    }
}

fn parse_index(name: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("{}={:?} is not an index", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_pick_first_device_and_embedded_kernel() {
        let config = AcceleratorConfig::default();
        assert_eq!(config.platform_index, 0);
        assert_eq!(config.device_index, 0);
        assert_eq!(config.kernel, KernelSource::Embedded);
    }

    #[test]
    fn environment_overrides() {
        let vars: HashMap<&str, &str> = [
            (PLATFORM_ENV, "1"),
            (DEVICE_ENV, " 2 "),
            (KERNEL_ENV, "kernels/with_tiles.cl"),
        ]
        .into_iter()
        .collect();
        let config = AcceleratorConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.platform_index, 1);
        assert_eq!(config.device_index, 2);
        assert_eq!(config.kernel, KernelSource::File("kernels/with_tiles.cl".into()));
    }

    #[test]
    fn bad_index_is_rejected() {
        let err = AcceleratorConfig::from_lookup(|name| (name == DEVICE_ENV).then(|| "gpu".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn json_file_with_partial_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"device_index": 3}}"#).unwrap();
        let config = AcceleratorConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.device_index, 3);
        assert_eq!(config.platform_index, 0);
        assert_eq!(config.kernel, KernelSource::Embedded);

        let err = AcceleratorConfig::from_json_file(file.path().with_extension("missing")).unwrap_err();
        assert!(matches!(err, Error::ResourceLoad(_)));
    }
}
