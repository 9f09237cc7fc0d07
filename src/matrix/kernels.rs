//! OpenCL ядра для матричных операций

use super::types::TILE_SIDE;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Имя точки входа ядра булева умножения
pub const KERNEL_NAME: &str = "with_tiles";

/// Исходный код ядра булева умножения с тайлами в локальной памяти.
///
/// `C[i][j] = OR_k (A[i][k] AND B[k][j])`; при `accumulate != 0`
/// к результату добавляется `A[i][j]` (только для квадратных операндов).
pub static WITH_TILES_KERNEL: &str = r#"
#ifndef TILE_SIDE
#define TILE_SIDE 16
#endif

__kernel void with_tiles(
    __global const uchar* a,
    __global const uchar* b,
    __global uchar* c,
    const uint m,
    const uint p,
    const uint n,
    const uint accumulate
) {
    const uint row = get_global_id(0);
    const uint col = get_global_id(1);
    const uint local_row = get_local_id(0);
    const uint local_col = get_local_id(1);

    __local uchar a_tile[TILE_SIDE][TILE_SIDE];
    __local uchar b_tile[TILE_SIDE][TILE_SIDE];

    uchar found = 0;
    const uint num_tiles = p / TILE_SIDE;

    for (uint tile = 0; tile < num_tiles; tile++) {
        // Совместная загрузка тайлов A и B
        const uint a_col = tile * TILE_SIDE + local_col;
        const uint b_row = tile * TILE_SIDE + local_row;
        a_tile[local_row][local_col] = (row < m) ? a[row * p + a_col] : 0;
        b_tile[local_row][local_col] = (col < n) ? b[b_row * n + col] : 0;

        barrier(CLK_LOCAL_MEM_FENCE);

        for (uint k = 0; k < TILE_SIDE; k++) {
            found |= (a_tile[local_row][k] && b_tile[k][local_col]);
        }

        barrier(CLK_LOCAL_MEM_FENCE);
    }

    if (row < m && col < n) {
        if (accumulate && col < p && a[row * p + col]) {
            found = 1;
        }
        c[row * n + col] = found;
    }
}
"#;

/// Параметры компиляции: сторона тайла задаётся хостом
pub fn build_options() -> String {
    format!("-D TILE_SIDE={}", TILE_SIDE)
}

/// Откуда берётся исходный код ядра
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelSource {
    /// Исходник, встроенный в библиотеку
    #[default]
    Embedded,
    /// Файл `.cl`, читаемый при каждом вызове
    File(PathBuf),
}

impl KernelSource {
    /// Загружает исходный код; пустой или отсутствующий исходник является ошибкой
    pub fn load(&self) -> Result<Cow<'static, str>> {
        let text = match self {
            KernelSource::Embedded => Cow::Borrowed(WITH_TILES_KERNEL),
            KernelSource::File(path) => Cow::Owned(
                fs::read_to_string(path)
                    .map_err(|e| Error::ResourceLoad(format!("{}: {}", path.display(), e)))?,
            ),
        };

        if text.trim().is_empty() {
            return Err(Error::ResourceLoad(format!(
                "{} is empty, check the working directory or the kernel path",
                self
            )));
        }
        if !text.contains(KERNEL_NAME) {
            return Err(Error::ResourceLoad(format!(
                "{} has no `{}` entry point",
                self, KERNEL_NAME
            )));
        }
        Ok(text)
    }
}

impl fmt::Display for KernelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelSource::Embedded => write!(f, "embedded kernel source"),
            KernelSource::File(path) => write!(f, "kernel file {}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_source_has_entry_point() {
        let text = KernelSource::Embedded.load().unwrap();
        assert!(text.contains("__kernel void with_tiles("));
        assert_eq!(build_options(), "-D TILE_SIDE=16");
    }

    #[test]
    fn loads_kernel_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(WITH_TILES_KERNEL.as_bytes()).unwrap();
        let source = KernelSource::File(file.path().to_path_buf());
        assert_eq!(source.load().unwrap(), WITH_TILES_KERNEL);
    }

    #[test]
    fn empty_file_is_a_load_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = KernelSource::File(file.path().to_path_buf()).load().unwrap_err();
        assert!(matches!(err, Error::ResourceLoad(_)), "{err}");
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = KernelSource::File(dir.path().join("with_tiles.cl")).load().unwrap_err();
        assert!(matches!(err, Error::ResourceLoad(_)), "{err}");
    }

    #[test]
    fn source_without_entry_point_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"__kernel void other() {}").unwrap();
        let err = KernelSource::File(file.path().to_path_buf()).load().unwrap_err();
        assert!(matches!(err, Error::ResourceLoad(_)));
    }

    #[test]
    fn kernel_source_from_json() {
        let source: KernelSource = serde_json::from_str(r#"{"file":"src/cl/with_tiles.cl"}"#).unwrap();
        assert_eq!(source, KernelSource::File("src/cl/with_tiles.cl".into()));
        let source: KernelSource = serde_json::from_str(r#""embedded""#).unwrap();
        assert_eq!(source, KernelSource::Embedded);
    }
}
