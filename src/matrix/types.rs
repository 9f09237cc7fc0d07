//! Типы матриц и связанные структуры

use crate::error::{Error, Result};
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Сторона тайла и рабочей группы ядра
pub const TILE_SIDE: usize = 16;

/// Округляет размерность вверх до кратной стороне тайла
pub fn tiled_dim(dim: usize) -> Result<usize> {
    dim.checked_next_multiple_of(TILE_SIDE).ok_or_else(|| {
        Error::InvalidInput(format!("dimension {} cannot be padded to the {} tile", dim, TILE_SIDE))
    })
}

/// Длина выровненного буфера `rows x cols`
fn buffer_len(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .filter(|&len| len <= isize::MAX as usize)
        .ok_or_else(|| Error::InvalidInput(format!("{}x{} matrix does not fit in memory", rows, cols)))
}

/// Способ заполнения матрицы
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MatrixFill {
    /// Все ячейки равны 0
    Zeros,
    /// Единицы на главной диагонали
    Identity,
    /// Каждая ячейка равна 1 с вероятностью `density`
    Random { density: f64 },
}

/// Булева матрица: байты 0/1 построчно, с выравниванием до тайлов.
///
/// Логический размер `rows x cols` хранится внутри буфера
/// `tiled_rows x tiled_cols`; ячейки вне логической области всегда равны 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "MatrixRepr", try_from = "MatrixRepr")]
pub struct BoolMatrix {
    rows: usize,
    cols: usize,
    tiled_rows: usize,
    tiled_cols: usize,
    data: Vec<u8>,
}

impl BoolMatrix {
    /// Нулевая матрица логического размера `rows x cols`
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let tiled_rows = tiled_dim(rows)?;
        let tiled_cols = tiled_dim(cols)?;
        let len = buffer_len(tiled_rows, tiled_cols)?;
        Ok(Self {
            rows,
            cols,
            tiled_rows,
            tiled_cols,
            data: vec![0; len],
        })
    }

    /// Единичная матрица `n x n`
    pub fn identity(n: usize) -> Result<Self> {
        let mut matrix = Self::zeros(n, n)?;
        for i in 0..n {
            matrix.data[i * matrix.tiled_cols + i] = 1;
        }
        Ok(matrix)
    }

    /// Строит матрицу из логических ячеек (построчно, без выравнивания)
    pub fn from_rows(rows: usize, cols: usize, cells: &[u8]) -> Result<Self> {
        if rows.checked_mul(cols) != Some(cells.len()) {
            return Err(Error::InvalidInput(format!(
                "{} cells given for a {}x{} matrix",
                cells.len(),
                rows,
                cols
            )));
        }
        ensure_boolean(cells)?;

        let mut matrix = Self::zeros(rows, cols)?;
        for (i, row) in cells.chunks(cols.max(1)).enumerate().take(rows) {
            let start = i * matrix.tiled_cols;
            matrix.data[start..start + cols].copy_from_slice(row);
        }
        Ok(matrix)
    }

    /// Принимает уже выровненный буфер; логический размер совпадает с выровненным
    pub fn from_padded(tiled_rows: usize, tiled_cols: usize, data: Vec<u8>) -> Result<Self> {
        if tiled_rows % TILE_SIDE != 0 || tiled_cols % TILE_SIDE != 0 {
            return Err(Error::InvalidInput(format!(
                "padded shape {}x{} is not a multiple of the {} tile",
                tiled_rows, tiled_cols, TILE_SIDE
            )));
        }
        if data.len() != buffer_len(tiled_rows, tiled_cols)? {
            return Err(Error::InvalidInput(format!(
                "{} bytes given for a padded {}x{} matrix",
                data.len(),
                tiled_rows,
                tiled_cols
            )));
        }
        ensure_boolean(&data)?;
        Ok(Self {
            rows: tiled_rows,
            cols: tiled_cols,
            tiled_rows,
            tiled_cols,
            data,
        })
    }

    /// Случайная матрица: каждая логическая ячейка равна 1 с вероятностью `density`
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, density: f64, rng: &mut R) -> Result<Self> {
        let bernoulli = Bernoulli::new(density)
            .map_err(|_| Error::InvalidInput(format!("density {} is outside [0, 1]", density)))?;

        let mut matrix = Self::zeros(rows, cols)?;
        for i in 0..rows {
            let start = i * matrix.tiled_cols;
            for cell in &mut matrix.data[start..start + cols] {
                *cell = bernoulli.sample(rng) as u8;
            }
        }
        Ok(matrix)
    }

    /// Матрица с заданным способом заполнения
    pub fn filled<R: Rng + ?Sized>(rows: usize, cols: usize, fill: MatrixFill, rng: &mut R) -> Result<Self> {
        match fill {
            MatrixFill::Zeros => Self::zeros(rows, cols),
            MatrixFill::Identity if rows == cols => Self::identity(rows),
            MatrixFill::Identity => Err(Error::InvalidInput(format!(
                "identity fill needs a square shape, got {}x{}",
                rows, cols
            ))),
            MatrixFill::Random { density } => Self::random(rows, cols, density, rng),
        }
    }

    /// Результат вычислений на устройстве; инварианты обеспечивает вызывающий код
    pub(crate) fn from_parts(rows: usize, cols: usize, tiled_rows: usize, tiled_cols: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), tiled_rows * tiled_cols);
        Self {
            rows,
            cols,
            tiled_rows,
            tiled_cols,
            data,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn tiled_rows(&self) -> usize {
        self.tiled_rows
    }

    pub fn tiled_cols(&self) -> usize {
        self.tiled_cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols && self.tiled_rows == self.tiled_cols
    }

    /// Значение ячейки; индекс может указывать и в область выравнивания
    pub fn get(&self, row: usize, col: usize) -> bool {
        assert!(
            row < self.tiled_rows && col < self.tiled_cols,
            "cell ({}, {}) outside {}x{}",
            row,
            col,
            self.tiled_rows,
            self.tiled_cols
        );
        self.data[row * self.tiled_cols + col] != 0
    }

    /// Записывает ячейку логической области
    pub fn set(&mut self, row: usize, col: usize, value: bool) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::InvalidInput(format!(
                "cell ({}, {}) outside the logical {}x{} region",
                row, col, self.rows, self.cols
            )));
        }
        self.data[row * self.tiled_cols + col] = value as u8;
        Ok(())
    }

    /// Выровненный буфер целиком
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Логические ячейки построчно, без выравнивания
    pub fn logical_cells(&self) -> Vec<u8> {
        let mut cells = Vec::with_capacity(self.rows * self.cols);
        for row in self.data.chunks(self.tiled_cols.max(1)).take(self.rows) {
            cells.extend_from_slice(&row[..self.cols]);
        }
        cells
    }

    /// Та же матрица с более широким выравниванием
    pub fn pad_to(&self, tiled_rows: usize, tiled_cols: usize) -> Result<Self> {
        if tiled_rows % TILE_SIDE != 0 || tiled_cols % TILE_SIDE != 0 {
            return Err(Error::InvalidInput(format!(
                "padded shape {}x{} is not a multiple of the {} tile",
                tiled_rows, tiled_cols, TILE_SIDE
            )));
        }
        if tiled_rows < self.rows || tiled_cols < self.cols {
            return Err(Error::InvalidInput(format!(
                "padded shape {}x{} is smaller than the logical {}x{}",
                tiled_rows, tiled_cols, self.rows, self.cols
            )));
        }

        let mut data = vec![0; buffer_len(tiled_rows, tiled_cols)?];
        for (i, row) in self.data.chunks(self.tiled_cols.max(1)).take(self.rows).enumerate() {
            data[i * tiled_cols..i * tiled_cols + self.cols].copy_from_slice(&row[..self.cols]);
        }
        Ok(Self::from_parts(self.rows, self.cols, tiled_rows, tiled_cols, data))
    }

    /// Левый верхний блок `rows x cols` с минимальным выравниванием
    pub fn truncate_to(&self, rows: usize, cols: usize) -> Result<Self> {
        if rows > self.tiled_rows || cols > self.tiled_cols {
            return Err(Error::InvalidInput(format!(
                "cannot truncate {}x{} to {}x{}",
                self.tiled_rows, self.tiled_cols, rows, cols
            )));
        }
        let mut out = Self::zeros(rows, cols)?;
        for i in 0..rows {
            let src = i * self.tiled_cols;
            let dst = i * out.tiled_cols;
            out.data[dst..dst + cols].copy_from_slice(&self.data[src..src + cols]);
        }
        Ok(out)
    }

    /// Все ячейки вне логической области равны 0
    pub fn padding_is_zero(&self) -> bool {
        self.data.chunks(self.tiled_cols.max(1)).enumerate().all(|(i, row)| {
            if i >= self.rows {
                row.iter().all(|&cell| cell == 0)
            } else {
                row[self.cols..].iter().all(|&cell| cell == 0)
            }
        })
    }

    /// Количество единиц
    pub fn count_ones(&self) -> usize {
        self.data.iter().filter(|&&cell| cell != 0).count()
    }
}

impl fmt::Display for BoolMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.data.chunks(self.tiled_cols.max(1)).take(self.rows) {
            let line: Vec<String> = row[..self.cols].iter().map(|cell| cell.to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

fn ensure_boolean(cells: &[u8]) -> Result<()> {
    match cells.iter().position(|&cell| cell > 1) {
        Some(index) => Err(Error::InvalidInput(format!(
            "cell #{} holds {}, expected 0 or 1",
            index, cells[index]
        ))),
        None => Ok(()),
    }
}

/// Представление матрицы в JSON: логические строки без выравнивания
#[derive(Serialize, Deserialize)]
struct MatrixRepr {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<u8>>,
}

impl From<BoolMatrix> for MatrixRepr {
    fn from(matrix: BoolMatrix) -> Self {
        let cells = matrix
            .data
            .chunks(matrix.tiled_cols.max(1))
            .take(matrix.rows)
            .map(|row| row[..matrix.cols].to_vec())
            .collect();
        Self {
            rows: matrix.rows,
            cols: matrix.cols,
            cells,
        }
    }
}

impl TryFrom<MatrixRepr> for BoolMatrix {
    type Error = Error;

    fn try_from(repr: MatrixRepr) -> Result<Self> {
        if repr.cells.len() != repr.rows || repr.cells.iter().any(|row| row.len() != repr.cols) {
            return Err(Error::InvalidInput(format!(
                "cells do not form a {}x{} matrix",
                repr.rows, repr.cols
            )));
        }
        let flat: Vec<u8> = repr.cells.concat();
        Self::from_rows(repr.rows, repr.cols, &flat)
    }
}

/// Размеры произведения `A (m x p) * B (p x n)` в выровненных единицах
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductShape {
    pub m: usize,
    pub p: usize,
    pub n: usize,
}

impl ProductShape {
    pub fn new(m: usize, p: usize, n: usize) -> Result<Self> {
        for (name, dim) in [("m", m), ("p", p), ("n", n)] {
            if dim == 0 || dim % TILE_SIDE != 0 {
                return Err(Error::InvalidInput(format!(
                    "{} = {} must be a positive multiple of {}",
                    name, dim, TILE_SIDE
                )));
            }
            if u32::try_from(dim).is_err() {
                return Err(Error::InvalidInput(format!("{} = {} does not fit a kernel argument", name, dim)));
            }
        }
        Ok(Self { m, p, n })
    }

    /// Квадратное произведение `n x n`
    pub fn square(n: usize) -> Result<Self> {
        Self::new(n, n, n)
    }

    /// Размеры произведения двух матриц с проверкой согласованности
    pub fn for_operands(a: &BoolMatrix, b: &BoolMatrix) -> Result<Self> {
        if a.cols != b.rows || a.tiled_cols != b.tiled_rows {
            return Err(Error::InvalidInput(format!(
                "cannot multiply {}x{} (padded {}x{}) by {}x{} (padded {}x{})",
                a.rows, a.cols, a.tiled_rows, a.tiled_cols, b.rows, b.cols, b.tiled_rows, b.tiled_cols
            )));
        }
        Self::new(a.tiled_rows, a.tiled_cols, b.tiled_cols)
    }

    pub fn lhs_len(&self) -> usize {
        self.m * self.p
    }

    pub fn rhs_len(&self) -> usize {
        self.p * self.n
    }

    pub fn out_len(&self) -> usize {
        self.m * self.n
    }

    /// Глобальный размер запуска: `m x n`, уже кратные тайлу
    pub fn global_work_size(&self) -> [usize; 2] {
        [self.m, self.n]
    }

    /// Проверяет длины плоских буферов операндов и результата
    pub fn check_lengths(&self, a: usize, b: usize, c: usize) -> Result<()> {
        if a != self.lhs_len() || b != self.rhs_len() || c != self.out_len() {
            return Err(Error::InvalidInput(format!(
                "buffer lengths {}/{}/{} do not match {}x{} * {}x{}",
                a, b, c, self.m, self.p, self.p, self.n
            )));
        }
        Ok(())
    }
}
