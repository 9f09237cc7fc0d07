//! Операции над матрицами на CPU
//!
//! Эталонные реализации для проверки результатов устройства.

use super::types::{BoolMatrix, ProductShape};
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2, Zip};

/// Булево произведение выровненных плоских буферов на CPU
pub fn reference_product_padded(a: &[u8], b: &[u8], shape: ProductShape) -> Result<Vec<u8>> {
    let ProductShape { m, p, n } = shape;
    let a = ArrayView2::from_shape((m, p), a)
        .map_err(|e| Error::InvalidInput(format!("left operand: {}", e)))?;
    let b = ArrayView2::from_shape((p, n), b)
        .map_err(|e| Error::InvalidInput(format!("right operand: {}", e)))?;

    let mut c = Array2::<u8>::zeros((m, n));
    for (a_row, mut c_row) in a.outer_iter().zip(c.outer_iter_mut()) {
        for (k, _) in a_row.iter().enumerate().filter(|&(_, &cell)| cell != 0) {
            Zip::from(&mut c_row)
                .and(b.row(k))
                .for_each(|out, &cell| *out |= (cell != 0) as u8);
        }
    }
    Ok(c.iter().copied().collect())
}

/// Булево произведение матриц на CPU
pub fn reference_product(a: &BoolMatrix, b: &BoolMatrix) -> Result<BoolMatrix> {
    let shape = ProductShape::for_operands(a, b)?;
    let data = reference_product_padded(a.as_bytes(), b.as_bytes(), shape)?;
    Ok(BoolMatrix::from_parts(a.rows(), b.cols(), shape.m, shape.n, data))
}

/// Сравнивает результат устройства `c` с произведением на CPU
pub fn check_product(a: &[u8], b: &[u8], c: &[u8], shape: ProductShape) -> Result<bool> {
    shape.check_lengths(a.len(), b.len(), c.len())?;
    Ok(reference_product_padded(a, b, shape)? == c)
}

/// Транзитивное замыкание алгоритмом Уоршелла: пути длины не меньше 1
pub fn reference_closure(adj: &BoolMatrix) -> Result<BoolMatrix> {
    if !adj.is_square() {
        return Err(Error::InvalidInput(format!(
            "closure needs a square matrix, got {}x{} (padded {}x{})",
            adj.rows(),
            adj.cols(),
            adj.tiled_rows(),
            adj.tiled_cols()
        )));
    }
    let n = adj.tiled_rows();
    let mut reach = Array2::from_shape_vec((n, n), adj.as_bytes().to_vec())
        .map_err(|e| Error::InvalidInput(e.to_string()))?;

    for k in 0..n {
        let via = reach.row(k).to_owned();
        for mut row in reach.outer_iter_mut() {
            if row[k] != 0 {
                Zip::from(&mut row).and(&via).for_each(|out, &cell| *out |= cell);
            }
        }
    }

    let data = reach.iter().map(|&cell| (cell != 0) as u8).collect();
    Ok(BoolMatrix::from_parts(adj.rows(), adj.cols(), n, n, data))
}

/// Выводит выровненную матрицу целиком, строка за строкой
pub fn show(matrix: &BoolMatrix) -> String {
    let mut out = String::new();
    for row in matrix.as_bytes().chunks(matrix.tiled_cols().max(1)) {
        let line: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::TILE_SIDE;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn brute_force(a: &BoolMatrix, b: &BoolMatrix) -> Vec<u8> {
        let mut cells = Vec::new();
        for i in 0..a.rows() {
            for j in 0..b.cols() {
                let any = (0..a.cols()).any(|k| a.get(i, k) && b.get(k, j));
                cells.push(any as u8);
            }
        }
        cells
    }

    #[test]
    fn product_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(3);
        for (m, p, n) in [(16, 16, 16), (5, 9, 3), (21, 40, 17)] {
            let a = BoolMatrix::random(m, p, 0.3, &mut rng).unwrap();
            let b = BoolMatrix::random(p, n, 0.3, &mut rng).unwrap();
            let c = reference_product(&a, &b).unwrap();
            assert_eq!(c.logical_cells(), brute_force(&a, &b), "{}x{}x{}", m, p, n);
            assert!(c.padding_is_zero());
        }
    }

    #[test]
    fn product_uses_rhs_row_stride() {
        // A = [1 1], B = rows [0 0 1], [0 1 0]: C = [0 1 1]
        let a = BoolMatrix::from_rows(1, 2, &[1, 1]).unwrap();
        let b = BoolMatrix::from_rows(2, 3, &[0, 0, 1, 0, 1, 0]).unwrap();
        let c = reference_product(&a, &b).unwrap();
        assert_eq!(c.logical_cells(), vec![0, 1, 1]);
    }

    #[test]
    fn padding_does_not_change_the_product() {
        let mut rng = StdRng::seed_from_u64(5);
        let a = BoolMatrix::random(10, 20, 0.4, &mut rng).unwrap();
        let b = BoolMatrix::random(20, 12, 0.4, &mut rng).unwrap();
        let direct = reference_product(&a, &b).unwrap();

        let wide_a = a.pad_to(48, 64).unwrap();
        let wide_b = b.pad_to(64, 32).unwrap();
        let wide = reference_product(&wide_a, &wide_b).unwrap();

        assert_eq!(wide.logical_cells(), direct.logical_cells());
        assert!(wide.padding_is_zero());
    }

    #[test]
    fn check_product_detects_a_flipped_cell() {
        let mut rng = StdRng::seed_from_u64(9);
        let a = BoolMatrix::random(16, 16, 0.5, &mut rng).unwrap();
        let b = BoolMatrix::random(16, 16, 0.5, &mut rng).unwrap();
        let shape = ProductShape::square(TILE_SIDE).unwrap();
        let mut c = reference_product(&a, &b).unwrap().into_bytes();
        assert!(check_product(a.as_bytes(), b.as_bytes(), &c, shape).unwrap());
        c[17] ^= 1;
        assert!(!check_product(a.as_bytes(), b.as_bytes(), &c, shape).unwrap());
    }

    #[test]
    fn warshall_closure_on_a_chain() {
        // 0 -> 1 -> 2, без петель
        let adj = BoolMatrix::from_rows(3, 3, &[0, 1, 0, 0, 0, 1, 0, 0, 0]).unwrap();
        let closure = reference_closure(&adj).unwrap();
        assert_eq!(closure.logical_cells(), vec![0, 1, 1, 0, 0, 1, 0, 0, 0]);

        // цикл 0 -> 1 -> 0 даёт петли обеим вершинам
        let cycle = BoolMatrix::from_rows(2, 2, &[0, 1, 1, 0]).unwrap();
        assert_eq!(reference_closure(&cycle).unwrap().logical_cells(), vec![1, 1, 1, 1]);
    }

    #[test]
    fn warshall_rejects_unevenly_padded_matrix() {
        let adj = BoolMatrix::identity(5).unwrap().pad_to(48, 32).unwrap();
        let err = reference_closure(&adj).unwrap_err();
        assert!(err.to_string().contains("got 5x5 (padded 48x32)"), "{err}");
    }

    #[test]
    fn show_prints_padded_rows() {
        let matrix = BoolMatrix::identity(2).unwrap();
        let text = show(&matrix);
        assert_eq!(text.lines().count(), 16);
        assert!(text.starts_with("1 0 0"));
    }
}
