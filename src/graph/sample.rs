//! Контрольный граф: 6 вершин с петлями в матрице 16x16 и его замыкание

use crate::matrix::BoolMatrix;

const SIDE: usize = 16;

#[rustfmt::skip]
const SAMPLE_ROWS: [[u8; SIDE]; 6] = [
    [1, 0, 1, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
];

#[rustfmt::skip]
const CLOSURE_ROWS: [[u8; SIDE]; 6] = [
    [1, 1, 1, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 1, 1, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 1, 1, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
];

fn padded(rows: &[[u8; SIDE]]) -> BoolMatrix {
    let mut data = vec![0u8; SIDE * SIDE];
    for (i, row) in rows.iter().enumerate() {
        data[i * SIDE..(i + 1) * SIDE].copy_from_slice(row);
    }
    BoolMatrix::from_parts(SIDE, SIDE, SIDE, SIDE, data)
}

/// Матрица смежности контрольного графа; строки 6..16 нулевые
pub fn sample_graph() -> BoolMatrix {
    padded(&SAMPLE_ROWS)
}

/// Ожидаемое замыкание контрольного графа
pub fn sample_closure() -> BoolMatrix {
    padded(&CLOSURE_ROWS)
}
