//! Транзитивное замыкание повторным возведением в квадрат
//!
//! Драйвер держит два буфера устройства, «текущий» и «черновой», и после
//! каждого раунда меняет их ролями: ядро всегда читает полностью записанную
//! матрицу предыдущего раунда и никогда не пишет в неё.

use crate::accelerator::Accelerator;
use crate::error::{Error, Result};
use crate::matrix::multiply::ProductPipeline;
use crate::matrix::{reference_product_padded, BoolMatrix, ProductShape};
use crate::opencl::types::CL_MEM_READ_WRITE;
use crate::opencl::Buffer;
use serde::{Deserialize, Serialize};

/// Что вычисляет раунд возведения в квадрат
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureMode {
    /// `R = R | R * R`: пути любой длины от 1 до 2^раундов
    #[default]
    Transitive,
    /// `R = R * R`: только пути длины ровно 2^раундов
    Powers,
}

impl ClosureMode {
    fn accumulates(self) -> bool {
        self == ClosureMode::Transitive
    }
}

/// Число раундов: сдвиги `n >>= 1` до нуля, то есть `ceil(log2(n + 1))`
pub fn squaring_rounds(n: usize) -> u32 {
    usize::BITS - n.leading_zeros()
}

impl Accelerator {
    /// Транзитивное замыкание выровненной матрицы смежности `n x n`
    pub fn close_padded(&self, adj: &[u8], n: usize) -> Result<Vec<u8>> {
        self.close_padded_with(adj, n, ClosureMode::default())
    }

    pub fn close_padded_with(&self, adj: &[u8], n: usize, mode: ClosureMode) -> Result<Vec<u8>> {
        let shape = ProductShape::square(n)?;
        if adj.len() != shape.out_len() {
            return Err(Error::InvalidInput(format!(
                "{} bytes given for a {}x{} adjacency matrix",
                adj.len(),
                n,
                n
            )));
        }

        let pipeline = ProductPipeline::new(self.device(), &self.config().kernel)?;
        let mut current = Buffer::from_bytes(pipeline.context(), CL_MEM_READ_WRITE, adj)?;
        let mut scratch = Buffer::new(pipeline.context(), CL_MEM_READ_WRITE, adj.len())?;

        let rounds = squaring_rounds(n);
        for round in 1..=rounds {
            pipeline.enqueue_product(&current, &current, &scratch, shape, mode.accumulates())?;
            std::mem::swap(&mut current, &mut scratch);
            log::debug!("closure {}x{}: round {}/{} done", n, n, round, rounds);
        }

        let mut result = vec![0u8; adj.len()];
        current.read_into(pipeline.queue(), &mut result)?;
        Ok(result)
    }

    /// Транзитивное замыкание графа
    pub fn close(&self, adj: &BoolMatrix) -> Result<BoolMatrix> {
        self.close_with(adj, ClosureMode::default())
    }

    pub fn close_with(&self, adj: &BoolMatrix, mode: ClosureMode) -> Result<BoolMatrix> {
        ensure_square(adj)?;
        let n = adj.tiled_rows();
        let data = self.close_padded_with(adj.as_bytes(), n, mode)?;
        Ok(BoolMatrix::from_parts(adj.rows(), adj.cols(), n, n, data))
    }
}

/// Те же раунды, что и на устройстве, но с произведением на CPU
pub fn reference_squaring(adj: &BoolMatrix, mode: ClosureMode) -> Result<BoolMatrix> {
    ensure_square(adj)?;
    let n = adj.tiled_rows();
    let shape = ProductShape::square(n)?;

    let mut current = adj.as_bytes().to_vec();
    for _ in 0..squaring_rounds(n) {
        let mut next = reference_product_padded(&current, &current, shape)?;
        if mode.accumulates() {
            for (out, &cell) in next.iter_mut().zip(&current) {
                *out |= cell;
            }
        }
        current = next;
    }
    Ok(BoolMatrix::from_parts(adj.rows(), adj.cols(), n, n, current))
}

fn ensure_square(adj: &BoolMatrix) -> Result<()> {
    if !adj.is_square() {
        return Err(Error::InvalidInput(format!(
            "closure needs a square matrix, got {}x{} (padded {}x{})",
            adj.rows(),
            adj.cols(),
            adj.tiled_rows(),
            adj.tiled_cols()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{sample_closure, sample_graph};
    use crate::matrix::reference_closure;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rounds_follow_the_halving_counter() {
        assert_eq!(squaring_rounds(0), 0);
        assert_eq!(squaring_rounds(1), 1);
        assert_eq!(squaring_rounds(16), 5);
        assert_eq!(squaring_rounds(17), 5);
        assert_eq!(squaring_rounds(1000), 10);
        assert_eq!(squaring_rounds(1024), 11);

        for n in 1..300usize {
            let mut counter = n;
            let mut iterations = 0;
            while counter != 0 {
                counter >>= 1;
                iterations += 1;
            }
            assert_eq!(squaring_rounds(n), iterations);
            // 2^rounds покрывает любой простой путь
            assert!(1usize << squaring_rounds(n) > n);
        }
    }

    #[test]
    fn sample_graph_in_both_modes() {
        for mode in [ClosureMode::Transitive, ClosureMode::Powers] {
            let closure = reference_squaring(&sample_graph(), mode).unwrap();
            assert_eq!(closure, sample_closure(), "{mode:?}");
        }
    }

    #[test]
    fn transitive_mode_matches_warshall() {
        let mut rng = StdRng::seed_from_u64(21);
        for (n, density) in [(5, 0.3), (16, 0.1), (40, 0.05), (70, 0.02)] {
            let adj = BoolMatrix::random(n, n, density, &mut rng).unwrap();
            let squared = reference_squaring(&adj, ClosureMode::Transitive).unwrap();
            assert_eq!(squared, reference_closure(&adj).unwrap(), "n = {n}");
            assert!(squared.padding_is_zero());
        }
    }

    #[test]
    fn powers_mode_loses_edges_without_self_loops() {
        // 0 -> 1: пути длины 2^k отсутствуют
        let adj = BoolMatrix::from_rows(2, 2, &[0, 1, 0, 0]).unwrap();
        assert_eq!(reference_squaring(&adj, ClosureMode::Powers).unwrap().count_ones(), 0);
        assert_eq!(
            reference_squaring(&adj, ClosureMode::Transitive).unwrap().logical_cells(),
            vec![0, 1, 0, 0]
        );
    }

    #[test]
    fn non_square_input_is_rejected() {
        let adj = BoolMatrix::zeros(3, 4).unwrap();
        assert!(matches!(
            reference_squaring(&adj, ClosureMode::Transitive),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn rejection_names_the_padded_shape() {
        let adj = BoolMatrix::zeros(5, 5).unwrap().pad_to(48, 32).unwrap();
        let err = reference_squaring(&adj, ClosureMode::Transitive).unwrap_err();
        assert!(err.to_string().contains("5x5 (padded 48x32)"), "{err}");
    }

    #[test]
    fn mode_names_in_json() {
        assert_eq!(serde_json::to_string(&ClosureMode::Powers).unwrap(), r#""powers""#);
        let mode: ClosureMode = serde_json::from_str(r#""transitive""#).unwrap();
        assert_eq!(mode, ClosureMode::Transitive);
    }
}
