mod common;

use opencl_boolmat::matrix::{check_product, reference_product, reference_product_padded};
use opencl_boolmat::{AcceleratorConfig, BoolMatrix, Error, KernelSource, ProductShape};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;

#[test]
fn product_matches_cpu_on_tile_aligned_shape() {
    let Some(accelerator) = common::accelerator("product_matches_cpu_on_tile_aligned_shape") else { return };
    let mut rng = StdRng::seed_from_u64(1);

    let a = BoolMatrix::random(16, 16, 0.5, &mut rng).unwrap();
    let b = BoolMatrix::random(16, 16, 0.5, &mut rng).unwrap();
    let c = accelerator.multiply(&a, &b).unwrap();

    assert_eq!(c, reference_product(&a, &b).unwrap());
}

#[test]
fn product_matches_cpu_with_padding() {
    let Some(accelerator) = common::accelerator("product_matches_cpu_with_padding") else { return };
    let mut rng = StdRng::seed_from_u64(2);

    for (m, p, n) in [(150, 200, 400), (5, 9, 3), (33, 17, 48)] {
        let a = BoolMatrix::random(m, p, 0.1, &mut rng).unwrap();
        let b = BoolMatrix::random(p, n, 0.1, &mut rng).unwrap();
        let c = accelerator.multiply(&a, &b).unwrap();

        let shape = ProductShape::for_operands(&a, &b).unwrap();
        assert!(check_product(a.as_bytes(), b.as_bytes(), c.as_bytes(), shape).unwrap(), "{m}x{p}x{n}");
        assert!(c.padding_is_zero(), "{m}x{p}x{n}");
        assert_eq!((c.rows(), c.cols()), (m, n));
    }
}

#[test]
fn extra_padding_does_not_change_the_product() {
    let Some(accelerator) = common::accelerator("extra_padding_does_not_change_the_product") else { return };
    let mut rng = StdRng::seed_from_u64(3);

    let a = BoolMatrix::random(20, 30, 0.3, &mut rng).unwrap();
    let b = BoolMatrix::random(30, 10, 0.3, &mut rng).unwrap();
    let direct = accelerator.multiply(&a, &b).unwrap();

    let wide = accelerator
        .multiply(&a.pad_to(64, 48).unwrap(), &b.pad_to(48, 80).unwrap())
        .unwrap();

    assert_eq!((wide.tiled_rows(), wide.tiled_cols()), (64, 80));
    assert_eq!(wide.logical_cells(), direct.logical_cells());
    assert!(wide.padding_is_zero());
}

#[test]
fn raw_contract_overwrites_output() {
    let Some(accelerator) = common::accelerator("raw_contract_overwrites_output") else { return };
    let mut rng = StdRng::seed_from_u64(4);

    let a = BoolMatrix::random(32, 48, 0.2, &mut rng).unwrap();
    let b = BoolMatrix::random(48, 16, 0.2, &mut rng).unwrap();
    let shape = ProductShape::new(32, 48, 16).unwrap();

    // Содержимое выходного буфера на входе игнорируется
    let mut c = vec![1u8; shape.out_len()];
    accelerator.multiply_padded(a.as_bytes(), b.as_bytes(), &mut c, shape).unwrap();

    assert_eq!(c, reference_product(&a, &b).unwrap().into_bytes());
}

#[test]
fn repeated_runs_are_identical() {
    let Some(accelerator) = common::accelerator("repeated_runs_are_identical") else { return };
    let mut rng = StdRng::seed_from_u64(5);

    let a = BoolMatrix::random(64, 64, 0.05, &mut rng).unwrap();
    let b = BoolMatrix::random(64, 64, 0.05, &mut rng).unwrap();

    let first = accelerator.multiply(&a, &b).unwrap();
    let (second, timer) = accelerator.multiply_timed(&a, &b, 3).unwrap();

    assert_eq!(first.as_bytes(), second.as_bytes());
    assert_eq!(timer.laps().len(), 3);
}

#[test]
fn identity_is_neutral() {
    let Some(accelerator) = common::accelerator("identity_is_neutral") else { return };
    let mut rng = StdRng::seed_from_u64(6);

    let a = BoolMatrix::random(40, 40, 0.3, &mut rng).unwrap();
    let product = accelerator.multiply(&a, &BoolMatrix::identity(40).unwrap()).unwrap();
    assert_eq!(product, a);
}

#[test]
fn mismatched_operands_are_rejected() {
    let Some(accelerator) = common::accelerator("mismatched_operands_are_rejected") else { return };

    let a = BoolMatrix::zeros(16, 20).unwrap();
    let b = BoolMatrix::zeros(16, 16).unwrap();
    assert!(matches!(accelerator.multiply(&a, &b), Err(Error::InvalidInput(_))));

    let shape = ProductShape::square(16).unwrap();
    let mut short = vec![0u8; 10];
    assert!(matches!(
        accelerator.multiply_padded(a.as_bytes(), b.as_bytes(), &mut short, shape),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn any_nonzero_byte_counts_as_true() {
    let Some(accelerator) = common::accelerator("any_nonzero_byte_counts_as_true") else { return };
    let mut rng = StdRng::seed_from_u64(7);
    let shape = ProductShape::new(32, 48, 16).unwrap();

    let mut noisy = |len: usize| -> Vec<u8> {
        (0..len)
            .map(|_| match rng.gen_range(0..4) {
                0 => 2,
                1 => 255,
                _ => 0,
            })
            .collect()
    };
    let a = noisy(shape.lhs_len());
    let b = noisy(shape.rhs_len());

    let mut c = vec![7u8; shape.out_len()];
    accelerator.multiply_padded(&a, &b, &mut c, shape).unwrap();
    assert!(c.iter().all(|&cell| cell <= 1));

    let normalize = |cells: &[u8]| cells.iter().map(|&cell| (cell != 0) as u8).collect::<Vec<_>>();
    let expected = reference_product_padded(&normalize(&a), &normalize(&b), shape).unwrap();
    assert_eq!(c, expected);
    assert!(c.contains(&1));
}

#[test]
fn broken_kernel_source_reports_build_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("with_tiles.cl");
    fs::write(&path, "__kernel void with_tiles(__global const uchar* a, ) { this is not C }\n").unwrap();

    let config = AcceleratorConfig {
        kernel: KernelSource::File(path),
        ..AcceleratorConfig::default()
    };
    let Some(accelerator) = common::accelerator_with("broken_kernel_source_reports_build_failure", config) else {
        return;
    };

    let a = BoolMatrix::identity(16).unwrap();
    match accelerator.multiply(&a, &a) {
        Err(Error::BackendCall { call, .. }) => assert_eq!(call, "clBuildProgram"),
        other => panic!("expected a clBuildProgram failure, got {:?}", other.map(|_| ())),
    }
}
