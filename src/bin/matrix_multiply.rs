//! Сравнение булева умножения матриц на GPU и CPU
use anyhow::{Context, Result};
use opencl_boolmat::{
    matrix::{reference_product, MatrixFill},
    utils::measure_time,
    Accelerator, AcceleratorConfig, BoolMatrix,
};
use prettytable::{row, Table};
use rand::rngs::StdRng;
use rand::SeedableRng;

const MATRIX_SIZES: [usize; 4] = [64, 256, 500, 1024];
const NUM_ITERATIONS: usize = 10;
const SEED: u64 = 2024;

/// Выводит левый верхний угол матрицы 4x4
fn print_corner(title: &str, matrix: &BoolMatrix) {
    println!("\n{} ({}x{}):", title, matrix.rows(), matrix.cols());
    for i in 0..4.min(matrix.rows()) {
        for j in 0..4.min(matrix.cols()) {
            print!("{} ", matrix.get(i, j) as u8);
        }
        println!("...");
    }
    println!("...");
}

fn main() -> Result<()> {
    env_logger::init();

    println!("Сравнение булева умножения матриц на GPU и CPU");
    let config = AcceleratorConfig::from_env()?;
    let accelerator = Accelerator::new(config).context("Не удалось инициализировать OpenCL")?;
    println!("Устройство: {}", accelerator.device_name()?);

    let mut rng = StdRng::seed_from_u64(SEED);
    let fill = MatrixFill::Random { density: 0.05 };

    let mut table = Table::new();
    table.add_row(row!["Размер", "GPU, мс", "CPU, мс", "Ускорение", "Результат"]);

    for size in MATRIX_SIZES {
        let a = BoolMatrix::filled(size, size, fill, &mut rng)?;
        let b = BoolMatrix::filled(size, size, fill, &mut rng)?;

        // Прогрев: сборка программы и первый запуск
        accelerator.multiply(&a, &b)?;

        let (gpu, timer) = accelerator.multiply_timed(&a, &b, NUM_ITERATIONS)?;
        let (cpu, cpu_duration) = measure_time(|| reference_product(&a, &b));
        let cpu = cpu?;

        if size == MATRIX_SIZES[0] {
            print_corner("Входная матрица A", &a);
            print_corner("Входная матрица B", &b);
            print_corner("Результирующая матрица C (GPU)", &gpu);
        }

        let gpu_ms = timer.lap_avg().as_secs_f64() * 1000.0;
        let cpu_ms = cpu_duration.as_secs_f64() * 1000.0;
        let speedup = if gpu_ms > 0.0 { cpu_ms / gpu_ms } else { f64::INFINITY };
        let matches = gpu == cpu;

        table.add_row(row![
            format!("{}x{}", size, size),
            format!("{:.3}", gpu_ms),
            format!("{:.3}", cpu_ms),
            format!("{:.2}x", speedup),
            if matches { "совпадают" } else { "различаются" }
        ]);

        if !matches {
            table.printstd();
            anyhow::bail!("Результаты GPU и CPU различаются для {}x{}", size, size);
        }
    }

    println!("\nИтоговая статистика:");
    table.printstd();
    Ok(())
}
