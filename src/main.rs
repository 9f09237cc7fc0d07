//! Булево умножение матриц и транзитивное замыкание на OpenCL

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use opencl_boolmat::{
    graph::{sample_closure, sample_graph},
    matrix::{check_product, show, tiled_dim},
    utils::LapTimer,
    Accelerator, AcceleratorConfig, BoolMatrix, ClosureMode, KernelSource,
};
use prettytable::{row, Table};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_LAPS: usize = 20;

#[derive(Parser)]
#[command(name = "boolmat", version, about = "Булево умножение матриц и транзитивное замыкание на OpenCL")]
struct Cli {
    #[command(flatten)]
    device: DeviceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct DeviceArgs {
    /// JSON с настройками ускорителя
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Индекс платформы OpenCL
    #[arg(long, env = "BOOLMAT_PLATFORM", global = true)]
    platform: Option<usize>,

    /// Индекс устройства на платформе
    #[arg(long, env = "BOOLMAT_DEVICE", global = true)]
    device: Option<usize>,

    /// Файл .cl с ядром with_tiles вместо встроенного
    #[arg(long, env = "BOOLMAT_KERNEL", global = true)]
    kernel: Option<PathBuf>,
}

impl DeviceArgs {
    fn accelerator(&self) -> Result<Accelerator> {
        let mut config = match &self.config {
            Some(path) => AcceleratorConfig::from_json_file(path)?,
            None => AcceleratorConfig::default(),
        };
        if let Some(platform) = self.platform {
            config.platform_index = platform;
        }
        if let Some(device) = self.device {
            config.device_index = device;
        }
        if let Some(kernel) = &self.kernel {
            config.kernel = KernelSource::File(kernel.clone());
        }

        let accelerator = Accelerator::new(config).context("Не удалось инициализировать OpenCL")?;
        println!("Устройство: {}", accelerator.device_name().unwrap_or_default());
        Ok(accelerator)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Булево произведение случайных матриц
    Multiply(MultiplyArgs),
    /// Транзитивное замыкание графа
    Closure(ClosureArgs),
    /// Проверка умножения, контрольный граф и замеры времени
    Selftest,
}

#[derive(Args)]
struct MultiplyArgs {
    #[arg(long)]
    m: usize,
    #[arg(long)]
    p: usize,
    #[arg(long)]
    n: usize,

    /// Доля единиц в случайных матрицах
    #[arg(long, default_value_t = 0.5)]
    density: f64,

    /// Количество запусков ядра для замера
    #[arg(long, default_value_t = DEFAULT_LAPS)]
    laps: usize,

    #[arg(long)]
    seed: Option<u64>,

    /// Сверить результат с вычислением на CPU
    #[arg(long)]
    verify: bool,

    /// Вывести отчёт в JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ClosureArgs {
    /// Число вершин случайного графа
    #[arg(long, conflicts_with = "input", required_unless_present = "input")]
    n: Option<usize>,

    /// JSON-файл с матрицей смежности
    #[arg(long)]
    input: Option<PathBuf>,

    /// Доля рёбер в случайном графе
    #[arg(long, default_value_t = 0.1)]
    density: f64,

    #[arg(long, default_value_t = DEFAULT_LAPS)]
    laps: usize,

    #[arg(long, value_enum, default_value_t = ModeArg::Transitive)]
    mode: ModeArg,

    #[arg(long)]
    seed: Option<u64>,

    /// Напечатать матрицы смежности и замыкания
    #[arg(long)]
    show: bool,

    /// Записать замыкание в JSON-файл
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Transitive,
    Powers,
}

impl From<ModeArg> for ClosureMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Transitive => ClosureMode::Transitive,
            ModeArg::Powers => ClosureMode::Powers,
        }
    }
}

/// Строка отчёта о замере
#[derive(Serialize)]
struct Report {
    operation: &'static str,
    shape: String,
    laps: usize,
    avg_ms: f64,
    std_ms: f64,
    verified: Option<bool>,
}

impl Report {
    fn new(operation: &'static str, shape: String, timer: &LapTimer, verified: Option<bool>) -> Self {
        Self {
            operation,
            shape,
            laps: timer.laps().len(),
            avg_ms: millis(timer.lap_avg()),
            std_ms: millis(timer.lap_std()),
            verified,
        }
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

fn print_reports(reports: &[Report], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["Операция", "Размер", "Запусков", "Среднее, мс", "СКО, мс", "Проверка"]);
    for report in reports {
        let verified = match report.verified {
            Some(true) => "совпадает",
            Some(false) => "РАСХОДИТСЯ",
            None => "-",
        };
        table.add_row(row![
            report.operation,
            report.shape,
            report.laps,
            format!("{:.3}", report.avg_ms),
            format!("{:.3}", report.std_ms),
            verified
        ]);
    }
    table.printstd();
    Ok(())
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn lap_progress(laps: usize, message: String) -> Result<ProgressBar> {
    let pb = ProgressBar::new(laps as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message(message);
    Ok(pb)
}

fn run_multiply(accelerator: &Accelerator, args: &MultiplyArgs) -> Result<()> {
    let mut rng = rng_from(args.seed);
    let a = BoolMatrix::random(args.m, args.p, args.density, &mut rng)?;
    let b = BoolMatrix::random(args.p, args.n, args.density, &mut rng)?;

    let (c, timer) = accelerator.multiply_timed(&a, &b, args.laps)?;

    let verified = if args.verify {
        let shape = opencl_boolmat::ProductShape::for_operands(&a, &b)?;
        Some(check_product(a.as_bytes(), b.as_bytes(), c.as_bytes(), shape)?)
    } else {
        None
    };

    let shape = format!("{}x{}x{}", args.m, args.p, args.n);
    print_reports(&[Report::new("multiply", shape, &timer, verified)], args.json)?;

    if verified == Some(false) {
        bail!("Результаты GPU и CPU различаются");
    }
    Ok(())
}

fn closure_laps(accelerator: &Accelerator, adj: &BoolMatrix, mode: ClosureMode, laps: usize) -> Result<(BoolMatrix, LapTimer)> {
    if laps == 0 {
        bail!("Нужен хотя бы один запуск");
    }
    let pb = lap_progress(laps, format!("замыкание {}x{}", adj.rows(), adj.cols()))?;
    let mut timer = LapTimer::new();
    let mut closure = None;
    for _ in 0..laps {
        timer.restart_lap();
        closure = Some(accelerator.close_with(adj, mode)?);
        timer.next_lap();
        pb.inc(1);
    }
    pb.finish_and_clear();
    let closure = closure.context("Замыкание не вычислено")?;
    Ok((closure, timer))
}

fn run_closure(accelerator: &Accelerator, args: &ClosureArgs) -> Result<()> {
    let adj = match (&args.input, args.n) {
        (Some(path), _) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Не удалось прочитать {}", path.display()))?;
            serde_json::from_str::<BoolMatrix>(&text)
                .with_context(|| format!("Некорректная матрица в {}", path.display()))?
        }
        (None, Some(n)) => BoolMatrix::random(n, n, args.density, &mut rng_from(args.seed))?,
        (None, None) => bail!("Укажите --n или --input"),
    };

    let (closure, timer) = closure_laps(accelerator, &adj, args.mode.into(), args.laps)?;

    if args.show {
        println!("Матрица смежности:\n{}", adj);
        println!("Замыкание:\n{}", closure);
    }
    if let Some(path) = &args.output {
        fs::write(path, serde_json::to_string(&closure)?)
            .with_context(|| format!("Не удалось записать {}", path.display()))?;
    }

    let shape = format!("{}x{}", adj.rows(), adj.cols());
    print_reports(&[Report::new("closure", shape, &timer, None)], args.json)
}

fn run_selftest(accelerator: &Accelerator) -> Result<()> {
    let mut rng = StdRng::from_entropy();
    let mut reports = Vec::new();

    println!("Проверка умножения");
    for (m, p, n) in [(16, 16, 16), (150, 200, 400), (1000, 1000, 1000)] {
        let a = BoolMatrix::random(m, p, 0.5, &mut rng)?;
        let b = BoolMatrix::random(p, n, 0.5, &mut rng)?;
        let (c, timer) = accelerator.multiply_timed(&a, &b, DEFAULT_LAPS)?;
        let shape = opencl_boolmat::ProductShape::for_operands(&a, &b)?;
        let verified = check_product(a.as_bytes(), b.as_bytes(), c.as_bytes(), shape)?;
        reports.push(Report::new("multiply", format!("{}x{}x{}", shape.m, shape.p, shape.n), &timer, Some(verified)));
        if !verified {
            print_reports(&reports, false)?;
            bail!("Произведение {}x{}x{} не совпало с CPU", m, p, n);
        }
    }

    println!("Проверка замыкания на контрольном графе");
    let closure = accelerator.close(&sample_graph())?;
    if closure != sample_closure() {
        bail!("Замыкание контрольного графа неверно:\n{}", show(&closure));
    }
    println!("---контрольный граф: замыкание верно---");

    for size in [16usize, 1000] {
        let tiled = tiled_dim(size)?;
        let adj = BoolMatrix::random(tiled, tiled, 0.1, &mut rng)?;
        let (closure, timer) = closure_laps(accelerator, &adj, ClosureMode::default(), DEFAULT_LAPS)?;
        reports.push(Report::new("closure", format!("{}x{}", size, size), &timer, None));
        if size == 16 {
            println!("Матрица смежности:\n{}", show(&adj));
            println!("Замыкание:\n{}", show(&closure));
        }
    }

    print_reports(&reports, false)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let accelerator = cli.device.accelerator()?;

    match &cli.command {
        Command::Multiply(args) => run_multiply(&accelerator, args),
        Command::Closure(args) => run_closure(&accelerator, args),
        Command::Selftest => run_selftest(&accelerator),
    }
}
