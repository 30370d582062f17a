//! hetbench: dual-device partitioned OpenCL benchmark runner.
//!
//! Splits a GEMM or Jacobi workload between two OpenCL devices by a row
//! ratio and reports device-reported kernel time next to host wall time;
//! the gap between the two is the interesting number.
//!
//! ```bash
//! # List what the ICD loader can see
//! hetbench devices
//!
//! # One multiply, 70% of rows on platform 0
//! hetbench gemm --rows 6400 --inner 1600 --cols 1600 --ratio 0.7
//!
//! # Jacobi solve sweeping ratios 0.0, 0.1, ..., 1.0
//! hetbench jacobi --n 4096 --sweep
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use hetbench_opencl::{
    device, partitioned_gemm, partitioned_jacobi, ClDevice, DeviceSelector, GemmShape,
    JacobiSettings, Precision, Scalar,
};
use hetbench_reference::{dominant_matrix, matrix, mean_abs_error, parallel_gemm, vector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

#[derive(Parser)]
#[command(name = "hetbench")]
#[command(about = "Dual-device partitioned OpenCL benchmarks (GEMM and Jacobi)")]
#[command(version)]
struct Cli {
    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List OpenCL platforms and their devices
    Devices,
    /// One-shot partitioned matrix multiply
    Gemm(GemmArgs),
    /// Partitioned iterative Jacobi solve
    Jacobi(JacobiArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Platform index for the first device
    #[arg(long, default_value_t = 0, value_name = "INDEX")]
    first: usize,

    /// Platform index for the second device
    #[arg(long, default_value_t = 1, value_name = "INDEX")]
    second: usize,

    /// Fraction of rows assigned to the first device
    #[arg(long, default_value_t = 0.5, value_name = "RATIO")]
    ratio: f64,

    /// Sweep ratios 0.0..=1.0 in steps of 0.1 instead of a single run
    #[arg(long, conflicts_with = "ratio")]
    sweep: bool,

    /// Numeric precision of the kernels and operands
    #[arg(long, value_enum, default_value_t = PrecisionArg::Single)]
    precision: PrecisionArg,

    /// Seed for operand generation
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

impl CommonArgs {
    fn ratios(&self) -> Vec<f64> {
        if self.sweep {
            (0..=10).map(|step| f64::from(step) / 10.0).collect()
        } else {
            vec![self.ratio]
        }
    }

    fn resolve_devices(&self) -> Result<(ClDevice, ClDevice)> {
        let first = DeviceSelector::platform(self.first)
            .resolve()
            .with_context(|| format!("resolving first device (platform {})", self.first))?;
        let second = DeviceSelector::platform(self.second)
            .resolve()
            .with_context(|| format!("resolving second device (platform {})", self.second))?;
        Ok((first, second))
    }
}

#[derive(Args)]
struct GemmArgs {
    /// Rows of A (split between the devices; multiple of 16)
    #[arg(long, default_value_t = 6400)]
    rows: usize,

    /// Inner dimension (columns of A, rows of B)
    #[arg(long, default_value_t = 1600)]
    inner: usize,

    /// Columns of B (multiple of 16)
    #[arg(long, default_value_t = 1600)]
    cols: usize,

    /// Verify the result against the thread-parallel CPU reference
    #[arg(long)]
    check: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct JacobiArgs {
    /// System size n (multiple of 32)
    #[arg(long, default_value_t = 4096)]
    n: usize,

    /// Convergence tolerance on the accumulated |delta|
    #[arg(long, default_value_t = 1e-6)]
    eps: f64,

    /// Iteration cap
    #[arg(long, default_value_t = 200)]
    max_iter: u32,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PrecisionArg {
    Single,
    Double,
}

impl From<PrecisionArg> for Precision {
    fn from(arg: PrecisionArg) -> Self {
        match arg {
            PrecisionArg::Single => Precision::SinglePrecision,
            PrecisionArg::Double => Precision::DoublePrecision,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Devices => list_devices(),
        Commands::Gemm(args) => match args.common.precision {
            PrecisionArg::Single => run_gemm::<f32>(&args),
            PrecisionArg::Double => run_gemm::<f64>(&args),
        },
        Commands::Jacobi(args) => match args.common.precision {
            PrecisionArg::Single => run_jacobi::<f32>(&args),
            PrecisionArg::Double => run_jacobi::<f64>(&args),
        },
    }
}

fn list_devices() -> Result<()> {
    let platforms = device::enumerate_platforms().context("enumerating OpenCL platforms")?;
    if platforms.is_empty() {
        println!("no OpenCL platforms found");
        return Ok(());
    }
    for (index, platform) in platforms.iter().enumerate() {
        println!("{} {}", style(format!("[{index}]")).bold(), platform.name);
        for device_name in &platform.devices {
            println!("    {device_name}");
        }
    }
    Ok(())
}

fn run_gemm<T: Scalar>(args: &GemmArgs) -> Result<()> {
    let (first, second) = args.common.resolve_devices()?;
    let shape = GemmShape { rows: args.rows, inner: args.inner, cols: args.cols };

    let mut rng = StdRng::seed_from_u64(args.common.seed);
    let a: Vec<T> = matrix(&mut rng, shape.rows, shape.inner);
    let b: Vec<T> = matrix(&mut rng, shape.inner, shape.cols);
    info!(
        "gemm {}x{}x{} ({}) on '{}' / '{}'",
        shape.rows, shape.inner, shape.cols, T::PRECISION, first.device_name, second.device_name
    );

    print_header(&first, &second);
    for ratio in args.common.ratios() {
        let run = partitioned_gemm(&first, &second, shape, &a, &b, ratio)
            .with_context(|| format!("gemm at ratio {ratio}"))?;
        println!(
            "  ratio {:>5.2}  device {}",
            ratio,
            style(format!("{:>9.4} s", run.device_seconds)).green(),
        );

        if args.check {
            let expected = parallel_gemm(shape, &a, &b);
            let error = mean_abs_error(&run.c, &expected);
            println!("             mean abs error vs CPU reference: {error:.3e}");
        }
    }
    Ok(())
}

fn run_jacobi<T: Scalar>(args: &JacobiArgs) -> Result<()> {
    let (first, second) = args.common.resolve_devices()?;
    let settings = JacobiSettings { eps: args.eps, max_iterations: args.max_iter };

    let mut rng = StdRng::seed_from_u64(args.common.seed);
    let a: Vec<T> = dominant_matrix(&mut rng, args.n);
    let b: Vec<T> = vector(&mut rng, args.n);
    info!(
        "jacobi n={} ({}) on '{}' / '{}'",
        args.n,
        T::PRECISION,
        first.device_name,
        second.device_name
    );

    print_header(&first, &second);
    for ratio in args.common.ratios() {
        let run = partitioned_jacobi(&first, &second, args.n, &a, &b, ratio, settings)
            .with_context(|| format!("jacobi at ratio {ratio}"))?;
        let outcome = if run.converged {
            style(format!("converged in {:>3}", run.iterations)).green()
        } else {
            style(format!("did not converge in {}", run.iterations)).yellow()
        };
        println!(
            "  ratio {:>5.2}  device {:>9.4} s  wall {:>9.4} s  {}",
            ratio, run.timing.device_seconds, run.timing.wall_seconds, outcome,
        );
    }
    Ok(())
}

fn print_header(first: &ClDevice, second: &ClDevice) {
    println!(
        "{} vs {}",
        style(&first.device_name).cyan().bold(),
        style(&second.device_name).cyan().bold(),
    );
}
