//! pixtopo-bench: CLI tool for running grid analyses and collecting diagnostics.
//!
//! Loads a binary grid (text, JSON, image, or a built-in demo), runs the
//! distance transform, erosion and simple-point classification, and prints
//! per-stage diagnostics. Useful for:
//!
//! - Comparing four- and eight-connectivity classifications
//! - Checking how the structuring size affects erosion
//! - Measuring per-stage durations on large grids
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin pixtopo-bench -- [OPTIONS] [INPUT]
//! cargo run --release --bin pixtopo-bench -- --demo course --print
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod demo;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use log::info;
use pixtopo_core::diagnostics::{AnalysisDiagnostics, Clock};
use pixtopo_core::{Analysis, AnalysisConfig, Grid};

use crate::demo::Demo;

/// Binary-grid topology analysis and diagnostics for pixtopo.
///
/// Runs the distance transform, erosion and simple-point classifier on a
/// grid and prints per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "pixtopo-bench", version)]
struct Cli {
    /// Input grid: `.json` (array of rows), an image (PNG, JPEG, BMP,
    /// WebP), or a text grid of `0`/`1` characters.
    #[arg(required_unless_present = "demo", conflicts_with = "demo")]
    input: Option<PathBuf>,

    /// Use a built-in grid instead of an input file.
    #[arg(long, value_enum)]
    demo: Option<Demo>,

    /// Luma threshold for image input; pixels at or above it are foreground.
    #[arg(long, default_value_t = 128)]
    threshold: u8,

    /// Foreground connectivity for the simple-point classifier.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_CONNECTIVITY)]
    connectivity: ConnectivityArg,

    /// Side of the square structuring element (positive, odd).
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_STRUCTURING_SIZE)]
    structuring_size: u32,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Print the distances, eroded grid and simple mask of the first run.
    #[arg(long)]
    print: bool,

    /// Full analysis config as a JSON string.
    ///
    /// When provided, `--connectivity` and `--structuring-size` are
    /// ignored. The JSON must be a valid `AnalysisConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Connectivity selection.
#[derive(Clone, Copy, ValueEnum)]
enum ConnectivityArg {
    /// Axis-aligned neighbors; background checked with eight.
    Four,
    /// Axis-aligned and diagonal neighbors; background checked with four.
    Eight,
}

impl From<ConnectivityArg> for pixtopo_core::Connectivity {
    fn from(arg: ConnectivityArg) -> Self {
        match arg {
            ConnectivityArg::Four => Self::Four,
            ConnectivityArg::Eight => Self::Eight,
        }
    }
}

const fn connectivity_from_core(c: pixtopo_core::Connectivity) -> ConnectivityArg {
    match c {
        pixtopo_core::Connectivity::Four => ConnectivityArg::Four,
        pixtopo_core::Connectivity::Eight => ConnectivityArg::Eight,
    }
}

/// The CLI default connectivity, derived from
/// [`AnalysisConfig::DEFAULT_CONNECTIVITY`] so the two cannot diverge.
const CLI_DEFAULT_CONNECTIVITY: ConnectivityArg =
    connectivity_from_core(AnalysisConfig::DEFAULT_CONNECTIVITY);

/// Build an [`AnalysisConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<AnalysisConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        AnalysisConfig {
            connectivity: cli.connectivity.into(),
            structuring_size: cli.structuring_size,
        }
    };
    config.validate().map_err(|e| format!("Invalid config: {e}"))?;
    Ok(config)
}

/// How an input file is interpreted, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    Json,
    Image,
    Text,
}

impl InputFormat {
    fn of(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Self::Json,
            Some("png" | "jpg" | "jpeg" | "bmp" | "webp") => Self::Image,
            _ => Self::Text,
        }
    }
}

/// Load the grid named on the command line.
fn load_grid(cli: &Cli) -> Result<Grid, String> {
    if let Some(demo) = cli.demo {
        return demo
            .grid()
            .map_err(|e| format!("Error building demo grid: {e}"));
    }
    let Some(ref path) = cli.input else {
        return Err("No input given (pass a path or --demo)".to_string());
    };

    match InputFormat::of(path) {
        InputFormat::Json => {
            let text = read_to_string(path)?;
            serde_json::from_str(&text)
                .map_err(|e| format!("Error parsing {}: {e}", path.display()))
        }
        InputFormat::Image => {
            let bytes = std::fs::read(path)
                .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
            Grid::from_image_bytes(&bytes, cli.threshold)
                .map_err(|e| format!("Error decoding {}: {e}", path.display()))
        }
        InputFormat::Text => read_to_string(path)?
            .parse()
            .map_err(|e| format!("Error parsing {}: {e}", path.display())),
    }
}

fn read_to_string(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("Error reading {}: {e}", path.display()))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let grid = match load_grid(&cli) {
        Ok(grid) => grid,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    info!("loaded {} grid", grid.dimensions());

    match (&cli.demo, &cli.input) {
        (Some(demo), _) => eprintln!("Grid: demo {demo:?} ({})", grid.dimensions()),
        (None, Some(path)) => eprintln!("Grid: {} ({})", path.display(), grid.dimensions()),
        (None, None) => {}
    }
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match pixtopo_core::diagnostics::analyze_with_diagnostics(&grid, &config, &StdClock) {
            Ok((analysis, diagnostics)) => {
                if run == 0 && cli.print {
                    print_grids(&grid, &analysis);
                }

                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Analysis error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Print the input and every analysis output as text grids.
fn print_grids(grid: &Grid, analysis: &Analysis) {
    println!("Input:\n{grid}\n");
    println!("Distances:\n{}\n", analysis.distances);
    println!(
        "Eroded (size {}):\n{}\n",
        analysis.config.structuring_size, analysis.eroded
    );
    println!(
        "Simple points ({}):\n{}\n",
        analysis.config.connectivity, analysis.simple
    );
}

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[AnalysisDiagnostics]) {
    let Some(first) = all_diagnostics.first() else {
        println!("Warning: no diagnostics to summarize");
        return;
    };

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    for (index, (name, _)) in first.stages().iter().enumerate() {
        let total: f64 = all_diagnostics
            .iter()
            .map(|d| d.stages()[index].1.duration.as_secs_f64() * 1000.0)
            .sum();
        let stage_mean = total / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
