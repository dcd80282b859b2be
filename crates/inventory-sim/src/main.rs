use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use inventory_core::EngineConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod simulator;

use simulator::{run_simulator, SimulatorConfig};

#[derive(Debug, Parser)]
#[command(name = "inventory-sim", version, about = "Inventory walkthrough simulator")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run seeded entry/exit cycles and check engine invariants
    Simulate(SimulateArgs),
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Number of walkthrough cycles, alternating entry and exit
    #[arg(long, default_value_t = 10)]
    cycles: u32,

    /// Rooms created in the first cycle
    #[arg(long, default_value_t = 3)]
    rooms: usize,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Probability (0..=1) that an attached photo fails to encode
    #[arg(long, default_value_t = 0.0, value_parser = parse_rate)]
    photo_failure_rate: f64,

    /// Engine configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_rate(raw: &str) -> Result<f64, String> {
    let rate: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("{rate} is not within 0..=1"))
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    EngineConfig::from_toml_str(&source).with_context(|| format!("parsing config {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match cli.command {
        Command::Simulate(args) => {
            let config = SimulatorConfig {
                seed: args.seed,
                cycles: args.cycles,
                rooms: args.rooms,
                photo_failure_rate: args.photo_failure_rate,
                engine: load_engine_config(args.config.as_deref())?,
            };
            tracing::info!(seed = config.seed, cycles = config.cycles, rooms = config.rooms, "running simulator");

            let report = run_simulator(config).await?;
            println!("{}", report.generate_text());

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
    }
}
