use std::{
    fs,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use airship_sim::{
    agent::AgentKind,
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
    wind::{records_from_gfs_json, write_csv, CsvDialect},
    world::World,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Balloon, airship and predator/prey map simulation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a scenario headless
    Run {
        /// Path to the scenario YAML file
        #[arg(long, default_value = "scenarios/airships.yaml")]
        scenario: PathBuf,

        /// Override tick count (uses scenario default when omitted)
        #[arg(long)]
        ticks: Option<u64>,

        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,

        /// Print the final census as JSON
        #[arg(long)]
        summary_json: bool,
    },
    /// Convert a GFS surface-wind JSON document into the wind CSV table
    ConvertGfs {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = DialectArg::Comma)]
        dialect: DialectArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DialectArg {
    Comma,
    Semicolon,
}

impl From<DialectArg> for CsvDialect {
    fn from(value: DialectArg) -> Self {
        match value {
            DialectArg::Comma => CsvDialect::Comma,
            DialectArg::Semicolon => CsvDialect::Semicolon,
        }
    }
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(scenario: PathBuf, ticks: Option<u64>, seed: Option<u64>, summary_json: bool) -> Result<()> {
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&scenario)?;
    init_logging(&scenario.logging.level);

    let wind = loader.load_wind(&scenario)?;
    let mut settings = EngineSettings::from_scenario(&scenario);
    if seed.is_some() {
        settings.seed = seed;
    }
    let ticks = scenario.ticks(ticks);

    let mut world = World::new();
    let mut engine = EngineBuilder::new(settings)
        .with_wind(wind)
        .with_standard_systems()
        .build();
    engine.initialize(&mut world)?;
    engine.run(&mut world, ticks)?;

    let counters = engine.counters();
    println!(
        "Scenario '{}' completed for {} ticks. Live agents: {}",
        scenario.name,
        ticks,
        AgentKind::ALL
            .iter()
            .map(|kind| format!("{kind}={}", counters.get(*kind)))
            .collect::<Vec<_>>()
            .join(", ")
    );
    if summary_json {
        println!("{}", serde_json::to_string_pretty(counters)?);
    }
    Ok(())
}

fn convert_gfs(input: PathBuf, output: PathBuf, dialect: DialectArg) -> Result<()> {
    init_logging("info");
    let text = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let records = records_from_gfs_json(&text)
        .with_context(|| format!("Failed to convert {}", input.display()))?;
    let file = fs::File::create(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    write_csv(&records, &mut writer, dialect.into())?;
    writer.flush()?;
    tracing::info!(records = records.len(), output = %output.display(), "wind table written");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            scenario,
            ticks,
            seed,
            summary_json,
        } => run(scenario, ticks, seed, summary_json),
        Command::ConvertGfs {
            input,
            output,
            dialect,
        } => convert_gfs(input, output, dialect),
    }
}
