

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use kindred::KindredConfig;
use kindred::eval::{analyze, format_table, generate};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Generate,
    Analyze,
    Both,
}

/// Generate synthetic users and compare matching strategies on them.
#[derive(Debug, Parser)]
#[command(name = "kindred-experiment", version)]
struct Args {
    /// Number of synthetic users to generate
    #[arg(long, default_value_t = 5)]
    users: usize,

    #[arg(long, value_enum, default_value_t = Mode::Both)]
    mode: Mode,

    /// Overrides the configured data directory
    #[arg(long, env = "KINDRED_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// TOML/JSON/YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("kindred=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = KindredConfig::load(args.config.as_deref())?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    config.validate()?;

    info!(
        "LLM: {} ({}), embeddings: {} ({})",
        config.llm_provider, config.llm_model, config.embedding_provider, config.embedding_model
    );

    if matches!(args.mode, Mode::Generate | Mode::Both) {
        info!("Generating synthetic data for {} users", args.users);
        generate(&config, args.users).await?;
    }

    if matches!(args.mode, Mode::Analyze | Mode::Both) {
        let evaluation = analyze(&config).await?;
        println!("{}", format_table(&evaluation.reports));
        println!(
            "Results written to {}",
            config.results_dir().display()
        );
    }

    Ok(())
}
