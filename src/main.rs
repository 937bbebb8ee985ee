// src/main.rs
//! Bridge orchestrator CLI entry point.
use anyhow::{Context, Result};
use bridge_orchestrator::blockchain::bridge::mock::bridge_mocks_allowed;
use bridge_orchestrator::cli::{run_simulation, Cli, Commands};
use bridge_orchestrator::core::amount::{to_base_units, to_human_string, HumanizeOptions};
use bridge_orchestrator::core::config::BridgeConfig;
use clap::Parser;
use ethers::types::U256;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    let config = match &cli.config {
        Some(path) => {
            let mut config = BridgeConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            config.apply_env_overrides()?;
            config.validate()?;
            config
        }
        None => BridgeConfig::from_env()?,
    };

    match cli.command {
        Commands::ToBaseUnits { amount, decimals } => {
            let value = to_base_units(&amount, decimals)?;
            println!("{}", value);
        }
        Commands::ToHuman { amount, decimals, plain } => {
            let value = U256::from_dec_str(amount.trim())
                .map_err(|e| anyhow::anyhow!("invalid base-unit amount {}: {}", amount, e))?;
            let opts = if plain { HumanizeOptions::plain() } else { HumanizeOptions::default() };
            println!("{}", to_human_string(value, decimals, opts));
        }
        Commands::Validate { address, chain } => {
            config.address_format(chain.into()).validate(address.trim())?;
            println!("valid");
        }
        Commands::Simulate(args) => {
            if !bridge_mocks_allowed() {
                tracing::error!("Refusing to simulate: set ALLOW_BRIDGE_MOCKS=1 or build with `test-env`");
                std::process::exit(1);
            }
            info!(direction = %args.direction, amount = %args.amount, "starting simulation");
            let outcomes = run_simulation(config, args).await?;
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
        }
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
