use clap::{Parser, Subcommand, ValueEnum};
use ethers::types::U256;
use std::sync::Arc;
use tracing::info;

use crate::blockchain::bridge::mock::{
    InMemoryAllowanceSource, InMemoryAssetQuery, RecordingBroadcaster, StaticSigner,
};
use crate::blockchain::bridge::AllowanceKey;
use crate::core::amount::to_base_units;
use crate::core::config::BridgeConfig;
use crate::core::domain::{Asset, AssetLists, ChainRole, Direction};
use crate::core::errors::BridgeError;
use crate::core::validation::encode_ckb_short_address;
use crate::orchestrator::allowance::spendable_asset;
use crate::orchestrator::{AllowanceStatus, BridgeOrchestrator, Collaborators, SubmitOutcome};

/// Bridge orchestrator CLI (library-facing definitions)
#[derive(Debug, Parser)]
#[command(name = "bridge-cli", about = "Bridge transfer orchestrator CLI", disable_help_subcommand = true)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Path to a TOML bridge config (overrides BRIDGE_CONFIG_PATH)
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert a human amount to base units
    ToBaseUnits {
        amount: String,
        #[arg(long)]
        decimals: u8,
    },
    /// Convert base units to a human amount
    ToHuman {
        amount: String,
        #[arg(long)]
        decimals: u8,
        /// Omit thousands separators
        #[arg(long)]
        plain: bool,
    },
    /// Check an address against a chain's format
    Validate {
        address: String,
        #[arg(long, value_enum, default_value = "native")]
        chain: ChainArg,
    },
    /// Run an approve/transfer sequence against in-memory collaborators
    Simulate(SimulateArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChainArg {
    Native,
    Counterpart,
}

impl From<ChainArg> for ChainRole {
    fn from(arg: ChainArg) -> Self {
        match arg {
            ChainArg::Native => ChainRole::Native,
            ChainArg::Counterpart => ChainRole::Counterpart,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct SimulateArgs {
    /// Network key; defaults to the configured default network
    #[arg(long)]
    pub network: Option<String>,
    #[arg(long, default_value = "in")]
    pub direction: Direction,
    #[arg(long, default_value = "1")]
    pub amount: String,
    /// Recipient; defaults to the simulated wallet's identity
    #[arg(long)]
    pub recipient: Option<String>,
    /// Allowance already granted, human units
    #[arg(long, default_value = "0")]
    pub approved: String,
}

const SIM_DECIMALS: u8 = 6;
const SIM_COUNTERPART_NETWORK: &str = "Nervos";
const SIM_NATIVE_IDENTITY: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";
const SIM_LOCK_ARGS: [u8; 20] = [0x36; 20];

fn simulated_assets(network: &str) -> AssetLists {
    let balance = U256::from(1_000_000_000u64);
    let native = Asset::new(network, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "USDC", Some(SIM_DECIMALS))
        .with_amount(balance);
    let shadow = Asset::new(SIM_COUNTERPART_NETWORK, "0x5f3c", "ckUSDC", Some(SIM_DECIMALS)).with_amount(balance);

    AssetLists {
        native_chain_assets: vec![native.clone().with_shadow(shadow.clone())],
        counterpart_chain_assets: vec![shadow.with_shadow(native)],
    }
}

/// Drive one full submission cycle with simulated collaborators.
///
/// Submits once; when that was an approval, refreshes and submits the
/// transfer. Returns every outcome in order.
pub async fn run_simulation(config: BridgeConfig, args: SimulateArgs) -> Result<Vec<SubmitOutcome>, BridgeError> {
    let network = args.network.clone().unwrap_or_else(|| config.default_network.clone());
    config.network(&network)?;

    let counterpart_identity = encode_ckb_short_address(
        config.counterpart_address_prefixes.first().map(String::as_str).unwrap_or("ckt"),
        &SIM_LOCK_ARGS,
    )?;
    let signer = Arc::new(StaticSigner::new(SIM_NATIVE_IDENTITY, &counterpart_identity));

    let lists = simulated_assets(&network);
    let allowance = Arc::new(InMemoryAllowanceSource::new());
    let broadcaster = Arc::new(RecordingBroadcaster::new().crediting(allowance.clone()));
    let collaborators = Collaborators {
        asset_query: Arc::new(InMemoryAssetQuery::new().with_network(&network, lists.clone())),
        allowance: allowance.clone(),
        broadcaster,
    };

    let orchestrator = BridgeOrchestrator::new(config.clone(), collaborators)?;
    orchestrator.switch_network_pair(&network, args.direction)?;
    orchestrator.set_signer(Some(signer));
    orchestrator.load_assets().await?;

    let selected = lists
        .for_direction(args.direction)
        .first()
        .cloned()
        .ok_or_else(|| BridgeError::AssetsNotLoaded(network.clone()))?;
    orchestrator.select_asset(&selected.identity())?;

    if let Some(spendable) = spendable_asset(&selected, args.direction) {
        let owner = match args.direction.source() {
            ChainRole::Native => SIM_NATIVE_IDENTITY.to_string(),
            ChainRole::Counterpart => counterpart_identity.clone(),
        };
        let key = AllowanceKey {
            owner,
            spender: config.network(&network)?.bridge_contract.clone(),
            asset: spendable.identity(),
        };
        allowance.set(key, to_base_units(&args.approved, SIM_DECIMALS)?);
    }

    let mut outcomes = Vec::new();
    loop {
        orchestrator.set_amount(&args.amount);
        if let Some(recipient) = &args.recipient {
            orchestrator.set_recipient(recipient);
        }
        let status = orchestrator.refresh_allowance().await?;
        info!(status = ?status, "allowance evaluated");

        let outcome = orchestrator.submit().await?;
        let approved = matches!(outcome, SubmitOutcome::Approved(_));
        outcomes.push(outcome);
        if !approved {
            break;
        }

        futures::try_join!(orchestrator.load_assets(), orchestrator.refresh_allowance())?;
        if orchestrator.allowance_status().is_some_and(|s| matches!(s, AllowanceStatus::NeedApprove(_))) {
            return Err(BridgeError::RequestFailed("approval did not raise the allowance".to_string()));
        }
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(direction: Direction, approved: &str) -> SimulateArgs {
        SimulateArgs {
            network: None,
            direction,
            amount: "12.5".to_string(),
            recipient: None,
            approved: approved.to_string(),
        }
    }

    #[test]
    fn parses_simulate_flags() {
        let cli = Cli::try_parse_from(["bridge-cli", "simulate", "--direction", "out", "--amount", "3"]).unwrap();
        match cli.command {
            Commands::Simulate(a) => {
                assert_eq!(a.direction, Direction::Out);
                assert_eq!(a.amount, "3");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[tokio::test]
    async fn simulation_approves_then_transfers() {
        let outcomes = run_simulation(BridgeConfig::default(), args(Direction::In, "0")).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], SubmitOutcome::Approved(_)));
        assert!(matches!(outcomes[1], SubmitOutcome::Transferred(_)));
        assert_eq!(outcomes[1].receipt().amount, U256::from(12_500_000u64));
    }

    #[tokio::test]
    async fn simulation_with_allowance_transfers_directly() {
        let outcomes = run_simulation(BridgeConfig::default(), args(Direction::In, "100")).await.unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], SubmitOutcome::Transferred(_)));
    }

    #[tokio::test]
    async fn simulation_out_needs_no_approval() {
        let outcomes = run_simulation(BridgeConfig::default(), args(Direction::Out, "0")).await.unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].receipt().recipient.as_deref(), Some(SIM_NATIVE_IDENTITY));
    }
}
