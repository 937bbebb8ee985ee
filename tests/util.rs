// tests/util.rs
// Shared fixtures for orchestrator integration tests
#![allow(dead_code)]

use bridge_orchestrator::blockchain::bridge::mock::{
    InMemoryAllowanceSource, InMemoryAssetQuery, RecordingBroadcaster, StaticSigner,
};
use bridge_orchestrator::blockchain::bridge::AllowanceKey;
use async_trait::async_trait;
use bridge_orchestrator::blockchain::traits::{AllowanceSource, WalletSigner};
use bridge_orchestrator::core::config::BridgeConfig;
use bridge_orchestrator::core::domain::{Asset, AssetLists};
use bridge_orchestrator::core::validation::encode_ckb_short_address;
use bridge_orchestrator::{BridgeOrchestrator, Collaborators};
use ethers::types::U256;
use std::sync::Arc;
use tokio::sync::Notify;

pub const NATIVE_IDENTITY: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";
pub const BRIDGE_CONTRACT: &str = "0x0000000000000000000000000000000000000001";
pub const USDC_ADDRESS: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
pub const WETH_ADDRESS: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

/// Enables the simulated collaborators for spawned binaries.
pub fn set_test_env() {
    std::env::set_var("ALLOW_BRIDGE_MOCKS", "1");
}

pub fn counterpart_identity() -> String {
    encode_ckb_short_address("ckt", &[0x22; 20]).expect("static CKB address")
}

pub fn signer() -> Arc<dyn WalletSigner> {
    Arc::new(StaticSigner::new(NATIVE_IDENTITY, &counterpart_identity()))
}

fn units(v: &str) -> U256 {
    U256::from_dec_str(v).expect("static amount")
}

/// USDC on Ethereum (6 decimals) paired with ckUSDC.
pub fn usdc() -> Asset {
    Asset::new("Ethereum", USDC_ADDRESS, "USDC", Some(6))
        .with_amount(units("250000000"))
        .with_shadow(Asset::new("Nervos", "0x5f3c", "ckUSDC", Some(6)).with_amount(units("40000000")))
}

pub fn ck_usdc() -> Asset {
    Asset::new("Nervos", "0x5f3c", "ckUSDC", Some(6))
        .with_amount(units("40000000"))
        .with_shadow(Asset::new("Ethereum", USDC_ADDRESS, "USDC", Some(6)).with_amount(units("250000000")))
}

/// WETH (18 decimals) holding exactly 2 WETH.
pub fn weth() -> Asset {
    Asset::new("Ethereum", WETH_ADDRESS, "WETH", Some(18))
        .with_amount(units("2000000000000000000"))
        .with_shadow(Asset::new("Nervos", "0x9c1d", "ckWETH", Some(18)))
}

/// An asset whose chain metadata has not resolved yet.
pub fn pending_metadata() -> Asset {
    Asset::new("Ethereum", "0x6B175474E89094C44Da98b954EedeAC495271d0F", "DAI", None)
        .with_amount(units("1000"))
        .with_shadow(Asset::new("Nervos", "0x7e2a", "ckDAI", None))
}

/// An asset whose shadow is not known yet.
pub fn unpaired() -> Asset {
    Asset::new("Ethereum", "0xdAC17F958D2ee523a2206206994597C13D831ec7", "USDT", Some(6)).with_amount(units("1000000"))
}

pub fn default_lists() -> AssetLists {
    AssetLists {
        native_chain_assets: vec![usdc(), weth(), pending_metadata(), unpaired()],
        counterpart_chain_assets: vec![ck_usdc()],
    }
}

pub fn allowance_key(asset: &Asset) -> AllowanceKey {
    AllowanceKey {
        owner: NATIVE_IDENTITY.to_string(),
        spender: BRIDGE_CONTRACT.to_string(),
        asset: asset.identity(),
    }
}

pub struct Fixture {
    pub orchestrator: Arc<BridgeOrchestrator>,
    pub allowance: Arc<InMemoryAllowanceSource>,
    pub broadcaster: Arc<RecordingBroadcaster>,
    pub assets: Arc<InMemoryAssetQuery>,
}

/// Allowance source whose every read fails.
pub struct FailingAllowanceSource;

#[async_trait]
impl AllowanceSource for FailingAllowanceSource {
    async fn approved_amount(&self, _key: &AllowanceKey) -> anyhow::Result<U256> {
        Err(anyhow::anyhow!("allowance rpc unavailable"))
    }
}

pub fn fixture() -> Fixture {
    build(BridgeConfig::default(), None, None)
}

pub fn fixture_with_config(config: BridgeConfig) -> Fixture {
    build(config, None, None)
}

/// Broadcaster holds every request until `gate` is notified.
pub fn gated_fixture(gate: Arc<Notify>) -> Fixture {
    build(BridgeConfig::default(), Some(gate), None)
}

/// The orchestrator reads allowances from `source` instead of `Fixture::allowance`.
pub fn fixture_with_allowance(source: Arc<dyn AllowanceSource>) -> Fixture {
    build(BridgeConfig::default(), None, Some(source))
}

fn build(config: BridgeConfig, gate: Option<Arc<Notify>>, source: Option<Arc<dyn AllowanceSource>>) -> Fixture {
    let allowance = Arc::new(InMemoryAllowanceSource::new());
    let source: Arc<dyn AllowanceSource> = source.unwrap_or_else(|| allowance.clone() as Arc<dyn AllowanceSource>);
    let mut broadcaster = RecordingBroadcaster::new().crediting(allowance.clone());
    if let Some(gate) = gate {
        broadcaster = broadcaster.gated(gate);
    }
    let broadcaster = Arc::new(broadcaster);
    let assets = Arc::new(InMemoryAssetQuery::new().with_network("Ethereum", default_lists()));

    let orchestrator = BridgeOrchestrator::new(
        config,
        Collaborators {
            asset_query: assets.clone(),
            allowance: source,
            broadcaster: broadcaster.clone(),
        },
    )
    .expect("default config is valid");

    Fixture { orchestrator: Arc::new(orchestrator), allowance, broadcaster, assets }
}

/// Connected wallet, assets loaded, `asset` selected.
pub async fn ready_with(fx: &Fixture, asset: &Asset) {
    fx.orchestrator.set_signer(Some(signer()));
    fx.orchestrator.load_assets().await.expect("assets load");
    fx.orchestrator.select_asset(&asset.identity()).expect("asset is listed");
}
