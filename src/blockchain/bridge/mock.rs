// filepath: src/blockchain/bridge/mock.rs
//! In-memory collaborators. Used by tests and by `bridge-cli simulate`.

use anyhow::Result;
use async_trait::async_trait;
use ethers::types::U256;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;
use uuid::Uuid;

use crate::blockchain::bridge::{
    AllowanceKey, ApprovalRequest, BridgeReceipt, ReceiptKind, TransferRequest,
};
use crate::blockchain::traits::{AllowanceSource, AssetQueryService, BridgeBroadcaster, WalletSigner};
use crate::core::domain::AssetLists;

/// Whether simulated collaborators may be wired outside of tests.
///
/// Enabled by the `test-env` feature or `ALLOW_BRIDGE_MOCKS=1|true|yes`.
pub fn bridge_mocks_allowed() -> bool {
    if cfg!(feature = "test-env") {
        return true;
    }
    if let Ok(val) = env::var("ALLOW_BRIDGE_MOCKS") {
        let v = val.trim();
        if v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes") {
            return true;
        }
    }
    false
}

/// Wallet with fixed identities.
#[derive(Debug, Clone)]
pub struct StaticSigner {
    pub native: String,
    pub counterpart: String,
    pub chain_id: Option<u64>,
}

impl StaticSigner {
    pub fn new(native: &str, counterpart: &str) -> Self {
        Self { native: native.to_string(), counterpart: counterpart.to_string(), chain_id: None }
    }

    pub fn on_chain(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }
}

impl WalletSigner for StaticSigner {
    fn identity_native(&self) -> String {
        self.native.clone()
    }

    fn identity_counterpart(&self) -> String {
        self.counterpart.clone()
    }

    fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }
}

/// Asset lists keyed by network.
#[derive(Debug, Default)]
pub struct InMemoryAssetQuery {
    lists: RwLock<HashMap<String, AssetLists>>,
}

impl InMemoryAssetQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_network(self, network: &str, lists: AssetLists) -> Self {
        self.lists.write().insert(network.to_string(), lists);
        self
    }

    pub fn set(&self, network: &str, lists: AssetLists) {
        self.lists.write().insert(network.to_string(), lists);
    }
}

#[async_trait]
impl AssetQueryService for InMemoryAssetQuery {
    async fn query_assets(&self, network: &str) -> Result<AssetLists> {
        self.lists
            .read()
            .get(network)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("asset query failed: no assets for network {}", network))
    }
}

/// Allowance facts keyed by (owner, spender, asset).
#[derive(Debug, Default)]
pub struct InMemoryAllowanceSource {
    approved: RwLock<HashMap<AllowanceKey, U256>>,
}

impl InMemoryAllowanceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: AllowanceKey, amount: U256) {
        self.approved.write().insert(key, amount);
    }

    /// Raise every recorded allowance on `asset` by `amount`.
    pub fn credit(&self, asset: &str, amount: U256) {
        let mut approved = self.approved.write();
        for (key, value) in approved.iter_mut() {
            if key.asset == asset {
                *value = value.saturating_add(amount);
            }
        }
    }

    pub fn get(&self, key: &AllowanceKey) -> U256 {
        self.approved.read().get(key).copied().unwrap_or_default()
    }
}

#[async_trait]
impl AllowanceSource for InMemoryAllowanceSource {
    async fn approved_amount(&self, key: &AllowanceKey) -> Result<U256> {
        Ok(self.get(key))
    }
}

/// Broadcaster that records every request and answers with simulated receipts.
#[derive(Default)]
pub struct RecordingBroadcaster {
    approvals: RwLock<Vec<ApprovalRequest>>,
    transfers: RwLock<Vec<TransferRequest>>,
    fail_next: RwLock<Option<String>>,
    gate: Option<Arc<Notify>>,
    allowance: Option<Arc<InMemoryAllowanceSource>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every request until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Credit approvals to `source`, as the chain would.
    pub fn crediting(mut self, source: Arc<InMemoryAllowanceSource>) -> Self {
        self.allowance = Some(source);
        self
    }

    pub fn fail_next(&self, reason: &str) {
        *self.fail_next.write() = Some(reason.to_string());
    }

    pub fn approvals(&self) -> Vec<ApprovalRequest> {
        self.approvals.read().clone()
    }

    pub fn transfers(&self) -> Vec<TransferRequest> {
        self.transfers.read().clone()
    }

    pub fn request_count(&self) -> usize {
        self.approvals.read().len() + self.transfers.read().len()
    }

    async fn settle(&self) -> Result<()> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(reason) = self.fail_next.write().take() {
            return Err(anyhow::anyhow!(reason));
        }
        Ok(())
    }
}

#[async_trait]
impl BridgeBroadcaster for RecordingBroadcaster {
    async fn send_approve(&self, request: ApprovalRequest) -> Result<BridgeReceipt> {
        info!("[SIMULATED] approve {} of {}", request.add_approve, request.asset.identity());
        self.approvals.write().push(request.clone());
        self.settle().await?;

        if let Some(source) = &self.allowance {
            source.credit(&request.asset.identity(), request.add_approve);
        }

        Ok(BridgeReceipt {
            tx_hash: format!("0x_simulated_approve_tx_{}", Uuid::new_v4()),
            kind: ReceiptKind::Approval,
            asset: request.asset.identity(),
            amount: request.add_approve,
            recipient: None,
            created_at: chrono::Utc::now(),
        })
    }

    async fn send_transfer(&self, request: TransferRequest) -> Result<BridgeReceipt> {
        info!(
            "[SIMULATED] bridge {} of {} to {}",
            request.asset.amount,
            request.asset.identity(),
            request.recipient
        );
        self.transfers.write().push(request.clone());
        self.settle().await?;

        Ok(BridgeReceipt {
            tx_hash: format!("0x_simulated_tx_{}", Uuid::new_v4()),
            kind: ReceiptKind::Transfer,
            asset: request.asset.identity(),
            amount: request.asset.amount,
            recipient: Some(request.recipient),
            created_at: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::Asset;
    use serial_test::serial;

    fn key() -> AllowanceKey {
        AllowanceKey { owner: "ckt1owner".to_string(), spender: "0xbridge".to_string(), asset: "Nervos/0x01".to_string() }
    }

    #[test]
    #[serial]
    fn test_bridge_mock_gating_env() {
        let saved = env::var("ALLOW_BRIDGE_MOCKS").ok();
        env::remove_var("ALLOW_BRIDGE_MOCKS");
        if !cfg!(feature = "test-env") {
            assert!(!bridge_mocks_allowed());
        }
        env::set_var("ALLOW_BRIDGE_MOCKS", "yes");
        assert!(bridge_mocks_allowed());
        match saved {
            Some(v) => env::set_var("ALLOW_BRIDGE_MOCKS", v),
            None => env::remove_var("ALLOW_BRIDGE_MOCKS"),
        }
    }

    #[tokio::test]
    async fn test_approval_credits_allowance() {
        let source = Arc::new(InMemoryAllowanceSource::new());
        source.set(key(), U256::from(5u64));
        let broadcaster = RecordingBroadcaster::new().crediting(source.clone());

        let asset = Asset::new("Nervos", "0x01", "ckUSDC", Some(6));
        let receipt = broadcaster
            .send_approve(ApprovalRequest { asset, add_approve: U256::from(10u64) })
            .await
            .expect("approve should succeed");

        assert_eq!(receipt.kind, ReceiptKind::Approval);
        assert!(receipt.tx_hash.starts_with("0x_simulated_approve_tx_"));
        assert_eq!(source.get(&key()), U256::from(15u64));
        assert_eq!(broadcaster.approvals().len(), 1);
    }

    #[tokio::test]
    async fn test_fail_next_is_consumed() {
        let broadcaster = RecordingBroadcaster::new();
        broadcaster.fail_next("user rejected");
        let req = TransferRequest {
            asset: Asset::new("Ethereum", "0x02", "USDC", Some(6)),
            recipient: "ckt1xyz".to_string(),
        };
        let err = broadcaster.send_transfer(req.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), "user rejected");
        assert!(broadcaster.send_transfer(req).await.is_ok());
        assert_eq!(broadcaster.transfers().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_network_query_fails() {
        let query = InMemoryAssetQuery::new();
        assert!(query.query_assets("Ethereum").await.is_err());
    }
}
