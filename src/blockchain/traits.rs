use async_trait::async_trait;
use ethers::types::U256;

use crate::blockchain::bridge::{AllowanceKey, ApprovalRequest, BridgeReceipt, TransferRequest};
use crate::core::domain::AssetLists;

/// Connected wallet. Its presence gates default recipients.
pub trait WalletSigner: Send + Sync {
    /// Address on the native chain.
    fn identity_native(&self) -> String;

    /// Address on the counterpart chain.
    fn identity_counterpart(&self) -> String;

    /// Chain id the wallet is currently on, when the wallet reports one.
    fn chain_id(&self) -> Option<u64> {
        None
    }
}

/// Loads bridgeable assets (with their shadows) for a network.
#[async_trait]
pub trait AssetQueryService: Send + Sync {
    async fn query_assets(&self, network: &str) -> anyhow::Result<AssetLists>;
}

/// Read side of the on-chain allowance.
#[async_trait]
pub trait AllowanceSource: Send + Sync {
    /// Amount `key.owner` has already approved `key.spender` to move, in base units.
    async fn approved_amount(&self, key: &AllowanceKey) -> anyhow::Result<U256>;
}

/// Issues approval and bridge transfer requests.
#[async_trait]
pub trait BridgeBroadcaster: Send + Sync {
    async fn send_approve(&self, request: ApprovalRequest) -> anyhow::Result<BridgeReceipt>;

    async fn send_transfer(&self, request: TransferRequest) -> anyhow::Result<BridgeReceipt>;
}

/// URL query parameters of the current location.
pub trait QueryParamStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn delete(&self, key: &str);

    /// Commit pending edits by replacing the current history entry (no new entry).
    fn replace(&self);
}
