// src/blockchain/bridge/mod.rs

pub mod mock;

use ethers::types::U256;
use serde::{Deserialize, Serialize};

use crate::core::domain::Asset;

/// Allowance lookup key: `owner` lets `spender` move `asset`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AllowanceKey {
    pub owner: String,
    pub spender: String,
    /// Identity of the spendable asset.
    pub asset: String,
}

/// Raise the allowance of `asset` by `add_approve` base units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApprovalRequest {
    pub asset: Asset,
    pub add_approve: U256,
}

/// Bridge `asset.amount` (in the asset's own decimals) to `recipient`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferRequest {
    pub asset: Asset,
    pub recipient: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReceiptKind {
    Approval,
    Transfer,
}

/// Acknowledgement returned by the broadcaster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BridgeReceipt {
    pub tx_hash: String,
    pub kind: ReceiptKind,
    pub asset: String,
    pub amount: U256,
    pub recipient: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub use crate::blockchain::traits::{
    AllowanceSource, AssetQueryService, BridgeBroadcaster, QueryParamStore, WalletSigner,
};
