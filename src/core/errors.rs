//! Error taxonomy for the bridge orchestrator.
//!
//! Three classes matter to callers:
//! - user input errors (bad amount/recipient), recovered locally and shown inline;
//! - precondition failures, raised when required metadata is missing at submit time;
//! - request failures, returned by the broadcaster and propagated unchanged.

use thiserror::Error;

use crate::orchestrator::validate::ValidateResult;

/// Errors produced by the orchestrator and its pure helpers.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Amount string is not a non-negative decimal or exceeds the asset precision.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Address does not match the expected chain format.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Field-level validation failed; the form is left untouched.
    #[error("Validation failed: {0}")]
    Validation(ValidateResult),

    /// Required metadata missing at submit time. Indicates a sequencing defect.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Approval or transfer request rejected by the broadcaster or on-chain.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// A submission is already outstanding for this form.
    #[error("A submission is already in progress")]
    SubmissionInProgress,

    /// Submit attempted without a wallet while the policy requires one.
    #[error("Wallet not connected")]
    WalletNotConnected,

    /// Asset lists were not loaded yet (or failed to load).
    #[error("Assets not loaded: {0}")]
    AssetsNotLoaded(String),

    /// Asset identity not present in the current asset list.
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    /// Network not configured.
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BridgeError {
    /// Inline, field-scoped errors the user can fix by editing the form.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            BridgeError::InvalidAmount(_)
                | BridgeError::InvalidAddress(_)
                | BridgeError::Validation(_)
        )
    }

    /// Caller-sequencing defects (`boom`).
    pub fn is_precondition(&self) -> bool {
        matches!(self, BridgeError::Precondition(_))
    }

    /// Errors where a user-initiated re-submission can succeed.
    /// The orchestrator never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BridgeError::RequestFailed(_) | BridgeError::SubmissionInProgress)
    }
}

impl From<anyhow::Error> for BridgeError {
    fn from(err: anyhow::Error) -> Self {
        BridgeError::RequestFailed(err.to_string())
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        BridgeError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}
