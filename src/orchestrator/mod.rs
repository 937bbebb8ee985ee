//! Bridge transfer orchestrator
//!
//! Owns one transfer form and sequences approval and transfer requests for it.
//!
//! ## Module Structure
//! - `form` - Shared form state container
//! - `validate` - Pure form validation
//! - `allowance` - Allowance evaluation
//! - `prefill` - URL query prefill
//! - `selection` - Direction, network, signer, asset and field updates
//! - `submit` - Approval and transfer submission
//! - `presentation` - Derived view state (field status, primary action, summary)
//!
//! Lock order: orchestrator state first, then the form container. No lock is
//! held across an await.

pub mod allowance;
pub mod form;
pub mod prefill;
pub mod presentation;
pub mod selection;
pub mod submit;
pub mod validate;

pub use allowance::{AllowanceFact, AllowanceStatus};
pub use form::{FormContainer, TransferFormState};
pub use prefill::{QueryPrefill, UrlQueryStore};
pub use presentation::{AssetSelector, FieldStatus, FormAction, TransferSummary};
pub use submit::SubmitOutcome;
pub use validate::{FormField, ValidateResult};

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::blockchain::traits::{
    AllowanceSource, AssetQueryService, BridgeBroadcaster, QueryParamStore, WalletSigner,
};
use crate::core::config::{BridgeConfig, NetworkConfig};
use crate::core::domain::{AssetLists, Direction, NetworkPair};
use crate::core::errors::BridgeError;
use crate::orchestrator::validate::TouchedFields;

/// External services the orchestrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub asset_query: Arc<dyn AssetQueryService>,
    pub allowance: Arc<dyn AllowanceSource>,
    pub broadcaster: Arc<dyn BridgeBroadcaster>,
}

/// Submission state machine.
///
/// `Idle -> Validating -> ApprovalPending -> Idle` or
/// `Idle -> Validating -> SubmissionPending -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmissionPhase {
    Idle,
    Validating,
    ApprovalPending,
    SubmissionPending,
}

impl fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubmissionPhase::Idle => "idle",
            SubmissionPhase::Validating => "validating",
            SubmissionPhase::ApprovalPending => "approval_pending",
            SubmissionPhase::SubmissionPending => "submission_pending",
        };
        f.write_str(s)
    }
}

/// Progress of the asset list query for the active network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetQueryState {
    NotLoaded,
    Loading,
    Loaded(AssetLists),
    Failed(String),
}

impl AssetQueryState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AssetQueryState::Loading)
    }

    pub fn lists(&self) -> Option<&AssetLists> {
        match self {
            AssetQueryState::Loaded(lists) => Some(lists),
            _ => None,
        }
    }
}

pub(crate) struct OrchestratorState {
    pub(crate) pair: NetworkPair,
    /// Configuration of `pair.network`.
    pub(crate) network: NetworkConfig,
    pub(crate) signer: Option<Arc<dyn WalletSigner>>,
    pub(crate) phase: SubmissionPhase,
    /// A request is outstanding. Survives resets.
    pub(crate) in_flight: bool,
    /// Bumped on every reset; completions compare against it.
    pub(crate) generation: u64,
    pub(crate) touched: TouchedFields,
    pub(crate) assets: AssetQueryState,
    /// Bumped on every asset query so stale answers can be dropped.
    pub(crate) asset_request: u64,
    pub(crate) allowance: Option<AllowanceFact>,
    pub(crate) prefill: Option<QueryPrefill>,
    pub(crate) query_store: Option<Arc<dyn QueryParamStore>>,
    pub(crate) confirmation_open: bool,
}

/// Transfer orchestrator for a single mounted form.
pub struct BridgeOrchestrator {
    pub(crate) config: BridgeConfig,
    pub(crate) form: FormContainer,
    pub(crate) collaborators: Collaborators,
    pub(crate) state: Mutex<OrchestratorState>,
}

impl BridgeOrchestrator {
    /// Create an orchestrator on the configured default network.
    pub fn new(config: BridgeConfig, collaborators: Collaborators) -> Result<Self, BridgeError> {
        config.validate()?;
        let network = config.network(&config.default_network)?.clone();
        let pair = NetworkPair::new(config.default_network.clone(), Direction::default());

        info!(network = %pair.network, direction = %pair.direction, "bridge orchestrator created");

        Ok(Self {
            form: FormContainer::new(pair.direction),
            config,
            collaborators,
            state: Mutex::new(OrchestratorState {
                pair,
                network,
                signer: None,
                phase: SubmissionPhase::Idle,
                in_flight: false,
                generation: 0,
                touched: TouchedFields::new(),
                assets: AssetQueryState::NotLoaded,
                asset_request: 0,
                allowance: None,
                prefill: None,
                query_store: None,
                confirmation_open: false,
            }),
        })
    }

    /// Mount the form: capture URL prefill and apply it, or strip it when a
    /// signer is already connected.
    pub fn mount(&self, store: Arc<dyn QueryParamStore>) {
        let mut st = self.state.lock();
        let mut prefill = QueryPrefill::capture(store.as_ref());

        if st.signer.is_some() {
            prefill.apply_once();
            prefill.strip(store.as_ref());
            self.reset_locked(&mut st);
        } else if let Some(values) = prefill.apply_once() {
            st.touched.extend(prefill.initial_touched());
            self.form.update(|form| {
                if let Some(recipient) = values.recipient {
                    form.recipient = recipient;
                }
                if let Some(amount) = values.amount {
                    form.bridge_from_amount = amount;
                }
            });
            debug!(touched = st.touched.len(), "applied URL prefill");
        }

        st.prefill = Some(prefill);
        st.query_store = Some(store);
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Shared handle to the form state.
    pub fn form(&self) -> FormContainer {
        self.form.clone()
    }

    pub fn network_pair(&self) -> NetworkPair {
        self.state.lock().pair.clone()
    }

    pub fn direction(&self) -> Direction {
        self.state.lock().pair.direction
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.state.lock().phase
    }

    /// Whether a request is outstanding.
    pub fn is_submitting(&self) -> bool {
        self.state.lock().in_flight
    }

    pub fn has_signer(&self) -> bool {
        self.state.lock().signer.is_some()
    }

    pub fn touched(&self) -> TouchedFields {
        self.state.lock().touched.clone()
    }

    pub fn asset_query_state(&self) -> AssetQueryState {
        self.state.lock().assets.clone()
    }

    /// Return to Idle with a blank amount and the direction's default recipient.
    pub(crate) fn reset_locked(&self, st: &mut OrchestratorState) {
        st.generation = st.generation.wrapping_add(1);
        st.phase = SubmissionPhase::Idle;
        st.touched.clear();
        st.confirmation_open = false;

        let recipient = match (&st.signer, st.pair.direction) {
            (Some(signer), Direction::Out) => signer.identity_native(),
            (Some(signer), Direction::In) => signer.identity_counterpart(),
            (None, _) => String::new(),
        };
        let direction = st.pair.direction;
        self.form.update(|form| {
            form.direction = direction;
            form.bridge_from_amount.clear();
            form.recipient = recipient;
        });

        debug!(direction = %direction, generation = st.generation, "form reset");
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::harness;
    use super::*;
    use crate::blockchain::bridge::mock::StaticSigner;

    #[test]
    fn starts_idle_on_default_network() {
        let h = harness();
        let o = &h.orchestrator;
        assert_eq!(o.network_pair(), NetworkPair::new("Ethereum", Direction::In));
        assert_eq!(o.phase(), SubmissionPhase::Idle);
        assert_eq!(o.asset_query_state(), AssetQueryState::NotLoaded);
        assert!(!o.is_submitting());
    }

    #[test]
    fn mount_without_signer_applies_prefill() {
        let h = harness();
        let store = Arc::new(UrlQueryStore::new("https://bridge.example/?recipient=0xabc&amount=10").unwrap());
        h.orchestrator.mount(store.clone());

        let form = h.orchestrator.form().snapshot();
        assert_eq!(form.recipient, "0xabc");
        assert_eq!(form.bridge_from_amount, "10");
        assert_eq!(h.orchestrator.touched().len(), 2);
        assert_eq!(store.current(), "https://bridge.example/?recipient=0xabc&amount=10");
    }

    #[test]
    fn mount_with_signer_strips_and_resets() {
        let h = harness();
        h.orchestrator.set_signer(Some(Arc::new(StaticSigner::new("0xnative", "ckt1counterpart"))));
        let store = Arc::new(UrlQueryStore::new("https://bridge.example/?recipient=0xabc&amount=10").unwrap());
        h.orchestrator.mount(store.clone());

        let form = h.orchestrator.form().snapshot();
        assert_eq!(form.recipient, "ckt1counterpart");
        assert_eq!(form.bridge_from_amount, "");
        assert_eq!(store.current(), "https://bridge.example/");
        assert_eq!(store.history_len(), 1);
    }

    #[test]
    fn rejects_invalid_config() {
        let h = harness();
        let mut config = BridgeConfig::default();
        config.networks.clear();
        let err = BridgeOrchestrator::new(config, h.orchestrator.collaborators.clone()).err();
        assert!(matches!(err, Some(BridgeError::Config(_))));
    }
}
