//! Derived view state.
//!
//! Nothing here mutates the form; every value is recomputed from the current
//! state on each call.

use ethers::types::U256;
use serde::Serialize;

use super::{AssetQueryState, BridgeOrchestrator, OrchestratorState};
use crate::core::amount::{to_base_units, to_human_string, HumanizeOptions};
use crate::core::domain::{Asset, Direction};
use crate::core::errors::BridgeError;
use crate::orchestrator::allowance::{evaluate_allowance, spendable_asset, AllowanceInput, AllowanceStatus};
use crate::orchestrator::validate::{validate_form, FormField, FormRules, ValidateResult};

const BPS_DENOMINATOR: u64 = 10_000;

/// Inline status of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldStatus {
    pub error: bool,
    pub help: Option<String>,
}

/// Primary action of the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FormAction {
    /// The wallet is on another chain than the active network.
    SwitchChain { chain_id_hex: String, chain_name: String },
    Submit { enabled: bool, label: String },
}

/// Asset picker state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSelector {
    pub options: Vec<Asset>,
    pub loading: bool,
    pub enabled: bool,
}

/// Preview of the pending transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    pub network: String,
    pub direction: Direction,
    pub from_symbol: String,
    pub to_symbol: Option<String>,
    pub amount: String,
    pub recipient: String,
    /// Informative fee, human units. `None` when it cannot be computed yet.
    pub fee: Option<String>,
}

/// Fee for `amount` at `fee_bps` basis points, rounded up.
pub fn bridge_fee(amount: U256, fee_bps: u32) -> U256 {
    let denominator = U256::from(BPS_DENOMINATOR);
    let bps = U256::from(fee_bps);
    let whole = (amount / denominator) * bps;
    let rest = (amount % denominator) * bps;
    let rest_fee = (rest + denominator - U256::one()) / denominator;
    whole + rest_fee
}

impl BridgeOrchestrator {
    pub(crate) fn rules_locked(&self, st: &OrchestratorState) -> FormRules {
        FormRules::for_network(&self.config, &st.network, st.pair.direction)
    }

    pub(crate) fn allowance_status_locked(&self, st: &OrchestratorState) -> Option<AllowanceStatus> {
        let form = self.form.snapshot();
        let key = self.allowance_key_locked(st);
        let fact = st.allowance.as_ref().filter(|f| key.as_ref() == Some(&f.key));
        evaluate_allowance(AllowanceInput {
            selected: form.selected_asset.as_ref(),
            direction: st.pair.direction,
            approval_direction: self.config.approval_direction,
            requested: &form.bridge_from_amount,
            fact,
        })
    }

    fn validate_locked(&self, st: &OrchestratorState) -> ValidateResult {
        validate_form(&self.form.snapshot(), &self.rules_locked(st))
    }

    /// Validate the current form.
    pub fn validate(&self) -> ValidateResult {
        let st = self.state.lock();
        self.validate_locked(&st)
    }

    /// Allowance status of the current selection; `None` while unknown.
    pub fn allowance_status(&self) -> Option<AllowanceStatus> {
        let st = self.state.lock();
        self.allowance_status_locked(&st)
    }

    /// Error styling only once the field was touched.
    pub fn field_status(&self, field: FormField) -> FieldStatus {
        let st = self.state.lock();
        if !st.touched.contains(&field) {
            return FieldStatus::default();
        }
        let help = self.validate_locked(&st).error(field).map(str::to_string);
        FieldStatus { error: help.is_some(), help }
    }

    /// Primary action of the form.
    ///
    /// The label reads "Approve" only for a known shortfall. While the
    /// allowance is still unknown it reads "Bridge"; pressing it makes
    /// [`BridgeOrchestrator::submit`] read the allowance first and approve
    /// instead when it turns out short.
    pub fn form_action(&self) -> FormAction {
        let st = self.state.lock();

        if let Some(chain_id) = st.signer.as_ref().and_then(|s| s.chain_id()) {
            if chain_id != st.network.chain_id {
                return FormAction::SwitchChain {
                    chain_id_hex: format!("0x{:x}", st.network.chain_id),
                    chain_name: st.network.chain_name.clone(),
                };
            }
        }

        let need_approve = self.allowance_status_locked(&st).map_or(false, |s| s.need_approve());
        let connected = st.signer.is_some();
        let valid = self.validate_locked(&st).is_success();
        let enabled = !st.in_flight && !(!valid && !need_approve && connected);
        let label = if need_approve { "Approve" } else { "Bridge" };
        FormAction::Submit { enabled, label: label.to_string() }
    }

    /// `"To <SYMBOL> Address"` for the destination chain.
    pub fn recipient_label(&self) -> String {
        let st = self.state.lock();
        format!("To {} Address", self.rules_locked(&st).recipient_symbol)
    }

    pub fn input_enabled(&self) -> bool {
        let st = self.state.lock();
        st.signer.is_some() && self.form.selected_asset().is_some()
    }

    pub fn asset_selector(&self) -> AssetSelector {
        let st = self.state.lock();
        let wallet_ok = st.signer.is_some() || !self.config.require_connected_wallet;
        let options = st
            .assets
            .lists()
            .map(|lists| lists.for_direction(st.pair.direction).to_vec())
            .unwrap_or_default();
        AssetSelector {
            enabled: matches!(st.assets, AssetQueryState::Loaded(_)) && wallet_ok,
            loading: st.assets.is_loading(),
            options,
        }
    }

    pub fn show_transfer_summary(&self) -> bool {
        let form = self.form.snapshot();
        !form.recipient.trim().is_empty()
            && !form.bridge_from_amount.trim().is_empty()
            && form.selected_asset.is_some()
    }

    pub fn transfer_summary(&self) -> Option<TransferSummary> {
        if !self.show_transfer_summary() {
            return None;
        }
        let st = self.state.lock();
        let form = self.form.snapshot();
        let selected = form.selected_asset.as_ref()?;
        let direction = st.pair.direction;

        let fee = spendable_asset(selected, direction).and_then(|outgoing| {
            let decimals = outgoing.decimals()?;
            let amount = to_base_units(&form.bridge_from_amount, decimals).ok()?;
            let fee = bridge_fee(amount, st.network.fee_bps);
            Some(to_human_string(fee, decimals, HumanizeOptions::default()))
        });

        Some(TransferSummary {
            network: st.pair.network.clone(),
            direction,
            from_symbol: selected.symbol.clone(),
            to_symbol: selected.shadow().map(|s| s.symbol.clone()),
            amount: form.bridge_from_amount.trim().to_string(),
            recipient: form.recipient.trim().to_string(),
            fee,
        })
    }

    /// Informative bridge fee in base units on the active network.
    pub fn estimate_bridge_fee(&self, amount: U256) -> U256 {
        let fee_bps = self.state.lock().network.fee_bps;
        bridge_fee(amount, fee_bps)
    }

    /// Open the confirmation step. Refused unless the form could be submitted.
    pub fn open_confirmation(&self) -> Result<(), BridgeError> {
        let mut st = self.state.lock();
        if st.in_flight {
            return Err(BridgeError::SubmissionInProgress);
        }
        let need_approve = self.allowance_status_locked(&st).map_or(false, |s| s.need_approve());
        if !need_approve {
            let result = self.validate_locked(&st);
            if !result.is_success() {
                return Err(BridgeError::Validation(result));
            }
        }
        st.confirmation_open = true;
        Ok(())
    }

    pub fn close_confirmation(&self) {
        self.state.lock().confirmation_open = false;
    }

    pub fn confirmation_open(&self) -> bool {
        self.state.lock().confirmation_open
    }

    /// Whether the progress dialog is shown.
    pub fn loading_dialog(&self) -> bool {
        self.state.lock().in_flight
    }
}
