//! Approval and transfer submission.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{BridgeOrchestrator, OrchestratorState, SubmissionPhase};
use crate::blockchain::bridge::{ApprovalRequest, BridgeReceipt, TransferRequest};
use crate::core::amount::to_base_units;
use crate::core::domain::AssetOverrides;
use crate::core::errors::BridgeError;
use crate::core::result_ext::{boom, OptionExt};
use crate::orchestrator::allowance::{spendable_asset, AllowanceStatus};
use crate::orchestrator::validate::validate_form;

/// What a successful submit did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", content = "receipt", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Approved(BridgeReceipt),
    Transferred(BridgeReceipt),
}

impl SubmitOutcome {
    pub fn receipt(&self) -> &BridgeReceipt {
        match self {
            SubmitOutcome::Approved(r) | SubmitOutcome::Transferred(r) => r,
        }
    }
}

enum PlannedRequest {
    Approve(ApprovalRequest),
    Transfer(TransferRequest),
}

impl BridgeOrchestrator {
    /// Submit the form.
    ///
    /// Sends an approval when the allowance is short, otherwise the bridge
    /// transfer. In the approval direction an allowance that was never read
    /// (or was invalidated by a selection change or an earlier approval) is
    /// fetched first; a transfer is never sent on an unknown allowance.
    ///
    /// Only one request may be outstanding; a second call is rejected with
    /// [`BridgeError::SubmissionInProgress`]. On success the form is reset
    /// unless a direction or signer change already reset it. On failure the
    /// form is left as it was.
    pub async fn submit(&self) -> Result<SubmitOutcome, BridgeError> {
        let unresolved = {
            let mut st = self.state.lock();
            if st.in_flight || st.phase != SubmissionPhase::Idle {
                warn!(phase = %st.phase, "submit rejected: a request is already outstanding");
                return Err(BridgeError::SubmissionInProgress);
            }
            if self.config.require_connected_wallet && st.signer.is_none() {
                warn!("submit rejected: wallet not connected");
                return Err(BridgeError::WalletNotConnected);
            }

            st.phase = SubmissionPhase::Validating;
            st.in_flight = true;
            self.unresolved_allowance_key_locked(&st)
        };

        if let Some(key) = unresolved {
            debug!(asset = %key.asset, "allowance unknown at submit, querying");
            let fetched = self.fetch_allowance(&key).await;
            let mut st = self.state.lock();
            match fetched {
                Ok(approved) => self.store_allowance_locked(&mut st, key, approved),
                Err(e) => {
                    st.in_flight = false;
                    st.phase = SubmissionPhase::Idle;
                    return Err(e);
                }
            }
        }

        let (planned, generation) = {
            let mut st = self.state.lock();
            let planned = match self.plan_locked(&st) {
                Ok(planned) => planned,
                Err(e) => {
                    st.in_flight = false;
                    st.phase = SubmissionPhase::Idle;
                    return Err(e);
                }
            };
            st.phase = match planned {
                PlannedRequest::Approve(_) => SubmissionPhase::ApprovalPending,
                PlannedRequest::Transfer(_) => SubmissionPhase::SubmissionPending,
            };
            (planned, st.generation)
        };

        let broadcaster = self.collaborators.broadcaster.clone();
        let result = match planned {
            PlannedRequest::Approve(request) => {
                info!(asset = %request.asset.identity(), add_approve = %request.add_approve, "sending approval");
                broadcaster.send_approve(request).await.map(SubmitOutcome::Approved)
            }
            PlannedRequest::Transfer(request) => {
                info!(
                    asset = %request.asset.identity(),
                    amount = %request.asset.amount,
                    recipient = %request.recipient,
                    "sending bridge transfer"
                );
                broadcaster.send_transfer(request).await.map(SubmitOutcome::Transferred)
            }
        };

        let mut st = self.state.lock();
        st.in_flight = false;
        let current = st.generation == generation;

        match result {
            Ok(outcome) => {
                info!(tx_hash = %outcome.receipt().tx_hash, "request acknowledged");
                if matches!(outcome, SubmitOutcome::Approved(_)) {
                    st.allowance = None;
                }
                if current {
                    self.reset_locked(&mut st);
                } else {
                    debug!("form was reset while the request was outstanding");
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, "bridge request failed");
                if current {
                    st.phase = SubmissionPhase::Idle;
                }
                Err(BridgeError::RequestFailed(e.to_string()))
            }
        }
    }

    /// Decide which request the current form produces.
    fn plan_locked(&self, st: &OrchestratorState) -> Result<PlannedRequest, BridgeError> {
        let form = self.form.snapshot();
        let rules = self.rules_locked(st);
        let direction = st.pair.direction;

        let selected = match form.selected_asset.as_ref() {
            Some(asset) => asset,
            None => return Err(BridgeError::Validation(validate_form(&form, &rules))),
        };
        selected.shadow().boom("shadow asset is not loaded")?;
        let outgoing = spendable_asset(selected, direction).boom("shadow asset is not loaded")?;
        let decimals = outgoing.decimals().boom("asset info is not loaded")?;

        match self.allowance_status_locked(st) {
            Some(AllowanceStatus::NeedApprove(add_approve)) => {
                return Ok(PlannedRequest::Approve(ApprovalRequest { asset: outgoing.copy(), add_approve }));
            }
            None if self.allowance_key_locked(st).is_some() => {
                return Err(boom("allowance is not loaded"));
            }
            _ => {}
        }

        let result = validate_form(&form, &rules);
        if !result.is_success() {
            debug!(errors = %result, "submit blocked by validation");
            return Err(BridgeError::Validation(result));
        }

        let amount = to_base_units(&form.bridge_from_amount, decimals)?;
        let asset = outgoing.copy_with(AssetOverrides { amount: Some(amount) });
        Ok(PlannedRequest::Transfer(TransferRequest { asset, recipient: form.recipient.trim().to_string() }))
    }
}
