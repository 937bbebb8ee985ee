//! Selection and field updates

use ethers::types::U256;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{AssetQueryState, BridgeOrchestrator, OrchestratorState};
use crate::blockchain::bridge::AllowanceKey;
use crate::blockchain::traits::WalletSigner;
use crate::core::amount::{to_human_string, HumanizeOptions};
use crate::core::domain::{Asset, ChainRole, Direction};
use crate::core::errors::BridgeError;
use crate::core::result_ext::OptionExt;
use crate::orchestrator::allowance::{allowance_key, spendable_asset, AllowanceFact, AllowanceStatus};
use crate::orchestrator::validate::FormField;

impl BridgeOrchestrator {
    /// Switch the bridge direction. Resets the form unconditionally when the
    /// direction actually changes.
    pub fn set_direction(&self, direction: Direction) {
        let mut st = self.state.lock();
        if st.pair.direction == direction {
            return;
        }
        info!(from = %st.pair.direction, to = %direction, "switching bridge direction");
        st.pair.direction = direction;
        self.rebind_for_direction_locked(&mut st);
        st.allowance = None;
        self.reset_locked(&mut st);
    }

    /// Change network and direction together.
    ///
    /// A network change drops the loaded asset lists and the selection.
    pub fn switch_network_pair(&self, network: &str, direction: Direction) -> Result<(), BridgeError> {
        let network_config = self.config.network(network)?.clone();
        let mut st = self.state.lock();

        let direction_changed = st.pair.direction != direction;
        let network_changed = st.pair.switch(network, direction);
        if !network_changed && !direction_changed {
            return Ok(());
        }

        info!(network = %network, direction = %direction, "switching network pair");
        if network_changed {
            st.network = network_config;
            st.assets = AssetQueryState::NotLoaded;
            st.asset_request = st.asset_request.wrapping_add(1);
            self.form.update(|form| form.selected_asset = None);
        } else {
            self.rebind_for_direction_locked(&mut st);
        }
        st.allowance = None;
        self.reset_locked(&mut st);
        Ok(())
    }

    /// Connect, replace or disconnect the wallet.
    ///
    /// The recipient is re-derived for the new signer, and any URL prefill is
    /// stripped once a signer is present. Reporting the same wallet again
    /// (same identities on both chains) keeps the form; only the reported
    /// chain id is picked up.
    pub fn set_signer(&self, signer: Option<Arc<dyn WalletSigner>>) {
        let mut st = self.state.lock();
        if same_wallet(st.signer.as_deref(), signer.as_deref()) {
            debug!("signer notification for the connected wallet");
            st.signer = signer;
            return;
        }

        let connected = signer.is_some();
        st.signer = signer;
        st.allowance = None;

        if connected {
            let store = st.query_store.clone();
            if let (Some(prefill), Some(store)) = (st.prefill.as_mut(), store) {
                prefill.strip(store.as_ref());
            }
        }

        debug!(connected, "signer changed");
        self.reset_locked(&mut st);
    }

    /// Query the asset lists for the active network.
    ///
    /// An answer for a network that is no longer active is dropped. The
    /// current selection is rebound to the fresh instance of the same asset.
    pub async fn load_assets(&self) -> Result<(), BridgeError> {
        let (network, request) = {
            let mut st = self.state.lock();
            st.asset_request = st.asset_request.wrapping_add(1);
            st.assets = AssetQueryState::Loading;
            (st.pair.network.clone(), st.asset_request)
        };

        debug!(network = %network, "querying bridge assets");
        let result = self.collaborators.asset_query.query_assets(&network).await;

        let mut st = self.state.lock();
        if st.asset_request != request || st.pair.network != network {
            debug!(network = %network, "dropping stale asset query result");
            return Ok(());
        }

        match result {
            Ok(lists) => {
                info!(
                    network = %network,
                    native = lists.native_chain_assets.len(),
                    counterpart = lists.counterpart_chain_assets.len(),
                    "bridge assets loaded"
                );
                let direction = st.pair.direction;
                let rebound = self.form.selected_asset().map(|current| {
                    lists.for_direction(direction).iter().find(|a| a.same_identity(&current)).cloned()
                });
                if let Some(rebound) = rebound {
                    if rebound.is_none() {
                        st.allowance = None;
                    }
                    self.form.update(|form| form.selected_asset = rebound);
                }
                st.assets = AssetQueryState::Loaded(lists);
                Ok(())
            }
            Err(e) => {
                warn!(network = %network, error = %e, "asset query failed");
                st.assets = AssetQueryState::Failed(e.to_string());
                Err(BridgeError::RequestFailed(e.to_string()))
            }
        }
    }

    /// Assets selectable in the current direction. Empty until loaded.
    pub fn asset_list(&self) -> Vec<Asset> {
        let st = self.state.lock();
        st.assets
            .lists()
            .map(|lists| lists.for_direction(st.pair.direction).to_vec())
            .unwrap_or_default()
    }

    /// Select an asset of the current list by identity.
    pub fn select_asset(&self, identity: &str) -> Result<Asset, BridgeError> {
        let mut st = self.state.lock();
        let lists = match &st.assets {
            AssetQueryState::Loaded(lists) => lists,
            AssetQueryState::Loading => return Err(BridgeError::AssetsNotLoaded("asset query in progress".to_string())),
            AssetQueryState::NotLoaded => return Err(BridgeError::AssetsNotLoaded("assets not queried".to_string())),
            AssetQueryState::Failed(reason) => return Err(BridgeError::AssetsNotLoaded(reason.clone())),
        };

        let asset = lists
            .for_direction(st.pair.direction)
            .iter()
            .find(|a| a.identity().eq_ignore_ascii_case(identity))
            .cloned()
            .ok_or_else(|| BridgeError::UnknownAsset(identity.to_string()))?;

        let changed = self.form.selected_asset().map_or(true, |current| !current.same_identity(&asset));
        if changed {
            st.allowance = None;
        }
        debug!(asset = %asset.identity(), "asset selected");
        self.form.update(|form| form.selected_asset = Some(asset.clone()));
        Ok(asset)
    }

    pub fn set_amount(&self, amount: &str) {
        let mut st = self.state.lock();
        st.touched.insert(FormField::BridgeInInputAmount);
        self.form.update(|form| form.bridge_from_amount = amount.to_string());
    }

    pub fn set_recipient(&self, recipient: &str) {
        let mut st = self.state.lock();
        st.touched.insert(FormField::Recipient);
        self.form.update(|form| form.recipient = recipient.to_string());
    }

    pub fn touch(&self, field: FormField) {
        self.state.lock().touched.insert(field);
    }

    /// Fill the amount with the full balance of the selected asset.
    pub fn use_max(&self) -> Result<String, BridgeError> {
        let mut st = self.state.lock();
        let asset = self
            .form
            .selected_asset()
            .ok_or_else(|| BridgeError::AssetsNotLoaded("no asset selected".to_string()))?;
        let decimals = asset.decimals().boom("asset info is not loaded")?;

        let max = to_human_string(asset.amount, decimals, HumanizeOptions::plain());
        st.touched.insert(FormField::BridgeInInputAmount);
        self.form.update(|form| form.bridge_from_amount = max.clone());
        Ok(max)
    }

    /// Re-read the approved amount for the current selection.
    ///
    /// Returns the allowance status derived from the fresh fact.
    pub async fn refresh_allowance(&self) -> Result<Option<AllowanceStatus>, BridgeError> {
        let key = {
            let st = self.state.lock();
            match self.allowance_key_locked(&st) {
                Some(key) => key,
                None => return Ok(self.allowance_status_locked(&st)),
            }
        };

        let approved = self.fetch_allowance(&key).await?;

        let mut st = self.state.lock();
        self.store_allowance_locked(&mut st, key, approved);
        Ok(self.allowance_status_locked(&st))
    }

    pub(crate) async fn fetch_allowance(&self, key: &AllowanceKey) -> Result<U256, BridgeError> {
        self.collaborators
            .allowance
            .approved_amount(key)
            .await
            .map_err(|e| BridgeError::RequestFailed(e.to_string()))
    }

    /// Record `approved` unless the selection moved on while it was read.
    pub(crate) fn store_allowance_locked(&self, st: &mut OrchestratorState, key: AllowanceKey, approved: U256) {
        if self.allowance_key_locked(st).as_ref() == Some(&key) {
            debug!(asset = %key.asset, approved = %approved, "allowance refreshed");
            st.allowance = Some(AllowanceFact { key, approved });
        } else {
            debug!(asset = %key.asset, "dropping allowance for a stale selection");
        }
    }

    /// Key of the allowance the current selection would spend when no fact
    /// for it is held.
    pub(crate) fn unresolved_allowance_key_locked(&self, st: &OrchestratorState) -> Option<AllowanceKey> {
        let key = self.allowance_key_locked(st)?;
        match &st.allowance {
            Some(fact) if fact.key == key => None,
            _ => Some(key),
        }
    }

    /// Key of the allowance the current selection would spend, if any.
    pub(crate) fn allowance_key_locked(&self, st: &OrchestratorState) -> Option<AllowanceKey> {
        let direction = st.pair.direction;
        if direction != self.config.approval_direction {
            return None;
        }
        let signer = st.signer.as_ref()?;
        let selected = self.form.selected_asset()?;
        let spendable = spendable_asset(&selected, direction)?;
        let owner = match direction.source() {
            ChainRole::Native => signer.identity_native(),
            ChainRole::Counterpart => signer.identity_counterpart(),
        };
        Some(allowance_key(&owner, &st.network.bridge_contract, spendable))
    }

    /// Keep the selection across a direction switch by moving to its shadow
    /// in the other list.
    fn rebind_for_direction_locked(&self, st: &mut OrchestratorState) {
        let direction = st.pair.direction;
        let lists = st.assets.lists();
        self.form.update(|form| {
            let rebound = form.selected_asset.as_ref().and_then(|current| {
                let shadow = current.shadow()?;
                lists?.for_direction(direction).iter().find(|a| a.same_identity(shadow)).cloned()
            });
            form.selected_asset = rebound;
        });
    }
}

fn same_wallet(current: Option<&dyn WalletSigner>, next: Option<&dyn WalletSigner>) -> bool {
    match (current, next) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            a.identity_native() == b.identity_native() && a.identity_counterpart() == b.identity_counterpart()
        }
        _ => false,
    }
}
