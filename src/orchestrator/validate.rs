//! Field-level validation of the transfer form.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::core::amount::{to_base_units, to_human_string, HumanizeOptions};
use crate::core::config::{BridgeConfig, NetworkConfig};
use crate::core::domain::{ChainRole, Direction, NetworkPair};
use crate::core::errors::BridgeError;
use crate::core::validation::AddressFormat;
use crate::orchestrator::form::TransferFormState;

/// Validated form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormField {
    #[serde(rename = "bridgeInInputAmount")]
    BridgeInInputAmount,
    #[serde(rename = "recipient")]
    Recipient,
}

impl FormField {
    pub fn as_str(self) -> &'static str {
        match self {
            FormField::BridgeInInputAmount => "bridgeInInputAmount",
            FormField::Recipient => "recipient",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field name to error message. No entries means success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResult {
    errors: BTreeMap<FormField, String>,
}

impl ValidateResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<FormField, String> {
        &self.errors
    }

    fn set(&mut self, field: FormField, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }
}

impl fmt::Display for ValidateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Fields the user has interacted with (or that were prefilled).
pub type TouchedFields = BTreeSet<FormField>;

/// Rules that depend on the active network pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRules {
    /// Address format of the destination chain.
    pub recipient_format: AddressFormat,
    /// Currency shown for the destination chain.
    pub recipient_symbol: String,
}

impl FormRules {
    pub fn for_pair(config: &BridgeConfig, pair: &NetworkPair) -> Result<Self, BridgeError> {
        let network = config.network(&pair.network)?;
        Ok(Self::for_network(config, network, pair.direction))
    }

    pub fn for_network(config: &BridgeConfig, network: &NetworkConfig, direction: Direction) -> Self {
        let destination = direction.destination();
        let recipient_symbol = match destination {
            ChainRole::Native => network.native_symbol.clone(),
            ChainRole::Counterpart => config.counterpart_symbol.clone(),
        };
        Self { recipient_format: config.address_format(destination), recipient_symbol }
    }
}

/// Validate the form. Pure: no collaborator is consulted.
///
/// The amount is checked against the selected asset's balance and precision,
/// and also against the precision of the member of the pair that actually
/// leaves the wallet (the shadow for `Out`), so a form that passes here
/// converts cleanly at submit time.
pub fn validate_form(state: &TransferFormState, rules: &FormRules) -> ValidateResult {
    let mut result = ValidateResult::default();

    let recipient = state.recipient.trim();
    if recipient.is_empty() {
        result.set(FormField::Recipient, "Recipient is required");
    } else if rules.recipient_format.validate(recipient).is_err() {
        result.set(
            FormField::Recipient,
            format!("Please input a valid {} address", rules.recipient_symbol),
        );
    }

    if let Some(message) = amount_error(state) {
        result.set(FormField::BridgeInInputAmount, message);
    }

    result
}

fn amount_error(state: &TransferFormState) -> Option<String> {
    let Some(asset) = state.selected_asset.as_ref() else {
        return Some("Please select an asset".to_string());
    };

    let amount = state.bridge_from_amount.trim();
    if amount.is_empty() {
        return Some("Amount is required".to_string());
    }

    let Some(decimals) = asset.decimals() else {
        return Some("Asset info is not loaded".to_string());
    };

    let value = match to_base_units(amount, decimals) {
        Ok(v) => v,
        Err(BridgeError::InvalidAmount(reason)) => return Some(format!("Invalid amount: {}", reason)),
        Err(e) => return Some(e.to_string()),
    };

    if value.is_zero() {
        return Some("Amount must be greater than 0".to_string());
    }

    if value > asset.amount {
        return Some(format!(
            "Insufficient balance: {} {} available",
            to_human_string(asset.amount, decimals, HumanizeOptions::default()),
            asset.symbol
        ));
    }

    let outgoing_decimals = asset.side(state.direction.transfer_side()).and_then(|a| a.decimals());
    if let Some(outgoing_decimals) = outgoing_decimals.filter(|d| *d != decimals) {
        if let Err(BridgeError::InvalidAmount(reason)) = to_base_units(amount, outgoing_decimals) {
            return Some(format!("Invalid amount: {}", reason));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::Asset;
    use ethers::types::U256;
    use pretty_assertions::assert_eq;

    fn rules(direction: Direction) -> FormRules {
        FormRules::for_pair(&BridgeConfig::default(), &NetworkPair::new("Ethereum", direction)).unwrap()
    }

    fn state(amount: &str, recipient: &str, direction: Direction) -> TransferFormState {
        TransferFormState {
            bridge_from_amount: amount.to_string(),
            recipient: recipient.to_string(),
            direction,
            selected_asset: Some(
                Asset::new("Nervos", "0x01", "ckETH", Some(18))
                    .with_amount(U256::from_dec_str("2000000000000000000").unwrap()),
            ),
        }
    }

    const ETH_ADDR: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";

    #[test]
    fn out_with_native_recipient_passes() {
        let result = validate_form(&state("1.5", ETH_ADDR, Direction::Out), &rules(Direction::Out));
        assert!(result.is_success(), "{}", result);
    }

    #[test]
    fn in_requires_counterpart_format() {
        let result = validate_form(&state("1", ETH_ADDR, Direction::In), &rules(Direction::In));
        assert_eq!(result.error(FormField::Recipient), Some("Please input a valid CKB address"));
        assert_eq!(result.error(FormField::BridgeInInputAmount), None);
    }

    #[test]
    fn out_label_uses_network_symbol() {
        let result = validate_form(&state("1", "0xabc", Direction::Out), &rules(Direction::Out));
        assert_eq!(result.error(FormField::Recipient), Some("Please input a valid ETH address"));
    }

    #[test]
    fn empty_fields_are_required() {
        let result = validate_form(&state("", "  ", Direction::Out), &rules(Direction::Out));
        assert_eq!(result.error(FormField::Recipient), Some("Recipient is required"));
        assert_eq!(result.error(FormField::BridgeInInputAmount), Some("Amount is required"));
        assert_eq!(
            result.to_string(),
            "bridgeInInputAmount: Amount is required; recipient: Recipient is required"
        );
    }

    #[test]
    fn amount_rules() {
        let r = rules(Direction::Out);
        let zero = validate_form(&state("0.0", ETH_ADDR, Direction::Out), &r);
        assert_eq!(zero.error(FormField::BridgeInInputAmount), Some("Amount must be greater than 0"));

        let over = validate_form(&state("2.000000000000000001", ETH_ADDR, Direction::Out), &r);
        assert_eq!(
            over.error(FormField::BridgeInInputAmount),
            Some("Insufficient balance: 2 ckETH available")
        );

        let max = validate_form(&state("2", ETH_ADDR, Direction::Out), &r);
        assert!(max.is_success());

        let junk = validate_form(&state("1e3", ETH_ADDR, Direction::Out), &r);
        assert!(junk.error(FormField::BridgeInInputAmount).unwrap().starts_with("Invalid amount"));
    }

    #[test]
    fn missing_asset_or_decimals() {
        let r = rules(Direction::Out);
        let mut s = state("1", ETH_ADDR, Direction::Out);
        s.selected_asset.as_mut().unwrap().info.decimals = None;
        assert_eq!(
            validate_form(&s, &r).error(FormField::BridgeInInputAmount),
            Some("Asset info is not loaded")
        );
        s.selected_asset = None;
        assert_eq!(
            validate_form(&s, &r).error(FormField::BridgeInInputAmount),
            Some("Please select an asset")
        );
    }

    #[test]
    fn amount_precision_follows_outgoing_asset() {
        let r = rules(Direction::Out);
        let mut s = state("1.1234567", ETH_ADDR, Direction::Out);
        let selected = s.selected_asset.take().unwrap();
        s.selected_asset = Some(selected.with_shadow(Asset::new("Ethereum", "0x02", "ETH6", Some(6))));

        assert_eq!(
            validate_form(&s, &r).error(FormField::BridgeInInputAmount),
            Some("Invalid amount: too many decimal places: 7 (max 6)")
        );

        s.bridge_from_amount = "1.123456".to_string();
        assert!(validate_form(&s, &r).is_success());
    }

    #[test]
    fn serializes_with_field_names() {
        let result = validate_form(&state("", ETH_ADDR, Direction::Out), &rules(Direction::Out));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["errors"]["bridgeInInputAmount"], "Amount is required");
    }
}
