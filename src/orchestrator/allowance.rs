//! Allowance evaluation.

use ethers::types::U256;
use serde::{Deserialize, Serialize};

use crate::blockchain::bridge::AllowanceKey;
use crate::core::amount::to_base_units;
use crate::core::domain::{Asset, Direction};

/// Whether an approval step must run before the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllowanceStatus {
    Sufficient,
    /// Additional base units to approve.
    NeedApprove(U256),
}

impl AllowanceStatus {
    pub fn need_approve(&self) -> bool {
        matches!(self, AllowanceStatus::NeedApprove(_))
    }
}

/// Approved amount as last read from the allowance source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowanceFact {
    pub key: AllowanceKey,
    pub approved: U256,
}

/// Inputs of [`evaluate_allowance`].
#[derive(Debug, Clone, Copy)]
pub struct AllowanceInput<'a> {
    pub selected: Option<&'a Asset>,
    pub direction: Direction,
    /// Direction whose transfers spend an allowance.
    pub approval_direction: Direction,
    /// Requested amount, human units.
    pub requested: &'a str,
    pub fact: Option<&'a AllowanceFact>,
}

/// The asset a transfer in `direction` spends: the selected asset for `In`,
/// its shadow for `Out`.
pub fn spendable_asset(selected: &Asset, direction: Direction) -> Option<&Asset> {
    selected.side(direction.transfer_side())
}

/// Key under which the allowance of `spendable` is looked up.
pub fn allowance_key(owner: &str, spender: &str, spendable: &Asset) -> AllowanceKey {
    AllowanceKey {
        owner: owner.to_string(),
        spender: spender.to_string(),
        asset: spendable.identity(),
    }
}

/// Derive the allowance status.
///
/// `None` means the status is not known yet: no asset, no shadow, no
/// decimals, or no allowance fact for the spendable asset.
pub fn evaluate_allowance(input: AllowanceInput<'_>) -> Option<AllowanceStatus> {
    let selected = input.selected?;
    if input.direction != input.approval_direction {
        return Some(AllowanceStatus::Sufficient);
    }

    let spendable = spendable_asset(selected, input.direction)?;
    let decimals = spendable.decimals()?;

    let requested = match to_base_units(input.requested, decimals) {
        Ok(v) if !v.is_zero() => v,
        _ => return Some(AllowanceStatus::Sufficient),
    };

    let fact = input.fact.filter(|f| f.key.asset == spendable.identity())?;
    if fact.approved < requested {
        Some(AllowanceStatus::NeedApprove(requested - fact.approved))
    } else {
        Some(AllowanceStatus::Sufficient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected() -> Asset {
        Asset::new("Ethereum", "0xA0b8", "USDC", Some(6))
            .with_shadow(Asset::new("Nervos", "0x5f3c", "ckUSDC", Some(6)))
    }

    fn fact(asset: &Asset, approved: u64) -> AllowanceFact {
        AllowanceFact { key: allowance_key("ckt1owner", "0xbridge", asset), approved: U256::from(approved) }
    }

    fn input<'a>(asset: &'a Asset, requested: &'a str, fact: Option<&'a AllowanceFact>) -> AllowanceInput<'a> {
        AllowanceInput {
            selected: Some(asset),
            direction: Direction::Out,
            approval_direction: Direction::Out,
            requested,
            fact,
        }
    }

    #[test]
    fn shortfall_needs_approval() {
        let asset = selected();
        let f = fact(asset.shadow().unwrap(), 400_000);
        assert_eq!(
            evaluate_allowance(input(&asset, "1.5", Some(&f))),
            Some(AllowanceStatus::NeedApprove(U256::from(1_100_000u64)))
        );
    }

    #[test]
    fn enough_allowance_is_sufficient() {
        let asset = selected();
        let f = fact(asset.shadow().unwrap(), 1_500_000);
        assert_eq!(evaluate_allowance(input(&asset, "1.5", Some(&f))), Some(AllowanceStatus::Sufficient));
    }

    #[test]
    fn other_direction_never_needs_approval() {
        let asset = selected();
        let mut i = input(&asset, "1", None);
        i.direction = Direction::In;
        assert_eq!(evaluate_allowance(i), Some(AllowanceStatus::Sufficient));
    }

    #[test]
    fn unknown_inputs_yield_none() {
        let asset = selected();
        assert_eq!(evaluate_allowance(input(&asset, "1", None)), None);

        // a fact for the wrong asset does not count
        let wrong = fact(&asset, 10_000_000);
        assert_eq!(evaluate_allowance(input(&asset, "1", Some(&wrong))), None);

        let bare = Asset::new("Ethereum", "0xA0b8", "USDC", Some(6));
        assert_eq!(evaluate_allowance(input(&bare, "1", None)), None);

        let mut i = input(&asset, "1", None);
        i.selected = None;
        assert_eq!(evaluate_allowance(i), None);
    }

    #[test]
    fn empty_amount_is_sufficient() {
        let asset = selected();
        let f = fact(asset.shadow().unwrap(), 0);
        assert_eq!(evaluate_allowance(input(&asset, "", Some(&f))), Some(AllowanceStatus::Sufficient));
        assert_eq!(evaluate_allowance(input(&asset, "abc", Some(&f))), Some(AllowanceStatus::Sufficient));
    }
}
