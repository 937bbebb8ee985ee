use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::errors::BridgeError;

/// Bridge direction.
///
/// `In` deposits a native asset and mints its shadow on the counterpart chain;
/// `Out` burns the shadow and releases the native asset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    #[serde(alias = "in")]
    In,
    #[serde(alias = "out")]
    Out,
}

impl Direction {
    /// Which member of the (selected, shadow) pair leaves the user's wallet.
    pub fn transfer_side(self) -> TransferSide {
        match self {
            Direction::In => TransferSide::Native,
            Direction::Out => TransferSide::Counterpart,
        }
    }

    /// Chain whose address format the recipient must match.
    pub fn destination(self) -> ChainRole {
        match self {
            Direction::In => ChainRole::Counterpart,
            Direction::Out => ChainRole::Native,
        }
    }

    /// Chain the funds are spent from.
    pub fn source(self) -> ChainRole {
        match self {
            Direction::In => ChainRole::Native,
            Direction::Out => ChainRole::Counterpart,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "In"),
            Direction::Out => write!(f, "Out"),
        }
    }
}

impl FromStr for Direction {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            other => Err(BridgeError::Config(format!("unknown bridge direction: {}", other))),
        }
    }
}

/// The two chains a bridge connects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChainRole {
    Native,
    Counterpart,
}

/// Member of the (selected asset, shadow) pair that a transfer moves.
///
/// Resolved once per direction: `Native` moves the selected asset itself,
/// `Counterpart` moves its shadow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSide {
    Native,
    Counterpart,
}

/// The active (network, direction) tuple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkPair {
    pub network: String,
    pub direction: Direction,
}

impl NetworkPair {
    pub fn new(network: impl Into<String>, direction: Direction) -> Self {
        Self { network: network.into(), direction }
    }

    /// Move to `(network, direction)`. Returns whether the network changed.
    pub fn switch(&mut self, network: &str, direction: Direction) -> bool {
        let network_changed = self.network != network;
        self.network = network.to_string();
        self.direction = direction;
        network_changed
    }
}

/// Chain metadata for an asset. `decimals` is `None` until the metadata query
/// resolves.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetInfo {
    pub decimals: Option<u8>,
    pub name: Option<String>,
}

/// A bridgeable asset with its balance in base units.
///
/// `amount` is always expressed in this asset's own `info.decimals`; moving an
/// amount to another asset must go through a human string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    /// Network the asset lives on (e.g. "Ethereum", "Nervos").
    pub network: String,
    /// Token contract address, type hash or symbol for native coins.
    pub address: String,
    pub symbol: String,
    pub amount: U256,
    #[serde(default)]
    pub info: AssetInfo,
    /// Paired representation on the other chain, once metadata has loaded.
    #[serde(default)]
    pub shadow: Option<Box<Asset>>,
}

/// Fields that may be overridden by [`Asset::copy_with`].
#[derive(Debug, Clone, Default)]
pub struct AssetOverrides {
    pub amount: Option<U256>,
}

impl Asset {
    pub fn new(
        network: impl Into<String>,
        address: impl Into<String>,
        symbol: impl Into<String>,
        decimals: Option<u8>,
    ) -> Self {
        Self {
            network: network.into(),
            address: address.into(),
            symbol: symbol.into(),
            amount: U256::zero(),
            info: AssetInfo { decimals, name: None },
            shadow: None,
        }
    }

    pub fn with_amount(mut self, amount: U256) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_shadow(mut self, shadow: Asset) -> Self {
        self.shadow = Some(Box::new(shadow));
        self
    }

    /// Stable key used for list keying and equality.
    pub fn identity(&self) -> String {
        format!("{}/{}", self.network, self.address.to_ascii_lowercase())
    }

    pub fn same_identity(&self, other: &Asset) -> bool {
        self.identity() == other.identity()
    }

    pub fn decimals(&self) -> Option<u8> {
        self.info.decimals
    }

    /// Independent instance; nothing is shared with `self`.
    pub fn copy(&self) -> Asset {
        self.clone()
    }

    pub fn copy_with(&self, overrides: AssetOverrides) -> Asset {
        let mut copied = self.clone();
        if let Some(amount) = overrides.amount {
            copied.amount = amount;
        }
        copied
    }

    pub fn shadow(&self) -> Option<&Asset> {
        self.shadow.as_deref()
    }

    /// Resolve which member of the pair a transfer on `side` moves.
    pub fn side(&self, side: TransferSide) -> Option<&Asset> {
        match side {
            TransferSide::Native => Some(self),
            TransferSide::Counterpart => self.shadow(),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.identity())
    }
}

/// Asset lists returned by the asset query service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetLists {
    pub native_chain_assets: Vec<Asset>,
    pub counterpart_chain_assets: Vec<Asset>,
}

impl AssetLists {
    /// In lists native-chain assets, Out lists counterpart-chain assets.
    pub fn for_direction(&self, direction: Direction) -> &[Asset] {
        match direction {
            Direction::In => &self.native_chain_assets,
            Direction::Out => &self.counterpart_chain_assets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc() -> Asset {
        Asset::new("Ethereum", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "USDC", Some(6))
            .with_amount(U256::from(5_000_000u64))
            .with_shadow(Asset::new("Nervos", "0x0001", "ckUSDC", Some(6)))
    }

    #[test]
    fn identity_is_case_insensitive_on_address() {
        let a = usdc();
        let mut b = usdc();
        b.address = b.address.to_ascii_uppercase();
        assert_eq!(a.identity(), "Ethereum/0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        assert!(a.same_identity(&b));
    }

    #[test]
    fn copy_is_independent() {
        let original = usdc();
        let mut copied = original.copy();
        copied.amount = U256::from(1u64);
        if let Some(shadow) = copied.shadow.as_mut() {
            shadow.amount = U256::from(7u64);
        }
        assert_eq!(original.amount, U256::from(5_000_000u64));
        assert_eq!(original.shadow().unwrap().amount, U256::zero());
    }

    #[test]
    fn copy_with_overrides_amount() {
        let copied = usdc().copy_with(AssetOverrides { amount: Some(U256::from(42u64)) });
        assert_eq!(copied.amount, U256::from(42u64));
        assert_eq!(copied.symbol, "USDC");
    }

    #[test]
    fn side_resolution() {
        let a = usdc();
        assert_eq!(a.side(Direction::In.transfer_side()).unwrap().symbol, "USDC");
        assert_eq!(a.side(Direction::Out.transfer_side()).unwrap().symbol, "ckUSDC");
        let bare = Asset::new("Ethereum", "0x01", "X", None);
        assert!(bare.side(TransferSide::Counterpart).is_none());
    }

    #[test]
    fn direction_parse_and_roles() {
        assert_eq!("in".parse::<Direction>().unwrap(), Direction::In);
        assert_eq!(" OUT ".parse::<Direction>().unwrap(), Direction::Out);
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::In.destination(), ChainRole::Counterpart);
        assert_eq!(Direction::Out.destination(), ChainRole::Native);
        assert_eq!(Direction::In.opposite(), Direction::Out);
    }
}
