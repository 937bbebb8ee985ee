pub mod amount;
pub mod config;
pub mod domain;
pub mod errors;
pub mod result_ext; // Option -> precondition failure helpers
pub mod validation;

pub use config::{BridgeConfig, NetworkConfig};
pub use domain::{Asset, AssetLists, Direction, NetworkPair};
pub use errors::BridgeError;
