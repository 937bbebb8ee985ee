use bech32::{Bech32m, Hrp};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::core::errors::BridgeError;

static EVM_ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("Hardcoded regex should always compile"));

/// Address format of a chain, used to check recipients against the destination chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AddressFormat {
    /// 20-byte hex address with optional EIP-55 checksum.
    Evm,
    /// CKB bech32/bech32m address; the human-readable part must be one of `prefixes`.
    Ckb { prefixes: Vec<String> },
}

impl AddressFormat {
    pub fn validate(&self, address: &str) -> Result<(), BridgeError> {
        match self {
            AddressFormat::Evm => validate_ethereum_address(address),
            AddressFormat::Ckb { prefixes } => validate_ckb_address(address, prefixes),
        }
    }
}

/// Validates an Ethereum address.
pub fn validate_ethereum_address(address: &str) -> Result<(), BridgeError> {
    if !address.starts_with("0x") || address.len() != 42 {
        return Err(BridgeError::InvalidAddress("Invalid Ethereum address format".to_string()));
    }
    if !EVM_ADDRESS_RE.is_match(address) {
        return Err(BridgeError::InvalidAddress("Invalid Ethereum address characters".to_string()));
    }
    // EIP-55: if mixed-case, enforce checksum. All-lower or all-upper acceptable for compatibility.
    let body = &address[2..];
    let is_all_lower = body.chars().all(|c| !c.is_ascii_uppercase());
    let is_all_upper = body.chars().all(|c| !c.is_ascii_lowercase());
    if is_all_lower || is_all_upper {
        return Ok(());
    }
    if !is_eip55_checksum_valid(address) {
        return Err(BridgeError::InvalidAddress(
            "Invalid EIP-55 checksum for Ethereum address".to_string(),
        ));
    }
    Ok(())
}

fn is_eip55_checksum_valid(addr: &str) -> bool {
    let body = &addr[2..];
    let lower = body.to_lowercase();
    let hash = Keccak256::digest(lower.as_bytes());
    for (i, ch) in body.chars().enumerate() {
        let nibble = (hash[i / 2] >> (4 * (1 - (i % 2)))) & 0x0f;
        match ch {
            'a'..='f' if nibble >= 8 => return false,
            'A'..='F' if nibble < 8 => return false,
            _ => {}
        }
    }
    true
}

// CKB payload format types (RFC 0021).
const CKB_FORMAT_FULL: u8 = 0x00;
const CKB_FORMAT_SHORT: u8 = 0x01;
const CKB_FORMAT_FULL_DATA: u8 = 0x02;
const CKB_FORMAT_FULL_TYPE: u8 = 0x04;

/// Validates a CKB address against the accepted human-readable prefixes.
pub fn validate_ckb_address(address: &str, prefixes: &[String]) -> Result<(), BridgeError> {
    let (hrp, payload) = bech32::decode(address)
        .map_err(|e| BridgeError::InvalidAddress(format!("Invalid CKB address encoding: {}", e)))?;

    let hrp = hrp.as_str().to_ascii_lowercase();
    if !prefixes.iter().any(|p| p.eq_ignore_ascii_case(&hrp)) {
        return Err(BridgeError::InvalidAddress(format!("Unexpected CKB address prefix: {}", hrp)));
    }

    let Some((&format_type, body)) = payload.split_first() else {
        return Err(BridgeError::InvalidAddress("Empty CKB address payload".to_string()));
    };

    // full: code_hash(32) + hash_type(1) + args; short: code_hash_index(1) + args(20..=22);
    // deprecated full: code_hash(32) + args
    let ok = match format_type {
        CKB_FORMAT_FULL => body.len() >= 33,
        CKB_FORMAT_SHORT => (21..=23).contains(&body.len()),
        CKB_FORMAT_FULL_DATA | CKB_FORMAT_FULL_TYPE => body.len() >= 32,
        _ => false,
    };
    if !ok {
        return Err(BridgeError::InvalidAddress(format!(
            "Invalid CKB address payload (format 0x{:02x}, {} bytes)",
            format_type,
            body.len()
        )));
    }
    Ok(())
}

/// Encode a short-format CKB address for a secp256k1 lock with `args`.
pub fn encode_ckb_short_address(prefix: &str, args: &[u8; 20]) -> Result<String, BridgeError> {
    let hrp = Hrp::parse(prefix)
        .map_err(|e| BridgeError::InvalidAddress(format!("Invalid CKB address prefix {}: {}", prefix, e)))?;
    let mut payload = Vec::with_capacity(22);
    payload.push(CKB_FORMAT_SHORT);
    payload.push(0x00);
    payload.extend_from_slice(args);
    bech32::encode::<Bech32m>(hrp, &payload)
        .map_err(|e| BridgeError::InvalidAddress(format!("CKB address encoding failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ckb_short(hrp: &str) -> String {
        encode_ckb_short_address(hrp, &[0x11; 20]).unwrap()
    }

    fn prefixes() -> Vec<String> {
        vec!["ckb".to_string(), "ckt".to_string()]
    }

    #[test]
    fn test_validate_ethereum_address_valid() {
        assert!(validate_ethereum_address("0x742d35Cc6634C0532925a3b844Bc454e4438f44e").is_ok());
        assert!(validate_ethereum_address("0x742d35cc6634c0532925a3b844bc454e4438f44e").is_ok());
    }

    #[test]
    fn test_validate_ethereum_address_invalid_length() {
        assert!(validate_ethereum_address("0x742d35Cc6634C0532925a3b844Bc454e4438f44").is_err());
        assert!(validate_ethereum_address("0xabc").is_err());
    }

    #[test]
    fn test_validate_ethereum_address_invalid_chars() {
        assert!(validate_ethereum_address("0x742d35Cc6634C0532925a3b844Bc454e4438f44g").is_err());
    }

    #[test]
    fn test_validate_ethereum_address_bad_checksum() {
        // flip the case of one checksummed letter
        assert!(validate_ethereum_address("0x742d35cC6634C0532925a3b844Bc454e4438f44e").is_err());
    }

    #[test]
    fn test_validate_ckb_address() {
        assert!(validate_ckb_address(&ckb_short("ckt"), &prefixes()).is_ok());
        assert!(validate_ckb_address(&ckb_short("ckb"), &prefixes()).is_ok());
    }

    #[test]
    fn test_validate_ckb_address_wrong_prefix() {
        let err = validate_ckb_address(&ckb_short("bc"), &prefixes()).unwrap_err();
        assert!(err.to_string().contains("prefix"));
    }

    #[test]
    fn test_validate_ckb_address_rejects_evm() {
        assert!(validate_ckb_address("0x742d35cc6634c0532925a3b844bc454e4438f44e", &prefixes()).is_err());
    }

    #[test]
    fn test_validate_ckb_address_bad_payload() {
        let bad = bech32::encode::<Bech32m>(Hrp::parse("ckt").unwrap(), &[0x09, 0x01, 0x02]).unwrap();
        assert!(validate_ckb_address(&bad, &prefixes()).is_err());
    }

    #[test]
    fn test_address_format_dispatch() {
        let ckb = AddressFormat::Ckb { prefixes: prefixes() };
        assert!(ckb.validate(&ckb_short("ckt")).is_ok());
        assert!(AddressFormat::Evm.validate(&ckb_short("ckt")).is_err());
    }
}
