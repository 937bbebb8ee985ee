//! Conversion between human-readable decimal strings and integer base units.
//!
//! All arithmetic is done on decimal strings and `U256`; floats never touch an
//! amount. `to_human_string(to_base_units(s, d)?, d, ..)` yields the canonical
//! form of `s` (see [`normalize_human`]).

use ethers::types::U256;

use crate::core::errors::BridgeError;

/// Largest precision for which `10^decimals` still fits a `U256`.
pub const MAX_DECIMALS: u8 = 77;

/// Formatting options for [`to_human_string`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanizeOptions {
    /// Group the integer part with `,` every three digits.
    pub separator: bool,
}

impl Default for HumanizeOptions {
    fn default() -> Self {
        Self { separator: true }
    }
}

impl HumanizeOptions {
    /// Input-compatible output (used by the "Max" affordance).
    pub fn plain() -> Self {
        Self { separator: false }
    }
}

/// Split a human decimal string into integer and fractional digit runs.
///
/// Accepts `123`, `1.5`, `.5` and `1.`; rejects signs, exponents, separators and
/// anything that is not ASCII digits around a single `.`.
fn split_decimal(human: &str) -> Result<(&str, &str), BridgeError> {
    let s = human.trim();
    if s.is_empty() {
        return Err(BridgeError::InvalidAmount("amount is empty".to_string()));
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(BridgeError::InvalidAmount(format!("not a decimal number: {}", human)));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BridgeError::InvalidAmount(format!("not a decimal number: {}", human)));
    }

    Ok((int_part, frac_part))
}

/// Parse a human decimal string into base units with `decimals` precision.
///
/// Fails with [`BridgeError::InvalidAmount`] when the input is not a valid
/// non-negative decimal, carries more fractional digits than `decimals`, or does
/// not fit 256 bits.
pub fn to_base_units(human: &str, decimals: u8) -> Result<U256, BridgeError> {
    if decimals > MAX_DECIMALS {
        return Err(BridgeError::InvalidAmount(format!(
            "unsupported precision: {} decimals",
            decimals
        )));
    }

    let (int_part, frac_part) = split_decimal(human)?;
    let decimals = decimals as usize;

    if frac_part.len() > decimals {
        return Err(BridgeError::InvalidAmount(format!(
            "too many decimal places: {} (max {})",
            frac_part.len(),
            decimals
        )));
    }

    let mut digits = String::with_capacity(int_part.len() + decimals);
    digits.push_str(int_part);
    digits.push_str(frac_part);
    digits.extend(std::iter::repeat('0').take(decimals - frac_part.len()));

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }

    U256::from_dec_str(digits)
        .map_err(|_| BridgeError::InvalidAmount(format!("amount out of range: {}", human)))
}

/// Render base units as a human decimal string with `decimals` precision.
///
/// Trailing fractional zeros are dropped, so `2000000000000000000` at 18
/// decimals renders as `"2"`.
pub fn to_human_string(amount: U256, decimals: u8, opts: HumanizeOptions) -> String {
    let raw = amount.to_string();
    let decimals = decimals as usize;

    let (int_digits, frac_digits) = if raw.len() > decimals {
        let (i, f) = raw.split_at(raw.len() - decimals);
        (i.to_string(), f.to_string())
    } else {
        let mut padded = "0".repeat(decimals - raw.len());
        padded.push_str(&raw);
        ("0".to_string(), padded)
    };

    let int_digits = if opts.separator { group_thousands(&int_digits) } else { int_digits };
    let frac_digits = frac_digits.trim_end_matches('0');

    if frac_digits.is_empty() {
        int_digits
    } else {
        format!("{}.{}", int_digits, frac_digits)
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Canonical form of a human decimal string: no leading integer zeros (except a
/// lone `0`), no trailing fractional zeros, no dangling `.`.
pub fn normalize_human(human: &str) -> Result<String, BridgeError> {
    let (int_part, frac_part) = split_decimal(human)?;

    let int_part = int_part.trim_start_matches('0');
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let frac_part = frac_part.trim_end_matches('0');

    if frac_part.is_empty() {
        Ok(int_part.to_string())
    } else {
        Ok(format!("{}.{}", int_part, frac_part))
    }
}
