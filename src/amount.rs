// src/amount.rs
use alloy::primitives::U256;
use std::{cmp::Ordering, fmt, str::FromStr};

/// 10^18 wei per ether
pub const WEI_PER_ETHER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

const ETHER_DECIMALS: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed amount {0:?}")]
pub struct MalformedAmount(pub String);

/// A transferred value as delivered by the API: `0x`-prefixed hex,
/// optionally signed. Comparisons only ever look at the magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount {
    negative: bool,
    magnitude: U256,
}

impl Amount {
    pub fn abs(&self) -> U256 {
        self.magnitude
    }

    pub fn is_negative(&self) -> bool {
        self.negative && !self.magnitude.is_zero()
    }

    pub fn cmp_magnitude(&self, other: &Amount) -> Ordering {
        self.magnitude.cmp(&other.magnitude)
    }
}

impl FromStr for Amount {
    type Err = MalformedAmount;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || MalformedAmount(raw.to_string());

        let trimmed = raw.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let digits = unsigned
            .strip_prefix("0x")
            .or_else(|| unsigned.strip_prefix("0X"))
            .ok_or_else(malformed)?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(malformed());
        }

        // 256 bits = 64 hex digits once leading zeros are gone
        let significant = digits.trim_start_matches('0');
        if significant.len() > 64 {
            return Err(malformed());
        }
        let magnitude = if significant.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(significant, 16).map_err(|_| malformed())?
        };

        Ok(Self { negative, magnitude })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-")?;
        }
        write!(f, "0x{:x}", self.magnitude)
    }
}

/// Render a wei magnitude as ether without going through floats.
/// Trailing zeros of the fraction are dropped but one digit is always kept,
/// so 0 becomes "0.0" and 10^18 becomes "1.0".
pub fn format_ether(wei: U256) -> String {
    let whole = wei / WEI_PER_ETHER;
    let fraction = (wei % WEI_PER_ETHER).to_string();
    let padded = format!("{:0>width$}", fraction, width = ETHER_DECIMALS);
    let trimmed = padded.trim_end_matches('0');
    let fraction = if trimmed.is_empty() { "0" } else { trimmed };

    format!("{}.{}", whole, fraction)
}
