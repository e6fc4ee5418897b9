use crate::error::{LotoError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const WEI_DECIMALS: u32 = 18;
pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

/// Fractional ETH digits kept by the contribution pot file.
pub const POT_DECIMALS: u32 = 10;

/// Basis points denominator for pot splits.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// An amount of ether in its smallest unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wei(u128);

impl Wei {
    pub const ZERO: Wei = Wei(0);

    pub const fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    pub const fn as_wei(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parse a decimal ETH amount such as `0.0001` without going through floats.
    pub fn from_eth_str(input: &str) -> Result<Self> {
        let s = input.trim();
        if s.is_empty() {
            return Err(LotoError::invalid_amount("empty amount"));
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(LotoError::invalid_amount(format!("'{}' has no digits", input)));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(LotoError::invalid_amount(format!(
                "'{}' is not an unsigned decimal",
                input
            )));
        }
        if frac.len() > WEI_DECIMALS as usize {
            return Err(LotoError::invalid_amount(format!(
                "'{}' has more than {} fractional digits",
                input, WEI_DECIMALS
            )));
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|e| LotoError::invalid_amount(format!("'{}': {}", input, e)))?
        };
        let frac_wei: u128 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = WEI_DECIMALS as usize);
            padded
                .parse()
                .map_err(|e| LotoError::invalid_amount(format!("'{}': {}", input, e)))?
        };

        whole
            .checked_mul(WEI_PER_ETH)
            .and_then(|w| w.checked_add(frac_wei))
            .map(Wei)
            .ok_or_else(|| LotoError::invalid_amount(format!("'{}' overflows", input)))
    }

    /// Parse the decimal wei string used by block explorers.
    pub fn from_wei_str(input: &str) -> Result<Self> {
        input
            .trim()
            .parse::<u128>()
            .map(Wei)
            .map_err(|e| LotoError::invalid_amount(format!("'{}': {}", input, e)))
    }

    /// Convert a JSON ETH number, rounding to [`POT_DECIMALS`] fractional digits.
    /// Negative and non-finite values are rejected.
    pub fn from_eth_f64(eth: f64) -> Option<Self> {
        if !eth.is_finite() || eth < 0.0 {
            return None;
        }
        let quanta = (eth * 10f64.powi(POT_DECIMALS as i32)).round();
        if quanta > u128::MAX as f64 {
            return None;
        }
        (quanta as u128).checked_mul(pot_quantum()).map(Wei)
    }

    pub fn to_eth_f64(&self) -> f64 {
        let quanta = self.round_to_decimals(POT_DECIMALS).0 / pot_quantum();
        quanta as f64 / 10f64.powi(POT_DECIMALS as i32)
    }

    /// Round half-up to `decimals` fractional ETH digits.
    pub fn round_to_decimals(&self, decimals: u32) -> Self {
        if decimals >= WEI_DECIMALS {
            return *self;
        }
        let scale = 10u128.pow(WEI_DECIMALS - decimals);
        let rounded = (self.0 / scale + u128::from(self.0 % scale >= scale / 2)) * scale;
        Wei(rounded)
    }

    pub fn checked_add(self, rhs: Wei) -> Option<Wei> {
        self.0.checked_add(rhs.0).map(Wei)
    }

    pub fn saturating_add(self, rhs: Wei) -> Wei {
        Wei(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: Wei) -> Wei {
        Wei(self.0.saturating_sub(rhs.0))
    }
}

fn pot_quantum() -> u128 {
    10u128.pow(WEI_DECIMALS - POT_DECIMALS)
}

/// Formats as ETH. Honors `{:.N}` precision with half-up rounding,
/// otherwise prints every significant digit.
impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => {
                let kept = (p as u32).min(WEI_DECIMALS);
                let scaled = self.round_to_decimals(kept).0 / 10u128.pow(WEI_DECIMALS - kept);
                let unit = 10u128.pow(kept);
                let whole = scaled / unit;
                if p == 0 {
                    return write!(f, "{}", whole);
                }
                let frac = format!("{:0>width$}", scaled % unit, width = kept as usize);
                write!(f, "{}.{:0<width$}", whole, frac, width = p)
            }
            None => {
                let whole = self.0 / WEI_PER_ETH;
                let frac = format!("{:0>18}", self.0 % WEI_PER_ETH);
                let frac = frac.trim_end_matches('0');
                if frac.is_empty() {
                    write!(f, "{}.0", whole)
                } else {
                    write!(f, "{}.{}", whole, frac)
                }
            }
        }
    }
}

/// Serializes a [`Wei`] as a JSON ETH number, the shape the flat files use.
pub mod eth_number {
    use super::Wei;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Wei, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.to_eth_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Wei, D::Error> {
        let eth = f64::deserialize(deserializer)?;
        Wei::from_eth_f64(eth).ok_or_else(|| D::Error::custom(format!("invalid ETH amount {}", eth)))
    }
}

/// One incoming or outgoing transfer as reported by the ledger API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from: String,
    pub to: String,
    pub value: Wei,
    pub hash: String,
}

impl TransferRecord {
    pub fn is_to(&self, address: &str) -> bool {
        same_address(&self.to, address)
    }

    pub fn is_from(&self, address: &str) -> bool {
        same_address(&self.from, address)
    }
}

/// Hex addresses compare case-insensitively.
pub fn same_address(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinnerRecord {
    pub winner: String,
    #[serde(with = "eth_number")]
    pub amount: Wei,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

/// A pot divided between the round winner and the next round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotSplit {
    pub total: Wei,
    pub winner_share: Wei,
    pub rollover: Wei,
    pub winner_bps: u32,
}

impl PotSplit {
    /// `winner_bps` must not exceed [`BPS_DENOMINATOR`]; larger values are clamped.
    pub fn of(total: Wei, winner_bps: u32) -> Self {
        let bps = u128::from(winner_bps.min(BPS_DENOMINATOR));
        let denom = u128::from(BPS_DENOMINATOR);
        let t = total.as_wei();
        let winner = (t / denom) * bps + (t % denom) * bps / denom;
        Self {
            total,
            winner_share: Wei(winner),
            rollover: Wei(t - winner),
            winner_bps: bps as u32,
        }
    }

    pub fn winner_percent(&self) -> f64 {
        f64::from(self.winner_bps) / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_eth_amounts() {
        assert_eq!(Wei::from_eth_str("0.0001").unwrap().as_wei(), 100_000_000_000_000);
        assert_eq!(Wei::from_eth_str("1").unwrap().as_wei(), WEI_PER_ETH);
        assert_eq!(Wei::from_eth_str(" 2.5 ").unwrap().as_wei(), 2_500_000_000_000_000_000);
        assert_eq!(Wei::from_eth_str(".5").unwrap().as_wei(), WEI_PER_ETH / 2);
        assert_eq!(
            Wei::from_eth_str("0.000000000000000001").unwrap().as_wei(),
            1
        );

        assert!(Wei::from_eth_str("").is_err());
        assert!(Wei::from_eth_str(".").is_err());
        assert!(Wei::from_eth_str("-1").is_err());
        assert!(Wei::from_eth_str("1e5").is_err());
        assert!(Wei::from_eth_str("0.0000000000000000001").is_err());
    }

    #[test]
    fn test_display() {
        let w = Wei::from_eth_str("1.23456789").unwrap();
        assert_eq!(format!("{}", w), "1.23456789");
        assert_eq!(format!("{:.6}", w), "1.234568");
        assert_eq!(format!("{:.0}", w), "1");
        assert_eq!(format!("{}", Wei::ZERO), "0.0");
        assert_eq!(format!("{:.6}", Wei::ZERO), "0.000000");
        assert_eq!(format!("{:.20}", Wei::from_wei(1)), "0.00000000000000000100");
    }

    #[test]
    fn test_eth_f64_round_trip_at_pot_precision() {
        let w = Wei::from_eth_f64(0.0003).unwrap();
        assert_eq!(w, Wei::from_eth_str("0.0003").unwrap());
        assert_eq!(w.to_eth_f64(), 0.0003);

        // 11th digit is rounded away
        let w = Wei::from_eth_f64(0.00000000006).unwrap();
        assert_eq!(w, Wei::from_eth_str("0.0000000001").unwrap());

        assert!(Wei::from_eth_f64(-1.0).is_none());
        assert!(Wei::from_eth_f64(f64::NAN).is_none());
    }

    #[test]
    fn test_split_always_sums_to_total() {
        for raw in [0u128, 1, 7, 9_999, 10_001, 123_456_789_012_345_678, u128::MAX / 3] {
            let total = Wei::from_wei(raw);
            let split = PotSplit::of(total, 8_800);
            assert_eq!(split.winner_share.as_wei() + split.rollover.as_wei(), raw);
        }

        let split = PotSplit::of(Wei::from_eth_str("1").unwrap(), 8_800);
        assert_eq!(split.winner_share, Wei::from_eth_str("0.88").unwrap());
        assert_eq!(split.rollover, Wei::from_eth_str("0.12").unwrap());
        assert_eq!(split.winner_percent(), 88.0);
    }

    #[test]
    fn test_address_match_is_case_insensitive() {
        let tx = TransferRecord {
            from: "0xAbC".to_string(),
            to: "0xDEF".to_string(),
            value: Wei::ZERO,
            hash: "0x1".to_string(),
        };
        assert!(tx.is_from("0xabc"));
        assert!(tx.is_to(" 0xdef "));
        assert!(!tx.is_to("0xabc"));
    }

    #[test]
    fn test_winner_record_uses_eth_numbers() {
        let json = r#"{"winner":"0xabc","amount":0.000088}"#;
        let record: WinnerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.amount, Wei::from_eth_str("0.000088").unwrap());
        assert!(record.recorded_at.is_none());

        let out = serde_json::to_string(&record).unwrap();
        assert_eq!(out, json);
    }
}
