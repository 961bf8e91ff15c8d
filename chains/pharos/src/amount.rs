//! Decimal amounts as written in configuration (`"0.000005342"`, `"all"`).
//!
//! Amounts are kept as an integer number of units plus a scale so that
//! randomization can preserve the literal's precision exactly.

use alloy::primitives::U256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Native and wrapped assets both use 18 decimals.
pub const DECIMALS: u32 = 18;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("invalid amount literal '{0}'")]
    Invalid(String),

    #[error("amount '{literal}' has {scale} fractional digits, at most {DECIMALS} supported")]
    TooPrecise { literal: String, scale: u32 },
}

/// A non-negative fixed-point decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalAmount {
    units: u128,
    scale: u32,
}

impl DecimalAmount {
    pub const fn new(units: u128, scale: u32) -> Self {
        Self { units, scale }
    }

    pub fn units(&self) -> u128 {
        self.units
    }

    /// Number of fractional digits in the literal.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Value in the smallest on-chain denomination.
    pub fn to_wei(&self) -> U256 {
        U256::from(self.units) * U256::from(10u8).pow(U256::from(DECIMALS - self.scale))
    }

    /// Same scale, different unit count.
    pub fn with_units(&self, units: u128) -> Self {
        Self {
            units,
            scale: self.scale,
        }
    }
}

impl FromStr for DecimalAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let literal = s.trim();
        let invalid = || AmountError::Invalid(literal.to_string());

        let (int_part, frac_part) = match literal.split_once('.') {
            Some((i, f)) => (i, f),
            None => (literal, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let scale = frac_part.len() as u32;
        if scale > DECIMALS {
            return Err(AmountError::TooPrecise {
                literal: literal.to_string(),
                scale,
            });
        }

        let digits = format!("{}{}", int_part, frac_part);
        let units = if digits.is_empty() {
            0
        } else {
            digits.parse::<u128>().map_err(|_| invalid())?
        };
        Ok(Self { units, scale })
    }
}

impl fmt::Display for DecimalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.units);
        }
        let divisor = 10u128.pow(self.scale);
        write!(
            f,
            "{}.{:0width$}",
            self.units / divisor,
            self.units % divisor,
            width = self.scale as usize
        )
    }
}

/// A configured operation amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    /// The whole available balance (`all` / `max`).
    All,
    Exact(DecimalAmount),
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") || trimmed.eq_ignore_ascii_case("max") {
            return Ok(Amount::All);
        }
        trimmed.parse().map(Amount::Exact)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::All => f.write_str("all"),
            Amount::Exact(d) => d.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_keep_scale() {
        let amount: DecimalAmount = "0.000005342".parse().unwrap();
        assert_eq!(amount.units(), 5342);
        assert_eq!(amount.scale(), 9);
        assert_eq!(amount.to_string(), "0.000005342");

        let whole: DecimalAmount = "12".parse().unwrap();
        assert_eq!(whole.to_string(), "12");

        let trailing: DecimalAmount = "1.50".parse().unwrap();
        assert_eq!(trailing.to_string(), "1.50");
    }

    #[test]
    fn test_to_wei() {
        let amount: DecimalAmount = "0.0000001".parse().unwrap();
        assert_eq!(amount.to_wei(), U256::from(100_000_000_000u64));
        let one: DecimalAmount = "1".parse().unwrap();
        assert_eq!(one.to_wei(), U256::from(10u64.pow(18)));
    }

    #[test]
    fn test_sentinels() {
        assert_eq!("all".parse::<Amount>().unwrap(), Amount::All);
        assert_eq!("MAX".parse::<Amount>().unwrap(), Amount::All);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("".parse::<Amount>().is_err());
        assert!(".".parse::<Amount>().is_err());
        assert!("-1".parse::<Amount>().is_err());
        assert!("1e5".parse::<Amount>().is_err());
        assert!(matches!(
            "0.0000000000000000001".parse::<Amount>(),
            Err(AmountError::TooPrecise { scale: 19, .. })
        ));
    }
}
