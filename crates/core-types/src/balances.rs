use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Balances below this value are treated as dust and count as zero.
pub const ZERO_BALANCE_THRESHOLD: Decimal = dec!(0.000001);

/// A snapshot of a wallet's holdings, keyed by token symbol.
///
/// Amounts are kept as the decimal strings produced by the balance reads so
/// that no precision is lost before they reach the strategy service. A missing
/// symbol means the balance was never fetched, which is not the same as `"0"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenBalances(BTreeMap<String, String>);

impl TokenBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one entry. Used while assembling a fresh snapshot.
    pub fn insert(&mut self, symbol: impl Into<String>, amount: impl Into<String>) {
        self.0.insert(symbol.into(), amount.into());
    }

    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.0.get(symbol).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the parsed amount for a symbol, or `None` if it is absent or not a number.
    pub fn amount(&self, symbol: &str) -> Option<Decimal> {
        self.get(symbol).and_then(parse_amount)
    }

    /// Checks whether the wallet holds nothing worth allocating.
    ///
    /// An empty mapping is all-zero. Otherwise every entry must be `"0"`, empty,
    /// or parse below [`ZERO_BALANCE_THRESHOLD`]. An entry that does not parse as
    /// a number is not considered zero.
    pub fn all_zero(&self) -> bool {
        self.0.values().all(|raw| {
            let raw = if raw.trim().is_empty() { "0" } else { raw.as_str() };
            match parse_amount(raw) {
                Some(value) => value.is_zero() || value < ZERO_BALANCE_THRESHOLD,
                None => false,
            }
        })
    }
}

impl FromIterator<(String, String)> for TokenBalances {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for TokenBalances {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Parses a decimal string, accepting scientific notation as well.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}
