use std::collections::HashMap;

use bigdecimal::BigDecimal;
use serde::Serialize;

/// Prices by price id, then by lower-case fiat code.
///
/// A missing entry means no price is known, which is not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceTable {
    prices: HashMap<String, HashMap<String, BigDecimal>>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a price, replacing any previous one for the same pair
    pub fn insert(&mut self, price_id: impl Into<String>, fiat_currency: &str, price: BigDecimal) {
        self.prices
            .entry(price_id.into())
            .or_default()
            .insert(fiat_currency.to_ascii_lowercase(), price);
    }

    /// Look up the price of `price_id` in `fiat_currency`
    pub fn get(&self, price_id: &str, fiat_currency: &str) -> Option<&BigDecimal> {
        self.prices
            .get(price_id)?
            .get(&fiat_currency.to_ascii_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Number of price ids with at least one price
    pub fn len(&self) -> usize {
        self.prices.len()
    }
}
