use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

use crate::utils::decimal::round_half_up;
use crate::utils::helper::format_address;

/// Holding and fiat value of one tracked asset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetValuation {
    pub display_name: String,
    pub symbol: String,
    pub balance: BigDecimal,
    /// Zero when no price was available
    pub fiat_value: BigDecimal,
}

/// Result of one aggregation for one address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSnapshot {
    pub address: String,
    pub fiat_currency: String,
    /// Same order as the tracked-asset list
    pub valuations: Vec<AssetValuation>,
    pub total_fiat_value: BigDecimal,
}

impl PortfolioSnapshot {
    /// Create a snapshot, summing the fiat values exactly
    pub fn new(address: String, fiat_currency: String, valuations: Vec<AssetValuation>) -> Self {
        let total_fiat_value = valuations
            .iter()
            .fold(BigDecimal::zero(), |acc, v| acc + &v.fiat_value);

        Self {
            address,
            fiat_currency,
            valuations,
            total_fiat_value,
        }
    }

    /// Get the valuation for a symbol
    pub fn get_valuation(&self, symbol: &str) -> Option<&AssetValuation> {
        self.valuations.iter().find(|v| v.symbol == symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.valuations.is_empty()
    }

    /// Number of assets in the snapshot
    pub fn asset_count(&self) -> usize {
        self.valuations.len()
    }

    /// Render the snapshot as plain text, one asset per line plus a total
    pub fn format_report(&self) -> String {
        let fiat = self.fiat_currency.to_ascii_uppercase();
        let mut lines = Vec::with_capacity(self.valuations.len() + 2);

        lines.push(format!("Portfolio {} ({})", format_address(&self.address), fiat));

        for (i, valuation) in self.valuations.iter().enumerate() {
            lines.push(format!(
                "{}. {} ({}): {} {} = {} {}",
                i + 1,
                valuation.display_name,
                valuation.symbol,
                format_balance(&valuation.balance),
                valuation.symbol,
                format_fixed(&valuation.fiat_value, 2),
                fiat
            ));
        }

        lines.push(format!("Total: {} {}", format_fixed(&self.total_fiat_value, 2), fiat));
        lines.join("\n")
    }
}

/// Balance with between 2 and 4 fractional digits
pub fn format_balance(value: &BigDecimal) -> String {
    let mut s = format_fixed(value, 4);
    while s.ends_with('0') && s.len() - s.find('.').unwrap_or(s.len()) > 3 {
        s.pop();
    }
    s
}

/// Plain positional notation rounded half-up to `scale` fractional digits
pub fn format_fixed(value: &BigDecimal, scale: i64) -> String {
    let rounded = round_half_up(value, scale);
    let (digits, _) = rounded.as_bigint_and_exponent();

    let negative = digits < num_bigint::BigInt::zero();
    let mut text = digits.magnitude().to_string();
    let scale = scale.max(0) as usize;

    if scale > 0 {
        if text.len() <= scale {
            text = format!("{}{}", "0".repeat(scale + 1 - text.len()), text);
        }
        text.insert(text.len() - scale, '.');
    }

    if negative {
        format!("-{}", text)
    } else {
        text
    }
}
