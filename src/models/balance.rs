use serde::{Deserialize, Serialize};

/// One balance response from a [`BalanceSource`](crate::traits::BalanceSource).
///
/// `value` is the unsigned integer balance in the asset's smallest unit, kept as
/// text until it reaches [`to_decimal`](crate::utils::to_decimal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBalance {
    /// `None` for the native asset
    pub contract_address: Option<String>,
    pub value: String,
    pub success: bool,
    pub provider_message: String,
}

impl RawBalance {
    pub fn ok(contract_address: Option<String>, value: impl Into<String>) -> Self {
        Self {
            contract_address,
            value: value.into(),
            success: true,
            provider_message: "OK".to_string(),
        }
    }

    pub fn failed(contract_address: Option<String>, message: impl Into<String>) -> Self {
        Self {
            contract_address,
            value: String::new(),
            success: false,
            provider_message: message.into(),
        }
    }
}
