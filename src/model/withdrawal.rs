use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutMethod {
    Bitcoin,
    CashApp,
    PayPal,
}

impl fmt::Display for PayoutMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayoutMethod::Bitcoin => write!(f, "bitcoin"),
            PayoutMethod::CashApp => write!(f, "cashapp"),
            PayoutMethod::PayPal => write!(f, "paypal"),
        }
    }
}

/// Destination details for a payout, one variant per supported rail.
#[derive(Debug, Clone, PartialEq)]
pub enum PayoutDetails {
    Bitcoin { address: String, network: String },
    CashApp { tag: String },
    PayPal { email: String },
}

impl PayoutDetails {
    pub fn method(&self) -> PayoutMethod {
        match self {
            PayoutDetails::Bitcoin { .. } => PayoutMethod::Bitcoin,
            PayoutDetails::CashApp { .. } => PayoutMethod::CashApp,
            PayoutDetails::PayPal { .. } => PayoutMethod::PayPal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    pub amount_usd: Decimal,
    pub details: PayoutDetails,
}

/// A withdrawal as reported by `/withdrawals/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WithdrawalRecord {
    #[serde(default)]
    pub id: Option<super::RecordId>,
    #[serde(default)]
    pub amount_usd: Option<Decimal>,
    #[serde(default)]
    pub payout_method: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}
