pub mod withdrawal;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Investment ids come back from the backend as either numbers or strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Investment record as served by `/user-investments/`. All monetary
/// amounts are USD; nothing here is derived. Fields are optional because
/// the backend has been observed to omit them on partially provisioned
/// records, and one bad record must not sink the whole list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawInvestment {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub plan_name: String,
    #[serde(default)]
    pub amount_usd: Option<Decimal>,
    #[serde(default)]
    pub roi_percentage: Option<Decimal>,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub expected_return: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentStatus {
    Active,
    Completed,
}

impl fmt::Display for InvestmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvestmentStatus::Active => write!(f, "active"),
            InvestmentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// BTC-denominated view of a [`RawInvestment`], derived on demand and
/// discarded after render. `progress_percentage` is a function of
/// wall-clock time and must be recomputed on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DenominatedInvestment {
    pub id: String,
    pub plan_name: String,
    pub amount_btc: Decimal,
    pub amount_usd: Decimal,
    pub roi: String,
    pub duration: String,
    pub start_date: String,
    pub end_date: String,
    pub status: InvestmentStatus,
    pub progress_percentage: u8,
    pub current_earnings_btc: Decimal,
    pub expected_return_btc: Decimal,
    /// Typed end of term, kept alongside the display string so maturity
    /// checks do not have to re-parse it.
    pub ends_at: DateTime<Utc>,
}

/// One dashboard row. A record that fails valuation renders as a
/// placeholder instead of taking the rest of the list down with it.
#[derive(Debug, Clone)]
pub enum InvestmentRow {
    Valued(DenominatedInvestment),
    Invalid { id: String, reason: String },
}

/// BTC/USD spot quote. `is_fallback` is true when the live feed was
/// unreachable and the hardcoded substitute price is in effect.
#[derive(Debug, Clone, Serialize)]
pub struct PriceQuote {
    pub usd: Decimal,
    pub is_fallback: bool,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletStats {
    pub balance_btc: Decimal,
    pub active_investments: u32,
    pub total_expected_return: Decimal,
    pub available_usd: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentPlan {
    pub id: u32,
    pub name: String,
    pub duration_days: u32,
    pub roi_percentage: Decimal,
    pub min_investment_usd: Decimal,
    pub category: String,
    pub roi_payment: String,
    pub early_withdrawal_fee: String,
}

impl InvestmentPlan {
    pub fn min_investment_btc(&self, btc_price_usd: Decimal) -> Decimal {
        if btc_price_usd <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.min_investment_usd / btc_price_usd).round_dp(8)
    }
}

/// Everything one refresh cycle produces for the renderer.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub wallet: Option<WalletStats>,
    pub rows: Vec<InvestmentRow>,
    pub price: PriceQuote,
    pub fetch_error: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub level: AlertLevel,
    pub metric: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
