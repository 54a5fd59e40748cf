use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::withdrawal::{WithdrawalRecord, WithdrawalRequest};
use crate::model::{InvestmentPlan, RawInvestment, WalletStats};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DataSourceStatus {
    Connected,
    Disconnected,
    Error(String),
}

/// Seam between the console and the platform backend. The REST client
/// implements it for live use; the demo provider stands in when there is
/// no account to talk to.
#[async_trait]
pub trait PlatformProvider {
    async fn wallet_stats(&self) -> Result<WalletStats>;
    async fn investments(&self) -> Result<Vec<RawInvestment>>;
    async fn plans(&self) -> Result<Vec<InvestmentPlan>>;
    async fn recent_withdrawals(&self) -> Result<Vec<WithdrawalRecord>>;
    async fn submit_withdrawal(&self, request: &WithdrawalRequest) -> Result<WithdrawalRecord>;
    async fn status(&self) -> DataSourceStatus;
}

pub fn parse_decimal(s: &str) -> rust_decimal::Decimal {
    s.parse().unwrap_or_else(|_| rust_decimal::Decimal::ZERO)
}
