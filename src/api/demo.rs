use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::info;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::withdrawal::{WithdrawalRecord, WithdrawalRequest};
use crate::model::{InvestmentPlan, RawInvestment, RecordId, WalletStats};

use super::provider::{DataSourceStatus, PlatformProvider};

/// Self-contained stand-in for the backend: a plausible account with a
/// few investments at different points in their terms. Amounts are
/// jittered per run so the dashboard does not look canned.
pub struct DemoProvider {
    wallet: WalletStats,
    investments: Vec<RawInvestment>,
    plans: Vec<InvestmentPlan>,
    withdrawals: RwLock<Vec<WithdrawalRecord>>,
}

impl DemoProvider {
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        let now = Utc::now();

        let mut investments = Vec::new();
        // (plan, roi %, term days, days already elapsed, status)
        let seeds: [(&str, Decimal, i64, i64, &str); 4] = [
            ("Starter Plan", dec!(5), 7, 2, "active"),
            ("Growth Plan", dec!(15), 30, 14, "active"),
            ("Builder Plan", dec!(30), 90, 85, "active"),
            ("Growth Plan", dec!(15), 30, 45, "completed"),
        ];
        for (idx, (plan, roi, term, elapsed, status)) in seeds.into_iter().enumerate() {
            let amount = Decimal::from(rng.gen_range(8..60) * 250);
            let start = now - Duration::days(elapsed);
            investments.push(RawInvestment {
                id: Some(RecordId::Number(idx as u64 + 1)),
                plan_name: plan.to_string(),
                amount_usd: Some(amount),
                roi_percentage: Some(roi),
                duration_days: Some(term as u32),
                start_date: Some(start.to_rfc3339()),
                end_date: Some((start + Duration::days(term)).to_rfc3339()),
                status: Some(status.to_string()),
                expected_return: None,
            });
        }

        let total_expected: Decimal = investments
            .iter()
            .filter(|inv| inv.status.as_deref() == Some("active"))
            .filter_map(|inv| {
                let amount = inv.amount_usd?;
                let roi = inv.roi_percentage?;
                Some(amount * (Decimal::ONE + roi / Decimal::ONE_HUNDRED))
            })
            .sum();

        let wallet = WalletStats {
            balance_btc: dec!(0.42),
            active_investments: 3,
            total_expected_return: total_expected,
            available_usd: dec!(12345.67),
        };

        let plans = vec![
            demo_plan(1, "Starter Plan", 7, dec!(5), dec!(500), "entry"),
            demo_plan(2, "Growth Plan", 30, dec!(15), dec!(5000), "popular"),
            demo_plan(3, "Builder Plan", 90, dec!(30), dec!(25000), "advanced"),
        ];

        info!("🧪 demo provider seeded with {} investments", investments.len());

        Self {
            wallet,
            investments,
            plans,
            withdrawals: RwLock::new(Vec::new()),
        }
    }
}

impl Default for DemoProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn demo_plan(
    id: u32,
    name: &str,
    duration_days: u32,
    roi: Decimal,
    min_usd: Decimal,
    category: &str,
) -> InvestmentPlan {
    InvestmentPlan {
        id,
        name: name.to_string(),
        duration_days,
        roi_percentage: roi,
        min_investment_usd: min_usd,
        category: category.to_string(),
        roi_payment: "end of term".to_string(),
        early_withdrawal_fee: "10%".to_string(),
    }
}

#[async_trait]
impl PlatformProvider for DemoProvider {
    async fn wallet_stats(&self) -> Result<WalletStats> {
        Ok(self.wallet.clone())
    }

    async fn investments(&self) -> Result<Vec<RawInvestment>> {
        Ok(self.investments.clone())
    }

    async fn plans(&self) -> Result<Vec<InvestmentPlan>> {
        Ok(self.plans.clone())
    }

    async fn recent_withdrawals(&self) -> Result<Vec<WithdrawalRecord>> {
        Ok(self.withdrawals.read().await.clone())
    }

    async fn submit_withdrawal(&self, request: &WithdrawalRequest) -> Result<WithdrawalRecord> {
        let record = WithdrawalRecord {
            id: Some(RecordId::Text(Uuid::new_v4().to_string())),
            amount_usd: Some(request.amount_usd),
            payout_method: Some(request.details.method().to_string()),
            status: "pending".to_string(),
            created_at: Utc::now().to_rfc3339(),
            completed_at: None,
            transaction_id: None,
        };
        self.withdrawals.write().await.push(record.clone());
        Ok(record)
    }

    async fn status(&self) -> DataSourceStatus {
        DataSourceStatus::Connected
    }
}
