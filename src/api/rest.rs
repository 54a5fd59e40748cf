use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::warn;
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::model::withdrawal::{PayoutDetails, WithdrawalRecord, WithdrawalRequest};
use crate::model::{InvestmentPlan, RawInvestment, WalletStats};

use super::provider::{parse_decimal, DataSourceStatus, PlatformProvider};

/// Client for the MarkInvestment REST backend. Responses are wrapped in a
/// `{ status, message, data }` envelope except `/plans`, which returns a
/// bare array.
pub struct RestProvider {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct WalletStatsWire {
    total_balance: Decimal,
    active_investment: u32,
    total_expected_return: Decimal,
    balance_usd: String,
}

impl From<WalletStatsWire> for WalletStats {
    fn from(wire: WalletStatsWire) -> Self {
        WalletStats {
            balance_btc: wire.total_balance,
            active_investments: wire.active_investment,
            total_expected_return: wire.total_expected_return,
            available_usd: parse_decimal(&wire.balance_usd),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlanWire {
    id: u32,
    name: String,
    duration_days: u32,
    roi_percentage: String,
    min_investment_usd: Decimal,
    #[serde(default)]
    category: String,
    #[serde(default)]
    roi_payment: String,
    #[serde(default)]
    early_withdrawal_fee: String,
}

impl From<PlanWire> for InvestmentPlan {
    fn from(wire: PlanWire) -> Self {
        InvestmentPlan {
            id: wire.id,
            name: wire.name,
            duration_days: wire.duration_days,
            roi_percentage: parse_decimal(&wire.roi_percentage),
            min_investment_usd: wire.min_investment_usd,
            category: wire.category,
            roi_payment: wire.roi_payment,
            early_withdrawal_fee: wire.early_withdrawal_fee,
        }
    }
}

impl RestProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn get_enveloped<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?
            .error_for_status()
            .with_context(|| format!("GET {} rejected", path))?;

        let envelope: Envelope<T> = response
            .json()
            .await
            .with_context(|| format!("GET {} returned a malformed body", path))?;

        if !envelope.status {
            bail!("backend refused GET {}: {}", path, envelope.message);
        }
        Ok(envelope.data)
    }
}

#[async_trait]
impl PlatformProvider for RestProvider {
    async fn wallet_stats(&self) -> Result<WalletStats> {
        let wire: WalletStatsWire = self
            .get_enveloped("/wallet/")
            .await?
            .ok_or_else(|| anyhow!("wallet response carried no data"))?;
        Ok(wire.into())
    }

    async fn investments(&self) -> Result<Vec<RawInvestment>> {
        let rows: Vec<Value> = self
            .get_enveloped("/user-investments/")
            .await?
            .unwrap_or_default();
        Ok(rows.into_iter().map(into_raw_investment).collect())
    }

    async fn plans(&self) -> Result<Vec<InvestmentPlan>> {
        let response = self
            .request(Method::GET, "/plans")
            .send()
            .await
            .context("GET /plans failed")?
            .error_for_status()
            .context("GET /plans rejected")?;
        let wire: Vec<PlanWire> = response
            .json()
            .await
            .context("GET /plans returned a malformed body")?;
        Ok(wire.into_iter().map(InvestmentPlan::from).collect())
    }

    async fn recent_withdrawals(&self) -> Result<Vec<WithdrawalRecord>> {
        Ok(self
            .get_enveloped("/withdrawals/")
            .await?
            .unwrap_or_default())
    }

    async fn submit_withdrawal(&self, request: &WithdrawalRequest) -> Result<WithdrawalRecord> {
        let response = self
            .request(Method::POST, "/withdrawals/")
            .json(&withdrawal_payload(request))
            .send()
            .await
            .context("POST /withdrawals/ failed")?
            .error_for_status()
            .context("POST /withdrawals/ rejected")?;

        let envelope: Envelope<WithdrawalRecord> = response
            .json()
            .await
            .context("POST /withdrawals/ returned a malformed body")?;
        if !envelope.status {
            bail!("backend refused withdrawal: {}", envelope.message);
        }
        envelope
            .data
            .ok_or_else(|| anyhow!("withdrawal response carried no data"))
    }

    async fn status(&self) -> DataSourceStatus {
        match self.request(Method::GET, "/plans").send().await {
            Ok(response) if response.status().is_success() => DataSourceStatus::Connected,
            Ok(response) => DataSourceStatus::Error(format!("HTTP {}", response.status())),
            Err(e) if e.is_connect() || e.is_timeout() => DataSourceStatus::Disconnected,
            Err(e) => DataSourceStatus::Error(e.to_string()),
        }
    }
}

/// One row of the investment list. A row whose fields do not even fit
/// the wire shape still comes back (with whatever id it carried) so the
/// valuator can flag it instead of the whole fetch failing.
fn into_raw_investment(value: Value) -> RawInvestment {
    let id = value
        .get("id")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok());
    match serde_json::from_value::<RawInvestment>(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("investment row did not match the wire shape: {}", e);
            RawInvestment {
                id,
                ..RawInvestment::default()
            }
        }
    }
}

/// Flat POST body the backend expects: common fields plus the ones for
/// the chosen payout method.
fn withdrawal_payload(request: &WithdrawalRequest) -> Value {
    let mut payload = serde_json::json!({
        "amount_usd": request.amount_usd,
        "payout_method": request.details.method().to_string(),
    });
    match &request.details {
        PayoutDetails::Bitcoin { address, network } => {
            payload["address"] = Value::String(address.clone());
            payload["network"] = Value::String(network.clone());
        }
        PayoutDetails::CashApp { tag } => {
            payload["cashapp_tag"] = Value::String(tag.clone());
        }
        PayoutDetails::PayPal { email } => {
            payload["paypal_email"] = Value::String(email.clone());
        }
    }
    payload
}
