use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::model::withdrawal::PayoutMethod;
use crate::price::FALLBACK_PRICE_USD;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub operating_mode: OperatingMode,
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub price_feed_url: String,
    pub fallback_price_usd: Decimal,
    pub price_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub update_interval_ms: u64,
    pub withdrawal_limits: WithdrawalLimits,
    pub alert_thresholds: AlertThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OperatingMode {
    Live,
    Demo,
}

/// Client-side USD minimums per payout rail, checked before a request
/// ever reaches the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalLimits {
    pub bitcoin_min_usd: Decimal,
    pub cashapp_min_usd: Decimal,
    pub paypal_min_usd: Decimal,
}

impl WithdrawalLimits {
    pub fn min_for(&self, method: PayoutMethod) -> Decimal {
        match method {
            PayoutMethod::Bitcoin => self.bitcoin_min_usd,
            PayoutMethod::CashApp => self.cashapp_min_usd,
            PayoutMethod::PayPal => self.paypal_min_usd,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub maturity_warning_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            operating_mode: OperatingMode::Live,
            api_base_url: "https://api.markinvestment.io/api".to_string(),
            api_token: None,
            price_feed_url: "https://api.coingecko.com/api/v3/simple/price".to_string(),
            fallback_price_usd: FALLBACK_PRICE_USD,
            price_ttl_secs: 30,
            request_timeout_secs: 15,
            update_interval_ms: 30_000,
            withdrawal_limits: WithdrawalLimits::default(),
            alert_thresholds: AlertThresholds::default(),
        }
    }
}

impl Default for WithdrawalLimits {
    fn default() -> Self {
        Self {
            bitcoin_min_usd: dec!(5000),
            cashapp_min_usd: dec!(100),
            paypal_min_usd: dec!(100),
        }
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            maturity_warning_days: 3,
        }
    }
}

pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_file = config_path.unwrap_or("config.toml");

    let config: Config = Figment::from(figment::providers::Serialized::defaults(Config::default()))
        .merge(Toml::file(config_file))
        .merge(Env::prefixed("MARKINVEST_"))
        .extract()?;

    validate_config(&config)?;

    Ok(config)
}

pub fn generate_sample_config() -> Result<()> {
    let config = Config::default();
    let toml_content = toml::to_string_pretty(&config)?;

    fs::write("config.toml", toml_content)?;

    Ok(())
}

fn validate_config(config: &Config) -> Result<()> {
    if !config.api_base_url.starts_with("http") {
        return Err(anyhow::anyhow!(
            "api_base_url must be an http(s) URL, got {:?}",
            config.api_base_url
        ));
    }

    if !config.price_feed_url.starts_with("http") {
        return Err(anyhow::anyhow!(
            "price_feed_url must be an http(s) URL, got {:?}",
            config.price_feed_url
        ));
    }

    if config.update_interval_ms < 1000 {
        return Err(anyhow::anyhow!("update_interval_ms must be at least 1000ms"));
    }

    if config.request_timeout_secs == 0 {
        return Err(anyhow::anyhow!("request_timeout_secs must be at least 1s"));
    }

    if config.fallback_price_usd <= Decimal::ZERO {
        return Err(anyhow::anyhow!("fallback_price_usd must be positive"));
    }

    let limits = &config.withdrawal_limits;
    for (name, min) in [
        ("bitcoin_min_usd", limits.bitcoin_min_usd),
        ("cashapp_min_usd", limits.cashapp_min_usd),
        ("paypal_min_usd", limits.paypal_min_usd),
    ] {
        if min < Decimal::ZERO {
            return Err(anyhow::anyhow!("withdrawal_limits.{} must not be negative", name));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn rejects_sub_second_refresh_interval() {
        let config = Config {
            update_interval_ms: 200,
            ..Config::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_non_positive_fallback_price() {
        let config = Config {
            fallback_price_usd: Decimal::ZERO,
            ..Config::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn per_method_minimums_resolve() {
        let limits = WithdrawalLimits::default();
        assert_eq!(limits.min_for(PayoutMethod::Bitcoin), dec!(5000));
        assert_eq!(limits.min_for(PayoutMethod::CashApp), dec!(100));
        assert_eq!(limits.min_for(PayoutMethod::PayPal), dec!(100));
    }
}
