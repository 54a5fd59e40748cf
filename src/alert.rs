use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::AlertThresholds;
use crate::model::{
    Alert, AlertLevel, DashboardSnapshot, InvestmentRow, InvestmentStatus,
};

/// Data-quality and maturity notices for one snapshot. Recomputed per
/// refresh; nothing here is stateful.
pub fn check_alerts(
    snapshot: &DashboardSnapshot,
    thresholds: &AlertThresholds,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(reason) = &snapshot.fetch_error {
        alerts.push(create_alert(
            AlertLevel::Critical,
            "Backend".to_string(),
            format!("investment data unavailable, retrying next refresh: {}", reason),
        ));
    }

    if snapshot.price.is_fallback {
        alerts.push(create_alert(
            AlertLevel::Warning,
            "Price Feed".to_string(),
            format!(
                "BTC/USD feed unreachable; showing fallback price ${} so USD figures are approximate",
                snapshot.price.usd
            ),
        ));
    }

    for row in &snapshot.rows {
        match row {
            InvestmentRow::Invalid { id, reason } => {
                alerts.push(create_alert(
                    AlertLevel::Warning,
                    "Data Integrity".to_string(),
                    format!("investment {} could not be valuated: {}", id, reason),
                ));
            }
            InvestmentRow::Valued(inv) if inv.status == InvestmentStatus::Active => {
                let remaining = inv.ends_at - now;
                if remaining <= Duration::zero() {
                    alerts.push(create_alert(
                        AlertLevel::Warning,
                        "Maturity".to_string(),
                        format!(
                            "{} ({}) is past its end date but still marked active",
                            inv.plan_name, inv.id
                        ),
                    ));
                } else if remaining <= Duration::days(thresholds.maturity_warning_days) {
                    alerts.push(create_alert(
                        AlertLevel::Info,
                        "Maturity".to_string(),
                        format!(
                            "{} ({}) matures in {} day(s)",
                            inv.plan_name,
                            inv.id,
                            remaining.num_days().max(1)
                        ),
                    ));
                }
            }
            InvestmentRow::Valued(_) => {}
        }
    }

    alerts
}

fn create_alert(level: AlertLevel, metric: String, message: String) -> Alert {
    Alert {
        id: Uuid::new_v4().to_string(),
        level,
        metric,
        message,
        timestamp: Utc::now(),
    }
}
