use rust_decimal::Decimal;

use crate::model::{
    Alert, AlertLevel, DashboardSnapshot, InvestmentRow, InvestmentStatus,
};

const BAR_WIDTH: usize = 20;

/// Render one snapshot as the text dashboard. Pure string assembly so
/// the output is testable; the caller decides where it goes.
pub fn render(snapshot: &DashboardSnapshot, alerts: &[Alert]) -> String {
    let mut out = String::new();

    let price_tag = if snapshot.price.is_fallback {
        " (fallback)"
    } else {
        ""
    };
    out.push_str(&format!(
        "─── MarkInvestment ─── BTC/USD ${}{}\n",
        format_usd(snapshot.price.usd),
        price_tag
    ));

    if let Some(reason) = &snapshot.fetch_error {
        out.push_str(&format!(
            "❌ Could not load investments: {}\n   Retrying on the next refresh.\n",
            reason
        ));
    }

    match &snapshot.wallet {
        Some(wallet) => {
            let balance_usd = wallet.balance_btc * snapshot.price.usd;
            out.push_str(&format!(
                "Balance: {} BTC (≈ ${})   Available: ${}   Active investments: {}   Expected returns: ${}\n",
                wallet.balance_btc,
                format_usd(balance_usd),
                format_usd(wallet.available_usd),
                wallet.active_investments,
                format_usd(wallet.total_expected_return)
            ));
        }
        None => out.push_str("Balance: unavailable\n"),
    }

    if snapshot.rows.is_empty() && snapshot.fetch_error.is_none() {
        out.push_str("\nNo investments yet.\n");
    }

    for row in &snapshot.rows {
        match row {
            InvestmentRow::Valued(inv) => {
                out.push_str(&format!(
                    "\n{} ({}) · {} ROI · {} · {}\n",
                    inv.plan_name, inv.id, inv.roi, inv.duration, inv.status
                ));
                out.push_str(&format!(
                    "  {} BTC (≈ ${})\n",
                    inv.amount_btc,
                    format_usd(inv.amount_usd)
                ));
                out.push_str(&format!(
                    "  {} {}%  {} .. {}\n",
                    progress_bar(inv.progress_percentage),
                    inv.progress_percentage,
                    inv.start_date,
                    inv.end_date
                ));
                let label = match inv.status {
                    InvestmentStatus::Active => "Current earnings",
                    InvestmentStatus::Completed => "Profit",
                };
                out.push_str(&format!(
                    "  {}: {} BTC (≈ ${})   Expected return: {} BTC\n",
                    label,
                    inv.current_earnings_btc,
                    format_usd(inv.current_earnings_btc * snapshot.price.usd),
                    inv.expected_return_btc
                ));
            }
            InvestmentRow::Invalid { id, reason } => {
                out.push_str(&format!("\n⚠️ {}: not shown ({})\n", id, reason));
            }
        }
    }

    if !alerts.is_empty() {
        out.push_str("\nAlerts:\n");
        for alert in alerts {
            let icon = match alert.level {
                AlertLevel::Critical => "❌",
                AlertLevel::Warning => "⚠️",
                AlertLevel::Info => "ℹ️",
            };
            out.push_str(&format!("  {} [{}] {}\n", icon, alert.metric, alert.message));
        }
    }

    if let Some(updated) = snapshot.last_update {
        out.push_str(&format!(
            "\nLast updated {}\n",
            updated.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    out
}

fn progress_bar(percentage: u8) -> String {
    let filled = (percentage as usize * BAR_WIDTH) / 100;
    let mut bar = String::with_capacity(BAR_WIDTH + 2);
    bar.push('[');
    for i in 0..BAR_WIDTH {
        bar.push(if i < filled { '█' } else { '░' });
    }
    bar.push(']');
    bar
}

/// "1234567.891" style decimals rendered as "1,234,567.89".
fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    if frac_part.is_empty() {
        format!("{}{}.00", sign, grouped)
    } else if frac_part.len() == 1 {
        format!("{}{}.{}0", sign, grouped, frac_part)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}
