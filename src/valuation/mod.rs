use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::warn;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::model::{DenominatedInvestment, InvestmentRow, InvestmentStatus, RawInvestment};

const SATOSHI_DP: u32 = 8;

#[derive(Debug, Error, PartialEq)]
pub enum ValuationError {
    #[error("BTC price must be positive, got {0}")]
    InvalidPrice(Decimal),
    #[error("investment term ends on or before it starts ({start} .. {end})")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("record field `{0}` is missing or malformed")]
    MalformedRecord(&'static str),
}

/// Fraction of the term elapsed at `now`, as a whole percentage clamped
/// to [0, 100]. `now` is an explicit parameter so results are
/// deterministic; callers pass the wall clock once per refresh.
pub fn compute_progress(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<u8, ValuationError> {
    if end <= start {
        return Err(ValuationError::InvalidInterval { start, end });
    }
    if now >= end {
        return Ok(100);
    }
    if now <= start {
        return Ok(0);
    }
    let total = (end - start).num_milliseconds() as f64;
    let elapsed = (now - start).num_milliseconds() as f64;
    Ok((100.0 * elapsed / total).round() as u8)
}

/// Convert a raw USD-denominated record into the BTC view model rendered
/// on the dashboard.
///
/// Active investments pro-rate the expected return by elapsed progress;
/// completed ones report realized profit (expected return minus
/// principal) with progress pinned to 100. The two cases stay separate
/// branches so the profit figure never picks up progress rounding.
/// BTC outputs are rounded to satoshi precision last, after all
/// arithmetic on full-precision values.
pub fn denominate(
    raw: &RawInvestment,
    btc_price_usd: Decimal,
    now: DateTime<Utc>,
) -> Result<DenominatedInvestment, ValuationError> {
    if btc_price_usd <= Decimal::ZERO {
        return Err(ValuationError::InvalidPrice(btc_price_usd));
    }

    let amount_usd = raw
        .amount_usd
        .filter(|a| *a >= Decimal::ZERO)
        .ok_or(ValuationError::MalformedRecord("amount_usd"))?;
    let roi = raw
        .roi_percentage
        .filter(|r| *r >= Decimal::ZERO)
        .ok_or(ValuationError::MalformedRecord("roi_percentage"))?;
    let status = parse_status(raw.status.as_deref())?;

    let expected_return_usd = match raw.expected_return {
        Some(v) if v >= Decimal::ZERO => v,
        Some(_) => return Err(ValuationError::MalformedRecord("expected_return")),
        None => amount_usd * (Decimal::ONE + roi / Decimal::ONE_HUNDRED),
    };

    let start = parse_timestamp(raw.start_date.as_deref())
        .ok_or(ValuationError::MalformedRecord("start_date"))?;
    let end = parse_timestamp(raw.end_date.as_deref())
        .ok_or(ValuationError::MalformedRecord("end_date"))?;

    let progress = match status {
        InvestmentStatus::Completed => 100,
        InvestmentStatus::Active => compute_progress(start, end, now)?,
    };

    let amount_btc = amount_usd / btc_price_usd;
    let expected_return_btc = expected_return_usd / btc_price_usd;

    let current_earnings_btc = match status {
        InvestmentStatus::Active => {
            expected_return_btc * Decimal::from(progress) / Decimal::ONE_HUNDRED
        }
        // Realized profit on full-precision values; rounding happens once,
        // below, so the subtraction cannot compound two rounded halves.
        InvestmentStatus::Completed => expected_return_btc - amount_btc,
    };

    let duration_days = raw
        .duration_days
        .map(i64::from)
        .unwrap_or_else(|| (end - start).num_days());

    Ok(DenominatedInvestment {
        id: raw.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
        plan_name: raw.plan_name.clone(),
        amount_btc: round_satoshi(amount_btc),
        amount_usd,
        roi: format!("{}%", roi.normalize()),
        duration: format!("{} days", duration_days),
        start_date: format_date(start),
        end_date: format_date(end),
        status,
        progress_percentage: progress,
        current_earnings_btc: round_satoshi(current_earnings_btc),
        expected_return_btc: round_satoshi(expected_return_btc),
        ends_at: end,
    })
}

/// Valuate a whole fetch result, isolating failures to their own rows.
/// Records without an id get a positional one, same as the web client.
pub fn denominate_all(
    raws: &[RawInvestment],
    btc_price_usd: Decimal,
    now: DateTime<Utc>,
) -> Vec<InvestmentRow> {
    raws.iter()
        .enumerate()
        .map(|(idx, raw)| {
            let fallback_id = || {
                raw.id
                    .as_ref()
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| format!("inv-{}", idx + 1))
            };
            match denominate(raw, btc_price_usd, now) {
                Ok(mut inv) => {
                    if inv.id.is_empty() {
                        inv.id = fallback_id();
                    }
                    InvestmentRow::Valued(inv)
                }
                Err(e) => {
                    warn!("skipping investment {}: {}", fallback_id(), e);
                    InvestmentRow::Invalid {
                        id: fallback_id(),
                        reason: e.to_string(),
                    }
                }
            }
        })
        .collect()
}

fn parse_status(status: Option<&str>) -> Result<InvestmentStatus, ValuationError> {
    match status.map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("active") => Ok(InvestmentStatus::Active),
        Some("completed") => Ok(InvestmentStatus::Completed),
        _ => Err(ValuationError::MalformedRecord("status")),
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let s = value?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

fn format_date(dt: DateTime<Utc>) -> String {
    dt.format("%b %-d, %Y").to_string()
}

fn round_satoshi(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SATOSHI_DP, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn raw(amount: Decimal, roi: Decimal, status: &str, days: i64) -> RawInvestment {
        RawInvestment {
            id: Some(crate::model::RecordId::Number(7)),
            plan_name: "Growth Plan".to_string(),
            amount_usd: Some(amount),
            roi_percentage: Some(roi),
            duration_days: Some(days as u32),
            start_date: Some(t0().to_rfc3339()),
            end_date: Some((t0() + Duration::days(days)).to_rfc3339()),
            status: Some(status.to_string()),
            expected_return: None,
        }
    }

    #[test]
    fn progress_endpoints() {
        let end = t0() + Duration::days(7);
        assert_eq!(compute_progress(t0(), end, t0()).unwrap(), 0);
        assert_eq!(compute_progress(t0(), end, end).unwrap(), 100);
    }

    #[test]
    fn progress_clamps_outside_term() {
        let end = t0() + Duration::days(7);
        assert_eq!(
            compute_progress(t0(), end, t0() - Duration::days(1)).unwrap(),
            0
        );
        assert_eq!(
            compute_progress(t0(), end, end + Duration::days(30)).unwrap(),
            100
        );
    }

    #[test]
    fn progress_stays_bounded() {
        let end = t0() + Duration::days(30);
        for h in (-48i64..=(31 * 24)).step_by(6) {
            let p = compute_progress(t0(), end, t0() + Duration::hours(h)).unwrap();
            assert!(p <= 100);
        }
    }

    #[test]
    fn progress_is_monotonic_in_now() {
        let end = t0() + Duration::days(30);
        let mut last = 0;
        for h in 0i64..=(30 * 24) {
            let p = compute_progress(t0(), end, t0() + Duration::hours(h)).unwrap();
            assert!(p >= last, "progress went backwards at hour {}", h);
            last = p;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn progress_rounds_half_up() {
        // 12h of a 4800h term is 0.25%; 36h is 0.75%.
        let end = t0() + Duration::hours(4800);
        assert_eq!(compute_progress(t0(), end, t0() + Duration::hours(12)).unwrap(), 0);
        assert_eq!(compute_progress(t0(), end, t0() + Duration::hours(36)).unwrap(), 1);
    }

    #[test]
    fn progress_rejects_degenerate_interval() {
        assert_eq!(
            compute_progress(t0(), t0(), t0()),
            Err(ValuationError::InvalidInterval {
                start: t0(),
                end: t0()
            })
        );
        assert!(matches!(
            compute_progress(t0(), t0() - Duration::days(1), t0()),
            Err(ValuationError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn denominates_active_investment_mid_term() {
        let inv = denominate(
            &raw(dec!(1000), dec!(15), "active", 30),
            dec!(50000),
            t0() + Duration::days(15),
        )
        .unwrap();

        assert_eq!(inv.amount_btc, dec!(0.02));
        assert_eq!(inv.expected_return_btc, dec!(0.023));
        assert_eq!(inv.progress_percentage, 50);
        assert_eq!(inv.current_earnings_btc, dec!(0.0115));
        assert_eq!(inv.roi, "15%");
        assert_eq!(inv.duration, "30 days");
        assert_eq!(inv.start_date, "Jan 1, 2026");
        assert_eq!(inv.end_date, "Jan 31, 2026");
    }

    #[test]
    fn completed_profit_is_return_minus_principal() {
        let inv = denominate(
            &raw(dec!(500), dec!(3), "completed", 30),
            dec!(65000),
            t0() + Duration::days(400),
        )
        .unwrap();

        // (515 - 500) / 65000, subtracted at full precision then rounded.
        assert_eq!(inv.progress_percentage, 100);
        assert_eq!(inv.current_earnings_btc, dec!(0.00023077));
        assert_eq!(
            inv.current_earnings_btc,
            (inv.expected_return_btc - inv.amount_btc).round_dp(8)
        );
    }

    #[test]
    fn completed_earnings_never_go_through_the_progress_branch() {
        // Progress would pro-rate to the full expected return, which
        // overstates profit by the principal.
        let inv = denominate(
            &raw(dec!(1000), dec!(15), "completed", 30),
            dec!(50000),
            t0() + Duration::days(30),
        )
        .unwrap();
        assert_eq!(inv.current_earnings_btc, dec!(0.003));
    }

    #[test]
    fn backend_supplied_expected_return_wins_over_derivation() {
        let mut record = raw(dec!(1000), dec!(15), "active", 30);
        record.expected_return = Some(dec!(1200));
        let inv = denominate(&record, dec!(50000), t0() + Duration::days(30)).unwrap();
        assert_eq!(inv.expected_return_btc, dec!(0.024));
    }

    #[test]
    fn conversion_round_trips_within_a_satoshi() {
        for (usd, price) in [
            (dec!(1000), dec!(50000)),
            (dec!(123.45), dec!(65432.10)),
            (dec!(0.01), dec!(97321.55)),
            (dec!(5000000), dec!(3.14)),
        ] {
            let btc = usd / price;
            assert!(
                (btc * price - usd).abs() < dec!(0.00000001),
                "round trip drifted for {} @ {}",
                usd,
                price
            );
        }
    }

    #[test]
    fn outputs_are_non_negative() {
        for days_in in [0, 1, 15, 30, 45] {
            let inv = denominate(
                &raw(dec!(750), dec!(8), "active", 30),
                dec!(65432.10),
                t0() + Duration::days(days_in),
            )
            .unwrap();
            assert!(inv.amount_btc >= Decimal::ZERO);
            assert!(inv.expected_return_btc >= Decimal::ZERO);
            assert!(inv.current_earnings_btc >= Decimal::ZERO);
        }
    }

    #[test]
    fn rejects_non_positive_price() {
        let record = raw(dec!(1000), dec!(15), "active", 30);
        assert_eq!(
            denominate(&record, Decimal::ZERO, t0()),
            Err(ValuationError::InvalidPrice(Decimal::ZERO))
        );
        assert!(matches!(
            denominate(&record, dec!(-1), t0()),
            Err(ValuationError::InvalidPrice(_))
        ));
    }

    #[test]
    fn rejects_missing_numeric_fields() {
        let mut record = raw(dec!(1000), dec!(15), "active", 30);
        record.amount_usd = None;
        assert_eq!(
            denominate(&record, dec!(50000), t0()),
            Err(ValuationError::MalformedRecord("amount_usd"))
        );

        let mut record = raw(dec!(1000), dec!(15), "active", 30);
        record.roi_percentage = None;
        assert_eq!(
            denominate(&record, dec!(50000), t0()),
            Err(ValuationError::MalformedRecord("roi_percentage"))
        );
    }

    #[test]
    fn rejects_unknown_status_and_garbage_dates() {
        let mut record = raw(dec!(1000), dec!(15), "paused", 30);
        assert_eq!(
            denominate(&record, dec!(50000), t0()),
            Err(ValuationError::MalformedRecord("status"))
        );

        record.status = Some("active".to_string());
        record.end_date = Some("soon".to_string());
        assert_eq!(
            denominate(&record, dec!(50000), t0()),
            Err(ValuationError::MalformedRecord("end_date"))
        );
    }

    #[test]
    fn active_reversed_interval_fails_fast_instead_of_nan() {
        let mut record = raw(dec!(1000), dec!(15), "active", 30);
        record.end_date = record.start_date.clone();
        assert!(matches!(
            denominate(&record, dec!(50000), t0()),
            Err(ValuationError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn accepts_date_only_timestamps() {
        let mut record = raw(dec!(1000), dec!(15), "active", 30);
        record.start_date = Some("2026-01-01".to_string());
        record.end_date = Some("2026-01-31".to_string());
        let inv = denominate(&record, dec!(50000), t0() + Duration::days(15)).unwrap();
        assert_eq!(inv.progress_percentage, 50);
    }

    #[test]
    fn denominate_all_isolates_bad_rows() {
        let good = raw(dec!(1000), dec!(15), "active", 30);
        let mut bad = raw(dec!(1000), dec!(15), "active", 30);
        bad.id = None;
        bad.amount_usd = None;

        let rows = denominate_all(&[good, bad], dec!(50000), t0() + Duration::days(15));
        assert_eq!(rows.len(), 2);
        assert!(matches!(rows[0], InvestmentRow::Valued(_)));
        match &rows[1] {
            InvestmentRow::Invalid { id, reason } => {
                assert_eq!(id, "inv-2");
                assert!(reason.contains("amount_usd"));
            }
            other => panic!("expected invalid row, got {:?}", other),
        }
    }
}
