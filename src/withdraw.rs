use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::WithdrawalLimits;
use crate::model::withdrawal::{PayoutDetails, PayoutMethod, WithdrawalRequest};
use crate::model::PriceQuote;

#[derive(Debug, Error, PartialEq)]
pub enum WithdrawError {
    #[error("withdrawal amount must be positive")]
    NonPositiveAmount,
    #[error("minimum {method} withdrawal is ${min_usd} USD ({min_btc} BTC)")]
    BelowMinimum {
        method: PayoutMethod,
        min_usd: Decimal,
        min_btc: Decimal,
    },
    #[error("withdrawal amount exceeds available balance")]
    InsufficientBalance,
    #[error("bitcoin address must be at least 26 characters")]
    InvalidBitcoinAddress,
    #[error("bitcoin network must be specified")]
    MissingNetwork,
    #[error("cash app tag must start with '$'")]
    InvalidCashTag,
    #[error("paypal destination does not look like an email address")]
    InvalidPayPalEmail,
}

/// Client-side checks before a withdrawal POST, mirroring the platform's
/// withdraw form: positive amount, per-payout-method USD minimum, balance
/// ceiling, then destination plausibility for the chosen rail. The quote
/// is only used to surface the BTC equivalent of the minimum in the
/// error.
pub fn validate_withdrawal(
    request: &WithdrawalRequest,
    available_usd: Decimal,
    limits: &WithdrawalLimits,
    quote: &PriceQuote,
) -> Result<(), WithdrawError> {
    if request.amount_usd <= Decimal::ZERO {
        return Err(WithdrawError::NonPositiveAmount);
    }

    let method = request.details.method();
    let min_usd = limits.min_for(method);
    if request.amount_usd < min_usd {
        let min_btc = if quote.usd > Decimal::ZERO {
            (min_usd / quote.usd).round_dp(8)
        } else {
            Decimal::ZERO
        };
        return Err(WithdrawError::BelowMinimum {
            method,
            min_usd,
            min_btc,
        });
    }

    if request.amount_usd > available_usd {
        return Err(WithdrawError::InsufficientBalance);
    }

    match &request.details {
        PayoutDetails::Bitcoin { address, network } => {
            if address.trim().len() < 26 {
                return Err(WithdrawError::InvalidBitcoinAddress);
            }
            if network.trim().is_empty() {
                return Err(WithdrawError::MissingNetwork);
            }
        }
        PayoutDetails::CashApp { tag } => {
            if !tag.starts_with('$') || tag.len() < 2 {
                return Err(WithdrawError::InvalidCashTag);
            }
        }
        PayoutDetails::PayPal { email } => {
            let valid = email
                .split_once('@')
                .map(|(user, host)| !user.is_empty() && host.contains('.'))
                .unwrap_or(false);
            if !valid {
                return Err(WithdrawError::InvalidPayPalEmail);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn quote() -> PriceQuote {
        PriceQuote {
            usd: dec!(50000),
            is_fallback: false,
            fetched_at: Utc::now(),
        }
    }

    fn bitcoin_request(amount_usd: Decimal) -> WithdrawalRequest {
        WithdrawalRequest {
            amount_usd,
            details: PayoutDetails::Bitcoin {
                address: "bc1q084g99n4kvlf7nyt63mvqzqxn35ppaf5ku68vv".to_string(),
                network: "btc-mainnet".to_string(),
            },
        }
    }

    #[test]
    fn accepts_a_valid_bitcoin_withdrawal() {
        let limits = WithdrawalLimits::default();
        let request = bitcoin_request(dec!(5000));
        assert_eq!(
            validate_withdrawal(&request, dec!(12000), &limits, &quote()),
            Ok(())
        );
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let limits = WithdrawalLimits::default();
        assert_eq!(
            validate_withdrawal(&bitcoin_request(Decimal::ZERO), dec!(12000), &limits, &quote()),
            Err(WithdrawError::NonPositiveAmount)
        );
    }

    #[test]
    fn enforces_per_method_minimums() {
        let limits = WithdrawalLimits::default();

        let err =
            validate_withdrawal(&bitcoin_request(dec!(4999)), dec!(12000), &limits, &quote())
                .unwrap_err();
        assert_eq!(
            err,
            WithdrawError::BelowMinimum {
                method: PayoutMethod::Bitcoin,
                min_usd: dec!(5000),
                min_btc: dec!(0.1),
            }
        );

        let cashapp = WithdrawalRequest {
            amount_usd: dec!(50),
            details: PayoutDetails::CashApp {
                tag: "$satoshi".to_string(),
            },
        };
        assert!(matches!(
            validate_withdrawal(&cashapp, dec!(12000), &limits, &quote()),
            Err(WithdrawError::BelowMinimum {
                method: PayoutMethod::CashApp,
                ..
            })
        ));
    }

    #[test]
    fn rejects_amounts_above_available_balance() {
        let limits = WithdrawalLimits::default();
        assert_eq!(
            validate_withdrawal(&bitcoin_request(dec!(6000)), dec!(5500), &limits, &quote()),
            Err(WithdrawError::InsufficientBalance)
        );
    }

    #[test]
    fn rejects_short_bitcoin_addresses_and_missing_network() {
        let limits = WithdrawalLimits::default();

        let short = WithdrawalRequest {
            amount_usd: dec!(5000),
            details: PayoutDetails::Bitcoin {
                address: "bc1qshort".to_string(),
                network: "btc-mainnet".to_string(),
            },
        };
        assert_eq!(
            validate_withdrawal(&short, dec!(12000), &limits, &quote()),
            Err(WithdrawError::InvalidBitcoinAddress)
        );

        let no_network = WithdrawalRequest {
            amount_usd: dec!(5000),
            details: PayoutDetails::Bitcoin {
                address: "bc1q084g99n4kvlf7nyt63mvqzqxn35ppaf5ku68vv".to_string(),
                network: "  ".to_string(),
            },
        };
        assert_eq!(
            validate_withdrawal(&no_network, dec!(12000), &limits, &quote()),
            Err(WithdrawError::MissingNetwork)
        );
    }

    #[test]
    fn rejects_malformed_cash_tags_and_emails() {
        let limits = WithdrawalLimits::default();

        let tag = WithdrawalRequest {
            amount_usd: dec!(100),
            details: PayoutDetails::CashApp {
                tag: "satoshi".to_string(),
            },
        };
        assert_eq!(
            validate_withdrawal(&tag, dec!(12000), &limits, &quote()),
            Err(WithdrawError::InvalidCashTag)
        );

        let email = WithdrawalRequest {
            amount_usd: dec!(100),
            details: PayoutDetails::PayPal {
                email: "not-an-email".to_string(),
            },
        };
        assert_eq!(
            validate_withdrawal(&email, dec!(12000), &limits, &quote()),
            Err(WithdrawError::InvalidPayPalEmail)
        );
    }
}
