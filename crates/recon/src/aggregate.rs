use std::collections::BTreeMap;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::coerce::round_money;
use crate::config::CurrencyConfig;
use crate::model::{LedgerSummary, Monetary, RejectReason, Verdict};

/// Count and sum the accepted and rejected partitions independently.
///
/// `partitions` pairs each candidate's verdict with its computed money.
/// When an exchange rate is configured the accepted sum is also reported
/// in the secondary currency (`sum / rate`, rounded to cents). Sums that
/// would leave the decimal range saturate at `Decimal::MAX`/`MIN`.
pub fn summarize(partitions: &[(Verdict, Monetary)], currency: &CurrencyConfig) -> LedgerSummary {
    let mut summary = LedgerSummary::default();
    let mut by_reason: BTreeMap<RejectReason, usize> = BTreeMap::new();

    for (verdict, money) in partitions {
        match verdict {
            Verdict::Accepted => {
                summary.accepted_count += 1;
                summary.accepted_sum = add_saturating(summary.accepted_sum, money.amount);
            }
            Verdict::Rejected(reason) => {
                summary.rejected_count += 1;
                summary.rejected_sum = add_saturating(summary.rejected_sum, money.amount);
                *by_reason.entry(*reason).or_insert(0) += 1;
            }
        }
    }

    summary.rejected_by_reason = by_reason;

    if let Some(rate) = currency.exchange_rate.and_then(Decimal::from_f64) {
        if !rate.is_zero() {
            summary.secondary_sum =
                summary.accepted_sum.checked_div(rate).map(|sum| round_money(sum, 2));
            if summary.secondary_sum.is_none() {
                log::warn!("accepted sum cannot be converted at rate {rate}");
            }
            summary.secondary_currency = Some(currency.secondary.clone());
        }
    }

    summary
}

fn add_saturating(sum: Decimal, amount: Decimal) -> Decimal {
    sum.checked_add(amount).unwrap_or_else(|| {
        log::warn!("ledger sum overflows the decimal range; saturating");
        if amount.is_sign_negative() { Decimal::MIN } else { Decimal::MAX }
    })
}
