//! Monetary derivation and canonical-row construction.

use rust_decimal::Decimal;

use crate::coerce::{format_date, is_null_text, round_money, to_decimal};
use crate::columns::{
    CHANNEL_ORDER_CREATED, ITEM_QUANTITY, PAYMENT_TOTAL, QUANTITY, SALE_PRICE,
    SHIP_INSTRUCTION_DATE,
};
use crate::config::{AmountBasis, CurrencySource, ResolvedRule, RunConfig};
use crate::model::{CanonicalLedgerRow, Monetary, MergedRecord, RecordShape};

const MONEY_DP: u32 = 2;

/// Source columns feeding the money triple for a shape.
struct MoneyColumns {
    amount: Option<&'static str>,
    quantity: &'static str,
    unit_price: Option<&'static str>,
}

fn money_columns(shape: RecordShape) -> MoneyColumns {
    match shape {
        RecordShape::UnifiedExport => MoneyColumns {
            amount: None,
            quantity: QUANTITY,
            unit_price: Some(SALE_PRICE),
        },
        _ => MoneyColumns {
            amount: Some(PAYMENT_TOTAL),
            quantity: ITEM_QUANTITY,
            unit_price: None,
        },
    }
}

/// Compute amount, quantity and unit price for one candidate.
///
/// Coercion failures fall back locally: amount and unit price to 0,
/// quantity to 1. A zero quantity divides as 1; the quantity itself is
/// reported unchanged. A product or quotient that overflows the decimal
/// range is treated like an unparseable field and becomes 0.
pub fn monetary(record: &MergedRecord, rule: &ResolvedRule) -> Monetary {
    let cols = money_columns(record.shape);
    let read = |column: Option<&str>| column.and_then(|c| to_decimal(record.source.get(c)));
    let or_zero = |value: Option<Decimal>, what: &str| {
        value.unwrap_or_else(|| {
            log::debug!("'{}': {} overflows, using 0", record.key, what);
            Decimal::ZERO
        })
    };

    let quantity = to_decimal(record.source.get(cols.quantity)).unwrap_or_else(|| {
        log::debug!("'{}': quantity missing or non-numeric, using 1", record.key);
        Decimal::ONE
    });
    let divisor = if quantity.is_zero() { Decimal::ONE } else { quantity };

    match rule.amount_basis {
        AmountBasis::Total => {
            let amount = match read(cols.amount) {
                Some(amount) => amount,
                // A unit-price sheet configured as total-authoritative still
                // has a usable total: quantity * unit price.
                None => match read(cols.unit_price) {
                    Some(price) => or_zero(price.checked_mul(quantity), "amount"),
                    None => Decimal::ZERO,
                },
            };
            Monetary {
                amount: round_money(amount, MONEY_DP),
                quantity,
                unit_price: round_money(or_zero(amount.checked_div(divisor), "unit price"), MONEY_DP),
            }
        }
        AmountBasis::UnitPrice => {
            let unit_price = match read(cols.unit_price) {
                Some(price) => price,
                None => {
                    let amount = read(cols.amount).unwrap_or(Decimal::ZERO);
                    or_zero(amount.checked_div(divisor), "unit price")
                }
            };
            Monetary {
                amount: round_money(or_zero(quantity.checked_mul(unit_price), "amount"), MONEY_DP),
                quantity,
                unit_price: round_money(unit_price, MONEY_DP),
            }
        }
    }
}

pub fn currency(record: &MergedRecord, rule: &ResolvedRule) -> String {
    match &rule.currency {
        CurrencySource::Fixed(code) => code.clone(),
        CurrencySource::Column { column, fallback } => {
            let value = record.source.text(column);
            if is_null_text(&value) {
                fallback.clone()
            } else {
                value.trim().to_string()
            }
        }
    }
}

fn date_column(shape: RecordShape) -> &'static str {
    match shape {
        RecordShape::UnifiedExport => SHIP_INSTRUCTION_DATE,
        _ => CHANNEL_ORDER_CREATED,
    }
}

/// Map an accepted candidate into the ledger schema.
pub fn project(record: &MergedRecord, money: &Monetary, config: &RunConfig) -> CanonicalLedgerRow {
    let rule = config.rule_for(record.shape);
    CanonicalLedgerRow {
        order_id: record.key.clone(),
        order_date: format_date(record.source.get(date_column(record.shape))),
        currency: currency(record, &rule),
        amount: money.amount,
        item_name: record.item_name(),
        quantity: money.quantity,
        unit_price: money.unit_price,
        shop_url: config.shop_url.clone(),
        tracking_number: record.tracking_number().trim().to_string(),
        carrier: record.carrier(),
        platform_name: config.platform_name.clone(),
    }
}
