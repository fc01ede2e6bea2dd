//! Column vocabulary: canonical source column names, locale aliases, and
//! header normalization applied once when a dataset is ingested.

// ---------------------------------------------------------------------------
// Statement export (channel reconciliation)
// ---------------------------------------------------------------------------

pub const CHANNEL_ORDER_NO: &str = "渠道单号";
pub const CHANNEL_ORDER_CREATED: &str = "渠道订单创建时间";
pub const PAYMENT_TOTAL: &str = "支付总金额";
pub const PAYMENT_CURRENCY: &str = "支付币种";
pub const STOREFRONT_ITEM_NAME: &str = "前台传入商品名称";
pub const ITEM_QUANTITY: &str = "商品数量";

// ---------------------------------------------------------------------------
// Order-list export (logistics)
// ---------------------------------------------------------------------------

pub const CUSTOMER_ORDER_NO: &str = "客户订单号";
pub const EXPRESS_TRACKING_NO: &str = "快递单号";
pub const EXPRESS_CARRIER: &str = "快递公司";

// ---------------------------------------------------------------------------
// Unified export (commerce + logistics in one sheet)
// ---------------------------------------------------------------------------

pub const SHIP_INSTRUCTION_DATE: &str = "出貨指示日";
pub const ORDER_NO: &str = "訂單編號";
pub const DELIVERY_TRACKING_NO: &str = "配送單號";
pub const FREIGHT_CARRIER: &str = "貨運公司";
pub const RETURN_STATUS: &str = "銷退狀態";
pub const QUANTITY: &str = "數量";
pub const SALE_PRICE: &str = "售價";
pub const ITEM_NAME: &str = "商品名稱";

/// Locale variant → canonical column name.
///
/// Exports from the same vendor ship in Traditional or Simplified script
/// depending on account locale. Canonical names are whatever script the
/// vendor uses by default for that export.
pub const COLUMN_ALIASES: &[(&str, &str)] = &[
    // statement
    ("渠道單號", CHANNEL_ORDER_NO),
    ("渠道訂單創建時間", CHANNEL_ORDER_CREATED),
    ("支付總金額", PAYMENT_TOTAL),
    ("支付幣種", PAYMENT_CURRENCY),
    ("前台傳入商品名稱", STOREFRONT_ITEM_NAME),
    ("商品數量", ITEM_QUANTITY),
    // order list
    ("客戶訂單號", CUSTOMER_ORDER_NO),
    ("快遞單號", EXPRESS_TRACKING_NO),
    ("快遞公司", EXPRESS_CARRIER),
    // unified export
    ("出货指示日", SHIP_INSTRUCTION_DATE),
    ("订单编号", ORDER_NO),
    ("配送单号", DELIVERY_TRACKING_NO),
    ("货运公司", FREIGHT_CARRIER),
    ("销退状态", RETURN_STATUS),
    ("数量", QUANTITY),
    ("售价", SALE_PRICE),
    ("商品名称", ITEM_NAME),
];

/// Strip surrounding whitespace, embedded line breaks/tabs, and spaces.
///
/// Spreadsheet headers frequently wrap (`"支付\n总金额"`) or carry padding.
/// The result is a fixed point: normalizing twice gives the same string.
pub fn normalize_column_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t' | ' ' | '\u{3000}' | '\u{a0}'))
        .collect()
}

/// Map a normalized column name to its canonical spelling.
pub fn canonical_column(normalized: &str) -> &str {
    COLUMN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_wrapping_and_padding() {
        assert_eq!(normalize_column_name("  支付\n总金额 "), "支付总金额");
        assert_eq!(normalize_column_name("渠道 订单\r\n创建时间"), "渠道订单创建时间");
        assert_eq!(normalize_column_name("\t快递单号\u{3000}"), "快递单号");
    }

    #[test]
    fn normalization_is_idempotent_on_samples() {
        for raw in ["a b\nc", " 出貨指示日 ", "", "x\r\n"] {
            let once = normalize_column_name(raw);
            assert_eq!(normalize_column_name(&once), once);
        }
    }

    #[test]
    fn traditional_and_simplified_resolve_together() {
        assert_eq!(canonical_column("渠道單號"), CHANNEL_ORDER_NO);
        assert_eq!(canonical_column("渠道单号"), CHANNEL_ORDER_NO);
        assert_eq!(canonical_column("客戶訂單號"), CUSTOMER_ORDER_NO);
        assert_eq!(canonical_column("出货指示日"), SHIP_INSTRUCTION_DATE);
        assert_eq!(canonical_column("售价"), SALE_PRICE);
    }

    #[test]
    fn unknown_columns_pass_through() {
        assert_eq!(canonical_column("備註"), "備註");
    }

    #[test]
    fn aliases_never_chain() {
        // An alias must point straight at a canonical name, never at another alias.
        for (_, canonical) in COLUMN_ALIASES {
            assert!(
                COLUMN_ALIASES.iter().all(|(alias, _)| alias != canonical),
                "{canonical} is both canonical and an alias"
            );
        }
    }
}
