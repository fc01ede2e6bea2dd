//! Upload ledger layout: a version row, the header row, then one row per
//! ledger entry. The downstream platform parses this positionally.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::model::CanonicalLedgerRow;

pub const FORMAT_TAG: &str = "version";
pub const FORMAT_VERSION: &str = "20201013";

pub const LEDGER_HEADERS: [&str; 11] = [
    "订单编号",
    "订单日期",
    "订单币种",
    "订单金额",
    "商品名称",
    "商品数量",
    "商品单价",
    "店铺网址",
    "快递单号",
    "物流企业名称",
    "电商平台英文名称",
];

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerCell {
    Text(String),
    Number(Decimal),
}

impl std::fmt::Display for LedgerCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{}", n.normalize()),
        }
    }
}

fn text(s: &str) -> LedgerCell {
    LedgerCell::Text(s.to_string())
}

/// The full table, leading rows included.
pub fn ledger_table(rows: &[CanonicalLedgerRow]) -> Vec<Vec<LedgerCell>> {
    let width = LEDGER_HEADERS.len();
    let mut table = Vec::with_capacity(rows.len() + 2);

    let mut version = vec![text(FORMAT_TAG), text(FORMAT_VERSION)];
    version.resize(width, text(""));
    table.push(version);

    table.push(LEDGER_HEADERS.iter().map(|h| text(h)).collect());

    for row in rows {
        table.push(vec![
            text(&row.order_id),
            text(&row.order_date),
            text(&row.currency),
            LedgerCell::Number(row.amount),
            text(&row.item_name),
            LedgerCell::Number(row.quantity),
            LedgerCell::Number(row.unit_price),
            text(&row.shop_url),
            text(&row.tracking_number),
            text(&row.carrier),
            text(&row.platform_name),
        ]);
    }

    table
}

/// `{platform}_{MMDD}.{extension}` for the run date.
pub fn suggested_filename(platform_name: &str, run_date: NaiveDate, extension: &str) -> String {
    let platform: String = platform_name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect();
    format!("{platform}_{}.{extension}", run_date.format("%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> CanonicalLedgerRow {
        CanonicalLedgerRow {
            order_id: id.into(),
            order_date: "2025-01-02".into(),
            currency: "USD".into(),
            amount: "100.5".parse().unwrap(),
            item_name: "Shirt".into(),
            quantity: Decimal::ONE,
            unit_price: "100.50".parse().unwrap(),
            shop_url: "https://shop".into(),
            tracking_number: "T1".into(),
            carrier: "DHL".into(),
            platform_name: "ETMall".into(),
        }
    }

    #[test]
    fn leading_rows() {
        let table = ledger_table(&[]);
        assert_eq!(table.len(), 2);

        let version: Vec<String> = table[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(version.len(), 11);
        assert_eq!(version[0], "version");
        assert_eq!(version[1], "20201013");
        assert!(version[2..].iter().all(|c| c.is_empty()));

        let header: Vec<String> = table[1].iter().map(|c| c.to_string()).collect();
        assert_eq!(header, LEDGER_HEADERS);
    }

    #[test]
    fn data_rows_follow_header_order() {
        let table = ledger_table(&[row("001"), row("002")]);
        assert_eq!(table.len(), 4);
        let cells: Vec<String> = table[2].iter().map(|c| c.to_string()).collect();
        assert_eq!(
            cells,
            vec![
                "001", "2025-01-02", "USD", "100.5", "Shirt", "1", "100.5", "https://shop", "T1",
                "DHL", "ETMall"
            ]
        );
        assert!(matches!(table[2][3], LedgerCell::Number(_)));
        assert!(matches!(table[2][0], LedgerCell::Text(_)));
        assert_eq!(table[3][0], LedgerCell::Text("002".into()));
    }

    #[test]
    fn filename_uses_month_and_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(suggested_filename("ETMall", date, "xlsx"), "ETMall_0309.xlsx");
        assert_eq!(suggested_filename("a/b", date, "csv"), "a_b_0309.csv");
    }
}
