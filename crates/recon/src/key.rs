use crate::columns::{CHANNEL_ORDER_NO, CUSTOMER_ORDER_NO, ORDER_NO};
use crate::model::{RawRecord, RecordShape};

/// Tail segment after the last `-`, or the whole value when there is none.
///
/// Channel order numbers carry a channel prefix (`SHOP-0001234`); the tail
/// is the customer-facing order number the order list is keyed by.
pub fn statement_key(channel_order_no: &str) -> String {
    match channel_order_no.rsplit_once('-') {
        Some((_, tail)) => tail.to_string(),
        None => channel_order_no.to_string(),
    }
}

pub fn order_list_key(customer_order_no: &str) -> String {
    customer_order_no.trim().to_string()
}

/// Derive the join/dedup key for a record of the given shape.
///
/// Cells are stringified first so numeric identifiers join against text
/// ones. A missing identifier yields the empty key.
pub fn derive_key(shape: RecordShape, record: &RawRecord) -> String {
    match shape {
        RecordShape::Statement => statement_key(&record.text(CHANNEL_ORDER_NO)),
        RecordShape::OrderList => order_list_key(&record.text(CUSTOMER_ORDER_NO)),
        RecordShape::UnifiedExport => record.text(ORDER_NO).trim().to_string(),
        RecordShape::Unrecognized => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, RawDataset};

    #[test]
    fn statement_tail_segment() {
        assert_eq!(statement_key("ABC-12345"), "12345");
        assert_eq!(statement_key("NOKEY"), "NOKEY");
        assert_eq!(statement_key("A-B-C-77"), "77");
        assert_eq!(statement_key("TRAILING-"), "");
        assert_eq!(statement_key(""), "");
    }

    #[test]
    fn statement_tail_is_not_trimmed() {
        assert_eq!(statement_key("X- 001"), " 001");
    }

    #[test]
    fn order_list_trims() {
        assert_eq!(order_list_key("  001 \n"), "001");
    }

    #[test]
    fn numeric_identifiers_stringify_without_fraction() {
        let ds = RawDataset::new(
            "c.xlsx",
            &["客户订单号".to_string()],
            vec![vec![CellValue::Number(12345.0)]],
        );
        assert_eq!(derive_key(RecordShape::OrderList, &ds.records[0]), "12345");
    }

    #[test]
    fn missing_identifier_is_empty_key() {
        let ds = RawDataset::new("b.xlsx", &["渠道单号".to_string()], vec![vec![CellValue::Empty]]);
        assert_eq!(derive_key(RecordShape::Statement, &ds.records[0]), "");
    }
}
