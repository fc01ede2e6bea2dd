//! Exclusion rules, evaluated in a fixed order per candidate:
//!
//! 1. no tracking number
//! 2. returned / cancelled (when enabled)
//! 3. Do-Not-Ship keyword in the item name
//! 4. duplicate key (already seen earlier in the run)
//! 5. stale order date (when enabled)
//!
//! The first rule that fires is the recorded reason.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::coerce::{is_null_text, to_date};
use crate::columns::{CHANNEL_ORDER_CREATED, RETURN_STATUS, SHIP_INSTRUCTION_DATE};
use crate::config::ExclusionConfig;
use crate::model::{MergedRecord, RecordShape, RejectReason, Verdict};

/// Stateful evaluator for one run. The seen-key set is the only state and
/// lives exactly as long as the evaluator.
pub struct ExclusionEvaluator<'a> {
    config: &'a ExclusionConfig,
    reference_date: NaiveDate,
    seen: HashSet<String>,
}

impl<'a> ExclusionEvaluator<'a> {
    pub fn new(config: &'a ExclusionConfig, reference_date: NaiveDate) -> Self {
        Self {
            config,
            reference_date,
            seen: HashSet::new(),
        }
    }

    /// Evaluate one candidate. Candidates must be fed in run order.
    ///
    /// Every candidate registers its key, whatever its own verdict, so a
    /// later row with the same key is a duplicate even when the first
    /// occurrence was rejected for another reason.
    pub fn evaluate(&mut self, record: &MergedRecord) -> Verdict {
        let duplicate = !self.seen.insert(record.key.clone());

        if is_null_text(&record.tracking_number()) {
            return Verdict::Rejected(RejectReason::NoTrackingNumber);
        }
        if self.config.return_or_cancelled && is_returned(record) {
            return Verdict::Rejected(RejectReason::ReturnOrCancelled);
        }
        if record.item_name().contains(self.config.keyword.as_str()) {
            return Verdict::Rejected(RejectReason::ExcludedKeyword);
        }
        if duplicate {
            return Verdict::Rejected(RejectReason::DuplicateOrder);
        }
        if self.config.stale_orders && self.is_stale(record) {
            return Verdict::Rejected(RejectReason::StaleOrder);
        }
        Verdict::Accepted
    }

    fn is_stale(&self, record: &MergedRecord) -> bool {
        match order_date(record) {
            Some(date) => (self.reference_date - date).num_days() > self.config.stale_after_days as i64,
            // Undated rows are never stale.
            None => false,
        }
    }
}

fn is_returned(record: &MergedRecord) -> bool {
    record
        .source
        .get(RETURN_STATUS)
        .map(|status| !is_null_text(&status.to_string()))
        .unwrap_or(false)
}

/// Source date for the shape, parsed permissively.
pub fn order_date(record: &MergedRecord) -> Option<NaiveDate> {
    let column = match record.shape {
        RecordShape::UnifiedExport => SHIP_INSTRUCTION_DATE,
        _ => CHANNEL_ORDER_CREATED,
    };
    to_date(record.source.get(column))
}

/// Evaluate every candidate in order.
pub fn evaluate_all(
    config: &ExclusionConfig,
    reference_date: NaiveDate,
    records: &[MergedRecord],
) -> Vec<Verdict> {
    let mut evaluator = ExclusionEvaluator::new(config, reference_date);
    records.iter().map(|r| evaluator.evaluate(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, Logistics, RawDataset};

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
    }

    fn statement(key: &str, item: &str, tracking: Option<&str>, created: &str) -> MergedRecord {
        let ds = RawDataset::new(
            "b",
            &["渠道单号".into(), "前台传入商品名称".into(), "渠道订单创建时间".into()],
            vec![vec![
                CellValue::from(format!("X-{key}").as_str()),
                CellValue::from(item),
                CellValue::from(created),
            ]],
        );
        MergedRecord {
            shape: RecordShape::Statement,
            dataset: "b".into(),
            key: key.into(),
            source: ds.records[0].clone(),
            logistics: tracking.map(|t| Logistics {
                tracking_number: t.into(),
                carrier: "DHL".into(),
            }),
        }
    }

    fn unified(order: &str, tracking: &str, returned: &str) -> MergedRecord {
        let ds = RawDataset::new(
            "u",
            &["出貨指示日".into(), "訂單編號".into(), "配送單號".into(), "銷退狀態".into()],
            vec![vec![
                CellValue::from("2026-01-02"),
                CellValue::from(order),
                CellValue::from(tracking),
                CellValue::from(returned),
            ]],
        );
        MergedRecord {
            shape: RecordShape::UnifiedExport,
            dataset: "u".into(),
            key: order.into(),
            source: ds.records[0].clone(),
            logistics: None,
        }
    }

    #[test]
    fn accepts_clean_row() {
        let config = ExclusionConfig::default();
        let verdicts = evaluate_all(&config, reference(), &[statement("001", "Shirt", Some("T1"), "")]);
        assert_eq!(verdicts, vec![Verdict::Accepted]);
    }

    #[test]
    fn missing_or_null_tracking() {
        let config = ExclusionConfig::default();
        let rows = [
            statement("1", "Shirt", None, ""),
            statement("2", "Shirt", Some("   "), ""),
            statement("3", "Shirt", Some("nan"), ""),
        ];
        let verdicts = evaluate_all(&config, reference(), &rows);
        assert!(verdicts
            .iter()
            .all(|v| *v == Verdict::Rejected(RejectReason::NoTrackingNumber)));
    }

    #[test]
    fn no_tracking_wins_over_keyword() {
        let config = ExclusionConfig::default();
        let verdicts =
            evaluate_all(&config, reference(), &[statement("1", "勿拍 sample", Some(""), "")]);
        assert_eq!(verdicts, vec![Verdict::Rejected(RejectReason::NoTrackingNumber)]);
    }

    #[test]
    fn keyword_rejects() {
        let config = ExclusionConfig::default();
        let verdicts =
            evaluate_all(&config, reference(), &[statement("1", "【勿拍】test", Some("T1"), "")]);
        assert_eq!(verdicts, vec![Verdict::Rejected(RejectReason::ExcludedKeyword)]);
    }

    #[test]
    fn duplicates_after_first() {
        let config = ExclusionConfig::default();
        let rows = [
            statement("D1", "A", Some("T1"), ""),
            statement("D1", "B", Some("T1"), ""),
        ];
        let verdicts = evaluate_all(&config, reference(), &rows);
        assert_eq!(
            verdicts,
            vec![Verdict::Accepted, Verdict::Rejected(RejectReason::DuplicateOrder)]
        );
    }

    #[test]
    fn rejected_first_occurrence_still_marks_key_seen() {
        let config = ExclusionConfig::default();
        let rows = [
            statement("D1", "A", None, ""),
            statement("D1", "B", Some("T1"), ""),
        ];
        let verdicts = evaluate_all(&config, reference(), &rows);
        assert_eq!(verdicts[0], Verdict::Rejected(RejectReason::NoTrackingNumber));
        assert_eq!(verdicts[1], Verdict::Rejected(RejectReason::DuplicateOrder));
    }

    #[test]
    fn return_status_only_when_enabled() {
        let rows = [unified("U1", "Z1", "銷退"), unified("U2", "Z2", ""), unified("U3", "Z3", "nan")];

        let on = ExclusionConfig::default();
        let verdicts = evaluate_all(&on, reference(), &rows);
        assert_eq!(
            verdicts,
            vec![
                Verdict::Rejected(RejectReason::ReturnOrCancelled),
                Verdict::Accepted,
                Verdict::Accepted
            ]
        );

        let off = ExclusionConfig { return_or_cancelled: false, ..ExclusionConfig::default() };
        let verdicts = evaluate_all(&off, reference(), &rows);
        assert!(verdicts.iter().all(Verdict::is_accepted));
    }

    #[test]
    fn stale_rule_is_off_by_default() {
        let config = ExclusionConfig::default();
        let verdicts =
            evaluate_all(&config, reference(), &[statement("1", "A", Some("T1"), "2020-01-01")]);
        assert_eq!(verdicts, vec![Verdict::Accepted]);
    }

    #[test]
    fn stale_rule_when_enabled() {
        let config = ExclusionConfig { stale_orders: true, ..ExclusionConfig::default() };
        let rows = [
            // 2026-01-31 minus 351 days = 2025-02-14
            statement("old", "A", Some("T1"), "2025-02-14 10:00:00"),
            // exactly 350 days: not stale
            statement("edge", "A", Some("T1"), "2025-02-15"),
            statement("undated", "A", Some("T1"), "garbage"),
        ];
        let verdicts = evaluate_all(&config, reference(), &rows);
        assert_eq!(
            verdicts,
            vec![
                Verdict::Rejected(RejectReason::StaleOrder),
                Verdict::Accepted,
                Verdict::Accepted
            ]
        );
    }

    #[test]
    fn duplicate_is_checked_before_stale() {
        let config = ExclusionConfig { stale_orders: true, ..ExclusionConfig::default() };
        let rows = [
            statement("D", "A", Some("T1"), "2026-01-01"),
            statement("D", "A", Some("T1"), "2020-01-01"),
        ];
        let verdicts = evaluate_all(&config, reference(), &rows);
        assert_eq!(verdicts[1], Verdict::Rejected(RejectReason::DuplicateOrder));
    }
}
