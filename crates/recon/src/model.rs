use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::columns::{canonical_column, normalize_column_name};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One spreadsheet cell as handed over by the input provider.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(n) => n.is_nan(),
            Self::DateTime(_) => false,
        }
    }
}

impl std::fmt::Display for CellValue {
    /// Integral numbers render without a fractional part so numeric
    /// identifiers (`12345.0` read from a sheet) print as `12345`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => write!(f, "{s}"),
            Self::Number(n) if n.is_nan() => Ok(()),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::DateTime(dt) if dt.time() == chrono::NaiveTime::MIN => {
                write!(f, "{}", dt.format("%Y-%m-%d"))
            }
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// A single row keyed by canonical column name.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    fields: HashMap<String, CellValue>,
}

impl RawRecord {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column)
    }

    /// Stringified cell, empty when the column is absent.
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }
}

/// A named table from one input file. Column names are normalized and
/// alias-resolved on construction and never touched again.
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub name: String,
    pub columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawDataset {
    /// Build a dataset from a header row and positional data rows.
    ///
    /// When two headers collapse onto the same canonical name the leftmost
    /// column keeps it; later duplicates are ignored. Rows shorter than the
    /// header are padded with `Empty`.
    pub fn new(name: impl Into<String>, headers: &[String], rows: Vec<Vec<CellValue>>) -> Self {
        let mut columns: Vec<String> = Vec::with_capacity(headers.len());
        let mut slots: Vec<Option<usize>> = Vec::with_capacity(headers.len());

        for header in headers {
            let canonical = canonical_column(&normalize_column_name(header)).to_string();
            if canonical.is_empty() || columns.contains(&canonical) {
                slots.push(None);
            } else {
                slots.push(Some(columns.len()));
                columns.push(canonical);
            }
        }

        let records = rows
            .into_iter()
            .map(|row| {
                let mut fields = HashMap::with_capacity(columns.len());
                let mut cells = row.into_iter();
                for slot in &slots {
                    let cell = cells.next().unwrap_or(CellValue::Empty);
                    if let Some(idx) = slot {
                        fields.insert(columns[*idx].clone(), cell);
                    }
                }
                for column in &columns {
                    fields.entry(column.clone()).or_insert(CellValue::Empty);
                }
                RawRecord { fields }
            })
            .collect();

        Self {
            name: name.into(),
            columns,
            records,
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

// ---------------------------------------------------------------------------
// Classification + merge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordShape {
    Statement,
    OrderList,
    UnifiedExport,
    Unrecognized,
}

impl std::fmt::Display for RecordShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Statement => write!(f, "statement"),
            Self::OrderList => write!(f, "order_list"),
            Self::UnifiedExport => write!(f, "unified_export"),
            Self::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Logistics fields attached from the order list during the join.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Logistics {
    pub tracking_number: String,
    pub carrier: String,
}

/// A reconciled candidate row, ready for exclusion evaluation.
#[derive(Debug, Clone)]
pub struct MergedRecord {
    /// `Statement` for joined rows, `UnifiedExport` for passthrough rows.
    pub shape: RecordShape,
    pub dataset: String,
    /// Join key for statement rows, order id for unified rows.
    pub key: String,
    pub source: RawRecord,
    /// `None` when a statement row found no order-list counterpart.
    pub logistics: Option<Logistics>,
}

impl MergedRecord {
    pub fn tracking_number(&self) -> String {
        match self.shape {
            RecordShape::UnifiedExport => self.source.text(crate::columns::DELIVERY_TRACKING_NO),
            _ => self
                .logistics
                .as_ref()
                .map(|l| l.tracking_number.clone())
                .unwrap_or_default(),
        }
    }

    pub fn carrier(&self) -> String {
        match self.shape {
            RecordShape::UnifiedExport => self.source.text(crate::columns::FREIGHT_CARRIER),
            _ => self
                .logistics
                .as_ref()
                .map(|l| l.carrier.clone())
                .unwrap_or_default(),
        }
    }

    pub fn item_name(&self) -> String {
        match self.shape {
            RecordShape::UnifiedExport => self.source.text(crate::columns::ITEM_NAME),
            _ => self.source.text(crate::columns::STOREFRONT_ITEM_NAME),
        }
    }
}

// ---------------------------------------------------------------------------
// Exclusion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NoTrackingNumber,
    ReturnOrCancelled,
    ExcludedKeyword,
    DuplicateOrder,
    StaleOrder,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTrackingNumber => write!(f, "no_tracking_number"),
            Self::ReturnOrCancelled => write!(f, "return_or_cancelled"),
            Self::ExcludedKeyword => write!(f, "excluded_keyword"),
            Self::DuplicateOrder => write!(f, "duplicate_order"),
            Self::StaleOrder => write!(f, "stale_order"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Accepted => None,
            Self::Rejected(r) => Some(*r),
        }
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Money fields computed for every candidate, accepted or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Monetary {
    pub amount: Decimal,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// One row of the upload ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalLedgerRow {
    pub order_id: String,
    /// `YYYY-MM-DD`, or empty when the source date did not parse.
    pub order_date: String,
    pub currency: String,
    pub amount: Decimal,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub shop_url: String,
    pub tracking_number: String,
    pub carrier: String,
    pub platform_name: String,
}

/// A candidate that did not make it into the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRecord {
    pub dataset: String,
    pub key: String,
    pub item_name: String,
    pub amount: Decimal,
    pub tracking_number: String,
    pub reason: RejectReason,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub accepted_count: usize,
    pub accepted_sum: Decimal,
    pub rejected_count: usize,
    pub rejected_sum: Decimal,
    /// Accepted sum divided by the configured exchange rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_sum: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_currency: Option<String>,
    pub rejected_by_reason: BTreeMap<RejectReason, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    DatasetReadFailure,
    UnrecognizedSchema,
    MissingOrderList,
}

/// A non-fatal, per-dataset problem reported alongside the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetWarning {
    pub dataset: String,
    pub kind: WarningKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub name: String,
    pub shape: RecordShape,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub reference_date: NaiveDate,
    pub platform_name: String,
    pub suggested_filename: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub meta: RunMeta,
    pub datasets: Vec<DatasetReport>,
    pub summary: LedgerSummary,
    pub ledger: Vec<CanonicalLedgerRow>,
    pub rejected: Vec<RejectedRecord>,
    pub warnings: Vec<DatasetWarning>,
}

impl RunOutcome {
    /// Operator-facing diagnostic for a run that produced nothing to upload.
    pub fn diagnostic(&self) -> Option<&'static str> {
        if self.ledger.is_empty() {
            Some("no valid records produced")
        } else {
            None
        }
    }
}
