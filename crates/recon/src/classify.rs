use crate::columns::{CHANNEL_ORDER_NO, CUSTOMER_ORDER_NO, ORDER_NO, SHIP_INSTRUCTION_DATE};
use crate::model::{DatasetWarning, RawDataset, RecordShape, WarningKind};

/// Marker columns per shape, in priority order. A shape matches when every
/// marker is present.
const SHAPE_MARKERS: &[(RecordShape, &[&str])] = &[
    (RecordShape::UnifiedExport, &[SHIP_INSTRUCTION_DATE, ORDER_NO]),
    (RecordShape::Statement, &[CHANNEL_ORDER_NO]),
    (RecordShape::OrderList, &[CUSTOMER_ORDER_NO]),
];

/// Classify a set of (canonical) column names.
///
/// Only the header is consulted, so the result never depends on the rows.
pub fn classify_columns<S: AsRef<str>>(columns: &[S]) -> RecordShape {
    let has = |name: &str| columns.iter().any(|c| c.as_ref() == name);
    SHAPE_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().all(|m| has(m)))
        .map(|(shape, _)| *shape)
        .unwrap_or(RecordShape::Unrecognized)
}

pub fn classify(dataset: &RawDataset) -> RecordShape {
    let shape = classify_columns(&dataset.columns);
    log::debug!("dataset '{}' classified as {shape}", dataset.name);
    shape
}

/// The column that decided a classification, for diagnostics.
pub fn marker_column(shape: RecordShape) -> Option<&'static str> {
    SHAPE_MARKERS
        .iter()
        .find(|(s, _)| *s == shape)
        .and_then(|(_, markers)| markers.first().copied())
}

/// Datasets grouped by shape, input order preserved within each group.
#[derive(Debug, Default)]
pub struct Classified<'a> {
    pub statements: Vec<&'a RawDataset>,
    pub order_lists: Vec<&'a RawDataset>,
    pub unified: Vec<&'a RawDataset>,
    pub shapes: Vec<(&'a RawDataset, RecordShape)>,
    pub warnings: Vec<DatasetWarning>,
}

impl Classified<'_> {
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty() && self.order_lists.is_empty() && self.unified.is_empty()
    }
}

/// Classify every dataset. Unrecognized datasets are dropped with a warning.
pub fn partition(datasets: &[RawDataset]) -> Classified<'_> {
    let mut out = Classified::default();
    for ds in datasets {
        let shape = classify(ds);
        out.shapes.push((ds, shape));
        match shape {
            RecordShape::Statement => out.statements.push(ds),
            RecordShape::OrderList => out.order_lists.push(ds),
            RecordShape::UnifiedExport => out.unified.push(ds),
            RecordShape::Unrecognized => {
                log::warn!("dataset '{}': no known marker columns, skipped", ds.name);
                out.warnings.push(DatasetWarning {
                    dataset: ds.name.clone(),
                    kind: WarningKind::UnrecognizedSchema,
                    message: format!(
                        "none of the marker columns ({CHANNEL_ORDER_NO}, {CUSTOMER_ORDER_NO}, \
                         {SHIP_INSTRUCTION_DATE}+{ORDER_NO}) were found"
                    ),
                });
            }
        }
    }
    out
}
