use std::collections::HashMap;

use crate::columns::{EXPRESS_CARRIER, EXPRESS_TRACKING_NO};
use crate::key::derive_key;
use crate::model::{Logistics, MergedRecord, RawDataset, RecordShape};

/// Order-list logistics indexed by join key, first occurrence wins.
/// Rows without an identifier are never indexed, so they cannot join.
pub fn index_order_lists(order_lists: &[&RawDataset]) -> HashMap<String, Logistics> {
    let mut index: HashMap<String, Logistics> = HashMap::new();
    let mut dropped = 0usize;

    for ds in order_lists {
        for record in &ds.records {
            let key = derive_key(RecordShape::OrderList, record);
            if key.is_empty() {
                continue;
            }
            if index.contains_key(&key) {
                dropped += 1;
                continue;
            }
            index.insert(
                key,
                Logistics {
                    tracking_number: record.text(EXPRESS_TRACKING_NO),
                    carrier: record.text(EXPRESS_CARRIER),
                },
            );
        }
    }

    if dropped > 0 {
        log::debug!("order lists: dropped {dropped} row(s) with an already-seen key");
    }
    index
}

/// Left-join every statement row onto the deduplicated order lists.
///
/// Statement rows are concatenated in input order and never deduplicated
/// here; a row with no order-list counterpart is kept with `logistics: None`.
pub fn join_statements(
    statements: &[&RawDataset],
    order_lists: &[&RawDataset],
) -> Vec<MergedRecord> {
    let index = index_order_lists(order_lists);
    let mut merged = Vec::new();
    let mut unmatched = 0usize;

    for ds in statements {
        for record in &ds.records {
            let key = derive_key(RecordShape::Statement, record);
            let logistics = index.get(&key).cloned();
            if logistics.is_none() {
                unmatched += 1;
            }
            merged.push(MergedRecord {
                shape: RecordShape::Statement,
                dataset: ds.name.clone(),
                key,
                source: record.clone(),
                logistics,
            });
        }
    }

    log::info!(
        "joined {} statement row(s) against {} order-list key(s), {unmatched} unmatched",
        merged.len(),
        index.len()
    );
    merged
}

/// Unified-export rows are already reconciled; each becomes a candidate as-is.
pub fn passthrough_unified(unified: &[&RawDataset]) -> Vec<MergedRecord> {
    unified
        .iter()
        .flat_map(|&ds| {
            ds.records.iter().map(move |record| MergedRecord {
                shape: RecordShape::UnifiedExport,
                dataset: ds.name.clone(),
                key: derive_key(RecordShape::UnifiedExport, record),
                source: record.clone(),
                logistics: None,
            })
        })
        .collect()
}
