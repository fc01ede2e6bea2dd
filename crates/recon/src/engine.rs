use std::collections::HashSet;

use chrono::NaiveDate;

use crate::aggregate::summarize;
use crate::classify::partition;
use crate::config::RunConfig;
use crate::error::ReconError;
use crate::exclusion::ExclusionEvaluator;
use crate::export::suggested_filename;
use crate::merge::{join_statements, passthrough_unified};
use crate::model::{
    DatasetReport, DatasetWarning, MergedRecord, RawDataset, RejectedRecord, RunMeta, RunOutcome,
    WarningKind,
};
use crate::project::{monetary, project};

/// Run the pipeline over pre-loaded datasets.
///
/// Returns `NoUsableData` when no dataset has a recognizable shape or the
/// recognized ones yield zero candidate rows. Everything else, including a
/// run where every candidate is rejected, is a successful outcome.
pub fn run(config: &RunConfig, datasets: &[RawDataset]) -> Result<RunOutcome, ReconError> {
    config.validate()?;
    let reference_date = config
        .reference_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let parts = partition(datasets);
    let mut warnings = parts.warnings.clone();

    let reports: Vec<DatasetReport> = parts
        .shapes
        .iter()
        .map(|(ds, shape)| DatasetReport {
            name: ds.name.clone(),
            shape: *shape,
            rows: ds.records.len(),
        })
        .collect();

    if parts.is_empty() {
        return Err(ReconError::NoUsableData(format!(
            "none of the {} dataset(s) matched a known export shape",
            datasets.len()
        )));
    }

    if !parts.statements.is_empty() && parts.order_lists.is_empty() {
        log::warn!("statement data supplied without an order list; rows will lack tracking numbers");
        warnings.push(DatasetWarning {
            dataset: parts
                .statements
                .iter()
                .map(|d| d.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            kind: WarningKind::MissingOrderList,
            message: "no order-list dataset supplied; statement rows cannot be matched to tracking numbers".into(),
        });
    }

    let mut candidates: Vec<MergedRecord> = Vec::new();
    if !parts.statements.is_empty() {
        candidates.extend(join_statements(&parts.statements, &parts.order_lists));
    }
    candidates.extend(passthrough_unified(&parts.unified));

    if candidates.is_empty() {
        return Err(ReconError::NoUsableData(
            "recognized datasets produced zero candidate rows".into(),
        ));
    }

    log::info!("evaluating {} candidate row(s)", candidates.len());

    let mut evaluator = ExclusionEvaluator::new(&config.exclusions, reference_date);
    let mut partitions = Vec::with_capacity(candidates.len());
    let mut ledger = Vec::new();
    let mut rejected = Vec::new();
    let mut ledger_ids: HashSet<String> = HashSet::new();

    for record in &candidates {
        let verdict = evaluator.evaluate(record);
        let money = monetary(record, &config.rule_for(record.shape));
        partitions.push((verdict, money));

        match verdict.reason() {
            None => {
                let row = project(record, &money, config);
                if ledger_ids.insert(row.order_id.clone()) {
                    ledger.push(row);
                } else {
                    // Unreachable while duplicate keys are rejected upstream.
                    log::debug!("order id '{}' already in ledger, dropped", row.order_id);
                }
            }
            Some(reason) => rejected.push(RejectedRecord {
                dataset: record.dataset.clone(),
                key: record.key.clone(),
                item_name: record.item_name(),
                amount: money.amount,
                tracking_number: record.tracking_number(),
                reason,
            }),
        }
    }

    let summary = summarize(&partitions, &config.currency);
    log::info!(
        "accepted {} (sum {}), rejected {} (sum {})",
        summary.accepted_count,
        summary.accepted_sum,
        summary.rejected_count,
        summary.rejected_sum
    );

    Ok(RunOutcome {
        meta: meta(config, reference_date),
        datasets: reports,
        summary,
        ledger,
        rejected,
        warnings,
    })
}

fn meta(config: &RunConfig, reference_date: NaiveDate) -> RunMeta {
    RunMeta {
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        reference_date,
        platform_name: config.platform_name.clone(),
        suggested_filename: suggested_filename(&config.platform_name, reference_date, "xlsx"),
    }
}
