//! `orderfold inspect`: read and classify inputs, no ledger.

use std::path::PathBuf;

use serde::Serialize;

use orderfold_recon::classify::{classify, marker_column};
use orderfold_recon::model::RecordShape;

use crate::CliError;

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    shape: Option<RecordShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    marker: Option<&'static str>,
    columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn cmd_inspect(files: Vec<PathBuf>, json: bool) -> Result<(), CliError> {
    let reports: Vec<FileReport> = files
        .iter()
        .map(|path| match orderfold_io::read_dataset(path) {
            Ok(ds) => {
                let shape = classify(&ds);
                FileReport {
                    file: path.display().to_string(),
                    shape: Some(shape),
                    rows: Some(ds.records.len()),
                    marker: marker_column(shape),
                    columns: ds.columns,
                    error: None,
                }
            }
            Err(e) => FileReport {
                file: path.display().to_string(),
                shape: None,
                rows: None,
                marker: None,
                columns: Vec::new(),
                error: Some(e.to_string()),
            },
        })
        .collect();

    if json {
        let out = serde_json::to_string_pretty(&reports)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{out}");
    } else {
        for r in &reports {
            match (&r.shape, &r.error) {
                (Some(shape), _) => println!(
                    "{:<40} {:<15} {:>6} row(s)  marker: {}",
                    r.file,
                    shape.to_string(),
                    r.rows.unwrap_or(0),
                    r.marker.unwrap_or("-"),
                ),
                (None, Some(err)) => println!("{:<40} error: {err}", r.file),
                (None, None) => {}
            }
        }
    }

    if reports.iter().all(|r| r.error.is_some()) {
        return Err(CliError::input("no input file could be read"));
    }
    Ok(())
}
